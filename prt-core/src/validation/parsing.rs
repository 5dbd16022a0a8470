//! Parsing utilities for PRT names and data type strings
//!
//! Pure functions with no I/O dependencies.

use crate::format::constants::NAME_FIELD_SIZE;
use crate::format::PrimitiveType;
use crate::PrtError;

/// Validate a channel or metadata name
///
/// Valid names match `[A-Za-z_][A-Za-z0-9_]*` and leave room for the NUL
/// terminator in the 32-byte name field.
pub fn validate_name(name: &str) -> Result<(), PrtError> {
    if !is_valid_name(name) {
        return Err(PrtError::InvalidName);
    }
    Ok(())
}

/// Check a name against the identifier pattern and length limit
pub fn is_valid_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    let Some((&first, rest)) = bytes.split_first() else {
        return false;
    };
    if bytes.len() >= NAME_FIELD_SIZE {
        return false;
    }
    (first.is_ascii_alphabetic() || first == b'_')
        && rest.iter().all(|&b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Parse a data type string of the form `"float32[3]"`
///
/// Whitespace is allowed around the string and between the type name and
/// the bracketed arity.
pub fn parse_data_type(type_str: &str) -> Result<(PrimitiveType, usize), PrtError> {
    let trimmed = type_str.trim();
    let open = trimmed.find('[').ok_or(PrtError::UnknownType)?;
    let inner = trimmed[open + 1..]
        .strip_suffix(']')
        .ok_or(PrtError::UnknownType)?;

    let ty: PrimitiveType = trimmed[..open].trim_end().parse()?;

    if inner.is_empty() || !inner.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PrtError::UnknownType);
    }
    let arity = inner.parse::<usize>().map_err(|_| PrtError::ValueTooLarge)?;

    Ok((ty, arity))
}
