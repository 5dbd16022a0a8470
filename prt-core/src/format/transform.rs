//! Channel transform classification
//!
//! Describes how a channel's values respond to a 3D spatial transform.
//! The format only records the classification; applying transforms is up
//! to the consumer.

use super::data_type::PrimitiveType;

/// How a channel reacts to a 3D transformation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[repr(i32)]
pub enum TransformKind {
    /// Not affected by transformations (colors, ids, ...)
    #[default]
    Unspecified = 0,
    /// Full affine transformation
    Point = 1,
    /// Unaffected by translation
    Vector = 2,
    /// Transformed by the inverse transpose, without translation
    Normal = 3,
    /// Quaternion affected by rotation only
    Orientation = 4,
    /// Axis-angle affected by rotation only
    Rotation = 5,
    /// Affected by scale only
    Scalar = 6,
}

impl TransformKind {
    /// Convert from the on-disk ordinal
    pub const fn from_ordinal(value: i32) -> Option<Self> {
        match value {
            0 => Some(TransformKind::Unspecified),
            1 => Some(TransformKind::Point),
            2 => Some(TransformKind::Vector),
            3 => Some(TransformKind::Normal),
            4 => Some(TransformKind::Orientation),
            5 => Some(TransformKind::Rotation),
            6 => Some(TransformKind::Scalar),
            _ => None,
        }
    }

    /// Convert to the on-disk ordinal
    pub const fn ordinal(self) -> i32 {
        self as i32
    }

    pub const fn name(self) -> &'static str {
        match self {
            TransformKind::Unspecified => "unspecified",
            TransformKind::Point => "point",
            TransformKind::Vector => "vector",
            TransformKind::Normal => "normal",
            TransformKind::Orientation => "orientation",
            TransformKind::Rotation => "rotation",
            TransformKind::Scalar => "scalar",
        }
    }

    /// Default classification for a channel that did not specify one
    pub fn default_for(name: &str) -> Self {
        match name {
            "Position" => TransformKind::Point,
            _ => TransformKind::Unspecified,
        }
    }

    /// Check that this kind can describe a channel of the given type and arity
    pub const fn is_compatible(self, ty: PrimitiveType, arity: usize) -> bool {
        match self {
            TransformKind::Point | TransformKind::Vector | TransformKind::Normal => {
                ty.is_float() && arity == 3
            }
            TransformKind::Orientation | TransformKind::Rotation => ty.is_float() && arity == 4,
            TransformKind::Scalar => ty.is_float() && arity == 1,
            TransformKind::Unspecified => true,
        }
    }
}

impl core::fmt::Display for TransformKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}
