//! Validation utilities for the PRT format
//!
//! This module contains pure validation and parsing functions with no I/O
//! dependencies.

pub mod parsing;

pub use parsing::{is_valid_name, parse_data_type, validate_name};
