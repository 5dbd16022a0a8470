//! Abstract interfaces for the PRT type system

pub mod element;

pub use element::Element;
