//! YAML schema types shared by rule kinds.

mod metadata;

pub use metadata::*;
