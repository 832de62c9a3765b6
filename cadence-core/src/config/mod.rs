//! Build-time configuration limits and types

pub mod types;

pub use types::*;
