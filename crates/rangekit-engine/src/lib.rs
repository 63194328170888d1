//! rangekit_engine - reference algebra and formula compiler for named ranges.

pub mod engine;
pub mod error;

pub use error::{NameError, RangeError, Result};
