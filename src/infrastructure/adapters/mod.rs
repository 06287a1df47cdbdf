//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod extraction;
pub mod narrator;

pub use extraction::{extract_text, ExtractionError};
pub use narrator::*;
