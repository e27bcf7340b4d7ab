// Type definitions for the redaction pipeline

pub mod category;
pub mod document;
pub mod geometry;

pub use category::*;
pub use document::*;
pub use geometry::*;
