pub mod document;
pub mod sections;

pub use document::Document;
pub use sections::{extract_sections, Section};
