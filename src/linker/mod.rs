pub mod annotate;
pub mod rewrite;
pub mod shield;

pub use annotate::{annotate, Annotation};
pub use rewrite::{rewrite, Rewrite, SectionChange};
