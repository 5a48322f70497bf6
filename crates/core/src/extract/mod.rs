pub mod document;
pub mod error;
pub mod mapping;
pub mod normalize;
pub mod sources;

pub use document::{extract, extract_pages, Extractor};
pub use error::SectionError;
pub use normalize::{normalize_key, normalize_str, normalize_value};
