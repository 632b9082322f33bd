//! Core data types for the extraction pipeline.

pub mod config;
pub mod document;
pub mod document_type;
pub mod input;
pub mod result;

pub use config::ExtractionConfig;
pub use document::{CanonicalDocument, Field, Section, NO_CONSTA, TOTAL_FIELDS};
pub use document_type::DocumentType;
pub use input::DocumentInput;
pub use result::ExtractorResult;
