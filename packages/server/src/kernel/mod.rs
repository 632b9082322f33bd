//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod processing;
pub mod test_dependencies;

pub use deps::{PublicSettings, ServerDeps};
pub use processing::{check_upload, process_document, InputSource, ProcessingError, Upload};
pub use test_dependencies::TestDependencies;
