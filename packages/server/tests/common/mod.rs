// Common test utilities

pub mod harness;
pub mod multipart;

pub use harness::*;
pub use multipart::*;
