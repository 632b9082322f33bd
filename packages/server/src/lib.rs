// Catastral Extraction API - Server Core
//
// HTTP service around the catastro pipeline: one-shot extraction, the
// per-document-type review workspace, and provider health.

pub mod config;
pub mod kernel;
pub mod server;

pub use config::*;
