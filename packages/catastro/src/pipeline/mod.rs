//! Extraction pipeline: provider orchestration, prompts, and recovery of
//! structured output from model text.

pub mod json_span;
pub mod orchestrator;
pub mod prompts;

pub use orchestrator::{FallbackState, ProviderOrchestrator};
