//! Catastral Document Extraction Library
//!
//! Turns Mexican notarial and cadastral documents (escrituras, certificados
//! de gravamen) into a fixed canonical record of 35 fields, scores how much
//! of it was found, and supports a manual review cycle before the record is
//! saved.
//!
//! # Pipeline
//!
//! 1. A primary structured-extraction service gets one bounded call.
//! 2. If it rejects the document for size or times out, an ordered list of
//!    generative models is tried until one returns a parseable object.
//! 3. Whatever came back is normalized into the canonical record; absent
//!    values hold [`NO_CONSTA`].
//! 4. A confidence policy scores the fields relevant to the document type.
//!
//! # Usage
//!
//! ```rust,ignore
//! use catastro::{CatastralClient, DocumentInput, DocumentType, ProviderOrchestrator};
//! use catastro::testing::MockGenerativeProvider;
//! use std::sync::Arc;
//!
//! let orchestrator = ProviderOrchestrator::new(Arc::new(CatastralClient::new(base_url)))
//!     .with_fallback(Arc::new(MockGenerativeProvider::new()));
//!
//! let input = DocumentInput::pdf("escritura.pdf", bytes);
//! let result = orchestrator.extract(&input, DocumentType::Propiedad).await?;
//! println!("{} campos, confianza {}%", result.extracted_ratio(), result.global_confidence);
//! ```
//!
//! # Modules
//!
//! - [`types`] - Canonical record, document types, inputs and results
//! - [`normalize`] - Provider payloads to canonical record
//! - [`validation`] - Format rules for identifiers, dates and areas
//! - [`confidence`] - Pluggable scoring policy
//! - [`providers`] - Primary and generative provider seams with HTTP clients
//! - [`pipeline`] - Primary-then-fallback orchestration
//! - [`text_extraction`] - PDF text extraction service client
//! - [`review`] - Edit revalidation, file status and the review workspace
//! - [`security`] - Credential handling
//! - [`testing`] - Mock implementations for testing

pub mod confidence;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod providers;
pub mod review;
pub mod security;
pub mod testing;
pub mod text_extraction;
pub mod types;
pub mod validation;

// Re-export core types at crate root
pub use confidence::{ConfidenceAggregator, ConfidencePolicy, ConfidenceSummary, WeightedFieldPolicy};
pub use error::{ExtractionError, ProviderError, Result, ReviewError, TextExtractionError};
pub use normalize::{normalize, ProviderKind};
pub use pipeline::{FallbackState, ProviderOrchestrator};
pub use providers::{
    CatastralClient, Connectivity, GenerativeProvider, OpenAIGenerativeProvider, PrimaryProvider,
};
pub use review::{
    save_reviewed, DocumentSink, FileStatus, LaneView, LoggingSink, Notice, NoticeKind,
    ReviewReport, SaveReceipt, Workspace, WorkspaceEvent,
};
pub use security::{GenerativeCredentials, SecretString};
pub use text_extraction::{ExtractedText, TextExtractionClient, TextExtractor};
pub use types::{
    CanonicalDocument, DocumentInput, DocumentType, ExtractionConfig, ExtractorResult, Field,
    Section, NO_CONSTA, TOTAL_FIELDS,
};
pub use validation::{validate, FieldKind, FieldValidation};
