//! Document-level confidence scoring.
//!
//! Counts always range over the full canonical schema. The global score is
//! delegated to a [`ConfidencePolicy`]; any policy must stay within 0..=100
//! and never decrease when a field becomes extracted or valid.

use serde::Serialize;
use std::sync::Arc;

use crate::types::document::{CanonicalDocument, TOTAL_FIELDS};
use crate::types::document_type::DocumentType;
use crate::validation::FieldKind;

/// Counts and score for one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConfidenceSummary {
    pub extracted_count: usize,
    pub total_fields: usize,
    pub global_confidence: u8,
}

/// Strategy combining per-field signals into one score.
pub trait ConfidencePolicy: Send + Sync {
    fn score(&self, document: &CanonicalDocument, document_type: DocumentType) -> u8;
}

/// Weighted mean over the document type's relevant fields.
///
/// Fields with a validator contribute its confidence (0 when absent);
/// other fields contribute 100 when extracted, 0 otherwise. Weights do not
/// depend on the values, which keeps the score monotonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightedFieldPolicy {
    pub validated_weight: u32,
    pub plain_weight: u32,
}

impl Default for WeightedFieldPolicy {
    fn default() -> Self {
        Self {
            validated_weight: 2,
            plain_weight: 1,
        }
    }
}

impl ConfidencePolicy for WeightedFieldPolicy {
    fn score(&self, document: &CanonicalDocument, document_type: DocumentType) -> u8 {
        let mut weighted_sum: u64 = 0;
        let mut total_weight: u64 = 0;

        for field in document_type.relevant_fields() {
            let (score, weight) = match FieldKind::for_field(field) {
                Some(kind) => (
                    kind.validate(document.get(field)).confidence as u64,
                    self.validated_weight as u64,
                ),
                None if document.is_extracted(field) => (100, self.plain_weight as u64),
                None => (0, self.plain_weight as u64),
            };
            weighted_sum += score * weight;
            total_weight += weight;
        }

        if total_weight == 0 {
            return 0;
        }

        let mean = (weighted_sum as f64 / total_weight as f64).round();
        mean.clamp(0.0, 100.0) as u8
    }
}

/// Computes [`ConfidenceSummary`] values with a pluggable policy.
#[derive(Clone)]
pub struct ConfidenceAggregator {
    policy: Arc<dyn ConfidencePolicy>,
}

impl ConfidenceAggregator {
    pub fn new(policy: Arc<dyn ConfidencePolicy>) -> Self {
        Self { policy }
    }

    pub fn aggregate(
        &self,
        document: &CanonicalDocument,
        document_type: DocumentType,
    ) -> ConfidenceSummary {
        ConfidenceSummary {
            extracted_count: document.extracted_count(),
            total_fields: TOTAL_FIELDS,
            global_confidence: self.policy.score(document, document_type).min(100),
        }
    }
}

impl Default for ConfidenceAggregator {
    fn default() -> Self {
        Self::new(Arc::new(WeightedFieldPolicy::default()))
    }
}

impl std::fmt::Debug for ConfidenceAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfidenceAggregator").finish_non_exhaustive()
    }
}
