//! Revalidation after every manual edit.
//!
//! A fixed set of format-checked fields goes through the field validators;
//! a fixed set of required fields only has to be non-blank. Saving is
//! refused while either set reports a problem.

use serde::Serialize;

use super::sink::{DocumentSink, SaveReceipt};
use crate::confidence::ConfidenceAggregator;
use crate::error::{ReviewError, ReviewResult};
use crate::types::document::{is_blank, CanonicalDocument, Field};
use crate::types::document_type::DocumentType;
use crate::types::result::ExtractorResult;
use crate::validation::FieldKind;

/// Fields validated for format on every edit.
pub const FORMAT_CHECKED: &[Field] = &[
    Field::ExpedienteCatastral,
    Field::VendedorCurp,
    Field::CompradorCurp,
    Field::FechaEscritura,
    Field::Superficie,
];

/// Fields that only need a value.
pub const REQUIRED: &[Field] = &[
    Field::Lote,
    Field::Manzana,
    Field::VendedorNombre,
    Field::CompradorNombre,
    Field::TipoActo,
    Field::NumeroEscritura,
    Field::ValorOperacion,
];

pub const REQUIRED_MESSAGE: &str = "Campo requerido.";

/// One failing rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub field: Field,
    pub message: String,
}

/// All failing rules for a document; empty means savable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReviewReport {
    pub issues: Vec<FieldIssue>,
}

impl ReviewReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Inline message for a field, if it fails.
    pub fn message_for(&self, field: Field) -> Option<&str> {
        self.issues
            .iter()
            .find(|issue| issue.field == field)
            .map(|issue| issue.message.as_str())
    }

    /// Save-blocking summary, `None` when clean.
    pub fn blocking_summary(&self) -> Option<String> {
        if self.is_clean() {
            None
        } else {
            Some(
                ReviewError::SaveBlocked {
                    invalid: self.issues.len(),
                }
                .to_string(),
            )
        }
    }
}

/// Run every rule against the document.
pub fn revalidate(document: &CanonicalDocument) -> ReviewReport {
    let mut issues = Vec::new();

    for field in FORMAT_CHECKED {
        let Some(kind) = FieldKind::for_field(*field) else {
            continue;
        };
        let result = kind.validate(document.get(*field));
        if let Some(message) = result.message {
            issues.push(FieldIssue {
                field: *field,
                message,
            });
        }
    }

    for field in REQUIRED {
        if is_blank(document.get(*field)) {
            issues.push(FieldIssue {
                field: *field,
                message: REQUIRED_MESSAGE.to_string(),
            });
        }
    }

    ReviewReport { issues }
}

/// Apply one edit, rescore, and revalidate.
///
/// Blank input is stored as the sentinel.
pub fn apply_edit(
    result: &mut ExtractorResult,
    document_type: DocumentType,
    field: Field,
    value: &str,
    aggregator: &ConfidenceAggregator,
) -> ReviewReport {
    result.document.set(field, value);
    result.rescore(aggregator.aggregate(&result.document, document_type));
    revalidate(&result.document)
}

/// Refuse to save unless the document passes every rule.
pub fn ensure_savable(result: &ExtractorResult) -> ReviewResult<()> {
    if result.error {
        return Err(ReviewError::FailedExtraction(
            result.error_message.clone().unwrap_or_default(),
        ));
    }
    let report = revalidate(&result.document);
    if report.is_clean() {
        Ok(())
    } else {
        Err(ReviewError::SaveBlocked {
            invalid: report.issues.len(),
        })
    }
}

/// Re-check, then hand the record to the sink.
pub async fn save_reviewed(
    sink: &dyn DocumentSink,
    result: &ExtractorResult,
    document_type: DocumentType,
    file_name: &str,
) -> ReviewResult<SaveReceipt> {
    if let Err(e) = ensure_savable(result) {
        tracing::warn!(file_name = %file_name, error = %e, "Save refused");
        return Err(e);
    }
    sink.save(result, document_type, file_name).await
}
