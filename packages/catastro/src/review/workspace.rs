//! Review workspace state.
//!
//! One lane per document type holds the tracked uploads, their error
//! messages, the current extraction result, its revalidation report and
//! the saved flag. All changes go through [`Workspace::reduce`], which
//! takes the old state and an event and returns the new state plus an
//! optional user-facing notice.

use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::revalidation::{apply_edit, ensure_savable, revalidate, ReviewReport};
use super::status::FileStatus;
use crate::confidence::ConfidenceAggregator;
use crate::error::{ReviewError, ReviewResult};
use crate::types::document::Field;
use crate::types::document_type::DocumentType;
use crate::types::result::ExtractorResult;

/// An uploaded file and where it is in processing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackedFile {
    pub id: Uuid,
    pub name: String,
    pub size: u64,
    pub status: FileStatus,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// State for one document type.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Lane {
    pub files: Vec<TrackedFile>,
    pub errors: BTreeMap<Uuid, String>,
    pub result: Option<ExtractorResult>,
    pub report: Option<ReviewReport>,
    /// File the current result came from
    pub source_file: Option<String>,
    pub saved: bool,
}

impl Lane {
    pub fn is_processing(&self) -> bool {
        self.files
            .iter()
            .any(|f| f.status == FileStatus::Processing)
    }

    fn has_document(&self) -> bool {
        self.result.as_ref().is_some_and(|r| !r.error)
    }

    pub fn can_edit(&self) -> bool {
        self.has_document() && !self.is_processing()
    }

    pub fn can_save(&self) -> bool {
        self.has_document()
            && self.report.as_ref().is_some_and(ReviewReport::is_clean)
            && !self.is_processing()
            && !self.saved
    }

    pub fn can_upload_another(&self) -> bool {
        self.saved
    }

    pub fn file(&self, id: Uuid) -> Option<&TrackedFile> {
        self.files.iter().find(|f| f.id == id)
    }

    fn is_duplicate(&self, name: &str, size: u64) -> bool {
        self.files.iter().any(|f| f.name == name && f.size == size)
    }
}

/// Lane plus derived flags, for callers that render state.
#[derive(Debug, Clone, Serialize)]
pub struct LaneView {
    pub document_type: DocumentType,
    #[serde(flatten)]
    pub lane: Lane,
    pub is_processing: bool,
    pub can_edit: bool,
    pub can_save: bool,
    pub can_upload_another: bool,
}

/// Inputs to the workspace.
#[derive(Debug, Clone)]
pub enum WorkspaceEvent {
    FileSubmitted {
        document_type: DocumentType,
        file_id: Uuid,
        name: String,
        size: u64,
        is_pdf: bool,
    },
    ProcessingStarted {
        document_type: DocumentType,
        file_id: Uuid,
    },
    ExtractionFinished {
        document_type: DocumentType,
        file_id: Uuid,
        outcome: ExtractorResult,
    },
    FieldEdited {
        document_type: DocumentType,
        field: Field,
        value: String,
    },
    /// `snapshot` is the result the sink persisted.
    Saved {
        document_type: DocumentType,
        snapshot: ExtractorResult,
        message: String,
    },
    LaneCleared {
        document_type: DocumentType,
    },
    AllCleared,
}

/// What a notice is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Duplicate,
    Unsupported,
    Completed,
    Failed,
    Saved,
    SaveBlocked,
    Cleared,
    Rejected,
}

/// User-facing message produced by a state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub description: String,
}

impl Notice {
    fn new(kind: NoticeKind, title: &str, description: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.to_string(),
            description: description.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self.kind,
            NoticeKind::Duplicate
                | NoticeKind::Unsupported
                | NoticeKind::Failed
                | NoticeKind::SaveBlocked
                | NoticeKind::Rejected
        )
    }
}

/// Per-document-type review state.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    lanes: BTreeMap<DocumentType, Lane>,
    aggregator: ConfidenceAggregator,
}

impl Workspace {
    pub fn new(aggregator: ConfidenceAggregator) -> Self {
        Self {
            lanes: BTreeMap::new(),
            aggregator,
        }
    }

    pub fn lane(&self, document_type: DocumentType) -> Option<&Lane> {
        self.lanes.get(&document_type)
    }

    /// Lane with derived flags; an untouched lane is empty.
    pub fn view(&self, document_type: DocumentType) -> LaneView {
        let lane = self.lanes.get(&document_type).cloned().unwrap_or_default();
        LaneView {
            document_type,
            is_processing: lane.is_processing(),
            can_edit: lane.can_edit(),
            can_save: lane.can_save(),
            can_upload_another: lane.can_upload_another(),
            lane,
        }
    }

    /// Result and file name to persist, re-checked against every rule.
    pub fn prepare_save(
        &self,
        document_type: DocumentType,
    ) -> ReviewResult<(ExtractorResult, String)> {
        let lane = self
            .lanes
            .get(&document_type)
            .ok_or(ReviewError::NoResult(document_type))?;
        let result = lane
            .result
            .as_ref()
            .ok_or(ReviewError::NoResult(document_type))?;
        ensure_savable(result)?;

        let file_name = lane
            .source_file
            .clone()
            .unwrap_or_else(|| format!("{}.pdf", document_type.as_str()));
        Ok((result.clone(), file_name))
    }

    /// Apply one event.
    pub fn reduce(mut self, event: WorkspaceEvent) -> (Workspace, Option<Notice>) {
        let notice = match event {
            WorkspaceEvent::FileSubmitted {
                document_type,
                file_id,
                name,
                size,
                is_pdf,
            } => self.submit(document_type, file_id, name, size, is_pdf),
            WorkspaceEvent::ProcessingStarted {
                document_type,
                file_id,
            } => self.start(document_type, file_id),
            WorkspaceEvent::ExtractionFinished {
                document_type,
                file_id,
                outcome,
            } => self.finish(document_type, file_id, outcome),
            WorkspaceEvent::FieldEdited {
                document_type,
                field,
                value,
            } => self.edit(document_type, field, &value),
            WorkspaceEvent::Saved {
                document_type,
                snapshot,
                message,
            } => self.mark_saved(document_type, &snapshot, message),
            WorkspaceEvent::LaneCleared { document_type } => {
                self.lanes.remove(&document_type);
                Some(Notice::new(
                    NoticeKind::Cleared,
                    "Listo para nuevo documento",
                    "La sección ha sido limpiada. Puedes subir otro documento.",
                ))
            }
            WorkspaceEvent::AllCleared => {
                self.lanes.clear();
                Some(Notice::new(
                    NoticeKind::Cleared,
                    "Todo limpio",
                    "Se han limpiado todas las secciones.",
                ))
            }
        };
        (self, notice)
    }

    fn submit(
        &mut self,
        document_type: DocumentType,
        file_id: Uuid,
        name: String,
        size: u64,
        is_pdf: bool,
    ) -> Option<Notice> {
        let lane = self.lanes.entry(document_type).or_default();

        if lane.is_duplicate(&name, size) {
            return Some(Notice::new(
                NoticeKind::Duplicate,
                "Archivo duplicado",
                format!(
                    "El archivo \"{}\" ya ha sido subido para este tipo de documento.",
                    name
                ),
            ));
        }

        if !is_pdf {
            let message = "Formato no soportado. Solo se aceptan PDFs.".to_string();
            lane.errors.insert(file_id, message.clone());
            lane.files.push(TrackedFile {
                id: file_id,
                name: name.clone(),
                size,
                status: FileStatus::Error,
                progress: 100,
                message: Some(message.clone()),
            });
            return Some(Notice::new(
                NoticeKind::Unsupported,
                "Formato no soportado",
                format!("\"{}\": {}", name, message),
            ));
        }

        lane.files.push(TrackedFile {
            id: file_id,
            name,
            size,
            status: FileStatus::Pending,
            progress: 0,
            message: Some("Esperando...".to_string()),
        });
        None
    }

    fn transition(
        &mut self,
        document_type: DocumentType,
        file_id: Uuid,
        next: FileStatus,
    ) -> ReviewResult<&mut TrackedFile> {
        let file = self
            .lanes
            .get_mut(&document_type)
            .and_then(|lane| lane.files.iter_mut().find(|f| f.id == file_id))
            .ok_or(ReviewError::UnknownFile(file_id))?;
        file.status = file.status.transition(next)?;
        Ok(file)
    }

    fn start(&mut self, document_type: DocumentType, file_id: Uuid) -> Option<Notice> {
        match self.transition(document_type, file_id, FileStatus::Processing) {
            Ok(file) => {
                file.progress = 10;
                file.message = Some("Procesando...".to_string());
                None
            }
            Err(e) => Some(Notice::new(NoticeKind::Rejected, "Operación inválida", e.to_string())),
        }
    }

    fn finish(
        &mut self,
        document_type: DocumentType,
        file_id: Uuid,
        outcome: ExtractorResult,
    ) -> Option<Notice> {
        let next = if outcome.error {
            FileStatus::Error
        } else {
            FileStatus::Completed
        };

        let name = match self.transition(document_type, file_id, next) {
            Ok(file) => {
                file.progress = 100;
                file.message = Some(match &outcome.error_message {
                    Some(message) if outcome.error => message.clone(),
                    _ => "Completado".to_string(),
                });
                file.name.clone()
            }
            Err(e) => {
                return Some(Notice::new(
                    NoticeKind::Rejected,
                    "Operación inválida",
                    e.to_string(),
                ))
            }
        };

        let lane = self.lanes.entry(document_type).or_default();

        if outcome.error {
            let message = outcome
                .error_message
                .unwrap_or_else(|| "Error desconocido".to_string());
            lane.errors.insert(file_id, message.clone());
            return Some(Notice::new(
                NoticeKind::Failed,
                "Error de Procesamiento",
                format!("Fallo al procesar \"{}\": {}", name, message),
            ));
        }

        lane.errors.remove(&file_id);
        let description = format!(
            "\"{}\": {} campos extraídos, confianza {}%.",
            name,
            outcome.extracted_ratio(),
            outcome.global_confidence
        );
        lane.report = Some(revalidate(&outcome.document));
        lane.result = Some(outcome);
        lane.source_file = Some(name);
        lane.saved = false;

        Some(Notice::new(
            NoticeKind::Completed,
            "Extracción completada",
            description,
        ))
    }

    fn edit(&mut self, document_type: DocumentType, field: Field, value: &str) -> Option<Notice> {
        let aggregator = self.aggregator.clone();
        let lane = self.lanes.entry(document_type).or_default();

        if !lane.can_edit() {
            return Some(Notice::new(
                NoticeKind::Rejected,
                "No hay datos para editar",
                ReviewError::NoResult(document_type).to_string(),
            ));
        }

        if let Some(result) = lane.result.as_mut() {
            lane.report = Some(apply_edit(result, document_type, field, value, &aggregator));
            lane.saved = false;
        }
        None
    }

    fn mark_saved(
        &mut self,
        document_type: DocumentType,
        snapshot: &ExtractorResult,
        message: String,
    ) -> Option<Notice> {
        let lane = self.lanes.entry(document_type).or_default();

        if !lane.can_save() {
            let description = lane
                .report
                .as_ref()
                .and_then(ReviewReport::blocking_summary)
                .unwrap_or_else(|| "No hay datos para guardar.".to_string());
            return Some(Notice::new(
                NoticeKind::SaveBlocked,
                "No se puede guardar",
                description,
            ));
        }

        // Edited or replaced while the sink was writing.
        if lane.result.as_ref() != Some(snapshot) {
            return Some(Notice::new(
                NoticeKind::SaveBlocked,
                "No se puede guardar",
                "El documento cambió mientras se guardaba. Guarda de nuevo.",
            ));
        }

        lane.saved = true;
        Some(Notice::new(NoticeKind::Saved, "Guardado Exitoso", message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::document::CanonicalDocument;

    fn submit(workspace: Workspace, name: &str, size: u64) -> (Workspace, Uuid, Option<Notice>) {
        let id = Uuid::new_v4();
        let (workspace, notice) = workspace.reduce(WorkspaceEvent::FileSubmitted {
            document_type: DocumentType::Propiedad,
            file_id: id,
            name: name.to_string(),
            size,
            is_pdf: name.ends_with(".pdf"),
        });
        (workspace, id, notice)
    }

    fn scored(document: CanonicalDocument) -> ExtractorResult {
        let summary = ConfidenceAggregator::default().aggregate(&document, DocumentType::Propiedad);
        ExtractorResult::scored(document, summary)
    }

    #[test]
    fn test_duplicate_submission_is_rejected() {
        let (ws, _, first) = submit(Workspace::default(), "escritura.pdf", 2048);
        assert!(first.is_none());

        let (ws, _, second) = submit(ws, "escritura.pdf", 2048);
        assert_eq!(second.unwrap().kind, NoticeKind::Duplicate);
        assert_eq!(ws.lane(DocumentType::Propiedad).unwrap().files.len(), 1);

        // Same name, different size is a different file.
        let (ws, _, third) = submit(ws, "escritura.pdf", 4096);
        assert!(third.is_none());
        assert_eq!(ws.lane(DocumentType::Propiedad).unwrap().files.len(), 2);
    }

    #[test]
    fn test_duplicate_guard_is_per_document_type() {
        let (ws, _, _) = submit(Workspace::default(), "escritura.pdf", 2048);
        let (ws, notice) = ws.reduce(WorkspaceEvent::FileSubmitted {
            document_type: DocumentType::Gravamen,
            file_id: Uuid::new_v4(),
            name: "escritura.pdf".into(),
            size: 2048,
            is_pdf: true,
        });
        assert!(notice.is_none());
        assert_eq!(ws.lane(DocumentType::Gravamen).unwrap().files.len(), 1);
    }

    #[test]
    fn test_non_pdf_is_tracked_as_error() {
        let (ws, id, notice) = submit(Workspace::default(), "foto.jpg", 100);
        assert_eq!(notice.unwrap().kind, NoticeKind::Unsupported);

        let lane = ws.lane(DocumentType::Propiedad).unwrap();
        assert_eq!(lane.file(id).unwrap().status, FileStatus::Error);
        assert!(lane.errors.contains_key(&id));
    }

    #[test]
    fn test_lifecycle_to_completed() {
        let (ws, id, _) = submit(Workspace::default(), "escritura.pdf", 2048);
        let (ws, _) = ws.reduce(WorkspaceEvent::ProcessingStarted {
            document_type: DocumentType::Propiedad,
            file_id: id,
        });
        assert!(ws.view(DocumentType::Propiedad).is_processing);
        assert!(!ws.view(DocumentType::Propiedad).can_edit);

        let mut doc = CanonicalDocument::empty();
        doc.set(Field::Lote, "7");
        let (ws, notice) = ws.reduce(WorkspaceEvent::ExtractionFinished {
            document_type: DocumentType::Propiedad,
            file_id: id,
            outcome: scored(doc),
        });
        assert_eq!(notice.unwrap().kind, NoticeKind::Completed);

        let view = ws.view(DocumentType::Propiedad);
        assert!(!view.is_processing);
        assert!(view.can_edit);
        assert!(!view.can_save, "report has issues");
        assert_eq!(view.lane.source_file.as_deref(), Some("escritura.pdf"));
        assert_eq!(view.lane.files[0].status, FileStatus::Completed);
    }

    #[test]
    fn test_error_outcome_records_message() {
        let (ws, id, _) = submit(Workspace::default(), "escritura.pdf", 2048);
        let (ws, _) = ws.reduce(WorkspaceEvent::ProcessingStarted {
            document_type: DocumentType::Propiedad,
            file_id: id,
        });
        let (ws, notice) = ws.reduce(WorkspaceEvent::ExtractionFinished {
            document_type: DocumentType::Propiedad,
            file_id: id,
            outcome: ExtractorResult::from_error("all extraction providers exhausted"),
        });

        assert_eq!(notice.unwrap().kind, NoticeKind::Failed);
        let lane = ws.lane(DocumentType::Propiedad).unwrap();
        assert_eq!(lane.file(id).unwrap().status, FileStatus::Error);
        assert!(lane.result.is_none());
        assert_eq!(
            lane.errors.get(&id).map(String::as_str),
            Some("all extraction providers exhausted")
        );

        // No retry from Error.
        let (ws, notice) = ws.reduce(WorkspaceEvent::ProcessingStarted {
            document_type: DocumentType::Propiedad,
            file_id: id,
        });
        assert_eq!(notice.unwrap().kind, NoticeKind::Rejected);
        assert_eq!(
            ws.lane(DocumentType::Propiedad).unwrap().file(id).unwrap().status,
            FileStatus::Error
        );
    }

    #[test]
    fn test_edit_without_result_is_rejected() {
        let (ws, notice) = Workspace::default().reduce(WorkspaceEvent::FieldEdited {
            document_type: DocumentType::Gravamen,
            field: Field::Lote,
            value: "3".into(),
        });
        assert_eq!(notice.unwrap().kind, NoticeKind::Rejected);
        assert!(ws.view(DocumentType::Gravamen).lane.result.is_none());
    }

    #[test]
    fn test_save_blocked_until_clean() {
        let (ws, id, _) = submit(Workspace::default(), "escritura.pdf", 2048);
        let (ws, _) = ws.reduce(WorkspaceEvent::ProcessingStarted {
            document_type: DocumentType::Propiedad,
            file_id: id,
        });
        let (ws, _) = ws.reduce(WorkspaceEvent::ExtractionFinished {
            document_type: DocumentType::Propiedad,
            file_id: id,
            outcome: scored(CanonicalDocument::empty()),
        });

        assert!(matches!(
            ws.prepare_save(DocumentType::Propiedad),
            Err(ReviewError::SaveBlocked { .. })
        ));
        let (ws, notice) = ws.reduce(WorkspaceEvent::Saved {
            document_type: DocumentType::Propiedad,
            snapshot: scored(CanonicalDocument::empty()),
            message: "ok".into(),
        });
        assert_eq!(notice.unwrap().kind, NoticeKind::SaveBlocked);
        assert!(!ws.view(DocumentType::Propiedad).lane.saved);
    }

    #[test]
    fn test_saved_requires_matching_snapshot() {
        let (ws, id, _) = submit(Workspace::default(), "escritura.pdf", 2048);
        let (ws, _) = ws.reduce(WorkspaceEvent::ProcessingStarted {
            document_type: DocumentType::Propiedad,
            file_id: id,
        });
        let mut doc = CanonicalDocument::empty();
        for (field, value) in [
            (Field::ExpedienteCatastral, "12-345-678"),
            (Field::VendedorCurp, "GOMJ800101HDFRRL05"),
            (Field::CompradorCurp, "LOPM850212MNLRRR09"),
            (Field::FechaEscritura, "15/03/2023"),
            (Field::Superficie, "250.00 M²"),
            (Field::Lote, "7"),
            (Field::Manzana, "12"),
            (Field::VendedorNombre, "JUAN GÓMEZ MARTÍNEZ"),
            (Field::CompradorNombre, "MARÍA LÓPEZ RUIZ"),
            (Field::TipoActo, "COMPRAVENTA"),
            (Field::NumeroEscritura, "4521"),
            (Field::ValorOperacion, "1250000"),
        ] {
            doc.set(field, value);
        }
        let (ws, _) = ws.reduce(WorkspaceEvent::ExtractionFinished {
            document_type: DocumentType::Propiedad,
            file_id: id,
            outcome: scored(doc),
        });
        assert!(ws.view(DocumentType::Propiedad).can_save);

        let (persisted, _) = ws.prepare_save(DocumentType::Propiedad).unwrap();

        // An edit lands while the sink is writing.
        let (ws, _) = ws.reduce(WorkspaceEvent::FieldEdited {
            document_type: DocumentType::Propiedad,
            field: Field::Lote,
            value: "8".into(),
        });
        let (ws, notice) = ws.reduce(WorkspaceEvent::Saved {
            document_type: DocumentType::Propiedad,
            snapshot: persisted,
            message: "ok".into(),
        });
        assert_eq!(notice.unwrap().kind, NoticeKind::SaveBlocked);
        let view = ws.view(DocumentType::Propiedad);
        assert!(!view.lane.saved);
        assert!(view.can_save);

        let (current, _) = ws.prepare_save(DocumentType::Propiedad).unwrap();
        let (ws, notice) = ws.reduce(WorkspaceEvent::Saved {
            document_type: DocumentType::Propiedad,
            snapshot: current,
            message: "ok".into(),
        });
        assert_eq!(notice.unwrap().kind, NoticeKind::Saved);
        assert!(ws.view(DocumentType::Propiedad).lane.saved);
    }

    #[test]
    fn test_clear_lane_and_all() {
        let (ws, _, _) = submit(Workspace::default(), "escritura.pdf", 2048);
        let (ws, _) = ws.reduce(WorkspaceEvent::FileSubmitted {
            document_type: DocumentType::Gravamen,
            file_id: Uuid::new_v4(),
            name: "gravamen.pdf".into(),
            size: 10,
            is_pdf: true,
        });

        let (ws, _) = ws.reduce(WorkspaceEvent::LaneCleared {
            document_type: DocumentType::Propiedad,
        });
        assert!(ws.lane(DocumentType::Propiedad).is_none());
        assert!(ws.lane(DocumentType::Gravamen).is_some());

        let (ws, notice) = ws.reduce(WorkspaceEvent::AllCleared);
        assert_eq!(notice.unwrap().kind, NoticeKind::Cleared);
        assert!(ws.lane(DocumentType::Gravamen).is_none());
    }
}
