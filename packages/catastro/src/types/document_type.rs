use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::document::{Field, Section};

/// Kind of notarial document being digitized.
///
/// Selects the relevant canonical sections (for scoring) and the provider
/// prompt. Accepts the English tags `property` and `lien` as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    #[serde(alias = "property")]
    Propiedad,
    #[serde(alias = "lien")]
    Gravamen,
}

impl DocumentType {
    pub const ALL: &'static [DocumentType] = &[DocumentType::Propiedad, DocumentType::Gravamen];

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentType::Propiedad => "propiedad",
            DocumentType::Gravamen => "gravamen",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            DocumentType::Propiedad => "Propiedad",
            DocumentType::Gravamen => "Gravamen",
        }
    }

    /// Sections that matter for this document type.
    pub fn relevant_sections(self) -> &'static [Section] {
        match self {
            DocumentType::Propiedad => Section::ALL,
            DocumentType::Gravamen => &[
                Section::InformacionPredio,
                Section::ActoJuridico,
                Section::DatosRegistrales,
            ],
        }
    }

    /// Fields of the relevant sections.
    pub fn relevant_fields(self) -> impl Iterator<Item = Field> {
        self.relevant_sections()
            .iter()
            .flat_map(|s| s.fields().iter().copied())
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "propiedad" | "property" => Ok(DocumentType::Propiedad),
            "gravamen" | "lien" => Ok(DocumentType::Gravamen),
            other => Err(format!("unknown document type: {}", other)),
        }
    }
}
