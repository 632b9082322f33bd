use bytes::Bytes;

/// Document content handed to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentInput {
    /// Text already extracted from the document
    Text(String),

    /// Raw PDF bytes
    Pdf { file_name: String, bytes: Bytes },
}

impl DocumentInput {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn pdf(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self::Pdf {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    /// Name used when the input is uploaded as a file.
    pub fn file_name(&self) -> &str {
        match self {
            Self::Text(_) => "documento.txt",
            Self::Pdf { file_name, .. } => file_name,
        }
    }

    /// Content length in bytes.
    pub fn len(&self) -> usize {
        match self {
            Self::Text(text) => text.len(),
            Self::Pdf { bytes, .. } => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// True for `application/pdf` or a `.pdf` file name.
pub fn looks_like_pdf(file_name: &str, content_type: Option<&str>) -> bool {
    content_type
        .map(|ct| ct.trim().eq_ignore_ascii_case("application/pdf"))
        .unwrap_or(false)
        || file_name.to_lowercase().ends_with(".pdf")
}
