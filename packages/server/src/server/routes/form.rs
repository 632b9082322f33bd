//! Multipart form parsing shared by upload routes.

use axum::extract::multipart::{Field, Multipart};
use catastro::DocumentType;
use std::str::FromStr;

use crate::kernel::{InputSource, Upload};
use crate::server::error::ApiError;

/// Fields accepted by upload routes.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub upload: Option<Upload>,
    pub document_type: Option<String>,
    pub source: Option<String>,
}

impl UploadForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request(format!("Formulario inválido: {}", e)))?
        {
            let name = field.name().map(str::to_string);
            match name.as_deref() {
                Some("file") => {
                    let file_name = field.file_name().unwrap_or("documento.pdf").to_string();
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field.bytes().await.map_err(|e| {
                        ApiError::bad_request(format!("No se pudo leer el archivo: {}", e))
                    })?;
                    form.upload = Some(Upload {
                        file_name,
                        content_type,
                        bytes,
                    });
                }
                Some("document_type") => form.document_type = Some(read_text(field).await?),
                Some("source") => form.source = Some(read_text(field).await?),
                _ => {}
            }
        }

        Ok(form)
    }

    pub fn take_upload(&mut self) -> Result<Upload, ApiError> {
        self.upload
            .take()
            .ok_or_else(|| ApiError::bad_request("No se recibió ningún archivo (campo \"file\")."))
    }

    pub fn document_type(&self) -> Result<DocumentType, ApiError> {
        let raw = self
            .document_type
            .as_deref()
            .ok_or_else(|| ApiError::bad_request("Falta el campo \"document_type\"."))?;
        parse_document_type(raw)
    }

    pub fn source(&self) -> InputSource {
        InputSource::parse(self.source.as_deref())
    }
}

async fn read_text(field: Field<'_>) -> Result<String, ApiError> {
    let name = field.name().unwrap_or_default().to_string();
    field
        .text()
        .await
        .map_err(|e| ApiError::bad_request(format!("Formulario inválido ({}): {}", name, e)))
}

pub fn parse_document_type(raw: &str) -> Result<DocumentType, ApiError> {
    DocumentType::from_str(raw)
        .map_err(|_| ApiError::bad_request(format!("Tipo de documento desconocido: {}", raw)))
}
