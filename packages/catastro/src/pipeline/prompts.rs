//! Extraction prompts for the generative fallback.

use crate::providers::{Attachment, GenerationRequest};
use crate::types::config::ExtractionConfig;
use crate::types::document::Section;
use crate::types::document_type::DocumentType;
use crate::types::input::DocumentInput;

pub const SYSTEM_PROMPT: &str =
    "Eres un experto en análisis de documentos notariales mexicanos. Responde únicamente con JSON válido.";

/// Replaced by the document text, or by a note when the PDF is attached.
pub const DOCUMENT_PLACEHOLDER: &str = "{DOCUMENTO}";

const ATTACHED_PDF_NOTE: &str = "(PDF adjunto)";

const RULES: &str = "Reglas:
- Si un dato no aparece en el documento, usa null. No inventes información.
- Las fechas deben ir en formato DD/MM/AAAA.
- La superficie debe incluir su unidad (ej. \"250.00 M²\").
- Transcribe CURP, RFC y expediente catastral exactamente como aparecen, en mayúsculas.
- Los valores monetarios van sin símbolos; la moneda va en su propio campo.
- Responde solo con el objeto JSON, sin texto adicional.";

/// JSON skeleton listing every section and field with `null` values.
fn schema_skeleton() -> String {
    let sections: Vec<String> = Section::ALL
        .iter()
        .map(|section| {
            let fields: Vec<String> = section
                .fields()
                .iter()
                .map(|f| format!("    \"{}\": null", f.key()))
                .collect();
            format!("  \"{}\": {{\n{}\n  }}", section.key(), fields.join(",\n"))
        })
        .collect();
    format!("{{\n{}\n}}", sections.join(",\n"))
}

fn emphasis(document_type: DocumentType) -> &'static str {
    match document_type {
        DocumentType::Propiedad => {
            "Se trata de una escritura de propiedad: extrae las seis secciones completas, \
             incluidas medidas y colindancias, titulares y antecedentes registrales."
        }
        DocumentType::Gravamen => {
            "Se trata de un certificado de gravamen: prioriza informacion_predio, \
             acto_juridico y datos_registrales; las demás secciones solo si aparecen."
        }
    }
}

/// Instruction template with [`DOCUMENT_PLACEHOLDER`] still in place.
pub fn instruction_template(document_type: DocumentType) -> String {
    format!(
        "Analiza el siguiente documento notarial mexicano ({label}) y extrae la información \
         en formato JSON con exactamente esta estructura:\n\n{schema}\n\n{rules}\n{emphasis}\n\n\
         DOCUMENTO:\n{placeholder}",
        label = document_type.label(),
        schema = schema_skeleton(),
        rules = RULES,
        emphasis = emphasis(document_type),
        placeholder = DOCUMENT_PLACEHOLDER,
    )
}

/// Full user instruction for an input.
pub fn extraction_instruction(document_type: DocumentType, input: &DocumentInput) -> String {
    let content = match input {
        DocumentInput::Text(text) => text.as_str(),
        DocumentInput::Pdf { .. } => ATTACHED_PDF_NOTE,
    };
    instruction_template(document_type).replace(DOCUMENT_PLACEHOLDER, content)
}

/// Generation request for the fallback chain.
pub fn generation_request(
    document_type: DocumentType,
    input: &DocumentInput,
    config: &ExtractionConfig,
) -> GenerationRequest {
    let attachment = match input {
        DocumentInput::Pdf { file_name, bytes } => Some(Attachment {
            file_name: file_name.clone(),
            bytes: bytes.clone(),
        }),
        DocumentInput::Text(_) => None,
    };

    GenerationRequest {
        system: SYSTEM_PROMPT.to_string(),
        instruction: extraction_instruction(document_type, input),
        attachment,
        temperature: config.temperature,
        max_tokens: config.max_tokens,
    }
}
