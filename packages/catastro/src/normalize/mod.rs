//! Provider payload normalization.
//!
//! Maps whatever a provider returned onto the canonical schema. The
//! normalizer never fails: missing keys, nulls and blanks all degrade to
//! [`NO_CONSTA`](crate::types::NO_CONSTA).

pub mod aliases;

use serde::Serialize;
use serde_json::Value;

use crate::types::document::{or_sentinel, CanonicalDocument, Field};

pub use aliases::source_keys;

/// Shape of a raw payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Flat keys from the structured-extraction service
    Catastral,
    /// Nested `section.field` objects from a text-generation model
    Generative,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Catastral => "catastral",
            ProviderKind::Generative => "generative",
        }
    }
}

/// Normalize a raw payload into a canonical document.
pub fn normalize(payload: &Value, kind: ProviderKind) -> CanonicalDocument {
    let mut document = CanonicalDocument::empty();
    for field in Field::ALL {
        let keys = source_keys(kind, *field);
        if let Some(value) = resolve_first_present(payload, &keys) {
            document.set(*field, &value);
        }
    }
    document
}

/// First alias whose value is present and non-blank, coerced to text.
pub fn resolve_first_present(payload: &Value, keys: &[String]) -> Option<String> {
    keys.iter()
        .filter_map(|key| lookup(payload, key))
        .filter_map(coerce_to_text)
        .map(|text| or_sentinel(&text))
        .find(|text| text != crate::types::NO_CONSTA)
}

/// Follow a dotted path through nested objects.
fn lookup<'a>(payload: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(payload, |current, segment| current.as_object()?.get(segment))
}

fn coerce_to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) if items.is_empty() => None,
        Value::Object(map) if map.is_empty() => None,
        other => serde_json::to_string(other).ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NO_CONSTA;
    use serde_json::json;

    #[test]
    fn test_catastral_aliases_first_non_empty_wins() {
        let payload = json!({
            "expediente": "12-345-678",
            "expediente_catastral": "",
            "cp": 64000,
            "colindancias": { "norte": "15.00 m con lote 3" },
            "sur": "15.00 m con calle Juárez",
            "vendedor": "JUAN PÉREZ LÓPEZ",
            "folio_real": null,
            "folio": "FR-99812",
        });

        let doc = normalize(&payload, ProviderKind::Catastral);
        assert_eq!(doc.get(Field::ExpedienteCatastral), "12-345-678");
        assert_eq!(doc.get(Field::CodigoPostal), "64000");
        assert_eq!(doc.get(Field::Norte), "15.00 m con lote 3");
        assert_eq!(doc.get(Field::Sur), "15.00 m con calle Juárez");
        assert_eq!(doc.get(Field::VendedorNombre), "JUAN PÉREZ LÓPEZ");
        assert_eq!(doc.get(Field::FolioReal), "FR-99812");
        assert_eq!(doc.get(Field::Este), NO_CONSTA);
    }

    #[test]
    fn test_generative_nested_sections() {
        let payload = json!({
            "informacion_predio": { "lote": "7", "manzana": null, "superficie": "250.00 M²" },
            "titulares": { "comprador_curp": "GOMJ800101HDFRRL05" },
            "acto_juridico": { "valor_operacion": 1250000.5, "moneda": "  MXN " },
        });

        let doc = normalize(&payload, ProviderKind::Generative);
        assert_eq!(doc.get(Field::Lote), "7");
        assert_eq!(doc.get(Field::Manzana), NO_CONSTA);
        assert_eq!(doc.get(Field::Superficie), "250.00 M²");
        assert_eq!(doc.get(Field::CompradorCurp), "GOMJ800101HDFRRL05");
        assert_eq!(doc.get(Field::ValorOperacion), "1250000.5");
        assert_eq!(doc.get(Field::Moneda), "MXN");
    }

    #[test]
    fn test_non_object_payload_is_all_sentinel() {
        for payload in [json!(null), json!("texto"), json!([1, 2]), json!(42)] {
            let doc = normalize(&payload, ProviderKind::Catastral);
            assert_eq!(doc, CanonicalDocument::empty());
        }
    }

    #[test]
    fn test_composite_values_become_json_text() {
        let payload = json!({ "lote": ["A", "B"], "manzana": {} });
        let doc = normalize(&payload, ProviderKind::Catastral);
        assert_eq!(doc.get(Field::Lote), "[\"A\",\"B\"]");
        assert_eq!(doc.get(Field::Manzana), NO_CONSTA);
    }

    #[test]
    fn test_whitespace_and_sentinel_strings_fall_through() {
        let payload = json!({ "tipo_acto": "   ", "acto": "COMPRAVENTA", "libro": "NO_CONSTA" });
        let doc = normalize(&payload, ProviderKind::Catastral);
        assert_eq!(doc.get(Field::TipoActo), "COMPRAVENTA");
        assert_eq!(doc.get(Field::Libro), NO_CONSTA);
    }
}
