//! Source-key alias tables.
//!
//! Each provider names fields its own way. For every canonical field the
//! table lists accepted source keys in priority order; dotted keys address
//! nested objects (`colindancias.norte`).

use lazy_static::lazy_static;
use std::collections::HashMap;

use crate::types::document::Field;

use super::ProviderKind;

lazy_static! {
    /// Flat payload of the structured-extraction service.
    static ref CATASTRAL_ALIASES: HashMap<Field, &'static [&'static str]> = {
        let mut m: HashMap<Field, &'static [&'static str]> = HashMap::new();
        m.insert(Field::ExpedienteCatastral, &["expediente_catastral", "expediente"]);
        m.insert(Field::CodigoPostal, &["codigo_postal", "cp"]);
        m.insert(Field::Norte, &["colindancias.norte", "norte"]);
        m.insert(Field::Sur, &["colindancias.sur", "sur"]);
        m.insert(Field::Este, &["colindancias.este", "este"]);
        m.insert(Field::Oeste, &["colindancias.oeste", "oeste"]);
        m.insert(Field::VendedorNombre, &["vendedor_nombre", "vendedor"]);
        m.insert(Field::CompradorNombre, &["comprador_nombre", "comprador"]);
        m.insert(Field::TipoActo, &["tipo_acto", "acto"]);
        m.insert(Field::NumeroEscritura, &["numero_escritura", "escritura"]);
        m.insert(Field::NotarioNombre, &["notario_nombre", "notario"]);
        m.insert(Field::ValorOperacion, &["valor_operacion", "valor"]);
        m.insert(Field::FolioReal, &["folio_real", "folio"]);
        m
    };
}

/// Ordered source keys for a field under a provider's payload shape.
pub fn source_keys(kind: ProviderKind, field: Field) -> Vec<String> {
    match kind {
        ProviderKind::Catastral => match CATASTRAL_ALIASES.get(&field) {
            Some(keys) => keys.iter().map(|k| k.to_string()).collect(),
            None => vec![field.key().to_string()],
        },
        // Models are asked for nested sections; some flatten anyway.
        ProviderKind::Generative => vec![field.path(), field.key().to_string()],
    }
}
