//! Per-field format validators.
//!
//! Validators are keyed by the kind of value, not by section: the date
//! validator covers every `fecha_*` field, the CURP validator both parties.
//! All validators are pure.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::types::document::{is_blank, Field};

lazy_static! {
    // `\d` would accept any Unicode digit; these are ASCII only.
    static ref CATASTRAL_PATTERN: Regex =
        Regex::new(r"^[0-9]{2}-[0-9]{3}-[0-9]{3}$|^[0-9]{10}$").unwrap();
    static ref CURP_PATTERN: Regex =
        Regex::new(r"^[A-Z]{4}[0-9]{6}[HM][A-Z]{2}[B-DF-HJ-NP-TV-Z]{3}[A-Z0-9][0-9]$").unwrap();
    static ref DATE_PATTERN: Regex = Regex::new(r"^([0-9]{2})/([0-9]{2})/([0-9]{4})$").unwrap();
    static ref AREA_PATTERN: Regex =
        Regex::new(r"(?i)^[0-9]+(\.[0-9]+)?\s*(M²|m²|hectáreas|Ha)$").unwrap();
}

pub const REQUIRED_OR_INVALID: &str = "Campo requerido o formato incorrecto.";

/// Outcome of validating one value.
///
/// `message` is `None` exactly when `valid` is true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldValidation {
    pub valid: bool,
    pub confidence: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FieldValidation {
    pub fn valid(confidence: u8) -> Self {
        Self {
            valid: true,
            confidence,
            message: None,
        }
    }

    pub fn invalid(confidence: u8, message: impl Into<String>) -> Self {
        Self {
            valid: false,
            confidence,
            message: Some(message.into()),
        }
    }

    fn missing() -> Self {
        Self::invalid(0, REQUIRED_OR_INVALID)
    }
}

/// Kind of value a field holds, for validator dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Expediente catastral: `NN-NNN-NNN` or 10 digits
    Catastral,
    /// 18-character CURP: name letters, birth date, sex, state, inner
    /// consonants, homoclave, check digit
    Curp,
    /// `DD/MM/YYYY` calendar date
    Date,
    /// Number followed by an area unit
    Area,
}

impl FieldKind {
    /// Validator kind for a canonical field, if it has one.
    pub fn for_field(field: Field) -> Option<FieldKind> {
        match field {
            Field::ExpedienteCatastral => Some(FieldKind::Catastral),
            Field::VendedorCurp | Field::CompradorCurp => Some(FieldKind::Curp),
            Field::FechaEscritura | Field::FechaRegistro | Field::FechaAnterior => {
                Some(FieldKind::Date)
            }
            Field::Superficie => Some(FieldKind::Area),
            _ => None,
        }
    }

    pub fn validate(self, raw: &str) -> FieldValidation {
        validate(self, raw)
    }
}

/// Validate a raw value against the rules for its kind.
pub fn validate(kind: FieldKind, raw: &str) -> FieldValidation {
    if is_blank(raw) {
        return FieldValidation::missing();
    }

    match kind {
        FieldKind::Catastral => validate_catastral(raw),
        FieldKind::Curp => validate_curp(raw),
        FieldKind::Date => validate_date(raw),
        FieldKind::Area => validate_area(raw),
    }
}

fn validate_catastral(raw: &str) -> FieldValidation {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if CATASTRAL_PATTERN.is_match(&compact) {
        FieldValidation::valid(95)
    } else {
        FieldValidation::invalid(60, "Formato: XX-XXX-XXX o 10 dígitos.")
    }
}

fn validate_curp(raw: &str) -> FieldValidation {
    if CURP_PATTERN.is_match(raw) {
        FieldValidation::valid(98)
    } else {
        FieldValidation::invalid(70, "Formato CURP inválido (18 caracteres).")
    }
}

fn validate_date(raw: &str) -> FieldValidation {
    let Some(caps) = DATE_PATTERN.captures(raw) else {
        return FieldValidation::invalid(50, "Formato de fecha inválido (DD/MM/AAAA).");
    };

    // ASCII digits only, so these parses cannot fail.
    let day = caps[1].parse::<u32>().ok();
    let month = caps[2].parse::<u32>().ok();
    let year = caps[3].parse::<i32>().ok();

    let round_trips = match (year, month, day) {
        (Some(y), Some(m), Some(d)) => NaiveDate::from_ymd_opt(y, m, d).is_some(),
        _ => false,
    };

    if round_trips {
        FieldValidation::valid(95)
    } else {
        FieldValidation::invalid(60, "Fecha inválida.")
    }
}

fn validate_area(raw: &str) -> FieldValidation {
    if AREA_PATTERN.is_match(raw) {
        FieldValidation::valid(90)
    } else {
        FieldValidation::invalid(70, "Formato de superficie inválido (ej. '250.00 M²').")
    }
}
