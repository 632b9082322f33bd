//! Canonical document schema.
//!
//! Six fixed sections of string fields. Every field always holds either
//! meaningful text or [`NO_CONSTA`]; absent, null and blank values never
//! survive construction or mutation.

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Placeholder for "field not present in the source document".
pub const NO_CONSTA: &str = "NO_CONSTA";

/// True when a value carries no information (sentinel or blank).
pub fn is_blank(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || trimmed == NO_CONSTA
}

/// Sentinel substitution applied to every value entering a document.
pub fn or_sentinel(value: &str) -> String {
    if is_blank(value) {
        NO_CONSTA.to_string()
    } else {
        value.trim().to_string()
    }
}

macro_rules! canonical_schema {
    ($(
        $section:ident => $section_key:ident : $section_ty:ident {
            $( $field:ident => $field_key:ident ),+ $(,)?
        }
    )+) => {
        /// Canonical document section.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, serde::Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum Section {
            $( $section ),+
        }

        impl Section {
            pub const ALL: &'static [Section] = &[ $( Section::$section ),+ ];

            /// Key used in payloads and field paths.
            pub fn key(self) -> &'static str {
                match self {
                    $( Section::$section => stringify!($section_key) ),+
                }
            }

            /// Fields of this section in schema order.
            pub fn fields(self) -> &'static [Field] {
                match self {
                    $( Section::$section => &[ $( Field::$field ),+ ] ),+
                }
            }

            pub fn from_key(key: &str) -> Option<Section> {
                Section::ALL.iter().copied().find(|s| s.key() == key)
            }
        }

        /// A canonical field. Closed set; adding one is a compile-time change.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Field {
            $( $( $field ),+ ),+
        }

        impl Field {
            pub const ALL: &'static [Field] = &[ $( $( Field::$field ),+ ),+ ];

            /// Field name within its section.
            pub fn key(self) -> &'static str {
                match self {
                    $( $( Field::$field => stringify!($field_key) ),+ ),+
                }
            }

            pub fn section(self) -> Section {
                match self {
                    $( $( Field::$field => Section::$section ),+ ),+
                }
            }
        }

        $(
            #[derive(Debug, Clone, PartialEq, Eq, Serialize)]
            pub struct $section_ty {
                $( pub $field_key: String ),+
            }

            impl Default for $section_ty {
                fn default() -> Self {
                    Self {
                        $( $field_key: NO_CONSTA.to_string() ),+
                    }
                }
            }
        )+

        /// The normalized record produced for one uploaded document.
        #[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
        pub struct CanonicalDocument {
            $( pub $section_key: $section_ty ),+
        }

        impl CanonicalDocument {
            /// Current value of a field.
            pub fn get(&self, field: Field) -> &str {
                match field {
                    $( $( Field::$field => &self.$section_key.$field_key ),+ ),+
                }
            }

            fn slot_mut(&mut self, field: Field) -> &mut String {
                match field {
                    $( $( Field::$field => &mut self.$section_key.$field_key ),+ ),+
                }
            }
        }
    };
}

canonical_schema! {
    InformacionPredio => informacion_predio: InformacionPredio {
        ExpedienteCatastral => expediente_catastral,
        Lote => lote,
        Manzana => manzana,
        Superficie => superficie,
        Colonia => colonia,
        Municipio => municipio,
        CodigoPostal => codigo_postal,
        TipoPredio => tipo_predio,
    }
    MedidasColindancias => medidas_colindancias: MedidasColindancias {
        Norte => norte,
        Sur => sur,
        Este => este,
        Oeste => oeste,
    }
    Titulares => titulares: Titulares {
        VendedorNombre => vendedor_nombre,
        VendedorCurp => vendedor_curp,
        VendedorRfc => vendedor_rfc,
        CompradorNombre => comprador_nombre,
        CompradorCurp => comprador_curp,
        CompradorRfc => comprador_rfc,
        RegimenMatrimonial => regimen_matrimonial,
    }
    ActoJuridico => acto_juridico: ActoJuridico {
        TipoActo => tipo_acto,
        NumeroEscritura => numero_escritura,
        FechaEscritura => fecha_escritura,
        NotarioNombre => notario_nombre,
        NotarioNumero => notario_numero,
        ValorOperacion => valor_operacion,
        Moneda => moneda,
    }
    DatosRegistrales => datos_registrales: DatosRegistrales {
        Volumen => volumen,
        Libro => libro,
        Seccion => seccion,
        Inscripcion => inscripcion,
        FolioReal => folio_real,
        FechaRegistro => fecha_registro,
    }
    Antecedentes => antecedentes: Antecedentes {
        InscripcionAnterior => inscripcion_anterior,
        VolumenAnterior => volumen_anterior,
        FechaAnterior => fecha_anterior,
    }
}

/// Number of canonical fields across all sections.
pub const TOTAL_FIELDS: usize = 35;

impl Field {
    /// Qualified path, e.g. `informacion_predio.lote`.
    pub fn path(self) -> String {
        format!("{}.{}", self.section().key(), self.key())
    }

    /// Resolve a qualified `section.field` path.
    pub fn from_path(path: &str) -> Option<Field> {
        let (section, key) = path.trim().split_once('.')?;
        let section = Section::from_key(section)?;
        section.fields().iter().copied().find(|f| f.key() == key)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section().key(), self.key())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::from_path(s).ok_or_else(|| s.to_string())
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl CanonicalDocument {
    /// Document with every field set to the sentinel.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Set a field; blank input is stored as the sentinel.
    pub fn set(&mut self, field: Field, value: &str) {
        *self.slot_mut(field) = or_sentinel(value);
    }

    /// Whether a field holds extracted text.
    pub fn is_extracted(&self, field: Field) -> bool {
        !is_blank(self.get(field))
    }

    /// Count of fields that are not the sentinel.
    pub fn extracted_count(&self) -> usize {
        Field::ALL.iter().filter(|f| self.is_extracted(**f)).count()
    }

    /// All fields with their values, in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> + '_ {
        Field::ALL.iter().map(move |f| (*f, self.get(*f)))
    }
}
