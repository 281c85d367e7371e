//! Versioned code tables
//!
//! Sentinel codes and category labels come from the survey's data
//! dictionary. They are data contracts: a change here changes every
//! downstream statistic, so each table carries a version string that is
//! logged with every run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::models::Cell;

/// Version of the built-in code tables
pub const DEFAULT_TABLE_VERSION: &str = "2024.1";

/// Sentinel codes for one column; almost always a single value
pub type SentinelSet = SmallVec<[i64; 2]>;

/// Column name → integer codes that mean "not captured"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentinelCodeTable {
    /// Data-contract version of the table
    pub version: String,
    /// Sentinel codes per column
    pub columns: BTreeMap<String, SentinelSet>,
}

impl SentinelCodeTable {
    /// Create an empty table
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            columns: BTreeMap::new(),
        }
    }

    /// Add sentinel codes for a column
    #[must_use]
    pub fn with_column(mut self, column: impl Into<String>, codes: &[i64]) -> Self {
        self.columns
            .entry(column.into())
            .or_default()
            .extend_from_slice(codes);
        self
    }

    /// Sentinel codes for a column
    #[must_use]
    pub fn codes_for(&self, column: &str) -> Option<&[i64]> {
        self.columns.get(column).map(SmallVec::as_slice)
    }

    /// Whether `value` is a sentinel for `column`
    #[must_use]
    pub fn is_sentinel(&self, column: &str, value: f64) -> bool {
        if value.fract() != 0.0 {
            return false;
        }
        self.codes_for(column)
            .is_some_and(|codes| codes.contains(&(value as i64)))
    }
}

impl Default for SentinelCodeTable {
    fn default() -> Self {
        const TWO_DIGIT: [&str; 13] = [
            "C208", "C301_DIA", "C301_MES", "C318_1", "C318_2", "C318_3", "C318_4", "C318_5",
            "C318_6", "C318_7", "C318_T", "C328_T", "whoraT",
        ];
        const FOUR_DIGIT: [&str; 4] = ["C301_ANIO", "C308_COD", "C309_COD", "C317A"];
        const SIX_DIGIT: [&str; 11] = [
            "I339_1", "C341_T", "C342", "D344", "I345_1", "D347_T", "C348", "D350", "INGTOT",
            "INGTOTP", "INGTRABW",
        ];

        let mut table = Self::new(DEFAULT_TABLE_VERSION);
        for column in TWO_DIGIT {
            table = table.with_column(column, &[99]);
        }
        for column in FOUR_DIGIT {
            table = table.with_column(column, &[9999]);
        }
        for column in SIX_DIGIT {
            table = table.with_column(column, &[999_999]);
        }
        table
    }
}

/// Integer code → label for one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecodeMap {
    /// Column the map applies to
    pub column: String,
    /// Labels by code
    pub labels: BTreeMap<i64, String>,
}

impl RecodeMap {
    /// Build a map from `(code, label)` pairs
    pub fn new(column: impl Into<String>, labels: &[(i64, &str)]) -> Self {
        Self {
            column: column.into(),
            labels: labels
                .iter()
                .map(|(code, label)| (*code, (*label).to_string()))
                .collect(),
        }
    }

    /// Label for a code
    #[must_use]
    pub fn label(&self, code: i64) -> Option<&str> {
        self.labels.get(&code).map(String::as_str)
    }

    /// Whether `label` is one of this map's labels
    #[must_use]
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.values().any(|l| l == label)
    }

    /// Recode one cell.
    ///
    /// Mapped codes become their label. Codes without a label and values
    /// that are neither a code nor a known label become `Missing`; the
    /// second element of the result is `true` for those. Missing and
    /// not-applicable cells pass through.
    #[must_use]
    pub fn apply(&self, cell: &Cell) -> (Cell, bool) {
        match cell {
            Cell::Missing | Cell::NotApplicable => (cell.clone(), false),
            Cell::Text(label) if self.has_label(label) => (cell.clone(), false),
            _ => match cell.coerce_f64().filter(|v| v.fract() == 0.0) {
                Some(code) => match self.label(code as i64) {
                    Some(label) => (Cell::text(label), false),
                    None => (Cell::Missing, true),
                },
                None => (Cell::Missing, true),
            },
        }
    }
}

/// The full set of recode maps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecodeMaps {
    /// Data-contract version of the maps
    pub version: String,
    /// Maps, applied in order
    pub maps: Vec<RecodeMap>,
}

impl RecodeMaps {
    /// Map for a column
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&RecodeMap> {
        self.maps.iter().find(|m| m.column == column)
    }

    /// Iterate over the maps
    pub fn iter(&self) -> impl Iterator<Item = &RecodeMap> {
        self.maps.iter()
    }
}

impl Default for RecodeMaps {
    fn default() -> Self {
        let maps = vec![
            RecodeMap::new(
                "REGION",
                &[(1, "Lima Metropolitana"), (2, "Resto Urbano"), (3, "Rural")],
            ),
            RecodeMap::new(
                "C203",
                &[
                    (1, "Jefe/a"),
                    (2, "Esposo/a o compañero/a"),
                    (3, "Hijo/a o hijastro/a"),
                    (4, "Yerno o Nuera"),
                    (5, "Nieto/a"),
                    (6, "Padre / madre / suegro/a"),
                    (7, "Hermano/a"),
                    (8, "Otro pariente"),
                    (9, "Trabajador/a del hogar"),
                    (10, "Pensionista"),
                    (11, "Otro no pariente"),
                    (98, "No residente"),
                ],
            ),
            RecodeMap::new("C207", &[(1, "Hombre"), (2, "Mujer")]),
            RecodeMap::new(
                "C310",
                &[
                    (1, "Empleador o patrono"),
                    (2, "Trabajador independiente"),
                    (3, "Empleado u obrero"),
                    (4, "Ayudante en un negocio de la familia"),
                    (5, "Ayudante en el empleo de un familiar"),
                    (6, "Trabajador del hogar"),
                    (7, "Aprendiz/practicante remunerado"),
                    (8, "Practicante sin remuneración"),
                    (9, "Ayudante en un negocio de la familia de otro hogar"),
                    (10, "Ayudante en el empleo de un familiar de otro hogar"),
                ],
            ),
            RecodeMap::new(
                "C311",
                &[
                    (1, "Fuerzas Armadas, Policía Nacional del Perú (militares)"),
                    (2, "Administración pública"),
                    (3, "Empresa pública"),
                    (4, "Empresas especiales de servicios (SERVICE)"),
                    (5, "Empresa o patrono privado"),
                    (6, "Otra"),
                ],
            ),
            RecodeMap::new(
                "C312",
                &[
                    (
                        1,
                        "Persona jurídica (Sociedad Anónima SRL, Sociedad Civil, EIRL o Asociación, etc.)",
                    ),
                    (2, "Persona Natural con RUC (RUS, RER, u otro régimen)"),
                    (3, "NO ESTA REGISTRADO (no tiene RUC)"),
                    (4, "NO SABE (solo para dependientes)"),
                ],
            ),
            RecodeMap::new(
                "C366",
                &[
                    (1, "Sin nivel"),
                    (2, "Educación Inicial"),
                    (3, "Primaria incompleta"),
                    (4, "Primaria completa"),
                    (5, "Secundaria incompleta"),
                    (6, "Secundaria completa"),
                    (7, "Básica especial"),
                    (8, "Superior no universitaria incompleta"),
                    (9, "Superior no universitaria completa"),
                    (10, "Superior universitaria incompleta"),
                    (11, "Superior universitaria completa"),
                    (12, "Maestria/Doctorado"),
                ],
            ),
            RecodeMap::new(
                "OCUP300",
                &[
                    (0, "Sin información"),
                    (1, "Ocupado"),
                    (2, "Desocupado abierto"),
                    (3, "Desocupado oculto"),
                    (4, "Inactivo pleno"),
                ],
            ),
        ];
        Self {
            version: DEFAULT_TABLE_VERSION.to_string(),
            maps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sentinels() {
        let table = SentinelCodeTable::default();
        assert!(table.is_sentinel("C208", 99.0));
        assert!(!table.is_sentinel("C208", 45.0));
        assert!(table.is_sentinel("INGTOT", 999_999.0));
        assert!(table.is_sentinel("C317A", 9999.0));
        assert!(!table.is_sentinel("INGTOT", 99.0));
        assert!(!table.is_sentinel("unlisted", 99.0));
        assert_eq!(table.codes_for("C301_DIA"), Some(&[99][..]));
    }

    #[test]
    fn test_default_recode_maps() {
        let maps = RecodeMaps::default();
        assert_eq!(maps.get("C207").unwrap().label(2), Some("Mujer"));
        assert_eq!(maps.get("OCUP300").unwrap().label(1), Some("Ocupado"));
        assert!(maps.get("C366").unwrap().has_label("Maestria/Doctorado"));
        assert!(maps.get("C999").is_none());
    }

    #[test]
    fn test_recode_apply() {
        let map = RecodeMap::new("C207", &[(1, "Hombre"), (2, "Mujer")]);
        assert_eq!(map.apply(&Cell::from(2)), (Cell::text("Mujer"), false));
        assert_eq!(map.apply(&Cell::text("Hombre")), (Cell::text("Hombre"), false));
        assert_eq!(map.apply(&Cell::from(7)), (Cell::Missing, true));
        assert_eq!(map.apply(&Cell::text("otro")), (Cell::Missing, true));
        assert_eq!(map.apply(&Cell::NotApplicable), (Cell::NotApplicable, false));
    }

    #[test]
    fn test_tables_deserialize_from_json() {
        let json = r#"{"version": "test", "columns": {"age": [99, 98]}}"#;
        let table: SentinelCodeTable = serde_json::from_str(json).unwrap();
        assert!(table.is_sentinel("age", 98.0));
        assert_eq!(table.version, "test");
    }
}
