use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::domain::error::{AppError, Result};
use crate::domain::import_field::FieldKey;
use crate::domain::spreadsheet::SpreadsheetHeaders;

/// What the user picked in each mapping selector. `None` is the blank option.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSelection {
    selected: HashMap<FieldKey, usize>,
}

impl FieldSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: FieldKey, column: usize) -> Self {
        self.set(field, Some(column));
        self
    }

    pub fn set(&mut self, field: FieldKey, column: Option<usize>) {
        match column {
            Some(column) => {
                self.selected.insert(field, column);
            }
            None => {
                self.selected.remove(&field);
            }
        }
    }

    pub fn get(&self, field: FieldKey) -> Option<usize> {
        self.selected.get(&field).copied()
    }

    /// Required fields without a selection, in selector order.
    pub fn missing_required(&self) -> Vec<FieldKey> {
        FieldKey::REQUIRED
            .into_iter()
            .filter(|field| !self.selected.contains_key(field))
            .collect()
    }

    /// Validates the selection against the sheet headers and inverts it into a
    /// column -> field mapping.
    pub fn build_mapping(&self, headers: &SpreadsheetHeaders) -> Result<ColumnMapping> {
        let missing = self.missing_required();
        if !missing.is_empty() {
            return Err(AppError::MissingRequiredMapping(
                missing.iter().map(|field| field.label().to_string()).collect(),
            ));
        }

        let mut columns = BTreeMap::new();
        for field in FieldKey::ALL {
            let Some(column) = self.get(field) else {
                continue;
            };
            if !headers.contains_column(column) {
                return Err(AppError::InvalidMapping(format!(
                    "La columna {} seleccionada para {} no existe en el archivo.",
                    column,
                    field.label()
                )));
            }
            if let Some(previous) = columns.insert(column, field) {
                return Err(AppError::InvalidMapping(format!(
                    "La columna {} está asignada a {} y a {}.",
                    column,
                    previous.label(),
                    field.label()
                )));
            }
        }

        Ok(ColumnMapping { columns })
    }
}

/// Spreadsheet column (1-based) -> participant field.
///
/// Serializes as `{"1": "cedula", "2": "NombresCompletos", ...}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnMapping {
    columns: BTreeMap<usize, FieldKey>,
}

impl ColumnMapping {
    pub fn field_at(&self, column: usize) -> Option<FieldKey> {
        self.columns.get(&column).copied()
    }

    pub fn column_of(&self, field: FieldKey) -> Option<usize> {
        self.columns
            .iter()
            .find(|(_, mapped)| **mapped == field)
            .map(|(column, _)| *column)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, FieldKey)> + '_ {
        self.columns.iter().map(|(column, field)| (*column, *field))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| AppError::Internal(format!("Failed to serialize column mapping: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers() -> SpreadsheetHeaders {
        SpreadsheetHeaders::new(
            ["ID", "Nombre", "Correo", "Telefono", "Edad"]
                .iter()
                .map(|h| h.to_string())
                .collect(),
        )
    }

    fn required() -> FieldSelection {
        FieldSelection::new()
            .with(FieldKey::Identifier, 1)
            .with(FieldKey::FullName, 2)
            .with(FieldKey::Email, 3)
    }

    #[test]
    fn test_rejects_each_missing_required_field() {
        for field in FieldKey::REQUIRED {
            let mut selection = required();
            selection.set(field, None);
            let err = selection.build_mapping(&headers()).unwrap_err();
            assert_eq!(
                err,
                AppError::MissingRequiredMapping(vec![field.label().to_string()])
            );
        }
    }

    #[test]
    fn test_names_all_missing_fields_in_order() {
        let selection = FieldSelection::new().with(FieldKey::FullName, 2);
        let err = selection.build_mapping(&headers()).unwrap_err();
        assert_eq!(
            err,
            AppError::MissingRequiredMapping(vec!["Cédula".to_string(), "Email".to_string()])
        );
    }

    #[test]
    fn test_accepts_required_without_optional() {
        let mapping = required().build_mapping(&headers()).unwrap();
        assert_eq!(mapping.len(), 3);
        assert_eq!(mapping.field_at(1), Some(FieldKey::Identifier));
        assert_eq!(mapping.column_of(FieldKey::Email), Some(3));
        assert_eq!(mapping.column_of(FieldKey::Phone), None);
    }

    #[test]
    fn test_optional_fields_included_when_selected() {
        let mapping = required()
            .with(FieldKey::Age, 5)
            .build_mapping(&headers())
            .unwrap();
        assert_eq!(mapping.field_at(5), Some(FieldKey::Age));
        assert_eq!(mapping.len(), 4);
    }

    #[test]
    fn test_rejects_shared_column() {
        let selection = required().with(FieldKey::Phone, 1);
        assert!(matches!(
            selection.build_mapping(&headers()),
            Err(AppError::InvalidMapping(_))
        ));
    }

    #[test]
    fn test_rejects_column_outside_headers() {
        let selection = required().with(FieldKey::Age, 9);
        assert!(matches!(
            selection.build_mapping(&headers()),
            Err(AppError::InvalidMapping(_))
        ));
    }

    #[test]
    fn test_serializes_with_string_column_keys() {
        let mapping = required()
            .with(FieldKey::Phone, 4)
            .build_mapping(&headers())
            .unwrap();
        assert_eq!(
            mapping.to_json().unwrap(),
            r#"{"1":"cedula","2":"NombresCompletos","3":"email","4":"phone"}"#
        );

        let parsed: ColumnMapping =
            serde_json::from_str(r#"{"1":"cedula","3":"email"}"#).unwrap();
        assert_eq!(parsed.field_at(3), Some(FieldKey::Email));
    }
}
