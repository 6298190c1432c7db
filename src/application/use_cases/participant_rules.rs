//! Row rules and registry behind the local process/save endpoints.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::column_mapping::ColumnMapping;
use crate::domain::import_field::FieldKey;
use crate::domain::import_outcome::{CommitOutcome, ProcessedRow, ValidationOutcome};
use crate::domain::spreadsheet::{row_is_blank, SheetTable};

static TEN_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{10}$").unwrap());

/// Applies the participant rules to every data row of `table`.
///
/// Blank rows are skipped but still counted in `total_row_count`; rows are numbered
/// as in the sheet, so the first data row is row 2.
pub fn validate_sheet(table: &SheetTable, mapping: &ColumnMapping) -> ValidationOutcome {
    let mut outcome = ValidationOutcome {
        total_row_count: table.rows.len().saturating_sub(1),
        ..Default::default()
    };

    for (row_number, row) in table.data_rows() {
        if row_is_blank(row) {
            continue;
        }

        let values = extract_values(row, mapping);
        let errors = row_errors(&values);
        if errors.is_empty() {
            outcome.processed_rows.push(ProcessedRow {
                row_index: row_number as u64,
                field_values: values,
            });
        } else {
            outcome
                .error_messages
                .push(format!("Fila {}: {}", row_number, errors.join(", ")));
        }
    }

    outcome.valid_row_count = outcome.processed_rows.len();
    outcome.error_row_count = outcome.error_messages.len();
    outcome
}

fn extract_values(row: &[String], mapping: &ColumnMapping) -> Map<String, Value> {
    mapping
        .iter()
        .map(|(column, field)| {
            let value = column
                .checked_sub(1)
                .and_then(|idx| row.get(idx))
                .map(|cell| cell.trim().to_string())
                .unwrap_or_default();
            (field.wire_key().to_string(), Value::String(value))
        })
        .collect()
}

fn text<'a>(values: &'a Map<String, Value>, field: FieldKey) -> &'a str {
    values
        .get(field.wire_key())
        .and_then(Value::as_str)
        .unwrap_or("")
}

/// Messages for every rule `values` breaks, in a fixed order.
pub fn row_errors(values: &Map<String, Value>) -> Vec<String> {
    let mut errors = Vec::new();

    let identifier = text(values, FieldKey::Identifier);
    if identifier.is_empty() {
        errors.push("Cédula es requerida".to_string());
    } else if !TEN_DIGITS.is_match(identifier) {
        errors.push(format!("Cédula inválida: {}", identifier));
    }

    if text(values, FieldKey::FullName).is_empty() {
        errors.push("Nombres Completos es requerido".to_string());
    }

    let email = text(values, FieldKey::Email);
    if email.is_empty() {
        errors.push("Email es requerido".to_string());
    } else if !email.contains('@') {
        errors.push("Email inválido".to_string());
    }

    let phone = text(values, FieldKey::Phone);
    if !phone.is_empty() && !TEN_DIGITS.is_match(phone) {
        errors.push(format!("Teléfono inválido: {}", phone));
    }

    let age = text(values, FieldKey::Age);
    if !age.is_empty() {
        match age.parse::<i64>() {
            Ok(age) if !(0..=120).contains(&age) => {
                errors.push("Edad debe estar entre 0 y 120".to_string())
            }
            Ok(_) => {}
            Err(_) => errors.push("Edad debe ser un número válido".to_string()),
        }
    }

    errors
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegisteredParticipant {
    pub identifier: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub age: Option<u8>,
    pub created_at: DateTime<Utc>,
}

/// In-memory participant store keyed by cédula.
#[derive(Debug, Default)]
pub struct ParticipantRegistry {
    participants: HashMap<String, RegisteredParticipant>,
}

impl ParticipantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn get(&self, identifier: &str) -> Option<&RegisteredParticipant> {
        self.participants.get(identifier)
    }

    /// Registers every row whose cédula is not taken yet. Rows that cannot be
    /// registered are reported, the rest of the batch still goes through.
    pub fn register(&mut self, rows: &[ProcessedRow]) -> CommitOutcome {
        let mut outcome = CommitOutcome::default();

        for row in rows {
            let identifier = row.value(FieldKey::Identifier);
            if self.participants.contains_key(&identifier) {
                outcome
                    .error_messages
                    .push(format!("Cédula {} ya existe", identifier));
                continue;
            }

            match participant_from_row(row) {
                Ok(participant) => {
                    self.participants.insert(identifier, participant);
                    outcome.created_count += 1;
                }
                Err(reason) => outcome.error_messages.push(format!(
                    "Error al crear participante con cédula {}: {}",
                    if identifier.is_empty() { "N/A" } else { identifier.as_str() },
                    reason
                )),
            }
        }

        outcome
    }
}

fn participant_from_row(row: &ProcessedRow) -> std::result::Result<RegisteredParticipant, String> {
    let required = |field: FieldKey| {
        let value = row.value(field);
        if value.is_empty() {
            Err(format!("falta {}", field.wire_key()))
        } else {
            Ok(value)
        }
    };

    let age = match row.value(FieldKey::Age).trim() {
        "" => None,
        raw => Some(
            raw.parse::<u8>()
                .map_err(|_| format!("edad inválida: {}", raw))?,
        ),
    };

    Ok(RegisteredParticipant {
        identifier: required(FieldKey::Identifier)?,
        full_name: required(FieldKey::FullName)?,
        email: required(FieldKey::Email)?,
        phone: row.value(FieldKey::Phone),
        age,
        created_at: Utc::now(),
    })
}
