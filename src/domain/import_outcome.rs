use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::error::{AppError, Result};
use crate::domain::import_field::FieldKey;

const UNKNOWN_SERVER_ERROR: &str = "Error desconocido del servidor";

/// One participant record as extracted and validated by the process endpoint.
///
/// `field_values` keeps the server's payload verbatim so it can be sent back to the
/// save endpoint unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedRow {
    pub row_index: u64,
    #[serde(rename = "data", default)]
    pub field_values: Map<String, Value>,
}

impl ProcessedRow {
    pub fn new(row_index: u64) -> Self {
        Self {
            row_index,
            field_values: Map::new(),
        }
    }

    pub fn with_value(mut self, field: FieldKey, value: impl Into<String>) -> Self {
        self.field_values
            .insert(field.wire_key().to_string(), Value::String(value.into()));
        self
    }

    /// Value of `field` as display text; absent or null values are empty.
    pub fn value(&self, field: FieldKey) -> String {
        match self.field_values.get(field.wire_key()) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub processed_rows: Vec<ProcessedRow>,
    pub valid_row_count: usize,
    pub total_row_count: usize,
    pub error_row_count: usize,
    pub error_messages: Vec<String>,
}

impl ValidationOutcome {
    pub fn can_commit(&self) -> bool {
        self.valid_row_count > 0 && !self.processed_rows.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitOutcome {
    pub created_count: usize,
    pub error_messages: Vec<String>,
}

/// Body returned by the process endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<ProcessedRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProcessResponse {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn into_outcome(self) -> Result<ValidationOutcome> {
        if !self.success {
            return Err(AppError::ServerValidationFailed(
                self.error.unwrap_or_else(|| UNKNOWN_SERVER_ERROR.to_string()),
            ));
        }

        let processed_rows = self.data.ok_or_else(|| {
            AppError::ProcessRequestFailed("Response is missing the data array".to_string())
        })?;
        let error_messages = self.errors.unwrap_or_default();
        let valid_row_count = self.valid_rows.unwrap_or(processed_rows.len());
        let error_row_count = self.error_rows.unwrap_or(error_messages.len());
        let total_row_count = self
            .total_rows
            .unwrap_or(valid_row_count + error_row_count);

        Ok(ValidationOutcome {
            processed_rows,
            valid_row_count,
            total_row_count,
            error_row_count,
            error_messages,
        })
    }
}

impl From<ValidationOutcome> for ProcessResponse {
    fn from(outcome: ValidationOutcome) -> Self {
        Self {
            success: true,
            valid_rows: Some(outcome.valid_row_count),
            total_rows: Some(outcome.total_row_count),
            error_rows: Some(outcome.error_row_count),
            errors: Some(outcome.error_messages),
            data: Some(outcome.processed_rows),
            error: None,
        }
    }
}

/// Body returned by the save endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SaveResponse {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn into_outcome(self) -> Result<CommitOutcome> {
        if !self.success {
            return Err(AppError::ServerSaveFailed(
                self.error.unwrap_or_else(|| UNKNOWN_SERVER_ERROR.to_string()),
            ));
        }

        Ok(CommitOutcome {
            created_count: self.created_count.unwrap_or(0),
            error_messages: self.errors.unwrap_or_default(),
        })
    }
}

impl From<CommitOutcome> for SaveResponse {
    fn from(outcome: CommitOutcome) -> Self {
        Self {
            success: true,
            created_count: Some(outcome.created_count),
            errors: Some(outcome.error_messages),
            error: None,
        }
    }
}
