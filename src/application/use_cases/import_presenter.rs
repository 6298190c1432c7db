//! View models for the import modal.
//!
//! Every string that came from the spreadsheet or from a collaborator is kept raw in
//! the models and escaped when HTML is produced.

use serde::Serialize;

use crate::domain::import_field::FieldKey;
use crate::domain::import_outcome::{CommitOutcome, ProcessedRow, ValidationOutcome};
use crate::domain::spreadsheet::SpreadsheetHeaders;
use crate::infrastructure::html::{escape_html, list_items};

pub const UNSELECTED_OPTION: &str = "Seleccionar columna...";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    /// 1-based column, `None` for the blank option.
    pub value: Option<usize>,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingSelector {
    pub field: FieldKey,
    pub label: String,
    pub required: bool,
    pub options: Vec<SelectOption>,
}

pub fn mapping_selectors(headers: &SpreadsheetHeaders) -> Vec<MappingSelector> {
    FieldKey::ALL
        .into_iter()
        .map(|field| {
            let mut options = Vec::with_capacity(headers.len() + 1);
            options.push(SelectOption {
                value: None,
                label: UNSELECTED_OPTION.to_string(),
            });
            options.extend(headers.columns().map(|column| SelectOption {
                value: Some(column),
                label: headers.option_label(column),
            }));

            MappingSelector {
                field,
                label: field.selector_label(),
                required: field.is_required(),
                options,
            }
        })
        .collect()
}

/// `"7 filas válidas de 10 totales (3 con errores)"`
pub fn stats_line(outcome: &ValidationOutcome) -> String {
    let mut line = format!(
        "{} filas válidas de {} totales",
        outcome.valid_row_count, outcome.total_row_count
    );
    if outcome.error_row_count > 0 {
        line.push_str(&format!(" ({} con errores)", outcome.error_row_count));
    }
    line
}

/// Error messages capped to a preview, with the rest behind a "ver todos" affordance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPanel {
    messages: Vec<String>,
    limit: usize,
}

impl ErrorPanel {
    /// `None` when there is nothing to show, so the panel stays hidden.
    pub fn new(messages: &[String], limit: usize) -> Option<Self> {
        if messages.is_empty() {
            return None;
        }
        Some(Self {
            messages: messages.to_vec(),
            limit: limit.max(1),
        })
    }

    pub fn shown(&self) -> &[String] {
        &self.messages[..self.messages.len().min(self.limit)]
    }

    pub fn remaining(&self) -> usize {
        self.messages.len().saturating_sub(self.limit)
    }

    pub fn all(&self) -> &[String] {
        &self.messages
    }

    pub fn more_label(&self) -> Option<String> {
        match self.remaining() {
            0 => None,
            n => Some(format!("...y {} errores más", n)),
        }
    }

    pub fn to_html(&self) -> String {
        let more = self
            .more_label()
            .map(|label| {
                format!(
                    r#"<li>{} <button type="button" class="show-all-errors btn btn-link p-0 ms-1">Ver todos</button></li>"#,
                    label
                )
            })
            .unwrap_or_default();
        format!(
            "<strong>Errores encontrados:</strong><ul>{}{}</ul>",
            list_items(self.shown()),
            more
        )
    }

    /// Scrollable list with every message, opened by the "ver todos" affordance.
    pub fn full_list_html(&self) -> String {
        format!(
            r#"<div style="max-height: 320px; overflow-y: auto; text-align: left;"><ul>{}</ul></div>"#,
            list_items(&self.messages)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewRow {
    pub row_index: u64,
    pub identifier: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub age: String,
}

impl PreviewRow {
    pub fn from_processed(row: &ProcessedRow) -> Self {
        Self {
            row_index: row.row_index,
            identifier: row.value(FieldKey::Identifier),
            full_name: row.value(FieldKey::FullName),
            email: row.value(FieldKey::Email),
            phone: row.value(FieldKey::Phone),
            age: row.value(FieldKey::Age),
        }
    }

    pub fn to_html(&self) -> String {
        let cells: String = [
            &self.identifier,
            &self.full_name,
            &self.email,
            &self.phone,
            &self.age,
        ]
        .into_iter()
        .map(|value| format!("<td>{}</td>", escape_html(value)))
        .collect();
        format!("<tr><td>{}</td>{}</tr>", self.row_index, cells)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewModel {
    pub stats: String,
    pub errors: Option<ErrorPanel>,
    pub rows: Vec<PreviewRow>,
    pub commit_visible: bool,
}

impl PreviewModel {
    pub fn from_outcome(outcome: &ValidationOutcome, error_limit: usize) -> Self {
        Self {
            stats: stats_line(outcome),
            errors: ErrorPanel::new(&outcome.error_messages, error_limit),
            rows: outcome
                .processed_rows
                .iter()
                .map(PreviewRow::from_processed)
                .collect(),
            commit_visible: outcome.can_commit(),
        }
    }

    pub fn table_body_html(&self) -> String {
        self.rows.iter().map(PreviewRow::to_html).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitSummary {
    pub created_count: usize,
    pub errors: Option<ErrorPanel>,
}

impl CommitSummary {
    pub fn from_outcome(outcome: &CommitOutcome, error_limit: usize) -> Self {
        Self {
            created_count: outcome.created_count,
            errors: ErrorPanel::new(&outcome.error_messages, error_limit),
        }
    }

    pub fn to_html(&self) -> String {
        let mut html = format!(
            "Se guardaron <strong>{}</strong> participantes exitosamente.",
            self.created_count
        );
        if let Some(panel) = &self.errors {
            html.push_str(&format!(
                r#"<div class="mt-3 text-start">{}</div>"#,
                panel.to_html()
            ));
        }
        html
    }
}
