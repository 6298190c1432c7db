use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::column_mapping::ColumnMapping;
use crate::domain::error::{AppError, RequestKind, Result};
use crate::domain::import_outcome::{CommitOutcome, ValidationOutcome};
use crate::domain::spreadsheet::{SelectedFile, SpreadsheetHeaders};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Intake,
    Mapping,
    Preview,
    /// Rows were saved; the host is expected to reload.
    Committed,
}

/// Identifies one opening of the import modal. Responses carrying an older token
/// are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionToken(Uuid);

impl SessionToken {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionToken {
    fn default() -> Self {
        Self::new()
    }
}

/// All state of one modal session.
#[derive(Debug, Clone)]
pub struct WizardSession {
    pub token: Option<SessionToken>,
    pub step: WizardStep,
    pub file: Option<SelectedFile>,
    pub headers: SpreadsheetHeaders,
    pub mapping: Option<ColumnMapping>,
    pub outcome: Option<ValidationOutcome>,
    pub committed: Option<CommitOutcome>,
    pub processing: bool,
    pub committing: bool,
}

impl Default for WizardSession {
    fn default() -> Self {
        Self {
            token: None,
            step: WizardStep::Intake,
            file: None,
            headers: SpreadsheetHeaders::default(),
            mapping: None,
            outcome: None,
            committed: None,
            processing: false,
            committing: false,
        }
    }
}

impl WizardSession {
    /// Starts a fresh session and returns its token.
    pub fn open(&mut self) -> SessionToken {
        self.reset();
        let token = SessionToken::new();
        self.token = Some(token);
        token
    }

    /// Drops everything, including the token, so in-flight responses are discarded.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_open(&self) -> bool {
        self.token.is_some()
    }

    pub fn current_token(&self) -> Result<SessionToken> {
        self.token.ok_or(AppError::SessionExpired)
    }

    pub fn is_current(&self, token: SessionToken) -> bool {
        self.token == Some(token)
    }

    pub fn ensure_step(&self, expected: WizardStep) -> Result<()> {
        if self.step == expected {
            Ok(())
        } else {
            Err(AppError::InvalidStep {
                expected,
                actual: self.step,
            })
        }
    }

    pub fn in_flight(&self) -> Option<RequestKind> {
        if self.processing {
            Some(RequestKind::Process)
        } else if self.committing {
            Some(RequestKind::Save)
        } else {
            None
        }
    }

    /// Stores a freshly read file, discarding any mapping or outcome of a previous upload.
    pub fn accept_file(&mut self, file: SelectedFile, headers: SpreadsheetHeaders) {
        self.file = Some(file);
        self.headers = headers;
        self.mapping = None;
        self.outcome = None;
        self.step = WizardStep::Mapping;
    }

    /// Replaces (never merges) the validation outcome and moves to preview.
    pub fn accept_outcome(&mut self, mapping: ColumnMapping, outcome: ValidationOutcome) {
        self.mapping = Some(mapping);
        self.outcome = Some(outcome);
        self.step = WizardStep::Preview;
    }

    /// Keeps the save result around while the host shows the summary.
    pub fn accept_commit(&mut self, outcome: CommitOutcome) {
        self.committed = Some(outcome);
        self.step = WizardStep::Committed;
    }

    /// Steps back one page. Returns the new step.
    pub fn back(&mut self) -> Result<WizardStep> {
        if let Some(kind) = self.in_flight() {
            return Err(AppError::RequestInFlight(kind));
        }
        self.step = match self.step {
            WizardStep::Preview => WizardStep::Mapping,
            WizardStep::Mapping => WizardStep::Intake,
            other => other,
        };
        Ok(self.step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::import_outcome::ProcessedRow;

    #[test]
    fn test_open_issues_new_token() {
        let mut session = WizardSession::default();
        assert!(!session.is_open());
        let first = session.open();
        let second = session.open();
        assert_ne!(first, second);
        assert!(session.is_current(second));
        assert!(!session.is_current(first));
    }

    #[test]
    fn test_token_serializes_as_uuid_string() {
        let token = SessionToken::new();
        let json = serde_json::to_value(token).unwrap();
        assert!(json.as_str().map_or(false, |s| Uuid::parse_str(s).is_ok()));
        let back: SessionToken = serde_json::from_value(json).unwrap();
        assert_eq!(back, token);
    }

    #[test]
    fn test_accept_commit_moves_to_committed() {
        let mut session = WizardSession::default();
        session.open();
        session.accept_commit(CommitOutcome {
            created_count: 2,
            error_messages: vec!["Cédula 0102030405 ya existe".into()],
        });
        assert_eq!(session.step, WizardStep::Committed);
        assert_eq!(session.committed.as_ref().map(|c| c.created_count), Some(2));
        assert_eq!(session.back(), Ok(WizardStep::Committed));
    }

    #[test]
    fn test_reset_discards_state() {
        let mut session = WizardSession::default();
        let token = session.open();
        session.accept_file(
            SelectedFile::new("a.csv", b"ID\n1".to_vec()),
            SpreadsheetHeaders::new(vec!["ID".into()]),
        );
        session.processing = true;
        session.reset();

        assert!(!session.is_current(token));
        assert_eq!(session.step, WizardStep::Intake);
        assert!(session.file.is_none());
        assert!(session.in_flight().is_none());
    }

    #[test]
    fn test_new_upload_discards_outcome() {
        let mut session = WizardSession::default();
        session.open();
        session.accept_outcome(
            ColumnMapping::default(),
            ValidationOutcome {
                processed_rows: vec![ProcessedRow::new(2)],
                valid_row_count: 1,
                ..Default::default()
            },
        );
        session.accept_file(
            SelectedFile::new("b.csv", Vec::new()),
            SpreadsheetHeaders::new(vec!["X".into()]),
        );
        assert!(session.outcome.is_none());
        assert!(session.mapping.is_none());
        assert_eq!(session.step, WizardStep::Mapping);
    }

    #[test]
    fn test_back_blocked_while_in_flight() {
        let mut session = WizardSession::default();
        session.open();
        session.step = WizardStep::Preview;
        session.committing = true;
        assert_eq!(session.back(), Err(AppError::RequestInFlight(RequestKind::Save)));

        session.committing = false;
        assert_eq!(session.back(), Ok(WizardStep::Mapping));
        assert_eq!(session.back(), Ok(WizardStep::Intake));
        assert_eq!(session.back(), Ok(WizardStep::Intake));
    }
}
