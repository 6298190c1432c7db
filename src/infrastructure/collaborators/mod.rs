pub mod http;

use crate::domain::column_mapping::ColumnMapping;
use crate::domain::error::Result;
use crate::domain::import_outcome::{CommitOutcome, ProcessedRow, ValidationOutcome};
use crate::domain::spreadsheet::SelectedFile;
use async_trait::async_trait;

pub use http::HttpImportCollaborator;

/// Header carrying the session's CSRF token on every collaborator request.
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// Remote capabilities the wizard depends on: validating a mapped sheet and
/// persisting the rows that passed validation.
#[async_trait]
pub trait ImportCollaborator {
    async fn process(
        &self,
        file: &SelectedFile,
        mapping: &ColumnMapping,
    ) -> Result<ValidationOutcome>;

    async fn save(&self, rows: &[ProcessedRow]) -> Result<CommitOutcome>;
}
