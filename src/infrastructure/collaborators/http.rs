use super::{ImportCollaborator, CSRF_HEADER};
use crate::domain::column_mapping::ColumnMapping;
use crate::domain::error::{AppError, RequestKind, Result};
use crate::domain::import_outcome::{
    CommitOutcome, ProcessResponse, ProcessedRow, SaveResponse, ValidationOutcome,
};
use crate::domain::spreadsheet::SelectedFile;
use crate::infrastructure::config::ImportConfig;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use tracing::{info, warn};

/// Talks to the process/save endpoints over multipart HTTP.
pub struct HttpImportCollaborator {
    client: reqwest::Client,
    process_url: String,
    save_url: String,
    csrf_token: String,
}

impl HttpImportCollaborator {
    pub fn new(config: &ImportConfig) -> Result<Self> {
        let config = config.validated()?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            process_url: config.process_url.clone(),
            save_url: config.save_url.clone(),
            csrf_token: config.csrf_token.clone(),
        })
    }

    async fn post_form(
        &self,
        kind: RequestKind,
        url: &str,
        form: Form,
    ) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(url)
            .header(CSRF_HEADER, &self.csrf_token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| request_error(kind, format!("Request failed: {}", e), e.is_timeout()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            warn!(%kind, %status, "Collaborator returned an error status");
            return Err(server_reported_error(kind, &text).unwrap_or_else(|| {
                request_error(kind, format!("Server error ({}): {}", status, text), false)
            }));
        }

        Ok(response)
    }
}

fn request_error(kind: RequestKind, message: String, timed_out: bool) -> AppError {
    if timed_out {
        return AppError::RequestTimeout(kind);
    }
    match kind {
        RequestKind::Process => AppError::ProcessRequestFailed(message),
        RequestKind::Save => AppError::SaveRequestFailed(message),
    }
}

/// Error bodies look like `{"error": "..."}`; anything else is not a server message.
fn server_reported_error(kind: RequestKind, body: &str) -> Option<AppError> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let message = value.get("error")?.as_str()?.to_string();
    Some(match kind {
        RequestKind::Process => AppError::ServerValidationFailed(message),
        RequestKind::Save => AppError::ServerSaveFailed(message),
    })
}

fn content_type_for(file: &SelectedFile) -> &'static str {
    match file.extension().as_deref() {
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("xlsm") => "application/vnd.ms-excel.sheet.macroEnabled.12",
        Some("xlsb") => "application/vnd.ms-excel.sheet.binary.macroEnabled.12",
        Some("xls") => "application/vnd.ms-excel",
        Some("ods") => "application/vnd.oasis.opendocument.spreadsheet",
        Some("csv") => "text/csv",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl ImportCollaborator for HttpImportCollaborator {
    async fn process(
        &self,
        file: &SelectedFile,
        mapping: &ColumnMapping,
    ) -> Result<ValidationOutcome> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(content_type_for(file))
            .map_err(|e| AppError::Internal(format!("Invalid content type: {}", e)))?;
        let form = Form::new()
            .part("excel_file", part)
            .text("column_mapping", mapping.to_json()?);

        info!(
            url = %self.process_url,
            file_name = %file.file_name,
            mapped_columns = mapping.len(),
            "Sending sheet to process endpoint"
        );

        let response = self
            .post_form(RequestKind::Process, &self.process_url, form)
            .await?;
        let body: ProcessResponse = response.json().await.map_err(|e| {
            request_error(
                RequestKind::Process,
                format!("Failed to parse JSON: {}", e),
                e.is_timeout(),
            )
        })?;

        body.into_outcome()
    }

    async fn save(&self, rows: &[ProcessedRow]) -> Result<CommitOutcome> {
        let payload = serde_json::to_string(rows)
            .map_err(|e| AppError::Internal(format!("Failed to serialize rows: {}", e)))?;
        let form = Form::new().text("participants_data", payload);

        info!(url = %self.save_url, rows = rows.len(), "Sending rows to save endpoint");

        let response = self.post_form(RequestKind::Save, &self.save_url, form).await?;
        let body: SaveResponse = response.json().await.map_err(|e| {
            request_error(
                RequestKind::Save,
                format!("Failed to parse JSON: {}", e),
                e.is_timeout(),
            )
        })?;

        body.into_outcome()
    }
}
