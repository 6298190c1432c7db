use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::application::use_cases::import_presenter::{
    mapping_selectors, CommitSummary, ErrorPanel, PreviewModel,
};
use crate::domain::column_mapping::{ColumnMapping, FieldSelection};
use crate::domain::error::{AppError, DialogIcon, RequestKind, Result};
use crate::domain::import_outcome::ValidationOutcome;
use crate::domain::spreadsheet::{SelectedFile, SpreadsheetHeaders};
use crate::domain::wizard_session::{SessionToken, WizardSession, WizardStep};
use crate::infrastructure::collaborators::ImportCollaborator;
use crate::infrastructure::config::ImportConfig;
use crate::infrastructure::spreadsheet::SpreadsheetReader;
use crate::interfaces::view::{
    ConfirmDialog, Control, DialogBody, ImportView, LoadingDialog, Notice,
};

/// The participant import wizard for one modal.
///
/// Shared between UI event handlers; every entry point takes `&self`. Failures the
/// user should see are shown through the view before the error is returned.
pub struct ParticipantImportUseCase {
    collaborator: Arc<dyn ImportCollaborator + Send + Sync>,
    view: Arc<dyn ImportView + Send + Sync>,
    reader: SpreadsheetReader,
    request_timeout: Duration,
    error_preview_limit: usize,
    session: Mutex<WizardSession>,
}

impl ParticipantImportUseCase {
    pub fn new(
        collaborator: Arc<dyn ImportCollaborator + Send + Sync>,
        view: Arc<dyn ImportView + Send + Sync>,
        config: &ImportConfig,
    ) -> Self {
        Self {
            collaborator,
            view,
            reader: SpreadsheetReader::new(),
            request_timeout: config.request_timeout(),
            error_preview_limit: config.error_preview_limit.max(1),
            session: Mutex::new(WizardSession::default()),
        }
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    fn session(&self) -> MutexGuard<'_, WizardSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn step(&self) -> WizardStep {
        self.session().step
    }

    pub fn headers(&self) -> SpreadsheetHeaders {
        self.session().headers.clone()
    }

    pub fn mapping(&self) -> Option<ColumnMapping> {
        self.session().mapping.clone()
    }

    pub fn outcome(&self) -> Option<ValidationOutcome> {
        self.session().outcome.clone()
    }

    /// Modal shown: starts a fresh session at the intake step.
    pub fn open(&self) -> SessionToken {
        let token = self.session().open();
        self.view.close_loading();
        self.view.set_control_enabled(Control::Preview, true);
        self.view.set_control_enabled(Control::Commit, true);
        self.view.show_step(WizardStep::Intake);
        info!(?token, "Participant import opened");
        token
    }

    /// Modal dismissed: drops all state. Requests already sent are not aborted,
    /// their responses are discarded when they arrive.
    pub fn close(&self) {
        let in_flight = {
            let mut session = self.session();
            let in_flight = session.in_flight();
            session.reset();
            in_flight
        };
        self.view.close_loading();
        match in_flight {
            Some(kind) => info!(%kind, "Participant import closed with a request in flight"),
            None => info!("Participant import closed"),
        }
    }

    /// Shows the failure to the user when it has a dialog, then hands it back.
    fn report(&self, err: AppError) -> AppError {
        match err.notice() {
            Some(notice) => self.view.alert(&notice.into()),
            None => debug!(error = %err, "Import action ignored"),
        }
        err
    }

    pub fn select_file(&self, file: Option<SelectedFile>) -> Result<()> {
        self.intake(file).map_err(|e| self.report(e))
    }

    fn intake(&self, file: Option<SelectedFile>) -> Result<()> {
        {
            let session = self.session();
            session.current_token()?;
            session.ensure_step(WizardStep::Intake)?;
        }

        let file = file.ok_or(AppError::NoFileSelected)?;
        let table = self.reader.read_first_sheet(&file).map_err(|e| {
            warn!(file_name = %file.file_name, error = %e, "Spreadsheet rejected");
            e
        })?;
        let headers = table.headers()?;
        let selectors = mapping_selectors(&headers);

        info!(
            file_name = %file.file_name,
            columns = headers.len(),
            rows = table.rows.len(),
            "Spreadsheet accepted"
        );

        {
            let mut session = self.session();
            // The modal may have been reopened while the file was being parsed.
            session.ensure_step(WizardStep::Intake)?;
            session.accept_file(file, headers);
        }
        self.view.render_mapping(&selectors);
        self.view.show_step(WizardStep::Mapping);
        Ok(())
    }

    /// Marks `kind` as in flight after checking the step and preparing the payload.
    fn begin_request<T>(
        &self,
        kind: RequestKind,
        step: WizardStep,
        prepare: impl FnOnce(&WizardSession) -> Result<T>,
    ) -> Result<(SessionToken, T)> {
        let mut session = self.session();
        let token = session.current_token()?;
        session.ensure_step(step)?;
        if let Some(busy) = session.in_flight() {
            return Err(AppError::RequestInFlight(busy));
        }

        let prepared = prepare(&*session)?;
        match kind {
            RequestKind::Process => session.processing = true,
            RequestKind::Save => session.committing = true,
        }
        Ok((token, prepared))
    }

    /// Sends the file and mapping to the process endpoint and shows the preview.
    pub async fn preview(&self, selection: &FieldSelection) -> Result<()> {
        let (token, (file, mapping)) = self
            .begin_request(RequestKind::Process, WizardStep::Mapping, |session| {
                let mapping = selection.build_mapping(&session.headers)?;
                let file = session
                    .file
                    .clone()
                    .ok_or_else(|| AppError::Internal("No file in session".to_string()))?;
                Ok((file, mapping))
            })
            .map_err(|e| self.report(e))?;

        self.view.set_control_enabled(Control::Preview, false);
        self.view.show_loading(&LoadingDialog::processing());
        info!(file_name = %file.file_name, mapped_columns = mapping.len(), "Processing spreadsheet");

        let result = match timeout(self.request_timeout, self.collaborator.process(&file, &mapping))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(AppError::RequestTimeout(RequestKind::Process)),
        };

        {
            let mut session = self.session();
            if !session.is_current(token) {
                debug!("Discarding process response for a closed session");
                return Err(AppError::SessionExpired);
            }
            session.processing = false;
            if let Ok(outcome) = &result {
                session.accept_outcome(mapping, outcome.clone());
            }
        }

        self.view.close_loading();
        self.view.set_control_enabled(Control::Preview, true);

        let outcome = result.map_err(|e| {
            warn!(error = %e, "Process request failed");
            self.report(e)
        })?;

        info!(
            valid_rows = outcome.valid_row_count,
            total_rows = outcome.total_row_count,
            error_rows = outcome.error_row_count,
            "Preview ready"
        );
        let preview = PreviewModel::from_outcome(&outcome, self.error_preview_limit);
        self.view.render_preview(&preview);
        self.view.show_step(WizardStep::Preview);
        Ok(())
    }

    /// "Ver todos": every preview error in a scrollable dialog.
    pub fn show_all_preview_errors(&self) -> Result<()> {
        let panel = {
            let session = self.session();
            session.ensure_step(WizardStep::Preview)?;
            session
                .outcome
                .as_ref()
                .and_then(|outcome| ErrorPanel::new(&outcome.error_messages, self.error_preview_limit))
        };
        self.show_error_list(panel);
        Ok(())
    }

    /// "Ver todos" in the commit summary: every save error of the last commit.
    pub fn show_all_commit_errors(&self) -> Result<()> {
        let panel = {
            let session = self.session();
            session.ensure_step(WizardStep::Committed)?;
            session
                .committed
                .as_ref()
                .and_then(|outcome| ErrorPanel::new(&outcome.error_messages, self.error_preview_limit))
        };
        self.show_error_list(panel);
        Ok(())
    }

    fn show_error_list(&self, panel: Option<ErrorPanel>) {
        if let Some(panel) = panel {
            self.view.alert(&Notice {
                icon: DialogIcon::Info,
                title: "Todos los errores".to_string(),
                body: DialogBody::Html(panel.full_list_html()),
            });
        }
    }

    /// Asks for confirmation, then persists the validated rows.
    pub async fn commit(&self) -> Result<()> {
        let (token, rows) = self
            .begin_request(RequestKind::Save, WizardStep::Preview, |session| {
                match &session.outcome {
                    Some(outcome) if outcome.can_commit() => Ok(outcome.processed_rows.clone()),
                    _ => Err(AppError::NothingToCommit),
                }
            })
            .map_err(|e| self.report(e))?;

        let confirmed = self
            .view
            .confirm(&ConfirmDialog::save_participants(rows.len()))
            .await;
        if !confirmed {
            let mut session = self.session();
            if session.is_current(token) {
                session.committing = false;
            }
            debug!("Commit cancelled by user");
            return Ok(());
        }
        if !self.session().is_current(token) {
            return Err(AppError::SessionExpired);
        }

        self.view.set_control_enabled(Control::Commit, false);
        self.view.show_loading(&LoadingDialog::saving());
        info!(rows = rows.len(), "Saving participants");

        let result = match timeout(self.request_timeout, self.collaborator.save(&rows)).await {
            Ok(result) => result,
            Err(_) => Err(AppError::RequestTimeout(RequestKind::Save)),
        };

        {
            let mut session = self.session();
            if !session.is_current(token) {
                debug!("Discarding save response for a closed session");
                return Err(AppError::SessionExpired);
            }
            session.committing = false;
            if let Ok(outcome) = &result {
                session.accept_commit(outcome.clone());
            }
        }

        self.view.close_loading();

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "Save request failed");
                self.view.set_control_enabled(Control::Commit, true);
                return Err(self.report(e));
            }
        };

        info!(
            created = outcome.created_count,
            errors = outcome.error_messages.len(),
            "Participants saved"
        );
        let summary = CommitSummary::from_outcome(&outcome, self.error_preview_limit);
        self.view.show_commit_summary(&summary).await;
        self.view.reload_page();
        Ok(())
    }

    /// Previous page of the wizard.
    pub fn back(&self) -> Result<WizardStep> {
        let step = self.session().back()?;
        self.view.show_step(step);
        Ok(step)
    }
}
