use async_trait::async_trait;
use serde::Serialize;

use crate::application::use_cases::import_presenter::{
    CommitSummary, MappingSelector, PreviewModel,
};
use crate::domain::error::{DialogIcon, ErrorNotice};
use crate::domain::wizard_session::WizardStep;

/// Controls the wizard disables while their request is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Control {
    /// "Previsualizar" on the mapping step.
    Preview,
    /// "Guardar" on the preview step.
    Commit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DialogBody {
    /// Plain text; the host must render it as text.
    Text(String),
    /// Pre-escaped markup.
    Html(String),
}

/// A blocking dialog with a single acknowledge button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub icon: DialogIcon,
    pub title: String,
    pub body: DialogBody,
}

impl From<ErrorNotice> for Notice {
    fn from(notice: ErrorNotice) -> Self {
        Self {
            icon: notice.icon,
            title: notice.title,
            body: DialogBody::Text(notice.text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmDialog {
    pub title: String,
    pub text: String,
    pub confirm_label: String,
    pub cancel_label: String,
}

impl ConfirmDialog {
    pub fn save_participants(count: usize) -> Self {
        Self {
            title: "¿Guardar participantes?".to_string(),
            text: format!("Se guardarán {} participantes.", count),
            confirm_label: "Sí, guardar".to_string(),
            cancel_label: "Cancelar".to_string(),
        }
    }
}

/// Non-dismissible progress dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadingDialog {
    pub title: String,
    pub message: String,
}

impl LoadingDialog {
    pub fn processing() -> Self {
        Self {
            title: "Procesando archivo...".to_string(),
            message: "Por favor espera mientras se procesa el archivo Excel.".to_string(),
        }
    }

    pub fn saving() -> Self {
        Self {
            title: "Guardando participantes...".to_string(),
            message: "Por favor espera mientras se guardan los participantes en la base de datos."
                .to_string(),
        }
    }
}

/// The hosting page as seen by the import wizard.
#[async_trait]
pub trait ImportView {
    fn show_step(&self, step: WizardStep);
    fn render_mapping(&self, selectors: &[MappingSelector]);
    fn render_preview(&self, preview: &PreviewModel);
    fn set_control_enabled(&self, control: Control, enabled: bool);
    fn show_loading(&self, dialog: &LoadingDialog);
    fn close_loading(&self);
    fn alert(&self, notice: &Notice);
    /// Resolves to `true` when the user confirms.
    async fn confirm(&self, dialog: &ConfirmDialog) -> bool;
    /// Resolves once the user acknowledges the summary.
    async fn show_commit_summary(&self, summary: &CommitSummary);
    fn reload_page(&self);
}
