use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::wizard_session::WizardStep;

/// Which collaborator call a request-level failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestKind {
    Process,
    Save,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestKind::Process => write!(f, "process"),
            RequestKind::Save => write!(f, "save"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AppError {
    NoFileSelected,
    EmptyOrInvalidFile(String),
    /// Labels of the required fields left unselected.
    MissingRequiredMapping(Vec<String>),
    InvalidMapping(String),
    ProcessRequestFailed(String),
    ServerValidationFailed(String),
    SaveRequestFailed(String),
    ServerSaveFailed(String),
    RequestTimeout(RequestKind),
    NothingToCommit,
    RequestInFlight(RequestKind),
    SessionExpired,
    InvalidStep {
        expected: WizardStep,
        actual: WizardStep,
    },
    ConfigError(String),
    IoError(String),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NoFileSelected => write!(f, "No file selected"),
            AppError::EmptyOrInvalidFile(msg) => write!(f, "Empty or invalid file: {}", msg),
            AppError::MissingRequiredMapping(fields) => {
                write!(f, "Missing required mapping: {}", fields.join(", "))
            }
            AppError::InvalidMapping(msg) => write!(f, "Invalid mapping: {}", msg),
            AppError::ProcessRequestFailed(msg) => write!(f, "Process request failed: {}", msg),
            AppError::ServerValidationFailed(msg) => {
                write!(f, "Server validation failed: {}", msg)
            }
            AppError::SaveRequestFailed(msg) => write!(f, "Save request failed: {}", msg),
            AppError::ServerSaveFailed(msg) => write!(f, "Server save failed: {}", msg),
            AppError::RequestTimeout(kind) => write!(f, "Request timed out: {}", kind),
            AppError::NothingToCommit => write!(f, "No valid rows to commit"),
            AppError::RequestInFlight(kind) => {
                write!(f, "A {} request is already in flight", kind)
            }
            AppError::SessionExpired => write!(f, "Import session is no longer open"),
            AppError::InvalidStep { expected, actual } => write!(
                f,
                "Invalid wizard step: expected {:?}, found {:?}",
                expected, actual
            ),
            AppError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::IoError(msg) => write!(f, "IO error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialogIcon {
    Success,
    Error,
    Warning,
    Info,
    Question,
}

/// Title and body of the blocking dialog a failure is reported with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorNotice {
    pub icon: DialogIcon,
    pub title: String,
    pub text: String,
}

impl AppError {
    /// Dialog shown to the user for this failure, or `None` for failures that are
    /// handled silently (guards, late responses, programming errors).
    pub fn notice(&self) -> Option<ErrorNotice> {
        let (icon, title, text) = match self {
            AppError::NoFileSelected => (
                DialogIcon::Warning,
                "Archivo requerido",
                "Por favor selecciona un archivo Excel.".to_string(),
            ),
            AppError::EmptyOrInvalidFile(_) => (
                DialogIcon::Error,
                "Archivo inválido",
                "El archivo Excel está vacío o no contiene datos válidos.".to_string(),
            ),
            AppError::MissingRequiredMapping(fields) => (
                DialogIcon::Warning,
                "Campos requeridos",
                format!(
                    "Por favor selecciona los campos requeridos: {}",
                    fields.join(", ")
                ),
            ),
            AppError::InvalidMapping(msg) => (DialogIcon::Warning, "Mapeo inválido", msg.clone()),
            AppError::ProcessRequestFailed(_) | AppError::RequestTimeout(RequestKind::Process) => (
                DialogIcon::Error,
                "Error al procesar el archivo",
                "Por favor intenta de nuevo.".to_string(),
            ),
            AppError::ServerValidationFailed(msg) => (
                DialogIcon::Error,
                "Error al procesar el archivo",
                format!("Error: {}", msg),
            ),
            AppError::SaveRequestFailed(_) | AppError::RequestTimeout(RequestKind::Save) => (
                DialogIcon::Error,
                "Error de red",
                "No se pudo guardar los participantes. Por favor intenta de nuevo.".to_string(),
            ),
            AppError::ServerSaveFailed(msg) => {
                (DialogIcon::Error, "Error al guardar", msg.clone())
            }
            AppError::NothingToCommit => (
                DialogIcon::Warning,
                "No hay datos válidos",
                "Por favor verifica los datos y vuelve a intentar.".to_string(),
            ),
            AppError::RequestInFlight(_)
            | AppError::SessionExpired
            | AppError::InvalidStep { .. }
            | AppError::ConfigError(_)
            | AppError::IoError(_)
            | AppError::Internal(_) => return None,
        };

        Some(ErrorNotice {
            icon,
            title: title.to_string(),
            text,
        })
    }
}
