mod app;
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;

pub use app::run;
pub use application::ParticipantImportUseCase;
pub use domain::error::{AppError, Result};
pub use infrastructure::collaborators::{HttpImportCollaborator, ImportCollaborator};
pub use infrastructure::config::{AppConfig, ConfigService};
pub use interfaces::view::ImportView;
