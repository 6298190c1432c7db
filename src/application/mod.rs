pub mod use_cases;

pub use use_cases::participant_import::ParticipantImportUseCase;
