pub mod import_presenter;
pub mod participant_import;
pub mod participant_rules;
