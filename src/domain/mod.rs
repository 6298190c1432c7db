pub mod column_mapping;
pub mod error;
pub mod import_field;
pub mod import_outcome;
pub mod spreadsheet;
pub mod wizard_session;
