pub mod collaborators;
pub mod config;
pub mod csv;
pub mod html;
pub mod spreadsheet;
