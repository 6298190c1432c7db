use serde::{Deserialize, Serialize};

use crate::domain::error::{AppError, Result};

/// A spreadsheet picked by the user, kept in memory for the whole modal session so it
/// can be re-sent to the process endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Reads a file from disk. An unreadable file is treated like an invalid upload.
    pub fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            AppError::EmptyOrInvalidFile(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(file_name, bytes))
    }

    /// Lowercased extension of the file name, if any.
    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
    }
}

/// Row-oriented contents of the first worksheet, every cell rendered as text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetTable {
    pub rows: Vec<Vec<String>>,
}

impl SheetTable {
    /// Builds a table, dropping trailing rows whose cells are all blank.
    pub fn new(mut rows: Vec<Vec<String>>) -> Self {
        while rows
            .last()
            .map(|row| row_is_blank(row))
            .unwrap_or(false)
        {
            rows.pop();
        }
        Self { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Data rows below the header row, paired with their 1-based sheet row number.
    pub fn data_rows(&self) -> impl Iterator<Item = (usize, &Vec<String>)> {
        self.rows.iter().enumerate().skip(1).map(|(idx, row)| (idx + 1, row))
    }

    pub fn headers(&self) -> Result<SpreadsheetHeaders> {
        match self.rows.first() {
            Some(first) if !row_is_blank(first) => Ok(SpreadsheetHeaders::new(first.clone())),
            Some(_) => Err(AppError::EmptyOrInvalidFile(
                "first row has no values".to_string(),
            )),
            None => Err(AppError::EmptyOrInvalidFile(
                "worksheet has no rows".to_string(),
            )),
        }
    }
}

pub fn row_is_blank(row: &[String]) -> bool {
    row.iter().all(|cell| cell.trim().is_empty())
}

/// Column labels from the first row of the sheet. Column numbers are 1-based.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpreadsheetHeaders {
    labels: Vec<String>,
}

impl SpreadsheetHeaders {
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn contains_column(&self, column: usize) -> bool {
        column >= 1 && column <= self.labels.len()
    }

    pub fn label(&self, column: usize) -> Option<&str> {
        column
            .checked_sub(1)
            .and_then(|idx| self.labels.get(idx))
            .map(String::as_str)
    }

    /// `"{index}. {header}"`, falling back to `"Columna {index}"` for blank headers.
    pub fn option_label(&self, column: usize) -> String {
        match self.label(column).map(str::trim) {
            Some(header) if !header.is_empty() => format!("{}. {}", column, header),
            _ => format!("{}. Columna {}", column, column),
        }
    }

    /// 1-based column numbers.
    pub fn columns(&self) -> impl Iterator<Item = usize> {
        1..=self.labels.len()
    }
}
