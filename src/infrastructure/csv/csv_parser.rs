// ============================================================
// CSV PARSER
// ============================================================
// Reads delimited text exports of the participant sheet

use std::borrow::Cow;

use csv::{ReaderBuilder, Trim};
use encoding_rs::WINDOWS_1252;

use crate::domain::error::{AppError, Result};

/// CSV parser with delimiter and encoding detection. Values are always trimmed.
#[derive(Default)]
pub struct CsvParser {
    /// Delimiter byte; detected from the content when `None`
    delimiter: Option<u8>,
}

impl CsvParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a fixed delimiter instead of detecting one
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    /// Parse raw bytes into rows. The header row is returned as row 0.
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<Vec<Vec<String>>> {
        let content = decode(bytes);
        self.parse_content(&content)
    }

    /// Parse CSV content from string. Every line becomes one row, empty lines
    /// included, so row `n` of the result is line `n + 1` of the sheet.
    pub fn parse_content(&self, content: &str) -> Result<Vec<Vec<String>>> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let delimiter = self
            .delimiter
            .unwrap_or_else(|| Self::detect_delimiter(content));
        let content = keep_blank_lines(content);

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .trim(Trim::All)
            .flexible(true) // Allow rows with different lengths
            .from_reader(content.as_bytes());

        let mut rows = Vec::new();
        for (index, result) in reader.records().enumerate() {
            let record = result.map_err(|e| {
                AppError::EmptyOrInvalidFile(format!(
                    "Failed to parse CSV row {}: {}",
                    index + 1,
                    e
                ))
            })?;
            rows.push(record.iter().map(|value| value.to_string()).collect());
        }

        Ok(rows)
    }

    /// Detect delimiter from content (comma, semicolon, tab, pipe)
    pub fn detect_delimiter(content: &str) -> u8 {
        let candidates = [b',', b';', b'\t', b'|'];
        let sample_lines: Vec<_> = content.lines().take(10).collect();
        if sample_lines.is_empty() {
            return b',';
        }

        let mut best_delimiter = b',';
        let mut best_score = 0.0f32;

        for &delimiter in &candidates {
            let field_counts: Vec<usize> = sample_lines
                .iter()
                .map(|line| line.bytes().filter(|&b| b == delimiter).count())
                .collect();

            // Score by consistency (low standard deviation) and frequency
            let avg = field_counts.iter().sum::<usize>() as f32 / field_counts.len() as f32;
            let variance = field_counts
                .iter()
                .map(|&x| (x as f32 - avg).powi(2))
                .sum::<f32>()
                / field_counts.len() as f32;

            let score = avg / (1.0 + variance.sqrt());

            if score > best_score {
                best_score = score;
                best_delimiter = delimiter;
            }
        }

        best_delimiter
    }
}

/// The csv reader drops empty lines. Each one outside a quoted field is replaced by
/// a single empty quoted value so it still yields a (blank) row.
fn keep_blank_lines(content: &str) -> Cow<'_, str> {
    let lines: Vec<&str> = content.split('\n').collect();
    let last = lines.len() - 1;
    let mut in_quotes = false;
    let mut blank = vec![false; lines.len()];

    for (index, line) in lines.iter().enumerate() {
        // The piece after the final newline is not a line.
        if !in_quotes && index < last && line.trim_end_matches('\r').is_empty() {
            blank[index] = true;
        }
        if line.bytes().filter(|&b| b == b'"').count() % 2 == 1 {
            in_quotes = !in_quotes;
        }
    }

    if !blank.contains(&true) {
        return Cow::Borrowed(content);
    }
    let rebuilt: Vec<&str> = lines
        .iter()
        .zip(&blank)
        .map(|(&line, &is_blank)| if is_blank { "\"\"" } else { line })
        .collect();
    Cow::Owned(rebuilt.join("\n"))
}

/// UTF-8 first, Windows-1252 for legacy spreadsheet exports.
fn decode(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(content) => content.to_string(),
        Err(_) => {
            let (content, _, _) = WINDOWS_1252.decode(bytes);
            content.into_owned()
        }
    }
}
