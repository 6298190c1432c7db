use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, DataType, Range, Reader};
use tracing::{debug, warn};

use crate::domain::error::{AppError, Result};
use crate::domain::spreadsheet::{SelectedFile, SheetTable};
use crate::infrastructure::csv::CsvParser;

const TEXT_EXTENSIONS: [&str; 2] = ["csv", "txt"];

/// Reads the first worksheet of an uploaded spreadsheet into a text table.
#[derive(Default)]
pub struct SpreadsheetReader {
    csv: CsvParser,
}

impl SpreadsheetReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read_first_sheet(&self, file: &SelectedFile) -> Result<SheetTable> {
        if file.bytes.is_empty() {
            return Err(AppError::EmptyOrInvalidFile(format!(
                "{} is empty",
                file.file_name
            )));
        }

        let is_text = file
            .extension()
            .map(|ext| TEXT_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false);

        let rows = if is_text {
            self.csv.parse_bytes(&file.bytes)?
        } else {
            read_workbook(file)?
        };

        let table = SheetTable::new(rows);
        debug!(
            file_name = %file.file_name,
            rows = table.rows.len(),
            "Spreadsheet parsed"
        );
        Ok(table)
    }
}

fn read_workbook(file: &SelectedFile) -> Result<Vec<Vec<String>>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(file.bytes.clone())).map_err(|e| {
        warn!(file_name = %file.file_name, error = %e, "Failed to open workbook");
        AppError::EmptyOrInvalidFile(format!("Failed to open workbook: {}", e))
    })?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::EmptyOrInvalidFile("No worksheet found".to_string()))?
        .map_err(|e| AppError::EmptyOrInvalidFile(format!("Failed to read worksheet: {}", e)))?;

    Ok(range_to_rows(&range))
}

fn range_to_rows(range: &Range<Data>) -> Vec<Vec<String>> {
    range
        .rows()
        .map(|row| {
            row.iter()
                .map(|cell| cell.as_string().unwrap_or_else(|| cell.to_string()))
                .collect()
        })
        .collect()
}

/// Workbooks built in memory for tests.
#[cfg(test)]
pub(crate) mod fixtures {
    use std::io::{Cursor, Write};

    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/worksheets/sheet2.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;

    const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

    const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Participantes" sheetId="1" r:id="rId1"/><sheet name="Notas" sheetId="2" r:id="rId2"/></sheets></workbook>"#;

    const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet2.xml"/></Relationships>"#;

    /// Sheet 1 holds the participants; sheet 2 has unrelated notes.
    pub fn two_sheet_workbook() -> Vec<u8> {
        let participants = sheet_xml(&[
            &["Cédula", "Nombre", "Correo", "Teléfono", "Edad"],
            &["0102030405", "Ana Pérez", "ana@x.com", "0991234567", "17"],
            &["0911111111", "Luis", "luis@x.com", "", "34"],
        ]);
        let notes = sheet_xml(&[&["Comentario", "Autor"], &["no importar", "admin"]]);

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        for (name, body) in [
            ("[Content_Types].xml", CONTENT_TYPES),
            ("_rels/.rels", ROOT_RELS),
            ("xl/workbook.xml", WORKBOOK),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
            ("xl/worksheets/sheet1.xml", participants.as_str()),
            ("xl/worksheets/sheet2.xml", notes.as_str()),
        ] {
            writer.start_file(name, options).unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    /// Cells without a leading zero that parse as numbers are stored as numbers,
    /// everything else as inline strings. Empty cells are left out.
    fn sheet_xml(rows: &[&[&str]]) -> String {
        let mut body = String::new();
        for (r, row) in rows.iter().enumerate() {
            body.push_str(&format!(r#"<row r="{}">"#, r + 1));
            for (c, value) in row.iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                let cell_ref = format!("{}{}", (b'A' + c as u8) as char, r + 1);
                if value.parse::<f64>().is_ok() && !value.starts_with('0') {
                    body.push_str(&format!(r#"<c r="{}"><v>{}</v></c>"#, cell_ref, value));
                } else {
                    body.push_str(&format!(
                        r#"<c r="{}" t="inlineStr"><is><t>{}</t></is></c>"#,
                        cell_ref, value
                    ));
                }
            }
            body.push_str("</row>");
        }
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{}</sheetData></worksheet>"#,
            body
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_csv_by_extension() {
        let file = SelectedFile::new(
            "participantes.csv",
            b"ID,Nombre,Correo\n123,Ana,a@x.com\n,,\n".to_vec(),
        );
        let table = SpreadsheetReader::new().read_first_sheet(&file).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.headers().unwrap().len(), 3);
    }

    #[test]
    fn test_reads_only_first_worksheet_of_xlsx() {
        let file = SelectedFile::new("participantes.xlsx", fixtures::two_sheet_workbook());
        let table = SpreadsheetReader::new().read_first_sheet(&file).unwrap();

        assert_eq!(table.rows.len(), 3);
        assert_eq!(
            table.rows[0],
            vec!["Cédula", "Nombre", "Correo", "Teléfono", "Edad"]
        );
        assert_eq!(
            table.rows[1],
            vec!["0102030405", "Ana Pérez", "ana@x.com", "0991234567", "17"]
        );
        assert_eq!(table.rows[2][3], "");
        assert_eq!(table.rows[2][4], "34");
        assert!(table
            .rows
            .iter()
            .flatten()
            .all(|cell| cell != "Comentario" && cell != "no importar"));
    }

    #[test]
    fn test_empty_bytes_rejected() {
        let file = SelectedFile::new("vacio.xlsx", Vec::new());
        assert!(matches!(
            SpreadsheetReader::new().read_first_sheet(&file),
            Err(AppError::EmptyOrInvalidFile(_))
        ));
    }

    #[test]
    fn test_garbage_workbook_rejected() {
        let file = SelectedFile::new("roto.xlsx", b"definitely not a zip archive".to_vec());
        assert!(matches!(
            SpreadsheetReader::new().read_first_sheet(&file),
            Err(AppError::EmptyOrInvalidFile(_))
        ));
    }

    #[test]
    fn test_range_cells_rendered_as_text() {
        let mut range: Range<Data> = Range::new((0, 0), (1, 1));
        range.set_value((0, 0), Data::String("ID".to_string()));
        range.set_value((0, 1), Data::String("Edad".to_string()));
        range.set_value((1, 0), Data::String("0102030405".to_string()));
        range.set_value((1, 1), Data::Float(17.0));

        let rows = range_to_rows(&range);
        assert_eq!(rows[0], vec!["ID", "Edad"]);
        assert_eq!(rows[1], vec!["0102030405", "17"]);
    }
}
