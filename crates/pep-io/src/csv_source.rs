use std::borrow::Cow;
use std::io::Read;

use csv::ByteRecord;
use encoding_rs::WINDOWS_1252;
use pep_model::{RawCell, RawTable};
use thiserror::Error;

/// How to decode raw CSV bytes into text fields.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextEncoding {
    /// Decode as UTF-8; fields with invalid UTF-8 fall back to Windows-1252.
    ///
    /// Spreadsheet tools on Windows commonly save Portuguese text as CP-1252.
    #[default]
    Auto,
    /// Decode as UTF-8 and reject invalid byte sequences.
    Utf8,
    /// Decode as Windows-1252 (aka CP-1252).
    Windows1252,
}

#[derive(Debug, Error)]
pub enum CsvReadError {
    #[error("csv parse error at row {row}, column {column}: {reason}")]
    Parse { row: u64, column: u64, reason: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Read a CSV stream into a [`RawTable`] whose first non-blank row is the header.
///
/// Rows may have varying widths. An input without any rows yields an empty table.
pub fn read_csv_table<R: Read>(reader: R, encoding: TextEncoding) -> Result<RawTable, CsvReadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        // Headers are handled by `RawTable::from_rows` so blank leading rows are skipped
        // the same way as for spreadsheets.
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut record = ByteRecord::new();
    let mut rows: Vec<Vec<RawCell>> = Vec::new();
    let mut row: u64 = 0;

    loop {
        match csv_reader.read_byte_record(&mut record) {
            Ok(false) => break,
            Ok(true) => {
                row += 1;
                let mut cells = Vec::with_capacity(record.len());
                for (idx, field) in record.iter().enumerate() {
                    let text = decode_field(field, row, idx as u64 + 1, encoding)?;
                    cells.push(if text.is_empty() {
                        RawCell::Empty
                    } else {
                        RawCell::Text(text.into_owned())
                    });
                }
                rows.push(cells);
            }
            Err(err) => return Err(map_csv_error(err, row + 1)),
        }
    }

    Ok(RawTable::from_rows(rows).unwrap_or_default())
}

fn decode_field(
    field: &[u8],
    row: u64,
    column: u64,
    encoding: TextEncoding,
) -> Result<Cow<'_, str>, CsvReadError> {
    // Excel-exported CSVs (and our own exports) start with a UTF-8 BOM.
    let field = if row == 1 && column == 1 {
        field.strip_prefix(crate::export::UTF8_BOM).unwrap_or(field)
    } else {
        field
    };

    match encoding {
        TextEncoding::Utf8 => {
            std::str::from_utf8(field)
                .map(Cow::Borrowed)
                .map_err(|e| CsvReadError::Parse {
                    row,
                    column,
                    reason: format!("invalid UTF-8: {e}"),
                })
        }
        TextEncoding::Windows1252 => {
            let (text, _, _) = WINDOWS_1252.decode(field);
            Ok(text)
        }
        TextEncoding::Auto => match std::str::from_utf8(field) {
            Ok(text) => Ok(Cow::Borrowed(text)),
            Err(_) => {
                let (text, _, _) = WINDOWS_1252.decode(field);
                Ok(text)
            }
        },
    }
}

fn map_csv_error(err: csv::Error, fallback_row: u64) -> CsvReadError {
    let reason = err.to_string();
    let pos = err.position().cloned();

    match err.into_kind() {
        csv::ErrorKind::Io(e) => CsvReadError::Io(e),
        _ => {
            let row = pos
                .map(|p| p.record() + 1)
                .filter(|r| *r > 0)
                .unwrap_or(fallback_row);
            CsvReadError::Parse {
                row,
                column: 0,
                reason,
            }
        }
    }
}
