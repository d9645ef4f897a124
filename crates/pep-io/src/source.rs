use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};
use log::{debug, info};
use pep_model::{
    Dataset, DatasetError, DatasetVariant, DateOrder, ParseOptions, RawCell, RawTable,
    VariantSchema,
};
use thiserror::Error;

use crate::csv_source::{read_csv_table, CsvReadError, TextEncoding};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    /// Any workbook `calamine` can open (`.xlsx`, `.xlsm`, `.xlsb`, `.xls`, `.ods`).
    Spreadsheet,
    Csv,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "xla" | "xlam" | "ods" => {
                Some(SourceFormat::Spreadsheet)
            }
            "csv" | "txt" => Some(SourceFormat::Csv),
            _ => None,
        }
    }
}

/// Where a dataset variant lives: a file plus, for workbooks, the sheet name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DataSource {
    pub path: PathBuf,
    /// Ignored for CSV files.
    pub sheet: String,
}

impl DataSource {
    pub fn new(path: impl Into<PathBuf>, sheet: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            sheet: sheet.into(),
        }
    }

    pub fn csv(path: impl Into<PathBuf>) -> Self {
        Self::new(path, String::new())
    }

    pub fn format(&self) -> Option<SourceFormat> {
        SourceFormat::from_path(&self.path)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadOptions {
    pub date_order: DateOrder,
    /// Text decoding for CSV sources.
    pub encoding: TextEncoding,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("data file `{}` was not found", .path.display())]
    NotFound { path: PathBuf },
    #[error("the {variant} data in `{}` is empty", .path.display())]
    Empty {
        path: PathBuf,
        variant: DatasetVariant,
    },
    #[error(
        "the {variant} data in `{}` is missing required column(s): {}",
        .path.display(),
        .missing.join(", ")
    )]
    Malformed {
        path: PathBuf,
        variant: DatasetVariant,
        missing: Vec<String>,
    },
    #[error(
        "sheet `{sheet}` was not found in `{}` (available: {})",
        .path.display(),
        .available.join(", ")
    )]
    SheetNotFound {
        path: PathBuf,
        sheet: String,
        available: Vec<String>,
    },
    #[error(
        "`{}` is not a supported data file (expected .xlsx, .xlsm, .xlsb, .xls, .ods or .csv)",
        .path.display()
    )]
    UnsupportedFormat { path: PathBuf },
    #[error("failed to read spreadsheet `{}`: {reason}", .path.display())]
    Spreadsheet { path: PathBuf, reason: String },
    #[error("failed to read CSV `{}`: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: CsvReadError,
    },
    #[error("failed to read `{}`: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LoadError {
    fn from_dataset(path: &Path, err: DatasetError) -> Self {
        let path = path.to_path_buf();
        match err {
            DatasetError::Empty { variant } => LoadError::Empty { path, variant },
            DatasetError::Malformed { variant, missing } => LoadError::Malformed {
                path,
                variant,
                missing,
            },
        }
    }

    fn io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            return LoadError::NotFound {
                path: path.to_path_buf(),
            };
        }
        LoadError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Load one dataset variant from `source`.
///
/// Loading is a pure function of the file contents, so callers may memoize it by source
/// identity (see [`crate::DatasetCache`]). No partial dataset is ever returned.
pub fn load(
    source: &DataSource,
    schema: &VariantSchema,
    options: &LoadOptions,
) -> Result<Dataset, LoadError> {
    let path = source.path.as_path();
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => {}
        Ok(_) => {
            return Err(LoadError::NotFound {
                path: path.to_path_buf(),
            })
        }
        Err(err) => return Err(LoadError::io(path, err)),
    }

    let format = source
        .format()
        .ok_or_else(|| LoadError::UnsupportedFormat {
            path: path.to_path_buf(),
        })?;

    let table = match format {
        SourceFormat::Spreadsheet => read_sheet(path, &source.sheet)?,
        SourceFormat::Csv => {
            let file = File::open(path).map_err(|err| LoadError::io(path, err))?;
            read_csv_table(BufReader::new(file), options.encoding).map_err(|source| {
                LoadError::Csv {
                    path: path.to_path_buf(),
                    source,
                }
            })?
        }
    };

    let parse = ParseOptions {
        date_order: options.date_order,
    };
    let dataset = Dataset::from_raw_table(schema.clone(), table, &parse)
        .map_err(|err| LoadError::from_dataset(path, err))?;

    info!(
        "loaded {} {} records from `{}`",
        dataset.len(),
        dataset.variant(),
        path.display()
    );
    Ok(dataset)
}

fn read_sheet(path: &Path, sheet: &str) -> Result<RawTable, LoadError> {
    let spreadsheet_error = |err: calamine::Error| LoadError::Spreadsheet {
        path: path.to_path_buf(),
        reason: err.to_string(),
    };

    let mut workbook = open_workbook_auto(path).map_err(spreadsheet_error)?;
    let sheet_names = workbook.sheet_names();
    if !sheet_names.iter().any(|name| name == sheet) {
        return Err(LoadError::SheetNotFound {
            path: path.to_path_buf(),
            sheet: sheet.to_owned(),
            available: sheet_names,
        });
    }

    let range = workbook.worksheet_range(sheet).map_err(spreadsheet_error)?;
    debug!(
        "sheet `{sheet}` in `{}` spans {:?}",
        path.display(),
        range.get_size()
    );

    let rows = range
        .rows()
        .map(|row| row.iter().map(convert_cell).collect::<Vec<_>>());
    Ok(RawTable::from_rows(rows).unwrap_or_default())
}

fn convert_cell(cell: &Data) -> RawCell {
    match cell {
        Data::Empty => RawCell::Empty,
        Data::String(s) => RawCell::Text(s.clone()),
        Data::Float(f) => RawCell::Number(*f),
        Data::Int(i) => RawCell::Number(*i as f64),
        Data::Bool(b) => RawCell::Bool(*b),
        Data::DateTime(dt) => RawCell::DateSerial(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => RawCell::Text(s.clone()),
        Data::Error(err) => {
            debug!("treating spreadsheet error cell {err:?} as empty");
            RawCell::Empty
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_is_inferred_from_extension() {
        assert_eq!(
            SourceFormat::from_path(Path::new("data/pep_data.XLSX")),
            Some(SourceFormat::Spreadsheet)
        );
        assert_eq!(
            SourceFormat::from_path(Path::new("pep.csv")),
            Some(SourceFormat::Csv)
        );
        assert_eq!(SourceFormat::from_path(Path::new("pep.json")), None);
        assert_eq!(SourceFormat::from_path(Path::new("pep")), None);
    }

    #[test]
    fn spreadsheet_cells_convert_to_raw_cells() {
        assert_eq!(convert_cell(&Data::Int(3)), RawCell::Number(3.0));
        assert_eq!(
            convert_cell(&Data::String("RJ".to_owned())),
            RawCell::text("RJ")
        );
        assert_eq!(
            convert_cell(&Data::DateTimeIso("2021-01-01T00:00:00".to_owned())),
            RawCell::text("2021-01-01T00:00:00")
        );
        assert_eq!(
            convert_cell(&Data::Error(calamine::CellErrorType::NA)),
            RawCell::Empty
        );
    }
}
