use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::info;
use pep_query::FilteredView;
use thiserror::Error;

use crate::fs::{atomic_write, AtomicWriteError};

/// Byte-order mark prefixed to exports so spreadsheet tools detect UTF-8.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to encode CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to write export: {0}")]
    Io(#[from] io::Error),
}

impl From<AtomicWriteError<ExportError>> for ExportError {
    fn from(err: AtomicWriteError<ExportError>) -> Self {
        match err {
            AtomicWriteError::Io(err) => ExportError::Io(err),
            AtomicWriteError::Writer(err) => err,
        }
    }
}

/// Stream a view as CSV: BOM, the dataset's header row, then the view's rows in order.
///
/// Fields containing commas, quotes or line breaks are quoted RFC-4180 style.
pub fn write_csv<W: Write>(view: &FilteredView<'_>, mut out: W) -> Result<(), ExportError> {
    out.write_all(UTF8_BOM)?;

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(out);
    writer.write_record(view.dataset().headers())?;
    for record in view.records() {
        writer.write_record(record.fields())?;
    }
    writer.flush()?;
    Ok(())
}

/// In-memory CSV export of a view.
///
/// Writing into a `Vec` cannot fail on I/O; the `Result` mirrors [`write_csv`].
pub fn to_csv(view: &FilteredView<'_>) -> Result<Vec<u8>, ExportError> {
    let mut bytes = Vec::new();
    write_csv(view, &mut bytes)?;
    Ok(bytes)
}

/// Atomically write `<variant>_filtered.csv` into `dir` and return its path.
pub fn write_export(view: &FilteredView<'_>, dir: impl AsRef<Path>) -> Result<PathBuf, ExportError> {
    let variant = view.dataset().variant();
    let dest = dir.as_ref().join(variant.export_file_name());
    atomic_write(&dest, |file| write_csv(view, file))?;
    info!(
        "exported {} {variant} records to `{}`",
        view.len(),
        dest.display()
    );
    Ok(dest)
}
