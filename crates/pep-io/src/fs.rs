//! Atomic file writes for exports.
//!
//! The export is written to a temp file in the destination directory (so the final rename
//! never crosses devices), flushed and synced, then renamed over the destination.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AtomicWriteError<E> {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("write error: {0}")]
    Writer(E),
}

fn parent_dir_or_dot(path: &Path) -> &Path {
    // `Path::parent` is `Some("")` for bare file names like `pep_filtered.csv`.
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

/// Atomically replace `dest` with whatever `write_fn` writes.
///
/// Parent directories are created as needed. If `write_fn` fails, `dest` is left untouched
/// and the temp file is removed.
pub fn atomic_write<T, E>(
    dest: impl AsRef<Path>,
    write_fn: impl FnOnce(&mut File) -> Result<T, E>,
) -> Result<T, AtomicWriteError<E>> {
    let dest = dest.as_ref();
    let dir = parent_dir_or_dot(dest);
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    let out = write_fn(tmp.as_file_mut()).map_err(AtomicWriteError::Writer)?;

    tmp.as_file_mut().flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(dest).map_err(|err| AtomicWriteError::Io(err.error))?;

    // Best-effort: the file is already in place if syncing the directory fails.
    let _ = File::open(dir).and_then(|d| d.sync_all());

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_write_creates_missing_parent_directories() {
        let tmp = tempfile::tempdir().expect("temp dir");
        let dest = tmp.path().join("exports").join("pep_filtered.csv");
        atomic_write(&dest, |file| file.write_all(b"a,b\n")).expect("atomic write");
        assert_eq!(std::fs::read(&dest).expect("read dest"), b"a,b\n");
    }

    #[test]
    fn failed_write_keeps_existing_file_and_cleans_up() {
        let tmp = tempfile::tempdir().expect("temp dir");
        let dest = tmp.path().join("pep_filtered.csv");
        std::fs::write(&dest, b"previous export").expect("seed dest");

        let err = atomic_write(&dest, |file| {
            file.write_all(b"partial").expect("write to temp file");
            Err::<(), _>(io::Error::new(io::ErrorKind::Other, "simulated failure"))
        })
        .expect_err("write should fail");
        assert!(matches!(err, AtomicWriteError::Writer(_)));

        assert_eq!(std::fs::read(&dest).expect("read dest"), b"previous export");
        let files: Vec<_> = std::fs::read_dir(tmp.path())
            .expect("read_dir")
            .map(|e| e.expect("dir entry").path())
            .collect();
        assert_eq!(files, vec![dest]);
    }
}
