//! I/O around the PEP/PrEP query engine.
//!
//! - [`load`] reads a dataset from a spreadsheet sheet (via `calamine`) or a CSV file
//! - [`to_csv`] / [`write_export`] serialize a filtered view as BOM-prefixed UTF-8 CSV
//! - [`DatasetCache`] memoizes loads by source identity with an LRU bound and a TTL

#![forbid(unsafe_code)]

mod cache;
mod csv_source;
mod export;
mod fs;
mod source;

pub use crate::cache::{CacheConfig, CacheKey, CacheStats, DatasetCache};
pub use crate::csv_source::{read_csv_table, CsvReadError, TextEncoding};
pub use crate::export::{to_csv, write_csv, write_export, ExportError, UTF8_BOM};
pub use crate::fs::{atomic_write, AtomicWriteError};
pub use crate::source::{load, DataSource, LoadError, LoadOptions, SourceFormat};
