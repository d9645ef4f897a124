//! `pep-model` defines the in-memory data structures behind the PEP/PrEP dashboard.
//!
//! The crate is kept free of I/O so it can be shared by:
//! - the query engine (`pep-query`: filtering, summaries, grouped counts)
//! - the spreadsheet/CSV loaders and the CSV exporter (`pep-io`)
//! - the view-model layer and CLI (`pep-dashboard`) via `serde`

#![forbid(unsafe_code)]

mod bitmap;
mod dataset;
pub mod date;
mod schema;
mod value;

pub use bitmap::RowMask;
pub use dataset::{Dataset, DatasetError, ParseOptions, Record};
pub use date::DateOrder;
pub use schema::{DatasetVariant, DimensionSpec, RegionCode, UnknownVariant, VariantSchema};
pub use value::{RawCell, RawTable};
