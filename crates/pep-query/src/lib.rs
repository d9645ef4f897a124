//! Query engine for PEP/PrEP datasets.
//!
//! Every operation here is a pure function of its inputs:
//! - [`date_range`] / [`filter`] select records by region and event date
//! - [`summarize`] computes totals and per-region shares
//! - [`group_counts`] computes per-(category, region) counts for grouped histograms

#![forbid(unsafe_code)]

mod criteria;
mod filter;
mod group;
mod summary;

pub use crate::criteria::{DateWindow, FilterCriteria};
pub use crate::filter::{date_range, filter, FilteredView, InvalidRange, RangeIssue};
pub use crate::group::{group_counts, DisplayMode, GroupCount, GroupCounts};
pub use crate::summary::{percentage, summarize, RegionShare, SummaryMetrics};

use pep_model::DatasetVariant;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("column `{column}` does not exist in the {variant} dataset")]
    UnknownColumn {
        variant: DatasetVariant,
        column: String,
    },
}
