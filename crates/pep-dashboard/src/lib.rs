//! Page rendering for the PEP/PrEP surveillance dashboard.
//!
//! [`Dashboard::render_page`] turns the UI's [`PageState`] into a [`ViewModel`] (notices,
//! summary cards, chart specs and a CSV export) so any shell can draw it without re-running
//! queries itself.

#![forbid(unsafe_code)]

mod config;
mod dashboard;
mod view;

use thiserror::Error;

pub use crate::config::{CacheSettings, ConfigError, DashboardConfig, VariantConfig};
pub use crate::dashboard::{Dashboard, NO_DATA_MESSAGE};
pub use crate::view::{
    AppliedFilters, ChartSpec, ExportArtifact, Notice, NoticeLevel, Page, PageState,
    UnknownPage, ViewModel,
};

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Load(#[from] pep_io::LoadError),
    #[error(transparent)]
    Export(#[from] pep_io::ExportError),
}
