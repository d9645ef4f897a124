use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, warn};
use pep_io::{load, to_csv, write_export, CacheKey, DatasetCache, LoadError};
use pep_model::{Dataset, DatasetVariant};
use pep_query::{
    date_range, filter, group_counts, summarize, DateWindow, DisplayMode, FilterCriteria,
    FilteredView,
};

use crate::config::DashboardConfig;
use crate::view::{AppliedFilters, ChartSpec, ExportArtifact, Notice, Page, PageState, ViewModel};
use crate::DashboardError;

pub const NO_DATA_MESSAGE: &str = "No data available for the selected filters.";

const HOME_TITLE: &str = "PEP/PrEP surveillance dashboard";

const HOME_BODY: &str = "\
This dashboard visualizes and compares HIV post-exposure prophylaxis (PEP) and pre-exposure \
prophylaxis (PrEP) dispensing among vulnerable populations in Bahia (BA) and Rio de Janeiro (RJ).

BA and RJ have similar populations (about 14.8 and 16.7 million), yet roughly 90% of the \
records come from RJ. BA covers a far larger, more rural area, RJ concentrates more urban \
health infrastructure, and collection coverage is better in urban areas. Keep the imbalance \
in mind when comparing the two regions.";

/// Renders page view models over cached datasets.
///
/// Shareable across threads: datasets are immutable and the cache is internally locked.
#[derive(Debug)]
pub struct Dashboard {
    config: DashboardConfig,
    cache: DatasetCache,
}

impl Dashboard {
    pub fn new(config: DashboardConfig) -> Self {
        let cache = DatasetCache::new(config.cache.into());
        Self { config, cache }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn cache(&self) -> &DatasetCache {
        &self.cache
    }

    /// Load a variant's dataset through the cache.
    pub fn dataset(&self, variant: DatasetVariant) -> Result<Arc<Dataset>, LoadError> {
        let source = self.config.source_for(variant);
        let schema = &self.config.variant(variant).schema;
        let key = CacheKey::new(source.clone(), variant);
        self.cache
            .get_or_load(&key, || load(&source, schema, &self.config.load_options()))
    }

    /// Resolve the page state into criteria, defaulting unset filters.
    pub fn criteria(&self, dataset: &Dataset, state: &PageState) -> FilterCriteria {
        let regions = state
            .regions
            .clone()
            .unwrap_or_else(|| self.config.known_regions.clone());
        let default_window = date_range(dataset).unwrap_or(self.config.fallback_window);
        let window = DateWindow::new(
            state.start.unwrap_or(default_window.start),
            state.end.unwrap_or(default_window.end),
        );
        FilterCriteria::new(regions, window)
    }

    /// Compute the complete view model for one page.
    ///
    /// Never fails: load and query problems become notices on the returned model.
    pub fn render_page(&self, state: &PageState) -> ViewModel {
        match state.page.variant() {
            None => {
                let mut view = ViewModel::new(Page::Home, HOME_TITLE);
                view.body = Some(HOME_BODY.to_owned());
                view.notices.push(Notice::info(
                    "The data shown is synthetic or reduced for testing and development.",
                ));
                view
            }
            Some(variant) => self.render_variant(variant, state),
        }
    }

    fn render_variant(&self, variant: DatasetVariant, state: &PageState) -> ViewModel {
        let config = self.config.variant(variant);
        let mut model = ViewModel::new(Page::from(variant), config.title.clone());

        let dataset = match self.dataset(variant) {
            Ok(dataset) => dataset,
            Err(err) => {
                warn!("{variant} page: {err}");
                model.notices.push(Notice::error(err.to_string()));
                return model;
            }
        };

        model.body = config
            .source_url
            .as_ref()
            .map(|url| format!("Data source: {url}"));
        if let Some(caveat) = &config.caveat {
            model.notices.push(Notice::warning(caveat.clone()));
        }

        let criteria = self.criteria(&dataset, state);
        let view = filter(&dataset, &criteria);
        if let Some(invalid) = view.invalid_range() {
            model.notices.push(Notice::warning(invalid.to_string()));
        }
        model.filters = Some(AppliedFilters {
            regions: criteria.regions().iter().cloned().collect(),
            requested: criteria.window(),
            applied: view.window(),
            available: date_range(&dataset),
        });

        if view.is_empty() {
            model.notices.push(Notice::warning(NO_DATA_MESSAGE));
            return model;
        }

        model.summary = Some(summarize(&view, &self.config.known_regions));
        self.push_charts(&mut model, &view);
        model.export = match to_csv(&view) {
            Ok(bytes) => Some(ExportArtifact::new(variant.export_file_name(), bytes)),
            Err(err) => {
                model.notices.push(Notice::error(err.to_string()));
                None
            }
        };

        debug!(
            "rendered {variant} page: {} of {} records, {} charts",
            view.len(),
            dataset.len(),
            model.charts.len()
        );
        model
    }

    /// One percent chart per dimension, then raw-count charts for flagged dimensions.
    fn push_charts(&self, model: &mut ViewModel, view: &FilteredView<'_>) {
        let dataset = view.dataset();
        let schema = dataset.schema();
        let color_column = schema.region_column.as_str();

        let mut raw = Vec::new();
        for dimension in &schema.dimensions {
            let counts = match group_counts(view, &dimension.column) {
                Ok(counts) => counts,
                Err(err) => {
                    model.notices.push(Notice::error(err.to_string()));
                    continue;
                }
            };
            if dimension.raw_counts {
                raw.push(ChartSpec::new(
                    dimension,
                    color_column,
                    DisplayMode::Count,
                    counts.clone(),
                ));
            }
            model.charts.push(ChartSpec::new(
                dimension,
                color_column,
                DisplayMode::Percent,
                counts,
            ));
        }
        model.charts.extend(raw);
    }

    /// Filter a variant with `state`'s filters and write `<variant>_filtered.csv` into `dir`.
    pub fn export_filtered(
        &self,
        variant: DatasetVariant,
        state: &PageState,
        dir: impl AsRef<Path>,
    ) -> Result<PathBuf, DashboardError> {
        let dataset = self.dataset(variant)?;
        let criteria = self.criteria(&dataset, state);
        let view = filter(&dataset, &criteria);
        Ok(write_export(&view, dir)?)
    }
}
