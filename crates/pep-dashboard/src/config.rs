use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use pep_io::{CacheConfig, DataSource, LoadOptions};
use pep_model::{DatasetVariant, DateOrder, RegionCode, VariantSchema};
use pep_query::DateWindow;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config `{}`: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Per-variant page and data settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantConfig {
    pub schema: VariantSchema,
    /// Worksheet holding this variant's records (ignored for CSV sources).
    pub sheet: String,
    /// Overrides [`DashboardConfig::workbook`] for this variant.
    #[serde(default)]
    pub path: Option<PathBuf>,
    pub title: String,
    /// Data-quality note rendered as a warning above the page.
    #[serde(default)]
    pub caveat: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
}

impl VariantConfig {
    pub fn pep() -> Self {
        Self {
            schema: VariantSchema::pep(),
            sheet: DatasetVariant::Pep.default_sheet_name().to_owned(),
            path: None,
            title: "PEP dispensing: BA x RJ comparison".to_owned(),
            caveat: Some(
                "Records were collected by the national health agency and are about 90% from RJ \
                 and 10% from BA, which skews comparisons. Read BA figures with care given the \
                 small sample."
                    .to_owned(),
            ),
            source_url: Some(
                "https://www.gov.br/aids/pt-br/assuntos/prevencao-combinada/pep-profilaxia-pos-exposicao-ao-hiv"
                    .to_owned(),
            ),
        }
    }

    pub fn prep() -> Self {
        Self {
            schema: VariantSchema::prep(),
            sheet: DatasetVariant::Prep.default_sheet_name().to_owned(),
            path: None,
            title: "PrEP dispensing: BA x RJ comparison".to_owned(),
            caveat: None,
            source_url: None,
        }
    }
}

/// Dataset cache settings as written in the config file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub max_entries: usize,
    /// `null` keeps datasets until they are evicted or invalidated.
    pub ttl_secs: Option<u64>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        let defaults = CacheConfig::default();
        Self {
            max_entries: defaults.max_entries,
            ttl_secs: defaults.ttl.map(|ttl| ttl.as_secs()),
        }
    }
}

impl From<CacheSettings> for CacheConfig {
    fn from(settings: CacheSettings) -> Self {
        CacheConfig {
            max_entries: settings.max_entries,
            ttl: settings.ttl_secs.map(Duration::from_secs),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Workbook holding both variant sheets.
    pub workbook: PathBuf,
    /// Regions offered by the region filter and reported in summaries, in display order.
    pub known_regions: Vec<RegionCode>,
    /// Date window used when a dataset has no defined event date.
    pub fallback_window: DateWindow,
    pub date_order: DateOrder,
    pub cache: CacheSettings,
    pub pep: VariantConfig,
    pub prep: VariantConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            workbook: PathBuf::from("data/pep_data.xlsx"),
            known_regions: vec![RegionCode::from("BA"), RegionCode::from("RJ")],
            fallback_window: DateWindow::new(
                NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or(NaiveDate::MIN),
                NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or(NaiveDate::MAX),
            ),
            date_order: DateOrder::default(),
            cache: CacheSettings::default(),
            pep: VariantConfig::pep(),
            prep: VariantConfig::prep(),
        }
    }
}

impl DashboardConfig {
    /// Parse and validate a JSON config. Missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.known_regions.is_empty() {
            return Err(ConfigError::Invalid(
                "`known_regions` must list at least one region".to_owned(),
            ));
        }
        let blank = self
            .known_regions
            .iter()
            .position(|r| r.as_str().trim().is_empty());
        if let Some(idx) = blank {
            return Err(ConfigError::Invalid(format!("`known_regions[{idx}]` is blank")));
        }
        if self.fallback_window.is_inverted() {
            return Err(ConfigError::Invalid(format!(
                "`fallback_window` starts after it ends ({})",
                self.fallback_window
            )));
        }
        for variant in DatasetVariant::ALL {
            let declared = self.variant(variant).schema.variant;
            if declared != variant {
                return Err(ConfigError::Invalid(format!(
                    "`{}.schema.variant` is `{}`",
                    variant.slug(),
                    declared.slug()
                )));
            }
        }
        Ok(())
    }

    pub fn variant(&self, variant: DatasetVariant) -> &VariantConfig {
        match variant {
            DatasetVariant::Pep => &self.pep,
            DatasetVariant::Prep => &self.prep,
        }
    }

    pub fn source_for(&self, variant: DatasetVariant) -> DataSource {
        let config = self.variant(variant);
        let path = config.path.as_ref().unwrap_or(&self.workbook);
        DataSource::new(path.clone(), config.sheet.clone())
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            date_order: self.date_order,
            ..LoadOptions::default()
        }
    }
}
