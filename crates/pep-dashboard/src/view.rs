use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::NaiveDate;
use pep_model::{DatasetVariant, DimensionSpec, RegionCode};
use pep_query::{DateWindow, DisplayMode, GroupCounts, SummaryMetrics};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    #[default]
    Home,
    Pep,
    Prep,
}

impl Page {
    /// The dataset a page renders, `None` for the static home page.
    pub fn variant(self) -> Option<DatasetVariant> {
        match self {
            Page::Home => None,
            Page::Pep => Some(DatasetVariant::Pep),
            Page::Prep => Some(DatasetVariant::Prep),
        }
    }
}

impl From<DatasetVariant> for Page {
    fn from(variant: DatasetVariant) -> Self {
        match variant {
            DatasetVariant::Pep => Page::Pep,
            DatasetVariant::Prep => Page::Prep,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown page `{0}` (expected home, pep or prep)")]
pub struct UnknownPage(pub String);

impl FromStr for Page {
    type Err = UnknownPage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "home" => Ok(Page::Home),
            "pep" => Ok(Page::Pep),
            "prep" => Ok(Page::Prep),
            _ => Err(UnknownPage(s.to_owned())),
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Page::Home => "home",
            Page::Pep => "pep",
            Page::Prep => "prep",
        })
    }
}

/// The UI's filter and navigation state for one render.
///
/// Unset fields fall back to defaults: every known region, and the dataset's full date range.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageState {
    pub page: Page,
    pub regions: Option<Vec<RegionCode>>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl PageState {
    pub fn new(page: Page) -> Self {
        Self {
            page,
            ..Self::default()
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// The filters a variant page actually used.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AppliedFilters {
    pub regions: Vec<RegionCode>,
    pub requested: DateWindow,
    /// After clamping to the dataset's dates.
    pub applied: DateWindow,
    /// `None` when no record has a defined event date.
    pub available: Option<DateWindow>,
}

/// A grouped bar chart, ready for any charting library: x = category, color = region.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub x_column: String,
    pub x_label: String,
    pub color_column: String,
    pub y_label: String,
    pub mode: DisplayMode,
    pub category_order: Vec<String>,
    pub data: GroupCounts,
}

impl ChartSpec {
    pub fn new(
        dimension: &DimensionSpec,
        color_column: &str,
        mode: DisplayMode,
        data: GroupCounts,
    ) -> Self {
        let (suffix, y_label) = match mode {
            DisplayMode::Percent => ("percent", "Percent"),
            DisplayMode::Count => ("count", "Count"),
        };
        Self {
            title: format!("{} by region ({suffix})", dimension.label),
            x_column: dimension.column.clone(),
            x_label: dimension.label.clone(),
            color_column: color_column.to_owned(),
            y_label: y_label.to_owned(),
            mode,
            category_order: data.categories.clone(),
            data,
        }
    }
}

/// A downloadable CSV of the filtered records.
#[derive(Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    /// Inline download link target, e.g. `data:file/csv;base64,77u/...`.
    pub fn data_uri(&self) -> String {
        format!("data:file/csv;base64,{}", STANDARD.encode(&self.bytes))
    }
}

impl fmt::Debug for ExportArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportArtifact")
            .field("filename", &self.filename)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl Serialize for ExportArtifact {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ExportArtifact", 3)?;
        state.serialize_field("filename", &self.filename)?;
        state.serialize_field("size_bytes", &self.bytes.len())?;
        state.serialize_field("data_uri", &self.data_uri())?;
        state.end()
    }
}

/// Everything a UI shell needs to draw one page.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ViewModel {
    pub page: Page,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub notices: Vec<Notice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<AppliedFilters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<SummaryMetrics>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub charts: Vec<ChartSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export: Option<ExportArtifact>,
}

impl ViewModel {
    pub fn new(page: Page, title: impl Into<String>) -> Self {
        Self {
            page,
            title: title.into(),
            body: None,
            notices: Vec::new(),
            filters: None,
            summary: None,
            charts: Vec::new(),
            export: None,
        }
    }

    pub fn has_errors(&self) -> bool {
        self.notices.iter().any(|n| n.level == NoticeLevel::Error)
    }
}
