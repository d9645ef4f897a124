use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use pep_model::RegionCode;
use serde::{Deserialize, Serialize};

/// Inclusive date interval.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub const fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn is_inverted(&self) -> bool {
        self.start > self.end
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Which records a query selects. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterCriteria {
    regions: BTreeSet<RegionCode>,
    window: DateWindow,
}

impl FilterCriteria {
    pub fn new<R: Into<RegionCode>>(
        regions: impl IntoIterator<Item = R>,
        window: DateWindow,
    ) -> Self {
        Self {
            regions: regions.into_iter().map(Into::into).collect(),
            window,
        }
    }

    pub fn regions(&self) -> &BTreeSet<RegionCode> {
        &self.regions
    }

    pub fn window(&self) -> DateWindow {
        self.window
    }

    pub fn includes_region(&self, region: &RegionCode) -> bool {
        self.regions.contains(region)
    }
}
