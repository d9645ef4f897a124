use std::collections::{BTreeMap, BTreeSet};

use pep_model::RegionCode;
use serde::{Deserialize, Serialize};

use crate::filter::FilteredView;
use crate::summary::percentage;
use crate::QueryError;

/// How a grouped chart presents its values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Percent of all records in the view.
    Percent,
    /// Absolute record counts.
    Count,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GroupCount {
    pub category: String,
    pub region: RegionCode,
    pub count: usize,
    /// Share of the whole view (not of the region or category slice).
    pub percentage: f64,
}

impl GroupCount {
    pub fn value(&self, mode: DisplayMode) -> f64 {
        match mode {
            DisplayMode::Percent => self.percentage,
            DisplayMode::Count => self.count as f64,
        }
    }
}

/// Per-(category, region) counts for one dimension column.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GroupCounts {
    pub dimension: String,
    /// Records in the view, including those with a blank category.
    pub total: usize,
    /// Distinct non-blank categories, ascending.
    pub categories: Vec<String>,
    /// Ordered by category, then region code.
    pub groups: Vec<GroupCount>,
}

impl GroupCounts {
    pub fn get(&self, category: &str, region: &str) -> Option<&GroupCount> {
        self.groups
            .iter()
            .find(|g| g.category == category && g.region.as_str() == region)
    }

    /// Records that landed in some category.
    pub fn counted(&self) -> usize {
        self.groups.iter().map(|g| g.count).sum()
    }
}

/// Count the view's records per distinct `(category, region)` pair of `dimension`.
///
/// Blank category values are skipped (they have no bar) but still count towards
/// [`GroupCounts::total`], which is the percentage denominator.
pub fn group_counts(view: &FilteredView<'_>, dimension: &str) -> Result<GroupCounts, QueryError> {
    let dataset = view.dataset();
    let column = dataset
        .column_index(dimension)
        .ok_or_else(|| QueryError::UnknownColumn {
            variant: dataset.variant(),
            column: dimension.to_owned(),
        })?;

    let mut counts: BTreeMap<(&str, &RegionCode), usize> = BTreeMap::new();
    for record in view.records() {
        let category = record.field(column).unwrap_or_default().trim();
        if category.is_empty() {
            continue;
        }
        *counts.entry((category, record.region())).or_default() += 1;
    }

    let total = view.len();
    let categories: BTreeSet<&str> = counts.keys().map(|(category, _)| *category).collect();
    let groups = counts
        .into_iter()
        .map(|((category, region), count)| GroupCount {
            category: category.to_owned(),
            region: region.clone(),
            count,
            percentage: percentage(count, total),
        })
        .collect();

    Ok(GroupCounts {
        dimension: dimension.to_owned(),
        total,
        categories: categories.into_iter().map(str::to_owned).collect(),
        groups,
    })
}
