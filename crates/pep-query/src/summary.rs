use std::collections::HashMap;

use pep_model::RegionCode;
use serde::Serialize;

use crate::filter::FilteredView;

/// `count / total * 100`, rounded to two decimals with ties to even; `0` when `total` is zero.
pub fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let pct = count as f64 / total as f64 * 100.0;
    (pct * 100.0).round_ties_even() / 100.0
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RegionShare {
    pub region: RegionCode,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SummaryMetrics {
    pub total: usize,
    /// One entry per known region, in the order given to [`summarize`].
    pub per_region: Vec<RegionShare>,
}

impl SummaryMetrics {
    pub fn region(&self, code: &str) -> Option<&RegionShare> {
        self.per_region.iter().find(|s| s.region.as_str() == code)
    }
}

/// Total and per-region counts for a view.
///
/// Every known region gets an entry, so a region without matches reports `0 (0%)`.
/// Regions present in the view but not listed in `known_regions` only count towards the
/// total.
pub fn summarize(view: &FilteredView<'_>, known_regions: &[RegionCode]) -> SummaryMetrics {
    let total = view.len();

    let mut counts: HashMap<&RegionCode, usize> = HashMap::new();
    for record in view.records() {
        *counts.entry(record.region()).or_default() += 1;
    }

    let mut per_region: Vec<RegionShare> = Vec::with_capacity(known_regions.len());
    for region in known_regions {
        if per_region.iter().any(|s| &s.region == region) {
            continue;
        }
        let count = counts.get(region).copied().unwrap_or(0);
        per_region.push(RegionShare {
            region: region.clone(),
            count,
            percentage: percentage(count, total),
        });
    }

    SummaryMetrics { total, per_region }
}
