use std::fmt;

use log::{debug, warn};
use pep_model::{Dataset, Record, RowMask};
use serde::Serialize;

use crate::criteria::{DateWindow, FilterCriteria};

/// Earliest and latest defined event date, or `None` when no record has one.
pub fn date_range(dataset: &Dataset) -> Option<DateWindow> {
    dataset
        .records()
        .iter()
        .filter_map(Record::event_date)
        .fold(None, |range: Option<DateWindow>, date| match range {
            None => Some(DateWindow::new(date, date)),
            Some(r) => Some(DateWindow::new(r.start.min(date), r.end.max(date))),
        })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeIssue {
    /// A bound lies beyond the dataset's dates on its own side and was clamped.
    OutOfBounds,
    /// The requested start is after the requested end; the full range was used instead.
    Inverted,
}

/// A requested date window the engine had to repair.
///
/// Never fatal: the view is still computed with [`InvalidRange::applied`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InvalidRange {
    pub issue: RangeIssue,
    pub requested: DateWindow,
    pub available: DateWindow,
    pub applied: DateWindow,
}

impl fmt::Display for InvalidRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.issue {
            RangeIssue::OutOfBounds => write!(
                f,
                "invalid date range: dates must be between {} and {}; using {}",
                self.available.start, self.available.end, self.applied
            ),
            RangeIssue::Inverted => write!(
                f,
                "invalid date range: start {} is after end {}; using the full range {}",
                self.requested.start, self.requested.end, self.applied
            ),
        }
    }
}

impl std::error::Error for InvalidRange {}

fn clamp_window(
    requested: DateWindow,
    available: Option<DateWindow>,
) -> (DateWindow, Option<InvalidRange>) {
    let Some(available) = available else {
        return (requested, None);
    };

    if requested.is_inverted() {
        let invalid = InvalidRange {
            issue: RangeIssue::Inverted,
            requested,
            available,
            applied: available,
        };
        return (available, Some(invalid));
    }

    // Only bounds lying outside on their own side move; `start > max` or `end < min`
    // stay as requested and simply select nothing.
    let applied = DateWindow::new(
        requested.start.max(available.start),
        requested.end.min(available.end),
    );
    if applied == requested {
        return (requested, None);
    }

    let invalid = InvalidRange {
        issue: RangeIssue::OutOfBounds,
        requested,
        available,
        applied,
    };
    (applied, Some(invalid))
}

/// The records of a dataset matching a [`FilterCriteria`], in dataset order.
#[derive(Clone, Debug)]
pub struct FilteredView<'a> {
    dataset: &'a Dataset,
    rows: Vec<usize>,
    window: DateWindow,
    invalid_range: Option<InvalidRange>,
}

impl<'a> FilteredView<'a> {
    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    /// Indices into [`Dataset::records`], ascending.
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    pub fn records(&self) -> impl ExactSizeIterator<Item = &'a Record> + '_ {
        let records = self.dataset.records();
        self.rows.iter().map(move |&row| &records[row])
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The window actually applied, after clamping.
    pub fn window(&self) -> DateWindow {
        self.window
    }

    /// Set when the requested window had to be repaired; callers surface it as a warning.
    pub fn invalid_range(&self) -> Option<&InvalidRange> {
        self.invalid_range.as_ref()
    }
}

impl PartialEq for FilteredView<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.dataset, other.dataset)
            && self.rows == other.rows
            && self.window == other.window
            && self.invalid_range == other.invalid_range
    }
}

/// Select records with `region ∈ criteria.regions` and a defined event date inside the
/// (clamped) criteria window.
///
/// Never fails: out-of-range windows are repaired and reported through
/// [`FilteredView::invalid_range`], and an empty result is a valid view.
pub fn filter<'a>(dataset: &'a Dataset, criteria: &FilterCriteria) -> FilteredView<'a> {
    let (window, invalid_range) = clamp_window(criteria.window(), date_range(dataset));
    if let Some(invalid) = &invalid_range {
        warn!("{} dataset: {invalid}", dataset.variant());
    }

    let records = dataset.records();
    let mut mask = RowMask::from_fn(records.len(), |row| {
        criteria.includes_region(records[row].region())
    });
    mask.intersect(&RowMask::from_fn(records.len(), |row| {
        records[row]
            .event_date()
            .is_some_and(|date| window.contains(date))
    }));
    let rows: Vec<usize> = mask.iter_selected().collect();

    debug!(
        "filtered {} dataset: {} of {} records match ({} regions, {window})",
        dataset.variant(),
        rows.len(),
        records.len(),
        criteria.regions().len()
    );

    FilteredView {
        dataset,
        rows,
        window,
        invalid_range,
    }
}
