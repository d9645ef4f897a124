use chrono::NaiveDate;
use pep_model::{Dataset, ParseOptions, RawTable, RegionCode, VariantSchema};
use pep_query::{
    date_range, filter, group_counts, summarize, DateWindow, DisplayMode, FilterCriteria,
    QueryError, RangeIssue,
};
use pretty_assertions::assert_eq;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

const HEADERS: [&str; 6] = [
    "UF_UDM",
    "dt_disp",
    "Pop",
    "tipo_exposicao",
    "trabalho_sexual",
    "alcool_drogas",
];

/// 7 RJ records in 2021-01-01..=2021-06-01 and 3 BA records in 2021-02-01..=2021-03-01.
fn scenario_dataset() -> Dataset {
    let rows: [[&str; 6]; 10] = [
        ["RJ", "2021-01-01", "HSH", "Sexual", "Não", "Sim"],
        ["BA", "2021-02-01", "HSH", "Sexual", "Não", "Não"],
        ["RJ", "2021-01-15", "HSH", "Sexual", "Sim", "Não"],
        ["RJ", "2021-02-10", "Trans", "Sexual", "Não", "Não"],
        ["BA", "2021-02-14", "Trans", "Acidente", "Não", "Sim"],
        ["RJ", "2021-03-05", "HSH", "Sexual", "Não", "Não"],
        ["RJ", "2021-04-20", "Mulher cis", "Violência", "Não", "Não"],
        ["BA", "2021-03-01", "Trans", "Sexual", "Sim", "Sim"],
        ["RJ", "2021-05-11", "Trans", "Sexual", "Não", "Não"],
        ["RJ", "2021-06-01", "HSH", "Sexual", "Não", "Sim"],
    ];
    let mut table = RawTable::new(HEADERS);
    for row in &rows {
        table.push_text_row(row);
    }
    Dataset::from_raw_table(VariantSchema::pep(), table, &ParseOptions::default()).unwrap()
}

fn known_regions() -> Vec<RegionCode> {
    vec![RegionCode::from("BA"), RegionCode::from("RJ")]
}

fn criteria(regions: &[&str], start: NaiveDate, end: NaiveDate) -> FilterCriteria {
    FilterCriteria::new(regions.iter().copied(), DateWindow::new(start, end))
}

#[test]
fn both_regions_over_the_whole_year() {
    let dataset = scenario_dataset();
    let view = filter(&dataset, &criteria(&["RJ", "BA"], d(2021, 1, 1), d(2021, 12, 31)));
    let summary = summarize(&view, &known_regions());

    assert_eq!(summary.total, 10);
    let ba = summary.region("BA").unwrap();
    let rj = summary.region("RJ").unwrap();
    assert_eq!((ba.count, ba.percentage), (3, 30.0));
    assert_eq!((rj.count, rj.percentage), (7, 70.0));

    // The end bound lies past the data and is clamped to the last event date.
    assert_eq!(view.window(), DateWindow::new(d(2021, 1, 1), d(2021, 6, 1)));
    assert_eq!(view.invalid_range().unwrap().issue, RangeIssue::OutOfBounds);
}

#[test]
fn single_region_reports_zero_for_the_other() {
    let dataset = scenario_dataset();
    let view = filter(&dataset, &criteria(&["BA"], d(2021, 1, 1), d(2021, 12, 31)));
    let summary = summarize(&view, &known_regions());

    assert_eq!(summary.total, 3);
    let ba = summary.region("BA").unwrap();
    let rj = summary.region("RJ").unwrap();
    assert_eq!((ba.count, ba.percentage), (3, 100.0));
    assert_eq!((rj.count, rj.percentage), (0, 0.0));
    // Known-region order is kept.
    let order: Vec<&str> = summary.per_region.iter().map(|s| s.region.as_str()).collect();
    assert_eq!(order, vec!["BA", "RJ"]);
}

#[test]
fn start_after_all_dates_yields_an_empty_view() {
    let dataset = scenario_dataset();
    let view = filter(&dataset, &criteria(&["RJ", "BA"], d(2022, 1, 1), d(2022, 12, 31)));
    assert!(view.is_empty());

    let summary = summarize(&view, &known_regions());
    assert_eq!(summary.total, 0);
    assert!(summary
        .per_region
        .iter()
        .all(|s| s.count == 0 && s.percentage == 0.0));
}

#[test]
fn date_range_spans_defined_dates() {
    let dataset = scenario_dataset();
    assert_eq!(
        date_range(&dataset),
        Some(DateWindow::new(d(2021, 1, 1), d(2021, 6, 1)))
    );
}

#[test]
fn dataset_without_defined_dates_has_no_range_and_matches_nothing() {
    let mut table = RawTable::new(HEADERS);
    table.push_text_row(&["RJ", "n/a", "HSH", "Sexual", "Não", "Não"]);
    table.push_text_row(&["BA", "", "HSH", "Sexual", "Não", "Não"]);
    let dataset =
        Dataset::from_raw_table(VariantSchema::pep(), table, &ParseOptions::default()).unwrap();

    assert_eq!(date_range(&dataset), None);
    let view = filter(&dataset, &criteria(&["RJ", "BA"], d(2000, 1, 1), d(2100, 1, 1)));
    assert!(view.is_empty());
    assert!(view.invalid_range().is_none());
}

#[test]
fn undefined_dates_never_match_a_window() {
    let mut table = RawTable::new(HEADERS);
    table.push_text_row(&["RJ", "2021-01-10", "HSH", "Sexual", "Não", "Não"]);
    table.push_text_row(&["RJ", "??", "HSH", "Sexual", "Não", "Não"]);
    table.push_text_row(&["RJ", "2021-01-20", "HSH", "Sexual", "Não", "Não"]);
    let dataset =
        Dataset::from_raw_table(VariantSchema::pep(), table, &ParseOptions::default()).unwrap();

    let view = filter(&dataset, &criteria(&["RJ"], d(2021, 1, 1), d(2021, 1, 31)));
    assert_eq!(view.rows(), &[0, 2]);
}

#[test]
fn filter_preserves_dataset_order() {
    let dataset = scenario_dataset();
    let view = filter(&dataset, &criteria(&["BA", "RJ"], d(2021, 2, 1), d(2021, 3, 5)));
    assert_eq!(view.rows(), &[1, 3, 4, 5, 7]);
    let dates: Vec<NaiveDate> = view.records().filter_map(|r| r.event_date()).collect();
    assert_eq!(
        dates,
        vec![
            d(2021, 2, 1),
            d(2021, 2, 10),
            d(2021, 2, 14),
            d(2021, 3, 5),
            d(2021, 3, 1)
        ]
    );
}

#[test]
fn early_start_behaves_like_the_first_event_date() {
    let dataset = scenario_dataset();
    let early = filter(&dataset, &criteria(&["RJ", "BA"], d(2019, 1, 1), d(2021, 3, 1)));
    let exact = filter(&dataset, &criteria(&["RJ", "BA"], d(2021, 1, 1), d(2021, 3, 1)));

    assert_eq!(early.rows(), exact.rows());
    assert_eq!(early.window(), exact.window());
    assert!(exact.invalid_range().is_none());
    let invalid = early.invalid_range().unwrap();
    assert_eq!(invalid.requested.start, d(2019, 1, 1));
    assert_eq!(invalid.applied.start, d(2021, 1, 1));
}

#[test]
fn inverted_window_uses_the_full_range() {
    let dataset = scenario_dataset();
    let view = filter(&dataset, &criteria(&["RJ", "BA"], d(2021, 5, 1), d(2021, 2, 1)));
    assert_eq!(view.len(), 10);
    assert_eq!(view.invalid_range().unwrap().issue, RangeIssue::Inverted);
}

#[test]
fn filtering_twice_gives_the_same_view() {
    let dataset = scenario_dataset();
    let c = criteria(&["RJ"], d(2021, 1, 10), d(2021, 5, 1));
    assert_eq!(filter(&dataset, &c), filter(&dataset, &c));
}

#[test]
fn group_counts_are_sorted_by_category_then_region() {
    let dataset = scenario_dataset();
    let view = filter(&dataset, &criteria(&["RJ", "BA"], d(2021, 1, 1), d(2021, 6, 1)));
    let groups = group_counts(&view, "Pop").unwrap();

    assert_eq!(groups.dimension, "Pop");
    assert_eq!(groups.total, 10);
    assert_eq!(groups.categories, vec!["HSH", "Mulher cis", "Trans"]);

    let flat: Vec<(&str, &str, usize, f64)> = groups
        .groups
        .iter()
        .map(|g| (g.category.as_str(), g.region.as_str(), g.count, g.percentage))
        .collect();
    assert_eq!(
        flat,
        vec![
            ("HSH", "BA", 1, 10.0),
            ("HSH", "RJ", 4, 40.0),
            ("Mulher cis", "RJ", 1, 10.0),
            ("Trans", "BA", 2, 20.0),
            ("Trans", "RJ", 2, 20.0),
        ]
    );
    assert_eq!(groups.counted(), 10);
}

#[test]
fn group_percentages_use_the_view_total() {
    let dataset = scenario_dataset();
    let view = filter(&dataset, &criteria(&["BA"], d(2021, 1, 1), d(2021, 6, 1)));
    let groups = group_counts(&view, "Pop").unwrap();

    let hsh = groups.get("HSH", "BA").unwrap();
    let trans = groups.get("Trans", "BA").unwrap();
    assert_eq!(hsh.value(DisplayMode::Percent), 33.33);
    assert_eq!(trans.value(DisplayMode::Percent), 66.67);
    assert_eq!(trans.value(DisplayMode::Count), 2.0);
    assert!(groups.get("HSH", "RJ").is_none());
}

#[test]
fn blank_categories_are_skipped_but_counted_in_the_total() {
    let mut table = RawTable::new(HEADERS);
    table.push_text_row(&["RJ", "2021-01-10", "HSH", "Sexual", "Não", "Não"]);
    table.push_text_row(&["RJ", "2021-01-11", "  ", "Sexual", "Não", "Não"]);
    table.push_text_row(&["BA", "2021-01-12", "HSH", "Sexual", "Não", "Não"]);
    table.push_text_row(&["BA", "2021-01-13", "", "Sexual", "Não", "Não"]);
    let dataset =
        Dataset::from_raw_table(VariantSchema::pep(), table, &ParseOptions::default()).unwrap();

    let view = filter(&dataset, &criteria(&["RJ", "BA"], d(2021, 1, 1), d(2021, 1, 31)));
    let groups = group_counts(&view, "Pop").unwrap();
    assert_eq!(groups.total, 4);
    assert_eq!(groups.counted(), 2);
    assert_eq!(groups.categories, vec!["HSH"]);
    assert_eq!(groups.get("HSH", "RJ").unwrap().percentage, 25.0);
}

#[test]
fn group_counts_on_empty_view_are_empty() {
    let dataset = scenario_dataset();
    let view = filter(&dataset, &criteria(&[], d(2021, 1, 1), d(2021, 6, 1)));
    let groups = group_counts(&view, "tipo_exposicao").unwrap();
    assert_eq!(groups.total, 0);
    assert!(groups.groups.is_empty());
    assert!(groups.categories.is_empty());
}

#[test]
fn unknown_dimension_is_an_error() {
    let dataset = scenario_dataset();
    let view = filter(&dataset, &criteria(&["RJ"], d(2021, 1, 1), d(2021, 6, 1)));
    let err = group_counts(&view, "escolaridade").unwrap_err();
    assert_eq!(
        err,
        QueryError::UnknownColumn {
            variant: pep_model::DatasetVariant::Pep,
            column: "escolaridade".to_owned(),
        }
    );
}

#[test]
fn summary_shares_round_exact_halves_to_even() {
    let mut table = RawTable::new(HEADERS);
    table.push_text_row(&["BA", "2021-01-01", "HSH", "Sexual", "Não", "Não"]);
    for _ in 0..31 {
        table.push_text_row(&["RJ", "2021-01-01", "HSH", "Sexual", "Não", "Não"]);
    }
    let dataset =
        Dataset::from_raw_table(VariantSchema::pep(), table, &ParseOptions::default()).unwrap();
    let view = filter(&dataset, &criteria(&["BA", "RJ"], d(2021, 1, 1), d(2021, 1, 1)));
    let summary = summarize(&view, &known_regions());

    assert_eq!(summary.total, 32);
    assert_eq!(summary.region("BA").unwrap().percentage, 3.12);
    assert_eq!(summary.region("RJ").unwrap().percentage, 96.88);
}
