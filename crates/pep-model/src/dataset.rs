use chrono::NaiveDate;
use log::debug;
use thiserror::Error;

use crate::date::{coerce_event_date, DateOrder};
use crate::schema::{DatasetVariant, RegionCode, VariantSchema};
use crate::value::{RawCell, RawTable};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatasetError {
    #[error("the {variant} data table has no rows")]
    Empty { variant: DatasetVariant },
    #[error(
        "the {variant} data table is missing required column(s): {}",
        .missing.join(", ")
    )]
    Malformed {
        variant: DatasetVariant,
        missing: Vec<String>,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParseOptions {
    pub date_order: DateOrder,
}

/// One row of a dataset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    region: RegionCode,
    event_date: Option<NaiveDate>,
    fields: Vec<String>,
}

impl Record {
    pub fn region(&self) -> &RegionCode {
        &self.region
    }

    /// `None` when the source value could not be read as a date.
    pub fn event_date(&self) -> Option<NaiveDate> {
        self.event_date
    }

    /// Every column value as text, in header order.
    ///
    /// The date column holds the normalized ISO date (or an empty string when undefined).
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn field(&self, column: usize) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }
}

/// An immutable, validated table of records sharing one [`VariantSchema`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dataset {
    schema: VariantSchema,
    headers: Vec<String>,
    region_column: usize,
    date_column: usize,
    records: Vec<Record>,
}

impl Dataset {
    /// Validate a raw table against `schema` and coerce its event dates.
    ///
    /// Fully blank rows are dropped. A table with no remaining rows is [`DatasetError::Empty`];
    /// a table lacking any schema column is [`DatasetError::Malformed`]. Unparseable dates never
    /// fail the load, they become undefined.
    pub fn from_raw_table(
        schema: VariantSchema,
        table: RawTable,
        options: &ParseOptions,
    ) -> Result<Self, DatasetError> {
        let variant = schema.variant;
        let headers = normalize_headers(table.headers);

        let rows: Vec<Vec<RawCell>> = table
            .rows
            .into_iter()
            .filter(|row| !row.iter().all(RawCell::is_blank))
            .collect();
        if rows.is_empty() {
            return Err(DatasetError::Empty { variant });
        }

        let missing: Vec<String> = schema
            .required_columns()
            .filter(|col| !headers.iter().any(|h| h == col))
            .map(str::to_owned)
            .collect();
        if !missing.is_empty() {
            return Err(DatasetError::Malformed { variant, missing });
        }

        let position = |name: &str| headers.iter().position(|h| h == name);
        let (Some(region_column), Some(date_column)) =
            (position(&schema.region_column), position(&schema.date_column))
        else {
            return Err(DatasetError::Malformed {
                variant,
                missing: vec![schema.region_column.clone(), schema.date_column.clone()],
            });
        };

        let width = headers.len();
        let mut undefined_dates = 0usize;
        let records: Vec<Record> = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, RawCell::Empty);
                let event_date = coerce_event_date(&row[date_column], options.date_order);
                if event_date.is_none() {
                    undefined_dates += 1;
                }
                let mut fields: Vec<String> = row.iter().map(RawCell::to_display).collect();
                fields[date_column] = event_date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default();
                Record {
                    region: RegionCode::new(&fields[region_column]),
                    event_date,
                    fields,
                }
            })
            .collect();

        debug!(
            "built {variant} dataset: {} records, {} columns, {undefined_dates} undefined event dates",
            records.len(),
            width
        );

        Ok(Self {
            schema,
            headers,
            region_column,
            date_column,
            records,
        })
    }

    pub fn variant(&self) -> DatasetVariant {
        self.schema.variant
    }

    pub fn schema(&self) -> &VariantSchema {
        &self.schema
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn region_column(&self) -> usize {
        self.region_column
    }

    pub fn date_column(&self) -> usize {
        self.date_column
    }
}

fn normalize_headers(headers: Vec<String>) -> Vec<String> {
    headers
        .into_iter()
        .enumerate()
        .map(|(idx, h)| {
            let trimmed = h.trim();
            if trimmed.is_empty() {
                format!("Column{}", idx + 1)
            } else {
                trimmed.to_owned()
            }
        })
        .collect()
}
