use crate::date::excel_serial_to_datetime;

/// One cell as read from a spreadsheet or CSV source, before schema validation.
#[derive(Clone, Debug, PartialEq)]
pub enum RawCell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// A cell the source marked as a date/time, stored as an Excel serial.
    DateSerial(f64),
}

impl RawCell {
    pub fn text(value: impl Into<String>) -> Self {
        RawCell::Text(value.into())
    }

    /// Blank cells carry no value: empty, or text made only of whitespace.
    pub fn is_blank(&self) -> bool {
        match self {
            RawCell::Empty => true,
            RawCell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Text form used for record fields and CSV export.
    pub fn to_display(&self) -> String {
        match self {
            RawCell::Empty => String::new(),
            RawCell::Text(s) => s.clone(),
            RawCell::Number(n) => format_number(*n),
            RawCell::Bool(true) => "True".to_owned(),
            RawCell::Bool(false) => "False".to_owned(),
            RawCell::DateSerial(serial) => match excel_serial_to_datetime(*serial) {
                Some(dt) if dt.time() == chrono::NaiveTime::MIN => {
                    dt.format("%Y-%m-%d").to_string()
                }
                Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
                None => format_number(*serial),
            },
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// A header row plus data rows, as produced by the loaders in `pep-io`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<RawCell>>,
}

impl RawTable {
    pub fn new(headers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<RawCell>) {
        self.rows.push(row);
    }

    /// Convenience for text-only rows (CSV sources and tests).
    pub fn push_text_row<S: AsRef<str>>(&mut self, row: &[S]) {
        self.rows
            .push(row.iter().map(|s| RawCell::text(s.as_ref())).collect());
    }

    /// Build a table whose first non-blank row is the header.
    ///
    /// Returns `None` when every row is blank.
    pub fn from_rows(rows: impl IntoIterator<Item = Vec<RawCell>>) -> Option<Self> {
        let mut rows = rows
            .into_iter()
            .skip_while(|row| row.iter().all(RawCell::is_blank));
        let header = rows.next()?;
        Some(Self {
            headers: header.iter().map(RawCell::to_display).collect(),
            rows: rows.collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn numbers_display_without_trailing_zeroes() {
        assert_eq!(RawCell::Number(42.0).to_display(), "42");
        assert_eq!(RawCell::Number(-3.5).to_display(), "-3.5");
        assert_eq!(RawCell::Number(0.1).to_display(), "0.1");
    }

    #[test]
    fn date_serials_display_as_iso() {
        assert_eq!(RawCell::DateSerial(44197.0).to_display(), "2021-01-01");
        assert_eq!(
            RawCell::DateSerial(44197.5).to_display(),
            "2021-01-01 12:00:00"
        );
    }

    #[test]
    fn from_rows_skips_leading_blank_rows() {
        let table = RawTable::from_rows(vec![
            vec![RawCell::Empty, RawCell::text("  ")],
            vec![RawCell::text("UF_UDM"), RawCell::Number(2021.0)],
            vec![RawCell::text("RJ"), RawCell::Number(1.0)],
        ])
        .unwrap();
        assert_eq!(table.headers, vec!["UF_UDM".to_owned(), "2021".to_owned()]);
        assert_eq!(table.rows.len(), 1);

        assert!(RawTable::from_rows(vec![vec![RawCell::Empty]]).is_none());
    }
}
