//! Event-date coercion.
//!
//! Source spreadsheets mix real date cells, Excel serial numbers and free-form text in the
//! date column. Everything that cannot be read as a calendar date becomes `None` instead of
//! failing the load.

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::value::RawCell;

/// Largest serial Excel can represent (9999-12-31).
const EXCEL_MAX_SERIAL: f64 = 2_958_465.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Preferred order for ambiguous numeric dates like `01/02/2024`.
///
/// Year-first shapes (`2024/01/02`) are always read as year, month, day.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateOrder {
    /// Month / day / year (e.g. `12/31/2024`).
    #[default]
    Mdy,
    /// Day / month / year (e.g. `31/12/2024`).
    Dmy,
}

/// Coerce a raw cell from the date column into a calendar date.
pub fn coerce_event_date(cell: &RawCell, order: DateOrder) -> Option<NaiveDate> {
    match cell {
        RawCell::DateSerial(serial) | RawCell::Number(serial) => excel_serial_to_date(*serial),
        RawCell::Text(text) => parse_date_text(text, order),
        RawCell::Empty | RawCell::Bool(_) => None,
    }
}

/// Convert an Excel 1900-system serial into a date-time.
///
/// Serials 1..=59 account for the Lotus leap-year bug (Excel's phantom 1900-02-29 is serial
/// 60, which has no real date).
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(1.0..=EXCEL_MAX_SERIAL).contains(&serial) {
        return None;
    }

    let mut whole_days = serial.floor() as u64;
    let mut seconds = ((serial - serial.floor()) * SECONDS_PER_DAY).round() as u32;
    if seconds >= SECONDS_PER_DAY as u32 {
        whole_days += 1;
        seconds = 0;
    }

    let base = match whole_days {
        60 => return None,
        0..=59 => NaiveDate::from_ymd_opt(1899, 12, 31)?,
        _ => NaiveDate::from_ymd_opt(1899, 12, 30)?,
    };
    let date = base.checked_add_days(Days::new(whole_days))?;
    let time = NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0)?;
    Some(NaiveDateTime::new(date, time))
}

pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    excel_serial_to_datetime(serial).map(|dt| dt.date())
}

/// Parse a textual date, optionally followed by a time of day.
///
/// Accepted date shapes: `YYYY-MM-DD`, `YYYY/MM/DD`, `YYYYMMDD`, `A/B/YYYY` and `A-B-YYYY`.
/// The time suffix (after `T` or a space) must be `HH:MM`, `HH:MM:SS` or `HH:MM:SS.fff`,
/// optionally followed by `Z`; it is validated and then dropped.
pub fn parse_date_text(text: &str, order: DateOrder) -> Option<NaiveDate> {
    let s = text.trim();
    if s.is_empty() {
        return None;
    }

    let (year, month, day, rest) = split_date_prefix(s, order)?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;

    let rest = rest.trim_start_matches(['T', ' ']);
    if rest.is_empty() || is_time_of_day(rest.trim_end_matches('Z')) {
        Some(date)
    } else {
        None
    }
}

fn is_time_of_day(s: &str) -> bool {
    ["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"]
        .iter()
        .any(|fmt| NaiveTime::parse_from_str(s, fmt).is_ok())
}

fn split_date_prefix(s: &str, order: DateOrder) -> Option<(i32, u32, u32, &str)> {
    let date_end = s
        .bytes()
        .position(|b| !(b.is_ascii_digit() || b == b'-' || b == b'/'))
        .unwrap_or(s.len());
    if date_end == 0 {
        return None;
    }

    // ASCII-only prefix, so slicing on bytes is safe.
    let date_part = &s[..date_end];
    let rest = &s[date_end..];

    if date_part.len() == 8 && date_part.bytes().all(|b| b.is_ascii_digit()) {
        let year: i32 = date_part[0..4].parse().ok()?;
        let month: u32 = date_part[4..6].parse().ok()?;
        let day: u32 = date_part[6..8].parse().ok()?;
        return Some((year, month, day, rest));
    }

    let parts: Vec<&str> = date_part.split(['-', '/']).collect();
    let [first, second, third] = parts.as_slice() else {
        return None;
    };

    if first.len() == 4 {
        return Some((first.parse().ok()?, second.parse().ok()?, third.parse().ok()?, rest));
    }

    if third.len() == 4 {
        let year: i32 = third.parse().ok()?;
        let a: u32 = first.parse().ok()?;
        let b: u32 = second.parse().ok()?;
        let (month, day) = if a > 12 && b <= 12 {
            (b, a)
        } else if b > 12 && a <= 12 {
            (a, b)
        } else {
            match order {
                DateOrder::Dmy => (b, a),
                DateOrder::Mdy => (a, b),
            }
        };
        return Some((year, month, day, rest));
    }

    None
}
