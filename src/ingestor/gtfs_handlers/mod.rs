//! CSV-level helpers for the GTFS tables.

use csv::StringRecord;
use std::collections::HashMap;

/// Header name → column index. The first cell may carry a UTF-8 BOM;
/// all names are trimmed.
pub fn index_columns(header: &StringRecord) -> HashMap<String, usize> {
    header
        .iter()
        .enumerate()
        .map(|(i, col)| {
            let col = col.strip_prefix('\u{feff}').unwrap_or(col);
            (col.trim().to_string(), i)
        })
        .collect()
}

/// Trimmed field value, empty when the column is missing or the record
/// is short.
pub fn get_field<'a>(
    record: &'a StringRecord,
    columns: &HashMap<String, usize>,
    name: &str,
) -> &'a str {
    columns
        .get(name)
        .and_then(|&i| record.get(i))
        .map(|v| v.trim())
        .unwrap_or("")
}

/// Parses `HH:MM:SS` into seconds since the start of the service day.
/// Hours of 24 and beyond are valid overnight times.
pub fn parse_gtfs_time(value: &str) -> Option<i32> {
    let mut parts = value.trim().split(':');
    let hours: i32 = parts.next()?.parse().ok()?;
    let minutes: i32 = parts.next()?.parse().ok()?;
    let seconds: i32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    if hours < 0 || !(0..60).contains(&minutes) || !(0..60).contains(&seconds) {
        return None;
    }
    Some(hours * 3600 + minutes * 60 + seconds)
}
