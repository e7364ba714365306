//! Event-log rows.
//!
//! Input is a weekly aggregated conflict-event export:
//!
//! ```text
//! WEEK,REGION,COUNTRY,ADMIN1,EVENT_TYPE,SUB_EVENT_TYPE,EVENTS,FATALITIES,...,ID,CENTROID_LATITUDE,CENTROID_LONGITUDE
//! 2016-02-06,Middle East,Bahrain,Capital,Battles,Armed clash,1,0,...,285,26.1927,50.5508
//! ```

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::error::{InputError, PipelineResult, SchemaError};
use crate::models::{coerce_numeric, Table};
use crate::transform::columns::HEADER_PREVIEW;

pub const WEEK: &str = "WEEK";
pub const REGION: &str = "REGION";
pub const COUNTRY: &str = "COUNTRY";
pub const ADMIN1: &str = "ADMIN1";
pub const EVENT_TYPE: &str = "EVENT_TYPE";
pub const SUB_EVENT_TYPE: &str = "SUB_EVENT_TYPE";
pub const EVENTS: &str = "EVENTS";
pub const FATALITIES: &str = "FATALITIES";
pub const ID: &str = "ID";
pub const LATITUDE: &str = "CENTROID_LATITUDE";
pub const LONGITUDE: &str = "CENTROID_LONGITUDE";
pub const YEAR: &str = "YEAR";

const REQUIRED: [&str; 6] = [WEEK, COUNTRY, EVENT_TYPE, SUB_EVENT_TYPE, EVENTS, FATALITIES];

/// One row of the event log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    pub week: NaiveDate,
    pub region: String,
    pub country: String,
    pub admin1: String,
    pub event_type: String,
    pub sub_event_type: String,
    pub id: String,
    pub events: Option<f64>,
    pub fatalities: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl EventRecord {
    /// Calendar year of the week.
    pub fn year(&self) -> i32 {
        self.week.year()
    }
}

/// Parsed event log.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    pub records: Vec<EventRecord>,
    /// Rows with an empty WEEK, left out of every projection.
    pub undated: usize,
}

/// Parse a WEEK cell.
///
/// Accepts `YYYY-MM-DD`, optionally followed by a time part.
pub fn parse_week(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    let date = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y/%m/%d"))
        .ok()
}

/// Column lookup by name, ignoring case.
fn find_column(table: &Table, name: &str) -> Option<usize> {
    table
        .column_index(name)
        .or_else(|| table.headers.iter().position(|h| h.eq_ignore_ascii_case(name)))
}

/// Build event records from a loaded table.
///
/// Fails with a [`SchemaError`] when a required column is missing and with
/// [`InputError::InvalidWeek`] on a non-empty WEEK that is not a date.
/// Unparseable counts and coordinates become missing.
pub fn events_from_table(table: &Table) -> PipelineResult<EventLog> {
    for column in REQUIRED {
        if find_column(table, column).is_none() {
            return Err(SchemaError::MissingColumn {
                column: column.to_string(),
                found: table.header_preview(HEADER_PREVIEW),
            }
            .into());
        }
    }

    let col = |name: &str| find_column(table, name);
    let text = |row: usize, idx: Option<usize>| -> String {
        idx.map(|c| table.cell(row, c).to_string()).unwrap_or_default()
    };
    let number = |row: usize, idx: Option<usize>| idx.and_then(|c| coerce_numeric(table.cell(row, c)));

    let (week, region, country, admin1) = (col(WEEK), col(REGION), col(COUNTRY), col(ADMIN1));
    let (event_type, sub_event_type, id) = (col(EVENT_TYPE), col(SUB_EVENT_TYPE), col(ID));
    let (events, fatalities) = (col(EVENTS), col(FATALITIES));
    let (latitude, longitude) = (col(LATITUDE), col(LONGITUDE));

    let mut log = EventLog::default();
    for row in 0..table.len() {
        let raw_week = text(row, week);
        if raw_week.trim().is_empty() {
            log.undated += 1;
            continue;
        }
        let Some(parsed_week) = parse_week(&raw_week) else {
            return Err(InputError::InvalidWeek {
                line: row as u64 + 2,
                value: raw_week,
            }
            .into());
        };

        log.records.push(EventRecord {
            week: parsed_week,
            region: text(row, region),
            country: text(row, country),
            admin1: text(row, admin1),
            event_type: text(row, event_type),
            sub_event_type: text(row, sub_event_type),
            id: text(row, id),
            events: number(row, events),
            fatalities: number(row, fatalities),
            latitude: number(row, latitude),
            longitude: number(row, longitude),
        });
    }

    Ok(log)
}
