//! Group-by projections over the event log.
//!
//! Each projection is computed independently. Group keys come out sorted
//! ascending. All but two projections read the events on or after the
//! cutoff; the raw time series reads the same set without grouping, and the
//! yearly fatalities/events projection reads the unfiltered log from
//! `yearly_since` onward.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use crate::models::format_number;

use super::record::{
    EventRecord, COUNTRY, EVENTS, EVENT_TYPE, FATALITIES, LATITUDE, LONGITUDE, SUB_EVENT_TYPE,
    WEEK, YEAR,
};

/// Names of the projections, in output order.
pub const PROJECTION_NAMES: [&str; 8] = [
    "fatalities_by_country",
    "events_by_country_event_type",
    "events_by_lat_lon",
    "events_by_year_country",
    "events_by_event_type",
    "events_over_time_by_country",
    "yearly_fatalities_events_by_country",
    "sub_events_by_country",
];

/// Options for the event aggregator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateOptions {
    /// Events before this week are ignored (inclusive lower bound)
    pub cutoff: NaiveDate,

    /// First year of the yearly fatalities/events projection
    pub yearly_since: i32,

    /// Countries whose events total less than this across all years are
    /// left out of the yearly projection
    pub min_total_events: f64,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            cutoff: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or(NaiveDate::MIN),
            yearly_since: 2015,
            min_total_events: 10_000.0,
        }
    }
}

/// One named output table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    pub name: &'static str,
    pub columns: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

impl Projection {
    fn new(name: &'static str, columns: &[&'static str], rows: Vec<Vec<String>>) -> Self {
        Self {
            name,
            columns: columns.to_vec(),
            rows,
        }
    }

    /// Output file name.
    pub fn file_name(&self) -> String {
        format!("{}.csv", self.name)
    }
}

/// A coordinate usable as an ordered group key.
#[derive(Debug, Clone, Copy)]
pub struct Coordinate(pub f64);

impl PartialEq for Coordinate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Coordinate {}

impl PartialOrd for Coordinate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Coordinate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Events with `week >= cutoff`.
pub fn filter_since(events: &[EventRecord], cutoff: NaiveDate) -> Vec<&EventRecord> {
    events.iter().filter(|e| e.week >= cutoff).collect()
}

/// Sum `metric` per key; events whose key is `None` are skipped and missing
/// metrics add nothing.
fn sum_by<'a, K, F, M>(events: impl IntoIterator<Item = &'a EventRecord>, key: F, metric: M) -> BTreeMap<K, f64>
where
    K: Ord,
    F: Fn(&EventRecord) -> Option<K>,
    M: Fn(&EventRecord) -> Option<f64>,
{
    let mut totals = BTreeMap::new();
    for event in events {
        if let Some(k) = key(event) {
            *totals.entry(k).or_insert(0.0) += metric(event).unwrap_or(0.0);
        }
    }
    totals
}

/// A text group key; empty cells form no group.
fn label(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn events_metric(e: &EventRecord) -> Option<f64> {
    e.events
}

fn fatalities_metric(e: &EventRecord) -> Option<f64> {
    e.fatalities
}

/// Rows of a grouped sum with `metric > 0`.
fn positive_rows<K>(totals: BTreeMap<K, f64>, render: impl Fn(K) -> Vec<String>) -> Vec<Vec<String>> {
    totals
        .into_iter()
        .filter(|(_, total)| *total > 0.0)
        .map(|(key, total)| {
            let mut row = render(key);
            row.push(format_number(total));
            row
        })
        .collect()
}

pub fn fatalities_by_country(events: &[&EventRecord]) -> Projection {
    let totals = sum_by(events.iter().copied(), |e| label(&e.country), fatalities_metric);
    Projection::new(
        "fatalities_by_country",
        &[COUNTRY, FATALITIES],
        positive_rows(totals, |country| vec![country]),
    )
}

pub fn events_by_country_event_type(events: &[&EventRecord]) -> Projection {
    let totals = sum_by(
        events.iter().copied(),
        |e| Some((label(&e.country)?, label(&e.event_type)?)),
        events_metric,
    );
    Projection::new(
        "events_by_country_event_type",
        &[COUNTRY, EVENT_TYPE, EVENTS],
        positive_rows(totals, |(country, event_type)| vec![country, event_type]),
    )
}

/// Events missing a coordinate are left out.
pub fn events_by_lat_lon(events: &[&EventRecord]) -> Projection {
    let totals = sum_by(
        events.iter().copied(),
        |e| {
            let lat = e.latitude?;
            let lon = e.longitude?;
            Some((label(&e.country)?, Coordinate(lat), Coordinate(lon), e.year()))
        },
        events_metric,
    );
    Projection::new(
        "events_by_lat_lon",
        &[COUNTRY, LATITUDE, LONGITUDE, YEAR, EVENTS],
        positive_rows(totals, |(country, lat, lon, year)| {
            vec![country, format_number(lat.0), format_number(lon.0), year.to_string()]
        }),
    )
}

pub fn events_by_year_country(events: &[&EventRecord]) -> Projection {
    let totals = sum_by(
        events.iter().copied(),
        |e| Some((e.year(), label(&e.country)?)),
        events_metric,
    );
    Projection::new(
        "events_by_year_country",
        &[YEAR, COUNTRY, EVENTS],
        positive_rows(totals, |(year, country)| vec![year.to_string(), country]),
    )
}

pub fn events_by_event_type(events: &[&EventRecord]) -> Projection {
    let totals = sum_by(events.iter().copied(), |e| label(&e.event_type), events_metric);
    Projection::new(
        "events_by_event_type",
        &[EVENT_TYPE, EVENTS],
        positive_rows(totals, |event_type| vec![event_type]),
    )
}

/// Raw (week, country, events) rows in input order.
pub fn events_over_time_by_country(events: &[&EventRecord]) -> Projection {
    let rows = events
        .iter()
        .map(|e| {
            vec![
                e.week.format("%Y-%m-%d").to_string(),
                e.country.clone(),
                e.events.map(format_number).unwrap_or_default(),
            ]
        })
        .collect();
    Projection::new("events_over_time_by_country", &[WEEK, COUNTRY, EVENTS], rows)
}

/// Fatalities and events per (year, country) over the unfiltered log.
///
/// Two passes: country totals across every year first, then the per-year
/// table without any country under `min_total_events`.
pub fn yearly_fatalities_events_by_country(
    events: &[EventRecord],
    since: i32,
    min_total_events: f64,
) -> Projection {
    let recent: Vec<&EventRecord> = events.iter().filter(|e| e.year() >= since).collect();

    let country_totals = sum_by(recent.iter().copied(), |e| label(&e.country), events_metric);
    let excluded: HashSet<String> = country_totals
        .into_iter()
        .filter(|(_, total)| *total < min_total_events)
        .map(|(country, _)| country)
        .collect();

    let key = |e: &EventRecord| Some((e.year(), label(&e.country)?));
    let fatalities = sum_by(recent.iter().copied(), key, fatalities_metric);
    let counts = sum_by(recent.iter().copied(), key, events_metric);

    let rows = counts
        .into_iter()
        .filter(|((_, country), _)| !excluded.contains(country))
        .map(|((year, country), total_events)| {
            let total_fatalities = fatalities.get(&(year, country.clone())).copied().unwrap_or(0.0);
            vec![
                year.to_string(),
                country,
                format_number(total_fatalities),
                format_number(total_events),
            ]
        })
        .collect();

    Projection::new(
        "yearly_fatalities_events_by_country",
        &[YEAR, COUNTRY, FATALITIES, EVENTS],
        rows,
    )
}

pub fn sub_events_by_country(events: &[&EventRecord]) -> Projection {
    let totals = sum_by(
        events.iter().copied(),
        |e| Some((label(&e.country)?, e.year(), label(&e.sub_event_type)?)),
        events_metric,
    );
    Projection::new(
        "sub_events_by_country",
        &[COUNTRY, YEAR, SUB_EVENT_TYPE, EVENTS],
        positive_rows(totals, |(country, year, sub_event_type)| {
            vec![country, year.to_string(), sub_event_type]
        }),
    )
}

/// Compute every projection, in [`PROJECTION_NAMES`] order.
pub fn aggregate(events: &[EventRecord], options: &AggregateOptions) -> Vec<Projection> {
    let recent = filter_since(events, options.cutoff);

    vec![
        fatalities_by_country(&recent),
        events_by_country_event_type(&recent),
        events_by_lat_lon(&recent),
        events_by_year_country(&recent),
        events_by_event_type(&recent),
        events_over_time_by_country(&recent),
        yearly_fatalities_events_by_country(events, options.yearly_since, options.min_total_events),
        sub_events_by_country(&recent),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(week: &str, country: &str, event_type: &str, events: f64, fatalities: f64) -> EventRecord {
        EventRecord {
            week: NaiveDate::parse_from_str(week, "%Y-%m-%d").unwrap(),
            region: "Middle East".into(),
            country: country.into(),
            admin1: "Capital".into(),
            event_type: event_type.into(),
            sub_event_type: format!("{} (sub)", event_type),
            id: "1".into(),
            events: Some(events),
            fatalities: Some(fatalities),
            latitude: Some(26.1927),
            longitude: Some(50.5508),
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn rows(p: &Projection) -> Vec<Vec<&str>> {
        p.rows.iter().map(|r| r.iter().map(String::as_str).collect()).collect()
    }

    #[test]
    fn test_cutoff_is_inclusive() {
        let events = vec![
            event("2019-12-28", "Iraq", "Battles", 1.0, 0.0),
            event("2020-01-01", "Iraq", "Battles", 2.0, 0.0),
            event("2020-01-04", "Iraq", "Battles", 3.0, 0.0),
        ];
        let recent = filter_since(&events, date("2020-01-01"));

        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].week, date("2020-01-01"));
    }

    #[test]
    fn test_fatalities_by_country_drops_zero() {
        let events = vec![
            event("2020-01-04", "Yemen", "Battles", 1.0, 4.0),
            event("2020-01-11", "Bahrain", "Protests", 1.0, 0.0),
            event("2020-01-11", "Yemen", "Battles", 1.0, 2.0),
            event("2020-01-18", "Iraq", "Battles", 1.0, 1.0),
        ];
        let refs: Vec<&EventRecord> = events.iter().collect();
        let p = fatalities_by_country(&refs);

        assert_eq!(p.columns, vec!["COUNTRY", "FATALITIES"]);
        assert_eq!(rows(&p), vec![vec!["Iraq", "1"], vec!["Yemen", "6"]]);
    }

    #[test]
    fn test_events_by_country_event_type_sorted() {
        let events = vec![
            event("2020-01-04", "Yemen", "Protests", 2.0, 0.0),
            event("2020-01-04", "Iraq", "Riots", 1.0, 0.0),
            event("2020-01-11", "Iraq", "Battles", 3.0, 0.0),
            event("2020-01-11", "Iraq", "Battles", 0.0, 0.0),
            event("2020-01-11", "Oman", "Battles", 0.0, 0.0),
        ];
        let refs: Vec<&EventRecord> = events.iter().collect();
        let p = events_by_country_event_type(&refs);

        assert_eq!(
            rows(&p),
            vec![
                vec!["Iraq", "Battles", "3"],
                vec!["Iraq", "Riots", "1"],
                vec!["Yemen", "Protests", "2"],
            ]
        );
    }

    #[test]
    fn test_events_by_lat_lon_skips_missing_coordinates() {
        let mut no_coords = event("2021-03-06", "Iraq", "Battles", 5.0, 0.0);
        no_coords.latitude = None;
        let events = vec![
            event("2020-01-04", "Bahrain", "Battles", 1.0, 0.0),
            event("2020-02-04", "Bahrain", "Battles", 2.0, 0.0),
            event("2021-01-02", "Bahrain", "Battles", 1.0, 0.0),
            no_coords,
        ];
        let refs: Vec<&EventRecord> = events.iter().collect();
        let p = events_by_lat_lon(&refs);

        assert_eq!(
            rows(&p),
            vec![
                vec!["Bahrain", "26.1927", "50.5508", "2020", "3"],
                vec!["Bahrain", "26.1927", "50.5508", "2021", "1"],
            ]
        );
    }

    #[test]
    fn test_events_by_year_country_and_event_type() {
        let events = vec![
            event("2021-01-02", "Iraq", "Battles", 1.0, 0.0),
            event("2020-01-04", "Iraq", "Protests", 2.0, 0.0),
            event("2020-06-06", "Iraq", "Battles", 4.0, 0.0),
        ];
        let refs: Vec<&EventRecord> = events.iter().collect();

        assert_eq!(
            rows(&events_by_year_country(&refs)),
            vec![vec!["2020", "Iraq", "6"], vec!["2021", "Iraq", "1"]]
        );
        assert_eq!(
            rows(&events_by_event_type(&refs)),
            vec![vec!["Battles", "5"], vec!["Protests", "2"]]
        );
    }

    #[test]
    fn test_events_over_time_keeps_input_order() {
        let mut missing = event("2020-01-11", "Oman", "Battles", 0.0, 0.0);
        missing.events = None;
        let events = vec![
            event("2020-02-01", "Yemen", "Battles", 3.0, 0.0),
            event("2020-01-04", "Iraq", "Battles", 0.0, 0.0),
            missing,
        ];
        let refs: Vec<&EventRecord> = events.iter().collect();
        let p = events_over_time_by_country(&refs);

        assert_eq!(p.columns, vec!["WEEK", "COUNTRY", "EVENTS"]);
        assert_eq!(
            rows(&p),
            vec![
                vec!["2020-02-01", "Yemen", "3"],
                vec!["2020-01-04", "Iraq", "0"],
                vec!["2020-01-11", "Oman", ""],
            ]
        );
    }

    #[test]
    fn test_yearly_exclusion_is_all_or_nothing() {
        let events = vec![
            // A: 9,500 in total, 9,000 of them in one year
            event("2016-03-05", "A", "Battles", 9_000.0, 10.0),
            event("2017-03-04", "A", "Battles", 500.0, 1.0),
            // B: 12,000 in total, spread thinly
            event("2016-03-05", "B", "Battles", 2_000.0, 3.0),
            event("2017-03-04", "B", "Battles", 10_000.0, 0.0),
            // before the yearly window, ignored even for the totals
            event("2014-06-07", "C", "Battles", 50_000.0, 0.0),
        ];
        let p = yearly_fatalities_events_by_country(&events, 2015, 10_000.0);

        assert_eq!(p.columns, vec!["YEAR", "COUNTRY", "FATALITIES", "EVENTS"]);
        assert_eq!(
            rows(&p),
            vec![vec!["2016", "B", "3", "2000"], vec!["2017", "B", "0", "10000"]]
        );
    }

    #[test]
    fn test_yearly_ignores_cutoff() {
        let events = vec![
            event("2016-03-05", "B", "Battles", 20_000.0, 3.0),
            event("2021-03-06", "B", "Battles", 1.0, 1.0),
        ];
        let projections = aggregate(&events, &AggregateOptions::default());
        let yearly = projections
            .iter()
            .find(|p| p.name == "yearly_fatalities_events_by_country")
            .unwrap();
        assert_eq!(yearly.rows.len(), 2);

        let by_year = projections.iter().find(|p| p.name == "events_by_year_country").unwrap();
        assert_eq!(rows(by_year), vec![vec!["2021", "B", "1"]]);
    }

    #[test]
    fn test_sub_events_by_country() {
        let events = vec![
            event("2020-01-04", "Iraq", "Battles", 2.0, 0.0),
            event("2020-01-11", "Iraq", "Battles", 1.0, 0.0),
            event("2021-01-02", "Iraq", "Riots", 0.0, 0.0),
        ];
        let refs: Vec<&EventRecord> = events.iter().collect();

        assert_eq!(
            rows(&sub_events_by_country(&refs)),
            vec![vec!["Iraq", "2020", "Battles (sub)", "3"]]
        );
    }

    #[test]
    fn test_empty_keys_form_no_group() {
        let mut no_country = event("2020-01-04", "", "Battles", 4.0, 2.0);
        no_country.sub_event_type = String::new();
        let no_type = event("2020-01-04", "Iraq", " ", 3.0, 1.0);
        let events = vec![event("2020-01-11", "Iraq", "Battles", 1.0, 1.0), no_country, no_type];
        let refs: Vec<&EventRecord> = events.iter().collect();

        assert_eq!(rows(&fatalities_by_country(&refs)), vec![vec!["Iraq", "2"]]);
        assert_eq!(
            rows(&events_by_country_event_type(&refs)),
            vec![vec!["Iraq", "Battles", "1"]]
        );
        assert_eq!(rows(&events_by_event_type(&refs)), vec![vec!["Battles", "5"]]);
        assert_eq!(rows(&events_by_year_country(&refs)), vec![vec!["2020", "Iraq", "4"]]);
        assert_eq!(rows(&events_by_lat_lon(&refs)).len(), 1);
        assert_eq!(
            rows(&sub_events_by_country(&refs)),
            vec![vec!["Iraq", "2020", "(sub)", "3"], vec!["Iraq", "2020", "Battles (sub)", "1"]]
        );
        // raw rows are not grouped
        assert_eq!(events_over_time_by_country(&refs).rows.len(), 3);
    }

    #[test]
    fn test_aggregate_names_in_order() {
        let projections = aggregate(&[], &AggregateOptions::default());
        let names: Vec<&str> = projections.iter().map(|p| p.name).collect();
        assert_eq!(names, PROJECTION_NAMES.to_vec());
        assert!(projections.iter().all(|p| p.rows.is_empty()));
    }

    #[test]
    fn test_coordinate_ordering() {
        let mut coords = vec![Coordinate(2.5), Coordinate(-1.0), Coordinate(0.0)];
        coords.sort();
        assert_eq!(coords, vec![Coordinate(-1.0), Coordinate(0.0), Coordinate(2.5)]);
    }
}
