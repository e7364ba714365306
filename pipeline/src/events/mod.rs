//! Event-log aggregation.
//!
//! Reads a weekly conflict-event export, keeps the events on or after a
//! cutoff and writes one CSV per projection into an output directory.

pub mod projections;
pub mod record;

pub use projections::{aggregate, filter_since, AggregateOptions, Coordinate, Projection, PROJECTION_NAMES};
pub use record::{events_from_table, parse_week, EventLog, EventRecord};

use chrono::NaiveDate;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::{EventError, PipelineError, PipelineResult};
use crate::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::parser::parse_file_auto;
use crate::writer::write_csv_file;

/// Result of an aggregation run
#[derive(Debug, Clone, Serialize)]
pub struct AggregateSummary {
    /// Events read (dated rows)
    pub total_events: usize,
    /// Events on or after the cutoff
    pub recent_events: usize,
    /// Rows skipped for an empty WEEK
    pub undated: usize,
    /// Earliest and latest week of the recent events
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    /// Files written, in projection order
    pub outputs: Vec<PathBuf>,
}

/// Parse a cutoff date given as `YYYY-MM-DD`.
pub fn parse_cutoff(raw: &str) -> Result<NaiveDate, EventError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| EventError::InvalidCutoff(raw.to_string()))
}

/// Aggregate an event-log file into `output_dir`.
pub fn aggregate_file(
    path: &Path,
    output_dir: &Path,
    options: &AggregateOptions,
) -> PipelineResult<AggregateSummary> {
    log_info(format!("📖 Reading {}", path.display()));
    let parsed = parse_file_auto(path)?;
    let log = events_from_table(&parsed.table).map_err(|e| match e {
        PipelineError::Input(err) => PipelineError::Input(err.in_file(path)),
        other => other,
    })?;
    log_success(format!("Read {} events", log.records.len()));
    if log.undated > 0 {
        log_warning(format!("{} rows had no WEEK and were skipped", log.undated));
    }

    let recent = filter_since(&log.records, options.cutoff);
    let date_range = recent
        .iter()
        .map(|e| e.week)
        .min()
        .zip(recent.iter().map(|e| e.week).max());
    match date_range {
        Some((from, to)) => log_info(format!("Data from {} to {}", from, to)),
        None => log_warning(format!("No events on or after {}", options.cutoff)),
    }

    let mut outputs = Vec::new();
    for projection in aggregate(&log.records, options) {
        let output = output_dir.join(projection.file_name());
        write_csv_file(&output, &projection.columns, projection.rows.iter().cloned())?;
        log_info_indent(format!("{} rows → {}", projection.rows.len(), output.display()), 1);
        outputs.push(output);
    }
    log_success(format!("Wrote {} projections to {}", outputs.len(), output_dir.display()));

    Ok(AggregateSummary {
        total_events: log.records.len(),
        recent_events: recent.len(),
        undated: log.undated,
        date_range,
        outputs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logs::{LogFormat, LOG_SINK};
    use std::fs;

    const LOG: &str = "\
WEEK,REGION,COUNTRY,ADMIN1,EVENT_TYPE,SUB_EVENT_TYPE,EVENTS,FATALITIES,ID,CENTROID_LATITUDE,CENTROID_LONGITUDE
2019-12-28,Middle East,Iraq,Baghdad,Battles,Armed clash,4,2,1,33.3,44.4
2020-01-04,Middle East,Iraq,Baghdad,Battles,Armed clash,3,1,1,33.3,44.4
2020-01-04,Middle East,Yemen,Sanaa,Protests,Peaceful protest,2,0,2,15.3,44.2
2021-05-01,Middle East,Iraq,Basra,Riots,Mob violence,1,0,3,30.5,47.8
";

    #[test]
    fn test_parse_cutoff() {
        assert_eq!(parse_cutoff("2020-01-01").unwrap(), NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        assert!(matches!(parse_cutoff("01/01/2020"), Err(EventError::InvalidCutoff(_))));
    }

    #[test]
    fn test_aggregate_file_writes_every_projection() {
        LOG_SINK.set_format(LogFormat::Quiet);
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("events.csv");
        fs::write(&input, LOG).unwrap();
        let out_dir = dir.path().join("out");

        let summary = aggregate_file(&input, &out_dir, &AggregateOptions::default()).unwrap();
        assert_eq!(summary.total_events, 4);
        assert_eq!(summary.recent_events, 3);
        assert_eq!(
            summary.date_range,
            Some((
                NaiveDate::from_ymd_opt(2020, 1, 4).unwrap(),
                NaiveDate::from_ymd_opt(2021, 5, 1).unwrap()
            ))
        );
        assert_eq!(summary.outputs.len(), PROJECTION_NAMES.len());
        for name in PROJECTION_NAMES {
            assert!(out_dir.join(format!("{}.csv", name)).exists(), "{} missing", name);
        }

        let fatalities = fs::read_to_string(out_dir.join("fatalities_by_country.csv")).unwrap();
        assert_eq!(fatalities, "COUNTRY,FATALITIES\nIraq,1\n");

        let over_time = fs::read_to_string(out_dir.join("events_over_time_by_country.csv")).unwrap();
        assert_eq!(
            over_time,
            "WEEK,COUNTRY,EVENTS\n2020-01-04,Iraq,3\n2020-01-04,Yemen,2\n2021-05-01,Iraq,1\n"
        );

        // nobody reaches the default yearly threshold
        let yearly = fs::read_to_string(out_dir.join("yearly_fatalities_events_by_country.csv")).unwrap();
        assert_eq!(yearly, "YEAR,COUNTRY,FATALITIES,EVENTS\n");
    }

    #[test]
    fn test_aggregate_file_custom_threshold() {
        LOG_SINK.set_format(LogFormat::Quiet);
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("events.csv");
        fs::write(&input, LOG).unwrap();

        let options = AggregateOptions {
            min_total_events: 5.0,
            ..AggregateOptions::default()
        };
        aggregate_file(&input, dir.path(), &options).unwrap();

        let yearly = fs::read_to_string(dir.path().join("yearly_fatalities_events_by_country.csv")).unwrap();
        assert_eq!(
            yearly,
            "YEAR,COUNTRY,FATALITIES,EVENTS\n2019,Iraq,2,4\n2020,Iraq,1,3\n2021,Iraq,0,1\n"
        );
    }

    #[test]
    fn test_invalid_week_aborts() {
        LOG_SINK.set_format(LogFormat::Quiet);
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("events.csv");
        fs::write(
            &input,
            "WEEK,COUNTRY,EVENT_TYPE,SUB_EVENT_TYPE,EVENTS,FATALITIES\nnot-a-date,Iraq,a,b,1,0\n",
        )
        .unwrap();

        let err = aggregate_file(&input, dir.path(), &AggregateOptions::default()).unwrap_err();
        assert!(err.to_string().contains("not-a-date"));
        assert!(err.to_string().contains("events.csv"));
    }
}
