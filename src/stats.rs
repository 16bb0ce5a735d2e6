use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::config::DataPaths;
use crate::util::mean;

/// One persisted summary of a completed trainer session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsRecord {
    pub score: u32,
    pub max_focus: f64,
    #[serde(default)]
    pub errors: HashMap<String, u32>,
    pub time: f64,
    pub timestamp: String,
}

/// Append-only store of session records
pub trait StatsStore {
    /// Full record history; empty on any read or parse failure.
    fn load(&self) -> Vec<StatsRecord>;
    /// Read-modify-write append of one record.
    fn append(&self, record: &StatsRecord) -> io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileStatsStore {
    path: PathBuf,
}

impl FileStatsStore {
    pub fn new(paths: &DataPaths) -> Self {
        Self { path: paths.stats() }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl StatsStore for FileStatsStore {
    fn load(&self) -> Vec<StatsRecord> {
        match fs::read(&self.path) {
            Ok(bytes) => match serde_json::from_slice::<Vec<StatsRecord>>(&bytes) {
                Ok(records) => records,
                Err(err) => {
                    tracing::warn!("unreadable stats store {:?}: {err}", self.path);
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        }
    }

    fn append(&self, record: &StatsRecord) -> io::Result<()> {
        let mut records = self.load();
        records.push(record.clone());
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(&records)?;
        fs::write(&self.path, data)
    }
}

const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Parse a record timestamp, tolerating the formats seen in old stores.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    for fmt in TIMESTAMP_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Per-date rollup of session records
#[derive(Debug, Clone, PartialEq)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    pub games_count: usize,
    pub total_score: u32,
    pub best_max_focus: f64,
    pub max_time: f64,
    pub avg_time: f64,
    pub errors: BTreeMap<String, u32>,
}

/// Bucket records by calendar date, ascending. Records whose timestamp
/// cannot be parsed are dropped.
pub fn aggregate_by_date(records: &[StatsRecord]) -> Vec<DailyAggregate> {
    let mut by_date: BTreeMap<NaiveDate, Vec<&StatsRecord>> = BTreeMap::new();
    for record in records {
        if let Some(dt) = parse_timestamp(&record.timestamp) {
            by_date.entry(dt.date()).or_default().push(record);
        }
    }

    by_date
        .into_iter()
        .map(|(date, bucket)| {
            let times: Vec<f64> = bucket.iter().map(|r| r.time).collect();
            let mut errors: BTreeMap<String, u32> = BTreeMap::new();
            for record in &bucket {
                for (key, count) in &record.errors {
                    *errors.entry(key.clone()).or_insert(0) += count;
                }
            }
            DailyAggregate {
                date,
                games_count: bucket.len(),
                total_score: bucket.iter().map(|r| r.score).sum(),
                best_max_focus: bucket.iter().map(|r| r.max_focus).fold(0.0, f64::max),
                max_time: times.iter().copied().fold(0.0, f64::max),
                avg_time: mean(&times).unwrap_or(0.0),
                errors,
            }
        })
        .collect()
}

/// Whole-history rollup for the dashboard summary line
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OverallMetrics {
    pub records: usize,
    pub total_score: u32,
    pub max_time: f64,
    pub avg_time: f64,
}

pub fn overall_metrics(records: &[StatsRecord]) -> OverallMetrics {
    if records.is_empty() {
        return OverallMetrics::default();
    }
    let times: Vec<f64> = records.iter().map(|r| r.time).collect();
    OverallMetrics {
        records: records.len(),
        total_score: records.iter().map(|r| r.score).sum(),
        max_time: times.iter().copied().fold(0.0, f64::max),
        avg_time: mean(&times).unwrap_or(0.0),
    }
}

/// Export the aggregated table, overwriting `path`. Column order is fixed;
/// the per-key error counts are serialized as one compact JSON blob.
pub fn export_csv(path: &Path, aggregates: &[DailyAggregate]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path).map_err(io::Error::other)?;
    writer
        .write_record([
            "date",
            "games_count",
            "total_score",
            "best_max_focus",
            "max_time",
            "avg_time",
            "errors_json",
        ])
        .map_err(io::Error::other)?;
    for agg in aggregates {
        let errors_json = serde_json::to_string(&agg.errors)?;
        writer
            .write_record([
                agg.date.format("%Y-%m-%d").to_string(),
                agg.games_count.to_string(),
                agg.total_score.to_string(),
                agg.best_max_focus.to_string(),
                agg.max_time.to_string(),
                agg.avg_time.to_string(),
                errors_json,
            ])
            .map_err(io::Error::other)?;
    }
    writer.flush()?;
    Ok(())
}

/// Error keys across all aggregates, most frequent first.
pub fn top_error_keys(aggregates: &[DailyAggregate]) -> Vec<(String, u32)> {
    let mut totals: HashMap<String, u32> = HashMap::new();
    for agg in aggregates {
        for (key, count) in &agg.errors {
            *totals.entry(key.clone()).or_insert(0) += count;
        }
    }
    totals
        .into_iter()
        .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)))
        .collect()
}
