//! Summary Aggregator Module
//! Headline counts, attendance rates and grouped breakdowns for normalized tables.

use crate::data::columns::{
    DATE_TIME, DETENTION_ATTENDANCE, ISSUED_DATE, STATUS, TYPE, YEAR,
};
use crate::data::{reports_missing, DatasetKind, Issue, NormalizedTable};
use chrono::{DateTime, NaiveDate};
use polars::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Headline attendance test: any value mentioning "present", in any case.
pub fn is_present_loose(value: &str) -> bool {
    value.to_lowercase().contains("present")
}

/// Breakdown attendance test: the value is exactly "Present".
///
/// Stricter than [`is_present_loose`], so per-group attended counts can sum
/// to less than the headline figure.
pub fn is_present_exact(value: &str) -> bool {
    value == "Present"
}

/// `part / whole`, or `None` when there is nothing to divide by.
pub fn ratio(part: usize, whole: usize) -> Option<f64> {
    if whole == 0 {
        None
    } else {
        Some(part as f64 / whole as f64)
    }
}

/// One group of a breakdown table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownRow<K> {
    pub key: K,
    /// Detentions issued, or incidents logged.
    pub count: usize,
    /// Detentions only; `None` without an attendance column.
    pub attended: Option<usize>,
    pub attendance_rate: Option<f64>,
}

impl<K> BreakdownRow<K> {
    fn new(key: K, count: usize, attended: Option<usize>) -> Self {
        Self {
            key,
            count,
            attended,
            attendance_rate: attended.and_then(|a| ratio(a, count)),
        }
    }
}

/// Breakdown keyed by a category value; `None` collects blank cells.
pub type CategoryBreakdown = Vec<BreakdownRow<Option<String>>>;

/// Breakdown keyed by calendar day, ascending.
pub type DailyBreakdown = Vec<BreakdownRow<NaiveDate>>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetentionSummary {
    pub total: usize,
    pub attended: usize,
    /// Zero, not undefined, for an empty table.
    pub attendance_rate: f64,
    pub by_year: CategoryBreakdown,
    pub by_day: DailyBreakdown,
    pub issues: Vec<Issue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncidentSummary {
    pub total: usize,
    pub resolved: usize,
    pub unresolved: usize,
    pub by_type: CategoryBreakdown,
    pub by_day: DailyBreakdown,
    pub issues: Vec<Issue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "dataset", rename_all = "snake_case")]
pub enum Summary {
    Detentions(DetentionSummary),
    Incidents(IncidentSummary),
}

impl Summary {
    pub fn kind(&self) -> DatasetKind {
        match self {
            Summary::Detentions(_) => DatasetKind::Detentions,
            Summary::Incidents(_) => DatasetKind::Incidents,
        }
    }

    pub fn total(&self) -> usize {
        match self {
            Summary::Detentions(s) => s.total,
            Summary::Incidents(s) => s.total,
        }
    }

    pub fn issues(&self) -> &[Issue] {
        match self {
            Summary::Detentions(s) => &s.issues,
            Summary::Incidents(s) => &s.issues,
        }
    }

    /// True when the normalizer reported `column` as absent.
    pub fn is_missing(&self, column: &str) -> bool {
        reports_missing(self.issues(), column)
    }
}

/// Computes summaries from normalized tables.
pub struct SummaryCalculator;

impl SummaryCalculator {
    pub fn summarize(table: &NormalizedTable) -> Summary {
        let summary = match table.kind {
            DatasetKind::Detentions => Summary::Detentions(Self::summarize_detentions(table)),
            DatasetKind::Incidents => Summary::Incidents(Self::summarize_incidents(table)),
        };
        debug!(kind = table.kind.label(), total = summary.total(), "table summarized");
        summary
    }

    pub fn summarize_detentions(table: &NormalizedTable) -> DetentionSummary {
        let df = &table.df;
        let total = df.height();
        let attendance = text_values(df, DETENTION_ATTENDANCE);

        let attended = attendance
            .as_ref()
            .map(|values| {
                values
                    .iter()
                    .filter(|v| v.as_deref().is_some_and(is_present_loose))
                    .count()
            })
            .unwrap_or(0);

        let by_year = text_values(df, YEAR)
            .map(|years| {
                let mut rows = Self::category_breakdown(&years, attendance.as_deref());
                let numeric = numeric_keys(&rows);
                rows.sort_by(|a, b| compare_category_keys(&a.key, &b.key, numeric));
                rows
            })
            .unwrap_or_default();

        let by_day = date_values(df, ISSUED_DATE)
            .map(|dates| Self::daily_breakdown(&dates, attendance.as_deref()))
            .unwrap_or_default();

        DetentionSummary {
            total,
            attended,
            attendance_rate: ratio(attended, total).unwrap_or(0.0),
            by_year,
            by_day,
            issues: table.issues.clone(),
        }
    }

    pub fn summarize_incidents(table: &NormalizedTable) -> IncidentSummary {
        let df = &table.df;
        let statuses = text_values(df, STATUS).unwrap_or_default();
        let status_count = |needle: &str| {
            statuses
                .iter()
                .filter(|s| s.as_deref().is_some_and(|s| s.contains(needle)))
                .count()
        };

        let by_type = text_values(df, TYPE)
            .map(|types| {
                let mut rows = Self::category_breakdown(&types, None);
                rows.sort_by(|a, b| {
                    b.count
                        .cmp(&a.count)
                        .then_with(|| compare_category_keys(&a.key, &b.key, false))
                });
                rows
            })
            .unwrap_or_default();

        let by_day = date_values(df, DATE_TIME)
            .map(|dates| Self::daily_breakdown(&dates, None))
            .unwrap_or_default();

        IncidentSummary {
            total: df.height(),
            resolved: status_count("Resolved"),
            unresolved: status_count("Unresolved"),
            by_type,
            by_day,
            issues: table.issues.clone(),
        }
    }

    /// Group rows by category value. Attendance, when given, is counted with
    /// [`is_present_exact`]. Rows come back unordered.
    pub fn category_breakdown(
        keys: &[Option<String>],
        attendance: Option<&[Option<String>]>,
    ) -> CategoryBreakdown {
        let mut groups: HashMap<Option<String>, (usize, usize)> = HashMap::new();

        for (i, key) in keys.iter().enumerate() {
            let entry = groups.entry(key.clone()).or_insert((0, 0));
            entry.0 += 1;
            if present_at(attendance, i) {
                entry.1 += 1;
            }
        }

        groups
            .into_iter()
            .map(|(key, (count, attended))| {
                BreakdownRow::new(key, count, attendance.map(|_| attended))
            })
            .collect()
    }

    /// Group rows by calendar day, ascending. Rows without a date are skipped.
    pub fn daily_breakdown(
        dates: &[Option<NaiveDate>],
        attendance: Option<&[Option<String>]>,
    ) -> DailyBreakdown {
        let mut days: BTreeMap<NaiveDate, (usize, usize)> = BTreeMap::new();

        for (i, date) in dates.iter().enumerate() {
            let Some(date) = date else {
                continue;
            };
            let entry = days.entry(*date).or_insert((0, 0));
            entry.0 += 1;
            if present_at(attendance, i) {
                entry.1 += 1;
            }
        }

        days.into_iter()
            .map(|(day, (count, attended))| {
                BreakdownRow::new(day, count, attendance.map(|_| attended))
            })
            .collect()
    }
}

fn present_at(attendance: Option<&[Option<String>]>, row: usize) -> bool {
    attendance
        .and_then(|values| values.get(row))
        .and_then(|v| v.as_deref())
        .is_some_and(is_present_exact)
}

/// True when every non-blank key reads as a number, e.g. year groups 7..13.
fn numeric_keys(rows: &[BreakdownRow<Option<String>>]) -> bool {
    rows.iter()
        .filter_map(|r| r.key.as_deref())
        .all(|k| k.trim().parse::<f64>().is_ok())
}

/// Order category keys with blanks last.
fn compare_category_keys(a: &Option<String>, b: &Option<String>, numeric: bool) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) if numeric => {
            let a_num = a.trim().parse::<f64>().unwrap_or(f64::NAN);
            let b_num = b.trim().parse::<f64>().unwrap_or(f64::NAN);
            a_num.partial_cmp(&b_num).unwrap_or(Ordering::Equal)
        }
        (Some(a), Some(b)) => a.cmp(b),
    }
}

/// Cells of a column as text, or `None` when the column is absent.
fn text_values(df: &DataFrame, name: &str) -> Option<Vec<Option<String>>> {
    let column = df.column(name).ok()?;
    let text = column.cast(&DataType::String).ok()?;
    let values = text
        .str()
        .ok()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect();
    Some(values)
}

/// Calendar days of a normalized `Date` or `Datetime` column.
fn date_values(df: &DataFrame, name: &str) -> Option<Vec<Option<NaiveDate>>> {
    let column = df.column(name).ok()?;

    match column.dtype() {
        DataType::Date => {
            let days = column.cast(&DataType::Int32).ok()?;
            let values = days
                .i32()
                .ok()?
                .into_iter()
                .map(|d| d.and_then(date_from_days))
                .collect();
            Some(values)
        }
        DataType::Datetime(unit, _) => {
            let unit = *unit;
            let stamps = column.cast(&DataType::Int64).ok()?;
            let values = stamps
                .i64()
                .ok()?
                .into_iter()
                .map(|t| t.and_then(|t| date_from_timestamp(t, unit)))
                .collect();
            Some(values)
        }
        _ => None,
    }
}

fn date_from_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::default().checked_add_signed(chrono::Duration::days(days as i64))
}

fn date_from_timestamp(value: i64, unit: TimeUnit) -> Option<NaiveDate> {
    let dt = match unit {
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(value),
        TimeUnit::Microseconds => DateTime::from_timestamp_micros(value),
        TimeUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(value)),
    };
    dt.map(|dt| dt.date_naive())
}
