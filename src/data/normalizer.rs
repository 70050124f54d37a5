//! Data Normalizer Module
//! Maps exported column spellings onto canonical names and coerces date columns.

use crate::config::DateOrder;
use crate::data::dates::{parse_date_lenient, parse_datetime_lenient};
use crate::data::loader::column_names;
use chrono::NaiveDate;
use polars::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, warn};

/// Canonical column names.
pub mod columns {
    pub const STUDENT: &str = "Student";
    pub const YEAR: &str = "Year";
    pub const REG_FORM: &str = "Reg Form";
    pub const HOUSE: &str = "House";
    pub const REASON: &str = "Reason";
    pub const DETENTION_TYPE: &str = "Detention Type";
    pub const ISSUED_DATE: &str = "Issued Date";
    pub const ISSUED_BY: &str = "Issued By";
    pub const DETENTION_DATE: &str = "Detention Date";
    pub const DETENTION_ATTENDANCE: &str = "Detention Attendance";

    pub const DATE_TIME: &str = "DateTime";
    pub const REPORTED_BY: &str = "Reported By";
    pub const LOCATION: &str = "Location";
    pub const COMMENTS: &str = "Comments";
    pub const TYPE: &str = "Type";
    pub const STUDENTS: &str = "Students";
    pub const EVENT: &str = "Event";
    pub const ASSIGNED_TO: &str = "Assigned To";
    pub const STATUS: &str = "Status";
}

use columns::*;

/// Source spelling -> canonical name for detention exports.
const DETENTION_RENAMES: &[(&str, &str)] = &[
    ("Student", STUDENT),
    ("Year", YEAR),
    ("Reg. Form", REG_FORM),
    ("House", HOUSE),
    ("Reason", REASON),
    ("Detention Type", DETENTION_TYPE),
    ("Issued Date", ISSUED_DATE),
    ("Issued By", ISSUED_BY),
    ("Detention Date", DETENTION_DATE),
    ("Detention Attendance", DETENTION_ATTENDANCE),
];

/// Source spelling -> canonical name for on-call exports.
const INCIDENT_RENAMES: &[(&str, &str)] = &[
    ("Date/Time", DATE_TIME),
    ("Reported by", REPORTED_BY),
    ("Location", LOCATION),
    ("Comments", COMMENTS),
    ("Type", TYPE),
    ("Students involved", STUDENTS),
    ("Event", EVENT),
    ("Assigned to", ASSIGNED_TO),
    ("Status", STATUS),
];

/// Which log a table holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    Detentions,
    Incidents,
}

impl DatasetKind {
    pub fn label(&self) -> &'static str {
        match self {
            DatasetKind::Detentions => "Detentions",
            DatasetKind::Incidents => "On-Call",
        }
    }

    fn renames(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            DatasetKind::Detentions => DETENTION_RENAMES,
            DatasetKind::Incidents => INCIDENT_RENAMES,
        }
    }

    fn date_columns(&self) -> &'static [(&'static str, DateTarget)] {
        match self {
            DatasetKind::Detentions => &[
                (ISSUED_DATE, DateTarget::Date),
                (DETENTION_DATE, DateTarget::Date),
            ],
            DatasetKind::Incidents => &[(DATE_TIME, DateTarget::Datetime)],
        }
    }

    /// Columns the summaries depend on; their absence is worth a warning.
    fn required_columns(&self) -> &'static [&'static str] {
        match self {
            DatasetKind::Detentions => &[YEAR, ISSUED_DATE],
            DatasetKind::Incidents => &[TYPE, DATE_TIME, STATUS],
        }
    }
}

/// Soft problem found while preparing or summarizing a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum Issue {
    MissingColumn { column: String },
    UnparseableDates { column: String, count: usize },
    AttendanceColumnInferred { from: String },
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::MissingColumn { column } => {
                write!(f, "The '{column}' column is missing from this data.")
            }
            Issue::UnparseableDates { column, count } => {
                write!(f, "{count} value(s) in '{column}' could not be read as dates and were ignored.")
            }
            Issue::AttendanceColumnInferred { from } => {
                write!(f, "Using '{from}' as the detention attendance column.")
            }
        }
    }
}

/// True when `issues` report `column` as absent.
pub fn reports_missing(issues: &[Issue], column: &str) -> bool {
    issues
        .iter()
        .any(|i| matches!(i, Issue::MissingColumn { column: c } if c == column))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateTarget {
    Date,
    Datetime,
}

impl DateTarget {
    fn dtype(&self) -> DataType {
        match self {
            DateTarget::Date => DataType::Date,
            DateTarget::Datetime => DataType::Datetime(TimeUnit::Milliseconds, None),
        }
    }
}

/// A table with canonical column names and typed date columns.
#[derive(Debug, Clone)]
pub struct NormalizedTable {
    pub kind: DatasetKind,
    pub df: DataFrame,
    pub issues: Vec<Issue>,
}

impl NormalizedTable {
    pub fn has_column(&self, name: &str) -> bool {
        self.df.get_column_index(name).is_some()
    }
}

/// Prepare a raw table for summarizing. Never fails: problems become issues.
pub fn normalize(mut df: DataFrame, kind: DatasetKind, order: DateOrder) -> NormalizedTable {
    let mut issues = Vec::new();

    let trimmed = trimmed_names(&column_names(&df));
    if let Err(e) = df.set_column_names(trimmed) {
        warn!(error = %e, "could not trim column names");
    }

    for (from, to) in kind.renames() {
        rename_column(&mut df, from, to);
    }

    if kind == DatasetKind::Detentions && !has_column(&df, DETENTION_ATTENDANCE) {
        let names = column_names(&df);
        match find_attendance_column(names.iter().map(String::as_str)) {
            Some(found) => {
                let found = found.to_string();
                rename_column(&mut df, &found, DETENTION_ATTENDANCE);
                issues.push(Issue::AttendanceColumnInferred { from: found });
            }
            None => issues.push(Issue::MissingColumn {
                column: DETENTION_ATTENDANCE.to_string(),
            }),
        }
    }

    for &(name, target) in kind.date_columns() {
        match coerce_date_column(&mut df, name, target, order) {
            Ok(Some(failed)) if failed > 0 => {
                issues.push(Issue::UnparseableDates {
                    column: name.to_string(),
                    count: failed,
                });
            }
            Ok(_) => {}
            Err(e) => warn!(column = name, error = %e, "date coercion failed"),
        }
    }

    for column in kind.required_columns() {
        if !has_column(&df, column) {
            issues.push(Issue::MissingColumn {
                column: column.to_string(),
            });
        }
    }

    debug!(kind = kind.label(), rows = df.height(), issues = issues.len(), "table normalized");
    NormalizedTable { kind, df, issues }
}

/// First column whose name mentions attendance, case-insensitively.
pub fn find_attendance_column<'a, I>(names: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    names
        .into_iter()
        .find(|name| name.to_lowercase().contains("attendance"))
}

/// Trim surrounding whitespace from column names. A name whose trimmed form
/// is already taken keeps its original spelling.
pub fn trimmed_names(names: &[String]) -> Vec<String> {
    let mut taken: HashSet<String> = names.iter().cloned().collect();

    names
        .iter()
        .map(|name| {
            let trimmed = name.trim();
            if trimmed == name {
                return name.clone();
            }
            if taken.contains(trimmed) {
                warn!(column = %name, "trimmed column name collides; keeping original");
                return name.clone();
            }
            taken.remove(name);
            taken.insert(trimmed.to_string());
            trimmed.to_string()
        })
        .collect()
}

/// Physical value of a polars `Date`.
fn days_since_epoch(date: NaiveDate) -> i32 {
    date.signed_duration_since(NaiveDate::default()).num_days() as i32
}

fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_index(name).is_some()
}

fn rename_column(df: &mut DataFrame, from: &str, to: &str) {
    if from == to || !has_column(df, from) || has_column(df, to) {
        return;
    }
    if let Err(e) = df.rename(from, to.into()) {
        warn!(from, to, error = %e, "column rename failed");
    }
}

/// Replace a column with its parsed dates. Returns the number of non-empty
/// cells that could not be parsed, or `None` when the column is absent.
fn coerce_date_column(
    df: &mut DataFrame,
    name: &str,
    target: DateTarget,
    order: DateOrder,
) -> PolarsResult<Option<usize>> {
    let Ok(column) = df.column(name) else {
        return Ok(None);
    };

    let dtype = column.dtype().clone();
    let coerced = match dtype {
        dtype if dtype == target.dtype() => return Ok(Some(0)),
        DataType::Date | DataType::Datetime(_, _) => column.cast(&target.dtype())?,
        _ => {
            let text = column.cast(&DataType::String)?;
            let text = text.str()?;
            let mut failed = 0usize;
            let mut note_failure = |raw: &str| {
                if !raw.trim().is_empty() {
                    failed += 1;
                }
            };

            let parsed = match target {
                DateTarget::Date => {
                    let days: Vec<Option<i32>> = text
                        .into_iter()
                        .map(|cell| {
                            let raw = cell?;
                            let date = parse_date_lenient(raw, order);
                            if date.is_none() {
                                note_failure(raw);
                            }
                            date.map(days_since_epoch)
                        })
                        .collect();
                    Column::new(name.into(), days)
                }
                DateTarget::Datetime => {
                    let millis: Vec<Option<i64>> = text
                        .into_iter()
                        .map(|cell| {
                            let raw = cell?;
                            let ts = parse_datetime_lenient(raw, order);
                            if ts.is_none() {
                                note_failure(raw);
                            }
                            ts.map(|t| t.and_utc().timestamp_millis())
                        })
                        .collect();
                    Column::new(name.into(), millis)
                }
            };

            if failed > 0 {
                debug!(column = name, failed, "unparseable dates set to null");
            }
            let coerced = parsed.cast(&target.dtype())?;
            df.with_column(coerced)?;
            return Ok(Some(failed));
        }
    };

    df.with_column(coerced)?;
    Ok(Some(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detentions_frame() -> DataFrame {
        df!(
            "Student" => ["Ada", "Ben", "Cal"],
            " Year " => ["7", "8", "7"],
            "Reg. Form" => ["7A", "8B", "7C"],
            "Issued Date" => ["2024-03-12", "not a date", "13/03/2024"],
            "Detention Attendance" => ["Present", "Absent", "present - late"],
            "Notes" => ["a", "b", "c"]
        )
        .unwrap()
    }

    fn dates(df: &DataFrame, name: &str) -> Vec<Option<NaiveDate>> {
        df.column(name)
            .unwrap()
            .cast(&DataType::Int32)
            .unwrap()
            .i32()
            .unwrap()
            .into_iter()
            .map(|d| d.map(|d| NaiveDate::default() + chrono::Duration::days(d as i64)))
            .collect()
    }

    #[test]
    fn renames_known_spellings_and_keeps_extras() {
        let table = normalize(detentions_frame(), DatasetKind::Detentions, DateOrder::DayFirst);
        assert!(table.has_column(YEAR));
        assert!(table.has_column(REG_FORM));
        assert!(!table.has_column("Reg. Form"));
        assert!(table.has_column("Notes"));
    }

    #[test]
    fn trimmed_names_match_like_untrimmed() {
        let padded = normalize(detentions_frame(), DatasetKind::Detentions, DateOrder::DayFirst);
        let mut plain_df = detentions_frame();
        plain_df.rename(" Year ", "Year".into()).unwrap();
        let plain = normalize(plain_df, DatasetKind::Detentions, DateOrder::DayFirst);
        assert!(padded.df.equals_missing(&plain.df));
        assert_eq!(padded.issues, plain.issues);
    }

    #[test]
    fn trimming_never_creates_duplicates() {
        let names = vec!["Year".to_string(), " Year".to_string(), " House ".to_string()];
        assert_eq!(trimmed_names(&names), vec!["Year", " Year", "House"]);
    }

    #[test]
    fn bad_dates_become_null() {
        let table = normalize(detentions_frame(), DatasetKind::Detentions, DateOrder::DayFirst);
        assert_eq!(table.df.column(ISSUED_DATE).unwrap().dtype(), &DataType::Date);
        assert_eq!(
            dates(&table.df, ISSUED_DATE),
            vec![
                NaiveDate::from_ymd_opt(2024, 3, 12),
                None,
                NaiveDate::from_ymd_opt(2024, 3, 13),
            ]
        );
        assert!(table.issues.contains(&Issue::UnparseableDates {
            column: ISSUED_DATE.to_string(),
            count: 1
        }));
    }

    #[test]
    fn normalizing_twice_changes_nothing() {
        let once = normalize(detentions_frame(), DatasetKind::Detentions, DateOrder::DayFirst);
        let twice = normalize(once.df.clone(), DatasetKind::Detentions, DateOrder::DayFirst);
        assert!(once.df.equals_missing(&twice.df));
        assert_eq!(column_names(&once.df), column_names(&twice.df));
    }

    #[test]
    fn infers_attendance_column() {
        let df = df!(
            "Student" => ["Ada", "Ben"],
            "Year" => ["7", "8"],
            "Issued Date" => ["2024-03-12", "2024-03-13"],
            "Pupil Attendance Record" => ["Present", "Absent"],
            "Other attendance" => ["x", "y"]
        )
        .unwrap();

        let table = normalize(df, DatasetKind::Detentions, DateOrder::DayFirst);
        assert!(table.has_column(DETENTION_ATTENDANCE));
        assert!(!table.has_column("Pupil Attendance Record"));
        assert!(table.has_column("Other attendance"));
        assert_eq!(
            table.issues,
            vec![Issue::AttendanceColumnInferred {
                from: "Pupil Attendance Record".to_string()
            }]
        );
    }

    #[test]
    fn missing_attendance_is_soft() {
        let df = df!("Student" => ["Ada"], "Year" => ["7"], "Issued Date" => ["2024-03-12"]).unwrap();
        let table = normalize(df, DatasetKind::Detentions, DateOrder::DayFirst);
        assert!(!table.has_column(DETENTION_ATTENDANCE));
        assert_eq!(
            table.issues,
            vec![Issue::MissingColumn {
                column: DETENTION_ATTENDANCE.to_string()
            }]
        );
    }

    #[test]
    fn attendance_scan_uses_source_order() {
        let names = ["Student", "Attendance (AM)", "Detention attendance"];
        assert_eq!(find_attendance_column(names), Some("Attendance (AM)"));
        assert_eq!(find_attendance_column(["Student", "Year"]), None);
    }

    #[test]
    fn incidents_rename_and_parse_timestamps() {
        let df = df!(
            "Date/Time" => ["2024-03-12 09:15", "12/03/2024 14:00", ""],
            "Reported by" => ["Mr A", "Ms B", "Mr A"],
            "Students involved" => ["Ada", "Ben", "Cal"],
            "Type" => ["Disruption", "Refusal", "Disruption"],
            "Status" => ["Resolved", "Unresolved", "Open"]
        )
        .unwrap();

        let table = normalize(df, DatasetKind::Incidents, DateOrder::DayFirst);
        assert!(table.has_column(DATE_TIME));
        assert!(table.has_column(REPORTED_BY));
        assert!(table.has_column(STUDENTS));
        assert_eq!(
            table.df.column(DATE_TIME).unwrap().dtype(),
            &DataType::Datetime(TimeUnit::Milliseconds, None)
        );
        assert_eq!(table.df.column(DATE_TIME).unwrap().null_count(), 1);
        assert!(table.issues.is_empty());
    }

    #[test]
    fn reports_missing_summary_columns() {
        let df = df!("Reported by" => ["Mr A"]).unwrap();
        let table = normalize(df, DatasetKind::Incidents, DateOrder::DayFirst);
        let missing: Vec<_> = table
            .issues
            .iter()
            .filter_map(|i| match i {
                Issue::MissingColumn { column } => Some(column.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(missing, vec![TYPE, DATE_TIME, STATUS]);
        assert!(reports_missing(&table.issues, STATUS));
        assert!(!reports_missing(&table.issues, REPORTED_BY));
    }
}
