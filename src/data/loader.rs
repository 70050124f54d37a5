//! Data Loader Module
//! Reads CSV and Excel sources, from uploaded files or remote links, into Polars.

use crate::config::DashboardConfig;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use polars::prelude::*;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Unsupported file format: {0}. Please upload a CSV or Excel file.")]
    UnsupportedFormat(String),
    #[error("Error reading file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Error parsing data: {0}")]
    Polars(#[from] PolarsError),
    #[error("Error reading workbook: {0}")]
    Excel(#[from] calamine::Error),
    #[error("Workbook has no sheets")]
    EmptyWorkbook,
    #[error("Error loading data from URL: {0}")]
    Http(#[from] reqwest::Error),
}

/// Where a table comes from.
#[derive(Debug, Clone)]
pub enum Source {
    /// An uploaded file; the name decides the parser.
    File { name: String, bytes: Vec<u8> },
    /// A public link to a CSV, Excel file or Google Sheet.
    Url(String),
}

impl Source {
    /// Read a file from disk into an upload.
    pub fn from_path(path: &Path) -> Result<Self, LoaderError> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(Source::File { name, bytes })
    }

    /// Short label for status lines and logs.
    pub fn label(&self) -> &str {
        match self {
            Source::File { name, .. } => name,
            Source::Url(url) => url,
        }
    }
}

/// Parser selected for a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Excel,
}

impl FileFormat {
    /// Format of an uploaded file, by extension.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_lowercase();
        if lower.ends_with(".csv") {
            Some(FileFormat::Csv)
        } else if lower.ends_with(".xlsx") || lower.ends_with(".xls") {
            Some(FileFormat::Excel)
        } else {
            None
        }
    }

    /// Format of a link. Anything that isn't an Excel file is read as CSV.
    pub fn from_url(url: &str) -> Self {
        match Self::from_file_name(url) {
            Some(FileFormat::Excel) => FileFormat::Excel,
            _ => FileFormat::Csv,
        }
    }
}

/// Rewrite a Google Sheets edit link into its CSV export endpoint.
///
/// Links that aren't Sheets edit links, or whose document id can't be
/// extracted, are returned unchanged.
pub fn rewrite_google_sheets_url(url: &str) -> String {
    if !(url.contains("docs.google.com") && url.contains("/edit")) {
        return url.to_string();
    }

    let sheet_id = url
        .split_once("/d/")
        .and_then(|(_, rest)| rest.split('/').next())
        .filter(|id| !id.is_empty());

    match sheet_id {
        Some(id) => format!("https://docs.google.com/spreadsheets/d/{id}/export?format=csv"),
        None => url.to_string(),
    }
}

/// Handles CSV and Excel loading with Polars.
#[derive(Debug, Clone)]
pub struct DataLoader {
    infer_schema_length: usize,
    http_timeout: Duration,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::from_config(&DashboardConfig::default())
    }
}

impl DataLoader {
    pub fn from_config(config: &DashboardConfig) -> Self {
        Self {
            infer_schema_length: config.infer_schema_length,
            http_timeout: Duration::from_secs(config.http_timeout_secs),
        }
    }

    /// Load a source into a raw DataFrame.
    pub fn load(&self, source: &Source) -> Result<DataFrame, LoaderError> {
        let df = match source {
            Source::File { name, bytes } => {
                let format = FileFormat::from_file_name(name)
                    .ok_or_else(|| LoaderError::UnsupportedFormat(name.clone()))?;
                self.parse(format, bytes)?
            }
            Source::Url(url) => {
                let url = rewrite_google_sheets_url(url.trim());
                let format = FileFormat::from_url(&url);
                debug!(%url, ?format, "fetching remote table");
                let bytes = self.fetch_bytes(&url)?;
                self.parse(format, &bytes)?
            }
        };

        info!(
            source = source.label(),
            rows = df.height(),
            columns = df.width(),
            "table loaded"
        );
        Ok(df)
    }

    fn parse(&self, format: FileFormat, bytes: &[u8]) -> Result<DataFrame, LoaderError> {
        match format {
            FileFormat::Csv => self.read_csv(bytes),
            FileFormat::Excel => read_excel(bytes),
        }
    }

    /// Parse delimited text with a header row.
    pub fn read_csv(&self, bytes: &[u8]) -> Result<DataFrame, LoaderError> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(self.infer_schema_length))
            .with_ignore_errors(true)
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()?;
        Ok(df)
    }

    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, LoaderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.http_timeout)
            .build()?;
        let resp = client.get(url).send()?.error_for_status()?;
        Ok(resp.bytes()?.to_vec())
    }
}

/// Parse the first sheet of a workbook. The first non-empty row is the header.
pub fn read_excel(bytes: &[u8]) -> Result<DataFrame, LoaderError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(LoaderError::EmptyWorkbook)??;

    let mut rows = range
        .rows()
        .skip_while(|row| row.iter().all(|cell| cell_to_string(cell).is_none()));

    let Some(header) = rows.next() else {
        return Ok(DataFrame::empty());
    };
    let names = unique_headers(header.iter().map(cell_to_string).collect());

    let mut values: Vec<Vec<Option<String>>> = vec![Vec::new(); names.len()];
    for row in rows {
        for (i, column) in values.iter_mut().enumerate() {
            column.push(row.get(i).and_then(cell_to_string));
        }
    }

    let columns = names
        .into_iter()
        .zip(values)
        .map(|(name, vals)| Column::new(name.into(), vals))
        .collect();

    Ok(DataFrame::new(columns)?)
}

/// Render a workbook cell as text. Empty and error cells are null.
fn cell_to_string(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) if s.trim().is_empty() => None,
        Data::String(s) => Some(s.clone()),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => Some((*f as i64).to_string()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string()),
        other => Some(other.to_string()),
    }
}

/// Fill blank header cells and make repeated names unique.
pub fn unique_headers(raw: Vec<Option<String>>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();

    raw.into_iter()
        .enumerate()
        .map(|(i, name)| {
            let name = name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| format!("column_{}", i + 1));

            let count = seen.entry(name.clone()).or_insert(0);
            *count += 1;
            if *count == 1 {
                name
            } else {
                format!("{}_duplicated_{}", name, *count - 1)
            }
        })
        .collect()
}

/// Column names of a DataFrame in source order.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_google_sheets_edit_link() {
        assert_eq!(
            rewrite_google_sheets_url("https://docs.google.com/spreadsheets/d/ABC123/edit#gid=0"),
            "https://docs.google.com/spreadsheets/d/ABC123/export?format=csv"
        );
    }

    #[test]
    fn leaves_other_links_alone() {
        let plain = "https://example.org/detentions.csv";
        assert_eq!(rewrite_google_sheets_url(plain), plain);

        let no_id = "https://docs.google.com/spreadsheets/edit";
        assert_eq!(rewrite_google_sheets_url(no_id), no_id);
    }

    #[test]
    fn infers_format_from_extension() {
        assert_eq!(FileFormat::from_file_name("log.CSV"), Some(FileFormat::Csv));
        assert_eq!(FileFormat::from_file_name("log.xlsx"), Some(FileFormat::Excel));
        assert_eq!(FileFormat::from_file_name("log.xls"), Some(FileFormat::Excel));
        assert_eq!(FileFormat::from_file_name("log.pdf"), None);

        assert_eq!(FileFormat::from_url("https://x.org/a.xlsx"), FileFormat::Excel);
        assert_eq!(FileFormat::from_url("https://x.org/export?format=csv"), FileFormat::Csv);
        assert_eq!(FileFormat::from_url("https://x.org/data"), FileFormat::Csv);
    }

    #[test]
    fn unsupported_extension_is_an_error() {
        let source = Source::File {
            name: "report.pdf".to_string(),
            bytes: b"%PDF-1.4".to_vec(),
        };
        let err = DataLoader::default().load(&source).unwrap_err();
        assert!(matches!(err, LoaderError::UnsupportedFormat(ref n) if n == "report.pdf"));
    }

    #[test]
    fn reads_csv_upload() {
        let source = Source::File {
            name: "detentions.csv".to_string(),
            bytes: b"Student,Year\nAda,7\nBen,8\n".to_vec(),
        };
        let df = DataLoader::default().load(&source).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(column_names(&df), vec!["Student", "Year"]);
    }

    #[test]
    fn corrupt_workbook_is_a_load_error() {
        let source = Source::File {
            name: "detentions.xlsx".to_string(),
            bytes: b"not a zip".to_vec(),
        };
        let err = DataLoader::default().load(&source).unwrap_err();
        assert!(matches!(err, LoaderError::Excel(_)));
    }

    #[test]
    fn fills_blank_and_repeated_headers() {
        let headers = unique_headers(vec![
            Some("Student".to_string()),
            None,
            Some("Year".to_string()),
            Some(" Year ".to_string()),
        ]);
        assert_eq!(headers, vec!["Student", "column_2", "Year", "Year_duplicated_1"]);
    }

    #[test]
    fn workbook_cells_become_text() {
        assert_eq!(cell_to_string(&Data::Empty), None);
        assert_eq!(cell_to_string(&Data::String("  ".to_string())), None);
        assert_eq!(cell_to_string(&Data::Float(7.0)), Some("7".to_string()));
        assert_eq!(cell_to_string(&Data::Float(7.5)), Some("7.5".to_string()));
        assert_eq!(cell_to_string(&Data::Int(9)), Some("9".to_string()));
        assert_eq!(
            cell_to_string(&Data::String("Present".to_string())),
            Some("Present".to_string())
        );
    }

    #[test]
    fn reads_first_sheet_of_workbook() {
        use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

        let mut workbook = Workbook::new();
        let date_format = Format::new().set_num_format("dd/mm/yyyy");
        let sheet = workbook.add_worksheet().set_name("Detentions").unwrap();
        for (col, header) in ["Student", "Year", "", "Issued Date", "Notes", "Notes"]
            .iter()
            .enumerate()
        {
            if !header.is_empty() {
                sheet.write_string(0, col as u16, *header).unwrap();
            }
        }
        for (row, (student, year, day)) in [("Ada", 7.0, 12), ("Ben", 8.0, 13)].iter().enumerate() {
            let row = row as u32 + 1;
            sheet.write_string(row, 0, *student).unwrap();
            sheet.write_number(row, 1, *year).unwrap();
            sheet.write_string(row, 2, "7A").unwrap();
            let date = ExcelDateTime::from_ymd(2024, 3, *day).unwrap();
            sheet
                .write_datetime_with_format(row, 3, &date, &date_format)
                .unwrap();
            sheet.write_string(row, 4, "first").unwrap();
            sheet.write_string(row, 5, "second").unwrap();
        }
        let other = workbook.add_worksheet().set_name("Lookups").unwrap();
        other.write_string(0, 0, "Code").unwrap();
        other.write_string(1, 0, "X").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let source = Source::File {
            name: "detentions.xlsx".to_string(),
            bytes,
        };
        let df = DataLoader::default().load(&source).unwrap();

        assert_eq!(
            column_names(&df),
            vec!["Student", "Year", "column_3", "Issued Date", "Notes", "Notes_duplicated_1"]
        );
        assert_eq!(df.height(), 2);

        let text = |name: &str| -> Vec<Option<String>> {
            df.column(name)
                .unwrap()
                .str()
                .unwrap()
                .into_iter()
                .map(|v| v.map(str::to_string))
                .collect()
        };
        assert_eq!(text("Year"), vec![Some("7".to_string()), Some("8".to_string())]);
        assert_eq!(
            text("Issued Date"),
            vec![
                Some("2024-03-12 00:00:00".to_string()),
                Some("2024-03-13 00:00:00".to_string())
            ]
        );
        assert_eq!(text("Notes_duplicated_1")[0].as_deref(), Some("second"));
    }
}
