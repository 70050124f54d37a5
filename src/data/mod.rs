//! Data module - table loading and normalization

pub mod dates;
mod loader;
mod normalizer;

pub use loader::{
    column_names, read_excel, rewrite_google_sheets_url, unique_headers, DataLoader, FileFormat,
    LoaderError, Source,
};
pub use normalizer::{
    columns, find_attendance_column, normalize, reports_missing, trimmed_names, DatasetKind,
    Issue, NormalizedTable,
};
