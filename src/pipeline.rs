//! Load → normalize → summarize, start to finish for one source.

use crate::config::DashboardConfig;
use crate::data::{normalize, DataLoader, DatasetKind, LoaderError, Source};
use crate::stats::{Summary, SummaryCalculator};
use tracing::{info, warn};

/// Run the whole pipeline for one dataset. Nothing is cached between calls.
pub fn load_and_summarize(
    source: &Source,
    kind: DatasetKind,
    config: &DashboardConfig,
) -> Result<Summary, LoaderError> {
    let raw = DataLoader::from_config(config).load(source)?;
    let table = normalize(raw, kind, config.date_order);

    for issue in &table.issues {
        warn!(kind = kind.label(), %issue, "data issue");
    }

    let summary = SummaryCalculator::summarize(&table);
    info!(
        kind = kind.label(),
        source = source.label(),
        total = summary.total(),
        "summary ready"
    );
    Ok(summary)
}
