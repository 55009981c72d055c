//! Read-only CSV projection of evaluation records.

use super::repository::{EvaluationStore, StoreError};

/// Stable column order for the export; consumers pivot on these headers.
pub const EXPORT_COLUMNS: [&str; 8] = [
    "id",
    "username",
    "vendor",
    "requirement",
    "score",
    "confirmed",
    "priorities",
    "notes",
];

/// File name offered in the download's Content-Disposition header.
pub const EXPORT_FILENAME: &str = "evaluations.csv";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to flush csv buffer: {0}")]
    Flush(String),
}

/// Serialize every evaluation record as one CSV row. Orphaned records whose
/// vendor or requirement has since been removed still get a row; the missing
/// reference renders as an empty cell.
pub fn write_csv<S: EvaluationStore + ?Sized>(store: &S) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_COLUMNS)?;

    for evaluation in store.evaluations()? {
        let vendor = store.vendor(evaluation.vendor)?;
        let requirement = store.requirement(evaluation.requirement)?;

        let vendor_name = vendor.map(|vendor| vendor.name).unwrap_or_default();
        let (description, priorities) = match requirement {
            Some(requirement) => {
                let priorities = requirement
                    .priorities
                    .iter()
                    .map(|label| label.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                (requirement.description, priorities)
            }
            None => (String::new(), String::new()),
        };

        writer.write_record([
            evaluation.id.to_string(),
            evaluation.username.0.clone(),
            vendor_name,
            description,
            evaluation
                .score
                .map(|score| score.to_string())
                .unwrap_or_default(),
            evaluation.confirmed.to_string(),
            priorities,
            evaluation.notes.unwrap_or_default(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|err| ExportError::Flush(err.to_string()))
}
