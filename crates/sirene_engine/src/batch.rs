use log::info;

use sirene_core::{finalize_batch_rows, ResultRow, Siren};

use crate::{CancelFlag, FetchError, ProgressEvent, ProgressSink, SiretSource};

/// Resolve every identifier in order and aggregate the rows.
///
/// The batch stops at the first failure, dropping any partial result, so
/// a workbook is never built from a half-resolved batch. The stop flag is
/// consulted between identifiers on top of the page-level checks inside
/// the source.
pub async fn fetch_batch(
    source: &dyn SiretSource,
    sirens: &[Siren],
    cancel: &CancelFlag,
    sink: &dyn ProgressSink,
) -> Result<Vec<ResultRow>, FetchError> {
    let total = sirens.len();
    let mut rows: Vec<ResultRow> = Vec::new();

    for (index, siren) in sirens.iter().enumerate() {
        if cancel.is_stopped() {
            return Err(FetchError::Cancelled);
        }
        sink.emit(ProgressEvent::SirenStarted {
            index,
            total,
            siren: siren.to_string(),
        });

        let fetch = source
            .fetch_establishments(siren.as_str(), cancel, sink)
            .await?;
        info!("{siren}: {} establishment(s)", fetch.rows.len());
        sink.emit(ProgressEvent::SirenCompleted {
            index,
            total,
            siren: siren.to_string(),
            rows: fetch.rows.len(),
        });
        rows.extend(fetch.rows);
    }

    Ok(finalize_batch_rows(rows))
}
