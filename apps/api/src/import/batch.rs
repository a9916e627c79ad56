//! Batched, partial-failure-tolerant prospect insert.
//!
//! Batches go to the store one at a time in row order. A failed batch is
//! recorded and the loop moves on; earlier successes are never rolled back.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::import::dedup::DuplicateSet;
use crate::import::store::ProspectStore;
use crate::models::prospect::ProspectRecord;

pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Cooperative cancellation, checked before each batch.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ImportOptions {
    pub skip_duplicates: bool,
    pub batch_size: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            skip_duplicates: true,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Reported once at 0% before the first batch, then after every attempted batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportProgress {
    pub batch: usize,
    pub total_batches: usize,
    pub processed: usize,
    pub percent: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportOutcome {
    /// Every working-set row was inserted.
    Complete,
    /// Some batches failed, some succeeded.
    Partial,
    /// Rows were attempted and none were inserted.
    Failed,
    Cancelled,
    /// Nothing was attempted (empty input or everything skipped).
    NothingImported,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportResult {
    pub success: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Working-set rows never sent because the run was cancelled.
    pub not_attempted: usize,
    pub cancelled: bool,
    /// One entry per failed batch, not per row.
    pub errors: Vec<String>,
}

impl ImportResult {
    fn short_circuit(skipped: usize, message: &str) -> Self {
        Self {
            skipped,
            errors: vec![message.to_string()],
            ..Default::default()
        }
    }

    pub fn outcome(&self) -> ImportOutcome {
        if self.cancelled {
            ImportOutcome::Cancelled
        } else if self.success == 0 && self.failed == 0 {
            ImportOutcome::NothingImported
        } else if self.success == 0 {
            ImportOutcome::Failed
        } else if self.failed > 0 {
            ImportOutcome::Partial
        } else {
            ImportOutcome::Complete
        }
    }
}

/// Records that will actually be sent, in original order.
pub fn working_set<'a>(
    records: &'a [ProspectRecord],
    duplicates: &DuplicateSet,
    skip_duplicates: bool,
) -> Vec<&'a ProspectRecord> {
    records
        .iter()
        .enumerate()
        .filter(|(i, _)| !skip_duplicates || !duplicates.contains(i))
        .map(|(_, r)| r)
        .collect()
}

pub async fn import_batches<F>(
    store: &dyn ProspectStore,
    records: &[ProspectRecord],
    duplicates: &DuplicateSet,
    options: ImportOptions,
    cancel: &CancelFlag,
    mut on_progress: F,
) -> ImportResult
where
    F: FnMut(ImportProgress) + Send,
{
    if records.is_empty() {
        return ImportResult::short_circuit(0, "No rows to import");
    }

    let working = working_set(records, duplicates, options.skip_duplicates);
    let skipped = records.len() - working.len();

    if working.is_empty() {
        return ImportResult::short_circuit(skipped, "All rows are duplicates");
    }

    let batch_size = options.batch_size.max(1);
    let total_batches = working.len().div_ceil(batch_size);
    let mut result = ImportResult {
        skipped,
        ..Default::default()
    };
    let mut processed = 0;
    on_progress(ImportProgress {
        batch: 0,
        total_batches,
        processed,
        percent: 0,
    });

    info!(
        "Importing {} prospects in {} batches ({} skipped)",
        working.len(),
        total_batches,
        skipped
    );

    for (i, chunk) in working.chunks(batch_size).enumerate() {
        let ordinal = i + 1;

        if cancel.is_cancelled() {
            result.cancelled = true;
            result.not_attempted = working.len() - processed;
            result
                .errors
                .push(format!("Import cancelled after batch {}", ordinal - 1));
            warn!(
                "Import cancelled before batch {ordinal}/{total_batches}; {} rows not attempted",
                result.not_attempted
            );
            break;
        }

        let batch: Vec<ProspectRecord> = chunk.iter().map(|r| (*r).clone()).collect();
        match store.insert_batch(&batch).await {
            Ok(_) => result.success += batch.len(),
            Err(e) => {
                warn!("Batch {ordinal}/{total_batches} failed: {e}");
                result.failed += batch.len();
                result.errors.push(format!("Batch {ordinal}: {e}"));
            }
        }

        processed += batch.len();
        on_progress(ImportProgress {
            batch: ordinal,
            total_batches,
            processed,
            percent: percent(processed, working.len()),
        });
    }

    info!(
        "Import finished: {} inserted, {} failed, {} skipped",
        result.success, result.failed, result.skipped
    );
    result
}

fn percent(done: usize, total: usize) -> u8 {
    ((done as f64 / total as f64) * 100.0).round() as u8
}
