//! Import orchestration: transform → duplicate check → batched insert → notify.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::import::batch::{import_batches, CancelFlag, ImportOptions, ImportOutcome, ImportResult};
use crate::import::csv_parser::CsvRow;
use crate::import::dedup::check_duplicates;
use crate::import::events::{CollectionChanged, ImportEvents, ProgressUpdate, ProspectEvent};
use crate::import::mapper::FieldMapping;
use crate::import::registry::FieldRegistry;
use crate::import::store::ProspectStore;
use crate::import::transform::transform;
use crate::models::prospect::ProspectRecord;

pub const PROSPECTS_COLLECTION: &str = "prospects";

/// Parsed rows plus the mapping the user settled on.
#[derive(Debug, Clone, Deserialize)]
pub struct MappedUpload {
    pub headers: Vec<String>,
    pub rows: Vec<CsvRow>,
    #[serde(default)]
    pub mapping: FieldMapping,
    pub actor_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    #[serde(flatten)]
    pub upload: MappedUpload,
    #[serde(default = "default_skip_duplicates")]
    pub skip_duplicates: bool,
    /// Client-chosen id; lets the run be cancelled while it is in flight.
    pub import_id: Option<Uuid>,
}

fn default_skip_duplicates() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub import_id: Uuid,
    pub outcome: ImportOutcome,
    pub total: usize,
    pub duplicates: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(flatten)]
    pub result: ImportResult,
}

/// Validates the upload and turns its rows into prospect records.
pub fn prepare_records(
    upload: &MappedUpload,
    registry: &FieldRegistry,
) -> Result<Vec<ProspectRecord>, AppError> {
    let actor_id = upload.actor_id.ok_or(AppError::MissingActor)?;

    upload.mapping.validate(&upload.headers)?;

    let missing: Vec<&str> = registry
        .missing_required(&upload.mapping)
        .into_iter()
        .map(|d| d.label.as_str())
        .collect();
    if !missing.is_empty() {
        return Err(AppError::Validation(format!(
            "Required fields are not mapped: {}",
            missing.join(", ")
        )));
    }

    Ok(transform(&upload.rows, &upload.mapping, actor_id))
}

/// Collaborators an import run needs.
pub struct ImportContext<'a> {
    pub store: &'a dyn ProspectStore,
    pub registry: &'a FieldRegistry,
    pub events: &'a ImportEvents,
    pub running: &'a RunningImports,
    pub batch_size: usize,
}

pub async fn run_import(
    ctx: ImportContext<'_>,
    request: ImportRequest,
) -> Result<ImportResponse, AppError> {
    if request.upload.mapping.mapped_count() == 0 {
        return Err(AppError::Validation(
            "Map at least one column before importing".to_string(),
        ));
    }

    let records = prepare_records(&request.upload, ctx.registry)?;
    if records.is_empty() {
        return Err(AppError::Validation("Empty file".to_string()));
    }

    // Registered before the duplicate lookup; a cancel sent during it must find the run.
    let import_id = request.import_id.unwrap_or_else(Uuid::new_v4);
    let guard = ctx.running.register(import_id)?;
    let started_at = Utc::now();

    let duplicates = check_duplicates(ctx.store, &records).await?;
    if guard.cancel_flag().is_cancelled() {
        info!("Import {import_id} cancelled during duplicate check");
    }

    info!(
        "Import {import_id}: {} rows, {} duplicates, skip_duplicates={}",
        records.len(),
        duplicates.len(),
        request.skip_duplicates
    );

    let result = import_batches(
        ctx.store,
        &records,
        &duplicates,
        ImportOptions {
            skip_duplicates: request.skip_duplicates,
            batch_size: ctx.batch_size,
        },
        guard.cancel_flag(),
        |progress| {
            debug!(
                "Import {import_id}: batch {}/{} ({}%)",
                progress.batch, progress.total_batches, progress.percent
            );
            ctx.events
                .publish(ProspectEvent::ImportProgress(ProgressUpdate { import_id, progress }));
        },
    )
    .await;
    drop(guard);

    if result.success > 0 {
        ctx.events.publish(ProspectEvent::CollectionChanged(CollectionChanged {
            collection: PROSPECTS_COLLECTION.to_string(),
            inserted: result.success,
        }));
    }

    Ok(ImportResponse {
        import_id,
        outcome: result.outcome(),
        total: records.len(),
        duplicates: duplicates.len(),
        started_at,
        finished_at: Utc::now(),
        result,
    })
}

/// Imports currently in flight, keyed by import id.
#[derive(Debug, Clone, Default)]
pub struct RunningImports(Arc<Mutex<HashMap<Uuid, CancelFlag>>>);

impl RunningImports {
    pub fn register(&self, import_id: Uuid) -> Result<RunningImport, AppError> {
        let mut running = self
            .0
            .lock()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("running imports lock poisoned")))?;
        if running.contains_key(&import_id) {
            return Err(AppError::Conflict(format!(
                "Import {import_id} is already running"
            )));
        }

        let flag = CancelFlag::new();
        running.insert(import_id, flag.clone());
        Ok(RunningImport {
            imports: self.clone(),
            import_id,
            flag,
        })
    }

    /// Returns false when no import with this id is running.
    pub fn cancel(&self, import_id: Uuid) -> bool {
        match self.0.lock() {
            Ok(running) => running.get(&import_id).map(CancelFlag::cancel).is_some(),
            Err(_) => false,
        }
    }

    pub fn is_running(&self, import_id: Uuid) -> bool {
        self.0
            .lock()
            .map(|running| running.contains_key(&import_id))
            .unwrap_or(false)
    }
}

/// Registration of one run; removed from `RunningImports` on drop.
pub struct RunningImport {
    imports: RunningImports,
    import_id: Uuid,
    flag: CancelFlag,
}

impl RunningImport {
    pub fn cancel_flag(&self) -> &CancelFlag {
        &self.flag
    }
}

impl Drop for RunningImport {
    fn drop(&mut self) {
        if let Ok(mut running) = self.imports.0.lock() {
            running.remove(&self.import_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::import::csv_parser::parse_csv;
    use crate::import::mapper::auto_map;
    use crate::import::store::memory::MemoryStore;
    use crate::import::store::ExistingContact;

    fn upload(csv: &str, actor_id: Option<Uuid>) -> MappedUpload {
        let parsed = parse_csv(csv);
        let mapping = auto_map(&parsed.headers, &FieldRegistry::prospects());
        MappedUpload {
            headers: parsed.headers,
            rows: parsed.rows,
            mapping,
            actor_id,
        }
    }

    fn request(csv: &str) -> ImportRequest {
        ImportRequest {
            upload: upload(csv, Some(Uuid::new_v4())),
            skip_duplicates: true,
            import_id: None,
        }
    }

    struct Fixture {
        store: MemoryStore,
        registry: FieldRegistry,
        events: ImportEvents,
        running: RunningImports,
    }

    impl Fixture {
        fn new(store: MemoryStore) -> Self {
            Self {
                store,
                registry: FieldRegistry::prospects(),
                events: ImportEvents::default(),
                running: RunningImports::default(),
            }
        }

        fn ctx(&self) -> ImportContext<'_> {
            ImportContext {
                store: &self.store,
                registry: &self.registry,
                events: &self.events,
                running: &self.running,
                batch_size: 50,
            }
        }
    }

    const CSV: &str = "Company,Website,Email,Tags\n\
                       Acme,ACME.com,jane@acme.com,\"vip, fintech\"\n\
                       Globex,globex.com,hank@globex.com,\n\
                       Initech,initech.com,bill@initech.com,";

    #[tokio::test]
    async fn test_run_import_skips_duplicates_and_notifies() {
        let fixture = Fixture::new(MemoryStore::with_existing(vec![ExistingContact {
            company_domain: Some("acme.com".to_string()),
            contact_email: None,
        }]));
        let mut rx = fixture.events.subscribe();

        let response = run_import(fixture.ctx(), request(CSV)).await.unwrap();

        assert_eq!(response.total, 3);
        assert_eq!(response.duplicates, 1);
        assert_eq!(response.result.success, 2);
        assert_eq!(response.result.skipped, 1);
        assert_eq!(response.outcome, ImportOutcome::Complete);
        assert!(!fixture.running.is_running(response.import_id));
        assert!(response.started_at <= response.finished_at);

        let mut percents = Vec::new();
        let mut changes = Vec::new();
        while let Ok(event) = rx.try_recv() {
            match event {
                ProspectEvent::ImportProgress(update) => {
                    assert_eq!(update.import_id, response.import_id);
                    percents.push(update.progress.percent);
                }
                ProspectEvent::CollectionChanged(change) => changes.push(change),
            }
        }
        assert_eq!(percents, vec![0, 100]);
        assert_eq!(
            changes,
            vec![CollectionChanged {
                collection: PROSPECTS_COLLECTION.to_string(),
                inserted: 2,
            }]
        );
    }

    #[tokio::test]
    async fn test_missing_actor_rejected_before_any_store_call() {
        let fixture = Fixture::new(MemoryStore::default());
        let mut req = request(CSV);
        req.upload.actor_id = None;

        let err = run_import(fixture.ctx(), req).await.unwrap_err();
        assert!(matches!(err, AppError::MissingActor));
        assert_eq!(fixture.store.lookup_count(), 0);
        assert!(fixture.store.batch_sizes().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_check_failure_aborts_import() {
        let fixture = Fixture::new(MemoryStore {
            fail_lookup: true,
            ..Default::default()
        });

        let err = run_import(fixture.ctx(), request(CSV)).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateCheck(_)));
        assert!(fixture.store.batch_sizes().is_empty());
    }

    #[tokio::test]
    async fn test_zero_mapped_fields_rejected() {
        let fixture = Fixture::new(MemoryStore::default());
        let mut req = request(CSV);
        req.upload.mapping = FieldMapping::default();

        let err = run_import(fixture.ctx(), req).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_all_duplicates_sends_no_event() {
        let fixture = Fixture::new(MemoryStore::with_existing(vec![ExistingContact {
            company_domain: None,
            contact_email: Some("JANE@acme.com".to_string()),
        }]));
        let mut rx = fixture.events.subscribe();

        let csv = "Company,Email\nAcme,jane@acme.com";
        let response = run_import(fixture.ctx(), request(csv)).await.unwrap();

        assert_eq!(response.result.errors, vec!["All rows are duplicates"]);
        assert_eq!(response.outcome, ImportOutcome::NothingImported);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_progress_starts_at_zero_and_rises_to_full() {
        let fixture = Fixture::new(MemoryStore::default());
        let mut rx = fixture.events.subscribe();

        let rows: String = (0..120).map(|i| format!("\nCompany {i}")).collect();
        let csv = format!("Company{rows}");
        let response = run_import(fixture.ctx(), request(&csv)).await.unwrap();
        assert_eq!(response.result.success, 120);

        let mut percents = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let ProspectEvent::ImportProgress(update) = event {
                percents.push(update.progress.percent);
            }
        }
        assert_eq!(percents, vec![0, 42, 83, 100]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_slow_duplicate_check_is_honoured() {
        let fixture = Fixture::new(MemoryStore {
            lookup_delay: Some(Duration::from_millis(200)),
            ..Default::default()
        });
        let import_id = Uuid::new_v4();
        let mut req = request(CSV);
        req.import_id = Some(import_id);

        let (response, accepted) = tokio::join!(run_import(fixture.ctx(), req), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            fixture.running.cancel(import_id)
        });
        let response = response.unwrap();

        assert!(accepted);
        assert!(response.result.cancelled);
        assert_eq!(response.outcome, ImportOutcome::Cancelled);
        assert_eq!(response.result.success, 0);
        assert_eq!(response.result.not_attempted, 3);
        assert!(fixture.store.batch_sizes().is_empty());
        assert!(!fixture.running.is_running(import_id));
    }

    #[tokio::test]
    async fn test_duplicate_check_failure_releases_import_id() {
        let fixture = Fixture::new(MemoryStore {
            fail_lookup: true,
            ..Default::default()
        });
        let import_id = Uuid::new_v4();
        let mut req = request(CSV);
        req.import_id = Some(import_id);

        assert!(run_import(fixture.ctx(), req).await.is_err());
        assert!(!fixture.running.is_running(import_id));
    }

    #[test]
    fn test_prepare_records_rejects_unknown_column() {
        let mut up = upload(CSV, Some(Uuid::nil()));
        up.mapping
            .set(crate::import::registry::ProspectField::Notes, "Comments");
        assert!(matches!(
            prepare_records(&up, &FieldRegistry::prospects()),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_running_imports_register_and_cancel() {
        let running = RunningImports::default();
        let id = Uuid::new_v4();

        let guard = running.register(id).unwrap();
        assert!(matches!(running.register(id), Err(AppError::Conflict(_))));
        assert!(running.cancel(id));
        assert!(guard.cancel_flag().is_cancelled());

        drop(guard);
        assert!(!running.is_running(id));
        assert!(!running.cancel(id));
    }
}
