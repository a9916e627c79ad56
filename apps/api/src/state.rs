use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::import::events::ImportEvents;
use crate::import::pipeline::RunningImports;
use crate::import::registry::FieldRegistry;
use crate::import::store::ProspectStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// Backing store for duplicate lookups and batch inserts. Default: PgProspectStore.
    pub prospect_store: Arc<dyn ProspectStore>,
    /// Importable fields, shared by the auto-mapper and the transformer.
    pub field_registry: Arc<FieldRegistry>,
    pub import_events: ImportEvents,
    pub running_imports: RunningImports,
}
