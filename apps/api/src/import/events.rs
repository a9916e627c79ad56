use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use crate::import::batch::ImportProgress;

/// "Data changed" signal so listeners can refresh cached listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionChanged {
    pub collection: String,
    pub inserted: usize,
}

/// Progress of one running import, tagged with its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressUpdate {
    pub import_id: Uuid,
    #[serde(flatten)]
    pub progress: ImportProgress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProspectEvent {
    CollectionChanged(CollectionChanged),
    ImportProgress(ProgressUpdate),
}

impl ProspectEvent {
    /// SSE event name.
    pub fn name(&self) -> &'static str {
        match self {
            ProspectEvent::CollectionChanged(_) => "collection_changed",
            ProspectEvent::ImportProgress(_) => "import_progress",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImportEvents {
    tx: broadcast::Sender<ProspectEvent>,
}

impl ImportEvents {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProspectEvent> {
        self.tx.subscribe()
    }

    /// Publishing with nobody listening is fine.
    pub fn publish(&self, event: ProspectEvent) {
        let name = event.name();
        match self.tx.send(event) {
            Ok(receivers) => debug!("Published {name} to {receivers} listeners"),
            Err(_) => debug!("{name} published with no listeners"),
        }
    }
}

impl Default for ImportEvents {
    fn default() -> Self {
        Self::new(64)
    }
}
