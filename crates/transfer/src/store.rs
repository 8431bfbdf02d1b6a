//! The record store: single-writer map of transfer id → record, fed by the
//! driver's push stream.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use cumulus_protocol::{TransferKind, TransferUpdate};

use crate::reconcile::reconcile;
use crate::summary::{TransferSummary, summarize};
use crate::types::{ReconcilePolicy, TransferRecord};

/// Holds every transfer record observed this session.
///
/// Entries are `Arc`-wrapped and replaced wholesale on each event, so a
/// reader holding a snapshot never observes a partially-mutated record and
/// unrelated entries keep their identity across updates. Records are never
/// deleted here; pruning finished rows is a display concern.
pub struct TransferStore {
    policy: ReconcilePolicy,
    records: RwLock<HashMap<String, Arc<TransferRecord>>>,
}

impl TransferStore {
    pub fn new(policy: ReconcilePolicy) -> Self {
        Self {
            policy,
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Folds one event into the map.
    ///
    /// Returns the new record state, or `None` for a malformed update
    /// (missing id) — those are logged and dropped, since they cannot be
    /// attributed to any visible task.
    pub fn apply(&self, update: &TransferUpdate) -> Option<Arc<TransferRecord>> {
        if update.id.is_empty() {
            warn!("dropping transfer update without id");
            return None;
        }
        let mut records = self.records.write().unwrap();
        let next = Arc::new(reconcile(
            records.get(&update.id).map(Arc::as_ref),
            update,
            &self.policy,
        ));
        records.insert(update.id.clone(), Arc::clone(&next));
        Some(next)
    }

    /// Replays a session-start history snapshot. Returns the number of
    /// events applied.
    pub fn seed(&self, history: &[TransferUpdate]) -> usize {
        let applied = history
            .iter()
            .filter(|update| self.apply(update).is_some())
            .count();
        debug!(events = applied, "seeded transfer history");
        applied
    }

    pub fn get(&self, id: &str) -> Option<Arc<TransferRecord>> {
        self.records.read().unwrap().get(id).cloned()
    }

    /// Snapshot of all records (cheap: clones `Arc`s, not records).
    pub fn snapshot(&self) -> Vec<Arc<TransferRecord>> {
        self.records.read().unwrap().values().cloned().collect()
    }

    /// Groups child records under their parent id in one pass, for batch
    /// rendering. Children whose parent is unknown are simply absent from
    /// the result and render as standalone rows.
    pub fn children_by_parent(&self) -> HashMap<String, Vec<Arc<TransferRecord>>> {
        let records = self.records.read().unwrap();
        let mut by_parent: HashMap<String, Vec<Arc<TransferRecord>>> = HashMap::new();
        for record in records.values() {
            if let Some(parent) = &record.parent_id
                && records.contains_key(parent)
            {
                by_parent.entry(parent.clone()).or_default().push(Arc::clone(record));
            }
        }
        for children in by_parent.values_mut() {
            children.sort_by(|a, b| a.id.cmp(&b.id));
        }
        by_parent
    }

    /// Live rollup for one transfer direction.
    pub fn summary(&self, kind: TransferKind) -> TransferSummary {
        let records = self.records.read().unwrap();
        summarize(records.values().map(Arc::as_ref), kind)
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().unwrap().is_empty()
    }
}

/// Consumes the driver's push stream into the store, one event at a time,
/// until the stream closes or `cancel` fires.
pub async fn run_pump(
    store: Arc<TransferStore>,
    mut events: mpsc::Receiver<TransferUpdate>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("transfer pump cancelled");
                break;
            }
            update = events.recv() => {
                match update {
                    Some(update) => {
                        store.apply(&update);
                    }
                    None => {
                        debug!("transfer event stream ended");
                        break;
                    }
                }
            }
        }
    }
}
