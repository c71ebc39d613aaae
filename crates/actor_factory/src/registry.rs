//! Actor registry
//!
//! Owns the handles of every actor created during provisioning. A handle is
//! registered right after its spawn succeeds and leaves the registry only
//! through `ActorFactory::teardown`, which consumes it.

use contracts::{ActorId, ActorKind, ActorRecord};
use tracing::warn;

/// Handles of the actors created so far, in creation order
#[derive(Debug, Default)]
pub struct ActorRegistry {
    records: Vec<ActorRecord>,
}

impl ActorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a freshly spawned actor
    pub fn register(&mut self, record: ActorRecord) {
        observability::record_tracked_actors(self.records.len() + 1);
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in creation order
    pub fn records(&self) -> &[ActorRecord] {
        &self.records
    }

    pub fn actor_ids(&self) -> Vec<ActorId> {
        self.records.iter().map(|r| r.actor_id).collect()
    }

    /// The vehicle every sensor attaches to
    pub fn vehicle(&self) -> Option<&ActorRecord> {
        self.records.iter().find(|r| r.kind == ActorKind::Vehicle)
    }

    /// Empty the registry, newest first
    pub(crate) fn drain_newest_first(&mut self) -> Vec<ActorRecord> {
        let mut records = std::mem::take(&mut self.records);
        records.reverse();
        observability::record_tracked_actors(0);
        records
    }
}

impl Drop for ActorRegistry {
    fn drop(&mut self) {
        if !self.records.is_empty() {
            warn!(
                leaked = self.records.len(),
                actor_ids = ?self.actor_ids(),
                "actor registry dropped without teardown; actors remain in the simulator"
            );
        }
    }
}
