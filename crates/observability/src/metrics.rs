//! Actor lifecycle metrics
//!
//! Counters for spawned, failed and destroyed actors, plus an in-memory
//! aggregator used for the end-of-run summary.

use contracts::ActorKind;
use metrics::{counter, gauge};

/// Record a successful spawn
pub fn record_actor_spawned(kind: ActorKind) {
    counter!("carla_rig_actors_spawned_total", "kind" => kind.as_str()).increment(1);
}

/// Record a spawn the simulator rejected (or whose blueprint was missing)
pub fn record_spawn_failure(kind: ActorKind) {
    counter!("carla_rig_spawn_failures_total", "kind" => kind.as_str()).increment(1);
}

/// Record a destroy call outcome
pub fn record_actor_destroyed(success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!("carla_rig_actors_destroyed_total", "status" => status).increment(1);
}

/// Number of actors currently held by the provisioner
pub fn record_tracked_actors(count: usize) {
    gauge!("carla_rig_tracked_actors").set(count as f64);
}

/// In-memory lifecycle counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LifecycleStats {
    pub spawned: u64,
    pub spawn_failures: u64,
    pub destroyed: u64,
    pub destroy_failures: u64,
}

impl LifecycleStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_spawned(&mut self, kind: ActorKind) {
        self.spawned += 1;
        record_actor_spawned(kind);
    }

    pub fn on_spawn_failure(&mut self, kind: ActorKind) {
        self.spawn_failures += 1;
        record_spawn_failure(kind);
    }

    pub fn on_destroyed(&mut self, success: bool) {
        if success {
            self.destroyed += 1;
        } else {
            self.destroy_failures += 1;
        }
        record_actor_destroyed(success);
    }

    /// Actors spawned but not yet released
    pub fn outstanding(&self) -> u64 {
        self.spawned
            .saturating_sub(self.destroyed + self.destroy_failures)
    }
}

impl std::fmt::Display for LifecycleStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "spawned={}, spawn_failures={}, destroyed={}, destroy_failures={}",
            self.spawned, self.spawn_failures, self.destroyed, self.destroy_failures
        )
    }
}
