//! Snapshot manager configuration.

use serde::{Deserialize, Serialize};

/// Default number of blocks an abandoned ancestor may lag behind the
/// committed height before it is garbage-collected.
pub const DEFAULT_GC_DEPTH: u64 = 8;

/// Shape of the DAG a snapshot produces at [`build_dag`] time.
///
/// [`build_dag`]: crate::Snapshot::build_dag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DagMode {
    /// Minimal direct-dependency graph: validators replay with the
    /// proposer's parallelism.
    #[default]
    Parallel,

    /// Strictly-sequential chain (`tx[i]` depends on `tx[i-1]`), for
    /// deployments that require auditable sequential evidence.
    Linear,
}

/// Configuration for a [`SnapshotManager`].
///
/// [`SnapshotManager`]: crate::SnapshotManager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Ancestors more than this many blocks behind a committed height are
    /// severed and evicted even without a matching commit (fork
    /// abandonment).
    pub gc_depth: u64,

    /// DAG construction strategy for every snapshot this manager creates.
    pub dag_mode: DagMode,

    /// Dump each snapshot's read/write sets at debug level when the table
    /// is fetched. Verbose; off by default.
    pub log_rw_sets: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            gc_depth: DEFAULT_GC_DEPTH,
            dag_mode: DagMode::Parallel,
            log_rw_sets: false,
        }
    }
}
