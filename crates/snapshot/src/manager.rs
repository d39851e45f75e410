//! Registry and lifecycle for live snapshots.
//!
//! One manager exists per chain, owned by the block-execution pipeline (no
//! process-wide state: a multi-chain host just owns several managers).
//! Snapshots are keyed by block fingerprint so that the commit notification
//! for a block can find the exact snapshot its proposal created. The
//! manager holds the only strong references; parent links between
//! snapshots are weak, which keeps eviction entirely in the manager's
//! hands.

use crate::config::{DagMode, ManagerConfig};
use crate::snapshot::Snapshot;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tessera_core::BlockchainStore;
use tessera_types::{Block, BlockFingerprint};
use tracing::{debug, info};

/// Keyed registry of live snapshots for one chain.
///
/// The registry lock is disjoint from every snapshot's table lock:
/// creating or committing snapshots never contends with in-flight
/// transaction application on another block.
pub struct SnapshotManager {
    store: Arc<dyn BlockchainStore>,
    config: ManagerConfig,
    snapshots: Mutex<HashMap<BlockFingerprint, Arc<Snapshot>>>,
}

impl SnapshotManager {
    /// Create a manager with the default configuration (parallel DAGs).
    pub fn new(store: Arc<dyn BlockchainStore>) -> Self {
        Self::with_config(store, ManagerConfig::default())
    }

    /// Create a manager for evidence deployments: identical apply/conflict
    /// semantics, but every snapshot builds the strictly-sequential DAG.
    pub fn evidence(store: Arc<dyn BlockchainStore>) -> Self {
        Self::with_config(
            store,
            ManagerConfig {
                dag_mode: DagMode::Linear,
                ..ManagerConfig::default()
            },
        )
    }

    /// Create a manager with an explicit configuration.
    pub fn with_config(store: Arc<dyn BlockchainStore>, config: ManagerConfig) -> Self {
        Self {
            store,
            config,
            snapshots: Mutex::new(HashMap::new()),
        }
    }

    /// Create and register the snapshot for a newly proposed block.
    ///
    /// If the previous block's snapshot is live, the new one links to it as
    /// parent; several concurrently proposed children of one parent
    /// (competing forks) each get an independent snapshot sharing the
    /// ancestor chain.
    pub fn new_snapshot(&self, prev_block: &Block, block: &Block) -> Arc<Snapshot> {
        let mut snapshots = self.snapshots.lock().expect("registry lock poisoned");

        let snapshot = Snapshot::new(
            Arc::clone(&self.store),
            block,
            self.config.dag_mode,
            self.config.log_rw_sets,
        );

        let fingerprint = snapshot.fingerprint();
        let prev_fingerprint = BlockFingerprint::of_block(prev_block);

        if let Some(parent) = snapshots.get(&prev_fingerprint) {
            snapshot.set_parent(parent);
        }
        snapshots.insert(fingerprint, Arc::clone(&snapshot));

        info!(
            height = %block.height(),
            %fingerprint,
            %prev_fingerprint,
            "created snapshot"
        );
        snapshot
    }

    /// Release the snapshot of a committed block.
    ///
    /// Children of the committed snapshot are unlinked (the parent's
    /// effects are durable in the store now), the snapshot itself is
    /// evicted, and ancestors left more than `gc_depth` blocks behind the
    /// committed height by an abandoned fork are severed and evicted too.
    pub fn notify_block_committed(&self, block: &Block) {
        let mut snapshots = self.snapshots.lock().expect("registry lock poisoned");
        let committed_height = block.height();

        // The registry is keyed by the full fingerprint. A fork that
        // diverged only in consensus-specific header fields still has to
        // find its snapshot, hence the pre-consensus fallback.
        let mut fingerprint = BlockFingerprint::of_block(block);
        if !snapshots.contains_key(&fingerprint) {
            let reduced = BlockFingerprint::pre_consensus(&block.header);
            if let Some(found) = snapshots
                .iter()
                .find(|(_, snapshot)| snapshot.pre_consensus_fingerprint() == reduced)
                .map(|(fp, _)| *fp)
            {
                debug!(
                    height = %committed_height,
                    "committed block matched by pre-consensus fingerprint"
                );
                fingerprint = found;
            }
        }

        for snapshot in snapshots.values() {
            if let Some(parent) = snapshot.parent() {
                if parent.fingerprint() == fingerprint {
                    snapshot.unlink_parent();
                }
            }
        }

        info!(height = %committed_height, %fingerprint, "evicting committed snapshot");
        snapshots.remove(&fingerprint);

        // Fork abandonment: a losing fork never gets a commit, so its
        // ancestors would otherwise pin registry entries forever.
        let mut stale = Vec::new();
        for snapshot in snapshots.values() {
            if let Some(parent) = snapshot.parent() {
                if committed_height.distance_from(parent.block_height()) > self.config.gc_depth {
                    stale.push(parent.fingerprint());
                    snapshot.unlink_parent();
                }
            }
        }
        for old_fingerprint in stale {
            if snapshots.remove(&old_fingerprint).is_some() {
                info!(%old_fingerprint, "garbage-collected abandoned ancestor snapshot");
            }
        }
    }

    /// Look up a live snapshot by fingerprint.
    pub fn get(&self, fingerprint: &BlockFingerprint) -> Option<Arc<Snapshot>> {
        self.snapshots
            .lock()
            .expect("registry lock poisoned")
            .get(fingerprint)
            .cloned()
    }

    /// Number of live snapshots.
    pub fn len(&self) -> usize {
        self.snapshots.lock().expect("registry lock poisoned").len()
    }

    /// Check whether no snapshots are live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The manager's configuration.
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }
}
