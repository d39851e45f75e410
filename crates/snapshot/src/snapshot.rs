//! Per-block speculative execution snapshot.
//!
//! One snapshot exists per candidate block. Concurrent workers execute the
//! block's transactions against it and commit each completed result with
//! [`Snapshot::apply_tx_sim_context`], which implements optimistic
//! concurrency control:
//!
//! - A transaction whose start sequence still matches the head of the
//!   transaction table observed the latest state; its result is appended
//!   unconditionally.
//! - A stale transaction is checked read-by-read against the write table.
//!   If anything it read was overwritten at or after its start sequence,
//!   the apply is rejected and the worker re-executes at the returned size.
//!
//! The retry protocol, not the apply order, is what makes the final tables
//! equivalent to a conflict-free sequential history: workers may race
//! freely, losers just run again. After execution drains, the snapshot is
//! sealed and [`Snapshot::build_dag`] compresses the recorded conflicts
//! into the dependency DAG shipped with the block.

use crate::config::DagMode;
use crate::dag_builder::ConflictGraphBuilder;
use crate::versioned::{StateKey, VersionedTable};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tessera_core::{BlockchainStore, ExecOrderTxType, StoreError, TxSimContext};
use tessera_types::{
    Block, BlockFingerprint, BlockHeight, ChainId, Dag, Hash, Member, Transaction, TxId,
    TxResult, TxRwSet,
};
use tracing::{debug, warn};

/// Everything mutated during transaction application, behind one lock.
struct Tables {
    /// Successfully applied transactions; index = apply sequence.
    tx_table: Vec<Arc<Transaction>>,
    /// Transactions applied out-of-band (stateful iterators); exempt from
    /// conflict checking.
    special_tx_table: Vec<Arc<Transaction>>,
    /// Read/write sets parallel to `tx_table`.
    tx_rw_set_table: Vec<Arc<TxRwSet>>,
    /// Execution results by transaction id.
    tx_result_map: HashMap<TxId, TxResult>,
    /// Last-reader/last-writer sequence tables.
    state: VersionedTable,
}

impl Tables {
    /// Append a transaction's effects at the next apply sequence.
    ///
    /// Caller holds the table lock and has already passed (or been
    /// exempted from) the conflict check.
    fn apply(&mut self, tx: Arc<Transaction>, rw_set: TxRwSet, result: TxResult) {
        let apply_seq = self.tx_table.len();
        self.state.record(&rw_set, apply_seq);
        debug!(tx_id = %tx.id, apply_seq, "applied transaction to snapshot");
        self.tx_rw_set_table.push(Arc::new(rw_set));
        self.tx_result_map.insert(tx.id.clone(), result);
        self.tx_table.push(tx);
    }
}

/// Shared, versioned view of world-state for one candidate block.
pub struct Snapshot {
    store: Arc<dyn BlockchainStore>,

    /// One-way flag: once sealed, no further ordinary applies.
    sealed: AtomicBool,

    chain_id: ChainId,
    block_height: BlockHeight,
    block_timestamp: i64,
    block_proposer: Member,
    pre_block_hash: Hash,

    /// Full and reduced fingerprints, fixed at creation so the manager can
    /// key and re-find this snapshot without re-deriving header fields.
    fingerprint: BlockFingerprint,
    pre_consensus_fingerprint: BlockFingerprint,

    dag_mode: DagMode,
    log_rw_sets: bool,

    /// Snapshot of the block this one extends. Weak: the chain is for
    /// lookup only and must never extend a parent's lifetime — eviction
    /// belongs to the manager.
    parent: Mutex<Option<Weak<Snapshot>>>,

    tables: Mutex<Tables>,
}

impl Snapshot {
    /// Create a snapshot scoped to a candidate block's metadata.
    pub fn new(
        store: Arc<dyn BlockchainStore>,
        block: &Block,
        dag_mode: DagMode,
        log_rw_sets: bool,
    ) -> Arc<Self> {
        let tx_count = block.transaction_count();
        Arc::new(Self {
            store,
            sealed: AtomicBool::new(false),
            chain_id: block.header.chain_id.clone(),
            block_height: block.header.height,
            block_timestamp: block.header.timestamp,
            block_proposer: block.header.proposer.clone(),
            pre_block_hash: block.header.pre_block_hash,
            fingerprint: BlockFingerprint::of_header(&block.header),
            pre_consensus_fingerprint: BlockFingerprint::pre_consensus(&block.header),
            dag_mode,
            log_rw_sets,
            parent: Mutex::new(None),
            tables: Mutex::new(Tables {
                tx_table: Vec::with_capacity(tx_count),
                special_tx_table: Vec::new(),
                tx_rw_set_table: Vec::with_capacity(tx_count),
                tx_result_map: HashMap::with_capacity(tx_count),
                state: VersionedTable::with_capacity(tx_count),
            }),
        })
    }

    /// Commit one completed execution into the snapshot.
    ///
    /// Returns `(applied, current_size)`. On `false` the caller re-executes
    /// the transaction at `current_size` and retries; a rejection is a
    /// retry signal, never an error. Iterator transactions land in the
    /// special table (exempt from conflict checks) unless promoted into the
    /// main table via `apply_special`.
    pub fn apply_tx_sim_context(
        &self,
        ctx: &dyn TxSimContext,
        special_tx_type: ExecOrderTxType,
        vm_succeeded: bool,
        apply_special: bool,
    ) -> (bool, usize) {
        let tx = ctx.tx();
        debug!(
            tx_id = %tx.id,
            ?special_tx_type,
            vm_succeeded,
            apply_special,
            "apply tx sim context"
        );

        // Fast rejection without the table lock; sealing is monotonic so a
        // true reading here is final for ordinary transactions.
        if !apply_special && self.is_sealed() {
            return (false, self.snapshot_size());
        }

        let mut tables = self.tables.lock().expect("snapshot tables lock poisoned");

        // Re-check under the lock: a seal may have slipped in between the
        // unlocked check and here.
        if !apply_special && self.is_sealed() {
            return (false, tables.tx_table.len());
        }

        if !apply_special && special_tx_type == ExecOrderTxType::Iterator {
            tables.special_tx_table.push(tx);
            return (
                true,
                tables.tx_table.len() + tables.special_tx_table.len(),
            );
        }

        let exec_seq = ctx.tx_exec_seq();
        let rw_set = ctx.rw_set(vm_succeeded);
        let result = ctx.result();

        // A fresh start sequence observed the very latest state: nothing
        // can have been written after it started, so no conflict check.
        // Promoted iterator transactions are exempt by definition.
        if special_tx_type == ExecOrderTxType::Iterator || exec_seq >= tables.tx_table.len() {
            tables.apply(tx, rw_set, result);
            return (true, tables.tx_table.len());
        }

        // Stale start sequence: reject if anything this transaction read
        // was overwritten at or after the point it started reading.
        for read in &rw_set.reads {
            let key = StateKey::new(&read.contract_name, &read.key);
            if let Some(write_seq) = tables.state.write_seq(&key) {
                if write_seq >= exec_seq {
                    debug!(
                        tx_id = %tx.id,
                        exec_seq,
                        write_seq,
                        "read/write conflict, apply rejected"
                    );
                    return (false, tables.tx_table.len());
                }
            }
        }

        tables.apply(tx, rw_set, result);
        (true, tables.tx_table.len())
    }

    /// Resolve the most recent value visible to a reader of this snapshot.
    ///
    /// Resolution order: this snapshot's write table, its read table, then
    /// each ancestor's tables, then the persistent store. The table lock is
    /// never held across ancestor traversal or the store read, so
    /// concurrent readers do not serialize on the chain walk. A store
    /// lookup error is surfaced verbatim; absence everywhere is `Ok(None)`.
    pub fn get_key(
        &self,
        exec_seq: usize,
        contract_name: &str,
        key: &[u8],
    ) -> Result<Option<Vec<u8>>, StoreError> {
        // The position is informational: within one snapshot the tables
        // only ever hold the latest applied value, so every reader at or
        // past that value's sequence resolves identically.
        let _ = exec_seq;

        let state_key = StateKey::new(contract_name, key);
        if let Some(value) = self.lookup_local(&state_key) {
            return Ok(Some(value));
        }

        let mut ancestor = self.parent();
        while let Some(snapshot) = ancestor {
            if let Some(value) = snapshot.lookup_local(&state_key) {
                return Ok(Some(value));
            }
            ancestor = snapshot.parent();
        }

        self.store.read_object(contract_name, key)
    }

    /// Look a key up in this snapshot's own tables only.
    fn lookup_local(&self, key: &StateKey) -> Option<Vec<u8>> {
        let tables = self.tables.lock().expect("snapshot tables lock poisoned");
        tables.state.get(key).map(<[u8]>::to_vec)
    }

    /// Seal the snapshot: no ordinary transaction may apply afterwards.
    ///
    /// Idempotent; sealing is a one-way transition.
    pub fn seal(&self) {
        self.sealed.store(true, Ordering::SeqCst);
    }

    /// Check whether the snapshot is sealed.
    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::SeqCst)
    }

    /// Build the dependency DAG over the applied transactions.
    ///
    /// Sealing first is caller discipline, not an enforced precondition: an
    /// unsealed build is logged and produced anyway, since determinism only
    /// requires every node to make the same call sequence. `linear` forces
    /// the sequential chain; evidence-mode snapshots produce it always.
    pub fn build_dag(&self, linear: bool) -> Dag {
        if !self.is_sealed() {
            warn!(
                height = %self.block_height,
                "build_dag called before seal; result may not cover in-flight applies"
            );
        }

        let tables = self.tables.lock().expect("snapshot tables lock poisoned");
        let tx_count = tables.tx_table.len();
        debug!(height = %self.block_height, tx_count, "building DAG");

        if tx_count == 0 {
            return Dag::default();
        }

        let dag = if linear || self.dag_mode == DagMode::Linear {
            Dag::linear_chain(tx_count)
        } else {
            ConflictGraphBuilder::new(&tables.tx_rw_set_table).build()
        };

        debug!(height = %self.block_height, edges = dag.edge_count(), "DAG build finished");
        dag
    }

    /// Number of transactions applied so far (the next start sequence).
    pub fn snapshot_size(&self) -> usize {
        self.tables
            .lock()
            .expect("snapshot tables lock poisoned")
            .tx_table
            .len()
    }

    /// The applied transactions in apply order.
    pub fn tx_table(&self) -> Vec<Arc<Transaction>> {
        self.tables
            .lock()
            .expect("snapshot tables lock poisoned")
            .tx_table
            .clone()
    }

    /// Transactions applied out-of-band.
    pub fn special_tx_table(&self) -> Vec<Arc<Transaction>> {
        self.tables
            .lock()
            .expect("snapshot tables lock poisoned")
            .special_tx_table
            .clone()
    }

    /// Per-transaction read/write sets, parallel to the transaction table.
    pub fn tx_rw_set_table(&self) -> Vec<Arc<TxRwSet>> {
        let tables = self.tables.lock().expect("snapshot tables lock poisoned");
        if self.log_rw_sets {
            for rw_set in &tables.tx_rw_set_table {
                debug!(
                    tx_id = %rw_set.tx_id,
                    reads = rw_set.reads.len(),
                    writes = rw_set.writes.len(),
                    "rw set"
                );
            }
        }
        tables.tx_rw_set_table.clone()
    }

    /// Execution results recorded so far, by transaction id.
    pub fn tx_result_map(&self) -> HashMap<TxId, TxResult> {
        self.tables
            .lock()
            .expect("snapshot tables lock poisoned")
            .tx_result_map
            .clone()
    }

    /// The parent snapshot, if it is still alive in the registry.
    pub fn parent(&self) -> Option<Arc<Snapshot>> {
        self.parent
            .lock()
            .expect("snapshot parent lock poisoned")
            .as_ref()
            .and_then(Weak::upgrade)
    }

    /// Link the parent snapshot (weak; ownership stays with the manager).
    pub(crate) fn set_parent(&self, parent: &Arc<Snapshot>) {
        *self.parent.lock().expect("snapshot parent lock poisoned") =
            Some(Arc::downgrade(parent));
    }

    /// Sever the parent link (its effects are durable in the store now).
    pub(crate) fn unlink_parent(&self) {
        *self.parent.lock().expect("snapshot parent lock poisoned") = None;
    }

    /// Chain this snapshot belongs to.
    pub fn chain_id(&self) -> &ChainId {
        &self.chain_id
    }

    /// Height of the candidate block.
    pub fn block_height(&self) -> BlockHeight {
        self.block_height
    }

    /// Timestamp of the candidate block.
    pub fn block_timestamp(&self) -> i64 {
        self.block_timestamp
    }

    /// Proposer of the candidate block.
    pub fn block_proposer(&self) -> &Member {
        &self.block_proposer
    }

    /// Hash of the block this candidate extends.
    pub fn pre_block_hash(&self) -> &Hash {
        &self.pre_block_hash
    }

    /// Full fingerprint of the candidate block.
    pub fn fingerprint(&self) -> BlockFingerprint {
        self.fingerprint
    }

    /// Fingerprint without consensus-specific header fields.
    pub fn pre_consensus_fingerprint(&self) -> BlockFingerprint {
        self.pre_consensus_fingerprint
    }

    /// The persistent store backing this snapshot's chain.
    pub fn store(&self) -> Arc<dyn BlockchainStore> {
        Arc::clone(&self.store)
    }
}
