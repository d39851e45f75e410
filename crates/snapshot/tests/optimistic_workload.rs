//! End-to-end exercises of the optimistic apply/retry protocol, DAG
//! replay determinism, and snapshot lifecycle across blocks.

use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use tessera_core::testing::{MemStore, MockSimContext};
use tessera_core::{BlockchainStore, ExecOrderTxType};
use tessera_snapshot::{DagMode, Snapshot, SnapshotManager};
use tessera_types::{
    Block, BlockHeader, BlockHeight, ChainId, Dag, Hash, Member, Transaction, TxResult, TxRwSet,
};

fn block_at(height: u64, pre_hash: &[u8]) -> Block {
    Block::new(
        BlockHeader {
            chain_id: ChainId::from("chain1"),
            height: BlockHeight(height),
            pre_block_hash: Hash::from_bytes(pre_hash),
            proposer: Member::new("org1", b"node1".to_vec()),
            timestamp: 1_700_000_000_000 + height as i64,
            consensus_args: vec![],
        },
        vec![],
    )
}

fn counter_value(bytes: Option<Vec<u8>>) -> u64 {
    bytes
        .map(|b| u64::from_le_bytes(b.try_into().expect("counter is 8 bytes")))
        .unwrap_or(0)
}

/// Replay the recorded write sets in an order consistent with the DAG but
/// different from apply order, and return the final per-key state.
fn replay_in_topological_order(
    dag: &Dag,
    rw_sets: &[Arc<TxRwSet>],
) -> HashMap<(String, Vec<u8>), Vec<u8>> {
    let tx_count = dag.tx_count();
    let mut pending_preds: Vec<usize> = dag
        .vertices
        .iter()
        .map(|v| v.neighbors.len())
        .collect();
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); tx_count];
    for (i, vertex) in dag.vertices.iter().enumerate() {
        for &j in &vertex.neighbors {
            successors[j as usize].push(i);
        }
    }

    // Kahn's algorithm, always picking the highest ready index so the
    // replay order diverges from apply order wherever the DAG allows it.
    let mut ready: Vec<usize> = (0..tx_count).filter(|&i| pending_preds[i] == 0).collect();
    let mut state: HashMap<(String, Vec<u8>), Vec<u8>> = HashMap::new();
    let mut replayed = 0;
    while let Some(pos) = ready.iter().enumerate().max_by_key(|(_, &i)| i).map(|(p, _)| p) {
        let i = ready.swap_remove(pos);
        replayed += 1;
        for write in &rw_sets[i].writes {
            state.insert(
                (write.contract_name.clone(), write.key.clone()),
                write.value.clone(),
            );
        }
        for &succ in &successors[i] {
            pending_preds[succ] -= 1;
            if pending_preds[succ] == 0 {
                ready.push(succ);
            }
        }
    }
    assert_eq!(replayed, tx_count, "DAG must be acyclic and complete");
    state
}

/// Final per-key state implied by the apply order itself.
fn final_state_in_apply_order(rw_sets: &[Arc<TxRwSet>]) -> HashMap<(String, Vec<u8>), Vec<u8>> {
    let mut state = HashMap::new();
    for rw_set in rw_sets {
        for write in &rw_set.writes {
            state.insert(
                (write.contract_name.clone(), write.key.clone()),
                write.value.clone(),
            );
        }
    }
    state
}

#[test]
fn test_concurrent_workers_converge_without_lost_updates() {
    const WORKERS: usize = 8;
    const TXS_PER_WORKER: usize = 25;
    const COUNTERS: usize = 4;

    let store = Arc::new(MemStore::new());
    let snapshot = Snapshot::new(
        Arc::clone(&store) as Arc<dyn BlockchainStore>,
        &block_at(1, b"genesis"),
        DagMode::Parallel,
        false,
    );

    let mut handles = Vec::new();
    for worker in 0..WORKERS {
        let snapshot = Arc::clone(&snapshot);
        handles.push(thread::spawn(move || {
            let mut rng = rand::thread_rng();
            for n in 0..TXS_PER_WORKER {
                let counter: usize = rng.gen_range(0..COUNTERS);
                let key = format!("counter{counter}").into_bytes();
                let tx_id = format!("w{worker}-tx{n}");
                let tx = Transaction::new(tx_id.as_str(), b"increment".to_vec());

                // Optimistic loop: execute at the observed sequence, apply,
                // re-execute on rejection.
                loop {
                    let start_seq = snapshot.snapshot_size();
                    let observed = snapshot
                        .get_key(start_seq, "bank", &key)
                        .expect("mem store never fails here");
                    let value = counter_value(observed.clone());
                    let rw_set = TxRwSet::new(tx_id.as_str())
                        .with_read("bank", key.clone(), observed.unwrap_or_default())
                        .with_write("bank", key.clone(), (value + 1).to_le_bytes().to_vec());
                    let ctx = MockSimContext::new(
                        tx.clone(),
                        start_seq,
                        rw_set,
                        TxResult::success(vec![]),
                    );

                    let (applied, _size) = snapshot.apply_tx_sim_context(
                        &ctx,
                        ExecOrderTxType::Normal,
                        true,
                        false,
                    );
                    if applied {
                        break;
                    }
                }
            }
        }));
    }
    for handle in handles {
        handle.join().expect("worker panicked");
    }

    snapshot.seal();
    assert_eq!(snapshot.snapshot_size(), WORKERS * TXS_PER_WORKER);

    // No lost updates: the counters sum to the number of increments.
    let mut total = 0;
    for counter in 0..COUNTERS {
        let key = format!("counter{counter}").into_bytes();
        let observed = snapshot.get_key(0, "bank", &key).unwrap();
        total += counter_value(observed);
    }
    assert_eq!(total as usize, WORKERS * TXS_PER_WORKER);

    // Replaying the block along its DAG reproduces the end state exactly.
    let dag = snapshot.build_dag(false);
    assert!(dag.edges_point_backwards());
    let rw_sets = snapshot.tx_rw_set_table();
    assert_eq!(
        replay_in_topological_order(&dag, &rw_sets),
        final_state_in_apply_order(&rw_sets)
    );
}

#[test]
fn test_eventual_acceptance_within_conflicting_writer_bound() {
    let snapshot = Snapshot::new(
        Arc::new(MemStore::new()),
        &block_at(1, b"genesis"),
        DagMode::Parallel,
        false,
    );

    // Three writers of "k" land before the straggler applies.
    const WRITERS: usize = 3;
    for i in 0..WRITERS {
        let id = format!("writer{i}");
        let ctx = MockSimContext::new(
            Transaction::new(id.as_str(), vec![]),
            i,
            TxRwSet::new(id.as_str()).with_write("bank", b"k".to_vec(), vec![i as u8]),
            TxResult::success(vec![]),
        );
        let (applied, _) =
            snapshot.apply_tx_sim_context(&ctx, ExecOrderTxType::Normal, true, false);
        assert!(applied);
    }

    // The straggler started at sequence 0 with a read of "k".
    let mut ctx = MockSimContext::new(
        Transaction::new("straggler", vec![]),
        0,
        TxRwSet::new("straggler")
            .with_read("bank", b"k".to_vec(), vec![])
            .with_write("bank", b"out".to_vec(), b"done".to_vec()),
        TxResult::success(vec![]),
    );

    let mut attempts = 0;
    loop {
        attempts += 1;
        let (applied, size) =
            snapshot.apply_tx_sim_context(&ctx, ExecOrderTxType::Normal, true, false);
        if applied {
            break;
        }
        ctx.set_exec_seq(size);
        assert!(
            attempts <= WRITERS + 1,
            "retries must be bounded by the number of conflicting writers"
        );
    }
    assert_eq!(attempts, 2, "one rejection, then acceptance at the new seq");
}

#[test]
fn test_stale_reader_produces_single_edge_dag() {
    // Height-5 snapshot, empty tables. A writes k; B read k at seq 0, so
    // B's first apply fails and its retry succeeds. The DAG is B -> A.
    let snapshot = Snapshot::new(
        Arc::new(MemStore::new()),
        &block_at(5, b"pre"),
        DagMode::Parallel,
        false,
    );

    let ctx_a = MockSimContext::new(
        Transaction::new("txA", vec![]),
        0,
        TxRwSet::new("txA").with_write("bank", b"k".to_vec(), b"1".to_vec()),
        TxResult::success(vec![]),
    );
    assert_eq!(
        snapshot.apply_tx_sim_context(&ctx_a, ExecOrderTxType::Normal, true, false),
        (true, 1)
    );

    let mut ctx_b = MockSimContext::new(
        Transaction::new("txB", vec![]),
        0,
        TxRwSet::new("txB")
            .with_read("bank", b"k".to_vec(), b"0".to_vec())
            .with_write("bank", b"k".to_vec(), b"2".to_vec()),
        TxResult::success(vec![]),
    );
    assert_eq!(
        snapshot.apply_tx_sim_context(&ctx_b, ExecOrderTxType::Normal, true, false),
        (false, 1)
    );

    ctx_b.set_exec_seq(1);
    ctx_b.set_rw_set(
        TxRwSet::new("txB")
            .with_read("bank", b"k".to_vec(), b"1".to_vec())
            .with_write("bank", b"k".to_vec(), b"2".to_vec()),
    );
    assert_eq!(
        snapshot.apply_tx_sim_context(&ctx_b, ExecOrderTxType::Normal, true, false),
        (true, 2)
    );

    snapshot.seal();
    let dag = snapshot.build_dag(false);
    assert!(dag.vertices[0].neighbors.is_empty());
    assert_eq!(dag.vertices[1].neighbors, vec![0]);
}

#[test]
fn test_get_key_resolves_through_ancestors_then_store() {
    let store = Arc::new(MemStore::new());
    store.put("bank", b"committed", b"from-store");

    let manager = SnapshotManager::new(Arc::clone(&store) as Arc<dyn BlockchainStore>);
    let genesis = block_at(0, b"none");
    let block1 = block_at(1, b"genesis");
    let block2 = block_at(2, b"block1");

    let parent = manager.new_snapshot(&genesis, &block1);
    let child = manager.new_snapshot(&block1, &block2);

    // The parent's speculative write is visible through the chain.
    let ctx = MockSimContext::new(
        Transaction::new("tx1", vec![]),
        0,
        TxRwSet::new("tx1").with_write("bank", b"k".to_vec(), b"speculative".to_vec()),
        TxResult::success(vec![]),
    );
    parent.apply_tx_sim_context(&ctx, ExecOrderTxType::Normal, true, false);

    assert_eq!(
        child.get_key(0, "bank", b"k").unwrap(),
        Some(b"speculative".to_vec())
    );
    assert_eq!(
        child.get_key(0, "bank", b"committed").unwrap(),
        Some(b"from-store".to_vec())
    );
    assert_eq!(child.get_key(0, "bank", b"absent").unwrap(), None);

    // Once block1 commits, its effects are durable: the chain is severed
    // and the store answers instead.
    store.put("bank", b"k", b"durable");
    manager.notify_block_committed(&block1);

    assert!(child.parent().is_none());
    assert_eq!(
        child.get_key(0, "bank", b"k").unwrap(),
        Some(b"durable".to_vec())
    );
}

#[test]
fn test_evidence_manager_snapshots_build_linear_dags() {
    let manager = SnapshotManager::evidence(Arc::new(MemStore::new()));
    let snapshot = manager.new_snapshot(&block_at(0, b"none"), &block_at(1, b"genesis"));

    // Disjoint writes that the parallel strategy would leave unordered.
    for i in 0..4usize {
        let id = format!("tx{i}");
        let ctx = MockSimContext::new(
            Transaction::new(id.as_str(), vec![]),
            i,
            TxRwSet::new(id.as_str()).with_write("bank", id.clone().into_bytes(), vec![1]),
            TxResult::success(vec![]),
        );
        let (applied, _) =
            snapshot.apply_tx_sim_context(&ctx, ExecOrderTxType::Normal, true, false);
        assert!(applied);
    }
    snapshot.seal();

    let dag = snapshot.build_dag(false);
    assert!(dag.is_linear_chain());
    assert_eq!(dag.tx_count(), 4);
}
