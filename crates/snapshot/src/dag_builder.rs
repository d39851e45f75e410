//! Bitmap-based conflict-graph construction.
//!
//! Turns a sealed snapshot's ordered read/write sets into the minimal
//! direct-dependency DAG shipped with the block. Naive pairwise comparison
//! of n transactions is O(n²) set intersections; this builder gets close to
//! linear in practice:
//!
//! 1. Every distinct key gets a dense integer index on first sight, so each
//!    transaction's read and write sets become bitmaps.
//! 2. Prefix unions (`cum_read[i] = cum_read[i-1] | read[i]`, same for
//!    writes) give an O(1) pre-check: if transaction `i` does not intersect
//!    the union of everything before it, it has no dependencies at all.
//! 3. Otherwise `i` scans backwards, skipping any `j` already reachable
//!    through an earlier direct dependency. On a genuine conflict, `j`
//!    becomes a direct neighbor and `j`'s reachability set is folded into
//!    `i`'s, so transitive edges are never emitted.
//!
//! The key dictionary lives exactly as long as one build; nothing here
//! persists across calls.

use crate::bitset::BitSet;
use indexmap::IndexSet;
use std::sync::Arc;
use tessera_types::{Dag, DagVertex, TxRwSet};

/// One-shot builder over a sealed snapshot's read/write set table.
pub(crate) struct ConflictGraphBuilder<'a> {
    rw_sets: &'a [Arc<TxRwSet>],
}

impl<'a> ConflictGraphBuilder<'a> {
    /// Create a builder over per-transaction read/write sets in apply
    /// order.
    pub fn new(rw_sets: &'a [Arc<TxRwSet>]) -> Self {
        Self { rw_sets }
    }

    /// Build the minimal direct-dependency DAG.
    pub fn build(&self) -> Dag {
        let tx_count = self.rw_sets.len();
        let mut dag = Dag::default();
        if tx_count == 0 {
            return dag;
        }

        let (read_bitmaps, write_bitmaps) = self.build_rw_bitmaps();
        let (cum_read, cum_write) = build_cumulative_bitmaps(&read_bitmaps, &write_bitmaps);

        dag.vertices.reserve(tx_count);

        // reach_map[i] holds every index reachable from i (including i),
        // built incrementally in apply order.
        let mut reach_map: Vec<BitSet> = Vec::with_capacity(tx_count);

        for i in 0..tx_count {
            let mut direct = BitSet::new();
            let mut reach = BitSet::new();
            reach.insert(i);

            // Pre-check against the cumulative bitmaps: no intersection
            // with anything before i means no dependencies at all.
            if i > 0
                && conflicted(
                    &read_bitmaps[i],
                    &write_bitmaps[i],
                    &cum_read[i - 1],
                    &cum_write[i - 1],
                )
            {
                self.build_reach(
                    i,
                    &read_bitmaps,
                    &write_bitmaps,
                    &reach_map,
                    &mut direct,
                    &mut reach,
                );
            }
            reach_map.push(reach);

            dag.vertices.push(DagVertex {
                neighbors: direct.ones().map(|j| j as u32).collect(),
            });
        }

        dag
    }

    /// Backward scan from `i`, recording direct neighbors and folding in
    /// their reachability so already-covered predecessors are skipped.
    fn build_reach(
        &self,
        i: usize,
        read_bitmaps: &[BitSet],
        write_bitmaps: &[BitSet],
        reach_map: &[BitSet],
        direct: &mut BitSet,
        reach: &mut BitSet,
    ) {
        for j in (0..i).rev() {
            if reach.contains(j) {
                continue;
            }
            if conflicted(
                &read_bitmaps[i],
                &write_bitmaps[i],
                &read_bitmaps[j],
                &write_bitmaps[j],
            ) {
                direct.insert(j);
                reach.union_with(&reach_map[j]);
            }
        }
    }

    /// Index every key on first sight and express each transaction's reads
    /// and writes as bitmaps over that index space.
    ///
    /// Keys are qualified by contract name, matching the snapshot tables:
    /// identical key bytes under different contracts are different state and
    /// must not manufacture an edge.
    fn build_rw_bitmaps(&self) -> (Vec<BitSet>, Vec<BitSet>) {
        let mut key_dict: IndexSet<(&str, &[u8])> = IndexSet::with_capacity(1024);
        let mut read_bitmaps = Vec::with_capacity(self.rw_sets.len());
        let mut write_bitmaps = Vec::with_capacity(self.rw_sets.len());

        for rw_set in self.rw_sets {
            let mut read_bitmap = BitSet::new();
            for read in &rw_set.reads {
                let (index, _) =
                    key_dict.insert_full((read.contract_name.as_str(), read.key.as_slice()));
                read_bitmap.insert(index);
            }
            read_bitmaps.push(read_bitmap);

            let mut write_bitmap = BitSet::new();
            for write in &rw_set.writes {
                let (index, _) =
                    key_dict.insert_full((write.contract_name.as_str(), write.key.as_slice()));
                write_bitmap.insert(index);
            }
            write_bitmaps.push(write_bitmap);
        }

        (read_bitmaps, write_bitmaps)
    }
}

/// Prefix unions of the per-transaction bitmaps.
fn build_cumulative_bitmaps(
    read_bitmaps: &[BitSet],
    write_bitmaps: &[BitSet],
) -> (Vec<BitSet>, Vec<BitSet>) {
    let mut cum_read: Vec<BitSet> = Vec::with_capacity(read_bitmaps.len());
    let mut cum_write: Vec<BitSet> = Vec::with_capacity(write_bitmaps.len());

    for (i, bitmap) in read_bitmaps.iter().enumerate() {
        let mut cumulative = bitmap.clone();
        if i > 0 {
            cumulative.union_with(&cum_read[i - 1]);
        }
        cum_read.push(cumulative);
    }
    for (i, bitmap) in write_bitmaps.iter().enumerate() {
        let mut cumulative = bitmap.clone();
        if i > 0 {
            cumulative.union_with(&cum_write[i - 1]);
        }
        cum_write.push(cumulative);
    }

    (cum_read, cum_write)
}

/// Conflict cases: i reads what j wrote, i writes what j wrote, or i writes
/// what j read. Also serves as the fast pre-check when `j` is the
/// cumulative union of all predecessors.
fn conflicted(read_i: &BitSet, write_i: &BitSet, read_j: &BitSet, write_j: &BitSet) -> bool {
    read_i.intersects(write_j) || write_i.intersects(write_j) || write_i.intersects(read_j)
}
