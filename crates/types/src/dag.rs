//! Per-block transaction dependency DAG.
//!
//! The DAG ships inside the block. Vertex `i` corresponds to the i-th entry
//! of the block's transaction table (apply order), and its neighbors are the
//! indices of transactions that must complete before it. Validators replay
//! the block in any order consistent with this partial order and obtain the
//! proposer's exact end state.

use serde::{Deserialize, Serialize};

/// Direct predecessors of one transaction in the block DAG.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DagVertex {
    /// Indices of transactions this one directly depends on, ascending.
    pub neighbors: Vec<u32>,
}

/// The dependency DAG for one block's transaction table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dag {
    /// One vertex per applied transaction, in apply order.
    pub vertices: Vec<DagVertex>,
}

impl Dag {
    /// Number of transactions covered by this DAG.
    pub fn tx_count(&self) -> usize {
        self.vertices.len()
    }

    /// Build the strictly-sequential chain: `tx[i]` depends only on `tx[i-1]`.
    ///
    /// Used by evidence-mode snapshots, where auditability trumps
    /// parallelism.
    pub fn linear_chain(tx_count: usize) -> Self {
        let vertices = (0..tx_count)
            .map(|i| DagVertex {
                neighbors: if i == 0 { vec![] } else { vec![(i - 1) as u32] },
            })
            .collect();
        Self { vertices }
    }

    /// Check whether this DAG is the strictly-sequential chain.
    pub fn is_linear_chain(&self) -> bool {
        self.vertices.iter().enumerate().all(|(i, v)| {
            if i == 0 {
                v.neighbors.is_empty()
            } else {
                v.neighbors == [(i - 1) as u32]
            }
        })
    }

    /// Check the structural invariant: every edge points strictly backwards.
    ///
    /// Edges into the future (or self-loops) would make the partial order
    /// unsatisfiable; a well-formed build never produces them.
    pub fn edges_point_backwards(&self) -> bool {
        self.vertices
            .iter()
            .enumerate()
            .all(|(i, v)| v.neighbors.iter().all(|&j| (j as usize) < i))
    }

    /// Total number of edges.
    pub fn edge_count(&self) -> usize {
        self.vertices.iter().map(|v| v.neighbors.len()).sum()
    }
}
