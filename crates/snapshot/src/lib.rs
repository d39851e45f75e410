//! Per-block speculative execution snapshots and conflict DAG construction.
//!
//! This crate implements the engine that lets many workers execute one
//! candidate block's transactions concurrently and still commit a
//! deterministic result:
//!
//! - [`Snapshot`] — a shared, versioned view of world-state for one
//!   candidate block. Workers commit completed executions optimistically;
//!   a worker whose inputs went stale is told to re-execute and retry.
//! - The conflict-graph builder — compresses the recorded read/write
//!   conflicts of a sealed snapshot into the minimal dependency DAG that
//!   ships with the block, so validators replay it with the proposer's
//!   parallelism.
//! - [`SnapshotManager`] — per-chain registry chaining each snapshot to
//!   its parent for speculative forks, and garbage-collecting on commit.
//!
//! Everything here is synchronous and in-process; networking, storage
//! backends, and contract execution stay behind the `tessera-core` traits.

mod bitset;
mod config;
mod dag_builder;
mod manager;
mod snapshot;
mod versioned;

pub use config::{DagMode, ManagerConfig, DEFAULT_GC_DEPTH};
pub use manager::SnapshotManager;
pub use snapshot::Snapshot;
