//! # Deploy Graph
//!
//! Dependency graph and import ordering for asset bundles.
//!
//! ## Architecture
//!
//! ```text
//! (consumer, dependency) pairs
//!     │
//!     ├──> AssetGraph (petgraph StableDiGraph)
//!     │      ├─ Nodes: one per distinct payload
//!     │      └─ Edges: consumer -> dependency
//!     │
//!     └──> TopologicalOrderer
//!            ├─ Peel leaf nodes in insertion order
//!            ├─ On a pure cycle, sacrifice the best-ranked member
//!            └─ Emit resolved nodes, then cycle-broken nodes
//! ```

mod error;
mod graph;
mod order;
mod types;

pub use error::{CycleError, Result};
pub use order::{CycleBreakPolicy, TopologicalOrder, TopologicalOrderer};
pub use types::{AssetGraph, GraphNode};
