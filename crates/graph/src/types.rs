use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::Direction;
use std::collections::HashMap;
use std::hash::Hash;

/// Node weight: the payload plus its insertion sequence number.
#[derive(Debug, Clone)]
pub(crate) struct Slot<T> {
    pub(crate) seq: u64,
    pub(crate) payload: T,
}

/// Directed graph keyed by payload value.
///
/// An edge `consumer -> dependency` makes the dependency a child of the
/// consumer. Every listing is returned in insertion order, including after
/// removals, so orderings built on top of it are reproducible.
#[derive(Debug, Clone)]
pub struct AssetGraph<T> {
    pub(crate) graph: StableDiGraph<Slot<T>, ()>,

    /// Payload -> NodeIndex mapping for lookup by value
    pub(crate) index: HashMap<T, NodeIndex>,

    next_seq: u64,
}

/// Borrowed view of one node.
pub struct GraphNode<'g, T> {
    pub(crate) graph: &'g AssetGraph<T>,
    pub(crate) index: NodeIndex,
}

impl<T: Clone + Eq + Hash> AssetGraph<T> {
    pub fn new() -> Self {
        Self {
            graph: StableDiGraph::new(),
            index: HashMap::new(),
            next_seq: 0,
        }
    }

    /// Insert `payload` unless an equal node already exists.
    pub fn add_node(&mut self, payload: T) -> NodeIndex {
        if let Some(&idx) = self.index.get(&payload) {
            return idx;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        let idx = self.graph.add_node(Slot {
            seq,
            payload: payload.clone(),
        });
        self.index.insert(payload, idx);
        idx
    }

    /// Record `to` as a dependency of `from`, creating either node if missing.
    /// Repeated edges are stored once; `from == to` is a self-loop.
    pub fn add_edge(&mut self, from: T, to: T) {
        let from = self.add_node(from);
        let to = self.add_node(to);
        self.graph.update_edge(from, to, ());
    }

    pub fn get_node(&self, payload: &T) -> Option<GraphNode<'_, T>> {
        self.index
            .get(payload)
            .map(|&index| GraphNode { graph: self, index })
    }

    pub fn contains(&self, payload: &T) -> bool {
        self.index.contains_key(payload)
    }

    /// Remove a node and strip it from every other node's dependencies.
    /// Returns the payload, or `None` if it was not in the graph.
    pub fn remove_node(&mut self, payload: &T) -> Option<T> {
        let idx = self.index.remove(payload)?;
        self.graph.remove_node(idx).map(|slot| slot.payload)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub(crate) fn seq(&self, idx: NodeIndex) -> u64 {
        self.graph[idx].seq
    }

    pub(crate) fn payload_at(&self, idx: NodeIndex) -> &T {
        &self.graph[idx].payload
    }

    pub(crate) fn sorted(&self, mut indices: Vec<NodeIndex>) -> Vec<NodeIndex> {
        indices.sort_by_key(|&idx| self.seq(idx));
        indices
    }

    pub(crate) fn neighbors_sorted(&self, idx: NodeIndex, dir: Direction) -> Vec<NodeIndex> {
        self.sorted(self.graph.neighbors_directed(idx, dir).collect())
    }

    pub(crate) fn view(&self, index: NodeIndex) -> GraphNode<'_, T> {
        GraphNode { graph: self, index }
    }
}

impl<T: Clone + Eq + Hash> Default for AssetGraph<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'g, T: Clone + Eq + Hash> GraphNode<'g, T> {
    pub fn payload(&self) -> &'g T {
        self.graph.payload_at(self.index)
    }

    /// Dependencies of this node, in insertion order.
    pub fn children(&self) -> Vec<&'g T> {
        self.graph
            .neighbors_sorted(self.index, Direction::Outgoing)
            .into_iter()
            .map(|idx| self.graph.payload_at(idx))
            .collect()
    }

    pub fn is_leaf(&self) -> bool {
        self.graph
            .graph
            .neighbors_directed(self.index, Direction::Outgoing)
            .next()
            .is_none()
    }

    pub fn has_self_loop(&self) -> bool {
        self.graph.graph.contains_edge(self.index, self.index)
    }
}

impl<T> Clone for GraphNode<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for GraphNode<'_, T> {}

impl<T: Clone + Eq + Hash + std::fmt::Debug> std::fmt::Debug for GraphNode<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphNode")
            .field("payload", self.payload())
            .field("children", &self.children())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn add_node_is_idempotent() {
        let mut graph = AssetGraph::new();
        let a = graph.add_node("a");
        assert_eq!(graph.add_node("a"), a);
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn add_edge_creates_missing_nodes_once() {
        let mut graph = AssetGraph::new();
        graph.add_edge("view", "sheet");
        graph.add_edge("view", "sheet");

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        let view = graph.get_node(&"view").expect("view node");
        assert_eq!(view.children(), vec![&"sheet"]);
        assert!(!view.is_leaf());
        assert!(graph.get_node(&"sheet").unwrap().is_leaf());
    }

    #[test]
    fn missing_nodes_are_none_not_errors() {
        let mut graph: AssetGraph<&str> = AssetGraph::new();
        assert!(graph.get_node(&"ghost").is_none());
        assert_eq!(graph.remove_node(&"ghost"), None);
        assert!(graph.is_empty());
    }

    #[test]
    fn remove_node_strips_references() {
        let mut graph = AssetGraph::new();
        graph.add_edge("a", "b");
        graph.add_edge("c", "b");
        graph.add_edge("b", "b");

        assert_eq!(graph.remove_node(&"b"), Some("b"));
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.get_node(&"a").unwrap().is_leaf());
        assert!(graph.get_node(&"c").unwrap().is_leaf());
        assert!(!graph.contains(&"b"));
    }

    #[test]
    fn self_loops_are_kept() {
        let mut graph = AssetGraph::new();
        graph.add_edge("loop", "loop");
        let node = graph.get_node(&"loop").unwrap();
        assert!(node.has_self_loop());
        assert!(!node.is_leaf());
    }
}
