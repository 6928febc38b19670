use crate::types::{AssetGraph, GraphNode};
use petgraph::algo::tarjan_scc;
use petgraph::Direction;
use std::hash::Hash;

impl<T: Clone + Eq + Hash> AssetGraph<T> {
    /// All nodes in insertion order
    pub fn nodes(&self) -> Vec<GraphNode<'_, T>> {
        self.sorted(self.graph.node_indices().collect())
            .into_iter()
            .map(|idx| self.view(idx))
            .collect()
    }

    /// Nodes without unresolved dependencies, in insertion order
    pub fn leaf_nodes(&self) -> Vec<GraphNode<'_, T>> {
        self.nodes().into_iter().filter(|n| n.is_leaf()).collect()
    }

    /// First node (in insertion order) whose payload matches
    pub fn find(&self, predicate: impl Fn(&T) -> bool) -> Option<GraphNode<'_, T>> {
        self.nodes().into_iter().find(|n| predicate(n.payload()))
    }

    pub fn find_all(&self, predicate: impl Fn(&T) -> bool) -> Vec<GraphNode<'_, T>> {
        self.nodes()
            .into_iter()
            .filter(|n| predicate(n.payload()))
            .collect()
    }

    /// Every `(consumer, dependency)` pair, ordered by consumer then dependency
    pub fn edges(&self) -> Vec<(&T, &T)> {
        let mut pairs: Vec<_> = self
            .graph
            .edge_indices()
            .filter_map(|e| self.graph.edge_endpoints(e))
            .collect();
        pairs.sort_by_key(|&(from, to)| (self.seq(from), self.seq(to)));
        pairs
            .into_iter()
            .map(|(from, to)| (self.payload_at(from), self.payload_at(to)))
            .collect()
    }

    /// Nodes that list `payload` as a dependency (incoming edges)
    pub fn dependents_of(&self, payload: &T) -> Vec<&T> {
        let Some(&idx) = self.index.get(payload) else {
            return Vec::new();
        };
        self.neighbors_sorted(idx, Direction::Incoming)
            .into_iter()
            .map(|n| self.payload_at(n))
            .collect()
    }

    /// Strongly connected components that contain a cycle: more than one node,
    /// or a single node with a self-loop.
    ///
    /// Members are in insertion order and components are ordered by their
    /// earliest member.
    pub fn cycles(&self) -> Vec<Vec<GraphNode<'_, T>>> {
        let mut components: Vec<_> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1 || self.graph.contains_edge(component[0], component[0])
            })
            .map(|component| self.sorted(component))
            .collect();
        components.sort_by_key(|component| self.seq(component[0]));

        components
            .into_iter()
            .map(|component| component.into_iter().map(|idx| self.view(idx)).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn payloads<'g>(nodes: &[GraphNode<'g, &'static str>]) -> Vec<&'static str> {
        nodes.iter().map(|n| *n.payload()).collect()
    }

    #[test]
    fn leaf_nodes_follow_insertion_order() {
        let mut graph = AssetGraph::new();
        graph.add_node("z");
        graph.add_edge("m", "a");
        graph.add_node("b");

        assert_eq!(payloads(&graph.leaf_nodes()), vec!["z", "a", "b"]);

        graph.remove_node(&"a");
        assert_eq!(payloads(&graph.leaf_nodes()), vec!["z", "m", "b"]);
    }

    #[test]
    fn find_and_find_all() {
        let mut graph = AssetGraph::new();
        for name in ["ws1", "vs1", "ws2"] {
            graph.add_node(name);
        }

        assert_eq!(graph.find(|p| p.starts_with("ws")).map(|n| *n.payload()), Some("ws1"));
        assert_eq!(payloads(&graph.find_all(|p| p.starts_with("ws"))), vec!["ws1", "ws2"]);
        assert!(graph.find(|p| p.is_empty()).is_none());
    }

    #[test]
    fn dependents_are_reverse_edges() {
        let mut graph = AssetGraph::new();
        graph.add_edge("vs", "ws");
        graph.add_edge("task", "ws");

        assert_eq!(graph.dependents_of(&"ws"), vec![&"vs", &"task"]);
        assert!(graph.dependents_of(&"vs").is_empty());
        assert!(graph.dependents_of(&"missing").is_empty());
    }

    #[test]
    fn cycles_ignore_nodes_upstream_of_a_cycle() {
        let mut graph = AssetGraph::new();
        graph.add_edge("upstream", "a");
        graph.add_edge("a", "b");
        graph.add_edge("b", "a");
        graph.add_edge("solo", "solo");
        graph.add_node("free");

        let cycles = graph.cycles();
        assert_eq!(cycles.len(), 2);
        assert_eq!(payloads(&cycles[0]), vec!["a", "b"]);
        assert_eq!(payloads(&cycles[1]), vec!["solo"]);
    }
}
