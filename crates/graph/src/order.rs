use crate::error::{CycleError, Result};
use crate::types::AssetGraph;
use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Decides which nodes may be forcibly removed to break a cycle.
pub trait CycleBreakPolicy<T> {
    /// `None` if the node must never be sacrificed, otherwise its priority
    /// (lower is removed first).
    fn rank(&self, node: &T) -> Option<usize>;
}

impl<T, F> CycleBreakPolicy<T> for F
where
    F: Fn(&T) -> Option<usize>,
{
    fn rank(&self, node: &T) -> Option<usize> {
        self(node)
    }
}

/// Linear import order produced by [`TopologicalOrderer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologicalOrder<T> {
    /// Nodes in extraction order; dependencies come before their consumers
    pub resolved: Vec<T>,

    /// Nodes removed to break cycles, in removal order
    pub cycle_broken: Vec<T>,
}

impl<T: PartialEq> TopologicalOrder<T> {
    /// Resolved nodes followed by cycle-broken nodes.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.resolved.iter().chain(self.cycle_broken.iter())
    }

    pub fn is_cycle_broken(&self, node: &T) -> bool {
        self.cycle_broken.contains(node)
    }

    pub fn position(&self, node: &T) -> Option<usize> {
        self.iter().position(|n| n == node)
    }

    pub fn len(&self) -> usize {
        self.resolved.len() + self.cycle_broken.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for TopologicalOrder<T> {
    fn default() -> Self {
        Self {
            resolved: Vec::new(),
            cycle_broken: Vec::new(),
        }
    }
}

/// Peels leaf nodes off a graph until it is empty, sacrificing one node
/// whenever only cycles remain.
pub struct TopologicalOrderer<P> {
    policy: P,
}

impl<P> TopologicalOrderer<P> {
    pub fn new(policy: P) -> Self {
        Self { policy }
    }

    /// Consume `graph` and linearize it.
    ///
    /// Fails when a cycle contains no node the policy ranks; nothing is
    /// returned in that case.
    pub fn order<T>(&self, mut graph: AssetGraph<T>) -> Result<TopologicalOrder<T>, T>
    where
        T: Clone + Eq + Hash + Debug + Display,
        P: CycleBreakPolicy<T>,
    {
        let mut order = TopologicalOrder::default();

        while !graph.is_empty() {
            let leaves: Vec<T> = graph
                .leaf_nodes()
                .into_iter()
                .map(|node| node.payload().clone())
                .collect();

            if leaves.is_empty() {
                let victim = self.select_victim(&graph)?;
                log::debug!("Breaking dependency cycle by deferring {:?}", victim);
                graph.remove_node(&victim);
                order.cycle_broken.push(victim);
                continue;
            }

            for leaf in leaves {
                graph.remove_node(&leaf);
                order.resolved.push(leaf);
            }
        }

        Ok(order)
    }

    /// Every remaining cycle must offer a candidate; the earliest cycle loses
    /// its best-ranked node (ties go to the earliest inserted).
    fn select_victim<T>(&self, graph: &AssetGraph<T>) -> Result<T, T>
    where
        T: Clone + Eq + Hash + Debug + Display,
        P: CycleBreakPolicy<T>,
    {
        let mut victim: Option<T> = None;

        for cycle in graph.cycles() {
            let candidate = cycle
                .iter()
                .enumerate()
                .filter_map(|(pos, node)| self.policy.rank(node.payload()).map(|rank| (rank, pos)))
                .min()
                .map(|(_, pos)| cycle[pos].payload().clone());

            match candidate {
                Some(candidate) => {
                    victim.get_or_insert(candidate);
                }
                None => {
                    let members: Vec<T> = cycle.iter().map(|n| n.payload().clone()).collect();
                    log::warn!("No node may be removed from dependency cycle {:?}", members);
                    return Err(CycleError { members });
                }
            }
        }

        // A graph without leaves always has a cycle; keep the error path total anyway.
        victim.ok_or_else(|| CycleError {
            members: graph.nodes().iter().map(|n| n.payload().clone()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn any_node(_: &&str) -> Option<usize> {
        Some(0)
    }

    fn no_node(_: &&str) -> Option<usize> {
        None
    }

    #[test]
    fn independent_nodes_keep_insertion_order() {
        let mut graph = AssetGraph::new();
        for name in ["c", "a", "b"] {
            graph.add_node(name);
        }

        let order = TopologicalOrderer::new(no_node).order(graph).unwrap();
        assert_eq!(order.resolved, vec!["c", "a", "b"]);
        assert!(order.cycle_broken.is_empty());
    }

    #[test]
    fn dependencies_come_first() {
        let mut graph = AssetGraph::new();
        graph.add_edge("viewsheet", "worksheet");
        graph.add_edge("worksheet", "datasource");
        graph.add_edge("task", "viewsheet");

        let order = TopologicalOrderer::new(no_node).order(graph).unwrap();
        assert_eq!(order.resolved, vec!["datasource", "worksheet", "viewsheet", "task"]);
    }

    #[test]
    fn three_node_cycle_sacrifices_exactly_one() {
        let mut graph = AssetGraph::new();
        graph.add_edge("a", "b");
        graph.add_edge("b", "c");
        graph.add_edge("c", "a");

        let order = TopologicalOrderer::new(any_node).order(graph).unwrap();
        assert_eq!(order.cycle_broken, vec!["a"]);
        assert_eq!(order.resolved, vec!["c", "b"]);
        assert_eq!(order.iter().copied().collect::<Vec<_>>(), vec!["c", "b", "a"]);
        assert!(order.is_cycle_broken(&"a"));
    }

    #[test]
    fn policy_rank_beats_insertion_order() {
        let mut graph = AssetGraph::new();
        graph.add_edge("primitive", "sheet");
        graph.add_edge("sheet", "primitive");

        let prefer_sheet = |node: &&str| node.starts_with("sheet").then_some(0usize);
        let order = TopologicalOrderer::new(prefer_sheet).order(graph).unwrap();
        assert_eq!(order.cycle_broken, vec!["sheet"]);
        assert_eq!(order.resolved, vec!["primitive"]);
    }

    #[test]
    fn upstream_consumers_are_not_sacrificed() {
        let mut graph = AssetGraph::new();
        graph.add_edge("consumer", "x");
        graph.add_edge("x", "y");
        graph.add_edge("y", "x");

        let order = TopologicalOrderer::new(any_node).order(graph).unwrap();
        assert_eq!(order.cycle_broken, vec!["x"]);
        assert_eq!(order.resolved, vec!["consumer", "y"]);
    }

    #[test]
    fn unbreakable_cycle_names_its_members() {
        let mut graph = AssetGraph::new();
        graph.add_node("bystander");
        graph.add_edge("ds", "model");
        graph.add_edge("model", "ds");

        let err = TopologicalOrderer::new(no_node).order(graph).unwrap_err();
        assert_eq!(err.members, vec!["ds", "model"]);
        assert_eq!(
            err.to_string(),
            "Dependency cycle cannot be broken between: ds, model"
        );
    }

    #[test]
    fn self_cycle_is_broken_or_fatal() {
        let mut graph = AssetGraph::new();
        graph.add_edge("me", "me");
        let order = TopologicalOrderer::new(any_node).order(graph.clone()).unwrap();
        assert_eq!(order.cycle_broken, vec!["me"]);
        assert!(order.resolved.is_empty());

        let err = TopologicalOrderer::new(no_node).order(graph).unwrap_err();
        assert_eq!(err.members, vec!["me"]);
    }
}
