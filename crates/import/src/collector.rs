use crate::record::{AssetIntrospector, AssetRecord};
use deploy_graph::AssetGraph;
use deploy_protocol::AssetIdentity;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Dependency discovery for one asset failed; it was added unwired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryFailure {
    pub asset: AssetIdentity,
    pub reason: String,
}

/// Output of [`DependencyCollector::collect`]
#[derive(Debug)]
pub struct CollectedDependencies {
    pub graph: AssetGraph<AssetIdentity>,

    /// Wired dependencies per bundle asset (the graph's edges, kept after
    /// the graph is consumed by ordering)
    pub dependencies: BTreeMap<AssetIdentity, BTreeSet<AssetIdentity>>,

    pub failures: Vec<DiscoveryFailure>,
}

impl CollectedDependencies {
    pub fn failed(&self, asset: &AssetIdentity) -> bool {
        self.failures.iter().any(|f| &f.asset == asset)
    }

    pub fn dependencies_of(&self, asset: &AssetIdentity) -> Option<&BTreeSet<AssetIdentity>> {
        self.dependencies.get(asset)
    }
}

/// Builds the dependency graph of a bundle
pub struct DependencyCollector<'a> {
    introspector: &'a dyn AssetIntrospector,
}

impl<'a> DependencyCollector<'a> {
    pub fn new(introspector: &'a dyn AssetIntrospector) -> Self {
        Self { introspector }
    }

    /// One node per record, plus one per referenced asset outside the bundle.
    ///
    /// Edges are the declared dependencies, the discovered ones, the
    /// implicit edge from an extended model to its base, and the edge from a
    /// model to its data source when that data source is in the bundle.
    pub fn collect(&self, records: &[AssetRecord]) -> CollectedDependencies {
        let bundled: HashSet<&AssetIdentity> = records.iter().map(|r| &r.identity).collect();
        let mut graph = AssetGraph::new();
        let mut dependencies = BTreeMap::new();
        let mut failures = Vec::new();

        for record in records {
            let id = &record.identity;
            graph.add_node(id.clone());

            let discovered = match self.introspector.dependencies_of(record, records) {
                Ok(discovered) => discovered,
                Err(err) => {
                    log::warn!("Dependency discovery failed for {id}: {err:#}");
                    failures.push(DiscoveryFailure {
                        asset: id.clone(),
                        reason: format!("{err:#}"),
                    });
                    dependencies.insert(id.clone(), BTreeSet::new());
                    continue;
                }
            };

            let mut wired: BTreeSet<AssetIdentity> =
                record.dependencies.union(&discovered).cloned().collect();
            if let Some(base) = id.base() {
                wired.insert(base);
            }
            if let Some(source) = id.data_source().filter(|ds| bundled.contains(ds)) {
                wired.insert(source);
            }

            for dependency in &wired {
                graph.add_edge(id.clone(), dependency.clone());
            }
            dependencies.insert(id.clone(), wired);
        }

        log::info!(
            "Collected bundle dependencies: {} nodes, {} edges, {} discovery failures",
            graph.node_count(),
            graph.edge_count(),
            failures.len()
        );

        CollectedDependencies {
            graph,
            dependencies,
            failures,
        }
    }
}
