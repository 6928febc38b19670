use crate::collector::{CollectedDependencies, DependencyCollector};
use crate::config::ImportConfig;
use crate::error::{ImportError, Result};
use crate::manifest::BundleManifest;
use crate::record::{AssetCatalog, AssetIntrospector, AssetRecord, ContentRewriter};
use crate::relocate::{FolderRelocationResolver, Placement};
use deploy_graph::{CycleBreakPolicy, TopologicalOrderer};
use deploy_protocol::{
    AssetIdentity, ImportPlan, ImportStats, ImportWarning, PlannedImport, WarningKind,
};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Defers assets in configured kind order when a cycle must be broken.
struct KindPriority<'a>(&'a ImportConfig);

impl CycleBreakPolicy<AssetIdentity> for KindPriority<'_> {
    fn rank(&self, node: &AssetIdentity) -> Option<usize> {
        self.0.sacrifice_rank(node.kind())
    }
}

/// Plans one bundle import: collect dependencies, order, relocate.
///
/// Built per import and discarded afterwards; nothing is shared between
/// sessions.
pub struct ImportSession<'a> {
    config: ImportConfig,
    introspector: &'a dyn AssetIntrospector,
    catalog: Option<&'a dyn AssetCatalog>,
}

impl<'a> ImportSession<'a> {
    pub fn new(config: ImportConfig, introspector: &'a dyn AssetIntrospector) -> Result<Self> {
        config.validate().map_err(ImportError::invalid_config)?;
        Ok(Self {
            config,
            introspector,
            catalog: None,
        })
    }

    /// Treat identities in `catalog` as taken when relocating.
    pub fn with_catalog(mut self, catalog: &'a dyn AssetCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// Parse the manifest's identifiers (skipping malformed ones) and plan.
    pub fn plan_manifest(
        &self,
        manifest: &BundleManifest,
        rewriter: &mut dyn ContentRewriter,
    ) -> Result<ImportPlan> {
        let (records, mut warnings) = manifest.records();
        let mut plan = self.plan(records, rewriter)?;
        warnings.append(&mut plan.warnings);
        plan.warnings = warnings;
        plan.stats.warnings = plan.warnings.len();
        Ok(plan)
    }

    /// Order `records` for import and compute their target identities.
    ///
    /// Only an unbreakable dependency cycle is an error; every per-asset
    /// problem is reported as a warning on the plan.
    pub fn plan(
        &self,
        records: Vec<AssetRecord>,
        rewriter: &mut dyn ContentRewriter,
    ) -> Result<ImportPlan> {
        let records = dedupe(records);
        let by_id: HashMap<&AssetIdentity, &AssetRecord> =
            records.iter().map(|r| (&r.identity, r)).collect();

        let CollectedDependencies {
            graph,
            dependencies,
            failures,
        } = DependencyCollector::new(self.introspector).collect(&records);
        let failed: HashSet<&AssetIdentity> = failures.iter().map(|f| &f.asset).collect();
        let mut warnings: Vec<ImportWarning> = failures
            .iter()
            .map(|f| {
                ImportWarning::for_asset(
                    WarningKind::DiscoveryFailed,
                    &f.asset,
                    format!("dependencies unknown, importing in place: {}", f.reason),
                )
            })
            .collect();

        let mut stats = ImportStats {
            assets: records.len(),
            external_dependencies: graph.node_count() - records.len(),
            edges: graph.edge_count(),
            ..Default::default()
        };

        let order = TopologicalOrderer::new(KindPriority(&self.config))
            .order(graph)
            .map_err(|err| ImportError::DependencyCycle {
                assets: err.members,
            })?;

        let placement_of = |id: &AssetIdentity| {
            if order.is_cycle_broken(id) || failed.contains(id) {
                Placement::Default
            } else {
                Placement::Relocatable
            }
        };

        let mut resolver =
            FolderRelocationResolver::new(&self.config, records.iter().map(|r| &r.identity));
        if let Some(catalog) = self.catalog {
            resolver = resolver.with_catalog(catalog);
        }
        resolver.reserve(records.iter().map(|r| (&r.identity, placement_of(&r.identity))));

        let no_dependencies = BTreeSet::new();
        let mut steps = Vec::with_capacity(records.len());
        for id in order.iter() {
            // Assets outside the bundle only constrain the order.
            let Some(record) = by_id.get(id) else {
                continue;
            };

            let cycle_broken = order.is_cycle_broken(id);
            let placement = placement_of(id);
            let wired = dependencies.get(id).unwrap_or(&no_dependencies);
            let outcome = resolver.relocate(record, placement, wired, rewriter);

            stats.cycle_broken += usize::from(cycle_broken);
            stats.relocated += usize::from(outcome.relocated);
            stats.auto_renamed += usize::from(outcome.auto_renamed);
            steps.push(PlannedImport {
                original: id.clone(),
                target: outcome.target,
                source: record.source.clone(),
                cycle_broken,
                relocated: outcome.relocated,
            });
        }

        let (renames, relocation_warnings) = resolver.into_parts();
        warnings.extend(relocation_warnings);
        stats.warnings = warnings.len();

        log::info!(
            "Planned import of {} assets: {} relocated, {} auto-renamed, {} deferred by cycles, {} warnings",
            stats.assets,
            stats.relocated,
            stats.auto_renamed,
            stats.cycle_broken,
            stats.warnings
        );

        Ok(ImportPlan {
            steps,
            renames,
            warnings,
            stats,
        })
    }
}

/// Keep the first record of each identity.
fn dedupe(records: Vec<AssetRecord>) -> Vec<AssetRecord> {
    let mut seen = BTreeSet::new();
    records
        .into_iter()
        .filter(|record| {
            let fresh = seen.insert(record.identity.clone());
            if !fresh {
                log::warn!("Duplicate bundle entry for {}, keeping the first", record.identity);
            }
            fresh
        })
        .collect()
}
