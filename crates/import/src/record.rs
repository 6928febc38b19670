use deploy_protocol::AssetIdentity;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::PathBuf;

/// One asset of a bundle being imported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRecord {
    pub identity: AssetIdentity,

    /// Backing content file
    pub source: PathBuf,

    /// Dependencies declared by the bundle itself
    pub dependencies: BTreeSet<AssetIdentity>,
}

impl AssetRecord {
    pub fn new(identity: AssetIdentity, source: impl Into<PathBuf>) -> Self {
        Self {
            identity,
            source: source.into(),
            dependencies: BTreeSet::new(),
        }
    }

    pub fn depends_on(mut self, dependency: AssetIdentity) -> Self {
        self.dependencies.insert(dependency);
        self
    }
}

/// Discovers which assets a record references by inspecting its content.
pub trait AssetIntrospector {
    /// Must return the same set for identical content.
    fn dependencies_of(
        &self,
        record: &AssetRecord,
        candidates: &[AssetRecord],
    ) -> anyhow::Result<BTreeSet<AssetIdentity>>;
}

impl<F> AssetIntrospector for F
where
    F: Fn(&AssetRecord, &[AssetRecord]) -> anyhow::Result<BTreeSet<AssetIdentity>>,
{
    fn dependencies_of(
        &self,
        record: &AssetRecord,
        candidates: &[AssetRecord],
    ) -> anyhow::Result<BTreeSet<AssetIdentity>> {
        self(record, candidates)
    }
}

/// Trusts the bundle's declared dependencies and reads nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredOnly;

impl AssetIntrospector for DeclaredOnly {
    fn dependencies_of(
        &self,
        _record: &AssetRecord,
        _candidates: &[AssetRecord],
    ) -> anyhow::Result<BTreeSet<AssetIdentity>> {
        Ok(BTreeSet::new())
    }
}

/// Rewrites the references embedded in an asset's serialized content.
pub trait ContentRewriter {
    fn rewrite_references(
        &mut self,
        record: &AssetRecord,
        renames: &BTreeMap<AssetIdentity, AssetIdentity>,
    ) -> anyhow::Result<()>;
}

/// Identities that already exist in the target repository.
pub trait AssetCatalog {
    fn contains(&self, identity: &AssetIdentity) -> bool;
}

impl AssetCatalog for HashSet<AssetIdentity> {
    fn contains(&self, identity: &AssetIdentity) -> bool {
        HashSet::contains(self, identity)
    }
}

impl AssetCatalog for BTreeSet<AssetIdentity> {
    fn contains(&self, identity: &AssetIdentity) -> bool {
        BTreeSet::contains(self, identity)
    }
}
