use crate::config::ImportConfig;
use crate::record::{AssetCatalog, AssetRecord, ContentRewriter};
use deploy_protocol::{
    AssetIdentity, ImportWarning, Namespace, Relocation, RenameMapping, WarningKind,
};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Where an asset may be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Follow the configured target folder/owner
    Relocatable,
    /// Keep the bundle's identity (cycle-broken or un-introspectable assets)
    Default,
}

/// Outcome of relocating one asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocated {
    pub target: AssetIdentity,
    pub relocated: bool,
    pub auto_renamed: bool,
}

/// Computes new identities for a bundle moved to another folder or owner and
/// keeps each asset's references to renamed dependencies current.
///
/// Assets must be visited dependencies-first. This is the only writer of the
/// session's [`RenameMapping`].
pub struct FolderRelocationResolver<'a> {
    config: &'a ImportConfig,
    catalog: Option<&'a dyn AssetCatalog>,

    /// Folder segments shared by every relocatable bundle asset, per namespace
    prefixes: BTreeMap<Namespace, Vec<String>>,

    claimed: HashSet<AssetIdentity>,
    renames: RenameMapping,
    warnings: Vec<ImportWarning>,
}

impl<'a> FolderRelocationResolver<'a> {
    pub fn new<'i>(
        config: &'a ImportConfig,
        selected: impl IntoIterator<Item = &'i AssetIdentity>,
    ) -> Self {
        Self {
            config,
            catalog: None,
            prefixes: common_prefixes(selected),
            claimed: HashSet::new(),
            renames: RenameMapping::new(),
            warnings: Vec::new(),
        }
    }

    /// Claim the bundle identity of every asset that will stay in place, so
    /// relocated assets number around them whatever the visiting order.
    ///
    /// Takes every bundle asset with the placement it will be relocated with.
    pub fn reserve<'i>(
        &mut self,
        assets: impl IntoIterator<Item = (&'i AssetIdentity, Placement)>,
    ) {
        let assets: Vec<(&AssetIdentity, Placement)> = assets.into_iter().collect();
        let moving: HashSet<&AssetIdentity> = assets
            .iter()
            .filter(|(id, placement)| self.moves(id, *placement))
            .map(|(id, _)| *id)
            .collect();

        for (id, placement) in assets {
            let follows_source = placement == Placement::Relocatable
                && self.config.relocates()
                && id
                    .data_source()
                    .is_some_and(|source| moving.contains(&source));
            if !moving.contains(id) && !follows_source {
                self.claimed.insert(id.clone());
            }
        }
        log::debug!("Reserved {} identities that stay in place", self.claimed.len());
    }

    pub fn with_catalog(mut self, catalog: &'a dyn AssetCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn common_prefix(&self, namespace: Namespace) -> &[String] {
        self.prefixes.get(&namespace).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn renames(&self) -> &RenameMapping {
        &self.renames
    }

    /// Relocate `record` and rewrite its references to already renamed
    /// dependencies. Never fails: problems become warnings and the asset keeps
    /// its bundle identity.
    pub fn relocate(
        &mut self,
        record: &AssetRecord,
        placement: Placement,
        dependencies: &BTreeSet<AssetIdentity>,
        rewriter: &mut dyn ContentRewriter,
    ) -> Relocated {
        let original = &record.identity;
        let outcome = self.place(original, placement);

        if let Err(err) = self.renames.record(original.clone(), outcome.target.clone()) {
            log::warn!("Ignoring second placement of {original}: {err}");
        }

        let renamed = self
            .renames
            .subset(dependencies.iter().chain(record.dependencies.iter()));
        if !renamed.is_empty() {
            if let Err(err) = rewriter.rewrite_references(record, &renamed) {
                log::warn!("Failed to rewrite references in {original}: {err:#}");
                self.warnings.push(ImportWarning::for_asset(
                    WarningKind::RewriteFailed,
                    original,
                    format!("{err:#}"),
                ));
            }
        }

        outcome
    }

    pub fn into_parts(self) -> (RenameMapping, Vec<ImportWarning>) {
        (self.renames, self.warnings)
    }

    fn place(&mut self, original: &AssetIdentity, placement: Placement) -> Relocated {
        if placement == Placement::Default || !self.config.relocates() {
            return self.keep(original);
        }
        if original.kind().relocation() == Relocation::Fixed {
            return self.follow_data_source(original);
        }

        let candidate = match self.candidate(original) {
            Ok(candidate) => candidate,
            Err(reason) => return self.fail(original, reason),
        };
        if &candidate == original {
            return self.keep(original);
        }

        match self.claim_unique(candidate) {
            Ok((target, auto_renamed)) => Relocated {
                relocated: &target != original,
                target,
                auto_renamed,
            },
            Err(reason) => self.fail(original, reason),
        }
    }

    fn keep(&mut self, original: &AssetIdentity) -> Relocated {
        self.claimed.insert(original.clone());
        Relocated {
            target: original.clone(),
            relocated: false,
            auto_renamed: false,
        }
    }

    /// A model lives under its data source: it moves only when that data
    /// source was renamed, keeping the segments below it.
    fn follow_data_source(&mut self, original: &AssetIdentity) -> Relocated {
        let Some((source, depth)) = original.data_source().zip(original.kind().model_depth()) else {
            return self.keep(original);
        };
        let Some(moved) = self.renames.get(&source).filter(|target| *target != &source) else {
            return self.keep(original);
        };

        let segments: Vec<&str> = original.segments().collect();
        let below = segments[segments.len() - depth..].join("/");
        let target = original.with_path(format!("{}/{below}", moved.path()));
        if self.in_use(&target) {
            return self.fail(original, format!("{target} is already taken"));
        }

        log::debug!("{original} follows its data source to {target}");
        self.claimed.insert(target.clone());
        Relocated {
            target,
            relocated: true,
            auto_renamed: false,
        }
    }

    /// Whether `original` leaves its bundle identity when its own placement
    /// is decided. Models are handled by [`Self::reserve`].
    fn moves(&self, original: &AssetIdentity, placement: Placement) -> bool {
        placement == Placement::Relocatable
            && self.config.relocates()
            && original.kind().relocation() == Relocation::Folder
            && self
                .candidate(original)
                .is_ok_and(|candidate| &candidate != original)
    }

    fn fail(&mut self, original: &AssetIdentity, reason: String) -> Relocated {
        log::warn!("Leaving {original} in place: {reason}");
        self.warnings.push(ImportWarning::for_asset(
            WarningKind::RelocationFailed,
            original,
            reason,
        ));
        self.keep(original)
    }

    /// Strip the namespace prefix, prepend the target folder, swap the owner.
    fn candidate(&self, original: &AssetIdentity) -> Result<AssetIdentity, String> {
        let segments: Vec<&str> = original.segments().collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(format!("malformed path {:?}", original.path()));
        }

        let mut target = original.clone();

        if let Some(folder) = self.config.target_segments() {
            let prefix = self.common_prefix(original.kind().namespace());
            let shared = prefix.len() < segments.len()
                && prefix.iter().zip(&segments).all(|(p, s)| p == s);
            if !shared {
                return Err(format!(
                    "path {:?} is outside the bundle folder {:?}",
                    original.path(),
                    prefix.join("/")
                ));
            }

            let path: Vec<&str> = folder
                .into_iter()
                .chain(segments[prefix.len()..].iter().copied())
                .collect();
            target = target.with_path(path.join("/"));
        }

        if let (Some(owner), Some(_)) = (&self.config.target_owner, original.owner()) {
            target = target.with_owner(Some(owner.clone()));
        }

        Ok(target)
    }

    fn in_use(&self, id: &AssetIdentity) -> bool {
        self.claimed.contains(id) || self.catalog.is_some_and(|c| c.contains(id))
    }

    /// Append `_1`, `_2`, ... to the asset name until the identity is free.
    fn claim_unique(&mut self, candidate: AssetIdentity) -> Result<(AssetIdentity, bool), String> {
        if !self.in_use(&candidate) {
            self.claimed.insert(candidate.clone());
            return Ok((candidate, false));
        }

        for n in 1..=self.config.max_rename_suffix {
            let renamed = candidate.with_path(format!("{}_{n}", candidate.path()));
            if !self.in_use(&renamed) {
                log::info!("{candidate} is taken, importing as {renamed}");
                self.claimed.insert(renamed.clone());
                return Ok((renamed, true));
            }
        }

        Err(format!(
            "{candidate} and its {} numbered alternatives are all taken",
            self.config.max_rename_suffix
        ))
    }
}

/// Longest folder prefix shared by the relocatable assets of each namespace.
fn common_prefixes<'i>(
    selected: impl IntoIterator<Item = &'i AssetIdentity>,
) -> BTreeMap<Namespace, Vec<String>> {
    let mut prefixes: BTreeMap<Namespace, Vec<String>> = BTreeMap::new();

    for id in selected {
        if id.kind().relocation() != Relocation::Folder {
            continue;
        }
        let folder: Vec<&str> = id.segments().collect();
        if folder.iter().any(|s| s.is_empty()) {
            continue;
        }
        let folder = &folder[..folder.len() - 1];

        match prefixes.get_mut(&id.kind().namespace()) {
            Some(prefix) => {
                let shared = prefix
                    .iter()
                    .zip(folder)
                    .take_while(|(p, s)| p == s)
                    .count();
                prefix.truncate(shared);
            }
            None => {
                prefixes.insert(
                    id.kind().namespace(),
                    folder.iter().map(|s| s.to_string()).collect(),
                );
            }
        }
    }

    prefixes
}

#[cfg(test)]
mod tests {
    use super::*;
    use deploy_protocol::AssetKind;
    use pretty_assertions::assert_eq;

    struct Recorder(Vec<(AssetIdentity, BTreeMap<AssetIdentity, AssetIdentity>)>);

    impl ContentRewriter for Recorder {
        fn rewrite_references(
            &mut self,
            record: &AssetRecord,
            renames: &BTreeMap<AssetIdentity, AssetIdentity>,
        ) -> anyhow::Result<()> {
            self.0.push((record.identity.clone(), renames.clone()));
            Ok(())
        }
    }

    fn ws(path: &str) -> AssetIdentity {
        AssetIdentity::new(AssetKind::Worksheet, path)
    }

    #[test]
    fn prefixes_are_per_namespace() {
        let ids = [
            ws("Sales/2024/Orders"),
            ws("Sales/2024/Q1/Returns"),
            AssetIdentity::new(AssetKind::DataSource, "db/Warehouse"),
            AssetIdentity::new(AssetKind::Partition, "db/Warehouse/Physical"),
        ];
        let config = ImportConfig::into_folder("Imported");
        let resolver = FolderRelocationResolver::new(&config, &ids);

        assert_eq!(resolver.common_prefix(Namespace::Repository), ["Sales", "2024"]);
        assert_eq!(resolver.common_prefix(Namespace::DataSpace), ["db"]);
        assert!(resolver.common_prefix(Namespace::Library).is_empty());
    }

    #[test]
    fn relocates_under_target_folder_and_rewrites_dependents() {
        let sheet = AssetRecord::new(ws("Sales/Orders"), "orders.xml");
        let board = AssetRecord::new(AssetIdentity::new(AssetKind::Viewsheet, "Sales/Board"), "b.xml")
            .depends_on(sheet.identity.clone());
        let config = ImportConfig::into_folder("Imported");
        let ids = [sheet.identity.clone(), board.identity.clone()];
        let mut resolver = FolderRelocationResolver::new(&config, &ids);
        let mut rewriter = Recorder(Vec::new());

        let first = resolver.relocate(&sheet, Placement::Relocatable, &BTreeSet::new(), &mut rewriter);
        assert_eq!(first.target, ws("Imported/Orders"));
        assert!(first.relocated);

        let second = resolver.relocate(&board, Placement::Relocatable, &BTreeSet::new(), &mut rewriter);
        assert_eq!(second.target.path(), "Imported/Board");

        assert_eq!(rewriter.0.len(), 1);
        assert_eq!(rewriter.0[0].0, board.identity);
        assert_eq!(rewriter.0[0].1.get(&sheet.identity), Some(&ws("Imported/Orders")));
        assert_eq!(resolver.renames().len(), 2);
    }

    #[test]
    fn default_placement_keeps_identity_but_still_rewrites() {
        let sheet = AssetRecord::new(ws("A/Orders"), "orders.xml");
        let broken = AssetRecord::new(ws("A/Loop"), "loop.xml").depends_on(sheet.identity.clone());
        let config = ImportConfig::into_folder("T");
        let ids = [sheet.identity.clone(), broken.identity.clone()];
        let mut resolver = FolderRelocationResolver::new(&config, &ids);
        let mut rewriter = Recorder(Vec::new());

        resolver.relocate(&sheet, Placement::Relocatable, &BTreeSet::new(), &mut rewriter);
        let kept = resolver.relocate(&broken, Placement::Default, &BTreeSet::new(), &mut rewriter);

        assert_eq!(kept.target, broken.identity);
        assert!(!kept.relocated);
        assert_eq!(rewriter.0.len(), 1);
    }

    #[test]
    fn malformed_paths_stay_put_with_a_warning() {
        let odd = AssetRecord::new(ws("Sales//Orders"), "odd.xml");
        let config = ImportConfig::into_folder("T");
        let mut resolver = FolderRelocationResolver::new(&config, [&odd.identity]);
        let mut rewriter = Recorder(Vec::new());

        let outcome = resolver.relocate(&odd, Placement::Relocatable, &BTreeSet::new(), &mut rewriter);
        assert_eq!(outcome.target, odd.identity);
        let (renames, warnings) = resolver.into_parts();
        assert!(renames.is_empty());
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::RelocationFailed);
    }

    #[test]
    fn catalog_collisions_get_numbered() {
        let sheet = AssetRecord::new(ws("Sales/Orders"), "orders.xml");
        let existing: HashSet<AssetIdentity> =
            [ws("T/Orders"), ws("T/Orders_1")].into_iter().collect();
        let config = ImportConfig::into_folder("T");
        let mut resolver =
            FolderRelocationResolver::new(&config, [&sheet.identity]).with_catalog(&existing);
        let mut rewriter = Recorder(Vec::new());

        let outcome = resolver.relocate(&sheet, Placement::Relocatable, &BTreeSet::new(), &mut rewriter);
        assert_eq!(outcome.target, ws("T/Orders_2"));
        assert!(outcome.auto_renamed);
    }

    #[test]
    fn exhausted_suffixes_are_a_relocation_failure() {
        let sheet = AssetRecord::new(ws("Sales/Orders"), "orders.xml");
        let existing: HashSet<AssetIdentity> =
            [ws("T/Orders"), ws("T/Orders_1")].into_iter().collect();
        let config = ImportConfig {
            max_rename_suffix: 1,
            ..ImportConfig::into_folder("T")
        };
        let mut resolver =
            FolderRelocationResolver::new(&config, [&sheet.identity]).with_catalog(&existing);
        let mut rewriter = Recorder(Vec::new());

        let outcome = resolver.relocate(&sheet, Placement::Relocatable, &BTreeSet::new(), &mut rewriter);
        assert_eq!(outcome.target, sheet.identity);
        assert_eq!(resolver.into_parts().1[0].kind, WarningKind::RelocationFailed);
    }

    #[test]
    fn reserved_identities_push_relocated_assets_aside() {
        let kept = AssetRecord::new(ws("T/Orders"), "kept.xml");
        let moved = AssetRecord::new(ws("Orders"), "moved.xml");
        let config = ImportConfig::into_folder("T");
        let ids = [moved.identity.clone(), kept.identity.clone()];
        let mut resolver = FolderRelocationResolver::new(&config, &ids);
        resolver.reserve([
            (&moved.identity, Placement::Relocatable),
            (&kept.identity, Placement::Default),
        ]);
        let mut rewriter = Recorder(Vec::new());

        let first = resolver.relocate(&moved, Placement::Relocatable, &BTreeSet::new(), &mut rewriter);
        let second = resolver.relocate(&kept, Placement::Default, &BTreeSet::new(), &mut rewriter);

        assert_eq!(first.target, ws("T/Orders_1"));
        assert!(first.auto_renamed);
        assert_eq!(second.target, kept.identity);
    }

    #[test]
    fn models_move_only_with_their_data_source() {
        let source = AssetRecord::new(AssetIdentity::new(AssetKind::DataSource, "db/DS1"), "ds.xml");
        let model = AssetRecord::new(
            AssetIdentity::new(AssetKind::LogicalModel, "db/DS1/Sales"),
            "model.xml",
        );
        let stray = AssetRecord::new(
            AssetIdentity::new(AssetKind::LogicalModel, "db/Other/Sales"),
            "stray.xml",
        );
        let config = ImportConfig::into_folder("Imported");
        let ids = [source.identity.clone(), model.identity.clone(), stray.identity.clone()];
        let mut resolver = FolderRelocationResolver::new(&config, &ids);
        resolver.reserve(ids.iter().map(|id| (id, Placement::Relocatable)));
        let mut rewriter = Recorder(Vec::new());

        resolver.relocate(&source, Placement::Relocatable, &BTreeSet::new(), &mut rewriter);
        let followed = resolver.relocate(&model, Placement::Relocatable, &BTreeSet::new(), &mut rewriter);
        let stayed = resolver.relocate(&stray, Placement::Relocatable, &BTreeSet::new(), &mut rewriter);

        assert_eq!(
            followed.target,
            AssetIdentity::new(AssetKind::LogicalModel, "Imported/DS1/Sales")
        );
        assert!(followed.relocated);
        assert_eq!(stayed.target, stray.identity);
        assert!(!stayed.relocated);
    }
}
