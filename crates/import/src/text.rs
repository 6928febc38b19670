//! File-backed collaborators for bundles whose asset files embed references
//! as plain identifier strings (XML attributes, JSON values, ...).

use crate::record::{AssetIntrospector, AssetRecord, ContentRewriter};
use anyhow::Context;
use deploy_protocol::AssetIdentity;
use regex::{Captures, Regex};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Characters that may follow a reference. Spaces are allowed inside paths,
/// so they do not end one.
const REFERENCE_END: &str = r#"["'<>,;|\t\r\n]"#;

/// Regex matching any of `ids` as a whole reference.
///
/// The trailing delimiter keeps `Sales/Orders` from matching inside
/// `Sales/Orders/Archive`.
fn reference_pattern<'a>(
    ids: impl IntoIterator<Item = &'a AssetIdentity>,
) -> anyhow::Result<Option<Regex>> {
    let mut alternatives: Vec<String> = ids.into_iter().map(|id| id.to_string()).collect();
    if alternatives.is_empty() {
        return Ok(None);
    }
    alternatives.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    let alternatives: Vec<String> = alternatives.iter().map(|a| regex::escape(a)).collect();

    let pattern = format!(
        r"\b(?P<id>{})(?P<end>{REFERENCE_END}|$)",
        alternatives.join("|")
    );
    let regex = Regex::new(&pattern).context("building reference pattern")?;
    Ok(Some(regex))
}

fn read(record: &AssetRecord) -> anyhow::Result<String> {
    std::fs::read_to_string(&record.source)
        .with_context(|| format!("reading {}", record.source.display()))
}

/// Reports every other bundle asset whose identifier occurs in a record's
/// content.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextIntrospector;

impl AssetIntrospector for TextIntrospector {
    fn dependencies_of(
        &self,
        record: &AssetRecord,
        candidates: &[AssetRecord],
    ) -> anyhow::Result<BTreeSet<AssetIdentity>> {
        let content = read(record)?;
        let others: HashMap<String, &AssetIdentity> = candidates
            .iter()
            .map(|c| &c.identity)
            .filter(|id| *id != &record.identity)
            .map(|id| (id.to_string(), id))
            .collect();

        let Some(pattern) = reference_pattern(others.values().copied())? else {
            return Ok(BTreeSet::new());
        };

        Ok(pattern
            .captures_iter(&content)
            .filter_map(|caps| others.get(&caps["id"]).map(|id| (*id).clone()))
            .collect())
    }
}

/// One rewritten asset file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub asset: AssetIdentity,
    pub replacements: usize,
}

/// Replaces old identifiers with new ones in asset files, in a single pass
/// so that chained renames (`a -> b`, `b -> c`) never compound.
#[derive(Debug, Default)]
pub struct TextRewriter {
    dry_run: bool,
    rewrites: Vec<Rewrite>,
}

impl TextRewriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count replacements without touching any file.
    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            rewrites: Vec::new(),
        }
    }

    pub fn rewrites(&self) -> &[Rewrite] {
        &self.rewrites
    }
}

impl ContentRewriter for TextRewriter {
    fn rewrite_references(
        &mut self,
        record: &AssetRecord,
        renames: &BTreeMap<AssetIdentity, AssetIdentity>,
    ) -> anyhow::Result<()> {
        let Some(pattern) = reference_pattern(renames.keys())? else {
            return Ok(());
        };
        let replacements: HashMap<String, String> = renames
            .iter()
            .map(|(old, new)| (old.to_string(), new.to_string()))
            .collect();

        let content = read(record)?;
        let mut count = 0;
        let rewritten = pattern.replace_all(&content, |caps: &Captures<'_>| {
            count += 1;
            let id = &caps["id"];
            let new = replacements.get(id).map(String::as_str).unwrap_or(id);
            format!("{new}{}", &caps["end"])
        });

        if count > 0 && !self.dry_run {
            std::fs::write(&record.source, rewritten.as_bytes())
                .with_context(|| format!("writing {}", record.source.display()))?;
        }
        log::debug!("Rewrote {count} references in {}", record.identity);

        self.rewrites.push(Rewrite {
            asset: record.identity.clone(),
            replacements: count,
        });
        Ok(())
    }
}
