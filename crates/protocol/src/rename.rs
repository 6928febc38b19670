use crate::identity::AssetIdentity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("{old} is already mapped to {existing}")]
pub struct AlreadyMapped {
    pub old: AssetIdentity,
    pub existing: AssetIdentity,
}

/// Old → new identities assigned during one import session.
///
/// Append-only: every identity is mapped at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RenameMapping {
    entries: BTreeMap<AssetIdentity, AssetIdentity>,
}

impl RenameMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a rename. Returns `Ok(false)` when `old == new` (nothing to record).
    pub fn record(&mut self, old: AssetIdentity, new: AssetIdentity) -> Result<bool, AlreadyMapped> {
        if let Some(existing) = self.entries.get(&old) {
            return Err(AlreadyMapped {
                old,
                existing: existing.clone(),
            });
        }
        if old == new {
            return Ok(false);
        }
        self.entries.insert(old, new);
        Ok(true)
    }

    pub fn get(&self, old: &AssetIdentity) -> Option<&AssetIdentity> {
        self.entries.get(old)
    }

    /// Current identity of `id`: its new identity if renamed, else itself.
    pub fn resolve<'a>(&'a self, id: &'a AssetIdentity) -> &'a AssetIdentity {
        self.entries.get(id).unwrap_or(id)
    }

    /// Renames restricted to `ids`, for rewriting one asset's references.
    pub fn subset<'a>(
        &self,
        ids: impl IntoIterator<Item = &'a AssetIdentity>,
    ) -> BTreeMap<AssetIdentity, AssetIdentity> {
        ids.into_iter()
            .filter_map(|id| self.entries.get(id).map(|new| (id.clone(), new.clone())))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AssetIdentity, &AssetIdentity)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
