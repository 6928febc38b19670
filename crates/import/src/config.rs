use deploy_protocol::{AssetKind, FIELD_SEPARATOR};
use serde::{Deserialize, Serialize};

/// Configuration of one bundle import
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Folder the bundle is re-rooted under (`None` keeps original folders,
    /// `""` or `"/"` re-roots at the top level)
    pub target_folder: Option<String>,

    /// New owner for user-scoped assets (moving a bundle to another user or
    /// organization)
    pub target_owner: Option<String>,

    /// Kinds that may be deferred to break a dependency cycle, most preferred
    /// first. Only composite kinds are allowed.
    pub sacrifice_priority: Vec<AssetKind>,

    /// Highest `_N` suffix tried when a relocated identity is already taken
    pub max_rename_suffix: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            target_folder: None,
            target_owner: None,
            sacrifice_priority: vec![
                AssetKind::Viewsheet,
                AssetKind::Worksheet,
                AssetKind::ScheduleTask,
            ],
            max_rename_suffix: 999,
        }
    }
}

impl ImportConfig {
    /// Keep every asset where the bundle says it lives
    pub fn in_place() -> Self {
        Self::default()
    }

    /// Re-root every relocatable asset under `folder`
    pub fn into_folder(folder: impl Into<String>) -> Self {
        Self {
            target_folder: Some(folder.into()),
            ..Default::default()
        }
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.target_owner = Some(owner.into());
        self
    }

    /// True if any identity may change
    pub fn relocates(&self) -> bool {
        self.target_folder.is_some() || self.target_owner.is_some()
    }

    /// Target folder split into segments; empty for the top level.
    pub fn target_segments(&self) -> Option<Vec<&str>> {
        self.target_folder.as_deref().map(|folder| {
            folder
                .trim_matches('/')
                .split('/')
                .filter(|segment| !segment.is_empty())
                .collect()
        })
    }

    /// Rank of `kind` when choosing a node to defer, `None` if never deferred
    pub fn sacrifice_rank(&self, kind: AssetKind) -> Option<usize> {
        self.sacrifice_priority.iter().position(|k| *k == kind)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if let Some(folder) = &self.target_folder {
            if folder.contains(FIELD_SEPARATOR) {
                return Err(format!(
                    "target_folder ({folder}) cannot contain '{FIELD_SEPARATOR}'"
                ));
            }
            if folder.trim_matches('/').contains("//") {
                return Err(format!("target_folder ({folder}) has an empty segment"));
            }
        }

        if let Some(owner) = &self.target_owner {
            if owner.is_empty() || owner.contains(FIELD_SEPARATOR) {
                return Err(format!("target_owner ({owner:?}) is not a valid owner name"));
            }
        }

        if let Some(kind) = self.sacrifice_priority.iter().find(|k| !k.is_composite()) {
            return Err(format!(
                "sacrifice_priority may only list worksheets, viewsheets and schedule tasks, got {kind:?}"
            ));
        }

        if self.max_rename_suffix == 0 {
            return Err("max_rename_suffix must be > 0".to_string());
        }

        Ok(())
    }
}
