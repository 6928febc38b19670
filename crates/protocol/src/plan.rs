use crate::identity::AssetIdentity;
use crate::rename::RenameMapping;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// One asset of the bundle, in the order it must be imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PlannedImport {
    #[schemars(with = "String")]
    pub original: AssetIdentity,

    /// Identity the asset is written under
    #[schemars(with = "String")]
    pub target: AssetIdentity,

    /// Backing content file
    pub source: PathBuf,

    /// Forced out of a dependency cycle; imported after every resolved asset
    pub cycle_broken: bool,

    pub relocated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    MalformedIdentifier,
    DiscoveryFailed,
    RelocationFailed,
    RewriteFailed,
}

/// Recoverable problem that did not stop the import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ImportWarning {
    pub kind: WarningKind,

    /// Identifier of the affected asset, as written in the bundle
    pub asset: Option<String>,

    pub message: String,
}

impl ImportWarning {
    pub fn new(kind: WarningKind, asset: Option<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            asset,
            message: message.into(),
        }
    }

    pub fn for_asset(kind: WarningKind, asset: &AssetIdentity, message: impl Into<String>) -> Self {
        Self::new(kind, Some(asset.to_string()), message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ImportStats {
    pub assets: usize,
    /// Dependencies outside the bundle (already in the target repository)
    pub external_dependencies: usize,
    pub edges: usize,
    pub cycle_broken: usize,
    pub relocated: usize,
    pub auto_renamed: usize,
    pub warnings: usize,
}

/// Result of planning one bundle import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ImportPlan {
    pub steps: Vec<PlannedImport>,

    #[schemars(with = "BTreeMap<String, String>")]
    pub renames: RenameMapping,

    pub warnings: Vec<ImportWarning>,

    pub stats: ImportStats,
}

impl ImportPlan {
    pub fn step(&self, original: &AssetIdentity) -> Option<&PlannedImport> {
        self.steps.iter().find(|step| &step.original == original)
    }

    pub fn position(&self, original: &AssetIdentity) -> Option<usize> {
        self.steps.iter().position(|step| &step.original == original)
    }

    pub fn target_of(&self, original: &AssetIdentity) -> Option<&AssetIdentity> {
        self.step(original).map(|step| &step.target)
    }

    pub fn cycle_broken(&self) -> impl Iterator<Item = &PlannedImport> {
        self.steps.iter().filter(|step| step.cycle_broken)
    }

    pub fn warnings_of(&self, kind: WarningKind) -> impl Iterator<Item = &ImportWarning> {
        self.warnings.iter().filter(move |w| w.kind == kind)
    }
}

/// JSON schema of [`ImportPlan`], for tooling that consumes plans.
pub fn plan_schema() -> serde_json::Result<serde_json::Value> {
    serde_json::to_value(schemars::schema_for!(ImportPlan))
}
