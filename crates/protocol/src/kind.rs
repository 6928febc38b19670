use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Every deployable asset type the importer understands.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Worksheet,
    Viewsheet,
    Dashboard,
    ScheduleTask,
    DataSource,
    Query,
    /// Physical model of a data source
    Partition,
    ExtendedPartition,
    LogicalModel,
    ExtendedLogicalModel,
    /// Virtual private model (row/column security rules of a data source)
    Vpm,
    Script,
    TableStyle,
}

/// How an asset can be moved when a bundle is imported into another folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Relocation {
    /// Path is a folder path that can be re-rooted under the target folder
    Folder,
    /// Identity is pinned (derived from a parent data source or a user name)
    Fixed,
}

/// Separate path trees of the repository; prefixes are never shared across them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
    Repository,
    DataSpace,
    Library,
}

impl AssetKind {
    pub const ALL: [AssetKind; 13] = [
        AssetKind::Worksheet,
        AssetKind::Viewsheet,
        AssetKind::Dashboard,
        AssetKind::ScheduleTask,
        AssetKind::DataSource,
        AssetKind::Query,
        AssetKind::Partition,
        AssetKind::ExtendedPartition,
        AssetKind::LogicalModel,
        AssetKind::ExtendedLogicalModel,
        AssetKind::Vpm,
        AssetKind::Script,
        AssetKind::TableStyle,
    ];

    /// Class-name token used in flat identifier strings.
    pub fn type_name(self) -> &'static str {
        match self {
            AssetKind::Worksheet => "WorksheetAsset",
            AssetKind::Viewsheet => "ViewsheetAsset",
            AssetKind::Dashboard => "DashboardAsset",
            AssetKind::ScheduleTask => "ScheduleTaskAsset",
            AssetKind::DataSource => "XDataSourceAsset",
            AssetKind::Query => "XQueryAsset",
            AssetKind::Partition => "XPartitionAsset",
            AssetKind::ExtendedPartition => "XExtendedPartitionAsset",
            AssetKind::LogicalModel => "XLogicalModelAsset",
            AssetKind::ExtendedLogicalModel => "XExtendedLogicalModelAsset",
            AssetKind::Vpm => "VirtualPrivateModelAsset",
            AssetKind::Script => "ScriptAsset",
            AssetKind::TableStyle => "TableStyleAsset",
        }
    }

    /// Resolve a bare or package-qualified class name.
    pub fn from_type_name(name: &str) -> Option<Self> {
        let simple = name.rsplit('.').next().unwrap_or(name);
        Self::ALL.into_iter().find(|kind| kind.type_name() == simple)
    }

    pub fn relocation(self) -> Relocation {
        match self {
            AssetKind::Worksheet
            | AssetKind::Viewsheet
            | AssetKind::Query
            | AssetKind::DataSource
            | AssetKind::Script
            | AssetKind::TableStyle => Relocation::Folder,
            AssetKind::Dashboard
            | AssetKind::ScheduleTask
            | AssetKind::Partition
            | AssetKind::ExtendedPartition
            | AssetKind::LogicalModel
            | AssetKind::ExtendedLogicalModel
            | AssetKind::Vpm => Relocation::Fixed,
        }
    }

    pub fn namespace(self) -> Namespace {
        match self {
            AssetKind::Worksheet
            | AssetKind::Viewsheet
            | AssetKind::Dashboard
            | AssetKind::ScheduleTask => Namespace::Repository,
            AssetKind::DataSource
            | AssetKind::Query
            | AssetKind::Partition
            | AssetKind::ExtendedPartition
            | AssetKind::LogicalModel
            | AssetKind::ExtendedLogicalModel
            | AssetKind::Vpm => Namespace::DataSpace,
            AssetKind::Script | AssetKind::TableStyle => Namespace::Library,
        }
    }

    /// Number of trailing path segments that name the model below its data source.
    pub fn model_depth(self) -> Option<usize> {
        match self {
            AssetKind::Partition | AssetKind::LogicalModel | AssetKind::Vpm => Some(1),
            AssetKind::ExtendedPartition | AssetKind::ExtendedLogicalModel => Some(2),
            _ => None,
        }
    }

    pub fn is_extended(self) -> bool {
        self.base_kind().is_some()
    }

    pub fn base_kind(self) -> Option<Self> {
        match self {
            AssetKind::ExtendedPartition => Some(AssetKind::Partition),
            AssetKind::ExtendedLogicalModel => Some(AssetKind::LogicalModel),
            _ => None,
        }
    }

    /// Sheet-level assets assembled from other assets.
    pub fn is_composite(self) -> bool {
        matches!(
            self,
            AssetKind::Worksheet | AssetKind::Viewsheet | AssetKind::ScheduleTask
        )
    }

    /// Label written to the audit trail for this kind.
    pub fn audit_type(self) -> &'static str {
        match self {
            AssetKind::Worksheet => "worksheet",
            AssetKind::Viewsheet => "dashboard",
            AssetKind::Dashboard => "portal dashboard",
            AssetKind::ScheduleTask => "task",
            AssetKind::DataSource => "data source",
            AssetKind::Query => "query",
            AssetKind::Partition | AssetKind::ExtendedPartition => "physical model",
            AssetKind::LogicalModel | AssetKind::ExtendedLogicalModel => "logical model",
            AssetKind::Vpm => "vpm",
            AssetKind::Script => "script",
            AssetKind::TableStyle => "table style",
        }
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name())
    }
}
