//! Shared vocabulary of bundle deployment: asset kinds, identities, renames
//! and the import plan handed back to the deploy service.

mod identity;
mod kind;
mod plan;
mod rename;

pub use identity::{AssetIdentity, MalformedIdentifier, FIELD_SEPARATOR, NULL_OWNER};
pub use kind::{AssetKind, Namespace, Relocation};
pub use plan::{plan_schema, ImportPlan, ImportStats, ImportWarning, PlannedImport, WarningKind};
pub use rename::{AlreadyMapped, RenameMapping};
