//! # Deploy Import
//!
//! Plans the import of an asset bundle into a repository: which asset goes
//! first, which ones are deferred to break dependency cycles, and where each
//! one lands when the bundle is moved to another folder or owner.
//!
//! ## Architecture
//!
//! ```text
//! BundleManifest ──> AssetRecords
//!     │
//!     ├──> DependencyCollector
//!     │      ├─ Declared dependencies
//!     │      ├─ AssetIntrospector (content scan)
//!     │      └─ Extended model -> base model
//!     │
//!     ├──> TopologicalOrderer (deploy-graph)
//!     │      └─ Cycle breaking by ImportConfig::sacrifice_priority
//!     │
//!     └──> FolderRelocationResolver
//!            ├─ Strip the bundle's common folder, prepend the target
//!            ├─ Swap owners, number colliding names
//!            └─ ContentRewriter for references to renamed dependencies
//! ```
//!
//! [`ImportSession`] runs the three stages and returns an
//! [`ImportPlan`](deploy_protocol::ImportPlan).

mod collector;
mod config;
mod error;
mod manifest;
mod record;
mod relocate;
mod session;
mod text;

pub use collector::{CollectedDependencies, DependencyCollector, DiscoveryFailure};
pub use config::ImportConfig;
pub use error::{ImportError, Result};
pub use manifest::{BundleManifest, ManifestEntry};
pub use record::{AssetCatalog, AssetIntrospector, AssetRecord, ContentRewriter, DeclaredOnly};
pub use relocate::{FolderRelocationResolver, Placement, Relocated};
pub use session::ImportSession;
pub use text::{Rewrite, TextIntrospector, TextRewriter};
