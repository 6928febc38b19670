use crate::kind::AssetKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Field separator of flat identifier strings.
pub const FIELD_SEPARATOR: char = '^';

/// Owner placeholder the storage layer writes for global assets.
pub const NULL_OWNER: &str = "__NULL__";

/// Typed path (plus optional owner) of one deployable asset.
///
/// Equality, ordering and hashing cover all three fields. Serialized as the
/// flat identifier string, e.g. `WorksheetAsset^Sales/Orders^alice`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct AssetIdentity {
    kind: AssetKind,
    path: String,
    owner: Option<String>,
}

impl AssetIdentity {
    /// Global asset at `path`. The path must not contain `^`.
    pub fn new(kind: AssetKind, path: impl Into<String>) -> Self {
        let path = path.into();
        debug_assert!(!path.contains(FIELD_SEPARATOR), "separator in path {path:?}");
        Self {
            kind,
            path,
            owner: None,
        }
    }

    /// User-scoped asset. An empty or `__NULL__` owner yields a global asset.
    pub fn owned(kind: AssetKind, path: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            owner: normalize_owner(Some(owner.into())),
            ..Self::new(kind, path)
        }
    }

    /// Parse `Type^path` or `Type^path^owner`.
    ///
    /// Returns `None` for unknown type names, an empty path, extra fields, or a
    /// model path without enough segments to name its data source.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut fields = raw.split(FIELD_SEPARATOR);
        let kind = AssetKind::from_type_name(fields.next()?.trim())?;
        let path = fields.next()?;
        let owner = fields.next();

        if fields.next().is_some() || path.is_empty() {
            return None;
        }
        if let Some(depth) = kind.model_depth() {
            if path.split('/').count() <= depth {
                return None;
            }
        }

        let owner = normalize_owner(owner.map(str::to_string));

        Some(Self {
            kind,
            path: path.to_string(),
            owner,
        })
    }

    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// Last path segment.
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    pub fn parent_folder(&self) -> Option<&str> {
        self.path.rsplit_once('/').map(|(parent, _)| parent)
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('/')
    }

    /// Data source a model-level asset belongs to.
    pub fn data_source(&self) -> Option<AssetIdentity> {
        let depth = self.kind.model_depth()?;
        let segments: Vec<&str> = self.segments().collect();
        let keep = segments.len().checked_sub(depth).filter(|n| *n > 0)?;
        Some(AssetIdentity::new(
            AssetKind::DataSource,
            segments[..keep].join("/"),
        ))
    }

    /// Base model an extended model is layered on.
    pub fn base(&self) -> Option<AssetIdentity> {
        let base_kind = self.kind.base_kind()?;
        let (parent, _) = self.path.rsplit_once('/')?;
        Some(Self {
            kind: base_kind,
            path: parent.to_string(),
            owner: self.owner.clone(),
        })
    }

    pub fn with_path(&self, path: impl Into<String>) -> Self {
        Self {
            owner: self.owner.clone(),
            ..Self::new(self.kind, path)
        }
    }

    pub fn with_owner(&self, owner: Option<String>) -> Self {
        Self {
            kind: self.kind,
            path: self.path.clone(),
            owner: normalize_owner(owner),
        }
    }
}

fn normalize_owner(owner: Option<String>) -> Option<String> {
    owner.filter(|o| !o.is_empty() && o != NULL_OWNER)
}

impl fmt::Display for AssetIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.kind.type_name(), FIELD_SEPARATOR, self.path)?;
        if let Some(owner) = &self.owner {
            write!(f, "{FIELD_SEPARATOR}{owner}")?;
        }
        Ok(())
    }
}

impl From<AssetIdentity> for String {
    fn from(identity: AssetIdentity) -> Self {
        identity.to_string()
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Malformed asset identifier: {0}")]
pub struct MalformedIdentifier(pub String);

impl TryFrom<String> for AssetIdentity {
    type Error = MalformedIdentifier;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        AssetIdentity::parse(&raw).ok_or(MalformedIdentifier(raw))
    }
}

impl std::str::FromStr for AssetIdentity {
    type Err = MalformedIdentifier;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        AssetIdentity::parse(raw).ok_or_else(|| MalformedIdentifier(raw.to_string()))
    }
}
