use crate::error::{ImportError, Result};
use crate::record::AssetRecord;
use deploy_protocol::{AssetIdentity, ImportWarning, WarningKind};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Table of contents of an uploaded asset bundle.
///
/// ```json
/// {
///   "assets": [
///     { "identifier": "WorksheetAsset^Sales/Orders", "file": "ws/orders.xml" },
///     { "identifier": "ViewsheetAsset^Sales/Board", "file": "vs/board.xml",
///       "dependencies": ["WorksheetAsset^Sales/Orders"] }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BundleManifest {
    #[serde(default)]
    pub assets: Vec<ManifestEntry>,

    /// Directory relative `file` entries resolve against
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub identifier: String,
    pub file: PathBuf,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl BundleManifest {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let mut manifest: BundleManifest = serde_json::from_str(&raw)
            .map_err(|err| ImportError::manifest(format!("{}: {err}", path.display())))?;
        manifest.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(manifest)
    }

    pub fn from_json(raw: &str, base_dir: impl Into<PathBuf>) -> Result<Self> {
        let mut manifest: BundleManifest =
            serde_json::from_str(raw).map_err(|err| ImportError::manifest(err.to_string()))?;
        manifest.base_dir = base_dir.into();
        Ok(manifest)
    }

    /// Parse every entry into a record. Malformed identifiers are skipped
    /// (the whole entry, or just the one dependency) with a warning.
    pub fn records(&self) -> (Vec<AssetRecord>, Vec<ImportWarning>) {
        let mut records = Vec::with_capacity(self.assets.len());
        let mut warnings = Vec::new();

        for entry in &self.assets {
            let Some(identity) = AssetIdentity::parse(&entry.identifier) else {
                log::warn!("Skipping bundle entry with malformed identifier {:?}", entry.identifier);
                warnings.push(ImportWarning::new(
                    WarningKind::MalformedIdentifier,
                    Some(entry.identifier.clone()),
                    "unrecognized asset identifier, entry skipped",
                ));
                continue;
            };

            let mut record = AssetRecord::new(identity, self.base_dir.join(&entry.file));
            for raw in &entry.dependencies {
                match AssetIdentity::parse(raw) {
                    Some(dependency) => {
                        record.dependencies.insert(dependency);
                    }
                    None => {
                        log::warn!("Ignoring malformed dependency {raw:?} of {}", record.identity);
                        warnings.push(ImportWarning::for_asset(
                            WarningKind::MalformedIdentifier,
                            &record.identity,
                            format!("unrecognized dependency identifier {raw:?} ignored"),
                        ));
                    }
                }
            }
            records.push(record);
        }

        (records, warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deploy_protocol::AssetKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_entries_and_resolves_files() {
        let manifest = BundleManifest::from_json(
            r#"{"assets": [
                {"identifier": "WorksheetAsset^Sales/Orders", "file": "ws/orders.xml"},
                {"identifier": "ViewsheetAsset^Sales/Board", "file": "vs/board.xml",
                 "dependencies": ["WorksheetAsset^Sales/Orders", "Bogus^x"]},
                {"identifier": "NotAnAsset^y", "file": "y.xml"}
            ]}"#,
            "/bundle",
        )
        .unwrap();

        let (records, warnings) = manifest.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].source, PathBuf::from("/bundle/ws/orders.xml"));
        assert_eq!(
            records[1].dependencies.iter().collect::<Vec<_>>(),
            vec![&AssetIdentity::new(AssetKind::Worksheet, "Sales/Orders")]
        );
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().all(|w| w.kind == WarningKind::MalformedIdentifier));
        assert_eq!(warnings[1].asset.as_deref(), Some("NotAnAsset^y"));
    }

    #[test]
    fn invalid_json_is_a_manifest_error() {
        let err = BundleManifest::from_json("{", ".").unwrap_err();
        assert!(matches!(err, ImportError::Manifest(_)));
    }
}
