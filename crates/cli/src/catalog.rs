use anyhow::{Context, Result};
use deploy_protocol::AssetIdentity;
use std::collections::BTreeSet;
use std::path::Path;

/// Read identifiers already present in the target repository, one per line.
/// Blank lines and `#` comments are ignored; malformed lines are skipped.
pub(crate) fn load_existing(path: &Path) -> Result<BTreeSet<AssetIdentity>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read existing identifiers {}", path.display()))?;
    Ok(parse_existing(&raw))
}

fn parse_existing(raw: &str) -> BTreeSet<AssetIdentity> {
    let mut existing = BTreeSet::new();
    for (line_no, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match AssetIdentity::parse(line) {
            Some(id) => {
                existing.insert(id);
            }
            None => log::warn!("Ignoring malformed identifier on line {}: {line}", line_no + 1),
        }
    }
    log::debug!("Loaded {} existing identifiers", existing.len());
    existing
}
