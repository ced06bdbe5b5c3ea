//! Change detection via content fingerprinting.
//!
//! The fetched record set is serialized to canonical JSON (sorted field
//! keys within each row, rows in fetch order) and hashed with SHA-256.
//! The hex digest is compared against the one stored by the previous run
//! to decide whether anything downstream needs to happen at all.

use crate::models::RawRecord;
use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Compute the fingerprint of a fetched record set.
///
/// Field-order permutations within a row do not change the digest
/// (`RawRecord` is a `BTreeMap`, so keys serialize sorted); row-order
/// permutations do, since rows are serialized in fetch order.
pub fn fingerprint(records: &[RawRecord]) -> String {
    // serde_json cannot fail on a map of already-valid JSON values.
    let canonical = serde_json::to_string(records).unwrap_or_default();
    let digest = Sha256::digest(canonical.as_bytes());
    hex::encode(digest)
}

/// Decide whether the pipeline should run.
///
/// Proceed unless the stored fingerprint exists and matches the current
/// one; a missing or empty stored value means "never run".
pub fn should_proceed(previous: Option<&str>, current: &str) -> bool {
    match previous {
        Some(prev) if !prev.is_empty() => prev != current,
        _ => true,
    }
}

/// File-backed store for the last-seen fingerprint.
///
/// A missing file means "never run": the pipeline always proceeds.
pub struct FingerprintStore {
    path: PathBuf,
}

impl FingerprintStore {
    /// Create a store backed by the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the previously stored fingerprint, if any.
    pub fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            debug!("No fingerprint file at {}", self.path.display());
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read fingerprint file: {}", self.path.display()))?;

        Ok(Some(content.trim().to_string()))
    }

    /// Persist a fingerprint, replacing any previous value.
    pub fn save(&self, value: &str) -> Result<()> {
        std::fs::write(&self.path, value)
            .with_context(|| format!("Failed to write fingerprint file: {}", self.path.display()))?;
        debug!("Stored fingerprint {} at {}", value, self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn row(pairs: &[(&str, serde_json::Value)]) -> RawRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_fingerprint_deterministic() {
        let records = vec![
            row(&[("Name", json!("A")), ("ARR Total", json!(5000))]),
            row(&[("Name", json!("B")), ("ARR Total", json!(30000))]),
        ];
        assert_eq!(fingerprint(&records), fingerprint(&records));
    }

    #[test]
    fn test_fingerprint_field_order_invariant() {
        // BTreeMap construction order differs; serialized order must not.
        let a = row(&[("Name", json!("A")), ("ARR Total", json!(5000))]);
        let mut b = BTreeMap::new();
        b.insert("ARR Total".to_string(), json!(5000));
        b.insert("Name".to_string(), json!("A"));

        assert_eq!(fingerprint(&[a]), fingerprint(&[b]));
    }

    #[test]
    fn test_fingerprint_row_order_sensitive() {
        let a = row(&[("Name", json!("A"))]);
        let b = row(&[("Name", json!("B"))]);

        let forward = fingerprint(&[a.clone(), b.clone()]);
        let reversed = fingerprint(&[b, a]);
        assert_ne!(forward, reversed);
    }

    #[test]
    fn test_fingerprint_value_sensitive() {
        let a = vec![row(&[("ARR Total", json!(5000))])];
        let b = vec![row(&[("ARR Total", json!(5001))])];
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_should_proceed() {
        assert!(should_proceed(None, "abc"));
        assert!(should_proceed(Some(""), "abc"));
        assert!(should_proceed(Some("def"), "abc"));
        assert!(!should_proceed(Some("abc"), "abc"));
    }

    #[test]
    fn test_store_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FingerprintStore::new(dir.path().join("fp.txt"));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FingerprintStore::new(dir.path().join("fp.txt"));

        store.save("abc123").unwrap();
        assert_eq!(store.load().unwrap(), Some("abc123".to_string()));

        store.save("def456").unwrap();
        assert_eq!(store.load().unwrap(), Some("def456".to_string()));
    }

    #[test]
    fn test_store_trims_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fp.txt");
        std::fs::write(&path, "abc123\n").unwrap();

        let store = FingerprintStore::new(path);
        assert_eq!(store.load().unwrap(), Some("abc123".to_string()));
    }
}
