//! Content-addressed cache for processed file blobs.
//!
//! Disk layout: `<repo>/.lg-cache/processed/<aa>/<bb>/<sha1>.json`. The key
//! is a SHA-1 over canonical (sorted-key) JSON of the file identity, the
//! adapter identity, and the tool version. Cache failures never propagate:
//! a failed read is a miss, a failed write is a no-op.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use chrono::Utc;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha1::{Digest, Sha1};

const CACHE_DIR: &str = ".lg-cache";
const PROCESSED_DIR: &str = "processed";

/// A cached adapter result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessedBlob {
    pub v: u32,
    /// Hex SHA-1 of the cache key payload.
    pub key: String,
    pub processed_text: String,
    #[serde(default)]
    pub meta: BTreeMap<String, Value>,
    pub created_at: String,
    pub updated_at: String,
}

/// File-backed cache rooted at the repository.
pub struct Cache {
    enabled: bool,
    fresh: bool,
    dir: PathBuf,
}

fn truthy(s: &str) -> bool {
    !matches!(
        s.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off" | ""
    )
}

impl Cache {
    /// `enabled` is the host's preference; the `LG_CACHE` environment
    /// variable overrides it. `fresh` bypasses reads while still writing.
    pub fn new(root: &Path, enabled: Option<bool>, fresh: bool) -> Self {
        let enabled = match std::env::var("LG_CACHE") {
            Ok(value) => truthy(&value),
            Err(_) => enabled.unwrap_or(true),
        };
        let dir = root.join(CACHE_DIR).join(PROCESSED_DIR);
        let enabled = if enabled {
            match fs::create_dir_all(&dir) {
                Ok(()) => true,
                Err(err) => {
                    warn!("cache disabled, cannot create {}: {}", dir.display(), err);
                    false
                }
            }
        } else {
            false
        };
        Self {
            enabled,
            fresh,
            dir,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Builds the cache key for one file/adapter pairing. Returns the hex
    /// hash and the on-disk entry path.
    ///
    /// The payload is canonical by construction: `serde_json` maps are
    /// sorted, so identical inputs always produce identical JSON bytes.
    pub fn build_key(
        &self,
        abs_path: &Path,
        adapter_name: &str,
        adapter_cfg: &Value,
        group_size: usize,
    ) -> (String, PathBuf) {
        let (mtime_ns, size) = match fs::metadata(abs_path) {
            Ok(meta) => {
                let mtime_ns = meta
                    .modified()
                    .ok()
                    .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                    .map(|d| d.as_nanos() as u64)
                    .unwrap_or(0);
                (mtime_ns, meta.len())
            }
            // the key must still come out so a later write can land
            Err(_) => (0, 0),
        };

        let payload = json!({
            "path": abs_path.to_string_lossy(),
            "mtime_ns": mtime_ns,
            "size": size,
            "adapter": adapter_name,
            "cfg": adapter_cfg,
            "group_size": group_size,
            "tool": env!("CARGO_PKG_VERSION"),
        });

        let mut hasher = Sha1::new();
        hasher.update(payload.to_string().as_bytes());
        let hash = hex::encode(hasher.finalize());
        let entry = self.entry_path(&hash);
        (hash, entry)
    }

    fn entry_path(&self, key_hash: &str) -> PathBuf {
        // two prefix levels keep directory fan-out bounded
        self.dir
            .join(&key_hash[..2])
            .join(&key_hash[2..4])
            .join(format!("{}.json", key_hash))
    }

    /// Loads a blob; any failure is a miss.
    pub fn get_processed(&self, entry: &Path) -> Option<ProcessedBlob> {
        if !self.enabled || self.fresh {
            return None;
        }
        let bytes = fs::read(entry).ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(blob) => Some(blob),
            Err(err) => {
                debug!("cache entry {} unreadable: {}", entry.display(), err);
                None
            }
        }
    }

    /// Stores a blob via a sibling `.tmp` file and atomic rename.
    pub fn put_processed(
        &self,
        key_hash: &str,
        entry: &Path,
        processed_text: &str,
        meta: &BTreeMap<String, Value>,
    ) {
        if !self.enabled {
            return;
        }
        let now = Utc::now().to_rfc3339();
        let blob = ProcessedBlob {
            v: 1,
            key: key_hash.to_string(),
            processed_text: processed_text.to_string(),
            meta: meta.clone(),
            created_at: now.clone(),
            updated_at: now,
        };
        if let Err(err) = self.try_write(entry, &blob) {
            warn!("cache write failed for {}: {}", entry.display(), err);
        }
    }

    fn try_write(&self, entry: &Path, blob: &ProcessedBlob) -> std::io::Result<()> {
        if let Some(parent) = entry.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = entry.with_extension("tmp");
        let data = serde_json::to_vec(blob)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        fs::write(&tmp, data)?;
        fs::rename(&tmp, entry)?;
        Ok(())
    }
}
