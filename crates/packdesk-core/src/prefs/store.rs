use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::models::DeliveryOrderDefaults;

/// Well-known record name for the remembered order-form defaults.
pub const DELIVERY_ORDER_DEFAULTS: &str = "deliveryOrderDefaults";

/// Profile used when none is configured. Every operator on the machine
/// shares it.
pub const DEFAULT_PROFILE: &str = "default";

pub struct PreferenceStore {
    dir: PathBuf,
}

impl PreferenceStore {
    /// Store rooted directly at `dir`.
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Store for `profile` under `base_dir`. Each profile name maps to its
    /// own directory.
    pub fn for_profile(base_dir: &Path, profile: &str) -> Self {
        Self::new(base_dir.join("profiles").join(sanitize_profile(profile)))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }

    /// Load a record. Missing, unreadable or unparsable records are `None`.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let path = self.record_path(name);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(record = name, error = %e, "Failed to read preference record");
                return None;
            }
        };

        match serde_json::from_str(&contents) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(record = name, error = %e, "Ignoring corrupt preference record");
                None
            }
        }
    }

    /// Replace a record. Written to a temporary file first so a crash never
    /// leaves a half-written record behind.
    pub fn set<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create preference directory {}", self.dir.display()))?;

        let path = self.record_path(name);
        let tmp = path.with_extension("json.tmp");
        let contents = serde_json::to_string_pretty(value)?;
        std::fs::write(&tmp, contents).with_context(|| format!("Failed to write preference record: {}", name))?;
        std::fs::rename(&tmp, &path).with_context(|| format!("Failed to replace preference record: {}", name))?;
        debug!(record = name, "Saved preference record");
        Ok(())
    }

    /// Delete a record. Deleting a missing record succeeds.
    pub fn delete(&self, name: &str) -> Result<()> {
        match std::fs::remove_file(self.record_path(name)) {
            Ok(()) => {
                debug!(record = name, "Deleted preference record");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to delete preference record: {}", name)),
        }
    }

    // ===== Delivery order defaults =====

    pub fn delivery_order_defaults(&self) -> Option<DeliveryOrderDefaults> {
        self.get(DELIVERY_ORDER_DEFAULTS)
    }

    pub fn save_delivery_order_defaults(&self, defaults: &DeliveryOrderDefaults) -> Result<()> {
        self.set(DELIVERY_ORDER_DEFAULTS, defaults)
    }

    pub fn clear_delivery_order_defaults(&self) -> Result<()> {
        self.delete(DELIVERY_ORDER_DEFAULTS)
    }
}

/// Directory name for `profile`. Lowercase letters, digits and `-` are kept;
/// every other byte becomes `_` plus two hex digits, so distinct names never
/// share a directory, even on case-insensitive filesystems.
fn sanitize_profile(profile: &str) -> String {
    if profile.trim().is_empty() {
        return DEFAULT_PROFILE.to_string();
    }
    let mut encoded = String::with_capacity(profile.len());
    for byte in profile.bytes() {
        match byte {
            b'a'..=b'z' | b'0'..=b'9' | b'-' => encoded.push(byte as char),
            _ => encoded.push_str(&format!("_{:02X}", byte)),
        }
    }
    encoded
}
