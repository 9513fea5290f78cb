//! Local data-protection agent
//!
//! Owns the data keys used to protect column values, the attributes bound to
//! each key, and a set of deny rules standing in for server-side policy.
//! Callers hold an `Agent` and lend it to a `ChunkCipher` for each scan.

use crate::attributes::KeyAttributes;
use crate::error::{Result, RowguardError};
use aes_gcm::aead::{KeyInit, OsRng};
use aes_gcm::Aes256Gcm;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

/// Deny rule: keys whose `attribute` carries any of `values` are withheld
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRule {
    pub attribute: String,
    pub values: Vec<String>,
}

impl AccessRule {
    pub fn deny(attribute: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            attribute: attribute.into(),
            values,
        }
    }

    fn denies(&self, attributes: &KeyAttributes) -> bool {
        attributes.matches_any(&self.attribute, &self.values)
    }
}

/// Public view of a registered key
#[derive(Debug, Clone)]
pub struct KeyInfo {
    pub key_id: String,
    pub attributes: KeyAttributes,
    pub created_at: DateTime<Utc>,
}

/// Key material released to a cipher for a single operation
pub struct KeyHandle {
    pub key_id: String,
    pub(crate) cipher: Aes256Gcm,
}

impl std::fmt::Debug for KeyHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyHandle")
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

struct KeyRecord {
    cipher: Aes256Gcm,
    attributes: KeyAttributes,
    created_at: DateTime<Utc>,
}

/// Key store and access gate
///
/// Interior locks allow sharing by reference; mutation goes through
/// `create_key`, `restrict`, and `lift`.
#[derive(Default)]
pub struct Agent {
    keys: RwLock<HashMap<String, KeyRecord>>,
    rules: RwLock<IndexMap<String, AccessRule>>,
}

impl Agent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a fresh AES-256-GCM key bound to `attributes`
    pub fn create_key(&self, attributes: &KeyAttributes) -> Result<KeyHandle> {
        let key = Aes256Gcm::generate_key(OsRng);
        let cipher = Aes256Gcm::new(&key);
        let key_id = uuid::Uuid::new_v4().simple().to_string();

        let mut keys = self.keys.write().map_err(|e| {
            RowguardError::Crypto(format!("Failed to acquire key lock: {}", e))
        })?;
        keys.insert(
            key_id.clone(),
            KeyRecord {
                cipher: cipher.clone(),
                attributes: attributes.clone(),
                created_at: Utc::now(),
            },
        );

        tracing::debug!(key_id = %key_id, attributes = attributes.len(), "Data key created");

        Ok(KeyHandle { key_id, cipher })
    }

    /// Release a key unless it is unknown or an access rule withholds it
    pub fn fetch_key(&self, key_id: &str) -> Result<KeyHandle> {
        let keys = self.keys.read().map_err(|e| {
            RowguardError::Crypto(format!("Failed to acquire key lock: {}", e))
        })?;
        let record = keys
            .get(key_id)
            .ok_or_else(|| RowguardError::KeyNotFound(key_id.to_string()))?;

        let rules = self.rules.read().map_err(|e| {
            RowguardError::Crypto(format!("Failed to acquire rule lock: {}", e))
        })?;
        if let Some((rule_id, _)) = rules.iter().find(|(_, rule)| rule.denies(&record.attributes)) {
            return Err(RowguardError::AccessDenied {
                key_id: key_id.to_string(),
                rule_id: rule_id.clone(),
            });
        }

        Ok(KeyHandle {
            key_id: key_id.to_string(),
            cipher: record.cipher.clone(),
        })
    }

    pub fn key_info(&self, key_id: &str) -> Option<KeyInfo> {
        let keys = self.keys.read().ok()?;
        keys.get(key_id).map(|record| KeyInfo {
            key_id: key_id.to_string(),
            attributes: record.attributes.clone(),
            created_at: record.created_at,
        })
    }

    pub fn key_count(&self) -> usize {
        self.keys.read().map(|keys| keys.len()).unwrap_or_default()
    }

    /// Install a deny rule, returning its id
    pub fn restrict(&self, rule: AccessRule) -> Result<String> {
        let rule_id = format!("rule-{}", uuid::Uuid::new_v4());
        let mut rules = self.rules.write().map_err(|e| {
            RowguardError::Crypto(format!("Failed to acquire rule lock: {}", e))
        })?;

        tracing::info!(
            rule_id = %rule_id,
            attribute = %rule.attribute,
            values = ?rule.values,
            "Access rule added"
        );
        rules.insert(rule_id.clone(), rule);
        Ok(rule_id)
    }

    /// Remove a deny rule; returns false if it was not installed
    pub fn lift(&self, rule_id: &str) -> Result<bool> {
        let mut rules = self.rules.write().map_err(|e| {
            RowguardError::Crypto(format!("Failed to acquire rule lock: {}", e))
        })?;
        let removed = rules.shift_remove(rule_id).is_some();
        if removed {
            tracing::info!(rule_id = %rule_id, "Access rule lifted");
        }
        Ok(removed)
    }

    pub fn rule_ids(&self) -> Vec<String> {
        self.rules
            .read()
            .map(|rules| rules.keys().cloned().collect())
            .unwrap_or_default()
    }
}
