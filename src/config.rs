//! HCL configuration
//!
//! ```hcl
//! protected_columns = ["first", "last", "zip"]
//!
//! policy_service {
//!   url       = "https://api.example.com"
//!   tenant_id = "tenant-1"
//!   user      = "admin"
//!   password  = "secret"
//! }
//!
//! column "first" {
//!   attributes = { classification = ["pii"] }
//! }
//! ```

use std::collections::HashSet;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::attributes::KeyAttributes;
use crate::error::{Result, RowguardError};
use crate::filter::ProtectedColumns;
use crate::policy::{parse_base_url, PolicyServiceConfig};

#[derive(Debug, Deserialize)]
pub struct RowguardConfig {
    pub protected_columns: Vec<String>,
    #[serde(default)]
    pub policy_service: Option<PolicyServiceConfig>,
    #[serde(default)]
    pub column: IndexMap<String, ColumnDef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ColumnDef {
    #[serde(default)]
    pub attributes: KeyAttributes,
}

impl RowguardConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let src = std::fs::read_to_string(path)
            .map_err(|e| RowguardError::Config(format!("cannot read {}: {e}", path.display())))?;
        let cfg: RowguardConfig = hcl::from_str(&src)
            .map_err(|e| RowguardError::Config(format!("parse error in {}: {e}", path.display())))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn parse(src: &str) -> Result<Self> {
        let cfg: RowguardConfig = hcl::from_str(src)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.protected_columns.is_empty() {
            return Err(RowguardError::Config("protected_columns is empty".into()));
        }
        let mut seen = HashSet::new();
        for name in &self.protected_columns {
            if name.trim().is_empty() {
                return Err(RowguardError::Config("blank protected column name".into()));
            }
            if !seen.insert(name.as_str()) {
                return Err(RowguardError::Config(format!(
                    "protected column '{name}' listed twice"
                )));
            }
        }
        for name in self.column.keys() {
            if !seen.contains(name.as_str()) {
                return Err(RowguardError::Config(format!(
                    "column '{name}' has attributes but is not a protected column"
                )));
            }
        }
        if let Some(policy) = &self.policy_service {
            if policy.user.contains(':') {
                return Err(RowguardError::Config(
                    "policy_service user must not contain ':'".into(),
                ));
            }
            parse_base_url(&policy.url)?;
            if policy.tenant_id.is_empty() {
                return Err(RowguardError::Config("policy_service tenant_id is empty".into()));
            }
        }
        Ok(())
    }

    pub fn protected(&self) -> ProtectedColumns {
        ProtectedColumns::new(self.protected_columns.iter().cloned())
    }

    /// Per-column key attributes, keyed by column name
    pub fn column_attributes(&self) -> IndexMap<String, KeyAttributes> {
        self.column
            .iter()
            .map(|(name, def)| (name.clone(), def.attributes.clone()))
            .collect()
    }
}
