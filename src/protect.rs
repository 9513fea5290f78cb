//! Protect-on-insert
//!
//! Mirror image of the decrypt filter: encrypts the protected columns of a
//! record before it is written, tagging each value's key with the column's
//! configured attributes plus any per-record attributes.

use crate::agent::Agent;
use crate::attributes::KeyAttributes;
use crate::crypto::ChunkCipher;
use crate::error::{Result, RowguardError};
use crate::filter::ProtectedColumns;
use indexmap::IndexMap;

/// Encrypts protected columns of outgoing records
pub struct RowProtector<'a> {
    cipher: ChunkCipher<'a>,
    columns: &'a ProtectedColumns,
    column_attributes: &'a IndexMap<String, KeyAttributes>,
}

impl<'a> RowProtector<'a> {
    pub fn new(
        agent: &'a Agent,
        columns: &'a ProtectedColumns,
        column_attributes: &'a IndexMap<String, KeyAttributes>,
    ) -> Self {
        Self {
            cipher: ChunkCipher::new(agent),
            columns,
            column_attributes,
        }
    }

    /// Return `values` with every non-null protected cell encrypted
    ///
    /// `extra` is merged over the column attributes for each key, so a
    /// record-level tag such as `department` applies to all its columns.
    pub fn protect(
        &self,
        names: &[&str],
        values: &[Option<&str>],
        extra: &KeyAttributes,
    ) -> Result<Vec<Option<String>>> {
        if names.len() != values.len() {
            return Err(RowguardError::Record(format!(
                "{} column names but {} values",
                names.len(),
                values.len()
            )));
        }

        names
            .iter()
            .zip(values)
            .map(|(name, value)| match *value {
                Some(text) if self.columns.contains(name) => {
                    let mut attributes =
                        self.column_attributes.get(*name).cloned().unwrap_or_default();
                    attributes.merge(extra);
                    self.cipher.encrypt(text, &attributes).map(Some)
                }
                other => Ok(other.map(str::to_string)),
            })
            .collect()
    }
}
