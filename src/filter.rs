//! Row decrypt filter
//!
//! Scans a cursor, decrypting protected columns as it goes. Cells that fail
//! to decrypt become [`RESTRICTED`]; a row is kept only if at least one of
//! its protected cells decrypted successfully. A row with no protected
//! cells at all is therefore dropped too.

use crate::agent::Agent;
use crate::crypto::{CellCipher, ChunkCipher};
use crate::cursor::RowCursor;
use crate::error::Result;
use crate::types::{cell_text, Row, RowSet, RESTRICTED};
use std::collections::HashSet;

/// Names of the columns that hold protected values at rest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtectedColumns(HashSet<String>);

impl ProtectedColumns {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(columns.into_iter().map(Into::into).collect())
    }

    /// Parse a pipe-delimited list such as `first|last|zip`
    pub fn parse_delimited(text: &str) -> Self {
        Self::new(text.split('|').map(str::trim).filter(|s| !s.is_empty()))
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.contains(column)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Per-scan counters, logged when a scan completes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub rows_read: usize,
    pub rows_kept: usize,
    pub cells_decrypted: usize,
    pub cells_restricted: usize,
}

/// Filter bound to an agent and a protected column set
pub struct RowDecryptFilter<'a> {
    agent: &'a Agent,
    columns: &'a ProtectedColumns,
}

impl<'a> RowDecryptFilter<'a> {
    pub fn new(agent: &'a Agent, columns: &'a ProtectedColumns) -> Self {
        Self { agent, columns }
    }

    /// Consume `cursor` and return the rows the caller may see
    pub fn handle(&self, cursor: &mut dyn RowCursor) -> Result<RowSet> {
        let cipher = ChunkCipher::new(self.agent);
        decrypt_rows(cursor, &cipher, self.columns).map(|(rows, _)| rows)
    }
}

/// Core scan, generic over the cipher
pub fn decrypt_rows<C: CellCipher + ?Sized>(
    cursor: &mut dyn RowCursor,
    cipher: &C,
    protected: &ProtectedColumns,
) -> Result<(RowSet, ScanStats)> {
    let column_count = cursor.column_count()?;
    let mut names = Vec::with_capacity(column_count);
    for ordinal in 1..=column_count {
        names.push(cursor.column_name(ordinal)?);
    }
    let is_protected: Vec<bool> = names.iter().map(|n| protected.contains(n)).collect();

    let mut rows = RowSet::new(names);
    let mut stats = ScanStats::default();

    while cursor.advance()? {
        stats.rows_read += 1;
        let mut protected_seen = 0usize;
        let mut decrypted_ok = 0usize;
        let mut cells = Vec::with_capacity(column_count);

        for (index, &guarded) in is_protected.iter().enumerate() {
            let text = cell_text(&cursor.value(index + 1)?);
            let cell = match text {
                Some(text) if guarded && cipher.is_protected_form(&text) => {
                    protected_seen += 1;
                    match cipher.decrypt(&text) {
                        Ok(plaintext) => {
                            decrypted_ok += 1;
                            Some(plaintext)
                        }
                        Err(e) => {
                            tracing::debug!(
                                column = %rows.columns()[index],
                                row = stats.rows_read,
                                error = %e,
                                "Protected cell restricted"
                            );
                            stats.cells_restricted += 1;
                            Some(RESTRICTED.to_string())
                        }
                    }
                }
                other => other,
            };
            cells.push(cell);
        }

        stats.cells_decrypted += decrypted_ok;
        if decrypted_ok > 0 {
            stats.rows_kept += 1;
            rows.push(Row::new(cells));
        } else {
            tracing::trace!(
                row = stats.rows_read,
                protected_seen,
                "Row dropped: no protected cell decrypted"
            );
        }
    }

    tracing::debug!(
        rows_read = stats.rows_read,
        rows_kept = stats.rows_kept,
        cells_decrypted = stats.cells_decrypted,
        cells_restricted = stats.cells_restricted,
        "Decrypt scan complete"
    );

    Ok((rows, stats))
}
