//! # a3s-rowguard
//!
//! Column-level protection for relational data, gated by access policy.
//!
//! ## Overview
//!
//! `a3s-rowguard` encrypts selected columns before insert, decrypts them as
//! rows are read back, and lets an administrator add or remove server-side
//! policies that decide whether decryption is allowed.
//!
//! ## Quick Start
//!
//! ```rust
//! use a3s_rowguard::{Agent, ChunkCipher, KeyAttributes, MemoryCursor, ProtectedColumns, RowDecryptFilter};
//!
//! # fn example() -> a3s_rowguard::Result<()> {
//! let agent = Agent::new();
//! let first = ChunkCipher::new(&agent).encrypt("Mary", &KeyAttributes::new().with("classification", "pii"))?;
//!
//! let mut cursor = MemoryCursor::new(
//!     vec!["first".into(), "zip".into()],
//!     vec![vec![first.into(), "10001".into()]],
//! )?;
//!
//! let columns = ProtectedColumns::new(["first", "zip"]);
//! let rows = RowDecryptFilter::new(&agent, &columns).handle(&mut cursor)?;
//! assert_eq!(rows.rows()[0].get(0), Some("Mary"));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Architecture
//!
//! - **Agent** — key store and access gate, lent by reference to ciphers
//! - **CellCipher** trait — recognizes and opens protected cells
//! - **RowCursor** trait — forward-only tabular source
//! - **RowDecryptFilter** — per-row decrypt with restricted-cell masking
//! - **PolicyService** — blocking client for the tenant policy REST API

pub mod agent;
pub mod attributes;
pub mod config;
pub mod crypto;
pub mod cursor;
pub mod error;
pub mod filter;
pub mod policy;
pub mod protect;
pub mod types;

pub use agent::{AccessRule, Agent, KeyHandle, KeyInfo};
pub use attributes::KeyAttributes;
pub use config::{ColumnDef, RowguardConfig};
pub use crypto::{CellCipher, ChunkCipher, ChunkInfo, CHUNK_PREFIX, NONCE_SIZE};
pub use cursor::{MemoryCursor, RowCursor};
pub use error::{Result, RowguardError};
pub use filter::{decrypt_rows, ProtectedColumns, RowDecryptFilter, ScanStats};
pub use policy::{PolicyService, PolicyServiceConfig};
pub use protect::RowProtector;
pub use types::{Row, RowSet, RESTRICTED};
