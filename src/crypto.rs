//! Column value encryption
//!
//! Protected values are stored as text chunks of the form
//! `~!2!<key_id>!<base64(nonce || ciphertext)>!`, so protected and plain
//! values can share a text column and be told apart by sniffing.

use crate::agent::Agent;
use crate::attributes::KeyAttributes;
use crate::error::{Result, RowguardError};
use aes_gcm::aead::{Aead, OsRng, Payload};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

/// Chunk prefix for the current wire version
pub const CHUNK_PREFIX: &str = "~!2!";

/// AES-GCM nonce length in bytes
pub const NONCE_SIZE: usize = 12;

/// Result of sniffing a text value for the protected wire form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkInfo<'a> {
    pub key_id: &'a str,
    pub payload: &'a str,
}

impl<'a> ChunkInfo<'a> {
    /// Parse `text` as a chunk; `None` if it is not in protected form
    pub fn parse(text: &'a str) -> Option<Self> {
        let body = text.strip_prefix(CHUNK_PREFIX)?.strip_suffix('!')?;
        let (key_id, payload) = body.split_once('!')?;
        if key_id.is_empty() || payload.is_empty() {
            return None;
        }
        if !key_id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_') {
            return None;
        }
        if !payload
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'='))
        {
            return None;
        }
        Some(Self { key_id, payload })
    }

    /// True when `text` is a protected chunk (null is never protected)
    pub fn is_encrypted(text: Option<&str>) -> bool {
        text.and_then(ChunkInfo::parse).is_some()
    }
}

/// Capability used by the row filter to recognize and open protected cells
pub trait CellCipher {
    /// Whether the text is in protected wire form
    fn is_protected_form(&self, text: &str) -> bool;

    /// Decrypt protected text back to plaintext
    ///
    /// Fails on malformed chunks, unknown or withheld keys, and
    /// authentication failure.
    fn decrypt(&self, text: &str) -> Result<String>;
}

/// Chunk cipher backed by an `Agent`
///
/// Cheap to construct; build one per scan or per batch of inserts.
pub struct ChunkCipher<'a> {
    agent: &'a Agent,
}

impl<'a> ChunkCipher<'a> {
    pub fn new(agent: &'a Agent) -> Self {
        Self { agent }
    }

    /// Encrypt `plaintext` under a new key carrying `attributes`
    pub fn encrypt(&self, plaintext: &str, attributes: &KeyAttributes) -> Result<String> {
        let key = self.agent.create_key(attributes)?;
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = key
            .cipher
            .encrypt(
                &nonce,
                Payload {
                    msg: plaintext.as_bytes(),
                    aad: key.key_id.as_bytes(),
                },
            )
            .map_err(|e| RowguardError::Crypto(format!("Encryption failed: {}", e)))?;

        let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);

        Ok(format!("{}{}!{}!", CHUNK_PREFIX, key.key_id, BASE64.encode(sealed)))
    }
}

impl CellCipher for ChunkCipher<'_> {
    fn is_protected_form(&self, text: &str) -> bool {
        ChunkInfo::parse(text).is_some()
    }

    fn decrypt(&self, text: &str) -> Result<String> {
        let chunk = ChunkInfo::parse(text)
            .ok_or_else(|| RowguardError::MalformedChunk("not in protected form".into()))?;

        let sealed = BASE64.decode(chunk.payload).map_err(|e| {
            RowguardError::MalformedChunk(format!("Invalid payload encoding: {}", e))
        })?;
        if sealed.len() <= NONCE_SIZE {
            return Err(RowguardError::MalformedChunk(format!(
                "payload too short: {} bytes",
                sealed.len()
            )));
        }
        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_SIZE);

        let key = self.agent.fetch_key(chunk.key_id)?;
        let plaintext = key
            .cipher
            .decrypt(
                Nonce::from_slice(nonce_bytes),
                Payload {
                    msg: ciphertext,
                    aad: chunk.key_id.as_bytes(),
                },
            )
            .map_err(|e| RowguardError::Crypto(format!("Decryption failed: {}", e)))?;

        String::from_utf8(plaintext)
            .map_err(|e| RowguardError::Crypto(format!("Plaintext is not UTF-8: {}", e)))
    }
}
