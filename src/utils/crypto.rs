use crate::error::{BlockchainError, Result};
use data_encoding::HEXLOWER;
use once_cell::sync::Lazy;
use ring::digest::{Context, SHA256};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

pub const DIGEST_LEN: usize = 32;

/// Prior hash of the block at height 1: SHA-256 of the ASCII text "0"
pub static GENESIS_PRIOR_HASH: Lazy<Digest> = Lazy::new(|| sha256_digest(b"0"));

/// A 32-byte SHA-256 value. Account identifiers are digests too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Digest([u8; DIGEST_LEN]);

pub type AccountId = Digest;

impl Digest {
    pub fn new(bytes: [u8; DIGEST_LEN]) -> Digest {
        Digest(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Digest> {
        let array: [u8; DIGEST_LEN] = bytes.try_into().map_err(|_| {
            BlockchainError::MalformedPayload(format!(
                "digest must be {DIGEST_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Digest(array))
    }

    pub fn from_hex(hex: &str) -> Result<Digest> {
        let bytes = HEXLOWER
            .decode(hex.to_ascii_lowercase().as_bytes())
            .map_err(|e| BlockchainError::MalformedPayload(format!("invalid hex digest: {e}")))?;
        Digest::from_slice(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        HEXLOWER.encode(&self.0)
    }

    /// Number of leading '0' characters in the lowercase hex rendering
    pub fn leading_zero_nibbles(&self) -> usize {
        let mut zeros = 0;
        for byte in self.0 {
            if byte == 0 {
                zeros += 2;
                continue;
            }
            if byte >> 4 == 0 {
                zeros += 1;
            }
            break;
        }
        zeros
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

pub fn sha256_digest(data: &[u8]) -> Digest {
    let mut context = Context::new(&SHA256);
    context.update(data);
    let digest = context.finish();
    let mut bytes = [0u8; DIGEST_LEN];
    bytes.copy_from_slice(digest.as_ref());
    Digest(bytes)
}

/// Account id of the `index`-th genesis account: SHA-256 of its decimal text
pub fn genesis_account(index: usize) -> AccountId {
    sha256_digest(index.to_string().as_bytes())
}

/// Parse an account given either as a genesis index ("7") or as 64 hex chars
pub fn parse_account(text: &str) -> Result<AccountId> {
    let text = text.trim();
    if text.len() == DIGEST_LEN * 2 {
        return Digest::from_hex(text);
    }
    let index = text.parse::<usize>().map_err(|_| {
        BlockchainError::Config(format!(
            "account must be a genesis index or a 64-char hex id, got '{text}'"
        ))
    })?;
    Ok(genesis_account(index))
}

pub fn current_timestamp() -> Result<u128> {
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| BlockchainError::Config(format!("System time error: {e}")))?;
    Ok(duration.as_millis())
}
