//! Error handling for the ledger node
//!
//! One error type covers wire decoding, transaction admission, chain linkage,
//! mining and the node plumbing around them.

use crate::utils::Digest;
use std::fmt;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, BlockchainError>;

/// Error types for ledger, chain, mining and node operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockchainError {
    /// Wire buffer length or structure does not match the opcode's shape
    MalformedPayload(String),
    /// Sender or receiver is not in the account table
    UnknownAccount(Digest),
    /// Payload byte-identical to an already accepted transaction
    DuplicateTransaction(Digest),
    /// Sender balance is not strictly greater than the amount
    InsufficientBalance { required: u128, available: u128 },
    /// Block does not extend the current chain tip
    ChainLinkage { expected: Digest, found: Digest },
    /// Block links to the tip but claims the wrong height
    ChainHeight { expected: u64, found: u64 },
    /// Mining deadline elapsed before any worker found a nonce
    MiningTimedOut { attempts: u64 },
    /// Mining was aborted through the cancellation handle
    MiningCancelled,
    /// Every worker ran past the largest encodable nonce
    MiningExhausted,
    /// No block stored at the requested height
    BlockNotFound(u64),
    /// Configuration errors
    Config(String),
    /// Network communication errors
    Network(String),
    /// File I/O errors
    Io(String),
    /// A shared lock was poisoned by a panicking holder
    Lock(String),
}

impl BlockchainError {
    /// Whether the connection that delivered the offending item should be dropped
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            BlockchainError::MalformedPayload(_)
                | BlockchainError::ChainLinkage { .. }
                | BlockchainError::ChainHeight { .. }
        )
    }

    /// Whether this is one of the transaction admission rejections
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            BlockchainError::UnknownAccount(_)
                | BlockchainError::DuplicateTransaction(_)
                | BlockchainError::InsufficientBalance { .. }
        )
    }
}

impl fmt::Display for BlockchainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockchainError::MalformedPayload(msg) => write!(f, "Malformed payload: {msg}"),
            BlockchainError::UnknownAccount(account) => write!(f, "Unknown account: {account}"),
            BlockchainError::DuplicateTransaction(id) => {
                write!(f, "Duplicate transaction: {id}")
            }
            BlockchainError::InsufficientBalance {
                required,
                available,
            } => {
                write!(
                    f,
                    "Insufficient balance: required more than {required}, available {available}"
                )
            }
            BlockchainError::ChainLinkage { expected, found } => {
                write!(
                    f,
                    "Chain linkage error: expected prior hash {expected}, found {found}"
                )
            }
            BlockchainError::ChainHeight { expected, found } => {
                write!(
                    f,
                    "Chain height error: expected block height {expected}, found {found}"
                )
            }
            BlockchainError::MiningTimedOut { attempts } => {
                write!(f, "Mining timed out after {attempts} attempts")
            }
            BlockchainError::MiningCancelled => write!(f, "Mining cancelled"),
            BlockchainError::MiningExhausted => write!(f, "Mining exhausted the nonce space"),
            BlockchainError::BlockNotFound(height) => {
                write!(f, "No block at height {height}")
            }
            BlockchainError::Config(msg) => write!(f, "Configuration error: {msg}"),
            BlockchainError::Network(msg) => write!(f, "Network error: {msg}"),
            BlockchainError::Io(msg) => write!(f, "I/O error: {msg}"),
            BlockchainError::Lock(msg) => write!(f, "Lock error: {msg}"),
        }
    }
}

impl std::error::Error for BlockchainError {}

impl From<std::io::Error> for BlockchainError {
    fn from(err: std::io::Error) -> Self {
        BlockchainError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for BlockchainError {
    fn from(err: toml::de::Error) -> Self {
        BlockchainError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_violations() {
        assert!(BlockchainError::MalformedPayload("short".to_string()).is_protocol_violation());
        assert!(BlockchainError::ChainLinkage {
            expected: Digest::default(),
            found: Digest::default(),
        }
        .is_protocol_violation());
        assert!(BlockchainError::ChainHeight {
            expected: 2,
            found: 5
        }
        .is_protocol_violation());
        assert!(!BlockchainError::MiningTimedOut { attempts: 3 }.is_protocol_violation());
        assert!(!BlockchainError::UnknownAccount(Digest::default()).is_protocol_violation());
    }

    #[test]
    fn test_rejection_kinds() {
        assert!(BlockchainError::DuplicateTransaction(Digest::default()).is_rejection());
        assert!(BlockchainError::InsufficientBalance {
            required: 10,
            available: 10
        }
        .is_rejection());
        assert!(!BlockchainError::BlockNotFound(1).is_rejection());
    }

    #[test]
    fn test_display_messages() {
        let err = BlockchainError::InsufficientBalance {
            required: 500,
            available: 100,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient balance: required more than 500, available 100"
        );
        assert_eq!(
            BlockchainError::BlockNotFound(7).to_string(),
            "No block at height 7"
        );
    }
}
