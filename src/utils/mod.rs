//! Utility functions and helpers
//!
//! This module contains the digest type, SHA-256 hashing, genesis constants
//! and the fixed-width field encodings used by the wire codec.

pub mod crypto;
pub mod serialization;

pub use crypto::{
    current_timestamp, genesis_account, parse_account, sha256_digest, AccountId, Digest,
    DIGEST_LEN, GENESIS_PRIOR_HASH,
};

pub use serialization::{
    big_endian_decimal, decode_digit_string, decode_hex_int, encode_digit_string, encode_hex_int,
    expect_len, FIELD_LEN, MAX_DIGIT_VALUE,
};
