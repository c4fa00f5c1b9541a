use crate::core::transaction::{Transaction, TRANSACTION_LEN};
use crate::error::{BlockchainError, Result};
use crate::utils::{
    big_endian_decimal, decode_digit_string, decode_hex_int, encode_digit_string, encode_hex_int,
    expect_len, sha256_digest, AccountId, Digest, FIELD_LEN,
};
use std::fmt;

/// nonce + prior_hash + hash + height + miner_address
pub const BLOCK_HEADER_LEN: usize = 5 * FIELD_LEN;

/// Nonce every candidate block starts its search from
pub const INITIAL_NONCE: u128 = 1;

/// Wire size of a block carrying `batch_size` transactions
pub fn block_len(batch_size: usize) -> usize {
    BLOCK_HEADER_LEN + TRANSACTION_LEN * batch_size
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    nonce: u128,
    prior_hash: Digest,
    hash: Digest,
    height: u64,
    miner_address: AccountId,
    block_data: Vec<u8>,
}

impl Block {
    /// Assemble an unmined block from pooled transaction payloads, in order
    pub fn new_candidate<P: AsRef<[u8]>>(
        prior_hash: Digest,
        height: u64,
        miner_address: AccountId,
        payloads: &[P],
    ) -> Block {
        let mut block_data = Vec::with_capacity(payloads.len() * TRANSACTION_LEN);
        for payload in payloads {
            block_data.extend_from_slice(payload.as_ref());
        }

        Block {
            nonce: INITIAL_NONCE,
            prior_hash,
            hash: Digest::default(),
            height,
            miner_address,
            block_data,
        }
    }

    pub fn decode(bytes: &[u8], batch_size: usize) -> Result<Block> {
        expect_len(bytes, block_len(batch_size), "block payload")?;

        let field = |index: usize| &bytes[index * FIELD_LEN..(index + 1) * FIELD_LEN];
        Ok(Block {
            nonce: decode_digit_string(field(0))?,
            prior_hash: Digest::from_slice(field(1))?,
            hash: Digest::from_slice(field(2))?,
            height: decode_hex_int(field(3))?,
            miner_address: Digest::from_slice(field(4))?,
            block_data: bytes[BLOCK_HEADER_LEN..].to_vec(),
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(BLOCK_HEADER_LEN + self.block_data.len());
        bytes.extend_from_slice(&encode_digit_string(self.nonce)?);
        bytes.extend_from_slice(self.prior_hash.as_bytes());
        bytes.extend_from_slice(self.hash.as_bytes());
        bytes.extend_from_slice(&encode_hex_int(self.height));
        bytes.extend_from_slice(self.miner_address.as_bytes());
        bytes.extend_from_slice(&self.block_data);
        Ok(bytes)
    }

    /// Hash input that does not depend on the nonce. Mining renders it once and
    /// prefixes each attempt's nonce.
    pub fn hash_suffix(&self) -> String {
        let mut suffix = self.prior_hash.to_hex();
        suffix.push_str(&self.height.to_string());
        suffix.push_str(&big_endian_decimal(self.miner_address.as_bytes()));
        suffix.push_str(&big_endian_decimal(&self.block_data));
        suffix
    }

    /// SHA-256 of the decimal/hex text of the fields, starting with the nonce
    pub fn content_hash(&self) -> Digest {
        Self::hash_with_suffix(self.nonce, &self.hash_suffix())
    }

    pub fn hash_with_suffix(nonce: u128, suffix: &str) -> Digest {
        let mut data = nonce.to_string();
        data.push_str(suffix);
        sha256_digest(data.as_bytes())
    }

    /// Whether the stored hash has at least `difficulty` leading hex zeros
    pub fn meets_difficulty(&self, difficulty: usize) -> bool {
        self.hash.leading_zero_nibbles() >= difficulty
    }

    /// Whether the stored hash matches the block's content
    pub fn verify_hash(&self) -> bool {
        self.content_hash() == self.hash
    }

    /// Freeze the winning nonce and its hash into the block
    pub(crate) fn seal(&mut self, nonce: u128, hash: Digest) {
        self.nonce = nonce;
        self.hash = hash;
    }

    /// Split the block body back into its transactions
    pub fn transactions(&self) -> Result<Vec<Transaction>> {
        if self.block_data.len() % TRANSACTION_LEN != 0 {
            return Err(BlockchainError::MalformedPayload(format!(
                "block data length {} is not a multiple of {TRANSACTION_LEN}",
                self.block_data.len()
            )));
        }
        self.block_data
            .chunks(TRANSACTION_LEN)
            .map(Transaction::decode)
            .collect()
    }

    pub fn get_nonce(&self) -> u128 {
        self.nonce
    }

    pub fn get_prior_hash(&self) -> &Digest {
        &self.prior_hash
    }

    pub fn get_hash(&self) -> &Digest {
        &self.hash
    }

    pub fn get_height(&self) -> u64 {
        self.height
    }

    pub fn get_miner_address(&self) -> &AccountId {
        &self.miner_address
    }

    pub fn get_block_data(&self) -> &[u8] {
        &self.block_data
    }

    pub fn transaction_count(&self) -> usize {
        self.block_data.len() / TRANSACTION_LEN
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "height={} nonce={} prior={} hash={} miner={} txs={}",
            self.height,
            self.nonce,
            self.prior_hash,
            self.hash,
            self.miner_address,
            self.transaction_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{genesis_account, GENESIS_PRIOR_HASH};

    fn payloads(count: usize) -> Vec<Vec<u8>> {
        (0..count)
            .map(|i| {
                Transaction::new(genesis_account(i), genesis_account(i + 1), 10, i as u128)
                    .unwrap()
                    .encode()
                    .to_vec()
            })
            .collect()
    }

    #[test]
    fn test_candidate_block_layout() {
        let block = Block::new_candidate(*GENESIS_PRIOR_HASH, 1, genesis_account(9), &payloads(2));
        let bytes = block.encode().unwrap();

        assert_eq!(bytes.len(), block_len(2));
        assert_eq!(&bytes[..32], format!("{:032}", INITIAL_NONCE).as_bytes());
        assert_eq!(&bytes[32..64], GENESIS_PRIOR_HASH.as_bytes());
        assert_eq!(&bytes[64..96], &[0u8; 32]);
        assert_eq!(bytes[127], 1);
        assert_eq!(&bytes[128..160], genesis_account(9).as_bytes());
        assert_eq!(block.transaction_count(), 2);
    }

    #[test]
    fn test_decode_encode_round_trip() {
        let mut block = Block::new_candidate(genesis_account(5), 12, genesis_account(9), &payloads(3));
        let hash = block.content_hash();
        block.seal(77, hash);

        let decoded = Block::decode(&block.encode().unwrap(), 3).unwrap();
        assert_eq!(decoded, block);
        assert_eq!(decoded.get_height(), 12);
        assert_eq!(decoded.get_nonce(), 77);
        assert_eq!(decoded.transactions().unwrap().len(), 3);
    }

    #[test]
    fn test_decode_wrong_batch_size() {
        let block = Block::new_candidate(*GENESIS_PRIOR_HASH, 1, Digest::default(), &payloads(2));
        let bytes = block.encode().unwrap();
        assert!(matches!(
            Block::decode(&bytes, 3),
            Err(BlockchainError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_content_hash_renders_fields_as_text() {
        let block = Block::new_candidate(*GENESIS_PRIOR_HASH, 1, Digest::default(), &payloads(1));
        let expected = format!(
            "{}{}1{}{}",
            INITIAL_NONCE,
            GENESIS_PRIOR_HASH.to_hex(),
            0,
            big_endian_decimal(block.get_block_data())
        );
        assert_eq!(block.content_hash(), sha256_digest(expected.as_bytes()));
    }

    #[test]
    fn test_content_hash_ignores_stored_hash() {
        let mut block = Block::new_candidate(*GENESIS_PRIOR_HASH, 1, Digest::default(), &payloads(1));
        let before = block.content_hash();
        block.seal(INITIAL_NONCE, genesis_account(3));
        assert_eq!(block.content_hash(), before);
        assert!(!block.verify_hash());

        block.seal(INITIAL_NONCE, before);
        assert!(block.verify_hash());
    }

    #[test]
    fn test_meets_difficulty() {
        let mut block = Block::new_candidate(*GENESIS_PRIOR_HASH, 1, Digest::default(), &payloads(1));
        let mut bytes = [0xffu8; 32];
        bytes[0] = 0x00;
        block.seal(5, Digest::new(bytes));

        assert!(block.meets_difficulty(0));
        assert!(block.meets_difficulty(2));
        assert!(!block.meets_difficulty(3));
    }
}
