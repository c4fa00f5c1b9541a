// A transaction moves `amount` from one account to another. It is immutable once
// decoded and keeps the exact bytes it came from: the ledger's replay check and
// the block body both work on those bytes, never on a re-encoding.

use crate::error::Result;
use crate::utils::{
    decode_digit_string, encode_digit_string, expect_len, sha256_digest, AccountId, Digest,
    FIELD_LEN,
};
use std::fmt;

/// Wire size of a transaction payload: sender + receiver + amount + timestamp
pub const TRANSACTION_LEN: usize = 4 * FIELD_LEN;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    sender: AccountId,
    receiver: AccountId,
    amount: u128,
    timestamp: u128,
    payload: [u8; TRANSACTION_LEN],
}

impl Transaction {
    /// Build a transaction and its canonical payload
    pub fn new(
        sender: AccountId,
        receiver: AccountId,
        amount: u128,
        timestamp: u128,
    ) -> Result<Transaction> {
        let mut payload = [0u8; TRANSACTION_LEN];
        payload[..FIELD_LEN].copy_from_slice(sender.as_bytes());
        payload[FIELD_LEN..2 * FIELD_LEN].copy_from_slice(receiver.as_bytes());
        payload[2 * FIELD_LEN..3 * FIELD_LEN].copy_from_slice(&encode_digit_string(amount)?);
        payload[3 * FIELD_LEN..].copy_from_slice(&encode_digit_string(timestamp)?);

        Ok(Transaction {
            sender,
            receiver,
            amount,
            timestamp,
            payload,
        })
    }

    pub fn decode(bytes: &[u8]) -> Result<Transaction> {
        expect_len(bytes, TRANSACTION_LEN, "transaction payload")?;

        let sender = Digest::from_slice(&bytes[..FIELD_LEN])?;
        let receiver = Digest::from_slice(&bytes[FIELD_LEN..2 * FIELD_LEN])?;
        let amount = decode_digit_string(&bytes[2 * FIELD_LEN..3 * FIELD_LEN])?;
        let timestamp = decode_digit_string(&bytes[3 * FIELD_LEN..])?;

        let mut payload = [0u8; TRANSACTION_LEN];
        payload.copy_from_slice(bytes);

        Ok(Transaction {
            sender,
            receiver,
            amount,
            timestamp,
            payload,
        })
    }

    /// The bytes this transaction was decoded from (or built into)
    pub fn encode(&self) -> &[u8] {
        &self.payload
    }

    /// SHA-256 over the textual rendering of the fields: hex ids, decimal numbers
    pub fn content_hash(&self) -> Digest {
        let mut data = String::with_capacity(4 * 64);
        data.push_str(&self.sender.to_hex());
        data.push_str(&self.receiver.to_hex());
        data.push_str(&self.amount.to_string());
        data.push_str(&self.timestamp.to_string());
        sha256_digest(data.as_bytes())
    }

    pub fn get_sender(&self) -> &AccountId {
        &self.sender
    }

    pub fn get_receiver(&self) -> &AccountId {
        &self.receiver
    }

    pub fn get_amount(&self) -> u128 {
        self.amount
    }

    pub fn get_timestamp(&self) -> u128 {
        self.timestamp
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} amount={} timestamp={}",
            self.sender, self.receiver, self.amount, self.timestamp
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BlockchainError;
    use crate::utils::genesis_account;

    #[test]
    fn test_payload_layout() {
        let tx = Transaction::new(genesis_account(1), genesis_account(2), 500, 1_700_000).unwrap();
        let bytes = tx.encode();

        assert_eq!(bytes.len(), TRANSACTION_LEN);
        assert_eq!(&bytes[..32], genesis_account(1).as_bytes());
        assert_eq!(&bytes[32..64], genesis_account(2).as_bytes());
        assert_eq!(&bytes[64..96], format!("{:032}", 500).as_bytes());
        assert_eq!(&bytes[96..], format!("{:032}", 1_700_000).as_bytes());
    }

    #[test]
    fn test_decode_encode_round_trip() {
        let tx = Transaction::new(genesis_account(3), genesis_account(3), 0, 42).unwrap();
        let decoded = Transaction::decode(tx.encode()).unwrap();

        assert_eq!(decoded, tx);
        assert_eq!(decoded.get_sender(), decoded.get_receiver());
        assert_eq!(decoded.get_amount(), 0);
        assert_eq!(decoded.get_timestamp(), 42);
    }

    #[test]
    fn test_decode_wrong_length() {
        let result = Transaction::decode(&[b'0'; TRANSACTION_LEN - 1]);
        assert!(matches!(result, Err(BlockchainError::MalformedPayload(_))));

        let result = Transaction::decode(&[b'0'; TRANSACTION_LEN + 1]);
        assert!(matches!(result, Err(BlockchainError::MalformedPayload(_))));
    }

    #[test]
    fn test_decode_rejects_binary_amount() {
        let tx = Transaction::new(genesis_account(1), genesis_account(2), 7, 1).unwrap();
        let mut bytes = tx.encode().to_vec();
        bytes[64] = 0xff;
        assert!(matches!(
            Transaction::decode(&bytes),
            Err(BlockchainError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_content_hash_uses_decimal_text() {
        let tx = Transaction::new(genesis_account(1), genesis_account(2), 500, 9).unwrap();
        let expected = sha256_digest(
            format!("{}{}5009", genesis_account(1), genesis_account(2)).as_bytes(),
        );
        assert_eq!(tx.content_hash(), expected);
    }

    #[test]
    fn test_content_hash_differs_per_field() {
        let a = Transaction::new(genesis_account(1), genesis_account(2), 500, 9).unwrap();
        let b = Transaction::new(genesis_account(1), genesis_account(2), 500, 10).unwrap();
        assert_ne!(a.content_hash(), b.content_hash());
    }
}
