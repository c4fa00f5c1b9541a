// Opcode-prefixed framing: one opcode byte, then a payload whose size is fixed
// by the opcode alone (and, for blocks, by the configured batch size).

use crate::core::{block_len, Block, Transaction, TRANSACTION_LEN};
use crate::error::{BlockchainError, Result};
use crate::utils::{decode_hex_int, encode_hex_int, FIELD_LEN};
use std::io::{ErrorKind, Read, Write};

pub const TX_OPCODE: u8 = 0;
pub const CLOSE_OPCODE: u8 = 1;
pub const BLOCK_OPCODE: u8 = 2;
pub const GET_BLOCK_OPCODE: u8 = 3;

pub const GET_BLOCK_LEN: usize = FIELD_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Transaction,
    Close,
    Block,
    GetBlock,
}

impl Opcode {
    pub fn from_byte(byte: u8) -> Result<Opcode> {
        match byte {
            TX_OPCODE => Ok(Opcode::Transaction),
            CLOSE_OPCODE => Ok(Opcode::Close),
            BLOCK_OPCODE => Ok(Opcode::Block),
            GET_BLOCK_OPCODE => Ok(Opcode::GetBlock),
            other => Err(BlockchainError::MalformedPayload(format!(
                "unknown opcode {other}"
            ))),
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            Opcode::Transaction => TX_OPCODE,
            Opcode::Close => CLOSE_OPCODE,
            Opcode::Block => BLOCK_OPCODE,
            Opcode::GetBlock => GET_BLOCK_OPCODE,
        }
    }
}

/// Payload size per opcode for a given batch size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageSizes {
    batch_size: usize,
}

impl MessageSizes {
    pub fn new(batch_size: usize) -> MessageSizes {
        MessageSizes { batch_size }
    }

    pub fn payload_len(&self, opcode: Opcode) -> usize {
        match opcode {
            Opcode::Transaction => TRANSACTION_LEN,
            Opcode::Close => 0,
            Opcode::Block => block_len(self.batch_size),
            Opcode::GetBlock => GET_BLOCK_LEN,
        }
    }

    pub fn get_batch_size(&self) -> usize {
        self.batch_size
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Transaction(Transaction),
    Close,
    Block(Block),
    /// Request for the block at a 1-based height
    GetBlock(u64),
}

/// A decoded message together with the exact bytes it arrived as
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub message: Message,
    pub bytes: Vec<u8>,
}

/// Decode one payload. The length must match the opcode exactly.
pub fn decode(opcode: u8, payload: &[u8], sizes: &MessageSizes) -> Result<Message> {
    let opcode = Opcode::from_byte(opcode)?;
    let expected = sizes.payload_len(opcode);
    if payload.len() != expected {
        return Err(BlockchainError::MalformedPayload(format!(
            "{opcode:?} payload must be {expected} bytes, got {}",
            payload.len()
        )));
    }

    match opcode {
        Opcode::Transaction => Ok(Message::Transaction(Transaction::decode(payload)?)),
        Opcode::Close => Ok(Message::Close),
        Opcode::Block => Ok(Message::Block(Block::decode(
            payload,
            sizes.get_batch_size(),
        )?)),
        Opcode::GetBlock => Ok(Message::GetBlock(decode_hex_int(payload)?)),
    }
}

impl Message {
    pub fn opcode(&self) -> Opcode {
        match self {
            Message::Transaction(_) => Opcode::Transaction,
            Message::Close => Opcode::Close,
            Message::Block(_) => Opcode::Block,
            Message::GetBlock(_) => Opcode::GetBlock,
        }
    }

    /// Opcode byte followed by the payload
    pub fn to_frame(&self) -> Result<Vec<u8>> {
        let mut frame = vec![self.opcode().as_byte()];
        match self {
            Message::Transaction(tx) => frame.extend_from_slice(tx.encode()),
            Message::Close => {}
            Message::Block(block) => frame.extend(block.encode()?),
            Message::GetBlock(height) => frame.extend_from_slice(&encode_hex_int(*height)),
        }
        Ok(frame)
    }
}

/// Read the next frame. `Ok(None)` means the peer closed cleanly between frames.
pub fn read_frame<R: Read>(reader: &mut R, sizes: &MessageSizes) -> Result<Option<Frame>> {
    let mut opcode = [0u8; 1];
    match reader.read_exact(&mut opcode) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(BlockchainError::Network(format!("Failed to read opcode: {e}"))),
    }

    let len = sizes.payload_len(Opcode::from_byte(opcode[0])?);
    let mut bytes = vec![0u8; 1 + len];
    bytes[0] = opcode[0];
    reader.read_exact(&mut bytes[1..]).map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            BlockchainError::MalformedPayload(format!(
                "connection closed inside a {len}-byte payload"
            ))
        } else {
            BlockchainError::Network(format!("Failed to read payload: {e}"))
        }
    })?;

    let message = decode(bytes[0], &bytes[1..], sizes)?;
    Ok(Some(Frame { message, bytes }))
}

pub fn write_frame<W: Write>(writer: &mut W, frame: &[u8]) -> Result<()> {
    writer
        .write_all(frame)
        .and_then(|_| writer.flush())
        .map_err(|e| BlockchainError::Network(format!("Failed to write frame: {e}")))
}
