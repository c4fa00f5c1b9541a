//! Peer-to-peer networking
//!
//! This module handles the opcode-framed TCP protocol between nodes: the
//! message codec, the per-connection server, peer relays and the one-shot
//! client calls used from the command line.

pub mod client;
pub mod message;
pub mod node;
pub mod server;

pub use client::{request_block, send_close, send_transaction};
pub use message::{read_frame, write_frame, Frame, Message, MessageSizes, Opcode};
pub use node::{Node, Nodes};
pub use server::Server;
