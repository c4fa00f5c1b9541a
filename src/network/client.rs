use crate::core::{Block, Transaction};
use crate::error::{BlockchainError, Result};
use crate::network::message::{read_frame, write_frame, Message, MessageSizes};
use crate::network::Node;
use log::info;
use std::io::BufReader;
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

const TCP_READ_TIMEOUT: u64 = 60;

fn connect(addr: &str) -> Result<TcpStream> {
    let socket_addr = Node::new(addr.to_string()).parse_socket_addr()?;
    TcpStream::connect(socket_addr)
        .map_err(|e| BlockchainError::Network(format!("Failed to connect to {addr}: {e}")))
}

/// Submit one transaction to a node
pub fn send_transaction(addr: &str, tx: &Transaction) -> Result<()> {
    let frame = Message::Transaction(tx.clone()).to_frame()?;
    Node::new(addr.to_string()).send_frame(&frame)?;
    info!("Sent transaction {} to {addr}", tx.content_hash());
    Ok(())
}

/// Ask a node for the block at `height`. `Ok(None)` when the node has no
/// block there. `batch_size` must match the node's, since it fixes the block size.
pub fn request_block(addr: &str, height: u64, batch_size: usize) -> Result<Option<Block>> {
    let mut stream = connect(addr)?;
    stream
        .set_read_timeout(Some(Duration::from_secs(TCP_READ_TIMEOUT)))
        .map_err(|e| BlockchainError::Network(format!("Failed to set read timeout: {e}")))?;
    write_frame(&mut stream, &Message::GetBlock(height).to_frame()?)?;

    let mut reader = BufReader::new(stream.try_clone()?);
    let reply = read_frame(&mut reader, &MessageSizes::new(batch_size))?;
    let _ = stream.shutdown(Shutdown::Both);

    match reply.map(|frame| frame.message) {
        Some(Message::Block(block)) => Ok(Some(block)),
        Some(Message::Close) => Ok(None),
        Some(other) => Err(BlockchainError::Network(format!(
            "unexpected {:?} reply to GetBlock",
            other.opcode()
        ))),
        None => Err(BlockchainError::Network(format!(
            "{addr} closed the connection without replying"
        ))),
    }
}

/// Tell a node to shut down
pub fn send_close(addr: &str) -> Result<()> {
    Node::new(addr.to_string()).send_frame(&Message::Close.to_frame()?)?;
    info!("Sent close to {addr}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::message::CLOSE_OPCODE;
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn test_request_block_not_found() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let responder = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let frame = read_frame(&mut stream, &MessageSizes::new(1))
                .unwrap()
                .unwrap();
            assert_eq!(frame.message, Message::GetBlock(3));
            write_frame(&mut stream, &[CLOSE_OPCODE]).unwrap();
        });

        assert_eq!(request_block(&addr, 3, 1).unwrap(), None);
        responder.join().unwrap();
    }

    #[test]
    fn test_request_block_without_reply() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let responder = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            read_frame(&mut stream, &MessageSizes::new(1)).unwrap();
        });

        assert!(matches!(
            request_block(&addr, 1, 1),
            Err(BlockchainError::Network(_))
        ));
        responder.join().unwrap();
    }

    #[test]
    fn test_unreachable_node() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);
        assert!(send_close(&addr).is_err());
    }
}
