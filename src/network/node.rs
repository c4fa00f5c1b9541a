use crate::error::{BlockchainError, Result};
use crate::network::message::write_frame;
use log::{debug, warn};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

const TCP_WRITE_TIMEOUT: u64 = 5000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    addr: String,
}

impl Node {
    pub fn new(addr: String) -> Node {
        Node { addr }
    }

    pub fn get_addr(&self) -> &str {
        &self.addr
    }

    pub fn parse_socket_addr(&self) -> Result<SocketAddr> {
        self.addr
            .parse()
            .map_err(|e| BlockchainError::Network(format!("Invalid address {}: {e}", self.addr)))
    }

    /// Open a short-lived connection and write one frame
    pub fn send_frame(&self, frame: &[u8]) -> Result<()> {
        let addr = self.parse_socket_addr()?;
        let mut stream =
            TcpStream::connect_timeout(&addr, Duration::from_millis(TCP_WRITE_TIMEOUT))
                .map_err(|e| BlockchainError::Network(format!("Failed to connect to {addr}: {e}")))?;
        stream
            .set_write_timeout(Some(Duration::from_millis(TCP_WRITE_TIMEOUT)))
            .map_err(|e| BlockchainError::Network(format!("Failed to set write timeout: {e}")))?;
        write_frame(&mut stream, frame)
    }
}

/// The fixed set of peers this node relays to
#[derive(Debug, Clone, Default)]
pub struct Nodes {
    inner: Vec<Node>,
}

impl Nodes {
    pub fn new() -> Nodes {
        Nodes { inner: vec![] }
    }

    pub fn from_addrs<I: IntoIterator<Item = String>>(addrs: I) -> Nodes {
        let mut nodes = Nodes::new();
        for addr in addrs {
            nodes.add_node(addr);
        }
        nodes
    }

    pub fn add_node(&mut self, addr: String) {
        if !self.node_is_known(&addr) {
            self.inner.push(Node::new(addr));
        }
    }

    pub fn node_is_known(&self, addr: &str) -> bool {
        self.inner.iter().any(|node| node.get_addr() == addr)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Send a frame to every peer; unreachable peers are logged and skipped.
    /// Returns how many peers received it.
    pub fn broadcast(&self, frame: &[u8]) -> usize {
        let mut delivered = 0;
        for node in &self.inner {
            match node.send_frame(frame) {
                Ok(()) => {
                    debug!("Relayed {} bytes to {}", frame.len(), node.get_addr());
                    delivered += 1;
                }
                Err(e) => warn!("Failed to relay to {}: {e}", node.get_addr()),
            }
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::TcpListener;

    #[test]
    fn test_nodes_deduplicate() {
        let nodes = Nodes::from_addrs(vec![
            "127.0.0.1:2002".to_string(),
            "127.0.0.1:2002".to_string(),
            "127.0.0.1:2003".to_string(),
        ]);
        assert_eq!(nodes.len(), 2);
        assert!(nodes.node_is_known("127.0.0.1:2003"));
    }

    #[test]
    fn test_invalid_address() {
        let node = Node::new("not an address".to_string());
        assert!(matches!(
            node.send_frame(&[1]),
            Err(BlockchainError::Network(_))
        ));
    }

    #[test]
    fn test_broadcast_delivers_frame() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let receiver = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = Vec::new();
            stream.read_to_end(&mut buf).unwrap();
            buf
        });

        let nodes = Nodes::from_addrs(vec![addr]);
        assert_eq!(nodes.broadcast(&[1]), 1);
        assert_eq!(receiver.join().unwrap(), vec![1]);
    }
}
