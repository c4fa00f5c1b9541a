use crate::config::Config;
use crate::core::{BlockOutcome, Ledger, SharedLedger};
use crate::error::{BlockchainError, Result};
use crate::network::message::{read_frame, write_frame, Frame, Message, MessageSizes, CLOSE_OPCODE};
use crate::network::Nodes;
use log::{debug, error, info, warn};
use std::io::{BufReader, ErrorKind};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const TCP_READ_TIMEOUT: u64 = 60;
const ACCEPT_POLL_INTERVAL: u64 = 25;

/// TCP front end of a ledger node
pub struct Server {
    listener: TcpListener,
    context: ConnectionContext,
}

/// Everything a connection handler needs, cheap to clone per connection
#[derive(Clone)]
struct ConnectionContext {
    ledger: SharedLedger,
    peers: Arc<Nodes>,
    sizes: MessageSizes,
    shutdown: Arc<AtomicBool>,
    mining_cancel: Arc<AtomicBool>,
}

enum Flow {
    Continue,
    Close,
}

impl Server {
    /// Build the ledger described by `config` and bind its listen address
    pub fn bind(config: &Config) -> Result<Server> {
        let ledger = Ledger::from_config(config)?;
        let peers = Nodes::from_addrs(config.peer_addrs());
        Server::with_ledger(&config.get_node_addr(), ledger, peers)
    }

    pub fn with_ledger(addr: &str, ledger: Ledger, peers: Nodes) -> Result<Server> {
        let listener = TcpListener::bind(addr)
            .map_err(|e| BlockchainError::Network(format!("Failed to bind to {addr}: {e}")))?;
        let sizes = MessageSizes::new(ledger.get_batch_size());
        let mining_cancel = ledger.mining_cancel_handle();

        Ok(Server {
            listener,
            context: ConnectionContext {
                ledger: SharedLedger::new(ledger),
                peers: Arc::new(peers),
                sizes,
                shutdown: Arc::new(AtomicBool::new(false)),
                mining_cancel,
            },
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn get_ledger(&self) -> SharedLedger {
        self.context.ledger.clone()
    }

    /// Setting the returned flag makes `run` return after the next poll
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.context.shutdown)
    }

    /// Accept connections until a Close message arrives. Each connection gets
    /// its own handler thread.
    pub fn run(&self) -> Result<()> {
        self.listener.set_nonblocking(true)?;
        info!(
            "Server listening on {} with {} peer(s)",
            self.local_addr()?,
            self.context.peers.len()
        );

        while !self.context.shutdown.load(Ordering::Acquire) {
            match self.listener.accept() {
                Ok((stream, peer_addr)) => {
                    info!("Connection received from {peer_addr}");
                    let context = self.context.clone();
                    thread::spawn(move || {
                        if let Err(e) = Self::handle_connection(&context, stream, peer_addr) {
                            error!("Error handling connection from {peer_addr}: {e}");
                        }
                    });
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(ACCEPT_POLL_INTERVAL));
                }
                Err(e) => {
                    error!("Error accepting connection: {e}");
                }
            }
        }

        info!("Received close message, no longer accepting connections");
        Ok(())
    }

    fn handle_connection(
        context: &ConnectionContext,
        mut stream: TcpStream,
        peer_addr: SocketAddr,
    ) -> Result<()> {
        // accepted sockets may inherit the listener's non-blocking mode
        stream.set_nonblocking(false)?;
        stream
            .set_read_timeout(Some(Duration::from_secs(TCP_READ_TIMEOUT)))
            .map_err(|e| BlockchainError::Network(format!("Failed to set read timeout: {e}")))?;

        let mut reader = BufReader::new(stream.try_clone()?);
        let result = loop {
            let frame = match read_frame(&mut reader, &context.sizes) {
                Ok(Some(frame)) => frame,
                Ok(None) => break Ok(()),
                Err(e) => break Err(e),
            };
            debug!("Received {:?} from {peer_addr}", frame.message.opcode());

            match Self::process_frame(context, frame, &mut stream) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Close) => break Ok(()),
                Err(e) => break Err(e),
            }
        };

        if let Err(e) = &result {
            if e.is_protocol_violation() {
                warn!("Dropping {peer_addr} after protocol violation: {e}");
            }
        }
        let _ = stream.shutdown(Shutdown::Both);
        info!("Connection from {peer_addr} closed");
        result
    }

    fn process_frame(
        context: &ConnectionContext,
        frame: Frame,
        stream: &mut TcpStream,
    ) -> Result<Flow> {
        let Frame { message, bytes } = frame;
        match message {
            Message::Transaction(tx) => {
                let outcome = context.ledger.apply_transaction(tx)?;
                let (relay_tx, blocks) = outcome.broadcast_decision();
                if relay_tx {
                    context.peers.broadcast(&bytes);
                }
                for block in blocks {
                    let block_frame = Message::Block(block.clone()).to_frame()?;
                    context.peers.broadcast(&block_frame);
                    info!("Block {} relayed to peers", block.get_hash());
                }
                Ok(Flow::Continue)
            }
            Message::Block(block) => {
                let hash = *block.get_hash();
                match context.ledger.accept_block(block)? {
                    BlockOutcome::Appended => {
                        info!("Accepted peer block {hash}");
                        context.peers.broadcast(&bytes);
                    }
                    BlockOutcome::AlreadyKnown => debug!("Ignoring known block {hash}"),
                }
                Ok(Flow::Continue)
            }
            Message::GetBlock(height) => {
                match context.ledger.lookup_block(height) {
                    Ok(block) => write_frame(stream, &Message::Block(block).to_frame()?)?,
                    Err(BlockchainError::BlockNotFound(_)) => {
                        info!("Block at height {height} requested but not found");
                        write_frame(stream, &[CLOSE_OPCODE])?;
                    }
                    Err(e) => return Err(e),
                }
                Ok(Flow::Continue)
            }
            Message::Close => {
                context.shutdown.store(true, Ordering::Release);
                context.mining_cancel.store(true, Ordering::Release);
                context.peers.broadcast(&bytes);
                Ok(Flow::Close)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Miner, Transaction};
    use crate::storage::UTXOSet;
    use crate::utils::{genesis_account, Digest};

    fn create_test_server() -> Server {
        let ledger = Ledger::new(
            UTXOSet::with_genesis_accounts(2, 1_000),
            Miner::new(0, 1),
            1,
            Digest::default(),
        );
        Server::with_ledger("127.0.0.1:0", ledger, Nodes::new()).unwrap()
    }

    #[test]
    fn test_server_creation() {
        let server = create_test_server();
        assert!(server.local_addr().unwrap().port() > 0);
        assert_eq!(server.get_ledger().get_batch_size().unwrap(), 1);
    }

    #[test]
    fn test_bind_from_config() {
        let mut config = Config::new();
        config.port = 0;
        config.batch_size = 2;
        let server = Server::bind(&config).unwrap();
        assert_eq!(server.get_ledger().get_batch_size().unwrap(), 2);

        config.numcores = 0;
        assert!(Server::bind(&config).is_err());
    }

    #[test]
    fn test_shutdown_handle_stops_run() {
        let server = create_test_server();
        server.shutdown_handle().store(true, Ordering::Release);
        assert!(server.run().is_ok());
    }

    #[test]
    fn test_transaction_frame_updates_ledger() {
        let server = create_test_server();
        let addr = server.local_addr().unwrap();
        let ledger = server.get_ledger();
        let runner = thread::spawn(move || server.run());

        let tx = Transaction::new(genesis_account(0), genesis_account(1), 10, 1).unwrap();
        let mut stream = TcpStream::connect(addr).unwrap();
        write_frame(&mut stream, &Message::Transaction(tx).to_frame().unwrap()).unwrap();
        write_frame(&mut stream, &Message::Close.to_frame().unwrap()).unwrap();
        drop(stream);

        runner.join().unwrap().unwrap();
        // the handler finishes the frame before it reads Close
        let balance = ledger
            .with_ledger(|ledger| ledger.get_balance(&genesis_account(1)))
            .unwrap();
        assert_eq!(balance, Some(1_010));
    }
}
