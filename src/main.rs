// Entry point for the node binary and its client subcommands
use clap::Parser;
use log::{error, info, LevelFilter};
use nonce_chain::{
    current_timestamp, request_block, send_close, send_transaction, Command, Opt, Server,
    Transaction,
};
use std::process;

fn main() {
    // Info by default, RUST_LOG still wins when it is set
    env_logger::builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let opt = Opt::parse();

    if let Err(e) = run_command(opt.command) {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn run_command(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::StartNode(args) => {
            let config = args.to_config()?;
            info!(
                "Starting node on {} (difficulty {}, {} tx per block, {} core(s))",
                config.get_node_addr(),
                config.difficulty,
                config.batch_size,
                config.numcores
            );
            let server = Server::bind(&config)?;
            server.run()?;
        }
        Command::Send {
            node,
            from,
            to,
            amount,
            timestamp,
        } => {
            let timestamp = match timestamp {
                Some(timestamp) => timestamp,
                None => current_timestamp()?,
            };
            let tx = Transaction::new(from.0, to.0, amount, timestamp)?;
            send_transaction(&node, &tx)?;
            println!("Sent {tx}");
        }
        Command::GetBlock {
            node,
            height,
            numtxinblock,
        } => match request_block(&node, height, numtxinblock)? {
            Some(block) => {
                println!("{block}");
                for tx in block.transactions()? {
                    println!("- {tx}");
                }
            }
            None => println!("Block at height {height} not found"),
        },
        Command::Close { node } => {
            send_close(&node)?;
            println!("Done!");
        }
    }
    Ok(())
}
