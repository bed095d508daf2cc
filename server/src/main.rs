use clap::Parser;
use log::{error, info};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use server::hub::Hub;
use server::{connection, console};

/// Channel buffer size for hub commands
const HUB_CHANNEL_SIZE: usize = 256;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind the listener to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = shared::DEFAULT_PORT)]
    port: u16,

    /// Maximum number of concurrent clients
    #[arg(short, long, default_value_t = 10)]
    capacity: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();

    let addr = format!("{}:{}", args.host, args.port);
    // A failed bind propagates out of main: exit code 1
    let listener = TcpListener::bind(&addr).await?;
    info!("Communication hub listening on {}", addr);

    let (hub_tx, hub_rx) = mpsc::channel(HUB_CHANNEL_SIZE);
    tokio::spawn(Hub::new(args.capacity, hub_rx).run());

    // Connection accept loop, one accept at a time
    let accept_hub_tx = hub_tx.clone();
    let accept_task = tokio::spawn(async move {
        let mut next_conn: u64 = 1;
        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    let conn = next_conn;
                    next_conn += 1;
                    info!("Accepted connection {} from {}", conn, peer);
                    tokio::spawn(connection::handle_connection(
                        stream,
                        conn,
                        accept_hub_tx.clone(),
                    ));
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    });

    let console_task = tokio::spawn(console::run(hub_tx, args.port));

    // Run until the console requests shutdown or the process is signaled
    tokio::select! {
        result = accept_task => {
            if let Err(e) = result {
                error!("Accept loop panicked: {}", e);
            }
        }
        _ = console_task => {
            info!("Console requested shutdown");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
