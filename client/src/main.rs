use clap::Parser;
use log::info;
use std::io::{self, Write};

use client::network::ChatClient;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short, long, default_value_t = format!("127.0.0.1:{}", shared::DEFAULT_PORT))]
    server: String,

    /// Nickname to register with (prompted when omitted)
    #[arg(short, long)]
    nickname: Option<String>,

    /// Number of messages per /history page
    #[arg(long, default_value_t = 10)]
    page_size: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();

    let nickname = match args.nickname {
        Some(nickname) => nickname,
        None => prompt_nickname()?,
    };

    info!("Connecting to {} as '{}'", args.server, nickname);
    let mut chat_client = ChatClient::new(args.server, nickname, args.page_size);
    chat_client.run().await?;

    Ok(())
}

fn prompt_nickname() -> io::Result<String> {
    print!("Enter your nickname: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
