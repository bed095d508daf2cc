//! Client network loop
//!
//! Connects to the hub, then multiplexes two input sources: framed lines
//! from the socket and typed lines from stdin. Each inbound line is
//! decoded once; the receipt path renders it and records it into the
//! local history. The `REGISTER:` prompt is answered automatically with
//! the configured nickname; until registration is confirmed, typed lines
//! are sent raw as retry attempts rather than wrapped as `CHAT:`.

use futures_util::SinkExt;
use log::{debug, error};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio_stream::StreamExt;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};

use crate::history::ChatHistory;
use crate::input::{self, Command};
use crate::rendering;
use shared::{ClientFrame, ServerFrame, MAX_FRAME_LEN};

type FrameSink = FramedWrite<OwnedWriteHalf, LinesCodec>;

const DEFAULT_EXPORT_PATH: &str = "chat_history.txt";

pub struct ChatClient {
    server_addr: String,
    nickname: String,
    registered: bool,
    history: ChatHistory,
}

impl ChatClient {
    pub fn new(server_addr: String, nickname: String, page_size: usize) -> Self {
        Self {
            server_addr,
            nickname,
            registered: false,
            history: ChatHistory::new(page_size),
        }
    }

    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        rendering::print_banner(&self.server_addr);
        let stream = TcpStream::connect(&self.server_addr).await?;
        println!("Connected to server successfully!");
        rendering::print_connected();

        let (read_half, write_half) = stream.into_split();
        let mut frames = FramedRead::new(read_half, LinesCodec::new_with_max_length(MAX_FRAME_LEN));
        let mut sink = FramedWrite::new(write_half, LinesCodec::new());
        let mut stdin_lines = BufReader::new(tokio::io::stdin()).lines();

        rendering::prompt();
        loop {
            tokio::select! {
                inbound = frames.next() => match inbound {
                    Some(Ok(line)) => {
                        if !self.handle_inbound(&line, &mut sink).await {
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        error!("Receive error: {}", e);
                        break;
                    }
                    None => {
                        println!("\nServer disconnected");
                        break;
                    }
                },
                typed = stdin_lines.next_line() => match typed {
                    Ok(Some(line)) => {
                        if !self.handle_input(&line, &mut sink).await {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        error!("Input error: {}", e);
                        break;
                    }
                },
            }
        }

        println!("Disconnecting...");
        Ok(())
    }

    /// Receipt path: decode once, react, render, record.
    async fn handle_inbound(&mut self, line: &str, sink: &mut FrameSink) -> bool {
        let Some(frame) = ServerFrame::decode(line) else {
            rendering::display_raw(line);
            return true;
        };

        match &frame {
            ServerFrame::Register(prompt) => {
                // Answer the nickname request automatically
                println!("\n{}", prompt);
                self.registered = false;
                if sink.send(self.nickname.clone()).await.is_err() {
                    error!("Send failed; connection lost");
                    return false;
                }
                rendering::prompt();
                return true;
            }
            ServerFrame::System(text) => {
                // Registration re-prompts all end with ':'; the first
                // other SYSTEM text is the welcome.
                if !self.registered && !text.ends_with(':') {
                    self.registered = true;
                    debug!("Registration confirmed");
                }
            }
            _ => {}
        }

        self.history.record(frame.kind(), frame.payload());
        rendering::display_frame(&frame);
        true
    }

    async fn handle_input(&mut self, line: &str, sink: &mut FrameSink) -> bool {
        let Some(cmd) = input::parse(line) else {
            rendering::prompt();
            return true;
        };

        match cmd {
            Command::Quit => return false,
            Command::Help => {
                rendering::print_help();
                rendering::prompt();
            }
            Command::Usage(hint) => {
                println!("{}", hint);
                rendering::prompt();
            }
            Command::History(page) => {
                let page = page.unwrap_or(1);
                rendering::display_history_page(
                    page,
                    self.history.page_count(),
                    self.history.page(page),
                );
            }
            Command::Export(path) => {
                let path = path.unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_PATH));
                match self.history.export(&path) {
                    Ok(()) => println!("History exported to {}", path.display()),
                    Err(e) => error!("Export failed: {}", e),
                }
                rendering::prompt();
            }
            Command::Users => return self.send(sink, ClientFrame::Users.encode()).await,
            Command::Private { target, body } => {
                return self
                    .send(sink, ClientFrame::Private { target, body }.encode())
                    .await;
            }
            Command::Chat(text) => {
                // Before registration is confirmed, typed lines are
                // nickname retries and go out unwrapped.
                let wire = if self.registered {
                    ClientFrame::Chat(text).encode()
                } else {
                    text
                };
                return self.send(sink, wire).await;
            }
        }
        true
    }

    async fn send(&mut self, sink: &mut FrameSink, wire: String) -> bool {
        if sink.send(wire).await.is_err() {
            error!("Send failed; connection lost");
            return false;
        }
        rendering::prompt();
        true
    }
}
