//! Console rendering for the chat client
//!
//! Inbound frames are printed with their kind prefix stripped, followed
//! by a fresh input prompt, so server traffic can interleave with typing.

use std::io::{self, Write};

use crate::history::HistoryEntry;
use shared::ServerFrame;

pub fn print_banner(server: &str) {
    println!("=== Chat Client ===");
    println!("Connecting to server {}", server);
    println!();
}

pub fn print_connected() {
    println!("=== Connected to Chat Server ===");
    println!("Commands:");
    println!("  /help - Show help");
    println!("  /users - Show online users");
    println!("  /private <nickname> <message> - Send private message");
    println!("  /history [page] - View local chat history");
    println!("  /export [file] - Save local chat history");
    println!("  /quit - Quit chat");
    println!("  Just type to send public message");
    println!("================================");
    println!();
}

pub fn print_help() {
    println!();
    println!("=== Chat Commands Help ===");
    println!("Available Commands:");
    println!("------------------");
    println!("/help                           - Show this help menu");
    println!("/users                          - Display all online users");
    println!("/private <nickname> <message>   - Send private message to user");
    println!("/history [page]                 - View local history (1 = newest page)");
    println!("/export [file]                  - Save history to a text file");
    println!("/quit                           - Exit the chat application");
    println!();
    println!("General Usage:");
    println!("- Type any message and press Enter to send to all users");
    println!("- Commands must start with '/' character");
    println!("- Nicknames are case-sensitive");
    println!("========================");
    println!();
}

/// Render one decoded frame: payload only, then a fresh prompt.
pub fn display_frame(frame: &ServerFrame) {
    println!("\n{}", frame.payload());
    prompt();
}

/// Render a line the codec did not recognize.
pub fn display_raw(line: &str) {
    println!("\n{}", line);
    prompt();
}

pub fn display_history_page(page_no: usize, page_count: usize, entries: &[HistoryEntry]) {
    println!();
    if entries.is_empty() {
        println!("No history on page {}", page_no);
    } else {
        println!("=== History page {}/{} ===", page_no, page_count);
        for entry in entries {
            println!(
                "[{}] {}: {}",
                entry.at.format("%H:%M:%S"),
                entry.kind,
                entry.text
            );
        }
        println!("=========================");
    }
    prompt();
}

pub fn prompt() {
    print!("> ");
    let _ = io::stdout().flush();
}
