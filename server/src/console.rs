//! Server console control surface
//!
//! Reads single-character commands from the server's stdin as its own
//! input source, next to the network: `q` quit, `s` status, `u` list
//! users, `h` help. The surface only consumes read-only snapshots from
//! the hub; it has no write access to routing state. Returning from
//! [`run`] (on `q` or stdin EOF) signals the process to shut down.

use log::warn;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, oneshot};

use crate::hub::{HubCommand, HubStatus};

pub async fn run(hub_tx: mpsc::Sender<HubCommand>, port: u16) {
    print_banner(port);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            _ => break,
        };
        match line.trim().chars().next() {
            Some('q' | 'Q') => {
                println!("Shutting down hub...");
                break;
            }
            Some('s' | 'S') => {
                if let Some(status) = query(&hub_tx).await {
                    print_status(&status, port);
                }
            }
            Some('u' | 'U') => {
                if let Some(status) = query(&hub_tx).await {
                    print_user_list(&status);
                }
            }
            Some('h' | 'H') => print_help(),
            _ => {}
        }
    }
}

async fn query(hub_tx: &mpsc::Sender<HubCommand>) -> Option<HubStatus> {
    let (reply_tx, reply_rx) = oneshot::channel();
    if hub_tx
        .send(HubCommand::Status { reply: reply_tx })
        .await
        .is_err()
    {
        warn!("Hub is gone; console query dropped");
        return None;
    }
    reply_rx.await.ok()
}

fn print_banner(port: u16) {
    println!("=== Network Communication Hub ===");
    println!("Communication hub started on port {}", port);
    println!();
    print_help();
    println!("Hub is ready for client connections...");
    println!();
}

fn print_help() {
    println!();
    println!("=== Hub Control Commands ===");
    println!("q - Shutdown hub");
    println!("s - Display hub status");
    println!("u - List connected clients");
    println!("h - Show command help");
    println!("============================");
    println!();
}

fn print_status(status: &HubStatus, port: u16) {
    let load = if status.capacity > 0 {
        status.clients.len() as f32 / status.capacity as f32 * 100.0
    } else {
        0.0
    };
    println!();
    println!("=== Hub Status ===");
    println!("Listening Port: {}", port);
    println!("Max Capacity: {} clients", status.capacity);
    println!(
        "Current Load: {}/{} clients ({:.1}%)",
        status.clients.len(),
        status.capacity,
        load
    );
    println!(
        "Hub Status: {}",
        if status.clients.is_empty() {
            "Waiting for connections"
        } else {
            "Active"
        }
    );
    if !status.clients.is_empty() {
        println!();
        println!("Connected Clients:");
        println!("------------------");
        for client in &status.clients {
            println!(
                "Slot {}: {} ({}:{}) - Online since {}",
                client.slot + 1,
                client.nickname,
                client.peer_ip,
                client.peer_port,
                client.joined_at.format("%H:%M:%S")
            );
        }
    }
    println!("==================");
    println!();
}

fn print_user_list(status: &HubStatus) {
    println!();
    println!("=== Connected Clients ===");
    if status.clients.is_empty() {
        println!("No clients connected");
    } else {
        println!(
            "Total connected: {}/{}",
            status.clients.len(),
            status.capacity
        );
        println!("-------------------------");
        for (position, client) in status.clients.iter().enumerate() {
            println!("{}. {}", position + 1, client.nickname);
            println!("   IP: {}:{}", client.peer_ip, client.peer_port);
            println!(
                "   Connected: {}",
                client.joined_at.format("%H:%M:%S")
            );
        }
    }
    println!("========================");
    println!();
}
