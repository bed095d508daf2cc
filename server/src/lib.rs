//! # Communication Hub Server Library
//!
//! This library implements the central hub of the chat system. It accepts
//! TCP connections, registers each client under a unique nickname, and
//! routes broadcast and private messages between clients.
//!
//! ## Architecture
//!
//! The hub uses one lightweight task per connection communicating with a
//! single coordinating actor over an mpsc channel:
//!
//! - **Connection tasks** (`connection`): each accepted stream is split
//!   into a framed reader that forwards lines to the hub and a writer
//!   that drains the slot's outbound channel.
//! - **Hub actor** (`hub`): the one owner of the connection table. It
//!   drives the registration state machine and all routing (broadcast,
//!   private delivery, roster). Because it processes commands strictly in
//!   arrival order, the table has a single logical writer and broadcast
//!   iteration order is deterministic.
//! - **Connection table** (`table`): fixed-capacity slot registry. Slots
//!   are allocated on accept, promoted on registration, and released for
//!   reuse on disconnect.
//! - **Console surface** (`console`): stdin commands (`q`/`s`/`u`/`h`)
//!   answered from read-only hub snapshots.
//!
//! ## Client lifecycle
//!
//! Free → Connected (unregistered) → Registered → Free. A connection that
//! arrives when the table is full is sent a rejection notice and closed
//! without consuming a slot. An unregistered slot is never a routing
//! target.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::{connection, hub::Hub};
//! use tokio::net::TcpListener;
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let listener = TcpListener::bind("127.0.0.1:8888").await?;
//!     let (hub_tx, hub_rx) = mpsc::channel(256);
//!     tokio::spawn(Hub::new(10, hub_rx).run());
//!
//!     let mut next_conn = 1u64;
//!     loop {
//!         let (stream, _) = listener.accept().await?;
//!         let conn = next_conn;
//!         next_conn += 1;
//!         tokio::spawn(connection::handle_connection(stream, conn, hub_tx.clone()));
//!     }
//! }
//! ```

pub mod connection;
pub mod console;
pub mod error;
pub mod hub;
pub mod table;
