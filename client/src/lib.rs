//! # Chat Client Library
//!
//! Console client for the communication hub. Connects over TCP, answers
//! the registration prompt, turns typed commands into protocol frames,
//! and renders inbound traffic while keeping a local paginated history.
//!
//! ## Module Organization
//!
//! - **`network`**: the event loop - one `select!` over framed socket
//!   lines and stdin lines; owns registration state and dispatches both
//!   directions.
//! - **`input`**: parses typed lines into [`input::Command`] values
//!   (`/help`, `/users`, `/private`, `/history`, `/export`, `/quit`,
//!   plain chat).
//! - **`rendering`**: console output - banners, help, per-frame display,
//!   the input prompt.
//! - **`history`**: local timestamped record of rendered messages with
//!   newest-first pagination and plain-text export.

pub mod history;
pub mod input;
pub mod network;
pub mod rendering;
