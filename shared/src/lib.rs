//! Wire protocol for the communication hub.
//!
//! Frames are ASCII lines of the form `TYPE:payload` (or
//! `PRIVATE:target:body` from the client), one frame per newline-terminated
//! line. Framing itself is handled at the I/O boundaries with a
//! line codec; this crate only defines the frame vocabulary and the
//! canned server texts.

/// Default TCP port for the hub.
pub const DEFAULT_PORT: u16 = 8888;

/// Maximum accepted nickname length, in bytes.
pub const MAX_NICKNAME_LEN: usize = 32;

/// Maximum length of a single wire frame, in bytes. Longer lines are a
/// framing error and drop the connection.
pub const MAX_FRAME_LEN: usize = 1024;

/// A frame sent from a registered client to the hub.
///
/// Input from an unregistered connection is never parsed into a
/// `ClientFrame` — the raw line is the registration attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientFrame {
    /// Public broadcast request.
    Chat(String),
    /// Private message to a named peer.
    Private { target: String, body: String },
    /// Roster request.
    Users,
}

impl ClientFrame {
    /// Parse one inbound line. Returns `None` when there is nothing to
    /// route: empty lines, and malformed `PRIVATE:` frames missing the
    /// second separator (silently dropped). Any other unrecognized input
    /// is an implicit broadcast.
    pub fn parse(line: &str) -> Option<ClientFrame> {
        if line.is_empty() {
            return None;
        }
        if let Some(body) = line.strip_prefix("CHAT:") {
            return Some(ClientFrame::Chat(body.to_string()));
        }
        if let Some(rest) = line.strip_prefix("PRIVATE:") {
            let (target, body) = rest.split_once(':')?;
            return Some(ClientFrame::Private {
                target: target.to_string(),
                body: body.to_string(),
            });
        }
        if line == "USERS" {
            return Some(ClientFrame::Users);
        }
        Some(ClientFrame::Chat(line.to_string()))
    }

    /// Serialize to the wire form (without the line terminator).
    pub fn encode(&self) -> String {
        match self {
            ClientFrame::Chat(body) => format!("CHAT:{}", body),
            ClientFrame::Private { target, body } => format!("PRIVATE:{}:{}", target, body),
            ClientFrame::Users => "USERS".to_string(),
        }
    }
}

/// A frame sent from the hub to a client.
///
/// Payloads arrive fully composed (`CHAT:[sender]: body` etc.); clients
/// render them as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerFrame {
    /// Nickname request, sent once a slot is allocated.
    Register(String),
    /// Status text, error, or join/leave notice.
    System(String),
    /// Broadcast delivery.
    Chat(String),
    /// Private delivery or confirmation.
    Private(String),
    /// Roster reply.
    Users(String),
}

impl ServerFrame {
    /// Decode one inbound line by its prefix. Unknown lines yield `None`;
    /// clients display those raw.
    pub fn decode(line: &str) -> Option<ServerFrame> {
        if let Some(rest) = line.strip_prefix("REGISTER:") {
            Some(ServerFrame::Register(rest.to_string()))
        } else if let Some(rest) = line.strip_prefix("SYSTEM:") {
            Some(ServerFrame::System(rest.to_string()))
        } else if let Some(rest) = line.strip_prefix("CHAT:") {
            Some(ServerFrame::Chat(rest.to_string()))
        } else if let Some(rest) = line.strip_prefix("PRIVATE:") {
            Some(ServerFrame::Private(rest.to_string()))
        } else if let Some(rest) = line.strip_prefix("USERS:") {
            Some(ServerFrame::Users(rest.to_string()))
        } else {
            None
        }
    }

    /// Serialize to the wire form (without the line terminator).
    pub fn encode(&self) -> String {
        match self {
            ServerFrame::Register(text) => format!("REGISTER:{}", text),
            ServerFrame::System(text) => format!("SYSTEM:{}", text),
            ServerFrame::Chat(text) => format!("CHAT:{}", text),
            ServerFrame::Private(text) => format!("PRIVATE:{}", text),
            ServerFrame::Users(text) => format!("USERS:{}", text),
        }
    }

    /// The frame's kind label, as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerFrame::Register(_) => "REGISTER",
            ServerFrame::System(_) => "SYSTEM",
            ServerFrame::Chat(_) => "CHAT",
            ServerFrame::Private(_) => "PRIVATE",
            ServerFrame::Users(_) => "USERS",
        }
    }

    /// The payload text, without the kind prefix.
    pub fn payload(&self) -> &str {
        match self {
            ServerFrame::Register(text)
            | ServerFrame::System(text)
            | ServerFrame::Chat(text)
            | ServerFrame::Private(text)
            | ServerFrame::Users(text) => text,
        }
    }

    pub fn register_prompt() -> ServerFrame {
        ServerFrame::Register("Please enter your nickname:".to_string())
    }

    pub fn welcome(nickname: &str) -> ServerFrame {
        ServerFrame::System(format!(
            "Welcome to the communication hub, {}! Use USERS to see online clients.",
            nickname
        ))
    }

    pub fn joined(nickname: &str) -> ServerFrame {
        ServerFrame::System(format!(
            "*** {} has joined the communication hub! ***",
            nickname
        ))
    }

    pub fn left(nickname: &str) -> ServerFrame {
        ServerFrame::System(format!(
            "*** {} has left the communication hub! ***",
            nickname
        ))
    }

    pub fn chat(sender: &str, body: &str) -> ServerFrame {
        ServerFrame::Chat(format!("[{}]: {}", sender, body))
    }

    pub fn private_delivery(sender: &str, body: &str) -> ServerFrame {
        ServerFrame::Private(format!("[{} -> You]: {}", sender, body))
    }

    pub fn private_confirmation(target: &str, body: &str) -> ServerFrame {
        ServerFrame::Private(format!("[You -> {}]: {}", target, body))
    }

    /// Roster reply over the registered nicknames, in table order.
    pub fn roster(nicknames: &[String]) -> ServerFrame {
        if nicknames.is_empty() {
            ServerFrame::Users("No users online".to_string())
        } else {
            ServerFrame::Users(format!("Online users: {}", nicknames.join(", ")))
        }
    }
}
