//! Typed-command parsing for the client input loop
//!
//! Translates one typed line into a [`Command`]. Slash commands cover the
//! protocol operations plus the local history; anything else is a public
//! message. Unknown slash input falls through to chat, matching the
//! permissive server default.

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Public message (the default for plain text)
    Chat(String),
    /// `/private <nickname> <message>`
    Private { target: String, body: String },
    /// `/users` - request the online roster
    Users,
    /// `/help` - local help text
    Help,
    /// `/history [page]` - view a page of local history (1 = newest)
    History(Option<usize>),
    /// `/export [file]` - write local history to a file
    Export(Option<PathBuf>),
    /// `/quit`
    Quit,
    /// Malformed command; the payload is the usage hint to print
    Usage(&'static str),
}

/// Parse one typed line. Returns `None` for blank input.
pub fn parse(line: &str) -> Option<Command> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return None;
    }

    match line {
        "/quit" => return Some(Command::Quit),
        "/help" => return Some(Command::Help),
        "/users" => return Some(Command::Users),
        "/history" => return Some(Command::History(None)),
        "/export" => return Some(Command::Export(None)),
        _ => {}
    }

    if let Some(rest) = line.strip_prefix("/private ") {
        return Some(match rest.split_once(' ') {
            Some((target, body)) if !target.is_empty() => Command::Private {
                target: target.to_string(),
                body: body.to_string(),
            },
            _ => Command::Usage("Usage: /private <nickname> <message>"),
        });
    }

    if let Some(rest) = line.strip_prefix("/history ") {
        return Some(match rest.trim().parse::<usize>() {
            Ok(page) if page > 0 => Command::History(Some(page)),
            _ => Command::Usage("Usage: /history [page]"),
        });
    }

    if let Some(rest) = line.strip_prefix("/export ") {
        let path = rest.trim();
        if path.is_empty() {
            return Some(Command::Export(None));
        }
        return Some(Command::Export(Some(PathBuf::from(path))));
    }

    Some(Command::Chat(line.to_string()))
}
