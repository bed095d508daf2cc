//! Hub error taxonomy.
//!
//! Every variant is local to one client and answered as a `SYSTEM:` frame
//! to that client only; none is fatal to the hub. The Display strings are
//! the exact wire texts. Peer write failures have no variant here: a failed
//! fan-out send is ignored and the peer is reaped when its reader observes
//! the closed transport.

use shared::ServerFrame;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HubError {
    /// No free slot for a new connection; the transport is rejected.
    #[error("Communication hub is full. Please try again later.")]
    CapacityExceeded,

    /// Empty or over-length nickname; the slot stays unregistered.
    #[error("Invalid nickname. Please try again:")]
    InvalidNickname,

    /// Another registered slot already holds this exact nickname.
    #[error("Nickname already taken. Please choose another:")]
    DuplicateNickname,

    /// Private-message target is not a registered nickname.
    #[error("User '{0}' not found or offline")]
    TargetNotFound(String),
}

impl HubError {
    /// The `SYSTEM:` reply delivered to the offending client.
    pub fn to_frame(&self) -> ServerFrame {
        ServerFrame::System(self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_wire_texts() {
        assert_eq!(
            HubError::CapacityExceeded.to_frame().encode(),
            "SYSTEM:Communication hub is full. Please try again later."
        );
        assert_eq!(
            HubError::TargetNotFound("Carol".to_string()).to_frame().encode(),
            "SYSTEM:User 'Carol' not found or offline"
        );
    }
}
