//! Routing engine: the hub actor that owns the connection table
//!
//! All connection lifecycle and message routing runs on this single task.
//! Per-connection reader tasks forward their input as [`HubCommand`]s over
//! one mpsc channel; the hub processes commands strictly in arrival order,
//! which preserves per-connection FIFO and keeps the table under a single
//! logical writer. Outbound delivery is fire-and-forget through each
//! slot's unbounded writer channel.
//!
//! Slot states: Free → Connected (unregistered) → Registered → Free.
//! An unregistered slot is never a routing target: its input is the
//! registration attempt, and it is excluded from broadcast and roster
//! operations.

use chrono::{DateTime, Local};
use log::{debug, info, warn};
use std::net::IpAddr;
use tokio::sync::{mpsc, oneshot};

use crate::error::HubError;
use crate::table::{ConnId, ConnectionTable, SlotId};
use shared::{ClientFrame, ServerFrame, MAX_NICKNAME_LEN};

/// Commands sent from connection tasks and the console to the hub actor
#[derive(Debug)]
pub enum HubCommand {
    /// A freshly accepted connection, carrying its outbound channel
    Connect {
        conn: ConnId,
        ip: IpAddr,
        port: u16,
        sender: mpsc::UnboundedSender<ServerFrame>,
    },
    /// One framed line read from a connection
    Inbound { conn: ConnId, line: String },
    /// Reader observed end-of-stream or a read error
    Disconnect { conn: ConnId },
    /// Read-only snapshot for the console surface
    Status { reply: oneshot::Sender<HubStatus> },
}

/// One registered client in a status snapshot.
#[derive(Debug, Clone)]
pub struct RosterEntry {
    pub slot: SlotId,
    pub nickname: String,
    pub peer_ip: IpAddr,
    pub peer_port: u16,
    pub joined_at: DateTime<Local>,
}

/// Read-only view of the table for the console surface.
#[derive(Debug, Clone)]
pub struct HubStatus {
    pub capacity: usize,
    pub clients: Vec<RosterEntry>,
}

/// The hub actor. Owns the connection table for its whole lifetime.
pub struct Hub {
    table: ConnectionTable,
    receiver: mpsc::Receiver<HubCommand>,
}

impl Hub {
    pub fn new(capacity: usize, receiver: mpsc::Receiver<HubCommand>) -> Self {
        Self {
            table: ConnectionTable::new(capacity),
            receiver,
        }
    }

    /// Runs the routing loop until every command sender is dropped.
    pub async fn run(mut self) {
        info!("Hub started (capacity {})", self.table.capacity());

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!("Hub shutting down");
    }

    fn handle_command(&mut self, cmd: HubCommand) {
        match cmd {
            HubCommand::Connect { conn, ip, port, sender } => {
                self.handle_connect(conn, ip, port, sender);
            }
            HubCommand::Inbound { conn, line } => self.handle_inbound(conn, &line),
            HubCommand::Disconnect { conn } => self.handle_disconnect(conn),
            HubCommand::Status { reply } => self.handle_status(reply),
        }
    }

    /// Accept transition: allocate a slot and prompt for a nickname, or
    /// reject without consuming a slot when the table is full.
    fn handle_connect(
        &mut self,
        conn: ConnId,
        ip: IpAddr,
        port: u16,
        sender: mpsc::UnboundedSender<ServerFrame>,
    ) {
        match self.table.allocate(conn, sender.clone(), ip, port) {
            Some(slot_id) => {
                info!(
                    "New client connected from {}:{} (slot {}) - awaiting registration",
                    ip,
                    port,
                    slot_id + 1
                );
                if let Some(slot) = self.table.get(slot_id) {
                    slot.send(ServerFrame::register_prompt());
                }
            }
            None => {
                warn!("Maximum client capacity reached, rejecting {}:{}", ip, port);
                // Dropping this sender after the notice closes the writer
                // task and with it the transport.
                let _ = sender.send(HubError::CapacityExceeded.to_frame());
            }
        }
    }

    fn handle_inbound(&mut self, conn: ConnId, line: &str) {
        let Some(slot_id) = self.table.find_by_conn(conn) else {
            debug!("Input from unknown connection {}", conn);
            return;
        };
        let registered = match self.table.get(slot_id) {
            Some(slot) => slot.registered,
            None => return,
        };
        if registered {
            self.dispatch(slot_id, line);
        } else {
            self.register(slot_id, line);
        }
    }

    /// Registration attempt for a Connected (unregistered) slot. On
    /// failure the slot stays Connected and the client may retry.
    fn register(&mut self, slot_id: SlotId, raw: &str) {
        let nickname = raw.trim_end_matches(['\r', '\n']).to_string();

        if let Err(err) = self.try_register(slot_id, &nickname) {
            debug!("Registration failed for slot {}: {}", slot_id + 1, err);
            if let Some(slot) = self.table.get(slot_id) {
                slot.send(err.to_frame());
            }
            return;
        }

        if let Some(slot) = self.table.get(slot_id) {
            info!(
                "Client '{}' registered from {}:{} (slot {})",
                nickname,
                slot.peer_ip,
                slot.peer_port,
                slot_id + 1
            );
            slot.send(ServerFrame::welcome(&nickname));
        }
        self.broadcast(&ServerFrame::joined(&nickname), Some(slot_id));
        info!("Broadcasted: {} joined the hub", nickname);
    }

    fn try_register(&mut self, slot_id: SlotId, nickname: &str) -> Result<(), HubError> {
        if nickname.is_empty() || nickname.len() > MAX_NICKNAME_LEN {
            return Err(HubError::InvalidNickname);
        }
        if self.table.find_by_nickname(nickname).is_some() {
            return Err(HubError::DuplicateNickname);
        }
        match self.table.get_mut(slot_id) {
            Some(slot) => {
                slot.nickname = nickname.to_string();
                slot.registered = true;
                Ok(())
            }
            None => Err(HubError::InvalidNickname),
        }
    }

    /// Steady-state routing for a registered slot. Lines that parse to
    /// nothing (empty input, malformed PRIVATE) are dropped silently.
    fn dispatch(&mut self, slot_id: SlotId, line: &str) {
        let Some(frame) = ClientFrame::parse(line) else {
            debug!("Dropping unroutable input from slot {}", slot_id + 1);
            return;
        };
        match frame {
            ClientFrame::Chat(body) => self.handle_chat(slot_id, &body),
            ClientFrame::Private { target, body } => self.handle_private(slot_id, &target, &body),
            ClientFrame::Users => self.handle_users(slot_id),
        }
    }

    fn handle_chat(&mut self, sender_slot: SlotId, body: &str) {
        let nickname = match self.table.get(sender_slot) {
            Some(slot) => slot.nickname.clone(),
            None => return,
        };
        self.broadcast(&ServerFrame::chat(&nickname, body), Some(sender_slot));
        info!("Public chat: {}: {}", nickname, body);
    }

    fn handle_private(&mut self, sender_slot: SlotId, target: &str, body: &str) {
        let Some(sender) = self.table.get(sender_slot) else {
            return;
        };

        let Some(target_slot) = self.table.find_by_nickname(target) else {
            debug!(
                "Private target '{}' not found (from '{}')",
                target, sender.nickname
            );
            sender.send(HubError::TargetNotFound(target.to_string()).to_frame());
            return;
        };

        // Deliver to the target and confirm to the sender - both, so the
        // sender sees its own message echoed.
        if let Some(receiver) = self.table.get(target_slot) {
            receiver.send(ServerFrame::private_delivery(&sender.nickname, body));
        }
        sender.send(ServerFrame::private_confirmation(target, body));
        info!("Private message: {} -> {}: {}", sender.nickname, target, body);
    }

    fn handle_users(&mut self, slot_id: SlotId) {
        let names: Vec<String> = self
            .table
            .registered()
            .map(|(_, slot)| slot.nickname.clone())
            .collect();
        if let Some(slot) = self.table.get(slot_id) {
            slot.send(ServerFrame::roster(&names));
        }
    }

    /// Disconnect transition. A registered slot gets a leave notice
    /// broadcast before release; an unregistered one is released silently.
    fn handle_disconnect(&mut self, conn: ConnId) {
        // Rejected connections never held a slot and land here too.
        let Some(slot_id) = self.table.find_by_conn(conn) else {
            return;
        };
        let (registered, nickname) = match self.table.get(slot_id) {
            Some(slot) => (slot.registered, slot.nickname.clone()),
            None => return,
        };

        if registered {
            self.broadcast(&ServerFrame::left(&nickname), Some(slot_id));
            info!("Broadcasted: {} left the hub", nickname);
        }

        if let Some(slot) = self.table.release(slot_id) {
            if registered {
                info!(
                    "Client '{}' disconnected from {}:{} (slot {})",
                    nickname,
                    slot.peer_ip,
                    slot.peer_port,
                    slot_id + 1
                );
            } else {
                info!(
                    "Unauthenticated client from {}:{} disconnected",
                    slot.peer_ip, slot.peer_port
                );
            }
        }
    }

    fn handle_status(&mut self, reply: oneshot::Sender<HubStatus>) {
        let clients = self
            .table
            .registered()
            .map(|(slot_id, slot)| RosterEntry {
                slot: slot_id,
                nickname: slot.nickname.clone(),
                peer_ip: slot.peer_ip,
                peer_port: slot.peer_port,
                joined_at: slot.joined_at,
            })
            .collect();
        let _ = reply.send(HubStatus {
            capacity: self.table.capacity(),
            clients,
        });
    }

    /// Best-effort fan-out to every registered slot in ascending slot
    /// order, optionally excluding one slot (the sender). A failed write
    /// never aborts delivery to the remaining peers.
    fn broadcast(&self, frame: &ServerFrame, exclude: Option<SlotId>) {
        for (slot_id, slot) in self.table.registered() {
            if Some(slot_id) == exclude {
                continue;
            }
            if !slot.send(frame.clone()) {
                debug!(
                    "Write to slot {} failed; peer will be reaped on its next read",
                    slot_id + 1
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_hub(capacity: usize) -> Hub {
        let (_tx, rx) = mpsc::channel(8);
        Hub::new(capacity, rx)
    }

    fn connect(hub: &mut Hub, conn: ConnId) -> mpsc::UnboundedReceiver<ServerFrame> {
        let (tx, rx) = mpsc::unbounded_channel();
        hub.handle_command(HubCommand::Connect {
            conn,
            ip: "127.0.0.1".parse().unwrap(),
            port: 40000 + conn as u16,
            sender: tx,
        });
        rx
    }

    fn send_line(hub: &mut Hub, conn: ConnId, line: &str) {
        hub.handle_command(HubCommand::Inbound {
            conn,
            line: line.to_string(),
        });
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<ServerFrame>) -> Vec<String> {
        let mut frames = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            frames.push(frame.encode());
        }
        frames
    }

    fn status(hub: &mut Hub) -> HubStatus {
        let (tx, mut rx) = oneshot::channel();
        hub.handle_command(HubCommand::Status { reply: tx });
        rx.try_recv().unwrap()
    }

    #[test]
    fn test_connect_prompts_for_nickname() {
        let mut hub = test_hub(2);
        let mut rx = connect(&mut hub, 1);
        assert_eq!(drain(&mut rx), vec!["REGISTER:Please enter your nickname:"]);
    }

    #[test]
    fn test_connect_rejected_at_capacity() {
        let mut hub = test_hub(1);
        let mut first = connect(&mut hub, 1);
        let mut second = connect(&mut hub, 2);

        assert_eq!(
            drain(&mut second),
            vec!["SYSTEM:Communication hub is full. Please try again later."]
        );
        // The rejected connection never consumed the occupied slot
        drain(&mut first);
        send_line(&mut hub, 1, "Alice");
        assert_eq!(drain(&mut first).len(), 1); // welcome still delivered
    }

    #[test]
    fn test_registration_welcome_and_join_notice() {
        let mut hub = test_hub(3);
        let mut alice = connect(&mut hub, 1);
        send_line(&mut hub, 1, "Alice");
        let frames = drain(&mut alice);
        assert_eq!(
            frames,
            vec![
                "REGISTER:Please enter your nickname:",
                "SYSTEM:Welcome to the communication hub, Alice! Use USERS to see online clients.",
            ]
        );

        let mut bob = connect(&mut hub, 2);
        send_line(&mut hub, 2, "Bob");
        drain(&mut bob);
        // Only the other registered client sees the join notice
        assert_eq!(
            drain(&mut alice),
            vec!["SYSTEM:*** Bob has joined the communication hub! ***"]
        );
    }

    #[test]
    fn test_duplicate_nickname_keeps_slot_unregistered() {
        let mut hub = test_hub(3);
        let mut alice = connect(&mut hub, 1);
        send_line(&mut hub, 1, "Alice");
        drain(&mut alice);

        let mut intruder = connect(&mut hub, 2);
        send_line(&mut hub, 2, "Alice");
        let frames = drain(&mut intruder);
        assert_eq!(
            frames,
            vec![
                "REGISTER:Please enter your nickname:",
                "SYSTEM:Nickname already taken. Please choose another:",
            ]
        );
        // Alice is unaffected
        assert!(drain(&mut alice).is_empty());
        // The slot stays Connected: a retry with a free name succeeds
        send_line(&mut hub, 2, "Bob");
        assert_eq!(
            drain(&mut intruder),
            vec!["SYSTEM:Welcome to the communication hub, Bob! Use USERS to see online clients."]
        );
    }

    #[test]
    fn test_nickname_is_case_sensitive() {
        let mut hub = test_hub(3);
        let mut alice = connect(&mut hub, 1);
        send_line(&mut hub, 1, "Alice");
        drain(&mut alice);

        let mut other = connect(&mut hub, 2);
        send_line(&mut hub, 2, "alice");
        let frames = drain(&mut other);
        assert_eq!(frames.len(), 2);
        assert!(frames[1].starts_with("SYSTEM:Welcome"));
    }

    #[test]
    fn test_invalid_nickname_rejected() {
        let mut hub = test_hub(2);
        let mut rx = connect(&mut hub, 1);
        drain(&mut rx);

        send_line(&mut hub, 1, "");
        assert_eq!(
            drain(&mut rx),
            vec!["SYSTEM:Invalid nickname. Please try again:"]
        );

        send_line(&mut hub, 1, &"x".repeat(MAX_NICKNAME_LEN + 1));
        assert_eq!(
            drain(&mut rx),
            vec!["SYSTEM:Invalid nickname. Please try again:"]
        );
    }

    #[test]
    fn test_chat_broadcast_excludes_sender() {
        let mut hub = test_hub(3);
        let mut alice = connect(&mut hub, 1);
        send_line(&mut hub, 1, "Alice");
        let mut bob = connect(&mut hub, 2);
        send_line(&mut hub, 2, "Bob");
        drain(&mut alice);
        drain(&mut bob);

        send_line(&mut hub, 2, "CHAT:hi");
        assert_eq!(drain(&mut alice), vec!["CHAT:[Bob]: hi"]);
        assert!(drain(&mut bob).is_empty());
    }

    #[test]
    fn test_implicit_chat_for_unrecognized_input() {
        let mut hub = test_hub(3);
        let mut alice = connect(&mut hub, 1);
        send_line(&mut hub, 1, "Alice");
        let mut bob = connect(&mut hub, 2);
        send_line(&mut hub, 2, "Bob");
        drain(&mut alice);
        drain(&mut bob);

        send_line(&mut hub, 2, "hello all");
        assert_eq!(drain(&mut alice), vec!["CHAT:[Bob]: hello all"]);
    }

    #[test]
    fn test_unregistered_slot_excluded_from_broadcast() {
        let mut hub = test_hub(3);
        let mut alice = connect(&mut hub, 1);
        send_line(&mut hub, 1, "Alice");
        let mut bob = connect(&mut hub, 2);
        send_line(&mut hub, 2, "Bob");
        let mut lurker = connect(&mut hub, 3); // never registers
        drain(&mut alice);
        drain(&mut bob);
        drain(&mut lurker);

        send_line(&mut hub, 1, "CHAT:anyone here?");
        assert_eq!(drain(&mut bob), vec!["CHAT:[Alice]: anyone here?"]);
        assert!(drain(&mut lurker).is_empty());
    }

    #[test]
    fn test_private_delivers_to_both_parties() {
        let mut hub = test_hub(3);
        let mut alice = connect(&mut hub, 1);
        send_line(&mut hub, 1, "Alice");
        let mut bob = connect(&mut hub, 2);
        send_line(&mut hub, 2, "Bob");
        drain(&mut alice);
        drain(&mut bob);

        send_line(&mut hub, 1, "PRIVATE:Bob:hey");
        assert_eq!(drain(&mut bob), vec!["PRIVATE:[Alice -> You]: hey"]);
        assert_eq!(drain(&mut alice), vec!["PRIVATE:[You -> Bob]: hey"]);
    }

    #[test]
    fn test_private_to_unknown_target() {
        let mut hub = test_hub(3);
        let mut alice = connect(&mut hub, 1);
        send_line(&mut hub, 1, "Alice");
        let mut bob = connect(&mut hub, 2);
        send_line(&mut hub, 2, "Bob");
        drain(&mut alice);
        drain(&mut bob);

        send_line(&mut hub, 1, "PRIVATE:Carol:hey");
        // Exactly one SYSTEM error to the sender, nothing else
        assert_eq!(
            drain(&mut alice),
            vec!["SYSTEM:User 'Carol' not found or offline"]
        );
        assert!(drain(&mut bob).is_empty());
    }

    #[test]
    fn test_malformed_private_is_dropped() {
        let mut hub = test_hub(3);
        let mut alice = connect(&mut hub, 1);
        send_line(&mut hub, 1, "Alice");
        let mut bob = connect(&mut hub, 2);
        send_line(&mut hub, 2, "Bob");
        drain(&mut alice);
        drain(&mut bob);

        send_line(&mut hub, 1, "PRIVATE:Bob");
        assert!(drain(&mut alice).is_empty());
        assert!(drain(&mut bob).is_empty());
    }

    #[test]
    fn test_roster_in_slot_order() {
        let mut hub = test_hub(3);
        let mut alice = connect(&mut hub, 1);
        send_line(&mut hub, 1, "Alice");
        let mut bob = connect(&mut hub, 2);
        send_line(&mut hub, 2, "Bob");
        drain(&mut alice);
        drain(&mut bob);

        send_line(&mut hub, 2, "USERS");
        assert_eq!(drain(&mut bob), vec!["USERS:Online users: Alice, Bob"]);
        assert!(drain(&mut alice).is_empty());
    }

    #[test]
    fn test_disconnect_broadcasts_leave_and_frees_slot() {
        let mut hub = test_hub(2);
        let mut alice = connect(&mut hub, 1);
        send_line(&mut hub, 1, "Alice");
        let mut bob = connect(&mut hub, 2);
        send_line(&mut hub, 2, "Bob");
        drain(&mut alice);
        drain(&mut bob);

        hub.handle_command(HubCommand::Disconnect { conn: 2 });
        assert_eq!(
            drain(&mut alice),
            vec!["SYSTEM:*** Bob has left the communication hub! ***"]
        );

        // The slot is reusable by a new accept in a full-capacity table
        let mut carol = connect(&mut hub, 3);
        send_line(&mut hub, 3, "Carol");
        let frames = drain(&mut carol);
        assert_eq!(frames[0], "REGISTER:Please enter your nickname:");
        assert!(frames[1].starts_with("SYSTEM:Welcome"));
    }

    #[test]
    fn test_unregistered_disconnect_is_silent() {
        let mut hub = test_hub(2);
        let mut alice = connect(&mut hub, 1);
        send_line(&mut hub, 1, "Alice");
        let mut lurker = connect(&mut hub, 2);
        drain(&mut alice);
        drain(&mut lurker);

        hub.handle_command(HubCommand::Disconnect { conn: 2 });
        assert!(drain(&mut alice).is_empty());
        assert_eq!(status(&mut hub).clients.len(), 1);
    }

    #[test]
    fn test_status_snapshot_covers_registered_only() {
        let mut hub = test_hub(3);
        let mut alice = connect(&mut hub, 1);
        send_line(&mut hub, 1, "Alice");
        let _lurker = connect(&mut hub, 2);
        drain(&mut alice);

        let snapshot = status(&mut hub);
        assert_eq!(snapshot.capacity, 3);
        assert_eq!(snapshot.clients.len(), 1);
        assert_eq!(snapshot.clients[0].nickname, "Alice");
        assert_eq!(snapshot.clients[0].slot, 0);
    }

    #[test]
    fn test_nickname_uniqueness_invariant_over_register_sequences() {
        let mut hub = test_hub(4);
        for conn in 1..=4 {
            let _rx = connect(&mut hub, conn);
            send_line(&mut hub, conn, "Alice");
        }
        // However many attempts, at most one registered slot holds the name
        let snapshot = status(&mut hub);
        let alices = snapshot
            .clients
            .iter()
            .filter(|c| c.nickname == "Alice")
            .count();
        assert_eq!(alices, 1);
    }
}
