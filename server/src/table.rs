//! Connection table: the fixed-capacity slot registry for client state
//!
//! This module owns the per-client bookkeeping on the server side:
//! - Slot allocation on accept and release-for-reuse on disconnect
//! - The two-phase lifecycle flag (connected vs. registered)
//! - Nickname and connection lookups used by the routing engine
//! - Deterministic slot-order iteration, which fixes broadcast fan-out
//!   order and roster display order
//!
//! The table is plain data: it is only ever touched from the hub task, so
//! no synchronization is needed (single logical writer).

use chrono::{DateTime, Local};
use shared::ServerFrame;
use std::net::IpAddr;
use tokio::sync::mpsc;

/// Index of a slot in the table. Stable for the lifetime of one
/// connection, then reused.
pub type SlotId = usize;

/// Identity of a live connection, handed out by the accept loop.
/// Never reused, unlike slot ids.
pub type ConnId = u64;

/// State for one connected client
///
/// The outbound transport handle is the sending end of that connection's
/// writer-task channel; dropping it (on release) closes the writer and
/// with it the socket.
#[derive(Debug)]
pub struct ClientSlot {
    /// Connection identity, assigned at accept time
    pub conn: ConnId,
    /// Outbound frame channel to this client's writer task
    pub sender: mpsc::UnboundedSender<ServerFrame>,
    /// Unique among registered slots; empty until registration
    pub nickname: String,
    /// Peer address, informational
    pub peer_ip: IpAddr,
    /// Peer port, informational
    pub peer_port: u16,
    /// Accept time, used for "online since" displays
    pub joined_at: DateTime<Local>,
    /// An unregistered slot is never a routing target
    pub registered: bool,
}

impl ClientSlot {
    fn new(conn: ConnId, sender: mpsc::UnboundedSender<ServerFrame>, ip: IpAddr, port: u16) -> Self {
        Self {
            conn,
            sender,
            nickname: String::new(),
            peer_ip: ip,
            peer_port: port,
            joined_at: Local::now(),
            registered: false,
        }
    }

    /// Best-effort write. Returns false when the writer task is gone;
    /// the caller does not treat that as fatal (the slot is reaped when
    /// its reader observes the closed transport).
    pub fn send(&self, frame: ServerFrame) -> bool {
        self.sender.send(frame).is_ok()
    }
}

/// Fixed-capacity table of client slots
///
/// Capacity is a constructor parameter. New connections take the first
/// free slot; released slots are immediately reusable.
pub struct ConnectionTable {
    slots: Vec<Option<ClientSlot>>,
}

impl ConnectionTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots, registered or not.
    pub fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Number of registered clients (the roster size).
    pub fn registered_count(&self) -> usize {
        self.registered().count()
    }

    /// Takes the first free slot for a new connection. Returns `None`
    /// when the table is full, signaling the caller to reject the
    /// connection without consuming a slot.
    pub fn allocate(
        &mut self,
        conn: ConnId,
        sender: mpsc::UnboundedSender<ServerFrame>,
        ip: IpAddr,
        port: u16,
    ) -> Option<SlotId> {
        let slot_id = self.slots.iter().position(|s| s.is_none())?;
        self.slots[slot_id] = Some(ClientSlot::new(conn, sender, ip, port));
        Some(slot_id)
    }

    /// Clears the slot and frees it for reuse. Returns the released state
    /// so the caller can log it. Dropping the contained sender closes the
    /// client's writer task and thus the transport.
    pub fn release(&mut self, slot_id: SlotId) -> Option<ClientSlot> {
        self.slots.get_mut(slot_id)?.take()
    }

    pub fn get(&self, slot_id: SlotId) -> Option<&ClientSlot> {
        self.slots.get(slot_id)?.as_ref()
    }

    pub fn get_mut(&mut self, slot_id: SlotId) -> Option<&mut ClientSlot> {
        self.slots.get_mut(slot_id)?.as_mut()
    }

    /// Finds the slot holding a connection. Scans all occupied slots —
    /// the lifecycle must address unregistered slots too.
    pub fn find_by_conn(&self, conn: ConnId) -> Option<SlotId> {
        self.slots
            .iter()
            .position(|s| s.as_ref().is_some_and(|slot| slot.conn == conn))
    }

    /// Finds a registered slot by exact, case-sensitive nickname.
    /// Unregistered slots are never matchable by nickname.
    pub fn find_by_nickname(&self, nickname: &str) -> Option<SlotId> {
        self.slots.iter().position(|s| {
            s.as_ref()
                .is_some_and(|slot| slot.registered && slot.nickname == nickname)
        })
    }

    /// Registered slots in ascending slot order. This is the only defined
    /// ordering: broadcast fan-out and roster output both follow it.
    pub fn registered(&self) -> impl Iterator<Item = (SlotId, &ClientSlot)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(id, s)| s.as_ref().map(|slot| (id, slot)))
            .filter(|(_, slot)| slot.registered)
    }
}
