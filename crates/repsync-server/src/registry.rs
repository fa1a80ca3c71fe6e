use std::collections::HashMap;

use axum::extract::ws::Utf8Bytes;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Identifies one live connection within the registry. Connection ids are
/// transport bookkeeping only and are never persisted.
pub type ConnId = u64;

/// Per-connection sender for outbound text frames. Bounded so a slow
/// client can never hold broadcast memory hostage; `Utf8Bytes` clones are
/// cheap, so a frame is serialized once per broadcast.
pub type ClientSender = mpsc::Sender<Utf8Bytes>;

/// Ephemeral fan-out bookkeeping for all rooms with at least one live
/// connection. Entries are created lazily on the first admit and garbage
/// collected when the last connection is evicted.
#[derive(Default)]
pub struct RoomRegistry {
    rooms: HashMap<String, RoomEntry>,
    next_conn_id: ConnId,
}

#[derive(Default)]
struct RoomEntry {
    connections: HashMap<ConnId, ClientSender>,
    /// Pending bot-fill check for this room, if any. Aborted when the
    /// room leaves the lobby or the entry is garbage collected.
    botfill: Option<JoinHandle<()>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection under a room code, creating the room entry
    /// if absent. Returns the allocated connection id.
    pub fn admit(&mut self, code: &str, sender: ClientSender) -> ConnId {
        self.next_conn_id += 1;
        let conn_id = self.next_conn_id;
        self.rooms
            .entry(code.to_string())
            .or_default()
            .connections
            .insert(conn_id, sender);
        conn_id
    }

    /// Remove a connection. The room entry is deleted entirely once its
    /// set becomes empty; a pending bot-fill task dies with it. Evicting
    /// an absent connection or room is a no-op. Returns true when the
    /// room entry was removed.
    pub fn evict(&mut self, code: &str, conn_id: ConnId) -> bool {
        let Some(entry) = self.rooms.get_mut(code) else {
            return false;
        };
        entry.connections.remove(&conn_id);
        if entry.connections.is_empty() {
            if let Some(handle) = entry.botfill.take() {
                handle.abort();
            }
            self.rooms.remove(code);
            return true;
        }
        false
    }

    /// Best-effort fan-out of one frame to every live connection in the
    /// room. Full or closed channels are skipped, never awaited.
    pub fn broadcast(&self, code: &str, frame: &Utf8Bytes) {
        if let Some(entry) = self.rooms.get(code) {
            for (&conn_id, sender) in &entry.connections {
                if let Err(e) = sender.try_send(frame.clone()) {
                    tracing::debug!(
                        conn_id, room = code, error = %e,
                        "Skipping broadcast to slow client"
                    );
                }
            }
        }
    }

    /// Fan-out to everyone in the room except one connection.
    pub fn broadcast_except(&self, code: &str, exclude: ConnId, frame: &Utf8Bytes) {
        if let Some(entry) = self.rooms.get(code) {
            for (&conn_id, sender) in &entry.connections {
                if conn_id != exclude
                    && let Err(e) = sender.try_send(frame.clone())
                {
                    tracing::debug!(
                        conn_id, room = code, error = %e,
                        "Skipping broadcast to slow client"
                    );
                }
            }
        }
    }

    /// Send one frame to a single connection.
    pub fn send_to(&self, code: &str, conn_id: ConnId, frame: &Utf8Bytes) {
        if let Some(entry) = self.rooms.get(code)
            && let Some(sender) = entry.connections.get(&conn_id)
            && let Err(e) = sender.try_send(frame.clone())
        {
            tracing::debug!(
                conn_id, room = code, error = %e,
                "Failed to send to connection (slow or disconnected)"
            );
        }
    }

    /// Number of live connections currently registered for a room.
    pub fn connection_count(&self, code: &str) -> usize {
        self.rooms.get(code).map_or(0, |e| e.connections.len())
    }

    pub fn room_exists(&self, code: &str) -> bool {
        self.rooms.contains_key(code)
    }

    /// Record the room's pending bot-fill task. If the room entry has
    /// already been garbage collected, the task is aborted instead.
    pub fn set_botfill(&mut self, code: &str, handle: JoinHandle<()>) {
        match self.rooms.get_mut(code) {
            Some(entry) => {
                if let Some(old) = entry.botfill.replace(handle) {
                    old.abort();
                }
            },
            None => handle.abort(),
        }
    }

    /// Whether a scheduled bot-fill check has yet to run for this room.
    pub fn has_pending_botfill(&self, code: &str) -> bool {
        self.rooms
            .get(code)
            .and_then(|e| e.botfill.as_ref())
            .is_some_and(|h| !h.is_finished())
    }

    /// Drop the stored handle without aborting (the task completed).
    pub fn clear_botfill(&mut self, code: &str) {
        if let Some(entry) = self.rooms.get_mut(code) {
            entry.botfill = None;
        }
    }

    /// Abort and drop any pending bot-fill task for the room.
    pub fn cancel_botfill(&mut self, code: &str) {
        if let Some(entry) = self.rooms.get_mut(code)
            && let Some(handle) = entry.botfill.take()
        {
            handle.abort();
        }
    }
}
