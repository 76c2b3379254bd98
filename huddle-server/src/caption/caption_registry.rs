use crate::config::CaptionScope;
use bytes::Bytes;
use dashmap::DashMap;
use huddle_core::RoomId;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::debug;

/// Opaque caption payload, relayed exactly as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptionFrame {
    Text(String),
    Binary(Bytes),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

struct CaptionSocket {
    room_id: RoomId,
    outbox: mpsc::UnboundedSender<CaptionFrame>,
}

/// Every open caption socket, with the room path it was opened under.
pub struct CaptionRegistry {
    scope: CaptionScope,
    sockets: DashMap<ConnectionId, CaptionSocket>,
    next_id: AtomicU64,
}

impl CaptionRegistry {
    pub fn new(scope: CaptionScope) -> Self {
        Self {
            scope,
            sockets: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn scope(&self) -> CaptionScope {
        self.scope
    }

    pub fn register(
        &self,
        room_id: RoomId,
        outbox: mpsc::UnboundedSender<CaptionFrame>,
    ) -> ConnectionId {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.sockets.insert(id, CaptionSocket { room_id, outbox });
        id
    }

    pub fn unregister(&self, id: ConnectionId) {
        self.sockets.remove(&id);
    }

    pub fn len(&self) -> usize {
        self.sockets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sockets.is_empty()
    }

    /// Fan `frame` out to every other socket in the sender's broadcast domain.
    ///
    /// Returns the number of sockets the frame was queued for.
    pub fn broadcast(&self, from: ConnectionId, frame: &CaptionFrame) -> usize {
        let origin_room = match self.scope {
            CaptionScope::Relay => None,
            CaptionScope::Room => match self.sockets.get(&from) {
                Some(origin) => Some(origin.room_id.clone()),
                None => return 0,
            },
        };

        let mut delivered = 0;
        for entry in self.sockets.iter() {
            if *entry.key() == from {
                continue;
            }
            if origin_room
                .as_ref()
                .is_some_and(|room| *room != entry.value().room_id)
            {
                continue;
            }
            if entry.value().outbox.send(frame.clone()).is_ok() {
                delivered += 1;
            } else {
                debug!("Caption socket {:?} already closed", entry.key());
            }
        }
        delivered
    }
}
