use crate::caption::{CaptionFrame, CaptionRegistry, ConnectionId};
use huddle_core::RoomId;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// One caption socket's membership in the caption broadcast domain.
pub struct CaptionRelay {
    registry: Arc<CaptionRegistry>,
    id: ConnectionId,
    room_id: RoomId,
}

impl CaptionRelay {
    pub fn open(
        registry: Arc<CaptionRegistry>,
        room_id: RoomId,
        outbox: mpsc::UnboundedSender<CaptionFrame>,
    ) -> Self {
        let id = registry.register(room_id.clone(), outbox);
        info!("New captions connection for room: {}", room_id);
        Self {
            registry,
            id,
            room_id,
        }
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn relay(&self, frame: CaptionFrame) -> usize {
        let delivered = self.registry.broadcast(self.id, &frame);
        debug!(
            "Caption from room {} relayed to {} socket(s)",
            self.room_id, delivered
        );
        delivered
    }
}

impl Drop for CaptionRelay {
    fn drop(&mut self) {
        self.registry.unregister(self.id);
        info!("Captions connection closed for room: {}", self.room_id);
    }
}
