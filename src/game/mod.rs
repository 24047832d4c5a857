//! Arena simulation modules

pub mod chat;
pub mod phase;
pub mod physics;
pub mod quiz;
pub mod room;
pub mod rotation;
pub mod scheduler;
pub mod snapshot;
pub mod state;
pub mod world;

pub use room::{ArenaRoom, RoomHandle, RoomRegistry, RoomSettings};
pub use state::SessionId;

use crate::ws::protocol::ClientMsg;

/// Everything a room task receives, in arrival order
#[derive(Debug, Clone)]
pub enum RoomInput {
    /// A seat was reserved for this session; create its player
    Join {
        session_id: SessionId,
        name: String,
        appearance: String,
    },

    /// Inbound message from a seated participant
    Message {
        session_id: SessionId,
        msg: ClientMsg,
    },

    /// The connection fell behind the broadcast and missed patches
    Resync { session_id: SessionId },

    /// Connection closed
    Leave { session_id: SessionId },
}
