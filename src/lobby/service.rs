//! Lobby service - finds or creates a room for each new connection

use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};
use uuid::Uuid;

use crate::game::chat::ProfanityFilter;
use crate::game::{ArenaRoom, RoomHandle, RoomInput, RoomRegistry, RoomSettings, SessionId};
use crate::ws::protocol::ServerMsg;

/// Attempts before giving up when rooms close under us
const MAX_JOIN_ATTEMPTS: usize = 3;

/// A participant's place in a room
pub struct Seat {
    pub room: RoomHandle,
    /// Subscribed before the join was sent, so the first full state is not missed
    pub updates: broadcast::Receiver<ServerMsg>,
}

/// Lobby errors
#[derive(Debug, thiserror::Error)]
pub enum LobbyError {
    #[error("No arena room could accept the player")]
    Unavailable,
}

/// Lobby service
pub struct LobbyService {
    registry: Arc<RoomRegistry>,
    settings: RoomSettings,
    filter: Arc<dyn ProfanityFilter>,
    /// Serializes room creation so concurrent joins fill one new room
    create_lock: Mutex<()>,
}

impl LobbyService {
    pub fn new(
        registry: Arc<RoomRegistry>,
        settings: RoomSettings,
        filter: Arc<dyn ProfanityFilter>,
    ) -> Self {
        Self {
            registry,
            settings,
            filter,
            create_lock: Mutex::new(()),
        }
    }

    /// Seat a new participant, creating a room if every room is full
    pub async fn join(
        &self,
        session_id: SessionId,
        name: String,
        appearance: String,
    ) -> Result<Seat, LobbyError> {
        for _ in 0..MAX_JOIN_ATTEMPTS {
            let room = self.reserve_seat().await;
            let updates = room.subscribe();

            let join = RoomInput::Join {
                session_id,
                name: name.clone(),
                appearance: appearance.clone(),
            };

            if room.input_tx.send(join).await.is_ok() {
                info!(room_id = %room.id, session_id = %session_id, "Seated participant");
                return Ok(Seat { room, updates });
            }

            warn!(room_id = %room.id, session_id = %session_id, "Room closed before join, retrying");
            room.release_seat();
        }

        Err(LobbyError::Unavailable)
    }

    /// Notify the room that a participant's connection closed
    pub async fn leave(&self, session_id: SessionId, room: &RoomHandle) {
        if room
            .input_tx
            .send(RoomInput::Leave { session_id })
            .await
            .is_err()
        {
            warn!(room_id = %room.id, session_id = %session_id, "Room gone before leave");
        }
    }

    async fn reserve_seat(&self) -> RoomHandle {
        let max_clients = self.settings.max_clients;
        if let Some(room) = self.registry.find_and_reserve(max_clients) {
            return room;
        }

        let _guard = self.create_lock.lock().await;
        // Someone may have created a room while we waited
        if let Some(room) = self.registry.find_and_reserve(max_clients) {
            return room;
        }

        let room = self.create_room();
        // Fresh room, nobody else can see it yet
        room.try_reserve_seat(max_clients);
        self.registry.insert(room.clone());
        room
    }

    /// Start a new room task (the simulation-start hook)
    fn create_room(&self) -> RoomHandle {
        let room_id = Uuid::new_v4();
        let seed = rand::random::<u64>();
        let (room, handle) =
            ArenaRoom::new(room_id, seed, self.settings.clone(), self.filter.clone());

        info!(room_id = %room_id, "Created new arena room");

        let registry = self.registry.clone();
        tokio::spawn(async move {
            room.run().await;

            // Cleanup after the room disposes
            registry.remove(&room_id);
            info!(room_id = %room_id, "Room removed from registry");
        });

        handle
    }
}
