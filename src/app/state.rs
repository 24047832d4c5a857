//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::game::chat::{ProfanityFilter, WordListFilter};
use crate::game::{RoomRegistry, RoomSettings};
use crate::lobby::LobbyService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub lobby: Arc<LobbyService>,
    pub room_registry: Arc<RoomRegistry>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);

        // Chat moderation shared by every room
        let filter: Arc<dyn ProfanityFilter> =
            Arc::new(WordListFilter::new(&config.chat_blocklist));

        // Initialize room registry
        let room_registry = Arc::new(RoomRegistry::new());

        let lobby = Arc::new(LobbyService::new(
            room_registry.clone(),
            RoomSettings::from_config(&config),
            filter,
        ));

        Self {
            config,
            lobby,
            room_registry,
        }
    }
}
