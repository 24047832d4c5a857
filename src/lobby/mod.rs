//! Lobby - seats participants into arena rooms

pub mod service;

pub use service::{LobbyService, Seat};
