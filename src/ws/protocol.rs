//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a parcour step; clients send either numbers or names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepId {
    Number(u64),
    Name(String),
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepId::Number(n) => write!(f, "{n}"),
            StepId::Name(s) => f.write_str(s),
        }
    }
}

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Own position, applied verbatim
    Pos { x: f32, y: f32, z: f32 },

    /// Own facing angle in degrees
    Rotate { yaw: f32 },

    /// Player stepped on a parcour step
    StepTouch { id: StepId },

    /// Raw chat text, moderated server-side
    Chat { text: String },

    /// Ping for latency measurement
    Ping {
        /// Client timestamp
        t: u64,
    },
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Welcome message after connection
    Welcome {
        session_id: Uuid,
        room_id: Uuid,
        server_time: u64,
    },

    /// Player joined the room
    PlayerJoined { player: PlayerSnapshot },

    /// Player left the room
    PlayerLeft { session_id: Uuid, reason: String },

    /// Full replica of the room state
    State { tick: u64, state: ArenaSnapshot },

    /// Only the parts of the room state that changed
    Patch { tick: u64, patch: ArenaPatch },

    /// A step was touched and should fade for everyone
    StepFade { id: StepId },

    /// Moderated chat line, already prefixed with the sender name
    Chat { message: String },

    /// Error message
    Error { code: String, message: String },

    /// Pong response
    Pong {
        /// Echo back client timestamp
        t: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub session_id: Uuid,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Facing in degrees
    pub rot_y: f32,
    pub appearance: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KickableSnapshot {
    pub object_type: String,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub vx: f32,
    pub vy: f32,
    pub vz: f32,
    pub rot_x: f32,
    pub rot_y: f32,
    pub rot_z: f32,
    pub radius: f32,
}

/// Color-reveal state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseSnapshot {
    pub current_color: u8,
    /// 0 = show color, 1 = hide cells
    pub phase: u8,
    pub next_change_at: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MathExampleSnapshot {
    pub expression: String,
    pub correct: u32,
    pub wrong: u32,
    pub correct_index: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MathSnapshot {
    pub examples: Vec<MathExampleSnapshot>,
    pub generated_at: u64,
}

/// Everything a client renders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArenaSnapshot {
    pub players: Vec<PlayerSnapshot>,
    pub objects: BTreeMap<String, KickableSnapshot>,
    pub phase: PhaseSnapshot,
    pub centrifuge_angle: f32,
    pub math: MathSnapshot,
}

/// Changed sections since the previous publication
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArenaPatch {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub players: Vec<PlayerSnapshot>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed_players: Vec<Uuid>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub objects: BTreeMap<String, KickableSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<PhaseSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub centrifuge_angle: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub math: Option<MathSnapshot>,
}

impl ArenaPatch {
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
            && self.removed_players.is_empty()
            && self.objects.is_empty()
            && self.phase.is_none()
            && self.centrifuge_angle.is_none()
            && self.math.is_none()
    }
}
