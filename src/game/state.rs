//! Authoritative arena state records
//!
//! These are plain data: the simulation mutates fields directly and the
//! replication layer (`snapshot`) reads them to build wire messages.

use std::collections::{BTreeMap, BTreeSet};

use uuid::Uuid;

use super::quiz::MathQuiz;
use super::world::{Bounds, Vec3};

/// Session identifier assigned to each connected participant
pub type SessionId = Uuid;

/// Key of the default ball in the kickable collection
pub const BALL_KEY: &str = "ball";

/// Number of distinct colors in the color-reveal game
pub const COLOR_COUNT: u8 = 4;

/// Duration of the ShowColor phase (ms)
pub const SHOW_DURATION_MS: u64 = 5_000;

/// Duration of the HideCells phase (ms)
pub const HIDE_DURATION_MS: u64 = 3_000;

/// A connected participant. Only the inbound message handlers move players.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub session_id: SessionId,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Facing angle in degrees
    pub rot_y: f32,
    pub appearance: String,
    pub name: String,
}

impl Player {
    pub fn new(session_id: SessionId, name: String, appearance: String) -> Self {
        Self {
            session_id,
            x: 0.0,
            y: 0.0,
            z: 0.0,
            rot_y: 0.0,
            appearance,
            name,
        }
    }
}

/// A dynamic physics body (the ball and its variants)
#[derive(Debug, Clone, PartialEq)]
pub struct KickableObject {
    pub object_type: String,

    // Position and movement
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub vx: f32,
    pub vy: f32,
    pub vz: f32,

    // Display-only spin
    pub rot_x: f32,
    pub rot_y: f32,
    pub rot_z: f32,

    // Physical parameters
    pub radius: f32,
    /// Restitution against bounds (0..1)
    pub bounciness: f32,
    /// Horizontal velocity decay per tick while on the floor (0..1)
    pub friction: f32,
    /// Restitution against players
    pub player_bounciness: f32,

    /// Private box, used when `use_world_bounds` is false
    pub bounds: Bounds,
    pub use_world_bounds: bool,

    /// Where the object is put back if its state ever goes non-finite
    pub spawn: Vec3,
}

impl KickableObject {
    /// The default ball, dropped from 5 m above the arena center
    pub fn ball() -> Self {
        Self::new(BALL_KEY, Vec3::new(0.0, 5.0, 0.0))
    }

    pub fn new(object_type: &str, spawn: Vec3) -> Self {
        Self {
            object_type: object_type.to_string(),
            x: spawn.x,
            y: spawn.y,
            z: spawn.z,
            vx: 0.0,
            vy: 0.0,
            vz: 0.0,
            rot_x: 0.0,
            rot_y: 0.0,
            rot_z: 0.0,
            radius: 1.0,
            bounciness: 0.8,
            friction: 0.99,
            player_bounciness: 0.8,
            bounds: Bounds::new(Vec3::default(), Vec3::default()),
            use_world_bounds: true,
            spawn,
        }
    }

    /// Clip to a private box instead of the shared world bounds
    pub fn with_private_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = bounds;
        self.use_world_bounds = false;
        self
    }

    /// Bounds the object is currently clipped to
    pub fn active_bounds<'a>(&'a self, world: &'a Bounds) -> &'a Bounds {
        if self.use_world_bounds {
            world
        } else {
            &self.bounds
        }
    }

    pub fn is_finite(&self) -> bool {
        Vec3::new(self.x, self.y, self.z).is_finite()
            && Vec3::new(self.vx, self.vy, self.vz).is_finite()
            && Vec3::new(self.rot_x, self.rot_y, self.rot_z).is_finite()
    }

    /// Put the object back at its spawn point, at rest
    pub fn reset(&mut self) {
        self.x = self.spawn.x;
        self.y = self.spawn.y;
        self.z = self.spawn.z;
        self.vx = 0.0;
        self.vy = 0.0;
        self.vz = 0.0;
        self.rot_x = 0.0;
        self.rot_y = 0.0;
        self.rot_z = 0.0;
    }
}

/// Color-reveal phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Cells visible, the color to stand on is shown
    ShowColor,
    /// Wrong cells removed
    HideCells,
}

impl Phase {
    /// Numeric code used on the wire
    pub fn code(self) -> u8 {
        match self {
            Phase::ShowColor => 0,
            Phase::HideCells => 1,
        }
    }
}

/// Color-reveal mini-game record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseState {
    /// One of `0..COLOR_COUNT`
    pub current_color: u8,
    pub phase: Phase,
    /// Unix ms of the next transition out of `phase`
    pub next_change_at: u64,
}

impl PhaseState {
    pub fn new(now: u64) -> Self {
        Self {
            current_color: 0,
            phase: Phase::ShowColor,
            next_change_at: now + SHOW_DURATION_MS,
        }
    }
}

/// Everything one arena session owns
#[derive(Debug, Clone)]
pub struct ArenaState {
    /// Keyed by session id; ordered so collision resolution is stable
    pub players: BTreeMap<SessionId, Player>,
    pub objects: BTreeMap<String, KickableObject>,
    pub phase: PhaseState,
    /// Degrees in `[0, 360)`
    pub centrifuge_angle: f32,
    pub quiz: MathQuiz,
    pub touched_steps: BTreeSet<String>,
}

impl ArenaState {
    pub fn new(now: u64, quiz: MathQuiz) -> Self {
        let mut objects = BTreeMap::new();
        objects.insert(BALL_KEY.to_string(), KickableObject::ball());

        Self {
            players: BTreeMap::new(),
            objects,
            phase: PhaseState::new(now),
            centrifuge_angle: 0.0,
            quiz,
            touched_steps: BTreeSet::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_arena_has_ball_and_show_phase() {
        let state = ArenaState::new(1_000, MathQuiz::default());

        let ball = state.objects.get(BALL_KEY).unwrap();
        assert_eq!(ball.object_type, "ball");
        assert_eq!(ball.y, 5.0);
        assert!(ball.use_world_bounds);
        assert_eq!(state.phase.phase, Phase::ShowColor);
        assert_eq!(state.phase.next_change_at, 1_000 + SHOW_DURATION_MS);
        assert_eq!(state.centrifuge_angle, 0.0);
    }

    #[test]
    fn test_reset_restores_spawn_at_rest() {
        let mut ball = KickableObject::ball();
        ball.x = f32::NAN;
        ball.vy = -3.0;
        ball.rot_x = 12.0;

        ball.reset();

        assert!(ball.is_finite());
        assert_eq!((ball.x, ball.y, ball.z), (0.0, 5.0, 0.0));
        assert_eq!(ball.vy, 0.0);
        assert_eq!(ball.rot_x, 0.0);
    }

    #[test]
    fn test_private_bounds_selected() {
        let world = Bounds::new(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
        let own = Bounds::new(Vec3::new(-5.0, 0.0, -5.0), Vec3::new(5.0, 5.0, 5.0));

        let ball = KickableObject::ball();
        assert_eq!(ball.active_bounds(&world), &world);

        let boxed = KickableObject::ball().with_private_bounds(own);
        assert_eq!(boxed.active_bounds(&world), &own);
    }
}
