//! Static arena geometry and physical constants

/// Gravitational acceleration along Y (m/s²)
pub const GRAVITY: f32 = -9.81;

/// Collision radius of a player capsule, treated as a sphere
pub const PLAYER_RADIUS: f32 = 0.5;

/// Outward impulse added on every player contact
pub const KICK_IMPULSE: f32 = 6.0;

/// Upward lift added on every player contact
pub const KICK_LIFT: f32 = 3.5;

/// Distance above the floor at which ground friction applies
pub const GROUND_EPSILON: f32 = 0.01;

/// Horizontal speed below which cosmetic spin is frozen
pub const SPIN_SPEED_THRESHOLD: f32 = 0.01;

/// Velocity magnitude ceiling applied at the end of every physics step
pub const MAX_OBJECT_SPEED: f32 = 40.0;

/// Plain 3-component vector
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Axis-aligned box a kickable object is clipped to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }
}

/// Shared world constants for one arena
#[derive(Debug, Clone, Copy)]
pub struct WorldConfig {
    /// Bounds every object with `use_world_bounds` is clipped to
    pub bounds: Bounds,
    pub gravity: f32,
    pub player_radius: f32,
    pub max_object_speed: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            bounds: Bounds::new(Vec3::new(-20.0, 0.0, -20.0), Vec3::new(20.0, 30.0, 20.0)),
            gravity: GRAVITY,
            player_radius: PLAYER_RADIUS,
            max_object_speed: MAX_OBJECT_SPEED,
        }
    }
}
