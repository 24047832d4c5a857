//! Kickable object physics: integration and collision resolution

use super::state::{KickableObject, Player};
use super::world::{
    Bounds, WorldConfig, GROUND_EPSILON, KICK_IMPULSE, KICK_LIFT, SPIN_SPEED_THRESHOLD,
};

/// Physics system for advancing kickable objects
pub struct PhysicsIntegrator;

impl PhysicsIntegrator {
    /// Advance one object by `dt` seconds.
    ///
    /// Order matters: gravity feeds into the position update, and collision
    /// correction runs after movement so it can undo any over-penetration.
    /// Players are obstacles only and are never moved.
    pub fn step<'a, I>(object: &mut KickableObject, players: I, world: &WorldConfig, dt: f32)
    where
        I: IntoIterator<Item = &'a Player>,
    {
        let bounds = *object.active_bounds(&world.bounds);

        object.vy += world.gravity * dt;

        object.x += object.vx * dt;
        object.y += object.vy * dt;
        object.z += object.vz * dt;

        Self::apply_ground_friction(object, &bounds);

        for player in players {
            Self::resolve_player_collision(object, player, world.player_radius);
        }

        Self::resolve_bounds(object, &bounds);
        Self::update_spin(object, dt);
        Self::clamp_speed(object, world.max_object_speed);
    }

    /// Rolling resistance while touching the floor of the active bounds
    pub fn apply_ground_friction(object: &mut KickableObject, bounds: &Bounds) {
        if object.y - object.radius <= bounds.min.y + GROUND_EPSILON {
            object.vx *= object.friction;
            object.vz *= object.friction;
        }
    }

    /// Sphere-sphere contact against one player. Returns true on contact.
    pub fn resolve_player_collision(
        object: &mut KickableObject,
        player: &Player,
        player_radius: f32,
    ) -> bool {
        let dx = object.x - player.x;
        let dy = object.y - player.y;
        let dz = object.z - player.z;
        let dist_sq = dx * dx + dy * dy + dz * dz;
        let combined_radius = object.radius + player_radius;

        // Exactly coincident centers have no usable normal
        if dist_sq <= 0.0 || dist_sq >= combined_radius * combined_radius {
            return false;
        }

        let dist = dist_sq.sqrt();
        let nx = dx / dist;
        let ny = dy / dist;
        let nz = dz / dist;

        object.x = player.x + nx * combined_radius;
        object.y = player.y + ny * combined_radius;
        object.z = player.z + nz * combined_radius;

        let closing = object.vx * nx + object.vy * ny + object.vz * nz;
        if closing < 0.0 {
            let scale = closing * (1.0 + object.player_bounciness);
            object.vx -= nx * scale;
            object.vy -= ny * scale;
            object.vz -= nz * scale;
        }

        // Every contact kicks the object visibly up, whatever its heading
        object.vx += nx * KICK_IMPULSE;
        object.vy += ny * KICK_IMPULSE + KICK_LIFT;
        object.vz += nz * KICK_IMPULSE;

        true
    }

    /// Clamp into the box and reflect velocity, each axis and side on its own
    pub fn resolve_bounds(object: &mut KickableObject, bounds: &Bounds) {
        let r = object.radius;
        let b = object.bounciness;

        Self::resolve_axis(&mut object.x, &mut object.vx, bounds.min.x, bounds.max.x, r, b);
        Self::resolve_axis(&mut object.y, &mut object.vy, bounds.min.y, bounds.max.y, r, b);
        Self::resolve_axis(&mut object.z, &mut object.vz, bounds.min.z, bounds.max.z, r, b);
    }

    fn resolve_axis(pos: &mut f32, vel: &mut f32, min: f32, max: f32, radius: f32, bounciness: f32) {
        if *pos - radius < min {
            *pos = min + radius;
            *vel = -*vel * bounciness;
        }
        if *pos + radius > max {
            *pos = max - radius;
            *vel = -*vel * bounciness;
        }
    }

    /// Cosmetic roll. Frozen, not decayed, below the speed threshold.
    pub fn update_spin(object: &mut KickableObject, dt: f32) {
        let speed = (object.vx * object.vx + object.vz * object.vz).sqrt();
        if speed > SPIN_SPEED_THRESHOLD {
            object.rot_x += speed * dt * 10.0;
            object.rot_z += (object.vx / speed) * dt * 5.0;
        }
    }

    /// Cap velocity magnitude so repeated overlaps cannot run away
    pub fn clamp_speed(object: &mut KickableObject, max_speed: f32) {
        let speed_sq = object.vx * object.vx + object.vy * object.vy + object.vz * object.vz;
        if speed_sq > max_speed * max_speed {
            let scale = max_speed / speed_sq.sqrt();
            object.vx *= scale;
            object.vy *= scale;
            object.vz *= scale;
        }
    }

    /// Check the per-axis radius clearance against a box
    pub fn is_contained(object: &KickableObject, bounds: &Bounds) -> bool {
        let r = object.radius;
        object.x - bounds.min.x >= r
            && bounds.max.x - object.x >= r
            && object.y - bounds.min.y >= r
            && bounds.max.y - object.y >= r
            && object.z - bounds.min.z >= r
            && bounds.max.z - object.z >= r
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::world::{Vec3, GRAVITY, MAX_OBJECT_SPEED, PLAYER_RADIUS};
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;
    use uuid::Uuid;

    const DT: f32 = 0.1;
    const NO_PLAYERS: &[Player] = &[];

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    fn ball_at(x: f32, y: f32, z: f32) -> KickableObject {
        let mut ball = KickableObject::ball();
        ball.x = x;
        ball.y = y;
        ball.z = z;
        ball
    }

    fn player_at(id: u128, x: f32, y: f32, z: f32) -> Player {
        let mut player = Player::new(Uuid::from_u128(id), "p".into(), "default".into());
        player.x = x;
        player.y = y;
        player.z = z;
        player
    }

    #[test]
    fn test_single_step_free_fall() {
        let world = WorldConfig::default();
        let mut ball = ball_at(0.0, 2.0, 0.0);

        PhysicsIntegrator::step(&mut ball, NO_PLAYERS, &world, DT);

        assert!(approx(ball.vy, -0.981));
        assert!(approx(ball.y, 1.9019));
    }

    #[test]
    fn test_falls_then_bounces_off_floor() {
        let world = WorldConfig::default();
        let mut ball = ball_at(0.0, 2.0, 0.0);

        let mut bounced = false;
        for _ in 0..50 {
            let vy_before_contact = ball.vy + GRAVITY * DT;
            PhysicsIntegrator::step(&mut ball, NO_PLAYERS, &world, DT);

            if ball.vy > 0.0 {
                assert_eq!(ball.y, 1.0);
                assert!(approx(ball.vy, -vy_before_contact * 0.8));
                bounced = true;
                break;
            }
        }

        assert!(bounced);
    }

    #[test]
    fn test_restitution_flips_and_attenuates() {
        let world = WorldConfig::default();
        let mut ball = ball_at(0.0, 1.05, 0.0);
        ball.vy = -5.0;

        let incoming = ball.vy + GRAVITY * DT;
        PhysicsIntegrator::step(&mut ball, NO_PLAYERS, &world, DT);

        assert!(ball.vy > 0.0);
        assert!(approx(ball.vy, incoming.abs() * 0.8));
        assert_eq!(ball.vx, 0.0);
        assert_eq!(ball.vz, 0.0);
    }

    #[test]
    fn test_ground_friction_only_on_floor() {
        let world = WorldConfig::default();

        let mut rolling = ball_at(0.0, 1.0, 0.0);
        rolling.vx = 2.0;
        rolling.vz = -1.0;
        PhysicsIntegrator::step(&mut rolling, NO_PLAYERS, &world, DT);
        assert!(approx(rolling.vx, 1.98));
        assert!(approx(rolling.vz, -0.99));

        let mut flying = ball_at(0.0, 10.0, 0.0);
        flying.vx = 2.0;
        PhysicsIntegrator::step(&mut flying, NO_PLAYERS, &world, DT);
        assert_eq!(flying.vx, 2.0);
    }

    #[test]
    fn test_player_contact_pushes_out_to_combined_radius() {
        let mut ball = ball_at(1.0, 5.0, 0.0);
        let player = player_at(1, 0.0, 5.0, 0.0);

        assert!(PhysicsIntegrator::resolve_player_collision(&mut ball, &player, PLAYER_RADIUS));
        assert!(approx(ball.x, 1.0 + PLAYER_RADIUS));
        assert_eq!(ball.y, 5.0);
    }

    #[test]
    fn test_player_contact_reflects_approach() {
        let mut ball = ball_at(1.0, 5.0, 0.0);
        ball.vx = -2.0;
        let player = player_at(1, 0.0, 5.0, 0.0);

        PhysicsIntegrator::resolve_player_collision(&mut ball, &player, PLAYER_RADIUS);

        // -2 reflected with (1 + 0.8), then the fixed kick
        assert!(approx(ball.vx, -2.0 + 3.6 + KICK_IMPULSE));
        assert!(approx(ball.vy, KICK_LIFT));
    }

    #[test]
    fn test_player_contact_kicks_even_when_separating() {
        let mut ball = ball_at(1.0, 5.0, 0.0);
        ball.vx = 3.0;
        let player = player_at(1, 0.0, 5.0, 0.0);

        PhysicsIntegrator::resolve_player_collision(&mut ball, &player, PLAYER_RADIUS);

        assert!(approx(ball.vx, 3.0 + KICK_IMPULSE));
        assert!(approx(ball.vy, KICK_LIFT));
    }

    #[test]
    fn test_coincident_player_ignored() {
        let mut ball = ball_at(0.0, 5.0, 0.0);
        let before = ball.clone();
        let player = player_at(1, 0.0, 5.0, 0.0);

        assert!(!PhysicsIntegrator::resolve_player_collision(&mut ball, &player, PLAYER_RADIUS));
        assert_eq!(ball, before);
    }

    #[test]
    fn test_out_of_range_player_ignored() {
        let mut ball = ball_at(0.0, 5.0, 0.0);
        let player = player_at(1, 1.5, 5.0, 0.0);

        // Exactly touching is not a contact
        assert!(!PhysicsIntegrator::resolve_player_collision(&mut ball, &player, PLAYER_RADIUS));
    }

    #[test]
    fn test_two_players_contributions_add_up() {
        let mut ball = ball_at(0.0, 5.0, 0.0);
        let left = player_at(1, -1.0, 5.0, 0.0);
        let behind = player_at(2, 0.5, 5.0, -1.0);

        for player in [&left, &behind] {
            PhysicsIntegrator::resolve_player_collision(&mut ball, player, PLAYER_RADIUS);
        }

        // +x kick from the first, +z kick from the second, lift from both
        assert!(approx(ball.vx, KICK_IMPULSE));
        assert!(approx(ball.vy, 2.0 * KICK_LIFT));
        assert!(approx(ball.vz, KICK_IMPULSE));
    }

    #[test]
    fn test_step_reads_every_player() {
        let world = WorldConfig::default();
        let mut ball = ball_at(0.0, 10.0, 0.0);
        // Players sit where the ball will be after integration
        let y = 10.0 + (GRAVITY * DT) * DT;
        let players = vec![player_at(1, -1.0, y, 0.0), player_at(2, 0.5, y, -1.0)];

        PhysicsIntegrator::step(&mut ball, &players, &world, DT);

        assert!(ball.vx > 5.0);
        assert!(ball.vz > 5.0);
        assert!(ball.vy > KICK_LIFT);
    }

    #[test]
    fn test_ground_friction_uses_private_floor() {
        let world = WorldConfig::default();

        // Resting on a raised private floor
        let raised = Bounds::new(Vec3::new(-5.0, 10.0, -5.0), Vec3::new(5.0, 20.0, 5.0));
        let mut perched = ball_at(0.0, 11.0, 0.0).with_private_bounds(raised);
        perched.vx = 2.0;
        perched.vz = -1.0;
        PhysicsIntegrator::step(&mut perched, NO_PLAYERS, &world, DT);
        assert!(approx(perched.vx, 1.98));
        assert!(approx(perched.vz, -0.99));
        assert_eq!(perched.y, 11.0);

        // Touching the world floor but far above a sunken private floor
        let sunken = Bounds::new(Vec3::new(-5.0, -10.0, -5.0), Vec3::new(5.0, 20.0, 5.0));
        let mut airborne = ball_at(0.0, 1.0, 0.0).with_private_bounds(sunken);
        airborne.vx = 2.0;
        PhysicsIntegrator::step(&mut airborne, NO_PLAYERS, &world, DT);
        assert_eq!(airborne.vx, 2.0);
    }

    #[test]
    fn test_private_bounds_clip() {
        let world = WorldConfig::default();
        let own = Bounds::new(Vec3::new(-2.0, 0.0, -2.0), Vec3::new(2.0, 4.0, 2.0));
        let mut ball = ball_at(1.5, 2.0, 0.0).with_private_bounds(own);
        ball.vx = 10.0;

        PhysicsIntegrator::step(&mut ball, NO_PLAYERS, &world, DT);

        assert_eq!(ball.x, 1.0);
        assert!(approx(ball.vx, -8.0));
        assert!(PhysicsIntegrator::is_contained(&ball, &own));
    }

    #[test]
    fn test_containment_under_random_motion() {
        let world = WorldConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(2024);
        let players: Vec<Player> = (0..4)
            .map(|i| {
                player_at(
                    i,
                    rng.gen_range(-20.0..20.0),
                    rng.gen_range(0.0..3.0),
                    rng.gen_range(-20.0..20.0),
                )
            })
            .collect();

        for _ in 0..20 {
            let mut ball = ball_at(
                rng.gen_range(-18.0..18.0),
                rng.gen_range(1.0..28.0),
                rng.gen_range(-18.0..18.0),
            );
            ball.vx = rng.gen_range(-500.0..500.0);
            ball.vy = rng.gen_range(-500.0..500.0);
            ball.vz = rng.gen_range(-500.0..500.0);

            for _ in 0..100 {
                PhysicsIntegrator::step(&mut ball, &players, &world, DT);
                assert!(PhysicsIntegrator::is_contained(&ball, &world.bounds));
            }
        }
    }

    #[test]
    fn test_bounds_resolution_idempotent() {
        let bounds = WorldConfig::default().bounds;
        let mut ball = ball_at(25.0, -3.0, -30.0);
        ball.vx = 4.0;
        ball.vy = -2.0;
        ball.vz = -1.0;

        PhysicsIntegrator::resolve_bounds(&mut ball, &bounds);
        let once = ball.clone();
        PhysicsIntegrator::resolve_bounds(&mut ball, &bounds);

        assert_eq!(ball, once);
        assert_eq!((ball.x, ball.y, ball.z), (19.0, 1.0, -19.0));
    }

    #[test]
    fn test_spin_advances_with_horizontal_speed() {
        let mut ball = ball_at(0.0, 10.0, 0.0);
        ball.vx = 3.0;
        ball.vz = 4.0;

        PhysicsIntegrator::update_spin(&mut ball, DT);

        assert!(approx(ball.rot_x, 5.0));
        assert!(approx(ball.rot_z, 0.3));
    }

    #[test]
    fn test_spin_frozen_when_slow() {
        let mut ball = ball_at(0.0, 10.0, 0.0);
        ball.rot_x = 2.0;
        ball.rot_z = -1.0;
        ball.vx = 0.005;

        PhysicsIntegrator::update_spin(&mut ball, DT);

        assert_eq!(ball.rot_x, 2.0);
        assert_eq!(ball.rot_z, -1.0);
    }

    #[test]
    fn test_speed_clamped() {
        let world = WorldConfig::default();
        let mut ball = ball_at(0.0, 10.0, 0.0);
        ball.vx = 100.0;

        PhysicsIntegrator::step(&mut ball, NO_PLAYERS, &world, DT);

        let speed = (ball.vx * ball.vx + ball.vy * ball.vy + ball.vz * ball.vz).sqrt();
        assert!(speed <= MAX_OBJECT_SPEED + 1e-3);
        assert!(ball.vx > 39.0);
    }
}
