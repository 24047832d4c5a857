//! Fixed-tick step functions for one arena
//!
//! The room task owns the timers; this type owns what happens on each firing.
//! The sim tick writes phase and kickable state, the centrifuge tick writes
//! only the angle, so the two never touch the same fields.

use rand::Rng;
use tracing::warn;

use crate::util::time::Timer;

use super::phase::PhaseMachine;
use super::physics::PhysicsIntegrator;
use super::rotation::RotationUpdater;
use super::state::ArenaState;
use super::world::WorldConfig;

/// What a sim tick changed, for logging and replication hints
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimTickOutcome {
    pub phase_changed: bool,
    /// Objects reset after going non-finite
    pub objects_reset: usize,
}

pub struct TickScheduler {
    world: WorldConfig,
    /// Seconds simulated per sim tick
    sim_dt: f32,
    centrifuge_rpm: f32,
    centrifuge_clock: Timer,
    tick: u64,
}

impl TickScheduler {
    pub fn new(world: WorldConfig, sim_dt: f32, centrifuge_rpm: f32) -> Self {
        Self {
            world,
            sim_dt,
            centrifuge_rpm,
            centrifuge_clock: Timer::new(),
            tick: 0,
        }
    }

    /// Sim ticks run so far
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Phase machine, then physics for every kickable object
    pub fn sim_tick<R: Rng + ?Sized>(
        &mut self,
        state: &mut ArenaState,
        now_ms: u64,
        rng: &mut R,
    ) -> SimTickOutcome {
        self.tick += 1;
        let mut outcome = SimTickOutcome {
            phase_changed: PhaseMachine::advance(&mut state.phase, now_ms, rng),
            ..Default::default()
        };

        for (key, object) in state.objects.iter_mut() {
            PhysicsIntegrator::step(object, state.players.values(), &self.world, self.sim_dt);

            if !object.is_finite() {
                warn!(object = %key, tick = self.tick, "Non-finite kickable state, resetting to spawn");
                object.reset();
                outcome.objects_reset += 1;
            }
        }

        outcome
    }

    /// Advance the centrifuge by the wall time since its previous firing
    pub fn centrifuge_tick(&mut self, state: &mut ArenaState) {
        let elapsed_ms = self.centrifuge_clock.elapsed_micros() as f32 / 1000.0;
        self.centrifuge_clock.reset();
        self.advance_centrifuge(state, elapsed_ms);
    }

    pub fn advance_centrifuge(&self, state: &mut ArenaState, elapsed_ms: f32) {
        RotationUpdater::advance(&mut state.centrifuge_angle, elapsed_ms, self.centrifuge_rpm);

        if !state.centrifuge_angle.is_finite() {
            warn!("Non-finite centrifuge angle, resetting to 0");
            state.centrifuge_angle = 0.0;
        }
    }
}
