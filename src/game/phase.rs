//! Color-reveal phase machine

use rand::Rng;

use super::state::{Phase, PhaseState, COLOR_COUNT, HIDE_DURATION_MS, SHOW_DURATION_MS};

/// Drives `PhaseState` between ShowColor and HideCells
pub struct PhaseMachine;

impl PhaseMachine {
    /// Apply at most one transition if `now` has reached `next_change_at`.
    /// Returns true when a transition happened.
    pub fn advance<R: Rng + ?Sized>(state: &mut PhaseState, now: u64, rng: &mut R) -> bool {
        if now < state.next_change_at {
            return false;
        }

        match state.phase {
            Phase::ShowColor => {
                // Color persists so it can be shown again after the cells return
                state.phase = Phase::HideCells;
                state.next_change_at = now + HIDE_DURATION_MS;
            }
            Phase::HideCells => {
                state.current_color = rng.gen_range(0..COLOR_COUNT);
                state.phase = Phase::ShowColor;
                state.next_change_at = now + SHOW_DURATION_MS;
            }
        }

        true
    }
}
