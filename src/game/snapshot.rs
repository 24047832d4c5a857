//! Replication: full snapshots and delta patches of the arena state

use std::collections::HashMap;

use uuid::Uuid;

use crate::ws::protocol::{
    ArenaPatch, ArenaSnapshot, KickableSnapshot, MathExampleSnapshot, MathSnapshot,
    PhaseSnapshot, PlayerSnapshot, ServerMsg,
};

use super::quiz::MathQuiz;
use super::state::{ArenaState, KickableObject, PhaseState, Player};

/// Builds state messages for network transmission
pub struct SnapshotBuilder {
    /// Last published view, the base for the next patch
    last: Option<ArenaSnapshot>,
    /// Send a full state on next build
    force_full: bool,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self {
            last: None,
            force_full: true,
        }
    }

    /// Force a full state on next build (used when someone joins)
    pub fn force_full(&mut self) {
        self.force_full = true;
    }

    /// Build the next message, or None if nothing changed since the last one
    pub fn build(&mut self, tick: u64, state: &ArenaState) -> Option<ServerMsg> {
        let current = capture(state);

        let msg = match self.last.as_ref() {
            Some(last) if !self.force_full => {
                let patch = diff(last, &current);
                if patch.is_empty() {
                    None
                } else {
                    Some(ServerMsg::Patch { tick, patch })
                }
            }
            _ => Some(ServerMsg::State {
                tick,
                state: current.clone(),
            }),
        };

        self.force_full = false;
        self.last = Some(current);
        msg
    }

    /// Centrifuge-only publish: compares the angle without capturing the
    /// whole state. Every other mutation must already have been published.
    pub fn build_angle(&mut self, tick: u64, state: &ArenaState) -> Option<ServerMsg> {
        if self.force_full || self.last.is_none() {
            return self.build(tick, state);
        }

        let last = self.last.as_mut()?;
        if last.centrifuge_angle == state.centrifuge_angle {
            return None;
        }
        last.centrifuge_angle = state.centrifuge_angle;

        Some(ServerMsg::Patch {
            tick,
            patch: ArenaPatch {
                centrifuge_angle: Some(state.centrifuge_angle),
                ..Default::default()
            },
        })
    }
}

impl Default for SnapshotBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only copy of everything clients render
pub fn capture(state: &ArenaState) -> ArenaSnapshot {
    ArenaSnapshot {
        players: state.players.values().map(player_snapshot).collect(),
        objects: state
            .objects
            .iter()
            .map(|(key, object)| (key.clone(), kickable_snapshot(object)))
            .collect(),
        phase: phase_snapshot(&state.phase),
        centrifuge_angle: state.centrifuge_angle,
        math: math_snapshot(&state.quiz),
    }
}

pub fn player_snapshot(p: &Player) -> PlayerSnapshot {
    PlayerSnapshot {
        session_id: p.session_id,
        x: p.x,
        y: p.y,
        z: p.z,
        rot_y: p.rot_y,
        appearance: p.appearance.clone(),
        name: p.name.clone(),
    }
}

fn kickable_snapshot(o: &KickableObject) -> KickableSnapshot {
    KickableSnapshot {
        object_type: o.object_type.clone(),
        x: o.x,
        y: o.y,
        z: o.z,
        vx: o.vx,
        vy: o.vy,
        vz: o.vz,
        rot_x: o.rot_x,
        rot_y: o.rot_y,
        rot_z: o.rot_z,
        radius: o.radius,
    }
}

fn phase_snapshot(p: &PhaseState) -> PhaseSnapshot {
    PhaseSnapshot {
        current_color: p.current_color,
        phase: p.phase.code(),
        next_change_at: p.next_change_at,
    }
}

fn math_snapshot(q: &MathQuiz) -> MathSnapshot {
    MathSnapshot {
        examples: q
            .examples
            .iter()
            .map(|e| MathExampleSnapshot {
                expression: e.expression.clone(),
                correct: e.correct,
                wrong: e.wrong,
                correct_index: e.correct_index,
            })
            .collect(),
        generated_at: q.generated_at,
    }
}

/// Sections of `current` that differ from `last`
pub fn diff(last: &ArenaSnapshot, current: &ArenaSnapshot) -> ArenaPatch {
    let previous: HashMap<Uuid, &PlayerSnapshot> =
        last.players.iter().map(|p| (p.session_id, p)).collect();

    let players = current
        .players
        .iter()
        .filter(|p| previous.get(&p.session_id).copied() != Some(*p))
        .cloned()
        .collect();

    let removed_players = last
        .players
        .iter()
        .filter(|old| !current.players.iter().any(|p| p.session_id == old.session_id))
        .map(|old| old.session_id)
        .collect();

    let objects = current
        .objects
        .iter()
        .filter(|(key, object)| last.objects.get(*key) != Some(*object))
        .map(|(key, object)| (key.clone(), object.clone()))
        .collect();

    ArenaPatch {
        players,
        removed_players,
        objects,
        phase: (last.phase != current.phase).then_some(current.phase),
        centrifuge_angle: (last.centrifuge_angle != current.centrifuge_angle)
            .then_some(current.centrifuge_angle),
        math: (last.math != current.math).then(|| current.math.clone()),
    }
}
