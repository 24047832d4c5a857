//! Arena room: one session's state and its authoritative tick loop

use dashmap::DashMap;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::Config;
use crate::util::time::unix_millis;
use crate::ws::protocol::{ClientMsg, ServerMsg};

use super::chat::{format_chat_line, ProfanityFilter};
use super::quiz::MathQuiz;
use super::scheduler::TickScheduler;
use super::snapshot::{player_snapshot, SnapshotBuilder};
use super::state::{ArenaState, Player, SessionId};
use super::world::WorldConfig;
use super::RoomInput;

/// Seat counter value once a room has begun disposing
const CLOSED: usize = usize::MAX;

/// Per-room tuning, derived from `Config`
#[derive(Debug, Clone)]
pub struct RoomSettings {
    pub max_clients: usize,
    pub sim_tick: Duration,
    pub centrifuge_tick: Duration,
    pub centrifuge_rpm: f32,
    pub quiz_interval: Duration,
    pub chat_max_chars: usize,
    pub world: WorldConfig,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            max_clients: 4,
            sim_tick: Duration::from_millis(100),
            centrifuge_tick: Duration::from_millis(16),
            centrifuge_rpm: 3.0,
            quiz_interval: Duration::from_secs(300),
            chat_max_chars: 18,
            world: WorldConfig::default(),
        }
    }
}

impl RoomSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_clients: config.max_clients,
            sim_tick: Duration::from_millis(config.sim_tick_ms),
            centrifuge_tick: Duration::from_millis(config.centrifuge_tick_ms),
            centrifuge_rpm: config.centrifuge_rpm,
            quiz_interval: Duration::from_secs(config.quiz_interval_secs),
            chat_max_chars: config.chat_max_chars,
            world: WorldConfig::default(),
        }
    }
}

/// Handle to a running room
#[derive(Clone)]
pub struct RoomHandle {
    pub id: Uuid,
    pub input_tx: mpsc::Sender<RoomInput>,
    pub broadcast_tx: broadcast::Sender<ServerMsg>,
    seats: Arc<AtomicUsize>,
}

impl RoomHandle {
    /// Seated (or reserved) participants; 0 once the room is closing
    pub fn player_count(&self) -> usize {
        match self.seats.load(Ordering::Acquire) {
            CLOSED => 0,
            n => n,
        }
    }

    /// Claim a seat unless the room is full or closing
    pub fn try_reserve_seat(&self, max_clients: usize) -> bool {
        self.seats
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n != CLOSED && n < max_clients).then(|| n + 1)
            })
            .is_ok()
    }

    pub fn release_seat(&self) {
        let _ = self
            .seats
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n != CLOSED && n > 0).then(|| n - 1)
            });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerMsg> {
        self.broadcast_tx.subscribe()
    }

    /// Mark closed if nobody holds a seat; returns true if this call closed it
    fn try_close(&self) -> bool {
        self.seats
            .compare_exchange(0, CLOSED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Registry of all active rooms
pub struct RoomRegistry {
    rooms: DashMap<Uuid, RoomHandle>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }

    pub fn insert(&self, handle: RoomHandle) {
        self.rooms.insert(handle.id, handle);
    }

    pub fn remove(&self, id: &Uuid) -> Option<RoomHandle> {
        self.rooms.remove(id).map(|(_, h)| h)
    }

    pub fn active_rooms(&self) -> usize {
        self.rooms.len()
    }

    pub fn total_players(&self) -> usize {
        self.rooms.iter().map(|r| r.value().player_count()).sum()
    }

    /// Reserve a seat in any room with space left
    pub fn find_and_reserve(&self, max_clients: usize) -> Option<RoomHandle> {
        self.rooms
            .iter()
            .find(|entry| entry.value().try_reserve_seat(max_clients))
            .map(|entry| entry.value().clone())
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The authoritative arena room
pub struct ArenaRoom {
    id: Uuid,
    state: ArenaState,
    scheduler: TickScheduler,
    snapshots: SnapshotBuilder,
    rng: ChaCha8Rng,
    settings: RoomSettings,
    filter: Arc<dyn ProfanityFilter>,
    input_rx: mpsc::Receiver<RoomInput>,
    broadcast_tx: broadcast::Sender<ServerMsg>,
    handle: RoomHandle,
}

impl ArenaRoom {
    /// Create a room with fresh state (the simulation starts when `run` is polled)
    pub fn new(
        id: Uuid,
        seed: u64,
        settings: RoomSettings,
        filter: Arc<dyn ProfanityFilter>,
    ) -> (Self, RoomHandle) {
        let (input_tx, input_rx) = mpsc::channel(256);
        let (broadcast_tx, _) = broadcast::channel(128);

        let handle = RoomHandle {
            id,
            input_tx,
            broadcast_tx: broadcast_tx.clone(),
            seats: Arc::new(AtomicUsize::new(0)),
        };

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let now = unix_millis();
        let quiz = MathQuiz::generate(&mut rng, now);
        let scheduler = TickScheduler::new(
            settings.world,
            settings.sim_tick.as_secs_f32(),
            settings.centrifuge_rpm,
        );

        let room = Self {
            id,
            state: ArenaState::new(now, quiz),
            scheduler,
            snapshots: SnapshotBuilder::new(),
            rng,
            settings,
            filter,
            input_rx,
            broadcast_tx,
            handle: handle.clone(),
        };

        (room, handle)
    }

    /// Run the room until its last participant leaves
    pub async fn run(mut self) {
        info!(room_id = %self.id, "Simulation started");

        let mut sim_interval = interval(self.settings.sim_tick);
        sim_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut centrifuge_interval = interval(self.settings.centrifuge_tick);
        centrifuge_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // Quiz was generated at creation; next one is a full period away
        let quiz_period = self.settings.quiz_interval;
        let mut quiz_interval = interval_at(Instant::now() + quiz_period, quiz_period);
        quiz_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                input = self.input_rx.recv() => {
                    let Some(input) = input else {
                        break;
                    };
                    self.handle_input(input);
                    if self.state.players.is_empty() && self.handle.try_close() {
                        break;
                    }
                }
                _ = sim_interval.tick() => {
                    self.run_sim_tick(unix_millis());
                }
                _ = centrifuge_interval.tick() => {
                    self.run_centrifuge_tick();
                }
                _ = quiz_interval.tick() => {
                    self.regenerate_quiz(unix_millis());
                }
            }
        }

        info!(
            room_id = %self.id,
            ticks = self.scheduler.tick(),
            "Simulation stopped"
        );
    }

    /// Apply one input immediately, outside the tick cadence
    fn handle_input(&mut self, input: RoomInput) {
        match input {
            RoomInput::Join {
                session_id,
                name,
                appearance,
            } => self.handle_join(session_id, name, appearance),
            RoomInput::Message { session_id, msg } => self.handle_message(session_id, msg),
            RoomInput::Resync { session_id } => self.handle_resync(session_id),
            RoomInput::Leave { session_id } => self.handle_leave(session_id),
        }
    }

    fn handle_resync(&mut self, session_id: SessionId) {
        if !self.state.players.contains_key(&session_id) {
            return;
        }
        debug!(room_id = %self.id, session_id = %session_id, "Resending full state after lag");

        // Patches are relative to what was broadcast, a lagged receiver needs a fresh base
        self.snapshots.force_full();
        self.publish();
    }

    fn handle_join(&mut self, session_id: SessionId, name: String, appearance: String) {
        let player = Player::new(session_id, name, appearance);
        let _ = self.broadcast_tx.send(ServerMsg::PlayerJoined {
            player: player_snapshot(&player),
        });
        self.state.players.insert(session_id, player);

        info!(
            room_id = %self.id,
            session_id = %session_id,
            player_count = self.state.players.len(),
            "Player joined room"
        );

        // The newcomer needs the whole picture, not a patch
        self.snapshots.force_full();
        self.publish();
    }

    fn handle_leave(&mut self, session_id: SessionId) {
        if self.state.players.remove(&session_id).is_none() {
            return;
        }
        self.handle.release_seat();

        let _ = self.broadcast_tx.send(ServerMsg::PlayerLeft {
            session_id,
            reason: "disconnected".to_string(),
        });

        info!(
            room_id = %self.id,
            session_id = %session_id,
            player_count = self.state.players.len(),
            "Player left room"
        );

        self.publish();
    }

    fn handle_message(&mut self, session_id: SessionId, msg: ClientMsg) {
        let Some(player) = self.state.players.get_mut(&session_id) else {
            debug!(room_id = %self.id, session_id = %session_id, "Message from unknown session ignored");
            return;
        };

        match msg {
            ClientMsg::Pos { x, y, z } => {
                player.x = x;
                player.y = y;
                player.z = z;
                self.publish();
            }
            ClientMsg::Rotate { yaw } => {
                player.rot_y = yaw;
                self.publish();
            }
            ClientMsg::StepTouch { id } => {
                self.state.touched_steps.insert(id.to_string());
                let _ = self.broadcast_tx.send(ServerMsg::StepFade { id });
            }
            ClientMsg::Chat { text } => {
                let message = format_chat_line(
                    self.filter.as_ref(),
                    &player.name,
                    &text,
                    self.settings.chat_max_chars,
                );
                info!(room_id = %self.id, session_id = %session_id, "{}", message);
                let _ = self.broadcast_tx.send(ServerMsg::Chat { message });
            }
            ClientMsg::Ping { .. } => {
                // Answered by the connection itself
            }
        }
    }

    fn run_sim_tick(&mut self, now: u64) {
        let outcome = self.scheduler.sim_tick(&mut self.state, now, &mut self.rng);
        if outcome.phase_changed {
            debug!(
                room_id = %self.id,
                phase = ?self.state.phase.phase,
                color = self.state.phase.current_color,
                "Phase changed"
            );
        }
        self.publish();
    }

    fn run_centrifuge_tick(&mut self) {
        self.scheduler.centrifuge_tick(&mut self.state);
        self.publish_angle();
    }

    fn regenerate_quiz(&mut self, now: u64) {
        self.state.quiz = MathQuiz::generate(&mut self.rng, now);
        info!(room_id = %self.id, "Math quiz regenerated");
        self.publish();
    }

    /// Hand the consistent post-step state to replication
    fn publish(&mut self) {
        if let Some(msg) = self.snapshots.build(self.scheduler.tick(), &self.state) {
            // No receivers is fine
            let _ = self.broadcast_tx.send(msg);
        }
    }

    fn publish_angle(&mut self) {
        if let Some(msg) = self.snapshots.build_angle(self.scheduler.tick(), &self.state) {
            let _ = self.broadcast_tx.send(msg);
        }
    }
}
