//! Simulation engine - main entry point for running the floor simulation

use std::collections::HashMap;

use hecs::{Entity, World};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};
use crate::components::*;
use crate::config::{ConfigError, SimConfig};
use crate::metrics::{
    analyze_movements, MovementAnalysis, MovementOrigin, MovementRecord, PerformanceSummary,
    SimMetrics,
};
use crate::systems::*;

/// Main simulation engine
pub struct SimulationEngine {
    /// Actor arena
    pub world: World,
    /// Live actors in creation order
    roster: Vec<Entity>,
    /// One room per type, indexed by `RoomType::index()`
    rooms: Vec<Room>,
    prediction: PredictionEngine,
    /// Outstanding prediction per actor, scored on its next move
    pending_predictions: HashMap<Entity, RoomType>,
    predictive_mode: bool,
    auto_simulation_running: bool,
    tours: TourCursor,
    movement_log: Vec<MovementRecord>,
    metrics: SimMetrics,
    /// Next id per actor type; ids are never reused
    next_ids: [u32; 3],
    config: SimConfig,
    clock: Box<dyn Clock>,
    rng: StdRng,
    start_time: f64,
}

/// Read-only view of one actor for display layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorSnapshot {
    pub tag: String,
    pub actor_type: ActorType,
    pub actor_id: u32,
    pub x: f32,
    pub y: f32,
    pub room: RoomType,
    pub in_examination: bool,
    pub examination_room: Option<RoomType>,
    pub being_dragged: bool,
    pub rooms_visited: usize,
    pub last_movement_time: f64,
}

impl SimulationEngine {
    /// Default floor on the wall clock
    pub fn new() -> Self {
        Self::build(SimConfig::default(), Box::new(SystemClock::new()))
    }

    /// Validate `config` and build an engine reading time from `clock`
    pub fn with_config(config: SimConfig, clock: impl Clock + 'static) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config, Box::new(clock)))
    }

    fn build(config: SimConfig, clock: Box<dyn Clock>) -> Self {
        let now = clock.now();
        let rooms = RoomType::ALL
            .iter()
            .filter_map(|&room_type| {
                config.placement(room_type).map(|p| {
                    Room::new(room_type, p.bounds, now).with_sleep_threshold(config.sleep_threshold)
                })
            })
            .collect();

        let mut metrics = SimMetrics::new();
        metrics.energy = EnergyLedger::new(now);

        Self {
            world: World::new(),
            roster: Vec::new(),
            rooms,
            prediction: PredictionEngine::new(
                config.prediction_confidence,
                config.staff_history_len,
                config.recent_predictions_len,
            ),
            pending_predictions: HashMap::new(),
            predictive_mode: config.predictive_mode,
            auto_simulation_running: false,
            tours: TourCursor::default(),
            movement_log: Vec::new(),
            metrics,
            next_ids: [0; 3],
            rng: StdRng::seed_from_u64(config.seed),
            config,
            clock,
            start_time: now,
        }
    }

    // --- Actors ---

    /// Spawn a new actor in the Lobby
    pub fn add_actor(&mut self, actor_type: ActorType) -> Entity {
        let now = self.clock.now();
        let slot = actor_type.index();
        let actor_id = self.next_ids[slot];
        self.next_ids[slot] += 1;

        let lobby = self.room(RoomType::Lobby).bounds;
        let x = (lobby.x + 50.0 + 40.0 * actor_id as f32).min(lobby.x + lobby.width - 50.0);
        let y = (lobby.y + 100.0 + 20.0 * actor_id as f32).min(lobby.y + lobby.height - 50.0);

        let actor = Actor::new(actor_type, actor_id, now);
        log::debug!("Added {} at ({:.0}, {:.0})", actor.tag, x, y);
        let entity = self.world.spawn((
            actor,
            Position::new(x, y, RoomType::Lobby),
            MovementHistory::new(),
            Examination::default(),
        ));
        self.roster.push(entity);
        entity
    }

    /// Remove an actor. Returns false if it was already gone.
    pub fn remove_actor(&mut self, entity: Entity) -> bool {
        if let Ok(mut exam) = self.world.get::<&mut Examination>(entity) {
            exam.clear();
        }
        if self.world.despawn(entity).is_err() {
            log::warn!("remove_actor: unknown actor {:?}", entity);
            return false;
        }
        self.roster.retain(|&e| e != entity);
        self.pending_predictions.remove(&entity);
        true
    }

    /// First live actor of a type, in creation order
    pub fn first_actor_of(&self, actor_type: ActorType) -> Option<Entity> {
        self.roster.iter().copied().find(|&entity| {
            self.world
                .get::<&Actor>(entity)
                .map(|a| a.actor_type == actor_type)
                .unwrap_or(false)
        })
    }

    pub fn actor_count(&self) -> usize {
        self.roster.len()
    }

    pub fn set_dragging(&mut self, entity: Entity, dragging: bool) -> bool {
        if !self.world.contains(entity) {
            return false;
        }
        if dragging {
            self.world.insert_one(entity, Dragging).ok();
        } else {
            self.world.remove_one::<Dragging>(entity).ok();
        }
        true
    }

    pub fn is_dragging(&self, entity: Entity) -> bool {
        self.world.get::<&Dragging>(entity).is_ok()
    }

    // --- Mode ---

    pub fn predictive_mode(&self) -> bool {
        self.predictive_mode
    }

    /// Switch policy. Turning prediction off drops every finished preload
    /// and forgets outstanding predictions.
    pub fn set_predictive_mode(&mut self, enabled: bool) {
        self.predictive_mode = enabled;
        if enabled {
            log::info!("Predictive mode enabled");
            return;
        }

        let now = self.clock.now();
        let wasted: u32 = self
            .rooms
            .iter_mut()
            .map(|room| room.abandon_preloads(now))
            .sum();
        self.metrics.preloads_wasted += u64::from(wasted);
        self.pending_predictions.clear();
        log::info!(
            "Predictive mode disabled ({} preloaded devices switched off)",
            wasted
        );
    }

    // --- Movement ---

    /// Move an actor to floor coordinates on behalf of the input layer.
    /// Returns the movement record when the actor changed rooms.
    pub fn move_actor_to_position(
        &mut self,
        entity: Entity,
        x: f32,
        y: f32,
    ) -> Option<MovementRecord> {
        self.move_actor(entity, x, y, MovementOrigin::Manual)
    }

    fn move_actor(
        &mut self,
        entity: Entity,
        x: f32,
        y: f32,
        origin: MovementOrigin,
    ) -> Option<MovementRecord> {
        let now = self.clock.now();
        let new_room = room_at(&self.rooms, x, y);

        let old_room = match self.world.get::<&mut Position>(entity) {
            Ok(mut pos) => {
                let old = pos.room;
                pos.x = x;
                pos.y = y;
                pos.room = new_room;
                old
            }
            Err(_) => {
                log::warn!("move: unknown actor {:?}", entity);
                return None;
            }
        };
        if old_room == new_room {
            return None;
        }

        if let Ok(mut history) = self.world.get::<&mut MovementHistory>(entity) {
            history.push(old_room);
        }
        let actor = {
            let mut actor = self.world.get::<&mut Actor>(entity).ok()?;
            actor.last_movement_time = now;
            (*actor).clone()
        };

        let outcome = if actor.actor_type == ActorType::Staff && new_room != RoomType::Lobby {
            let outcome = self.rooms[new_room.index()].staff_enters_room(now);
            self.metrics.equipment_activations += u64::from(outcome.activated);
            outcome
        } else {
            ActivationOutcome::default()
        };

        self.observe_move(entity, &actor, new_room, now);

        let record = MovementRecord {
            actor_type: actor.actor_type,
            actor_id: actor.actor_id,
            from_room: old_room,
            to_room: new_room,
            time_saved: outcome.time_saved,
            delay_incurred: outcome.delay_incurred,
            net_effect: outcome.time_saved - outcome.delay_incurred,
            timestamp: now,
            origin,
        };
        log::debug!(
            "{}: {} -> {} (saved {:.1}s, delayed {:.1}s)",
            actor.tag,
            old_room,
            new_room,
            record.time_saved,
            record.delay_incurred
        );
        self.metrics.record_movement(&record);
        self.movement_log.push(record.clone());
        Some(record)
    }

    /// Learn from a completed move, score the mover's last prediction and
    /// issue the next one.
    fn observe_move(&mut self, entity: Entity, actor: &Actor, room: RoomType, now: f64) {
        self.prediction.learn_staff_pattern(actor, room, now);
        if !self.predictive_mode {
            return;
        }

        if let Some(predicted) = self.pending_predictions.remove(&entity) {
            self.prediction.update_accuracy(predicted, room);
        }

        let history = self
            .world
            .get::<&MovementHistory>(entity)
            .map(|h| (*h).clone())
            .unwrap_or_default();
        let (predicted, confidence) =
            self.prediction
                .predict_movement(actor, room, &history, now, &mut self.rng);
        self.pending_predictions.insert(entity, predicted);
        log::debug!(
            "{} predicted to head for {} ({:.0}%)",
            actor.tag,
            predicted,
            confidence * 100.0
        );

        if actor.actor_type == ActorType::Staff
            && self.config.preload_on_prediction
            && confidence >= self.config.preload_confidence_threshold
            && predicted != room
        {
            self.preload_room_at(predicted, now);
        }
    }

    /// Next room the actor is expected to visit
    pub fn next_likely_room(&mut self, entity: Entity) -> Option<RoomType> {
        let actor = self.world.get::<&Actor>(entity).ok().map(|a| (*a).clone())?;
        let current = self.world.get::<&Position>(entity).ok()?.room;
        let history = self
            .world
            .get::<&MovementHistory>(entity)
            .map(|h| (*h).clone())
            .unwrap_or_default();
        Some(actor.next_likely_room(current, &history, &mut self.rng))
    }

    /// Start warming up a room's idle equipment. Returns devices preloaded.
    pub fn preload_room(&mut self, room_type: RoomType) -> u32 {
        let now = self.clock.now();
        self.preload_room_at(room_type, now)
    }

    fn preload_room_at(&mut self, room_type: RoomType, now: f64) -> u32 {
        let (delay, count) = self.rooms[room_type.index()].start_equipment_preload(now);
        if count > 0 {
            self.metrics.resources_preloaded += u64::from(count);
            log::debug!(
                "Preloading {} device(s) in {} ({:.1}s of warm-up)",
                count,
                room_type,
                delay
            );
        }
        count
    }

    // --- Ticks ---

    /// Advance every device's timed transitions
    pub fn tick_equipment(&mut self) -> usize {
        let now = self.clock.now();
        self.rooms
            .iter_mut()
            .map(|room| room.update_equipment(now))
            .sum()
    }

    /// Occupancy, equipment settling, examinations and the idle shutdown sweep
    pub fn tick_rooms(&mut self) {
        let now = self.clock.now();
        let occupants = collect_occupants(&self.world, &self.roster);
        let idle_secs = self.config.shutdown_idle_secs;

        for room in &mut self.rooms {
            room.update_occupancy(&occupants, now);
            room.update_equipment(now);

            if let Some(start) = room.try_start_examination(now) {
                mark_examination(&self.world, &start, room.room_type);
                self.metrics.examinations_started += 1;
                log::info!("Examination {} started in {}", start.session, room.room_type);
            }

            let session = room.active_session.clone();
            if room.check_examination_end(now) {
                clear_examinations_in(&self.world, room.room_type);
                self.metrics.examinations_completed += 1;
                log::info!(
                    "Examination {} finished in {}",
                    session.unwrap_or_default(),
                    room.room_type
                );
            }

            if self.predictive_mode && room.should_shutdown(now, idle_secs) {
                let (count, _) = room.shutdown_equipment(now, idle_secs);
                if count > 0 {
                    self.metrics.equipment_shutdowns += u64::from(count);
                    log::info!("Shutting down {} idle device(s) in {}", count, room.room_type);
                }
            }
        }
    }

    /// Integrate power draw since the last call.
    /// Returns (instantaneous watts, watt-hours saved by sleep this step).
    pub fn calculate_energy_consumption(&mut self) -> (f64, f64) {
        let now = self.clock.now();
        let tick = self.metrics.energy.integrate(&self.rooms, now);
        (tick.power_watts, tick.saved_wh)
    }

    /// One full simulation tick
    pub fn tick(&mut self) {
        self.tick_equipment();
        self.tick_rooms();
        self.calculate_energy_consumption();
    }

    // --- Tours ---

    pub fn auto_simulation_running(&self) -> bool {
        self.auto_simulation_running
    }

    pub fn set_auto_simulation_running(&mut self, running: bool) {
        self.auto_simulation_running = running;
    }

    pub fn tour_cursor(&self) -> TourCursor {
        self.tours
    }

    /// One step of the traditional tour. False once the tour has finished
    /// (the cursor is then rewound) or when the floor is empty.
    pub fn auto_step_execute(&mut self) -> bool {
        if self.roster.is_empty() {
            return false;
        }
        let Some(step) = self.tours.current_traditional_step() else {
            self.tours.reset_traditional();
            log::info!("Traditional tour complete");
            return false;
        };

        if let Some(entity) = self.first_actor_of(step.actor_type) {
            let (x, y) = self.room(step.target).bounds.center();
            self.move_actor(entity, x, y, MovementOrigin::Auto);
        }
        self.tours.traditional_step += 1;
        true
    }

    /// One step of the predictive tour. False once the tour has finished
    /// (the cursor is then rewound) or when the floor is empty.
    pub fn auto_step_execute_predictive(&mut self) -> bool {
        if self.roster.is_empty() {
            return false;
        }
        let Some(stop) = self.tours.current_predictive_stop() else {
            self.tours.reset_predictive();
            log::info!("Predictive tour complete");
            return false;
        };

        let stage = self.tours.predictive_stage;
        let Some(entity) = self.first_actor_of(stage.actor_type()) else {
            self.tours.advance_predictive_stage();
            return true;
        };

        let arrived = self
            .world
            .get::<&Position>(entity)
            .map(|p| p.room == stop.room)
            .unwrap_or(false);
        if !arrived {
            let (x, y) = self.room(stop.room).bounds.center();
            self.move_actor(entity, x, y, MovementOrigin::Auto);
            return true;
        }

        if stage == TourStage::Staff && self.predictive_mode {
            let now = self.clock.now();
            for &room in stop.preloads {
                self.preload_room_at(room, now);
            }
        }
        self.tours.advance_predictive_stage();
        true
    }

    pub fn reset_predictive_tour(&mut self) {
        self.tours.reset_predictive();
    }

    pub fn reset_traditional_tour(&mut self) {
        self.tours.reset_traditional();
    }

    // --- Views ---

    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    pub fn runtime_secs(&self) -> f64 {
        (self.clock.now() - self.start_time).max(0.0)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn room(&self, room_type: RoomType) -> &Room {
        &self.rooms[room_type.index()]
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn room_snapshots(&self) -> Vec<RoomSnapshot> {
        let now = self.clock.now();
        self.rooms.iter().map(|r| r.snapshot(now)).collect()
    }

    pub fn movement_log(&self) -> &[MovementRecord] {
        &self.movement_log
    }

    pub fn metrics(&self) -> &SimMetrics {
        &self.metrics
    }

    pub fn prediction(&self) -> &PredictionEngine {
        &self.prediction
    }

    pub fn performance_summary(&self) -> PerformanceSummary {
        self.metrics
            .summary(self.runtime_secs(), self.prediction.prediction_accuracy())
    }

    pub fn movement_analysis(&self) -> MovementAnalysis {
        analyze_movements(&self.movement_log)
    }

    pub fn prediction_effectiveness(&self) -> PredictionEffectiveness {
        self.prediction.effectiveness(self.runtime_secs())
    }

    pub fn energy_snapshot(&self) -> EnergySnapshot {
        energy_snapshot(&self.rooms, &self.metrics.energy)
    }

    pub fn actor_snapshot(&self, entity: Entity) -> Option<ActorSnapshot> {
        let mut query = self
            .world
            .query_one::<(
                &Actor,
                &Position,
                &MovementHistory,
                &Examination,
                Option<&Dragging>,
            )>(entity)
            .ok()?;
        let (actor, pos, history, exam, dragging) = query.get()?;
        let snapshot = ActorSnapshot {
            tag: actor.tag.clone(),
            actor_type: actor.actor_type,
            actor_id: actor.actor_id,
            x: pos.x,
            y: pos.y,
            room: pos.room,
            in_examination: exam.in_examination,
            examination_room: exam.room,
            being_dragged: dragging.is_some(),
            rooms_visited: history.len(),
            last_movement_time: actor.last_movement_time,
        };
        Some(snapshot)
    }

    /// Every live actor, in creation order
    pub fn actor_snapshots(&self) -> Vec<ActorSnapshot> {
        self.roster
            .iter()
            .filter_map(|&entity| self.actor_snapshot(entity))
            .collect()
    }
}

impl Default for SimulationEngine {
    fn default() -> Self {
        Self::new()
    }
}
