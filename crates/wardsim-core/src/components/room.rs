//! Room component - a fixed rectangle of floor with its installed equipment.
//!
//! A room never owns actors. Its occupancy lists hold arena handles that are
//! rebuilt from the live actor set on every tick.

use hecs::Entity;
use serde::{Deserialize, Serialize};

use super::{ActorType, Equipment, EquipmentState, Rect, RoomType};

/// Seconds a room must stand empty before its equipment may be shut down
pub const DEFAULT_SHUTDOWN_IDLE_SECS: f64 = 30.0;

/// One actor as seen by the occupancy pass
#[derive(Debug, Clone, Copy)]
pub struct Occupant {
    pub entity: Entity,
    pub actor_type: ActorType,
    pub actor_id: u32,
    pub room: RoomType,
}

/// Presence entry kept in arrival (roster) order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Presence {
    pub entity: Entity,
    pub actor_id: u32,
}

/// Result of a staff member physically entering a room
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivationOutcome {
    /// Devices started or promoted by this entry
    pub activated: u32,
    /// Longest remaining warm-up after the entry (devices warm up in parallel)
    pub delay_incurred: f64,
    /// Longest warm-up already absorbed by preloading
    pub time_saved: f64,
}

/// An examination that has just begun
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExaminationStart {
    pub doctor: Entity,
    pub patient: Entity,
    /// Equipment session tag, `D{doctor_id}-P{patient_id}`
    pub session: String,
}

#[derive(Debug, Clone)]
pub struct Room {
    pub room_type: RoomType,
    pub bounds: Rect,
    pub equipment: Vec<Equipment>,
    pub staff_present: bool,
    pub doctors_present: Vec<Presence>,
    pub patients_present: Vec<Presence>,
    pub examination_in_progress: bool,
    pub active_session: Option<String>,
    pub last_occupancy_time: f64,
    pub last_preload_time: f64,
    pub equipment_activation_time: f64,
}

impl Room {
    pub fn new(room_type: RoomType, bounds: Rect, now: f64) -> Self {
        Self {
            room_type,
            bounds,
            equipment: room_type
                .equipment_catalog()
                .iter()
                .map(Equipment::from_spec)
                .collect(),
            staff_present: false,
            doctors_present: Vec::new(),
            patients_present: Vec::new(),
            examination_in_progress: false,
            active_session: None,
            last_occupancy_time: now,
            last_preload_time: 0.0,
            equipment_activation_time: 0.0,
        }
    }

    pub fn with_sleep_threshold(mut self, seconds: f64) -> Self {
        for equipment in &mut self.equipment {
            equipment.sleep_threshold = seconds;
        }
        self
    }

    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        self.bounds.contains(x, y)
    }

    pub fn is_occupied(&self) -> bool {
        self.staff_present || !self.doctors_present.is_empty() || !self.patients_present.is_empty()
    }

    /// Rebuild presence lists from the authoritative actor set
    pub fn update_occupancy(&mut self, occupants: &[Occupant], now: f64) {
        self.staff_present = false;
        self.doctors_present.clear();
        self.patients_present.clear();

        for occupant in occupants.iter().filter(|o| o.room == self.room_type) {
            let presence = Presence {
                entity: occupant.entity,
                actor_id: occupant.actor_id,
            };
            match occupant.actor_type {
                ActorType::Staff => self.staff_present = true,
                ActorType::Doctor => self.doctors_present.push(presence),
                ActorType::Patient => self.patients_present.push(presence),
            }
        }

        if self.is_occupied() {
            self.last_occupancy_time = now;
        }
    }

    /// Run time-driven transitions on every device. Returns how many changed state.
    pub fn update_equipment(&mut self, now: f64) -> usize {
        self.equipment
            .iter_mut()
            .map(|e| e.update_state(now))
            .filter(|changed| *changed)
            .count()
    }

    /// Every device usable for an examination (vacuously true for bare rooms)
    pub fn all_equipment_ready(&self) -> bool {
        self.equipment.iter().all(|e| e.state().is_ready_class())
    }

    pub fn try_start_examination(&mut self, now: f64) -> Option<ExaminationStart> {
        if self.examination_in_progress || !self.all_equipment_ready() {
            return None;
        }
        let doctor = *self.doctors_present.first()?;
        let patient = *self.patients_present.first()?;
        let session = format!("D{}-P{}", doctor.actor_id, patient.actor_id);

        for equipment in &mut self.equipment {
            equipment.start_use(&session, now);
        }

        self.examination_in_progress = true;
        self.active_session = Some(session.clone());
        Some(ExaminationStart {
            doctor: doctor.entity,
            patient: patient.entity,
            session,
        })
    }

    /// End the running examination once either side has left.
    /// Actor flags are the caller's to clear.
    pub fn check_examination_end(&mut self, now: f64) -> bool {
        if !self.examination_in_progress
            || (!self.doctors_present.is_empty() && !self.patients_present.is_empty())
        {
            return false;
        }
        for equipment in &mut self.equipment {
            equipment.stop_use(now);
        }
        self.examination_in_progress = false;
        self.active_session = None;
        true
    }

    /// Latest of the last occupancy and the last preload
    pub fn last_activity_time(&self) -> f64 {
        self.last_occupancy_time.max(self.last_preload_time)
    }

    pub fn should_shutdown(&self, now: f64, idle_secs: f64) -> bool {
        !self.is_occupied()
            && !self.examination_in_progress
            && now - self.last_activity_time() > idle_secs
    }

    /// Power down everything still running. Returns (devices commanded, total shutdown time).
    pub fn shutdown_equipment(&mut self, now: f64, idle_secs: f64) -> (u32, f64) {
        if now - self.last_activity_time() <= idle_secs {
            return (0, 0.0);
        }
        let mut count = 0;
        let mut total = 0.0;
        for equipment in &mut self.equipment {
            let t = equipment.start_shutdown(now);
            if t > 0.0 {
                count += 1;
                total += t;
            }
        }
        (count, total)
    }

    /// Predictive warm-up ahead of an arrival. Returns (total delay, devices preloaded).
    pub fn start_equipment_preload(&mut self, now: f64) -> (f64, u32) {
        let mut total_delay = 0.0;
        let mut count = 0;
        for equipment in self.equipment.iter_mut().filter(|e| e.state().can_start()) {
            total_delay += equipment.start_preload(now);
            count += 1;
        }
        if count > 0 {
            self.last_preload_time = now;
        }
        (total_delay, count)
    }

    /// Staff physically walked in: start cold devices, promote preloaded ones.
    pub fn staff_enters_room(&mut self, now: f64) -> ActivationOutcome {
        let mut outcome = ActivationOutcome::default();

        for equipment in &mut self.equipment {
            match equipment.state() {
                EquipmentState::Off | EquipmentState::Sleep => {
                    equipment.start_manual_activation(now);
                    outcome.activated += 1;
                }
                EquipmentState::Preloaded => {
                    outcome.time_saved = outcome.time_saved.max(equipment.startup_time);
                    equipment.activate_preloaded(now);
                    outcome.activated += 1;
                }
                EquipmentState::Starting if equipment.preloaded_by_prediction() => {
                    let absorbed = equipment.startup_time - equipment.remaining_startup(now);
                    outcome.time_saved = outcome.time_saved.max(absorbed);
                }
                EquipmentState::Starting
                | EquipmentState::Ready
                | EquipmentState::InUse
                | EquipmentState::ShuttingDown => {}
            }
        }

        outcome.delay_incurred = self
            .equipment
            .iter()
            .map(|e| e.remaining_startup(now))
            .fold(0.0, f64::max);

        if outcome.activated > 0 {
            self.equipment_activation_time = now;
        }
        outcome
    }

    /// Force finished preloads back to `Off`. Returns how many were dropped.
    pub fn abandon_preloads(&mut self, now: f64) -> u32 {
        self.equipment
            .iter_mut()
            .map(|e| e.abandon_preload(now))
            .filter(|dropped| *dropped)
            .count() as u32
    }

    pub fn total_power(&self, now: f64) -> f64 {
        self.equipment.iter().map(|e| e.current_power(now)).sum()
    }

    /// Watts avoided right now by devices sitting in `Sleep`
    pub fn sleep_savings_rate(&self) -> f64 {
        self.equipment
            .iter()
            .filter(|e| e.state() == EquipmentState::Sleep)
            .map(|e| e.power_consumption - e.sleep_power)
            .sum()
    }

    pub fn snapshot(&self, now: f64) -> RoomSnapshot {
        RoomSnapshot {
            room_type: self.room_type,
            bounds: self.bounds,
            staff_present: self.staff_present,
            doctors_present: self.doctors_present.len(),
            patients_present: self.patients_present.len(),
            examination_in_progress: self.examination_in_progress,
            active_session: self.active_session.clone(),
            power_watts: self.total_power(now),
            equipment: self
                .equipment
                .iter()
                .map(|e| EquipmentSnapshot {
                    name: e.name.clone(),
                    state: e.state(),
                    progress: e.progress(now),
                    power_watts: e.current_power(now),
                    in_use_by: e.in_use_by().map(str::to_string),
                })
                .collect(),
        }
    }
}

/// Read-only view of one device for display layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentSnapshot {
    pub name: String,
    pub state: EquipmentState,
    pub progress: f64,
    pub power_watts: f64,
    pub in_use_by: Option<String>,
}

/// Read-only view of one room for display layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub room_type: RoomType,
    pub bounds: Rect,
    pub staff_present: bool,
    pub doctors_present: usize,
    pub patients_present: usize,
    pub examination_in_progress: bool,
    pub active_session: Option<String>,
    pub power_watts: f64,
    pub equipment: Vec<EquipmentSnapshot>,
}
