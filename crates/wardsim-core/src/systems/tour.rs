//! Scripted tours that drive the floor without manual input.
//!
//! The traditional tour moves one actor per step. The predictive tour walks
//! staff, then the doctor, then the patient to each stop, and warms up rooms
//! further down the route once staff reaches certain stops.

use serde::{Deserialize, Serialize};

use crate::components::{ActorType, RoomType};

/// One step of the traditional tour
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TourStep {
    pub actor_type: ActorType,
    pub target: RoomType,
    /// Suggested pause before the next step
    pub delay_secs: f64,
}

const fn step(actor_type: ActorType, target: RoomType, delay_secs: f64) -> TourStep {
    TourStep {
        actor_type,
        target,
        delay_secs,
    }
}

pub const TRADITIONAL_TOUR: [TourStep; 12] = [
    step(ActorType::Staff, RoomType::EmergencyRoom, 2.0),
    step(ActorType::Doctor, RoomType::EmergencyRoom, 3.0),
    step(ActorType::Patient, RoomType::EmergencyRoom, 5.0),
    step(ActorType::Staff, RoomType::Radiology, 2.0),
    step(ActorType::Doctor, RoomType::Radiology, 3.0),
    step(ActorType::Patient, RoomType::Radiology, 5.0),
    step(ActorType::Staff, RoomType::Lab, 2.0),
    step(ActorType::Doctor, RoomType::Lab, 3.0),
    step(ActorType::Patient, RoomType::Lab, 4.0),
    step(ActorType::Staff, RoomType::Icu, 2.0),
    step(ActorType::Doctor, RoomType::Icu, 3.0),
    step(ActorType::Patient, RoomType::Icu, 5.0),
];

/// One stop of the predictive tour
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictiveStop {
    pub room: RoomType,
    /// Rooms to preload once staff has arrived here
    pub preloads: &'static [RoomType],
}

pub const PREDICTIVE_TOUR: [PredictiveStop; 5] = [
    PredictiveStop {
        room: RoomType::Lobby,
        preloads: &[],
    },
    PredictiveStop {
        room: RoomType::EmergencyRoom,
        preloads: &[RoomType::Radiology, RoomType::Lab],
    },
    PredictiveStop {
        room: RoomType::Radiology,
        preloads: &[],
    },
    PredictiveStop {
        room: RoomType::Lab,
        preloads: &[RoomType::Icu],
    },
    PredictiveStop {
        room: RoomType::Icu,
        preloads: &[],
    },
];

/// Which actor the predictive tour is moving at the current stop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TourStage {
    #[default]
    Staff,
    Doctor,
    Patient,
}

impl TourStage {
    pub fn actor_type(self) -> ActorType {
        match self {
            TourStage::Staff => ActorType::Staff,
            TourStage::Doctor => ActorType::Doctor,
            TourStage::Patient => ActorType::Patient,
        }
    }

    /// Following stage, or `None` after the patient
    pub fn next(self) -> Option<TourStage> {
        match self {
            TourStage::Staff => Some(TourStage::Doctor),
            TourStage::Doctor => Some(TourStage::Patient),
            TourStage::Patient => None,
        }
    }
}

/// Progress through both tours
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TourCursor {
    pub traditional_step: usize,
    pub predictive_stop: usize,
    pub predictive_stage: TourStage,
}

impl TourCursor {
    pub fn current_traditional_step(&self) -> Option<&'static TourStep> {
        TRADITIONAL_TOUR.get(self.traditional_step)
    }

    pub fn current_predictive_stop(&self) -> Option<&'static PredictiveStop> {
        PREDICTIVE_TOUR.get(self.predictive_stop)
    }

    pub fn reset_traditional(&mut self) {
        self.traditional_step = 0;
    }

    pub fn reset_predictive(&mut self) {
        self.predictive_stop = 0;
        self.predictive_stage = TourStage::Staff;
    }

    /// Move to the next stage, rolling over to the next stop after the patient
    pub fn advance_predictive_stage(&mut self) {
        match self.predictive_stage.next() {
            Some(stage) => self.predictive_stage = stage,
            None => {
                self.predictive_stop += 1;
                self.predictive_stage = TourStage::Staff;
            }
        }
    }
}
