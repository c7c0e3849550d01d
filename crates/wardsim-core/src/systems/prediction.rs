//! Movement prediction - next-room inference and rolling accuracy.

use std::collections::{HashMap, VecDeque};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::components::{Actor, ActorType, MovementHistory, RoomType};

/// One observed staff location
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoomObservation {
    pub room: RoomType,
    pub timestamp: f64,
}

/// One issued prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub actor_type: ActorType,
    pub actor_id: u32,
    pub predicted_room: RoomType,
    pub current_room: RoomType,
    pub confidence: f32,
    pub timestamp: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionEngine {
    staff_movement_patterns: HashMap<u32, VecDeque<RoomObservation>>,
    recent_predictions: VecDeque<PredictionRecord>,
    total_predictions: u64,
    correct_predictions: u64,
    confidence: f32,
    staff_history_len: usize,
    recent_predictions_len: usize,
}

impl Default for PredictionEngine {
    fn default() -> Self {
        Self::new(0.7, 20, 50)
    }
}

impl PredictionEngine {
    pub fn new(confidence: f32, staff_history_len: usize, recent_predictions_len: usize) -> Self {
        Self {
            staff_movement_patterns: HashMap::new(),
            recent_predictions: VecDeque::new(),
            total_predictions: 0,
            correct_predictions: 0,
            confidence,
            staff_history_len,
            recent_predictions_len,
        }
    }

    /// Record where a staff member has just arrived. Other actor types are ignored.
    pub fn learn_staff_pattern(&mut self, actor: &Actor, room: RoomType, now: f64) {
        if actor.actor_type != ActorType::Staff {
            return;
        }
        let history = self
            .staff_movement_patterns
            .entry(actor.actor_id)
            .or_default();
        history.push_back(RoomObservation {
            room,
            timestamp: now,
        });
        while history.len() > self.staff_history_len {
            history.pop_front();
        }
    }

    /// Predict the actor's next room and log the prediction.
    pub fn predict_movement(
        &mut self,
        actor: &Actor,
        current_room: RoomType,
        history: &MovementHistory,
        now: f64,
        rng: &mut impl Rng,
    ) -> (RoomType, f32) {
        let predicted_room = actor.next_likely_room(current_room, history, rng);
        let confidence = self.confidence;

        self.total_predictions += 1;
        self.recent_predictions.push_back(PredictionRecord {
            actor_type: actor.actor_type,
            actor_id: actor.actor_id,
            predicted_room,
            current_room,
            confidence,
            timestamp: now,
        });
        while self.recent_predictions.len() > self.recent_predictions_len {
            self.recent_predictions.pop_front();
        }

        (predicted_room, confidence)
    }

    /// Score a resolved prediction against where the actor actually went.
    pub fn update_accuracy(&mut self, predicted: RoomType, actual: RoomType) {
        if predicted == actual {
            self.correct_predictions += 1;
        }
    }

    /// Share of predictions that came true, as a percentage (0 before any prediction)
    pub fn prediction_accuracy(&self) -> f64 {
        if self.total_predictions == 0 {
            return 0.0;
        }
        self.correct_predictions as f64 / self.total_predictions as f64 * 100.0
    }

    pub fn total_predictions(&self) -> u64 {
        self.total_predictions
    }

    pub fn correct_predictions(&self) -> u64 {
        self.correct_predictions
    }

    pub fn recent_predictions(&self) -> impl Iterator<Item = &PredictionRecord> {
        self.recent_predictions.iter()
    }

    pub fn staff_history(&self, staff_id: u32) -> Option<&VecDeque<RoomObservation>> {
        self.staff_movement_patterns.get(&staff_id)
    }

    /// Summarise recent predictions over a run of `runtime_secs`
    pub fn effectiveness(&self, runtime_secs: f64) -> PredictionEffectiveness {
        let count = self.recent_predictions.len();
        let average_confidence = if count == 0 {
            0.0
        } else {
            self.recent_predictions
                .iter()
                .map(|p| p.confidence as f64)
                .sum::<f64>()
                / count as f64
        };
        let minutes = (runtime_secs / 60.0).max(1.0);

        PredictionEffectiveness {
            total_predictions: self.total_predictions,
            resolved_correct: self.correct_predictions,
            accuracy_percent: self.prediction_accuracy(),
            average_confidence,
            predictions_per_minute: self.total_predictions as f64 / minutes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionEffectiveness {
    pub total_predictions: u64,
    pub resolved_correct: u64,
    pub accuracy_percent: f64,
    pub average_confidence: f64,
    pub predictions_per_minute: f64,
}
