//! Metrics - the single accumulator the engine folds events into, and the
//! read-only reports derived from it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::components::{ActorType, RoomType};
use crate::systems::EnergyLedger;

/// Whether a move came from the input layer or a scripted tour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementOrigin {
    Manual,
    Auto,
}

/// One cross-room move and its time effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementRecord {
    pub actor_type: ActorType,
    pub actor_id: u32,
    pub from_room: RoomType,
    pub to_room: RoomType,
    pub time_saved: f64,
    pub delay_incurred: f64,
    /// `time_saved - delay_incurred`
    pub net_effect: f64,
    pub timestamp: f64,
    pub origin: MovementOrigin,
}

/// Cumulative counters for one engine run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimMetrics {
    pub total_delay_saved: f64,
    pub total_delay_incurred: f64,
    /// Net seconds gained across all moves
    pub total_time_saved: f64,
    pub tasks_completed: u64,
    pub manual_movements: u64,
    pub auto_movements: u64,
    pub resources_preloaded: u64,
    pub preloads_wasted: u64,
    pub equipment_activations: u64,
    pub equipment_shutdowns: u64,
    pub examinations_started: u64,
    pub examinations_completed: u64,
    pub energy: EnergyLedger,
}

impl SimMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_movement(&mut self, record: &MovementRecord) {
        self.tasks_completed += 1;
        match record.origin {
            MovementOrigin::Manual => self.manual_movements += 1,
            MovementOrigin::Auto => self.auto_movements += 1,
        }
        self.total_delay_saved += record.time_saved;
        self.total_delay_incurred += record.delay_incurred;
        self.total_time_saved += record.net_effect;
    }

    pub fn summary(&self, runtime_secs: f64, prediction_accuracy: f64) -> PerformanceSummary {
        PerformanceSummary {
            runtime_minutes: runtime_secs / 60.0,
            total_tasks: self.tasks_completed,
            examinations: self.examinations_completed,
            examinations_started: self.examinations_started,
            prediction_accuracy,
            time_saved_total: self.total_delay_saved,
            time_lost_total: self.total_delay_incurred,
            net_time_benefit: self.total_time_saved,
            avg_time_per_task: self.total_time_saved / self.tasks_completed.max(1) as f64,
            energy_consumed_kwh: self.energy.consumed_wh / 1000.0,
            energy_saved_kwh: self.energy.saved_by_sleep_wh / 1000.0,
            energy_efficiency_percent: self.energy.saved_by_sleep_wh
                / self.energy.consumed_wh.max(1.0)
                * 100.0,
            resources_preloaded: self.resources_preloaded,
            preloads_wasted: self.preloads_wasted,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub runtime_minutes: f64,
    pub total_tasks: u64,
    /// Examinations that have finished. One still running at report time
    /// shows up only in `examinations_started`.
    pub examinations: u64,
    pub examinations_started: u64,
    pub prediction_accuracy: f64,
    pub time_saved_total: f64,
    pub time_lost_total: f64,
    pub net_time_benefit: f64,
    pub avg_time_per_task: f64,
    pub energy_consumed_kwh: f64,
    pub energy_saved_kwh: f64,
    /// Sleep savings relative to consumption
    pub energy_efficiency_percent: f64,
    pub resources_preloaded: u64,
    pub preloads_wasted: u64,
}

/// Aggregate effect of a group of moves
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectStats {
    pub count: u64,
    pub total_effect: f64,
    pub avg_effect: f64,
}

impl EffectStats {
    fn add(&mut self, effect: f64) {
        self.count += 1;
        self.total_effect += effect;
        self.avg_effect = self.total_effect / self.count as f64;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MovementAnalysis {
    pub total_movements: usize,
    pub positive_outcomes: usize,
    pub negative_outcomes: usize,
    pub neutral_outcomes: usize,
    pub avg_time_effect: f64,
    pub best_effect: f64,
    pub worst_effect: f64,
    /// Keyed `"From → To"` by room display name
    pub room_transitions: BTreeMap<String, EffectStats>,
    /// Keyed by actor type name
    pub actor_performance: BTreeMap<String, EffectStats>,
}

/// Break the movement log down by outcome, transition and actor type.
/// An empty log yields an all-zero analysis.
pub fn analyze_movements(log: &[MovementRecord]) -> MovementAnalysis {
    let mut analysis = MovementAnalysis {
        total_movements: log.len(),
        ..MovementAnalysis::default()
    };
    if log.is_empty() {
        return analysis;
    }

    let mut best = f64::NEG_INFINITY;
    let mut worst = f64::INFINITY;
    let mut total = 0.0;

    for record in log {
        let effect = record.net_effect;
        if effect > 0.0 {
            analysis.positive_outcomes += 1;
        } else if effect < 0.0 {
            analysis.negative_outcomes += 1;
        } else {
            analysis.neutral_outcomes += 1;
        }
        best = best.max(effect);
        worst = worst.min(effect);
        total += effect;

        let transition = format!(
            "{} → {}",
            record.from_room.display_name(),
            record.to_room.display_name()
        );
        analysis
            .room_transitions
            .entry(transition)
            .or_default()
            .add(effect);
        analysis
            .actor_performance
            .entry(record.actor_type.to_string())
            .or_default()
            .add(effect);
    }

    analysis.avg_time_effect = total / log.len() as f64;
    analysis.best_effect = best;
    analysis.worst_effect = worst;
    analysis
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(actor_type: ActorType, from: RoomType, to: RoomType, saved: f64, delay: f64) -> MovementRecord {
        MovementRecord {
            actor_type,
            actor_id: 0,
            from_room: from,
            to_room: to,
            time_saved: saved,
            delay_incurred: delay,
            net_effect: saved - delay,
            timestamp: 0.0,
            origin: MovementOrigin::Manual,
        }
    }

    #[test]
    fn test_record_movement_accumulates() {
        let mut metrics = SimMetrics::new();
        metrics.record_movement(&record(ActorType::Staff, RoomType::Lobby, RoomType::Icu, 0.0, 4.0));
        let mut auto = record(ActorType::Staff, RoomType::Icu, RoomType::Lab, 6.0, 0.0);
        auto.origin = MovementOrigin::Auto;
        metrics.record_movement(&auto);

        assert_eq!(metrics.tasks_completed, 2);
        assert_eq!(metrics.manual_movements, 1);
        assert_eq!(metrics.auto_movements, 1);
        assert_eq!(metrics.total_delay_saved, 6.0);
        assert_eq!(metrics.total_delay_incurred, 4.0);
        assert_eq!(metrics.total_time_saved, 2.0);
    }

    #[test]
    fn test_summary_guards_division() {
        let summary = SimMetrics::new().summary(0.0, 0.0);
        assert_eq!(summary.avg_time_per_task, 0.0);
        assert_eq!(summary.energy_efficiency_percent, 0.0);
        assert_eq!(summary.runtime_minutes, 0.0);
    }

    #[test]
    fn test_summary_units() {
        let mut metrics = SimMetrics::new();
        metrics.energy.consumed_wh = 2000.0;
        metrics.energy.saved_by_sleep_wh = 500.0;
        let summary = metrics.summary(120.0, 50.0);
        assert_eq!(summary.runtime_minutes, 2.0);
        assert_eq!(summary.energy_consumed_kwh, 2.0);
        assert_eq!(summary.energy_saved_kwh, 0.5);
        assert_eq!(summary.energy_efficiency_percent, 25.0);
        assert_eq!(summary.prediction_accuracy, 50.0);
    }

    #[test]
    fn test_summary_separates_running_examinations() {
        let mut metrics = SimMetrics::new();
        metrics.examinations_started = 3;
        metrics.examinations_completed = 2;
        let summary = metrics.summary(60.0, 0.0);
        assert_eq!(summary.examinations, 2);
        assert_eq!(summary.examinations_started, 3);
    }

    #[test]
    fn test_empty_analysis() {
        let analysis = analyze_movements(&[]);
        assert_eq!(analysis, MovementAnalysis::default());
    }

    #[test]
    fn test_analysis_breakdown() {
        let log = vec![
            record(ActorType::Staff, RoomType::Lobby, RoomType::Icu, 0.0, 4.0),
            record(ActorType::Staff, RoomType::Icu, RoomType::Lab, 6.0, 0.0),
            record(ActorType::Doctor, RoomType::Lobby, RoomType::Icu, 0.0, 0.0),
            record(ActorType::Staff, RoomType::Lobby, RoomType::Icu, 2.0, 0.0),
        ];
        let analysis = analyze_movements(&log);
        assert_eq!(analysis.total_movements, 4);
        assert_eq!(analysis.positive_outcomes, 2);
        assert_eq!(analysis.negative_outcomes, 1);
        assert_eq!(analysis.neutral_outcomes, 1);
        assert_eq!(analysis.best_effect, 6.0);
        assert_eq!(analysis.worst_effect, -4.0);
        assert_eq!(analysis.avg_time_effect, 1.0);

        let lobby_icu = &analysis.room_transitions["Lobby → ICU"];
        assert_eq!(lobby_icu.count, 3);
        assert_eq!(lobby_icu.total_effect, -2.0);

        let staff = &analysis.actor_performance["Staff"];
        assert_eq!(staff.count, 3);
        assert!((staff.avg_effect - 4.0 / 3.0).abs() < 1e-9);
    }
}
