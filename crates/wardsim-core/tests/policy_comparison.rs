//! Integration tests comparing the two operating policies end to end.
//!
//! Exercises: SimConfig → SimulationEngine → scripted tours → metrics views
//!
//! All tests run on a ManualClock advanced one second per tour step.

use wardsim_core::prelude::*;

// ── Helpers ────────────────────────────────────────────────────────────

fn engine_with(config: SimConfig) -> (SimulationEngine, ManualClock) {
    let clock = ManualClock::new();
    let mut engine =
        SimulationEngine::with_config(config, clock.clone()).expect("config should be valid");
    for actor_type in ActorType::ALL {
        engine.add_actor(actor_type);
    }
    (engine, clock)
}

fn run_traditional_tour(engine: &mut SimulationEngine, clock: &ManualClock) -> usize {
    let mut steps = 0;
    while engine.auto_step_execute() {
        steps += 1;
        clock.advance(1.0);
        engine.tick();
    }
    steps
}

fn run_predictive_tour(engine: &mut SimulationEngine, clock: &ManualClock) -> usize {
    let mut steps = 0;
    while engine.auto_step_execute_predictive() {
        steps += 1;
        clock.advance(1.0);
        engine.tick();
        assert!(steps < 200, "predictive tour did not terminate");
    }
    steps
}

// ── Policy comparison ──────────────────────────────────────────────────

#[test]
fn test_traditional_tour_pays_every_warm_up() {
    let config = SimConfig {
        predictive_mode: false,
        ..SimConfig::default()
    };
    let (mut engine, clock) = engine_with(config);
    assert_eq!(run_traditional_tour(&mut engine, &clock), 12);

    let summary = engine.performance_summary();
    // Radiology (MRI 12s) + Lab (PCR 6s) + ICU (Ventilator 4s)
    assert_eq!(summary.time_lost_total, 22.0);
    assert_eq!(summary.time_saved_total, 0.0);
    assert_eq!(summary.net_time_benefit, -22.0);
    assert_eq!(summary.resources_preloaded, 0);
    assert_eq!(summary.prediction_accuracy, 0.0);
}

#[test]
fn test_predictive_tour_beats_traditional() {
    let (mut traditional, clock) = engine_with(SimConfig {
        predictive_mode: false,
        ..SimConfig::default()
    });
    run_traditional_tour(&mut traditional, &clock);

    let (mut predictive, clock) = engine_with(SimConfig::default());
    run_predictive_tour(&mut predictive, &clock);

    let trad = traditional.performance_summary();
    let pred = predictive.performance_summary();
    assert!(
        pred.net_time_benefit > trad.net_time_benefit,
        "predictive {} vs traditional {}",
        pred.net_time_benefit,
        trad.net_time_benefit
    );
    assert!(pred.time_lost_total < trad.time_lost_total);
    assert!(pred.resources_preloaded >= 12);
}

#[test]
fn test_predictive_tour_runs_examinations_along_the_route() {
    let (mut engine, clock) = engine_with(SimConfig::default());
    assert_eq!(run_predictive_tour(&mut engine, &clock), 27);

    let metrics = engine.metrics();
    // Doctor and patient start together in the Lobby. Lobby, ER, Radiology and
    // Lab finish when the doctor moves on; ICU is still running.
    assert_eq!(metrics.examinations_started, 5);
    assert_eq!(metrics.examinations_completed, 4);
    assert!(engine.room(RoomType::Icu).examination_in_progress);

    let summary = engine.performance_summary();
    assert_eq!(summary.examinations, 4);
    assert_eq!(summary.examinations_started, 5);
}

#[test]
fn test_mode_switch_mid_tour_wastes_finished_preloads() {
    let config = SimConfig {
        preload_on_prediction: false,
        ..SimConfig::default()
    };
    let (mut engine, clock) = engine_with(config);

    // Lobby stop, then staff walks to the ER and Radiology/Lab are preloaded
    for _ in 0..5 {
        assert!(engine.auto_step_execute_predictive());
    }
    assert_eq!(engine.metrics().resources_preloaded, 8);

    clock.advance(13.0);
    engine.tick();
    engine.set_predictive_mode(false);

    assert_eq!(engine.metrics().preloads_wasted, 8);
    for room in [RoomType::Radiology, RoomType::Lab] {
        assert!(engine
            .room(room)
            .equipment
            .iter()
            .all(|e| e.state() == EquipmentState::Off));
    }
}

// ── Views & configuration ──────────────────────────────────────────────

#[test]
fn test_views_serialize_after_full_run() {
    let (mut engine, clock) = engine_with(SimConfig::default());
    run_predictive_tour(&mut engine, &clock);

    let summary = serde_json::to_value(engine.performance_summary()).expect("summary");
    assert!(summary.get("net_time_benefit").is_some());

    let analysis = engine.movement_analysis();
    assert_eq!(analysis.total_movements, engine.movement_log().len());
    assert!(analysis.actor_performance.contains_key("Staff"));
    let json = serde_json::to_string(&analysis).expect("analysis");
    assert!(json.contains("Lobby → Emergency Room"));

    let effectiveness = engine.prediction_effectiveness();
    assert_eq!(effectiveness.total_predictions, 12);
    assert!(effectiveness.accuracy_percent >= 0.0);

    let snapshot = engine.energy_snapshot();
    assert!(snapshot.total_energy_consumed_kwh > 0.0);
    assert!(serde_json::to_string(&engine.room_snapshots()).is_ok());
}

#[test]
fn test_energy_never_decreases_over_both_tours() {
    let (mut engine, clock) = engine_with(SimConfig::default());
    let mut last = 0.0;
    for _ in 0..2 {
        while engine.auto_step_execute_predictive() {
            clock.advance(1.0);
            engine.tick();
            let consumed = engine.metrics().energy.consumed_wh;
            assert!(consumed >= last);
            last = consumed;
        }
        while engine.auto_step_execute() {
            clock.advance(1.0);
            engine.tick();
            let consumed = engine.metrics().energy.consumed_wh;
            assert!(consumed >= last);
            last = consumed;
        }
    }
    assert!(engine.metrics().energy.saved_by_sleep_wh >= 0.0);
}

#[test]
fn test_bundled_floor_config_loads() {
    let json = include_str!("../../../data/floor_config.json");
    let config = SimConfig::from_json_str(json).expect("bundled config should be valid");
    assert_eq!(config, SimConfig::default());
    assert!(SimulationEngine::with_config(config, ManualClock::new()).is_ok());
}

#[test]
fn test_custom_sleep_threshold_applies_to_every_room() {
    let config = SimConfig::from_json_str(r#"{ "sleep_threshold": 20.0, "predictive_mode": false }"#)
        .expect("partial config");
    let (mut engine, clock) = engine_with(config);
    let staff = engine.first_actor_of(ActorType::Staff).expect("staff");
    let (x, y) = engine.room(RoomType::Lab).bounds.center();
    engine.move_actor_to_position(staff, x, y);

    clock.set(6.0);
    engine.tick();
    clock.set(25.0);
    engine.tick();
    assert!(engine
        .room(RoomType::Lab)
        .equipment
        .iter()
        .all(|e| e.state() == EquipmentState::Ready));

    clock.set(26.0);
    engine.tick();
    assert!(engine
        .room(RoomType::Lab)
        .equipment
        .iter()
        .all(|e| e.state() == EquipmentState::Sleep));
}
