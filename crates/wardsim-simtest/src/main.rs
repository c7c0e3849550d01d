//! WardSim Headless Simulation Harness
//!
//! Validates the floor engine and compares the two operating policies by
//! driving both scripted tours on virtual time. Runs entirely in-process:
//! no rendering, no input devices.
//!
//! Usage:
//!   cargo run -p wardsim-simtest
//!   cargo run -p wardsim-simtest -- --verbose
//!   cargo run -p wardsim-simtest -- --json
//!   cargo run -p wardsim-simtest -- --config path/to/floor_config.json
//!
//! Set `RUST_LOG=debug` to watch individual moves and preloads.

use hecs::Entity;
use serde::Serialize;
use wardsim_core::metrics::{MovementAnalysis, SimMetrics};
use wardsim_core::prelude::*;
use wardsim_core::systems::{EnergySnapshot, PredictionEffectiveness};

// ── Floor configuration (same JSON the integration tests load) ──────────
const FLOOR_CONFIG_JSON: &str = include_str!("../../../data/floor_config.json");

/// Tour cycles per policy run
const TOUR_CYCLES: usize = 3;

// ── Test harness ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

#[derive(Debug, Serialize)]
struct PolicyReport {
    policy: &'static str,
    summary: PerformanceSummary,
    analysis: MovementAnalysis,
    prediction: PredictionEffectiveness,
    energy: EnergySnapshot,
}

#[derive(Debug, Serialize)]
struct HarnessReport<'a> {
    results: &'a [TestResult],
    policies: &'a [PolicyReport],
}

struct Options {
    verbose: bool,
    json: bool,
    config_path: Option<String>,
}

/// Where section progress goes. In JSON mode stdout carries the report only.
#[derive(Debug, Clone, Copy)]
struct Console {
    verbose: bool,
    json: bool,
}

impl Console {
    fn new(options: &Options) -> Self {
        Self {
            verbose: options.verbose,
            json: options.json,
        }
    }

    fn section(self, title: &str) {
        if !self.json {
            println!("--- {} ---", title);
        }
    }

    fn verbose(self) -> bool {
        self.verbose && !self.json
    }
}

fn parse_args() -> Options {
    let mut options = Options {
        verbose: false,
        json: false,
        config_path: None,
    };
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--verbose" => options.verbose = true,
            "--json" => options.json = true,
            "--config" => options.config_path = args.next(),
            other => log::warn!("Ignoring unknown argument {}", other),
        }
    }
    options
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let options = parse_args();
    let out = Console::new(&options);
    if !options.json {
        println!("=== WardSim Simulation Harness ===\n");
    }

    let mut results = Vec::new();

    // 1. Floor configuration
    let config = match load_config(options.config_path.as_deref()) {
        Ok(config) => {
            results.push(TestResult {
                name: "config_load".into(),
                passed: true,
                detail: format!(
                    "{} rooms, seed {}",
                    config.layout.len(),
                    config.seed
                ),
            });
            config
        }
        Err(e) => {
            results.push(TestResult {
                name: "config_load".into(),
                passed: false,
                detail: e,
            });
            finish(&results, &[], &options);
            return;
        }
    };
    results.extend(validate_floor_layout(&config, out));

    // 2. Equipment lifecycle
    results.extend(validate_equipment_lifecycle(&config, out));

    // 3. Examination workflow
    results.extend(validate_examination_workflow(&config, out));

    // 4. Prediction heuristic
    results.extend(validate_prediction(&config, out));

    // 5-6. Both policies over the scripted tours
    let traditional = run_policy(&config, false, out);
    let predictive = run_policy(&config, true, out);
    results.extend(validate_policy_comparison(&traditional, &predictive, out));

    finish(&results, &[traditional, predictive], &options);
}

fn finish(results: &[TestResult], policies: &[PolicyReport], options: &Options) {
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    if options.json {
        match render_json(results, policies) {
            Ok(json) => println!("{}", json),
            Err(e) => log::error!("Failed to serialize report: {}", e),
        }
    } else {
        println!();
        for r in results {
            let icon = if r.passed { "✓" } else { "✗" };
            if !r.passed || options.verbose {
                println!("  {} {}: {}", icon, r.name, r.detail);
            }
        }
        for p in policies {
            print_policy(p);
        }
        println!(
            "\n=== RESULT: {}/{} passed, {} failed ===",
            passed, total, failed
        );
    }

    if failed > 0 {
        std::process::exit(1);
    }
}

fn render_json(results: &[TestResult], policies: &[PolicyReport]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&HarnessReport { results, policies })
}

fn load_config(path: Option<&str>) -> Result<SimConfig, String> {
    let json = match path {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {}", path, e))?,
        None => FLOOR_CONFIG_JSON.to_string(),
    };
    SimConfig::from_json_str(&json).map_err(|e| e.to_string())
}

fn new_engine(config: &SimConfig, predictive: bool) -> Option<(SimulationEngine, ManualClock)> {
    let clock = ManualClock::new();
    let config = SimConfig {
        predictive_mode: predictive,
        ..config.clone()
    };
    match SimulationEngine::with_config(config, clock.clone()) {
        Ok(engine) => Some((engine, clock)),
        Err(e) => {
            log::error!("Engine rejected config: {}", e);
            None
        }
    }
}

fn move_to(engine: &mut SimulationEngine, entity: Entity, room: RoomType) {
    let (x, y) = engine.room(room).bounds.center();
    engine.move_actor_to_position(entity, x, y);
}

fn states(engine: &SimulationEngine, room: RoomType) -> Vec<EquipmentState> {
    engine.room(room).equipment.iter().map(|e| e.state()).collect()
}

// ── 1. Floor Layout ─────────────────────────────────────────────────────

fn validate_floor_layout(config: &SimConfig, out: Console) -> Vec<TestResult> {
    out.section("Floor Layout");
    let mut results = Vec::new();

    let Some((engine, _)) = new_engine(config, true) else {
        results.push(TestResult {
            name: "layout_engine".into(),
            passed: false,
            detail: "engine rejected configuration".into(),
        });
        return results;
    };

    // Every room resolves its own centre
    let misplaced: Vec<_> = engine
        .rooms()
        .iter()
        .filter(|r| {
            let (x, y) = r.bounds.center();
            !r.contains_point(x, y)
        })
        .map(|r| r.room_type)
        .collect();
    results.push(TestResult {
        name: "layout_centres_inside".into(),
        passed: misplaced.is_empty(),
        detail: if misplaced.is_empty() {
            "every room contains its centre".into()
        } else {
            format!("{:?} do not contain their centre", misplaced)
        },
    });

    // Equipment catalog installed
    let device_count: usize = engine.rooms().iter().map(|r| r.equipment.len()).sum();
    results.push(TestResult {
        name: "layout_equipment_installed".into(),
        passed: device_count == 12,
        detail: format!("{} devices across the floor", device_count),
    });

    if out.verbose() {
        for room in engine.rooms() {
            println!(
                "  {:<15} {:>4.0},{:<4.0} {} device(s)",
                room.room_type.display_name(),
                room.bounds.x,
                room.bounds.y,
                room.equipment.len()
            );
        }
    }

    results
}

// ── 2. Equipment Lifecycle ──────────────────────────────────────────────

fn validate_equipment_lifecycle(config: &SimConfig, out: Console) -> Vec<TestResult> {
    out.section("Equipment Lifecycle");
    let mut results = Vec::new();

    let Some((mut engine, clock)) = new_engine(config, false) else {
        return results;
    };
    let staff = engine.add_actor(ActorType::Staff);
    move_to(&mut engine, staff, RoomType::Icu);

    // Ventilator warms up for exactly 4s
    let ventilator_state = |engine: &SimulationEngine| engine.room(RoomType::Icu).equipment[0].state();
    clock.set(3.9);
    engine.tick();
    let starting = ventilator_state(&engine) == EquipmentState::Starting;
    clock.set(4.1);
    engine.tick();
    let ready = ventilator_state(&engine) == EquipmentState::Ready;
    results.push(TestResult {
        name: "ventilator_startup".into(),
        passed: starting && ready,
        detail: format!("Starting at 3.9s: {}, Ready at 4.1s: {}", starting, ready),
    });

    // Idle Ready equipment sleeps after the threshold
    let threshold = config.sleep_threshold;
    clock.set(4.1 + threshold - 0.5);
    engine.tick();
    let awake = states(&engine, RoomType::Icu)
        .iter()
        .all(|s| *s == EquipmentState::Ready);
    clock.set(4.1 + threshold + 0.1);
    engine.tick();
    let asleep = states(&engine, RoomType::Icu)
        .iter()
        .all(|s| *s == EquipmentState::Sleep);
    results.push(TestResult {
        name: "sleep_after_idle".into(),
        passed: awake && asleep,
        detail: format!("threshold {:.1}s, awake before: {}, asleep after: {}", threshold, awake, asleep),
    });

    // Sleep draws a tenth of full power
    let snapshot = engine.energy_snapshot();
    results.push(TestResult {
        name: "sleep_power".into(),
        passed: (snapshot.sleep_power_kw - 0.155).abs() < 1e-9,
        detail: format!("{:.3} kW while asleep", snapshot.sleep_power_kw),
    });

    // Preload then mode switch abandons the finished preload
    let Some((mut engine, clock)) = new_engine(config, true) else {
        return results;
    };
    engine.preload_room(RoomType::Lab);
    clock.advance(7.0);
    engine.tick();
    let preloaded = states(&engine, RoomType::Lab)
        .iter()
        .all(|s| *s == EquipmentState::Preloaded);
    engine.set_predictive_mode(false);
    let off = states(&engine, RoomType::Lab)
        .iter()
        .all(|s| *s == EquipmentState::Off);
    results.push(TestResult {
        name: "preload_abandoned_on_mode_switch".into(),
        passed: preloaded && off && engine.metrics().preloads_wasted == 4,
        detail: format!(
            "preloaded: {}, off after switch: {}, wasted: {}",
            preloaded,
            off,
            engine.metrics().preloads_wasted
        ),
    });

    if out.verbose() {
        println!("  lifecycle checks ran to t={:.1}s", clock.now());
    }

    results
}

// ── 3. Examination Workflow ─────────────────────────────────────────────

fn validate_examination_workflow(config: &SimConfig, out: Console) -> Vec<TestResult> {
    out.section("Examination Workflow");
    let mut results = Vec::new();

    let Some((mut engine, clock)) = new_engine(config, false) else {
        return results;
    };
    let staff = engine.add_actor(ActorType::Staff);
    let doctor = engine.add_actor(ActorType::Doctor);
    let patient = engine.add_actor(ActorType::Patient);
    for entity in [staff, doctor, patient] {
        move_to(&mut engine, entity, RoomType::Icu);
    }

    clock.set(1.0);
    engine.tick();
    let waited = !engine.room(RoomType::Icu).examination_in_progress;
    clock.set(4.0);
    engine.tick();
    let started = engine.room(RoomType::Icu).examination_in_progress;
    results.push(TestResult {
        name: "exam_waits_for_equipment".into(),
        passed: waited && started,
        detail: format!(
            "idle at 1s: {}, running at 4s: {} ({})",
            waited,
            started,
            engine
                .room(RoomType::Icu)
                .active_session
                .clone()
                .unwrap_or_default()
        ),
    });

    clock.set(6.0);
    move_to(&mut engine, patient, RoomType::Lobby);
    engine.tick();
    let ended = !engine.room(RoomType::Icu).examination_in_progress;
    let flags_cleared = engine
        .actor_snapshots()
        .iter()
        .all(|a| !a.in_examination || a.examination_room != Some(RoomType::Icu));
    results.push(TestResult {
        name: "exam_ends_when_patient_leaves".into(),
        passed: ended && flags_cleared && engine.metrics().examinations_completed == 1,
        detail: format!(
            "ended: {}, flags cleared: {}, completed: {}",
            ended,
            flags_cleared,
            engine.metrics().examinations_completed
        ),
    });

    results
}

// ── 4. Prediction ───────────────────────────────────────────────────────

fn validate_prediction(config: &SimConfig, out: Console) -> Vec<TestResult> {
    out.section("Prediction");
    let mut results = Vec::new();

    let Some((mut engine, _)) = new_engine(config, true) else {
        return results;
    };
    let doctor = engine.add_actor(ActorType::Doctor);
    let first = engine.next_likely_room(doctor);
    move_to(&mut engine, doctor, RoomType::Icu);
    let second = engine.next_likely_room(doctor);
    results.push(TestResult {
        name: "doctor_follows_pattern".into(),
        passed: first == Some(RoomType::Icu) && second == Some(RoomType::Radiology),
        detail: format!("fresh: {:?}, after ICU: {:?}", first, second),
    });

    // A full round of the pattern is predicted correctly after the first move
    for room in [RoomType::Radiology, RoomType::Lab, RoomType::Lobby, RoomType::Icu] {
        move_to(&mut engine, doctor, room);
    }
    let prediction = engine.prediction();
    results.push(TestResult {
        name: "prediction_accuracy_wired".into(),
        passed: prediction.correct_predictions() == 4 && prediction.total_predictions() == 5,
        detail: format!(
            "{}/{} correct ({:.0}%)",
            prediction.correct_predictions(),
            prediction.total_predictions(),
            prediction.prediction_accuracy()
        ),
    });

    if out.verbose() {
        for record in prediction.recent_predictions() {
            println!(
                "  {}{:03}: {} -> {} ({:.0}%)",
                record.actor_type.initial(),
                record.actor_id,
                record.current_room,
                record.predicted_room,
                record.confidence * 100.0
            );
        }
    }

    results
}

// ── 5. Policy Runs ──────────────────────────────────────────────────────

/// Drive one policy through its tour `TOUR_CYCLES` times, one-second ticks,
/// with the configured cooldown between cycles.
fn run_policy(config: &SimConfig, predictive: bool, out: Console) -> PolicyReport {
    let policy = if predictive { "predictive" } else { "traditional" };
    out.section(&format!("Policy: {}", policy));

    let mut engine_and_clock = new_engine(config, predictive);
    if let Some((engine, clock)) = engine_and_clock.as_mut() {
        for actor_type in ActorType::ALL {
            engine.add_actor(actor_type);
        }
        engine.set_auto_simulation_running(true);

        for cycle in 0..TOUR_CYCLES {
            let mut steps = 0;
            loop {
                let more = if predictive {
                    engine.auto_step_execute_predictive()
                } else {
                    engine.auto_step_execute()
                };
                if !more {
                    break;
                }
                steps += 1;
                clock.advance(1.0);
                engine.tick();
            }

            let cooldown_ticks = config.tour_cooldown_secs.ceil() as usize;
            for _ in 0..cooldown_ticks {
                clock.advance(1.0);
                engine.tick();
            }
            if out.verbose() {
                println!("  cycle {} finished after {} steps", cycle + 1, steps);
            }
        }
        engine.set_auto_simulation_running(false);
    }

    match engine_and_clock {
        Some((engine, _)) => PolicyReport {
            policy,
            summary: engine.performance_summary(),
            analysis: engine.movement_analysis(),
            prediction: engine.prediction_effectiveness(),
            energy: engine.energy_snapshot(),
        },
        None => PolicyReport {
            policy,
            summary: SimMetrics::default().summary(0.0, 0.0),
            analysis: MovementAnalysis::default(),
            prediction: PredictionEffectiveness {
                total_predictions: 0,
                resolved_correct: 0,
                accuracy_percent: 0.0,
                average_confidence: 0.0,
                predictions_per_minute: 0.0,
            },
            energy: EnergySnapshot::default(),
        },
    }
}

fn print_policy(report: &PolicyReport) {
    let s = &report.summary;
    println!("\n  [{}]", report.policy);
    println!(
        "    moves {:>3}  exams {:>2}/{:<2}  preloaded {:>3}  wasted {:>2}",
        s.total_tasks,
        s.examinations,
        s.examinations_started,
        s.resources_preloaded,
        s.preloads_wasted
    );
    println!(
        "    saved {:>6.1}s  lost {:>6.1}s  net {:>+7.1}s  avg {:>+5.2}s/move",
        s.time_saved_total, s.time_lost_total, s.net_time_benefit, s.avg_time_per_task
    );
    println!(
        "    energy {:.4} kWh  sleep savings {:.4} kWh ({:.1}%)  prediction {:.1}%",
        s.energy_consumed_kwh, s.energy_saved_kwh, s.energy_efficiency_percent, s.prediction_accuracy
    );
}

// ── 6. Policy Comparison ────────────────────────────────────────────────

fn validate_policy_comparison(
    traditional: &PolicyReport,
    predictive: &PolicyReport,
    out: Console,
) -> Vec<TestResult> {
    out.section("Policy Comparison");
    let mut results = Vec::new();
    let trad = &traditional.summary;
    let pred = &predictive.summary;

    results.push(TestResult {
        name: "tours_completed".into(),
        passed: trad.total_tasks > 0 && pred.total_tasks > 0,
        detail: format!("{} traditional / {} predictive moves", trad.total_tasks, pred.total_tasks),
    });

    results.push(TestResult {
        name: "predictive_saves_time".into(),
        passed: pred.net_time_benefit > trad.net_time_benefit,
        detail: format!(
            "net {:+.1}s predictive vs {:+.1}s traditional",
            pred.net_time_benefit, trad.net_time_benefit
        ),
    });

    results.push(TestResult {
        name: "traditional_never_preloads".into(),
        passed: trad.resources_preloaded == 0 && traditional.prediction.total_predictions == 0,
        detail: format!(
            "{} preloads, {} predictions",
            trad.resources_preloaded, traditional.prediction.total_predictions
        ),
    });

    results.push(TestResult {
        name: "predictive_records_predictions".into(),
        passed: predictive.prediction.total_predictions > 0,
        detail: format!(
            "{} predictions, {:.1}% accurate",
            predictive.prediction.total_predictions, predictive.prediction.accuracy_percent
        ),
    });

    let energy_ok = [trad, pred]
        .iter()
        .all(|s| s.energy_consumed_kwh >= 0.0 && s.energy_saved_kwh >= 0.0);
    results.push(TestResult {
        name: "energy_accounted".into(),
        passed: energy_ok && pred.energy_consumed_kwh > 0.0,
        detail: format!(
            "{:.4} kWh traditional / {:.4} kWh predictive",
            trad.energy_consumed_kwh, pred.energy_consumed_kwh
        ),
    });

    results
}
