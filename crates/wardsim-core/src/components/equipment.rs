//! Medical equipment - a timed power/readiness state machine.
//!
//! Every method takes the current time (seconds on the engine clock) so the
//! machine itself never reads a clock. Commands issued from an ineligible
//! state are no-ops and report `0.0` / `false`; rooms routinely fire commands
//! at equipment that is already busy.

use serde::{Deserialize, Serialize};

use super::EquipmentSpec;

/// Idle seconds in `Ready` before a device drops to `Sleep`
pub const DEFAULT_SLEEP_THRESHOLD: f64 = 10.0;

/// Shutdown takes this fraction of the startup time
const SHUTDOWN_FACTOR: f64 = 0.3;

/// Sleep draw as a fraction of nominal draw
const SLEEP_POWER_FACTOR: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquipmentState {
    Off,
    Starting,
    Preloaded,
    Ready,
    InUse,
    Sleep,
    ShuttingDown,
}

impl EquipmentState {
    /// States an examination can run on
    pub fn is_ready_class(self) -> bool {
        matches!(
            self,
            EquipmentState::Ready
                | EquipmentState::InUse
                | EquipmentState::Sleep
                | EquipmentState::Preloaded
        )
    }

    /// States a preload or manual activation can start from
    pub fn can_start(self) -> bool {
        matches!(self, EquipmentState::Off | EquipmentState::Sleep)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Equipment {
    pub name: String,
    pub startup_time: f64,
    pub shutdown_time: f64,
    pub power_consumption: f64,
    pub sleep_power: f64,
    pub sleep_threshold: f64,
    state: EquipmentState,
    state_change_time: f64,
    idle_start_time: f64,
    last_used: f64,
    in_use_by: Option<String>,
    preloaded_by_prediction: bool,
}

impl Equipment {
    pub fn new(name: impl Into<String>, startup_time: f64, power_consumption: f64) -> Self {
        Self {
            name: name.into(),
            startup_time,
            shutdown_time: startup_time * SHUTDOWN_FACTOR,
            power_consumption,
            sleep_power: power_consumption * SLEEP_POWER_FACTOR,
            sleep_threshold: DEFAULT_SLEEP_THRESHOLD,
            state: EquipmentState::Off,
            state_change_time: 0.0,
            idle_start_time: 0.0,
            last_used: 0.0,
            in_use_by: None,
            preloaded_by_prediction: false,
        }
    }

    pub fn from_spec(spec: &EquipmentSpec) -> Self {
        Self::new(spec.name, spec.startup_time, spec.power_consumption)
    }

    pub fn with_sleep_threshold(mut self, seconds: f64) -> Self {
        self.sleep_threshold = seconds;
        self
    }

    pub fn state(&self) -> EquipmentState {
        self.state
    }

    pub fn state_change_time(&self) -> f64 {
        self.state_change_time
    }

    pub fn idle_start_time(&self) -> f64 {
        self.idle_start_time
    }

    pub fn last_used(&self) -> f64 {
        self.last_used
    }

    pub fn in_use_by(&self) -> Option<&str> {
        self.in_use_by.as_deref()
    }

    pub fn preloaded_by_prediction(&self) -> bool {
        self.preloaded_by_prediction
    }

    fn enter(&mut self, state: EquipmentState, now: f64) {
        self.state = state;
        self.state_change_time = now;
    }

    fn begin_startup(&mut self, now: f64, by_prediction: bool) -> f64 {
        if !self.state.can_start() {
            return 0.0;
        }
        self.enter(EquipmentState::Starting, now);
        self.preloaded_by_prediction = by_prediction;
        self.startup_time
    }

    /// Warm up ahead of an expected arrival. Returns the startup delay incurred.
    pub fn start_preload(&mut self, now: f64) -> f64 {
        self.begin_startup(now, true)
    }

    /// Warm up because staff walked in. Returns the startup delay incurred.
    pub fn start_manual_activation(&mut self, now: f64) -> f64 {
        self.begin_startup(now, false)
    }

    /// Apply the time-driven transitions. Returns true if the state changed.
    pub fn update_state(&mut self, now: f64) -> bool {
        let elapsed = now - self.state_change_time;
        match self.state {
            EquipmentState::Starting => {
                if elapsed < self.startup_time {
                    return false;
                }
                if self.preloaded_by_prediction {
                    self.enter(EquipmentState::Preloaded, now);
                } else {
                    self.enter(EquipmentState::Ready, now);
                    self.idle_start_time = now;
                }
                true
            }
            EquipmentState::ShuttingDown => {
                if elapsed < self.shutdown_time {
                    return false;
                }
                self.enter(EquipmentState::Off, now);
                self.in_use_by = None;
                self.preloaded_by_prediction = false;
                true
            }
            EquipmentState::Ready => {
                if now - self.idle_start_time < self.sleep_threshold {
                    return false;
                }
                self.enter(EquipmentState::Sleep, now);
                true
            }
            EquipmentState::Off
            | EquipmentState::Preloaded
            | EquipmentState::InUse
            | EquipmentState::Sleep => false,
        }
    }

    /// Startup/shutdown progress in 0..=1; 0 in every other state.
    pub fn progress(&self, now: f64) -> f64 {
        let span = match self.state {
            EquipmentState::Starting => self.startup_time,
            EquipmentState::ShuttingDown => self.shutdown_time,
            _ => return 0.0,
        };
        if span <= 0.0 {
            return 1.0;
        }
        ((now - self.state_change_time) / span).clamp(0.0, 1.0)
    }

    /// Seconds until a `Starting` device settles; 0 for every other state.
    pub fn remaining_startup(&self, now: f64) -> f64 {
        match self.state {
            EquipmentState::Starting => {
                (self.startup_time - (now - self.state_change_time)).max(0.0)
            }
            _ => 0.0,
        }
    }

    /// Instantaneous draw in watts.
    pub fn current_power(&self, now: f64) -> f64 {
        match self.state {
            EquipmentState::Ready | EquipmentState::InUse | EquipmentState::Preloaded => {
                self.power_consumption
            }
            EquipmentState::Sleep => self.sleep_power,
            EquipmentState::Starting => {
                self.sleep_power + (self.power_consumption - self.sleep_power) * self.progress(now)
            }
            EquipmentState::Off | EquipmentState::ShuttingDown => 0.0,
        }
    }

    pub fn activate_preloaded(&mut self, now: f64) -> bool {
        if self.state != EquipmentState::Preloaded {
            return false;
        }
        self.enter(EquipmentState::Ready, now);
        self.idle_start_time = now;
        true
    }

    pub fn wake_from_sleep(&mut self, now: f64) -> bool {
        if self.state != EquipmentState::Sleep {
            return false;
        }
        self.enter(EquipmentState::Ready, now);
        self.idle_start_time = now;
        true
    }

    pub fn start_use(&mut self, user_id: &str, now: f64) -> bool {
        match self.state {
            EquipmentState::Ready | EquipmentState::Sleep | EquipmentState::Preloaded => {
                self.enter(EquipmentState::InUse, now);
                self.in_use_by = Some(user_id.to_string());
                self.last_used = now;
                true
            }
            _ => false,
        }
    }

    pub fn stop_use(&mut self, now: f64) -> bool {
        if self.state != EquipmentState::InUse {
            return false;
        }
        self.enter(EquipmentState::Ready, now);
        self.in_use_by = None;
        self.idle_start_time = now;
        true
    }

    /// Begin powering down. Returns the shutdown duration, or 0 if ineligible.
    pub fn start_shutdown(&mut self, now: f64) -> f64 {
        match self.state {
            EquipmentState::Ready
            | EquipmentState::InUse
            | EquipmentState::Preloaded
            | EquipmentState::Sleep => {
                self.enter(EquipmentState::ShuttingDown, now);
                self.in_use_by = None;
                self.shutdown_time
            }
            _ => 0.0,
        }
    }

    /// Drop a finished preload straight to `Off` (predictive mode switched off).
    pub fn abandon_preload(&mut self, now: f64) -> bool {
        if self.state != EquipmentState::Preloaded {
            return false;
        }
        self.enter(EquipmentState::Off, now);
        self.preloaded_by_prediction = false;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ventilator() -> Equipment {
        Equipment::new("Ventilator", 4.0, 800.0)
    }

    #[test]
    fn test_derived_constants() {
        let v = ventilator();
        assert!((v.shutdown_time - 1.2).abs() < 1e-9);
        assert!((v.sleep_power - 80.0).abs() < 1e-9);
        assert_eq!(v.sleep_threshold, DEFAULT_SLEEP_THRESHOLD);
        assert_eq!(v.state(), EquipmentState::Off);
    }

    #[test]
    fn test_manual_activation_settles_at_startup_time() {
        let mut v = ventilator();
        assert_eq!(v.start_manual_activation(0.0), 4.0);
        assert!(!v.update_state(3.9));
        assert_eq!(v.state(), EquipmentState::Starting);
        assert!(v.update_state(4.1));
        assert_eq!(v.state(), EquipmentState::Ready);
        assert_eq!(v.idle_start_time(), 4.1);
        assert_eq!(v.state_change_time(), 4.1);
    }

    #[test]
    fn test_preload_settles_into_preloaded() {
        let mut v = ventilator();
        assert_eq!(v.start_preload(0.0), 4.0);
        assert!(v.update_state(4.0));
        assert_eq!(v.state(), EquipmentState::Preloaded);
        assert!(v.preloaded_by_prediction());
        // Preloaded never sleeps on its own
        assert!(!v.update_state(100.0));
        assert!(v.activate_preloaded(100.0));
        assert_eq!(v.state(), EquipmentState::Ready);
        assert_eq!(v.idle_start_time(), 100.0);
    }

    #[test]
    fn test_double_start_is_noop() {
        let mut v = ventilator();
        assert_eq!(v.start_preload(0.0), 4.0);
        assert_eq!(v.start_preload(0.5), 0.0);
        assert_eq!(v.start_manual_activation(0.5), 0.0);
        assert_eq!(v.state_change_time(), 0.0);

        let mut m = ventilator();
        assert_eq!(m.start_manual_activation(0.0), 4.0);
        assert_eq!(m.start_manual_activation(1.0), 0.0);
    }

    #[test]
    fn test_ready_sleeps_after_threshold() {
        let mut v = ventilator();
        v.start_manual_activation(-4.0);
        assert!(v.update_state(0.0));
        assert_eq!(v.state(), EquipmentState::Ready);
        for t in [1.0, 5.0, 9.0, 9.99] {
            assert!(!v.update_state(t));
            assert_eq!(v.state(), EquipmentState::Ready);
        }
        assert!(v.update_state(10.1));
        assert_eq!(v.state(), EquipmentState::Sleep);
    }

    #[test]
    fn test_sleep_wakes_and_can_be_restarted() {
        let mut v = ventilator();
        v.start_manual_activation(0.0);
        v.update_state(4.0);
        v.update_state(20.0);
        assert_eq!(v.state(), EquipmentState::Sleep);
        assert!(v.wake_from_sleep(21.0));
        assert_eq!(v.state(), EquipmentState::Ready);
        assert_eq!(v.idle_start_time(), 21.0);
        assert!(!v.wake_from_sleep(21.0));
    }

    #[test]
    fn test_use_cycle() {
        let mut v = ventilator();
        assert!(!v.start_use("D0-P0", 0.0));
        v.start_manual_activation(0.0);
        v.update_state(4.0);
        assert!(v.start_use("D0-P0", 5.0));
        assert_eq!(v.state(), EquipmentState::InUse);
        assert_eq!(v.in_use_by(), Some("D0-P0"));
        assert_eq!(v.last_used(), 5.0);
        // In use never sleeps
        assert!(!v.update_state(60.0));
        assert!(v.stop_use(61.0));
        assert_eq!(v.state(), EquipmentState::Ready);
        assert_eq!(v.in_use_by(), None);
        assert_eq!(v.idle_start_time(), 61.0);
        assert!(!v.stop_use(62.0));
    }

    #[test]
    fn test_start_use_from_sleep_and_preloaded() {
        let mut s = ventilator();
        s.start_manual_activation(0.0);
        s.update_state(4.0);
        s.update_state(15.0);
        assert!(s.start_use("D1-P1", 16.0));

        let mut p = ventilator();
        p.start_preload(0.0);
        p.update_state(4.0);
        assert!(p.start_use("D1-P1", 5.0));
        assert_eq!(p.state(), EquipmentState::InUse);
    }

    #[test]
    fn test_shutdown_cycle() {
        let mut v = ventilator();
        assert_eq!(v.start_shutdown(0.0), 0.0);
        v.start_preload(0.0);
        assert_eq!(v.start_shutdown(1.0), 0.0, "starting cannot be aborted");
        v.update_state(4.0);
        let t = v.start_shutdown(5.0);
        assert!((t - 1.2).abs() < 1e-9);
        assert_eq!(v.state(), EquipmentState::ShuttingDown);
        assert!(!v.update_state(6.0));
        assert!(v.update_state(6.3));
        assert_eq!(v.state(), EquipmentState::Off);
        assert!(!v.preloaded_by_prediction());
    }

    #[test]
    fn test_shutdown_clears_user() {
        let mut v = ventilator();
        v.start_manual_activation(0.0);
        v.update_state(4.0);
        v.start_use("D0-P0", 4.0);
        v.start_shutdown(5.0);
        assert_eq!(v.in_use_by(), None);
    }

    #[test]
    fn test_power_curve() {
        let mut v = ventilator();
        assert_eq!(v.current_power(0.0), 0.0);

        v.start_manual_activation(0.0);
        assert!((v.current_power(0.0) - 80.0).abs() < 1e-9);
        assert!((v.current_power(2.0) - 440.0).abs() < 1e-9);
        assert!((v.current_power(4.0) - 800.0).abs() < 1e-9);

        v.update_state(4.0);
        assert_eq!(v.current_power(5.0), 800.0);

        v.start_use("D0-P0", 5.0);
        assert_eq!(v.current_power(6.0), 800.0);
        v.stop_use(6.0);
        v.update_state(20.0);
        assert_eq!(v.state(), EquipmentState::Sleep);
        assert!((v.current_power(20.0) - 80.0).abs() < 1e-9);

        v.start_shutdown(21.0);
        assert_eq!(v.current_power(21.5), 0.0);
    }

    #[test]
    fn test_preloaded_draws_full_power() {
        let mut v = ventilator();
        v.start_preload(0.0);
        v.update_state(4.0);
        assert_eq!(v.current_power(4.0), 800.0);
    }

    #[test]
    fn test_abandon_preload_only_affects_preloaded() {
        let mut v = ventilator();
        assert!(!v.abandon_preload(0.0));
        v.start_preload(0.0);
        assert!(!v.abandon_preload(1.0), "still starting");
        v.update_state(4.0);
        assert!(v.abandon_preload(5.0));
        assert_eq!(v.state(), EquipmentState::Off);
        assert!(!v.preloaded_by_prediction());

        let mut r = ventilator();
        r.start_manual_activation(0.0);
        r.update_state(4.0);
        assert!(!r.abandon_preload(5.0));
        assert_eq!(r.state(), EquipmentState::Ready);
    }

    #[test]
    fn test_progress_and_remaining() {
        let mut v = ventilator();
        assert_eq!(v.progress(0.0), 0.0);
        v.start_manual_activation(0.0);
        assert!((v.progress(1.0) - 0.25).abs() < 1e-9);
        assert!((v.remaining_startup(1.0) - 3.0).abs() < 1e-9);
        assert_eq!(v.progress(10.0), 1.0);
        assert_eq!(v.remaining_startup(10.0), 0.0);
    }
}
