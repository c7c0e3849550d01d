//! Energy accounting - integrates floor power draw over time.

use serde::{Deserialize, Serialize};

use crate::components::{EquipmentState, Room};

/// Running energy totals, in watt-hours
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergyLedger {
    pub consumed_wh: f64,
    pub saved_by_sleep_wh: f64,
    /// Engine time of the last integration step
    pub last_update: f64,
}

/// Result of one integration step
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergyTick {
    /// Instantaneous floor draw (W)
    pub power_watts: f64,
    pub consumed_wh: f64,
    pub saved_wh: f64,
}

impl EnergyLedger {
    pub fn new(now: f64) -> Self {
        Self {
            last_update: now,
            ..Self::default()
        }
    }

    /// Integrate the floor's draw since the last step. A clock that runs
    /// backwards contributes nothing.
    pub fn integrate(&mut self, rooms: &[Room], now: f64) -> EnergyTick {
        let dt = (now - self.last_update).max(0.0);
        let power_watts: f64 = rooms.iter().map(|r| r.total_power(now)).sum();
        let savings_rate: f64 = rooms.iter().map(|r| r.sleep_savings_rate()).sum();

        let consumed_wh = power_watts * dt / 3600.0;
        let saved_wh = savings_rate * dt / 3600.0;
        self.consumed_wh += consumed_wh;
        self.saved_by_sleep_wh += saved_wh;
        self.last_update = self.last_update.max(now);

        EnergyTick {
            power_watts,
            consumed_wh,
            saved_wh,
        }
    }
}

/// Point-in-time view of how the floor is drawing power
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergySnapshot {
    pub active_equipment: usize,
    pub sleeping_equipment: usize,
    /// Full draw of Ready, InUse and Preloaded devices (kW)
    pub active_power_kw: f64,
    /// Draw of sleeping devices (kW)
    pub sleep_power_kw: f64,
    /// Sleep draw as a share of active draw
    pub sleep_efficiency_percent: f64,
    pub total_energy_consumed_kwh: f64,
    pub total_energy_saved_kwh: f64,
}

pub fn energy_snapshot(rooms: &[Room], ledger: &EnergyLedger) -> EnergySnapshot {
    let mut snapshot = EnergySnapshot::default();
    let mut active_watts = 0.0;
    let mut sleep_watts = 0.0;

    for equipment in rooms.iter().flat_map(|r| r.equipment.iter()) {
        match equipment.state() {
            EquipmentState::Ready | EquipmentState::InUse | EquipmentState::Preloaded => {
                snapshot.active_equipment += 1;
                active_watts += equipment.power_consumption;
            }
            EquipmentState::Sleep => {
                snapshot.sleeping_equipment += 1;
                sleep_watts += equipment.sleep_power;
            }
            EquipmentState::Off | EquipmentState::Starting | EquipmentState::ShuttingDown => {}
        }
    }

    snapshot.active_power_kw = active_watts / 1000.0;
    snapshot.sleep_power_kw = sleep_watts / 1000.0;
    snapshot.sleep_efficiency_percent = sleep_watts / active_watts.max(1.0) * 100.0;
    snapshot.total_energy_consumed_kwh = ledger.consumed_wh / 1000.0;
    snapshot.total_energy_saved_kwh = ledger.saved_by_sleep_wh / 1000.0;
    snapshot
}
