//! Floor structure: room types and the equipment each room is fitted with.

use serde::{Deserialize, Serialize};

/// The fixed set of rooms on the floor
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RoomType {
    Lobby,
    #[serde(rename = "ICU")]
    Icu,
    Radiology,
    Lab,
    PatientRoom,
    EmergencyRoom,
}

impl RoomType {
    pub const ALL: [RoomType; 6] = [
        RoomType::Lobby,
        RoomType::Icu,
        RoomType::Radiology,
        RoomType::Lab,
        RoomType::PatientRoom,
        RoomType::EmergencyRoom,
    ];

    /// Stable index into per-room tables (matches `ALL`)
    pub fn index(self) -> usize {
        match self {
            RoomType::Lobby => 0,
            RoomType::Icu => 1,
            RoomType::Radiology => 2,
            RoomType::Lab => 3,
            RoomType::PatientRoom => 4,
            RoomType::EmergencyRoom => 5,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            RoomType::Lobby => "Lobby",
            RoomType::Icu => "ICU",
            RoomType::Radiology => "Radiology Room",
            RoomType::Lab => "Lab",
            RoomType::PatientRoom => "Patient Room",
            RoomType::EmergencyRoom => "Emergency Room",
        }
    }

    /// Equipment installed in this room type.
    pub fn equipment_catalog(self) -> &'static [EquipmentSpec] {
        match self {
            RoomType::Icu => ICU_EQUIPMENT,
            RoomType::Radiology => RADIOLOGY_EQUIPMENT,
            RoomType::Lab => LAB_EQUIPMENT,
            RoomType::Lobby | RoomType::PatientRoom | RoomType::EmergencyRoom => &[],
        }
    }
}

impl std::fmt::Display for RoomType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Fixed nameplate data for one device model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquipmentSpec {
    pub name: &'static str,
    /// Seconds from power-on to usable
    pub startup_time: f64,
    /// Nominal draw in watts
    pub power_consumption: f64,
}

const fn spec(name: &'static str, startup_time: f64, power_consumption: f64) -> EquipmentSpec {
    EquipmentSpec {
        name,
        startup_time,
        power_consumption,
    }
}

const ICU_EQUIPMENT: &[EquipmentSpec] = &[
    spec("Ventilator", 4.0, 800.0),
    spec("Heart Monitor", 3.0, 200.0),
    spec("IV Pump", 2.5, 150.0),
    spec("Defibrillator", 3.5, 400.0),
];

const RADIOLOGY_EQUIPMENT: &[EquipmentSpec] = &[
    spec("X-Ray Machine", 5.0, 1500.0),
    spec("CT Scanner", 8.0, 3000.0),
    spec("MRI", 12.0, 5000.0),
    spec("Ultrasound", 3.0, 300.0),
];

const LAB_EQUIPMENT: &[EquipmentSpec] = &[
    spec("Blood Analyzer", 4.5, 1200.0),
    spec("Microscope", 2.0, 100.0),
    spec("Centrifuge", 3.0, 600.0),
    spec("PCR Machine", 6.0, 900.0),
];
