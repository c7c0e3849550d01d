//! Actor components: who an actor is, where they have been, what they are doing.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::RoomType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ActorType {
    Staff,
    Doctor,
    Patient,
}

impl ActorType {
    pub const ALL: [ActorType; 3] = [ActorType::Staff, ActorType::Doctor, ActorType::Patient];

    /// Stable index into per-type tables (matches `ALL`)
    pub fn index(self) -> usize {
        match self {
            ActorType::Staff => 0,
            ActorType::Doctor => 1,
            ActorType::Patient => 2,
        }
    }

    pub fn initial(self) -> char {
        match self {
            ActorType::Staff => 'S',
            ActorType::Doctor => 'D',
            ActorType::Patient => 'P',
        }
    }

    /// The cyclic round each actor type is expected to walk
    pub fn movement_pattern(self) -> Vec<RoomType> {
        match self {
            ActorType::Staff | ActorType::Doctor => vec![
                RoomType::Lobby,
                RoomType::Icu,
                RoomType::Radiology,
                RoomType::Lab,
                RoomType::Lobby,
            ],
            ActorType::Patient => vec![
                RoomType::Lobby,
                RoomType::Radiology,
                RoomType::Lab,
                RoomType::Icu,
                RoomType::Lobby,
            ],
        }
    }
}

impl std::fmt::Display for ActorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ActorType::Staff => "Staff",
            ActorType::Doctor => "Doctor",
            ActorType::Patient => "Patient",
        };
        f.write_str(name)
    }
}

/// Identity component for every actor on the floor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub actor_type: ActorType,
    /// Per-type id, assigned at creation
    pub actor_id: u32,
    /// Display tag such as `S000` or `D012`
    pub tag: String,
    /// Non-empty cyclic room sequence
    pub movement_pattern: Vec<RoomType>,
    /// Engine time of the last cross-room move (or creation)
    pub last_movement_time: f64,
}

impl Actor {
    pub fn new(actor_type: ActorType, actor_id: u32, created_at: f64) -> Self {
        Self {
            actor_type,
            actor_id,
            tag: format!("{}{:03}", actor_type.initial(), actor_id),
            movement_pattern: actor_type.movement_pattern(),
            last_movement_time: created_at,
        }
    }

    /// Next room this actor is expected to head for.
    ///
    /// Pure function of the current room and the fixed pattern: with no
    /// history the pattern's second stop is returned; otherwise the stop after
    /// the first occurrence of `current` (wrapping). A room missing from the
    /// pattern yields a random room other than `current`.
    pub fn next_likely_room(
        &self,
        current: RoomType,
        history: &MovementHistory,
        rng: &mut impl Rng,
    ) -> RoomType {
        let pattern = &self.movement_pattern;
        if pattern.is_empty() {
            return current;
        }

        if history.is_empty() {
            let start = if pattern.len() > 1 { 1 } else { 0 };
            return pattern[start];
        }

        match pattern.iter().position(|r| *r == current) {
            Some(index) => pattern[(index + 1) % pattern.len()],
            None => {
                let others: Vec<RoomType> = RoomType::ALL
                    .iter()
                    .copied()
                    .filter(|r| *r != current)
                    .collect();
                others.choose(rng).copied().unwrap_or(current)
            }
        }
    }
}

/// Rooms previously occupied, oldest first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MovementHistory {
    pub rooms: Vec<RoomType>,
}

impl MovementHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, room: RoomType) {
        self.rooms.push(room);
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn last(&self) -> Option<RoomType> {
        self.rooms.last().copied()
    }
}

/// Examination participation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Examination {
    pub in_examination: bool,
    pub room: Option<RoomType>,
}

impl Examination {
    pub fn begin(&mut self, room: RoomType) {
        self.in_examination = true;
        self.room = Some(room);
    }

    pub fn clear(&mut self) {
        self.in_examination = false;
        self.room = None;
    }
}

/// Marker component: the input layer is currently dragging this actor
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Dragging;
