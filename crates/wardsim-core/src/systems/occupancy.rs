//! Occupancy system - reads the actor arena into per-room presence and
//! keeps actor examination flags in step with the rooms.

use hecs::{Entity, World};

use crate::components::{Actor, Examination, ExaminationStart, Occupant, Position, Room, RoomType};

/// Snapshot every live actor's room, in roster order
pub fn collect_occupants(world: &World, roster: &[Entity]) -> Vec<Occupant> {
    roster
        .iter()
        .filter_map(|&entity| {
            let actor = world.get::<&Actor>(entity).ok()?;
            let pos = world.get::<&Position>(entity).ok()?;
            Some(Occupant {
                entity,
                actor_type: actor.actor_type,
                actor_id: actor.actor_id,
                room: pos.room,
            })
        })
        .collect()
}

/// Room whose bounds contain the point, falling back to the Lobby
pub fn room_at(rooms: &[Room], x: f32, y: f32) -> RoomType {
    rooms
        .iter()
        .find(|r| r.contains_point(x, y))
        .map(|r| r.room_type)
        .unwrap_or(RoomType::Lobby)
}

/// Flag both participants of a freshly started examination
pub fn mark_examination(world: &World, start: &ExaminationStart, room: RoomType) {
    for entity in [start.doctor, start.patient] {
        if let Ok(mut exam) = world.get::<&mut Examination>(entity) {
            exam.begin(room);
        }
    }
}

/// Clear the flags of every actor examined in `room`. Returns how many were cleared.
pub fn clear_examinations_in(world: &World, room: RoomType) -> usize {
    let mut cleared = 0;
    for (_, exam) in world.query::<&mut Examination>().iter() {
        if exam.room == Some(room) {
            exam.clear();
            cleared += 1;
        }
    }
    cleared
}
