//! Common components shared by rooms and actors.

use serde::{Deserialize, Serialize};

use super::RoomType;

/// Axis-aligned rectangle in floor coordinates.
///
/// Containment is half-open: the left/top edges belong to the rectangle,
/// the right/bottom edges belong to the neighbour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
    }

    /// True when the two rectangles share any interior area.
    /// Rectangles that only touch along an edge do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Spatial position component - where an actor stands and which room owns that spot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub room: RoomType,
}

impl Position {
    pub fn new(x: f32, y: f32, room: RoomType) -> Self {
        Self { x, y, room }
    }
}
