//! Field geometry and wire protocol shared by everything that talks to the
//! hockey server.
//!
//! Two coordinate systems exist side by side:
//!
//! - **Game-space**: the logical playing field, `GAME_WIDTH` x `GAME_HEIGHT`,
//!   with the local player defending the bottom half. Protocol coordinates are
//!   always integer game-space values ([`Position`]).
//! - **Canvas-space**: the drawing surface, which adds a goal strip of
//!   `GATES_HEIGHT` above and below the field plus half a line width of
//!   padding on every side. Display output is fractional ([`Point`]).

pub mod protocol;

use serde::{Deserialize, Serialize};

pub const LINE_WIDTH: i32 = 2;
pub const GAME_WIDTH: i32 = 800;
pub const GAME_HEIGHT: i32 = 1200;
pub const GATES_WIDTH: i32 = 300;
pub const GATES_HEIGHT: i32 = 80;
pub const ENTITY_RADIUS: i32 = 40;
pub const CANVAS_WIDTH: i32 = GAME_WIDTH + 2 * LINE_WIDTH;
pub const CANVAS_HEIGHT: i32 = GAME_HEIGHT + 2 * GATES_HEIGHT + 2 * LINE_WIDTH;
pub const FONT_SIZE: i32 = 64;
pub const SECONDARY_FONT_SIZE: i32 = 32;

pub const SOCKET_PORT: u16 = 3001;
pub const SOCKET_PATH: &str = "/ws";

/// Integer game-space coordinate, as carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Where the local player starts: centred, one diameter above the bottom line.
    pub const fn player_start() -> Self {
        Self::new(GAME_WIDTH / 2, GAME_HEIGHT - 2 * ENTITY_RADIUS)
    }

    pub const fn opponent_start() -> Self {
        Self::new(GAME_WIDTH / 2, 2 * ENTITY_RADIUS)
    }

    pub const fn puck_start() -> Self {
        Self::new(GAME_WIDTH / 2, GAME_HEIGHT / 2)
    }
}

/// Fractional coordinate used for interpolated display output and canvas math.
///
/// Never converted back into a [`Position`] except through
/// [`Bounds::clamp_round`], which is the only path from device input to the wire.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<Position> for Point {
    fn from(position: Position) -> Self {
        Self::new(position.x as f32, position.y as f32)
    }
}

/// Both goal counters from a world snapshot. `a` belongs to the bottom (local) goal line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Score {
    pub a: u32,
    pub b: u32,
}

impl Score {
    pub const fn new(a: u32, b: u32) -> Self {
        Self { a, b }
    }
}

/// Axis-aligned range an entity centre may occupy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    /// The local player's defending half: full width, bottom half only,
    /// inset by the entity radius and the field line.
    pub fn local_half() -> Self {
        let inset = (ENTITY_RADIUS + LINE_WIDTH) as f32;
        Self {
            min: Point::new(inset, (GAME_HEIGHT / 2) as f32 + inset),
            max: Point::new(GAME_WIDTH as f32 - inset, GAME_HEIGHT as f32 - inset),
        }
    }

    pub fn contains(&self, position: Position) -> bool {
        let p = Point::from(position);
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Clamps a fractional point into the bounds and rounds it to the nearest
    /// protocol coordinate.
    pub fn clamp_round(&self, point: Point) -> Position {
        let x = point.x.clamp(self.min.x, self.max.x).round();
        let y = point.y.clamp(self.min.y, self.max.y).round();
        Position::new(x as i32, y as i32)
    }
}

pub fn lerp(start: f32, end: f32, amount: f32) -> f32 {
    (1.0 - amount) * start + amount * end
}

pub fn lerp_point(start: Point, end: Point, amount: f32) -> Point {
    Point::new(lerp(start.x, end.x, amount), lerp(start.y, end.y, amount))
}

pub fn to_canvas(game: Point) -> Point {
    let pad = LINE_WIDTH as f32 / 2.0;
    Point::new(game.x + pad, game.y + GATES_HEIGHT as f32 + pad)
}

pub fn to_game(canvas: Point) -> Point {
    let pad = LINE_WIDTH as f32 / 2.0;
    Point::new(canvas.x - pad, canvas.y - GATES_HEIGHT as f32 - pad)
}
