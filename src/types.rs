// Type definitions for Hyper2048 Core

use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

/// Timestamp in milliseconds since epoch
pub type Timestamp = i64;

/// Result type for Hyper2048 operations
pub type Result<T> = std::result::Result<T, HyperGridError>;

/// Error types for Hyper2048 operations
#[derive(Debug, thiserror::Error, Clone, Serialize, Deserialize)]
pub enum HyperGridError {
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Save too large: {0} units (limit {1})")]
    SaveTooLarge(usize, usize),
}

// Convert Rust errors to JsValue for WASM boundary
impl From<HyperGridError> for JsValue {
    fn from(err: HyperGridError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

/// Position on the 5-dimensional grid
///
/// Components are signed so that stepping past an edge during the farthest
/// search stays representable; only `HyperGrid::within_bounds` decides what
/// is on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub w: i32,
    pub v: i32,
}

impl Position {
    pub fn new(x: i32, y: i32, z: i32, w: i32, v: i32) -> Position {
        Position { x, y, z, w, v }
    }

    /// Step once along a movement vector
    pub fn step(&self, vector: &Vector) -> Position {
        Position {
            x: self.x + vector.x,
            y: self.y + vector.y,
            z: self.z + vector.z,
            w: self.w + vector.w,
            v: self.v + vector.v,
        }
    }
}

/// Unit movement vector: exactly one non-zero component, ±1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vector {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub w: i32,
    pub v: i32,
}

/// The ten movement directions: five axis pairs, two signs each
///
/// Discriminants match the numbering the browser input layer sends
/// (0-3 are the classic 2048 arrows, 4-7 move through w/z, 8-9 through v).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    Up = 0,
    Right = 1,
    Down = 2,
    Left = 3,
    HyperUp = 4,
    HyperRight = 5,
    HyperDown = 6,
    HyperLeft = 7,
    UltraLeft = 8,
    UltraRight = 9,
}

impl Direction {
    /// All ten directions, in wire order
    pub const ALL: [Direction; 10] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
        Direction::HyperUp,
        Direction::HyperRight,
        Direction::HyperDown,
        Direction::HyperLeft,
        Direction::UltraLeft,
        Direction::UltraRight,
    ];

    /// Convert a wire index to a Direction. Returns None for invalid values.
    pub fn from_index(value: u8) -> Option<Direction> {
        match value {
            0 => Some(Direction::Up),
            1 => Some(Direction::Right),
            2 => Some(Direction::Down),
            3 => Some(Direction::Left),
            4 => Some(Direction::HyperUp),
            5 => Some(Direction::HyperRight),
            6 => Some(Direction::HyperDown),
            7 => Some(Direction::HyperLeft),
            8 => Some(Direction::UltraLeft),
            9 => Some(Direction::UltraRight),
            _ => None,
        }
    }

    /// Unit vector this direction pushes tiles along
    pub fn vector(&self) -> Vector {
        let (x, y, z, w, v) = match self {
            Direction::Up => (0, -1, 0, 0, 0),
            Direction::Right => (1, 0, 0, 0, 0),
            Direction::Down => (0, 1, 0, 0, 0),
            Direction::Left => (-1, 0, 0, 0, 0),
            Direction::HyperUp => (0, 0, 0, -1, 0),
            Direction::HyperRight => (0, 0, 1, 0, 0),
            Direction::HyperDown => (0, 0, 0, 1, 0),
            Direction::HyperLeft => (0, 0, -1, 0, 0),
            Direction::UltraLeft => (0, 0, 0, 0, -1),
            Direction::UltraRight => (0, 0, 0, 0, 1),
        };
        Vector { x, y, z, w, v }
    }
}

/// Tunable game constants
///
/// The winning value is 1024 rather than the canonical 2048: with five axes
/// to merge along, 2048 comes too easily, so the target is halved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Edge length of the grid (the board has `grid_size^5` cells)
    pub grid_size: usize,
    /// Tiles placed on a fresh board
    pub start_tiles: usize,
    /// Tile value that sets the `won` flag
    pub winning_value: u32,
    /// Chance a spawned tile is a 4 instead of a 2
    pub four_probability: f64,
    /// Chance a second tile spawns after a move
    pub second_spawn_probability: f64,
    /// Debounce window for persistence writes
    pub save_debounce_ms: i64,
    /// Saves at or above this many UTF-16 units are rejected
    pub save_size_limit: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            grid_size: 4,
            start_tiles: 2,
            winning_value: 1024,
            four_probability: 0.1,
            second_spawn_probability: 0.7,
            save_debounce_ms: 1000,
            save_size_limit: 3500,
        }
    }
}

/// Status record sent alongside every grid snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStatus {
    pub score: u32,
    pub over: bool,
    pub won: bool,
    pub best_score: u32,
    pub terminated: bool,
}

/// Grid contents as seen by the actuation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridSnapshot {
    pub size: usize,
    /// Occupied cells only; each tile carries its position, previous
    /// position, and merge sources for animation.
    pub tiles: Vec<crate::tile::Tile>,
}

/// Actuation frame: everything a renderer needs after a move
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub grid: GridSnapshot,
    pub status: GameStatus,
}
