// Tile implementation for Hyper2048 Core

use serde::{Deserialize, Serialize};

use crate::types::Position;

/// A numbered piece on the hyper-grid
///
/// A tile is exclusively owned by the grid slot it occupies; relocating it
/// is an ownership transfer between slots, never a copy the grid keeps.
/// `previous_position` and `merged_from` are per-move animation metadata:
/// both are cleared at the start of every move and neither is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tile {
    /// Current location; always equals the coordinate of the slot holding it
    pub position: Position,
    /// Power of two, starting at 2 or 4
    pub value: u32,
    /// Where the tile sat before the current move
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub previous_position: Option<Position>,
    /// The two source tiles when this tile was produced by a merge
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub merged_from: Option<Box<[Tile; 2]>>,
}

impl Tile {
    /// Create a fresh tile with no move history
    pub fn new(position: Position, value: u32) -> Tile {
        Tile {
            position,
            value,
            previous_position: None,
            merged_from: None,
        }
    }

    /// Record the current position as the pre-move position
    pub fn save_position(&mut self) {
        self.previous_position = Some(self.position);
    }

    /// Relocate the tile (the grid slot is updated by the caller)
    pub fn update_position(&mut self, position: Position) {
        self.position = position;
    }
}
