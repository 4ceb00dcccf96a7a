// Persistence for Hyper2048: storage abstraction, save codec, debounced writes

use serde::{Deserialize, Serialize};

use crate::grid::HyperGrid;
use crate::tile::Tile;
use crate::types::{HyperGridError, Position, Result, Timestamp};

/// Storage key holding the compressed save
pub const STORAGE_KEY: &str = "GameBoard";
/// Storage key holding the best score for the session
pub const BEST_SCORE_KEY: &str = "bestScore";

/// Key-value persistence collaborator
///
/// The engine only sees this interface; the browser build plugs in
/// localStorage, tests plug in a HashMap. Absence of a key means
/// "no saved game".
pub trait StorageBackend {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str);
}

/// HashMap-backed storage for native hosts and tests
#[derive(Debug, Default, Clone)]
pub struct InMemoryStorage {
    entries: std::collections::HashMap<String, String>,
}

impl InMemoryStorage {
    pub fn new() -> InMemoryStorage {
        InMemoryStorage::default()
    }
}

impl StorageBackend for InMemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// Browser localStorage backend
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default)]
pub struct LocalStorage;

#[cfg(target_arch = "wasm32")]
impl LocalStorage {
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()?.local_storage().ok().flatten()
    }
}

#[cfg(target_arch = "wasm32")]
impl StorageBackend for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        Self::storage()?.get_item(key).ok().flatten()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let storage = Self::storage()
            .ok_or_else(|| HyperGridError::StorageError("localStorage unavailable".to_string()))?;
        storage
            .set_item(key, value)
            .map_err(|e| HyperGridError::StorageError(format!("set_item failed: {:?}", e)))
    }

    fn remove(&mut self, key: &str) {
        if let Some(storage) = Self::storage() {
            let _ = storage.remove_item(key);
        }
    }
}

/// Persisted view of one tile: position and value only
///
/// `previous_position` and `merged_from` are per-move animation artifacts.
/// Dropping them here is what makes the save a plain tree: the only
/// tile-to-tile references in the live graph go through `merged_from`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedTile {
    pub position: Position,
    pub value: u32,
}

/// Cells nested by coordinate, x outermost to v innermost
pub type SavedCells = Vec<Vec<Vec<Vec<Vec<Option<SavedTile>>>>>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedGrid {
    pub size: usize,
    pub cells: SavedCells,
}

impl SavedGrid {
    /// Capture the occupancy of a live grid
    pub fn capture(grid: &HyperGrid) -> SavedGrid {
        let size = grid.size();
        let mut cells: SavedCells =
            vec![vec![vec![vec![vec![None; size]; size]; size]; size]; size];

        grid.for_each_cell(|position, tile| {
            if let Some(tile) = tile {
                cells[position.x as usize][position.y as usize][position.z as usize]
                    [position.w as usize][position.v as usize] = Some(SavedTile {
                    position,
                    value: tile.value,
                });
            }
        });

        SavedGrid { size, cells }
    }

    /// Saved tile at a coordinate, if the save holds one there
    pub fn tile_at(&self, position: &Position) -> Option<&SavedTile> {
        self.cells
            .get(position.x as usize)?
            .get(position.y as usize)?
            .get(position.z as usize)?
            .get(position.w as usize)?
            .get(position.v as usize)?
            .as_ref()
    }

    /// Rebuild live tiles into `grid` from this save
    pub fn restore_into(&self, grid: &mut HyperGrid) {
        grid.transform_each_cell(|position, _| {
            self.tile_at(&position)
                .map(|saved| Tile::new(position, saved.value))
        });
    }
}

/// Complete persisted game state
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedGame {
    pub grid: SavedGrid,
    pub score: u32,
    pub over: bool,
    pub won: bool,
    pub keep_playing: bool,
}

/// Encode a save as compressed text
///
/// The compressed string length is measured in UTF-16 units, the same way
/// the browser measures what it hands to localStorage. Encodings at or
/// above `limit` are rejected, never truncated.
pub fn encode(saved: &SavedGame, limit: usize) -> Result<String> {
    let json = serde_json::to_string(saved)
        .map_err(|e| HyperGridError::SerializationError(format!("encode failed: {}", e)))?;

    let compressed = lz_str::compress_to_utf16(json.as_str());
    let units = compressed.encode_utf16().count();
    if units >= limit {
        return Err(HyperGridError::SaveTooLarge(units, limit));
    }

    Ok(compressed)
}

/// Decode a compressed save; any corruption is an error, never a panic
pub fn decode(compressed: &str) -> Result<SavedGame> {
    let wide = lz_str::decompress_from_utf16(compressed)
        .ok_or_else(|| HyperGridError::SerializationError("decompression failed".to_string()))?;

    let json = String::from_utf16(&wide)
        .map_err(|e| HyperGridError::SerializationError(format!("invalid UTF-16: {}", e)))?;

    serde_json::from_str(&json)
        .map_err(|e| HyperGridError::SerializationError(format!("decode failed: {}", e)))
}

/// Cancellable delayed task for rate-limited saves
///
/// Cooperative and single-threaded: scheduling replaces any pending
/// deadline, so only the latest state ever reaches storage. The host drives
/// it by polling `fire` with the current time.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay_ms: i64,
    deadline: Option<Timestamp>,
}

impl Debouncer {
    pub fn new(delay_ms: i64) -> Debouncer {
        Debouncer {
            delay_ms,
            deadline: None,
        }
    }

    /// Schedule (or reschedule) the task `delay_ms` from `now`
    pub fn schedule(&mut self, now: Timestamp) {
        self.deadline = Some(now + self.delay_ms);
    }

    /// Drop any pending task
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// True exactly once when the deadline has passed
    pub fn fire(&mut self, now: Timestamp) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
