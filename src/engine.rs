// Game manager for Hyper2048: movement, merging, scoring, lifecycle

use rand::{Rng, RngCore};
use wasm_bindgen::prelude::*;

use crate::grid::HyperGrid;
use crate::persistence::{
    decode, encode, Debouncer, SavedGame, SavedGrid, StorageBackend, BEST_SCORE_KEY, STORAGE_KEY,
};
use crate::tile::Tile;
use crate::types::{
    Direction, Frame, GameConfig, GameStatus, GridSnapshot, HyperGridError, Position, Result,
    Timestamp, Vector,
};
use crate::utils::{now, seeded_rng, warn};

/// The puzzle engine: one grid plus game state
///
/// Owns the grid exclusively; `apply_move` runs to completion with no
/// suspension, so no locking is needed anywhere. The host delivers the three
/// logical actions (move, restart, keep playing) and renders the `Frame`
/// snapshots the engine hands back.
#[wasm_bindgen]
pub struct GameManager {
    config: GameConfig,
    grid: HyperGrid,
    score: u32,
    over: bool,
    won: bool,
    keep_playing: bool,
    best_score: u32,
    storage: Box<dyn StorageBackend>,
    rng: Box<dyn RngCore>,
    saver: Debouncer,
}

#[wasm_bindgen]
impl GameManager {
    /// Create a game on a `size^5` grid, resuming a saved game if one exists
    #[wasm_bindgen(constructor)]
    pub fn new(size: usize) -> GameManager {
        let config = GameConfig {
            grid_size: size,
            ..GameConfig::default()
        };
        GameManager::with_config(config, default_backend(), Box::new(rand::thread_rng()))
    }

    /// Apply a move by wire index (0-9)
    ///
    /// Returns the actuation frame as JSON when the move changed the board,
    /// and nothing for a no-op move.
    #[wasm_bindgen(js_name = move)]
    pub fn move_by_index(&mut self, direction: u8) -> Result<Option<String>> {
        let direction = Direction::from_index(direction).ok_or_else(|| {
            HyperGridError::InvalidOperation(format!("unknown direction index {}", direction))
        })?;

        match self.apply_move(direction) {
            Some(frame) => {
                let json = serde_json::to_string(&frame)
                    .map_err(|e| HyperGridError::SerializationError(e.to_string()))?;
                Ok(Some(json))
            }
            None => Ok(None),
        }
    }

    /// Discard the game and its save, then start fresh
    ///
    /// Returns the actuation frame for the new game, so the host repaints
    /// from the same payload a move would hand it.
    #[wasm_bindgen(js_name = restart)]
    pub fn restart(&mut self) -> Result<String> {
        self.saver.cancel();
        self.storage.remove(STORAGE_KEY);
        self.setup();
        self.get_frame()
    }

    /// Continue past a win; suppresses `terminated` until the next win
    #[wasm_bindgen(js_name = keepPlaying)]
    pub fn keep_playing_after_win(&mut self) {
        self.keep_playing = true;
    }

    /// Current actuation snapshot as JSON (also emitted at startup/restart)
    #[wasm_bindgen(js_name = getFrame)]
    pub fn get_frame(&mut self) -> Result<String> {
        let frame = self.frame();
        serde_json::to_string(&frame)
            .map_err(|e| HyperGridError::SerializationError(e.to_string()))
    }

    /// Drive the debounced save; the host calls this from its timer loop
    #[wasm_bindgen(js_name = tick)]
    pub fn tick(&mut self) {
        self.tick_at(now());
    }

    #[wasm_bindgen(js_name = isGameTerminated)]
    pub fn is_game_terminated(&self) -> bool {
        self.over || (self.won && !self.keep_playing)
    }

    #[wasm_bindgen(js_name = score)]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[wasm_bindgen(js_name = bestScore)]
    pub fn best_score(&self) -> u32 {
        self.best_score
    }
}

// Non-WASM methods for native hosts and tests
impl GameManager {
    /// Create a game over an injected storage backend
    pub fn with_storage(size: usize, storage: Box<dyn StorageBackend>) -> GameManager {
        let config = GameConfig {
            grid_size: size,
            ..GameConfig::default()
        };
        GameManager::with_config(config, storage, Box::new(rand::thread_rng()))
    }

    /// Create a deterministic game (seeded spawns) for tests and replays
    pub fn seeded(size: usize, storage: Box<dyn StorageBackend>, seed: &str) -> GameManager {
        let config = GameConfig {
            grid_size: size,
            ..GameConfig::default()
        };
        GameManager::with_config(config, storage, Box::new(seeded_rng(seed)))
    }

    /// Fully parameterized constructor
    pub fn with_config(
        config: GameConfig,
        storage: Box<dyn StorageBackend>,
        rng: Box<dyn RngCore>,
    ) -> GameManager {
        let mut manager = GameManager {
            grid: HyperGrid::new(config.grid_size),
            score: 0,
            over: false,
            won: false,
            keep_playing: false,
            best_score: 0,
            storage,
            rng,
            saver: Debouncer::new(config.save_debounce_ms),
            config,
        };
        manager.setup();
        manager
    }

    /// Initialize state: resume from storage when possible, else fresh
    fn setup(&mut self) {
        self.grid = HyperGrid::new(self.config.grid_size);
        self.best_score = self
            .storage
            .get(BEST_SCORE_KEY)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(0);

        // Malformed or mismatched saves fall back to a fresh game
        let resumed = self
            .storage
            .get(STORAGE_KEY)
            .and_then(|pickle| decode(&pickle).ok())
            .filter(|saved| saved.grid.size == self.config.grid_size);

        match resumed {
            Some(saved) => {
                saved.grid.restore_into(&mut self.grid);
                self.score = saved.score;
                self.over = saved.over;
                self.won = saved.won;
                self.keep_playing = saved.keep_playing;
            }
            None => {
                self.score = 0;
                self.over = false;
                self.won = false;
                self.keep_playing = false;
                self.add_start_tiles();
            }
        }
    }

    /// Move all tiles along `direction`, merging equal pairs
    ///
    /// Returns the actuation frame when anything moved; a no-op move leaves
    /// every observable (score, flags, grid, save schedule) untouched.
    pub fn apply_move(&mut self, direction: Direction) -> Option<Frame> {
        // "Keep playing" lasts exactly long enough to dismiss the win
        // banner, then the win detector re-arms for the next 1024 tile.
        if self.keep_playing && self.won {
            self.keep_playing = false;
            self.won = false;
        }

        if self.is_game_terminated() {
            return None;
        }

        let vector = direction.vector();
        let traversals = self.build_traversals(&vector);
        let mut moved = false;

        self.prepare_tiles();

        // Sweep in far-to-near order so every tile settles before the tiles
        // behind it are processed.
        for &x in &traversals[0] {
            for &y in &traversals[1] {
                for &z in &traversals[2] {
                    for &w in &traversals[3] {
                        for &v in &traversals[4] {
                            let cell = Position::new(x, y, z, w, v);
                            let Some(tile) = self.grid.cell_content(&cell).cloned() else {
                                continue;
                            };

                            let (farthest, next) = self.find_farthest_position(cell, &vector);
                            let merge_target = self
                                .grid
                                .cell_content(&next)
                                .filter(|other| {
                                    other.value == tile.value && other.merged_from.is_none()
                                })
                                .cloned();

                            if let Some(other) = merge_target {
                                // One merge per tile per move: the merged
                                // tile's merged_from marker blocks a second.
                                let mut moving = tile;
                                self.grid.remove_tile(&moving);
                                moving.update_position(next);

                                let mut merged = Tile::new(next, other.value * 2);
                                merged.merged_from = Some(Box::new([moving, other]));
                                let merged_value = merged.value;
                                self.grid.insert_tile(merged);

                                self.score += merged_value;
                                if merged_value == self.config.winning_value {
                                    self.won = true;
                                }
                                moved = true;
                            } else if farthest != cell {
                                let mut moving = tile;
                                self.grid.remove_tile(&moving);
                                moving.update_position(farthest);
                                self.grid.insert_tile(moving);
                                moved = true;
                            }
                        }
                    }
                }
            }
        }

        if !moved {
            return None;
        }

        self.add_random_tile();
        if self.rng.gen::<f64>() < self.config.second_spawn_probability {
            self.add_random_tile();
        }

        if !self.moves_available() {
            self.over = true;
        }

        self.saver.schedule(now());
        Some(self.frame())
    }

    /// True while the player can still change the board
    pub fn moves_available(&self) -> bool {
        self.grid.cells_available() || self.tile_matches_available()
    }

    /// Current actuation snapshot; raises the best score when passed
    pub fn frame(&mut self) -> Frame {
        if self.score > self.best_score {
            self.best_score = self.score;
            if let Err(e) = self
                .storage
                .set(BEST_SCORE_KEY, &self.best_score.to_string())
            {
                warn(&format!("Failed to persist best score: {}", e));
            }
        }

        let mut tiles = Vec::new();
        self.grid.for_each_cell(|_, tile| {
            if let Some(tile) = tile {
                tiles.push(tile.clone());
            }
        });

        Frame {
            grid: GridSnapshot {
                size: self.grid.size(),
                tiles,
            },
            status: GameStatus {
                score: self.score,
                over: self.over,
                won: self.won,
                best_score: self.best_score,
                terminated: self.is_game_terminated(),
            },
        }
    }

    /// Commit the pending save once its debounce window has passed
    pub fn tick_at(&mut self, now: Timestamp) {
        if self.saver.fire(now) {
            if let Err(e) = self.persist() {
                // Oversized or failed encodings skip the write; the previous
                // save (or none) stays intact.
                warn(&format!("Skipping save: {}", e));
            }
        }
    }

    /// True while a save is waiting for its debounce window
    pub fn save_pending(&self) -> bool {
        self.saver.is_pending()
    }

    /// The grid (internal use)
    pub fn grid(&self) -> &HyperGrid {
        &self.grid
    }

    /// Mutable grid access (internal use)
    pub fn grid_mut(&mut self) -> &mut HyperGrid {
        &mut self.grid
    }

    /// The storage collaborator (internal use)
    pub fn storage(&self) -> &dyn StorageBackend {
        self.storage.as_ref()
    }

    pub fn is_over(&self) -> bool {
        self.over
    }

    pub fn has_won(&self) -> bool {
        self.won
    }

    pub fn keep_playing(&self) -> bool {
        self.keep_playing
    }

    fn add_start_tiles(&mut self) {
        for _ in 0..self.config.start_tiles {
            self.add_random_tile();
        }
    }

    /// Spawn one tile (2 or 4) on a uniformly chosen empty cell
    fn add_random_tile(&mut self) {
        if let Some(cell) = self.grid.random_available_cell(&mut self.rng) {
            let value = if self.rng.gen::<f64>() < self.config.four_probability {
                4
            } else {
                2
            };
            self.grid.insert_tile(Tile::new(cell, value));
        }
    }

    /// Snapshot positions and clear merge markers before a sweep
    fn prepare_tiles(&mut self) {
        for tile in self.grid.tiles_mut() {
            tile.merged_from = None;
            tile.save_position();
        }
    }

    /// Per-axis visit orders: axes the vector pushes toward higher
    /// coordinates run in reverse so the farthest tile settles first
    fn build_traversals(&self, vector: &Vector) -> [Vec<i32>; 5] {
        let size = self.grid.size() as i32;
        let ascending: Vec<i32> = (0..size).collect();
        let mut traversals = [
            ascending.clone(),
            ascending.clone(),
            ascending.clone(),
            ascending.clone(),
            ascending,
        ];

        let components = [vector.x, vector.y, vector.z, vector.w, vector.v];
        for (axis, component) in components.into_iter().enumerate() {
            if component == 1 {
                traversals[axis].reverse();
            }
        }
        traversals
    }

    /// Step along the vector until an obstacle or the edge
    ///
    /// Returns the farthest empty cell and the first blocked cell beyond it
    /// (the merge candidate). Out-of-bounds queries read as empty, so the
    /// search needs no edge special-casing.
    fn find_farthest_position(&self, cell: Position, vector: &Vector) -> (Position, Position) {
        let mut previous = cell;
        let mut current = cell.step(vector);

        while self.grid.within_bounds(&current) && self.grid.cell_available(&current) {
            previous = current;
            current = current.step(vector);
        }

        (previous, current)
    }

    /// Exhaustive scan for any mergeable neighbor pair, all 10 directions
    fn tile_matches_available(&self) -> bool {
        let size = self.grid.size() as i32;
        for x in 0..size {
            for y in 0..size {
                for z in 0..size {
                    for w in 0..size {
                        for v in 0..size {
                            let cell = Position::new(x, y, z, w, v);
                            let Some(tile) = self.grid.cell_content(&cell) else {
                                continue;
                            };
                            for direction in Direction::ALL {
                                let neighbor = cell.step(&direction.vector());
                                if let Some(other) = self.grid.cell_content(&neighbor) {
                                    if other.value == tile.value {
                                        return true;
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
        false
    }

    fn persist(&mut self) -> Result<()> {
        let saved = SavedGame {
            grid: SavedGrid::capture(&self.grid),
            score: self.score,
            over: self.over,
            won: self.won,
            keep_playing: self.keep_playing,
        };
        let pickle = encode(&saved, self.config.save_size_limit)?;
        self.storage.set(STORAGE_KEY, &pickle)
    }
}

fn default_backend() -> Box<dyn StorageBackend> {
    #[cfg(target_arch = "wasm32")]
    {
        Box::new(crate::persistence::LocalStorage)
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        Box::new(crate::persistence::InMemoryStorage::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::InMemoryStorage;

    fn test_manager(size: usize) -> GameManager {
        GameManager::seeded(size, Box::new(InMemoryStorage::new()), "test-seed")
    }

    fn clear_grid(manager: &mut GameManager) {
        manager.grid_mut().transform_each_cell(|_, _| None);
    }

    fn place(manager: &mut GameManager, position: Position, value: u32) {
        manager.grid_mut().insert_tile(Tile::new(position, value));
    }

    fn occupied_count(manager: &GameManager) -> usize {
        let mut count = 0;
        manager.grid().for_each_cell(|_, tile| {
            if tile.is_some() {
                count += 1;
            }
        });
        count
    }

    fn assert_grid_consistent(manager: &GameManager) {
        manager.grid().for_each_cell(|position, tile| {
            if let Some(tile) = tile {
                assert_eq!(
                    tile.position, position,
                    "tile position must equal its slot coordinate"
                );
            }
        });
    }

    #[test]
    fn test_fresh_game_places_start_tiles() {
        let mut manager = test_manager(4);
        assert_eq!(occupied_count(&manager), 2);
        assert_eq!(manager.score(), 0);
        assert!(!manager.is_game_terminated());

        let frame = manager.frame();
        assert_eq!(frame.grid.tiles.len(), 2);
        assert_eq!(frame.status.score, 0);
        assert!(!frame.status.terminated);
    }

    #[test]
    fn test_move_at_boundary_is_noop() {
        let mut manager = test_manager(4);
        clear_grid(&mut manager);
        place(&mut manager, Position::new(0, 0, 0, 0, 0), 2);

        let frame = manager.apply_move(Direction::Left);

        assert!(frame.is_none());
        assert_eq!(occupied_count(&manager), 1, "no-op move must not spawn");
        assert_eq!(manager.score(), 0);
        assert!(!manager.save_pending());
        assert_eq!(
            manager
                .grid()
                .cell_content(&Position::new(0, 0, 0, 0, 0))
                .unwrap()
                .value,
            2
        );
    }

    #[test]
    fn test_merge_two_tiles() {
        let mut manager = test_manager(4);
        clear_grid(&mut manager);
        place(&mut manager, Position::new(0, 0, 0, 0, 0), 2);
        place(&mut manager, Position::new(1, 0, 0, 0, 0), 2);

        let frame = manager.apply_move(Direction::Left).expect("tiles moved");

        let merged = manager
            .grid()
            .cell_content(&Position::new(0, 0, 0, 0, 0))
            .expect("merged tile at origin");
        assert_eq!(merged.value, 4);
        assert_eq!(manager.score(), 4);
        assert_eq!(frame.status.score, 4);

        // Merge metadata for the actuator: both sources, converged
        let sources = merged.merged_from.as_ref().expect("merge sources kept");
        assert_eq!(sources[0].value, 2);
        assert_eq!(sources[1].value, 2);

        // Exactly one merged tile plus one or two spawns
        let count = occupied_count(&manager);
        assert!((2..=3).contains(&count), "unexpected tile count {}", count);
        assert_grid_consistent(&manager);
    }

    #[test]
    fn test_one_merge_per_tile_per_move() {
        let mut manager = test_manager(4);
        clear_grid(&mut manager);
        for x in 0..4 {
            place(&mut manager, Position::new(x, 0, 0, 0, 0), 2);
        }

        manager.apply_move(Direction::Left).expect("tiles moved");

        // [2,2,2,2] collapses to [4,4], never to an 8
        let first = manager
            .grid()
            .cell_content(&Position::new(0, 0, 0, 0, 0))
            .unwrap();
        let second = manager
            .grid()
            .cell_content(&Position::new(1, 0, 0, 0, 0))
            .unwrap();
        assert_eq!(first.value, 4);
        assert_eq!(second.value, 4);
        assert_eq!(manager.score(), 8);
    }

    #[test]
    fn test_merged_tile_does_not_merge_again() {
        let mut manager = test_manager(4);
        clear_grid(&mut manager);
        place(&mut manager, Position::new(0, 0, 0, 0, 0), 2);
        place(&mut manager, Position::new(1, 0, 0, 0, 0), 2);
        place(&mut manager, Position::new(2, 0, 0, 0, 0), 4);

        manager.apply_move(Direction::Left).expect("tiles moved");

        // The 2+2 merge makes a 4 at the origin; the trailing 4 slides in
        // behind it but must not chain into an 8 this move
        let merged = manager
            .grid()
            .cell_content(&Position::new(0, 0, 0, 0, 0))
            .unwrap();
        let trailing = manager
            .grid()
            .cell_content(&Position::new(1, 0, 0, 0, 0))
            .unwrap();
        assert_eq!(merged.value, 4);
        assert!(merged.merged_from.is_some());
        assert_eq!(trailing.value, 4);
        assert!(trailing.merged_from.is_none());
        assert_eq!(manager.score(), 4);
    }

    #[test]
    fn test_cascading_slide_along_every_direction() {
        for direction in Direction::ALL {
            let mut manager = test_manager(3);
            for _ in 0..4 {
                manager.apply_move(direction);
                assert_grid_consistent(&manager);
            }
        }
    }

    #[test]
    fn test_slides_move_toward_the_far_edge() {
        let mut manager = test_manager(4);
        clear_grid(&mut manager);
        place(&mut manager, Position::new(0, 1, 2, 3, 0), 2);

        manager.apply_move(Direction::UltraRight).expect("moved");

        assert!(manager
            .grid()
            .cell_occupied(&Position::new(0, 1, 2, 3, 3)));
        assert_eq!(manager.score(), 0, "pure slides never score");
    }

    #[test]
    fn test_win_at_1024_and_keep_playing_rearms() {
        let mut manager = test_manager(4);
        clear_grid(&mut manager);
        place(&mut manager, Position::new(0, 0, 0, 0, 0), 512);
        place(&mut manager, Position::new(1, 0, 0, 0, 0), 512);

        let frame = manager.apply_move(Direction::Left).expect("merged");
        assert!(manager.has_won());
        assert!(frame.status.won);
        assert!(frame.status.terminated);
        assert_eq!(manager.score(), 1024);

        // Terminal: further moves are no-ops
        let before = occupied_count(&manager);
        assert!(manager.apply_move(Direction::Right).is_none());
        assert_eq!(occupied_count(&manager), before);

        // Keep playing suppresses termination...
        manager.keep_playing_after_win();
        assert!(!manager.is_game_terminated());

        // ...and the next move re-arms the win detector
        manager.apply_move(Direction::Right);
        assert!(!manager.has_won());
        assert!(!manager.keep_playing());
    }

    #[test]
    fn test_full_board_without_matches_has_no_moves() {
        let mut manager = test_manager(2);
        clear_grid(&mut manager);
        // Parity coloring: axis-adjacent cells always differ in value
        manager.grid_mut().transform_each_cell(|position, _| {
            let parity = (position.x + position.y + position.z + position.w + position.v) % 2;
            Some(Tile::new(position, if parity == 0 { 2 } else { 4 }))
        });

        assert!(!manager.moves_available());
        for direction in Direction::ALL {
            assert!(manager.apply_move(direction).is_none());
        }
        assert_eq!(occupied_count(&manager), 2usize.pow(5));
    }

    #[test]
    fn test_full_board_with_match_still_has_moves() {
        let mut manager = test_manager(2);
        clear_grid(&mut manager);
        manager.grid_mut().transform_each_cell(|position, _| {
            let parity = (position.x + position.y + position.z + position.w + position.v) % 2;
            Some(Tile::new(position, if parity == 0 { 2 } else { 4 }))
        });
        // Break the pattern: one axis-adjacent equal pair
        place(&mut manager, Position::new(0, 0, 0, 0, 1), 2);

        assert!(manager.moves_available());
    }

    #[test]
    fn test_move_schedules_save_and_tick_persists() {
        let mut manager = test_manager(4);
        clear_grid(&mut manager);
        place(&mut manager, Position::new(3, 0, 0, 0, 0), 2);

        manager.apply_move(Direction::Left).expect("moved");
        assert!(manager.save_pending());
        assert!(manager.storage().get(STORAGE_KEY).is_none());

        // Before the debounce window: nothing written
        manager.tick_at(now() - 1);
        assert!(manager.storage().get(STORAGE_KEY).is_none());

        // Well past the window: save lands
        manager.tick_at(now() + 10_000);
        assert!(!manager.save_pending());
        let pickle = manager.storage().get(STORAGE_KEY).expect("save written");
        let saved = decode(&pickle).unwrap();
        assert_eq!(saved.score, manager.score());
        assert!(saved
            .grid
            .tile_at(&Position::new(0, 0, 0, 0, 0))
            .is_some());
    }

    #[test]
    fn test_oversized_save_keeps_previous_persisted_state() {
        let mut storage = InMemoryStorage::new();
        storage.set(STORAGE_KEY, "previous-save").unwrap();

        // No real board fits in 10 UTF-16 units, so every save is rejected
        let config = GameConfig {
            save_size_limit: 10,
            ..GameConfig::default()
        };
        let mut manager = GameManager::with_config(
            config,
            Box::new(storage),
            Box::new(seeded_rng("tiny-limit")),
        );

        clear_grid(&mut manager);
        place(&mut manager, Position::new(3, 0, 0, 0, 0), 2);
        manager.apply_move(Direction::Left).expect("moved");
        assert!(manager.save_pending());

        manager.tick_at(now() + 10_000);

        // The rejected write must not clobber what was already persisted
        assert!(!manager.save_pending());
        assert_eq!(
            manager.storage().get(STORAGE_KEY).as_deref(),
            Some("previous-save")
        );
    }

    #[test]
    fn test_restart_cancels_save_and_clears_storage() {
        let mut manager = test_manager(4);
        assert!(manager.storage().get(STORAGE_KEY).is_none());

        // Force a persisted save and a pending one
        clear_grid(&mut manager);
        place(&mut manager, Position::new(3, 0, 0, 0, 0), 2);
        manager.apply_move(Direction::Left).expect("moved");
        manager.tick_at(now() + 10_000);
        assert!(manager.storage().get(STORAGE_KEY).is_some());

        manager.apply_move(Direction::Right).expect("moved");
        assert!(manager.save_pending());

        let json = manager.restart().expect("frame for the new game");

        assert!(!manager.save_pending());
        assert!(manager.storage().get(STORAGE_KEY).is_none());
        assert_eq!(manager.score(), 0);
        assert!(!manager.is_game_terminated());
        assert_eq!(occupied_count(&manager), 2);

        // Restart hands the host the same repaint payload a move would
        let frame: Frame = serde_json::from_str(&json).unwrap();
        assert_eq!(frame.grid.tiles.len(), 2);
        assert_eq!(frame.status.score, 0);
        assert!(!frame.status.terminated);
    }

    #[test]
    fn test_resume_from_saved_game() {
        let mut grid = HyperGrid::new(4);
        grid.insert_tile(Tile::new(Position::new(2, 1, 0, 3, 2), 256));
        grid.insert_tile(Tile::new(Position::new(0, 0, 0, 0, 0), 2));
        let saved = SavedGame {
            grid: SavedGrid::capture(&grid),
            score: 4242,
            over: false,
            won: true,
            keep_playing: true,
        };

        let mut storage = InMemoryStorage::new();
        storage
            .set(STORAGE_KEY, &encode(&saved, 3500).unwrap())
            .unwrap();

        let manager = GameManager::with_storage(4, Box::new(storage));

        assert_eq!(manager.score(), 4242);
        assert!(manager.has_won());
        assert!(manager.keep_playing());
        assert!(!manager.is_game_terminated());
        assert_eq!(occupied_count(&manager), 2);
        let tile = manager
            .grid()
            .cell_content(&Position::new(2, 1, 0, 3, 2))
            .unwrap();
        assert_eq!(tile.value, 256);
        assert!(tile.previous_position.is_none());
        assert!(tile.merged_from.is_none());
    }

    #[test]
    fn test_malformed_save_falls_back_to_fresh_game() {
        let mut storage = InMemoryStorage::new();
        storage.set(STORAGE_KEY, "corrupted nonsense").unwrap();

        let manager = GameManager::with_storage(4, Box::new(storage));

        assert_eq!(manager.score(), 0);
        assert_eq!(occupied_count(&manager), 2);
        assert!(!manager.is_game_terminated());
    }

    #[test]
    fn test_best_score_tracks_and_persists() {
        let mut storage = InMemoryStorage::new();
        storage.set(BEST_SCORE_KEY, "2").unwrap();

        let mut manager =
            GameManager::seeded(4, Box::new(storage), "test-seed");
        assert_eq!(manager.best_score(), 2);

        clear_grid(&mut manager);
        place(&mut manager, Position::new(0, 0, 0, 0, 0), 2);
        place(&mut manager, Position::new(1, 0, 0, 0, 0), 2);

        let frame = manager.apply_move(Direction::Left).expect("merged");
        assert_eq!(manager.best_score(), 4);
        assert_eq!(frame.status.best_score, 4);
        assert_eq!(manager.storage().get(BEST_SCORE_KEY).as_deref(), Some("4"));
    }

    #[test]
    fn test_previous_positions_reported_for_animation() {
        let mut manager = test_manager(4);
        clear_grid(&mut manager);
        place(&mut manager, Position::new(3, 0, 0, 0, 0), 2);

        let frame = manager.apply_move(Direction::Left).expect("moved");

        let slid = frame
            .grid
            .tiles
            .iter()
            .find(|tile| tile.position == Position::new(0, 0, 0, 0, 0))
            .expect("tile slid to the near edge");
        assert_eq!(slid.previous_position, Some(Position::new(3, 0, 0, 0, 0)));
    }

    #[test]
    fn test_invalid_direction_index_rejected_at_boundary() {
        let mut manager = test_manager(4);
        assert!(manager.move_by_index(10).is_err());
        assert!(manager.move_by_index(3).is_ok());
    }
}
