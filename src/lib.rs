// Hyper2048 Core - Rust/WASM Implementation
// Licensed under the Apache License, Version 2.0

//! # Hyper2048 Core (Rust/WASM)
//!
//! The engine behind a 2048 variant played on a 5-dimensional hyper-grid
//! (axes x, y, z, w, v) with ten movement directions, compiled to
//! WebAssembly for the browser front end.
//!
//! ## Architecture
//!
//! - **HyperGrid**: 5-dimensional tile placement with occupancy queries
//! - **Tile**: one numbered piece, with per-move animation metadata
//! - **GameManager**: movement/merge sweep, scoring, terminal detection
//! - **Persistence**: storage abstraction, compressed save codec, debounced
//!   writes that survive page reloads
//!
//! Rendering, input devices, and animation live in the host. It delivers the
//! three logical actions (`move`, `restart`, `keepPlaying`), renders the
//! `Frame` snapshots the engine returns, and pumps `tick()` so debounced
//! saves get committed.

use wasm_bindgen::prelude::*;

// Module declarations
mod engine;
mod grid;
mod persistence;
mod tile;
mod types;
mod utils;

// Re-exports
pub use engine::GameManager;
pub use grid::HyperGrid;
pub use persistence::{
    decode, encode, Debouncer, InMemoryStorage, SavedGame, SavedGrid, SavedTile, StorageBackend,
    BEST_SCORE_KEY, STORAGE_KEY,
};
pub use tile::Tile;
pub use types::{
    Direction, Frame, GameConfig, GameStatus, GridSnapshot, HyperGridError, Position, Result,
    Timestamp, Vector,
};

#[cfg(target_arch = "wasm32")]
pub use persistence::LocalStorage;

// WASM initialization
#[wasm_bindgen(start)]
pub fn init() {
    // Set up better panic messages in the browser console
    console_error_panic_hook::set_once();
}

// Version information
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

// Health check for WASM module
#[wasm_bindgen]
pub fn health_check() -> bool {
    true
}
