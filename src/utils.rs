// Utility functions for Hyper2048 Core

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::types::Timestamp;

/// Get current timestamp in milliseconds
pub fn now() -> Timestamp {
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Date::now() as i64
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis() as i64
    }
}

/// Emit a diagnostic where the host can actually see it
///
/// In the browser stderr goes nowhere, so warnings route through the
/// devtools console there and through stderr on native targets.
pub(crate) fn warn(message: &str) {
    #[cfg(target_arch = "wasm32")]
    {
        web_sys::console::warn_1(&wasm_bindgen::JsValue::from_str(message));
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        eprintln!("{}", message);
    }
}

/// Create a deterministic RNG from a seed string
pub fn seeded_rng(seed: &str) -> ChaCha8Rng {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    let hash = hasher.finish();

    let mut seed_array = [0u8; 32];
    for (i, byte) in seed_array.iter_mut().enumerate() {
        *byte = ((hash >> ((i % 8) * 8)) & 0xFF) as u8;
    }

    ChaCha8Rng::from_seed(seed_array)
}
