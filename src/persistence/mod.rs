//! Save/load, autosave, and cross-session sync
//!
//! One JSON record under a fixed storage key. Saves happen on a 10 s
//! cadence, immediately after purchases and audio changes, and best-effort
//! on page unload. When another session writes the key, the externally
//! persisted record is adopted wholesale: last writer wins, no merging.

pub mod record;
pub mod store;

pub use record::SaveRecord;
#[cfg(target_arch = "wasm32")]
pub use store::LocalStore;
pub use store::{MemoryStore, SaveStore, StoreError};

use crate::consts::AUTOSAVE_INTERVAL_MS;
use crate::game::GameState;

/// Storage key for the save record
pub const SAVE_KEY: &str = "chill_clicker_save";

/// Drives when and how `GameState` is persisted
pub struct Persistence<S: SaveStore> {
    store: S,
    last_save_ms: f64,
    suppress_next_flush: bool,
    write_failed: bool,
}

impl<S: SaveStore> Persistence<S> {
    pub fn new(store: S, now_ms: f64) -> Self {
        Self {
            store,
            last_save_ms: now_ms,
            suppress_next_flush: false,
            write_failed: false,
        }
    }

    /// Restore state from the persisted record, if one exists and parses.
    /// Malformed data is logged and ignored, never fatal.
    pub fn load(&self, state: &mut GameState) -> bool {
        let Some(json) = self.store.read() else {
            return false;
        };
        match serde_json::from_str::<SaveRecord>(&json) {
            Ok(record) => {
                record.apply(state);
                log::info!("save loaded ({} clicks)", state.total_clicks);
                true
            }
            Err(err) => {
                log::warn!("ignoring malformed save: {err}");
                false
            }
        }
    }

    /// Persist immediately (purchases, audio changes, cosmetic changes)
    pub fn save_now(&mut self, state: &GameState, now_ms: f64) {
        self.last_save_ms = now_ms;
        let json = match serde_json::to_string(&SaveRecord::capture(state)) {
            Ok(json) => json,
            Err(err) => {
                log::warn!("failed to serialize save: {err}");
                return;
            }
        };
        match self.store.write(&json) {
            Ok(()) => self.write_failed = false,
            Err(err) => {
                if !self.write_failed {
                    log::warn!("{err}; continuing in memory only");
                }
                self.write_failed = true;
            }
        }
    }

    /// Periodic autosave, rate-limited to the save interval
    pub fn maybe_autosave(&mut self, state: &GameState, now_ms: f64) {
        if now_ms - self.last_save_ms >= AUTOSAVE_INTERVAL_MS {
            self.save_now(state, now_ms);
        }
    }

    /// Best-effort flush on page unload. A pending reset suppresses exactly
    /// one flush so stale state cannot race the cleared record.
    pub fn flush(&mut self, state: &GameState, now_ms: f64) {
        if self.suppress_next_flush {
            self.suppress_next_flush = false;
            return;
        }
        self.save_now(state, now_ms);
    }

    /// Clear persisted state, reinitialize in-memory state, and arm the
    /// one-shot flush suppression for the reset transition.
    pub fn reset(&mut self, state: &mut GameState) {
        self.store.clear();
        self.suppress_next_flush = true;
        *state = GameState::new();
        log::info!("game reset");
    }

    /// Another session persisted a new record: adopt it (last writer wins)
    pub fn apply_external(&self, json: &str, state: &mut GameState) {
        match serde_json::from_str::<SaveRecord>(json) {
            Ok(record) => {
                record.apply(state);
                log::info!("adopted save written by another session");
            }
            Err(err) => log::warn!("ignoring malformed external save: {err}"),
        }
    }

    /// True once a write has failed; the session is memory-only until a
    /// write succeeds again.
    pub fn storage_degraded(&self) -> bool {
        self.write_failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Store whose writes always fail, for degraded-mode coverage
    struct RejectingStore;

    impl SaveStore for RejectingStore {
        fn read(&self) -> Option<String> {
            None
        }

        fn write(&mut self, _json: &str) -> Result<(), StoreError> {
            Err(StoreError)
        }

        fn clear(&mut self) {}
    }

    #[test]
    fn test_autosave_respects_interval() {
        let mut persistence = Persistence::new(MemoryStore::new(), 0.0);
        let state = GameState::new();

        persistence.maybe_autosave(&state, 5_000.0);
        assert!(persistence.store.read().is_none());

        persistence.maybe_autosave(&state, 10_000.0);
        assert!(persistence.store.read().is_some());

        // The clock restarts from the save
        let saved = persistence.store.read();
        persistence.maybe_autosave(&state, 15_000.0);
        assert_eq!(persistence.store.read(), saved);
    }

    #[test]
    fn test_event_save_resets_autosave_clock() {
        let mut persistence = Persistence::new(MemoryStore::new(), 0.0);
        let state = GameState::new();

        persistence.save_now(&state, 9_000.0);
        persistence.store.clear();

        // 10s have passed since t=0 but only 2s since the event save
        persistence.maybe_autosave(&state, 11_000.0);
        assert!(persistence.store.read().is_none());
    }

    #[test]
    fn test_reset_suppresses_exactly_one_flush() {
        let mut persistence = Persistence::new(MemoryStore::new(), 0.0);
        let mut state = GameState::new();
        state.register_manual_action();

        persistence.reset(&mut state);
        assert_eq!(state, GameState::new());
        assert!(persistence.store.read().is_none());

        // The unload flush racing the reset writes nothing
        persistence.flush(&state, 1_000.0);
        assert!(persistence.store.read().is_none());

        // Later flushes behave normally again
        persistence.flush(&state, 2_000.0);
        assert!(persistence.store.read().is_some());
    }

    #[test]
    fn test_load_round_trip() {
        let mut persistence = Persistence::new(MemoryStore::new(), 0.0);
        let mut state = GameState::new();
        state.chill_points = 300.0;
        assert!(state.purchase_generator());
        persistence.save_now(&state, 0.0);

        let mut restored = GameState::new();
        assert!(persistence.load(&mut restored));
        assert_eq!(restored, state);
    }

    #[test]
    fn test_malformed_save_is_ignored() {
        let mut store = MemoryStore::new();
        store.write("{not json").unwrap();
        let persistence = Persistence::new(store, 0.0);

        let mut state = GameState::new();
        state.click_power = 4;
        assert!(!persistence.load(&mut state));
        assert_eq!(state.click_power, 4);
    }

    #[test]
    fn test_external_record_wins_wholesale() {
        let persistence = Persistence::new(MemoryStore::new(), 0.0);
        let mut state = GameState::new();
        state.chill_points = 50.0;

        persistence.apply_external(r#"{"chillPoints": 900.0, "generatorCount": 4}"#, &mut state);
        assert_eq!(state.chill_points, 900.0);
        assert_eq!(state.generator_count, 4);
    }

    #[test]
    fn test_failed_writes_degrade_to_memory_only() {
        let mut persistence = Persistence::new(RejectingStore, 0.0);
        let mut state = GameState::new();

        persistence.save_now(&state, 0.0);
        assert!(persistence.storage_degraded());

        // The session stays fully playable
        state.register_manual_action();
        assert_eq!(state.total_clicks, 1);
        persistence.save_now(&state, 1_000.0);
        assert!(persistence.storage_degraded());
    }
}
