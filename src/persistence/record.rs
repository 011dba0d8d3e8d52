//! The serialized projection of `GameState`
//!
//! Every field is optional so records written by older or newer builds
//! restore cleanly: absent fields leave the in-memory value untouched,
//! unknown fields are ignored. The legacy single `isMuted` flag from early
//! saves maps onto both discrete mute flags, but only when neither discrete
//! flag is present.

use serde::{Deserialize, Serialize};

use crate::game::GameState;

/// One persisted snapshot, JSON-shaped with camelCase keys
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SaveRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_clicks: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chill_points: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub click_power: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generator_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sfx_muted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub music_muted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sfx_volume: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub music_volume: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    /// Legacy single mute flag; read from old saves, never written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_muted: Option<bool>,
}

impl SaveRecord {
    /// Project the current state into a full record
    pub fn capture(state: &GameState) -> Self {
        Self {
            total_clicks: Some(state.total_clicks),
            chill_points: Some(state.chill_points),
            click_power: Some(state.click_power),
            generator_count: Some(state.generator_count),
            sfx_muted: Some(state.sfx_muted),
            music_muted: Some(state.music_muted),
            sfx_volume: Some(state.sfx_volume),
            music_volume: Some(state.music_volume),
            background: Some(state.background.clone()),
            is_muted: None,
        }
    }

    /// Restore present fields onto `state`, leaving absent ones alone
    pub fn apply(&self, state: &mut GameState) {
        if let Some(v) = self.total_clicks {
            state.total_clicks = v;
        }
        if let Some(v) = self.chill_points {
            state.chill_points = v.max(0.0);
        }
        if let Some(v) = self.click_power {
            state.click_power = v.max(1);
        }
        if let Some(v) = self.generator_count {
            state.generator_count = v;
        }
        // Discrete mute flags take precedence over the legacy flag
        if self.sfx_muted.is_some() || self.music_muted.is_some() {
            if let Some(v) = self.sfx_muted {
                state.sfx_muted = v;
            }
            if let Some(v) = self.music_muted {
                state.music_muted = v;
            }
        } else if self.is_muted == Some(true) {
            state.sfx_muted = true;
            state.music_muted = true;
        }
        if let Some(v) = self.sfx_volume {
            state.set_sfx_volume(v);
        }
        if let Some(v) = self.music_volume {
            state.set_music_volume(v);
        }
        if let Some(v) = &self.background {
            state.background = v.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_state() -> GameState {
        GameState {
            total_clicks: 123,
            chill_points: 456.75,
            click_power: 3,
            generator_count: 2,
            sfx_muted: true,
            music_muted: false,
            sfx_volume: 0.5,
            music_volume: 0.25,
            background: "lofi".to_string(),
        }
    }

    #[test]
    fn test_round_trip_restores_everything() {
        let original = sample_state();
        let json = serde_json::to_string(&SaveRecord::capture(&original)).unwrap();

        let mut restored = GameState::new();
        serde_json::from_str::<SaveRecord>(&json)
            .unwrap()
            .apply(&mut restored);
        assert_eq!(restored, original);
    }

    #[test]
    fn test_keys_are_camel_case_and_legacy_flag_absent() {
        let json = serde_json::to_string(&SaveRecord::capture(&sample_state())).unwrap();
        assert!(json.contains("chillPoints"));
        assert!(json.contains("generatorCount"));
        assert!(!json.contains("isMuted"));
    }

    #[test]
    fn test_missing_click_power_leaves_current_value() {
        let mut state = GameState::new();
        state.click_power = 5;

        let record: SaveRecord = serde_json::from_str(r#"{"chillPoints": 10.0}"#).unwrap();
        record.apply(&mut state);

        assert_eq!(state.click_power, 5);
        assert_eq!(state.chill_points, 10.0);
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let record: SaveRecord =
            serde_json::from_str(r#"{"totalClicks": 9, "futureFeature": {"a": 1}}"#).unwrap();
        assert_eq!(record.total_clicks, Some(9));
    }

    #[test]
    fn test_legacy_mute_maps_to_both_channels() {
        let mut state = GameState::new();
        let record: SaveRecord = serde_json::from_str(r#"{"isMuted": true}"#).unwrap();
        record.apply(&mut state);

        assert!(state.sfx_muted);
        assert!(state.music_muted);
    }

    #[test]
    fn test_legacy_mute_false_changes_nothing() {
        let mut state = GameState::new();
        state.sfx_muted = true;

        let record: SaveRecord = serde_json::from_str(r#"{"isMuted": false}"#).unwrap();
        record.apply(&mut state);
        assert!(state.sfx_muted);
    }

    #[test]
    fn test_discrete_mute_fields_win_over_legacy() {
        let mut state = GameState::new();
        let record: SaveRecord =
            serde_json::from_str(r#"{"isMuted": true, "sfxMuted": false}"#).unwrap();
        record.apply(&mut state);

        assert!(!state.sfx_muted);
        // musicMuted absent and a discrete field present: legacy is ignored
        assert!(!state.music_muted);
    }

    #[test]
    fn test_out_of_range_volumes_are_clamped() {
        let mut state = GameState::new();
        let record: SaveRecord =
            serde_json::from_str(r#"{"sfxVolume": 3.5, "musicVolume": -1.0}"#).unwrap();
        record.apply(&mut state);

        assert_eq!(state.sfx_volume, 1.0);
        assert_eq!(state.music_volume, 0.0);
    }

    proptest! {
        /// capture -> serialize -> deserialize -> apply reproduces any
        /// reachable state exactly.
        #[test]
        fn prop_round_trip_is_identity(
            total_clicks in any::<u64>(),
            chill_points in 0.0f64..1e12,
            click_power in 1u64..1_000_000,
            generator_count in 0u64..1_000_000,
            sfx_muted in any::<bool>(),
            music_muted in any::<bool>(),
            sfx_volume in 0.0f64..=1.0,
            music_volume in 0.0f64..=1.0,
            background in "[a-z]{1,12}",
        ) {
            let original = GameState {
                total_clicks,
                chill_points,
                click_power,
                generator_count,
                sfx_muted,
                music_muted,
                sfx_volume,
                music_volume,
                background,
            };

            let json = serde_json::to_string(&SaveRecord::capture(&original)).unwrap();
            let mut restored = GameState::new();
            serde_json::from_str::<SaveRecord>(&json).unwrap().apply(&mut restored);
            prop_assert_eq!(restored, original);
        }
    }
}
