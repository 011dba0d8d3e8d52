//! Game state and economy transitions
//!
//! All state that must be persisted lives here, in one aggregate. The wire
//! shape is `persistence::SaveRecord`, not this struct.

use crate::consts::*;

/// Complete persistent game state
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    /// Cumulative manual action count
    pub total_clicks: u64,
    /// Spendable currency; fractional before display rounding
    pub chill_points: f64,
    /// Points granted per manual action (non-decreasing)
    pub click_power: u64,
    /// Owned auto-poppers, each yielding GENERATOR_RATE per second
    pub generator_count: u64,
    /// Sound effect mute
    pub sfx_muted: bool,
    /// Music mute
    pub music_muted: bool,
    /// Sound effect volume (0.0 - 1.0)
    pub sfx_volume: f64,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f64,
    /// Cosmetic background choice; no game-logic effect
    pub background: String,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            total_clicks: 0,
            chill_points: 0.0,
            click_power: 1,
            generator_count: 0,
            sfx_muted: false,
            music_muted: false,
            sfx_volume: 1.0,
            music_volume: 0.7,
            background: "sunset".to_string(),
        }
    }
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// One completed manual action: count it and grant click power
    pub fn register_manual_action(&mut self) {
        self.total_clicks += 1;
        self.chill_points += self.click_power as f64;
    }

    /// Buy one generator. Returns false (and changes nothing) when
    /// unaffordable - that state is reflected by the UI, not an error.
    pub fn purchase_generator(&mut self) -> bool {
        if self.chill_points < GENERATOR_COST {
            return false;
        }
        self.chill_points -= GENERATOR_COST;
        self.generator_count += 1;
        true
    }

    /// Buy one click-power upgrade. Same no-op contract as generators.
    pub fn purchase_click_upgrade(&mut self) -> bool {
        if self.chill_points < CLICK_UPGRADE_COST {
            return false;
        }
        self.chill_points -= CLICK_UPGRADE_COST;
        self.click_power += 1;
        true
    }

    /// Credit passive income for the given number of whole seconds
    pub fn accrue(&mut self, whole_seconds: u64) {
        if self.generator_count == 0 || whole_seconds == 0 {
            return;
        }
        self.chill_points += (self.generator_count * GENERATOR_RATE * whole_seconds) as f64;
    }

    pub fn can_afford_generator(&self) -> bool {
        self.chill_points >= GENERATOR_COST
    }

    pub fn can_afford_click_upgrade(&self) -> bool {
        self.chill_points >= CLICK_UPGRADE_COST
    }

    /// Derived master mute: both channels muted. Never stored.
    pub fn master_muted(&self) -> bool {
        self.sfx_muted && self.music_muted
    }

    pub fn set_sfx_volume(&mut self, volume: f64) {
        self.sfx_volume = volume.clamp(0.0, 1.0);
    }

    pub fn set_music_volume(&mut self, volume: f64) {
        self.music_volume = volume.clamp(0.0, 1.0);
    }

    /// Points as shown on the HUD (accrual can leave fractions)
    pub fn display_points(&self) -> u64 {
        self.chill_points.floor() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_actions_grant_click_power() {
        let mut state = GameState::new();
        for _ in 0..5 {
            state.register_manual_action();
        }
        assert_eq!(state.total_clicks, 5);
        assert_eq!(state.chill_points, 5.0);

        // Generator is unaffordable at 5 points
        assert!(!state.purchase_generator());
        assert_eq!(state.chill_points, 5.0);
        assert_eq!(state.generator_count, 0);
    }

    #[test]
    fn test_generator_purchase_deducts_exact_cost() {
        let mut state = GameState::new();
        state.chill_points = GENERATOR_COST * 3.0;

        for _ in 0..3 {
            assert!(state.purchase_generator());
        }
        assert_eq!(state.generator_count, 3);
        assert_eq!(state.chill_points, 0.0);

        // Fourth attempt is a no-op
        assert!(!state.purchase_generator());
        assert_eq!(state.generator_count, 3);
        assert_eq!(state.chill_points, 0.0);
    }

    #[test]
    fn test_click_upgrade_increases_power() {
        let mut state = GameState::new();
        state.chill_points = CLICK_UPGRADE_COST;

        assert!(state.purchase_click_upgrade());
        assert_eq!(state.click_power, 2);
        assert_eq!(state.chill_points, 0.0);

        state.register_manual_action();
        assert_eq!(state.chill_points, 2.0);
    }

    #[test]
    fn test_accrue_is_additive() {
        let mut a = GameState::new();
        let mut b = GameState::new();
        a.generator_count = 7;
        b.generator_count = 7;

        a.accrue(3);
        a.accrue(4);
        b.accrue(7);
        assert_eq!(a.chill_points, b.chill_points);
    }

    #[test]
    fn test_accrue_without_generators_is_noop() {
        let mut state = GameState::new();
        state.accrue(1000);
        assert_eq!(state.chill_points, 0.0);
    }

    #[test]
    fn test_master_mute_is_derived() {
        let mut state = GameState::new();
        assert!(!state.master_muted());
        state.sfx_muted = true;
        assert!(!state.master_muted());
        state.music_muted = true;
        assert!(state.master_muted());
    }

    #[test]
    fn test_volume_is_clamped() {
        let mut state = GameState::new();
        state.set_sfx_volume(1.7);
        state.set_music_volume(-0.2);
        assert_eq!(state.sfx_volume, 1.0);
        assert_eq!(state.music_volume, 0.0);
    }
}
