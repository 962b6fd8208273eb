//! Wave progression state machine
//!
//! `Active(n)` → `Clearing` → `Intermission(countdown)` → `Active(n + 1)`,
//! with `GameOver` reachable from any non-terminal phase. Both the advance
//! and the game-over transitions are latched: the live-enemy check runs
//! every frame and must not fire twice.

use serde::{Deserialize, Serialize};

use super::state::EnemyTier;
use crate::tuning::Tuning;

/// Current phase of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WavePhase {
    /// Enemies of `wave` are in play
    Active { wave: u32 },
    /// Quota reached; the purge runs before the intermission starts
    Clearing { wave: u32 },
    /// Counting down to `next_wave`
    Intermission { next_wave: u32, countdown: u32 },
    /// Player hp hit 0; waiting for the reset timer
    GameOver { wave: u32 },
}

/// How many of each tier a wave spawns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveComposition {
    pub regular: u32,
    pub armored: u32,
    pub boss: u32,
}

impl WaveComposition {
    /// Regulars scale with the wave index, armored with half of it, and
    /// every Nth wave adds one boss.
    pub fn for_wave(wave: u32, tuning: &Tuning) -> Self {
        Self {
            regular: wave * tuning.regulars_per_wave,
            armored: wave / 2,
            boss: u32::from(wave > 0 && wave.is_multiple_of(tuning.boss_wave_interval)),
        }
    }

    pub fn total(&self) -> u32 {
        self.regular + self.armored + self.boss
    }

    /// Spawn order: regulars, then armored, then boss
    pub fn tiers(&self) -> impl Iterator<Item = EnemyTier> {
        std::iter::repeat_n(EnemyTier::Regular, self.regular as usize)
            .chain(std::iter::repeat_n(EnemyTier::Armored, self.armored as usize))
            .chain(std::iter::repeat_n(EnemyTier::Boss, self.boss as usize))
    }
}

/// Result of one countdown step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownStep {
    /// Still counting; value left to show
    Remaining(u32),
    /// Countdown done; spawn this wave
    Launch(u32),
    /// Not in an intermission (stale timer)
    Ignored,
}

/// Owns the wave index, the live-enemy counter and the transition latches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveDirector {
    phase: WavePhase,
    /// Non-boss enemies spawned this wave and not yet removed
    live_enemies: u32,
    /// Set when the advance fires, cleared when the next wave begins
    advance_latched: bool,
    game_over_latched: bool,
}

impl Default for WaveDirector {
    fn default() -> Self {
        Self::new()
    }
}

impl WaveDirector {
    pub fn new() -> Self {
        Self {
            phase: WavePhase::Active { wave: 1 },
            live_enemies: 0,
            advance_latched: false,
            game_over_latched: false,
        }
    }

    pub fn phase(&self) -> WavePhase {
        self.phase
    }

    /// Wave currently in play (or the one that just ended)
    pub fn wave_index(&self) -> u32 {
        match self.phase {
            WavePhase::Active { wave } | WavePhase::Clearing { wave } | WavePhase::GameOver { wave } => wave,
            WavePhase::Intermission { next_wave, .. } => next_wave.saturating_sub(1).max(1),
        }
    }

    pub fn live_enemies(&self) -> u32 {
        self.live_enemies
    }

    pub fn is_game_over(&self) -> bool {
        matches!(self.phase, WavePhase::GameOver { .. })
    }

    pub fn countdown(&self) -> Option<u32> {
        match self.phase {
            WavePhase::Intermission { countdown, .. } => Some(countdown),
            _ => None,
        }
    }

    /// Enter `Active(wave)` with an empty counter; the caller spawns next
    pub fn begin_wave(&mut self, wave: u32) {
        self.phase = WavePhase::Active { wave };
        self.live_enemies = 0;
        self.advance_latched = false;
        log::info!("Wave {} begins", wave);
    }

    /// Count a spawned enemy. Bosses never block the advance.
    pub fn enemy_spawned(&mut self, tier: EnemyTier) {
        if tier != EnemyTier::Boss {
            self.live_enemies += 1;
        }
    }

    /// Count a removed enemy
    pub fn enemy_removed(&mut self, tier: EnemyTier) {
        if tier != EnemyTier::Boss {
            self.live_enemies = self.live_enemies.saturating_sub(1);
        }
    }

    /// Check the advance condition. Returns the cleared wave exactly once
    /// per quota-reached event.
    pub fn evaluate(&mut self) -> Option<u32> {
        let WavePhase::Active { wave } = self.phase else {
            return None;
        };
        if self.live_enemies > 0 || self.advance_latched {
            return None;
        }
        self.advance_latched = true;
        self.phase = WavePhase::Clearing { wave };
        log::info!("Wave {} cleared", wave);
        Some(wave)
    }

    /// `Clearing` → `Intermission`. False from any other phase.
    pub fn enter_intermission(&mut self, countdown: u32) -> bool {
        let WavePhase::Clearing { wave } = self.phase else {
            return false;
        };
        self.phase = WavePhase::Intermission {
            next_wave: wave + 1,
            countdown: countdown.max(1),
        };
        true
    }

    /// One countdown timer tick
    pub fn countdown_tick(&mut self) -> CountdownStep {
        let WavePhase::Intermission { next_wave, countdown } = self.phase else {
            return CountdownStep::Ignored;
        };
        let remaining = countdown.saturating_sub(1);
        if remaining == 0 {
            self.begin_wave(next_wave);
            CountdownStep::Launch(next_wave)
        } else {
            self.phase = WavePhase::Intermission {
                next_wave,
                countdown: remaining,
            };
            CountdownStep::Remaining(remaining)
        }
    }

    /// Latch the game-over transition. True only the first time.
    pub fn game_over(&mut self) -> bool {
        if self.game_over_latched {
            return false;
        }
        let wave = self.wave_index();
        self.game_over_latched = true;
        self.phase = WavePhase::GameOver { wave };
        log::info!("Game over on wave {}", wave);
        true
    }

    /// Back to wave 1 with every latch cleared
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composition_wave_five() {
        let c = WaveComposition::for_wave(5, &Tuning::default());
        assert_eq!(c, WaveComposition { regular: 5, armored: 2, boss: 1 });
        assert_eq!(c.total(), 8);
        assert_eq!(c.tiers().filter(|t| *t == EnemyTier::Boss).count(), 1);
    }

    #[test]
    fn test_composition_non_boss_waves() {
        let tuning = Tuning::default();
        assert_eq!(WaveComposition::for_wave(1, &tuning).total(), 1);
        assert_eq!(WaveComposition::for_wave(4, &tuning).boss, 0);
        assert_eq!(WaveComposition::for_wave(10, &tuning).boss, 1);
        assert_eq!(WaveComposition::for_wave(7, &tuning).armored, 3);
    }

    #[test]
    fn test_advance_fires_once() {
        let mut d = WaveDirector::new();
        d.enemy_spawned(EnemyTier::Regular);
        assert_eq!(d.evaluate(), None);
        d.enemy_removed(EnemyTier::Regular);
        assert_eq!(d.evaluate(), Some(1));
        assert_eq!(d.evaluate(), None);
        assert!(d.enter_intermission(3));
        assert_eq!(d.evaluate(), None);
        assert!(!d.enter_intermission(3));
    }

    #[test]
    fn test_boss_does_not_block_advance() {
        let mut d = WaveDirector::new();
        d.enemy_spawned(EnemyTier::Boss);
        d.enemy_spawned(EnemyTier::Armored);
        d.enemy_removed(EnemyTier::Armored);
        assert_eq!(d.evaluate(), Some(1));
        // Boss removal later does not disturb the counter
        d.enemy_removed(EnemyTier::Boss);
        assert_eq!(d.live_enemies(), 0);
    }

    #[test]
    fn test_countdown_launches_next_wave() {
        let mut d = WaveDirector::new();
        d.evaluate();
        d.enter_intermission(3);
        assert_eq!(d.countdown(), Some(3));
        assert_eq!(d.countdown_tick(), CountdownStep::Remaining(2));
        assert_eq!(d.countdown_tick(), CountdownStep::Remaining(1));
        assert_eq!(d.countdown_tick(), CountdownStep::Launch(2));
        assert_eq!(d.phase(), WavePhase::Active { wave: 2 });
        assert_eq!(d.countdown_tick(), CountdownStep::Ignored);
    }

    #[test]
    fn test_game_over_latched() {
        let mut d = WaveDirector::new();
        d.begin_wave(4);
        assert!(d.game_over());
        assert!(!d.game_over());
        assert_eq!(d.phase(), WavePhase::GameOver { wave: 4 });
        assert_eq!(d.evaluate(), None);
        assert_eq!(d.countdown_tick(), CountdownStep::Ignored);

        d.reset();
        assert_eq!(d.phase(), WavePhase::Active { wave: 1 });
        assert!(d.game_over());
    }

    #[test]
    fn test_game_over_from_intermission() {
        let mut d = WaveDirector::new();
        d.begin_wave(3);
        d.evaluate();
        d.enter_intermission(3);
        assert!(d.game_over());
        assert_eq!(d.wave_index(), 3);
    }
}
