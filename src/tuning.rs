//! Game balance and tuning
//!
//! Defaults come from [`crate::consts`]; a JSON document can override any
//! subset of fields.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{SimError, SimResult};
use crate::polar_to_ground;
use crate::sim::EnemyTier;

/// Annulus on the ground plane, centered on the base
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnRing {
    pub min: f32,
    pub max: f32,
}

impl SpawnRing {
    /// Rejects `min > max` and negative or non-finite radii
    pub fn validate(&self) -> SimResult<()> {
        let finite = self.min.is_finite() && self.max.is_finite();
        if !finite || self.min < 0.0 || self.min > self.max {
            return Err(SimError::InvalidSpawnRing {
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    /// Uniform angle, uniform distance in `[min, max]`, y = 0
    pub fn sample(&self, rng: &mut impl Rng) -> Vec3 {
        let angle = rng.random::<f32>() * std::f32::consts::TAU;
        let distance = self.min + rng.random::<f32>() * (self.max - self.min);
        polar_to_ground(distance, angle)
    }
}

/// Per-tier enemy stats
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierStats {
    pub hp: u32,
    /// World units per tick
    pub speed: f32,
    /// Bounding box half extents (box sits on the ground)
    pub half_extents: Vec3,
}

/// Data-driven balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Enemies ===
    pub regular: TierStats,
    pub armored: TierStats,
    pub boss: TierStats,
    /// Regular robots per wave index
    pub regulars_per_wave: u32,
    /// Every Nth wave adds one boss
    pub boss_wave_interval: u32,
    pub enemy_ring: SpawnRing,
    pub engagement_radius: f32,

    // === Projectiles ===
    pub bullet_speed: f32,
    pub max_bullet_distance: f32,
    pub bullet_half_extent: f32,

    // === Player & friendlies ===
    pub player_start_hp: u32,
    pub far_friendly_count: u32,
    pub far_friendly_ring: SpawnRing,
    pub near_ring_radius: f32,
    pub pickup_radius: f32,

    // === Timers (seconds) ===
    pub damage_tick_secs: f64,
    pub countdown_tick_secs: f64,
    pub countdown_ticks: u32,
    pub reset_delay_secs: f64,
    pub fallback_death_secs: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            regular: TierStats {
                hp: 1,
                speed: 0.02,
                half_extents: Vec3::new(0.3, 0.9, 0.3),
            },
            armored: TierStats {
                hp: 5,
                speed: 0.015,
                half_extents: Vec3::new(0.4, 1.0, 0.4),
            },
            boss: TierStats {
                hp: 50,
                speed: 0.005,
                half_extents: Vec3::new(0.8, 2.0, 0.8),
            },
            regulars_per_wave: 1,
            boss_wave_interval: BOSS_WAVE_INTERVAL,
            enemy_ring: SpawnRing {
                min: ENEMY_SPAWN_MIN_RADIUS,
                max: ENEMY_SPAWN_MAX_RADIUS,
            },
            engagement_radius: ENGAGEMENT_RADIUS,

            bullet_speed: BULLET_SPEED,
            max_bullet_distance: MAX_BULLET_DISTANCE,
            bullet_half_extent: 0.05,

            player_start_hp: PLAYER_START_HP,
            far_friendly_count: FAR_FRIENDLY_COUNT,
            far_friendly_ring: SpawnRing {
                min: ARENA_MIN_RADIUS,
                max: ARENA_MAX_RADIUS,
            },
            near_ring_radius: NEAR_RING_RADIUS,
            pickup_radius: PICKUP_RADIUS,

            damage_tick_secs: DAMAGE_TICK_SECS,
            countdown_tick_secs: COUNTDOWN_TICK_SECS,
            countdown_ticks: COUNTDOWN_TICKS,
            reset_delay_secs: RESET_DELAY_SECS,
            fallback_death_secs: FALLBACK_DEATH_SECS,
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) JSON document and validate it
    pub fn from_json(json: &str) -> SimResult<Self> {
        let tuning: Self = serde_json::from_str(json)?;
        tuning.validate()?;
        log::info!("Loaded tuning overrides");
        Ok(tuning)
    }

    /// Stats for a tier
    pub fn tier(&self, tier: EnemyTier) -> &TierStats {
        match tier {
            EnemyTier::Regular => &self.regular,
            EnemyTier::Armored => &self.armored,
            EnemyTier::Boss => &self.boss,
        }
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> SimResult<()> {
        for (name, stats) in [
            ("regular", &self.regular),
            ("armored", &self.armored),
            ("boss", &self.boss),
        ] {
            if stats.hp == 0 {
                return Err(SimError::InvalidTuning(format!("{name} hp must be > 0")));
            }
            if !(stats.speed > 0.0) {
                return Err(SimError::InvalidTuning(format!("{name} speed must be > 0")));
            }
            let half = stats.half_extents;
            if !half.is_finite() || half.min_element() <= 0.0 || half.max_element() > ARENA_MAX_RADIUS {
                return Err(SimError::InvalidTuning(format!(
                    "{name} half extents must be in (0, {ARENA_MAX_RADIUS}]"
                )));
            }
        }

        self.enemy_ring.validate()?;
        self.far_friendly_ring.validate()?;

        let positive = [
            ("engagement_radius", self.engagement_radius as f64),
            ("bullet_speed", self.bullet_speed as f64),
            ("max_bullet_distance", self.max_bullet_distance as f64),
            ("bullet_half_extent", self.bullet_half_extent as f64),
            ("pickup_radius", self.pickup_radius as f64),
            ("damage_tick_secs", self.damage_tick_secs),
            ("countdown_tick_secs", self.countdown_tick_secs),
            ("reset_delay_secs", self.reset_delay_secs),
            ("fallback_death_secs", self.fallback_death_secs),
        ];
        for (name, value) in positive {
            if !(value > 0.0) || !value.is_finite() {
                return Err(SimError::InvalidTuning(format!("{name} must be > 0")));
            }
        }

        // Volumes wider than the arena would sweep huge grid ranges
        if self.bullet_half_extent > ARENA_MAX_RADIUS {
            return Err(SimError::InvalidTuning(format!(
                "bullet_half_extent must be <= {ARENA_MAX_RADIUS}"
            )));
        }
        if self.near_ring_radius < 0.0 {
            return Err(SimError::InvalidTuning(
                "near_ring_radius must not be negative".into(),
            ));
        }
        if self.boss_wave_interval == 0 {
            return Err(SimError::InvalidTuning(
                "boss_wave_interval must be > 0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_defaults_are_valid() {
        let tuning = Tuning::default();
        assert!(tuning.validate().is_ok());
        assert_eq!(tuning.armored.hp, 5);
        assert!((tuning.engagement_radius - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_partial_json_override() {
        let tuning = Tuning::from_json(r#"{ "player_start_hp": 9, "bullet_speed": 0.5 }"#).unwrap();
        assert_eq!(tuning.player_start_hp, 9);
        assert!((tuning.bullet_speed - 0.5).abs() < 1e-6);
        assert_eq!(tuning.boss.hp, 50);
    }

    #[test]
    fn test_rejects_inverted_ring() {
        let err = Tuning::from_json(r#"{ "enemy_ring": { "min": 8.0, "max": 3.0 } }"#).unwrap_err();
        assert!(matches!(err, SimError::InvalidSpawnRing { .. }));
        assert!(SpawnRing { min: -1.0, max: 2.0 }.validate().is_err());
        assert!(SpawnRing { min: 1.0, max: 1.0 }.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_period() {
        let err = Tuning::from_json(r#"{ "damage_tick_secs": 0.0 }"#).unwrap_err();
        assert!(matches!(err, SimError::InvalidTuning(_)));
    }

    #[test]
    fn test_rejects_oversized_volumes() {
        let err = Tuning::from_json(
            r#"{ "boss": { "hp": 50, "speed": 0.005, "half_extents": [1e9, 2.0, 0.8] } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, SimError::InvalidTuning(_)));

        let err = Tuning::from_json(r#"{ "bullet_half_extent": 5000.0 }"#).unwrap_err();
        assert!(matches!(err, SimError::InvalidTuning(_)));

        let mut tuning = Tuning::default();
        tuning.regular.half_extents = Vec3::new(f32::NAN, 0.9, 0.3);
        assert!(tuning.validate().is_err());
    }

    #[test]
    fn test_ring_sample_stays_in_annulus() {
        let ring = SpawnRing { min: 2.0, max: 10.0 };
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..500 {
            let p = ring.sample(&mut rng);
            let r = (p.x * p.x + p.z * p.z).sqrt();
            assert!(r >= 2.0 - 1e-4 && r <= 10.0 + 1e-4);
            assert_eq!(p.y, 0.0);
        }
    }
}
