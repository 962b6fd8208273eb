//! Robot Siege - a wave-survival AR/VR shooter
//!
//! Core modules:
//! - `sim`: Game simulation (entities, combat, waves, timers)
//! - `collab`: Narrow interfaces to the rendering/asset collaborator
//! - `tuning`: Data-driven game balance
//! - `error`: Error types shared by the simulation boundary

pub mod collab;
pub mod error;
pub mod sim;
pub mod tuning;

pub use collab::{AnimationController, Clip, HeadlessHost, InstanceHandle, ModelKind, SceneHost};
pub use error::{AssetError, SimError, SimResult};
pub use tuning::{SpawnRing, TierStats, Tuning};

use glam::Vec3;

/// Game configuration constants
pub mod consts {
    /// Projectiles are destroyed once they have traveled farther than this
    pub const MAX_BULLET_DISTANCE: f32 = 10.0;
    /// Projectile advance per simulation tick (world units)
    pub const BULLET_SPEED: f32 = 0.2;

    /// Arena rings (world units from the base)
    pub const ARENA_MIN_RADIUS: f32 = 2.0;
    pub const ARENA_MAX_RADIUS: f32 = 10.0;
    /// Enemies stop and attack once this close to the base
    pub const ENGAGEMENT_RADIUS: f32 = ARENA_MIN_RADIUS + 0.5;
    /// Enemies appear in this annulus
    pub const ENEMY_SPAWN_MIN_RADIUS: f32 = 5.0;
    pub const ENEMY_SPAWN_MAX_RADIUS: f32 = ARENA_MAX_RADIUS;
    /// Near-tier friendly units stand on this ring around the player
    pub const NEAR_RING_RADIUS: f32 = 0.6;

    /// Far-tier friendly units within this distance are collected
    pub const PICKUP_RADIUS: f32 = 0.8;

    /// Timers (real-time seconds)
    pub const DAMAGE_TICK_SECS: f64 = 2.0;
    pub const COUNTDOWN_TICK_SECS: f64 = 1.0;
    pub const COUNTDOWN_TICKS: u32 = 3;
    pub const RESET_DELAY_SECS: f64 = 5.0;
    /// Used when the collaborator cannot report the death clip length
    pub const FALLBACK_DEATH_SECS: f64 = 1.0;

    /// Player defaults
    pub const PLAYER_START_HP: u32 = 5;
    pub const FAR_FRIENDLY_COUNT: u32 = 20;

    /// Boss waves
    pub const BOSS_WAVE_INTERVAL: u32 = 5;
}

/// Distance between two points projected on the ground plane (y ignored)
#[inline]
pub fn ground_distance(a: Vec3, b: Vec3) -> f32 {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    (dx * dx + dz * dz).sqrt()
}

/// Point on the ground plane at polar (r, theta) around the origin
#[inline]
pub fn polar_to_ground(r: f32, theta: f32) -> Vec3 {
    Vec3::new(r * theta.cos(), 0.0, r * theta.sin())
}

/// Yaw (rotation about +Y) that faces from `from` toward `to`
#[inline]
pub fn yaw_toward(from: Vec3, to: Vec3) -> f32 {
    let d = to - from;
    d.x.atan2(d.z)
}
