//! Entity data model
//!
//! Plain data only. Collection membership belongs to
//! [`super::registry::EntityRegistry`].

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::collab::{InstanceHandle, ModelKind};
use crate::tuning::TierStats;

/// Unique entity identity (never reused within a session)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Which collection an entity lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Enemy,
    NearFriendly,
    FarFriendly,
    Projectile,
}

/// Enemy tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyTier {
    Regular,
    Armored,
    Boss,
}

impl EnemyTier {
    pub fn model(self) -> ModelKind {
        match self {
            EnemyTier::Boss => ModelKind::BossRobot,
            _ => ModelKind::Robot,
        }
    }
}

/// Enemy movement/attack state. `Dying` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyMotion {
    /// Walking toward the base
    Approaching,
    /// In engagement range, damaging the player on each damage tick
    Attacking,
    /// Death clip playing; removal is scheduled
    Dying,
}

/// A hostile robot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: EntityId,
    pub tier: EnemyTier,
    pub pos: Vec3,
    /// Rotation about +Y (radians)
    pub yaw: f32,
    pub hp: u32,
    pub max_hp: u32,
    /// World units per tick
    pub speed: f32,
    pub half_extents: Vec3,
    pub motion: EnemyMotion,
    /// Opaque animation/scene handle
    pub instance: InstanceHandle,
}

impl Enemy {
    pub fn new(id: EntityId, tier: EnemyTier, stats: &TierStats, pos: Vec3, yaw: f32, instance: InstanceHandle) -> Self {
        Self {
            id,
            tier,
            pos,
            yaw,
            hp: stats.hp,
            max_hp: stats.hp,
            speed: stats.speed,
            half_extents: stats.half_extents,
            motion: EnemyMotion::Approaching,
            instance,
        }
    }

    pub fn is_boss(&self) -> bool {
        self.tier == EnemyTier::Boss
    }

    pub fn is_dead(&self) -> bool {
        self.motion == EnemyMotion::Dying
    }

    pub fn is_attacking(&self) -> bool {
        self.motion == EnemyMotion::Attacking
    }

    /// Take one point of damage. Returns true if this hit was fatal.
    ///
    /// Dead enemies ignore damage, so hp never increases and a kill is
    /// reported exactly once.
    pub fn take_hit(&mut self) -> bool {
        if self.is_dead() {
            return false;
        }
        self.hp = self.hp.saturating_sub(1);
        if self.hp == 0 {
            self.motion = EnemyMotion::Dying;
            true
        } else {
            false
        }
    }
}

/// Friendly NPC tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FriendlyTier {
    /// Health token standing next to the player
    Near,
    /// Wandering unit that can be collected for +1 hp
    Far,
}

/// A friendly Michelle unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Friendly {
    pub id: EntityId,
    pub tier: FriendlyTier,
    pub pos: Vec3,
    pub yaw: f32,
    pub instance: InstanceHandle,
}

/// A fired projectile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: EntityId,
    pub pos: Vec3,
    /// Unit vector, fixed at fire time
    pub dir: Vec3,
    pub speed: f32,
    pub traveled: f32,
    pub instance: InstanceHandle,
}

impl Projectile {
    pub fn new(id: EntityId, origin: Vec3, dir: Vec3, speed: f32, instance: InstanceHandle) -> Self {
        Self {
            id,
            pos: origin,
            dir,
            speed,
            traveled: 0.0,
            instance,
        }
    }

    /// Move one tick along the fixed direction
    pub fn advance(&mut self) {
        self.pos += self.dir * self.speed;
        self.traveled += self.speed;
    }
}
