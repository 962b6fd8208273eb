//! Per-frame output handed to the renderer/UI

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::registry::EntityRegistry;
use super::state::{EnemyMotion, EntityId, EntityKind};
use crate::collab::InstanceHandle;

/// One-shot visual event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum VisualEvent {
    Spawn {
        id: EntityId,
        kind: EntityKind,
        instance: InstanceHandle,
    },
    Despawn {
        id: EntityId,
        instance: InstanceHandle,
    },
    /// A damage tick landed; HUD flash
    PlayerDamaged { hp: u32 },
}

/// Where to draw one live entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntityTransform {
    pub id: EntityId,
    pub kind: EntityKind,
    pub instance: InstanceHandle,
    pub position: Vec3,
    pub yaw: f32,
    /// Enemies only
    pub motion: Option<EnemyMotion>,
}

/// Session counters (not persisted)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub kills: u32,
    pub waves_cleared: u32,
    pub best_wave: u32,
    /// Runs started, including the first
    pub runs: u32,
}

/// Everything the renderer and HUD need for one frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub entities: Vec<EntityTransform>,
    pub player_hp: u32,
    pub wave_index: u32,
    pub is_game_over: bool,
    pub is_intermission: bool,
    pub countdown: Option<u32>,
    /// Seconds until the run restarts after a game over
    pub reset_in: Option<f64>,
    pub events: Vec<VisualEvent>,
    pub stats: RunStats,
}

/// Transforms for every live entity in registry order
pub fn collect_transforms(registry: &EntityRegistry) -> Vec<EntityTransform> {
    let enemies = registry.enemies().iter().map(|e| EntityTransform {
        id: e.id,
        kind: EntityKind::Enemy,
        instance: e.instance,
        position: e.pos,
        yaw: e.yaw,
        motion: Some(e.motion),
    });
    let near = registry.near_friendlies().iter().map(|f| EntityTransform {
        id: f.id,
        kind: EntityKind::NearFriendly,
        instance: f.instance,
        position: f.pos,
        yaw: f.yaw,
        motion: None,
    });
    let far = registry.far_friendlies().iter().map(|f| EntityTransform {
        id: f.id,
        kind: EntityKind::FarFriendly,
        instance: f.instance,
        position: f.pos,
        yaw: f.yaw,
        motion: None,
    });
    let shots = registry.projectiles().iter().map(|p| EntityTransform {
        id: p.id,
        kind: EntityKind::Projectile,
        instance: p.instance,
        position: p.pos,
        // Facing along flight direction
        yaw: p.dir.x.atan2(p.dir.z),
        motion: None,
    });
    enemies.chain(near).chain(far).chain(shots).collect()
}

impl FrameSnapshot {
    pub fn count(&self, kind: EntityKind) -> usize {
        self.entities.iter().filter(|e| e.kind == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{EnemyTier, FriendlyTier};
    use crate::tuning::Tuning;

    #[test]
    fn test_transforms_cover_every_kind() {
        let tuning = Tuning::default();
        let mut reg = EntityRegistry::new();
        let enemy = reg.spawn_enemy(
            EnemyTier::Armored,
            &tuning.armored,
            Vec3::new(6.0, 0.0, 0.0),
            1.0,
            InstanceHandle(1),
        );
        reg.spawn_friendly(FriendlyTier::Near, Vec3::ZERO, 0.0, InstanceHandle(2));
        reg.spawn_friendly(FriendlyTier::Far, Vec3::new(3.0, 0.0, 3.0), 0.0, InstanceHandle(3));
        reg.spawn_projectile(Vec3::ZERO, Vec3::X, 0.2, InstanceHandle(4));

        let snap = FrameSnapshot {
            entities: collect_transforms(&reg),
            player_hp: 5,
            wave_index: 1,
            is_game_over: false,
            is_intermission: false,
            countdown: None,
            reset_in: None,
            events: Vec::new(),
            stats: RunStats::default(),
        };
        assert_eq!(snap.entities.len(), 4);
        assert_eq!(snap.count(EntityKind::Enemy), 1);
        assert_eq!(snap.count(EntityKind::FarFriendly), 1);
        assert_eq!(snap.entities[0].id, enemy);
        assert_eq!(snap.entities[0].position, Vec3::new(6.0, 0.0, 0.0));
        assert_eq!(snap.entities[0].motion, Some(EnemyMotion::Approaching));
        assert!(snap.entities[1..].iter().all(|e| e.motion.is_none()));

        let shot = snap.entities.iter().find(|e| e.kind == EntityKind::Projectile).unwrap();
        assert!((shot.yaw - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_snapshot_serializes_for_the_page() {
        let snap = FrameSnapshot {
            entities: Vec::new(),
            player_hp: 3,
            wave_index: 2,
            is_game_over: false,
            is_intermission: true,
            countdown: Some(2),
            reset_in: None,
            events: vec![VisualEvent::Despawn {
                id: EntityId(7),
                instance: InstanceHandle(9),
            }],
            stats: RunStats::default(),
        };
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["countdown"], 2);
        assert_eq!(json["is_intermission"], true);
        assert_eq!(json["events"][0]["Despawn"]["id"], 7);
    }
}
