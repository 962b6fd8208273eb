//! Player health pool, damage tick and friendly pickup

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::registry::{EntityRegistry, RegistryIntent, Removed};
use super::state::EntityId;
use crate::{ground_distance, polar_to_ground};

/// Player health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerState {
    pub hp: u32,
    /// Value restored on reset; pickups may push `hp` above it
    pub max_hp: u32,
    pub is_game_over: bool,
}

/// Outcome of one damage tick
#[derive(Debug, Clone, Default)]
pub struct DamageOutcome {
    /// Whether any hp was lost
    pub damaged: bool,
    /// Health token removed from the near tier
    pub token: Option<Removed>,
    /// This tick took hp to 0
    pub game_over: bool,
}

impl PlayerState {
    pub fn new(max_hp: u32) -> Self {
        Self {
            hp: max_hp,
            max_hp,
            is_game_over: false,
        }
    }

    /// Restore for a new run
    pub fn reset(&mut self) {
        self.hp = self.max_hp;
        self.is_game_over = false;
    }

    /// Periodic damage: one point if any enemy is attacking.
    ///
    /// Sets `is_game_over` exactly once; ticks after that are no-ops.
    pub fn apply_damage_tick(&mut self, registry: &mut EntityRegistry) -> DamageOutcome {
        if self.is_game_over || !registry.any_attacking() {
            return DamageOutcome::default();
        }

        self.hp = self.hp.saturating_sub(1);
        let token = registry.pop_near_friendly().map(Removed::Friendly);
        let game_over = self.hp == 0;
        if game_over {
            self.is_game_over = true;
        }
        log::debug!("Player hit, hp now {}", self.hp);
        DamageOutcome {
            damaged: true,
            token,
            game_over,
        }
    }

    /// Collect at most one far-tier friendly within `radius` of the player.
    ///
    /// The promoted unit takes the next slot on the near ring. Returns the
    /// collected id.
    pub fn try_pickup(
        &mut self,
        registry: &mut EntityRegistry,
        player_pos: Vec3,
        radius: f32,
        near_ring_radius: f32,
    ) -> Option<EntityId> {
        if self.is_game_over {
            return None;
        }
        let id = registry
            .far_friendlies()
            .iter()
            .find(|f| ground_distance(f.pos, player_pos) <= radius)
            .map(|f| f.id)?;

        let slot = registry.near_friendlies().len();
        let pos = player_pos.with_y(0.0) + near_slot_offset(slot, near_ring_radius);
        registry.apply([RegistryIntent::Promote { id, pos }]);
        self.hp += 1;
        log::debug!("Picked up friendly {:?}, hp now {}", id, self.hp);
        Some(id)
    }
}

/// Offset of the Nth near-tier slot around the player (golden-angle spread)
pub fn near_slot_offset(slot: usize, radius: f32) -> Vec3 {
    const GOLDEN_ANGLE: f32 = 2.399_963;
    polar_to_ground(radius, slot as f32 * GOLDEN_ANGLE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::InstanceHandle;
    use crate::sim::state::{EnemyMotion, EnemyTier, FriendlyTier};
    use crate::tuning::Tuning;

    fn registry_with_attacker(attacking: bool) -> EntityRegistry {
        let tuning = Tuning::default();
        let mut reg = EntityRegistry::new();
        let id = reg.spawn_enemy(
            EnemyTier::Regular,
            &tuning.regular,
            Vec3::new(2.4, 0.0, 0.0),
            0.0,
            InstanceHandle(1),
        );
        if attacking {
            reg.enemy_mut(id).unwrap().motion = EnemyMotion::Attacking;
        }
        reg
    }

    #[test]
    fn test_no_damage_without_attackers() {
        let mut player = PlayerState::new(5);
        let mut reg = registry_with_attacker(false);
        let out = player.apply_damage_tick(&mut reg);
        assert!(!out.damaged);
        assert_eq!(player.hp, 5);
    }

    #[test]
    fn test_damage_removes_near_token() {
        let mut player = PlayerState::new(5);
        let mut reg = registry_with_attacker(true);
        reg.spawn_friendly(FriendlyTier::Near, Vec3::ZERO, 0.0, InstanceHandle(9));
        let out = player.apply_damage_tick(&mut reg);
        assert!(out.damaged);
        assert!(out.token.is_some());
        assert_eq!(player.hp, 4);
        assert!(reg.near_friendlies().is_empty());

        // No tokens left: still damages
        let out = player.apply_damage_tick(&mut reg);
        assert!(out.damaged && out.token.is_none());
        assert_eq!(player.hp, 3);
    }

    #[test]
    fn test_last_hp_sets_game_over_once() {
        let mut player = PlayerState::new(1);
        let mut reg = registry_with_attacker(true);
        let out = player.apply_damage_tick(&mut reg);
        assert!(out.game_over);
        assert_eq!(player.hp, 0);
        assert!(player.is_game_over);

        let out = player.apply_damage_tick(&mut reg);
        assert!(!out.game_over && !out.damaged);
        assert_eq!(player.hp, 0);
    }

    #[test]
    fn test_dying_enemy_deals_no_damage() {
        let mut player = PlayerState::new(3);
        let mut reg = registry_with_attacker(true);
        let id = reg.enemies()[0].id;
        reg.mark_dead(id).unwrap();
        let out = player.apply_damage_tick(&mut reg);
        assert!(!out.damaged);
        assert_eq!(player.hp, 3);
    }

    #[test]
    fn test_pickup_promotes_one_per_call() {
        let mut player = PlayerState::new(5);
        let mut reg = EntityRegistry::new();
        let a = reg.spawn_friendly(FriendlyTier::Far, Vec3::new(0.5, 0.0, 0.0), 0.0, InstanceHandle(1));
        let b = reg.spawn_friendly(FriendlyTier::Far, Vec3::new(0.0, 0.0, 0.7), 0.0, InstanceHandle(2));
        reg.spawn_friendly(FriendlyTier::Far, Vec3::new(4.0, 0.0, 0.0), 0.0, InstanceHandle(3));

        assert_eq!(player.try_pickup(&mut reg, Vec3::ZERO, 0.8, 0.6), Some(a));
        assert_eq!(player.hp, 6);
        assert_eq!(reg.far_friendlies().len(), 2);
        assert_eq!(reg.near_friendlies().len(), 1);

        assert_eq!(player.try_pickup(&mut reg, Vec3::ZERO, 0.8, 0.6), Some(b));
        assert_eq!(player.try_pickup(&mut reg, Vec3::ZERO, 0.8, 0.6), None);
        assert_eq!(player.hp, 7);
    }

    #[test]
    fn test_pickup_ignores_height() {
        let mut player = PlayerState::new(5);
        let mut reg = EntityRegistry::new();
        reg.spawn_friendly(FriendlyTier::Far, Vec3::new(0.3, 0.0, 0.3), 0.0, InstanceHandle(1));
        // Headset height above the unit
        assert!(player.try_pickup(&mut reg, Vec3::new(0.0, 1.6, 0.0), 0.8, 0.6).is_some());
        assert_eq!(reg.near_friendlies()[0].pos.y, 0.0);
    }
}
