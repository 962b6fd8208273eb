//! Authoritative entity collections
//!
//! Only the registry adds or removes entities. Other phases mutate fields
//! in place and hand back [`RegistryIntent`]s, which are applied after the
//! pass so no collection is spliced while it is being walked.

use glam::Vec3;

use super::state::{
    Enemy, EnemyTier, EntityId, EntityKind, Friendly, FriendlyTier, Projectile,
};
use crate::collab::InstanceHandle;
use crate::error::{SimError, SimResult};
use crate::tuning::TierStats;

/// Deferred membership change
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RegistryIntent {
    /// Purge an entity from whichever collection holds it
    Remove(EntityId),
    /// Move a far-tier friendly into the near tier at a new position
    Promote { id: EntityId, pos: Vec3 },
}

/// An entity taken out of the registry
#[derive(Debug, Clone)]
pub enum Removed {
    Enemy(Enemy),
    Friendly(Friendly),
    Projectile(Projectile),
}

impl Removed {
    pub fn id(&self) -> EntityId {
        match self {
            Removed::Enemy(e) => e.id,
            Removed::Friendly(f) => f.id,
            Removed::Projectile(p) => p.id,
        }
    }

    pub fn instance(&self) -> InstanceHandle {
        match self {
            Removed::Enemy(e) => e.instance,
            Removed::Friendly(f) => f.instance,
            Removed::Projectile(p) => p.instance,
        }
    }
}

/// Owner of every live entity collection
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    /// Enemies in spawn order (iteration order for first-match rules)
    enemies: Vec<Enemy>,
    near_friendlies: Vec<Friendly>,
    far_friendlies: Vec<Friendly>,
    projectiles: Vec<Projectile>,
    next_id: u32,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Default::default()
        }
    }

    /// Allocate a new entity ID
    fn next_entity_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn spawn_enemy(
        &mut self,
        tier: EnemyTier,
        stats: &TierStats,
        pos: Vec3,
        yaw: f32,
        instance: InstanceHandle,
    ) -> EntityId {
        let id = self.next_entity_id();
        self.enemies.push(Enemy::new(id, tier, stats, pos, yaw, instance));
        id
    }

    pub fn spawn_friendly(
        &mut self,
        tier: FriendlyTier,
        pos: Vec3,
        yaw: f32,
        instance: InstanceHandle,
    ) -> EntityId {
        let id = self.next_entity_id();
        let friendly = Friendly {
            id,
            tier,
            pos,
            yaw,
            instance,
        };
        match tier {
            FriendlyTier::Near => self.near_friendlies.push(friendly),
            FriendlyTier::Far => self.far_friendlies.push(friendly),
        }
        id
    }

    pub fn spawn_projectile(
        &mut self,
        origin: Vec3,
        dir: Vec3,
        speed: f32,
        instance: InstanceHandle,
    ) -> EntityId {
        let id = self.next_entity_id();
        self.projectiles
            .push(Projectile::new(id, origin, dir, speed, instance));
        id
    }

    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    pub fn enemies_mut(&mut self) -> &mut [Enemy] {
        &mut self.enemies
    }

    pub fn near_friendlies(&self) -> &[Friendly] {
        &self.near_friendlies
    }

    pub fn far_friendlies(&self) -> &[Friendly] {
        &self.far_friendlies
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    /// Projectiles and enemies borrowed together for the combat pass
    pub fn combat_view(&mut self) -> (&mut [Projectile], &mut [Enemy]) {
        (&mut self.projectiles, &mut self.enemies)
    }

    pub fn enemy(&self, id: EntityId) -> Option<&Enemy> {
        self.enemies.iter().find(|e| e.id == id)
    }

    pub fn enemy_mut(&mut self, id: EntityId) -> Option<&mut Enemy> {
        self.enemies.iter_mut().find(|e| e.id == id)
    }

    /// Live (not dying) enemies currently attacking the base
    pub fn any_attacking(&self) -> bool {
        self.enemies.iter().any(|e| e.is_attacking())
    }

    pub fn boss_count(&self) -> usize {
        self.enemies.iter().filter(|e| e.is_boss()).count()
    }

    pub fn non_boss_count(&self) -> usize {
        self.enemies.iter().filter(|e| !e.is_boss()).count()
    }

    /// Transition an enemy to the dead state. The enemy stays registered
    /// until [`Self::remove`] is called once its death clip finishes.
    ///
    /// Returns `Ok(false)` if it was already dead.
    pub fn mark_dead(&mut self, id: EntityId) -> SimResult<bool> {
        let enemy = self.enemy_mut(id).ok_or(SimError::UnknownEntity(id))?;
        if enemy.is_dead() {
            return Ok(false);
        }
        enemy.hp = 0;
        enemy.motion = super::state::EnemyMotion::Dying;
        Ok(true)
    }

    /// Purge one entity. `None` if it is already gone.
    pub fn remove(&mut self, id: EntityId) -> Option<Removed> {
        if let Some(idx) = self.enemies.iter().position(|e| e.id == id) {
            return Some(Removed::Enemy(self.enemies.remove(idx)));
        }
        if let Some(idx) = self.projectiles.iter().position(|p| p.id == id) {
            return Some(Removed::Projectile(self.projectiles.remove(idx)));
        }
        if let Some(idx) = self.far_friendlies.iter().position(|f| f.id == id) {
            return Some(Removed::Friendly(self.far_friendlies.remove(idx)));
        }
        if let Some(idx) = self.near_friendlies.iter().position(|f| f.id == id) {
            return Some(Removed::Friendly(self.near_friendlies.remove(idx)));
        }
        None
    }

    /// Move a far-tier unit to the near tier. False if it is not far-tier.
    pub fn promote(&mut self, id: EntityId, pos: Vec3) -> bool {
        let Some(idx) = self.far_friendlies.iter().position(|f| f.id == id) else {
            return false;
        };
        let mut friendly = self.far_friendlies.remove(idx);
        friendly.tier = FriendlyTier::Near;
        friendly.pos = pos;
        self.near_friendlies.push(friendly);
        true
    }

    /// Drop the most recently added near-tier health token
    pub fn pop_near_friendly(&mut self) -> Option<Friendly> {
        self.near_friendlies.pop()
    }

    /// Apply deferred intents in order. Intents naming vanished entities are
    /// skipped.
    pub fn apply(&mut self, intents: impl IntoIterator<Item = RegistryIntent>) -> Vec<Removed> {
        let mut removed = Vec::new();
        for intent in intents {
            match intent {
                RegistryIntent::Remove(id) => {
                    if let Some(r) = self.remove(id) {
                        removed.push(r);
                    }
                }
                RegistryIntent::Promote { id, pos } => {
                    self.promote(id, pos);
                }
            }
        }
        removed
    }

    /// Purge an entire collection
    pub fn clear(&mut self, kind: EntityKind) -> Vec<Removed> {
        match kind {
            EntityKind::Enemy => self.enemies.drain(..).map(Removed::Enemy).collect(),
            EntityKind::NearFriendly => self
                .near_friendlies
                .drain(..)
                .map(Removed::Friendly)
                .collect(),
            EntityKind::FarFriendly => self
                .far_friendlies
                .drain(..)
                .map(Removed::Friendly)
                .collect(),
            EntityKind::Projectile => self
                .projectiles
                .drain(..)
                .map(Removed::Projectile)
                .collect(),
        }
    }

    /// Purge every enemy except bosses (wave-clear purge)
    pub fn purge_non_boss(&mut self) -> Vec<Removed> {
        let (bosses, others): (Vec<Enemy>, Vec<Enemy>) =
            self.enemies.drain(..).partition(|e| e.is_boss());
        self.enemies = bosses;
        others.into_iter().map(Removed::Enemy).collect()
    }

    /// Purge everything (run reset)
    pub fn clear_all(&mut self) -> Vec<Removed> {
        let mut removed = Vec::new();
        for kind in [
            EntityKind::Enemy,
            EntityKind::NearFriendly,
            EntityKind::FarFriendly,
            EntityKind::Projectile,
        ] {
            removed.extend(self.clear(kind));
        }
        removed
    }
}
