//! Enemy approach logic
//!
//! Straight-line walk toward the base, recomputed every tick. The arena has
//! no obstacles so no path is cached.

use glam::Vec3;

use super::state::{Enemy, EnemyMotion, EntityId};
use crate::{ground_distance, yaw_toward};

/// Move every approaching enemy one tick toward `base`.
///
/// Returns the enemies that reached engagement range this tick (their
/// motion is already `Attacking`; the caller starts the attack clip).
pub fn advance_enemies(enemies: &mut [Enemy], base: Vec3, engagement_radius: f32) -> Vec<EntityId> {
    let mut engaged = Vec::new();

    for enemy in enemies.iter_mut() {
        if enemy.motion != EnemyMotion::Approaching {
            continue;
        }

        let to_base = Vec3::new(base.x - enemy.pos.x, 0.0, base.z - enemy.pos.z);
        let dist = to_base.length();

        if dist > engagement_radius {
            // Never step past the base itself
            let step = enemy.speed.min(dist);
            enemy.pos += to_base.normalize_or_zero() * step;
        }
        enemy.yaw = yaw_toward(enemy.pos, base);

        if ground_distance(enemy.pos, base) <= engagement_radius {
            enemy.motion = EnemyMotion::Attacking;
            engaged.push(enemy.id);
        }
    }

    engaged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::InstanceHandle;
    use crate::sim::state::EnemyTier;
    use crate::tuning::Tuning;

    fn enemy_at(id: u32, pos: Vec3) -> Enemy {
        let tuning = Tuning::default();
        Enemy::new(EntityId(id), EnemyTier::Regular, &tuning.regular, pos, 0.0, InstanceHandle(id))
    }

    #[test]
    fn test_moves_toward_base_by_speed() {
        let mut enemies = vec![enemy_at(1, Vec3::new(6.0, 0.0, 0.0))];
        let engaged = advance_enemies(&mut enemies, Vec3::ZERO, 2.5);
        assert!(engaged.is_empty());
        assert!((enemies[0].pos.x - 5.98).abs() < 1e-5);
        assert!(enemies[0].pos.z.abs() < 1e-6);
    }

    #[test]
    fn test_engages_at_radius_and_stops() {
        let mut enemies = vec![enemy_at(1, Vec3::new(0.0, 0.0, 2.515))];
        let engaged = advance_enemies(&mut enemies, Vec3::ZERO, 2.5);
        assert_eq!(engaged, vec![EntityId(1)]);
        assert_eq!(enemies[0].motion, EnemyMotion::Attacking);

        let pos = enemies[0].pos;
        let engaged = advance_enemies(&mut enemies, Vec3::ZERO, 2.5);
        assert!(engaged.is_empty());
        assert_eq!(enemies[0].pos, pos);
    }

    #[test]
    fn test_dying_enemies_do_not_move() {
        let mut enemies = vec![enemy_at(1, Vec3::new(4.0, 0.0, 0.0))];
        enemies[0].motion = EnemyMotion::Dying;
        advance_enemies(&mut enemies, Vec3::ZERO, 2.5);
        assert_eq!(enemies[0].pos, Vec3::new(4.0, 0.0, 0.0));
        assert_eq!(enemies[0].motion, EnemyMotion::Dying);
    }

    #[test]
    fn test_enemy_reaches_range_eventually() {
        let mut enemies = vec![enemy_at(1, Vec3::new(-7.0, 0.0, 3.0))];
        let mut ticks = 0;
        while enemies[0].motion == EnemyMotion::Approaching {
            advance_enemies(&mut enemies, Vec3::ZERO, 2.5);
            ticks += 1;
            assert!(ticks < 1000);
        }
        let d = ground_distance(enemies[0].pos, Vec3::ZERO);
        assert!(d <= 2.5 && d > 2.45);
    }
}
