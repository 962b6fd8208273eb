//! Game session and per-frame orchestration
//!
//! One [`GameSession`] owns every mutable collection, counter and timer of a
//! run. The host calls [`GameSession::frame_tick`] once per rendered frame:
//!
//! 1. advance the clock and apply every timer that came due
//! 2. queue fire input as projectiles
//! 3. enemy movement
//! 4. projectile advance and hit resolution
//! 5. friendly pickup
//! 6. wave advance check
//!
//! Timers (damage tick, countdown, delayed removal, reset) are applied whole
//! before the frame's own phases run, so no phase sees a half-applied
//! mutation.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::ai::advance_enemies;
use super::combat::resolve_projectiles;
use super::player::{PlayerState, near_slot_offset};
use super::registry::{EntityRegistry, Removed};
use super::schedule::{ScheduledEvent, Scheduler};
use super::snapshot::{FrameSnapshot, RunStats, VisualEvent, collect_transforms};
use super::state::{EnemyTier, EntityId, EntityKind, FriendlyTier};
use super::wave::{CountdownStep, WaveComposition, WaveDirector, WavePhase};
use crate::collab::{Clip, ModelKind, SceneHost};
use crate::error::{SimError, SimResult};
use crate::tuning::Tuning;

/// A fire trigger: controller/pointer ray in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FireRay {
    pub origin: Vec3,
    pub direction: Vec3,
}

/// Input for one frame
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    /// Real time since the previous frame
    pub delta_seconds: f64,
    /// Player (headset) position, if tracked this frame
    pub player_position: Option<Vec3>,
    /// Fire triggers since the previous frame
    pub fire: Vec<FireRay>,
}

/// Complete state of one local game
pub struct GameSession<H: SceneHost> {
    tuning: Tuning,
    seed: u64,
    rng: Pcg32,
    host: H,
    registry: EntityRegistry,
    player: PlayerState,
    director: WaveDirector,
    scheduler: Scheduler,
    /// The base enemies walk toward
    base: Vec3,
    player_pos: Vec3,
    events: Vec<VisualEvent>,
    stats: RunStats,
}

impl<H: SceneHost> GameSession<H> {
    /// Create a session and start the first run
    pub fn new(seed: u64, tuning: Tuning, host: H) -> SimResult<Self> {
        tuning.validate()?;
        let mut session = Self {
            player: PlayerState::new(tuning.player_start_hp),
            tuning,
            seed,
            rng: Pcg32::seed_from_u64(seed),
            host,
            registry: EntityRegistry::new(),
            director: WaveDirector::new(),
            scheduler: Scheduler::new(),
            base: Vec3::ZERO,
            player_pos: Vec3::ZERO,
            events: Vec::new(),
            stats: RunStats::default(),
        };
        session.start_run(0.0);
        log::info!("Session started with seed {}", seed);
        Ok(session)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn player(&self) -> &PlayerState {
        &self.player
    }

    pub fn director(&self) -> &WaveDirector {
        &self.director
    }

    pub fn phase(&self) -> WavePhase {
        self.director.phase()
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Seconds since the session started
    pub fn now(&self) -> f64 {
        self.scheduler.now()
    }

    /// Due time of the pending reset, if a game over scheduled one
    pub fn pending_reset_at(&self) -> Option<f64> {
        self.scheduler
            .pending_where(|e| *e == ScheduledEvent::ResetRun)
            .first()
            .map(|(due, _)| *due)
    }

    /// Run one frame
    pub fn frame_tick(&mut self, input: &FrameInput) {
        self.scheduler.advance(input.delta_seconds);
        if let Some(pos) = input.player_position {
            self.player_pos = pos;
        }

        while let Some((due, event)) = self.scheduler.pop_due() {
            self.handle_event(due, event);
        }

        for ray in &input.fire {
            if let Err(err) = self.fire(ray.origin, ray.direction) {
                log::warn!("Ignoring fire input: {}", err);
            }
        }

        if self.director.is_game_over() {
            return;
        }

        // Movement
        let engaged = advance_enemies(
            self.registry.enemies_mut(),
            self.base,
            self.tuning.engagement_radius,
        );
        for id in engaged {
            if let Some(enemy) = self.registry.enemy(id) {
                let instance = enemy.instance;
                self.host.stop_all(instance);
                self.host.play(instance, Clip::Attack);
                log::debug!("Enemy {:?} engaging", id);
            }
        }

        // Combat
        let (projectiles, enemies) = self.registry.combat_view();
        let report = resolve_projectiles(
            projectiles,
            enemies,
            self.tuning.max_bullet_distance,
            self.tuning.bullet_half_extent,
        );
        let removed = self.registry.apply(report.intents());
        self.release_all(removed);
        for id in report.kills() {
            self.begin_death(id);
        }

        // Pickup
        if let Some(id) = self.player.try_pickup(
            &mut self.registry,
            self.player_pos,
            self.tuning.pickup_radius,
            self.tuning.near_ring_radius,
        ) {
            log::debug!("Friendly {:?} joined the near tier", id);
        }

        // Wave state
        if let Some(wave) = self.director.evaluate() {
            self.clear_wave(wave);
        }
    }

    /// Fire a projectile along a ray. Ignored (Ok(None)) during game over or
    /// if the projectile model is unavailable.
    pub fn fire(&mut self, origin: Vec3, direction: Vec3) -> SimResult<Option<EntityId>> {
        if !origin.is_finite() || !direction.is_finite() {
            return Err(SimError::InvalidDirection);
        }
        let dir = direction.try_normalize().ok_or(SimError::InvalidDirection)?;
        if self.director.is_game_over() {
            return Ok(None);
        }
        let instance = match self.host.instantiate(ModelKind::Projectile) {
            Ok(instance) => instance,
            Err(err) => {
                log::warn!("Skipping projectile: {}", err);
                return Ok(None);
            }
        };
        let id = self
            .registry
            .spawn_projectile(origin, dir, self.tuning.bullet_speed, instance);
        self.events.push(VisualEvent::Spawn {
            id,
            kind: EntityKind::Projectile,
            instance,
        });
        Ok(Some(id))
    }

    /// Kill an enemy outright (death clip, delayed removal).
    /// Returns false if it was already dying.
    pub fn mark_dead(&mut self, id: EntityId) -> SimResult<bool> {
        if !self.registry.mark_dead(id)? {
            return Ok(false);
        }
        self.begin_death(id);
        Ok(true)
    }

    /// Build the frame output and drain one-shot visual events
    pub fn snapshot(&mut self) -> FrameSnapshot {
        FrameSnapshot {
            entities: collect_transforms(&self.registry),
            player_hp: self.player.hp,
            wave_index: self.director.wave_index(),
            is_game_over: self.player.is_game_over,
            is_intermission: matches!(self.director.phase(), WavePhase::Intermission { .. }),
            countdown: self.director.countdown(),
            reset_in: self.pending_reset_at().map(|at| (at - self.now()).max(0.0)),
            events: std::mem::take(&mut self.events),
            stats: self.stats,
        }
    }

    /// Apply one timer. Periodic timers re-arm from their own due time so
    /// frame length never stretches the period.
    fn handle_event(&mut self, due: f64, event: ScheduledEvent) {
        match event {
            ScheduledEvent::DamageTick => {
                let outcome = self.player.apply_damage_tick(&mut self.registry);
                if outcome.damaged {
                    self.events.push(VisualEvent::PlayerDamaged { hp: self.player.hp });
                }
                if let Some(token) = outcome.token {
                    self.release(token);
                }
                if outcome.game_over {
                    self.enter_game_over(due);
                }
                self.scheduler
                    .schedule_at(due + self.tuning.damage_tick_secs, ScheduledEvent::DamageTick);
            }
            ScheduledEvent::CountdownTick => match self.director.countdown_tick() {
                CountdownStep::Remaining(n) => {
                    log::debug!("Next wave in {}", n);
                    self.scheduler.schedule_at(
                        due + self.tuning.countdown_tick_secs,
                        ScheduledEvent::CountdownTick,
                    );
                }
                CountdownStep::Launch(wave) => self.spawn_wave(wave),
                CountdownStep::Ignored => {}
            },
            ScheduledEvent::RemoveEnemy(id) => {
                if let Some(removed) = self.registry.remove(id) {
                    if let Removed::Enemy(enemy) = &removed {
                        self.director.enemy_removed(enemy.tier);
                    }
                    self.release(removed);
                }
            }
            ScheduledEvent::ResetRun => self.reset_run(due),
        }
    }

    /// Death clip plus delayed removal
    fn begin_death(&mut self, id: EntityId) {
        let Some(enemy) = self.registry.enemy(id) else {
            return;
        };
        let instance = enemy.instance;
        self.host.stop_all(instance);
        self.host.play(instance, Clip::Death);
        let delay = self
            .host
            .clip_duration(instance, Clip::Death)
            .unwrap_or(self.tuning.fallback_death_secs);
        self.scheduler
            .schedule_in(delay, ScheduledEvent::RemoveEnemy(id));
        self.stats.kills += 1;
        log::debug!("Enemy {:?} dying, removal in {:.2}s", id, delay);
    }

    /// `Clearing`: purge non-boss enemies and projectiles, then count down
    fn clear_wave(&mut self, wave: u32) {
        let purged = self.registry.purge_non_boss();
        let purged_ids: Vec<_> = purged.iter().map(Removed::id).collect();
        self.scheduler.cancel_where(
            |e| matches!(e, ScheduledEvent::RemoveEnemy(id) if purged_ids.contains(id)),
        );
        self.release_all(purged);
        let shots = self.registry.clear(EntityKind::Projectile);
        self.release_all(shots);

        self.stats.waves_cleared += 1;
        if self.director.enter_intermission(self.tuning.countdown_ticks) {
            self.scheduler
                .schedule_in(self.tuning.countdown_tick_secs, ScheduledEvent::CountdownTick);
            log::info!("Intermission after wave {}", wave);
        }
    }

    /// Latch game over at time `at` and arm the reset
    fn enter_game_over(&mut self, at: f64) {
        if !self.director.game_over() {
            return;
        }
        self.scheduler
            .cancel_where(|e| *e == ScheduledEvent::CountdownTick);
        self.scheduler
            .schedule_at(at + self.tuning.reset_delay_secs, ScheduledEvent::ResetRun);
    }

    fn reset_run(&mut self, at: f64) {
        log::info!("Resetting run");
        let removed = self.registry.clear_all();
        self.release_all(removed);
        self.scheduler.cancel_all();
        self.start_run(at);
    }

    /// Fresh player, friendlies and wave 1; arms the damage timer from `at`
    fn start_run(&mut self, at: f64) {
        self.player.reset();
        self.director.reset();
        self.stats.runs += 1;

        for _ in 0..self.player.hp {
            self.spawn_friendly(FriendlyTier::Near);
        }
        for _ in 0..self.tuning.far_friendly_count {
            self.spawn_friendly(FriendlyTier::Far);
        }
        self.spawn_wave(1);
        self.scheduler
            .schedule_at(at + self.tuning.damage_tick_secs, ScheduledEvent::DamageTick);
    }

    fn spawn_wave(&mut self, wave: u32) {
        self.director.begin_wave(wave);
        let composition = WaveComposition::for_wave(wave, &self.tuning);
        let spawned = composition
            .tiers()
            .filter_map(|tier| self.spawn_enemy(tier))
            .count();
        self.stats.best_wave = self.stats.best_wave.max(wave);
        log::info!(
            "Wave {}: spawned {}/{} enemies ({:?})",
            wave,
            spawned,
            composition.total(),
            composition
        );
    }

    fn spawn_enemy(&mut self, tier: EnemyTier) -> Option<EntityId> {
        let instance = match self.host.instantiate(tier.model()) {
            Ok(instance) => instance,
            Err(err) => {
                log::warn!("Skipping {:?} spawn: {}", tier, err);
                return None;
            }
        };
        let pos = self.tuning.enemy_ring.sample(&mut self.rng);
        let yaw = self.rng.random::<f32>() * std::f32::consts::TAU;
        let stats = *self.tuning.tier(tier);
        let id = self.registry.spawn_enemy(tier, &stats, pos, yaw, instance);
        self.director.enemy_spawned(tier);
        self.host.play(instance, Clip::Walk);
        self.events.push(VisualEvent::Spawn {
            id,
            kind: EntityKind::Enemy,
            instance,
        });
        Some(id)
    }

    fn spawn_friendly(&mut self, tier: FriendlyTier) -> Option<EntityId> {
        let instance = match self.host.instantiate(ModelKind::Michelle) {
            Ok(instance) => instance,
            Err(err) => {
                log::warn!("Skipping friendly spawn: {}", err);
                return None;
            }
        };
        let pos = match tier {
            FriendlyTier::Near => {
                let slot = self.registry.near_friendlies().len();
                self.player_pos.with_y(0.0) + near_slot_offset(slot, self.tuning.near_ring_radius)
            }
            FriendlyTier::Far => self.tuning.far_friendly_ring.sample(&mut self.rng),
        };
        let yaw = self.rng.random::<f32>() * std::f32::consts::TAU;
        let id = self.registry.spawn_friendly(tier, pos, yaw, instance);
        self.host.play(instance, Clip::Walk);
        let kind = match tier {
            FriendlyTier::Near => EntityKind::NearFriendly,
            FriendlyTier::Far => EntityKind::FarFriendly,
        };
        self.events.push(VisualEvent::Spawn { id, kind, instance });
        Some(id)
    }

    fn release(&mut self, removed: Removed) {
        let instance = removed.instance();
        self.host.release(instance);
        self.events.push(VisualEvent::Despawn {
            id: removed.id(),
            instance,
        });
    }

    fn release_all(&mut self, removed: Vec<Removed>) {
        for r in removed {
            self.release(r);
        }
    }
}
