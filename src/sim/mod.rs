//! Simulation module
//!
//! All gameplay logic lives here. Rendering and asset loading stay behind the
//! [`crate::collab`] traits, so everything in this module runs headless:
//! - Seeded RNG only
//! - Time comes from the frame delta, never a wall clock
//! - Stable iteration order (spawn order)
//! - Membership changes are applied between passes, never during one

pub mod ai;
pub mod combat;
pub mod player;
pub mod registry;
pub mod schedule;
pub mod session;
pub mod snapshot;
pub mod spatial;
pub mod state;
pub mod wave;

pub use combat::{CombatReport, Hit, resolve_projectiles};
pub use player::{DamageOutcome, PlayerState};
pub use registry::{EntityRegistry, RegistryIntent, Removed};
pub use schedule::{ScheduledEvent, Scheduler};
pub use session::{FireRay, FrameInput, GameSession};
pub use snapshot::{EntityTransform, FrameSnapshot, RunStats, VisualEvent};
pub use spatial::{Aabb, SpatialGrid, intersects};
pub use state::{
    Enemy, EnemyMotion, EnemyTier, EntityId, EntityKind, Friendly, FriendlyTier, Projectile,
};
pub use wave::{CountdownStep, WaveComposition, WaveDirector, WavePhase};
