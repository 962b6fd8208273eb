//! Narrow interfaces to the rendering/asset collaborator
//!
//! The simulation never touches the scene graph. It asks the host for an
//! opaque instance per entity and drives animation clips through
//! [`AnimationController`]; transforms flow back out through
//! [`crate::sim::FrameSnapshot`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::AssetError;

/// Models the simulation asks the host to instantiate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    /// Regular and armored robots
    Robot,
    /// Boss-tier robot
    BossRobot,
    /// Friendly Michelle unit
    Michelle,
    /// Fired projectile
    Projectile,
}

/// Animation clips the simulation plays by index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Clip {
    Walk = 0,
    Attack = 1,
    Death = 2,
}

impl Clip {
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Opaque per-entity handle owned by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceHandle(pub u32);

/// Animation capability implemented by the renderer
pub trait AnimationController {
    /// Start a clip on an instance
    fn play(&mut self, instance: InstanceHandle, clip: Clip);
    /// Stop every running clip on an instance
    fn stop_all(&mut self, instance: InstanceHandle);
    /// Clip length in seconds, if the instance has that clip
    fn clip_duration(&self, instance: InstanceHandle, clip: Clip) -> Option<f64>;
}

/// Scene capability implemented by the renderer
pub trait SceneHost: AnimationController {
    /// Clone a loaded model into an independent instance and add it to the scene
    fn instantiate(&mut self, model: ModelKind) -> Result<InstanceHandle, AssetError>;
    /// Remove an instance from the scene
    fn release(&mut self, instance: InstanceHandle);
}

/// In-memory host for tests and the native runner
///
/// Every model is "loaded" unless marked missing. Clip lengths are fixed per
/// model so death timing is deterministic.
#[derive(Debug, Default)]
pub struct HeadlessHost {
    next_handle: u32,
    live: HashMap<InstanceHandle, ModelKind>,
    missing: Vec<ModelKind>,
    clip_lengths: HashMap<(ModelKind, Clip), f64>,
    /// Every clip started, in order (for assertions)
    pub played: Vec<(InstanceHandle, Clip)>,
}

impl HeadlessHost {
    pub fn new() -> Self {
        let mut host = Self::default();
        host.set_clip_length(ModelKind::Robot, Clip::Death, 1.2);
        host.set_clip_length(ModelKind::BossRobot, Clip::Death, 2.5);
        host
    }

    /// Make `instantiate` fail for a model
    pub fn mark_missing(&mut self, model: ModelKind) {
        if !self.missing.contains(&model) {
            self.missing.push(model);
        }
    }

    pub fn set_clip_length(&mut self, model: ModelKind, clip: Clip, secs: f64) {
        self.clip_lengths.insert((model, clip), secs);
    }

    /// Number of instances currently in the scene
    pub fn live_instances(&self) -> usize {
        self.live.len()
    }
}

impl AnimationController for HeadlessHost {
    fn play(&mut self, instance: InstanceHandle, clip: Clip) {
        self.played.push((instance, clip));
    }

    fn stop_all(&mut self, _instance: InstanceHandle) {}

    fn clip_duration(&self, instance: InstanceHandle, clip: Clip) -> Option<f64> {
        let model = self.live.get(&instance)?;
        self.clip_lengths.get(&(*model, clip)).copied()
    }
}

impl SceneHost for HeadlessHost {
    fn instantiate(&mut self, model: ModelKind) -> Result<InstanceHandle, AssetError> {
        if self.missing.contains(&model) {
            return Err(AssetError::ModelUnavailable(model));
        }
        self.next_handle += 1;
        let handle = InstanceHandle(self.next_handle);
        self.live.insert(handle, model);
        Ok(handle)
    }

    fn release(&mut self, instance: InstanceHandle) {
        self.live.remove(&instance);
    }
}
