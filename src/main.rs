//! Robot Siege entry point
//!
//! On the web the page's XR scene drives the simulation through the
//! `RobotSiege` binding. Natively a headless run plays itself with a simple
//! auto-aim, which is handy for balancing tuning files.

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::collections::HashMap;

    use glam::Vec3;
    use serde::Serialize;
    use wasm_bindgen::prelude::*;

    use robot_siege::sim::{FireRay, FrameInput, GameSession};
    use robot_siege::{AnimationController, AssetError, Clip, InstanceHandle, ModelKind, SceneHost, Tuning};

    /// Scene command for the page to apply after each frame
    #[derive(Debug, Clone, Serialize)]
    #[serde(tag = "op", rename_all = "snake_case")]
    enum HostCommand {
        Instantiate { instance: InstanceHandle, model: ModelKind },
        Release { instance: InstanceHandle },
        Play { instance: InstanceHandle, clip: usize },
        StopAll { instance: InstanceHandle },
    }

    /// Host backed by the page: it records commands and answers from what the
    /// page reported at load time.
    #[derive(Default)]
    struct PageHost {
        next_handle: u32,
        live: HashMap<InstanceHandle, ModelKind>,
        /// Models the page could not provide, with the loader's error if any
        failed: HashMap<ModelKind, Option<String>>,
        clip_lengths: HashMap<(ModelKind, usize), f64>,
        commands: Vec<HostCommand>,
    }

    impl AnimationController for PageHost {
        fn play(&mut self, instance: InstanceHandle, clip: Clip) {
            self.commands.push(HostCommand::Play {
                instance,
                clip: clip.index(),
            });
        }

        fn stop_all(&mut self, instance: InstanceHandle) {
            self.commands.push(HostCommand::StopAll { instance });
        }

        fn clip_duration(&self, instance: InstanceHandle, clip: Clip) -> Option<f64> {
            let model = self.live.get(&instance)?;
            self.clip_lengths.get(&(*model, clip.index())).copied()
        }
    }

    impl SceneHost for PageHost {
        fn instantiate(&mut self, model: ModelKind) -> Result<InstanceHandle, AssetError> {
            match self.failed.get(&model) {
                Some(Some(reason)) => {
                    return Err(AssetError::LoadFailed {
                        model,
                        reason: reason.clone(),
                    });
                }
                Some(None) => return Err(AssetError::ModelUnavailable(model)),
                None => {}
            }
            self.next_handle += 1;
            let instance = InstanceHandle(self.next_handle);
            self.live.insert(instance, model);
            self.commands.push(HostCommand::Instantiate { instance, model });
            Ok(instance)
        }

        fn release(&mut self, instance: InstanceHandle) {
            if self.live.remove(&instance).is_some() {
                self.commands.push(HostCommand::Release { instance });
            }
        }
    }

    fn model_from_name(name: &str) -> Option<ModelKind> {
        match name {
            "robot" => Some(ModelKind::Robot),
            "boss_robot" => Some(ModelKind::BossRobot),
            "michelle" => Some(ModelKind::Michelle),
            "projectile" => Some(ModelKind::Projectile),
            _ => None,
        }
    }

    /// Game handle exposed to the page
    #[wasm_bindgen]
    pub struct RobotSiege {
        session: Option<GameSession<PageHost>>,
        host: Option<PageHost>,
        tuning: Tuning,
        input: FrameInput,
    }

    #[wasm_bindgen]
    impl RobotSiege {
        #[wasm_bindgen(constructor)]
        pub fn new() -> Self {
            Self {
                session: None,
                host: Some(PageHost::default()),
                tuning: Tuning::default(),
                input: FrameInput::default(),
            }
        }

        /// Override balance values before `start`
        pub fn load_tuning(&mut self, json: &str) -> Result<(), JsValue> {
            self.tuning = Tuning::from_json(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
            Ok(())
        }

        /// Report a model the page does not ship (before `start`)
        pub fn model_unavailable(&mut self, name: &str) {
            if let (Some(host), Some(model)) = (self.host.as_mut(), model_from_name(name)) {
                log::warn!("Model {:?} unavailable", model);
                host.failed.insert(model, None);
            }
        }

        /// Report a model whose loader errored (before `start`)
        pub fn model_failed(&mut self, name: &str, reason: &str) {
            if let (Some(host), Some(model)) = (self.host.as_mut(), model_from_name(name)) {
                log::warn!("Model {:?} failed to load: {}", model, reason);
                host.failed.insert(model, Some(reason.to_string()));
            }
        }

        /// Report a clip length for a model (before `start`)
        pub fn set_clip_length(&mut self, name: &str, clip: usize, secs: f64) {
            if let (Some(host), Some(model)) = (self.host.as_mut(), model_from_name(name)) {
                host.clip_lengths.insert((model, clip), secs);
            }
        }

        /// Start the session once every model has loaded or failed
        pub fn start(&mut self) -> Result<(), JsValue> {
            let Some(host) = self.host.take() else {
                return Err(JsValue::from_str("already started"));
            };
            let seed = js_sys::Date::now() as u64;
            let session = GameSession::new(seed, self.tuning.clone(), host)
                .map_err(|e| JsValue::from_str(&e.to_string()))?;
            log::info!("Game initialized with seed: {}", seed);
            self.session = Some(session);
            Ok(())
        }

        pub fn set_player_position(&mut self, x: f32, y: f32, z: f32) {
            self.input.player_position = Some(Vec3::new(x, y, z));
        }

        /// Queue a trigger pull for the next frame
        pub fn fire(&mut self, ox: f32, oy: f32, oz: f32, dx: f32, dy: f32, dz: f32) {
            self.input.fire.push(FireRay {
                origin: Vec3::new(ox, oy, oz),
                direction: Vec3::new(dx, dy, dz),
            });
        }

        /// Advance one rendered frame; returns the frame snapshot as JSON
        pub fn frame(&mut self, delta_seconds: f64) -> Result<String, JsValue> {
            let Some(session) = self.session.as_mut() else {
                return Err(JsValue::from_str("not started"));
            };
            self.input.delta_seconds = delta_seconds;
            session.frame_tick(&self.input);
            self.input.fire.clear();
            let snapshot = session.snapshot();
            serde_json::to_string(&snapshot).map_err(|e| JsValue::from_str(&e.to_string()))
        }

        /// Scene commands issued since the last call, as JSON
        pub fn drain_commands(&mut self) -> Result<String, JsValue> {
            let commands = match (self.session.as_mut(), self.host.as_mut()) {
                (Some(session), _) => std::mem::take(&mut session.host_mut().commands),
                (None, Some(host)) => std::mem::take(&mut host.commands),
                (None, None) => Vec::new(),
            };
            serde_json::to_string(&commands).map_err(|e| JsValue::from_str(&e.to_string()))
        }
    }

    impl Default for RobotSiege {
        fn default() -> Self {
            Self::new()
        }
    }

    pub fn init() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            return;
        }
        log::info!("Robot Siege starting...");
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::init();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Robot Siege (native) starting...");

    let mut args = std::env::args().skip(1);
    let tuning = match args.next() {
        Some(path) => match std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|json| robot_siege::Tuning::from_json(&json).map_err(|e| e.to_string()))
        {
            Ok(tuning) => tuning,
            Err(e) => {
                log::error!("Failed to load tuning from {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => robot_siege::Tuning::default(),
    };
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(0x5eed);

    match headless::run(seed, tuning, 180.0) {
        Ok(stats) => println!(
            "Run finished: {} kills, best wave {}, {} waves cleared, {} runs",
            stats.kills, stats.best_wave, stats.waves_cleared, stats.runs
        ),
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use glam::Vec3;
    use robot_siege::sim::{EntityKind, FireRay, FrameInput, GameSession, RunStats};
    use robot_siege::{HeadlessHost, SimResult, Tuning, ground_distance};

    const FRAME_SECS: f64 = 1.0 / 72.0;
    /// Auto-aim trigger interval
    const FIRE_INTERVAL_SECS: f64 = 0.25;
    const EYE: Vec3 = Vec3::new(0.0, 1.6, 0.0);

    /// Play `duration` seconds with the player standing at the base,
    /// shooting at the nearest living enemy.
    pub fn run(seed: u64, tuning: Tuning, duration: f64) -> SimResult<RunStats> {
        let mut session = GameSession::new(seed, tuning, HeadlessHost::new())?;
        let mut since_fire = 0.0;
        let mut last_wave = 0;

        while session.now() < duration {
            let mut input = FrameInput {
                delta_seconds: FRAME_SECS,
                player_position: Some(EYE),
                fire: Vec::new(),
            };
            since_fire += FRAME_SECS;
            if since_fire >= FIRE_INTERVAL_SECS {
                since_fire = 0.0;
                let target = session
                    .registry()
                    .enemies()
                    .iter()
                    .filter(|e| !e.is_dead())
                    .min_by(|a, b| ground_distance(a.pos, EYE).total_cmp(&ground_distance(b.pos, EYE)));
                if let Some(enemy) = target {
                    let aim = enemy.pos.with_y(enemy.half_extents.y);
                    input.fire.push(FireRay {
                        origin: EYE,
                        direction: aim - EYE,
                    });
                }
            }

            session.frame_tick(&input);
            let snapshot = session.snapshot();
            if snapshot.wave_index != last_wave {
                last_wave = snapshot.wave_index;
                log::info!(
                    "t={:.1}s wave {} hp {} enemies {}",
                    session.now(),
                    last_wave,
                    snapshot.player_hp,
                    snapshot.count(EntityKind::Enemy)
                );
            }
        }
        Ok(session.stats())
    }

}
