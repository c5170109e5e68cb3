mod loader;
mod render;

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use anyhow::Context;
use glam::{Mat4, Quat, Vec3};
use rand::rngs::StdRng;
use rand::SeedableRng;
use winit::{
    event::*,
    event_loop::EventLoop,
    keyboard::{Key, NamedKey},
    window::WindowBuilder,
};

use loader::FileModelLoader;
use render::{instances, GpuState};
use spiral_core::{
    draw_list, CameraPose, CounterClient, CounterOutcome, DeploymentConfig, FileCounterStore,
    ModelLoader, PlacementStrategy, Result as CoreResult, SceneNode, SessionId, SpiralSession,
};

const EYE_HEIGHT: f32 = 0.6;
const CAMERA_PITCH: f32 = -0.45;
const YAW_STEP: f32 = 0.05;
const FOV_Y: f32 = 70.0;

/// Floor-plane stand-in for an XR hit-test source.
struct FloorHitTest;

impl FloorHitTest {
    /// First intersection of the viewer's forward ray with y = 0.
    fn cast(&self, camera: &CameraPose) -> Option<Mat4> {
        let dir = camera.forward();
        if dir.y >= -1e-4 {
            return None;
        }
        let t = -camera.position.y / dir.y;
        Some(Mat4::from_translation(camera.position + dir * t))
    }
}

enum Completion {
    Counter(SessionId, CounterOutcome),
    Asset(CoreResult<SceneNode>),
}

struct Viewer {
    yaw: f32,
}

impl Viewer {
    fn pose(&self) -> CameraPose {
        CameraPose {
            position: Vec3::new(0.0, EYE_HEIGHT, 0.0),
            orientation: Quat::from_rotation_y(self.yaw) * Quat::from_rotation_x(CAMERA_PITCH),
        }
    }

    fn view_proj(&self, aspect: f32) -> Mat4 {
        let pose = self.pose();
        let proj = Mat4::perspective_rh(FOV_Y.to_radians(), aspect, 0.01, 20.0);
        let view = Mat4::from_rotation_translation(pose.orientation, pose.position).inverse();
        proj * view
    }
}

fn load_config() -> anyhow::Result<DeploymentConfig> {
    let mut config = match std::env::var("SPIRAL_CONFIG") {
        Ok(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config {path}"))?;
            DeploymentConfig::from_json(&text)?
        }
        Err(_) => DeploymentConfig::default(),
    };
    if let Ok(placement) = std::env::var("SPIRAL_PLACEMENT") {
        config.placement = PlacementStrategy::from_str(&placement)?;
    }
    if let Ok(model) = std::env::var("SPIRAL_MODEL") {
        config.model_path = model;
    }
    Ok(config)
}

fn spawn_model_load(path: String, tx: Sender<Completion>) {
    let spawned = thread::Builder::new()
        .name("model-loader".into())
        .spawn(move || {
            let result = pollster::block_on(FileModelLoader.load(&path));
            let _ = tx.send(Completion::Asset(result));
        });
    if let Err(e) = spawned {
        log::error!("[asset] could not start loader thread: {}", e);
    }
}

type FileCounter = CounterClient<FileCounterStore>;

/// Exactly one increment per session, tagged with the session id. All
/// fetches share one store so overlapping sessions bump in turn.
fn spawn_counter_fetch(id: SessionId, client: Arc<FileCounter>, tx: Sender<Completion>) {
    let thread_tx = tx.clone();
    let spawned = thread::Builder::new()
        .name("counter".into())
        .spawn(move || {
            let outcome = pollster::block_on(client.fetch());
            let _ = thread_tx.send(Completion::Counter(id, outcome));
        });
    if let Err(e) = spawned {
        log::error!("[counter] could not start fetch thread: {}", e);
        let _ = tx.send(Completion::Counter(id, CounterOutcome::Failed));
    }
}

struct App {
    session: SpiralSession<FloorHitTest, StdRng>,
    viewer: Viewer,
    counter: Arc<FileCounter>,
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
    start: Instant,
}

impl App {
    fn start_session(&mut self) {
        let id = self.session.begin();
        log::info!("[session] started {:?}", id);
        spawn_counter_fetch(id, self.counter.clone(), self.tx.clone());
        if let Some(armed) = self.session.arm_hit_test(true) {
            self.session.hit_test_ready(armed, Ok(FloorHitTest));
        }
    }

    fn drain_completions(&mut self) {
        while let Ok(done) = self.rx.try_recv() {
            match done {
                Completion::Counter(id, outcome) => {
                    if !self.session.counter_settled(id, outcome) {
                        log::debug!("[counter] dropped result for stale {:?}", id);
                    }
                }
                Completion::Asset(result) => self.session.asset_loaded(result),
            }
        }
    }

    fn tick(&mut self) {
        self.drain_completions();
        let camera = self.viewer.pose();
        let hit = self
            .session
            .hit_test_source()
            .and_then(|source| source.cast(&camera));
        let elapsed = self.start.elapsed().as_secs_f32();
        if let Some(p) = self.session.frame(hit, Some(camera), elapsed) {
            log::info!(
                "[placement] {:?}: {} stones at {:?}",
                p.trigger,
                p.stones,
                p.position
            );
        }
    }

    fn select(&mut self) {
        if let Some(p) = self.session.select(self.viewer.pose()) {
            log::info!("[placement] moved to {:?}", p.position);
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .init();

    let config = load_config().unwrap_or_else(|e| {
        log::warn!("[config] {:#}; using defaults", e);
        DeploymentConfig::default()
    });
    log::info!("[config] placement strategy {:?}", config.placement);

    let counter_file = std::env::var("SPIRAL_COUNTER_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("counter.json"));

    let counter = Arc::new(CounterClient::new(
        FileCounterStore::new(counter_file),
        config.counter.base_offset,
    ));
    match pollster::block_on(counter.peek()) {
        Ok(n) => log::info!(
            "[counter] {} holds {}",
            counter.transport().path().display(),
            n
        ),
        Err(e) => log::warn!("[counter] cannot read current count: {}", e),
    }

    let (tx, rx) = mpsc::channel();
    spawn_model_load(config.model_path.clone(), tx.clone());

    let mut app = App {
        session: SpiralSession::new(&config, StdRng::from_entropy()),
        viewer: Viewer { yaw: 0.0 },
        counter,
        tx,
        rx,
        start: Instant::now(),
    };
    app.start_session();

    let event_loop = EventLoop::new()?;
    let window = WindowBuilder::new()
        .with_title("Stone Spiral (native preview)")
        .build(&event_loop)?;

    let mut state = pollster::block_on(GpuState::new(&window))?;

    event_loop.run(move |event, elwt| match event {
        Event::WindowEvent {
            event: WindowEvent::Resized(size),
            ..
        } => state.resize(size),
        Event::WindowEvent {
            event: WindowEvent::CloseRequested,
            ..
        } => elwt.exit(),
        Event::WindowEvent {
            event:
                WindowEvent::MouseInput {
                    state: ElementState::Pressed,
                    button: MouseButton::Left,
                    ..
                },
            ..
        } => app.select(),
        Event::WindowEvent {
            event:
                WindowEvent::KeyboardInput {
                    event:
                        KeyEvent {
                            logical_key,
                            state: ElementState::Pressed,
                            ..
                        },
                    ..
                },
            ..
        } => match logical_key {
            Key::Named(NamedKey::ArrowLeft) => app.viewer.yaw += YAW_STEP,
            Key::Named(NamedKey::ArrowRight) => app.viewer.yaw -= YAW_STEP,
            Key::Named(NamedKey::Escape) => elwt.exit(),
            Key::Character(c) if c.eq_ignore_ascii_case("r") => {
                app.session.end();
                app.start_session();
            }
            _ => {}
        },
        Event::AboutToWait => {
            app.tick();
            let items = draw_list(app.session.spiral(), app.session.reticle().pose());
            let view_proj = app.viewer.view_proj(state.aspect());
            match state.render(view_proj, &instances(&items)) {
                Ok(_) => state.window.request_redraw(),
                Err(wgpu::SurfaceError::Lost) => state.resize(state.window.inner_size()),
                Err(wgpu::SurfaceError::OutOfMemory) => elwt.exit(),
                Err(_) => {}
            }
        }
        _ => {}
    })?;
    Ok(())
}
