//! Placement state machine: decides once per session when and where the
//! spiral materializes, and handles manual re-placement.

use crate::animation::{animate, AnimationParams};
use crate::config::{DeploymentConfig, PlacementStrategy};
use crate::counter::{CounterOutcome, SessionCounterState};
use crate::error::Result;
use crate::reticle::ReticlePose;
use crate::scene::{prepare_model, AssetSlot, SceneNode};
use crate::session::SessionId;
use crate::spiral::{Spiral, SpiralBuilder, SpiralConfig};
use glam::{Mat4, Quat, Vec3};
use rand::Rng;
use std::sync::Arc;

/// World-space camera (viewer) pose.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
        }
    }
}

impl CameraPose {
    pub fn from_matrix(m: &Mat4) -> Self {
        let (_scale, orientation, position) = m.to_scale_rotation_translation();
        Self {
            position,
            orientation,
        }
    }

    /// Local -Z rotated into world space.
    pub fn forward(&self) -> Vec3 {
        (self.orientation * Vec3::NEG_Z).normalize()
    }

    pub fn point_ahead(&self, distance: f32) -> Vec3 {
        self.position + self.forward() * distance
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlacementTrigger {
    Surface,
    CameraAuto,
    Select,
}

/// Reported whenever the spiral is created or moved.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub trigger: PlacementTrigger,
    pub created: bool,
    pub position: Vec3,
    pub stones: usize,
}

/// Everything that lives exactly as long as one AR session.
#[derive(Clone, Debug)]
pub struct SessionContext {
    pub id: Option<SessionId>,
    pub active: bool,
    pub counter: SessionCounterState,
    pub spiral: Option<Spiral>,
    pub initial_placed: bool,
    /// Surface deployment lost its hit-test source for this session.
    pub surface_lost: bool,
}

impl SessionContext {
    fn idle(counter: SessionCounterState) -> Self {
        Self {
            id: None,
            active: false,
            counter,
            spiral: None,
            initial_placed: false,
            surface_lost: false,
        }
    }
}

/// Per-frame inputs gathered by the host.
#[derive(Clone, Copy, Debug)]
pub struct FrameInput<'a> {
    pub reticle: &'a ReticlePose,
    pub camera: Option<CameraPose>,
    pub elapsed_sec: f32,
}

pub struct PlacementController<R> {
    strategy: PlacementStrategy,
    distance: f32,
    layout: SpiralConfig,
    animation: AnimationParams,
    asset: AssetSlot,
    session: SessionContext,
    rng: R,
}

impl<R: Rng> PlacementController<R> {
    pub fn new(config: &DeploymentConfig, rng: R) -> Self {
        Self {
            strategy: config.placement,
            distance: config.placement_distance,
            layout: config.spiral.clone(),
            animation: AnimationParams::default(),
            asset: AssetSlot::Pending,
            session: SessionContext::idle(SessionCounterState::new(config.counter.fallback_count)),
            rng,
        }
    }

    pub fn with_animation(mut self, animation: AnimationParams) -> Self {
        self.animation = animation;
        self
    }

    pub fn strategy(&self) -> PlacementStrategy {
        self.strategy
    }

    /// Strategy in force for the current session. A surface deployment
    /// without hit testing places relative to the camera instead.
    pub fn effective_strategy(&self) -> PlacementStrategy {
        if self.session.surface_lost {
            PlacementStrategy::CameraRelative
        } else {
            self.strategy
        }
    }

    pub fn hit_test_unavailable(&mut self) {
        if !self.session.active || self.strategy != PlacementStrategy::SurfaceAnchored {
            return;
        }
        if !self.session.surface_lost {
            log::warn!("[placement] no hit testing, falling back to camera-relative placement");
        }
        self.session.surface_lost = true;
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn spiral(&self) -> Option<&Spiral> {
        self.session.spiral.as_ref()
    }

    pub fn asset(&self) -> &AssetSlot {
        &self.asset
    }

    pub fn start_session(&mut self, id: SessionId) {
        let mut counter = self.session.counter;
        counter.begin();
        self.session = SessionContext {
            id: Some(id),
            active: true,
            ..SessionContext::idle(counter)
        };
        log::info!("[placement] session {:?} started ({:?})", id, self.strategy);
    }

    /// Drop the spiral and one-shot flags; keep the last counter value.
    pub fn end_session(&mut self) {
        if let Some(id) = self.session.id {
            log::info!("[placement] session {:?} ended", id);
        }
        self.session = SessionContext::idle(self.session.counter);
    }

    /// Model load finished. A failure is terminal: stones use the fallback.
    pub fn settle_asset(&mut self, result: Result<SceneNode>) {
        self.asset = match result {
            Ok(node) => {
                let node = prepare_model(node);
                log::info!(
                    "[asset] model '{}' ready ({} meshes)",
                    node.name(),
                    node.mesh_count()
                );
                AssetSlot::Ready(Arc::new(node))
            }
            Err(e) => {
                log::error!("[asset] {}; using fallback stones", e);
                AssetSlot::Failed
            }
        };
    }

    /// Counter round trip finished. Returns false (and changes nothing) when
    /// the result belongs to a session that is no longer active.
    pub fn settle_counter(&mut self, id: SessionId, outcome: CounterOutcome) -> bool {
        if !self.session.active || self.session.id != Some(id) {
            log::info!("[placement] dropping counter result for stale session {:?}", id);
            return false;
        }
        self.session.counter.settle(outcome);
        log::info!(
            "[placement] counter resolved: remote={} stones={}",
            self.session.counter.remote_count(),
            self.session.counter.stone_count()
        );
        true
    }

    /// Frame tick: automatic placement (at most once per session), then animation.
    pub fn frame(&mut self, input: &FrameInput<'_>) -> Option<Placement> {
        if !self.session.active {
            return None;
        }
        let placed = if self.session.initial_placed {
            None
        } else {
            self.try_auto_place(input)
        };
        if let Some(spiral) = self.session.spiral.as_mut() {
            animate(spiral, input.elapsed_sec, &self.animation);
        }
        placed
    }

    fn try_auto_place(&mut self, input: &FrameInput<'_>) -> Option<Placement> {
        match self.effective_strategy() {
            PlacementStrategy::SurfaceAnchored => {
                let reticle = input.reticle;
                if !reticle.visible {
                    return None;
                }
                if !self.asset.is_settled() || !self.session.counter.is_resolved() {
                    log::debug!("[placement] surface found, waiting for model and counter");
                    return None;
                }
                let placement = self.place(
                    PlacementTrigger::Surface,
                    reticle.position,
                    Some(reticle.orientation),
                );
                self.session.initial_placed = true;
                Some(placement)
            }
            PlacementStrategy::CameraRelative => {
                if !self.asset.is_settled() || !self.session.counter.is_resolved() {
                    return None;
                }
                let camera = input.camera?;
                let placement = self.place(
                    PlacementTrigger::CameraAuto,
                    camera.point_ahead(self.distance),
                    None,
                );
                self.session.initial_placed = true;
                Some(placement)
            }
        }
    }

    /// Explicit user select. Camera-relative only (including a surface
    /// deployment that lost hit testing); ignored while the model is loading.
    pub fn select(&mut self, camera: CameraPose) -> Option<Placement> {
        if !self.session.active {
            return None;
        }
        if self.effective_strategy() == PlacementStrategy::SurfaceAnchored {
            log::debug!("[placement] select ignored: surface-anchored deployment");
            return None;
        }
        if !self.asset.is_settled() {
            log::info!("[placement] tap ignored: model not loaded yet");
            return None;
        }
        let placement = self.place(
            PlacementTrigger::Select,
            camera.point_ahead(self.distance),
            None,
        );
        self.session.initial_placed = true;
        Some(placement)
    }

    /// Build the spiral on first use, then move it. `orientation: None`
    /// keeps the current group orientation.
    fn place(
        &mut self,
        trigger: PlacementTrigger,
        position: Vec3,
        orientation: Option<Quat>,
    ) -> Placement {
        let created = self.session.spiral.is_none();
        let config = self
            .layout
            .clone()
            .with_stone_count(self.session.counter.stone_count());
        let model = self.asset.model();
        let rng = &mut self.rng;
        let spiral = self
            .session
            .spiral
            .get_or_insert_with(|| SpiralBuilder::build(&config, model, rng));
        let orientation = orientation.unwrap_or(spiral.transform().orientation);
        spiral.place(position, orientation);
        log::info!(
            "[placement] {:?}: spiral {} at ({:.2},{:.2},{:.2}) stones={}",
            trigger,
            if created { "created" } else { "moved" },
            position.x,
            position.y,
            position.z,
            spiral.len()
        );
        Placement {
            trigger,
            created,
            position,
            stones: spiral.len(),
        }
    }
}
