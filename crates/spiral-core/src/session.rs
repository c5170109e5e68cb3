//! One AR session end to end: reticle tracking + placement + animation, with
//! every asynchronous completion tagged by the session it was issued for.

use crate::config::{DeploymentConfig, PlacementStrategy};
use crate::counter::CounterOutcome;
use crate::error::Result;
use crate::placement::{CameraPose, FrameInput, Placement, PlacementController};
use crate::reticle::ReticleTracker;
use crate::scene::SceneNode;
use crate::spiral::Spiral;
use glam::Mat4;
use rand::Rng;

/// Generation number of an AR session. Async results carry the id they were
/// issued under and are discarded once that session is gone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

pub struct SpiralSession<S, R> {
    controller: PlacementController<R>,
    reticle: ReticleTracker<S>,
    current: Option<SessionId>,
    next_id: u64,
}

impl<S, R: Rng> SpiralSession<S, R> {
    pub fn new(config: &DeploymentConfig, rng: R) -> Self {
        Self::with_controller(PlacementController::new(config, rng))
    }

    pub fn with_controller(controller: PlacementController<R>) -> Self {
        Self {
            controller,
            reticle: ReticleTracker::new(),
            current: None,
            next_id: 1,
        }
    }

    /// Start a session. The host must issue exactly one counter request
    /// tagged with the returned id.
    pub fn begin(&mut self) -> SessionId {
        if self.current.is_some() {
            self.end();
        }
        let id = SessionId(self.next_id);
        self.next_id += 1;
        self.current = Some(id);
        self.controller.start_session(id);
        self.reticle.begin_session(id);
        id
    }

    pub fn end(&mut self) {
        self.current = None;
        self.reticle.end_session();
        self.controller.end_session();
    }

    pub fn current(&self) -> Option<SessionId> {
        self.current
    }

    pub fn is_current(&self, id: SessionId) -> bool {
        self.current == Some(id)
    }

    pub fn asset_loaded(&mut self, result: Result<SceneNode>) {
        self.controller.settle_asset(result);
    }

    pub fn counter_settled(&mut self, id: SessionId, outcome: CounterOutcome) -> bool {
        self.controller.settle_counter(id, outcome)
    }

    /// Surface-anchored deployments need a hit-test source; returns the
    /// session to start the handshake for, once.
    pub fn arm_hit_test(&mut self, has_frame: bool) -> Option<SessionId> {
        if self.controller.strategy() != PlacementStrategy::SurfaceAnchored {
            return None;
        }
        self.reticle.arm(has_frame)
    }

    pub fn hit_test_ready(&mut self, id: SessionId, result: Result<S>) -> bool {
        let applied = self.reticle.handshake_complete(id, result);
        if applied && self.reticle.is_unavailable() {
            self.controller.hit_test_unavailable();
        }
        applied
    }

    pub fn hit_test_source(&self) -> Option<&S> {
        self.reticle.source()
    }

    /// Per-frame entry point. `hit` is the first hit-test result of the frame
    /// in the reference space, `camera` the viewer pose.
    pub fn frame(
        &mut self,
        hit: Option<Mat4>,
        camera: Option<CameraPose>,
        elapsed_sec: f32,
    ) -> Option<Placement> {
        if self.current.is_none() {
            return None;
        }
        self.reticle.observe(hit);
        let input = FrameInput {
            reticle: self.reticle.pose(),
            camera,
            elapsed_sec,
        };
        self.controller.frame(&input)
    }

    pub fn select(&mut self, camera: CameraPose) -> Option<Placement> {
        self.controller.select(camera)
    }

    pub fn spiral(&self) -> Option<&Spiral> {
        self.controller.spiral()
    }

    pub fn reticle(&self) -> &ReticleTracker<S> {
        &self.reticle
    }

    pub fn controller(&self) -> &PlacementController<R> {
        &self.controller
    }
}
