//! Surface reticle driven by per-frame hit-test results.
//!
//! The tracker is generic over the host's hit-test source handle `S` so the
//! WebXR frontend can store an `XrHitTestSource` and tests can use `()`.

use crate::error::{Result, SpiralError};
use crate::session::SessionId;
use glam::{Mat4, Quat, Vec3};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReticlePose {
    pub position: Vec3,
    pub orientation: Quat,
    pub visible: bool,
    pub matrix: Mat4,
}

impl Default for ReticlePose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            visible: false,
            matrix: Mat4::IDENTITY,
        }
    }
}

impl ReticlePose {
    /// Visible pose from a hit matrix. Scale is kept in `matrix` only.
    pub fn from_matrix(matrix: Mat4) -> Self {
        let (_scale, orientation, position) = matrix.to_scale_rotation_translation();
        Self {
            position,
            orientation,
            visible: true,
            matrix,
        }
    }
}

/// Handshake phase, without the source handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HitTestPhase {
    Unarmed,
    SourceRequested,
    SourceReady,
}

enum HitTestState<S> {
    Unarmed,
    SourceRequested,
    SourceReady(S),
}

pub struct ReticleTracker<S> {
    state: HitTestState<S>,
    session: Option<SessionId>,
    unavailable: bool,
    pose: ReticlePose,
}

impl<S> Default for ReticleTracker<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> ReticleTracker<S> {
    pub fn new() -> Self {
        Self {
            state: HitTestState::Unarmed,
            session: None,
            unavailable: false,
            pose: ReticlePose::default(),
        }
    }

    pub fn begin_session(&mut self, id: SessionId) {
        self.reset();
        self.session = Some(id);
    }

    /// Drop the source and any pending handshake.
    pub fn end_session(&mut self) {
        if self.session.is_some() {
            log::info!("[reticle] session ended, hit-test reset");
        }
        self.reset();
    }

    fn reset(&mut self) {
        self.state = HitTestState::Unarmed;
        self.session = None;
        self.unavailable = false;
        self.pose = ReticlePose::default();
    }

    /// Called every frame. Returns the session the caller must start the
    /// viewer-space + hit-test-source handshake for; `None` on every later
    /// frame of the session.
    pub fn arm(&mut self, has_frame: bool) -> Option<SessionId> {
        let session = self.session?;
        if !has_frame || self.unavailable || !matches!(self.state, HitTestState::Unarmed) {
            return None;
        }
        self.state = HitTestState::SourceRequested;
        log::info!("[reticle] requesting viewer space + hit-test source");
        Some(session)
    }

    /// Post the handshake result. Results for another session are dropped;
    /// returns whether the result was applied.
    pub fn handshake_complete(&mut self, session: SessionId, result: Result<S>) -> bool {
        if self.session != Some(session) || !matches!(self.state, HitTestState::SourceRequested) {
            log::info!("[reticle] dropping stale hit-test handshake");
            return false;
        }
        match result {
            Ok(source) => {
                self.state = HitTestState::SourceReady(source);
                log::info!("[reticle] hit-test source ready");
            }
            Err(e) => {
                let e = if matches!(e, SpiralError::HitTestUnavailable(_)) {
                    e
                } else {
                    SpiralError::HitTestUnavailable(e.to_string())
                };
                log::warn!("[reticle] {}", e);
                self.state = HitTestState::Unarmed;
                self.unavailable = true;
            }
        }
        true
    }

    pub fn source(&self) -> Option<&S> {
        match &self.state {
            HitTestState::SourceReady(s) => Some(s),
            HitTestState::Unarmed | HitTestState::SourceRequested => None,
        }
    }

    /// Record this frame's first hit (already in the reference space), or a miss.
    pub fn observe(&mut self, hit: Option<Mat4>) {
        if self.source().is_none() {
            self.pose.visible = false;
            return;
        }
        match hit {
            Some(m) => self.pose = ReticlePose::from_matrix(m),
            None => self.pose.visible = false,
        }
    }

    pub fn pose(&self) -> &ReticlePose {
        &self.pose
    }

    pub fn phase(&self) -> HitTestPhase {
        match self.state {
            HitTestState::Unarmed => HitTestPhase::Unarmed,
            HitTestState::SourceRequested => HitTestPhase::SourceRequested,
            HitTestState::SourceReady(_) => HitTestPhase::SourceReady,
        }
    }

    /// Handshake failed this session; camera-relative placement is the only path.
    pub fn is_unavailable(&self) -> bool {
        self.unavailable
    }
}
