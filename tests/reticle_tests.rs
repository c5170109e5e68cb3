// Host-side tests for the hit-test handshake and reticle tracking.

use glam::{Mat4, Quat, Vec3};
use spiral_core::*;

fn ready_tracker(id: SessionId) -> ReticleTracker<()> {
    let mut t = ReticleTracker::new();
    t.begin_session(id);
    assert_eq!(t.arm(true), Some(id));
    assert!(t.handshake_complete(id, Ok(())));
    t
}

#[test]
fn arms_once_per_session_and_needs_a_frame() {
    let mut t: ReticleTracker<()> = ReticleTracker::new();
    assert_eq!(t.arm(true), None, "no session yet");

    let id = SessionId(1);
    t.begin_session(id);
    assert_eq!(t.arm(false), None);
    assert_eq!(t.phase(), HitTestPhase::Unarmed);
    assert_eq!(t.arm(true), Some(id));
    assert_eq!(t.phase(), HitTestPhase::SourceRequested);
    assert_eq!(t.arm(true), None);
}

#[test]
fn handshake_for_another_session_is_dropped() {
    let mut t: ReticleTracker<()> = ReticleTracker::new();
    t.begin_session(SessionId(2));
    t.arm(true);
    assert!(!t.handshake_complete(SessionId(1), Ok(())));
    assert_eq!(t.phase(), HitTestPhase::SourceRequested);
    assert!(t.source().is_none());
}

#[test]
fn hit_makes_reticle_visible_at_hit_pose() {
    let mut t = ready_tracker(SessionId(1));
    assert_eq!(t.phase(), HitTestPhase::SourceReady);
    assert!(!t.pose().visible);

    t.observe(Some(Mat4::from_translation(Vec3::new(1.0, 0.0, 2.0))));
    let pose = t.pose();
    assert!(pose.visible);
    assert_eq!(pose.position, Vec3::new(1.0, 0.0, 2.0));
    assert!(pose.orientation.abs_diff_eq(Quat::IDENTITY, 1e-6));
}

#[test]
fn miss_hides_reticle() {
    let mut t = ready_tracker(SessionId(1));
    t.observe(Some(Mat4::from_translation(Vec3::X)));
    t.observe(None);
    assert!(!t.pose().visible);
}

#[test]
fn hits_are_ignored_without_a_source() {
    let mut t: ReticleTracker<()> = ReticleTracker::new();
    t.begin_session(SessionId(1));
    t.observe(Some(Mat4::from_translation(Vec3::X)));
    assert!(!t.pose().visible);
}

#[test]
fn failed_handshake_is_not_retried() {
    let mut t: ReticleTracker<()> = ReticleTracker::new();
    let id = SessionId(4);
    t.begin_session(id);
    t.arm(true);
    assert!(t.handshake_complete(
        id,
        Err(SpiralError::Transport("viewer space refused".into()))
    ));
    assert!(t.is_unavailable());
    assert_eq!(t.phase(), HitTestPhase::Unarmed);
    assert_eq!(t.arm(true), None);
}

#[test]
fn ending_the_session_resets_everything() {
    let mut t = ready_tracker(SessionId(1));
    t.observe(Some(Mat4::from_translation(Vec3::Y)));
    t.end_session();
    assert!(t.source().is_none());
    assert!(!t.pose().visible);
    assert_eq!(t.arm(true), None);

    let next = SessionId(2);
    t.begin_session(next);
    assert_eq!(t.arm(true), Some(next));
}
