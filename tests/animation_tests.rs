// Host-side tests for the whirlpool animation.

use rand::rngs::StdRng;
use rand::SeedableRng;
use spiral_core::*;

fn spiral(n: u32) -> Spiral {
    SpiralBuilder::build(
        &SpiralConfig::default().with_stone_count(n),
        None,
        &mut StdRng::seed_from_u64(8),
    )
}

#[test]
fn outer_stones_orbit_faster() {
    let params = AnimationParams::default();
    let mut last = params.orbit_speed(0.0);
    assert!((last - 0.2).abs() < 1e-6);
    for i in 1..20 {
        let speed = params.orbit_speed(i as f32 * RADIUS_STEP);
        assert!(speed > last);
        last = speed;
    }
}

#[test]
fn centre_stone_only_bobs() {
    let params = AnimationParams::default();
    let mut s = spiral(5);
    let base = s.stones()[0].base_height;
    for t in [0.0, 0.7, 3.0, 12.5] {
        animate(&mut s, t, &params);
        let p = s.poses()[0].position;
        assert!(p.x.abs() < 1e-6 && p.z.abs() < 1e-6, "t={t}");
        assert!((p.y - base).abs() <= BOB_AMPLITUDE + 1e-6);
    }
}

#[test]
fn positions_follow_orbit_and_bob() {
    let params = AnimationParams::default();
    let mut s = spiral(30);
    let t = 4.0;
    animate(&mut s, t, &params);
    for (i, (stone, pose)) in s.stones().iter().zip(s.poses()).enumerate() {
        let angle = stone.base_angle + t * (0.2 + stone.radius * 0.1);
        let bob = (t * 2.0 + i as f32 * 0.3).sin() * 0.01;
        assert!((pose.position.x - angle.cos() * stone.radius).abs() < 1e-4);
        assert!((pose.position.z - angle.sin() * stone.radius).abs() < 1e-4);
        assert!((pose.position.y - (stone.base_height + bob)).abs() < 1e-5);
    }
}

#[test]
fn positions_depend_only_on_time() {
    let params = AnimationParams::default();
    let mut a = spiral(12);
    let mut b = spiral(12);
    animate(&mut a, 1.0, &params);
    animate(&mut a, 5.0, &params);
    animate(&mut b, 5.0, &params);
    for (pa, pb) in a.poses().iter().zip(b.poses()) {
        assert!(pa.position.abs_diff_eq(pb.position, 1e-6));
    }
}

#[test]
fn self_rotation_advances_each_frame() {
    let params = AnimationParams::default();
    let mut s = spiral(3);
    let start: Vec<f32> = s.poses().iter().map(|p| p.rotation_y).collect();
    for frame in 0..10 {
        animate(&mut s, frame as f32 / 60.0, &params);
    }
    for (p, r0) in s.poses().iter().zip(start) {
        assert!((p.rotation_y - (r0 + 10.0 * SELF_ROTATION_STEP)).abs() < 1e-5);
    }
}
