// Host-side tests for stand-in geometry and the per-frame draw list.

use glam::{Mat4, Vec3};
use rand::rngs::StdRng;
use rand::SeedableRng;
use spiral_core::*;
use std::sync::Arc;

#[test]
fn box_mesh_is_a_closed_unit_cube() {
    let mesh = box_mesh();
    assert_eq!(mesh.len(), 36);
    for v in &mesh {
        assert!(v.pos.iter().all(|c| c.abs() <= 0.5 + 1e-6));
        let n = Vec3::from(v.normal);
        assert!((n.length() - 1.0).abs() < 1e-6);
        // every vertex lies on the face its normal points at
        assert!((Vec3::from(v.pos).dot(n) - 0.5).abs() < 1e-6);
    }
}

#[test]
fn reticle_ring_spans_inner_to_outer_radius() {
    let ring = reticle_mesh();
    assert_eq!(ring.len(), RETICLE_SEGMENTS * 6);
    for v in &ring {
        assert_eq!(v.pos[1], 0.0);
        assert_eq!(v.normal, [0.0, 1.0, 0.0]);
        let r = (v.pos[0] * v.pos[0] + v.pos[2] * v.pos[2]).sqrt();
        assert!(r >= RETICLE_INNER_RADIUS - 1e-5 && r <= RETICLE_OUTER_RADIUS + 1e-5);
    }
    assert_eq!(ring_mesh(0.1, 0.2, 1).len(), 18, "at least three segments");
}

#[test]
fn draw_list_has_one_box_per_stone_and_ring_when_visible() {
    let mut rng = StdRng::seed_from_u64(4);
    let spiral = SpiralBuilder::build(&SpiralConfig::default().with_stone_count(9), None, &mut rng);

    let hidden = ReticlePose::default();
    let items = draw_list(Some(&spiral), &hidden);
    assert_eq!(items.len(), 9);
    assert!(items.iter().all(|i| i.shape == DrawShape::Box));
    assert!(items.iter().all(|i| i.color == FALLBACK_STONE_COLOR));

    let visible = ReticlePose::from_matrix(Mat4::from_translation(Vec3::new(0.0, -1.0, -1.0)));
    let items = draw_list(Some(&spiral), &visible);
    assert_eq!(items.len(), 10);
    let ring = items.last().unwrap();
    assert_eq!(ring.shape, DrawShape::Ring);
    assert_eq!(ring.model, visible.matrix);

    assert_eq!(draw_list(None, &visible).len(), 1);
    assert!(draw_list(None, &hidden).is_empty());
}

#[test]
fn fallback_boxes_are_sized_by_the_primitive() {
    let mut rng = StdRng::seed_from_u64(4);
    let spiral = SpiralBuilder::build(&SpiralConfig::default().with_stone_count(1), None, &mut rng);
    let item = draw_list(Some(&spiral), &ReticlePose::default())[0];
    let (scale, _, _) = item.model.to_scale_rotation_translation();
    let expected = Vec3::from(FALLBACK_STONE_SIZE) * SPIRAL_SCALE;
    assert!(scale.abs_diff_eq(expected, 1e-5));
}

#[test]
fn model_backed_stones_use_proxy_colour() {
    let model = Arc::new(prepare_model(SceneNode::mesh("Rock")));
    let mut rng = StdRng::seed_from_u64(4);
    let spiral = SpiralBuilder::build(
        &SpiralConfig::default().with_stone_count(3),
        Some(model),
        &mut rng,
    );
    let items = draw_list(Some(&spiral), &ReticlePose::default());
    assert!(items.iter().all(|i| i.color == MODEL_PROXY_COLOR));
}
