//! Stand-in geometry shared by the renderers: a unit box for stones and a
//! flat ring for the reticle, plus the per-frame list of what to draw.

use crate::constants::{
    MODEL_PROXY_COLOR, RETICLE_COLOR, RETICLE_INNER_RADIUS, RETICLE_OUTER_RADIUS,
    RETICLE_SEGMENTS,
};
use crate::reticle::ReticlePose;
use crate::scene::AssetRef;
use crate::spiral::Spiral;
use glam::{Mat4, Vec3};

/// Interleaved position + normal, laid out for direct upload.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
}

/// Unit cube centred on the origin, 36 vertices with flat normals.
pub fn box_mesh() -> Vec<MeshVertex> {
    let faces: [(Vec3, Vec3, Vec3); 6] = [
        (Vec3::X, Vec3::Y, Vec3::Z),
        (Vec3::NEG_X, Vec3::Y, Vec3::NEG_Z),
        (Vec3::Y, Vec3::Z, Vec3::X),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::Y, Vec3::X),
    ];
    let mut out = Vec::with_capacity(36);
    for (n, u, v) in faces {
        let c = n * 0.5;
        let corners = [
            c - u * 0.5 - v * 0.5,
            c + u * 0.5 - v * 0.5,
            c + u * 0.5 + v * 0.5,
            c - u * 0.5 + v * 0.5,
        ];
        for i in [0, 1, 2, 0, 2, 3] {
            out.push(MeshVertex {
                pos: corners[i].to_array(),
                normal: n.to_array(),
            });
        }
    }
    out
}

/// Annulus in the local XZ plane facing +Y, two triangles per segment.
pub fn ring_mesh(inner: f32, outer: f32, segments: usize) -> Vec<MeshVertex> {
    let segments = segments.max(3);
    let step = std::f32::consts::TAU / segments as f32;
    let at = |r: f32, a: f32| [r * a.cos(), 0.0, r * a.sin()];
    let mut out = Vec::with_capacity(segments * 6);
    for i in 0..segments {
        let (a0, a1) = (i as f32 * step, (i + 1) as f32 * step);
        let quad = [at(inner, a0), at(outer, a0), at(outer, a1), at(inner, a1)];
        for k in [0, 1, 2, 0, 2, 3] {
            out.push(MeshVertex {
                pos: quad[k],
                normal: [0.0, 1.0, 0.0],
            });
        }
    }
    out
}

pub fn reticle_mesh() -> Vec<MeshVertex> {
    ring_mesh(RETICLE_INNER_RADIUS, RETICLE_OUTER_RADIUS, RETICLE_SEGMENTS)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawShape {
    Box,
    Ring,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawItem {
    pub shape: DrawShape,
    pub model: Mat4,
    pub color: [f32; 3],
}

/// Everything visible this frame: one box per stone, then the reticle ring
/// while a surface is tracked.
pub fn draw_list(spiral: Option<&Spiral>, reticle: &ReticlePose) -> Vec<DrawItem> {
    let mut items = Vec::with_capacity(spiral.map_or(0, Spiral::len) + 1);
    if let Some(spiral) = spiral {
        for (i, stone) in spiral.stones().iter().enumerate() {
            let Some(world) = spiral.stone_matrix(i) else {
                continue;
            };
            let (size, color) = match &stone.asset {
                AssetRef::Fallback(prim) => (prim.size, prim.color),
                // pebble proportioned by the model root scale
                AssetRef::Model(node) => (node.scale() * Vec3::new(1.0, 0.6, 1.0), MODEL_PROXY_COLOR),
            };
            items.push(DrawItem {
                shape: DrawShape::Box,
                model: world * Mat4::from_scale(size),
                color,
            });
        }
    }
    if reticle.visible {
        items.push(DrawItem {
            shape: DrawShape::Ring,
            model: reticle.matrix,
            color: RETICLE_COLOR,
        });
    }
    items
}
