use crate::constants::{
    ANGLE_STEP_DEGREES, DEFAULT_STONE_COUNT, MAX_STONES, MIN_STONES, RADIUS_STEP,
    RANDOM_HEIGHT_AMPLITUDE, SPIRAL_SCALE,
};
use crate::scene::{AssetRef, FallbackPrimitive, SceneNode, Transform};
use glam::{Mat4, Quat, Vec3};
use rand::Rng;
use serde::Deserialize;
use std::f32::consts::PI;
use std::sync::Arc;

/// Layout parameters of one spiral.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpiralConfig {
    pub stone_count: u32,
    pub angle_step_degrees: f32,
    pub radius_step: f32,
    pub random_height_amplitude: f32,
    pub scale: f32,
}

impl Default for SpiralConfig {
    fn default() -> Self {
        Self {
            stone_count: DEFAULT_STONE_COUNT,
            angle_step_degrees: ANGLE_STEP_DEGREES,
            radius_step: RADIUS_STEP,
            random_height_amplitude: RANDOM_HEIGHT_AMPLITUDE,
            scale: SPIRAL_SCALE,
        }
    }
}

impl SpiralConfig {
    pub fn with_stone_count(mut self, stone_count: u32) -> Self {
        self.stone_count = stone_count;
        self
    }

    pub fn angle_step_radians(&self) -> f32 {
        self.angle_step_degrees.to_radians()
    }
}

/// Clamp any remote/requested count into the supported range.
pub fn clamp_stone_count(requested: i64) -> u32 {
    requested.clamp(MIN_STONES as i64, MAX_STONES as i64) as u32
}

/// Static per-stone parameters, fixed at build time.
#[derive(Clone, Debug)]
pub struct StoneRecord {
    pub base_angle: f32,
    pub radius: f32,
    pub base_height: f32,
    pub initial_rotation_y: f32,
    pub asset: AssetRef,
}

/// Live per-stone transform in spiral-local space, rewritten every frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StonePose {
    pub position: Vec3,
    pub rotation_y: f32,
}

#[derive(Clone, Debug)]
pub struct Spiral {
    config: SpiralConfig,
    stones: Vec<StoneRecord>,
    poses: Vec<StonePose>,
    transform: Transform,
}

impl Spiral {
    pub fn config(&self) -> &SpiralConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.stones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stones.is_empty()
    }

    pub fn stones(&self) -> &[StoneRecord] {
        &self.stones
    }

    pub fn poses(&self) -> &[StonePose] {
        &self.poses
    }

    pub(crate) fn records_and_poses_mut(&mut self) -> (&[StoneRecord], &mut [StonePose]) {
        (&self.stones, &mut self.poses)
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Move the group. Scale stays at the configured spiral scale.
    pub fn place(&mut self, position: Vec3, orientation: Quat) {
        self.transform.position = position;
        self.transform.orientation = orientation;
    }

    /// World matrix of stone `index` (group transform * local pose).
    pub fn stone_matrix(&self, index: usize) -> Option<Mat4> {
        let pose = self.poses.get(index)?;
        let local =
            Mat4::from_rotation_translation(Quat::from_rotation_y(pose.rotation_y), pose.position);
        Some(self.transform.matrix() * local)
    }
}

pub struct SpiralBuilder;

impl SpiralBuilder {
    /// Lay out `config.stone_count` stones (clamped) along an Archimedean
    /// spiral. Angle and radius are exact in the index; height offset and
    /// initial rotation come from `rng`.
    pub fn build<R: Rng + ?Sized>(
        config: &SpiralConfig,
        model: Option<Arc<SceneNode>>,
        rng: &mut R,
    ) -> Spiral {
        let count = clamp_stone_count(config.stone_count as i64) as usize;
        let step = config.angle_step_radians();
        let amplitude = config.random_height_amplitude.abs();
        let fallback = FallbackPrimitive::default();

        let mut stones = Vec::with_capacity(count);
        let mut poses = Vec::with_capacity(count);
        for i in 0..count {
            let base_angle = i as f32 * step;
            let radius = i as f32 * config.radius_step;
            let base_height = (rng.gen::<f32>() * 2.0 - 1.0) * amplitude;
            let initial_rotation_y = (rng.gen::<f32>() - 0.5) * PI;
            let asset = match &model {
                Some(node) => AssetRef::Model(node.clone()),
                None => AssetRef::Fallback(fallback),
            };
            poses.push(StonePose {
                position: Vec3::new(
                    radius * base_angle.cos(),
                    base_height,
                    radius * base_angle.sin(),
                ),
                rotation_y: initial_rotation_y,
            });
            stones.push(StoneRecord {
                base_angle,
                radius,
                base_height,
                initial_rotation_y,
                asset,
            });
        }
        log::info!(
            "[spiral] built stones={} (requested={}) fallback={}",
            count,
            config.stone_count,
            model.is_none()
        );

        Spiral {
            config: config.clone(),
            stones,
            poses,
            transform: Transform {
                scale: Vec3::splat(config.scale),
                ..Transform::default()
            },
        }
    }
}
