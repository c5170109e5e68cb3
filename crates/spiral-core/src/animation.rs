use crate::constants::{
    BOB_AMPLITUDE, BOB_FREQUENCY, BOB_PHASE_PER_STONE, ORBIT_BASE_SPEED, ORBIT_SPEED_PER_RADIUS,
    SELF_ROTATION_STEP,
};
use crate::spiral::{Spiral, StoneRecord};
use glam::Vec3;

/// Whirlpool motion parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationParams {
    pub base_speed: f32,
    pub speed_per_radius: f32,
    pub bob_amplitude: f32,
    pub bob_frequency: f32,
    pub bob_phase_per_stone: f32,
    pub self_rotation_step: f32,
}

impl Default for AnimationParams {
    fn default() -> Self {
        Self {
            base_speed: ORBIT_BASE_SPEED,
            speed_per_radius: ORBIT_SPEED_PER_RADIUS,
            bob_amplitude: BOB_AMPLITUDE,
            bob_frequency: BOB_FREQUENCY,
            bob_phase_per_stone: BOB_PHASE_PER_STONE,
            self_rotation_step: SELF_ROTATION_STEP,
        }
    }
}

impl AnimationParams {
    /// Angular speed (rad/s) of a stone at `radius`; grows linearly outward.
    #[inline]
    pub fn orbit_speed(&self, radius: f32) -> f32 {
        self.base_speed + radius * self.speed_per_radius
    }

    /// Spiral-local position of stone `index` at `elapsed_sec`.
    pub fn stone_position(&self, stone: &StoneRecord, index: usize, elapsed_sec: f32) -> Vec3 {
        let angle = stone.base_angle + elapsed_sec * self.orbit_speed(stone.radius);
        let bob = (elapsed_sec * self.bob_frequency + index as f32 * self.bob_phase_per_stone)
            .sin()
            * self.bob_amplitude;
        Vec3::new(
            angle.cos() * stone.radius,
            stone.base_height + bob,
            angle.sin() * stone.radius,
        )
    }
}

/// Advance every stone of `spiral` to `elapsed_sec`. Positions are a pure
/// function of time; the self-rotation integrates one step per call.
pub fn animate(spiral: &mut Spiral, elapsed_sec: f32, params: &AnimationParams) {
    let (stones, poses) = spiral.records_and_poses_mut();
    for (index, (stone, pose)) in stones.iter().zip(poses.iter_mut()).enumerate() {
        pose.position = params.stone_position(stone, index, elapsed_sec);
        pose.rotation_y += params.self_rotation_step;
    }
}
