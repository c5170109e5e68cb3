// Shared layout/animation tuning constants used by both web and native frontends.

// Stone count bounds and fallbacks
pub const DEFAULT_STONE_COUNT: u32 = 60; // used when the counter cannot be reached
pub const MIN_STONES: u32 = 1;
pub const MAX_STONES: u32 = 500; // bounds scene complexity
pub const COUNTER_BASE_OFFSET: i64 = 60; // stones = offset + pressCount when only pressCount is returned
pub const PERSISTED_COUNTER_DEFAULT: i64 = 60; // file-backed store value when missing/corrupt

// Spiral layout
pub const ANGLE_STEP_DEGREES: f32 = 15.0;
pub const RADIUS_STEP: f32 = 0.03;
pub const RANDOM_HEIGHT_AMPLITUDE: f32 = 0.01;
pub const SPIRAL_SCALE: f32 = 0.3; // uniform group scale
pub const MODEL_SCALE: f32 = 0.05; // applied to the loaded model root

// Placement
pub const PLACEMENT_DISTANCE: f32 = 1.2; // metres in front of the camera

// Animation
pub const ORBIT_BASE_SPEED: f32 = 0.2; // rad/s at radius 0
pub const ORBIT_SPEED_PER_RADIUS: f32 = 0.1; // outer stones move faster
pub const BOB_AMPLITUDE: f32 = 0.01;
pub const BOB_FREQUENCY: f32 = 2.0; // rad/s
pub const BOB_PHASE_PER_STONE: f32 = 0.3;
pub const SELF_ROTATION_STEP: f32 = 0.01; // rad per frame

// Fallback primitive
pub const FALLBACK_STONE_SIZE: [f32; 3] = [0.04, 0.025, 0.06];
pub const FALLBACK_STONE_COLOR: [f32; 3] = [0.467, 0.467, 0.467]; // 0x777777
pub const FALLBACK_STONE_ROUGHNESS: f32 = 0.9;
pub const FALLBACK_STONE_METALNESS: f32 = 0.1;

// Reticle ring
pub const RETICLE_INNER_RADIUS: f32 = 0.06;
pub const RETICLE_OUTER_RADIUS: f32 = 0.07;
pub const RETICLE_SEGMENTS: usize = 32;

// Lighting
pub const HEMI_SKY_COLOR: [f32; 3] = [1.0, 1.0, 1.0];
pub const HEMI_GROUND_COLOR: [f32; 3] = [0.267, 0.267, 0.267]; // 0x444444
pub const HEMI_INTENSITY: f32 = 1.0;
pub const DIR_LIGHT_INTENSITY: f32 = 0.6;
pub const DIR_LIGHT_POSITION: [f32; 3] = [1.0, 2.0, 1.0];

// Asset
pub const DEFAULT_MODEL_PATH: &str = "./assets/models/Stone.glb";

// Draw colours for stand-in geometry
pub const MODEL_PROXY_COLOR: [f32; 3] = [0.55, 0.5, 0.45]; // model-backed stones drawn as a box
pub const RETICLE_COLOR: [f32; 3] = [1.0, 1.0, 1.0];
