//! Deployment configuration. Every field has a default so an empty `{}`
//! (or no config at all) yields a working camera-relative deployment.

use crate::constants::{
    COUNTER_BASE_OFFSET, DEFAULT_MODEL_PATH, DEFAULT_STONE_COUNT, PLACEMENT_DISTANCE,
};
use crate::error::{Result, SpiralError};
use crate::spiral::SpiralConfig;
use serde::Deserialize;
use std::str::FromStr;

/// How the spiral gets anchored. Fixed per deployment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlacementStrategy {
    /// Auto-place once on the first detected surface.
    SurfaceAnchored,
    /// Auto-place once in front of the camera; taps re-place.
    #[default]
    CameraRelative,
}

impl FromStr for PlacementStrategy {
    type Err = SpiralError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "surface" | "surface-anchored" | "hit-test" => Ok(Self::SurfaceAnchored),
            "camera" | "camera-relative" => Ok(Self::CameraRelative),
            other => Err(SpiralError::Config(format!(
                "unknown placement strategy '{other}'"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CounterSettings {
    pub endpoint: Option<String>,
    pub base_offset: i64,
    pub fallback_count: i64,
}

impl Default for CounterSettings {
    fn default() -> Self {
        Self {
            endpoint: Some("/api/stone-count".to_string()),
            base_offset: COUNTER_BASE_OFFSET,
            fallback_count: DEFAULT_STONE_COUNT as i64,
        }
    }
}

impl CounterSettings {
    pub fn endpoint(&self) -> Result<&str> {
        match self.endpoint.as_deref().map(str::trim) {
            Some(e) if !e.is_empty() => Ok(e),
            _ => Err(SpiralError::ConfigMissing("counter.endpoint")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeploymentConfig {
    pub placement: PlacementStrategy,
    pub placement_distance: f32,
    pub counter: CounterSettings,
    pub model_path: String,
    pub spiral: SpiralConfig,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            placement: PlacementStrategy::default(),
            placement_distance: PLACEMENT_DISTANCE,
            counter: CounterSettings::default(),
            model_path: DEFAULT_MODEL_PATH.to_string(),
            spiral: SpiralConfig::default(),
        }
    }
}

impl DeploymentConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| SpiralError::Config(e.to_string()))
    }

    /// Parse, or log and fall back to defaults.
    pub fn from_json_or_default(text: &str) -> Self {
        Self::from_json(text).unwrap_or_else(|e| {
            log::warn!("[config] {}; using defaults", e);
            Self::default()
        })
    }
}
