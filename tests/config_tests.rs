// Host-side tests for deployment configuration.
// The web crate is wasm-only, so its pure query/config module is included directly.

#![allow(dead_code)]
mod query {
    include!("../src/query.rs");
}

use query::*;
use spiral_core::*;

#[test]
fn empty_config_uses_defaults() {
    let config = DeploymentConfig::from_json("{}").unwrap();
    assert_eq!(config, DeploymentConfig::default());
    assert_eq!(config.placement, PlacementStrategy::CameraRelative);
    assert_eq!(config.placement_distance, 1.2);
    assert_eq!(config.counter.base_offset, 60);
    assert_eq!(config.counter.fallback_count, 60);
    assert_eq!(config.model_path, "./assets/models/Stone.glb");
    assert_eq!(config.spiral.stone_count, 60);
}

#[test]
fn camel_case_fields_override_defaults() {
    let config = DeploymentConfig::from_json(
        r#"{
            "placement": "surface-anchored",
            "placementDistance": 2.0,
            "counter": { "endpoint": "https://example.test/count", "baseOffset": 10 },
            "modelPath": "/m.glb",
            "spiral": { "angleStepDegrees": 30, "radiusStep": 0.05 }
        }"#,
    )
    .unwrap();
    assert_eq!(config.placement, PlacementStrategy::SurfaceAnchored);
    assert_eq!(config.placement_distance, 2.0);
    assert_eq!(config.counter.endpoint(), Ok("https://example.test/count"));
    assert_eq!(config.counter.base_offset, 10);
    assert_eq!(config.counter.fallback_count, 60);
    assert_eq!(config.model_path, "/m.glb");
    assert_eq!(config.spiral.angle_step_degrees, 30.0);
    assert_eq!(config.spiral.radius_step, 0.05);
    assert_eq!(config.spiral.scale, 0.3);
}

#[test]
fn malformed_config_is_an_error_or_default() {
    assert!(matches!(
        DeploymentConfig::from_json("{ nope"),
        Err(SpiralError::Config(_))
    ));
    assert!(matches!(
        DeploymentConfig::from_json(r#"{"placement":"orbit"}"#),
        Err(SpiralError::Config(_))
    ));
    assert_eq!(
        DeploymentConfig::from_json_or_default("nonsense"),
        DeploymentConfig::default()
    );
}

#[test]
fn strategy_names_parse() {
    for name in ["surface", "Surface-Anchored", "hit-test"] {
        assert_eq!(
            name.parse::<PlacementStrategy>(),
            Ok(PlacementStrategy::SurfaceAnchored)
        );
    }
    for name in ["camera", "camera-relative"] {
        assert_eq!(
            name.parse::<PlacementStrategy>(),
            Ok(PlacementStrategy::CameraRelative)
        );
    }
    assert!("floor".parse::<PlacementStrategy>().is_err());
}

#[test]
fn query_param_lookup() {
    assert_eq!(query_param("?placement=surface&x=1", "placement"), Some("surface"));
    assert_eq!(query_param("x=1&placement=camera", "placement"), Some("camera"));
    assert_eq!(query_param("?flag&x=1", "flag"), Some(""));
    assert_eq!(query_param("", "placement"), None);
    assert_eq!(query_param("?placements=surface", "placement"), None);
}

#[test]
fn query_overrides_embedded_config() {
    let embedded = r#"{"placement":"camera-relative","modelPath":"/s.glb"}"#;
    let config = resolve_config(Some(embedded), "?placement=surface", "placement");
    assert_eq!(config.placement, PlacementStrategy::SurfaceAnchored);
    assert_eq!(config.model_path, "/s.glb");

    let config = resolve_config(Some(embedded), "?placement=sideways", "placement");
    assert_eq!(config.placement, PlacementStrategy::CameraRelative);
}

#[test]
fn missing_or_blank_script_gives_defaults() {
    assert_eq!(
        resolve_config(None, "", "placement"),
        DeploymentConfig::default()
    );
    assert_eq!(
        resolve_config(Some("   \n"), "", "placement"),
        DeploymentConfig::default()
    );
}
