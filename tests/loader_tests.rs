// Host-side tests for the model loading seam and binary glTF validation.

use pollster::block_on;
use spiral_core::*;
use std::path::Path;

fn glb(json: &str) -> Vec<u8> {
    let mut body = json.as_bytes().to_vec();
    while body.len() % 4 != 0 {
        body.push(b' ');
    }
    let total = 12 + 8 + body.len();
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(b"glTF");
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(body.len() as u32).to_le_bytes());
    out.extend_from_slice(&0x4E4F_534Au32.to_le_bytes());
    out.extend_from_slice(&body);
    out
}

struct DirLoader<'a>(&'a Path);

impl ModelLoader for DirLoader<'_> {
    async fn load(&self, path: &str) -> Result<SceneNode> {
        let bytes = std::fs::read(self.0.join(path)).map_err(|e| SpiralError::AssetLoad {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        scene_from_glb(path, &bytes)
    }
}

const STONE_JSON: &str = r#"{"scene":0,"scenes":[{"nodes":[0]}],
    "nodes":[{"name":"Stone","mesh":0,"children":[1]},{"name":"Chip","mesh":1}]}"#;

#[test]
fn loads_hierarchy_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("Stone.glb"), glb(STONE_JSON)).unwrap();
    let node = block_on(DirLoader(dir.path()).load("Stone.glb")).unwrap();
    assert_eq!(node.mesh_count(), 2);
    assert_eq!(node.name(), "Stone.glb");
}

#[test]
fn missing_file_is_an_asset_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = block_on(DirLoader(dir.path()).load("Nope.glb")).unwrap_err();
    assert!(matches!(err, SpiralError::AssetLoad { ref path, .. } if path == "Nope.glb"));
}

#[test]
fn rejects_non_json_first_chunk() {
    let mut bytes = glb("{}");
    bytes[16..20].copy_from_slice(&0x004E_4942u32.to_le_bytes());
    assert!(matches!(
        scene_from_glb("bin.glb", &bytes),
        Err(SpiralError::AssetLoad { .. })
    ));
}

#[test]
fn scenes_without_roots_fall_back_to_all_nodes() {
    let scene = scene_from_glb("flat.glb", &glb(r#"{"nodes":[{"mesh":0},{"mesh":1}]}"#)).unwrap();
    assert_eq!(scene.mesh_count(), 2);
}

#[test]
fn failed_load_still_lets_stones_appear() {
    let dir = tempfile::tempdir().unwrap();
    let result = block_on(DirLoader(dir.path()).load("Stone.glb"));
    let mut session: SpiralSession<(), rand::rngs::StdRng> = SpiralSession::new(
        &DeploymentConfig::default(),
        rand::SeedableRng::seed_from_u64(1),
    );
    let id = session.begin();
    session.asset_loaded(result);
    assert!(session.controller().asset().is_settled());
    session.counter_settled(id, CounterOutcome::Fetched(4));
    session.frame(None, Some(CameraPose::default()), 0.0).unwrap();
    assert!(session
        .spiral()
        .unwrap()
        .stones()
        .iter()
        .all(|s| s.asset.is_fallback()));
}
