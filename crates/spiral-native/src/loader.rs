use spiral_core::{scene_from_glb, ModelLoader, Result, SceneNode, SpiralError};

/// Reads `.glb` files from the local filesystem.
pub struct FileModelLoader;

impl ModelLoader for FileModelLoader {
    async fn load(&self, path: &str) -> Result<SceneNode> {
        let bytes = std::fs::read(path).map_err(|e| SpiralError::AssetLoad {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        scene_from_glb(path, &bytes)
    }
}
