use spiral_core::{scene_from_glb, ModelLoader, Result, SceneNode, SpiralError};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys as web;

/// Fetches `.glb` assets relative to the page.
pub struct FetchModelLoader;

impl ModelLoader for FetchModelLoader {
    async fn load(&self, path: &str) -> Result<SceneNode> {
        let fail = |reason: String| SpiralError::AssetLoad {
            path: path.to_string(),
            reason,
        };
        let window = web::window().ok_or_else(|| fail("no window".into()))?;
        let resp: web::Response = JsFuture::from(window.fetch_with_str(path))
            .await
            .map_err(|e| fail(format!("{e:?}")))?
            .dyn_into()
            .map_err(|e| fail(format!("{e:?}")))?;
        if !resp.ok() {
            return Err(fail(format!("status {}", resp.status())));
        }
        let buffer = resp.array_buffer().map_err(|e| fail(format!("{e:?}")))?;
        let buffer = JsFuture::from(buffer)
            .await
            .map_err(|e| fail(format!("{e:?}")))?;
        let bytes = js_sys::Uint8Array::new(&buffer).to_vec();
        log::info!("[asset] fetched {} ({} bytes)", path, bytes.len());
        scene_from_glb(path, &bytes)
    }
}
