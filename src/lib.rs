#![cfg(target_arch = "wasm32")]
use rand::rngs::StdRng;
use rand::SeedableRng;
use spiral_core::{DeploymentConfig, ModelLoader, SpiralSession};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

mod constants;
mod counter;
mod dom;
mod loader;
mod query;
mod render;
mod xr;

use constants::{
    CANVAS_ID, CONFIG_SCRIPT_ID, ENTER_AR_BUTTON_ID, PLACEMENT_QUERY_KEY, STATUS_ELEMENT_ID,
};

fn read_config(document: &web::Document) -> DeploymentConfig {
    let script = dom::script_text(document, CONFIG_SCRIPT_ID);
    let config = query::resolve_config(
        script.as_deref(),
        &dom::location_search(),
        PLACEMENT_QUERY_KEY,
    );
    log::info!(
        "[config] placement={:?} stones(default)={} model={}",
        config.placement,
        config.counter.fallback_count,
        config.model_path
    );
    config
}

/// XR-compatible WebGL2 context on an offscreen canvas.
fn create_gl(document: &web::Document) -> anyhow::Result<web::WebGl2RenderingContext> {
    let canvas: web::HtmlCanvasElement = document
        .create_element("canvas")
        .map_err(|e| anyhow::anyhow!("{:?}", e))?
        .dyn_into()
        .map_err(|e| anyhow::anyhow!("{:?}", e))?;
    canvas.set_id(CANVAS_ID);
    let options = xr::js_object(&[
        ("xrCompatible", JsValue::TRUE),
        ("alpha", JsValue::TRUE),
        ("antialias", JsValue::TRUE),
    ]);
    canvas
        .get_context_with_context_options("webgl2", &options)
        .map_err(|e| anyhow::anyhow!("{:?}", e))?
        .ok_or_else(|| anyhow::anyhow!("WebGL2 unavailable"))?
        .dyn_into::<web::WebGl2RenderingContext>()
        .map_err(|e| anyhow::anyhow!("{:?}", e))
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("stone-spiral-web starting");

    spawn_local(async move {
        if let Err(e) = init().await {
            log::error!("init error: {:?}", e);
        }
    });
    Ok(())
}

async fn init() -> anyhow::Result<()> {
    let window = web::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| anyhow::anyhow!("no document"))?;

    let config = read_config(&document);
    let gl = create_gl(&document)?;
    let renderer = render::GlRenderer::new(gl)?;
    let core = SpiralSession::new(&config, StdRng::from_entropy());
    let model_path = config.model_path.clone();
    let host = xr::XrHost::new(config, core, renderer);

    // The model loads once per page; sessions share the result.
    {
        let host = host.clone();
        spawn_local(async move {
            let result = loader::FetchModelLoader.load(&model_path).await;
            if let Err(e) = &result {
                log::warn!("[asset] {}; stones fall back to boxes", e);
            }
            host.core().borrow_mut().asset_loaded(result);
        });
    }

    if !xr::ar_supported().await {
        log::warn!("[xr] immersive-ar not supported");
        dom::set_text(&document, STATUS_ELEMENT_ID, "AR is not supported on this device");
        dom::set_hidden(&document, ENTER_AR_BUTTON_ID, true);
        return Ok(());
    }

    let wired = dom::add_click_listener(&document, ENTER_AR_BUTTON_ID, move || host.toggle());
    if !wired {
        return Err(anyhow::anyhow!("missing #{ENTER_AR_BUTTON_ID}"));
    }
    Ok(())
}
