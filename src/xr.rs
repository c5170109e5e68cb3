//! WebXR session plumbing: session lifecycle, the hit-test handshake and the
//! XR animation-frame loop feeding `SpiralSession`.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use glam::Mat4;
use rand::rngs::StdRng;
use spiral_core::{
    draw_list, CameraPose, CounterClient, CounterOutcome, DeploymentConfig, SessionId,
    SpiralError, SpiralSession,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys as web;

use crate::constants::{
    DEPTH_FAR, DEPTH_NEAR, ENTER_AR_BUTTON_ID, MS_TO_SEC, STATUS_ELEMENT_ID,
    XR_OPTIONAL_FEATURES, XR_REQUIRED_FEATURES,
};
use crate::counter::FetchCounter;
use crate::dom;
use crate::render::{EyeView, GlRenderer};

// Hit-test module bindings (not part of web-sys' core WebXR set).
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(
        extends = js_sys::Object,
        js_name = XRHitTestSource,
        typescript_type = "XRHitTestSource"
    )]
    #[derive(Clone, Debug)]
    pub type XrHitTestSource;

    #[wasm_bindgen(method)]
    pub fn cancel(this: &XrHitTestSource);

    #[wasm_bindgen(
        extends = js_sys::Object,
        js_name = XRHitTestResult,
        typescript_type = "XRHitTestResult"
    )]
    #[derive(Clone, Debug)]
    pub type XrHitTestResult;

    #[wasm_bindgen(method, js_name = getPose)]
    fn get_pose(this: &XrHitTestResult, base_space: &web::XrSpace) -> Option<web::XrPose>;

    #[wasm_bindgen(method, catch, js_name = requestHitTestSource)]
    fn request_hit_test_source(
        this: &web::XrSession,
        options: &js_sys::Object,
    ) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(method, js_name = getHitTestResults)]
    fn get_hit_test_results(this: &web::XrFrame, source: &XrHitTestSource) -> js_sys::Array;
}

pub fn js_object(entries: &[(&str, JsValue)]) -> js_sys::Object {
    let obj = js_sys::Object::new();
    for (key, value) in entries {
        _ = js_sys::Reflect::set(&obj, &JsValue::from_str(key), value);
    }
    obj
}

fn js_string_array(items: &[&str]) -> js_sys::Array {
    items.iter().map(|s| JsValue::from_str(s)).collect()
}

fn js_err(context: &str, e: JsValue) -> anyhow::Error {
    anyhow::anyhow!("{context}: {:?}", e)
}

fn rigid_matrix(transform: &web::XrRigidTransform) -> Mat4 {
    Mat4::from_cols_slice(&transform.matrix())
}

pub type CoreSession = SpiralSession<XrHitTestSource, StdRng>;

type FrameLoop = Rc<RefCell<Option<Closure<dyn FnMut(f64, web::XrFrame)>>>>;

/// The live WebXR session, its spaces and the callbacks bound to it.
struct ActiveXr {
    id: SessionId,
    session: web::XrSession,
    local: web::XrReferenceSpace,
    frame_loop: FrameLoop,
    _listeners: Vec<Closure<dyn FnMut(web::Event)>>,
}

pub struct XrHost {
    config: DeploymentConfig,
    core: RefCell<CoreSession>,
    renderer: GlRenderer,
    active: RefCell<Option<ActiveXr>>,
    last_camera: Cell<Option<CameraPose>>,
    started_ms: Cell<Option<f64>>,
}

pub async fn ar_supported() -> bool {
    let Some(window) = web::window() else {
        return false;
    };
    let navigator = window.navigator();
    if !js_sys::Reflect::has(&navigator, &JsValue::from_str("xr")).unwrap_or(false) {
        return false;
    }
    JsFuture::from(
        navigator
            .xr()
            .is_session_supported(web::XrSessionMode::ImmersiveAr),
    )
    .await
    .ok()
    .and_then(|v| v.as_bool())
    .unwrap_or(false)
}

impl XrHost {
    pub fn new(config: DeploymentConfig, core: CoreSession, renderer: GlRenderer) -> Rc<Self> {
        Rc::new(Self {
            config,
            core: RefCell::new(core),
            renderer,
            active: RefCell::new(None),
            last_camera: Cell::new(None),
            started_ms: Cell::new(None),
        })
    }

    pub fn core(&self) -> &RefCell<CoreSession> {
        &self.core
    }

    /// Enter-AR button: start a session, or end the running one.
    pub fn toggle(self: &Rc<Self>) {
        let running = self.active.borrow().as_ref().map(|a| a.session.clone());
        match running {
            Some(session) => {
                _ = session.end();
            }
            None => {
                let host = self.clone();
                spawn_local(async move {
                    if let Err(e) = host.start().await {
                        log::error!("[xr] could not start session: {:?}", e);
                        if let Some(doc) = dom::window_document() {
                            dom::set_text(&doc, STATUS_ELEMENT_ID, "AR session failed to start");
                        }
                    }
                });
            }
        }
    }

    async fn start(self: Rc<Self>) -> anyhow::Result<()> {
        let window = web::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| anyhow::anyhow!("no document"))?;

        let mut init: Vec<(&str, JsValue)> = vec![
            ("requiredFeatures", js_string_array(XR_REQUIRED_FEATURES).into()),
            ("optionalFeatures", js_string_array(XR_OPTIONAL_FEATURES).into()),
        ];
        if let Some(body) = document.body() {
            init.push(("domOverlay", js_object(&[("root", body.into())]).into()));
        }
        let init: web::XrSessionInit = js_object(&init).unchecked_into();
        let session: web::XrSession = JsFuture::from(
            window
                .navigator()
                .xr()
                .request_session_with_options(web::XrSessionMode::ImmersiveAr, &init),
        )
        .await
        .map_err(|e| js_err("requestSession", e))?
        .dyn_into()
        .map_err(|e| js_err("XRSession", e))?;

        let layer =
            web::XrWebGlLayer::new_with_web_gl2_rendering_context(&session, self.renderer.context())
                .map_err(|e| js_err("XRWebGLLayer", e))?;
        let render_state: web::XrRenderStateInit = js_object(&[
            ("baseLayer", layer.into()),
            ("depthNear", DEPTH_NEAR.into()),
            ("depthFar", DEPTH_FAR.into()),
        ])
        .unchecked_into();
        session.update_render_state_with_state(&render_state);

        let local: web::XrReferenceSpace = JsFuture::from(
            session.request_reference_space(web::XrReferenceSpaceType::Local),
        )
        .await
        .map_err(|e| js_err("local reference space", e))?
        .dyn_into()
        .map_err(|e| js_err("XRReferenceSpace", e))?;

        let id = self.core.borrow_mut().begin();
        log::info!(
            "[xr] session {:?} started ({:?})",
            id,
            self.core.borrow().controller().strategy()
        );
        let frame_loop: FrameLoop = Rc::new(RefCell::new(None));
        *self.active.borrow_mut() = Some(ActiveXr {
            id,
            session: session.clone(),
            local,
            frame_loop: frame_loop.clone(),
            _listeners: self.wire_session_events(&session, id),
        });
        self.started_ms.set(None);
        dom::set_text(&document, STATUS_ELEMENT_ID, "");
        dom::set_text(&document, ENTER_AR_BUTTON_ID, "Exit AR");

        self.fetch_counter(id);
        self.start_frame_loop(&session, id, &frame_loop);
        Ok(())
    }

    /// One increment per session start, settled under the session id.
    fn fetch_counter(self: &Rc<Self>, id: SessionId) {
        let endpoint = match self.config.counter.endpoint() {
            Ok(e) => e.to_string(),
            Err(e) => {
                log::warn!("[counter] {}; using the fallback count", e);
                self.core
                    .borrow_mut()
                    .counter_settled(id, CounterOutcome::Failed);
                return;
            }
        };
        let base_offset = self.config.counter.base_offset;
        let host = self.clone();
        spawn_local(async move {
            let client = CounterClient::new(FetchCounter::new(endpoint), base_offset);
            let outcome = client.fetch().await;
            if !host.core.borrow_mut().counter_settled(id, outcome) {
                log::debug!("[counter] dropped result for stale {:?}", id);
            }
        });
    }

    /// `end` and `select` listeners; they live as long as the session's `ActiveXr`.
    fn wire_session_events(
        self: &Rc<Self>,
        session: &web::XrSession,
        id: SessionId,
    ) -> Vec<Closure<dyn FnMut(web::Event)>> {
        let host = self.clone();
        let on_end = Closure::wrap(Box::new(move |_e: web::Event| {
            host.on_session_end(id);
        }) as Box<dyn FnMut(web::Event)>);
        _ = session.add_event_listener_with_callback("end", on_end.as_ref().unchecked_ref());

        let host = self.clone();
        let on_select = Closure::wrap(Box::new(move |_e: web::Event| {
            let Some(camera) = host.last_camera.get() else {
                return;
            };
            if let Some(p) = host.core.borrow_mut().select(camera) {
                log::info!("[placement] moved to {:?}", p.position);
            }
        }) as Box<dyn FnMut(web::Event)>);
        _ = session.add_event_listener_with_callback("select", on_select.as_ref().unchecked_ref());
        vec![on_end, on_select]
    }

    fn on_session_end(&self, id: SessionId) {
        let ended = {
            let mut slot = self.active.borrow_mut();
            if slot.as_ref().map(|a| a.id) != Some(id) {
                return;
            }
            slot.take()
        };
        if let Some(source) = self.core.borrow().hit_test_source() {
            source.cancel();
        }
        self.core.borrow_mut().end();
        if let Some(active) = ended {
            // breaks the closure's reference to its own slot
            active.frame_loop.borrow_mut().take();
        }
        self.last_camera.set(None);
        log::info!("[xr] session {:?} ended", id);
        if let Some(doc) = dom::window_document() {
            dom::set_text(&doc, ENTER_AR_BUTTON_ID, "Enter AR");
        }
    }

    fn start_frame_loop(
        self: &Rc<Self>,
        session: &web::XrSession,
        id: SessionId,
        tick: &FrameLoop,
    ) {
        let tick_clone = tick.clone();
        let host = self.clone();
        *tick.borrow_mut() = Some(Closure::wrap(Box::new(move |time: f64, frame: web::XrFrame| {
            if !host.core.borrow().is_current(id) {
                return;
            }
            if let Some(cb) = tick_clone.borrow().as_ref() {
                frame
                    .session()
                    .request_animation_frame(cb.as_ref().unchecked_ref());
            }
            host.frame(time, &frame);
        }) as Box<dyn FnMut(f64, web::XrFrame)>));
        if let Some(cb) = tick.borrow().as_ref() {
            session.request_animation_frame(cb.as_ref().unchecked_ref());
        }
    }

    /// Viewer reference space, then a hit-test source from it.
    fn request_hit_test(self: &Rc<Self>, session: web::XrSession, id: SessionId) {
        let host = self.clone();
        spawn_local(async move {
            let result = acquire_hit_test_source(&session).await;
            if let Err(e) = &result {
                log::warn!("[reticle] {}", e);
            }
            let source = result.as_ref().ok().cloned();
            if !host.core.borrow_mut().hit_test_ready(id, result) {
                if let Some(source) = source {
                    source.cancel();
                }
            }
        });
    }

    fn frame(self: &Rc<Self>, time_ms: f64, frame: &web::XrFrame) {
        let (id, session, local) = match self.active.borrow().as_ref() {
            Some(a) => (a.id, a.session.clone(), a.local.clone()),
            None => return,
        };
        let start = self.started_ms.get().unwrap_or(time_ms);
        self.started_ms.set(Some(start));
        let elapsed_sec = ((time_ms - start) * MS_TO_SEC) as f32;

        let armed = self.core.borrow_mut().arm_hit_test(true);
        if let Some(armed) = armed {
            debug_assert_eq!(armed, id);
            self.request_hit_test(session.clone(), armed);
        }

        let viewer_pose = frame.get_viewer_pose(&local);
        let camera = viewer_pose
            .as_ref()
            .map(|p| CameraPose::from_matrix(&rigid_matrix(&p.transform())));
        self.last_camera.set(camera);

        let hit = self.core.borrow().hit_test_source().and_then(|source| {
            let results = frame.get_hit_test_results(source);
            let first: XrHitTestResult = results.get(0).dyn_into().ok()?;
            let pose = first.get_pose(&local)?;
            Some(rigid_matrix(&pose.transform()))
        });

        let placed = self.core.borrow_mut().frame(hit, camera, elapsed_sec);
        if let Some(p) = placed {
            log::info!(
                "[placement] {:?}: {} stones at {:?}",
                p.trigger,
                p.stones,
                p.position
            );
        }

        let Some(pose) = viewer_pose else {
            return;
        };
        let Some(layer) = session.render_state().base_layer() else {
            return;
        };
        let gl = self.renderer.context();
        gl.bind_framebuffer(web::WebGl2RenderingContext::FRAMEBUFFER, layer.framebuffer().as_ref());

        let eyes: Vec<EyeView> = pose
            .views()
            .iter()
            .filter_map(|v| v.dyn_into::<web::XrView>().ok())
            .filter_map(|view| {
                let vp = layer.get_viewport(&view)?;
                let proj = Mat4::from_cols_slice(&view.projection_matrix());
                let view_m = rigid_matrix(&view.transform().inverse());
                Some(EyeView {
                    viewport: [vp.x(), vp.y(), vp.width(), vp.height()],
                    view_proj: proj * view_m,
                })
            })
            .collect();

        let core = self.core.borrow();
        let items = draw_list(core.spiral(), core.reticle().pose());
        self.renderer.draw(&eyes, &items);
    }
}

async fn acquire_hit_test_source(session: &web::XrSession) -> spiral_core::Result<XrHitTestSource> {
    let unavailable = |e: JsValue| SpiralError::HitTestUnavailable(format!("{:?}", e));
    let viewer: web::XrReferenceSpace = JsFuture::from(
        session.request_reference_space(web::XrReferenceSpaceType::Viewer),
    )
    .await
    .map_err(unavailable)?
    .dyn_into()
    .map_err(unavailable)?;
    let options = js_object(&[("space", viewer.into())]);
    let promise = session.request_hit_test_source(&options).map_err(unavailable)?;
    JsFuture::from(promise)
        .await
        .map_err(unavailable)?
        .dyn_into::<XrHitTestSource>()
        .map_err(unavailable)
}
