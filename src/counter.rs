use spiral_core::{CounterTransport, HttpReply, Result, SpiralError};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys as web;

fn transport_err(context: &str, e: impl std::fmt::Debug) -> SpiralError {
    SpiralError::Transport(format!("{context}: {e:?}"))
}

/// Counter collaborator reached over `fetch`.
pub struct FetchCounter {
    endpoint: String,
}

impl FetchCounter {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    async fn send(&self, method: &str) -> Result<HttpReply> {
        let window = web::window().ok_or_else(|| transport_err("fetch", "no window"))?;
        let init = web::RequestInit::new();
        init.set_method(method);
        init.set_mode(web::RequestMode::Cors);
        let request = web::Request::new_with_str_and_init(&self.endpoint, &init)
            .map_err(|e| transport_err("building request", e))?;
        let _ = request.headers().set("Accept", "application/json");

        let resp_value = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(|e| transport_err("fetch", e))?;
        let resp: web::Response = resp_value
            .dyn_into()
            .map_err(|e| transport_err("response", e))?;
        let text_promise = resp.text().map_err(|e| transport_err("body", e))?;
        let body = JsFuture::from(text_promise)
            .await
            .map_err(|e| transport_err("body", e))?
            .as_string()
            .unwrap_or_default();
        Ok(HttpReply {
            status: resp.status(),
            body,
        })
    }
}

impl CounterTransport for FetchCounter {
    async fn increment(&self) -> Result<HttpReply> {
        self.send("POST").await
    }

    async fn read(&self) -> Result<HttpReply> {
        self.send("GET").await
    }
}
