//! `RewriteApi` over the browser's `fetch`.

use rw_core::api::{Agent, ApproveRequest, Endpoint, GenerateRequest, GenerateResponse};
use rw_core::{RemoteCallKind, RewriteError};
use rw_editor::RewriteApi;
use serde::de::DeserializeOwned;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, Response};

/// Talks to the rewrite service at `base`.
pub struct FetchApi {
    base: String,
}

impl FetchApi {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    async fn send(
        &self,
        endpoint: Endpoint,
        kind: RemoteCallKind,
        token: &str,
        body: Option<String>,
    ) -> Result<String, RewriteError> {
        let fail = |e: JsValue| RewriteError::remote(kind, describe(&e));

        let init = RequestInit::new();
        init.set_method(endpoint.method());
        if let Some(body) = &body {
            init.set_body(&JsValue::from_str(body));
        }
        let request = Request::new_with_str_and_init(&endpoint.url(&self.base), &init).map_err(fail)?;
        let headers = request.headers();
        headers
            .set("Authorization", &format!("Bearer {token}"))
            .map_err(fail)?;
        if body.is_some() {
            headers.set("Content-Type", "application/json").map_err(fail)?;
        }

        let window = web_sys::window().ok_or_else(|| RewriteError::remote(kind, "no window"))?;
        let response: Response = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(fail)?
            .dyn_into()
            .map_err(fail)?;
        if !response.ok() {
            return Err(RewriteError::remote(kind, format!("HTTP {}", response.status())));
        }
        let text = JsFuture::from(response.text().map_err(fail)?)
            .await
            .map_err(fail)?;
        Ok(text.as_string().unwrap_or_default())
    }
}

fn parse<T: DeserializeOwned>(kind: RemoteCallKind, body: &str) -> Result<T, RewriteError> {
    serde_json::from_str(body).map_err(|e| RewriteError::remote(kind, format!("bad response: {e}")))
}

/// Best-effort message out of a thrown JS value.
pub(crate) fn describe(value: &JsValue) -> String {
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    value
        .as_string()
        .unwrap_or_else(|| "unknown error".to_string())
}

impl RewriteApi for FetchApi {
    async fn list_agents(&self, token: &str) -> Result<Vec<Agent>, RewriteError> {
        let kind = RemoteCallKind::ListAgents;
        let body = self.send(Endpoint::ListAgents, kind, token, None).await?;
        parse(kind, &body)
    }

    async fn generate(
        &self,
        token: &str,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse, RewriteError> {
        let kind = RemoteCallKind::Generate;
        let json = serde_json::to_string(request)
            .map_err(|e| RewriteError::remote(kind, e.to_string()))?;
        let body = self.send(Endpoint::Generate, kind, token, Some(json)).await?;
        parse(kind, &body)
    }

    async fn mark_approved(&self, token: &str, request: &ApproveRequest) -> Result<(), RewriteError> {
        let kind = RemoteCallKind::MarkApproved;
        let json = serde_json::to_string(request)
            .map_err(|e| RewriteError::remote(kind, e.to_string()))?;
        self.send(Endpoint::MarkApproved, kind, token, Some(json))
            .await
            .map(|_| ())
    }
}
