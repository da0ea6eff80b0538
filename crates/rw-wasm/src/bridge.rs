//! Session bridge: where the login token comes from.
//!
//! The extension's background worker answers `{ action: "getToken" }` with
//! `{ token }` (or `{ error }` when the user is logged out). A page of the
//! rewrite service may also hand the token over directly with
//! `window.postMessage({ type: "FAST_AI_AUTH_TOKEN", token })`, and ask
//! whether one is present with `CHECK_FAST_AI_AUTH_TOKEN`.

use js_sys::{Object, Promise, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

pub const TOKEN_MESSAGE: &str = "FAST_AI_AUTH_TOKEN";
pub const CHECK_MESSAGE: &str = "CHECK_FAST_AI_AUTH_TOKEN";
pub const STATUS_MESSAGE: &str = "FAST_AI_AUTH_TOKEN_STATUS";

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ["chrome", "runtime"], js_name = sendMessage, catch)]
    fn send_runtime_message(message: &JsValue) -> Result<Promise, JsValue>;
}

/// Ask the background worker for the session token.
///
/// Any failure (no extension context, worker asleep, `{ error }` reply)
/// reads as logged out.
pub async fn fetch_token() -> Option<String> {
    let message = Object::new();
    Reflect::set(&message, &"action".into(), &"getToken".into()).ok()?;
    let promise = match send_runtime_message(&message) {
        Ok(p) => p,
        Err(e) => {
            log::debug!("runtime messaging unavailable: {}", crate::fetch::describe(&e));
            return None;
        }
    };
    let reply = match JsFuture::from(promise).await {
        Ok(reply) => reply,
        Err(e) => {
            log::warn!("token request failed: {}", crate::fetch::describe(&e));
            return None;
        }
    };
    string_field(&reply, "token").filter(|t| !t.is_empty())
}

/// A `window` message relevant to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum PageMessage {
    /// The page pushed a token.
    Token(Option<String>),
    /// The page asks whether a token is available.
    Check,
}

/// Classify the `data` of a `message` event.
pub fn classify(data: &JsValue) -> Option<PageMessage> {
    match string_field(data, "type")?.as_str() {
        TOKEN_MESSAGE => Some(PageMessage::Token(string_field(data, "token"))),
        CHECK_MESSAGE => Some(PageMessage::Check),
        _ => None,
    }
}

/// Answer a `CHECK_FAST_AI_AUTH_TOKEN` message.
pub fn post_status(window: &web_sys::Window, available: bool) {
    let reply = Object::new();
    let set = Reflect::set(&reply, &"type".into(), &STATUS_MESSAGE.into())
        .and_then(|_| Reflect::set(&reply, &"isAvailable".into(), &available.into()));
    if set.is_err() || window.post_message(&reply, "*").is_err() {
        log::warn!("could not answer token status check");
    }
}

fn string_field(value: &JsValue, key: &str) -> Option<String> {
    if !value.is_object() {
        return None;
    }
    Reflect::get(value, &JsValue::from_str(key))
        .ok()
        .and_then(|v| v.as_string())
}
