//! WASM bridge for Fast AI Rewrite: runs the rewrite flow inside a page.
//!
//! Compiled via `wasm-pack build --target web`. The extension's content
//! script loader imports the module and calls `mount` once per page.

mod bridge;
mod fetch;
mod logger;
pub mod markup;
mod overlay;
pub mod page;
mod runtime;
mod storage;

use rw_core::RewriteConfig;
use runtime::Runtime;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

thread_local! {
    static ACTIVE: RefCell<Option<Rc<Runtime>>> = const { RefCell::new(None) };
}

/// Handle to the mounted content script.
#[wasm_bindgen]
pub struct ContentScript {
    root_id: String,
}

#[wasm_bindgen]
impl ContentScript {
    /// `id` of the injected root container.
    #[wasm_bindgen(getter)]
    pub fn root_id(&self) -> String {
        self.root_id.clone()
    }

    /// Remove the overlay, the listeners and any pending timer.
    pub fn unmount(&self) {
        unmount();
    }
}

/// Start the rewrite flow on this page. `config_json` is a (possibly
/// partial) camelCase `RewriteConfig`; a second call replaces the first
/// instance.
#[wasm_bindgen]
pub fn mount(config_json: &str) -> Result<ContentScript, JsValue> {
    console_error_panic_hook_setup();
    logger::init(log::LevelFilter::Info);
    let config = RewriteConfig::from_json(config_json);
    logger::init(config.level_filter());

    unmount();
    let root_id = config.root_id.clone();
    let runtime = Runtime::start(config)?;
    ACTIVE.with(|active| *active.borrow_mut() = Some(runtime));
    log::info!("mounted into #{root_id}");
    Ok(ContentScript { root_id })
}

/// Tear down the running instance, if any.
#[wasm_bindgen]
pub fn unmount() {
    let running = ACTIVE.with(|active| active.borrow_mut().take());
    if let Some(runtime) = running {
        runtime.teardown();
        log::info!("unmounted");
    }
}

/// Install a panic hook that logs to the browser console.
fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("Fast AI Rewrite panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}
