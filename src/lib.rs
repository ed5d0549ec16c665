/// TubeShift - finds a video on alternative platforms
/// Background core built with Rust + WASM

pub mod api;
pub mod background;
mod bridge;
pub mod browser;
pub mod coordinator;
pub mod error;
pub mod messaging;
pub mod migrations;
pub mod operations;
pub mod platform;
pub mod preferences;
pub mod storage;
pub mod tab_data;

use wasm_bindgen::prelude::*;

use crate::platform::PlatformRegistry;

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

// Platform identity of a URL, as `{platform_name, platform_id}` or null
#[wasm_bindgen]
pub fn resolve_url(url: &str) -> Result<JsValue, JsValue> {
    let registry = PlatformRegistry::with_default_platforms()
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    bridge::to_js(&registry.resolve_str(url)).map_err(|e| JsValue::from_str(&e.to_string()))
}
