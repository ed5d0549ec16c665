/// JS bridge to the browser extension APIs (see js/bridge.js)

use serde::Serialize;
use wasm_bindgen::prelude::*;

// Import JS bridge functions
#[wasm_bindgen(module = "/js/bridge.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    pub async fn storageGet(key: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    pub async fn storageSet(key: &str, value: JsValue) -> Result<(), JsValue>;

    /// Resolves to `{ status, body }`; rejects on network failure or timeout.
    #[wasm_bindgen(catch)]
    pub async fn fetchText(url: &str, timeout_ms: u32) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    pub async fn showAvailable(tab_id: i32, count: u32) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    pub async fn showActive(tab_id: i32) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    pub async fn showInactive(tab_id: i32) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    pub async fn containsHosts(patterns: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    pub async fn sendTabMessage(tab_id: i32, message: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    pub async fn updateTabUrl(tab_id: i32, url: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    pub async fn createTab(url: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    pub async fn openOptionsPage() -> Result<(), JsValue>;
}

/// Best effort text for a rejected JS promise
pub fn js_error_message(error: &JsValue) -> String {
    if let Some(error) = error.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }

    error.as_string().unwrap_or_else(|| format!("{:?}", error))
}

/// Plain JS objects rather than `Map`s, so the browser APIs accept the result
pub fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, serde_wasm_bindgen::Error> {
    value.serialize(&serde_wasm_bindgen::Serializer::json_compatible())
}
