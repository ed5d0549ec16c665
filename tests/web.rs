//! Runs in a browser with `wasm-pack test --headless --chrome`
#![cfg(target_arch = "wasm32")]

use serde_json::{Value, json};
use wasm_bindgen_test::*;

use tubeshift::resolve_url;

wasm_bindgen_test_configure!(run_in_browser);

fn resolve(url: &str) -> Value {
    let resolved = resolve_url(url).unwrap();
    serde_wasm_bindgen::from_value(resolved).unwrap()
}

#[wasm_bindgen_test]
fn test_resolve_url_youtube() {
    assert_eq!(
        resolve("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
        json!({ "platform_name": "youtube", "platform_id": "dQw4w9WgXcQ" })
    );
}

#[wasm_bindgen_test]
fn test_resolve_url_bitchute() {
    assert_eq!(
        resolve("https://www.bitchute.com/video/abc123/"),
        json!({ "platform_name": "bitchute", "platform_id": "abc123" })
    );
}

#[wasm_bindgen_test]
fn test_resolve_url_not_a_video() {
    assert_eq!(resolve("https://www.youtube.com/"), Value::Null);
    assert_eq!(resolve("not a url"), Value::Null);
}

#[wasm_bindgen_test]
fn test_exports_need_start() {
    assert!(tubeshift::background::tab_alternates(1).is_err());
    assert!(tubeshift::background::platform_names().is_err());
}
