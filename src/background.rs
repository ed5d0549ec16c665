/// Background page entry points. js/background.js forwards browser events
/// here once `start_background` has resolved.
use std::cell::RefCell;
use std::fmt::Display;
use std::rc::Rc;

use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::api::{ApiConfig, HttpLookupClient};
use crate::bridge;
use crate::browser::ChromeHost;
use crate::coordinator::Coordinator;
use crate::platform::PlatformRegistry;
use crate::preferences::PreferenceStore;
use crate::storage::ChromeStorage;
use crate::tab_data::TabId;

thread_local! {
    static COORDINATOR: RefCell<Option<Rc<Coordinator>>> = const { RefCell::new(None) };
}

fn to_js_error(error: impl Display) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn coordinator() -> Option<Rc<Coordinator>> {
    COORDINATOR.with(|slot| slot.borrow().clone())
}

fn started() -> Result<Rc<Coordinator>, JsValue> {
    coordinator().ok_or_else(|| JsValue::from_str("background has not been started"))
}

/// Spawn an event handler, dropping the event if startup hasn't finished.
fn dispatch<F, Fut>(event: &'static str, handler: F)
where
    F: FnOnce(Rc<Coordinator>) -> Fut,
    Fut: std::future::Future<Output = ()> + 'static,
{
    match coordinator() {
        Some(coordinator) => spawn_local(handler(coordinator)),
        None => log::warn!("{} before background start, ignoring", event),
    }
}

/// Load preferences and build the coordinator. `api_config` may be
/// undefined for the public lookup service.
#[wasm_bindgen]
pub async fn start_background(api_config: JsValue) -> Result<(), JsValue> {
    let config: ApiConfig = if api_config.is_undefined() || api_config.is_null() {
        ApiConfig::default()
    } else {
        serde_wasm_bindgen::from_value(api_config).map_err(to_js_error)?
    };

    let registry = PlatformRegistry::with_default_platforms().map_err(to_js_error)?;
    let preferences = PreferenceStore::load(Rc::new(ChromeStorage))
        .await
        .map_err(to_js_error)?;

    log::info!("lookups go to {}", config.host);
    let coordinator = Rc::new(Coordinator::new(
        Rc::new(registry),
        Rc::new(preferences),
        Rc::new(HttpLookupClient::new(config)),
        Rc::new(ChromeHost),
    ));
    COORDINATOR.with(|slot| *slot.borrow_mut() = Some(coordinator.clone()));

    if let Err(e) = coordinator.handle_first_run().await {
        log::warn!("first run handling failed: {}", e);
    }

    Ok(())
}

#[wasm_bindgen]
pub fn handle_navigation(tab_id: TabId, url: Option<String>) {
    dispatch("navigation", move |coordinator| async move {
        coordinator.on_navigation(tab_id, url.as_deref()).await;
    });
}

#[wasm_bindgen]
pub fn handle_reload(tab_id: TabId, url: Option<String>) {
    dispatch("reload", move |coordinator| async move {
        coordinator.on_reload(tab_id, url.as_deref()).await;
    });
}

#[wasm_bindgen]
pub fn handle_tab_closed(tab_id: TabId) {
    if let Some(coordinator) = coordinator() {
        coordinator.on_tab_closed(tab_id);
    }
}

/// Rejects on a malformed or unknown message; the port stays open.
#[wasm_bindgen]
pub async fn handle_port_message(tab_id: TabId, message: JsValue) -> Result<(), JsValue> {
    let coordinator = started()?;
    let message: Value = serde_wasm_bindgen::from_value(message).map_err(to_js_error)?;

    coordinator
        .handle_message(tab_id, &message)
        .await
        .map_err(to_js_error)
}

/// Displayable alternates for the chooser page, or null before a lookup
#[wasm_bindgen]
pub fn tab_alternates(tab_id: TabId) -> Result<JsValue, JsValue> {
    let alternates = started()?.displayable_alternates(tab_id);
    bridge::to_js(&alternates).map_err(to_js_error)
}

#[wasm_bindgen]
pub fn options_get(path: &str) -> Result<JsValue, JsValue> {
    let value = started()?.preferences().get(path).map_err(to_js_error)?;
    bridge::to_js(&value).map_err(to_js_error)
}

/// Resolves once the change is in storage.
#[wasm_bindgen]
pub async fn options_set(path: String, value: JsValue) -> Result<(), JsValue> {
    let coordinator = started()?;
    let value: Value = serde_wasm_bindgen::from_value(value).map_err(to_js_error)?;

    coordinator
        .preferences()
        .set(&path, value)
        .await
        .map_err(to_js_error)
}

#[wasm_bindgen]
pub async fn options_reset() -> Result<(), JsValue> {
    let coordinator = started()?;
    coordinator.preferences().reset().await.map_err(to_js_error)
}

/// Host patterns to request before the overlay can run on `platform_name`
#[wasm_bindgen]
pub fn watch_patterns(platform_name: &str) -> Result<JsValue, JsValue> {
    let coordinator = started()?;
    let patterns = coordinator.registry().watch_patterns(platform_name);
    bridge::to_js(&patterns).map_err(to_js_error)
}

#[wasm_bindgen]
pub fn all_watch_patterns() -> Result<JsValue, JsValue> {
    let patterns = started()?.registry().all_watch_patterns();
    bridge::to_js(&patterns).map_err(to_js_error)
}

#[wasm_bindgen]
pub fn platform_names() -> Result<JsValue, JsValue> {
    let coordinator = started()?;
    let names: Vec<&str> = coordinator.registry().names().collect();
    bridge::to_js(&names).map_err(to_js_error)
}
