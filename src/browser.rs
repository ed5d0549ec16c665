/// Browser facilities the coordinator drives: badge, host permissions, tab
/// ports and navigation

use async_trait::async_trait;

use crate::bridge;
use crate::messaging::OutboundMessage;
use crate::tab_data::TabId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("{call} failed: {message}")]
    Call { call: &'static str, message: String },
    #[error("could not encode {0}")]
    Encode(String),
}

impl HostError {
    fn call(call: &'static str, error: &wasm_bindgen::JsValue) -> Self {
        HostError::Call {
            call,
            message: bridge::js_error_message(error),
        }
    }
}

/// Toolbar badge for a tab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeState {
    Inactive,
    Active,
    Available(usize),
}

#[async_trait(?Send)]
pub trait BrowserHost {
    async fn show_badge(&self, tab_id: TabId, badge: BadgeState) -> Result<(), HostError>;

    /// Whether every pattern is already granted as a host permission.
    async fn contains_hosts(&self, patterns: &[String]) -> Result<bool, HostError>;

    async fn send_tab_message(
        &self,
        tab_id: TabId,
        message: &OutboundMessage,
    ) -> Result<(), HostError>;

    async fn navigate_tab(&self, tab_id: TabId, url: &str) -> Result<(), HostError>;

    /// Open the full alternates chooser for a tab.
    async fn open_chooser(&self, tab_id: TabId) -> Result<(), HostError>;

    async fn open_options_page(&self) -> Result<(), HostError>;
}

pub fn chooser_path(tab_id: TabId) -> String {
    format!("/popup.html?tab={}", tab_id)
}

/// The extension background page, via js/bridge.js
#[derive(Debug, Default)]
pub struct ChromeHost;

#[async_trait(?Send)]
impl BrowserHost for ChromeHost {
    async fn show_badge(&self, tab_id: TabId, badge: BadgeState) -> Result<(), HostError> {
        let result = match badge {
            BadgeState::Inactive => bridge::showInactive(tab_id).await,
            BadgeState::Active => bridge::showActive(tab_id).await,
            BadgeState::Available(count) => {
                let count = u32::try_from(count).unwrap_or(u32::MAX);
                bridge::showAvailable(tab_id, count).await
            }
        };

        result.map_err(|e| HostError::call("badge", &e))
    }

    async fn contains_hosts(&self, patterns: &[String]) -> Result<bool, HostError> {
        let patterns_js =
            bridge::to_js(patterns).map_err(|_| HostError::Encode("host patterns".to_string()))?;

        let granted = bridge::containsHosts(patterns_js)
            .await
            .map_err(|e| HostError::call("permissions.contains", &e))?;

        Ok(granted.as_bool().unwrap_or(false))
    }

    async fn send_tab_message(
        &self,
        tab_id: TabId,
        message: &OutboundMessage,
    ) -> Result<(), HostError> {
        let message_js =
            bridge::to_js(message).map_err(|e| HostError::Encode(e.to_string()))?;

        bridge::sendTabMessage(tab_id, message_js)
            .await
            .map_err(|e| HostError::call("port.postMessage", &e))
    }

    async fn navigate_tab(&self, tab_id: TabId, url: &str) -> Result<(), HostError> {
        bridge::updateTabUrl(tab_id, url)
            .await
            .map_err(|e| HostError::call("tabs.update", &e))
    }

    async fn open_chooser(&self, tab_id: TabId) -> Result<(), HostError> {
        bridge::createTab(&chooser_path(tab_id))
            .await
            .map_err(|e| HostError::call("tabs.create", &e))
    }

    async fn open_options_page(&self) -> Result<(), HostError> {
        bridge::openOptionsPage()
            .await
            .map_err(|e| HostError::call("runtime.openOptionsPage", &e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chooser_path() {
        assert_eq!(chooser_path(42), "/popup.html?tab=42");
    }
}
