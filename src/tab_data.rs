/// Per-tab navigation state and the locations returned by a lookup
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::platform::Identity;

/// Tab id as reported by the browser.
pub type TabId = i32;

/// A place where a video can be watched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub platform_name: String,
    pub platform_id: String,
    #[serde(rename = "platform_display")]
    pub display_name: String,
    #[serde(rename = "platform_watch")]
    pub watch_url: String,
    #[serde(rename = "platform_embed", default, skip_serializing_if = "Option::is_none")]
    pub embed_url: Option<String>,
}

impl Location {
    pub fn is_identity(&self, identity: &Identity) -> bool {
        self.platform_name == identity.platform_name && self.platform_id == identity.platform_id
    }
}

/// What we know about one tab since its last navigation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabState {
    pub url: Option<String>,
    pub identity: Option<Identity>,
    /// `None` until a lookup commits; an empty list means nothing was found.
    pub alternates: Option<Vec<Location>>,
    pub did_show_overlay: bool,
}

#[derive(Debug, Default)]
pub struct TabStateStore {
    tabs: HashMap<TabId, TabState>,
}

impl TabStateStore {
    pub fn new() -> Self {
        TabStateStore {
            tabs: HashMap::new(),
        }
    }

    pub fn get(&self, tab_id: TabId) -> Option<&TabState> {
        self.tabs.get(&tab_id)
    }

    fn entry(&mut self, tab_id: TabId) -> &mut TabState {
        self.tabs.entry(tab_id).or_default()
    }

    pub fn reset(&mut self, tab_id: TabId) {
        self.tabs.insert(tab_id, TabState::default());
    }

    pub fn remove(&mut self, tab_id: TabId) -> bool {
        self.tabs.remove(&tab_id).is_some()
    }

    pub fn url(&self, tab_id: TabId) -> Option<&str> {
        self.get(tab_id).and_then(|t| t.url.as_deref())
    }

    pub fn set_url(&mut self, tab_id: TabId, url: &str) {
        self.entry(tab_id).url = Some(url.to_string());
    }

    pub fn identity(&self, tab_id: TabId) -> Option<&Identity> {
        self.get(tab_id).and_then(|t| t.identity.as_ref())
    }

    pub fn set_identity(&mut self, tab_id: TabId, identity: Identity) {
        self.entry(tab_id).identity = Some(identity);
    }

    pub fn platform_name(&self, tab_id: TabId) -> Option<&str> {
        self.identity(tab_id).map(|i| i.platform_name.as_str())
    }

    pub fn alternates(&self, tab_id: TabId) -> Option<&[Location]> {
        self.get(tab_id).and_then(|t| t.alternates.as_deref())
    }

    pub fn set_alternates(&mut self, tab_id: TabId, alternates: Vec<Location>) {
        self.entry(tab_id).alternates = Some(alternates);
    }

    pub fn did_show_overlay(&self, tab_id: TabId) -> bool {
        self.get(tab_id).is_some_and(|t| t.did_show_overlay)
    }

    /// Latches until the next reset.
    pub fn set_did_show_overlay(&mut self, tab_id: TabId) {
        self.entry(tab_id).did_show_overlay = true;
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }
}
