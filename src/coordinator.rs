/// Per-tab navigation state machine: resolve, look up, filter, notify.
///
/// A tab is Inactive with no resolved platform, Active once a platform is
/// resolved but nothing is displayable, and Available(n) when n alternates
/// survive the display filter.
use std::cell::{Ref, RefCell};
use std::rc::Rc;

use serde_json::Value;

use crate::api::{LookupClient, LookupStatus};
use crate::browser::{BadgeState, BrowserHost};
use crate::messaging::{InboundMessage, OutboundMessage, ProtocolError};
use crate::operations;
use crate::platform::{Identity, PlatformRegistry};
use crate::preferences::{PreferenceStore, PreferencesError};
use crate::tab_data::{Location, TabId, TabStateStore};

pub struct Coordinator {
    registry: Rc<PlatformRegistry>,
    preferences: Rc<PreferenceStore>,
    lookup: Rc<dyn LookupClient>,
    host: Rc<dyn BrowserHost>,
    tabs: RefCell<TabStateStore>,
}

impl Coordinator {
    pub fn new(
        registry: Rc<PlatformRegistry>,
        preferences: Rc<PreferenceStore>,
        lookup: Rc<dyn LookupClient>,
        host: Rc<dyn BrowserHost>,
    ) -> Self {
        Coordinator {
            registry,
            preferences,
            lookup,
            host,
            tabs: RefCell::new(TabStateStore::new()),
        }
    }

    pub fn registry(&self) -> &PlatformRegistry {
        &self.registry
    }

    pub fn preferences(&self) -> &PreferenceStore {
        &self.preferences
    }

    pub fn tabs(&self) -> Ref<'_, TabStateStore> {
        self.tabs.borrow()
    }

    /// A tab loaded or was activated. Safe to repeat for an unchanged URL.
    pub async fn on_navigation(&self, tab_id: TabId, url: Option<&str>) {
        let Some(url) = url.filter(|url| !url.is_empty()) else {
            return;
        };

        let changed = self.tabs.borrow().url(tab_id) != Some(url);
        if changed {
            log::debug!("tab {} navigated to {}", tab_id, url);
            {
                let mut tabs = self.tabs.borrow_mut();
                tabs.reset(tab_id);
                tabs.set_url(tab_id, url);
            }

            if let Some(identity) = self.registry.resolve_str(url) {
                self.on_watch_event(tab_id, identity).await;
            }
        }

        self.update_notification(tab_id).await;
    }

    pub async fn on_watch_event(&self, tab_id: TabId, identity: Identity) {
        let allowed = self.preferences.read(|p| {
            p.enable_anonymous_data_collection && p.lookup_enabled(&identity.platform_name)
        });
        if !allowed {
            log::debug!(
                "lookup for {} skipped by preferences",
                identity.platform_name
            );
            return;
        }

        self.tabs.borrow_mut().set_identity(tab_id, identity.clone());
        self.update_notification(tab_id).await;

        let status = self
            .lookup
            .fetch_video_by_platform(&identity.platform_name, &identity.platform_id)
            .await;

        match status {
            Ok(LookupStatus::Known(video)) => {
                let alternates = operations::remove_identity(video.locations, &identity);

                {
                    let mut tabs = self.tabs.borrow_mut();
                    if tabs.identity(tab_id) != Some(&identity) {
                        log::warn!(
                            "discarding stale lookup for {}/{} on tab {}",
                            identity.platform_name,
                            identity.platform_id,
                            tab_id
                        );
                        return;
                    }
                    log::debug!("tab {} has {} alternates", tab_id, alternates.len());
                    tabs.set_alternates(tab_id, alternates);
                }

                self.update_notification(tab_id).await;
            }
            Ok(LookupStatus::Unknown) => {
                log::debug!(
                    "{}/{} is not known",
                    identity.platform_name,
                    identity.platform_id
                );
            }
            Ok(LookupStatus::Error(message)) => {
                log::warn!(
                    "lookup for {}/{} returned an error: {}",
                    identity.platform_name,
                    identity.platform_id,
                    message.as_deref().unwrap_or("no message")
                );
            }
            Err(e) => {
                log::warn!(
                    "lookup for {}/{} failed: {}",
                    identity.platform_name,
                    identity.platform_id,
                    e
                );
            }
        }
    }

    pub fn on_tab_closed(&self, tab_id: TabId) {
        if self.tabs.borrow_mut().remove(tab_id) {
            log::debug!("tab {} closed", tab_id);
        }
    }

    pub async fn on_reload(&self, tab_id: TabId, url: Option<&str>) {
        self.tabs.borrow_mut().reset(tab_id);
        self.on_navigation(tab_id, url).await;
    }

    /// Recompute the badge and tell the overlay. The overlay latch is set
    /// before the first await so a concurrent update can't show it twice.
    pub async fn update_notification(&self, tab_id: TabId) {
        let (badge, message) = {
            let mut tabs = self.tabs.borrow_mut();

            match tabs.platform_name(tab_id).map(str::to_string) {
                None => (BadgeState::Inactive, Some(OutboundMessage::Inactive)),
                Some(platform_name) => {
                    let alternates = tabs
                        .alternates(tab_id)
                        .map(|alternates| alternates.to_vec())
                        .unwrap_or_default();
                    let shown = self
                        .preferences
                        .read(|p| operations::displayable(alternates, p));

                    if shown.is_empty() {
                        (BadgeState::Active, Some(OutboundMessage::Active))
                    } else if !tabs.did_show_overlay(tab_id)
                        && self.preferences.read(|p| p.overlay_enabled(&platform_name))
                    {
                        tabs.set_did_show_overlay(tab_id);
                        let config = self.preferences.read(|p| p.overlay_config.clone());
                        let message = OutboundMessage::Available {
                            count: shown.len(),
                            config,
                        };
                        (BadgeState::Available(shown.len()), Some(message))
                    } else {
                        (BadgeState::Available(shown.len()), None)
                    }
                }
            }
        };

        self.show_badge(tab_id, badge).await;
        if let Some(message) = message {
            self.deliver(tab_id, &message).await;
        }
    }

    async fn show_badge(&self, tab_id: TabId, badge: BadgeState) {
        if let Err(e) = self.host.show_badge(tab_id, badge).await {
            log::warn!("could not set badge for tab {}: {}", tab_id, e);
        }
    }

    /// Silently skipped when the tab's platform has no watch patterns or
    /// its host permission isn't granted.
    async fn deliver(&self, tab_id: TabId, message: &OutboundMessage) {
        let patterns = {
            let tabs = self.tabs.borrow();
            let Some(platform_name) = tabs.platform_name(tab_id) else {
                return;
            };
            match self.registry.watch_patterns(platform_name) {
                Some(patterns) => patterns.to_vec(),
                None => return,
            }
        };

        match self.host.contains_hosts(&patterns).await {
            Ok(true) => {}
            Ok(false) => {
                log::debug!("no host permission for tab {}, not messaging", tab_id);
                return;
            }
            Err(e) => {
                log::warn!("permission check for tab {} failed: {}", tab_id, e);
                return;
            }
        }

        if let Err(e) = self.host.send_tab_message(tab_id, message).await {
            log::warn!("could not message tab {}: {}", tab_id, e);
        }
    }

    pub async fn on_message(&self, tab_id: TabId, message: InboundMessage) {
        match message {
            InboundMessage::OverlayClicked => {
                if let Err(e) = self.host.open_chooser(tab_id).await {
                    log::warn!("could not open chooser for tab {}: {}", tab_id, e);
                }
            }
            InboundMessage::OverlayTimeout => {
                self.auto_shift(tab_id).await;
            }
        }
    }

    pub async fn handle_message(&self, tab_id: TabId, message: &Value) -> Result<(), ProtocolError> {
        let message = InboundMessage::from_value(message)?;
        self.on_message(tab_id, message).await;
        Ok(())
    }

    /// Send the tab to the first displayable alternate the user allows
    /// shifting to. Returns the chosen location.
    pub async fn auto_shift(&self, tab_id: TabId) -> Option<Location> {
        let target = {
            let tabs = self.tabs.borrow();
            let platform_name = tabs.platform_name(tab_id)?;
            let alternates = tabs.alternates(tab_id)?.to_vec();

            self.preferences.read(|p| {
                if !p.auto_shift_from_enabled(platform_name) {
                    return None;
                }

                operations::displayable(alternates, p)
                    .into_iter()
                    .find(|location| {
                        self.registry.is_known_platform(&location.platform_name)
                            && p.auto_shift_to_enabled(&location.platform_name)
                    })
            })
        }?;

        log::info!(
            "auto-shifting tab {} to {}",
            tab_id,
            target.watch_url
        );
        if let Err(e) = self.host.navigate_tab(tab_id, &target.watch_url).await {
            log::warn!("could not shift tab {}: {}", tab_id, e);
        }

        Some(target)
    }

    /// `None` until a lookup has committed for the tab.
    pub fn displayable_alternates(&self, tab_id: TabId) -> Option<Vec<Location>> {
        let alternates = self.tabs.borrow().alternates(tab_id)?.to_vec();
        Some(self.preferences.read(|p| operations::displayable(alternates, p)))
    }

    /// Open the options page once after install.
    pub async fn handle_first_run(&self) -> Result<bool, PreferencesError> {
        if !self.preferences.read(|p| p.first_run) {
            return Ok(false);
        }

        log::info!("first run, opening options");
        if let Err(e) = self.host.open_options_page().await {
            log::warn!("could not open options page: {}", e);
        }

        self.preferences.set("first_run", Value::Bool(false)).await?;
        Ok(true)
    }
}
