/// Platform registry: which video platforms we know about, how to recognize
/// their watch pages, and which host permissions are needed to talk to them.
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

mod bitchute;
mod dailymotion;
mod odysee;
mod rumble;
mod youtube;

/// Canonical platform names, in registration order.
pub const PLATFORM_NAMES: [&str; 5] = [
    youtube::NAME,
    bitchute::NAME,
    dailymotion::NAME,
    odysee::NAME,
    rumble::NAME,
];

/// A video recognized on a platform's watch page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub platform_name: String,
    pub platform_id: String,
}

impl Identity {
    pub fn new(platform_name: impl Into<String>, platform_id: impl Into<String>) -> Identity {
        Identity {
            platform_name: platform_name.into(),
            platform_id: platform_id.into(),
        }
    }
}

/// Pure URL matcher for one platform's watch pages.
pub type Resolver = fn(&Url) -> Option<Identity>;

#[derive(Debug, Clone)]
pub struct PlatformDescriptor {
    pub name: String,
    pub watch_patterns: Option<Vec<String>>,
    pub resolver: Option<Resolver>,
}

impl PlatformDescriptor {
    pub fn new(name: impl Into<String>) -> PlatformDescriptor {
        PlatformDescriptor {
            name: name.into(),
            watch_patterns: None,
            resolver: None,
        }
    }

    pub fn with_watch_patterns(mut self, patterns: &[&str]) -> PlatformDescriptor {
        self.watch_patterns = Some(patterns.iter().map(|p| p.to_string()).collect());
        self
    }

    pub fn with_resolver(mut self, resolver: Resolver) -> PlatformDescriptor {
        self.resolver = Some(resolver);
        self
    }
}

/// Write-once registry built at startup and only read afterwards.
#[derive(Debug, Default)]
pub struct PlatformRegistry {
    platforms: Vec<PlatformDescriptor>,
}

impl PlatformRegistry {
    pub fn new() -> Self {
        PlatformRegistry {
            platforms: Vec::new(),
        }
    }

    /// Registry holding every platform the extension ships with.
    pub fn with_default_platforms() -> Result<Self, ConfigError> {
        let mut registry = PlatformRegistry::new();

        registry.register(youtube::descriptor())?;
        registry.register(bitchute::descriptor())?;
        registry.register(dailymotion::descriptor())?;
        registry.register(odysee::descriptor())?;
        registry.register(rumble::descriptor())?;

        Ok(registry)
    }

    pub fn register(&mut self, descriptor: PlatformDescriptor) -> Result<(), ConfigError> {
        if self.is_known_platform(&descriptor.name) {
            return Err(ConfigError::DuplicatePlatform(descriptor.name));
        }

        log::debug!("registered platform {}", descriptor.name);
        self.platforms.push(descriptor);
        Ok(())
    }

    pub fn register_platform(&mut self, name: &str) -> Result<(), ConfigError> {
        self.register(PlatformDescriptor::new(name))
    }

    pub fn register_watch_patterns(
        &mut self,
        name: &str,
        patterns: &[&str],
    ) -> Result<(), ConfigError> {
        let descriptor = self.descriptor_mut(name)?;

        if descriptor.watch_patterns.is_some() {
            return Err(ConfigError::DuplicateWatchPatterns(name.to_string()));
        }

        descriptor.watch_patterns = Some(patterns.iter().map(|p| p.to_string()).collect());
        Ok(())
    }

    pub fn register_handler(&mut self, name: &str, resolver: Resolver) -> Result<(), ConfigError> {
        let descriptor = self.descriptor_mut(name)?;

        if descriptor.resolver.is_some() {
            return Err(ConfigError::DuplicateHandler(name.to_string()));
        }

        descriptor.resolver = Some(resolver);
        Ok(())
    }

    fn descriptor_mut(&mut self, name: &str) -> Result<&mut PlatformDescriptor, ConfigError> {
        self.platforms
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| ConfigError::UnknownPlatform(name.to_string()))
    }

    /// Try each resolver in registration order; the first match wins.
    pub fn resolve(&self, url: &Url) -> Option<Identity> {
        self.platforms
            .iter()
            .filter_map(|p| p.resolver)
            .find_map(|resolver| resolver(url))
    }

    pub fn resolve_str(&self, url: &str) -> Option<Identity> {
        match Url::parse(url) {
            Ok(parsed) => self.resolve(&parsed),
            Err(e) => {
                log::debug!("not resolving unparseable url {url:?}: {e}");
                None
            }
        }
    }

    pub fn is_known_platform(&self, name: &str) -> bool {
        self.platforms.iter().any(|p| p.name == name)
    }

    pub fn watch_patterns(&self, name: &str) -> Option<&[String]> {
        self.platforms
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| p.watch_patterns.as_deref())
    }

    /// Every configured pattern across all platforms, for the first-run
    /// permission request.
    pub fn all_watch_patterns(&self) -> Vec<String> {
        self.platforms
            .iter()
            .filter_map(|p| p.watch_patterns.as_ref())
            .flatten()
            .cloned()
            .collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.platforms.iter().map(|p| p.name.as_str())
    }
}

/// Hostname of a URL, lowercased, when it has one.
fn hostname(url: &Url) -> Option<String> {
    url.host_str().map(|host| host.to_lowercase())
}
