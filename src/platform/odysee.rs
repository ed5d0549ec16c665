/// Odysee watch pages: `https://odysee.com/@channel:c/video:v`
use url::Url;

use super::{Identity, PlatformDescriptor, hostname};

pub const NAME: &str = "odysee";

const HOSTNAME: &str = "odysee.com";
const WATCH_PATTERNS: [&str; 2] = ["https://www.odysee.com/*", "https://api.lbry.com/*"];

pub fn descriptor() -> PlatformDescriptor {
    PlatformDescriptor::new(NAME)
        .with_watch_patterns(&WATCH_PATTERNS)
        .with_resolver(resolve)
}

fn resolve(url: &Url) -> Option<Identity> {
    if hostname(url)? != HOSTNAME {
        return None;
    }

    url.path()
        .strip_prefix('/')
        .filter(|rest| rest.starts_with('@'))
        .map(|id| Identity::new(NAME, id))
}
