/// YouTube watch pages: `https://www.youtube.com/watch?v=<id>`
use url::Url;

use super::{Identity, PlatformDescriptor, hostname};

pub const NAME: &str = "youtube";

const HOSTNAMES: [&str; 1] = ["www.youtube.com"];
const WATCH_PATTERNS: [&str; 1] = ["https://www.youtube.com/*"];

pub fn descriptor() -> PlatformDescriptor {
    PlatformDescriptor::new(NAME)
        .with_watch_patterns(&WATCH_PATTERNS)
        .with_resolver(resolve)
}

fn resolve(url: &Url) -> Option<Identity> {
    let host = hostname(url)?;

    if !HOSTNAMES.contains(&host.as_str()) || url.path() != "/watch" {
        return None;
    }

    url.query_pairs()
        .find(|(key, _)| key == "v")
        .map(|(_, value)| value.into_owned())
        .filter(|id| !id.is_empty())
        .map(|id| Identity::new(NAME, id))
}
