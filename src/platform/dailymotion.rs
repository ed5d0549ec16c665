/// Dailymotion watch pages: `https://www.dailymotion.com/video/<id>`
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use super::{Identity, PlatformDescriptor, hostname};

pub const NAME: &str = "dailymotion";

const HOSTNAME: &str = "www.dailymotion.com";
const WATCH_PATTERNS: [&str; 1] = ["https://www.dailymotion.com/*"];

static VIDEO_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/video/([0-9a-z]{6,7})").expect("video path regex"));

pub fn descriptor() -> PlatformDescriptor {
    PlatformDescriptor::new(NAME)
        .with_watch_patterns(&WATCH_PATTERNS)
        .with_resolver(resolve)
}

fn resolve(url: &Url) -> Option<Identity> {
    if hostname(url)? != HOSTNAME {
        return None;
    }

    VIDEO_PATH
        .captures(url.path())
        .and_then(|caps| caps.get(1))
        .map(|id| Identity::new(NAME, id.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve_str(url: &str) -> Option<Identity> {
        resolve(&Url::parse(url).unwrap())
    }

    #[test]
    fn test_watch_page() {
        assert_eq!(
            resolve_str("https://www.dailymotion.com/video/x7tgad0"),
            Some(Identity::new(NAME, "x7tgad0"))
        );
    }

    #[test]
    fn test_id_length_bounds() {
        assert_eq!(resolve_str("https://www.dailymotion.com/video/x7tg"), None);
        // the pattern is anchored at the start only, so longer ids are truncated
        assert_eq!(
            resolve_str("https://www.dailymotion.com/video/x7tgad0zz"),
            Some(Identity::new(NAME, "x7tgad0"))
        );
    }

    #[test]
    fn test_other_pages() {
        assert_eq!(resolve_str("https://www.dailymotion.com/"), None);
        assert_eq!(resolve_str("https://dailymotion.com/video/x7tgad0"), None);
    }
}
