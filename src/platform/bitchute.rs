/// BitChute watch pages: `https://www.bitchute.com/video/<id>/`
use url::Url;

use super::{Identity, PlatformDescriptor, hostname};

pub const NAME: &str = "bitchute";

const HOSTNAMES: [&str; 1] = ["www.bitchute.com"];
const WATCH_PATTERNS: [&str; 1] = ["https://www.bitchute.com/*"];

pub fn descriptor() -> PlatformDescriptor {
    PlatformDescriptor::new(NAME)
        .with_watch_patterns(&WATCH_PATTERNS)
        .with_resolver(resolve)
}

fn resolve(url: &Url) -> Option<Identity> {
    let host = hostname(url)?;

    if !HOSTNAMES.contains(&host.as_str()) {
        return None;
    }

    video_id(url.path()).map(|id| Identity::new(NAME, id))
}

/// The trailing slash is part of the page shape: `/video/<id>` alone is not
/// a watch page.
fn video_id(path: &str) -> Option<&str> {
    let parts: Vec<&str> = path.split('/').collect();

    match parts.as_slice() {
        ["", "video", id, _, ..] if !id.is_empty() => Some(*id),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_id() {
        assert_eq!(video_id("/video/abc123/"), Some("abc123"));
        assert_eq!(video_id("/video/abc123/extra"), Some("abc123"));
    }

    #[test]
    fn test_video_id_requires_trailing_slash() {
        assert_eq!(video_id("/video/abc123"), None);
    }

    #[test]
    fn test_video_id_rejects_other_shapes() {
        assert_eq!(video_id("/video//"), None);
        assert_eq!(video_id("/channel/abc123/"), None);
        assert_eq!(video_id("/"), None);
    }

    #[test]
    fn test_resolve_checks_host() {
        let url = Url::parse("https://bitchute.example.com/video/abc123/").unwrap();
        assert_eq!(resolve(&url), None);

        let url = Url::parse("https://www.bitchute.com/video/abc123/").unwrap();
        assert_eq!(resolve(&url), Some(Identity::new(NAME, "abc123")));
    }
}
