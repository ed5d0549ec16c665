/// Rumble is offered as an alternate only; its watch pages are not detected.
use super::PlatformDescriptor;

pub const NAME: &str = "rumble";

pub fn descriptor() -> PlatformDescriptor {
    PlatformDescriptor::new(NAME)
}
