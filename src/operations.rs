/// Location list operations: self-removal, hiding, display ordering

use crate::platform::Identity;
use crate::preferences::Preferences;
use crate::tab_data::Location;

/// Drop the location for the video being watched
pub fn remove_identity(locations: Vec<Location>, identity: &Identity) -> Vec<Location> {
    locations
        .into_iter()
        .filter(|location| !location.is_identity(identity))
        .collect()
}

/// Drop locations on platforms the user hid
pub fn hide_platforms(locations: Vec<Location>, preferences: &Preferences) -> Vec<Location> {
    locations
        .into_iter()
        .filter(|location| preferences.show_enabled(&location.platform_name))
        .collect()
}

/// Order by position in `display_order`; platforms missing from the list go
/// last and keep their relative order.
pub fn order_by_platform(mut locations: Vec<Location>, display_order: &[String]) -> Vec<Location> {
    locations.sort_by_key(|location| {
        display_order
            .iter()
            .position(|name| *name == location.platform_name)
            .unwrap_or(usize::MAX)
    });

    locations
}

/// What the user gets offered for a tab: hidden platforms removed, then
/// ordered per preference
pub fn displayable(locations: Vec<Location>, preferences: &Preferences) -> Vec<Location> {
    let shown = hide_platforms(locations, preferences);
    order_by_platform(shown, &preferences.platform_display_order)
}
