/// User preferences: typed schema, defaults, loading with migration and
/// deep-fill, and the persisted store.
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ConfigError;
use crate::migrations::{self, MIGRATIONS, OptionsTree};
use crate::platform::PLATFORM_NAMES;
use crate::storage::{Storage, StorageError};

/// Current options schema version.
pub const OPTIONS_VERSION: u32 = 1;

/// Storage key holding the whole preferences tree.
pub const OPTIONS_KEY: &str = "options";

#[derive(Debug, thiserror::Error)]
pub enum PreferencesError {
    #[error("invalid option path: {0:?}")]
    InvalidPath(String),
    #[error("unknown option: {0}")]
    UnknownKey(String),
    #[error("option {0} can not be changed")]
    ReadOnly(String),
    #[error("invalid value for option {path}: {source}")]
    InvalidValue {
        path: String,
        source: serde_json::Error,
    },
    #[error("could not serialize options: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type PlatformSwitches = BTreeMap<String, bool>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub options_version: u32,
    pub first_run: bool,
    /// Gates every network lookup.
    pub enable_anonymous_data_collection: bool,
    pub lookup_platform: PlatformSwitches,
    pub show_platform: PlatformSwitches,
    pub overlay_platform: PlatformSwitches,
    pub auto_shift_from: PlatformSwitches,
    pub auto_shift_to: PlatformSwitches,
    pub platform_display_order: Vec<String>,
    pub overlay_config: OverlayConfig,
}

/// Sent to the overlay along with an "available" message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// Milliseconds the overlay stays up before it times out.
    pub show_for: u32,
    pub wipe_white: bool,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        OverlayConfig {
            show_for: 8000,
            wipe_white: false,
        }
    }
}

fn switches(value: bool) -> PlatformSwitches {
    PLATFORM_NAMES
        .iter()
        .map(|name| (name.to_string(), value))
        .collect()
}

impl Default for Preferences {
    fn default() -> Self {
        Preferences {
            options_version: OPTIONS_VERSION,
            first_run: true,
            enable_anonymous_data_collection: true,
            lookup_platform: switches(true),
            show_platform: switches(true),
            overlay_platform: switches(true),
            auto_shift_from: switches(false),
            auto_shift_to: switches(false),
            platform_display_order: Vec::new(),
            overlay_config: OverlayConfig::default(),
        }
    }
}

impl Preferences {
    pub fn lookup_enabled(&self, platform_name: &str) -> bool {
        self.lookup_platform.get(platform_name).copied().unwrap_or(false)
    }

    /// Platforms missing from the map are shown.
    pub fn show_enabled(&self, platform_name: &str) -> bool {
        self.show_platform.get(platform_name).copied().unwrap_or(true)
    }

    pub fn overlay_enabled(&self, platform_name: &str) -> bool {
        self.overlay_platform.get(platform_name).copied().unwrap_or(false)
    }

    pub fn auto_shift_from_enabled(&self, platform_name: &str) -> bool {
        self.auto_shift_from.get(platform_name).copied().unwrap_or(false)
    }

    pub fn auto_shift_to_enabled(&self, platform_name: &str) -> bool {
        self.auto_shift_to.get(platform_name).copied().unwrap_or(false)
    }
}

fn default_tree() -> OptionsTree {
    match serde_json::to_value(Preferences::default()) {
        Ok(Value::Object(tree)) => tree,
        _ => Map::new(),
    }
}

/// Copy defaults into every missing or null key, recursing into nested
/// objects. Arrays and scalars that are present are left alone.
pub fn fill_missing(tree: &mut OptionsTree, defaults: &OptionsTree) -> bool {
    let mut changed = false;

    for (key, default) in defaults {
        if matches!(tree.get(key), None | Some(Value::Null)) {
            tree.insert(key.clone(), default.clone());
            changed = true;
            continue;
        }

        if let (Some(Value::Object(nested)), Value::Object(nested_defaults)) =
            (tree.get_mut(key), default)
        {
            changed |= fill_missing(nested, nested_defaults);
        }
    }

    changed
}

/// Path of the first null anywhere in the tree.
pub fn find_null(value: &Value, path: &str) -> Option<String> {
    match value {
        Value::Null => Some(path.to_string()),
        Value::Object(map) => map.iter().find_map(|(key, nested)| {
            let nested_path = if path.is_empty() {
                key.clone()
            } else {
                format!("{}.{}", path, key)
            };
            find_null(nested, &nested_path)
        }),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .find_map(|(index, item)| find_null(item, &format!("{}[{}]", path, index))),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Loaded {
    pub preferences: Preferences,
    /// The in-memory tree differs from what was stored and should be written back.
    pub changed: bool,
}

impl Loaded {
    fn defaults() -> Self {
        Loaded {
            preferences: Preferences::default(),
            changed: true,
        }
    }
}

/// Turn whatever was stored into a complete, current preferences value.
///
/// Migration faults are configuration errors and propagate. Anything else
/// that leaves the tree incomplete or mistyped falls back to defaults.
pub fn load_preferences(stored: Option<Value>) -> Result<Loaded, ConfigError> {
    let mut tree = match stored {
        None | Some(Value::Null) => return Ok(Loaded::defaults()),
        Some(Value::Object(tree)) => tree,
        Some(other) => {
            log::error!("stored options are not an object ({}), using defaults", other);
            return Ok(Loaded::defaults());
        }
    };
    let original = Value::Object(tree.clone());

    let version = migrations::stored_version(&tree);
    if version < OPTIONS_VERSION {
        migrations::migrate(MIGRATIONS, &mut tree, version, OPTIONS_VERSION)?;
    } else if version > OPTIONS_VERSION {
        log::warn!(
            "stored options version {} is newer than {}, keeping it",
            version,
            OPTIONS_VERSION
        );
    }

    fill_missing(&mut tree, &default_tree());

    let tree = Value::Object(tree);
    if let Some(path) = find_null(&tree, "") {
        log::error!("option {} is still undefined after defaulting, resetting options", path);
        return Ok(Loaded::defaults());
    }

    let preferences: Preferences = match serde_json::from_value(tree) {
        Ok(preferences) => preferences,
        Err(e) => {
            log::error!("stored options are corrupt ({}), resetting options", e);
            return Ok(Loaded::defaults());
        }
    };

    let changed = serde_json::to_value(&preferences)
        .map(|current| current != original)
        .unwrap_or(true);

    Ok(Loaded {
        preferences,
        changed,
    })
}

/// A one or two segment dotted option path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionPath {
    pub section: String,
    pub key: Option<String>,
}

impl OptionPath {
    pub fn parse(path: &str) -> Result<Self, PreferencesError> {
        let invalid = || PreferencesError::InvalidPath(path.to_string());
        let mut segments = path.split('.');

        let section = segments.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
        let key = match segments.next() {
            None => None,
            Some("") => return Err(invalid()),
            Some(key) => Some(key.to_string()),
        };

        if segments.next().is_some() {
            return Err(invalid());
        }

        Ok(OptionPath {
            section: section.to_string(),
            key,
        })
    }

    fn lookup<'a>(&self, tree: &'a Value) -> Option<&'a Value> {
        let section = tree.get(&self.section)?;

        match &self.key {
            None => Some(section),
            Some(key) => section.get(key),
        }
    }

    fn assign(&self, tree: &mut Value, value: Value, path: &str) -> Result<(), PreferencesError> {
        let section = tree
            .get_mut(&self.section)
            .ok_or_else(|| PreferencesError::UnknownKey(path.to_string()))?;

        match &self.key {
            None => *section = value,
            Some(key) => match section {
                Value::Object(map) => {
                    map.insert(key.clone(), value);
                }
                _ => return Err(PreferencesError::InvalidPath(path.to_string())),
            },
        }

        Ok(())
    }
}

/// Process-wide preferences: held in memory, written through on every change
pub struct PreferenceStore {
    storage: Rc<dyn Storage>,
    current: RefCell<Preferences>,
}

impl PreferenceStore {
    pub async fn load(storage: Rc<dyn Storage>) -> Result<Self, PreferencesError> {
        migrations::validate(MIGRATIONS, OPTIONS_VERSION)?;

        let stored = storage.get(OPTIONS_KEY).await?;
        let loaded = load_preferences(stored)?;

        let store = PreferenceStore {
            storage,
            current: RefCell::new(loaded.preferences),
        };

        if loaded.changed {
            store.persist().await?;
        }

        Ok(store)
    }

    pub fn read<R>(&self, f: impl FnOnce(&Preferences) -> R) -> R {
        f(&self.current.borrow())
    }

    pub fn snapshot(&self) -> Preferences {
        self.current.borrow().clone()
    }

    pub fn get(&self, path: &str) -> Result<Value, PreferencesError> {
        let option = OptionPath::parse(path)?;
        let tree = serde_json::to_value(&*self.current.borrow())?;

        option
            .lookup(&tree)
            .cloned()
            .ok_or_else(|| PreferencesError::UnknownKey(path.to_string()))
    }

    /// Returns once the new value has been written to storage.
    pub async fn set(&self, path: &str, value: Value) -> Result<(), PreferencesError> {
        let option = OptionPath::parse(path)?;

        if option.section == migrations::VERSION_KEY {
            return Err(PreferencesError::ReadOnly(path.to_string()));
        }

        let mut tree = serde_json::to_value(&*self.current.borrow())?;
        option.assign(&mut tree, value, path)?;

        let updated: Preferences =
            serde_json::from_value(tree).map_err(|source| PreferencesError::InvalidValue {
                path: path.to_string(),
                source,
            })?;

        log::debug!("option {} changed", path);
        *self.current.borrow_mut() = updated;
        self.persist().await
    }

    pub async fn reset(&self) -> Result<(), PreferencesError> {
        log::info!("resetting options to defaults");
        *self.current.borrow_mut() = Preferences::default();
        self.persist().await
    }

    async fn persist(&self) -> Result<(), PreferencesError> {
        let tree = serde_json::to_value(&*self.current.borrow())?;
        self.storage.set(OPTIONS_KEY, tree).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use futures::executor::block_on;
    use serde_json::json;

    fn default_value() -> Value {
        serde_json::to_value(Preferences::default()).unwrap()
    }

    fn load_store(stored: Option<Value>) -> (Rc<MemoryStorage>, PreferenceStore) {
        let storage = Rc::new(MemoryStorage::new());
        if let Some(value) = stored {
            block_on(storage.set(OPTIONS_KEY, value)).unwrap();
        }
        let store = block_on(PreferenceStore::load(storage.clone())).unwrap();
        (storage, store)
    }

    #[test]
    fn test_load_nothing_stored() {
        let loaded = load_preferences(None).unwrap();

        assert_eq!(loaded.preferences, Preferences::default());
        assert!(loaded.changed);
    }

    #[test]
    fn test_load_complete_tree_is_unchanged() {
        let loaded = load_preferences(Some(default_value())).unwrap();

        assert_eq!(loaded.preferences, Preferences::default());
        assert!(!loaded.changed);
    }

    #[test]
    fn test_load_fills_every_missing_key() {
        let complete = match default_value() {
            Value::Object(tree) => tree,
            _ => unreachable!(),
        };

        for dropped in complete.keys() {
            let mut partial = complete.clone();
            partial.insert("first_run".to_string(), json!(false));
            partial.remove(dropped);

            let loaded = load_preferences(Some(Value::Object(partial))).unwrap();
            let value = serde_json::to_value(&loaded.preferences).unwrap();

            assert!(loaded.changed, "dropping {}", dropped);
            assert_eq!(value[dropped.as_str()], complete[dropped], "dropping {}", dropped);
            assert_eq!(loaded.preferences.first_run, dropped == "first_run");
        }
    }

    #[test]
    fn test_load_fills_missing_platform_switches() {
        let mut stored = default_value();
        stored["first_run"] = json!(false);
        for section in ["lookup_platform", "show_platform", "overlay_platform", "auto_shift_from"] {
            stored[section].as_object_mut().unwrap().remove("odysee");
        }

        let preferences = load_preferences(Some(stored)).unwrap().preferences;

        assert!(!preferences.first_run);
        assert!(preferences.lookup_enabled("odysee"));
        assert!(preferences.show_enabled("odysee"));
        assert!(preferences.overlay_enabled("odysee"));
        assert_eq!(preferences.auto_shift_from.get("odysee"), Some(&false));
    }

    #[test]
    fn test_load_deep_fills_nested_maps() {
        let stored = json!({
            "options_version": 1,
            "enable_anonymous_data_collection": false,
            "show_platform": { "rumble": false },
            "overlay_config": { "show_for": 3000 }
        });

        let loaded = load_preferences(Some(stored)).unwrap();
        let preferences = loaded.preferences;

        assert!(loaded.changed);
        assert!(!preferences.enable_anonymous_data_collection);
        assert!(!preferences.show_enabled("rumble"));
        assert!(preferences.show_enabled("bitchute"));
        assert_eq!(preferences.show_platform.len(), PLATFORM_NAMES.len());
        assert_eq!(preferences.overlay_config.show_for, 3000);
        assert!(!preferences.overlay_config.wipe_white);
    }

    #[test]
    fn test_load_null_is_filled() {
        let mut stored = default_value();
        stored["first_run"] = Value::Null;
        stored["lookup_platform"]["youtube"] = Value::Null;

        let loaded = load_preferences(Some(stored)).unwrap();

        assert!(loaded.preferences.first_run);
        assert!(loaded.preferences.lookup_enabled("youtube"));
    }

    #[test]
    fn test_load_null_in_list_resets_to_defaults() {
        let mut stored = default_value();
        stored["first_run"] = json!(false);
        stored["platform_display_order"] = json!(["odysee", null]);

        let loaded = load_preferences(Some(stored)).unwrap();

        assert_eq!(loaded.preferences, Preferences::default());
        assert!(loaded.changed);
    }

    #[test]
    fn test_load_wrong_type_resets_to_defaults() {
        let mut stored = default_value();
        stored["first_run"] = json!(false);
        stored["show_platform"] = json!("everything");

        let loaded = load_preferences(Some(stored)).unwrap();

        assert_eq!(loaded.preferences, Preferences::default());
    }

    #[test]
    fn test_load_migrates_legacy_options() {
        let stored = json!({
            "first_run": false,
            "enable_anonymous_data_collection": true,
            "show_overlay": true,
            "overlay_platform": { "odysee": false }
        });

        let loaded = load_preferences(Some(stored)).unwrap();
        let preferences = loaded.preferences;

        assert_eq!(preferences.options_version, OPTIONS_VERSION);
        assert!(!preferences.first_run);
        assert!(!preferences.overlay_enabled("odysee"));
        assert!(preferences.overlay_enabled("youtube"));
        assert!(preferences.overlay_enabled("bitchute"));
    }

    #[test]
    fn test_load_legacy_overlay_off() {
        let stored = json!({ "show_overlay": false });

        let preferences = load_preferences(Some(stored)).unwrap().preferences;

        for name in PLATFORM_NAMES {
            assert!(!preferences.overlay_enabled(name), "{}", name);
        }
    }

    #[test]
    fn test_load_newer_version_is_kept() {
        let mut stored = default_value();
        stored["options_version"] = json!(OPTIONS_VERSION + 3);

        let preferences = load_preferences(Some(stored)).unwrap().preferences;

        assert_eq!(preferences.options_version, OPTIONS_VERSION + 3);
    }

    #[test]
    fn test_option_path_parse() {
        assert_eq!(
            OptionPath::parse("enable_anonymous_data_collection").unwrap(),
            OptionPath {
                section: "enable_anonymous_data_collection".to_string(),
                key: None
            }
        );
        assert_eq!(
            OptionPath::parse("overlay_platform.bitchute").unwrap().key,
            Some("bitchute".to_string())
        );

        for bad in ["", ".", "a.", ".b", "a.b.c"] {
            assert!(
                matches!(OptionPath::parse(bad), Err(PreferencesError::InvalidPath(_))),
                "{:?}",
                bad
            );
        }
    }

    #[test]
    fn test_store_load_writes_back_defaults() {
        let (storage, store) = load_store(None);

        assert_eq!(store.snapshot(), Preferences::default());
        assert_eq!(block_on(storage.get(OPTIONS_KEY)).unwrap(), Some(default_value()));
    }

    #[test]
    fn test_store_get() {
        let (_storage, store) = load_store(None);

        assert_eq!(store.get("enable_anonymous_data_collection").unwrap(), json!(true));
        assert_eq!(store.get("overlay_platform.bitchute").unwrap(), json!(true));
        assert_eq!(store.get("overlay_config.show_for").unwrap(), json!(8000));
        assert!(matches!(
            store.get("no_such_option"),
            Err(PreferencesError::UnknownKey(_))
        ));
        assert!(matches!(
            store.get("overlay_platform.vimeo"),
            Err(PreferencesError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_store_set_persists() {
        let (storage, store) = load_store(None);

        block_on(store.set("overlay_platform.bitchute", json!(false))).unwrap();

        assert!(!store.read(|p| p.overlay_enabled("bitchute")));
        let persisted = block_on(storage.get(OPTIONS_KEY)).unwrap().unwrap();
        assert_eq!(persisted["overlay_platform"]["bitchute"], json!(false));
    }

    #[test]
    fn test_store_set_whole_section() {
        let (_storage, store) = load_store(None);

        block_on(store.set("platform_display_order", json!(["odysee", "rumble"]))).unwrap();

        assert_eq!(
            store.snapshot().platform_display_order,
            vec!["odysee".to_string(), "rumble".to_string()]
        );
    }

    #[test]
    fn test_store_set_rejects_bad_input() {
        let (storage, store) = load_store(None);
        let before = block_on(storage.get(OPTIONS_KEY)).unwrap();

        assert!(matches!(
            block_on(store.set("first_run", json!("yes"))),
            Err(PreferencesError::InvalidValue { .. })
        ));
        assert!(matches!(
            block_on(store.set("missing.key", json!(true))),
            Err(PreferencesError::UnknownKey(_))
        ));
        assert!(matches!(
            block_on(store.set("first_run.nested", json!(true))),
            Err(PreferencesError::InvalidPath(_))
        ));
        assert!(matches!(
            block_on(store.set("options_version", json!(0))),
            Err(PreferencesError::ReadOnly(_))
        ));

        assert_eq!(store.snapshot(), Preferences::default());
        assert_eq!(block_on(storage.get(OPTIONS_KEY)).unwrap(), before);
    }

    #[test]
    fn test_store_reset() {
        let mut stored = default_value();
        stored["first_run"] = json!(false);
        stored["auto_shift_from"]["youtube"] = json!(true);
        let (storage, store) = load_store(Some(stored));
        assert!(store.read(|p| p.auto_shift_from_enabled("youtube")));

        block_on(store.reset()).unwrap();

        assert_eq!(store.snapshot(), Preferences::default());
        assert_eq!(block_on(storage.get(OPTIONS_KEY)).unwrap(), Some(default_value()));
    }

    #[test]
    fn test_missing_switch_defaults() {
        let preferences = Preferences::default();

        assert!(preferences.show_enabled("peertube"));
        assert!(!preferences.lookup_enabled("peertube"));
        assert!(!preferences.overlay_enabled("peertube"));
        assert!(!preferences.auto_shift_to_enabled("peertube"));
    }
}
