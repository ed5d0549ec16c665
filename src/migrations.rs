/// Options schema migrations. Each step upgrades the stored tree by exactly
/// one version.
use serde_json::{Map, Value};

use crate::error::ConfigError;
use crate::platform::PLATFORM_NAMES;

pub type OptionsTree = Map<String, Value>;

pub const VERSION_KEY: &str = "options_version";

pub struct Migration {
    /// Version the step expects to find; it leaves the tree at `from + 1`.
    pub from: u32,
    pub apply: fn(&mut OptionsTree) -> Result<(), ConfigError>,
}

pub const MIGRATIONS: &[Migration] = &[Migration {
    from: 0,
    apply: overlay_per_platform,
}];

/// A tree without a version predates versioning and counts as version 0.
pub fn stored_version(tree: &OptionsTree) -> u32 {
    tree.get(VERSION_KEY)
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(0)
}

fn set_version(tree: &mut OptionsTree, version: u32) {
    tree.insert(VERSION_KEY.to_string(), Value::from(version));
}

fn expect_version(tree: &OptionsTree, expected: u32) -> Result<(), ConfigError> {
    let found = stored_version(tree);

    if found != expected {
        return Err(ConfigError::MigrationVersionMismatch { expected, found });
    }

    Ok(())
}

/// The table needs exactly one step for every version below `current`.
pub fn validate(table: &[Migration], current: u32) -> Result<(), ConfigError> {
    if let Some(step) = table.iter().find(|step| step.from >= current) {
        return Err(ConfigError::UnexpectedMigration(step.from));
    }

    for version in 0..current {
        match table.iter().filter(|step| step.from == version).count() {
            0 => return Err(ConfigError::MissingMigration(version)),
            1 => {}
            _ => return Err(ConfigError::DuplicateMigration(version)),
        }
    }

    Ok(())
}

/// Apply steps in version order from `from` up to `to`.
pub fn migrate(
    table: &[Migration],
    tree: &mut OptionsTree,
    from: u32,
    to: u32,
) -> Result<(), ConfigError> {
    for version in from..to {
        let step = table
            .iter()
            .find(|step| step.from == version)
            .ok_or(ConfigError::MissingMigration(version))?;

        log::info!("migrating options from version {} to {}", version, version + 1);
        (step.apply)(tree)?;
        expect_version(tree, version + 1)?;
    }

    Ok(())
}

/// v0 had a single `show_overlay` switch; v1 has one per platform.
fn overlay_per_platform(tree: &mut OptionsTree) -> Result<(), ConfigError> {
    expect_version(tree, 0)?;

    if let Some(Value::Bool(show)) = tree.remove("show_overlay") {
        let overlay = tree
            .entry("overlay_platform")
            .or_insert_with(|| Value::Object(Map::new()));

        if let Value::Object(per_platform) = overlay {
            for name in PLATFORM_NAMES {
                per_platform
                    .entry(name)
                    .or_insert(Value::Bool(show));
            }
        }
    }

    set_version(tree, 1);
    Ok(())
}
