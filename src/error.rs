/// Startup configuration errors shared by the platform registry and the
/// preferences migration table. None of these are recoverable.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("platform already registered: {0}")]
    DuplicatePlatform(String),
    #[error("platform not registered: {0}")]
    UnknownPlatform(String),
    #[error("identity handler already set for platform: {0}")]
    DuplicateHandler(String),
    #[error("watch patterns already set for platform: {0}")]
    DuplicateWatchPatterns(String),
    #[error("no migration step from options version {0}")]
    MissingMigration(u32),
    #[error("more than one migration step from options version {0}")]
    DuplicateMigration(u32),
    #[error("migration step from options version {0} is past the current version")]
    UnexpectedMigration(u32),
    #[error("migration step for options version {expected} called on version {found}")]
    MigrationVersionMismatch { expected: u32, found: u32 },
}
