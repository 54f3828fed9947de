//! SQLite adapter configuration.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use prax_driver::DriverError;

/// Default lock-wait timeout applied when WAL journaling is not configured.
pub const DEFAULT_BUSY_TIMEOUT_MS: u32 = 5000;

/// Default bound on transactions queued behind the write lock.
pub const DEFAULT_MAX_QUEUED_WRITERS: usize = 1024;

/// SQLite adapter configuration.
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// Primary database path.
    pub path: DatabasePath,
    /// Shadow database path. Defaults to an in-memory database.
    pub shadow_path: Option<DatabasePath>,
    /// Decode every engine integer as a decimal string.
    pub safe_integers: bool,
    /// How timestamp arguments are stored.
    pub timestamp_format: TimestampFormat,
    /// Write-ahead log configuration.
    pub wal: WalConfig,
    /// Lock-wait timeout when WAL is not applied, in milliseconds.
    pub busy_timeout_ms: u32,
    /// Enable foreign keys.
    pub foreign_keys: bool,
    /// Leave `COMMIT` / `ROLLBACK` to the caller.
    pub use_phantom_query: bool,
    /// Bound on transactions waiting for the write lock.
    pub max_queued_writers: usize,
}

/// Database path configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DatabasePath {
    /// In-memory database.
    #[default]
    Memory,
    /// File-based database.
    File(PathBuf),
}

impl DatabasePath {
    /// Parse a connection target.
    ///
    /// Supported formats:
    /// - `sqlite::memory:` / `:memory:` - In-memory database
    /// - `sqlite://path/to/db.sqlite` - File-based database
    /// - `sqlite:path/to/db.sqlite` / `file:path/to/db.sqlite` - Alternative formats
    /// - anything else is taken as a file path
    pub fn parse(target: &str) -> Result<Self, DriverError> {
        let target = target.split('?').next().unwrap_or(target);
        if target == "sqlite::memory:" || target == ":memory:" {
            return Ok(Self::Memory);
        }

        let path = if let Some(path) = target.strip_prefix("sqlite://") {
            path
        } else if let Some(path) = target.strip_prefix("sqlite:") {
            path
        } else if let Some(path) = target.strip_prefix("file:") {
            path
        } else {
            target
        };

        match path {
            "" => Err(DriverError::configuration("database path is required")),
            ":memory:" => Ok(Self::Memory),
            path => Ok(Self::File(PathBuf::from(path))),
        }
    }

    /// Get the path string for SQLite.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Memory => ":memory:",
            Self::File(path) => path.to_str().unwrap_or(":memory:"),
        }
    }

    /// Check if this is an in-memory database.
    pub fn is_memory(&self) -> bool {
        matches!(self, Self::Memory)
    }
}

/// How timestamp arguments are encoded for storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimestampFormat {
    /// ISO-8601 text with a `+00:00` offset suffix.
    #[default]
    Iso8601,
    /// Integer milliseconds since the Unix epoch.
    UnixEpochMs,
}

impl TimestampFormat {
    /// Get the configuration name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Iso8601 => "iso8601",
            Self::UnixEpochMs => "unixepoch-ms",
        }
    }
}

impl FromStr for TimestampFormat {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "iso8601" => Ok(Self::Iso8601),
            "unixepoch-ms" => Ok(Self::UnixEpochMs),
            other => Err(DriverError::configuration(format!(
                "unknown timestamp format '{}'",
                other
            ))),
        }
    }
}

/// SQLite synchronous mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SynchronousMode {
    /// Synchronous OFF - Fastest but unsafe.
    Off,
    /// Synchronous NORMAL - Good balance.
    #[default]
    Normal,
    /// Synchronous FULL - Safe but slower.
    Full,
    /// Synchronous EXTRA - Maximum safety.
    Extra,
}

impl SynchronousMode {
    /// Get the SQLite pragma value.
    pub fn as_pragma(&self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Normal => "NORMAL",
            Self::Full => "FULL",
            Self::Extra => "EXTRA",
        }
    }
}

impl FromStr for SynchronousMode {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "normal" => Ok(Self::Normal),
            "full" => Ok(Self::Full),
            "extra" => Ok(Self::Extra),
            other => Err(DriverError::configuration(format!(
                "unknown synchronous mode '{}'",
                other
            ))),
        }
    }
}

/// Write-ahead log configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalConfig {
    /// Switch the journal to WAL.
    pub enabled: bool,
    /// Durability mode applied with WAL.
    pub synchronous: SynchronousMode,
    /// Pages after which the WAL is checkpointed.
    pub wal_autocheckpoint: Option<u32>,
    /// Lock-wait timeout in milliseconds.
    pub busy_timeout_ms: Option<u32>,
}

impl Default for WalConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            synchronous: SynchronousMode::Normal,
            wal_autocheckpoint: None,
            busy_timeout_ms: None,
        }
    }
}

impl WalConfig {
    /// WAL enabled with default durability.
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Default::default()
        }
    }

    /// Set the synchronous mode.
    pub fn synchronous(mut self, mode: SynchronousMode) -> Self {
        self.synchronous = mode;
        self
    }

    /// Set the checkpoint threshold.
    pub fn wal_autocheckpoint(mut self, pages: u32) -> Self {
        self.wal_autocheckpoint = Some(pages);
        self
    }

    /// Set the lock-wait timeout.
    pub fn busy_timeout(mut self, ms: u32) -> Self {
        self.busy_timeout_ms = Some(ms);
        self
    }
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: DatabasePath::Memory,
            shadow_path: None,
            safe_integers: true,
            timestamp_format: TimestampFormat::Iso8601,
            wal: WalConfig::default(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            foreign_keys: true,
            use_phantom_query: false,
            max_queued_writers: DEFAULT_MAX_QUEUED_WRITERS,
        }
    }
}

impl SqliteConfig {
    /// Create a new configuration for an in-memory database.
    pub fn memory() -> Self {
        Self::default()
    }

    /// Create a new configuration for a file-based database.
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self {
            path: DatabasePath::File(path.as_ref().to_path_buf()),
            ..Default::default()
        }
    }

    /// Parse a SQLite URL into configuration.
    ///
    /// Recognized query options: `safe_integers`, `timestamp_format`,
    /// `wal`, `synchronous`, `wal_autocheckpoint`, `busy_timeout`,
    /// `foreign_keys`, `phantom_query` and `shadow`.
    pub fn from_url(url: impl AsRef<str>) -> Result<Self, DriverError> {
        let url_str = url.as_ref();
        let mut config = Self {
            path: DatabasePath::parse(url_str)?,
            ..Default::default()
        };

        let Some((_, query)) = url_str.split_once('?') else {
            return Ok(config);
        };

        for pair in query.split('&') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            match key {
                "mode" if value == "memory" => config.path = DatabasePath::Memory,
                "safe_integers" => config.safe_integers = parse_flag(value),
                "timestamp_format" => config.timestamp_format = value.parse()?,
                "wal" => config.wal.enabled = parse_flag(value),
                "synchronous" => config.wal.synchronous = value.parse()?,
                "wal_autocheckpoint" => {
                    config.wal.wal_autocheckpoint = Some(parse_number(key, value)?);
                }
                "busy_timeout" => {
                    let ms = parse_number(key, value)?;
                    config.busy_timeout_ms = ms;
                    config.wal.busy_timeout_ms = Some(ms);
                }
                "foreign_keys" => config.foreign_keys = parse_flag(value),
                "phantom_query" => config.use_phantom_query = parse_flag(value),
                "shadow" => config.shadow_path = Some(DatabasePath::parse(value)?),
                _ => {}
            }
        }

        Ok(config)
    }

    /// Get the path string for SQLite.
    pub fn path_str(&self) -> &str {
        self.path.as_str()
    }

    /// The shadow database path, falling back to an in-memory database.
    pub fn shadow_path(&self) -> DatabasePath {
        self.shadow_path.clone().unwrap_or(DatabasePath::Memory)
    }

    /// Set the database path.
    pub fn path(mut self, path: DatabasePath) -> Self {
        self.path = path;
        self
    }

    /// Set the shadow database path.
    pub fn shadow(mut self, path: DatabasePath) -> Self {
        self.shadow_path = Some(path);
        self
    }

    /// Enable or disable integer-safe decoding.
    pub fn safe_integers(mut self, enabled: bool) -> Self {
        self.safe_integers = enabled;
        self
    }

    /// Set the timestamp format.
    pub fn timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    /// Set the WAL configuration.
    pub fn wal(mut self, wal: WalConfig) -> Self {
        self.wal = wal;
        self
    }

    /// Set the lock-wait timeout used without WAL.
    pub fn busy_timeout(mut self, ms: u32) -> Self {
        self.busy_timeout_ms = ms;
        self
    }

    /// Enable or disable foreign keys.
    pub fn foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }

    /// Enable or disable phantom query mode.
    pub fn phantom_query(mut self, enabled: bool) -> Self {
        self.use_phantom_query = enabled;
        self
    }

    /// Set the bound on queued writers.
    pub fn max_queued_writers(mut self, max: usize) -> Self {
        self.max_queued_writers = max;
        self
    }

    /// Whether WAL should actually be applied to `path`.
    pub fn applies_wal(&self, path: &DatabasePath) -> bool {
        self.wal.enabled && !path.is_memory()
    }

    /// Pragmas applied once the journal mode is settled.
    ///
    /// With WAL in effect this sets durability, checkpointing and the WAL
    /// lock-wait timeout; otherwise only the default lock-wait timeout.
    pub fn init_sql(&self, wal_applied: bool) -> String {
        let mut sql = String::new();

        if !wal_applied {
            sql.push_str(&format!("PRAGMA busy_timeout = {};\n", self.busy_timeout_ms));
            return sql;
        }

        sql.push_str(&format!(
            "PRAGMA synchronous = {};\n",
            self.wal.synchronous.as_pragma()
        ));

        if let Some(pages) = self.wal.wal_autocheckpoint {
            sql.push_str(&format!("PRAGMA wal_autocheckpoint = {};\n", pages));
        }

        sql.push_str(&format!(
            "PRAGMA busy_timeout = {};\n",
            self.wal.busy_timeout_ms.unwrap_or(DEFAULT_BUSY_TIMEOUT_MS)
        ));

        sql
    }
}

fn parse_flag(value: &str) -> bool {
    value == "true" || value == "1"
}

fn parse_number(key: &str, value: &str) -> Result<u32, DriverError> {
    value
        .parse()
        .map_err(|_| DriverError::configuration(format!("invalid value '{}' for {}", value, key)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_memory() {
        let config = SqliteConfig::memory();
        assert!(config.path.is_memory());
        assert_eq!(config.path.as_str(), ":memory:");
        assert!(config.safe_integers);
        assert_eq!(config.timestamp_format, TimestampFormat::Iso8601);
        assert!(!config.wal.enabled);
    }

    #[test]
    fn test_config_file() {
        let config = SqliteConfig::file("test.db");
        assert!(!config.path.is_memory());
        assert_eq!(config.path.as_str(), "test.db");
    }

    #[test]
    fn test_config_from_url_memory() {
        let config = SqliteConfig::from_url("sqlite::memory:").unwrap();
        assert!(config.path.is_memory());

        let config = SqliteConfig::from_url(":memory:").unwrap();
        assert!(config.path.is_memory());
    }

    #[test]
    fn test_config_from_url_file() {
        let config = SqliteConfig::from_url("sqlite://./test.db").unwrap();
        assert_eq!(config.path.as_str(), "./test.db");

        let config = SqliteConfig::from_url("file:data/app.db").unwrap();
        assert_eq!(config.path.as_str(), "data/app.db");
    }

    #[test]
    fn test_config_from_url_empty_path() {
        assert!(SqliteConfig::from_url("sqlite://").is_err());
    }

    #[test]
    fn test_config_from_url_with_options() {
        let config = SqliteConfig::from_url(concat!(
            "sqlite://./test.db?wal=true&synchronous=full&busy_timeout=10000",
            "&wal_autocheckpoint=500&safe_integers=false&shadow=:memory:",
        ))
        .unwrap();

        assert!(config.wal.enabled);
        assert_eq!(config.wal.synchronous, SynchronousMode::Full);
        assert_eq!(config.wal.busy_timeout_ms, Some(10000));
        assert_eq!(config.wal.wal_autocheckpoint, Some(500));
        assert_eq!(config.busy_timeout_ms, 10000);
        assert!(!config.safe_integers);
        assert_eq!(config.shadow_path, Some(DatabasePath::Memory));
    }

    #[test]
    fn test_config_from_url_timestamp_format() {
        let config = SqliteConfig::from_url("sqlite://a.db?timestamp_format=unixepoch-ms").unwrap();
        assert_eq!(config.timestamp_format, TimestampFormat::UnixEpochMs);

        let err = SqliteConfig::from_url("sqlite://a.db?timestamp_format=rfc2822").unwrap_err();
        assert!(err.to_string().contains("rfc2822"));
    }

    #[test]
    fn test_shadow_defaults_to_memory() {
        let config = SqliteConfig::file("primary.db");
        assert_eq!(config.shadow_path(), DatabasePath::Memory);

        let config = config.shadow(DatabasePath::File("shadow.db".into()));
        assert_eq!(config.shadow_path().as_str(), "shadow.db");
    }

    #[test]
    fn test_applies_wal() {
        let config = SqliteConfig::file("a.db").wal(WalConfig::enabled());
        assert!(config.applies_wal(&config.path));
        assert!(!config.applies_wal(&DatabasePath::Memory));
        assert!(!SqliteConfig::file("a.db").applies_wal(&DatabasePath::File("a.db".into())));
    }

    #[test]
    fn test_init_sql() {
        let config = SqliteConfig::file("a.db").busy_timeout(250);
        assert_eq!(config.init_sql(false), "PRAGMA busy_timeout = 250;\n");

        let config = config.wal(WalConfig::enabled().wal_autocheckpoint(100));
        let sql = config.init_sql(true);
        assert!(sql.contains("synchronous = NORMAL"));
        assert!(sql.contains("wal_autocheckpoint = 100"));
        assert!(sql.contains("busy_timeout = 5000"));
    }

    #[test]
    fn test_builder_pattern() {
        let config = SqliteConfig::memory()
            .foreign_keys(false)
            .busy_timeout(3000)
            .phantom_query(true)
            .max_queued_writers(4)
            .wal(WalConfig::enabled().synchronous(SynchronousMode::Extra));

        assert!(!config.foreign_keys);
        assert_eq!(config.busy_timeout_ms, 3000);
        assert!(config.use_phantom_query);
        assert_eq!(config.max_queued_writers, 4);
        assert_eq!(config.wal.synchronous, SynchronousMode::Extra);
    }

    #[test]
    fn test_synchronous_mode_pragma() {
        assert_eq!(SynchronousMode::Off.as_pragma(), "OFF");
        assert_eq!(SynchronousMode::Normal.as_pragma(), "NORMAL");
        assert_eq!(SynchronousMode::Full.as_pragma(), "FULL");
        assert_eq!(SynchronousMode::Extra.as_pragma(), "EXTRA");
        assert!("sometimes".parse::<SynchronousMode>().is_err());
    }
}
