use crate::error::ConfigError;
use std::path::{Path, PathBuf};

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{AuthSettings, DatabaseSettings, LoggingSettings, ServerSettings, Settings};

pub const DEFAULT_CONFIG_PATH: &str = "brokerwatch.toml";

/// Command-line flag shared by every binary that needs the settings.
#[cfg(feature = "clap")]
#[derive(Debug, Clone, clap::Args)]
pub struct ConfigArgs {
    /// Path to the TOML configuration file. A missing file means defaults.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
}

/// Loads the application configuration.
///
/// The TOML file at `path` is optional. Environment variables prefixed with
/// `BROKERWATCH_` override it, using `__` between nested keys
/// (e.g. `BROKERWATCH_SERVER__PORT=8080`).
pub fn load_config(path: &Path) -> Result<Settings, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix("BROKERWATCH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let settings = builder.try_deserialize::<Settings>()?;
    settings.validate()?;

    Ok(settings)
}

/// `load_config` for the default file name in the working directory.
pub fn load_default_config() -> Result<Settings, ConfigError> {
    load_config(&PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_config(&dir.path().join("absent.toml")).unwrap();

        assert_eq!(settings.server.port, 5000);
        assert_eq!(settings.database.max_connections, 10);
        assert_eq!(settings.auth.identity_header, "x-user-id");
        assert!(settings.logging.directory.is_none());
    }

    #[test]
    fn file_values_override_defaults_per_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brokerwatch.toml");
        fs::write(
            &path,
            r#"
            [server]
            port = 8081

            [database]
            url = "postgres://localhost/brokerwatch"

            [logging]
            level = "debug"
            directory = "/var/log/brokerwatch"
            "#,
        )
        .unwrap();

        let settings = load_config(&path).unwrap();

        assert_eq!(settings.server.port, 8081);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(
            settings.database.connection_url().unwrap(),
            "postgres://localhost/brokerwatch"
        );
        assert_eq!(settings.logging.level, "debug");
        assert_eq!(
            settings.logging.directory,
            Some(PathBuf::from("/var/log/brokerwatch"))
        );
        assert_eq!(settings.server.socket_addr().unwrap().port(), 8081);
    }

    #[test]
    fn zero_port_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brokerwatch.toml");
        fs::write(&path, "[server]\nport = 0\n").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)), "{err}");
    }

    #[test]
    fn blank_identity_header_is_rejected() {
        let mut settings = Settings::default();
        settings.auth.identity_header = "  ".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn unparsable_host_is_rejected() {
        let mut settings = Settings::default();
        settings.server.host = "not a host".to_string();
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::ValidationError(msg)) if msg.contains("invalid server address")
        ));
    }
}
