use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Database {
    pub path: String,
    /// Attempts made for a transaction that fails with a transient error
    pub retry_attempts: u32,
    pub seed_demo_data: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    pub ttl_minutes: i64,
    pub cleanup_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Uploads {
    /// Images must be strictly smaller than this
    pub max_image_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Security {
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub database: Database,
    pub session: Session,
    pub uploads: Uploads,
    pub security: Security,
}

/// Environment variable -> settings key overrides, applied last
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("HOST", "server.host"),
    ("PORT", "server.port"),
    ("DATABASE_PATH", "database.path"),
    ("DB_RETRY_ATTEMPTS", "database.retry_attempts"),
    ("SEED_DEMO_DATA", "database.seed_demo_data"),
    ("SESSION_TTL_MINUTES", "session.ttl_minutes"),
    ("MAX_IMAGE_BYTES", "uploads.max_image_bytes"),
    ("BCRYPT_COST", "security.bcrypt_cost"),
];

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5000)?
            .set_default("database.path", "y.db")?
            .set_default("database.retry_attempts", 3)?
            .set_default("database.seed_demo_data", false)?
            .set_default("session.ttl_minutes", 10)?
            .set_default("session.cleanup_interval_secs", 3600)?
            .set_default("uploads.max_image_bytes", 60000)?
            .set_default("security.bcrypt_cost", bcrypt::DEFAULT_COST as i64)?;

        // settings.toml is optional: current directory first, then the crate
        // directory when running from the workspace root
        let config_file_name = "settings.toml";
        for candidate in [
            PathBuf::from(config_file_name),
            PathBuf::from("y-server").join(config_file_name),
        ] {
            if candidate.exists() {
                builder = builder.add_source(File::from(candidate).required(false));
            }
        }

        // Environment variables have the highest priority
        for (var, key) in ENV_OVERRIDES {
            if let Ok(value) = std::env::var(var) {
                builder = builder.set_override(*key, value)?;
            }
        }

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_override_table_targets_known_keys() {
        let keys: Vec<&str> = ENV_OVERRIDES.iter().map(|(_, key)| *key).collect();
        assert!(keys.contains(&"database.path"));
        assert!(keys.contains(&"session.ttl_minutes"));
        assert!(keys.iter().all(|k| k.contains('.')));
    }

    #[test]
    fn test_settings_load_with_defaults() {
        // Tests run from the crate directory, which ships a settings.toml
        let settings = Settings::new().expect("settings should load");
        assert!(settings.database.retry_attempts >= 1);
        assert!(settings.session.ttl_minutes > 0);
        assert!(settings.uploads.max_image_bytes > 0);
    }
}
