use chrono::Duration;

use crate::config::Settings;
use crate::db::Database;
use crate::session::SessionManager;

/// Limits and costs the handlers apply, taken from settings
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    pub max_image_bytes: usize,
    pub bcrypt_cost: u32,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            max_image_bytes: 60_000,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl From<&Settings> for ServiceOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            max_image_bytes: settings.uploads.max_image_bytes,
            bcrypt_cost: settings.security.bcrypt_cost,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub session_manager: SessionManager,
    pub options: ServiceOptions,
}

impl AppState {
    pub fn new(db: Database, session_ttl: Duration, options: ServiceOptions) -> Self {
        let session_manager = SessionManager::new(db.clone(), session_ttl);
        Self {
            db,
            session_manager,
            options,
        }
    }

    pub fn from_settings(db: Database, settings: &Settings) -> Self {
        Self::new(
            db,
            Duration::minutes(settings.session.ttl_minutes),
            ServiceOptions::from(settings),
        )
    }
}
