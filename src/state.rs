use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use crate::config::{AppConfig, BookingPolicy};
use crate::errors::{AppError, AppResult};

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub policy: BookingPolicy,
}

impl AppState {
    pub fn new(conn: Connection, config: AppConfig) -> Self {
        let policy = config.booking_policy();
        Self {
            db: Arc::new(Mutex::new(conn)),
            config,
            policy,
        }
    }

    pub fn conn(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.db
            .lock()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("database mutex poisoned")))
    }
}
