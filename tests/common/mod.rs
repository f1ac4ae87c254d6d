//! Common test utilities for E2E tests

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use nexusfeed::clock::ManualClock;
use nexusfeed::{AppState, config};
use tempfile::TempDir;

/// Test application instance on a fresh database and a stopped clock
pub struct TestApp {
    pub state: AppState,
    pub clock: Arc<ManualClock>,
    pub _temp_dir: TempDir,
}

impl TestApp {
    /// Create a new test application instance
    pub async fn new() -> Self {
        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let config = config::AppConfig::for_database(db_path);
        let clock = Arc::new(ManualClock::new(Self::epoch()));

        let state = AppState::with_clock(config, clock.clone()).await.unwrap();

        Self {
            state,
            clock,
            _temp_dir: temp_dir,
        }
    }

    /// Instant the clock starts at
    pub fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
    }

    /// Insert a user row directly; users are managed outside the feed
    pub async fn create_user(&self, name: &str) -> i64 {
        sqlx::query_scalar("INSERT INTO users (name, email) VALUES (?, ?) RETURNING id")
            .bind(name)
            .bind(format!("{}@example.com", name.to_lowercase().replace(' ', ".")))
            .fetch_one(self.state.db.pool())
            .await
            .unwrap()
    }

    /// Raw `visible` flag of a story, bypassing expiry
    pub async fn stored_visibility(&self, story_id: i64) -> bool {
        sqlx::query_scalar("SELECT visible FROM stories WHERE id = ?")
            .bind(story_id)
            .fetch_one(self.state.db.pool())
            .await
            .unwrap()
    }
}
