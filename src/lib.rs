//! NexusFeed - storage core of a small social feed
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Service Layer                            │
//! │  - Story lazy expiry (demote on first read past TTL)        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Data Layer                              │
//! │  - Generic repository per entity                            │
//! │  - List query validation, pagination metadata               │
//! │  - SQLite (sqlx), bounded statement time                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `service`: Story expiry
//! - `data`: Database, repositories, filters
//! - `clock`: Injectable time source
//! - `config`: Configuration management
//! - `metrics`: Prometheus instruments
//! - `error`: Error types

pub mod clock;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod service;

use std::sync::Arc;

use clock::{Clock, SystemClock};
use data::{Comment, Database, Direct, Message, Post, Repository, TtlPolicy};
use service::StoryService;

/// One accessor per feed entity, all sharing a pool and a clock.
#[derive(Clone)]
pub struct Models {
    pub posts: Repository<Post>,
    pub stories: StoryService,
    pub comments: Repository<Comment>,
    pub directs: Repository<Direct>,
    pub messages: Repository<Message>,
}

impl Models {
    pub fn new(db: Arc<Database>, clock: Arc<dyn Clock>, story_policy: TtlPolicy) -> Self {
        Self {
            posts: Repository::new(db.clone(), clock.clone()),
            stories: StoryService::new(db.clone(), clock.clone(), story_policy),
            comments: Repository::new(db.clone(), clock.clone()),
            directs: Repository::new(db.clone(), clock.clone()),
            messages: Repository::new(db, clock),
        }
    }
}

/// Application state shared by every caller
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Database connection pool
    pub db: Arc<Database>,

    /// Time source for stamping and expiry
    pub clock: Arc<dyn Clock>,

    pub models: Models,
}

impl AppState {
    /// Initialize application state on the wall clock
    ///
    /// # Errors
    /// Returns error if the configuration is invalid or the database cannot
    /// be opened and migrated
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        Self::with_clock(config, Arc::new(SystemClock)).await
    }

    /// Initialize application state with an explicit time source
    pub async fn with_clock(
        config: config::AppConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        config.validate()?;

        let db = Arc::new(Database::connect_with(&config.database).await?);
        let policy = TtlPolicy::new(config.stories.ttl());
        let models = Models::new(db.clone(), clock.clone(), policy);

        tracing::info!(
            story_ttl_hours = config.stories.ttl_hours,
            "Application state initialized successfully"
        );

        Ok(Self {
            config: Arc::new(config),
            db,
            clock,
            models,
        })
    }
}
