//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use lazy_static::lazy_static;
use prometheus::{HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // Database Metrics
    pub static ref DB_QUERIES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("nexusfeed_db_queries_total", "Total number of database queries"),
        &["operation", "table"]
    ).expect("metric can be created");
    pub static ref DB_QUERY_DURATION_SECONDS: prometheus::HistogramVec = prometheus::HistogramVec::new(
        HistogramOpts::new(
            "nexusfeed_db_query_duration_seconds",
            "Database query duration in seconds"
        ).buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 3.0]),
        &["operation", "table"]
    ).expect("metric can be created");
    pub static ref DB_QUERY_TIMEOUTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("nexusfeed_db_query_timeouts_total", "Total number of queries cut off by the statement timeout"),
        &["table"]
    ).expect("metric can be created");

    // Story Metrics
    pub static ref STORIES_DEMOTED_TOTAL: IntCounter = IntCounter::new(
        "nexusfeed_stories_demoted_total",
        "Total number of stories hidden after their TTL elapsed"
    ).expect("metric can be created");
    pub static ref STORY_DEMOTION_FAILURES_TOTAL: IntCounter = IntCounter::new(
        "nexusfeed_story_demotion_failures_total",
        "Total number of expired stories whose demotion could not be persisted"
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("nexusfeed_errors_total", "Total number of errors"),
        &["error_type"]
    ).expect("metric can be created");
}

/// Initialize metrics registry.
pub fn init_metrics() {
    REGISTRY
        .register(Box::new(DB_QUERIES_TOTAL.clone()))
        .expect("DB_QUERIES_TOTAL can be registered");
    REGISTRY
        .register(Box::new(DB_QUERY_DURATION_SECONDS.clone()))
        .expect("DB_QUERY_DURATION_SECONDS can be registered");
    REGISTRY
        .register(Box::new(DB_QUERY_TIMEOUTS_TOTAL.clone()))
        .expect("DB_QUERY_TIMEOUTS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(STORIES_DEMOTED_TOTAL.clone()))
        .expect("STORIES_DEMOTED_TOTAL can be registered");
    REGISTRY
        .register(Box::new(STORY_DEMOTION_FAILURES_TOTAL.clone()))
        .expect("STORY_DEMOTION_FAILURES_TOTAL can be registered");
    REGISTRY
        .register(Box::new(ERRORS_TOTAL.clone()))
        .expect("ERRORS_TOTAL can be registered");

    tracing::info!("Metrics registry initialized");
}

/// Count an error by kind.
pub fn record_error(error: &crate::error::AppError) {
    ERRORS_TOTAL.with_label_values(&[error.kind()]).inc();
}
