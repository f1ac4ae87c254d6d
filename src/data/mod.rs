//! Data layer module
//!
//! Handles all data persistence:
//! - SQLite pool with bounded statement execution
//! - Generic repository over entity table mappings
//! - List query validation and page metadata
//! - Story expiry policy

mod database;
mod filters;
mod metadata;
mod models;
mod repository;
mod visibility;

pub use database::{Database, FEED_TABLES};
pub use filters::{
    DEFAULT_PAGE, DEFAULT_PAGE_SIZE, DEFAULT_SORT, FilterSpec, ListQuery, MAX_PAGE,
    MAX_PAGE_SIZE, Predicate, SortDirection,
};
pub use metadata::{Metadata, PaginatedResult};
pub use models::*;
pub use repository::{Editable, Entity, Page, Repository, parse_list_query};
pub use visibility::{ExpiryAction, STORY_TTL_HOURS, TtlPolicy, Visibility};
