//! Service layer
//!
//! Business rules that sit on top of the repositories. Stories are the only
//! entity with read-time behavior; every other entity is served straight
//! from its [`crate::data::Repository`].

mod story;

pub use story::{ExpiryOutcome, StoryService};
