//! Data models
//!
//! Rust structs representing feed entities, and their table mappings.
//! Ids are SQLite rowids; timestamps are UTC.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::query_builder::Separated;
use sqlx::Sqlite;

use super::filters::{read_int, read_string, ListQuery, Predicate};
use super::repository::{Editable, Entity};
use crate::error::ValidationErrors;

// =============================================================================
// Post
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub author_id: i64,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// A post ready for insert; id and timestamps are assigned by the store.
    pub fn draft(author_id: i64, title: impl Into<String>, description: impl Into<String>) -> Self {
        let epoch = DateTime::<Utc>::default();
        Self {
            id: 0,
            author_id,
            title: title.into(),
            description: description.into(),
            created_at: epoch,
            updated_at: epoch,
        }
    }
}

impl Entity for Post {
    const TABLE: &'static str = "posts";
    const COLUMNS: &'static str = "id, author_id, title, description, created_at, updated_at";
    const INSERT_COLUMNS: &'static [&'static str] =
        &["author_id", "title", "description", "created_at", "updated_at"];
    const OWNER_COLUMN: &'static str = "author_id";
    const SORT_SAFELIST: &'static [&'static str] =
        &["id", "title", "author_id", "created_at", "updated_at"];

    fn id(&self) -> i64 {
        self.id
    }

    fn bind_insert(&self, now: DateTime<Utc>, values: &mut Separated<'_, '_, Sqlite, &'static str>) {
        values
            .push_bind(self.author_id)
            .push_bind(self.title.clone())
            .push_bind(self.description.clone())
            .push_bind(now)
            .push_bind(now);
    }

    fn predicates(query: &ListQuery, errors: &mut ValidationErrors) -> Vec<Predicate> {
        let mut predicates = Vec::new();
        if let Some(title) = read_string(query.title.as_deref()) {
            predicates.push(Predicate::Contains("title", title));
        }
        if let Some(author_id) = read_int(query.author_id.as_deref(), "author_id", errors) {
            predicates.push(Predicate::Eq("author_id", author_id));
        }
        if let Some(name) = read_string(query.author_name.as_deref()) {
            predicates.push(Predicate::AuthorName("author_id", name));
        }
        predicates
    }
}

impl Editable for Post {
    fn bind_update(&self, now: DateTime<Utc>, set: &mut Separated<'_, '_, Sqlite, &'static str>) {
        set.push("title = ").push_bind_unseparated(self.title.clone());
        set.push("description = ")
            .push_bind_unseparated(self.description.clone());
        set.push("updated_at = ").push_bind_unseparated(now);
    }
}

// =============================================================================
// Story
// =============================================================================

/// Ephemeral content: visible to everyone for a fixed time after posting,
/// then hidden for good.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Story {
    pub id: i64,
    pub author_id: i64,
    pub content: String,
    /// Set once on insert
    pub created_at: DateTime<Utc>,
    /// Only ever goes from true to false
    pub visible: bool,
}

impl Story {
    pub fn draft(author_id: i64, content: impl Into<String>) -> Self {
        Self {
            id: 0,
            author_id,
            content: content.into(),
            created_at: DateTime::<Utc>::default(),
            visible: true,
        }
    }
}

impl Entity for Story {
    const TABLE: &'static str = "stories";
    const COLUMNS: &'static str = "id, author_id, content, created_at, visible";
    const INSERT_COLUMNS: &'static [&'static str] =
        &["author_id", "content", "created_at", "visible"];
    const OWNER_COLUMN: &'static str = "author_id";
    const SORT_SAFELIST: &'static [&'static str] = &["id", "author_id", "created_at"];

    fn id(&self) -> i64 {
        self.id
    }

    /// New stories always start visible, stamped with `now`.
    fn bind_insert(&self, now: DateTime<Utc>, values: &mut Separated<'_, '_, Sqlite, &'static str>) {
        values
            .push_bind(self.author_id)
            .push_bind(self.content.clone())
            .push_bind(now)
            .push_bind(true);
    }

    fn predicates(query: &ListQuery, errors: &mut ValidationErrors) -> Vec<Predicate> {
        let mut predicates = Vec::new();
        if let Some(author_id) = read_int(query.author_id.as_deref(), "author_id", errors) {
            predicates.push(Predicate::Eq("author_id", author_id));
        }
        if let Some(name) = read_string(query.author_name.as_deref()) {
            predicates.push(Predicate::AuthorName("author_id", name));
        }
        predicates
    }
}

// =============================================================================
// Comment
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub author_id: i64,
    pub post_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn draft(author_id: i64, post_id: i64, content: impl Into<String>) -> Self {
        let epoch = DateTime::<Utc>::default();
        Self {
            id: 0,
            author_id,
            post_id,
            content: content.into(),
            created_at: epoch,
            updated_at: epoch,
        }
    }
}

impl Entity for Comment {
    const TABLE: &'static str = "comments";
    const COLUMNS: &'static str = "id, author_id, post_id, content, created_at, updated_at";
    const INSERT_COLUMNS: &'static [&'static str] =
        &["author_id", "post_id", "content", "created_at", "updated_at"];
    const OWNER_COLUMN: &'static str = "author_id";
    const SORT_SAFELIST: &'static [&'static str] = &["id", "author_id", "created_at", "updated_at"];

    fn id(&self) -> i64 {
        self.id
    }

    fn bind_insert(&self, now: DateTime<Utc>, values: &mut Separated<'_, '_, Sqlite, &'static str>) {
        values
            .push_bind(self.author_id)
            .push_bind(self.post_id)
            .push_bind(self.content.clone())
            .push_bind(now)
            .push_bind(now);
    }

    fn predicates(query: &ListQuery, errors: &mut ValidationErrors) -> Vec<Predicate> {
        let mut predicates = Vec::new();
        if let Some(post_id) = read_int(query.post_id.as_deref(), "post_id", errors) {
            predicates.push(Predicate::Eq("post_id", post_id));
        }
        if let Some(author_id) = read_int(query.author_id.as_deref(), "author_id", errors) {
            predicates.push(Predicate::Eq("author_id", author_id));
        }
        predicates
    }
}

impl Editable for Comment {
    fn bind_update(&self, now: DateTime<Utc>, set: &mut Separated<'_, '_, Sqlite, &'static str>) {
        set.push("content = ")
            .push_bind_unseparated(self.content.clone());
        set.push("updated_at = ").push_bind_unseparated(now);
    }
}

// =============================================================================
// Direct conversation
// =============================================================================

/// A private conversation between two users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Direct {
    pub id: i64,
    pub user1: i64,
    pub user2: i64,
    pub created_at: DateTime<Utc>,
}

impl Direct {
    pub fn between(user1: i64, user2: i64) -> Self {
        Self {
            id: 0,
            user1,
            user2,
            created_at: DateTime::<Utc>::default(),
        }
    }

    pub fn has_participant(&self, user_id: i64) -> bool {
        self.user1 == user_id || self.user2 == user_id
    }
}

impl Entity for Direct {
    const TABLE: &'static str = "direct";
    const COLUMNS: &'static str = "id, user1, user2, created_at";
    const INSERT_COLUMNS: &'static [&'static str] = &["user1", "user2", "created_at"];
    // The conversation's opener
    const OWNER_COLUMN: &'static str = "user1";
    const SORT_SAFELIST: &'static [&'static str] = &["id", "created_at"];

    fn id(&self) -> i64 {
        self.id
    }

    fn bind_insert(&self, now: DateTime<Utc>, values: &mut Separated<'_, '_, Sqlite, &'static str>) {
        values
            .push_bind(self.user1)
            .push_bind(self.user2)
            .push_bind(now);
    }

    fn predicates(query: &ListQuery, errors: &mut ValidationErrors) -> Vec<Predicate> {
        read_int(query.user_id.as_deref(), "user_id", errors)
            .map(|user_id| vec![Predicate::EitherEq("user1", "user2", user_id)])
            .unwrap_or_default()
    }
}

// =============================================================================
// Message
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    pub id: i64,
    pub direct_id: i64,
    pub sender_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn draft(direct_id: i64, sender_id: i64, content: impl Into<String>) -> Self {
        Self {
            id: 0,
            direct_id,
            sender_id,
            content: content.into(),
            created_at: DateTime::<Utc>::default(),
        }
    }
}

impl Entity for Message {
    const TABLE: &'static str = "messages";
    const COLUMNS: &'static str = "id, direct_id, sender_id, content, created_at";
    const INSERT_COLUMNS: &'static [&'static str] =
        &["direct_id", "sender_id", "content", "created_at"];
    const OWNER_COLUMN: &'static str = "sender_id";
    const SORT_SAFELIST: &'static [&'static str] = &["id", "created_at"];

    fn id(&self) -> i64 {
        self.id
    }

    fn bind_insert(&self, now: DateTime<Utc>, values: &mut Separated<'_, '_, Sqlite, &'static str>) {
        values
            .push_bind(self.direct_id)
            .push_bind(self.sender_id)
            .push_bind(self.content.clone())
            .push_bind(now);
    }

    fn predicates(query: &ListQuery, errors: &mut ValidationErrors) -> Vec<Predicate> {
        read_int(query.direct_id.as_deref(), "direct_id", errors)
            .map(|direct_id| vec![Predicate::Eq("direct_id", direct_id)])
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safelists_include_the_default_sort() {
        for safelist in [
            Post::SORT_SAFELIST,
            Story::SORT_SAFELIST,
            Comment::SORT_SAFELIST,
            Direct::SORT_SAFELIST,
            Message::SORT_SAFELIST,
        ] {
            assert!(safelist.contains(&super::super::filters::DEFAULT_SORT));
        }
    }

    #[test]
    fn post_filter_fields_become_predicates() {
        let query = ListQuery::from_query_string("title=rust&author_id=7&author_name=ann");
        let mut errors = ValidationErrors::new();
        let predicates = Post::predicates(&query, &mut errors);

        assert!(errors.is_empty());
        assert_eq!(
            predicates,
            vec![
                Predicate::Contains("title", "rust".to_string()),
                Predicate::Eq("author_id", 7),
                Predicate::AuthorName("author_id", "ann".to_string()),
            ]
        );
    }

    #[test]
    fn non_integer_filter_field_is_a_field_error() {
        let query = ListQuery::from_query_string("author_id=seven");
        let mut errors = ValidationErrors::new();
        let predicates = Story::predicates(&query, &mut errors);

        assert!(predicates.is_empty());
        assert_eq!(errors.get("author_id"), Some("must be an integer value"));
    }

    #[test]
    fn new_story_serializes_visible() {
        let story = Story::draft(7, "hello");
        let json = serde_json::to_value(&story).unwrap();
        assert_eq!(json["visible"], true);
        assert_eq!(json["author_id"], 7);
    }
}
