//! Story expiry policy
//!
//! Pure decisions only: given the current instant and a stored story, say
//! whether it is still visible and whether a demotion write is owed. The
//! write itself lives in [`crate::service::StoryService`].

use chrono::{DateTime, Duration, Utc};

use super::models::Story;

/// How long a story stays visible.
pub const STORY_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Expired,
}

/// What a read must do with a stored story.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryAction {
    /// Still inside its TTL: return it unchanged.
    Show,
    /// Stored as visible but past its TTL: persist `visible = false`, then
    /// exclude it.
    Demote,
    /// Already demoted: exclude it, no write.
    Hide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPolicy {
    ttl: Duration,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self::new(Duration::hours(STORY_TTL_HOURS))
    }
}

impl TtlPolicy {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Expired once `now - created_at >= ttl`.
    ///
    /// A `created_at` in the future (clock skew) counts as age below the TTL.
    pub fn evaluate(&self, now: DateTime<Utc>, created_at: DateTime<Utc>) -> Visibility {
        if now - created_at < self.ttl {
            Visibility::Visible
        } else {
            Visibility::Expired
        }
    }

    pub fn classify(&self, now: DateTime<Utc>, story: &Story) -> ExpiryAction {
        if !story.visible {
            return ExpiryAction::Hide;
        }

        match self.evaluate(now, story.created_at) {
            Visibility::Visible => ExpiryAction::Show,
            Visibility::Expired => ExpiryAction::Demote,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story(created_at: DateTime<Utc>, visible: bool) -> Story {
        Story {
            id: 1,
            author_id: 7,
            content: "hello".to_string(),
            created_at,
            visible,
        }
    }

    #[test]
    fn ttl_boundary_is_expired() {
        let policy = TtlPolicy::default();
        let now = Utc::now();

        assert_eq!(
            policy.evaluate(now, now - Duration::hours(24) + Duration::seconds(1)),
            Visibility::Visible
        );
        assert_eq!(
            policy.evaluate(now, now - Duration::hours(24)),
            Visibility::Expired
        );
    }

    #[test]
    fn future_created_at_is_visible() {
        let policy = TtlPolicy::default();
        let now = Utc::now();
        assert_eq!(
            policy.evaluate(now, now + Duration::minutes(5)),
            Visibility::Visible
        );
    }

    #[test]
    fn classify_covers_every_state() {
        let policy = TtlPolicy::default();
        let now = Utc::now();

        assert_eq!(
            policy.classify(now, &story(now - Duration::hours(1), true)),
            ExpiryAction::Show
        );
        assert_eq!(
            policy.classify(now, &story(now - Duration::hours(25), true)),
            ExpiryAction::Demote
        );
        assert_eq!(
            policy.classify(now, &story(now - Duration::hours(25), false)),
            ExpiryAction::Hide
        );
        assert_eq!(
            policy.classify(now, &story(now - Duration::hours(1), false)),
            ExpiryAction::Hide
        );
    }
}
