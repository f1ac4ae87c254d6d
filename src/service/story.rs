//! Story service
//!
//! Reads of stories go through here so that the lazy expiry rule is applied
//! on every path: a story older than its TTL is demoted on first sight and
//! never handed to a caller again. There is no sweep; a story nobody reads
//! stays `visible = 1` in storage until its next read.

use std::sync::Arc;

use crate::clock::Clock;
use crate::data::{
    Database, ExpiryAction, FilterSpec, ListQuery, Metadata, PaginatedResult, Predicate,
    Repository, Story, TtlPolicy, parse_list_query,
};
use crate::error::AppError;
use crate::metrics::{STORIES_DEMOTED_TOTAL, STORY_DEMOTION_FAILURES_TOTAL, record_error};

/// Result of running the expiry check on one stored story.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpiryOutcome {
    /// Within its TTL; returned as stored.
    Visible(Story),
    /// Past its TTL; `visible = false` was written (or attempted) just now.
    Demoted,
    /// Already hidden; nothing was written.
    AlreadyExpired,
}

/// Story service
#[derive(Clone)]
pub struct StoryService {
    repo: Repository<Story>,
    clock: Arc<dyn Clock>,
    policy: TtlPolicy,
}

impl StoryService {
    /// Create new story service
    pub fn new(db: Arc<Database>, clock: Arc<dyn Clock>, policy: TtlPolicy) -> Self {
        Self {
            repo: Repository::new(db, clock.clone()),
            clock,
            policy,
        }
    }

    /// Post a new story. It starts visible and is stamped with the clock.
    pub async fn insert(&self, author_id: i64, content: &str) -> Result<Story, AppError> {
        let story = self.repo.insert(&Story::draft(author_id, content)).await?;
        tracing::info!(story_id = story.id, author_id, "Story created");
        Ok(story)
    }

    /// Fetch a story, applying expiry.
    ///
    /// # Errors
    /// `RecordNotFound` when the row is missing or the story has expired,
    /// whether it expired just now or earlier.
    pub async fn get(&self, id: i64) -> Result<Story, AppError> {
        match self.check(id).await? {
            ExpiryOutcome::Visible(story) => Ok(story),
            ExpiryOutcome::Demoted | ExpiryOutcome::AlreadyExpired => {
                Err(AppError::RecordNotFound)
            }
        }
    }

    /// Run the expiry check on one story and report what happened.
    ///
    /// A failed demotion write is logged and the story is still treated as
    /// expired.
    pub async fn check(&self, id: i64) -> Result<ExpiryOutcome, AppError> {
        let story = self.repo.get(id).await?;
        let now = self.clock.now();

        Ok(match self.policy.classify(now, &story) {
            ExpiryAction::Show => ExpiryOutcome::Visible(story),
            ExpiryAction::Hide => ExpiryOutcome::AlreadyExpired,
            ExpiryAction::Demote => {
                self.demote(&story).await;
                ExpiryOutcome::Demoted
            }
        })
    }

    /// One page of visible stories.
    ///
    /// Rows found past their TTL during this pass are demoted and left out;
    /// `total_records` is reduced by the number demoted.
    pub async fn list(
        &self,
        filter: &FilterSpec,
        predicates: &[Predicate],
    ) -> Result<PaginatedResult<Story>, AppError> {
        let mut predicates = predicates.to_vec();
        predicates.push(Predicate::Flag("visible", true));

        let page = self.repo.list(filter, &predicates).await?;
        let fetched = page.items.len();
        let items = self.retain_visible(page.items).await;
        let expired = (fetched - items.len()) as i64;

        Ok(PaginatedResult {
            items,
            metadata: Metadata::compute(
                (page.total_records - expired).max(0),
                filter.page(),
                filter.page_size(),
            ),
        })
    }

    /// Validate a raw list query and return the requested page of stories.
    pub async fn list_from_query(
        &self,
        query: &ListQuery,
    ) -> Result<PaginatedResult<Story>, AppError> {
        let (filter, predicates) = parse_list_query::<Story>(query)?;
        self.list(&filter, &predicates).await
    }

    /// Every story of `author_id` that is still visible, oldest first.
    pub async fn get_all_from_user(&self, author_id: i64) -> Result<Vec<Story>, AppError> {
        let stories = self
            .repo
            .find_all(&[
                Predicate::Eq("author_id", author_id),
                Predicate::Flag("visible", true),
            ])
            .await?;

        Ok(self.retain_visible(stories).await)
    }

    /// Hard-delete a story. Only its author may do so; expiry is irrelevant.
    pub async fn delete(&self, id: i64, author_id: i64) -> Result<(), AppError> {
        self.repo.delete_owned(id, author_id).await?;
        tracing::info!(story_id = id, author_id, "Story deleted");
        Ok(())
    }

    async fn retain_visible(&self, stories: Vec<Story>) -> Vec<Story> {
        let now = self.clock.now();
        let mut visible = Vec::with_capacity(stories.len());

        for story in stories {
            match self.policy.classify(now, &story) {
                ExpiryAction::Show => visible.push(story),
                ExpiryAction::Hide => {}
                ExpiryAction::Demote => self.demote(&story).await,
            }
        }

        visible
    }

    /// Persist the demotion. Failure is an operational concern only: the
    /// caller already treats the story as expired.
    async fn demote(&self, story: &Story) {
        match self.repo.demote(story.id).await {
            Ok(_) => {
                STORIES_DEMOTED_TOTAL.inc();
                tracing::debug!(
                    story_id = story.id,
                    created_at = %story.created_at,
                    "Story expired"
                );
            }
            Err(error) => {
                STORY_DEMOTION_FAILURES_TOTAL.inc();
                record_error(&error);
                tracing::error!(
                    story_id = story.id,
                    %error,
                    "Failed to persist story expiry"
                );
            }
        }
    }
}
