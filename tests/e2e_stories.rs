//! E2E tests for story expiry

mod common;

use chrono::Duration;
use common::TestApp;
use nexusfeed::data::ListQuery;
use nexusfeed::error::AppError;
use nexusfeed::service::ExpiryOutcome;

#[tokio::test]
async fn test_story_visible_within_ttl() {
    let app = TestApp::new().await;
    let stories = &app.state.models.stories;

    let story = stories.insert(7, "hello").await.unwrap();
    assert_eq!(story.created_at, TestApp::epoch());

    app.clock.advance(Duration::hours(23));
    let fetched = stories.get(story.id).await.unwrap();
    assert_eq!(fetched.content, "hello");
    assert_eq!(fetched.author_id, 7);
    assert!(app.stored_visibility(story.id).await);
}

#[tokio::test]
async fn test_story_expires_on_read() {
    let app = TestApp::new().await;
    let stories = &app.state.models.stories;

    let story = stories.insert(7, "hello").await.unwrap();

    app.clock.advance(Duration::hours(25));

    // Nobody has looked yet, so storage still says visible
    assert!(app.stored_visibility(story.id).await);

    assert!(matches!(
        stories.get(story.id).await,
        Err(AppError::RecordNotFound)
    ));
    assert!(!app.stored_visibility(story.id).await);

    assert!(stories.get_all_from_user(7).await.unwrap().is_empty());
    assert_eq!(
        stories.check(story.id).await.unwrap(),
        ExpiryOutcome::AlreadyExpired
    );
}

#[tokio::test]
async fn test_user_stories_mix_fresh_and_expired() {
    let app = TestApp::new().await;
    let stories = &app.state.models.stories;

    let old = stories.insert(7, "yesterday").await.unwrap();
    app.clock.advance(Duration::hours(24));
    let recent = stories.insert(7, "just now").await.unwrap();
    app.clock.advance(Duration::hours(1));

    let visible = stories.get_all_from_user(7).await.unwrap();
    assert_eq!(visible, vec![recent]);
    assert!(!app.stored_visibility(old.id).await);
}

#[tokio::test]
async fn test_story_feed_pagination_skips_expired() {
    let app = TestApp::new().await;
    let stories = &app.state.models.stories;

    for i in 0..3 {
        stories.insert(1, &format!("early {i}")).await.unwrap();
    }
    app.clock.advance(Duration::hours(12));
    for i in 0..4 {
        stories.insert(2, &format!("late {i}")).await.unwrap();
    }
    app.clock.advance(Duration::hours(13));

    let query = ListQuery::from_query_string("page_size=10");
    let page = stories.list_from_query(&query).await.unwrap();
    assert_eq!(page.len(), 4);
    assert!(page.items.iter().all(|story| story.author_id == 2));
    assert_eq!(page.metadata.total_records, 4);

    let query = ListQuery::from_query_string("page=2&page_size=3&sort=-id");
    let page = stories.list_from_query(&query).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page.items[0].content, "late 0");
    assert_eq!(page.metadata.current_page, 2);
    assert_eq!(page.metadata.last_page, 2);
}

#[tokio::test]
async fn test_story_feed_by_author_name() {
    let app = TestApp::new().await;
    let stories = &app.state.models.stories;

    let ann = app.create_user("Ann").await;
    let bob = app.create_user("Bob").await;
    stories.insert(ann, "from ann").await.unwrap();
    stories.insert(bob, "from bob").await.unwrap();

    let page = stories
        .list_from_query(&ListQuery::from_query_string("author_name=AN"))
        .await
        .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page.items[0].content, "from ann");
}

#[tokio::test]
async fn test_author_deletes_story() {
    let app = TestApp::new().await;
    let stories = &app.state.models.stories;

    let story = stories.insert(7, "oops").await.unwrap();
    assert!(matches!(
        stories.delete(story.id, 8).await,
        Err(AppError::RecordNotFound)
    ));

    // Expired stories can still be deleted by their author
    app.clock.advance(Duration::days(3));
    stories.delete(story.id, 7).await.unwrap();
    assert!(matches!(
        stories.check(story.id).await,
        Err(AppError::RecordNotFound)
    ));
}
