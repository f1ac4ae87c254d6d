//! E2E tests for posts, comments and direct messages

mod common;

use chrono::Duration;
use common::TestApp;
use nexusfeed::data::{Comment, Direct, ListQuery, Message, Post};
use nexusfeed::error::AppError;

#[tokio::test]
async fn test_post_lifecycle() {
    let app = TestApp::new().await;
    let posts = &app.state.models.posts;
    let author = app.create_user("Carol").await;

    let mut post = posts
        .insert(&Post::draft(author, "Hello", "first post"))
        .await
        .unwrap();

    app.clock.advance(Duration::minutes(10));
    post.description = "first post, edited".to_string();
    let updated = posts.update(&post).await.unwrap();
    assert_eq!(updated.description, "first post, edited");
    assert_eq!(updated.updated_at, TestApp::epoch() + Duration::minutes(10));

    posts.delete_owned(post.id, author).await.unwrap();
    assert!(matches!(
        posts.update(&post).await,
        Err(AppError::EditConflict)
    ));
}

#[tokio::test]
async fn test_post_feed_validation_reports_every_field() {
    let app = TestApp::new().await;

    let query = ListQuery::from_query_string("page=abc&page_size=0&sort=-password&author_id=1.5");
    match app.state.models.posts.list_from_query(&query).await {
        Err(AppError::ValidationFailed(errors)) => {
            assert_eq!(errors.len(), 4);
            assert_eq!(errors.get("page"), Some("must be an integer value"));
            assert_eq!(errors.get("page_size"), Some("must be greater than zero"));
            assert_eq!(errors.get("sort"), Some("invalid sort value"));
            assert_eq!(errors.get("author_id"), Some("must be an integer value"));
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_feed_metadata() {
    let app = TestApp::new().await;

    let page = app
        .state
        .models
        .posts
        .list_from_query(&ListQuery::default())
        .await
        .unwrap();

    assert!(page.is_empty());
    assert_eq!(page.metadata.total_records, 0);
    assert_eq!(page.metadata.current_page, 1);
    assert_eq!(page.metadata.page_size, 20);
    assert_eq!(page.metadata.last_page, 0);
}

#[tokio::test]
async fn test_comment_thread_paging() {
    let app = TestApp::new().await;
    let models = &app.state.models;

    let post = models
        .posts
        .insert(&Post::draft(1, "Discuss", ""))
        .await
        .unwrap();
    for i in 0..5 {
        models
            .comments
            .insert(&Comment::draft(2, post.id, format!("comment {i}")))
            .await
            .unwrap();
    }

    let query = ListQuery::from_query_string(&format!("post_id={}&page_size=2&page=3", post.id));
    let page = models.comments.list_from_query(&query).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page.items[0].content, "comment 4");
    assert_eq!(page.metadata.last_page, 3);
}

#[tokio::test]
async fn test_direct_conversation() {
    let app = TestApp::new().await;
    let models = &app.state.models;

    let direct = models.directs.insert(&Direct::between(1, 2)).await.unwrap();
    models
        .messages
        .insert(&Message::draft(direct.id, 1, "ping"))
        .await
        .unwrap();
    models
        .messages
        .insert(&Message::draft(direct.id, 2, "pong"))
        .await
        .unwrap();

    let page = models
        .directs
        .list_from_query(&ListQuery::from_query_string("user_id=2"))
        .await
        .unwrap();
    assert_eq!(page.items, vec![direct.clone()]);

    let conversation = models.messages.get_all_from_direct(direct.id).await.unwrap();
    let lines: Vec<_> = conversation.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(lines, vec!["ping", "pong"]);

    // Closing the conversation removes its messages
    models.directs.delete_owned(direct.id, 1).await.unwrap();
    assert!(models
        .messages
        .get_all_from_direct(direct.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_table_counts() {
    let app = TestApp::new().await;
    app.create_user("Dana").await;
    app.state.models.stories.insert(1, "hi").await.unwrap();

    let counts = app.state.db.table_counts().await.unwrap();
    let lookup = |name: &str| {
        counts
            .iter()
            .find(|(table, _)| *table == name)
            .map(|(_, count)| *count)
    };
    assert_eq!(lookup("users"), Some(1));
    assert_eq!(lookup("stories"), Some(1));
    assert_eq!(lookup("posts"), Some(0));
}
