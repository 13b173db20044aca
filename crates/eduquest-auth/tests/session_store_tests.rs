use chrono::{Duration, Utc};
use eduquest_auth::auth::{hash_token, NewUser};
use eduquest_auth::models::{session, user};
use eduquest_auth::testing::test_app;
use eduquest_auth::{App, AuthError};
use sea_orm::EntityTrait;

async fn create_user(app: &App, email: &str) -> user::Model {
    app.credentials
        .create(NewUser {
            email: email.to_string(),
            password_hash: Some("digest".to_string()),
            name: "Test".to_string(),
            ..Default::default()
        })
        .await
        .expect("Failed to create user")
}

#[tokio::test]
async fn test_create_sets_expiry_from_window() {
    let app = test_app().await;
    let user = create_user(&app, "a@x.com").await;
    let issued_at = Utc::now().naive_utc();

    let session = app
        .sessions
        .create_at(&user.id, "token-a", issued_at, Duration::days(7))
        .await
        .expect("Failed to create session");

    assert_eq!(session.user_id, user.id);
    assert_eq!(session.created_at, issued_at);
    assert_eq!(session.expires_at, issued_at + Duration::days(7));
}

#[tokio::test]
async fn test_only_token_digest_is_stored() {
    let app = test_app().await;
    let user = create_user(&app, "a@x.com").await;

    let created = app
        .sessions
        .create(&user.id, "plain-token", Duration::days(7))
        .await
        .expect("create");

    let row = session::Entity::find_by_id(created.id)
        .one(&app.db)
        .await
        .expect("query")
        .expect("row");
    assert_ne!(row.token_hash, "plain-token");
    assert_eq!(row.token_hash, hash_token("plain-token"));
}

#[tokio::test]
async fn test_find_by_token() {
    let app = test_app().await;
    let user = create_user(&app, "a@x.com").await;
    app.sessions
        .create(&user.id, "token-a", Duration::days(7))
        .await
        .expect("create");

    let found = app.sessions.find_by_token("token-a").await.expect("find");
    assert_eq!(found.map(|s| s.user_id), Some(user.id));

    let missing = app.sessions.find_by_token("token-b").await.expect("find");
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_duplicate_token_conflicts() {
    let app = test_app().await;
    let user = create_user(&app, "a@x.com").await;
    app.sessions
        .create(&user.id, "token-a", Duration::days(7))
        .await
        .expect("create");

    let second = app.sessions.create(&user.id, "token-a", Duration::days(7)).await;
    assert!(matches!(second, Err(AuthError::Conflict(_))));
}

#[tokio::test]
async fn test_delete_by_token_is_idempotent() {
    let app = test_app().await;
    let user = create_user(&app, "a@x.com").await;
    app.sessions
        .create(&user.id, "token-a", Duration::days(7))
        .await
        .expect("create");

    assert!(app.sessions.delete_by_token("token-a").await.expect("delete"));
    assert!(!app.sessions.delete_by_token("token-a").await.expect("delete"));
    assert!(app.sessions.find_by_token("token-a").await.expect("find").is_none());
}

#[tokio::test]
async fn test_delete_all_for_user_leaves_other_users() {
    let app = test_app().await;
    let ann = create_user(&app, "ann@x.com").await;
    let bob = create_user(&app, "bob@x.com").await;

    for token in ["ann-1", "ann-2"] {
        app.sessions
            .create(&ann.id, token, Duration::days(7))
            .await
            .expect("create");
    }
    app.sessions
        .create(&bob.id, "bob-1", Duration::days(7))
        .await
        .expect("create");

    let removed = app.sessions.delete_all_for_user(&ann.id).await.expect("delete");
    assert_eq!(removed, 2);
    assert!(app.sessions.find_by_token("ann-1").await.expect("find").is_none());
    assert!(app.sessions.find_by_token("ann-2").await.expect("find").is_none());
    assert!(app.sessions.find_by_token("bob-1").await.expect("find").is_some());
}

#[tokio::test]
async fn test_purge_expired_removes_exactly_the_dead_sessions() {
    let app = test_app().await;
    let user = create_user(&app, "a@x.com").await;
    let now = Utc::now().naive_utc();
    let window = Duration::days(7);

    // Expired three days ago.
    app.sessions
        .create_at(&user.id, "old", now - Duration::days(10), window)
        .await
        .expect("create");
    // Expires exactly at `now`: not strictly before, so it stays.
    app.sessions
        .create_at(&user.id, "edge", now - Duration::days(7), window)
        .await
        .expect("create");
    app.sessions
        .create_at(&user.id, "fresh", now, window)
        .await
        .expect("create");

    assert_eq!(app.sessions.purge_expired(now).await.expect("purge"), 1);
    assert_eq!(app.sessions.purge_expired(now).await.expect("purge"), 0);

    assert!(app.sessions.find_by_token("old").await.expect("find").is_none());
    assert!(app.sessions.find_by_token("edge").await.expect("find").is_some());
    assert!(app.sessions.find_by_token("fresh").await.expect("find").is_some());
}

#[tokio::test]
async fn test_deleting_user_removes_sessions() {
    let app = test_app().await;
    let user = create_user(&app, "a@x.com").await;
    app.sessions
        .create(&user.id, "token-a", Duration::days(7))
        .await
        .expect("create");

    assert!(app.credentials.delete(&user.id).await.expect("delete"));
    assert!(app.sessions.find_by_token("token-a").await.expect("find").is_none());
}
