use eduquest_auth::auth::ExternalProfile;
use eduquest_auth::error::REAUTHENTICATE_MESSAGE;
use eduquest_auth::testing::StubIdentityProvider;
use eduquest_auth::TestApp;

#[tokio::test]
async fn test_register_success() {
    let app = TestApp::new().await;

    let body = serde_json::json!({
        "email": "a@x.com",
        "password": "Passw0rd",
        "name": "Ann"
    });
    let res = app
        .client
        .post(&app.url("/api/auth/register"), &body.to_string())
        .await;

    assert_eq!(res.status, 201);
    assert!(res.is_success());

    let data = res.data();
    assert!(data["token"].is_string());
    assert_eq!(data["user"]["email"], "a@x.com");
    assert_eq!(data["user"]["name"], "Ann");
    assert_eq!(data["user"]["is_verified"], false);
    // password_hash should NOT be in the response
    assert!(data["user"]["password_hash"].is_null());
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let app = TestApp::new().await;
    app.register("dup@x.com", "Passw0rd", "One").await;

    let body = serde_json::json!({ "email": "dup@x.com", "password": "Passw0rd" });
    let res = app
        .client
        .post(&app.url("/api/auth/register"), &body.to_string())
        .await;

    assert_eq!(res.status, 409);
    assert!(!res.is_success());
    assert_eq!(res.error()["code"], "CONFLICT");
}

#[tokio::test]
async fn test_register_missing_fields() {
    let app = TestApp::new().await;

    let res = app
        .client
        .post(&app.url("/api/auth/register"), r#"{"email":"a@x.com"}"#)
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.error()["code"], "VALIDATION_ERROR");

    let res = app
        .client
        .post(&app.url("/api/auth/register"), "this is not json")
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.error()["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_login_and_me() {
    let app = TestApp::new().await;
    let (_, user) = app.register("a@x.com", "Passw0rd", "Ann").await;

    let token = app.login("a@x.com", "Passw0rd").await;
    let res = app
        .client
        .get_with_auth(&app.url("/api/auth/me"), &token)
        .await;

    assert_eq!(res.status, 200);
    assert_eq!(res.data()["id"], user["id"]);
    assert_eq!(res.data()["name"], "Ann");
    assert!(res.data()["last_login_at"].is_string());
}

#[tokio::test]
async fn test_login_failures_have_identical_bodies() {
    let app = TestApp::new().await;
    app.register("a@x.com", "Passw0rd", "Ann").await;

    let wrong = app
        .client
        .post(
            &app.url("/api/auth/login"),
            r#"{"email":"a@x.com","password":"wrong-password"}"#,
        )
        .await;
    let unknown = app
        .client
        .post(
            &app.url("/api/auth/login"),
            r#"{"email":"ghost@x.com","password":"Passw0rd"}"#,
        )
        .await;

    assert_eq!(wrong.status, 401);
    assert_eq!(unknown.status, 401);
    assert_eq!(wrong.body, unknown.body);
}

#[tokio::test]
async fn test_protected_route_without_token() {
    let app = TestApp::new().await;

    let res = app.client.get(&app.url("/api/auth/me")).await;

    assert_eq!(res.status, 401);
    assert_eq!(res.error()["code"], "UNAUTHENTICATED");
    assert_eq!(res.error()["message"], REAUTHENTICATE_MESSAGE);
}

#[tokio::test]
async fn test_protected_route_with_garbage_token() {
    let app = TestApp::new().await;

    let res = app
        .client
        .get_with_auth(&app.url("/api/auth/me"), "not-a-token")
        .await;

    assert_eq!(res.status, 403);
    assert_eq!(res.error()["code"], "UNAUTHENTICATED");
    assert_eq!(res.error()["message"], REAUTHENTICATE_MESSAGE);
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let app = TestApp::new().await;
    let (token, _) = app.register("a@x.com", "Passw0rd", "Ann").await;

    let res = app
        .client
        .post_with_auth(&app.url("/api/auth/logout"), &token, "{}")
        .await;
    assert_eq!(res.status, 200);

    let res = app
        .client
        .get_with_auth(&app.url("/api/auth/me"), &token)
        .await;
    assert_eq!(res.status, 403);
    assert_eq!(res.error()["message"], REAUTHENTICATE_MESSAGE);
}

#[tokio::test]
async fn test_logout_all() {
    let app = TestApp::new().await;
    let (first, _) = app.register("a@x.com", "Passw0rd", "Ann").await;
    let second = app.login("a@x.com", "Passw0rd").await;

    let res = app
        .client
        .post_with_auth(&app.url("/api/auth/logout-all"), &second, "{}")
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(res.data()["revoked"], 2);

    for token in [&first, &second] {
        let res = app
            .client
            .get_with_auth(&app.url("/api/auth/me"), token)
            .await;
        assert_eq!(res.status, 403);
    }
}

#[tokio::test]
async fn test_update_profile() {
    let app = TestApp::new().await;
    let (token, _) = app.register("a@x.com", "Passw0rd", "Ann").await;

    let res = app
        .client
        .put_with_auth(
            &app.url("/api/user/profile"),
            &token,
            r#"{"name":"Annie","avatar_url":"https://img.example.com/a.png"}"#,
        )
        .await;

    assert_eq!(res.status, 200);
    assert_eq!(res.data()["name"], "Annie");
    assert_eq!(res.data()["avatar_url"], "https://img.example.com/a.png");
}

#[tokio::test]
async fn test_change_email_endpoint() {
    let app = TestApp::new().await;
    let (token, _) = app.register("a@x.com", "Passw0rd", "Ann").await;

    let res = app
        .client
        .put_with_auth(
            &app.url("/api/user/profile/email"),
            &token,
            r#"{"new_email":"b@x.com","password":"Passw0rd"}"#,
        )
        .await;

    assert_eq!(res.status, 200);
    assert_eq!(res.data()["email"], "b@x.com");
    assert_eq!(res.data()["is_verified"], false);
}

#[tokio::test]
async fn test_change_password_endpoint() {
    let app = TestApp::new().await;
    let (token, _) = app.register("a@x.com", "Passw0rd", "Ann").await;

    let res = app
        .client
        .put_with_auth(
            &app.url("/api/user/profile/password"),
            &token,
            r#"{"current_password":"Passw0rd","new_password":"abc"}"#,
        )
        .await;
    assert_eq!(res.status, 400);

    let res = app
        .client
        .put_with_auth(
            &app.url("/api/user/profile/password"),
            &token,
            r#"{"current_password":"Passw0rd","new_password":"NewPass1"}"#,
        )
        .await;
    assert_eq!(res.status, 200);

    app.login("a@x.com", "NewPass1").await;
}

#[tokio::test]
async fn test_delete_account_endpoint() {
    let app = TestApp::new().await;
    let (token, _) = app.register("a@x.com", "Passw0rd", "Ann").await;

    let res = app
        .client
        .delete_with_auth(
            &app.url("/api/user/account"),
            &token,
            r#"{"confirmation":"yes please","password":"Passw0rd"}"#,
        )
        .await;
    assert_eq!(res.status, 400);

    let res = app
        .client
        .delete_with_auth(
            &app.url("/api/user/account"),
            &token,
            r#"{"confirmation":"DELETE MY ACCOUNT","password":"Passw0rd"}"#,
        )
        .await;
    assert_eq!(res.status, 200);

    let res = app
        .client
        .get_with_auth(&app.url("/api/auth/me"), &token)
        .await;
    assert_eq!(res.status, 403);

    let res = app
        .client
        .post(
            &app.url("/api/auth/login"),
            r#"{"email":"a@x.com","password":"Passw0rd"}"#,
        )
        .await;
    assert_eq!(res.status, 401);
}

#[tokio::test]
async fn test_google_login_not_configured() {
    let app = TestApp::new().await;

    let res = app.client.get(&app.url("/api/auth/google")).await;
    assert_eq!(res.status, 404);

    let res = app.client.get(&app.url("/api/auth/google/callback")).await;
    assert_eq!(res.status, 303);
    assert_eq!(
        res.location().as_deref(),
        Some("http://localhost:3000/login?error=provider_unavailable")
    );
}

#[tokio::test]
async fn test_google_login_flow() {
    let profile = ExternalProfile {
        external_id: "g-1".to_string(),
        email: "gina@x.com".to_string(),
        display_name: "Gina".to_string(),
        avatar_url: None,
    };
    let app = TestApp::with_provider(StubIdentityProvider::new().with_profile("code-1", profile))
        .await;

    let res = app.client.get(&app.url("/api/auth/google")).await;
    assert_eq!(res.status, 303);
    assert_eq!(
        res.location().as_deref(),
        Some("https://id.example.test/authorize?client_id=stub")
    );

    let res = app
        .client
        .get(&app.url("/api/auth/google/callback?code=code-1"))
        .await;
    assert_eq!(res.status, 303);

    let location = reqwest::Url::parse(&res.location().expect("location")).expect("url");
    assert_eq!(location.host_str(), Some("localhost"));
    let token = location
        .query_pairs()
        .find(|(k, _)| k == "token")
        .map(|(_, v)| v.into_owned())
        .expect("token in redirect");

    let res = app
        .client
        .get_with_auth(&app.url("/api/auth/me"), &token)
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(res.data()["email"], "gina@x.com");
    assert_eq!(res.data()["is_verified"], true);
    assert_eq!(res.data()["has_password"], false);
}

#[tokio::test]
async fn test_google_callback_failures_redirect_to_login() {
    let app = TestApp::with_provider(StubIdentityProvider::new()).await;

    let res = app
        .client
        .get(&app.url("/api/auth/google/callback?code=unknown"))
        .await;
    assert_eq!(res.status, 303);
    assert_eq!(
        res.location().as_deref(),
        Some("http://localhost:3000/login?error=authentication_failed")
    );

    let res = app
        .client
        .get(&app.url("/api/auth/google/callback?error=access_denied"))
        .await;
    assert_eq!(
        res.location().as_deref(),
        Some("http://localhost:3000/login?error=access_denied")
    );

    let res = app.client.get(&app.url("/api/auth/google/callback")).await;
    assert_eq!(
        res.location().as_deref(),
        Some("http://localhost:3000/login?error=authentication_failed")
    );
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = TestApp::new().await;

    let res = app.client.get(&app.url("/api-docs/openapi.json")).await;
    assert_eq!(res.status, 200);

    let doc = res.json();
    assert!(doc["paths"]["/api/auth/register"].is_object());
    assert!(doc["paths"]["/api/user/account"]["delete"].is_object());
    assert!(doc["components"]["securitySchemes"]["bearer_auth"].is_object());
}
