use chrono::{Duration, Utc};
use eduquest_auth::auth::jwt::{TokenError, TokenService};

fn service() -> TokenService {
    TokenService::new("test-secret", Duration::days(7))
}

#[test]
fn test_issue_and_verify_round_trip_claims() {
    let tokens = service();
    let token = tokens
        .issue("user-1", "ann@example.com", "Ann")
        .expect("Failed to issue token");

    let claims = tokens.verify(&token).expect("Failed to verify token");
    assert_eq!(claims.sub, "user-1");
    assert_eq!(claims.email, "ann@example.com");
    assert_eq!(claims.name, "Ann");
}

#[test]
fn test_validity_window_is_seven_days() {
    let tokens = service();
    let token = tokens.issue("user-1", "a@x.com", "A").expect("issue");
    let claims = tokens.verify(&token).expect("verify");

    assert_eq!(claims.exp - claims.iat, Duration::days(7).num_seconds());
}

#[test]
fn test_tokens_issued_together_are_distinct() {
    let tokens = service();
    let now = Utc::now();
    let a = tokens.issue_at("user-1", "a@x.com", "A", now).expect("issue");
    let b = tokens.issue_at("user-1", "a@x.com", "A", now).expect("issue");

    assert_ne!(a, b);
}

#[test]
fn test_expired_token_is_reported_as_expired() {
    let tokens = service();
    let token = tokens
        .issue_at("user-1", "a@x.com", "A", Utc::now() - Duration::days(8))
        .expect("issue");

    assert_eq!(tokens.verify(&token), Err(TokenError::Expired));
}

#[test]
fn test_wrong_secret_is_forged() {
    let token = service().issue("user-1", "a@x.com", "A").expect("issue");
    let other = TokenService::new("another-secret", Duration::days(7));

    assert_eq!(other.verify(&token), Err(TokenError::MalformedOrForged));
}

#[test]
fn test_tampered_payload_is_forged() {
    let tokens = service();
    let token = tokens.issue("user-1", "a@x.com", "A").expect("issue");
    let forged_payload = tokens
        .issue("user-2", "b@x.com", "B")
        .expect("issue")
        .split('.')
        .nth(1)
        .expect("payload")
        .to_string();

    let mut parts: Vec<&str> = token.split('.').collect();
    parts[1] = &forged_payload;
    let tampered = parts.join(".");

    assert_eq!(tokens.verify(&tampered), Err(TokenError::MalformedOrForged));
}

#[test]
fn test_garbage_is_malformed() {
    let tokens = service();
    for token in ["", "not.a.token", "random_string", "eyJhbGciOiJIUzI1NiJ9.e30"] {
        assert_eq!(
            tokens.verify(token),
            Err(TokenError::MalformedOrForged),
            "should reject {token:?}"
        );
    }
}
