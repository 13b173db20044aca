use eduquest_auth::auth::password::{burn_verification, hash_password, verify_password};

#[test]
fn test_hash_and_verify() {
    let digest = hash_password("Passw0rd").expect("Failed to hash");
    assert!(verify_password("Passw0rd", &digest));
}

#[test]
fn test_wrong_password_does_not_verify() {
    let digest = hash_password("Passw0rd").expect("Failed to hash");
    assert!(!verify_password("passw0rd", &digest));
    assert!(!verify_password("", &digest));
}

#[test]
fn test_digest_is_salted_argon2id() {
    let a = hash_password("same-password").expect("Failed to hash");
    let b = hash_password("same-password").expect("Failed to hash");

    assert!(a.starts_with("$argon2id$"));
    assert_ne!(a, b, "two hashes of the same password must differ");
    assert!(!a.contains("same-password"));
}

#[test]
fn test_malformed_digest_fails_closed() {
    for digest in ["", "plaintext", "$argon2id$v=19$garbage", "$2b$12$notanargon2hash"] {
        assert!(
            !verify_password("anything", digest),
            "malformed digest must not verify: {digest}"
        );
    }
}

#[test]
fn test_burn_verification_is_callable_repeatedly() {
    burn_verification("whatever");
    burn_verification("");
}
