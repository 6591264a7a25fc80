//! Session token tests.
//!
//! Tokens carry the profile the evaluator reads, so a forged or stale token
//! must never turn into an authenticated session.

use lectern::auth;
use lectern::config::Auth as AuthConfig;
use lectern::{SessionState, User};

fn config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "real_secret_that_is_at_least_32b!".to_string(),
        token_expiry_days: 30,
    }
}

/// Secrets shorter than 32 bytes are rejected at the JWT layer.
#[test]
fn rejects_short_secret() {
    let short = AuthConfig {
        jwt_secret: "x".to_string(),
        token_expiry_days: 30,
    };
    assert!(auth::create_token(&short, &User::new("u-1")).is_err());
}

/// A token forged with `"alg":"none"` claiming admin must be rejected.
#[test]
fn rejects_none_algorithm_admin_token() {
    use base64::Engine;
    let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
    let header = engine.encode(r#"{"alg":"none","typ":"JWT"}"#);
    let payload = engine.encode(
        serde_json::json!({"sub":"mallory","exp":9999999999i64,"iat":1700000000,"role":"admin"})
            .to_string(),
    );
    let forged = format!("{header}.{payload}.");

    assert!(auth::verify_token(&config(), &forged).is_err());

    let mut headers = hyper::http::HeaderMap::new();
    headers.insert("Authorization", format!("Bearer {forged}").parse().unwrap());
    assert_eq!(
        SessionState::from_headers(&headers, &config()),
        SessionState::Unauthenticated
    );
}

/// Rotating the signing key signs everyone out.
#[test]
fn key_rotation_invalidates_sessions() {
    let token = auth::create_token(&config(), &User::with_role("u-1", "editor")).unwrap();
    let rotated = AuthConfig {
        jwt_secret: "new_secret_key_production_32byte!".to_string(),
        token_expiry_days: 30,
    };
    assert!(auth::verify_token(&rotated, &token).is_err());
}

/// Lowercase `bearer` is accepted (RFC 7235).
#[test]
fn bearer_scheme_is_case_insensitive() {
    let token = auth::create_token(&config(), &User::with_role("u-1", "viewer")).unwrap();
    let mut headers = hyper::http::HeaderMap::new();
    headers.insert("Authorization", format!("bearer {token}").parse().unwrap());
    let state = SessionState::from_headers(&headers, &config());
    assert_eq!(state.user().map(|u| u.id.as_str()), Some("u-1"));
}
