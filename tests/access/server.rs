//! End-to-end guard behavior against a running server.
//!
//! These tests start a real server, send raw HTTP/1.1 over TCP, and assert on
//! status lines, `Location` headers and bodies.

use std::net::SocketAddr;

use lectern::config::{Access, Auth, Config, Server as ServerConfig};
use lectern::guard::AuthGuard;
use lectern::{AdminModule, Module, Permission, Role, RoleGuard, User, auth, server};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            max_body_size: 1024,
            ..Default::default()
        },
        auth: Auth {
            jwt_secret: "test-secret-that-is-at-least-32b!".to_string(),
            token_expiry_days: 1,
        },
        access: Access::default(),
    }
}

fn token_for(user: &User) -> String {
    auth::create_token(&test_config().auth, user).expect("token")
}

/// Admin module plus a public `/ping`, an echo, and a hymn editor page
/// guarded by `content.update`.
async fn start_test_server() -> server::Server {
    let mut router = lectern::Router::new();
    AdminModule.routes(&mut router);

    router.get("/ping", |_ctx| async move {
        lectern::response::ok(&serde_json::json!({ "pong": true }))
    });

    router.post("/echo", |ctx| async move {
        let input: serde_json::Value = ctx.json()?;
        lectern::response::ok(&serde_json::json!({ "echoed": input }))
    });

    router.get_guarded(
        "/hymns/{id}/edit",
        AuthGuard::requiring(Permission::ContentUpdate),
        |ctx| async move {
            let id = ctx.require_param("id")?.to_string();
            lectern::response::ok(&serde_json::json!({ "editing": id }))
        },
    );

    router.get_guarded(
        "/admin/dashboard",
        RoleGuard::new(Role::Editor).at_least(),
        |_ctx| async move { lectern::response::ok(&serde_json::json!({ "dashboard": true })) },
    );

    server::start(test_config(), router.into_handle())
        .await
        .expect("failed to start test server")
}

async fn raw_request(addr: SocketAddr, payload: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).await.expect("failed to connect");
    stream.write_all(payload).await.expect("failed to write");

    let mut buf = Vec::new();
    let _ = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        stream.read_to_end(&mut buf),
    )
    .await;
    String::from_utf8_lossy(&buf).into_owned()
}

async fn get(addr: SocketAddr, path: &str, token: Option<&str>) -> String {
    let authorization = token
        .map(|t| format!("Authorization: Bearer {t}\r\n"))
        .unwrap_or_default();
    let request = format!(
        "GET {path} HTTP/1.1\r\nHost: localhost\r\n{authorization}Connection: close\r\n\r\n"
    );
    raw_request(addr, request.as_bytes()).await
}

fn status_line(response: &str) -> &str {
    response.lines().next().unwrap_or_default()
}

fn location(response: &str) -> Option<&str> {
    response.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        name.eq_ignore_ascii_case("location").then(|| value.trim())
    })
}

// ---------------------------------------------------------------------------
// Guards
// ---------------------------------------------------------------------------

/// An unauthenticated visitor is sent to login with the requested path.
#[tokio::test]
async fn anonymous_visitor_redirected_to_login_with_path() {
    let server = start_test_server().await;
    let response = get(server.addr(), "/hymns/7/edit?tab=pdf", None).await;
    server.shutdown().await.unwrap();

    assert!(status_line(&response).contains("307"), "got:\n{response}");
    assert_eq!(
        location(&response),
        Some("/login?redirect=%2Fhymns%2F7%2Fedit%3Ftab%3Dpdf")
    );
}

/// A signed-in user without the permission goes to the unauthorized page,
/// not to login.
#[tokio::test]
async fn signed_in_without_permission_redirected_to_unauthorized() {
    let server = start_test_server().await;
    let token = token_for(&User::with_role("v-1", "viewer"));
    let response = get(server.addr(), "/hymns/7/edit", Some(&token)).await;
    server.shutdown().await.unwrap();

    assert!(status_line(&response).contains("307"), "got:\n{response}");
    assert_eq!(location(&response), Some("/unauthorized"));
}

#[tokio::test]
async fn permitted_user_reaches_handler() {
    let server = start_test_server().await;
    let token = token_for(&User::with_role("c-1", "contributor"));
    let response = get(server.addr(), "/hymns/7/edit", Some(&token)).await;
    server.shutdown().await.unwrap();

    assert!(status_line(&response).contains("200"), "got:\n{response}");
    assert!(response.contains(r#""editing":"7""#));
}

/// An invalid token is treated exactly like no token.
#[tokio::test]
async fn garbage_token_is_anonymous() {
    let server = start_test_server().await;
    let response = get(server.addr(), "/api/me/permissions", Some("not.a.jwt")).await;
    server.shutdown().await.unwrap();

    assert_eq!(
        location(&response),
        Some("/login?redirect=%2Fapi%2Fme%2Fpermissions")
    );
}

#[tokio::test]
async fn hierarchical_role_guard_admits_admin() {
    let server = start_test_server().await;
    let admin = token_for(&User::with_role("a-1", "administrator"));
    let contributor = token_for(&User::with_role("c-1", "contributor"));
    let admitted = get(server.addr(), "/admin/dashboard", Some(&admin)).await;
    let refused = get(server.addr(), "/admin/dashboard", Some(&contributor)).await;
    server.shutdown().await.unwrap();

    assert!(status_line(&admitted).contains("200"), "got:\n{admitted}");
    assert_eq!(location(&refused), Some("/unauthorized"));
}

// ---------------------------------------------------------------------------
// Admin module
// ---------------------------------------------------------------------------

#[tokio::test]
async fn me_permissions_reports_effective_set() {
    let server = start_test_server().await;
    let token = token_for(&User::with_role("v-2", "viewer").permissions(["system.stats"]));
    let response = get(server.addr(), "/api/me/permissions", Some(&token)).await;
    server.shutdown().await.unwrap();

    assert!(status_line(&response).contains("200"), "got:\n{response}");
    assert!(response.contains(r#""permissions":["system.stats"]"#), "got:\n{response}");
    assert!(response.contains(r#""role":"viewer""#));
}

/// The admin navigation uses exact role matching: contributors are refused
/// and editors see a gated sidebar without the Users section.
#[tokio::test]
async fn admin_navigation_is_role_guarded_and_gated() {
    let server = start_test_server().await;
    let editor = token_for(&User::with_role("e-1", "editor"));
    let contributor = token_for(&User::with_role("c-2", "contributor"));
    let shown = get(server.addr(), "/api/admin/navigation", Some(&editor)).await;
    let refused = get(server.addr(), "/api/admin/navigation", Some(&contributor)).await;
    server.shutdown().await.unwrap();

    assert!(status_line(&shown).contains("200"), "got:\n{shown}");
    assert!(shown.contains("Add New Hymn"));
    assert!(!shown.contains("/admin/users"));
    assert_eq!(location(&refused), Some("/unauthorized"));
}

#[tokio::test]
async fn role_catalog_requires_system_settings() {
    let server = start_test_server().await;
    let admin = token_for(&User::with_role("a-2", "admin"));
    let editor = token_for(&User::with_role("e-2", "editor"));
    let allowed = get(server.addr(), "/api/admin/roles", Some(&admin)).await;
    let denied = get(server.addr(), "/api/admin/roles", Some(&editor)).await;
    server.shutdown().await.unwrap();

    assert!(status_line(&allowed).contains("200"), "got:\n{allowed}");
    assert!(allowed.contains(r#""bypass":true"#));
    assert_eq!(location(&denied), Some("/unauthorized"));
}

// ---------------------------------------------------------------------------
// Plumbing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unguarded_route_and_unknown_route() {
    let server = start_test_server().await;
    let ping = get(server.addr(), "/ping", None).await;
    let missing = get(server.addr(), "/nowhere", None).await;
    server.shutdown().await.unwrap();

    assert!(status_line(&ping).contains("200"));
    assert!(ping.to_ascii_lowercase().contains("x-frame-options: deny"));
    assert!(status_line(&missing).contains("404"));
}

#[tokio::test]
async fn oversized_body_rejected() {
    let server = start_test_server().await;
    let response = raw_request(
        server.addr(),
        b"POST /echo HTTP/1.1\r\nHost: localhost\r\nContent-Length: 4096\r\nConnection: close\r\n\r\n",
    )
    .await;
    server.shutdown().await.unwrap();

    assert!(status_line(&response).contains("413"), "got:\n{response}");
}

#[tokio::test]
async fn echo_round_trips_json() {
    let server = start_test_server().await;
    let body = r#"{"hymn":"Ave Maria"}"#;
    let request = format!(
        "POST /echo HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let response = raw_request(server.addr(), request.as_bytes()).await;
    server.shutdown().await.unwrap();

    assert!(status_line(&response).contains("200"), "got:\n{response}");
    assert!(response.contains("Ave Maria"));
}
