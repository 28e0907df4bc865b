mod common;

use std::collections::HashMap;

use chrono::Duration;
use common::TestApp;
use common::PASSWORD;
use identity_service::domain::identity::models::LoginHandle;
use identity_service::domain::identity::ports::IdentityRepository;
use reqwest::StatusCode;
use serde_json::json;

async fn signup(app: &TestApp, handle: &str) -> reqwest::Response {
    app.post("/api/auth/signup")
        .json(&json!({
            "handle": handle,
            "password": PASSWORD,
            "display_name": "Nicola"
        }))
        .send()
        .await
        .expect("Failed to execute request")
}

#[tokio::test]
async fn test_signup_success() {
    let app = TestApp::spawn().await;

    let response = signup(&app, "Nicola@Example.com").await;

    assert_eq!(response.status(), StatusCode::CREATED);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status_code"], 201);
    assert_eq!(body["data"]["handle"], "nicola@example.com");
    assert_eq!(body["data"]["display_name"], "Nicola");
    assert_eq!(body["data"]["roles"], json!(["SPECTATOR"]));
    assert!(body["data"]["id"].is_string());
    assert!(body["data"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_signup_duplicate_handle() {
    let app = TestApp::spawn().await;

    assert_eq!(signup(&app, "nicola").await.status(), StatusCode::CREATED);

    let response = signup(&app, "nicola").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert!(body["data"]["message"]
        .as_str()
        .unwrap()
        .contains("already exists"));
    assert_eq!(app.identities.list_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_concurrent_signups_store_one_identity() {
    let app = TestApp::spawn().await;

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let client = app.api_client.clone();
            let url = format!("{}/api/auth/signup", app.address);
            tokio::spawn(async move {
                client
                    .post(url)
                    .json(&json!({ "handle": "race@example.com", "password": PASSWORD }))
                    .send()
                    .await
                    .expect("Failed to execute request")
                    .status()
            })
        })
        .collect();

    let mut statuses = Vec::new();
    for task in tasks {
        statuses.push(task.await.unwrap());
    }

    assert_eq!(
        statuses.iter().filter(|s| **s == StatusCode::CREATED).count(),
        1
    );
    assert!(statuses
        .iter()
        .all(|s| *s == StatusCode::CREATED || *s == StatusCode::CONFLICT));
    assert_eq!(app.identities.list_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_signup_invalid_input() {
    let app = TestApp::spawn().await;

    let response = app
        .post("/api/auth/signup")
        .json(&json!({ "handle": "nicola@", "password": PASSWORD }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = app
        .post("/api/auth/signup")
        .json(&json!({ "handle": "nicola", "password": "short" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_login_success() {
    let app = TestApp::spawn().await;
    signup(&app, "nicola@example.com").await;

    let response = app
        .post("/api/auth/login")
        .json(&json!({ "handle": "nicola@example.com", "password": PASSWORD }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["expires_in"], 3_600_000);
    assert_eq!(body["data"]["user"]["handle"], "nicola@example.com");
    assert!(body["data"]["user"]["last_login"].is_string());

    let token = body["data"]["token"].as_str().unwrap();
    let claims = app.jwt_handler.parse(token).expect("Token should verify");
    assert_eq!(claims.sub, "nicola@example.com");
    assert_eq!(claims.exp - claims.iat, 3600);
    assert_eq!(claims.extra_strings("roles"), vec!["SPECTATOR"]);
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = TestApp::spawn().await;
    signup(&app, "nicola@example.com").await;

    let wrong_password = app
        .post("/api/auth/login")
        .json(&json!({ "handle": "nicola@example.com", "password": "wrong_password" }))
        .send()
        .await
        .expect("Failed to execute request");
    let unknown_handle = app
        .post("/api/auth/login")
        .json(&json!({ "handle": "ghost@example.com", "password": PASSWORD }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_handle.status(), StatusCode::UNAUTHORIZED);

    let wrong_password: serde_json::Value = wrong_password.json().await.unwrap();
    let unknown_handle: serde_json::Value = unknown_handle.json().await.unwrap();
    assert_eq!(wrong_password, unknown_handle);
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let app = TestApp::spawn().await;

    let response = app
        .get("/api/users/me")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_failures_are_unauthorized() {
    let app = TestApp::spawn().await;
    let token = app.token_for("nicola", &["SPECTATOR"]).await;

    let expired = app
        .jwt_handler
        .issue("nicola", HashMap::new(), Duration::seconds(-10))
        .unwrap();

    let mut tampered = token.into_bytes();
    let position = tampered.len() - 10;
    tampered[position] = if tampered[position] == b'A' { b'B' } else { b'A' };
    let tampered = String::from_utf8(tampered).unwrap();

    let unknown_subject = app
        .jwt_handler
        .issue("ghost", HashMap::new(), Duration::hours(1))
        .unwrap();

    let mut messages = Vec::new();
    for token in [expired.as_str(), tampered.as_str(), unknown_subject.as_str(), "garbage"] {
        let response = app
            .get_authenticated("/api/users/me", token)
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "token: {token}");

        let body: serde_json::Value = response.json().await.unwrap();
        messages.push(body["data"]["message"].clone());
    }

    // No failure reason reaches the client
    assert!(messages.windows(2).all(|pair| pair[0] == pair[1]));
}

#[tokio::test]
async fn test_current_identity_ignores_spoofed_header() {
    let app = TestApp::spawn().await;
    let victim = app.create_identity("victim", &["ADMIN"]).await;
    let token = app.token_for("nicola", &["SPECTATOR"]).await;

    let response = app
        .get_authenticated("/api/users/me", &token)
        .header("X-User-Id", victim.id.to_string())
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["handle"], "nicola");
}

#[tokio::test]
async fn test_spoofed_header_without_token_is_rejected() {
    let app = TestApp::spawn().await;
    let victim = app.create_identity("victim", &["ADMIN"]).await;

    let response = app
        .get("/api/users/me")
        .header("X-User-Id", victim.id.to_string())
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_get_identity_by_id() {
    let app = TestApp::spawn().await;
    let other = app.create_identity("other", &["VOLUNTEER"]).await;
    let token = app.token_for("nicola", &["SPECTATOR"]).await;

    let response = app
        .get_authenticated(&format!("/api/users/{}", other.id), &token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["handle"], "other");
    assert_eq!(body["data"]["roles"], json!(["VOLUNTEER"]));

    let response = app
        .get_authenticated(
            "/api/users/00000000-0000-0000-0000-000000000000",
            &token,
        )
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_role_routes_forbid_under_privileged() {
    let app = TestApp::spawn().await;
    let token = app.token_for("nicola", &["SPECTATOR"]).await;

    for path in ["/api/users", "/api/roles"] {
        let response = app
            .get_authenticated(path, &token)
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "path: {path}");
    }

    let response = app
        .post_authenticated("/api/users", &token)
        .json(&json!({ "handle": "root", "password": PASSWORD }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(app
        .identities
        .find_by_handle(&LoginHandle::new("root".to_string()).unwrap())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_commissioner_lists_identities() {
    let app = TestApp::spawn().await;
    app.create_identity("spectator", &["SPECTATOR"]).await;
    let token = app.token_for("commissioner", &["COMMISSIONER"]).await;

    let response = app
        .get_authenticated("/api/users", &token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    // Listing is not enough for administration
    let response = app
        .get_authenticated("/api/roles", &token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_multi_role_identity_matches_any_role() {
    let app = TestApp::spawn().await;
    let token = app
        .token_for("volunteer", &["VOLUNTEER", "COMMISSIONER"])
        .await;

    let response = app
        .get_authenticated("/api/users", &token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_admin_workflow() {
    let app = TestApp::spawn().await;
    let token = app.token_for("admin", &["ADMIN"]).await;

    let response = app
        .post_authenticated("/api/users", &token)
        .json(&json!({ "handle": "second-admin", "password": PASSWORD }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["roles"], json!(["ADMIN"]));

    // The new administrator can use its privileges straight away
    let second = app.login("second-admin", PASSWORD).await;
    let response = app
        .get_authenticated("/api/roles", &second)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|role| role["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["ADMIN", "COMMISSIONER", "SPECTATOR", "VOLUNTEER"]);
}

/// Look up a seeded role's id through the listing endpoint
async fn role_id(app: &TestApp, token: &str, name: &str) -> String {
    let body: serde_json::Value = app
        .get_authenticated("/api/roles", token)
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Failed to parse response");

    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|role| role["name"] == name)
        .and_then(|role| role["id"].as_str())
        .expect("Role should be seeded")
        .to_string()
}

#[tokio::test]
async fn test_role_lifecycle() {
    let app = TestApp::spawn().await;
    let token = app.token_for("admin", &["ADMIN"]).await;

    let response = app
        .post_authenticated("/api/roles", &token)
        .json(&json!({ "name": "referee", "description": "Match officials" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["name"], "REFEREE");
    assert_eq!(body["data"]["description"], "Match officials");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let response = app
        .get_authenticated(&format!("/api/roles/{id}"), &token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["name"], "REFEREE");

    let response = app
        .post_authenticated("/api/roles", &token)
        .json(&json!({ "name": "REFEREE" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .delete_authenticated(&format!("/api/roles/{id}"), &token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["id"], id.as_str());

    for response in [
        app.get_authenticated(&format!("/api/roles/{id}"), &token).send().await,
        app.delete_authenticated(&format!("/api/roles/{id}"), &token).send().await,
    ] {
        assert_eq!(
            response.expect("Failed to execute request").status(),
            StatusCode::NOT_FOUND
        );
    }
}

#[tokio::test]
async fn test_role_input_is_validated() {
    let app = TestApp::spawn().await;
    let token = app.token_for("admin", &["ADMIN"]).await;

    let response = app
        .get_authenticated("/api/roles/not-a-uuid", &token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .post_authenticated("/api/roles", &token)
        .json(&json!({ "name": "   " }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_delete_role_in_use_conflicts() {
    let app = TestApp::spawn().await;
    let token = app.token_for("admin", &["ADMIN"]).await;
    app.create_identity("volunteer", &["VOLUNTEER"]).await;

    // Held by an identity, then the signup default and the administrator role
    for name in ["VOLUNTEER", "SPECTATOR", "ADMIN"] {
        let id = role_id(&app, &token, name).await;
        let response = app
            .delete_authenticated(&format!("/api/roles/{id}"), &token)
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), StatusCode::CONFLICT, "role: {name}");
    }

    // Unassigned roles can go
    let id = role_id(&app, &token, "COMMISSIONER").await;
    let response = app
        .delete_authenticated(&format!("/api/roles/{id}"), &token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_role_administration_requires_admin() {
    let app = TestApp::spawn().await;
    let admin = app.token_for("admin", &["ADMIN"]).await;
    let token = app.token_for("commissioner", &["COMMISSIONER"]).await;
    let id = role_id(&app, &admin, "VOLUNTEER").await;

    let response = app
        .post_authenticated("/api/roles", &token)
        .json(&json!({ "name": "REFEREE" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    for response in [
        app.get_authenticated(&format!("/api/roles/{id}"), &token).send().await,
        app.delete_authenticated(&format!("/api/roles/{id}"), &token).send().await,
    ] {
        assert_eq!(
            response.expect("Failed to execute request").status(),
            StatusCode::FORBIDDEN
        );
    }

    // Nothing changed
    assert_eq!(role_id(&app, &admin, "VOLUNTEER").await, id);
}

#[tokio::test]
async fn test_disabled_identity_cannot_log_in() {
    let app = TestApp::spawn().await;
    let admin = app.token_for("admin", &["ADMIN"]).await;
    let nicola = app.create_identity("nicola", &["SPECTATOR"]).await;
    let token = app.login("nicola", PASSWORD).await;
    let path = format!("/api/users/{}/enabled", nicola.id);

    let response = app
        .put_authenticated(&path, &admin)
        .json(&json!({ "enabled": false }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["enabled"], false);

    let disabled = app
        .post("/api/auth/login")
        .json(&json!({ "handle": "nicola", "password": PASSWORD }))
        .send()
        .await
        .expect("Failed to execute request");
    let wrong_password = app
        .post("/api/auth/login")
        .json(&json!({ "handle": "admin", "password": "wrong_password" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(disabled.status(), StatusCode::UNAUTHORIZED);
    let disabled: serde_json::Value = disabled.json().await.unwrap();
    let wrong_password: serde_json::Value = wrong_password.json().await.unwrap();
    assert_eq!(disabled, wrong_password);

    // Tokens issued before the change run out on their own
    let response = app
        .get_authenticated("/api/users/me", &token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .put_authenticated(&path, &admin)
        .json(&json!({ "enabled": true }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);
    app.login("nicola", PASSWORD).await;
}

#[tokio::test]
async fn test_set_enabled_requires_admin_and_known_identity() {
    let app = TestApp::spawn().await;
    let admin = app.token_for("admin", &["ADMIN"]).await;
    let token = app.token_for("nicola", &["COMMISSIONER"]).await;
    let target = app.create_identity("target", &["SPECTATOR"]).await;

    let response = app
        .put_authenticated(&format!("/api/users/{}/enabled", target.id), &token)
        .json(&json!({ "enabled": false }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(app
        .identities
        .find_by_id(&target.id)
        .await
        .unwrap()
        .unwrap()
        .enabled);

    let response = app
        .put_authenticated(
            "/api/users/00000000-0000-0000-0000-000000000000/enabled",
            &admin,
        )
        .json(&json!({ "enabled": false }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
