//! HTTP API tests. Requests go straight to the router through
//! `tower::ServiceExt::oneshot`, no socket involved.

mod common;

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use novella::server::{AppState, create_router};

struct TestApp {
    router: Router,
}

impl TestApp {
    fn new() -> Self {
        let state = Arc::new(AppState::new(Arc::new(common::memory_store())));
        Self {
            router: create_router(state),
        }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn register(&self, name: &str) -> (i64, String) {
        let (status, body) = self
            .send(
                Method::POST,
                "/auth/register",
                None,
                Some(json!({
                    "username": name,
                    "email": format!("{name}@example.com"),
                    "password": "secret",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        (
            body["data"]["user"]["id"].as_i64().unwrap(),
            body["data"]["token"].as_str().unwrap().to_string(),
        )
    }

    async fn create_novel(&self, token: &str, title: &str, status: &str) -> i64 {
        let (code, body) = self
            .send(
                Method::POST,
                "/novels",
                Some(token),
                Some(json!({ "title": title, "status": status })),
            )
            .await;
        assert_eq!(code, StatusCode::CREATED);
        body["data"]["id"].as_i64().unwrap()
    }
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let response = app
        .router
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_register_login_me_logout() {
    let app = TestApp::new();
    let (id, token) = app.register("alice").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({"username": "other", "email": "ALICE@example.com", "password": "x"})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["data"].is_null());
    assert!(body["error"].is_string());

    let (status, body) = app.send(Method::GET, "/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], id);
    assert!(body["data"].get("password_hash").is_none());

    let (status, body) = app
        .send(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({"email": "alice@example.com", "password": "secret"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let second = body["data"]["token"].as_str().unwrap().to_string();
    assert_ne!(second, token);

    let (status, _) = app
        .send(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({"email": "alice@example.com", "password": "wrong"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.send(Method::POST, "/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.send(Method::GET, "/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.send(Method::GET, "/me", Some(&second), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = TestApp::new();
    let response = app
        .router
        .clone()
        .oneshot(
            Request::post("/novels")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"title":"N"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));

    let (status, _) = app
        .send(Method::GET, "/me", Some("nvl_not-a-real-token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_draft_visibility_over_http() {
    let app = TestApp::new();
    let (_, alice) = app.register("alice").await;
    let (_, bob) = app.register("bob").await;
    let id = app.create_novel(&alice, "Secret", "draft").await;
    let uri = format!("/novels/{id}");

    let (status, _) = app.send(Method::GET, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.send(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(Method::GET, "/novels?include_drafts=true", Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    let (status, body) = app
        .send(
            Method::PATCH,
            &uri,
            Some(&alice),
            Some(json!({"status": "Published"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "published");

    let (status, body) = app.send(Method::GET, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Secret");

    let (status, _) = app.send(Method::DELETE, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.send(Method::DELETE, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.send(Method::GET, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_status_is_bad_request() {
    let app = TestApp::new();
    let (_, alice) = app.register("alice").await;
    let (status, body) = app
        .send(
            Method::POST,
            "/novels",
            Some(&alice),
            Some(json!({"title": "N", "status": "archived"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_chapters_comments_and_bookmarks() {
    let app = TestApp::new();
    let (_, alice) = app.register("alice").await;
    let (_, bob) = app.register("bob").await;
    let novel = app.create_novel(&alice, "Saga", "published").await;

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/novels/{novel}/chapters"),
            Some(&alice),
            Some(json!({"title": "Later", "content": "...", "position": 3})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let chapter = body["data"]["id"].as_i64().unwrap();

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/novels/{novel}/chapters"),
            Some(&bob),
            Some(json!({"title": "Intruder"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(
            Method::GET,
            &format!("/novels/{novel}/chapters/{chapter}"),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["position"], 3);

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/novels/{novel}/comments"),
            Some(&bob),
            Some(json!({"body": "Loved it", "chapter_id": chapter})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let comment = body["data"]["id"].as_i64().unwrap();

    let (status, body) = app
        .send(
            Method::GET,
            &format!("/novels/{novel}/comments?chapter_id={chapter}"),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/novels/{novel}/bookmark"),
            Some(&bob),
            Some(json!({"chapter_id": chapter})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["chapter_position"], 3);

    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/novels/{novel}/chapters/{chapter}"),
            Some(&alice),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app
        .send(Method::GET, "/me/bookmarks", Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let bookmarks = body["data"].as_array().unwrap();
    assert_eq!(bookmarks.len(), 1);
    assert!(bookmarks[0].get("chapter_id").is_none());
    assert!(bookmarks[0].get("chapter_position").is_none());

    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/novels/{novel}/comments/{comment}"),
            Some(&alice),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/novels/{novel}/bookmark"),
            Some(&bob),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/novels/{novel}/bookmark"),
            Some(&bob),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_novels_query_params() {
    let app = TestApp::new();
    let (_, alice) = app.register("alice").await;
    for title in ["Alpha", "Beta", "Gamma"] {
        app.create_novel(&alice, title, "published").await;
    }

    let (status, body) = app
        .send(Method::GET, "/novels?offset=1000", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    let (_, body) = app.send(Method::GET, "/novels?limit=2", None, None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, body) = app.send(Method::GET, "/novels?q=beta", None, None).await;
    let found = body["data"].as_array().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["title"], "Beta");
}

#[tokio::test]
async fn test_bookmark_without_body_marks_novel() {
    let app = TestApp::new();
    let (_, alice) = app.register("alice").await;
    let novel = app.create_novel(&alice, "Saga", "published").await;

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/novels/{novel}/bookmark"),
            Some(&alice),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["novel_id"], novel);
    assert!(body["data"].get("chapter_id").is_none());
}
