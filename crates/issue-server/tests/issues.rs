mod common;

use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    http::{
        Method, Request, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
};
use common::spawn_app;
use issue_server::db::projects::ProjectRepository;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tower::ServiceExt;
use uuid::Uuid;

#[tokio::test]
async fn create_rejects_malformed_target() {
    let app = spawn_app().await;

    for target in [json!("not-a-uuid"), json!(null)] {
        let response = app
            .send(
                Method::POST,
                "/api/v1/issues",
                json!({ "target": target, "summary": "Reflected XSS", "severity": "high" }),
            )
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body["error"], "Target is wrong");
    }

    assert_eq!(app.issue_count().await, 0);
}

#[tokio::test]
async fn create_rejects_unknown_target() {
    let app = spawn_app().await;

    let response = app
        .send(
            Method::POST,
            "/api/v1/issues",
            json!({
                "target": Uuid::new_v4().to_string(),
                "summary": "Reflected XSS",
                "severity": "high",
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Target not found");
    assert_eq!(app.issue_count().await, 0);
}

#[tokio::test]
async fn create_rejects_invalid_entity() {
    let app = spawn_app().await;
    let target = app.target.id.to_string();

    let too_short = app
        .send(
            Method::POST,
            "/api/v1/issues",
            json!({ "target": target, "summary": "ab", "severity": "high" }),
        )
        .await;
    assert_eq!(too_short.status, StatusCode::BAD_REQUEST);
    assert!(
        too_short.body["error"]
            .as_str()
            .unwrap()
            .starts_with("Validation error")
    );

    let no_severity = app
        .send(
            Method::POST,
            "/api/v1/issues",
            json!({ "target": target, "summary": "Reflected XSS" }),
        )
        .await;
    assert_eq!(no_severity.status, StatusCode::BAD_REQUEST);

    let bad_severity = app
        .send(
            Method::POST,
            "/api/v1/issues",
            json!({ "target": target, "summary": "Reflected XSS", "severity": "urgent" }),
        )
        .await;
    assert_eq!(bad_severity.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_severity.body["error"], "wrong entity");

    assert_eq!(app.issue_count().await, 0);
}

#[tokio::test]
async fn create_requires_project_permission() {
    let app = spawn_app().await;
    let (_, token) = app.other_user(false).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/issues",
            Some(&token),
            Some(json!({
                "target": app.target.id.to_string(),
                "summary": "Reflected XSS",
                "severity": "high",
            })),
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(app.issue_count().await, 0);
}

#[tokio::test]
async fn create_reads_body_before_leasing_connection() {
    let app = spawn_app().await;
    let (body_tx, body_rx) = mpsc::channel::<Result<Bytes, std::io::Error>>(1);
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/issues")
        .header(AUTHORIZATION, format!("Bearer {}", app.token))
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from_stream(ReceiverStream::new(body_rx)))
        .unwrap();
    let in_flight = tokio::spawn(app.router.clone().oneshot(request));

    // Authentication finishes, then the handler waits on the body.
    tokio::time::sleep(Duration::from_millis(200)).await;
    let conn = tokio::time::timeout(Duration::from_secs(2), app.pool.acquire())
        .await
        .expect("connection held while the request body is still streaming")
        .unwrap();
    drop(conn);

    let body = json!({
        "target": app.target.id.to_string(),
        "summary": "Reflected XSS",
        "severity": "high",
    });
    body_tx.send(Ok(Bytes::from(body.to_string()))).await.unwrap();
    drop(body_tx);

    let response = in_flight.await.unwrap().unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(app.issue_count().await, 1);
}

#[tokio::test]
async fn create_stamps_project_and_report_activity() {
    let app = spawn_app().await;

    let issue = app.create_issue("Reflected XSS", "high").await;

    assert!(Uuid::parse_str(issue["id"].as_str().unwrap()).is_ok());
    assert_eq!(issue["project"], app.project.id.to_string());
    assert_eq!(issue["target"], app.target.id.to_string());
    assert_eq!(issue["severity"], "high");
    assert_eq!(issue["false"], false);

    let activities = issue["activities"].as_array().unwrap();
    assert_eq!(activities.len(), 1);
    assert_eq!(activities[0]["type"], "reported");
    assert_eq!(activities[0]["user"], app.user.id.to_string());

    let fetched = app
        .get(&format!("/api/v1/issues/{}", issue["id"].as_str().unwrap()))
        .await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body, issue);
}

#[tokio::test]
async fn get_validates_and_resolves_id() {
    let app = spawn_app().await;

    let malformed = app.get("/api/v1/issues/not-a-uuid").await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
    assert_eq!(malformed.body["error"], "wrong id format");

    let missing = app
        .get(&format!("/api/v1/issues/{}", Uuid::new_v4()))
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn guard_checks_project_permission() {
    let app = spawn_app().await;
    let issue = app.create_issue("Reflected XSS", "high").await;
    let uri = format!("/api/v1/issues/{}", issue["id"].as_str().unwrap());

    let (stranger, stranger_token) = app.other_user(false).await;
    let denied = app
        .request(Method::GET, &uri, Some(&stranger_token), None)
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    ProjectRepository::add_member(&app.pool, app.project.id, stranger.id)
        .await
        .unwrap();
    let allowed = app
        .request(Method::GET, &uri, Some(&stranger_token), None)
        .await;
    assert_eq!(allowed.status, StatusCode::OK);

    let (_, admin_token) = app.other_user(true).await;
    let admin = app.request(Method::GET, &uri, Some(&admin_token), None).await;
    assert_eq!(admin.status, StatusCode::OK);
}

#[tokio::test]
async fn update_merges_present_fields() {
    let app = spawn_app().await;
    let issue = app.create_issue("Reflected XSS", "high").await;
    let uri = format!("/api/v1/issues/{}", issue["id"].as_str().unwrap());

    let response = app
        .send(
            Method::PUT,
            &uri,
            json!({ "desc": "Found in search box", "false": true, "target": Uuid::new_v4() }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["summary"], "Reflected XSS");
    assert_eq!(response.body["desc"], "Found in search box");
    assert_eq!(response.body["false"], true);
    assert_eq!(response.body["target"], app.target.id.to_string());
}

#[tokio::test]
async fn update_unknown_issue_is_not_found() {
    let app = spawn_app().await;

    let response = app
        .send(
            Method::PUT,
            &format!("/api/v1/issues/{}", Uuid::new_v4()),
            json!({ "summary": "Stored XSS" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_duplicate_uniq_id_conflicts_without_mutation() {
    let app = spawn_app().await;
    let target = app.target.id.to_string();

    for (summary, uniq_id) in [("First finding", "a"), ("Second finding", "b")] {
        let response = app
            .send(
                Method::POST,
                "/api/v1/issues",
                json!({ "target": target, "summary": summary, "severity": "low", "uniqId": uniq_id }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED);
    }

    let duplicate_create = app
        .send(
            Method::POST,
            "/api/v1/issues",
            json!({ "target": target, "summary": "Third finding", "severity": "low", "uniqId": "a" }),
        )
        .await;
    assert_eq!(duplicate_create.status, StatusCode::CONFLICT);
    assert_eq!(app.issue_count().await, 2);

    let listed = app.get("/api/v1/issues?sort=created").await;
    let second = listed.body["results"]
        .as_array()
        .unwrap()
        .iter()
        .find(|issue| issue["uniqId"] == "b")
        .unwrap()
        .clone();
    let uri = format!("/api/v1/issues/{}", second["id"].as_str().unwrap());

    let response = app
        .send(
            Method::PUT,
            &uri,
            json!({ "uniqId": "a", "summary": "Renamed finding" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);

    let stored = app.get(&uri).await;
    assert_eq!(stored.body["uniqId"], "b");
    assert_eq!(stored.body["summary"], "Second finding");
}

#[tokio::test]
async fn delete_twice_is_not_found() {
    let app = spawn_app().await;
    let issue = app.create_issue("Reflected XSS", "high").await;
    let uri = format!("/api/v1/issues/{}", issue["id"].as_str().unwrap());

    let first = app.delete(&uri).await;
    assert_eq!(first.status, StatusCode::NO_CONTENT);

    let second = app.delete(&uri).await;
    assert_eq!(second.status, StatusCode::NOT_FOUND);
    assert_eq!(app.issue_count().await, 0);
}

#[tokio::test]
async fn comments_require_text() {
    let app = spawn_app().await;
    let issue = app.create_issue("Reflected XSS", "high").await;
    let uri = format!("/api/v1/issues/{}/comments", issue["id"].as_str().unwrap());

    for body in [json!({ "text": "" }), json!({})] {
        let response = app.send(Method::POST, &uri, body).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body["error"], "Text is required");
    }

    assert_eq!(app.comment_count().await, 0);
}

#[tokio::test]
async fn comments_are_listed_without_pagination() {
    let app = spawn_app().await;
    let issue = app.create_issue("Reflected XSS", "high").await;
    let issue_id = issue["id"].as_str().unwrap();
    let uri = format!("/api/v1/issues/{issue_id}/comments");

    for text in ["confirmed on staging", "fixed in 1.2.3", "verified"] {
        let response = app.send(Method::POST, &uri, json!({ "text": text })).await;
        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.body["owner"], app.user.id.to_string());
        assert_eq!(response.body["link"], issue_id);
        assert_eq!(response.body["type"], "issue");
    }

    let listed = app.get(&format!("{uri}?skip=1&limit=1")).await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body["count"], 3);
    let results = listed.body["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["text"], "confirmed on staging");
    assert!(listed.body.get("next").is_none());
}

#[tokio::test]
async fn comments_for_missing_issue_are_not_found() {
    let app = spawn_app().await;
    let uri = format!("/api/v1/issues/{}/comments", Uuid::new_v4());

    assert_eq!(app.get(&uri).await.status, StatusCode::NOT_FOUND);
    let response = app.send(Method::POST, &uri, json!({ "text": "hello" })).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_issue_removes_its_comments() {
    let app = spawn_app().await;
    let issue = app.create_issue("Reflected XSS", "high").await;
    let uri = format!("/api/v1/issues/{}", issue["id"].as_str().unwrap());

    app.send(Method::POST, &format!("{uri}/comments"), json!({ "text": "noted" }))
        .await;
    assert_eq!(app.comment_count().await, 1);

    assert_eq!(app.delete(&uri).await.status, StatusCode::NO_CONTENT);
    assert_eq!(app.comment_count().await, 0);
}

#[tokio::test]
async fn requests_without_valid_token_are_unauthorized() {
    let app = spawn_app().await;

    let anonymous = app.request(Method::GET, "/api/v1/issues", None, None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
    assert!(anonymous.headers.contains_key("x-server-version"));

    let forged = app
        .request(Method::GET, "/api/v1/issues", Some("not-a-token"), None)
        .await;
    assert_eq!(forged.status, StatusCode::UNAUTHORIZED);

    let guarded = app
        .request(
            Method::GET,
            &format!("/api/v1/issues/{}", Uuid::new_v4()),
            None,
            None,
        )
        .await;
    assert_eq!(guarded.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn responses_carry_server_version() {
    let app = spawn_app().await;

    let response = app.get("/api/v1/issues").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.headers["x-server-version"],
        env!("CARGO_PKG_VERSION")
    );
}
