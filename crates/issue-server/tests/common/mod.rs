#![allow(dead_code)]

use std::str::FromStr;

use api_types::{Project, Target, TargetSummary, User};
use axum::{
    Router,
    body::Body,
    http::{
        HeaderMap, Method, Request, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
};
use issue_server::{
    AppState,
    config::IssueServerConfig,
    db::{
        self,
        projects::ProjectRepository,
        targets::TargetRepository,
        users::{TokenRepository, UserRepository},
    },
};
use serde_json::{Value, json};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use tower::ServiceExt;
use uuid::Uuid;

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub pool: SqlitePool,
    pub user: User,
    pub token: String,
    pub project: Project,
    pub target: Target,
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

/// Single-connection in-memory database; the connection must never be
/// recycled or the data goes with it.
pub async fn spawn_app_with(configure: impl FnOnce(&mut IssueServerConfig)) -> TestApp {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .unwrap();
    db::migrate(&pool).await.unwrap();

    let user = UserRepository::create(&pool, "owner@example.com", "owner", false)
        .await
        .unwrap();
    let token = TokenRepository::issue(&pool, user.id).await.unwrap();
    let project = ProjectRepository::create(&pool, "acme", user.id)
        .await
        .unwrap();
    let target = TargetRepository::create(&pool, project.id, "https://acme.test")
        .await
        .unwrap();

    let mut config = IssueServerConfig::with_database_url("sqlite::memory:");
    configure(&mut config);
    let state = AppState::new(pool.clone(), config);
    let router = issue_server::router(state.clone());

    TestApp {
        router,
        state,
        pool,
        user,
        token,
        project,
        target,
    }
}

impl TestApp {
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, Some(&self.token), None).await
    }

    pub async fn send(&self, method: Method, uri: &str, body: Value) -> TestResponse {
        self.request(method, uri, Some(&self.token), Some(body))
            .await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.request(Method::DELETE, uri, Some(&self.token), None)
            .await
    }

    /// Creates an issue on the seeded target and returns its JSON.
    pub async fn create_issue(&self, summary: &str, severity: &str) -> Value {
        let response = self
            .send(
                Method::POST,
                "/api/v1/issues",
                json!({
                    "target": self.target.id.to_string(),
                    "summary": summary,
                    "severity": severity,
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body
    }

    /// A second user with its own token and no access to the seeded project.
    pub async fn other_user(&self, admin: bool) -> (User, String) {
        let nickname = format!("user-{}", Uuid::new_v4().simple());
        let user = UserRepository::create(
            &self.pool,
            &format!("{nickname}@example.com"),
            &nickname,
            admin,
        )
        .await
        .unwrap();
        let token = TokenRepository::issue(&self.pool, user.id).await.unwrap();
        (user, token)
    }

    pub async fn issue_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM issues")
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    pub async fn comment_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM comments")
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    pub async fn target_summary(&self) -> TargetSummary {
        self.state.summaries().wait_idle().await;
        TargetRepository::find_by_id(&self.pool, self.target.id)
            .await
            .unwrap()
            .unwrap()
            .summary
    }
}
