//! HTTP service for the squash ladder.
//!
//! A thin JSON layer over [`ladder_engine::Ladder`]: every engine call runs
//! on the blocking pool and engine errors come back as `{"error": "..."}`
//! with a status derived from the error's category.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::{LogSettings, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use handler::AppState;
pub use server::LadderServer;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use axum::Router;
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    struct TestApp {
        _dir: tempfile::TempDir,
        router: Router,
    }

    impl TestApp {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let mut config = ServerConfig::default();
            config.log.path = dir.path().join("ladder.jsonl");
            let server = LadderServer::open(config).unwrap();
            Self {
                _dir: dir,
                router: server.router(),
            }
        }

        async fn call(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            let body = match body {
                Some(v) => {
                    builder = builder.header("content-type", "application/json");
                    Body::from(v.to_string())
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
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, value)
        }

        async fn add(&self, id: &str, name: &str) {
            let (status, _) = self
                .call(
                    Method::POST,
                    "/v1/players",
                    Some(json!({ "name": name, "id": id })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        async fn play(&self, a: &str, b: &str, winner: &str) -> (StatusCode, Value) {
            self.call(
                Method::POST,
                "/v1/matches",
                Some(json!({
                    "side_a": a,
                    "side_b": b,
                    "winner": winner,
                    "set_scores": ["11-5", "11-5", "11-5"],
                })),
            )
            .await
        }

        async fn order(&self) -> Vec<String> {
            let (_, players) = self.call(Method::GET, "/v1/players", None).await;
            players
                .as_array()
                .unwrap()
                .iter()
                .map(|p| p["id"].as_str().unwrap().to_string())
                .collect()
        }
    }

    #[tokio::test]
    async fn health_endpoint() {
        let app = TestApp::new();
        let (status, body) = app.call(Method::GET, "/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn info_endpoint() {
        let app = TestApp::new();
        let (status, body) = app.call(Method::GET, "/v1/info", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "ladder-server");
        assert_eq!(body["players"], 0);
    }

    #[tokio::test]
    async fn players_and_matches_round_trip() {
        let app = TestApp::new();
        app.add("alice", "Alice").await;
        app.add("bob", "Bob").await;
        app.add("charlie", "Charlie").await;

        let (status, ack) = app.play("charlie", "alice", "charlie").await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(ack["transaction_id"].is_string());
        assert_eq!(app.order().await, vec!["charlie", "alice", "bob"]);

        let (_, recent) = app.call(Method::GET, "/v1/matches?limit=5", None).await;
        assert_eq!(recent.as_array().unwrap().len(), 1);
        assert_eq!(recent[0]["winner"], "charlie");

        let (_, envelope) = app.call(Method::GET, "/api/players", None).await;
        assert_eq!(envelope["players"][0]["rank"], 1);
        assert_eq!(envelope["players"][0]["name"], "Charlie");
    }

    #[tokio::test]
    async fn invalidate_restores_order() {
        let app = TestApp::new();
        app.add("a", "A").await;
        app.add("b", "B").await;
        let (_, ack) = app.play("b", "a", "b").await;
        let tx = ack["transaction_id"].as_str().unwrap().to_string();

        let (status, _) = app
            .call(Method::POST, &format!("/v1/matches/{tx}/invalidate"), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(app.order().await, vec!["a", "b"]);

        let (status, body) = app
            .call(Method::POST, &format!("/v1/matches/{tx}/invalidate"), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("already"));

        let (_, history) = app.call(Method::GET, "/v1/transactions", None).await;
        assert_eq!(history[0]["type"], "INVALIDATE_MATCH");
        assert_eq!(history[0]["payload"]["target"], tx.as_str());
    }

    #[tokio::test]
    async fn errors_map_to_status_codes() {
        let app = TestApp::new();
        app.add("a", "A").await;
        app.add("b", "B").await;

        let (status, body) = app
            .call(
                Method::POST,
                "/v1/matches",
                Some(json!({
                    "side_a": "a",
                    "side_b": "b",
                    "winner": "a",
                    "set_scores": ["11-10"],
                })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, _) = app.play("a", "b", "b").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app.call(Method::DELETE, "/v1/players/ghost", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app
            .call(Method::POST, "/v1/matches/not-a-uuid/invalidate", None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app.call(Method::DELETE, "/v1/players/a", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(app.order().await, vec!["b"]);
    }

    #[tokio::test]
    async fn cors_allows_any_origin() {
        let app = TestApp::new();
        let response = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/players")
                    .header("origin", "http://example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "*"
        );
    }
}
