pub mod health;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower::ServiceExt;
use tower_http::services::ServeDir;

use crate::catalog::handlers as catalog;
use crate::feedback::handlers as feedback;
use crate::generation::handlers as generation;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Reference data
        .route("/api/thinkers", get(catalog::handle_thinkers))
        .route("/api/provocations", get(catalog::handle_provocations))
        .route("/api/seeds", get(catalog::handle_seeds))
        .route("/api/prompt", get(catalog::handle_prompt))
        .route("/api/config", get(catalog::handle_config))
        // Generation
        .route("/api/generate", post(generation::handle_generate))
        // Feedback
        .route("/api/vote", post(feedback::handle_vote))
        .route("/api/review/unvoted", get(feedback::handle_unvoted))
        .route("/api/review/vote", post(feedback::handle_review_vote))
        // Anything else is a static asset or a 404
        .fallback(serve_static)
        .with_state(state)
}

/// Serves files under the static root. Hidden paths (`.env`, `.git/...`) are
/// never served, even when they exist.
async fn serve_static(State(state): State<AppState>, request: Request) -> Response {
    if is_hidden_path(request.uri().path()) {
        return StatusCode::NOT_FOUND.into_response();
    }
    match ServeDir::new(&state.config.static_dir).oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}

fn is_hidden_path(path: &str) -> bool {
    path.split('/').any(|segment| {
        segment.starts_with('.')
            || segment
                .get(..3)
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case("%2e"))
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::llm_client::testing::ScriptedGenerator;
    use crate::llm_client::{LlmError, TextGenerator};
    use crate::store::{DataFile, JsonStore};

    fn app(dir: &TempDir, generator: Option<Arc<dyn TextGenerator>>) -> (Router, Arc<JsonStore>) {
        let config = Config {
            api_key: generator.as_ref().map(|_| "test-key".to_string()),
            host: "127.0.0.1".to_string(),
            port: 0,
            data_dir: dir.path().to_path_buf(),
            static_dir: dir.path().to_path_buf(),
            scores_file: dir.path().join("provocations_scores.json"),
            rust_log: "info".to_string(),
        };
        let store = Arc::new(JsonStore::new(&config.data_dir, &config.scores_file));
        let state = AppState {
            store: store.clone(),
            generator,
            config,
        };
        (build_router(state), store)
    }

    fn write(dir: &TempDir, name: &str, value: &Value) {
        std::fs::write(dir.path().join(name), serde_json::to_string(value).unwrap()).unwrap();
    }

    fn read(dir: &TempDir, name: &str) -> Value {
        serde_json::from_str(&std::fs::read_to_string(dir.path().join(name)).unwrap()).unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_vote_creates_counter_on_first_vote() {
        let dir = TempDir::new().unwrap();
        write(&dir, "provocations.json", &json!([{"setup": "s", "task": "t"}]));
        let (app, _) = app(&dir, None);

        let (status, body) = send(app, post_json("/api/vote", json!({"id": 0, "vote": 1}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true}));
        assert_eq!(
            read(&dir, "provocations.json")[0]["votes"],
            json!({"up": 1, "down": 0})
        );
    }

    #[tokio::test]
    async fn test_vote_rejects_bad_input_without_mutation() {
        let dir = TempDir::new().unwrap();
        write(&dir, "provocations.json", &json!([{"setup": "s", "task": "t"}]));
        let before = std::fs::read_to_string(dir.path().join("provocations.json")).unwrap();

        let cases = [
            json!({"id": 1, "vote": 1}),
            json!({"id": -1, "vote": 0}),
            json!({"vote": 1}),
            json!({"id": 0}),
            json!({"id": 0, "vote": 7}),
            json!({"id": "zero", "vote": 1}),
        ];
        for case in cases {
            let (app, _) = app(&dir, None);
            let (status, body) = send(app, post_json("/api/vote", case)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(body["error"].is_string());
        }

        let after = std::fs::read_to_string(dir.path().join("provocations.json")).unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_vote_against_corrupt_store_is_server_error() {
        let dir = TempDir::new().unwrap();
        write(&dir, "provocations.json", &json!({"not": "a list"}));
        let (app, _) = app(&dir, None);

        let (status, body) = send(app, post_json("/api/vote", json!({"id": 0, "vote": 1}))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_generate_without_api_key() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app(&dir, None);

        let (status, body) = send(
            app,
            post_json(
                "/api/generate",
                json!({"systemPrompt": "s", "userPrompt": "u"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "API key not configured"}));
    }

    #[tokio::test]
    async fn test_generate_strips_fence_and_stores_result() {
        let dir = TempDir::new().unwrap();
        let inner = json!({"provocation": {"setup": "Rain on tin.", "task": "Record ten seconds of rain."}});
        let reply = format!("```json\n{}\n```", serde_json::to_string_pretty(&inner).unwrap());
        let generator = Arc::new(ScriptedGenerator::new(vec![Ok(reply)]));
        let (app, _) = app(&dir, Some(generator.clone()));

        let (status, body) = send(
            app,
            post_json(
                "/api/generate",
                json!({"systemPrompt": "be poetic", "userPrompt": "rain"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, inner);
        assert_eq!(read(&dir, "provocations.json"), json!([inner]));

        let requests = generator.requests();
        assert_eq!(requests[0].system_prompt, "be poetic");
        assert_eq!(requests[0].user_prompt, "rain");
    }

    #[tokio::test]
    async fn test_generate_failure_modes_are_distinct() {
        let dir = TempDir::new().unwrap();
        let generator = Arc::new(ScriptedGenerator::new(vec![
            Ok("   ".to_string()),
            Ok("definitely not json".to_string()),
            Err(LlmError::RateLimited {
                message: "quota".to_string(),
            }),
            Err(LlmError::Api {
                status: 403,
                message: "denied".to_string(),
            }),
        ]));
        let body = json!({"systemPrompt": "s", "userPrompt": "u"});

        let mut results = Vec::new();
        for _ in 0..4 {
            let (app, _) = app(&dir, Some(generator.clone()));
            results.push(send(app, post_json("/api/generate", body.clone())).await);
        }

        assert_eq!(results[0].0, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(results[0].1["error"], "No response from AI");
        assert_eq!(results[1].0, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(results[1].1["error"], "Invalid response from AI");
        assert!(results[1].1["detail"].is_string());
        assert_eq!(results[2].0, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(results[3].0, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(results[3].1["detail"], "API error (status 403): denied");

        assert!(!dir.path().join("provocations.json").exists());
    }

    #[tokio::test]
    async fn test_generate_requires_user_prompt() {
        let dir = TempDir::new().unwrap();
        let generator = Arc::new(ScriptedGenerator::default());
        let (app, _) = app(&dir, Some(generator.clone()));

        let (status, _) = send(app, post_json("/api/generate", json!({"systemPrompt": "s"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(generator.requests().is_empty());
    }

    #[tokio::test]
    async fn test_reference_endpoints() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "thinkers.json",
            &json!({"thinkers": [{"name": "Cage", "spirit_instruction": "Chance.", "seeds": ["a seed"]}]}),
        );
        write(&dir, "seeds.json", &json!({"seeds": ["x"]}));
        let (app, _) = app(&dir, None);

        let (status, body) = send(app.clone(), get_req("/api/thinkers")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"Cage": {"description": "Chance.", "themes": [], "keywords": []}})
        );

        let (_, body) = send(app.clone(), get_req("/api/seeds")).await;
        assert_eq!(body, json!({"seeds": ["x"]}));

        let (_, body) = send(app.clone(), get_req("/api/prompt")).await;
        assert_eq!(body, json!({}));

        let (_, body) = send(app, get_req("/api/provocations")).await;
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_static_files_and_missing_paths() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("app.js"), "console.log('hi');").unwrap();
        let (app, _) = app(&dir, None);

        let response = app.clone().oneshot(get_req("/app.js")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.oneshot(get_req("/missing.css")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_hidden_files_are_not_served() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".env"), "GOOGLE_API_KEY=secret123").unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        std::fs::write(dir.path().join(".git").join("config"), "[core]").unwrap();
        let (app, _) = app(&dir, None);

        for uri in ["/.env", "/%2eenv", "/%2Eenv", "/.git/config", "/assets/../.env"] {
            let response = app.clone().oneshot(get_req(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            assert!(!String::from_utf8_lossy(&bytes).contains("secret123"));
        }
    }

    #[tokio::test]
    async fn test_vote_survives_foreign_feedback_records() {
        let dir = TempDir::new().unwrap();
        let original = json!([
            {"task": "t", "feedback": [{"rating": 1, "timestamp": "2024-05-01T12:00:00.123456"}]},
            {"task": "u", "feedback": [{"rating": 4.5, "timestamp": "2024-05-01T12:00:00Z"}]},
            {"task": "v", "feedback": [{"rating": "up", "timestamp": "yesterday"}]}
        ]);
        write(&dir, "provocations.json", &original);
        let (app, _) = app(&dir, None);

        let (status, body) =
            send(app.clone(), post_json("/api/vote", json!({"id": 0, "vote": 1}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true}));

        let stored = read(&dir, "provocations.json");
        assert_eq!(stored[0]["feedback"][0], original[0]["feedback"][0]);
        assert_eq!(stored[0]["feedback"][1]["rating"], json!(1));
        assert_eq!(stored[1], original[1]);
        assert_eq!(stored[2], original[2]);

        let (status, body) = send(app, get_req("/api/review/unvoted")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_generate_stores_object_with_odd_top_level_keys() {
        let dir = TempDir::new().unwrap();
        let inner = json!({
            "provocation": {"setup": "Wind.", "task": "Hold a kite."},
            "setup": ["not", "a", "string"],
            "task": 7
        });
        let generator = Arc::new(ScriptedGenerator::new(vec![Ok(inner.to_string())]));
        let (app, _) = app(&dir, Some(generator));

        let (status, body) = send(
            app,
            post_json("/api/generate", json!({"systemPrompt": "s", "userPrompt": "u"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, inner);
        assert_eq!(read(&dir, "provocations.json"), json!([inner]));
    }

    #[tokio::test]
    async fn test_review_flow_hides_scored_tasks() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "provocations.json",
            &json!([{"setup": "a", "task": "first"}, {"setup": "b", "task": "second"}]),
        );
        let (app, store) = app(&dir, None);

        let (status, body) = send(
            app.clone(),
            post_json(
                "/api/review/vote",
                json!({"setup": "a", "task": "first", "vote": "up"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(store.load_scores().await.unwrap().len(), 1);

        let (_, body) = send(app.clone(), get_req("/api/review/unvoted")).await;
        assert_eq!(body, json!([{"setup": "b", "task": "second"}]));

        let (status, _) = send(
            app,
            post_json(
                "/api/review/vote",
                json!({"task": "second", "vote": "sideways"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(store.load_scores().await.unwrap().len(), 1);
        assert!(store.path(DataFile::Provocations).exists());
    }

    #[tokio::test]
    async fn test_health_reports_generation_state() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app(&dir, None);
        let (status, body) = send(app, get_req("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["generation_enabled"], false);
    }
}
