use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::state::AppState;
use crate::store::DataFile;

/// Front-end view of one thinker. `themes` and `keywords` are always empty.
#[derive(Debug, Serialize)]
pub struct ThinkerSummary {
    pub description: String,
    pub themes: Vec<String>,
    pub keywords: Vec<String>,
}

/// GET /api/thinkers
///
/// Reshapes `{"thinkers": [...]}` into a name → summary mapping. Files in any
/// other shape are passed through untouched.
pub async fn handle_thinkers(State(state): State<AppState>) -> Json<Value> {
    Json(summarize_thinkers(state.store.load(DataFile::Thinkers).await))
}

/// GET /api/provocations
pub async fn handle_provocations(State(state): State<AppState>) -> Json<Value> {
    Json(state.store.load(DataFile::Provocations).await)
}

/// GET /api/seeds
pub async fn handle_seeds(State(state): State<AppState>) -> Json<Value> {
    Json(state.store.load(DataFile::Seeds).await)
}

/// GET /api/prompt
pub async fn handle_prompt(State(state): State<AppState>) -> Json<Value> {
    Json(state.store.load(DataFile::Prompt).await)
}

/// GET /api/config
pub async fn handle_config(State(state): State<AppState>) -> Json<Value> {
    Json(state.store.load(DataFile::Config).await)
}

fn summarize_thinkers(data: Value) -> Value {
    let Some(thinkers) = data.get("thinkers").and_then(Value::as_array) else {
        return data;
    };

    let mut summaries = Map::new();
    for thinker in thinkers {
        let name = thinker
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("Unknown");
        let summary = ThinkerSummary {
            description: thinker
                .get("spirit_instruction")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            themes: Vec::new(),
            keywords: Vec::new(),
        };
        if let Ok(value) = serde_json::to_value(summary) {
            summaries.insert(name.to_string(), value);
        }
    }
    Value::Object(summaries)
}
