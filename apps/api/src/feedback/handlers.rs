use std::collections::HashSet;

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::feedback::voting::cast_vote;
use crate::models::provocation::{Provocation, Vote};
use crate::models::score::{ReviewVote, ScoreEntry};
use crate::state::AppState;
use crate::store::ProvocationStore;

#[derive(Debug, Deserialize)]
pub struct VoteBody {
    pub id: Option<i64>,
    pub vote: Option<i64>,
    pub comment: Option<String>,
}

/// POST /api/vote
pub async fn handle_vote(
    State(state): State<AppState>,
    payload: Result<Json<VoteBody>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(body) = payload.map_err(|e| AppError::Validation(e.body_text()))?;

    let (Some(id), Some(vote)) = (body.id, body.vote) else {
        return Err(AppError::Validation("Missing id or vote".to_string()));
    };
    let vote = Vote::from_wire(vote)
        .ok_or_else(|| AppError::Validation("vote must be 1 or 0".to_string()))?;
    let comment = body.comment.filter(|c| !c.trim().is_empty());

    cast_vote(&state.store, id, vote, comment).await?;
    Ok(Json(json!({ "success": true })))
}

/// GET /api/review/unvoted
///
/// Provocations whose task has not been scored yet, so a reviewer can pick
/// up where they left off.
pub async fn handle_unvoted(
    State(state): State<AppState>,
) -> Result<Json<Vec<Provocation>>, AppError> {
    let provocations = state.store.load_collection().await?;
    let scores = state.store.load_scores().await?;
    let scored: HashSet<String> = scores.into_iter().map(|s| s.task).collect();

    let unvoted = provocations
        .into_iter()
        .filter(|p| matches!(&p.task, Some(task) if !scored.contains(task)))
        .collect();
    Ok(Json(unvoted))
}

#[derive(Debug, Deserialize)]
pub struct ScoreBody {
    pub setup: Option<String>,
    pub task: Option<String>,
    pub vote: Option<ReviewVote>,
}

/// POST /api/review/vote
pub async fn handle_review_vote(
    State(state): State<AppState>,
    payload: Result<Json<ScoreBody>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(body) = payload.map_err(|e| AppError::Validation(e.body_text()))?;

    let task = body
        .task
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::Validation("task cannot be empty".to_string()))?;
    let vote = body
        .vote
        .ok_or_else(|| AppError::Validation("vote must be \"up\" or \"down\"".to_string()))?;

    tracing::info!(
        "Received review vote {:?} for task: {}...",
        vote,
        task.chars().take(40).collect::<String>()
    );

    state
        .store
        .append_score(ScoreEntry {
            setup: body.setup.unwrap_or_default(),
            task,
            vote,
        })
        .await?;

    Ok(Json(json!({ "status": "success", "message": "Vote recorded." })))
}
