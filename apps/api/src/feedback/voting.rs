//! Voting Store — records a vote against a provocation addressed by index.
//!
//! Index addressing matches what the front end sends. It is only safe while
//! the collection is append-only; nothing here guards against reordering.

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::models::provocation::Vote;
use crate::store::JsonStore;

#[derive(Debug, Clone, Serialize)]
pub struct VoteReceipt {
    pub index: usize,
    /// Votes or feedback records now held by the provocation.
    pub feedback_count: u64,
}

/// Validates `index` against the persisted collection and records `vote`.
/// An out-of-range index is a validation error and leaves the store untouched.
pub async fn cast_vote(
    store: &JsonStore,
    index: i64,
    vote: Vote,
    comment: Option<String>,
) -> Result<VoteReceipt, AppError> {
    let receipt = store
        .mutate_collection(|items| {
            let slot = usize::try_from(index)
                .ok()
                .filter(|i| *i < items.len())
                .ok_or_else(|| AppError::Validation("Invalid provocation id".to_string()))?;

            let provocation = &mut items[slot];
            provocation.record_vote(vote, comment, Utc::now());
            Ok::<_, AppError>(VoteReceipt {
                index: slot,
                feedback_count: provocation.feedback_count(),
            })
        })
        .await?;

    info!("Recorded {:?} vote on provocation {}", vote, receipt.index);
    Ok(receipt)
}
