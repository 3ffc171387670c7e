use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewVote {
    Up,
    Down,
}

/// One reviewer verdict, appended to the scores file by the review endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    #[serde(default)]
    pub setup: String,
    pub task: String,
    pub vote: ReviewVote,
}
