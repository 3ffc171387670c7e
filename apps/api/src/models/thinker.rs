use serde::{Deserialize, Serialize};

/// A persona that steers generation. Loaded once from `thinkers.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thinker {
    pub name: String,
    pub spirit_instruction: String,
    #[serde(default)]
    pub seeds: Vec<String>,
}

/// On-disk shape of `thinkers.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThinkersFile {
    pub thinkers: Vec<Thinker>,
}
