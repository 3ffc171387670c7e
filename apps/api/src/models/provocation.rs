//! Provocation records and the two feedback shapes found in `provocations.json`.
//!
//! Older files carry a plain `votes: {up, down}` counter; newer ones carry a
//! `feedback` list of timestamped ratings. Both load into [`FeedbackLedger`] and
//! serialize back to the shape they came from. Decoding is lenient: any key
//! this type cannot read as expected (a non-string `task`, a `votes` object with
//! odd counts, the `provocation` object written by the generate endpoint) is
//! kept verbatim in `extra`, and feedback records in an unfamiliar shape are
//! kept as raw JSON. Only a collection item that is not an object fails to load.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const VOTES_KEY: &str = "votes";
const FEEDBACK_KEY: &str = "feedback";

/// A single provocation. Addressed by its index in the collection; there is no
/// stable id, so reordering the collection invalidates outstanding indices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "RawProvocation")]
pub struct Provocation {
    pub setup: Option<String>,
    pub task: Option<String>,
    pub ledger: Option<FeedbackLedger>,
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCounts {
    #[serde(default)]
    pub up: u64,
    #[serde(default)]
    pub down: u64,
}

/// A feedback record written by this service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeedbackEntry {
    pub rating: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// One element of a `feedback` list. Records from other writers (naive
/// timestamps, fractional or textual ratings, extra keys) stay as raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeedbackRecord {
    Entry(FeedbackEntry),
    Raw(Value),
}

/// Normalized view over both persisted feedback shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedbackLedger {
    /// `votes: {up, down}`
    Tally(VoteCounts),
    /// `feedback: [{rating, comment, timestamp}]`
    Journal(Vec<FeedbackRecord>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Up,
    Down,
}

impl Vote {
    /// Maps the wire value: `1` is an up vote, `0` a down vote.
    pub fn from_wire(value: i64) -> Option<Self> {
        match value {
            1 => Some(Vote::Up),
            0 => Some(Vote::Down),
            _ => None,
        }
    }

    pub fn rating(self) -> i64 {
        match self {
            Vote::Up => 1,
            Vote::Down => 0,
        }
    }
}

impl Provocation {
    pub fn new(setup: impl Into<String>, task: impl Into<String>) -> Self {
        Self {
            setup: Some(setup.into()),
            task: Some(task.into()),
            ..Default::default()
        }
    }

    /// Builds a provocation from a generated JSON object, keeping every key.
    pub fn from_generated(object: Map<String, Value>) -> Self {
        Self::from(object)
    }

    /// Number of votes or feedback records held, whichever shape is in use.
    /// A counter kept alongside a journal is included.
    pub fn feedback_count(&self) -> u64 {
        match &self.ledger {
            None => 0,
            Some(FeedbackLedger::Tally(counts)) => counts.up + counts.down,
            Some(FeedbackLedger::Journal(records)) => {
                let parked = self
                    .extra
                    .get(VOTES_KEY)
                    .and_then(|v| serde_json::from_value::<VoteCounts>(v.clone()).ok())
                    .map_or(0, |c| c.up + c.down);
                records.len() as u64 + parked
            }
        }
    }

    /// Records one vote against this provocation.
    ///
    /// Journal-shaped entries get a new timestamped record. An entry with no
    /// feedback yet starts a journal when a comment is supplied and a tally
    /// otherwise. A comment on a tally-shaped entry switches it to a journal;
    /// the existing counter is kept next to it under `votes`.
    pub fn record_vote(&mut self, vote: Vote, comment: Option<String>, now: DateTime<Utc>) {
        let wants_journal = comment.is_some();
        let ledger = match self.ledger.take() {
            Some(FeedbackLedger::Tally(counts)) if wants_journal => {
                if let Ok(value) = serde_json::to_value(counts) {
                    self.extra.insert(VOTES_KEY.to_string(), value);
                }
                FeedbackLedger::Journal(Vec::new())
            }
            Some(ledger) => ledger,
            None => self.fresh_ledger(wants_journal),
        };

        self.ledger = Some(match ledger {
            FeedbackLedger::Journal(mut records) => {
                records.push(FeedbackRecord::Entry(FeedbackEntry {
                    rating: vote.rating(),
                    comment,
                    timestamp: now,
                }));
                FeedbackLedger::Journal(records)
            }
            FeedbackLedger::Tally(mut counts) => {
                match vote {
                    Vote::Up => counts.up += 1,
                    Vote::Down => counts.down += 1,
                }
                FeedbackLedger::Tally(counts)
            }
        });
    }

    /// Picks the shape for an entry's first recorded vote, avoiding a key
    /// that already holds an unreadable value.
    fn fresh_ledger(&self, wants_journal: bool) -> FeedbackLedger {
        let votes_taken = self.extra.contains_key(VOTES_KEY);
        let feedback_taken = self.extra.contains_key(FEEDBACK_KEY);
        if (wants_journal || votes_taken) && !feedback_taken {
            FeedbackLedger::Journal(Vec::new())
        } else if !votes_taken {
            FeedbackLedger::Tally(VoteCounts::default())
        } else {
            FeedbackLedger::Journal(Vec::new())
        }
    }
}

impl From<Map<String, Value>> for Provocation {
    fn from(mut fields: Map<String, Value>) -> Self {
        let setup = take_as::<String>(&mut fields, "setup");
        let task = take_as::<String>(&mut fields, "task");
        let votes = take_as::<VoteCounts>(&mut fields, VOTES_KEY);
        let feedback = take_as::<Vec<FeedbackRecord>>(&mut fields, FEEDBACK_KEY);

        let ledger = match (votes, feedback) {
            (Some(votes), Some(records)) => {
                // Both keys present: the journal leads, the counter rides along.
                if let Ok(value) = serde_json::to_value(votes) {
                    fields.insert(VOTES_KEY.to_string(), value);
                }
                Some(FeedbackLedger::Journal(records))
            }
            (None, Some(records)) => Some(FeedbackLedger::Journal(records)),
            (Some(votes), None) => Some(FeedbackLedger::Tally(votes)),
            (None, None) => None,
        };

        Provocation {
            setup,
            task,
            ledger,
            extra: fields,
        }
    }
}

/// Removes `key` and decodes it, putting the raw value back when it does not
/// have the expected shape.
fn take_as<T: DeserializeOwned>(fields: &mut Map<String, Value>, key: &str) -> Option<T> {
    let value = fields.remove(key)?;
    match serde_json::from_value(value.clone()) {
        Ok(decoded) => Some(decoded),
        Err(_) => {
            if !value.is_null() {
                fields.insert(key.to_string(), value);
            }
            None
        }
    }
}

/// Serialized shape: known keys first, in a stable order, then everything
/// kept in `extra`.
#[derive(Debug, Clone, Default, Serialize)]
struct RawProvocation {
    #[serde(skip_serializing_if = "Option::is_none")]
    setup: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    task: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    votes: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    feedback: Option<Vec<FeedbackRecord>>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<Provocation> for RawProvocation {
    fn from(p: Provocation) -> Self {
        let mut extra = p.extra;
        let (votes, feedback) = match p.ledger {
            Some(FeedbackLedger::Tally(counts)) => {
                extra.remove(VOTES_KEY);
                (serde_json::to_value(counts).ok(), None)
            }
            Some(FeedbackLedger::Journal(records)) => {
                extra.remove(FEEDBACK_KEY);
                (extra.remove(VOTES_KEY), Some(records))
            }
            None => (None, None),
        };

        RawProvocation {
            setup: p.setup,
            task: p.task,
            votes,
            feedback,
            extra,
        }
    }
}
