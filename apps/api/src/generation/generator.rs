//! Provocation Generator — builds a prompt from a thinker and a random seed,
//! calls the text generator, and validates the JSON reply.
//!
//! Two reply contracts exist:
//! - bulk mode (thinker-driven) requires a non-empty `task`;
//! - API mode (caller-supplied prompts) requires a `provocation` key.

use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::generation::prompts::{PROVOCATION_SYSTEM_TEMPLATE, PROVOCATION_USER_TEMPLATE};
use crate::llm_client::prompts::JSON_OBJECT_INSTRUCTION;
use crate::llm_client::{strip_json_fences, GenerationRequest, LlmError, TextGenerator};
use crate::models::provocation::Provocation;
use crate::models::thinker::Thinker;

/// Key a bulk-mode reply must carry.
pub const TASK_KEY: &str = "task";
/// Key an API-mode reply must carry.
pub const PROVOCATION_KEY: &str = "provocation";

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("No response from AI")]
    NoResponse,

    #[error("Invalid response from AI: {0}")]
    InvalidResponse(String),

    #[error("Response is missing required field '{0}'")]
    MissingField(&'static str),

    #[error("Thinker '{0}' has no seeds")]
    NoSeeds(String),

    #[error(transparent)]
    Upstream(LlmError),
}

impl GenerationError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, GenerationError::Upstream(e) if e.is_rate_limited())
    }
}

impl From<LlmError> for GenerationError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::EmptyContent => GenerationError::NoResponse,
            other => GenerationError::Upstream(other),
        }
    }
}

/// Builds the system/user prompt pair for `thinker`, picking one seed uniformly.
pub fn build_request<R: Rng + ?Sized>(
    thinker: &Thinker,
    rng: &mut R,
) -> Result<GenerationRequest, GenerationError> {
    let seed = thinker
        .seeds
        .choose(rng)
        .ok_or_else(|| GenerationError::NoSeeds(thinker.name.clone()))?;

    let system_prompt = PROVOCATION_SYSTEM_TEMPLATE
        .replace("{json_instruction}", JSON_OBJECT_INSTRUCTION)
        .replace("{thinker_name}", &thinker.name)
        .replace("{spirit_instruction}", &thinker.spirit_instruction);
    let user_prompt = PROVOCATION_USER_TEMPLATE.replace("{seed}", seed);

    Ok(GenerationRequest {
        system_prompt,
        user_prompt,
    })
}

/// Parses reply text into a JSON object carrying `required_key`.
///
/// Blank text is `NoResponse`; text that is not a JSON object (after
/// unwrapping a fenced block) is `InvalidResponse`.
pub fn parse_reply(
    text: &str,
    required_key: &'static str,
) -> Result<Map<String, Value>, GenerationError> {
    if text.trim().is_empty() {
        return Err(GenerationError::NoResponse);
    }

    let inner = strip_json_fences(text);
    let value: Value = serde_json::from_str(inner)
        .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

    let Value::Object(object) = value else {
        return Err(GenerationError::InvalidResponse(
            "expected a JSON object".to_string(),
        ));
    };

    if !object.contains_key(required_key) {
        return Err(GenerationError::MissingField(required_key));
    }
    Ok(object)
}

/// Bulk mode: one provocation for `thinker`.
///
/// An empty reply or one without a usable `task` yields `Ok(None)` so the
/// caller can simply try again. Upstream failures and unparseable replies are
/// errors.
pub async fn generate_for_thinker<R: Rng + Send + ?Sized>(
    generator: &dyn TextGenerator,
    thinker: &Thinker,
    rng: &mut R,
) -> Result<Option<Provocation>, GenerationError> {
    let request = build_request(thinker, rng)?;
    debug!("Generating provocation in the spirit of {}", thinker.name);

    let text = match generator.generate(&request).await {
        Ok(text) => text,
        Err(LlmError::EmptyContent) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let object = match parse_reply(&text, TASK_KEY) {
        Ok(object) => object,
        Err(GenerationError::NoResponse | GenerationError::MissingField(_)) => return Ok(None),
        Err(e) => return Err(e),
    };

    let provocation = Provocation::from_generated(object);

    match provocation.task.as_deref() {
        Some(task) if !task.trim().is_empty() => Ok(Some(provocation)),
        _ => Ok(None),
    }
}

/// API mode: forwards caller-supplied prompts and returns the parsed object
/// unmodified. The object must contain `provocation`.
pub async fn generate_from_prompts(
    generator: &dyn TextGenerator,
    request: &GenerationRequest,
) -> Result<Map<String, Value>, GenerationError> {
    let text = generator.generate(request).await?;
    parse_reply(&text, PROVOCATION_KEY)
}
