// Provocation generation: prompt construction, reply validation, the HTTP
// generate endpoint, and the bulk Dedup/Resume loop.
// All model calls go through llm_client.

pub mod batch;
pub mod generator;
pub mod handlers;
pub mod prompts;
