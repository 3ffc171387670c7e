// Read-only reference data: thinkers, seeds, prompt, config, and the raw
// provocations collection.

pub mod handlers;
