// Cross-cutting prompt fragments. Feature prompts live beside their feature
// (see generation/prompts.rs) and pull shared pieces from here.

/// Appended to system prompts whose reply is parsed as a JSON object.
pub const JSON_OBJECT_INSTRUCTION: &str = "Respond with a single JSON object only. \
    Do NOT include any text outside the JSON object. \
    Do NOT include explanations or apologies.";
