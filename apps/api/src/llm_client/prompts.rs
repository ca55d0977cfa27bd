// Cross-cutting prompt fragments shared by every LLM caller.
// Each caller keeps its own prompts.rs for task-specific templates.

/// Appended to every system prompt that expects structured output.
pub const JSON_ONLY_INSTRUCTION: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON value. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies outside the JSON.";

