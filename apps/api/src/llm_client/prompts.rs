// Shared prompt constants and prompt-building fragments.
// Each task defines its own prompts in generation::prompts; this file holds
// the cross-cutting pieces every task reuses.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON value. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// System prompt fragment for free-text tasks.
pub const PLAIN_TEXT_SYSTEM: &str = "Respond with the requested text only. \
    Do NOT add headings, labels, quotation marks, or commentary.";

/// Persona shared by every generation task.
pub const PRESS_WRITER_PERSONA: &str = "You are an experienced Japanese PR professional \
    who writes press releases that journalists actually want to cover.";

/// Language and register instruction appended to all generation prompts.
pub const STYLE_INSTRUCTION: &str = "\
    Write in natural, professional Japanese (です・ます調). \
    Stay faithful to the facts provided; do NOT invent numbers, awards, partners, or dates.";
