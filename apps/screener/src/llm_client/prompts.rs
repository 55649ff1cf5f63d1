// Shared prompt fragments.
// Each pipeline stage that needs LLM calls keeps its own templates in analysis/prompts.rs.
// This file contains cross-cutting fragments only.

/// Appended to prompts that expect a bare JSON value back.
pub const JSON_ONLY_INSTRUCTION: &str = "Return only the JSON value without any additional text. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";
