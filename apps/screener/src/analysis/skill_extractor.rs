//! Skill Extractor: derives the target skill list from a job description, or from
//! a caller-supplied comma-separated list.
//!
//! The LLM is asked for a JSON array, but its output is only loosely structured in
//! practice. Parsing order:
//! 1. the first `[ ... ]` span, as JSON or as a quoted (single or double) list literal;
//! 2. a line scan for `- ` / `* ` bullets and whole-line quoted strings.
//!
//! Anything else yields an empty list. Model output is never evaluated.

use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tracing::{info, warn};

use crate::analysis::prompts::{GENERATIVE_TEMPERATURE, SKILL_EXTRACTION_PROMPT_TEMPLATE};
use crate::document::sanitize::sanitize;
use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::llm_client::{bounded, CompletionModel};

static LIST_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[.*\]").expect("list literal regex is valid"));

/// Asks the LLM for the skills a job description requires.
/// Any call or parse failure yields an empty list; the caller decides what that means.
pub async fn extract_skills(
    jd_text: &str,
    llm: &dyn CompletionModel,
    call_timeout: Duration,
) -> Vec<String> {
    let prompt = SKILL_EXTRACTION_PROMPT_TEMPLATE
        .replace("{jd_text}", &sanitize(jd_text))
        .replace("{json_only}", JSON_ONLY_INSTRUCTION);

    match bounded(call_timeout, llm.complete(&prompt, GENERATIVE_TEMPERATURE)).await {
        Ok(response) => {
            let skills = parse_skill_response(&response);
            if skills.is_empty() {
                warn!("Could not parse any skills from the job description response");
            } else {
                info!("Extracted {} skills from job description", skills.len());
            }
            skills
        }
        Err(e) => {
            warn!("Error extracting skills from job description: {e}");
            Vec::new()
        }
    }
}

/// Parses a loosely structured skill list out of an LLM response.
pub fn parse_skill_response(response: &str) -> Vec<String> {
    let structured = LIST_LITERAL
        .find(response)
        .and_then(|m| parse_list_literal(m.as_str()));

    let skills = match structured {
        Some(skills) => skills,
        None => scan_lines(response),
    };

    dedupe_skills(skills.into_iter().map(|s| s.trim().to_string()))
}

/// Splits a comma-separated requirement string into skills, dropping blanks.
pub fn parse_skill_list(requirements: &str) -> Vec<String> {
    dedupe_skills(requirements.split(',').map(|s| s.trim().to_string()))
}

/// Drops blank and repeated skills, keeping the first occurrence of each.
/// Skills key the exported score maps, so each name may appear only once.
pub fn dedupe_skills(skills: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    skills
        .into_iter()
        .filter(|s| !s.is_empty() && seen.insert(s.clone()))
        .collect()
}

fn parse_list_literal(literal: &str) -> Option<Vec<String>> {
    if let Ok(values) = serde_json::from_str::<Vec<serde_json::Value>>(literal) {
        return Some(
            values
                .into_iter()
                .filter_map(|v| match v {
                    serde_json::Value::String(s) => Some(s),
                    serde_json::Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
        );
    }
    parse_quoted_list(literal)
}

/// Parses `['a', "b", 'c\'s']`. Returns `None` on anything that is not a flat list of
/// quoted strings.
fn parse_quoted_list(literal: &str) -> Option<Vec<String>> {
    let inner = literal.trim().strip_prefix('[')?.strip_suffix(']')?;
    let mut rest = inner.trim_start();
    let mut items = Vec::new();

    while !rest.is_empty() {
        let quote = rest.chars().next()?;
        if quote != '\'' && quote != '"' {
            return None;
        }

        let body = &rest[1..];
        let mut item = String::new();
        let mut close = None;
        let mut chars = body.char_indices();
        while let Some((i, c)) = chars.next() {
            if c == '\\' {
                if let Some((_, escaped)) = chars.next() {
                    item.push(escaped);
                }
            } else if c == quote {
                close = Some(i);
                break;
            } else {
                item.push(c);
            }
        }
        items.push(item);

        rest = body[close? + 1..].trim_start();
        if let Some(after_comma) = rest.strip_prefix(',') {
            rest = after_comma.trim_start();
        } else if !rest.is_empty() {
            return None;
        }
    }

    Some(items)
}

fn scan_lines(response: &str) -> Vec<String> {
    response
        .lines()
        .filter_map(|line| {
            let line = line.trim().trim_end_matches(',').trim_end();
            if let Some(item) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
                return Some(item.trim().to_string());
            }
            if line.len() >= 2 && line.starts_with('"') && line.ends_with('"') {
                return Some(line.trim_matches('"').trim().to_string());
            }
            None
        })
        .collect()
}
