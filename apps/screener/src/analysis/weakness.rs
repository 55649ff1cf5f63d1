//! Weakness Analyzer: an improvement narrative for each missing skill.
//!
//! Every call returns a usable `WeaknessDetail`. The defaults below are filled in
//! first and only replaced by non-empty fields from a parsed LLM response.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};

use crate::analysis::prompts::{GENERATIVE_TEMPERATURE, WEAKNESS_PROMPT_TEMPLATE};
use crate::document::prefix_chars;
use crate::document::sanitize::sanitize;
use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::llm_client::{bounded, parse_json, CompletionModel};
use crate::models::analysis::{SkillScore, WeaknessDetail};

const DEFAULT_DETAIL: &str =
    "Skill needs improvement - consider adding relevant projects or certifications";
const CALL_FAILED_DETAIL: &str = "Skill needs improvement - add more relevant experience";
const DEFAULT_SUGGESTIONS: [&str; 3] = [
    "Add a project showcasing this skill to your experience section",
    "Include relevant certifications or training courses",
    "Highlight specific accomplishments using this skill",
];

/// Shape of the JSON object the weakness prompt asks for. Every key is optional.
#[derive(Debug, Deserialize)]
struct WeaknessResponse {
    #[serde(default)]
    weakness: Option<String>,
    #[serde(default)]
    improvement_suggestions: Option<Vec<String>>,
    #[serde(default)]
    example_addition: Option<String>,
}

/// Generic narrative used whenever the LLM gives nothing usable.
pub fn default_weakness(skill: &str, score: u8) -> WeaknessDetail {
    WeaknessDetail {
        skill: skill.to_string(),
        score,
        detail: DEFAULT_DETAIL.to_string(),
        suggestions: DEFAULT_SUGGESTIONS.iter().map(|s| s.to_string()).collect(),
        example: format!(
            "Led implementation of {skill} solution resulting in 30% efficiency improvement"
        ),
    }
}

pub struct WeaknessAnalyzer {
    llm: Arc<dyn CompletionModel>,
    context_chars: usize,
    call_timeout: Duration,
}

impl WeaknessAnalyzer {
    pub fn new(
        llm: Arc<dyn CompletionModel>,
        context_chars: usize,
        call_timeout: Duration,
    ) -> Self {
        Self {
            llm,
            context_chars,
            call_timeout,
        }
    }

    /// One entry per given score, in order. Callers pass only the missing skills.
    pub async fn analyze_all(
        &self,
        missing: &[SkillScore],
        resume_text: &str,
    ) -> Vec<WeaknessDetail> {
        let mut details = Vec::with_capacity(missing.len());
        for skill_score in missing {
            details.push(
                self.analyze(&skill_score.skill, skill_score.score, resume_text)
                    .await,
            );
        }
        info!("Analyzed {} resume weaknesses", details.len());
        details
    }

    pub async fn analyze(&self, skill: &str, score: u8, resume_text: &str) -> WeaknessDetail {
        let mut detail = default_weakness(skill, score);

        let prompt = WEAKNESS_PROMPT_TEMPLATE
            .replace("{skill}", &sanitize(skill))
            .replace(
                "{resume}",
                &sanitize(prefix_chars(resume_text, self.context_chars)),
            )
            .replace("{json_only}", JSON_ONLY_INSTRUCTION);

        let call = self.llm.complete(&prompt, GENERATIVE_TEMPERATURE);
        let response = match bounded(self.call_timeout, call).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Error analyzing weakness for skill {skill}: {e}");
                detail.detail = CALL_FAILED_DETAIL.to_string();
                return detail;
            }
        };

        match parse_json::<WeaknessResponse>(&response) {
            Ok(parsed) => merge(&mut detail, parsed),
            Err(e) => warn!("Unparseable weakness response for {skill}, keeping defaults: {e}"),
        }
        detail
    }
}

fn merge(detail: &mut WeaknessDetail, parsed: WeaknessResponse) {
    if let Some(weakness) = non_empty(parsed.weakness) {
        detail.detail = weakness;
    }
    let suggestions: Vec<String> = parsed
        .improvement_suggestions
        .unwrap_or_default()
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if !suggestions.is_empty() {
        detail.suggestions = suggestions;
    }
    if let Some(example) = non_empty(parsed.example_addition) {
        detail.example = example;
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::testing::{HangingModel, ScriptedModel};
    use crate::llm_client::LlmError;

    const RESUME: &str = "Seasoned backend engineer. Python, PostgreSQL, AWS Lambda.";

    fn analyzer(llm: Arc<dyn CompletionModel>) -> WeaknessAnalyzer {
        WeaknessAnalyzer::new(llm, 3000, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_full_response_replaces_defaults() {
        let llm = Arc::new(ScriptedModel::new(|_| {
            Ok(r#"```json
{
  "weakness": "No container tooling appears anywhere.",
  "improvement_suggestions": ["Containerize the Lambda services", "Mention docker-compose usage"],
  "example_addition": "Packaged 12 services as Docker images"
}
```"#
                .to_string())
        }));
        let detail = analyzer(llm.clone()).analyze("Docker", 4, RESUME).await;

        assert_eq!(detail.skill, "Docker");
        assert_eq!(detail.score, 4);
        assert_eq!(detail.detail, "No container tooling appears anywhere.");
        assert_eq!(detail.suggestions.len(), 2);
        assert_eq!(detail.example, "Packaged 12 services as Docker images");

        let prompt = &llm.prompts()[0];
        assert!(prompt.contains("The resume lacks the skill: Docker."));
        assert!(prompt.contains(RESUME));
    }

    #[tokio::test]
    async fn test_partial_response_keeps_defaults() {
        let llm = Arc::new(ScriptedModel::new(|_| {
            Ok(r#"{"weakness": "", "improvement_suggestions": []}"#.to_string())
        }));
        let detail = analyzer(llm).analyze("Kubernetes", 3, RESUME).await;

        assert_eq!(detail.detail, DEFAULT_DETAIL);
        assert_eq!(detail.suggestions.len(), 3);
        assert_eq!(
            detail.example,
            "Led implementation of Kubernetes solution resulting in 30% efficiency improvement"
        );
    }

    #[tokio::test]
    async fn test_unparseable_response_keeps_defaults() {
        let llm = Arc::new(ScriptedModel::new(|_| Ok("You should learn Go.".to_string())));
        let detail = analyzer(llm).analyze("Go", 2, RESUME).await;
        assert_eq!(detail, default_weakness("Go", 2));
    }

    #[tokio::test]
    async fn test_call_failure_uses_failure_detail() {
        let llm = Arc::new(ScriptedModel::new(|_| Err(LlmError::EmptyContent)));
        let detail = analyzer(llm).analyze("Terraform", 5, RESUME).await;

        assert_eq!(detail.detail, CALL_FAILED_DETAIL);
        assert_eq!(detail.suggestions.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_uses_failure_detail() {
        let detail = WeaknessAnalyzer::new(Arc::new(HangingModel), 3000, Duration::from_secs(60))
            .analyze("Rust", 1, RESUME)
            .await;
        assert_eq!(detail.detail, CALL_FAILED_DETAIL);
    }

    #[tokio::test]
    async fn test_resume_context_is_bounded() {
        let llm = Arc::new(ScriptedModel::new(|_| Ok("{}".to_string())));
        let long_resume = format!("{}TAIL-MARKER", "x".repeat(40));
        WeaknessAnalyzer::new(llm.clone(), 40, Duration::from_secs(5))
            .analyze("SQL", 0, &long_resume)
            .await;
        assert!(!llm.prompts()[0].contains("TAIL-MARKER"));
    }

    #[tokio::test]
    async fn test_one_entry_per_missing_skill() {
        let llm = Arc::new(ScriptedModel::new(|prompt| {
            if prompt.contains("skill: Docker") {
                Err(LlmError::EmptyContent)
            } else {
                Ok("not json".to_string())
            }
        }));
        let missing = vec![
            SkillScore::new("Docker", 4, "4"),
            SkillScore::new("Kafka", 2, "2"),
            SkillScore::new("Go", 5, "5"),
        ];
        let details = analyzer(llm).analyze_all(&missing, RESUME).await;

        assert_eq!(details.len(), 3);
        let names: Vec<&str> = details.iter().map(|d| d.skill.as_str()).collect();
        assert_eq!(names, vec!["Docker", "Kafka", "Go"]);
        assert!(details
            .iter()
            .all(|d| !d.detail.is_empty() && !d.suggestions.is_empty()));
    }
}
