//! Skill Scorer: one LLM call per skill, producing a 0-10 proficiency score.
//!
//! Scoring is total. Every input skill yields exactly one `SkillScore`, whatever
//! the oracles do; failures degrade to the neutral score with the cause recorded
//! as reasoning.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::analysis::prompts::{
    SCORING_TEMPERATURE, SKILL_SCORE_DIRECT_TEMPLATE, SKILL_SCORE_INDEXED_TEMPLATE,
};
use crate::document::prefix_chars;
use crate::document::sanitize::sanitize;
use crate::index::{IndexError, SimilarityIndex};
use crate::llm_client::{bounded, CompletionModel, Embedder};
use crate::models::analysis::{ScoringStrategy, SkillScore, MAX_SKILL_SCORE, NEUTRAL_SCORE};

/// Chunks retrieved per skill from the similarity index.
pub const CONTEXT_CHUNKS: usize = 3;
/// Length of the error text kept in a fallback reasoning.
const FAILURE_CAUSE_CHARS: usize = 50;

static SCORE_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]{1,2}").expect("score regex is valid"));

// ────────────────────────────────────────────────────────────────────────────
// Context retrieval strategies
// ────────────────────────────────────────────────────────────────────────────

/// Supplies the resume context placed under a scoring prompt.
#[async_trait]
pub trait ContextRetriever: Send + Sync {
    fn strategy(&self) -> ScoringStrategy;

    /// Prompt template matching the context this retriever returns.
    fn template(&self) -> &'static str;

    async fn context_for(&self, skill: &str) -> Result<String, IndexError>;
}

/// Context = the chunks most similar to the skill name.
pub struct IndexAugmented {
    index: Arc<SimilarityIndex>,
    embedder: Arc<dyn Embedder>,
    call_timeout: Duration,
}

impl IndexAugmented {
    pub fn new(
        index: Arc<SimilarityIndex>,
        embedder: Arc<dyn Embedder>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            index,
            embedder,
            call_timeout,
        }
    }
}

#[async_trait]
impl ContextRetriever for IndexAugmented {
    fn strategy(&self) -> ScoringStrategy {
        ScoringStrategy::IndexAugmented
    }

    fn template(&self) -> &'static str {
        SKILL_SCORE_INDEXED_TEMPLATE
    }

    async fn context_for(&self, skill: &str) -> Result<String, IndexError> {
        let hits = bounded(
            self.call_timeout,
            self.index.query(skill, CONTEXT_CHUNKS, self.embedder.as_ref()),
        )
        .await?;
        debug!("Retrieved {} chunks for {skill}", hits.len());
        Ok(hits
            .into_iter()
            .map(|hit| hit.text)
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

/// Context = a fixed-length prefix of the sanitized resume.
#[derive(Debug, Clone)]
pub struct DirectContext {
    prefix: String,
}

impl DirectContext {
    pub fn new(sanitized_resume: &str, limit: usize) -> Self {
        Self {
            prefix: prefix_chars(sanitized_resume, limit).to_string(),
        }
    }
}

#[async_trait]
impl ContextRetriever for DirectContext {
    fn strategy(&self) -> ScoringStrategy {
        ScoringStrategy::Direct
    }

    fn template(&self) -> &'static str {
        SKILL_SCORE_DIRECT_TEMPLATE
    }

    async fn context_for(&self, _skill: &str) -> Result<String, IndexError> {
        Ok(self.prefix.clone())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Scorer
// ────────────────────────────────────────────────────────────────────────────

pub struct SkillScorer {
    llm: Arc<dyn CompletionModel>,
    retriever: Box<dyn ContextRetriever>,
    fallback: DirectContext,
    call_timeout: Duration,
}

impl SkillScorer {
    /// `fallback` supplies context for any skill whose retrieval fails.
    pub fn new(
        llm: Arc<dyn CompletionModel>,
        retriever: Box<dyn ContextRetriever>,
        fallback: DirectContext,
        call_timeout: Duration,
    ) -> Self {
        Self {
            llm,
            retriever,
            fallback,
            call_timeout,
        }
    }

    /// Scorer that only ever uses the resume prefix.
    pub fn direct(
        llm: Arc<dyn CompletionModel>,
        context: DirectContext,
        call_timeout: Duration,
    ) -> Self {
        Self::new(llm, Box::new(context.clone()), context, call_timeout)
    }

    pub fn strategy(&self) -> ScoringStrategy {
        self.retriever.strategy()
    }

    /// Scores every skill in order. The output always has one entry per input skill.
    pub async fn score_all(&self, skills: &[String]) -> Vec<SkillScore> {
        let mut scores = Vec::with_capacity(skills.len());
        for skill in skills {
            scores.push(self.score(skill).await);
        }
        info!(
            "Scored {} skills using {:?} context",
            scores.len(),
            self.strategy()
        );
        scores
    }

    /// Scores one skill. The result keeps the caller's skill name; the prompt uses
    /// the sanitized form.
    pub async fn score(&self, skill: &str) -> SkillScore {
        let clean_skill = sanitize(skill);

        let (template, context) = match self.retriever.context_for(&clean_skill).await {
            Ok(context) => (self.retriever.template(), context),
            Err(e) => {
                warn!("Context retrieval failed for {skill}, using resume prefix: {e}");
                (self.fallback.template(), self.fallback.prefix.clone())
            }
        };

        let prompt = template
            .replace("{skill}", &clean_skill)
            .replace("{context}", &context);

        match bounded(self.call_timeout, self.llm.complete(&prompt, SCORING_TEMPERATURE)).await {
            Ok(response) => {
                let score = parse_score(&response).unwrap_or_else(|| {
                    debug!("No score found in response for {skill}, defaulting to {NEUTRAL_SCORE}");
                    NEUTRAL_SCORE
                });
                SkillScore::new(skill, score, response)
            }
            Err(e) => {
                warn!("Error analyzing {skill}: {e}");
                let cause: String = e.to_string().chars().take(FAILURE_CAUSE_CHARS).collect();
                SkillScore::neutral(skill, format!("Analysis skipped: {cause}"))
            }
        }
    }
}

/// First one- or two-digit number in the response, capped at 10.
pub fn parse_score(response: &str) -> Option<u8> {
    SCORE_DIGITS
        .find(response)
        .and_then(|m| m.as_str().parse::<u8>().ok())
        .map(|score| score.min(MAX_SKILL_SCORE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::testing::{HangingModel, ScriptedModel};
    use crate::index::tests::{FailingEmbedder, KeywordEmbedder};
    use crate::llm_client::LlmError;

    const RESUME: &str = "Built Python data pipelines for five years.\n\nNo container experience.";

    fn skills(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_score_takes_first_number() {
        assert_eq!(parse_score("8"), Some(8));
        assert_eq!(parse_score("I'd rate this 7 out of 10."), Some(7));
        assert_eq!(parse_score("Score: 10/10"), Some(10));
    }

    #[test]
    fn test_parse_score_clamps_and_truncates() {
        // Two digits at most: "100" reads as 10.
        assert_eq!(parse_score("100"), Some(10));
        assert_eq!(parse_score("42 points"), Some(10));
    }

    #[test]
    fn test_parse_score_without_digits() {
        assert_eq!(parse_score("Strong evidence of expertise."), None);
        assert_eq!(parse_score(""), None);
    }

    #[tokio::test]
    async fn test_direct_scoring_uses_resume_prefix() {
        let llm = Arc::new(ScriptedModel::new(|_| Ok("Score: 8. Solid Python work.".to_string())));
        let scorer = SkillScorer::direct(
            llm.clone(),
            DirectContext::new(RESUME, 22),
            Duration::from_secs(5),
        );

        let score = scorer.score("Python").await;
        assert_eq!(score.score, 8);
        assert_eq!(score.reasoning, "Score: 8. Solid Python work.");
        assert_eq!(scorer.strategy(), ScoringStrategy::Direct);

        let prompt = &llm.prompts()[0];
        assert!(prompt.contains("proficiency in Python?"));
        assert!(prompt.contains("Resume:\nBuilt Python data pipe"));
        assert!(!prompt.contains("five years"));
    }

    #[tokio::test]
    async fn test_unparseable_response_scores_neutral() {
        let llm = Arc::new(ScriptedModel::new(|_| Ok("Hard to say.".to_string())));
        let scorer =
            SkillScorer::direct(llm, DirectContext::new(RESUME, 2000), Duration::from_secs(5));

        let score = scorer.score("Go").await;
        assert_eq!(score.score, NEUTRAL_SCORE);
        assert_eq!(score.reasoning, "Hard to say.");
    }

    #[tokio::test]
    async fn test_index_context_in_prompt() {
        let embedder: Arc<dyn Embedder> = Arc::new(KeywordEmbedder {
            keywords: vec!["python", "docker"],
        });
        let index = SimilarityIndex::build(
            vec![
                "Built Python data pipelines".to_string(),
                "Deployed Docker images".to_string(),
            ],
            embedder.as_ref(),
        )
        .await
        .unwrap();

        let llm = Arc::new(ScriptedModel::new(|_| Ok("9".to_string())));
        let scorer = SkillScorer::new(
            llm.clone(),
            Box::new(IndexAugmented::new(
                Arc::new(index),
                embedder,
                Duration::from_secs(5),
            )),
            DirectContext::new(RESUME, 2000),
            Duration::from_secs(5),
        );

        let score = scorer.score("Python").await;
        assert_eq!(score.score, 9);
        assert_eq!(scorer.strategy(), ScoringStrategy::IndexAugmented);

        let prompt = &llm.prompts()[0];
        assert!(prompt.contains("Relevant resume content:\nBuilt Python data pipelines\n"));
    }

    #[tokio::test]
    async fn test_failed_query_falls_back_to_prefix_for_that_skill() {
        let good: Arc<dyn Embedder> = Arc::new(KeywordEmbedder {
            keywords: vec!["python"],
        });
        let index = SimilarityIndex::build(vec!["Python pipelines".to_string()], good.as_ref())
            .await
            .unwrap();

        let llm = Arc::new(ScriptedModel::new(|_| Ok("6".to_string())));
        let scorer = SkillScorer::new(
            llm.clone(),
            Box::new(IndexAugmented::new(
                Arc::new(index),
                Arc::new(FailingEmbedder),
                Duration::from_secs(5),
            )),
            DirectContext::new(RESUME, 2000),
            Duration::from_secs(5),
        );

        let score = scorer.score("Python").await;
        assert_eq!(score.score, 6);
        assert!(llm.prompts()[0].contains("Resume:\nBuilt Python"));
    }

    #[tokio::test]
    async fn test_scoring_is_total_under_failure_injection() {
        let llm = Arc::new(ScriptedModel::new(|prompt| {
            if prompt.contains("Docker") || prompt.contains("Kafka") {
                Err(LlmError::Api {
                    status: 500,
                    message: "upstream exploded while generating a completion".to_string(),
                })
            } else {
                Ok("7".to_string())
            }
        }));
        let scorer =
            SkillScorer::direct(llm, DirectContext::new(RESUME, 2000), Duration::from_secs(5));

        let input = skills(&["Python", "Docker", "SQL", "Kafka"]);
        let scores = scorer.score_all(&input).await;

        assert_eq!(scores.len(), input.len());
        let names: Vec<&str> = scores.iter().map(|s| s.skill.as_str()).collect();
        assert_eq!(names, vec!["Python", "Docker", "SQL", "Kafka"]);
        assert!(scores.iter().all(|s| s.score <= 10));

        assert_eq!(scores[0].score, 7);
        assert_eq!(scores[1].score, NEUTRAL_SCORE);
        assert!(scores[1].reasoning.starts_with("Analysis skipped: "));
        assert!(scores[1].reasoning.chars().count() <= "Analysis skipped: ".len() + 50);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_scores_neutral() {
        let scorer = SkillScorer::direct(
            Arc::new(HangingModel),
            DirectContext::new(RESUME, 2000),
            Duration::from_secs(60),
        );

        let score = scorer.score("Rust").await;
        assert_eq!(score.score, NEUTRAL_SCORE);
        assert!(score.reasoning.contains("timed out"));
    }

    #[tokio::test]
    async fn test_original_skill_name_kept() {
        let llm = Arc::new(ScriptedModel::new(|_| Ok("4".to_string())));
        let scorer = SkillScorer::direct(
            llm.clone(),
            DirectContext::new(RESUME, 2000),
            Duration::from_secs(5),
        );

        let score = scorer.score("C\u{0007}++").await;
        assert_eq!(score.skill, "C\u{0007}++");
        assert!(llm.prompts()[0].contains("proficiency in C++?"));
    }
}
