use serde::{Deserialize, Serialize};

/// Score given when the LLM gives no usable number or the call fails.
pub const NEUTRAL_SCORE: u8 = 5;
pub const MAX_SKILL_SCORE: u8 = 10;

/// Which context strategy produced the skill scores of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringStrategy {
    /// Context retrieved from the per-run similarity index.
    IndexAugmented,
    /// Context is a fixed-length prefix of the resume text.
    Direct,
}

impl ScoringStrategy {
    pub fn description(&self) -> &'static str {
        match self {
            ScoringStrategy::IndexAugmented => "Vector store based semantic analysis",
            ScoringStrategy::Direct => "Direct analysis without vector store",
        }
    }
}

/// One skill's proficiency score. `score` is always within 0..=10.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillScore {
    pub skill: String,
    pub score: u8,
    /// Full LLM response, or the cause of the fallback when no response was usable.
    pub reasoning: String,
}

impl SkillScore {
    pub fn new(skill: impl Into<String>, score: u8, reasoning: impl Into<String>) -> Self {
        Self {
            skill: skill.into(),
            score: score.min(MAX_SKILL_SCORE),
            reasoning: reasoning.into(),
        }
    }

    /// Neutral default used when scoring could not be performed.
    pub fn neutral(skill: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::new(skill, NEUTRAL_SCORE, cause)
    }
}

/// Improvement narrative for one missing skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaknessDetail {
    pub skill: String,
    pub score: u8,
    pub detail: String,
    pub suggestions: Vec<String>,
    pub example: String,
}

/// Final record of one analysis run.
///
/// Built once by the aggregator; the orchestrator then attaches `resume_weaknesses`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// 0..=100
    pub overall_score: u32,
    /// In skill order.
    pub skill_scores: Vec<SkillScore>,
    pub selected: bool,
    pub cutoff_score: u32,
    pub strategy: ScoringStrategy,
    /// Skills scored 5 or lower, in skill order.
    pub missing_skills: Vec<String>,
    /// Skills scored 7 or higher, in skill order.
    pub strengths: Vec<String>,
    /// `missing_skills` when not selected, otherwise empty.
    pub improvement_areas: Vec<String>,
    pub resume_weaknesses: Vec<WeaknessDetail>,
}

impl AnalysisResult {
    pub fn reasoning(&self) -> &'static str {
        self.strategy.description()
    }
}

#[cfg(test)]
impl AnalysisResult {
    pub fn score_of(&self, skill: &str) -> Option<u8> {
        self.skill_scores
            .iter()
            .find(|s| s.skill == skill)
            .map(|s| s.score)
    }
}
