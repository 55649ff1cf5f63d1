//! Score Aggregator: folds per-skill scores into the run's `AnalysisResult`.
//!
//! Pure and deterministic. Thresholds:
//! - score >= 7 is a strength
//! - score <= 5 is a missing skill
//! - score == 6 is neither

use crate::models::analysis::{AnalysisResult, ScoringStrategy, SkillScore, MAX_SKILL_SCORE};

pub const STRENGTH_THRESHOLD: u8 = 7;
pub const MISSING_THRESHOLD: u8 = 5;

/// `overall_score = floor(100 * sum / (10 * N))`, or 0 when there are no skills.
pub fn overall_score(scores: &[SkillScore]) -> u32 {
    if scores.is_empty() {
        return 0;
    }
    let total: u32 = scores.iter().map(|s| u32::from(s.score)).sum();
    let max_total = u32::from(MAX_SKILL_SCORE) * scores.len() as u32;
    100 * total / max_total
}

pub fn aggregate(
    scores: Vec<SkillScore>,
    cutoff_score: u32,
    strategy: ScoringStrategy,
) -> AnalysisResult {
    let overall_score = overall_score(&scores);
    let selected = overall_score >= cutoff_score;

    let strengths = skills_where(&scores, |score| score >= STRENGTH_THRESHOLD);
    let missing_skills = skills_where(&scores, |score| score <= MISSING_THRESHOLD);
    let improvement_areas = if selected {
        Vec::new()
    } else {
        missing_skills.clone()
    };

    AnalysisResult {
        overall_score,
        skill_scores: scores,
        selected,
        cutoff_score,
        strategy,
        missing_skills,
        strengths,
        improvement_areas,
        resume_weaknesses: Vec::new(),
    }
}

fn skills_where(scores: &[SkillScore], keep: impl Fn(u8) -> bool) -> Vec<String> {
    scores
        .iter()
        .filter(|s| keep(s.score))
        .map(|s| s.skill.clone())
        .collect()
}
