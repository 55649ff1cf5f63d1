//! Analysis Orchestrator: drives one run from uploaded documents to a final result.
//!
//! Stages: `Idle -> TextExtracted -> SkillsResolved -> Scored -> WeaknessesAnalyzed -> Complete`,
//! or `Failed` from any stage. Only extraction and validation errors end a run early;
//! every oracle failure inside a stage degrades to a documented default.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::analysis::aggregator::{aggregate, MISSING_THRESHOLD};
use crate::analysis::skill_extractor::{dedupe_skills, extract_skills, parse_skill_list};
use crate::analysis::skill_scorer::{DirectContext, IndexAugmented, SkillScorer};
use crate::analysis::weakness::WeaknessAnalyzer;
use crate::config::AnalysisLimits;
use crate::document::chunker::ChunkProfile;
use crate::document::{extract_text, ResumeDocument, UploadedDocument};
use crate::errors::AppError;
use crate::index::store::IndexStore;
use crate::index::SimilarityIndex;
use crate::llm_client::{bounded, CompletionModel, Embedder};
use crate::models::analysis::{AnalysisResult, SkillScore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisStage {
    Idle,
    TextExtracted,
    SkillsResolved,
    Scored,
    WeaknessesAnalyzed,
    Complete,
    Failed,
}

impl fmt::Display for AnalysisStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnalysisStage::Idle => "idle",
            AnalysisStage::TextExtracted => "text_extracted",
            AnalysisStage::SkillsResolved => "skills_resolved",
            AnalysisStage::Scored => "scored",
            AnalysisStage::WeaknessesAnalyzed => "weaknesses_analyzed",
            AnalysisStage::Complete => "complete",
            AnalysisStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Where the target skills come from. The two inputs are mutually exclusive.
#[derive(Debug, Clone)]
pub enum SkillSource {
    JobDescription(UploadedDocument),
    Explicit(Vec<String>),
}

impl SkillSource {
    /// Builds the source from optional caller inputs.
    /// `requirements` is a comma-separated skill list.
    pub fn from_inputs(
        job_description: Option<UploadedDocument>,
        requirements: Option<&str>,
    ) -> Result<Self, AppError> {
        match (job_description, requirements) {
            (Some(_), Some(_)) => Err(AppError::Validation(
                "Provide either a job description or a skill list, not both".to_string(),
            )),
            (Some(jd), None) => Ok(SkillSource::JobDescription(jd)),
            (None, Some(requirements)) => {
                let skills = parse_skill_list(requirements);
                if skills.is_empty() {
                    return Err(AppError::Validation(
                        "Skill list is empty: no basis for scoring".to_string(),
                    ));
                }
                Ok(SkillSource::Explicit(skills))
            }
            (None, None) => Err(AppError::Validation(
                "Provide a job description or a skill list: no basis for scoring".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub resume: UploadedDocument,
    pub skills: SkillSource,
    /// 0..=100
    pub cutoff_score: u32,
}

pub struct AnalysisOrchestrator {
    llm: Arc<dyn CompletionModel>,
    embedder: Arc<dyn Embedder>,
    store: IndexStore,
    limits: AnalysisLimits,
    call_timeout: Duration,
}

impl AnalysisOrchestrator {
    pub fn new(
        llm: Arc<dyn CompletionModel>,
        embedder: Arc<dyn Embedder>,
        store: IndexStore,
        limits: AnalysisLimits,
        call_timeout: Duration,
    ) -> Self {
        Self {
            llm,
            embedder,
            store,
            limits,
            call_timeout,
        }
    }

    /// Runs one analysis. Returns the final result, or the error that ended the run.
    pub async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisResult, AppError> {
        let mut stage = AnalysisStage::Idle;
        match self.run(request, &mut stage).await {
            Ok(result) => {
                advance(&mut stage, AnalysisStage::Complete);
                Ok(result)
            }
            Err(e) => {
                error!("Analysis failed during stage '{stage}': {e}");
                advance(&mut stage, AnalysisStage::Failed);
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        request: AnalysisRequest,
        stage: &mut AnalysisStage,
    ) -> Result<AnalysisResult, AppError> {
        let resume = ResumeDocument::new(&extract_text(&request.resume).await?)?;
        advance(stage, AnalysisStage::TextExtracted);

        let skills = self.resolve_skills(request.skills).await?;
        advance(stage, AnalysisStage::SkillsResolved);

        let scorer = self.build_scorer(&resume, &skills).await;
        let scores = scorer.score_all(&skills).await;
        let mut result = aggregate(scores, request.cutoff_score, scorer.strategy());
        info!(
            "Overall score {} (cutoff {}, selected: {})",
            result.overall_score, result.cutoff_score, result.selected
        );
        advance(stage, AnalysisStage::Scored);

        if result.missing_skills.is_empty() {
            return Ok(result);
        }

        let missing = missing_scores(&result);
        let analyzer = WeaknessAnalyzer::new(
            self.llm.clone(),
            self.limits.weakness_context_chars,
            self.call_timeout,
        );
        result.resume_weaknesses = analyzer.analyze_all(&missing, resume.sanitized()).await;
        advance(stage, AnalysisStage::WeaknessesAnalyzed);

        Ok(result)
    }

    /// Turns the skill source into an ordered skill list.
    /// An unreadable or empty job description is fatal; an unparseable extraction is not.
    pub async fn resolve_skills(&self, source: SkillSource) -> Result<Vec<String>, AppError> {
        match source {
            SkillSource::Explicit(skills) => Ok(dedupe_skills(skills)),
            SkillSource::JobDescription(document) => {
                let jd_text = extract_text(&document).await?;
                if jd_text.trim().is_empty() {
                    return Err(AppError::Extraction(format!(
                        "Failed to extract text from job description '{}'",
                        document.name
                    )));
                }
                let skills = extract_skills(&jd_text, self.llm.as_ref(), self.call_timeout).await;
                if skills.is_empty() {
                    warn!("No skills extracted from '{}'; nothing to score", document.name);
                }
                Ok(skills)
            }
        }
    }

    /// Builds this run's similarity index and returns an index-backed scorer, or a
    /// direct scorer if the index cannot be built.
    async fn build_scorer(&self, resume: &ResumeDocument, skills: &[String]) -> SkillScorer {
        let direct = DirectContext::new(resume.sanitized(), self.limits.direct_context_chars);
        if skills.is_empty() {
            return SkillScorer::direct(self.llm.clone(), direct, self.call_timeout);
        }

        let chunks = resume.chunks(ChunkProfile::COMPACT, self.limits.index_source_chars);
        let built = bounded(
            self.call_timeout,
            SimilarityIndex::build(chunks, self.embedder.as_ref()),
        )
        .await;

        match built {
            Ok(index) => {
                if let Err(e) = self.store.save(&index).await {
                    warn!("Could not save similarity index {}: {e}", index.id());
                }
                let retriever =
                    IndexAugmented::new(Arc::new(index), self.embedder.clone(), self.call_timeout);
                SkillScorer::new(self.llm.clone(), Box::new(retriever), direct, self.call_timeout)
            }
            Err(e) => {
                warn!("Similarity index unavailable, falling back to direct analysis: {e}");
                SkillScorer::direct(self.llm.clone(), direct, self.call_timeout)
            }
        }
    }
}

/// Scores at or below the missing threshold, one per scored entry, in skill order.
fn missing_scores(result: &AnalysisResult) -> Vec<SkillScore> {
    result
        .skill_scores
        .iter()
        .filter(|s| s.score <= MISSING_THRESHOLD)
        .cloned()
        .collect()
}

fn advance(stage: &mut AnalysisStage, next: AnalysisStage) {
    info!("Analysis stage: {} -> {}", stage, next);
    *stage = next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::report;
    use crate::analysis::testing::ScriptedModel;
    use crate::index::tests::{FailingEmbedder, KeywordEmbedder};
    use crate::models::analysis::ScoringStrategy;

    const RESUME: &str = "Jane Doe\n\nSenior engineer. Wrote Python services and data pipelines \
        for six years. Led the migration of reporting jobs to Python 3.";

    /// Scores Python 9 and Docker 4; answers weakness prompts with JSON.
    fn scripted_llm() -> Arc<ScriptedModel> {
        Arc::new(ScriptedModel::new(|prompt| {
            if prompt.contains("The resume lacks the skill") {
                Ok(r#"{"weakness": "No container work listed.",
                       "improvement_suggestions": ["Add a Docker project"],
                       "example_addition": "Containerized the reporting stack"}"#
                    .to_string())
            } else if prompt.contains("Extract and list the key skills") {
                Ok(r#"["Python", "Docker"]"#.to_string())
            } else if prompt.contains("proficiency in Python?") {
                Ok("9 - extensive Python experience".to_string())
            } else if prompt.contains("proficiency in Docker?") {
                Ok("4 - no containers mentioned".to_string())
            } else {
                Ok("I am not sure".to_string())
            }
        }))
    }

    fn orchestrator(
        llm: Arc<ScriptedModel>,
        embedder: Arc<dyn Embedder>,
        store_root: &std::path::Path,
    ) -> AnalysisOrchestrator {
        AnalysisOrchestrator::new(
            llm,
            embedder,
            IndexStore::new(store_root, 3),
            AnalysisLimits::default(),
            Duration::from_secs(5),
        )
    }

    fn keyword_embedder() -> Arc<dyn Embedder> {
        Arc::new(KeywordEmbedder {
            keywords: vec!["python", "docker"],
        })
    }

    fn resume_upload(text: &'static str) -> UploadedDocument {
        UploadedDocument::from_bytes("resume.txt", text).unwrap()
    }

    fn explicit(skills: &[&str]) -> SkillSource {
        SkillSource::Explicit(skills.iter().map(|s| s.to_string()).collect())
    }

    #[tokio::test]
    async fn test_python_docker_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let llm = scripted_llm();
        let orchestrator = orchestrator(llm.clone(), keyword_embedder(), dir.path());

        let result = orchestrator
            .analyze(AnalysisRequest {
                resume: resume_upload(RESUME),
                skills: explicit(&["Python", "Docker"]),
                cutoff_score: 75,
            })
            .await
            .unwrap();

        assert_eq!(result.overall_score, 65);
        assert!(!result.selected);
        assert_eq!(result.strengths, vec!["Python"]);
        assert_eq!(result.missing_skills, vec!["Docker"]);
        assert_eq!(result.improvement_areas, vec!["Docker"]);
        assert_eq!(result.strategy, ScoringStrategy::IndexAugmented);

        assert_eq!(result.resume_weaknesses.len(), 1);
        let weakness = &result.resume_weaknesses[0];
        assert_eq!(weakness.skill, "Docker");
        assert_eq!(weakness.score, 4);
        assert_eq!(weakness.detail, "No container work listed.");

        // One index artifact persisted for the run.
        let store = IndexStore::new(dir.path(), 3);
        assert_eq!(store.list().await.unwrap().len(), 1);

        assert!(llm
            .prompts()
            .iter()
            .any(|p| p.contains("Relevant resume content:")));
    }

    #[tokio::test]
    async fn test_empty_skill_list_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let llm = scripted_llm();
        let orchestrator = orchestrator(llm.clone(), keyword_embedder(), dir.path());

        let result = orchestrator
            .analyze(AnalysisRequest {
                resume: resume_upload(RESUME),
                skills: explicit(&[]),
                cutoff_score: 75,
            })
            .await
            .unwrap();

        assert_eq!(result.overall_score, 0);
        assert!(!result.selected);
        assert!(result.missing_skills.is_empty());
        assert!(result.resume_weaknesses.is_empty());
        assert!(llm.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_empty_resume_fails_run() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = orchestrator(scripted_llm(), keyword_embedder(), dir.path());

        let err = orchestrator
            .analyze(AnalysisRequest {
                resume: resume_upload("  \n\t "),
                skills: explicit(&["Python"]),
                cutoff_score: 75,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Extraction(_)));
    }

    #[tokio::test]
    async fn test_embedder_failure_falls_back_to_direct() {
        let dir = tempfile::tempdir().unwrap();
        let llm = scripted_llm();
        let orchestrator = orchestrator(llm.clone(), Arc::new(FailingEmbedder), dir.path());

        let result = orchestrator
            .analyze(AnalysisRequest {
                resume: resume_upload(RESUME),
                skills: explicit(&["Python", "Docker"]),
                cutoff_score: 75,
            })
            .await
            .unwrap();

        assert_eq!(result.strategy, ScoringStrategy::Direct);
        assert_eq!(result.reasoning(), "Direct analysis without vector store");
        assert_eq!(result.overall_score, 65);
        assert!(llm.prompts().iter().any(|p| p.contains("Resume:\nJane Doe")));
        assert!(IndexStore::new(dir.path(), 3).list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_job_description_drives_skills() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = orchestrator(scripted_llm(), keyword_embedder(), dir.path());

        let jd = UploadedDocument::from_bytes(
            "jd.txt",
            "Backend role. Requires Python and Docker.",
        )
        .unwrap();
        let result = orchestrator
            .analyze(AnalysisRequest {
                resume: resume_upload(RESUME),
                skills: SkillSource::JobDescription(jd),
                cutoff_score: 50,
            })
            .await
            .unwrap();

        assert_eq!(result.score_of("Python"), Some(9));
        assert_eq!(result.score_of("Docker"), Some(4));
        assert!(result.selected);
        assert!(result.improvement_areas.is_empty());
        assert_eq!(result.resume_weaknesses.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_job_description_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = orchestrator(scripted_llm(), keyword_embedder(), dir.path());

        let jd = UploadedDocument::from_bytes("jd.txt", "   ").unwrap();
        let err = orchestrator
            .resolve_skills(SkillSource::JobDescription(jd))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Extraction(_)));
    }

    #[tokio::test]
    async fn test_repeated_explicit_skill_scored_once() {
        let dir = tempfile::tempdir().unwrap();
        let llm = scripted_llm();
        let orchestrator = orchestrator(llm.clone(), keyword_embedder(), dir.path());

        let result = orchestrator
            .analyze(AnalysisRequest {
                resume: resume_upload(RESUME),
                skills: explicit(&["Docker", "Python", "Docker"]),
                cutoff_score: 75,
            })
            .await
            .unwrap();

        let names: Vec<&str> = result.skill_scores.iter().map(|s| s.skill.as_str()).collect();
        assert_eq!(names, vec!["Docker", "Python"]);
        assert_eq!(result.missing_skills, vec!["Docker"]);
        assert_eq!(result.resume_weaknesses.len(), result.missing_skills.len());
        let docker_prompts = llm
            .prompts()
            .iter()
            .filter(|p| p.contains("proficiency in Docker?"))
            .count();
        assert_eq!(docker_prompts, 1);

        let json = report::to_json(&result).unwrap();
        assert_eq!(json.matches("\"Docker\": ").count(), 2);
    }

    #[tokio::test]
    async fn test_repeated_extracted_skill_scored_once() {
        let dir = tempfile::tempdir().unwrap();
        let llm = Arc::new(ScriptedModel::new(|prompt| {
            if prompt.contains("Extract and list the key skills") {
                Ok(r#"["Python", "Docker", "Python"]"#.to_string())
            } else if prompt.contains("proficiency in Python?") {
                Ok("9".to_string())
            } else {
                Ok("4".to_string())
            }
        }));
        let orchestrator = orchestrator(llm, keyword_embedder(), dir.path());

        let jd = UploadedDocument::from_bytes("jd.txt", "Python, Docker, more Python.").unwrap();
        let skills = orchestrator
            .resolve_skills(SkillSource::JobDescription(jd))
            .await
            .unwrap();
        assert_eq!(skills, vec!["Python", "Docker"]);
    }

    #[test]
    fn test_missing_scores_follow_each_score() {
        let result = aggregate(
            vec![
                SkillScore::new("Python", 9, "9"),
                SkillScore::new("Python", 4, "4"),
                SkillScore::new("Docker", 5, "5"),
            ],
            75,
            ScoringStrategy::Direct,
        );

        let missing = missing_scores(&result);
        let scores: Vec<(&str, u8)> = missing.iter().map(|s| (s.skill.as_str(), s.score)).collect();
        assert_eq!(scores, vec![("Python", 4), ("Docker", 5)]);
        assert_eq!(missing.len(), result.missing_skills.len());
    }

    #[test]
    fn test_skill_source_validation() {
        let jd = || UploadedDocument::from_bytes("jd.txt", "Python").unwrap();

        assert!(matches!(
            SkillSource::from_inputs(Some(jd()), Some("Python")),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            SkillSource::from_inputs(None, None),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            SkillSource::from_inputs(None, Some(" , ")),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            SkillSource::from_inputs(Some(jd()), None),
            Ok(SkillSource::JobDescription(_))
        ));
        match SkillSource::from_inputs(None, Some("Python, Docker")).unwrap() {
            SkillSource::Explicit(skills) => assert_eq!(skills, vec!["Python", "Docker"]),
            other => panic!("unexpected source: {other:?}"),
        }
    }
}
