// Skill analysis pipeline.
// Implements: skill extraction, per-skill scoring, aggregation, weakness narratives,
// orchestration, and result export.
// All LLM calls go through the llm_client traits; no direct provider calls here.

pub mod aggregator;
pub mod orchestrator;
pub mod prompts;
pub mod report;
pub mod skill_extractor;
pub mod skill_scorer;
pub mod weakness;
