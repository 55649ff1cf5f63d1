// All LLM prompt templates for the analysis pipeline.
// Reuses cross-cutting fragments from llm_client::prompts.

/// Temperature for proficiency scoring. Zero keeps scores reproducible.
pub const SCORING_TEMPERATURE: f32 = 0.0;
/// Temperature for generative calls (skill extraction, weakness narratives).
pub const GENERATIVE_TEMPERATURE: f32 = 0.5;

/// Skill extraction prompt. Replace `{jd_text}` and `{json_only}` before sending.
pub const SKILL_EXTRACTION_PROMPT_TEMPLATE: &str = r#"Extract and list the key skills required for the job from the following job description:

{jd_text}

Format the output as a JSON array of strings, for example: ["Python", "Docker", "Team leadership"].
Keep each skill short (1-4 words). {json_only}"#;

/// Scoring prompt when context comes from the similarity index.
/// Replace `{skill}` and `{context}`.
pub const SKILL_SCORE_INDEXED_TEMPLATE: &str = "On a scale of 0 to 10, how well does this resume demonstrate proficiency in {skill}?\n\nRelevant resume content:\n{context}";

/// Scoring prompt when context is the resume prefix.
/// Replace `{skill}` and `{context}`.
pub const SKILL_SCORE_DIRECT_TEMPLATE: &str =
    "On a scale of 0 to 10, how well does this resume demonstrate proficiency in {skill}?\n\nResume:\n{context}";

/// Weakness narrative prompt. Replace `{skill}`, `{resume}` and `{json_only}`.
pub const WEAKNESS_PROMPT_TEMPLATE: &str = r#"The resume lacks the skill: {skill}. Suggest ways to improve the resume to better demonstrate this skill.
For your analysis, consider:
1. What is missing in the resume regarding this skill?
2. How can it be improved with specific examples?
3. Provide actionable suggestions.

Resume Content:
{resume}

Respond with a JSON object with exactly these keys:
{
  "weakness": "A concise description of what's missing or problematic (1-2 sentences)",
  "improvement_suggestions": ["Specific suggestion 1", "Specific suggestion 2", "Specific suggestion 3"],
  "example_addition": "A specific bullet point that could be added to showcase this skill"
}
{json_only}"#;
