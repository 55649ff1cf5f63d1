//! Result export. Both formats are pure projections of an `AnalysisResult`.

use chrono::NaiveDateTime;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::models::analysis::{AnalysisResult, WeaknessDetail};

const RULE_WIDTH: usize = 80;

/// Skill-keyed object that keeps skill order on output.
struct OrderedMap<'a, V>(Vec<(&'a str, V)>);

impl<V: Serialize> Serialize for OrderedMap<'_, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[derive(Serialize)]
struct ExportDocument<'a> {
    overall_score: u32,
    skill_scores: OrderedMap<'a, u8>,
    skill_reasonings: OrderedMap<'a, &'a str>,
    selected: bool,
    cutoff_score: u32,
    reasoning: &'a str,
    missing_skills: &'a [String],
    strengths: &'a [String],
    improvement_areas: &'a [String],
    resume_weaknesses: &'a [WeaknessDetail],
}

/// Pretty-printed JSON document with skill-keyed score and reasoning objects.
pub fn to_json(result: &AnalysisResult) -> Result<String, serde_json::Error> {
    let document = ExportDocument {
        overall_score: result.overall_score,
        skill_scores: OrderedMap(
            result
                .skill_scores
                .iter()
                .map(|s| (s.skill.as_str(), s.score))
                .collect(),
        ),
        skill_reasonings: OrderedMap(
            result
                .skill_scores
                .iter()
                .map(|s| (s.skill.as_str(), s.reasoning.as_str()))
                .collect(),
        ),
        selected: result.selected,
        cutoff_score: result.cutoff_score,
        reasoning: result.reasoning(),
        missing_skills: &result.missing_skills,
        strengths: &result.strengths,
        improvement_areas: &result.improvement_areas,
        resume_weaknesses: &result.resume_weaknesses,
    };
    serde_json::to_string_pretty(&document)
}

/// Human-readable flat-text report.
pub fn to_text(result: &AnalysisResult, generated_at: NaiveDateTime) -> String {
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);
    let status = if result.selected {
        "RECOMMENDED"
    } else {
        "NOT RECOMMENDED"
    };

    let mut out = format!("{heavy}\nRESUME ANALYSIS REPORT\n{heavy}\n\n");
    out.push_str(&format!("Overall Score: {}%\n", result.overall_score));
    out.push_str(&format!("Selection Status: {status}\n"));
    out.push_str(&format!(
        "Analysis Date: {}\n\n",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    ));

    out.push_str(&format!("{light}\nSKILL SCORES\n{light}\n"));
    for score in &result.skill_scores {
        out.push_str(&format!("• {}: {}%\n", score.skill, u32::from(score.score) * 10));
    }

    out.push_str(&format!("\n{light}\nSTRENGTHS\n{light}\n"));
    for strength in &result.strengths {
        out.push_str(&format!("✓ {strength}\n"));
    }

    if !result.resume_weaknesses.is_empty() {
        out.push_str(&format!("\n{light}\nAREAS FOR IMPROVEMENT\n{light}\n"));
        for weakness in &result.resume_weaknesses {
            out.push_str(&format!("\n• {}\n", weakness.skill));
            out.push_str(&format!("  Issue: {}\n", weakness.detail));
            for suggestion in &weakness.suggestions {
                out.push_str(&format!("  - {suggestion}\n"));
            }
        }
    }

    out
}

/// `resume_analysis_<YYYYmmdd_HHMMSS>.<extension>`
pub fn export_file_name(extension: &str, generated_at: NaiveDateTime) -> String {
    format!(
        "resume_analysis_{}.{extension}",
        generated_at.format("%Y%m%d_%H%M%S")
    )
}
