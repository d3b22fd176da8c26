//! Host-facing analysis result

use serde::Serialize;

use forma_catalog::display_name;

use crate::StageScore;

/// Shown when nothing is wrong
pub const POSITIVE_FEEDBACK: &str = "Great form!";

/// Shown when no rule could be checked
pub const CANNOT_ASSESS_FEEDBACK: &str = "Step back so your whole body is visible.";

/// Per-frame analysis published to the host
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Catalog key, e.g. `BICEP_CURL`
    pub exercise_name: String,
    /// Title-cased name for display
    pub display_name: String,
    pub stage_name: Option<String>,
    /// 0..=100
    pub form_score: u8,
    /// Failed rule messages in declaration order
    #[serde(rename = "formAnalysis")]
    pub issues: Vec<String>,
    pub feedback: String,
    pub vocalization_needed: bool,
    /// Stage match was below the acceptance ratio
    pub provisional: bool,
    /// At least one rule was checked
    pub assessable: bool,
    pub rep_count: u32,
}

impl AnalysisResult {
    pub(crate) fn from_score(
        exercise: &str,
        stage: Option<&str>,
        score: &StageScore,
        good_form_threshold: u8,
        provisional: bool,
        rep_count: u32,
    ) -> Self {
        let assessable = score.assessable();
        let feedback = match score.issues.first() {
            Some(issue) => issue.clone(),
            None if assessable => POSITIVE_FEEDBACK.to_string(),
            None => CANNOT_ASSESS_FEEDBACK.to_string(),
        };

        AnalysisResult {
            exercise_name: exercise.to_string(),
            display_name: display_name(exercise),
            stage_name: stage.map(str::to_string),
            form_score: score.form_score,
            issues: score.issues.clone(),
            feedback,
            vocalization_needed: score.form_score < good_form_threshold && !score.issues.is_empty(),
            provisional,
            assessable,
            rep_count,
        }
    }

    /// Result for an exercise none of whose rules can be checked
    pub(crate) fn cannot_assess(exercise: &str, rep_count: u32) -> Self {
        Self::from_score(exercise, None, &StageScore::unassessed(0), 100, true, rep_count)
    }

    /// Good form worth reinforcing
    pub fn is_good_form(&self, good_form_threshold: u8) -> bool {
        self.assessable && self.issues.is_empty() && self.form_score >= good_form_threshold
    }
}
