//! Form scorer - penalty scoring of one stage's rules

use forma_catalog::{ExerciseDefinition, Stage};
use forma_core::{FormaResult, LandmarkFrame};

use crate::{measure_rule, AnalysisConfig, AnglePlane};

/// Outcome of scoring one stage against one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageScore {
    /// 0..=100
    pub form_score: u8,
    /// Feedback of each failed rule, in declaration order
    pub issues: Vec<String>,
    /// Rules whose joints were all visible
    pub checked: usize,
    /// Rules skipped for missing or low-visibility joints
    pub skipped: usize,
}

impl StageScore {
    pub(crate) fn unassessed(skipped: usize) -> Self {
        StageScore {
            form_score: 100,
            issues: Vec::new(),
            checked: 0,
            skipped,
        }
    }

    /// False when no rule could be checked
    pub fn assessable(&self) -> bool {
        self.checked > 0
    }
}

/// Scores a frame against a stage's angle rules
#[derive(Debug, Clone)]
pub struct FormScorer {
    visibility_threshold: f32,
    rule_penalty: u8,
    plane: AnglePlane,
}

impl FormScorer {
    pub fn new(config: &AnalysisConfig) -> Self {
        FormScorer {
            visibility_threshold: config.visibility_threshold,
            rule_penalty: config.rule_penalty,
            plane: config.angle_plane,
        }
    }

    /// Score the named stage of an exercise
    pub fn score(
        &self,
        frame: &LandmarkFrame,
        exercise: &ExerciseDefinition,
        stage: &str,
    ) -> FormaResult<StageScore> {
        let stage = exercise.stage_named(stage)?;
        Ok(self.score_stage(frame, stage))
    }

    pub fn score_stage(&self, frame: &LandmarkFrame, stage: &Stage) -> StageScore {
        let mut score = StageScore::unassessed(0);

        for rule in &stage.rules {
            let Some(angle) = measure_rule(frame, rule, self.visibility_threshold, self.plane) else {
                score.skipped += 1;
                continue;
            };
            score.checked += 1;

            if !rule.angle.contains(angle) {
                tracing::trace!(rule = %rule.name, angle, min = rule.angle.min, max = rule.angle.max, "rule failed");
                score.issues.push(rule.feedback.clone());
                score.form_score = score.form_score.saturating_sub(self.rule_penalty);
            }
        }

        score
    }
}
