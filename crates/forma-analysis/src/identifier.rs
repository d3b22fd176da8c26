//! Exercise identifier - matches a frame against every catalog stage
//!
//! A stage's match ratio is the share of its checkable rules whose measured
//! angle lies in range. The best (exercise, stage) pair wins; it is accepted
//! only when the ratio strictly exceeds the configured acceptance. Ties go to
//! the pair registered first.

use std::sync::Arc;

use forma_catalog::{ExerciseCatalog, ExerciseDefinition, Stage};
use forma_core::{FormaResult, LandmarkFrame};

use crate::{measure_rule, AnalysisConfig, AnglePlane, OccludedRulePolicy};

/// How well one stage fits one frame
#[derive(Debug, Clone, PartialEq)]
pub struct StageMatch {
    pub exercise: String,
    pub stage: String,
    /// Rules in range
    pub matched: usize,
    /// Denominator of the ratio (depends on the occluded-rule policy)
    pub checkable: usize,
    pub ratio: f32,
}

/// Identification outcome
#[derive(Debug, Clone, PartialEq)]
pub enum Identification {
    /// Caller named the exercise; rule fit was not consulted
    Override { exercise: String },
    /// Best pair exceeded the acceptance ratio
    Matched(StageMatch),
    /// Nothing accepted; carries the best rejected candidate
    NoMatch { best: Option<StageMatch> },
}

impl Identification {
    pub fn exercise(&self) -> Option<&str> {
        match self {
            Identification::Override { exercise } => Some(exercise),
            Identification::Matched(m) => Some(&m.exercise),
            Identification::NoMatch { .. } => None,
        }
    }

    pub fn stage(&self) -> Option<&str> {
        match self {
            Identification::Matched(m) => Some(&m.stage),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExerciseIdentifier {
    catalog: Arc<ExerciseCatalog>,
    visibility_threshold: f32,
    acceptance: f32,
    policy: OccludedRulePolicy,
    plane: AnglePlane,
}

impl ExerciseIdentifier {
    pub fn new(catalog: Arc<ExerciseCatalog>, config: &AnalysisConfig) -> Self {
        ExerciseIdentifier {
            catalog,
            visibility_threshold: config.visibility_threshold,
            acceptance: config.match_acceptance,
            policy: config.occluded_rules,
            plane: config.angle_plane,
        }
    }

    pub fn catalog(&self) -> &Arc<ExerciseCatalog> {
        &self.catalog
    }

    /// Identify the exercise shown in a frame.
    ///
    /// An override is returned as-is once it resolves in the catalog; an
    /// unknown override fails with `NotFound`.
    pub fn identify(
        &self,
        frame: &LandmarkFrame,
        override_name: Option<&str>,
    ) -> FormaResult<Identification> {
        if let Some(name) = override_name {
            let definition = self.catalog.lookup(name)?;
            return Ok(Identification::Override {
                exercise: definition.name.clone(),
            });
        }
        Ok(self.detect(frame))
    }

    /// Identification from rule fit alone
    pub fn detect(&self, frame: &LandmarkFrame) -> Identification {
        let mut best: Option<StageMatch> = None;
        for exercise in self.catalog.iter() {
            if let Some(candidate) = self.best_stage(frame, exercise) {
                if best.as_ref().map_or(true, |b| candidate.ratio > b.ratio) {
                    best = Some(candidate);
                }
            }
        }

        match best {
            Some(m) if self.accepts(&m) => Identification::Matched(m),
            best => Identification::NoMatch { best },
        }
    }

    /// Best-fitting stage of one exercise, accepted or not.
    ///
    /// `None` when no stage has a checkable rule.
    pub fn best_stage(&self, frame: &LandmarkFrame, exercise: &ExerciseDefinition) -> Option<StageMatch> {
        let mut best: Option<StageMatch> = None;
        for stage in &exercise.stages {
            if let Some(candidate) = self.stage_match(frame, exercise, stage) {
                if best.as_ref().map_or(true, |b| candidate.ratio > b.ratio) {
                    best = Some(candidate);
                }
            }
        }
        best
    }

    /// Match ratio for a single stage; `None` if none of its rules is checkable
    pub fn stage_match(
        &self,
        frame: &LandmarkFrame,
        exercise: &ExerciseDefinition,
        stage: &Stage,
    ) -> Option<StageMatch> {
        let mut visible = 0;
        let mut matched = 0;
        for rule in &stage.rules {
            if let Some(angle) = measure_rule(frame, rule, self.visibility_threshold, self.plane) {
                visible += 1;
                if rule.angle.contains(angle) {
                    matched += 1;
                }
            }
        }

        if visible == 0 {
            return None;
        }

        let checkable = match self.policy {
            OccludedRulePolicy::Exclude => visible,
            OccludedRulePolicy::CountAsMiss => stage.rules.len(),
        };

        Some(StageMatch {
            exercise: exercise.name.clone(),
            stage: stage.name.clone(),
            matched,
            checkable,
            ratio: matched as f32 / checkable as f32,
        })
    }

    /// Ratio strictly above the acceptance threshold
    #[inline]
    pub fn accepts(&self, m: &StageMatch) -> bool {
        m.ratio > self.acceptance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{occlude, pose, squat_down, standing_up};
    use forma_catalog::{builtin, AngleRule};
    use forma_core::{FormaError, FrameTime, Joint, Landmark};

    fn identifier(config: &AnalysisConfig) -> ExerciseIdentifier {
        ExerciseIdentifier::new(Arc::new(ExerciseCatalog::builtin().unwrap()), config)
    }

    #[test]
    fn test_override_wins_without_fit() {
        // Joints piled on one point: nothing measures
        let lm = Landmark::new(0.5, 0.5, 0.0);
        let frame = LandmarkFrame::from_landmarks(FrameTime::ZERO, &[lm; Joint::COUNT]);
        let id = identifier(&AnalysisConfig::default());

        let result = id.identify(&frame, Some("SQUAT")).unwrap();
        assert_eq!(result.exercise(), Some("SQUAT"));
        assert!(matches!(result, Identification::Override { .. }));

        let result = id.identify(&LandmarkFrame::new(FrameTime::ZERO), Some("Bicep Curl")).unwrap();
        assert_eq!(result.exercise(), Some("BICEP_CURL"));
    }

    #[test]
    fn test_unknown_override() {
        let id = identifier(&AnalysisConfig::default());
        let result = id.identify(&squat_down(), Some("PLANK"));
        assert!(matches!(result, Err(FormaError::NotFound(_))));
    }

    #[test]
    fn test_squat_bottom_identified() {
        let id = identifier(&AnalysisConfig::default());
        match id.identify(&squat_down(), None).unwrap() {
            Identification::Matched(m) => {
                assert_eq!(m.exercise, builtin::SQUAT);
                assert_eq!(m.stage, "down");
                assert_eq!(m.ratio, 1.0);
            }
            other => panic!("expected match, got {:?}", other),
        }
    }

    #[test]
    fn test_tie_goes_to_first_registered() {
        // Standing tall fits SQUAT/up and STANDING/up equally
        let id = identifier(&AnalysisConfig::default());
        let result = id.identify(&standing_up(), None).unwrap();
        assert_eq!(result.exercise(), Some(builtin::SQUAT));
        assert_eq!(result.stage(), Some("up"));
    }

    #[test]
    fn test_half_match_is_rejected() {
        // Knee fits SQUAT/down, back fits nothing in SQUAT; arm fits nothing either
        let frame = pose(95.0, 150.0, 100.0, 90.0);
        let id = identifier(&AnalysisConfig::default());
        match id.identify(&frame, None).unwrap() {
            Identification::NoMatch { best: Some(best) } => {
                assert_eq!(best.ratio, 0.5);
                assert_eq!(best.exercise, builtin::SQUAT);
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_nothing_visible() {
        let id = identifier(&AnalysisConfig::default());
        let result = id.identify(&LandmarkFrame::new(FrameTime::ZERO), None).unwrap();
        assert_eq!(result, Identification::NoMatch { best: None });
    }

    #[test]
    fn test_occluded_rule_policy() {
        let exercise = ExerciseDefinition::new("SQUAT").stage(
            Stage::new("down")
                .rule(AngleRule::new("knee", [Joint::LeftHip, Joint::LeftKnee, Joint::LeftAnkle], 70.0, 110.0, "k"))
                .rule(AngleRule::new("back", [Joint::LeftShoulder, Joint::LeftHip, Joint::LeftKnee], 80.0, 120.0, "b")),
        );
        let frame = occlude(squat_down(), Joint::LeftAnkle);

        let exclude = identifier(&AnalysisConfig::default());
        let m = exclude.best_stage(&frame, &exercise).unwrap();
        assert_eq!((m.matched, m.checkable), (1, 1));
        assert!(exclude.accepts(&m));

        let miss = identifier(&AnalysisConfig {
            occluded_rules: OccludedRulePolicy::CountAsMiss,
            ..AnalysisConfig::default()
        });
        let m = miss.best_stage(&frame, &exercise).unwrap();
        assert_eq!((m.matched, m.checkable), (1, 2));
        assert!(!miss.accepts(&m));
    }

    #[test]
    fn test_best_stage_of_one_exercise() {
        let id = identifier(&AnalysisConfig::default());
        let catalog = ExerciseCatalog::builtin().unwrap();
        let curl = catalog.lookup(builtin::BICEP_CURL).unwrap();

        let m = id.best_stage(&pose(178.0, 178.0, 40.0, 10.0), curl).unwrap();
        assert_eq!(m.stage, "up");
        assert_eq!(m.ratio, 1.0);

        assert!(id.best_stage(&LandmarkFrame::new(FrameTime::ZERO), curl).is_none());
    }
}
