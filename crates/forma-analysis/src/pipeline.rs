//! Analysis pipeline - the single per-frame writer
//!
//! Owns the identifier, the scorer and the rep counter, and turns each frame
//! into an `AnalysisResult`. Exercise selection is either explicit (host
//! named it) or automatic, where the current exercise is kept for as long as
//! one of its stages is still accepted.

use std::sync::Arc;

use forma_catalog::{ExerciseCatalog, ExerciseDefinition};
use forma_core::{FormaResult, LandmarkFrame};

use crate::{
    AnalysisConfig, AnalysisResult, ExerciseIdentifier, FormScorer, Identification, RepCounter,
    RepCounterState, StageMatch, Transition,
};

/// How the active exercise is chosen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Identified from the frames
    Auto,
    /// Named by the host (catalog key)
    Explicit(String),
}

/// Everything the pipeline learned from one frame
#[derive(Debug, Clone)]
pub struct FrameAnalysis {
    /// `None` when no exercise is active
    pub result: Option<AnalysisResult>,
    /// Set when identification ran for this frame
    pub identification: Option<Identification>,
    /// Best stage of the active exercise
    pub stage_match: Option<StageMatch>,
    pub transition: Transition,
    /// Every rule of the active exercise was uncheckable
    pub occluded: bool,
}

impl FrameAnalysis {
    fn idle(identification: Option<Identification>) -> Self {
        FrameAnalysis {
            result: None,
            identification,
            stage_match: None,
            transition: Transition::Held,
            occluded: false,
        }
    }
}

pub struct AnalysisPipeline {
    config: AnalysisConfig,
    identifier: ExerciseIdentifier,
    scorer: FormScorer,
    counter: RepCounter,
    selection: Selection,
    /// Exercise waiting to replace the current one in auto mode
    challenger: Option<String>,
    challenger_frames: u32,
    frames: u64,
}

impl AnalysisPipeline {
    pub fn new(catalog: Arc<ExerciseCatalog>, config: AnalysisConfig) -> FormaResult<Self> {
        config.validate()?;
        Ok(AnalysisPipeline {
            identifier: ExerciseIdentifier::new(catalog, &config),
            scorer: FormScorer::new(&config),
            counter: RepCounter::new(config.stage_confirm_frames),
            selection: Selection::Auto,
            challenger: None,
            challenger_frames: 0,
            frames: 0,
            config,
        })
    }

    /// Select an exercise by catalog key or display name; `None` returns to auto-detect.
    ///
    /// An unknown name fails with `NotFound` and leaves no active exercise.
    pub fn select_exercise(&mut self, name: Option<&str>) -> FormaResult<()> {
        self.challenger = None;
        let Some(name) = name else {
            tracing::info!("exercise selection: auto-detect");
            self.selection = Selection::Auto;
            return Ok(());
        };

        let catalog = Arc::clone(self.identifier.catalog());
        match catalog.lookup(name) {
            Ok(definition) => {
                let reset = self.counter.select(Some(definition));
                tracing::info!(exercise = %definition.name, reset, "exercise selected");
                self.selection = Selection::Explicit(definition.name.clone());
                Ok(())
            }
            Err(e) => {
                tracing::warn!(name, "unknown exercise selected");
                self.selection = Selection::Auto;
                self.counter.select(None);
                Err(e)
            }
        }
    }

    /// Run one frame through identification, rep counting and scoring
    pub fn process(&mut self, frame: &LandmarkFrame) -> FrameAnalysis {
        self.frames += 1;
        let catalog = Arc::clone(self.identifier.catalog());

        let (exercise, stage_match, identification) = match self.selection.clone() {
            Selection::Explicit(name) => {
                let exercise = catalog.get(&name);
                let stage_match = exercise.and_then(|e| self.identifier.best_stage(frame, e));
                (exercise, stage_match, Some(Identification::Override { exercise: name }))
            }
            Selection::Auto => self.auto_select(&catalog, frame),
        };

        let Some(exercise) = exercise else {
            return FrameAnalysis::idle(identification);
        };

        let accepted = stage_match
            .as_ref()
            .filter(|m| self.identifier.accepts(m))
            .map(|m| m.stage.as_str());
        let transition = self.counter.observe(accepted, frame.timestamp);

        match &transition {
            Transition::RepCompleted { count, .. } => {
                tracing::info!(exercise = %exercise.name, reps = count, "rep completed");
            }
            Transition::Entered { to, .. } => {
                tracing::debug!(exercise = %exercise.name, stage = %to, "stage entered");
            }
            _ => {}
        }

        let rep_count = self.counter.rep_count();
        let scored = stage_match.as_ref().and_then(|m| {
            let stage = exercise.get_stage(&m.stage)?;
            let score = self.scorer.score_stage(frame, stage);
            Some(AnalysisResult::from_score(
                &exercise.name,
                Some(&stage.name),
                &score,
                self.config.good_form_threshold,
                !self.identifier.accepts(m),
                rep_count,
            ))
        });
        let occluded = scored.is_none();
        let result = scored.unwrap_or_else(|| AnalysisResult::cannot_assess(&exercise.name, rep_count));

        tracing::debug!(
            frame = self.frames,
            exercise = %result.exercise_name,
            stage = ?result.stage_name,
            score = result.form_score,
            issues = result.issues.len(),
            provisional = result.provisional,
            "frame analyzed"
        );

        FrameAnalysis {
            result: Some(result),
            identification,
            stage_match,
            transition,
            occluded,
        }
    }

    /// Keep the current exercise while it has an accepted stage, else re-identify
    fn auto_select<'c>(
        &mut self,
        catalog: &'c ExerciseCatalog,
        frame: &LandmarkFrame,
    ) -> (
        Option<&'c ExerciseDefinition>,
        Option<StageMatch>,
        Option<Identification>,
    ) {
        let current = self.counter.exercise().and_then(|name| catalog.get(name));
        let held = current.and_then(|e| self.identifier.best_stage(frame, e));
        if let (Some(exercise), Some(m)) = (current, held.as_ref()) {
            if self.identifier.accepts(m) {
                self.challenger = None;
                return (Some(exercise), held, None);
            }
        }

        let identification = self.identifier.detect(frame);
        let Identification::Matched(m) = &identification else {
            self.challenger = None;
            return (current, held, Some(identification));
        };

        // Between stages the current exercise is still measurable
        if let Some(exercise) = current {
            if held.is_some() && m.exercise != exercise.name && !self.challenge(&m.exercise) {
                return (Some(exercise), held, Some(identification));
            }
        }
        self.challenger = None;

        let exercise = catalog.get(&m.exercise);
        if self.counter.select(exercise) {
            tracing::info!(
                exercise = %m.exercise,
                stage = %m.stage,
                ratio = m.ratio,
                "exercise identified"
            );
        }
        (exercise, Some(m.clone()), Some(identification))
    }

    /// Count one more frame for `name`; true once it has held long enough to switch
    fn challenge(&mut self, name: &str) -> bool {
        if self.challenger.as_deref() == Some(name) {
            self.challenger_frames += 1;
        } else {
            self.challenger = Some(name.to_string());
            self.challenger_frames = 1;
        }
        self.challenger_frames >= self.config.exercise_confirm_frames
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn active_exercise(&self) -> Option<&str> {
        self.counter.exercise()
    }

    pub fn rep_state(&self) -> &RepCounterState {
        self.counter.state()
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<ExerciseCatalog> {
        self.identifier.catalog()
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{occlude, pose, pose_at, squat_down, standing_up};
    use crate::{CANNOT_ASSESS_FEEDBACK, POSITIVE_FEEDBACK};
    use forma_catalog::builtin;
    use forma_core::{FormaError, FrameTime, Joint, Landmark};

    fn pipeline() -> AnalysisPipeline {
        AnalysisPipeline::new(
            Arc::new(ExerciseCatalog::builtin().unwrap()),
            AnalysisConfig::default(),
        )
        .unwrap()
    }

    fn squat_pipeline() -> AnalysisPipeline {
        let mut p = pipeline();
        p.select_exercise(Some(builtin::SQUAT)).unwrap();
        p
    }

    fn result(analysis: FrameAnalysis) -> AnalysisResult {
        analysis.result.expect("result")
    }

    #[test]
    fn test_good_squat_bottom() {
        let r = result(squat_pipeline().process(&squat_down()));
        assert_eq!(r.form_score, 100);
        assert!(r.issues.is_empty());
        assert_eq!(r.feedback, POSITIVE_FEEDBACK);
        assert_eq!(r.stage_name.as_deref(), Some("down"));
        assert!(!r.provisional);
        assert!(!r.vocalization_needed);
    }

    #[test]
    fn test_shallow_squat() {
        let r = result(squat_pipeline().process(&pose(140.0, 100.0, 160.0, 15.0)));
        assert_eq!(r.form_score, 75);
        assert_eq!(r.issues, vec!["You're not going low enough. Try to break parallel.".to_string()]);
        assert_eq!(r.feedback, r.issues[0]);
        assert!(r.provisional);
        assert!(r.vocalization_needed);
    }

    #[test]
    fn test_two_faults() {
        let r = result(squat_pipeline().process(&pose(140.0, 150.0, 160.0, 15.0)));
        assert_eq!(r.form_score, 50);
        assert_eq!(
            r.issues,
            vec![
                "You're not going low enough. Try to break parallel.".to_string(),
                "Keep your chest up and back straight.".to_string(),
            ]
        );
    }

    #[test]
    fn test_explicit_selection_survives_garbage_frame() {
        let lm = Landmark::new(0.5, 0.5, 0.0);
        let frame = LandmarkFrame::from_landmarks(FrameTime::ZERO, &[lm; Joint::COUNT]);
        let analysis = squat_pipeline().process(&frame);

        assert_eq!(analysis.identification.as_ref().and_then(|i| i.exercise()), Some("SQUAT"));
        let r = analysis.result.unwrap();
        assert_eq!(r.exercise_name, "SQUAT");
        assert!(r.issues.len() <= 2);
    }

    #[test]
    fn test_fully_occluded_is_flagged() {
        let analysis = squat_pipeline().process(&LandmarkFrame::new(FrameTime::ZERO));
        assert!(analysis.occluded);
        let r = analysis.result.unwrap();
        assert!(!r.assessable);
        assert_eq!(r.feedback, CANNOT_ASSESS_FEEDBACK);
    }

    #[test]
    fn test_auto_detect_counts_reps() {
        let mut p = pipeline();
        let frames = [standing_up(), squat_down(), standing_up(), squat_down(), standing_up()];
        let mut last = None;
        for frame in &frames {
            last = p.process(frame).result;
        }
        let r = last.unwrap();
        assert_eq!(r.exercise_name, builtin::SQUAT);
        assert_eq!(r.rep_count, 2);
        assert_eq!(p.active_exercise(), Some(builtin::SQUAT));
    }

    #[test]
    fn test_auto_detect_switch_resets_reps() {
        let mut p = pipeline();
        for frame in [standing_up(), squat_down(), standing_up()] {
            p.process(&frame);
        }
        assert_eq!(p.rep_state().rep_count, 1);

        // Legs hidden: only the curl stages can be checked
        let curl_top = occlude(pose(178.0, 178.0, 40.0, 10.0), Joint::LeftKnee);
        let r = result(p.process(&curl_top));
        assert_eq!(r.exercise_name, builtin::BICEP_CURL);
        assert_eq!(r.rep_count, 0);
    }

    #[test]
    fn test_auto_detect_is_sticky() {
        let mut p = pipeline();
        p.process(&occlude(pose(178.0, 178.0, 160.0, 10.0), Joint::LeftKnee));
        assert_eq!(p.active_exercise(), Some(builtin::BICEP_CURL));

        // Fully visible, this frame also fits SQUAT/up, which is registered first
        let analysis = p.process(&pose(178.0, 178.0, 40.0, 10.0));
        assert!(analysis.identification.is_none());
        assert_eq!(result(analysis).exercise_name, builtin::BICEP_CURL);
        assert_eq!(p.rep_state().rep_count, 1);
    }

    #[test]
    fn test_auto_detect_rides_through_mid_squat() {
        let mut p = pipeline();
        // Halfway down: no squat stage fits, but the hanging arms fit BICEP_CURL/down
        let halfway = || pose(130.0, 133.0, 175.0, 10.0);
        let mut frames = vec![standing_up()];
        frames.extend(std::iter::repeat_with(halfway).take(4));
        frames.push(squat_down());
        frames.extend(std::iter::repeat_with(halfway).take(4));
        frames.push(standing_up());

        for frame in &frames {
            let r = result(p.process(frame));
            assert_eq!(r.exercise_name, builtin::SQUAT);
        }
        assert_eq!(p.rep_state().rep_count, 1);
    }

    #[test]
    fn test_auto_detect_switches_after_confirmation() {
        let config = AnalysisConfig {
            exercise_confirm_frames: 3,
            ..AnalysisConfig::default()
        };
        let mut p = AnalysisPipeline::new(Arc::new(ExerciseCatalog::builtin().unwrap()), config).unwrap();
        for frame in [standing_up(), squat_down(), standing_up()] {
            p.process(&frame);
        }

        // Knees bent, arm curled: only BICEP_CURL/up is accepted
        let curling = pose(130.0, 133.0, 40.0, 10.0);
        for _ in 0..2 {
            assert_eq!(result(p.process(&curling)).exercise_name, builtin::SQUAT);
            assert_eq!(p.rep_state().rep_count, 1);
        }

        // A frame without a match breaks the run
        p.process(&pose(130.0, 133.0, 100.0, 90.0));
        for _ in 0..2 {
            assert_eq!(result(p.process(&curling)).exercise_name, builtin::SQUAT);
        }

        let r = result(p.process(&curling));
        assert_eq!(r.exercise_name, builtin::BICEP_CURL);
        assert_eq!(r.rep_count, 0);
    }

    #[test]
    fn test_auto_detect_without_match_yields_nothing() {
        let analysis = pipeline().process(&pose(95.0, 150.0, 100.0, 90.0));
        assert!(analysis.result.is_none());
        assert!(matches!(analysis.identification, Some(Identification::NoMatch { best: Some(_) })));
    }

    #[test]
    fn test_unknown_selection() {
        let mut p = squat_pipeline();
        let err = p.select_exercise(Some("PLANK")).unwrap_err();
        assert!(matches!(err, FormaError::NotFound(_)));
        assert_eq!(p.active_exercise(), None);
        assert_eq!(p.selection(), &Selection::Auto);
        assert!(p.process(&LandmarkFrame::new(FrameTime::ZERO)).result.is_none());
    }

    #[test]
    fn test_display_name_selection() {
        let mut p = pipeline();
        p.select_exercise(Some("Bicep Curl")).unwrap();
        assert_eq!(p.selection(), &Selection::Explicit("BICEP_CURL".into()));
    }

    #[test]
    fn test_reselect_keeps_reps() {
        let mut p = squat_pipeline();
        for (i, frame) in [squat_down(), standing_up()].iter().enumerate() {
            let mut frame = frame.clone();
            frame.timestamp = FrameTime::from_millis(i as u64 * 100);
            p.process(&frame);
        }
        p.select_exercise(Some("Squat")).unwrap();
        assert_eq!(p.rep_state().rep_count, 1);

        p.select_exercise(Some(builtin::STANDING)).unwrap();
        assert_eq!(p.rep_state().rep_count, 0);
    }

    #[test]
    fn test_rep_count_never_drops_within_selection() {
        let mut p = squat_pipeline();
        let mut last = 0;
        for i in 0..40u64 {
            let knee = if (i / 3) % 2 == 0 { 95.0 } else { 175.0 };
            let back = if (i / 3) % 2 == 0 { 100.0 } else { 175.0 };
            let frame = if i % 7 == 0 {
                LandmarkFrame::new(FrameTime::from_millis(i * 33))
            } else {
                pose_at(FrameTime::from_millis(i * 33), knee, back, 160.0, 15.0)
            };
            let r = result(p.process(&frame));
            assert!(r.rep_count >= last);
            assert!(r.form_score <= 100);
            last = r.rep_count;
        }
        assert!(last > 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = AnalysisConfig {
            rule_penalty: 0,
            ..AnalysisConfig::default()
        };
        let catalog = Arc::new(ExerciseCatalog::builtin().unwrap());
        assert!(AnalysisPipeline::new(catalog, config).is_err());
    }
}
