//! Analysis configuration

use serde::{Deserialize, Serialize};

use forma_core::{FormaError, FormaResult, DEFAULT_VISIBILITY_THRESHOLD};

/// How rules with occluded joints count when matching a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccludedRulePolicy {
    /// Left out of the match ratio entirely
    Exclude,
    /// Kept in the denominator as an unmatched rule
    CountAsMiss,
}

/// Plane in which joint angles are measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnglePlane {
    /// Full 3D vectors
    Spatial,
    /// Image plane only (x, y); ignores the model's depth estimate
    Image,
}

/// Analysis configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Minimum landmark visibility for a joint to be used
    pub visibility_threshold: f32,
    /// A stage is accepted only when its match ratio exceeds this
    pub match_acceptance: f32,
    /// Points deducted per failed rule
    pub rule_penalty: u8,
    /// Scores at or above this with no issues count as good form
    pub good_form_threshold: u8,
    pub occluded_rules: OccludedRulePolicy,
    pub angle_plane: AnglePlane,
    /// Consecutive frames a new stage must be seen before transitioning
    pub stage_confirm_frames: u32,
    /// Consecutive frames another exercise must be accepted before auto-detect
    /// leaves a still measurable one
    pub exercise_confirm_frames: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            visibility_threshold: DEFAULT_VISIBILITY_THRESHOLD,
            match_acceptance: 0.5,
            rule_penalty: 25,
            good_form_threshold: 80,
            occluded_rules: OccludedRulePolicy::Exclude,
            angle_plane: AnglePlane::Spatial,
            stage_confirm_frames: 1,
            exercise_confirm_frames: 15,
        }
    }
}

impl AnalysisConfig {
    /// Gentler scoring for noisy capture setups (webcams, poor light)
    pub fn lenient() -> Self {
        AnalysisConfig {
            visibility_threshold: 0.3,
            rule_penalty: 20,
            angle_plane: AnglePlane::Image,
            stage_confirm_frames: 3,
            exercise_confirm_frames: 30,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> FormaResult<()> {
        if !(0.0..=1.0).contains(&self.visibility_threshold) {
            return Err(FormaError::InvalidConfig(format!(
                "visibility_threshold {} outside [0, 1]",
                self.visibility_threshold
            )));
        }
        if !(0.0..1.0).contains(&self.match_acceptance) {
            return Err(FormaError::InvalidConfig(format!(
                "match_acceptance {} outside [0, 1)",
                self.match_acceptance
            )));
        }
        if self.rule_penalty == 0 || self.rule_penalty > 100 {
            return Err(FormaError::InvalidConfig(format!(
                "rule_penalty {} outside [1, 100]",
                self.rule_penalty
            )));
        }
        if self.good_form_threshold > 100 {
            return Err(FormaError::InvalidConfig(format!(
                "good_form_threshold {} above 100",
                self.good_form_threshold
            )));
        }
        if self.stage_confirm_frames == 0 {
            return Err(FormaError::InvalidConfig(
                "stage_confirm_frames must be at least 1".to_string(),
            ));
        }
        if self.exercise_confirm_frames == 0 {
            return Err(FormaError::InvalidConfig(
                "exercise_confirm_frames must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.rule_penalty, 25);
        assert!(AnalysisConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_values() {
        let config = AnalysisConfig {
            match_acceptance: 1.0,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());

        let config = AnalysisConfig {
            stage_confirm_frames: 0,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());

        let config = AnalysisConfig {
            exercise_confirm_frames: 0,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{"rule_penalty": 20, "occluded_rules": "count_as_miss"}"#).unwrap();
        assert_eq!(config.rule_penalty, 20);
        assert_eq!(config.occluded_rules, OccludedRulePolicy::CountAsMiss);
        assert_eq!(config.match_acceptance, 0.5);
    }
}
