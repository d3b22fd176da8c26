//! Feedback orchestration configuration

use std::time::Duration;

use forma_core::{FormaError, FormaResult};

use crate::AudioFormat;

/// Shown when the generator fails or times out
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FallbackMessages {
    pub correction: String,
    pub positive: String,
}

impl Default for FallbackMessages {
    fn default() -> Self {
        FallbackMessages {
            correction: "Keep working on your form.".to_string(),
            positive: "Excellent form! Keep it up.".to_string(),
        }
    }
}

/// Feedback orchestrator configuration
#[derive(Clone, Debug, PartialEq)]
pub struct FeedbackConfig {
    /// Minimum gap after a completed text request before the next one
    pub cooldown: Duration,
    /// Bound on each collaborator call
    pub request_timeout: Duration,
    /// Minimum gap between automatic speech requests
    pub speech_cooldown: Duration,
    /// Scores at or above this with no issues earn positive reinforcement
    pub good_form_threshold: u8,
    pub positive_reinforcement: bool,
    pub speech_enabled: bool,
    pub fallback: FallbackMessages,
    pub audio: AudioFormat,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        FeedbackConfig {
            cooldown: Duration::from_secs(2),
            request_timeout: Duration::from_secs(10),
            speech_cooldown: Duration::from_secs(5),
            good_form_threshold: 80,
            positive_reinforcement: true,
            speech_enabled: true,
            fallback: FallbackMessages::default(),
            audio: AudioFormat::default(),
        }
    }
}

impl FeedbackConfig {
    /// Quicker turnaround for fast-paced sets
    pub fn responsive() -> Self {
        FeedbackConfig {
            cooldown: Duration::from_millis(1500),
            speech_cooldown: Duration::from_secs(4),
            ..Self::default()
        }
    }

    /// Fewer interruptions; text only
    pub fn quiet() -> Self {
        FeedbackConfig {
            cooldown: Duration::from_secs(3),
            speech_enabled: false,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> FormaResult<()> {
        if self.request_timeout.is_zero() {
            return Err(FormaError::InvalidConfig(
                "request_timeout must be non-zero".to_string(),
            ));
        }
        if self.good_form_threshold > 100 {
            return Err(FormaError::InvalidConfig(format!(
                "good_form_threshold {} above 100",
                self.good_form_threshold
            )));
        }
        if self.fallback.correction.trim().is_empty() || self.fallback.positive.trim().is_empty() {
            return Err(FormaError::InvalidConfig(
                "fallback messages must not be empty".to_string(),
            ));
        }
        self.audio.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FeedbackConfig::default();
        assert_eq!(config.cooldown, Duration::from_secs(2));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.speech_cooldown, Duration::from_secs(5));
        assert_eq!(config.fallback.correction, "Keep working on your form.");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_validate() {
        assert!(FeedbackConfig::responsive().validate().is_ok());
        let quiet = FeedbackConfig::quiet();
        assert!(quiet.validate().is_ok());
        assert!(!quiet.speech_enabled);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = FeedbackConfig {
            request_timeout: Duration::ZERO,
            ..FeedbackConfig::default()
        };
        assert!(matches!(config.validate(), Err(FormaError::InvalidConfig(_))));
    }
}
