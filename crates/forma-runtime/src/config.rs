//! Coach configuration
//!
//! Layered: defaults, then an optional JSON file, then `FORMA_*` environment
//! variables. Durations are human-readable (`"2s"`, `"1500ms"`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use forma_analysis::AnalysisConfig;
use forma_catalog::ExerciseCatalog;
use forma_core::{FormaError, FormaResult};
use forma_feedback::FeedbackConfig;

use crate::{LogConfig, LogFormat};

pub const ENV_CATALOG: &str = "FORMA_CATALOG";
pub const ENV_EXERCISE: &str = "FORMA_EXERCISE";
pub const ENV_COOLDOWN: &str = "FORMA_COOLDOWN";
pub const ENV_REQUEST_TIMEOUT: &str = "FORMA_REQUEST_TIMEOUT";
pub const ENV_SPEECH_COOLDOWN: &str = "FORMA_SPEECH_COOLDOWN";
pub const ENV_SPEECH: &str = "FORMA_SPEECH";
pub const ENV_LOG_FORMAT: &str = "FORMA_LOG_FORMAT";
pub const ENV_LOG: &str = "FORMA_LOG";

/// Complete coach configuration
#[derive(Clone, Debug, PartialEq)]
pub struct CoachConfig {
    pub analysis: AnalysisConfig,
    pub feedback: FeedbackConfig,
    /// External catalog; the built-in catalog when `None`
    pub catalog_path: Option<PathBuf>,
    /// Initial explicit selection; auto-detect when `None`
    pub exercise: Option<String>,
    /// Frames queued between ticks before new ones are dropped
    pub max_frame_buffer: usize,
    /// Host events queued before new ones are dropped
    pub max_event_buffer: usize,
    /// Idle tick period of a spawned session
    pub tick_interval: Duration,
    pub log: LogConfig,
}

impl Default for CoachConfig {
    fn default() -> Self {
        CoachConfig {
            analysis: AnalysisConfig::default(),
            feedback: FeedbackConfig::default(),
            catalog_path: None,
            exercise: None,
            max_frame_buffer: 64,
            max_event_buffer: 256,
            tick_interval: Duration::from_millis(50),
            log: LogConfig::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    analysis: Option<AnalysisConfig>,
    feedback: FeedbackSection,
    catalog: Option<PathBuf>,
    exercise: Option<String>,
    max_frame_buffer: Option<usize>,
    max_event_buffer: Option<usize>,
    tick_interval: Option<String>,
    log: LogSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FeedbackSection {
    cooldown: Option<String>,
    request_timeout: Option<String>,
    speech_cooldown: Option<String>,
    positive_reinforcement: Option<bool>,
    speech: Option<bool>,
    fallback_correction: Option<String>,
    fallback_positive: Option<String>,
    sample_rate: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct LogSection {
    format: Option<LogFormat>,
    filter: Option<String>,
}

impl CoachConfig {
    /// Shorter cooldowns for fast-paced sets
    pub fn responsive() -> Self {
        CoachConfig {
            feedback: FeedbackConfig::responsive(),
            ..Self::default()
        }
    }

    /// Text feedback only, longer cooldown
    pub fn quiet() -> Self {
        CoachConfig {
            feedback: FeedbackConfig::quiet(),
            ..Self::default()
        }
    }

    /// Defaults, then `path` if given, then the environment; validated
    pub fn load(path: Option<&Path>) -> FormaResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_path(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> FormaResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Parse the JSON form over the defaults
    pub fn from_json(json: &str) -> FormaResult<Self> {
        let file: ConfigFile =
            serde_json::from_str(json).map_err(|e| FormaError::InvalidConfig(e.to_string()))?;

        let mut config = CoachConfig::default();
        if let Some(analysis) = file.analysis {
            config.analysis = analysis;
        }
        config.catalog_path = file.catalog;
        config.exercise = file.exercise;
        if let Some(n) = file.max_frame_buffer {
            config.max_frame_buffer = n;
        }
        if let Some(n) = file.max_event_buffer {
            config.max_event_buffer = n;
        }
        if let Some(s) = file.tick_interval {
            config.tick_interval = parse_duration("tick_interval", &s)?;
        }

        let section = file.feedback;
        let feedback = &mut config.feedback;
        if let Some(s) = section.cooldown {
            feedback.cooldown = parse_duration("feedback.cooldown", &s)?;
        }
        if let Some(s) = section.request_timeout {
            feedback.request_timeout = parse_duration("feedback.request_timeout", &s)?;
        }
        if let Some(s) = section.speech_cooldown {
            feedback.speech_cooldown = parse_duration("feedback.speech_cooldown", &s)?;
        }
        if let Some(b) = section.positive_reinforcement {
            feedback.positive_reinforcement = b;
        }
        if let Some(b) = section.speech {
            feedback.speech_enabled = b;
        }
        if let Some(s) = section.fallback_correction {
            feedback.fallback.correction = s;
        }
        if let Some(s) = section.fallback_positive {
            feedback.fallback.positive = s;
        }
        if let Some(rate) = section.sample_rate {
            feedback.audio.sample_rate = rate;
        }

        if let Some(format) = file.log.format {
            config.log.format = format;
        }
        if let Some(filter) = file.log.filter {
            config.log.filter = filter;
        }

        config.feedback.good_form_threshold = config.analysis.good_form_threshold;
        Ok(config)
    }

    /// Apply `FORMA_*` overrides from the process environment
    pub fn apply_env(&mut self) -> FormaResult<()> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) -> FormaResult<()> {
        if let Some(path) = lookup(ENV_CATALOG) {
            self.catalog_path = Some(PathBuf::from(path));
        }
        if let Some(name) = lookup(ENV_EXERCISE) {
            let name = name.trim();
            self.exercise = if name.is_empty() || name.eq_ignore_ascii_case("auto") {
                None
            } else {
                Some(name.to_string())
            };
        }
        if let Some(s) = lookup(ENV_COOLDOWN) {
            self.feedback.cooldown = parse_duration(ENV_COOLDOWN, &s)?;
        }
        if let Some(s) = lookup(ENV_REQUEST_TIMEOUT) {
            self.feedback.request_timeout = parse_duration(ENV_REQUEST_TIMEOUT, &s)?;
        }
        if let Some(s) = lookup(ENV_SPEECH_COOLDOWN) {
            self.feedback.speech_cooldown = parse_duration(ENV_SPEECH_COOLDOWN, &s)?;
        }
        if let Some(s) = lookup(ENV_SPEECH) {
            self.feedback.speech_enabled = parse_bool(ENV_SPEECH, &s)?;
        }
        if let Some(s) = lookup(ENV_LOG_FORMAT) {
            self.log.format = s.parse()?;
        }
        if let Some(s) = lookup(ENV_LOG) {
            self.log.filter = s;
        }
        Ok(())
    }

    pub fn validate(&self) -> FormaResult<()> {
        self.analysis.validate()?;
        self.feedback.validate()?;
        if self.feedback.good_form_threshold != self.analysis.good_form_threshold {
            return Err(FormaError::InvalidConfig(format!(
                "good form threshold differs between analysis ({}) and feedback ({})",
                self.analysis.good_form_threshold, self.feedback.good_form_threshold
            )));
        }
        if self.max_frame_buffer == 0 || self.max_event_buffer == 0 {
            return Err(FormaError::InvalidConfig("buffers must hold at least one item".to_string()));
        }
        if self.tick_interval.is_zero() {
            return Err(FormaError::InvalidConfig("tick_interval must be non-zero".to_string()));
        }
        Ok(())
    }

    /// The configured catalog, or the built-in one
    pub fn load_catalog(&self) -> FormaResult<ExerciseCatalog> {
        match &self.catalog_path {
            Some(path) => ExerciseCatalog::from_path(path),
            None => ExerciseCatalog::builtin(),
        }
    }
}

fn parse_duration(key: &str, value: &str) -> FormaResult<Duration> {
    humantime::parse_duration(value.trim())
        .map_err(|e| FormaError::InvalidConfig(format!("{} = '{}': {}", key, value, e)))
}

fn parse_bool(key: &str, value: &str) -> FormaResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(FormaError::InvalidConfig(format!("{} = '{}': expected a boolean", key, value))),
    }
}
