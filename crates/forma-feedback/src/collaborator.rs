//! External collaborators - text generation and speech synthesis
//!
//! Both are slow and may fail; the orchestrator wraps every call in a
//! timeout and never awaits them on the frame path.

use async_trait::async_trait;
use bytes::Bytes;

use forma_core::FormaResult;

/// Input to the text generator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackRequest {
    pub exercise_name: String,
    /// Empty for a positive-reinforcement request
    pub issues: Vec<String>,
}

impl FeedbackRequest {
    pub fn correction(exercise_name: impl Into<String>, issues: Vec<String>) -> Self {
        FeedbackRequest {
            exercise_name: exercise_name.into(),
            issues,
        }
    }

    pub fn positive(exercise_name: impl Into<String>) -> Self {
        FeedbackRequest {
            exercise_name: exercise_name.into(),
            issues: Vec::new(),
        }
    }

    pub fn is_positive(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Input to the speech synthesizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechRequest {
    pub text: String,
}

/// Turns detected issues into a short coaching sentence
#[async_trait]
pub trait FeedbackGenerator: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, request: FeedbackRequest) -> FormaResult<String>;
}

/// Turns text into raw PCM audio
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    fn name(&self) -> &str;

    async fn synthesize(&self, request: SpeechRequest) -> FormaResult<Bytes>;
}

/// Offline generator: echoes the first issue, or a fixed compliment
#[derive(Debug, Clone, Default)]
pub struct TemplateGenerator;

#[async_trait]
impl FeedbackGenerator for TemplateGenerator {
    fn name(&self) -> &str {
        "template"
    }

    async fn generate(&self, request: FeedbackRequest) -> FormaResult<String> {
        Ok(match request.issues.first() {
            Some(issue) => issue.clone(),
            None => format!("Nice {}! Keep it up.", request.exercise_name.to_lowercase().replace('_', " ")),
        })
    }
}

/// Synthesizer that returns silence sized to the text
#[derive(Debug, Clone)]
pub struct SilentSynthesizer {
    /// Bytes of PCM per character of text
    pub bytes_per_char: usize,
}

impl Default for SilentSynthesizer {
    fn default() -> Self {
        // ~60ms of 24kHz mono 16-bit audio per character
        SilentSynthesizer { bytes_per_char: 2_880 }
    }
}

#[async_trait]
impl SpeechSynthesizer for SilentSynthesizer {
    fn name(&self) -> &str {
        "silent"
    }

    async fn synthesize(&self, request: SpeechRequest) -> FormaResult<Bytes> {
        Ok(Bytes::from(vec![0u8; request.text.chars().count() * self.bytes_per_char]))
    }
}
