//! Recording stand-ins for the remote collaborators

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use forma_core::{FormaError, FormaResult};
use forma_feedback::{FeedbackGenerator, FeedbackRequest, SpeechRequest, SpeechSynthesizer};

/// How a recording collaborator answers
#[derive(Clone, Debug, PartialEq)]
pub enum Reply {
    /// First issue, or a compliment for positive requests
    Echo,
    Fixed(String),
    Fail(String),
}

/// Feedback generator that records every request
pub struct RecordingGenerator {
    reply: Reply,
    delay: Duration,
    calls: Mutex<Vec<FeedbackRequest>>,
}

impl RecordingGenerator {
    pub fn new(reply: Reply) -> Arc<Self> {
        Self::with_delay(reply, Duration::ZERO)
    }

    /// Answer after `delay`
    pub fn with_delay(reply: Reply, delay: Duration) -> Arc<Self> {
        Arc::new(RecordingGenerator {
            reply,
            delay,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn echo() -> Arc<Self> {
        Self::new(Reply::Echo)
    }

    pub fn failing() -> Arc<Self> {
        Self::new(Reply::Fail("generator unavailable".to_string()))
    }

    pub fn calls(&self) -> Vec<FeedbackRequest> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl FeedbackGenerator for RecordingGenerator {
    fn name(&self) -> &str {
        "recording"
    }

    async fn generate(&self, request: FeedbackRequest) -> FormaResult<String> {
        self.calls.lock().push(request.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match &self.reply {
            Reply::Echo => Ok(match request.issues.first() {
                Some(issue) => issue.clone(),
                None => format!("Good {}.", request.exercise_name.to_lowercase()),
            }),
            Reply::Fixed(text) => Ok(text.clone()),
            Reply::Fail(reason) => Err(FormaError::ExternalService(reason.clone())),
        }
    }
}

/// Speech synthesizer that records every text and returns one byte per char
#[derive(Default)]
pub struct RecordingSynthesizer {
    fail: bool,
    texts: Mutex<Vec<String>>,
}

impl RecordingSynthesizer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(RecordingSynthesizer {
            fail: true,
            texts: Mutex::new(Vec::new()),
        })
    }

    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for RecordingSynthesizer {
    fn name(&self) -> &str {
        "recording"
    }

    async fn synthesize(&self, request: SpeechRequest) -> FormaResult<Bytes> {
        self.texts.lock().push(request.text.clone());
        if self.fail {
            return Err(FormaError::ExternalService("synthesizer unavailable".to_string()));
        }
        Ok(Bytes::from(vec![0u8; request.text.len()]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echo_records() {
        let generator = RecordingGenerator::echo();
        let text = generator
            .generate(FeedbackRequest::correction("SQUAT", vec!["Chest up.".into()]))
            .await
            .unwrap();
        assert_eq!(text, "Chest up.");
        assert_eq!(generator.generate(FeedbackRequest::positive("SQUAT")).await.unwrap(), "Good squat.");
        assert_eq!(generator.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_failing_synthesizer() {
        let synth = RecordingSynthesizer::failing();
        let result = synth.synthesize(SpeechRequest { text: "hi".into() }).await;
        assert!(matches!(result, Err(FormaError::ExternalService(_))));
        assert_eq!(synth.texts(), vec!["hi".to_string()]);
    }
}
