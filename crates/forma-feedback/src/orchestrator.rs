//! Feedback orchestrator
//!
//! `submit` is called once per analyzed frame and never suspends. It decides
//! whether the result deserves a text request:
//!
//! - dropped while a text request is in flight
//! - dropped when its text matches what is displayed (or what produced it)
//! - parked in the debounce scheduler while the cooldown runs (latest wins)
//! - otherwise dispatched on the runtime, bounded by the request timeout
//!
//! The first frame of full occlusion forces an immediate request, bypassing
//! cooldown and duplicate checks but not the in-flight lock.
//!
//! Completions come back over a channel and are applied by `submit`/`poll`,
//! so displayed text is only ever written from the frame loop.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::time::Instant;

use forma_analysis::AnalysisResult;
use forma_core::{FormaError, FormaResult};

use crate::{
    wrap_pcm, DebounceScheduler, FeedbackConfig, FeedbackGenerator, FeedbackRequest,
    SpeechRequest, SpeechSynthesizer,
};

const COMPLETION_BUFFER: usize = 16;

/// Where displayed text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackSource {
    Generated,
    Fallback,
}

/// Host-facing output of the orchestrator
#[derive(Debug, Clone, PartialEq)]
pub enum FeedbackEvent {
    /// A text request was dispatched
    Requested {
        exercise: String,
        positive: bool,
        forced: bool,
    },
    /// New coaching text to show
    Displayed { text: String, source: FeedbackSource },
    /// Synthesized speech, WAV-wrapped
    Audio { text: String, wav: Bytes },
    SpeechFailed { text: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    InFlight,
    Duplicate,
    NotAssessable,
    NothingToSay,
    SpeechCooldown,
    SpeechDisabled,
}

/// What `submit` did with a result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Requested { positive: bool, forced: bool },
    /// Parked until the cooldown ends
    Deferred { due: Instant },
    Suppressed(SuppressReason),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackStats {
    pub requests: u64,
    pub fallbacks: u64,
    pub deferred: u64,
    pub suppressed: u64,
    pub speech_requests: u64,
    pub speech_failures: u64,
}

#[derive(Debug, Clone)]
struct Candidate {
    request: FeedbackRequest,
    /// Result text that produced the request; the duplicate key
    source_text: String,
    vocalize: bool,
    forced: bool,
}

enum Completion {
    Text {
        candidate: Candidate,
        outcome: FormaResult<String>,
        finished: Instant,
    },
    Speech {
        text: String,
        outcome: FormaResult<Bytes>,
    },
}

pub struct FeedbackOrchestrator {
    config: FeedbackConfig,
    generator: Arc<dyn FeedbackGenerator>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    runtime: Handle,
    completions_tx: mpsc::Sender<Completion>,
    completions_rx: mpsc::Receiver<Completion>,
    text_in_flight: bool,
    speech_in_flight: bool,
    last_completed: Option<Instant>,
    last_speech: Option<Instant>,
    displayed: Option<String>,
    last_source: Option<String>,
    occluded: bool,
    scheduler: DebounceScheduler<Candidate>,
    events: Vec<FeedbackEvent>,
    stats: FeedbackStats,
}

impl FeedbackOrchestrator {
    /// Must be called from within a tokio runtime
    pub fn new(
        config: FeedbackConfig,
        generator: Arc<dyn FeedbackGenerator>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> FormaResult<Self> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| FormaError::NoRuntime)?;
        let (completions_tx, completions_rx) = mpsc::channel(COMPLETION_BUFFER);

        Ok(FeedbackOrchestrator {
            config,
            generator,
            synthesizer,
            runtime,
            completions_tx,
            completions_rx,
            text_in_flight: false,
            speech_in_flight: false,
            last_completed: None,
            last_speech: None,
            displayed: None,
            last_source: None,
            occluded: false,
            scheduler: DebounceScheduler::new(),
            events: Vec::new(),
            stats: FeedbackStats::default(),
        })
    }

    /// Offer one analysis result; `occluded` marks a frame with nothing checkable
    pub fn submit(&mut self, result: &AnalysisResult, occluded: bool, now: Instant) -> Decision {
        self.drain(now);

        let forced = occluded && !self.occluded;
        self.occluded = occluded;

        let candidate = match self.candidate(result, forced) {
            Ok(candidate) => candidate,
            Err(reason) => return self.suppress(reason),
        };

        if self.text_in_flight {
            return self.suppress(SuppressReason::InFlight);
        }

        if forced {
            if self.scheduler.cancel().is_some() {
                tracing::debug!("parked feedback replaced by force-immediate request");
            }
            return self.dispatch(candidate);
        }

        if self.is_duplicate(&candidate.source_text) {
            return self.suppress(SuppressReason::Duplicate);
        }

        if let Some(due) = self.cooldown_until(now) {
            self.scheduler.schedule(candidate, due);
            self.stats.deferred += 1;
            tracing::debug!(remaining = ?(due - now), "feedback parked until cooldown ends");
            return Decision::Deferred { due };
        }

        self.scheduler.cancel();
        self.dispatch(candidate)
    }

    /// Apply completions, fire due debounced requests, and take pending events
    pub fn poll(&mut self, now: Instant) -> Vec<FeedbackEvent> {
        self.drain(now);
        std::mem::take(&mut self.events)
    }

    /// Wait for in-flight calls to finish, then poll
    pub async fn settle(&mut self) -> Vec<FeedbackEvent> {
        while self.text_in_flight || self.speech_in_flight {
            match self.completions_rx.recv().await {
                Some(completion) => self.complete(completion, Instant::now()),
                None => break,
            }
        }
        self.poll(Instant::now())
    }

    /// Speak text now; ignores the speech cooldown but not the speech lock
    pub fn speak(&mut self, text: &str, now: Instant) -> Result<(), SuppressReason> {
        self.drain(now);
        let text = text.trim();
        if text.is_empty() {
            return Err(SuppressReason::NothingToSay);
        }
        self.start_speech(text.to_string(), now, true)
    }

    /// Speak several lines as one utterance, joined with ". "
    pub fn speak_lines(&mut self, lines: &[String], now: Instant) -> Result<(), SuppressReason> {
        let joined = lines
            .iter()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(". ");
        self.speak(&joined, now)
    }

    fn candidate(&self, result: &AnalysisResult, forced: bool) -> Result<Candidate, SuppressReason> {
        if forced {
            return Ok(Candidate {
                request: FeedbackRequest::correction(&result.exercise_name, vec![result.feedback.clone()]),
                source_text: result.feedback.clone(),
                vocalize: true,
                forced: true,
            });
        }

        if !result.assessable {
            return Err(SuppressReason::NotAssessable);
        }

        if !result.issues.is_empty() {
            return Ok(Candidate {
                request: FeedbackRequest::correction(&result.exercise_name, result.issues.clone()),
                source_text: result.feedback.clone(),
                vocalize: result.vocalization_needed,
                forced: false,
            });
        }

        if self.config.positive_reinforcement && result.is_good_form(self.config.good_form_threshold) {
            return Ok(Candidate {
                request: FeedbackRequest::positive(&result.exercise_name),
                source_text: result.feedback.clone(),
                vocalize: false,
                forced: false,
            });
        }

        Err(SuppressReason::NothingToSay)
    }

    fn is_duplicate(&self, text: &str) -> bool {
        self.displayed.as_deref() == Some(text) || self.last_source.as_deref() == Some(text)
    }

    fn cooldown_until(&self, now: Instant) -> Option<Instant> {
        self.last_completed
            .map(|at| at + self.config.cooldown)
            .filter(|due| *due > now)
    }

    fn suppress(&mut self, reason: SuppressReason) -> Decision {
        self.stats.suppressed += 1;
        tracing::trace!(?reason, "feedback suppressed");
        Decision::Suppressed(reason)
    }

    fn dispatch(&mut self, candidate: Candidate) -> Decision {
        let positive = candidate.request.is_positive();
        let forced = candidate.forced;

        self.text_in_flight = true;
        self.last_source = Some(candidate.source_text.clone());
        self.stats.requests += 1;
        self.events.push(FeedbackEvent::Requested {
            exercise: candidate.request.exercise_name.clone(),
            positive,
            forced,
        });
        tracing::info!(
            exercise = %candidate.request.exercise_name,
            issues = candidate.request.issues.len(),
            positive,
            forced,
            "feedback requested"
        );

        let generator = Arc::clone(&self.generator);
        let tx = self.completions_tx.clone();
        let limit = self.config.request_timeout;
        self.runtime.spawn(async move {
            let outcome = bounded(limit, generator.generate(candidate.request.clone())).await;
            let _ = tx
                .send(Completion::Text {
                    candidate,
                    outcome,
                    finished: Instant::now(),
                })
                .await;
        });

        Decision::Requested { positive, forced }
    }

    fn start_speech(&mut self, text: String, now: Instant, manual: bool) -> Result<(), SuppressReason> {
        if !self.config.speech_enabled {
            return Err(SuppressReason::SpeechDisabled);
        }
        if self.speech_in_flight {
            return Err(SuppressReason::InFlight);
        }
        if !manual {
            if let Some(last) = self.last_speech {
                if now < last + self.config.speech_cooldown {
                    return Err(SuppressReason::SpeechCooldown);
                }
            }
        }

        self.speech_in_flight = true;
        self.last_speech = Some(now);
        self.stats.speech_requests += 1;
        tracing::debug!(chars = text.len(), manual, "speech requested");

        let synthesizer = Arc::clone(&self.synthesizer);
        let tx = self.completions_tx.clone();
        let limit = self.config.request_timeout;
        self.runtime.spawn(async move {
            let request = SpeechRequest { text: text.clone() };
            let outcome = bounded(limit, synthesizer.synthesize(request)).await;
            let _ = tx.send(Completion::Speech { text, outcome }).await;
        });

        Ok(())
    }

    fn drain(&mut self, now: Instant) {
        while let Ok(completion) = self.completions_rx.try_recv() {
            self.complete(completion, now);
        }

        if self.text_in_flight {
            return;
        }
        if let Some(candidate) = self.scheduler.take_due(now) {
            if self.is_duplicate(&candidate.source_text) {
                tracing::debug!("parked feedback already displayed");
            } else {
                self.dispatch(candidate);
            }
        }
    }

    fn complete(&mut self, completion: Completion, now: Instant) {
        match completion {
            Completion::Text {
                candidate,
                outcome,
                finished,
            } => {
                self.text_in_flight = false;
                self.last_completed = Some(finished);

                let (text, source) = match outcome {
                    Ok(text) if !text.trim().is_empty() => (text.trim().to_string(), FeedbackSource::Generated),
                    Ok(_) => {
                        tracing::warn!(generator = self.generator.name(), "generator returned empty text");
                        (self.fallback_for(&candidate), FeedbackSource::Fallback)
                    }
                    Err(e) => {
                        tracing::warn!(generator = self.generator.name(), error = %e, "feedback generation failed");
                        (self.fallback_for(&candidate), FeedbackSource::Fallback)
                    }
                };
                if source == FeedbackSource::Fallback {
                    self.stats.fallbacks += 1;
                }

                self.displayed = Some(text.clone());
                self.events.push(FeedbackEvent::Displayed {
                    text: text.clone(),
                    source,
                });

                if candidate.vocalize || candidate.forced {
                    if let Err(reason) = self.start_speech(text, now, false) {
                        tracing::debug!(?reason, "speech skipped");
                    }
                }
            }
            Completion::Speech { text, outcome } => {
                self.speech_in_flight = false;
                match outcome.and_then(|pcm| wrap_pcm(&pcm, self.config.audio)) {
                    Ok(wav) => self.events.push(FeedbackEvent::Audio { text, wav }),
                    Err(e) => {
                        tracing::warn!(synthesizer = self.synthesizer.name(), error = %e, "speech synthesis failed");
                        self.stats.speech_failures += 1;
                        self.events.push(FeedbackEvent::SpeechFailed {
                            text,
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }
    }

    fn fallback_for(&self, candidate: &Candidate) -> String {
        if candidate.request.is_positive() {
            self.config.fallback.positive.clone()
        } else {
            self.config.fallback.correction.clone()
        }
    }

    pub fn displayed_text(&self) -> Option<&str> {
        self.displayed.as_deref()
    }

    pub fn is_text_in_flight(&self) -> bool {
        self.text_in_flight
    }

    pub fn is_speaking(&self) -> bool {
        self.speech_in_flight
    }

    /// When the parked request will fire, if one is parked
    pub fn pending_deadline(&self) -> Option<Instant> {
        self.scheduler.deadline()
    }

    pub fn stats(&self) -> &FeedbackStats {
        &self.stats
    }

    pub fn config(&self) -> &FeedbackConfig {
        &self.config
    }
}

async fn bounded<T>(limit: Duration, call: impl Future<Output = FormaResult<T>>) -> FormaResult<T> {
    match tokio::time::timeout(limit, call).await {
        Ok(outcome) => outcome,
        Err(_) => Err(FormaError::Timeout(limit)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use forma_analysis::{CANNOT_ASSESS_FEEDBACK, POSITIVE_FEEDBACK};
    use parking_lot::Mutex;

    struct MockGenerator {
        calls: Mutex<Vec<FeedbackRequest>>,
        delay: Duration,
        fail: bool,
    }

    impl MockGenerator {
        fn new() -> Arc<Self> {
            Self::with(Duration::ZERO, false)
        }

        fn with(delay: Duration, fail: bool) -> Arc<Self> {
            Arc::new(MockGenerator {
                calls: Mutex::new(Vec::new()),
                delay,
                fail,
            })
        }

        fn calls(&self) -> Vec<FeedbackRequest> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl FeedbackGenerator for MockGenerator {
        fn name(&self) -> &str {
            "mock"
        }

        async fn generate(&self, request: FeedbackRequest) -> FormaResult<String> {
            self.calls.lock().push(request.clone());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                return Err(FormaError::ExternalService("generator offline".into()));
            }
            Ok(if request.issues.is_empty() {
                "Looking strong!".to_string()
            } else {
                format!("Coach: {}", request.issues.join(" "))
            })
        }
    }

    struct MockSynth {
        calls: Mutex<Vec<String>>,
        fail: bool,
    }

    impl MockSynth {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(MockSynth {
                calls: Mutex::new(Vec::new()),
                fail,
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl SpeechSynthesizer for MockSynth {
        fn name(&self) -> &str {
            "mock"
        }

        async fn synthesize(&self, request: SpeechRequest) -> FormaResult<Bytes> {
            self.calls.lock().push(request.text);
            if self.fail {
                return Err(FormaError::ExternalService("tts offline".into()));
            }
            Ok(Bytes::from_static(&[0, 0, 1, 1]))
        }
    }

    fn correction(issue: &str, vocalize: bool) -> AnalysisResult {
        AnalysisResult {
            exercise_name: "SQUAT".into(),
            display_name: "Squat".into(),
            stage_name: Some("down".into()),
            form_score: 75,
            issues: vec![issue.into()],
            feedback: issue.into(),
            vocalization_needed: vocalize,
            provisional: false,
            assessable: true,
            rep_count: 0,
        }
    }

    fn good_form() -> AnalysisResult {
        AnalysisResult {
            form_score: 100,
            issues: Vec::new(),
            feedback: POSITIVE_FEEDBACK.into(),
            vocalization_needed: false,
            ..correction("", false)
        }
    }

    fn blind() -> AnalysisResult {
        AnalysisResult {
            stage_name: None,
            form_score: 100,
            issues: Vec::new(),
            feedback: CANNOT_ASSESS_FEEDBACK.into(),
            vocalization_needed: false,
            assessable: false,
            ..correction("", false)
        }
    }

    fn orchestrator(generator: &Arc<MockGenerator>, synth: &Arc<MockSynth>) -> FeedbackOrchestrator {
        FeedbackOrchestrator::new(FeedbackConfig::default(), generator.clone(), synth.clone()).unwrap()
    }

    fn displayed(events: &[FeedbackEvent]) -> Vec<(String, FeedbackSource)> {
        events
            .iter()
            .filter_map(|e| match e {
                FeedbackEvent::Displayed { text, source } => Some((text.clone(), *source)),
                _ => None,
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_positive_request_sends_no_issues() {
        let (generator, synth) = (MockGenerator::new(), MockSynth::new(false));
        let mut orch = orchestrator(&generator, &synth);

        let decision = orch.submit(&good_form(), false, Instant::now());
        assert_eq!(
            decision,
            Decision::Requested {
                positive: true,
                forced: false
            }
        );

        let events = orch.settle().await;
        assert_eq!(
            displayed(&events),
            vec![("Looking strong!".to_string(), FeedbackSource::Generated)]
        );
        assert!(generator.calls()[0].issues.is_empty());
        assert!(synth.calls().is_empty());
        assert_eq!(orch.displayed_text(), Some("Looking strong!"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_identical_results_request_once() {
        let (generator, synth) = (MockGenerator::new(), MockSynth::new(false));
        let mut orch = orchestrator(&generator, &synth);
        let result = correction("Go lower.", false);

        orch.submit(&result, false, Instant::now());
        assert_eq!(
            orch.submit(&result, false, Instant::now()),
            Decision::Suppressed(SuppressReason::InFlight)
        );
        orch.settle().await;

        assert_eq!(
            orch.submit(&result, false, Instant::now()),
            Decision::Suppressed(SuppressReason::Duplicate)
        );
        tokio::time::advance(Duration::from_millis(1500)).await;
        assert_eq!(
            orch.submit(&result, false, Instant::now()),
            Decision::Suppressed(SuppressReason::Duplicate)
        );
        assert_eq!(generator.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_parks_latest_candidate() {
        let (generator, synth) = (MockGenerator::new(), MockSynth::new(false));
        let mut orch = orchestrator(&generator, &synth);
        let start = Instant::now();

        orch.submit(&correction("Go lower.", false), false, start);
        orch.settle().await;

        tokio::time::advance(Duration::from_millis(500)).await;
        let decision = orch.submit(&correction("Chest up.", false), false, Instant::now());
        assert_eq!(
            decision,
            Decision::Deferred {
                due: start + Duration::from_secs(2)
            }
        );

        tokio::time::advance(Duration::from_millis(500)).await;
        orch.submit(&correction("Knees out.", false), false, Instant::now());
        assert!(orch.poll(Instant::now()).is_empty());

        tokio::time::advance(Duration::from_millis(1100)).await;
        let events = orch.poll(Instant::now());
        assert!(events
            .iter()
            .any(|e| matches!(e, FeedbackEvent::Requested { positive: false, .. })));
        orch.settle().await;

        let issues: Vec<Vec<String>> = generator.calls().into_iter().map(|r| r.issues).collect();
        assert_eq!(
            issues,
            vec![vec!["Go lower.".to_string()], vec!["Knees out.".to_string()]]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_drops_new_requests() {
        let (generator, synth) = (MockGenerator::with(Duration::from_secs(1), false), MockSynth::new(false));
        let mut orch = orchestrator(&generator, &synth);

        orch.submit(&correction("Go lower.", false), false, Instant::now());
        assert!(orch.is_text_in_flight());
        assert_eq!(
            orch.submit(&correction("Chest up.", false), false, Instant::now()),
            Decision::Suppressed(SuppressReason::InFlight)
        );

        orch.settle().await;
        assert!(!orch.is_text_in_flight());
        assert_eq!(generator.calls().len(), 1);
        assert!(orch.pending_deadline().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_shows_fallback() {
        let (generator, synth) = (MockGenerator::with(Duration::from_secs(60), false), MockSynth::new(false));
        let mut orch = orchestrator(&generator, &synth);

        orch.submit(&correction("Go lower.", false), false, Instant::now());
        let events = orch.settle().await;

        assert_eq!(
            displayed(&events),
            vec![("Keep working on your form.".to_string(), FeedbackSource::Fallback)]
        );
        assert_eq!(orch.stats().fallbacks, 1);
        assert!(!orch.is_text_in_flight());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_positive_request_fallback() {
        let (generator, synth) = (MockGenerator::with(Duration::ZERO, true), MockSynth::new(false));
        let mut orch = orchestrator(&generator, &synth);

        orch.submit(&good_form(), false, Instant::now());
        let events = orch.settle().await;
        assert_eq!(
            displayed(&events),
            vec![("Excellent form! Keep it up.".to_string(), FeedbackSource::Fallback)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_occlusion_forces_immediate_request() {
        let (generator, synth) = (MockGenerator::new(), MockSynth::new(false));
        let mut orch = orchestrator(&generator, &synth);

        orch.submit(&correction("Go lower.", false), false, Instant::now());
        orch.settle().await;

        tokio::time::advance(Duration::from_millis(500)).await;
        assert!(matches!(
            orch.submit(&correction("Chest up.", false), false, Instant::now()),
            Decision::Deferred { .. }
        ));

        let decision = orch.submit(&blind(), true, Instant::now());
        assert_eq!(
            decision,
            Decision::Requested {
                positive: false,
                forced: true
            }
        );
        assert!(orch.pending_deadline().is_none());
        orch.settle().await;

        assert_eq!(generator.calls()[1].issues, vec![CANNOT_ASSESS_FEEDBACK.to_string()]);
        assert_eq!(synth.calls(), vec![format!("Coach: {}", CANNOT_ASSESS_FEEDBACK)]);

        // Still occluded: no longer forced, and nothing to assess
        assert_eq!(
            orch.submit(&blind(), true, Instant::now()),
            Decision::Suppressed(SuppressReason::NotAssessable)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_forced_request_waits_for_in_flight() {
        let (generator, synth) = (MockGenerator::with(Duration::from_secs(1), false), MockSynth::new(false));
        let mut orch = orchestrator(&generator, &synth);

        orch.submit(&correction("Go lower.", false), false, Instant::now());
        assert_eq!(
            orch.submit(&blind(), true, Instant::now()),
            Decision::Suppressed(SuppressReason::InFlight)
        );

        orch.settle().await;
        assert_eq!(generator.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_forced_request_skips_duplicate_check() {
        let (generator, synth) = (MockGenerator::new(), MockSynth::new(false));
        let mut orch = orchestrator(&generator, &synth);

        orch.submit(&correction("Go lower.", false), false, Instant::now());
        orch.settle().await;
        assert_eq!(orch.displayed_text(), Some("Coach: Go lower."));

        let repeated = correction("Coach: Go lower.", false);
        assert_eq!(
            orch.submit(&repeated, false, Instant::now()),
            Decision::Suppressed(SuppressReason::Duplicate)
        );

        let hidden = AnalysisResult {
            feedback: "Coach: Go lower.".into(),
            ..blind()
        };
        assert_eq!(
            orch.submit(&hidden, true, Instant::now()),
            Decision::Requested {
                positive: false,
                forced: true
            }
        );
        orch.settle().await;
        assert_eq!(generator.calls()[1].issues, vec!["Coach: Go lower.".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unassessable_result_is_suppressed() {
        let (generator, synth) = (MockGenerator::new(), MockSynth::new(false));
        let mut orch = orchestrator(&generator, &synth);
        assert_eq!(
            orch.submit(&blind(), false, Instant::now()),
            Decision::Suppressed(SuppressReason::NotAssessable)
        );
        assert!(generator.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_vocalized_text_is_spoken_once_per_cooldown() {
        let (generator, synth) = (MockGenerator::new(), MockSynth::new(false));
        let mut orch = orchestrator(&generator, &synth);

        orch.submit(&correction("Go lower.", true), false, Instant::now());
        let events = orch.settle().await;
        let wav = events
            .iter()
            .find_map(|e| match e {
                FeedbackEvent::Audio { text, wav } => {
                    assert_eq!(text, "Coach: Go lower.");
                    Some(wav.clone())
                }
                _ => None,
            })
            .expect("audio event");
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[44..], &[0, 0, 1, 1]);

        tokio::time::advance(Duration::from_millis(2500)).await;
        assert!(matches!(
            orch.submit(&correction("Chest up.", true), false, Instant::now()),
            Decision::Requested { .. }
        ));
        orch.settle().await;
        assert_eq!(synth.calls().len(), 1);
        assert_eq!(generator.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_speech_joins_lines() {
        let (generator, synth) = (MockGenerator::new(), MockSynth::new(false));
        let mut orch = orchestrator(&generator, &synth);

        let lines = vec!["Chest up".to_string(), " ".to_string(), "Go lower".to_string()];
        assert_eq!(orch.speak_lines(&lines, Instant::now()), Ok(()));
        assert_eq!(orch.speak("again", Instant::now()), Err(SuppressReason::InFlight));
        orch.settle().await;
        assert_eq!(synth.calls(), vec!["Chest up. Go lower".to_string()]);

        // Manual requests ignore the speech cooldown
        assert_eq!(orch.speak("again", Instant::now()), Ok(()));
        assert_eq!(orch.speak("   ", Instant::now()), Err(SuppressReason::NothingToSay));
    }

    #[tokio::test(start_paused = true)]
    async fn test_speech_failure_is_reported() {
        let (generator, synth) = (MockGenerator::new(), MockSynth::new(true));
        let mut orch = orchestrator(&generator, &synth);

        orch.speak("Chest up", Instant::now()).unwrap();
        let events = orch.settle().await;
        assert!(events
            .iter()
            .any(|e| matches!(e, FeedbackEvent::SpeechFailed { .. })));
        assert_eq!(orch.stats().speech_failures, 1);
        assert!(!orch.is_speaking());
    }

    #[tokio::test(start_paused = true)]
    async fn test_speech_disabled() {
        let (generator, synth) = (MockGenerator::new(), MockSynth::new(false));
        let mut orch =
            FeedbackOrchestrator::new(FeedbackConfig::quiet(), generator.clone(), synth.clone()).unwrap();
        assert_eq!(orch.speak("hello", Instant::now()), Err(SuppressReason::SpeechDisabled));
    }

    #[test]
    fn test_requires_runtime() {
        let (generator, synth) = (MockGenerator::new(), MockSynth::new(false));
        let result = FeedbackOrchestrator::new(FeedbackConfig::default(), generator, synth);
        assert!(matches!(result, Err(FormaError::NoRuntime)));
    }
}
