//! Coach session - drives the pipeline and the orchestrator per frame

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use forma_analysis::{AnalysisPipeline, AnalysisResult, RepCounterState, Transition};
use forma_catalog::ExerciseCatalog;
use forma_core::{FormaError, FormaResult, FrameTime, LandmarkFrame};
use forma_feedback::{
    FeedbackEvent, FeedbackGenerator, FeedbackOrchestrator, FeedbackStats, SpeechSynthesizer,
    SuppressReason,
};

use crate::CoachConfig;

#[derive(Clone, Debug, Default)]
pub struct SessionStats {
    pub ticks: u64,
    pub frames_queued: u64,
    pub frames_dropped: u64,
    pub frames_stale: u64,
    pub frames_analyzed: u64,
    pub events_dropped: u64,
    pub last_tick_duration: Duration,
}

/// Latest state, readable by hosts without touching the session
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub result: Option<AnalysisResult>,
    pub reps: RepCounterState,
    pub feedback: Option<String>,
    pub speaking: bool,
    pub frames_analyzed: u64,
}

/// Events for the host
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    ExerciseChanged { exercise: Option<String> },
    RepCompleted { exercise: String, count: u32 },
    Feedback(FeedbackEvent),
}

pub struct CoachSession {
    pipeline: AnalysisPipeline,
    orchestrator: FeedbackOrchestrator,
    incoming: VecDeque<LandmarkFrame>,
    outgoing: VecDeque<SessionEvent>,
    snapshot: Arc<RwLock<SessionSnapshot>>,
    last_timestamp: Option<FrameTime>,
    max_frame_buffer: usize,
    max_event_buffer: usize,
    tick_interval: Duration,
    stats: SessionStats,
}

impl CoachSession {
    /// Build a session over a loaded catalog. Must run inside a tokio runtime.
    pub fn new(
        config: CoachConfig,
        catalog: Arc<ExerciseCatalog>,
        generator: Arc<dyn FeedbackGenerator>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> FormaResult<Self> {
        config.validate()?;
        let pipeline = AnalysisPipeline::new(catalog, config.analysis.clone())?;
        let orchestrator = FeedbackOrchestrator::new(config.feedback.clone(), generator, synthesizer)?;

        let mut session = CoachSession {
            pipeline,
            orchestrator,
            incoming: VecDeque::new(),
            outgoing: VecDeque::new(),
            snapshot: Arc::new(RwLock::new(SessionSnapshot::default())),
            last_timestamp: None,
            max_frame_buffer: config.max_frame_buffer,
            max_event_buffer: config.max_event_buffer,
            tick_interval: config.tick_interval,
            stats: SessionStats::default(),
        };

        if let Some(name) = config.exercise.as_deref() {
            session.select_exercise(Some(name))?;
        }
        tracing::info!(
            exercises = session.pipeline.catalog().len(),
            selection = ?session.pipeline.selection(),
            "coach session ready"
        );
        Ok(session)
    }

    /// Load the catalog named by the configuration, then build
    pub fn from_config(
        config: CoachConfig,
        generator: Arc<dyn FeedbackGenerator>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> FormaResult<Self> {
        let catalog = Arc::new(config.load_catalog()?);
        Self::new(config, catalog, generator, synthesizer)
    }

    /// Explicit selection, or `None` for auto-detect
    pub fn select_exercise(&mut self, name: Option<&str>) -> FormaResult<()> {
        let before = self.pipeline.active_exercise().map(str::to_string);
        let outcome = self.pipeline.select_exercise(name);
        self.note_exercise_change(before);
        self.publish();
        outcome
    }

    /// Queue a frame for the next tick
    pub fn queue_frame(&mut self, frame: LandmarkFrame) -> bool {
        if self.incoming.len() >= self.max_frame_buffer {
            self.stats.frames_dropped += 1;
            return false;
        }
        self.incoming.push_back(frame);
        self.stats.frames_queued += 1;
        true
    }

    /// Run one pass of the session loop
    pub fn tick(&mut self, now: Instant) {
        let start = std::time::Instant::now();
        self.stats.ticks += 1;

        // Stage 1: Ingest frames
        let frames: Vec<LandmarkFrame> = self.incoming.drain(..).collect();

        for frame in frames {
            if self.last_timestamp.map_or(false, |last| frame.timestamp < last) {
                self.stats.frames_stale += 1;
                tracing::debug!(timestamp = ?frame.timestamp, "stale frame dropped");
                continue;
            }
            self.last_timestamp = Some(frame.timestamp);

            // Stage 2: Analyze
            let before = self.pipeline.active_exercise().map(str::to_string);
            let analysis = self.pipeline.process(&frame);
            self.stats.frames_analyzed += 1;
            self.note_exercise_change(before);

            if let Transition::RepCompleted { count, .. } = analysis.transition {
                if let Some(exercise) = self.pipeline.active_exercise() {
                    let exercise = exercise.to_string();
                    self.push_event(SessionEvent::RepCompleted { exercise, count });
                }
            }

            // Stage 3: Offer to feedback
            if let Some(result) = &analysis.result {
                self.orchestrator.submit(result, analysis.occluded, now);
            }
            self.snapshot.write().result = analysis.result;
        }

        // Stage 4: Publish
        for event in self.orchestrator.poll(now) {
            self.push_event(SessionEvent::Feedback(event));
        }
        self.publish();

        self.stats.last_tick_duration = start.elapsed();
    }

    /// Manual speech of one or more lines
    pub fn speak(&mut self, lines: &[String], now: Instant) -> Result<(), SuppressReason> {
        self.orchestrator.speak_lines(lines, now)
    }

    /// Wait for in-flight feedback calls and publish their results
    pub async fn settle(&mut self) {
        for event in self.orchestrator.settle().await {
            self.push_event(SessionEvent::Feedback(event));
        }
        self.publish();
    }

    pub fn pop_event(&mut self) -> Option<SessionEvent> {
        self.outgoing.pop_front()
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        self.outgoing.drain(..).collect()
    }

    /// Shared handle to the published snapshot
    pub fn snapshot_handle(&self) -> Arc<RwLock<SessionSnapshot>> {
        Arc::clone(&self.snapshot)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.read().clone()
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn feedback_stats(&self) -> &FeedbackStats {
        self.orchestrator.stats()
    }

    /// A text request is in flight or parked behind the cooldown
    pub fn feedback_pending(&self) -> bool {
        self.orchestrator.is_text_in_flight() || self.orchestrator.pending_deadline().is_some()
    }

    pub fn pipeline(&self) -> &AnalysisPipeline {
        &self.pipeline
    }

    fn note_exercise_change(&mut self, before: Option<String>) {
        let after = self.pipeline.active_exercise();
        if before.as_deref() != after {
            let exercise = after.map(str::to_string);
            self.push_event(SessionEvent::ExerciseChanged { exercise });
        }
    }

    fn push_event(&mut self, event: SessionEvent) {
        if self.outgoing.len() >= self.max_event_buffer {
            self.stats.events_dropped += 1;
            return;
        }
        self.outgoing.push_back(event);
    }

    fn publish(&self) {
        let mut snapshot = self.snapshot.write();
        snapshot.reps = self.pipeline.rep_state().clone();
        snapshot.feedback = self.orchestrator.displayed_text().map(str::to_string);
        snapshot.speaking = self.orchestrator.is_speaking();
        snapshot.frames_analyzed = self.stats.frames_analyzed;
    }

    /// Serve commands until shutdown, ticking while idle
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<SessionCommand>,
        events: mpsc::Sender<SessionEvent>,
    ) -> SessionStats {
        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        'serve: loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(SessionCommand::Frame(frame)) => {
                        self.queue_frame(frame);
                        self.tick(Instant::now());
                    }
                    Some(SessionCommand::Select(name)) => {
                        if let Err(e) = self.select_exercise(name.as_deref()) {
                            tracing::warn!(error = %e, "exercise selection rejected");
                        }
                    }
                    Some(SessionCommand::Speak(lines)) => {
                        if let Err(reason) = self.speak(&lines, Instant::now()) {
                            tracing::debug!(?reason, "manual speech skipped");
                        }
                    }
                    Some(SessionCommand::Shutdown) | None => break 'serve,
                },
                _ = ticker.tick() => self.tick(Instant::now()),
            }

            // A host that never reads events must not stall analysis
            for event in self.drain_events() {
                match events.try_send(event) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => self.stats.events_dropped += 1,
                    Err(TrySendError::Closed(_)) => {
                        tracing::debug!("event receiver dropped");
                        break 'serve;
                    }
                }
            }
        }

        tracing::info!(
            frames = self.stats.frames_analyzed,
            dropped = self.stats.frames_dropped,
            "coach session stopped"
        );
        self.stats
    }

    /// Move the session onto the runtime
    pub fn spawn(self, buffer: usize) -> SessionHandle {
        let (command_tx, command_rx) = mpsc::channel(buffer);
        let (event_tx, event_rx) = mpsc::channel(buffer);
        let snapshot = self.snapshot_handle();
        let task = tokio::spawn(self.run(command_rx, event_tx));

        SessionHandle {
            commands: command_tx,
            events: event_rx,
            snapshot,
            task,
        }
    }
}

/// Commands accepted by a spawned session
#[derive(Debug, Clone)]
pub enum SessionCommand {
    Frame(LandmarkFrame),
    Select(Option<String>),
    Speak(Vec<String>),
    Shutdown,
}

/// Host side of a spawned session
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    events: mpsc::Receiver<SessionEvent>,
    snapshot: Arc<RwLock<SessionSnapshot>>,
    task: JoinHandle<SessionStats>,
}

impl SessionHandle {
    pub async fn send_frame(&self, frame: LandmarkFrame) -> FormaResult<()> {
        self.send(SessionCommand::Frame(frame)).await
    }

    pub async fn select_exercise(&self, name: Option<&str>) -> FormaResult<()> {
        self.send(SessionCommand::Select(name.map(str::to_string))).await
    }

    pub async fn speak(&self, lines: Vec<String>) -> FormaResult<()> {
        self.send(SessionCommand::Speak(lines)).await
    }

    async fn send(&self, command: SessionCommand) -> FormaResult<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| FormaError::SessionClosed)
    }

    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events.recv().await
    }

    pub fn try_next_event(&mut self) -> Option<SessionEvent> {
        self.events.try_recv().ok()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.read().clone()
    }

    /// Stop the session and collect its stats
    pub async fn shutdown(self) -> FormaResult<SessionStats> {
        let SessionHandle {
            commands,
            events,
            task,
            ..
        } = self;
        // Best effort: a full or closed channel still ends the loop once dropped
        let _ = commands.try_send(SessionCommand::Shutdown);
        drop(commands);
        // Queued frames are still analyzed; events stays open until the loop ends
        let stats = task.await.map_err(|_| FormaError::SessionClosed);
        drop(events);
        stats
    }
}
