use crate::{
    CoreResult, ErrorKind, PermissionState, RelayError, SessionId,
    audio::{CaptureConstraints, CaptureEvent, CaptureSource},
    coordinator::{
        CoordinatorCommand, CoordinatorStatus, DiagnosticLevel, DiagnosticLog, PassReport,
        RecordingState, buffer::FragmentBuffer, run_upload_pass,
    },
    permission::PermissionStore,
    store::SegmentStore,
    upload::Uploader,
};

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::{
    sync::{mpsc, watch},
    task::{JoinError, JoinHandle},
    time::{self, MissedTickBehavior},
};
use tracing::{debug, error, info, instrument, warn};

/// Time between periodic flush-and-upload cycles while recording.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(60);

/// Ten minutes of one-second fragments.
pub const DEFAULT_MAX_BUFFERED_FRAGMENTS: usize = 600;

const MIN_FLUSH_INTERVAL: Duration = Duration::from_secs(1);

/// Tunables for the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorSettings {
    /// Period of the flush timer.
    pub flush_interval: Duration,
    /// What the capture session is asked for.
    pub constraints: CaptureConstraints,
    /// Upper bound on fragments held in memory when flushes keep failing.
    pub max_buffered_fragments: usize,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            constraints: CaptureConstraints::default(),
            max_buffered_fragments: DEFAULT_MAX_BUFFERED_FRAGMENTS,
        }
    }
}

/// Recording/upload state machine.
///
/// Owns the capture session, the in-memory fragment buffer and the upload
/// in-flight flag. Every mutation goes through one of the transition
/// methods below; the presentation layer only sees [`CoordinatorStatus`]
/// snapshots through [`Coordinator::subscribe`].
///
/// # Transitions
///
/// - `start`: `Idle -> Recording` when capture opens.
/// - `stop`: `Recording -> Idle`, flush, then one upload pass awaited.
/// - flush tick: flush and start a background pass unless one is in flight.
/// - permission revoked: forced `Idle`, buffered audio flushed.
/// - `upload_now`: background pass from either state.
pub struct Coordinator {
    capture: Box<dyn CaptureSource>,
    store: Arc<dyn SegmentStore>,
    uploader: Arc<dyn Uploader>,
    permissions: Box<dyn PermissionStore>,
    session_id: SessionId,
    settings: CoordinatorSettings,
    recording: RecordingState,
    permission: PermissionState,
    buffer: FragmentBuffer,
    capture_tx: mpsc::UnboundedSender<CaptureEvent>,
    capture_rx: mpsc::UnboundedReceiver<CaptureEvent>,
    in_flight: Option<JoinHandle<PassReport>>,
    pending_segments: Option<usize>,
    message: String,
    last_error: Option<String>,
    last_upload_url: Option<String>,
    diagnostics: DiagnosticLog,
    status_tx: watch::Sender<CoordinatorStatus>,
}

impl Coordinator {
    /// Assemble a coordinator in the `Idle` state.
    ///
    /// Reads the persisted permission and the current store size; a store
    /// that cannot be read only hides the pending indicator.
    #[instrument(skip_all)]
    pub fn new(
        capture: Box<dyn CaptureSource>,
        store: Arc<dyn SegmentStore>,
        uploader: Arc<dyn Uploader>,
        permissions: Box<dyn PermissionStore>,
        settings: CoordinatorSettings,
    ) -> Self {
        let permission = permissions.load();
        let pending_segments = match store.count() {
            Ok(count) => Some(count),
            Err(e) => {
                warn!(error = ?e, "Segment store unavailable at startup");
                None
            }
        };
        let session_id = SessionId::generate();
        let (capture_tx, capture_rx) = mpsc::unbounded_channel();

        let coordinator = Self {
            capture,
            store,
            uploader,
            permissions,
            session_id,
            settings,
            recording: RecordingState::Idle,
            permission,
            buffer: FragmentBuffer::new(settings.max_buffered_fragments),
            capture_tx,
            capture_rx,
            in_flight: None,
            pending_segments,
            message: "Not recording".to_string(),
            last_error: None,
            last_upload_url: None,
            diagnostics: DiagnosticLog::default(),
            status_tx: watch::channel(CoordinatorStatus::default()).0,
        };
        coordinator.status_tx.send_replace(coordinator.snapshot());

        info!(
            session = %coordinator.session_id,
            permission = ?permission,
            pending = ?pending_segments,
            "Coordinator initialized"
        );

        coordinator
    }

    /// Replace the generated session id.
    pub fn with_session_id(mut self, session_id: SessionId) -> Self {
        self.session_id = session_id;
        self
    }

    /// Observe status snapshots.
    pub fn subscribe(&self) -> watch::Receiver<CoordinatorStatus> {
        self.status_tx.subscribe()
    }

    /// Current status snapshot.
    pub fn status(&self) -> CoordinatorStatus {
        self.snapshot()
    }

    /// Session id used to name uploads.
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Current recording state.
    pub fn recording_state(&self) -> RecordingState {
        self.recording
    }

    /// True while an upload pass is in flight.
    pub fn is_uploading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// In-memory diagnostic trail.
    pub fn diagnostics(&self) -> &DiagnosticLog {
        &self.diagnostics
    }

    /// Drive the coordinator until [`CoordinatorCommand::Shutdown`] arrives or
    /// every command sender is dropped.
    #[instrument(skip_all)]
    pub async fn run(mut self, mut commands: mpsc::Receiver<CoordinatorCommand>) {
        info!(session = %self.session_id, "Coordinator running");

        let period = self.settings.flush_interval.max(MIN_FLUSH_INTERVAL);
        let mut ticker = time::interval_at(time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let was_recording = self.recording.is_recording();

            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => {
                        if !self.handle_command(command).await {
                            break;
                        }
                    }
                    None => {
                        info!("Command channel closed, shutting down");
                        self.shutdown().await;
                        break;
                    }
                },

                Some(event) = self.capture_rx.recv() => self.on_capture_event(event),

                report = join_in_flight(&mut self.in_flight) => self.finish_upload_pass(report),

                _ = ticker.tick(), if was_recording => self.on_flush_tick(),
            }

            // First tick lands one full period after recording starts.
            if !was_recording && self.recording.is_recording() {
                ticker.reset();
            }
        }

        info!(session = %self.session_id, "Coordinator stopped");
    }

    /// Apply one command. Returns `false` once the coordinator has shut down.
    pub async fn handle_command(&mut self, command: CoordinatorCommand) -> bool {
        debug!(command = ?command, "Handling command");

        match command {
            CoordinatorCommand::StartRecording => self.start_from_command(),
            CoordinatorCommand::StopRecording => self.stop().await,
            CoordinatorCommand::ToggleRecording => {
                if self.recording.is_recording() {
                    self.stop().await;
                } else {
                    self.start_from_command();
                }
            }
            CoordinatorCommand::UploadNow => {
                self.upload_now();
            }
            CoordinatorCommand::RequestPermission => self.request_permission(),
            CoordinatorCommand::PermissionChanged(state) => self.on_permission_changed(state),
            CoordinatorCommand::Shutdown => {
                self.shutdown().await;
                return false;
            }
        }

        true
    }

    /// Start for a command; the error is already in the status.
    fn start_from_command(&mut self) {
        if let Err(e) = self.start() {
            debug!(error = ?e, "Start command rejected");
        }
    }

    /// `Idle -> Recording`.
    ///
    /// # Errors
    ///
    /// Returns the capture error after surfacing it; the state stays `Idle`.
    #[instrument(skip(self))]
    pub fn start(&mut self) -> CoreResult<()> {
        if self.recording.is_recording() {
            debug!("Already recording");
            return Ok(());
        }

        if self.permission == PermissionState::Denied {
            let error =
                RelayError::permission("Microphone access was denied, request permission first");
            self.report_error("Could not start recording", &error);
            self.publish();
            return Err(error);
        }

        self.diagnostics
            .push(DiagnosticLevel::Info, "Attempting to start recording...");

        match self
            .capture
            .start(&self.settings.constraints, self.capture_tx.clone())
        {
            Ok(format) => {
                self.recording = RecordingState::Recording {
                    started_at: Instant::now(),
                    format,
                };
                self.set_permission(PermissionState::Granted);
                self.last_error = None;
                self.note("Recording...");
                self.publish();
                Ok(())
            }
            Err(error) => {
                if error.kind() == ErrorKind::Permission {
                    self.set_permission(PermissionState::Denied);
                }
                self.report_error("Could not start recording", &error);
                self.publish();
                Err(error)
            }
        }
    }

    /// `Recording -> Idle`: stop capture, flush, then upload everything and
    /// wait for that pass. An in-flight pass is awaited first, never
    /// cancelled. No-op when idle.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) {
        if !self.recording.is_recording() {
            debug!("Not recording, nothing to stop");
            return;
        }

        self.capture.stop();
        self.absorb_queued_fragments();
        self.flush();
        self.warn_unsaved();

        let elapsed = self.recording.elapsed().unwrap_or_default();
        self.recording = RecordingState::Idle;
        info!(duration_ms = elapsed.as_millis(), "Recording stopped");
        self.note("Recording stopped.");
        self.publish();

        self.settle().await;
        if self.begin_upload_pass() {
            self.publish();
            self.settle().await;
        }
    }

    /// Manually upload everything in the store.
    ///
    /// Returns `true` if a pass was started. Ignored while a pass is in
    /// flight; a no-op when the store is empty.
    pub fn upload_now(&mut self) -> bool {
        if self.in_flight.is_some() {
            debug!("Upload pass already in flight");
            return false;
        }

        let started = self.begin_upload_pass();
        self.publish();
        started
    }

    /// Periodic flush: assemble the buffer into a segment, persist it and
    /// start an upload pass unless one is already running.
    pub fn on_flush_tick(&mut self) {
        if !self.recording.is_recording() || self.buffer.is_empty() {
            return;
        }

        let flushed = self.flush();

        if self.in_flight.is_some() {
            debug!("Upload pass still in flight, tick will not start another");
        } else if flushed {
            self.begin_upload_pass();
        }

        self.publish();
    }

    /// Apply an event pushed by the capture session.
    pub fn on_capture_event(&mut self, event: CaptureEvent) {
        match event {
            CaptureEvent::Fragment(fragment) => {
                if !self.recording.is_recording() {
                    debug!(sequence = fragment.sequence, "Ignoring fragment while idle");
                    return;
                }
                self.buffer.push(fragment);
                self.publish();
            }
            CaptureEvent::Revoked { reason } => {
                if !self.recording.is_recording() {
                    debug!(reason = %reason, "Ignoring revocation while idle");
                    return;
                }
                self.force_idle(RelayError::permission(reason));
            }
            CaptureEvent::Failed { reason } => {
                let error = RelayError::device(reason);
                self.report_error("Audio stream fault", &error);
                self.publish();
            }
        }
    }

    /// Probe microphone access unless it is already granted.
    #[instrument(skip(self))]
    pub fn request_permission(&mut self) {
        if self.permission.is_granted() {
            self.diagnostics
                .push(DiagnosticLevel::Info, "Permission already granted.");
            return;
        }

        match self.capture.request_permission() {
            Ok(()) => {
                self.set_permission(PermissionState::Granted);
                self.last_error = None;
                self.note("Microphone permission granted.");
            }
            Err(error) => {
                if error.kind() == ErrorKind::Permission {
                    self.set_permission(PermissionState::Denied);
                }
                self.report_error("Microphone permission request failed", &error);
            }
        }

        self.publish();
    }

    /// The host changed the microphone permission.
    pub fn on_permission_changed(&mut self, state: PermissionState) {
        info!(state = ?state, "Permission change reported");

        if state == PermissionState::Denied && self.recording.is_recording() {
            self.force_idle(RelayError::permission("Microphone access revoked"));
            return;
        }

        self.set_permission(state);
        self.publish();
    }

    /// Wait for the in-flight upload pass, if any, and apply its result.
    pub async fn settle(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            let report = report_from_join(handle.await);
            self.finish_upload_pass(report);
        }
    }

    /// Stop recording if needed and wait for uploads to finish.
    pub async fn shutdown(&mut self) {
        self.stop().await;
        self.settle().await;
        if !self.buffer.is_empty() {
            warn!(
                fragments = self.buffer.len(),
                "Discarding fragments that could not be saved"
            );
        }
        info!("Coordinator shut down");
    }

    fn force_idle(&mut self, error: RelayError) {
        self.capture.stop();
        self.absorb_queued_fragments();
        self.flush();
        self.warn_unsaved();
        self.recording = RecordingState::Idle;
        self.set_permission(PermissionState::Denied);
        self.report_error("Recording stopped", &error);
        self.begin_upload_pass();
        self.publish();
    }

    /// Fragments left after a final flush stay buffered and are saved
    /// ahead of the next recording's audio.
    fn warn_unsaved(&mut self) {
        let fragments = self.buffer.len();
        if fragments == 0 {
            return;
        }
        warn!(fragments, "Stopped with unsaved fragments, keeping them buffered");
        self.diagnostics.push(
            DiagnosticLevel::Warn,
            format!(
                "{} fragments could not be saved and will be stored with the next recording",
                fragments
            ),
        );
    }

    /// Apply every event the capture session has queued so far.
    #[cfg(test)]
    pub(crate) fn drain_capture_events(&mut self) {
        while let Ok(event) = self.capture_rx.try_recv() {
            self.on_capture_event(event);
        }
    }

    /// Pull fragments the capture session queued before it stopped.
    pub(crate) fn absorb_queued_fragments(&mut self) {
        while let Ok(event) = self.capture_rx.try_recv() {
            match event {
                CaptureEvent::Fragment(fragment) => self.buffer.push(fragment),
                other => debug!(event = ?other, "Discarding capture event after stop"),
            }
        }
    }

    /// Persist the buffer as one segment. Returns `true` if one was stored.
    ///
    /// On storage failure the fragments stay buffered for the next flush.
    fn flush(&mut self) -> bool {
        let RecordingState::Recording { format, .. } = self.recording else {
            return false;
        };
        let Some(segment) = self.buffer.assemble(format) else {
            return false;
        };

        let fragments = self.buffer.len();
        match self.store.put(&segment) {
            Ok(()) => {
                self.buffer.clear();
                self.refresh_pending();
                info!(
                    segment_id = %segment.id,
                    fragments,
                    bytes = segment.len(),
                    "Buffer flushed"
                );
                self.diagnostics.push(
                    DiagnosticLevel::Info,
                    format!("Saved {} fragments as segment {}", fragments, segment.id),
                );
                true
            }
            Err(error) => {
                self.pending_segments = None;
                self.report_error("Could not save recording locally", &error);
                false
            }
        }
    }

    fn begin_upload_pass(&mut self) -> bool {
        if self.in_flight.is_some() {
            return false;
        }

        match self.store.count() {
            Ok(0) => {
                self.pending_segments = Some(0);
                debug!("Nothing stored, no upload pass needed");
                return false;
            }
            Ok(count) => self.pending_segments = Some(count),
            Err(error) => {
                self.pending_segments = None;
                self.report_error("Could not read local storage", &error);
                return false;
            }
        }

        let store = Arc::clone(&self.store);
        let uploader = Arc::clone(&self.uploader);
        let session = self.session_id.clone();
        self.in_flight = Some(tokio::spawn(async move {
            run_upload_pass(store, uploader.as_ref(), &session).await
        }));

        self.note("Uploading...");
        true
    }

    fn finish_upload_pass(&mut self, report: PassReport) {
        if let Some(url) = report.last_url() {
            self.last_upload_url = Some(url.to_string());
        }

        self.refresh_pending();

        match &report.failure {
            None if report.uploaded.is_empty() => {
                self.note("Nothing to upload.");
            }
            None => {
                self.last_error = None;
                let uploaded = report.uploaded.len();
                if self.pending_segments == Some(0) {
                    self.note(format!(
                        "All {} chunks uploaded and local storage cleared.",
                        uploaded
                    ));
                } else {
                    self.note(format!("{} chunks uploaded.", uploaded));
                }
            }
            Some(failure) => {
                debug!(
                    segment_id = ?failure.segment_id,
                    uploaded = report.uploaded.len(),
                    listed = report.listed,
                    "Upload pass aborted"
                );
                self.report_error("Upload pass stopped", &failure.error);
            }
        }

        self.publish();
    }

    fn refresh_pending(&mut self) {
        self.pending_segments = match self.store.count() {
            Ok(count) => Some(count),
            Err(e) => {
                warn!(error = ?e, "Could not count stored segments");
                None
            }
        };
    }

    fn set_permission(&mut self, state: PermissionState) {
        if self.permission == state {
            return;
        }
        self.permission = state;
        if let Err(e) = self.permissions.save(state) {
            warn!(error = ?e, "Failed to persist permission state");
            self.diagnostics.push(
                DiagnosticLevel::Warn,
                format!("Could not remember permission: {}", e.reason()),
            );
        }
    }

    fn note(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!(status = %message, "Status");
        self.diagnostics.push(DiagnosticLevel::Info, message.clone());
        self.message = message;
    }

    fn report_error(&mut self, context: &str, error: &RelayError) {
        let text = error.status_text();
        error!(context, error = ?error, "Coordinator error");
        self.diagnostics
            .push(DiagnosticLevel::Error, format!("{}: {}", context, text));
        self.message = text.clone();
        self.last_error = Some(text);
    }

    fn snapshot(&self) -> CoordinatorStatus {
        CoordinatorStatus {
            recording: self.recording.is_recording(),
            uploading: self.in_flight.is_some(),
            permission: self.permission,
            pending_segments: self.pending_segments,
            buffered_fragments: self.buffer.len(),
            message: self.message.clone(),
            last_error: self.last_error.clone(),
            last_upload_url: self.last_upload_url.clone(),
        }
    }

    /// Notify observers only when the snapshot actually changed.
    fn publish(&self) {
        let next = self.snapshot();
        self.status_tx.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            warn!("Coordinator dropped with an upload pass in flight");
            drop(handle);
        }
    }
}

async fn join_in_flight(slot: &mut Option<JoinHandle<PassReport>>) -> PassReport {
    let Some(handle) = slot.as_mut() else {
        return std::future::pending().await;
    };
    let joined = handle.await;
    *slot = None;
    report_from_join(joined)
}

fn report_from_join(joined: Result<PassReport, JoinError>) -> PassReport {
    joined.unwrap_or_else(|e| {
        PassReport::aborted(RelayError::upload(format!("Upload task failed: {}", e)))
    })
}
