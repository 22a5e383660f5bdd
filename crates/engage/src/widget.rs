//! The chat widget: conversation state wired to the backend and scheduler.
//!
//! `ChatWidget` owns the transcript and drives the follow-up scheduler. All
//! mutable state sits behind one async mutex. The lock is held while the
//! renderer is notified (so appends render in transcript order) but never
//! across a backend call.
//!
//! Background requests (proactive greetings, follow-ups and lead questions)
//! carry a cancellation token. A visitor message cancels it, so a background
//! reply that arrives late is dropped instead of being appended after the
//! visitor's message. Reset cancels the whole conversation, including a
//! direct send still in flight.

use std::sync::Arc;

use chrono::Utc;
use engage_core::{
    ChatBackend, ChatMessage, ChatReply, ChatRequest, ClearHistoryRequest, EngageError,
    HistoryQuery, HistoryResponse, KeyValueStore, NudgeEvent, Transcript, TranscriptRenderer,
    MESSAGE_TYPE_BUTTON, MESSAGE_TYPE_TEXT,
};
use page_context::{DetectorStats, PageSnapshot, SectionDetector};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::WidgetConfig;
use crate::pacing::secondary_delay;
use crate::reply::{assemble_reply, hydrate_message, VisitorProfile};
use crate::scheduler::{
    FollowupScheduler, SchedulerCommand, SchedulerEvent, SchedulerState, SchedulerTimings,
};
use crate::section::SectionTrigger;
use crate::session::SessionManager;
use crate::timer::TimerSlot;
use crate::typing::TypingTracker;

/// Assistant message appended when a visitor's message could not be answered.
pub const SEND_FAILED_MESSAGE: &str = "Error: Could not get answer.";

/// Kinds of request sent without a visitor message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BackgroundTurn {
    Proactive,
    Followup,
    LeadQuestion,
}

impl BackgroundTurn {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Proactive => "proactive",
            Self::Followup => "followup",
            Self::LeadQuestion => "lead_question",
        }
    }
}

/// Snapshot of the widget's scheduling state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidgetStatus {
    pub scheduler: SchedulerState,
    pub followup_count: u32,
    pub followup_timer_armed: bool,
    pub section_timer_armed: bool,
    pub secondary_timer_armed: bool,
    pub messages: usize,
    pub loading: bool,
    pub mounted: bool,
}

impl WidgetStatus {
    /// Whether any timer that could append a message is pending.
    pub fn any_timer_armed(&self) -> bool {
        self.followup_timer_armed || self.section_timer_armed || self.secondary_timer_armed
    }
}

struct WidgetState {
    session_id: String,
    transcript: Transcript,
    scheduler: FollowupScheduler,
    section: SectionTrigger,
    typing: TypingTracker,
    detector: SectionDetector,
    followup_timer: TimerSlot,
    section_timer: TimerSlot,
    scroll_timer: TimerSlot,
    secondary_timer: TimerSlot,
    /// Cancelled by reset and shutdown.
    conversation: CancellationToken,
    /// Child of `conversation`; also cancelled by every visitor message.
    background: CancellationToken,
    profile: VisitorProfile,
    page_summary: Option<String>,
    page_context: String,
    visited_pages: Vec<String>,
    greeted: bool,
    mounted: bool,
    loading: bool,
    lead_in_flight: bool,
    last_activity: Instant,
}

impl WidgetState {
    fn cancel_timers(&mut self) {
        self.followup_timer.cancel();
        self.section_timer.cancel();
        self.scroll_timer.cancel();
        self.secondary_timer.cancel();
    }
}

struct WidgetInner {
    config: WidgetConfig,
    backend: Arc<dyn ChatBackend>,
    session: SessionManager,
    renderer: Arc<dyn TranscriptRenderer>,
    state: Mutex<WidgetState>,
    shutdown: CancellationToken,
}

/// A headless chat widget.
///
/// Cloning is cheap; clones share the same conversation.
#[derive(Clone)]
pub struct ChatWidget {
    inner: Arc<WidgetInner>,
}

impl ChatWidget {
    pub fn new(
        config: WidgetConfig,
        backend: Arc<dyn ChatBackend>,
        store: Arc<dyn KeyValueStore>,
        renderer: Arc<dyn TranscriptRenderer>,
    ) -> Self {
        let shutdown = CancellationToken::new();
        let conversation = shutdown.child_token();
        let background = conversation.child_token();

        let state = WidgetState {
            session_id: String::new(),
            transcript: Transcript::new(),
            scheduler: FollowupScheduler::new(SchedulerTimings::from(&config)),
            section: SectionTrigger::new(),
            typing: TypingTracker::new(config.typing_idle),
            detector: SectionDetector::new(),
            followup_timer: TimerSlot::new("followup"),
            section_timer: TimerSlot::new("section"),
            scroll_timer: TimerSlot::new("scroll"),
            secondary_timer: TimerSlot::new("secondary"),
            conversation,
            background,
            profile: VisitorProfile::default(),
            page_summary: None,
            page_context: String::new(),
            visited_pages: Vec::new(),
            greeted: false,
            mounted: false,
            loading: false,
            lead_in_flight: false,
            last_activity: Instant::now(),
        };

        Self {
            inner: Arc::new(WidgetInner {
                config,
                backend,
                session: SessionManager::new(store),
                renderer,
                state: Mutex::new(state),
                shutdown,
            }),
        }
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.inner.config
    }

    /// Resolve the session, load history (or seed messages) and let the
    /// scheduler decide whether to greet.
    pub async fn mount(&self) -> Result<(), EngageError> {
        let inner = &self.inner;
        inner.ensure_live()?;

        let session_id = inner.session.session_id().await;
        let visited_pages = inner.session.record_visit(&inner.config.page_url).await;
        let greeted = inner.session.has_been_greeted().await;

        let conversation = {
            let mut state = inner.state.lock().await;
            if state.mounted {
                debug!("Widget already mounted");
                return Ok(());
            }
            state.mounted = true;
            state.session_id = session_id.clone();
            state.visited_pages = visited_pages;
            state.greeted = greeted;

            if !inner.config.seed_messages.is_empty() {
                for seed in &inner.config.seed_messages {
                    inner.append(&mut state, ChatMessage::assistant(seed.clone())).await;
                }
                let event = SchedulerEvent::Mount {
                    proactive_enabled: !inner.config.disable_proactive,
                    greeted,
                    has_history: true,
                };
                inner.drive(&mut state, event, Instant::now());
                info!(
                    session_id = %session_id,
                    seeds = inner.config.seed_messages.len(),
                    greeted,
                    "WIDGET_MOUNTED_WITH_SEEDS"
                );
                return Ok(());
            }

            state.conversation.clone()
        };

        let query = HistoryQuery::new(session_id.clone(), inner.config.page_url.clone())
            .with_admin_id(inner.config.admin_id.clone());
        let history = match inner.backend.fetch_history(&query).await {
            Ok(history) => history,
            Err(e) => {
                warn!(error = %e, "HISTORY_FETCH_FAILED");
                HistoryResponse::default()
            }
        };

        let mut state = inner.state.lock().await;
        if conversation.is_cancelled() {
            debug!("Mount superseded while loading history");
            return Ok(());
        }

        for wire in &history.history {
            inner.append(&mut state, hydrate_message(wire)).await;
        }
        state.page_summary = history.page_summary;

        let event = SchedulerEvent::Mount {
            proactive_enabled: !inner.config.disable_proactive,
            greeted,
            has_history: !history.history.is_empty(),
        };
        inner.drive(&mut state, event, Instant::now());

        info!(
            session_id = %session_id,
            history = history.history.len(),
            greeted,
            backend = inner.backend.name(),
            "WIDGET_MOUNTED"
        );
        Ok(())
    }

    /// Send a visitor message and append the reply.
    ///
    /// Blank input is ignored. A backend failure appends
    /// [`SEND_FAILED_MESSAGE`] instead of returning an error.
    pub async fn send_message(&self, text: &str) -> Result<(), EngageError> {
        self.send_typed(text, MESSAGE_TYPE_TEXT).await
    }

    async fn send_typed(&self, text: &str, message_type: &str) -> Result<(), EngageError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }

        let inner = &self.inner;
        inner.ensure_live()?;

        let (request, conversation) = {
            let mut state = inner.state.lock().await;
            let now = Instant::now();

            state.background.cancel();
            state.background = state.conversation.child_token();
            state.lead_in_flight = false;
            state.typing.clear();
            state.last_activity = now;

            let request = inner
                .base_request(&state)
                .question(text)
                .with_message_type(message_type)
                .with_visited_pages(state.visited_pages.clone())
                .with_page_context(state.page_context.clone());

            inner.append(&mut state, ChatMessage::user(text)).await;
            inner.drive(&mut state, SchedulerEvent::UserMessageSent, now);
            inner.set_loading(&mut state, true).await;

            (request, state.conversation.clone())
        };

        let result = inner.backend.send(&request).await;

        let mut state = inner.state.lock().await;
        if conversation.is_cancelled() {
            debug!("stale response dropped");
            return Ok(());
        }
        inner.set_loading(&mut state, false).await;

        let event = match result {
            Ok(reply) => {
                inner.append_reply(&mut state, reply).await;
                SchedulerEvent::ResponseReceived
            }
            Err(e) => {
                warn!(error = %e, "SEND_FAILED");
                inner
                    .append(&mut state, ChatMessage::assistant(SEND_FAILED_MESSAGE))
                    .await;
                SchedulerEvent::RequestFailed
            }
        };
        inner.drive(&mut state, event, Instant::now());
        Ok(())
    }

    /// Send an edited copy of the user message at `index` as a new message.
    ///
    /// The original message stays in the transcript.
    pub async fn edit_and_resend(&self, index: usize, text: &str) -> Result<(), EngageError> {
        {
            let state = self.inner.state.lock().await;
            match state.transcript.get(index) {
                Some(message) if message.is_user() => {}
                _ => return Err(EngageError::InvalidEdit(index)),
            }
        }
        self.send_message(text).await
    }

    /// Send a quick-reply label, recording the click with the backend.
    pub async fn click_button(&self, label: &str) -> Result<(), EngageError> {
        self.inner.ensure_live()?;

        let event = NudgeEvent {
            label: label.to_string(),
            context: self.inner.config.page_url.clone(),
            timestamp: Utc::now().to_rfc3339(),
        };
        let backend = self.inner.backend.clone();
        tokio::spawn(async move {
            if let Err(e) = backend.track_nudge(&event).await {
                warn!(label = %event.label, error = %e, "NUDGE_TRACK_FAILED");
            }
        });

        self.send_typed(label, MESSAGE_TYPE_BUTTON).await
    }

    /// The visitor edited the input box.
    pub async fn input_changed(&self, text: &str) {
        let mut state = self.inner.state.lock().await;
        let now = Instant::now();
        if state.typing.input_changed(text, now) {
            state.last_activity = now;
            self.inner.drive(&mut state, SchedulerEvent::UserActivity, now);
        }
    }

    /// The tab was hidden or shown.
    pub async fn tab_visibility_changed(&self, visible: bool) {
        if !visible {
            return;
        }
        let mut state = self.inner.state.lock().await;
        self.inner
            .drive(&mut state, SchedulerEvent::TabShown, Instant::now());
    }

    /// The page scrolled; recompute the visible section after the debounce.
    pub async fn on_scroll(&self, snapshot: PageSnapshot) {
        if self.inner.shutdown.is_cancelled() {
            return;
        }
        let weak = Arc::downgrade(&self.inner);
        let mut state = self.inner.state.lock().await;
        state
            .scroll_timer
            .arm(self.inner.config.scroll_debounce, move |generation| async move {
                if let Some(inner) = weak.upgrade() {
                    inner.recompute_section(snapshot, generation).await;
                }
            });
    }

    /// Forget the session and conversation.
    ///
    /// Server history for the old session is deleted (best effort) and the
    /// next proactive request clears history first. Call [`ChatWidget::mount`]
    /// again to start the new session.
    pub async fn reset(&self) -> Result<(), EngageError> {
        let inner = &self.inner;
        inner.ensure_live()?;

        let old_session = {
            let mut state = inner.state.lock().await;

            state.conversation.cancel();
            state.conversation = inner.shutdown.child_token();
            state.background = state.conversation.child_token();
            state.cancel_timers();

            state.transcript.clear();
            inner.renderer.cleared().await;
            inner.set_loading(&mut state, false).await;
            inner.drive(&mut state, SchedulerEvent::Reset, Instant::now());

            state.section.clear();
            state.typing.clear();
            state.profile = VisitorProfile::default();
            state.page_summary = None;
            state.visited_pages.clear();
            state.greeted = false;
            state.mounted = false;
            state.lead_in_flight = false;

            std::mem::take(&mut state.session_id)
        };

        if !old_session.is_empty() {
            let request = ClearHistoryRequest::new(old_session.clone());
            if let Err(e) = inner.backend.clear_history(&request).await {
                warn!(session_id = %old_session, error = %e, "CLEAR_HISTORY_FAILED");
            }
        }
        inner.session.reset().await;

        info!(session_id = %old_session, "WIDGET_RESET");
        Ok(())
    }

    /// Stop every timer and drop all pending and future work.
    pub async fn shutdown(&self) {
        self.inner.shutdown.cancel();
        let mut state = self.inner.state.lock().await;
        state.cancel_timers();
        info!("WIDGET_SHUTDOWN");
    }

    pub async fn transcript(&self) -> Vec<ChatMessage> {
        self.inner.state.lock().await.transcript.messages().to_vec()
    }

    /// Plain-text rendering of the conversation.
    pub async fn export_text(&self) -> String {
        self.inner.state.lock().await.transcript.export_text()
    }

    /// The current session id, empty before mount.
    pub async fn session_id(&self) -> String {
        self.inner.state.lock().await.session_id.clone()
    }

    pub async fn page_summary(&self) -> Option<String> {
        self.inner.state.lock().await.page_summary.clone()
    }

    /// The most recently detected visible section.
    pub async fn page_context(&self) -> String {
        self.inner.state.lock().await.page_context.clone()
    }

    pub async fn profile(&self) -> VisitorProfile {
        self.inner.state.lock().await.profile.clone()
    }

    pub async fn detector_stats(&self) -> DetectorStats {
        self.inner.state.lock().await.detector.stats()
    }

    pub async fn status(&self) -> WidgetStatus {
        let state = self.inner.state.lock().await;
        WidgetStatus {
            scheduler: state.scheduler.state(),
            followup_count: state.scheduler.followup_count(),
            followup_timer_armed: state.followup_timer.is_armed(),
            section_timer_armed: state.section_timer.is_armed(),
            secondary_timer_armed: state.secondary_timer.is_armed(),
            messages: state.transcript.len(),
            loading: state.loading,
            mounted: state.mounted,
        }
    }
}

impl WidgetInner {
    fn ensure_live(&self) -> Result<(), EngageError> {
        if self.shutdown.is_cancelled() {
            Err(EngageError::ShutDown)
        } else {
            Ok(())
        }
    }

    fn proactive_allowed(&self) -> bool {
        !self.config.disable_proactive
    }

    async fn append(&self, state: &mut WidgetState, message: ChatMessage) -> usize {
        let index = state.transcript.push(message.clone());
        self.renderer.message_appended(index, &message).await;
        index
    }

    async fn set_loading(&self, state: &mut WidgetState, loading: bool) {
        if state.loading != loading {
            state.loading = loading;
            self.renderer.loading_changed(loading).await;
        }
    }

    fn base_request(&self, state: &WidgetState) -> ChatRequest {
        ChatRequest::new(state.session_id.clone(), self.config.page_url.clone())
            .with_admin_id(self.config.admin_id.clone())
            .with_assistant_count(state.transcript.assistant_count())
    }

    /// Feed an event to the scheduler and carry out its commands.
    fn drive(self: &Arc<Self>, state: &mut WidgetState, event: SchedulerEvent, now: Instant) {
        let transition = state.scheduler.handle_event(event, now);

        for command in transition.commands {
            match command {
                SchedulerCommand::SendProactive => {
                    let request = self
                        .base_request(state)
                        .proactive(state.greeted)
                        .with_visited_pages(state.visited_pages.clone())
                        .with_page_context(state.page_context.clone());
                    self.spawn_turn(state, BackgroundTurn::Proactive, request);
                }
                SchedulerCommand::SendFollowup { count } => {
                    let inactive = now.saturating_duration_since(state.last_activity);
                    let request = self
                        .base_request(state)
                        .followup(count)
                        .with_inactivity(u64::try_from(inactive.as_millis()).unwrap_or(u64::MAX))
                        .with_visited_pages(state.visited_pages.clone())
                        .with_page_context(state.page_context.clone());
                    self.spawn_turn(state, BackgroundTurn::Followup, request);
                }
                SchedulerCommand::ArmTimer(delay) => {
                    let weak = Arc::downgrade(self);
                    state.followup_timer.arm(delay, move |generation| async move {
                        if let Some(inner) = weak.upgrade() {
                            inner.on_followup_timer(generation).await;
                        }
                    });
                }
                SchedulerCommand::CancelTimer => {
                    state.followup_timer.cancel();
                }
            }
        }
    }

    fn spawn_turn(self: &Arc<Self>, state: &WidgetState, turn: BackgroundTurn, request: ChatRequest) {
        let inner = self.clone();
        let token = state.background.clone();
        tokio::spawn(async move {
            inner.run_turn(turn, request, token).await;
        });
    }

    async fn run_turn(self: Arc<Self>, turn: BackgroundTurn, request: ChatRequest, token: CancellationToken) {
        if turn == BackgroundTurn::Proactive && self.session.take_clear_history_flag().await {
            let clear = ClearHistoryRequest::new(request.session_id.clone());
            match self.backend.clear_history(&clear).await {
                Ok(()) => debug!("Cleared history before proactive message"),
                Err(e) => warn!(error = %e, "CLEAR_HISTORY_FAILED"),
            }
        }

        debug!(turn = turn.as_str(), backend = self.backend.name(), "BACKGROUND_REQUEST");
        let result = tokio::select! {
            _ = token.cancelled() => {
                debug!(turn = turn.as_str(), "stale response dropped");
                return;
            }
            result = self.backend.send(&request) => result,
        };

        let mut state = self.state.lock().await;
        if token.is_cancelled() {
            debug!(turn = turn.as_str(), "stale response dropped");
            return;
        }
        if turn == BackgroundTurn::LeadQuestion {
            state.lead_in_flight = false;
        }

        let event = match result {
            Ok(reply) => {
                if turn == BackgroundTurn::Proactive {
                    self.session.mark_greeted().await;
                    state.greeted = true;
                }
                self.append_reply(&mut state, reply).await;
                SchedulerEvent::ResponseReceived
            }
            Err(e) => {
                warn!(turn = turn.as_str(), error = %e, "BACKGROUND_REQUEST_FAILED");
                SchedulerEvent::RequestFailed
            }
        };

        if turn != BackgroundTurn::LeadQuestion {
            self.drive(&mut state, event, Instant::now());
        }
    }

    async fn append_reply(self: &Arc<Self>, state: &mut WidgetState, reply: ChatReply) {
        let had_assistant = state.transcript.assistant_count() > 0;
        state.profile.absorb(&reply);
        let assembled = assemble_reply(&reply, &state.profile);
        let delay = secondary_delay(&assembled.primary.content);

        self.append(state, assembled.primary).await;

        let Some(secondary) = assembled.secondary else {
            return;
        };
        if !had_assistant {
            debug!("Dropping secondary message without an earlier assistant message");
            return;
        }

        let weak = Arc::downgrade(self);
        let token = state.conversation.clone();
        state.secondary_timer.arm(delay, move |generation| async move {
            if let Some(inner) = weak.upgrade() {
                inner.append_secondary(secondary, token, generation).await;
            }
        });
    }

    async fn append_secondary(
        self: Arc<Self>,
        message: ChatMessage,
        token: CancellationToken,
        generation: u64,
    ) {
        let mut state = self.state.lock().await;
        if token.is_cancelled() || !state.secondary_timer.is_current(generation) {
            debug!(timer = "secondary", "superseded timer ignored");
            return;
        }
        self.append(&mut state, message).await;
    }

    async fn on_followup_timer(self: Arc<Self>, generation: u64) {
        if self.shutdown.is_cancelled() {
            return;
        }
        let mut state = self.state.lock().await;
        if !state.followup_timer.is_current(generation) {
            debug!(timer = "followup", "superseded timer ignored");
            return;
        }
        let now = Instant::now();
        let typing = state.typing.is_typing(now);
        self.drive(&mut state, SchedulerEvent::TimerFired { typing }, now);
    }

    async fn recompute_section(self: Arc<Self>, snapshot: PageSnapshot, generation: u64) {
        if self.shutdown.is_cancelled() {
            return;
        }
        let mut state = self.state.lock().await;
        if !state.scroll_timer.is_current(generation) {
            debug!(timer = "scroll", "superseded timer ignored");
            return;
        }
        let context = state.detector.detect(&snapshot);
        if context.is_empty() {
            return;
        }
        state.page_context = context.clone();

        // Section changes count only once mounted and allowed to speak first.
        if !state.mounted || !self.proactive_allowed() {
            return;
        }
        if !state.section.observe(&context) {
            return;
        }

        let weak = Arc::downgrade(&self);
        state
            .section_timer
            .arm(self.config.section_delay, move |generation| async move {
                if let Some(inner) = weak.upgrade() {
                    inner.on_section_timer(context, generation).await;
                }
            });
    }

    async fn on_section_timer(self: Arc<Self>, context: String, generation: u64) {
        if self.shutdown.is_cancelled() {
            return;
        }
        let mut state = self.state.lock().await;
        if !state.section_timer.is_current(generation) {
            debug!(timer = "section", "superseded timer ignored");
            return;
        }
        let now = Instant::now();

        if !state.transcript.last_is_assistant() {
            debug!("Skipping lead question while the visitor has the last word");
            return;
        }
        if state.typing.is_typing(now) {
            debug!("Skipping lead question while the visitor is typing");
            return;
        }
        if state.lead_in_flight {
            return;
        }

        state.lead_in_flight = true;
        let request = self
            .base_request(&state)
            .lead_question(context, state.transcript.assistant_contents())
            .with_visited_pages(state.visited_pages.clone());
        self.spawn_turn(&state, BackgroundTurn::LeadQuestion, request);
    }
}
