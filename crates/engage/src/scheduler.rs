//! Proactive follow-up scheduler.
//!
//! A pure state machine: it never sleeps, spawns or talks to the backend.
//! Every event yields a [`Transition`] carrying the commands the caller must
//! carry out (send a request, arm or cancel the follow-up timer). Because the
//! machine only ever asks for one timer and every arm replaces the previous
//! one, at most one follow-up timer can be live.

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::config::WidgetConfig;

/// Where the scheduler is in the proactive cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulerState {
    /// Nothing sent, nothing pending.
    #[default]
    Idle,
    /// A proactive, follow-up or visitor request is in flight.
    Requesting,
    /// The follow-up timer is running.
    Armed,
    /// The visitor is active or the follow-up budget is spent.
    Suppressed,
}

/// Inputs to the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerEvent {
    /// The widget mounted.
    Mount {
        proactive_enabled: bool,
        greeted: bool,
        has_history: bool,
    },
    /// A request finished with a reply.
    ResponseReceived,
    /// A request failed; treated like a reply for scheduling.
    RequestFailed,
    /// The visitor typed, scrolled or otherwise interacted.
    UserActivity,
    /// The visitor sent a message.
    UserMessageSent,
    /// The follow-up timer elapsed.
    TimerFired { typing: bool },
    /// The tab became visible again.
    TabShown,
    /// The session was reset.
    Reset,
}

/// Work the caller must perform after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerCommand {
    SendProactive,
    /// Send follow-up number `count` (zero-based).
    SendFollowup { count: u32 },
    /// Arm the follow-up timer, replacing any armed one.
    ArmTimer(Duration),
    CancelTimer,
}

/// Result of handling one event.
#[derive(Debug, Clone)]
pub struct Transition {
    pub from: SchedulerState,
    pub to: SchedulerState,
    pub event: SchedulerEvent,
    pub commands: Vec<SchedulerCommand>,
    pub changed: bool,
}

/// Delays and limits the scheduler works with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerTimings {
    pub followup_delay: Duration,
    pub return_delay: Duration,
    pub suppression_buffer: Duration,
    pub max_followups: u32,
}

impl Default for SchedulerTimings {
    fn default() -> Self {
        Self::from(&WidgetConfig::default())
    }
}

impl From<&WidgetConfig> for SchedulerTimings {
    fn from(config: &WidgetConfig) -> Self {
        Self {
            followup_delay: config.followup_delay,
            return_delay: config.return_delay,
            suppression_buffer: config.suppression_buffer,
            max_followups: config.max_followups,
        }
    }
}

/// State machine deciding when to send unsolicited assistant messages.
#[derive(Debug, Clone)]
pub struct FollowupScheduler {
    state: SchedulerState,
    timings: SchedulerTimings,
    proactive_enabled: bool,
    followup_count: u32,
    last_action: Option<Instant>,
    return_pending: bool,
    history: Vec<Transition>,
    max_history: usize,
}

impl Default for FollowupScheduler {
    fn default() -> Self {
        Self::new(SchedulerTimings::default())
    }
}

impl FollowupScheduler {
    pub fn new(timings: SchedulerTimings) -> Self {
        Self {
            state: SchedulerState::Idle,
            timings,
            proactive_enabled: true,
            followup_count: 0,
            last_action: None,
            return_pending: false,
            history: Vec::new(),
            max_history: 50,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Follow-ups sent since the last visitor message or reset.
    pub fn followup_count(&self) -> u32 {
        self.followup_count
    }

    pub fn timings(&self) -> &SchedulerTimings {
        &self.timings
    }

    pub fn last_action(&self) -> Option<Instant> {
        self.last_action
    }

    /// Recent transitions, oldest first.
    pub fn history(&self) -> &[Transition] {
        &self.history
    }

    /// Handle an event observed at `now`.
    pub fn handle_event(&mut self, event: SchedulerEvent, now: Instant) -> Transition {
        let from = self.state;
        let (to, commands) = self.compute_next(&event, now);
        self.state = to;

        let transition = Transition {
            from,
            to,
            event,
            commands,
            changed: from != to,
        };

        if transition.changed || !transition.commands.is_empty() {
            debug!(
                from = ?transition.from,
                to = ?transition.to,
                event = ?transition.event,
                commands = ?transition.commands,
                "SCHEDULER_TRANSITION"
            );
        }

        self.history.push(transition.clone());
        if self.history.len() > self.max_history {
            self.history.remove(0);
        }

        transition
    }

    fn compute_next(
        &mut self,
        event: &SchedulerEvent,
        now: Instant,
    ) -> (SchedulerState, Vec<SchedulerCommand>) {
        use SchedulerCommand::*;
        use SchedulerEvent::*;
        use SchedulerState::*;

        match (self.state, event) {
            (_, Reset) => {
                self.followup_count = 0;
                self.last_action = None;
                self.return_pending = false;
                (Idle, vec![CancelTimer])
            }

            (_, UserMessageSent) => {
                self.followup_count = 0;
                self.last_action = Some(now);
                self.return_pending = false;
                (Requesting, vec![CancelTimer])
            }

            (
                Idle,
                Mount {
                    proactive_enabled,
                    greeted,
                    has_history,
                },
            ) => {
                self.proactive_enabled = *proactive_enabled;
                if *proactive_enabled && (!*greeted || *has_history) {
                    (Requesting, vec![SendProactive])
                } else {
                    (Idle, vec![])
                }
            }

            (Requesting, ResponseReceived | RequestFailed) => {
                self.last_action = Some(now);
                let returning = std::mem::take(&mut self.return_pending);

                if !self.proactive_enabled || self.followup_count >= self.timings.max_followups {
                    (Suppressed, vec![])
                } else if returning {
                    (Armed, vec![ArmTimer(self.timings.return_delay)])
                } else {
                    (Armed, vec![ArmTimer(self.timings.followup_delay)])
                }
            }

            (Requesting, TabShown) => {
                self.return_pending = true;
                (Requesting, vec![])
            }

            (Armed, UserActivity) => {
                self.last_action = Some(now);
                (Suppressed, vec![CancelTimer])
            }

            (Armed, TimerFired { typing }) => {
                if self.followup_eligible(*typing, now) {
                    let count = self.followup_count;
                    self.followup_count += 1;
                    (Requesting, vec![SendFollowup { count }])
                } else {
                    (Armed, vec![])
                }
            }

            (Armed, TabShown) => (Armed, vec![ArmTimer(self.timings.return_delay)]),

            (state, UserActivity) => {
                self.last_action = Some(now);
                (state, vec![])
            }

            // Stale timers, repeated mounts and replies arriving outside a
            // request leave the machine where it is.
            (state, _) => (state, vec![]),
        }
    }

    fn followup_eligible(&self, typing: bool, now: Instant) -> bool {
        if typing || self.followup_count >= self.timings.max_followups {
            return false;
        }

        let buffer = if self.followup_count == 0 {
            Duration::ZERO
        } else {
            self.timings.suppression_buffer
        };
        let elapsed = self
            .last_action
            .map(|at| now.saturating_duration_since(at))
            .unwrap_or(Duration::MAX);

        elapsed >= buffer
    }
}
