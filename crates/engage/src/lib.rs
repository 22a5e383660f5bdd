//! Proactive chat engagement.
//!
//! This crate wires the conversation together:
//!
//! - [`SessionManager`] - Stable session identity and visitor flags in client storage
//! - [`FollowupScheduler`] - State machine deciding when to send unsolicited messages
//! - [`SectionTrigger`] / [`TypingTracker`] - Section-change and typing signals
//! - [`TimerSlot`] - Single-slot timers (at most one pending callback each)
//! - [`ChatWidget`] - The conversation itself, rendered through a [`TranscriptRenderer`]
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use engage::{ChatWidget, LoggingRenderer, MemoryStore, WidgetConfig};
//! # use engage::ChatBackend;
//! # async fn run(backend: Arc<dyn ChatBackend>) -> Result<(), engage::EngageError> {
//! let config = WidgetConfig::builder()
//!     .page_url("https://example.com/pricing")
//!     .build();
//! let widget = ChatWidget::new(
//!     config,
//!     backend,
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(LoggingRenderer),
//! );
//!
//! widget.mount().await?;
//! widget.send_message("How much does it cost?").await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod pacing;
pub mod reply;
pub mod scheduler;
pub mod section;
pub mod session;
pub mod timer;
pub mod typing;
pub mod widget;

pub use config::{WidgetConfig, WidgetConfigBuilder};
pub use pacing::secondary_delay;
pub use reply::{assemble_reply, hydrate_message, AssembledReply, VisitorProfile};
pub use scheduler::{
    FollowupScheduler, SchedulerCommand, SchedulerEvent, SchedulerState, SchedulerTimings,
    Transition,
};
pub use section::SectionTrigger;
pub use session::SessionManager;
pub use timer::TimerSlot;
pub use typing::TypingTracker;
pub use widget::{ChatWidget, WidgetStatus, SEND_FAILED_MESSAGE};

// Re-export the shared vocabulary so hosts need only this crate.
pub use engage_core::{
    ChatBackend, ChatMessage, EngageError, KeyValueStore, LoggingRenderer, MemoryStore,
    NoOpRenderer, TranscriptRenderer,
};
pub use page_context::PageSnapshot;
