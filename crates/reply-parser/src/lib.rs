//! Normalization and repair of semi-structured chat backend replies.
//!
//! The chat backend answers with whatever its language model produced: a
//! clean `{mainText, buttons, emailPrompt}` object, a string that is almost
//! JSON, prose with a JSON object buried in it, or plain text with a bullet
//! list. This crate turns all of those into one [`ParsedReply`] and decides
//! which quick replies may be shown.
//!
//! # Pipeline
//!
//! ```text
//! raw answer (serde_json::Value)
//!          ↓
//! ┌──────────────────────────────────────────────┐
//! │ classify → ReplyShape                         │
//! │   Structured | Embedded | Textual | Plain     │
//! └──────────────────────────────────────────────┘
//!          ↓
//! ParsedReply { main_text, buttons, email_prompt }
//!          ↓
//! resolve_buttons (explicit → extracted → defaults, behind OptionsGate)
//! ```
//!
//! # Example
//!
//! ```rust
//! use reply_parser::normalize_reply;
//! use serde_json::json;
//!
//! let raw = json!(r#"Here is info {"buttons": ["A","B"], "emailPrompt": "give email"} trailing"#);
//! let reply = normalize_reply(&raw);
//!
//! assert_eq!(reply.buttons, vec!["A", "B"]);
//! assert_eq!(reply.email_prompt, "give email");
//! assert!(reply.main_text.contains("Here is info"));
//! assert!(!reply.main_text.contains('{'));
//! ```

mod extract;
mod gate;
mod json;
mod normalize;
mod text;

pub use extract::{default_buttons, extract_buttons, filter_discussed, MAX_BUTTONS};
pub use gate::{is_bant_question, resolve_buttons, OptionsGate, CONFIDENCE_THRESHOLD};
pub use normalize::{classify, normalize_reply, ParsedReply, ReplyShape, OPTIONS_PLACEHOLDER};
pub use text::{decode_entities, normalize_text, sanitize_label, sanitize_labels, strip_tags};
