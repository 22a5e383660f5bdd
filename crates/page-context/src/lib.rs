//! Detection of the most visible, unobstructed content section of a page.
//!
//! The host (browser bridge, headless renderer, test) captures a
//! [`PageSnapshot`] of element geometry relative to the viewport. The
//! detector picks the content region that occupies the most of the part of
//! the viewport not covered by fixed or sticky overlays, and returns a short
//! excerpt of its text for use as conversation context.
//!
//! # Example
//!
//! ```rust
//! use page_context::{ElementSnapshot, PageSnapshot, Rect, Viewport, visible_section_context};
//!
//! let snapshot = PageSnapshot::new(Viewport::new(1280.0, 800.0))
//!     .with_element(
//!         ElementSnapshot::new("section", Rect::new(0.0, 0.0, 1280.0, 700.0))
//!             .with_text("Pricing plans for teams of every size"),
//!     );
//!
//! assert_eq!(visible_section_context(&snapshot), "Pricing plans for teams of every size");
//! ```

mod detector;
mod snapshot;

pub use detector::{
    visible_section_context, DetectorStats, SectionDetector, CHILD_TEXT_BUDGET, MAX_CONTEXT_CHARS,
    MIN_CANDIDATE_CHARS,
};
pub use snapshot::{ElementSnapshot, PageSnapshot, Position, Rect, Viewport};
