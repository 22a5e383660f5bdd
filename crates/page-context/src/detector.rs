//! Visible-section scoring.

use std::time::{Duration, Instant};

use tracing::trace;

use crate::snapshot::{ElementSnapshot, PageSnapshot, Rect};

/// Maximum length, in characters, of the returned context.
pub const MAX_CONTEXT_CHARS: usize = 800;

/// Child text stops accumulating once this many characters are collected.
pub const CHILD_TEXT_BUDGET: usize = 1000;

/// Candidates with less text than this are ignored.
pub const MIN_CANDIDATE_CHARS: usize = 20;

/// Candidates taller than this many viewports are ignored.
const MAX_VIEWPORT_SPAN: f64 = 2.0;

/// Pixel slack when deciding whether an overlay touches a viewport edge.
const EDGE_TOLERANCE: f64 = 1.0;

const REGION_TAGS: &[&str] = &["section", "article"];
const FALLBACK_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6", "p", "div"];

/// The part of the viewport not covered by pinned overlays.
#[derive(Debug, Clone, Copy, PartialEq)]
struct VisibleBand {
    top: f64,
    bottom: f64,
}

impl VisibleBand {
    fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

fn visible_band(snapshot: &PageSnapshot) -> Option<VisibleBand> {
    let viewport = snapshot.viewport;
    let mut top_occlusion: f64 = 0.0;
    let mut bottom_occlusion: f64 = 0.0;

    let overlays = snapshot.all_elements().filter(|e| {
        e.position.is_pinned()
            && e.is_visible()
            && !e.rect.is_empty()
            && e.rect.height < viewport.height / 2.0
    });

    for overlay in overlays {
        let rect = overlay.rect;
        if rect.top <= EDGE_TOLERANCE && rect.bottom() > 0.0 {
            top_occlusion = top_occlusion.max(rect.bottom());
        } else if rect.bottom() >= viewport.height - EDGE_TOLERANCE && rect.top < viewport.height {
            bottom_occlusion = bottom_occlusion.max(viewport.height - rect.top);
        }
    }

    let band = VisibleBand {
        top: top_occlusion,
        bottom: viewport.height - bottom_occlusion,
    };
    (band.height() > 0.0).then_some(band)
}

fn has_tag(element: &ElementSnapshot, tags: &[&str]) -> bool {
    tags.iter().any(|t| element.tag.eq_ignore_ascii_case(t))
}

fn candidates(snapshot: &PageSnapshot) -> Vec<&ElementSnapshot> {
    let unpinned = || snapshot.all_elements().filter(|e| !e.position.is_pinned());

    let regions: Vec<_> = unpinned()
        .filter(|e| e.data_section || has_tag(e, REGION_TAGS))
        .collect();
    if !regions.is_empty() {
        return regions;
    }

    unpinned().filter(|e| has_tag(e, FALLBACK_TAGS)).collect()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

fn score(rect: &Rect, band: VisibleBand) -> f64 {
    let intersection = rect.vertical_overlap(band.top, band.bottom);
    if intersection <= 0.0 {
        return 0.0;
    }
    2.0 * (intersection / band.height()) + intersection / rect.height
}

fn best_candidate(snapshot: &PageSnapshot, band: VisibleBand) -> Option<&ElementSnapshot> {
    let max_height = snapshot.viewport.height * MAX_VIEWPORT_SPAN;
    let mut best: Option<(&ElementSnapshot, f64)> = None;

    for element in candidates(snapshot) {
        if !element.is_visible() || element.rect.is_empty() || element.rect.height > max_height {
            continue;
        }
        if element.text.trim().chars().count() < MIN_CANDIDATE_CHARS {
            continue;
        }

        let score = score(&element.rect, band);
        if score > 0.0 && best.map_or(true, |(_, s)| score > s) {
            best = Some((element, score));
        }
    }

    best.map(|(element, _)| element)
}

/// Text of the children actually on screen, so off-screen children do not bleed in.
fn visible_children_text(element: &ElementSnapshot, band: VisibleBand) -> String {
    let mut parts = Vec::new();
    let mut collected = 0;

    for child in &element.children {
        if collected >= CHILD_TEXT_BUDGET {
            break;
        }
        if !child.is_visible() || child.rect.vertical_overlap(band.top, band.bottom) <= 0.0 {
            continue;
        }

        let text = collapse_whitespace(&child.text);
        if text.is_empty() {
            continue;
        }
        collected += text.chars().count();
        parts.push(text);
    }

    parts.join(" ")
}

/// Up to [`MAX_CONTEXT_CHARS`] characters from the most visible content region.
///
/// Returns an empty string when the viewport has no size or overlays cover
/// it entirely. Falls back to the start of the body text when no region
/// qualifies.
pub fn visible_section_context(snapshot: &PageSnapshot) -> String {
    if snapshot.viewport.is_empty() {
        return String::new();
    }

    let Some(band) = visible_band(snapshot) else {
        return String::new();
    };

    let Some(winner) = best_candidate(snapshot, band) else {
        return truncate_chars(&collapse_whitespace(&snapshot.body_text), MAX_CONTEXT_CHARS);
    };

    let text = if winner.children.is_empty() {
        String::new()
    } else {
        visible_children_text(winner, band)
    };
    let text = if text.is_empty() {
        collapse_whitespace(&winner.text)
    } else {
        text
    };

    truncate_chars(&text, MAX_CONTEXT_CHARS)
}

/// Timing statistics for section detection.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DetectorStats {
    pub samples: u64,
    pub total: Duration,
    pub max: Duration,
}

impl DetectorStats {
    pub fn record(&mut self, elapsed: Duration) {
        self.samples += 1;
        self.total += elapsed;
        self.max = self.max.max(elapsed);
    }

    pub fn average(&self) -> Duration {
        match u32::try_from(self.samples) {
            Ok(0) => Duration::ZERO,
            Ok(n) => self.total / n,
            Err(_) => self.total.div_f64(self.samples as f64),
        }
    }
}

/// Section detection with self-monitoring of call duration.
#[derive(Debug, Default)]
pub struct SectionDetector {
    stats: DetectorStats,
}

impl SectionDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run [`visible_section_context`] and record how long it took.
    pub fn detect(&mut self, snapshot: &PageSnapshot) -> String {
        let start = Instant::now();
        let context = visible_section_context(snapshot);
        let elapsed = start.elapsed();
        self.stats.record(elapsed);

        trace!(
            elapsed_us = elapsed.as_micros() as u64,
            samples = self.stats.samples,
            chars = context.chars().count(),
            "SECTION_DETECTED"
        );
        context
    }

    pub fn stats(&self) -> DetectorStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{Position, Viewport};

    const LOREM: &str = "Appointment scheduling that runs itself";

    fn viewport() -> Viewport {
        Viewport::new(1200.0, 800.0)
    }

    fn section(top: f64, height: f64, text: &str) -> ElementSnapshot {
        ElementSnapshot::new("section", Rect::new(top, 0.0, 1200.0, height)).with_text(text)
    }

    #[test]
    fn test_zero_viewport() {
        let snapshot = PageSnapshot::new(Viewport::new(0.0, 800.0))
            .with_body_text("body text")
            .with_element(section(0.0, 400.0, LOREM));
        assert_eq!(visible_section_context(&snapshot), "");
    }

    #[test]
    fn test_most_visible_section_wins() {
        let snapshot = PageSnapshot::new(viewport())
            .with_element(section(-600.0, 700.0, "Hero section mostly scrolled away"))
            .with_element(section(100.0, 600.0, "Pricing plans for growing teams"))
            .with_element(section(700.0, 600.0, "Testimonials from happy customers"));

        assert_eq!(visible_section_context(&snapshot), "Pricing plans for growing teams");
    }

    #[test]
    fn test_fixed_header_occludes_top() {
        // Without the header the first section would win on coverage.
        let header = ElementSnapshot::new("header", Rect::new(0.0, 0.0, 1200.0, 300.0))
            .with_position(Position::Fixed)
            .with_text("Navigation bar with many links");
        let snapshot = PageSnapshot::new(viewport())
            .with_element(header)
            .with_element(section(0.0, 420.0, "Features overview for everyone"))
            .with_element(section(420.0, 380.0, "Integrations with your calendar"));

        assert_eq!(visible_section_context(&snapshot), "Integrations with your calendar");
    }

    #[test]
    fn test_overlay_classification() {
        let upper = section(0.0, 420.0, "Upper part of the page content");
        let lower = section(420.0, 380.0, "Lower part of the page content");

        // Touches neither viewport edge, so it does not occlude.
        let floating = ElementSnapshot::new("div", Rect::new(100.0, 0.0, 1200.0, 300.0))
            .with_position(Position::Fixed);
        let snapshot = PageSnapshot::new(viewport())
            .with_element(floating)
            .with_element(upper.clone())
            .with_element(lower.clone());
        assert_eq!(visible_section_context(&snapshot), "Upper part of the page content");

        // Half the viewport tall or more is not an overlay.
        let tall = ElementSnapshot::new("div", Rect::new(0.0, 0.0, 1200.0, 410.0))
            .with_position(Position::Fixed);
        let snapshot = PageSnapshot::new(viewport())
            .with_element(tall)
            .with_element(upper)
            .with_element(lower);
        assert_eq!(visible_section_context(&snapshot), "Upper part of the page content");
    }

    #[test]
    fn test_band_fully_occluded() {
        let top = ElementSnapshot::new("div", Rect::new(1.0, 0.0, 1200.0, 399.5))
            .with_position(Position::Fixed);
        let bottom = ElementSnapshot::new("div", Rect::new(399.5, 0.0, 1200.0, 399.5))
            .with_position(Position::Fixed);
        let snapshot = PageSnapshot::new(viewport())
            .with_body_text("body text that would otherwise be used")
            .with_element(top)
            .with_element(bottom)
            .with_element(section(0.0, 800.0, LOREM));

        assert_eq!(visible_section_context(&snapshot), "");
    }

    #[test]
    fn test_hidden_and_transparent_overlays_ignored() {
        let hidden = ElementSnapshot::new("div", Rect::new(0.0, 0.0, 1200.0, 300.0))
            .with_position(Position::Fixed)
            .hidden();
        let transparent = ElementSnapshot::new("div", Rect::new(0.0, 0.0, 1200.0, 300.0))
            .with_position(Position::Fixed)
            .with_opacity(0.0);
        let snapshot = PageSnapshot::new(viewport())
            .with_element(hidden)
            .with_element(transparent)
            .with_element(section(0.0, 420.0, "Features overview for everyone"))
            .with_element(section(420.0, 380.0, "Integrations with your calendar"));

        assert_eq!(visible_section_context(&snapshot), "Features overview for everyone");
    }

    #[test]
    fn test_short_and_tall_candidates_skipped() {
        let snapshot = PageSnapshot::new(viewport())
            .with_body_text("Fallback body text")
            .with_element(section(0.0, 800.0, "Too short"))
            .with_element(section(0.0, 1700.0, "This one is far too tall to count"));

        assert_eq!(visible_section_context(&snapshot), "Fallback body text");
    }

    #[test]
    fn test_fallback_selector_when_no_regions() {
        let snapshot = PageSnapshot::new(viewport())
            .with_element(
                ElementSnapshot::new("div", Rect::new(0.0, 0.0, 1200.0, 800.0))
                    .with_child(
                        ElementSnapshot::new("p", Rect::new(50.0, 0.0, 1200.0, 100.0))
                            .with_text("A paragraph about online payments"),
                    ),
            );

        // The outer div has no text of its own, so the paragraph wins.
        assert_eq!(visible_section_context(&snapshot), "A paragraph about online payments");
    }

    #[test]
    fn test_data_section_preferred_over_fallback() {
        let snapshot = PageSnapshot::new(viewport())
            .with_element(
                ElementSnapshot::new("p", Rect::new(0.0, 0.0, 1200.0, 790.0))
                    .with_text("A large paragraph filling the screen"),
            )
            .with_element(
                ElementSnapshot::new("div", Rect::new(600.0, 0.0, 1200.0, 100.0))
                    .data_section()
                    .with_text("Marked content region text"),
            );

        assert_eq!(visible_section_context(&snapshot), "Marked content region text");
    }

    #[test]
    fn test_visible_children_only() {
        let winner = section(0.0, 1200.0, "Heading Visible paragraph Offscreen paragraph")
            .with_child(
                ElementSnapshot::new("h2", Rect::new(10.0, 0.0, 1200.0, 40.0)).with_text("Heading"),
            )
            .with_child(
                ElementSnapshot::new("p", Rect::new(60.0, 0.0, 1200.0, 100.0))
                    .with_text("Visible   paragraph"),
            )
            .with_child(
                ElementSnapshot::new("p", Rect::new(900.0, 0.0, 1200.0, 100.0))
                    .with_text("Offscreen paragraph"),
            );
        let snapshot = PageSnapshot::new(viewport()).with_element(winner);

        assert_eq!(visible_section_context(&snapshot), "Heading Visible paragraph");
    }

    #[test]
    fn test_child_budget_and_truncation() {
        let mut winner = section(0.0, 800.0, &"x".repeat(5000));
        for i in 0..10 {
            winner = winner.with_child(
                ElementSnapshot::new("p", Rect::new(i as f64 * 70.0, 0.0, 1200.0, 60.0))
                    .with_text("y".repeat(300)),
            );
        }
        let snapshot = PageSnapshot::new(viewport()).with_element(winner);

        let context = visible_section_context(&snapshot);
        assert_eq!(context.chars().count(), MAX_CONTEXT_CHARS);
        assert!(context.starts_with('y'));
    }

    #[test]
    fn test_body_fallback_truncated() {
        let snapshot = PageSnapshot::new(viewport()).with_body_text("z".repeat(2000));
        assert_eq!(visible_section_context(&snapshot).len(), MAX_CONTEXT_CHARS);
    }

    #[test]
    fn test_result_never_exceeds_limit() {
        let long = "word ".repeat(400);
        let snapshot = PageSnapshot::new(viewport())
            .with_body_text(long.clone())
            .with_element(section(0.0, 800.0, &long));
        assert!(visible_section_context(&snapshot).chars().count() <= MAX_CONTEXT_CHARS);
    }

    #[test]
    fn test_detector_records_stats() {
        let mut detector = SectionDetector::new();
        let snapshot = PageSnapshot::new(viewport()).with_element(section(0.0, 500.0, LOREM));

        assert_eq!(detector.detect(&snapshot), LOREM);
        detector.detect(&snapshot);

        let stats = detector.stats();
        assert_eq!(stats.samples, 2);
        assert!(stats.max >= stats.average());
    }

    #[test]
    fn test_stats_average() {
        let mut stats = DetectorStats::default();
        assert_eq!(stats.average(), Duration::ZERO);
        stats.record(Duration::from_millis(2));
        stats.record(Duration::from_millis(4));
        assert_eq!(stats.average(), Duration::from_millis(3));
        assert_eq!(stats.max, Duration::from_millis(4));
    }
}
