//! Delay applied to secondary messages.

use std::time::Duration;

const MIN_READING_TIME: Duration = Duration::from_millis(4_000);
const MAX_READING_TIME: Duration = Duration::from_millis(20_000);
const PER_WORD: Duration = Duration::from_millis(350);
const SECONDARY_PAUSE: Duration = Duration::from_millis(120_000);

/// Whitespace-separated word count.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// How long to wait before appending a secondary message after `primary`.
///
/// Reading time for the primary (350ms per word, clamped to 4s..20s) plus a
/// fixed two-minute pause.
pub fn secondary_delay(primary: &str) -> Duration {
    let words = u32::try_from(word_count(primary)).unwrap_or(u32::MAX);
    let reading = PER_WORD
        .saturating_mul(words)
        .min(MAX_READING_TIME)
        .max(MIN_READING_TIME);
    reading + SECONDARY_PAUSE
}
