//! Configuration for ChatWidget.

use std::env;
use std::time::Duration;

/// Default delay before an unanswered assistant message gets a follow-up.
pub const DEFAULT_FOLLOWUP_DELAY: Duration = Duration::from_secs(30);

/// Default follow-up delay after the tab becomes visible again.
pub const DEFAULT_RETURN_DELAY: Duration = Duration::from_secs(6);

/// Default dwell time on a newly visible section before a lead question.
pub const DEFAULT_SECTION_DELAY: Duration = Duration::from_secs(10);

/// Default time without keystrokes after which the visitor stops typing.
pub const DEFAULT_TYPING_IDLE: Duration = Duration::from_secs(3);

/// Default minimum quiet time between consecutive follow-ups.
pub const DEFAULT_SUPPRESSION_BUFFER: Duration = Duration::from_secs(25);

/// Default debounce for section recomputation on scroll.
pub const DEFAULT_SCROLL_DEBOUNCE: Duration = Duration::from_millis(200);

/// Default cap on automatic follow-ups per unanswered stretch.
pub const DEFAULT_MAX_FOLLOWUPS: u32 = 3;

/// Configuration for ChatWidget.
#[derive(Debug, Clone)]
pub struct WidgetConfig {
    /// URL of the page the widget is mounted on.
    pub page_url: String,

    /// Optional tenant/admin identifier forwarded to the backend.
    pub admin_id: Option<String>,

    /// Never send proactive greetings or follow-ups.
    pub disable_proactive: bool,

    /// Assistant messages shown on mount instead of loading history.
    pub seed_messages: Vec<String>,

    pub followup_delay: Duration,

    pub return_delay: Duration,

    pub section_delay: Duration,

    pub typing_idle: Duration,

    pub suppression_buffer: Duration,

    pub max_followups: u32,

    pub scroll_debounce: Duration,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            page_url: "/".to_string(),
            admin_id: None,
            disable_proactive: false,
            seed_messages: Vec::new(),
            followup_delay: DEFAULT_FOLLOWUP_DELAY,
            return_delay: DEFAULT_RETURN_DELAY,
            section_delay: DEFAULT_SECTION_DELAY,
            typing_idle: DEFAULT_TYPING_IDLE,
            suppression_buffer: DEFAULT_SUPPRESSION_BUFFER,
            max_followups: DEFAULT_MAX_FOLLOWUPS,
            scroll_debounce: DEFAULT_SCROLL_DEBOUNCE,
        }
    }
}

/// Parse a seconds value. Negative, non-finite and out-of-range values are rejected.
fn parse_secs(value: &str) -> Option<Duration> {
    let secs = value.trim().parse::<f64>().ok()?;
    Duration::try_from_secs_f64(secs).ok()
}

fn env_secs(name: &str) -> Option<Duration> {
    env::var(name).ok().and_then(|v| parse_secs(&v))
}

impl WidgetConfig {
    /// Create configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `ENGAGE_PAGE_URL` - Page URL (default: /)
    /// - `ENGAGE_ADMIN_ID` - Admin identifier (default: none)
    /// - `ENGAGE_DISABLE_PROACTIVE` - Disable proactive messages (default: false)
    /// - `ENGAGE_SEED_MESSAGES` - `|`-separated seed assistant messages (default: none)
    /// - `ENGAGE_FOLLOWUP_DELAY_SECS` - Follow-up delay (default: 30)
    /// - `ENGAGE_RETURN_DELAY_SECS` - Tab-return follow-up delay (default: 6)
    /// - `ENGAGE_SECTION_DELAY_SECS` - Section dwell before a lead question (default: 10)
    /// - `ENGAGE_TYPING_IDLE_SECS` - Typing stop debounce (default: 3)
    /// - `ENGAGE_MAX_FOLLOWUPS` - Follow-up cap (default: 3)
    ///
    /// Unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let page_url = env::var("ENGAGE_PAGE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.page_url);

        let admin_id = env::var("ENGAGE_ADMIN_ID")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let disable_proactive = env::var("ENGAGE_DISABLE_PROACTIVE")
            .ok()
            .map(|v| v.to_lowercase() == "true" || v == "1")
            .unwrap_or(false);

        let seed_messages = env::var("ENGAGE_SEED_MESSAGES")
            .ok()
            .map(|v| {
                v.split('|')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let max_followups = env::var("ENGAGE_MAX_FOLLOWUPS")
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_MAX_FOLLOWUPS);

        Self {
            page_url,
            admin_id,
            disable_proactive,
            seed_messages,
            followup_delay: env_secs("ENGAGE_FOLLOWUP_DELAY_SECS").unwrap_or(DEFAULT_FOLLOWUP_DELAY),
            return_delay: env_secs("ENGAGE_RETURN_DELAY_SECS").unwrap_or(DEFAULT_RETURN_DELAY),
            section_delay: env_secs("ENGAGE_SECTION_DELAY_SECS").unwrap_or(DEFAULT_SECTION_DELAY),
            typing_idle: env_secs("ENGAGE_TYPING_IDLE_SECS").unwrap_or(DEFAULT_TYPING_IDLE),
            max_followups,
            ..defaults
        }
    }

    /// Create a new config builder.
    pub fn builder() -> WidgetConfigBuilder {
        WidgetConfigBuilder::default()
    }
}

/// Builder for WidgetConfig.
#[derive(Debug, Default)]
pub struct WidgetConfigBuilder {
    config: WidgetConfig,
}

impl WidgetConfigBuilder {
    /// Set the page URL.
    pub fn page_url(mut self, url: impl Into<String>) -> Self {
        self.config.page_url = url.into();
        self
    }

    /// Set the admin identifier.
    pub fn admin_id(mut self, admin_id: impl Into<String>) -> Self {
        self.config.admin_id = Some(admin_id.into());
        self
    }

    /// Disable proactive greetings and follow-ups.
    pub fn disable_proactive(mut self, disable: bool) -> Self {
        self.config.disable_proactive = disable;
        self
    }

    /// Seed the transcript with assistant messages on mount.
    pub fn seed_messages<I, T>(mut self, messages: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.config.seed_messages = messages.into_iter().map(Into::into).collect();
        self
    }

    pub fn followup_delay(mut self, delay: Duration) -> Self {
        self.config.followup_delay = delay;
        self
    }

    pub fn return_delay(mut self, delay: Duration) -> Self {
        self.config.return_delay = delay;
        self
    }

    pub fn section_delay(mut self, delay: Duration) -> Self {
        self.config.section_delay = delay;
        self
    }

    pub fn typing_idle(mut self, idle: Duration) -> Self {
        self.config.typing_idle = idle;
        self
    }

    pub fn suppression_buffer(mut self, buffer: Duration) -> Self {
        self.config.suppression_buffer = buffer;
        self
    }

    pub fn max_followups(mut self, max: u32) -> Self {
        self.config.max_followups = max;
        self
    }

    pub fn scroll_debounce(mut self, debounce: Duration) -> Self {
        self.config.scroll_debounce = debounce;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> WidgetConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WidgetConfig::default();

        assert_eq!(config.page_url, "/");
        assert!(config.admin_id.is_none());
        assert!(!config.disable_proactive);
        assert!(config.seed_messages.is_empty());
        assert_eq!(config.followup_delay, Duration::from_secs(30));
        assert_eq!(config.return_delay, Duration::from_secs(6));
        assert_eq!(config.section_delay, Duration::from_secs(10));
        assert_eq!(config.typing_idle, Duration::from_secs(3));
        assert_eq!(config.suppression_buffer, Duration::from_secs(25));
        assert_eq!(config.max_followups, 3);
        assert_eq!(config.scroll_debounce, Duration::from_millis(200));
    }

    #[test]
    fn test_builder_all_options() {
        let config = WidgetConfig::builder()
            .page_url("https://example.com/pricing")
            .admin_id("admin-1")
            .disable_proactive(true)
            .seed_messages(["Q1", "Q2"])
            .followup_delay(Duration::from_secs(5))
            .return_delay(Duration::from_secs(1))
            .section_delay(Duration::from_secs(2))
            .typing_idle(Duration::from_secs(4))
            .suppression_buffer(Duration::from_secs(7))
            .max_followups(1)
            .scroll_debounce(Duration::from_millis(50))
            .build();

        assert_eq!(config.page_url, "https://example.com/pricing");
        assert_eq!(config.admin_id.as_deref(), Some("admin-1"));
        assert!(config.disable_proactive);
        assert_eq!(config.seed_messages, vec!["Q1", "Q2"]);
        assert_eq!(config.followup_delay, Duration::from_secs(5));
        assert_eq!(config.return_delay, Duration::from_secs(1));
        assert_eq!(config.section_delay, Duration::from_secs(2));
        assert_eq!(config.typing_idle, Duration::from_secs(4));
        assert_eq!(config.suppression_buffer, Duration::from_secs(7));
        assert_eq!(config.max_followups, 1);
        assert_eq!(config.scroll_debounce, Duration::from_millis(50));
    }

    #[test]
    fn test_parse_secs() {
        assert_eq!(parse_secs(" 2.5 "), Some(Duration::from_millis(2500)));
        assert_eq!(parse_secs("0"), Some(Duration::ZERO));
        assert_eq!(parse_secs("-1"), None);
        assert_eq!(parse_secs("NaN"), None);
        assert_eq!(parse_secs("inf"), None);
        assert_eq!(parse_secs("1e30"), None);
        assert_eq!(parse_secs("soon"), None);
    }

    #[test]
    fn test_from_env_oversized_delay_falls_back() {
        // Only this test touches this variable.
        env::set_var("ENGAGE_FOLLOWUP_DELAY_SECS", "1e30");
        let config = WidgetConfig::from_env();
        env::remove_var("ENGAGE_FOLLOWUP_DELAY_SECS");

        assert_eq!(config.followup_delay, DEFAULT_FOLLOWUP_DELAY);
    }
}
