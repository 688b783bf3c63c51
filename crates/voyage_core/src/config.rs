use std::time::Duration;

/// Maximum number of fields a game state may hold.
pub const DEFAULT_MAX_CONTEXT_FIELDS: usize = 16;
/// Upper bound on a single generation-service call.
pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_GENERATION_ENDPOINT: &str = "http://127.0.0.1:8011";
/// Number of most recent steps folded into the history summary.
pub const DEFAULT_HISTORY_WINDOW: usize = 5;
/// Sessions idle for longer than this are reaped.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Settings consumed by the game core. Every value is supplied by the caller;
/// [`Default`] only fills in the public constants above.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoreConfig {
    pub max_context_fields: usize,
    pub generation_timeout: Duration,
    pub generation_endpoint: String,
    pub history_window: usize,
    pub session_ttl: Duration,
    /// Optional model override forwarded to the generation service.
    pub model: Option<String>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            max_context_fields: DEFAULT_MAX_CONTEXT_FIELDS,
            generation_timeout: DEFAULT_GENERATION_TIMEOUT,
            generation_endpoint: DEFAULT_GENERATION_ENDPOINT.to_string(),
            history_window: DEFAULT_HISTORY_WINDOW,
            session_ttl: DEFAULT_SESSION_TTL,
            model: None,
        }
    }
}
