//! Client tuning knobs and socket endpoint derivation.

use shared::{SOCKET_PATH, SOCKET_PORT};
use std::time::Duration;

pub const DEFAULT_CAPTURE_PERIOD: Duration = Duration::from_millis(20);
pub const DEFAULT_LERP_STEPS: u32 = 5;
pub const DEFAULT_PING_PERIOD: Duration = Duration::from_secs(1);
pub const LEAVE_REASON: &str = "Player left the room";

/// Where the game socket lives: the page origin's host on a fixed port and path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub secure: bool,
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl Endpoint {
    pub fn new(secure: bool, host: impl Into<String>) -> Self {
        Self {
            secure,
            host: host.into(),
            port: SOCKET_PORT,
            path: SOCKET_PATH.to_string(),
        }
    }

    /// Derives the endpoint from an origin like `https://example.org:8080`.
    /// The origin's own port is discarded; an `https` origin selects `wss`.
    pub fn from_origin(origin: &str) -> Self {
        let (secure, rest) = if let Some(rest) = origin.strip_prefix("https://") {
            (true, rest)
        } else if let Some(rest) = origin.strip_prefix("http://") {
            (false, rest)
        } else {
            (false, origin)
        };

        let authority = rest
            .split(|c: char| matches!(c, '/' | '?' | '#'))
            .next()
            .unwrap_or_default();
        let host = strip_port(authority);

        Self::new(secure, host)
    }

    pub fn url(&self) -> String {
        let scheme = if self.secure { "wss://" } else { "ws://" };
        format!("{}{}:{}{}", scheme, self.host, self.port, self.path)
    }
}

fn strip_port(authority: &str) -> &str {
    if authority.starts_with('[') {
        // Bracketed IPv6 literal, keep the brackets.
        return match authority.find(']') {
            Some(end) => &authority[..=end],
            None => authority,
        };
    }

    match authority.rsplit_once(':') {
        Some((host, _port)) => host,
        None => authority,
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: Endpoint,
    /// Period of the input-capture loop.
    pub capture_period: Duration,
    /// Render ticks per capture tick; also the interpolation resolution.
    pub lerp_steps: u32,
    pub ping_period: Duration,
    /// Start with the numeric debug overlay visible.
    pub debug_overlay: bool,
}

impl ClientConfig {
    pub fn render_period(&self) -> Duration {
        self.capture_period / self.lerp_steps.max(1)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::new(false, "localhost"),
            capture_period: DEFAULT_CAPTURE_PERIOD,
            lerp_steps: DEFAULT_LERP_STEPS,
            ping_period: DEFAULT_PING_PERIOD,
            debug_overlay: false,
        }
    }
}
