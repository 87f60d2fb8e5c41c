use std::env;

/// Segment resolution strategy for media playlists.
///
/// The relay supports two ways of getting segment bytes to the player.
/// Exactly one is active per deployment.
#[derive(Clone, Debug, PartialEq)]
pub enum SegmentStrategy {
    /// Segment URIs in served media playlists point straight at the true
    /// origin; the relay never sees segment requests.
    Direct,
    /// Segment URIs keep routing through the relay, which answers each one
    /// with a 301 redirect to the origin. Media playlist responses are
    /// gzip-compressed in this mode.
    Redirect,
}

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub is_dev: bool,
    /// Segment resolution strategy: direct (default) or redirect
    pub segment_strategy: SegmentStrategy,
    /// Accept origins on private/reserved addresses (defaults to dev-mode value)
    pub allow_private_origins: bool,
}

impl Config {
    /// Load configuration from environment variables
    /// In DEV mode, provides sensible defaults. In PROD mode, PORT is required.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        // Check if running in dev mode
        let is_dev = env::var("DEV_MODE")
            .unwrap_or_else(|_| "false".to_string())
            .parse()
            .unwrap_or(false);

        // Port: required in prod, defaults to 8000 in dev
        let port = if is_dev {
            env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()?
        } else {
            env::var("PORT")
                .map_err(|_| "PORT is required in production")?
                .parse()?
        };

        // Segment strategy: direct (default) or redirect
        let segment_strategy = match env::var("SEGMENT_STRATEGY")
            .unwrap_or_else(|_| "direct".to_string())
            .to_lowercase()
            .as_str()
        {
            "redirect" => SegmentStrategy::Redirect,
            _ => SegmentStrategy::Direct,
        };

        // Allow private-range origins (local testing); defaults to dev mode
        let allow_private_origins = env::var("ALLOW_PRIVATE_ORIGINS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(is_dev);

        Ok(Config {
            port,
            is_dev,
            segment_strategy,
            allow_private_origins,
        })
    }
}
