//! Runtime configuration
//!
//! Everything is read from command line flags with environment variable
//! fallbacks and collapsed into a plain [`SessionConfig`] that the library
//! components borrow.

use std::time::Duration;

use clap::Parser;

pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_BASE: &str = "https://api.spotify.com/v1";
pub const DEFAULT_DEVICE_NAME: &str = "Web Playback SDK";
pub const DEFAULT_VOLUME: f32 = 0.5;
const DEFAULT_REFRESH_MARGIN: Duration = Duration::from_secs(300);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// When the held credential is replaced with a fresh one
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshPolicy {
    /// Keep the first credential for the whole session
    Never,
    /// Re-acquire once the credential is within `margin` of its reported expiry
    BeforeExpiry { margin: Duration },
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self::BeforeExpiry {
            margin: DEFAULT_REFRESH_MARGIN,
        }
    }
}

/// Which of several overlapping search responses ends up on screen
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum SearchOrdering {
    /// Every response is applied as it arrives; the last one to land wins
    #[default]
    LastArrival,
    /// Responses from searches superseded by a newer one are dropped
    LatestIssued,
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub client_id: String,
    pub client_secret: String,
    pub token_url: String,
    pub api_base_url: String,
    pub device_name: String,
    pub volume: f32,
    pub refresh: RefreshPolicy,
    pub search_ordering: SearchOrdering,
    pub request_timeout: Option<Duration>,
}

impl SessionConfig {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            api_base_url: DEFAULT_API_BASE.to_string(),
            device_name: DEFAULT_DEVICE_NAME.to_string(),
            volume: DEFAULT_VOLUME,
            refresh: RefreshPolicy::default(),
            search_ordering: SearchOrdering::default(),
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
        }
    }

    /// Point both the token exchange and the Web API at another host.
    pub fn with_endpoints(mut self, token_url: impl Into<String>, api_base_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self.api_base_url = api_base_url.into();
        self
    }

    pub fn search_url(&self) -> String {
        format!("{}/search", self.api_base_url.trim_end_matches('/'))
    }

    pub fn play_url(&self) -> String {
        format!("{}/me/player/play", self.api_base_url.trim_end_matches('/'))
    }

    /// Shared HTTP client for every component of one session.
    pub fn http_client(&self) -> reqwest::Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }
        builder.build()
    }
}

/// Command line surface of the console driver
#[derive(Parser, Debug)]
#[clap(name = "spotify-session", about = "Search the Spotify catalog and drive a playback device")]
pub struct CliArgs {
    #[clap(long, env = "SPOTIFY_CLIENT_ID")]
    pub client_id: String,

    #[clap(long, env = "SPOTIFY_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: String,

    #[clap(long, env = "SPOTIFY_TOKEN_URL", default_value = DEFAULT_TOKEN_URL)]
    pub token_url: String,

    #[clap(long, env = "SPOTIFY_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    #[clap(long, env = "SPOTIFY_DEVICE_NAME", default_value = DEFAULT_DEVICE_NAME)]
    pub device_name: String,

    #[clap(long, default_value_t = DEFAULT_VOLUME)]
    pub volume: f32,

    /// Seconds before expiry at which the credential is re-acquired
    #[clap(long, env = "SPOTIFY_REFRESH_MARGIN_SECS", default_value_t = 300)]
    pub refresh_margin_secs: u64,

    /// Keep the first credential for the whole session
    #[clap(long)]
    pub no_refresh: bool,

    #[clap(long, value_enum, default_value = "last-arrival")]
    pub search_ordering: SearchOrdering,

    /// Per-request timeout in seconds, 0 disables it
    #[clap(long, default_value_t = 30)]
    pub request_timeout_secs: u64,

    #[clap(long, env = "SPOTIFY_SESSION_LOG_DIR", default_value = crate::logging::LOG_DIR)]
    pub log_dir: String,
}

impl From<CliArgs> for SessionConfig {
    fn from(args: CliArgs) -> Self {
        let refresh = if args.no_refresh {
            RefreshPolicy::Never
        } else {
            RefreshPolicy::BeforeExpiry {
                margin: Duration::from_secs(args.refresh_margin_secs),
            }
        };

        Self {
            refresh,
            search_ordering: args.search_ordering,
            request_timeout: (args.request_timeout_secs > 0)
                .then(|| Duration::from_secs(args.request_timeout_secs)),
            device_name: args.device_name,
            volume: args.volume.clamp(0.0, 1.0),
            ..Self::new(args.client_id, args.client_secret)
                .with_endpoints(args.token_url, args.api_base)
        }
    }
}
