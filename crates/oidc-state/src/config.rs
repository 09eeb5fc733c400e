//! Configuration for the OIDC login state service.

use std::time::Duration;

use anyhow::Context;
use url::Url;

/// Default values for session handling and the HTTP listener.
pub mod defaults {
    use std::time::Duration;

    /// Session lifetime (10 minutes). A login must finish its token exchange within this window.
    pub const SESSION_TTL: Duration = Duration::from_secs(600);

    /// Sweep interval for expired sessions.
    pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

    /// Session identifier length. 32 characters over a 36 symbol alphabet is ~165 bits.
    pub const SESSION_ID_LENGTH: usize = 32;

    /// Shortest identifier accepted from configuration (~82 bits).
    pub const MIN_SESSION_ID_LENGTH: usize = 16;

    /// Generation attempts before a collision is treated as a broken random source.
    pub const MAX_ID_ATTEMPTS: usize = 8;

    /// HTTP listener port.
    pub const PORT: u16 = 8080;

    /// Public origin of this service when none is configured.
    pub const EXTERNAL_HOSTNAME: &str = "http://localhost:8080";

    /// Scopes requested from the upstream identity provider.
    pub const PROVIDER_SCOPES: &str = "openid profile email";
}

/// Session store tuning.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Lifetime of a session measured from creation.
    pub ttl: Duration,

    /// Interval of the background sweep.
    pub cleanup_interval: Duration,

    /// Length of generated identifiers.
    pub id_length: usize,

    /// Retry budget for identifier collisions.
    pub max_id_attempts: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl: defaults::SESSION_TTL,
            cleanup_interval: defaults::CLEANUP_INTERVAL,
            id_length: defaults::SESSION_ID_LENGTH,
            max_id_attempts: defaults::MAX_ID_ATTEMPTS,
        }
    }
}

/// Upstream identity provider the login is delegated to.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Provider authorization endpoint.
    pub authorize_url: Url,

    /// Client ID this service is registered under at the provider.
    pub client_id: String,
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// The single client ID allowed to use `/authorize` and `/token`.
    pub client_id: String,

    /// Public origin of this service, e.g. `https://hoss.example.com`.
    pub external_hostname: String,

    /// Extra origins accepted as `redirect_uri` hosts.
    pub additional_allowed_servers: Vec<String>,

    /// Accept any redirect origin (with a warning).
    pub dev_mode: bool,

    /// Upstream identity provider.
    pub provider: ProviderConfig,

    /// Session store tuning.
    pub session: SessionConfig,
}

impl Config {
    /// Create a test configuration with fixed hosts and the default session settings.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            client_id: "test-client".to_string(),
            external_hostname: "https://auth.example.com".to_string(),
            additional_allowed_servers: vec!["https://app.example.com".to_string()],
            dev_mode: false,
            provider: ProviderConfig {
                authorize_url: Url::parse("https://idp.example.com/authorize")
                    .expect("static URL is valid"),
                client_id: "upstream-client".to_string(),
            },
            session: SessionConfig::default(),
        }
    }

    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns error if a required variable is missing or a value does not parse.
    pub fn from_env() -> anyhow::Result<Self> {
        let client_id = std::env::var("OIDC_CLIENT_ID").context("OIDC_CLIENT_ID must be set")?;
        let external_hostname = std::env::var("EXTERNAL_HOSTNAME")
            .unwrap_or_else(|_| defaults::EXTERNAL_HOSTNAME.to_string());
        let additional_allowed_servers = std::env::var("ADDITIONAL_ALLOWED_SERVERS")
            .map(|v| parse_server_list(&v))
            .unwrap_or_default();
        let dev_mode = std::env::var("DEV_MODE").is_ok_and(|v| v == "true" || v == "1");

        let authorize_url = std::env::var("PROVIDER_AUTHORIZE_URL")
            .context("PROVIDER_AUTHORIZE_URL must be set")?;
        let provider = ProviderConfig {
            authorize_url: Url::parse(&authorize_url)
                .with_context(|| format!("PROVIDER_AUTHORIZE_URL is not a URL: {authorize_url}"))?,
            client_id: std::env::var("PROVIDER_CLIENT_ID")
                .context("PROVIDER_CLIENT_ID must be set")?,
        };

        let mut session = SessionConfig::default();
        if let Ok(secs) = std::env::var("SESSION_TTL_SECS") {
            session.ttl = Duration::from_secs(secs.parse().context("SESSION_TTL_SECS")?);
        }
        if let Ok(len) = std::env::var("SESSION_ID_LENGTH") {
            session.id_length = len.parse().context("SESSION_ID_LENGTH")?;
        }

        let config = Self {
            client_id,
            external_hostname: external_hostname.trim_end_matches('/').to_string(),
            additional_allowed_servers,
            dev_mode,
            provider,
            session,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make sessions guessable or unusable.
    ///
    /// # Errors
    ///
    /// Returns error describing the first invalid setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.session.id_length < defaults::MIN_SESSION_ID_LENGTH {
            anyhow::bail!(
                "session id length {} is below the minimum of {}",
                self.session.id_length,
                defaults::MIN_SESSION_ID_LENGTH
            );
        }
        if self.session.ttl.is_zero() {
            anyhow::bail!("session ttl must be positive");
        }
        if self.session.max_id_attempts == 0 {
            anyhow::bail!("max id attempts must be positive");
        }
        Ok(())
    }

    /// Where the upstream provider sends the browser back to.
    #[must_use]
    pub fn callback_url(&self) -> String {
        format!("{}/callback", self.external_hostname)
    }
}

fn parse_server_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_end_matches('/'))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
