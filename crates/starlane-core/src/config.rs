//! Client configuration and credential registry.
//!
//! Values come from explicit construction or from `STARLANE_*` environment
//! variables. Tokens are held by an owned [`Credentials`] value that callers
//! pass to the request builder; there is no process-global token state.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::endpoint::AuthKind;
use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "https://api.spacetraders.io/v2";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

pub const ENV_BASE_URL: &str = "STARLANE_BASE_URL";
pub const ENV_PROXY: &str = "STARLANE_PROXY";
pub const ENV_TIMEOUT_SECS: &str = "STARLANE_TIMEOUT_SECS";
pub const ENV_ACCOUNT_TOKEN: &str = "STARLANE_ACCOUNT_TOKEN";
pub const ENV_AGENT_TOKEN: &str = "STARLANE_AGENT_TOKEN";
pub const ENV_AGENT_SYMBOL: &str = "STARLANE_AGENT_SYMBOL";

/// Connection settings shared by every request of one client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub user_agent: String,
    pub proxy: Option<String>,
    /// Timeout installed on requests that do not set their own.
    pub default_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::from(DEFAULT_BASE_URL),
            user_agent: format!("starlane/{}", env!("CARGO_PKG_VERSION")),
            proxy: None,
            default_timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(base_url) = non_blank(lookup(ENV_BASE_URL)) {
            if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                return Err(ConfigError::InvalidValue {
                    key: ENV_BASE_URL,
                    value: base_url,
                    reason: String::from("expected an http(s) URL"),
                });
            }
            config = config.with_base_url(base_url);
        }

        if let Some(proxy) = non_blank(lookup(ENV_PROXY)) {
            config = config.with_proxy(proxy);
        }

        if let Some(raw) = non_blank(lookup(ENV_TIMEOUT_SECS)) {
            let seconds = raw
                .parse::<u64>()
                .ok()
                .filter(|seconds| *seconds > 0)
                .ok_or_else(|| ConfigError::InvalidValue {
                    key: ENV_TIMEOUT_SECS,
                    value: raw.clone(),
                    reason: String::from("expected a positive number of seconds"),
                })?;
            config.default_timeout = Duration::from_secs(seconds);
        }

        Ok(config)
    }
}

/// Owned token registry.
///
/// Holds at most one account token and any number of agent tokens keyed by
/// agent symbol. One agent is selected as the default for agent-level calls.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    account_token: Option<String>,
    agent_tokens: BTreeMap<String, String>,
    selected_agent: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("account_token", &self.account_token.as_ref().map(|_| "<redacted>"))
            .field("agents", &self.agent_tokens.keys().collect::<Vec<_>>())
            .field("selected_agent", &self.selected_agent)
            .finish()
    }
}

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account_token(mut self, token: impl Into<String>) -> Self {
        self.account_token = non_blank(Some(token.into()));
        self
    }

    /// Registers an agent token. The first registered agent becomes the
    /// selected one.
    pub fn with_agent_token(mut self, symbol: impl Into<String>, token: impl Into<String>) -> Self {
        let symbol = symbol.into();
        if let Some(token) = non_blank(Some(token.into())) {
            if self.selected_agent.is_none() {
                self.selected_agent = Some(symbol.clone());
            }
            self.agent_tokens.insert(symbol, token);
        }
        self
    }

    /// Selects the agent whose token backs agent-level calls. Returns `false`
    /// when no token is registered for `symbol`.
    pub fn select_agent(&mut self, symbol: &str) -> bool {
        if self.agent_tokens.contains_key(symbol) {
            self.selected_agent = Some(symbol.to_owned());
            true
        } else {
            false
        }
    }

    pub fn selected_agent(&self) -> Option<&str> {
        self.selected_agent.as_deref()
    }

    pub fn agent_token(&self, symbol: &str) -> Option<&str> {
        self.agent_tokens.get(symbol).map(String::as_str)
    }

    /// Default token for an authorization kind.
    pub fn resolve(&self, auth: AuthKind) -> Option<&str> {
        match auth {
            AuthKind::None => None,
            AuthKind::Account => self.account_token.as_deref(),
            AuthKind::Agent => self
                .selected_agent
                .as_deref()
                .and_then(|symbol| self.agent_token(symbol)),
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut credentials = Self::new();
        if let Some(token) = non_blank(lookup(ENV_ACCOUNT_TOKEN)) {
            credentials = credentials.with_account_token(token);
        }
        if let Some(token) = non_blank(lookup(ENV_AGENT_TOKEN)) {
            let symbol =
                non_blank(lookup(ENV_AGENT_SYMBOL)).unwrap_or_else(|| String::from("default"));
            credentials = credentials.with_agent_token(symbol, token);
        }
        credentials
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key: &str| {
            pairs
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value).to_owned())
        }
    }

    #[test]
    fn defaults_use_public_base_url_and_sixty_second_timeout() {
        let config = ClientConfig::from_lookup(env(&[])).expect("empty env is valid");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.default_timeout, Duration::from_secs(60));
        assert!(config.proxy.is_none());
    }

    #[test]
    fn env_overrides_are_applied() {
        let config = ClientConfig::from_lookup(env(&[
            (ENV_BASE_URL, "http://localhost:8080/v2/"),
            (ENV_PROXY, "http://proxy:3128"),
            (ENV_TIMEOUT_SECS, "5"),
        ]))
        .expect("valid env");

        assert_eq!(config.base_url, "http://localhost:8080/v2");
        assert_eq!(config.proxy.as_deref(), Some("http://proxy:3128"));
        assert_eq!(config.default_timeout, Duration::from_secs(5));
    }

    #[test]
    fn rejects_zero_timeout_and_bad_url() {
        let err = ClientConfig::from_lookup(env(&[(ENV_TIMEOUT_SECS, "0")])).expect_err("zero");
        assert!(matches!(err, ConfigError::InvalidValue { key: ENV_TIMEOUT_SECS, .. }));

        let err = ClientConfig::from_lookup(env(&[(ENV_BASE_URL, "ftp://x")])).expect_err("ftp");
        assert!(matches!(err, ConfigError::InvalidValue { key: ENV_BASE_URL, .. }));
    }

    #[test]
    fn resolves_tokens_by_auth_kind() {
        let mut credentials = Credentials::new()
            .with_account_token("acct")
            .with_agent_token("ALPHA", "alpha-token")
            .with_agent_token("BETA", "beta-token");

        assert_eq!(credentials.resolve(AuthKind::None), None);
        assert_eq!(credentials.resolve(AuthKind::Account), Some("acct"));
        assert_eq!(credentials.resolve(AuthKind::Agent), Some("alpha-token"));

        assert!(credentials.select_agent("BETA"));
        assert_eq!(credentials.resolve(AuthKind::Agent), Some("beta-token"));
        assert!(!credentials.select_agent("GAMMA"));
    }

    #[test]
    fn blank_tokens_are_ignored() {
        let credentials = Credentials::new()
            .with_account_token("   ")
            .with_agent_token("ALPHA", "");
        assert_eq!(credentials.resolve(AuthKind::Account), None);
        assert_eq!(credentials.resolve(AuthKind::Agent), None);
    }

    #[test]
    fn debug_output_redacts_tokens() {
        let credentials = Credentials::new().with_account_token("secret-token");
        assert!(!format!("{credentials:?}").contains("secret-token"));
    }

    #[test]
    fn credentials_from_env_default_agent_symbol() {
        let credentials = Credentials::from_lookup(env(&[(ENV_AGENT_TOKEN, "tok")]));
        assert_eq!(credentials.selected_agent(), Some("default"));
        assert_eq!(credentials.resolve(AuthKind::Agent), Some("tok"));
    }
}
