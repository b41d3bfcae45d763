use crate::error::{FacadeError, Result};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_CURRENCY: &str = "usd";
pub const DEFAULT_API_BASE: &str = "https://api.stripe.com";

pub const ENV_SECRET_KEY: &str = "STRIPE_SECRET_KEY";
pub const ENV_CURRENCY: &str = "STRIPE_CURRENCY";
pub const ENV_ONE_STEP: &str = "STRIPE_CHARGE_AND_CAPTURE_IN_ONE_STEP";
pub const ENV_API_BASE: &str = "STRIPE_API_BASE";
pub const ENV_TIMEOUT_SECS: &str = "STRIPE_TIMEOUT_SECS";

/// Settings consumed by the facade and the Stripe client.
///
/// Passed explicitly to [`Facade`](crate::application::facade::Facade) at
/// construction; nothing is read from process-wide state afterwards.
#[derive(Clone, Deserialize)]
pub struct FacadeConfig {
    /// Secret API key, sent as a bearer token.
    pub secret_key: String,
    /// Lower-case ISO currency code used when a charge does not name one.
    #[serde(default = "default_currency")]
    pub currency: String,
    /// When set, charges are captured at authorization time.
    #[serde(default)]
    pub charge_and_capture_in_one_step: bool,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Request timeout for the HTTP client. `None` keeps the client default.
    #[serde(default)]
    pub timeout: Option<Duration>,
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

impl FacadeConfig {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            currency: default_currency(),
            charge_and_capture_in_one_step: false,
            api_base: default_api_base(),
            timeout: None,
        }
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into().to_lowercase();
        self
    }

    pub fn with_charge_and_capture_in_one_step(mut self, one_step: bool) -> Self {
        self.charge_and_capture_in_one_step = one_step;
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Reads the configuration from `STRIPE_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let secret_key = get(ENV_SECRET_KEY)
            .ok_or_else(|| FacadeError::Config(format!("{ENV_SECRET_KEY} must be set")))?;

        let mut config = FacadeConfig::new(secret_key.trim());

        if let Some(currency) = get(ENV_CURRENCY) {
            config = config.with_currency(currency.trim());
        }
        if let Some(flag) = get(ENV_ONE_STEP) {
            config = config.with_charge_and_capture_in_one_step(parse_flag(ENV_ONE_STEP, &flag)?);
        }
        if let Some(api_base) = get(ENV_API_BASE) {
            config = config.with_api_base(api_base.trim());
        }
        if let Some(secs) = get(ENV_TIMEOUT_SECS) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                FacadeError::Config(format!("{ENV_TIMEOUT_SECS} must be a whole number of seconds"))
            })?;
            config = config.with_timeout(Duration::from_secs(secs));
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.secret_key.trim().is_empty() {
            return Err(FacadeError::Config("secret key must not be empty".to_string()));
        }
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(FacadeError::Config(format!(
                "currency must be a three-letter ISO code, got '{}'",
                self.currency
            )));
        }
        if !(self.api_base.starts_with("http://") || self.api_base.starts_with("https://")) {
            return Err(FacadeError::Config(format!(
                "API base must be an http(s) URL, got '{}'",
                self.api_base
            )));
        }
        Ok(())
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(FacadeError::Config(format!(
            "{key} must be a boolean, got '{other}'"
        ))),
    }
}

impl fmt::Debug for FacadeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FacadeConfig")
            .field("secret_key", &"***")
            .field("currency", &self.currency)
            .field(
                "charge_and_capture_in_one_step",
                &self.charge_and_capture_in_one_step,
            )
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .finish()
    }
}
