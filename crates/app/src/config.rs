use std::time::Duration;

use crate::error::AppError;

/// Default client-side deadline for every remote call.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Hosted project base URL.
    pub url: String,
    /// Public (anon) API key.
    pub anon_key: String,
    /// Deadline applied to each remote call (default: `15` seconds).
    pub request_timeout: Duration,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                | Default    |
    /// |------------------------|------------|
    /// | `TYMELYNE_URL`         | (required) |
    /// | `TYMELYNE_ANON_KEY`    | (required) |
    /// | `REQUEST_TIMEOUT_SECS` | `15`       |
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| AppError::Config(format!("{key} must be set")))
        };

        let url = required("TYMELYNE_URL")?;
        let anon_key = required("TYMELYNE_ANON_KEY")?;

        let request_timeout_secs: u64 = match lookup("REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                AppError::Config("REQUEST_TIMEOUT_SECS must be a valid u64".to_string())
            })?,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };
        if request_timeout_secs == 0 {
            return Err(AppError::Config(
                "REQUEST_TIMEOUT_SECS must be positive".to_string(),
            ));
        }

        Ok(Self {
            url,
            anon_key,
            request_timeout: Duration::from_secs(request_timeout_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<AppConfig, AppError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_timeout() {
        let config = load(&[("TYMELYNE_URL", "http://localhost:54321"), ("TYMELYNE_ANON_KEY", "k")]).unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(15));
    }

    #[test]
    fn requires_url_and_key() {
        assert_matches!(load(&[("TYMELYNE_ANON_KEY", "k")]), Err(AppError::Config(msg)) if msg.contains("TYMELYNE_URL"));
        assert_matches!(load(&[("TYMELYNE_URL", "u"), ("TYMELYNE_ANON_KEY", " ")]), Err(AppError::Config(_)));
    }

    #[test]
    fn rejects_bad_timeout() {
        let base = [("TYMELYNE_URL", "u"), ("TYMELYNE_ANON_KEY", "k")];
        let mut pairs = base.to_vec();
        pairs.push(("REQUEST_TIMEOUT_SECS", "soon"));
        assert!(load(&pairs).is_err());

        let mut pairs = base.to_vec();
        pairs.push(("REQUEST_TIMEOUT_SECS", "3"));
        assert_eq!(load(&pairs).unwrap().request_timeout, Duration::from_secs(3));
    }
}
