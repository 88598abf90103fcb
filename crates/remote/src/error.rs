//! Errors from the remote data client.

/// PostgREST code for "`.single()` matched no rows".
pub const PGRST_NO_ROWS: &str = "PGRST116";

/// PostgreSQL unique-violation SQLSTATE.
pub const PG_UNIQUE_VIOLATION: &str = "23505";

/// Errors returned by [`RemoteStore`](crate::RemoteStore) and
/// [`AuthApi`](crate::AuthApi) implementations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The call did not complete within the client-side timeout.
    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The service returned a non-2xx status code.
    #[error("Remote API error ({status}): {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// A single-row lookup matched nothing.
    #[error("No rows returned")]
    NoRows,

    /// A write violated a unique constraint.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Credentials were rejected or the session is no longer valid.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// An authenticated call was made without a session.
    #[error("Not signed in")]
    NotAuthenticated,

    /// A response body did not match the expected shape.
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    /// Whether retrying the same call could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Request(err) => err.is_timeout() || err.is_connect(),
            Self::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Build an error from a non-2xx status and its body.
    ///
    /// PostgREST bodies look like `{"code", "message", "details", "hint"}`;
    /// GoTrue bodies use `error_description` or `msg`. Unknown bodies are
    /// kept verbatim.
    pub fn from_status(status: u16, body: &str) -> Self {
        let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
        let field = |name: &str| {
            parsed
                .as_ref()
                .and_then(|v| v.get(name))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };

        let code = field("code").or_else(|| field("error_code"));
        let message = field("message")
            .or_else(|| field("error_description"))
            .or_else(|| field("msg"))
            .or_else(|| field("error"))
            .unwrap_or_else(|| body.to_string());

        match (status, code.as_deref()) {
            (_, Some(PGRST_NO_ROWS)) => Self::NoRows,
            (409, _) | (_, Some(PG_UNIQUE_VIOLATION)) => Self::Conflict(message),
            (400, _) | (401, _) | (403, _) if parsed.as_ref().is_some_and(is_auth_body) => {
                Self::Auth(message)
            }
            _ => Self::Api {
                status,
                code,
                message,
            },
        }
    }
}

/// GoTrue error bodies carry one of these keys; PostgREST ones do not.
fn is_auth_body(body: &serde_json::Value) -> bool {
    ["error_description", "msg", "error_code", "error"]
        .iter()
        .any(|key| body.get(key).is_some())
}
