use tymelyne_core::error::CoreError;
use tymelyne_remote::ClientError;

/// Application-level error type for services.
///
/// Wraps [`CoreError`] for domain errors and tags remote failures with
/// what was being loaded or changed, so callers can show a short inline
/// message.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `tymelyne_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Sign-in, sign-up, or session lookup was rejected or failed.
    #[error("Authentication failed: {0}")]
    Auth(#[source] ClientError),

    /// A read failed.
    #[error("Failed to load {what}: {source}")]
    Fetch {
        what: &'static str,
        #[source]
        source: ClientError,
    },

    /// A write failed. Optimistic local changes have been rolled back.
    #[error("Failed to {action}: {source}")]
    Mutation {
        action: &'static str,
        #[source]
        source: ClientError,
    },

    /// The operation needs a signed-in principal.
    #[error("Not signed in")]
    NotAuthenticated,

    /// Missing or malformed configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience type alias for service return values.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// `map_err` adapter for reads: `.map_err(AppError::fetch("goals"))`.
    pub fn fetch(what: &'static str) -> impl FnOnce(ClientError) -> AppError {
        move |source| AppError::Fetch { what, source }
    }

    /// `map_err` adapter for writes: `.map_err(AppError::mutation("like the post"))`.
    pub fn mutation(action: &'static str) -> impl FnOnce(ClientError) -> AppError {
        move |source| AppError::Mutation { action, source }
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> AppError {
        AppError::Core(CoreError::NotFound {
            entity,
            id: id.to_string(),
        })
    }

    /// Short message suitable for inline display.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, .. } => format!("That {entity} no longer exists"),
                CoreError::Validation(msg)
                | CoreError::Conflict(msg)
                | CoreError::Unauthorized(msg) => msg.clone(),
                CoreError::Internal(_) => "Something went wrong".to_string(),
            },
            AppError::Auth(ClientError::Auth(msg)) => msg.clone(),
            AppError::Auth(err) if err.is_retryable() => {
                "Could not reach the sign-in service. Please try again.".to_string()
            }
            AppError::Auth(_) => "Sign-in failed".to_string(),
            AppError::Fetch { what, source } if matches!(source, ClientError::Timeout(_)) => {
                format!("Loading {what} timed out. Please try again.")
            }
            AppError::Fetch { what, .. } => format!("Could not load {what}"),
            AppError::Mutation { action, .. } => format!("Could not {action}. Please try again."),
            AppError::NotAuthenticated => "Please sign in to continue".to_string(),
            AppError::Config(msg) => msg.clone(),
        }
    }

    /// Whether repeating the same operation could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Auth(source)
            | AppError::Fetch { source, .. }
            | AppError::Mutation { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}
