//! Session and identity.
//!
//! [`SessionProvider`] is the only writer of the session state. Other
//! services read the principal through [`SessionProvider::subscribe`] or
//! [`SessionProvider::require`].

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tymelyne_core::account::{validate_sign_in, validate_sign_up, validate_username, SignUpForm};
use tymelyne_core::leveling::{award_xp, XpAward};
use tymelyne_core::preferences::validate_language;
use tymelyne_core::streaks::StreakType;
use tymelyne_db::models::profile::{CreateProfile, Profile, UpdateProfile};
use tymelyne_db::repositories::ProfileRepo;
use tymelyne_remote::{AuthEvent, AuthUser};

use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::streaks;

/// The signed-in user and their profile row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Principal {
    pub user: AuthUser,
    pub profile: Profile,
}

impl Principal {
    pub fn id(&self) -> tymelyne_core::types::UserId {
        self.user.id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Startup, before the first lookup has finished.
    Unresolved,
    Authenticated(Principal),
    Anonymous,
}

impl SessionState {
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Self::Authenticated(principal) => Some(principal),
            _ => None,
        }
    }
}

/// Result of a registration.
#[derive(Debug, Clone, PartialEq)]
pub enum SignUpStatus {
    SignedIn(Principal),
    /// The service requires email confirmation before the first sign-in.
    ConfirmationRequired { email: String },
}

pub struct SessionProvider {
    ctx: AppContext,
    state: watch::Sender<SessionState>,
}

impl SessionProvider {
    pub fn new(ctx: AppContext) -> Self {
        let (state, _) = watch::channel(SessionState::Unresolved);
        Self { ctx, state }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn principal(&self) -> Option<Principal> {
        self.state.borrow().principal().cloned()
    }

    /// The current principal, or [`AppError::NotAuthenticated`].
    pub fn require(&self) -> AppResult<Principal> {
        self.principal().ok_or(AppError::NotAuthenticated)
    }

    fn set(&self, state: SessionState) {
        self.state.send_replace(state);
    }

    /// Resolve the initial state from any stored session.
    ///
    /// No session, or any failure while resolving it, ends `Anonymous`.
    pub async fn restore(&self) -> SessionState {
        let next = match self.ctx.auth.get_session().await {
            Ok(Some(_)) => match self.resolve_principal().await {
                Ok(principal) => SessionState::Authenticated(principal),
                Err(e) => {
                    tracing::warn!(error = %e, "Session restore failed");
                    SessionState::Anonymous
                }
            },
            Ok(None) => SessionState::Anonymous,
            Err(e) => {
                tracing::warn!(error = %e, "Session lookup failed");
                SessionState::Anonymous
            }
        };
        self.set(next.clone());
        next
    }

    /// Fetch the auth user and profile for the current session.
    ///
    /// A missing profile row yields an empty profile; a failed lookup is
    /// an error.
    pub async fn resolve_principal(&self) -> AppResult<Principal> {
        let user = self.ctx.auth.get_user().await.map_err(AppError::Auth)?;
        let profile = ProfileRepo::find_by_id(self.ctx.store(), user.id)
            .await
            .map_err(AppError::fetch("your profile"))?
            .unwrap_or_else(|| {
                tracing::debug!(user_id = %user.id, "No profile row; using an empty profile");
                let mut empty = Profile::empty(user.id);
                empty.email = user.email.clone();
                empty
            });
        Ok(Principal { user, profile })
    }

    /// Apply one pushed auth event.
    pub async fn handle_event(&self, event: AuthEvent) {
        tracing::debug!(event = event.name(), "Handling auth event");
        match event {
            AuthEvent::SignedOut => self.set(SessionState::Anonymous),
            AuthEvent::SignedIn(_) | AuthEvent::TokenRefreshed(_) | AuthEvent::UserUpdated(_) => {
                match self.resolve_principal().await {
                    Ok(principal) => self.set(SessionState::Authenticated(principal)),
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to resolve principal after auth event");
                        self.set(SessionState::Anonymous);
                    }
                }
            }
        }
    }

    /// Re-read the current session and apply it, for when pushed events
    /// were missed.
    pub async fn resync(&self) {
        match self.ctx.auth.get_session().await {
            Ok(Some(session)) => self.handle_event(AuthEvent::TokenRefreshed(session)).await,
            Ok(None) => self.handle_event(AuthEvent::SignedOut).await,
            Err(e) => {
                tracing::warn!(error = %e, "Session lookup failed during resync");
                self.handle_event(AuthEvent::SignedOut).await;
            }
        }
    }

    /// Follow auth events until `cancel` fires.
    pub fn listen(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        let provider = Arc::clone(self);
        let mut events = provider.ctx.auth.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::debug!("Auth listener stopping");
                        break;
                    }
                    received = events.recv() => match received {
                        Ok(event) => provider.handle_event(event).await,
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Auth listener lagged; re-resolving");
                            provider.resync().await;
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
        })
    }

    /// Sign in with email and password.
    ///
    /// On success the daily-login streak is recorded; a streak failure is
    /// logged and does not fail the sign-in.
    pub async fn sign_in(&self, email: &str, password: &str) -> AppResult<Principal> {
        validate_sign_in(email, password)?;
        self.ctx
            .auth
            .sign_in(email.trim(), password)
            .await
            .map_err(AppError::Auth)?;

        let principal = match self.resolve_principal().await {
            Ok(principal) => principal,
            Err(e) => {
                // A failed sign-in leaves no remote session behind.
                if let Err(sign_out) = self.ctx.auth.sign_out().await {
                    tracing::warn!(error = %sign_out, "Sign-out after failed sign-in failed");
                }
                self.set(SessionState::Anonymous);
                return Err(e);
            }
        };
        self.set(SessionState::Authenticated(principal.clone()));
        tracing::info!(user_id = %principal.id(), "Signed in");

        streaks::record_quietly(&self.ctx, principal.id(), StreakType::DailyLogin, Utc::now()).await;
        Ok(principal)
    }

    /// Register, then write the profile row when a session was issued.
    pub async fn sign_up(&self, form: &SignUpForm) -> AppResult<SignUpStatus> {
        validate_sign_up(form)?;
        let email = form.email.trim().to_string();
        let outcome = self
            .ctx
            .auth
            .sign_up(&email, &form.password, form.metadata())
            .await
            .map_err(AppError::Auth)?;

        if outcome.session.is_none() {
            tracing::info!(user_id = %outcome.user.id, "Signed up; awaiting email confirmation");
            return Ok(SignUpStatus::ConfirmationRequired { email });
        }

        let input = CreateProfile {
            id: outcome.user.id,
            email: Some(email),
            first_name: Some(form.first_name.trim().to_string()),
            last_name: Some(form.last_name.trim().to_string()),
            username: Some(form.username.trim().to_string()),
        };
        let profile = ProfileRepo::create(self.ctx.store(), &input)
            .await
            .map_err(AppError::mutation("create your profile"))?;
        let principal = Principal {
            user: outcome.user,
            profile,
        };
        self.set(SessionState::Authenticated(principal.clone()));
        tracing::info!(user_id = %principal.id(), "Signed up");
        Ok(SignUpStatus::SignedIn(principal))
    }

    /// Sign out. The state ends `Anonymous` even when the remote call
    /// fails; that failure is still returned.
    pub async fn sign_out(&self) -> AppResult<()> {
        let result = self.ctx.auth.sign_out().await;
        self.set(SessionState::Anonymous);
        result.map_err(|e| {
            tracing::warn!(error = %e, "Remote sign-out failed; signed out locally");
            AppError::mutation("sign out")(e)
        })
    }

    /// Edit the principal's profile and publish the new principal.
    pub async fn update_profile(&self, patch: &UpdateProfile) -> AppResult<Principal> {
        let mut principal = self.require()?;
        if let Some(username) = &patch.username {
            validate_username(username)?;
        }
        if let Some(language) = &patch.language {
            validate_language(language)?;
        }
        if patch.is_empty() {
            return Ok(principal);
        }
        principal.profile = ProfileRepo::update(self.ctx.store(), principal.id(), patch)
            .await
            .map_err(AppError::mutation("update your profile"))?
            .ok_or_else(|| AppError::not_found("profile", principal.id()))?;
        self.set(SessionState::Authenticated(principal.clone()));
        Ok(principal)
    }

    /// Add XP to the principal, storing the level the leveling rules give.
    pub async fn award_experience(&self, points: i64) -> AppResult<XpAward> {
        let mut principal = self.require()?;
        let award = award_xp(principal.profile.experience_points, points);
        let updated = ProfileRepo::set_experience(
            self.ctx.store(),
            principal.id(),
            award.new_total,
            award.new_level,
        )
        .await
        .map_err(AppError::mutation("update your experience"))?;

        match updated {
            Some(profile) => principal.profile = profile,
            None => {
                principal.profile.experience_points = award.new_total;
                principal.profile.level = award.new_level;
            }
        }
        if award.leveled_up() {
            tracing::info!(user_id = %principal.id(), level = award.new_level, "Level up");
        }
        self.set(SessionState::Authenticated(principal));
        Ok(award)
    }
}
