//! Session manager: token ownership and the authenticated transport.
//!
//! The manager owns the access/refresh token pair and the user snapshot,
//! write-through persisted under the fixed session keys. Every authenticated
//! request goes through [`SessionManager::send`], which attaches the bearer
//! token and, on a 401, rotates the access token exactly once before
//! retrying. A failed rotation (or a second 401) clears the session and
//! surfaces [`ApiError::SessionExpired`] - callers must then treat the user
//! as logged out.
//!
//! Invariant: the user snapshot is non-null only while an access token is
//! present that was validated (profile fetch) or freshly issued
//! (login/register).

use std::sync::{Arc, PoisonError, RwLock};

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use alma_artesana_core::{Email, User};

use crate::api::types::{
    ChangePasswordRequest, LoginRequest, ProfileUpdate, RefreshRequest, RefreshResponse,
    RegisterForm, RegisterResponse, TokenPair,
};
use crate::api::{ApiClient, ApiError, FieldErrors};
use crate::store::{StateStore, keys};

/// Snapshot of an authenticated session.
#[derive(Clone, Debug)]
pub struct Session {
    pub access_token: SecretString,
    pub refresh_token: SecretString,
    pub user: User,
}

/// Owns authentication state and the authenticated transport.
///
/// Cheaply cloneable; clones share the same token state.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    api: ApiClient,
    store: StateStore,
    access: RwLock<Option<SecretString>>,
    refresh: RwLock<Option<SecretString>>,
    user: RwLock<Option<User>>,
}

impl SessionManager {
    /// Create a session manager, rehydrating any persisted tokens and user
    /// snapshot from the store.
    #[must_use]
    pub fn new(api: ApiClient, store: StateStore) -> Self {
        let access = store.read::<String>(keys::ACCESS_TOKEN).map(SecretString::from);
        let refresh = store.read::<String>(keys::REFRESH_TOKEN).map(SecretString::from);
        // A persisted user without a token violates the session invariant;
        // treat it as stale.
        let user = if access.is_some() {
            store.read::<User>(keys::USER)
        } else {
            store.remove(keys::USER);
            None
        };

        Self {
            inner: Arc::new(SessionInner {
                api,
                store,
                access: RwLock::new(access),
                refresh: RwLock::new(refresh),
                user: RwLock::new(user),
            }),
        }
    }

    /// Whether an access token is present.
    ///
    /// Presence only - the token is not validated here. Startup validation is
    /// the bootstrapper's job.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        read_lock(&self.inner.access).is_some()
    }

    /// The hydrated user, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        read_lock(&self.inner.user).clone()
    }

    // =========================================================================
    // Login / Register / Logout
    // =========================================================================

    /// Log in with email and password.
    ///
    /// The login endpoint only issues tokens, so on success the profile is
    /// fetched through the authenticated transport to hydrate the user before
    /// the session is returned.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidCredentials` if the email/password is wrong,
    /// or another `ApiError` if the request fails.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ApiError> {
        let email = Email::parse(email)
            .map_err(|e| ApiError::Validation(FieldErrors::single("email", e.to_string())))?;

        let builder = self.inner.api.build(
            Method::POST,
            "/auth/login/",
            Some(&LoginRequest {
                username: email.as_str(),
                password,
            }),
            None,
        );

        let tokens: TokenPair = match self.inner.api.execute(builder).await {
            Ok(tokens) => tokens,
            // The shop API answers bad credentials with a plain 401
            Err(ApiError::Unauthorized(_)) => return Err(ApiError::InvalidCredentials),
            Err(e) => return Err(e),
        };

        self.set_tokens(&tokens);

        let user = match self.fetch_profile().await {
            Ok(user) => user,
            Err(e) => {
                // Freshly issued tokens that cannot fetch a profile are
                // useless; do not leave a half-open session behind.
                self.clear_session();
                return Err(e);
            }
        };
        self.set_current_user(user.clone());

        Ok(self.snapshot(user))
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` carrying the server's field-level
    /// messages (email taken, weak password, password mismatch) unmodified,
    /// or another `ApiError` if the request fails.
    #[instrument(skip(self, form), fields(email = %form.email))]
    pub async fn register(&self, form: &RegisterForm) -> Result<Session, ApiError> {
        Email::parse(&form.email)
            .map_err(|e| ApiError::Validation(FieldErrors::single("email", e.to_string())))?;

        let builder = self
            .inner
            .api
            .build(Method::POST, "/auth/register/", Some(form), None);
        let response: RegisterResponse = self.inner.api.execute(builder).await?;

        self.set_tokens(&response.tokens);
        self.set_current_user(response.user.clone());

        Ok(self.snapshot(response.user))
    }

    /// Clear both tokens and the user snapshot unconditionally. Never fails.
    pub fn logout(&self) {
        self.clear_session();
    }

    // =========================================================================
    // Authenticated transport
    // =========================================================================

    /// Send an authenticated request and decode the JSON response.
    ///
    /// Attaches the current access token as a bearer credential. On a 401 the
    /// access token is refreshed exactly once and the request retried; a
    /// second 401, or a refresh failure, clears the session and yields
    /// [`ApiError::SessionExpired`]. The caller never observes the
    /// intermediate 401 of a successfully refreshed request.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotAuthenticated` if no access token is present,
    /// `ApiError::SessionExpired` as described above, or any transport,
    /// status, or decode error from the request itself.
    pub async fn send<B, R>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let text = self.send_raw(method, path, body).await?;
        match serde_json::from_str(&text) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::error!(path, error = %e, "failed to decode shop API response");
                Err(ApiError::Parse(e))
            }
        }
    }

    /// Send an authenticated request, discarding the response body.
    ///
    /// Same refresh semantics as [`SessionManager::send`].
    ///
    /// # Errors
    ///
    /// See [`SessionManager::send`].
    pub async fn send_unit<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized + Sync,
    {
        self.send_raw(method, path, body).await.map(|_| ())
    }

    async fn send_raw<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<String, ApiError>
    where
        B: Serialize + ?Sized + Sync,
    {
        let token = self.access_token().ok_or(ApiError::NotAuthenticated)?;

        let first = self
            .inner
            .api
            .build(method.clone(), path, body, Some(&token));
        match self.inner.api.execute_raw(first).await {
            Err(ApiError::Unauthorized(detail)) => {
                debug!(path, detail, "access token rejected, attempting refresh");
                let fresh = self.refresh_access().await?;

                let retry = self.inner.api.build(method, path, body, Some(&fresh));
                match self.inner.api.execute_raw(retry).await {
                    // One refresh per request: a second 401 ends the session
                    Err(ApiError::Unauthorized(_)) => {
                        warn!(path, "still unauthorized after refresh, clearing session");
                        self.clear_session();
                        Err(ApiError::SessionExpired)
                    }
                    other => other,
                }
            }
            other => other,
        }
    }

    /// Rotate the access token using the refresh token.
    ///
    /// Any failure clears the session and yields `SessionExpired`.
    async fn refresh_access(&self) -> Result<SecretString, ApiError> {
        let Some(refresh) = self.refresh_token() else {
            self.clear_session();
            return Err(ApiError::SessionExpired);
        };

        let builder = self.inner.api.build(
            Method::POST,
            "/auth/refresh/",
            Some(&RefreshRequest {
                refresh: refresh.expose_secret(),
            }),
            None,
        );

        match self.inner.api.execute::<RefreshResponse>(builder).await {
            Ok(response) => {
                let token = SecretString::from(response.access);
                self.set_access(token.clone());
                Ok(token)
            }
            Err(e) => {
                warn!(error = %e, "token refresh failed, clearing session");
                self.clear_session();
                Err(ApiError::SessionExpired)
            }
        }
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// Fetch the customer profile for the current token.
    ///
    /// Does not mutate the user snapshot; the bootstrapper (or login) decides
    /// what to do with the result.
    ///
    /// # Errors
    ///
    /// Returns an auth error if the token is invalid; the caller is
    /// responsible for clearing the session in that case.
    #[instrument(skip(self))]
    pub async fn fetch_profile(&self) -> Result<User, ApiError> {
        self.send(Method::GET, "/auth/profile/", None::<&()>).await
    }

    /// Update the customer profile and refresh the user snapshot.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` with the server's field messages, or
    /// another `ApiError` if the request fails.
    #[instrument(skip(self, update))]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, ApiError> {
        let user: User = self.send(Method::PUT, "/auth/profile/", Some(update)).await?;
        self.set_current_user(user.clone());
        Ok(user)
    }

    /// Change the account password.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` when the current password is wrong, or
    /// another `ApiError` if the request fails.
    #[instrument(skip(self, current_password, new_password))]
    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ApiError> {
        self.send_unit(
            Method::POST,
            "/auth/change-password/",
            Some(&ChangePasswordRequest {
                current_password,
                new_password,
            }),
        )
        .await
    }

    // =========================================================================
    // Internal state
    // =========================================================================

    /// Install a hydrated user snapshot (in memory and persisted).
    pub(crate) fn set_current_user(&self, user: User) {
        self.inner.store.write(keys::USER, &user);
        *write_lock(&self.inner.user) = Some(user);
    }

    fn snapshot(&self, user: User) -> Session {
        Session {
            access_token: self.access_token().unwrap_or_else(|| SecretString::from("")),
            refresh_token: self.refresh_token().unwrap_or_else(|| SecretString::from("")),
            user,
        }
    }

    fn access_token(&self) -> Option<SecretString> {
        read_lock(&self.inner.access).clone()
    }

    fn refresh_token(&self) -> Option<SecretString> {
        read_lock(&self.inner.refresh).clone()
    }

    fn set_tokens(&self, tokens: &TokenPair) {
        self.inner.store.write(keys::ACCESS_TOKEN, &tokens.access);
        self.inner.store.write(keys::REFRESH_TOKEN, &tokens.refresh);
        *write_lock(&self.inner.access) = Some(SecretString::from(tokens.access.clone()));
        *write_lock(&self.inner.refresh) = Some(SecretString::from(tokens.refresh.clone()));
    }

    fn set_access(&self, token: SecretString) {
        self.inner
            .store
            .write(keys::ACCESS_TOKEN, token.expose_secret());
        *write_lock(&self.inner.access) = Some(token);
    }

    fn clear_session(&self) {
        *write_lock(&self.inner.access) = None;
        *write_lock(&self.inner.refresh) = None;
        *write_lock(&self.inner.user) = None;
        self.inner.store.remove(keys::ACCESS_TOKEN);
        self.inner.store.remove(keys::REFRESH_TOKEN);
        self.inner.store.remove(keys::USER);
    }
}

fn read_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
