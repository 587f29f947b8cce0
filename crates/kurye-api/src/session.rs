//! Sign-in state shared by every service.
//!
//! [`SessionManager`] owns the current [`Session`], persists it through a
//! [`KeyValueStore`], and keeps the bearer token on every service in step
//! with it: whenever the session has no token, no service sends one.

use std::sync::Arc;

use kurye_core::storage::{get_json, set_json};
use kurye_core::{
    KeyValueStore, ProfileUpdate, RegisterRequest, Session, StorageKey, UserProfile,
};

use crate::error::ApiError;
use crate::services::Services;

pub struct SessionManager<S: KeyValueStore> {
    services: Arc<Services>,
    store: S,
    session: Session,
}

impl<S: KeyValueStore> SessionManager<S> {
    pub fn new(services: Arc<Services>, store: S) -> Self {
        Self {
            services,
            store,
            session: Session::default(),
        }
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn services(&self) -> &Arc<Services> {
        &self.services
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Restores a persisted session. Both the token and the user must be
    /// stored; a stored user that no longer decodes is discarded.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Storage`] if the store cannot be read.
    pub fn restore(&mut self) -> Result<&Session, ApiError> {
        let token = self.store.get(StorageKey::Token)?;
        let user = match get_json::<UserProfile, _>(&self.store, StorageKey::User) {
            Ok(user) => user,
            Err(kurye_core::StorageError::Decode { key, source }) => {
                tracing::warn!(key, error = %source, "discarding undecodable stored user");
                self.store.remove(StorageKey::Token)?;
                self.store.remove(StorageKey::User)?;
                None
            }
            Err(e) => return Err(e.into()),
        };

        match (token, user) {
            (Some(token), Some(user)) => {
                self.services.set_auth_token(Some(&token))?;
                tracing::debug!(user_id = user.id, "session restored");
                self.session = Session::signed_in(token, user);
            }
            _ => {
                tracing::debug!("no stored session");
                self.session = Session::default();
            }
        }
        Ok(&self.session)
    }

    /// Signs in, loads the profile, and persists both.
    ///
    /// # Errors
    ///
    /// Any error from login, the profile fetch, or the store. On error no
    /// service is left holding the new token.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<&Session, ApiError> {
        let token = self.services.auth.login(email, password).await?;
        self.services.set_auth_token(Some(&token.access_token))?;

        match self.finish_login(&token.access_token).await {
            Ok(user) => {
                tracing::info!(user_id = user.id, "logged in");
                self.session = Session::signed_in(token.access_token, user);
                Ok(&self.session)
            }
            Err(e) => {
                self.services.set_auth_token(None)?;
                Err(e)
            }
        }
    }

    async fn finish_login(&self, token: &str) -> Result<UserProfile, ApiError> {
        let user = self.services.auth.get_current_user().await?;
        self.store.set(StorageKey::Token, token)?;
        set_json(&self.store, StorageKey::User, &user)?;
        Ok(user)
    }

    /// Creates an account. The caller signs in separately.
    ///
    /// # Errors
    ///
    /// Any error from the backend.
    pub async fn register(&self, request: &RegisterRequest) -> Result<UserProfile, ApiError> {
        self.services.auth.register(request).await
    }

    /// Clears the session everywhere. Tokens are removed from the services
    /// before storage is touched, so a storage failure still signs out.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Storage`] if the stored session cannot be removed.
    pub fn logout(&mut self) -> Result<(), ApiError> {
        self.services.set_auth_token(None)?;
        self.session = Session::default();
        self.store.remove(StorageKey::Token)?;
        self.store.remove(StorageKey::User)?;
        tracing::info!("logged out");
        Ok(())
    }

    /// Saves a profile edit and replaces the stored user with the result.
    ///
    /// # Errors
    ///
    /// Any error from the backend or the store.
    pub async fn update_profile(&mut self, update: &ProfileUpdate) -> Result<&UserProfile, ApiError> {
        let user = self.services.auth.update_profile(update).await?;
        set_json(&self.store, StorageKey::User, &user)?;
        Ok(self.session.user.insert(user))
    }
}
