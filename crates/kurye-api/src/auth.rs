use std::sync::Arc;

use kurye_core::{ApiClientOptions, ProfileUpdate, RegisterRequest, UserProfile};
use kurye_diagnostics::ErrorReporter;

use crate::client::AuthenticatedClient;
use crate::error::ApiError;
use crate::types::{
    ChangePasswordRequest, EmailRequest, LoginRequest, MessageResponse, TokenResponse,
};

/// Client for the `/auth` endpoints.
#[derive(Debug)]
pub struct AuthService {
    client: AuthenticatedClient,
}

impl AuthService {
    /// # Errors
    ///
    /// See [`AuthenticatedClient::new`].
    pub fn new(options: &ApiClientOptions, reporter: Arc<ErrorReporter>) -> Result<Self, ApiError> {
        Ok(Self {
            client: AuthenticatedClient::new("AuthService", options, reporter)?,
        })
    }

    #[must_use]
    pub fn client(&self) -> &AuthenticatedClient {
        &self.client
    }

    /// Exchanges credentials for a bearer token.
    ///
    /// # Errors
    ///
    /// [`ApiError::Status`] carries the backend's reason (unknown e-mail,
    /// wrong password), or "Login failed" when it gives none.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenResponse, ApiError> {
        self.client
            .post("/auth/login", &LoginRequest { email, password }, "Login failed")
            .await
    }

    /// Creates an account. Does not sign in.
    ///
    /// # Errors
    ///
    /// [`ApiError::Status`] carries the first field-validation message or the
    /// backend's reason, or "Registration failed".
    pub async fn register(&self, request: &RegisterRequest) -> Result<UserProfile, ApiError> {
        self.client
            .post("/auth/register", request, "Registration failed")
            .await
    }

    /// # Errors
    ///
    /// [`ApiError::Status`] with status 401 when the token is missing or
    /// expired.
    pub async fn get_current_user(&self) -> Result<UserProfile, ApiError> {
        self.client
            .get("/auth/me", &[], "Could not load the current user")
            .await
    }

    /// # Errors
    ///
    /// Any transport or status error from the backend.
    pub async fn reset_password(&self, email: &str) -> Result<MessageResponse, ApiError> {
        self.client
            .post(
                "/auth/reset-password",
                &EmailRequest { email },
                "Password reset failed",
            )
            .await
    }

    /// Applies a partial profile edit and returns the full updated profile.
    ///
    /// # Errors
    ///
    /// [`ApiError::Status`] when the new e-mail is already taken, among others.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile, ApiError> {
        self.client
            .put("/auth/profile", update, "Profile update failed")
            .await
    }

    /// # Errors
    ///
    /// [`ApiError::Status`] when the current password is wrong, among others.
    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<MessageResponse, ApiError> {
        self.client
            .post(
                "/auth/change-password",
                &ChangePasswordRequest {
                    current_password,
                    new_password,
                },
                "Password change failed",
            )
            .await
    }
}
