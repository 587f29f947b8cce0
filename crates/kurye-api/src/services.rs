use std::sync::Arc;

use kurye_core::ApiClientOptions;
use kurye_diagnostics::ErrorReporter;

use crate::auth::AuthService;
use crate::chatbot::ChatbotService;
use crate::client::AuthenticatedClient;
use crate::error::ApiError;
use crate::packages::PackageService;
use crate::routes::RouteService;

/// Every backend service, each with its own independent client.
#[derive(Debug)]
pub struct Services {
    pub auth: AuthService,
    pub packages: PackageService,
    pub routes: RouteService,
    pub chatbot: ChatbotService,
}

impl Services {
    /// # Errors
    ///
    /// See [`AuthenticatedClient::new`].
    pub fn new(options: &ApiClientOptions, reporter: &Arc<ErrorReporter>) -> Result<Self, ApiError> {
        Ok(Self {
            auth: AuthService::new(options, Arc::clone(reporter))?,
            packages: PackageService::new(options, Arc::clone(reporter))?,
            routes: RouteService::new(options, Arc::clone(reporter))?,
            chatbot: ChatbotService::new(options, Arc::clone(reporter))?,
        })
    }

    #[must_use]
    pub fn clients(&self) -> [&AuthenticatedClient; 4] {
        [
            self.auth.client(),
            self.packages.client(),
            self.routes.client(),
            self.chatbot.client(),
        ]
    }

    /// Sets or clears the bearer token on every service.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidHeader`] for a malformed token. The first
    /// service rejects it, so no service is changed.
    pub fn set_auth_token(&self, token: Option<&str>) -> Result<(), ApiError> {
        for client in self.clients() {
            client.set_auth_token(token)?;
        }
        tracing::debug!(authenticated = token.is_some(), "auth token fanned out to all services");
        Ok(())
    }
}
