use std::sync::Arc;

use kurye_core::ApiClientOptions;
use kurye_diagnostics::ErrorReporter;

use crate::client::AuthenticatedClient;
use crate::error::ApiError;
use crate::types::{ChatReply, ChatRequest};

/// Client for the delivery assistant at `/api/chatbot`.
#[derive(Debug)]
pub struct ChatbotService {
    client: AuthenticatedClient,
}

impl ChatbotService {
    /// # Errors
    ///
    /// See [`AuthenticatedClient::new`].
    pub fn new(options: &ApiClientOptions, reporter: Arc<ErrorReporter>) -> Result<Self, ApiError> {
        Ok(Self {
            client: AuthenticatedClient::new("ChatbotService", options, reporter)?,
        })
    }

    #[must_use]
    pub fn client(&self) -> &AuthenticatedClient {
        &self.client
    }

    /// # Errors
    ///
    /// Any transport, status, or decode error.
    pub async fn chat(&self, message: &str) -> Result<ChatReply, ApiError> {
        self.client
            .post(
                "/api/chatbot/chat",
                &ChatRequest { message },
                "The assistant is unavailable",
            )
            .await
    }
}
