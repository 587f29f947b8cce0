//! Typed clients for the courier backend.

pub mod auth;
pub mod chatbot;
pub mod client;
pub mod error;
pub mod packages;
pub(crate) mod retry;
pub mod routes;
pub mod services;
pub mod session;
pub mod types;

pub use auth::AuthService;
pub use chatbot::ChatbotService;
pub use client::AuthenticatedClient;
pub use error::{extract_detail, ApiError};
pub use packages::PackageService;
pub use routes::RouteService;
pub use services::Services;
pub use session::SessionManager;
pub use types::{ChatReply, MessageResponse, TokenResponse};
