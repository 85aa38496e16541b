//! Client for the QFS ledger REST backend.
//!
//! [`ApiClient`] attaches the stored access token to every call, refreshes it
//! shortly before it expires or after a 401, and retries the call once.

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod session;

pub use api::{ApiClient, ApiRequest, MultipartForm, RequestBody, Transport};
pub use error::ApiError;
pub use session::{SessionManager, SessionState, SessionStore};

/// Installs logging and resolves the backend base URL.
pub async fn init() {
    logging::init();
    config::init().await;
}
