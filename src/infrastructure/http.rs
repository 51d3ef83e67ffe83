use crate::config::UploadConfig;
use crate::error::{Result, UploadError};
use base64::Engine;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use std::time::Duration;

/// `Basic base64(username:password)`
pub fn basic_auth_value(username: &str, password: &str) -> String {
    let token =
        base64::engine::general_purpose::STANDARD.encode(format!("{}:{}", username, password));
    format!("Basic {}", token)
}

/// Builds the HTTP client shared by the storage and share services.
///
/// Credentials are baked in once as a default header and reused for every request.
pub fn build_client(config: &UploadConfig) -> Result<Client> {
    let mut auth = HeaderValue::from_str(&basic_auth_value(
        &config.credentials.username,
        &config.credentials.password,
    ))
    .map_err(|e| UploadError::Config(format!("invalid credentials: {}", e)))?;
    auth.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, auth);

    Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| UploadError::Config(format!("failed to build HTTP client: {}", e)))
}
