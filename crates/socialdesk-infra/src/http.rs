//! Shared reqwest client construction.

use std::time::Duration;

/// Build a client with a request timeout.
///
/// Building only fails when the TLS backend cannot initialise. The default
/// client is used then, and it has no timeout, so the failure is logged.
pub fn client_with_timeout(timeout: Duration) -> reqwest::Client {
    match reqwest::Client::builder().timeout(timeout).build() {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!(
                error = %e,
                timeout_secs = timeout.as_secs_f64(),
                "http client build failed, falling back to a client without timeout"
            );
            reqwest::Client::default()
        }
    }
}
