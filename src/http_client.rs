//! HTTP client builder
//!
//! One place to configure the underlying transport client used by both the
//! token endpoint and the business API pipeline.

use reqwest::Client;
use std::time::Duration;

/// Build a transport client with the given timeout.
pub fn build_client(timeout_secs: u64) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .use_rustls_tls()
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_client() {
        assert!(build_client(30).is_ok());
    }
}
