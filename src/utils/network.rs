use crate::error::{AnfError, Result};
use reqwest::Client;
use std::time::Duration;

/// Configuration for HTTP client with proper timeouts and user-friendly error handling
pub struct NetworkConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(120),
            user_agent: format!("anf-dual/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Create a properly configured HTTP client with timeouts
pub fn create_http_client(config: &NetworkConfig) -> Result<Client> {
    Client::builder()
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .user_agent(&config.user_agent)
        .build()
        .map_err(|e| AnfError::network(format!("Failed to create HTTP client: {}", e)))
}

/// Map a reqwest failure to an error that names the endpoint involved
pub fn classify_network_error(error: &reqwest::Error, url: &str) -> AnfError {
    let host = extract_host(url);

    if error.is_timeout() {
        return AnfError::connection_timeout(format!(
            "Request to '{}' timed out. The management endpoint may be unreachable.",
            host
        ));
    }

    if error.is_connect() {
        if error
            .to_string()
            .to_lowercase()
            .contains("connection refused")
        {
            return AnfError::connection_refused(format!(
                "Connection to '{}' was refused. The service may be temporarily unavailable.",
                host
            ));
        }

        return AnfError::network(format!(
            "Failed to connect to '{}'. Please check your network connection.",
            host
        ));
    }

    let lowered = error.to_string().to_lowercase();
    if lowered.contains("ssl") || lowered.contains("tls") || lowered.contains("certificate") {
        return AnfError::ssl_error(format!(
            "SSL/TLS connection error when accessing '{}'. This may be due to certificate issues or network security policies.",
            host
        ));
    }

    if let Some(status) = error.status() {
        match status.as_u16() {
            503 => {
                return AnfError::network(format!(
                    "'{}' is temporarily unavailable (503). Please try again later.",
                    host
                ))
            }
            502 | 504 => {
                return AnfError::network(format!(
                    "Gateway error ({}) when accessing '{}'.",
                    status.as_u16(),
                    host
                ))
            }
            _ => {}
        }
    }

    AnfError::network(format!("Network error when accessing '{}': {}", host, error))
}

fn extract_host(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(|h| h.to_string()))
        .unwrap_or_else(|| "unknown-host".to_string())
}

/// Check if an error is worth retrying
pub fn is_retryable_error(error: &AnfError) -> bool {
    match error {
        AnfError::ConnectionTimeout(_) => true,
        AnfError::NetworkError(msg) => {
            let msg_lower = msg.to_lowercase();
            msg_lower.contains("timeout")
                || msg_lower.contains("temporar")
                || msg_lower.contains("503")
                || msg_lower.contains("502")
                || msg_lower.contains("504")
        }
        AnfError::AzureApiError { status, .. } => {
            matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
        }
        AnfError::ConnectionRefused(_) => false,
        AnfError::SslError(_) => false,
        _ => false,
    }
}
