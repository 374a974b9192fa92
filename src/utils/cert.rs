//! Root CA certificate loading
//!
//! The account's Active Directory connection carries the domain controller's
//! root CA certificate as base64 of the certificate file's text.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;
use tracing::debug;

use crate::error::{AnfError, Result};

/// Read a certificate file (typically PEM) and return its text.
pub async fn read_root_ca_cert(path: &Path) -> Result<String> {
    let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
        AnfError::config(format!(
            "Unable to read root CA certificate '{}': {}",
            path.display(),
            e
        ))
    })?;

    if contents.trim().is_empty() {
        return Err(AnfError::config(format!(
            "Root CA certificate '{}' is empty",
            path.display()
        )));
    }

    debug!("Read {} bytes of certificate from {}", contents.len(), path.display());
    Ok(contents)
}

pub fn encode_certificate(contents: &str) -> String {
    STANDARD.encode(contents.as_bytes())
}

/// Read and base64-encode the root CA certificate in one step
pub async fn load_encoded_root_ca_cert(path: &Path) -> Result<String> {
    let contents = read_root_ca_cert(path).await?;
    Ok(encode_certificate(&contents))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PEM: &str = "-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----\n";

    #[tokio::test]
    async fn test_load_encoded_root_ca_cert() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ad-server.cer");
        tokio::fs::write(&path, PEM).await.unwrap();

        let encoded = load_encoded_root_ca_cert(&path).await.unwrap();
        let decoded = STANDARD.decode(encoded).unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), PEM);
    }

    #[tokio::test]
    async fn test_empty_certificate_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.cer");
        tokio::fs::write(&path, "  \n").await.unwrap();

        assert!(matches!(
            load_encoded_root_ca_cert(&path).await,
            Err(AnfError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_certificate_rejected() {
        let result = load_encoded_root_ca_cert(Path::new("/nonexistent/ad-server.cer")).await;
        match result {
            Err(AnfError::ConfigError(msg)) => assert!(msg.contains("ad-server.cer")),
            _ => panic!("expected a configuration error"),
        }
    }

    #[test]
    fn test_encode_certificate() {
        assert_eq!(encode_certificate("CERT"), "Q0VSVA==");
    }
}
