//! Authentication provider trait and implementations
//!
//! This module defines the authentication provider trait and provides
//! implementations for the Azure credential types anf-dual supports.

use async_trait::async_trait;
use azure_core::auth::{AccessToken, TokenCredential};
use azure_identity::{ClientSecretCredential, DefaultAzureCredential, TokenCredentialOptions};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::error::{AnfError, Result};

const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Trait for Azure authentication providers
#[async_trait]
pub trait AzureAuthProvider: Send + Sync {
    /// Get an access token for the specified scopes
    async fn get_token(&self, scopes: &[&str]) -> Result<AccessToken>;
}

/// Default Azure Credential Provider using DefaultAzureCredential
pub struct DefaultAzureCredentialProvider {
    credential: Arc<DefaultAzureCredential>,
}

impl DefaultAzureCredentialProvider {
    /// Create a new DefaultAzureCredentialProvider
    pub fn new() -> Result<Self> {
        let credential = Arc::new(
            DefaultAzureCredential::create(TokenCredentialOptions::default()).map_err(|e| {
                AnfError::authentication(format!("Failed to create DefaultAzureCredential: {}", e))
            })?,
        );

        Ok(Self { credential })
    }
}

#[async_trait]
impl AzureAuthProvider for DefaultAzureCredentialProvider {
    async fn get_token(&self, scopes: &[&str]) -> Result<AccessToken> {
        debug!("Requesting token for scopes {:?}", scopes);
        self.credential
            .get_token(scopes)
            .await
            .map_err(|e| AnfError::authentication(format!("Failed to get token: {}", e)))
    }
}

/// Service principal authentication with a client secret
pub struct ClientSecretProvider {
    credential: Arc<ClientSecretCredential>,
    client_id: String,
}

impl ClientSecretProvider {
    /// Create a new ClientSecretProvider
    pub fn new(tenant_id: String, client_id: String, client_secret: String) -> Result<Self> {
        let authority_url = url::Url::parse(DEFAULT_AUTHORITY_HOST)
            .map_err(|e| AnfError::config(format!("Invalid authority URL: {}", e)))?;

        let credential = Arc::new(ClientSecretCredential::new(
            azure_core::new_http_client(),
            authority_url,
            tenant_id,
            client_id.clone(),
            client_secret,
        ));

        Ok(Self {
            credential,
            client_id,
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }
}

#[async_trait]
impl AzureAuthProvider for ClientSecretProvider {
    async fn get_token(&self, scopes: &[&str]) -> Result<AccessToken> {
        debug!(
            "Requesting token for service principal {} and scopes {:?}",
            self.client_id, scopes
        );
        self.credential
            .get_token(scopes)
            .await
            .map_err(|e| AnfError::authentication(format!("Failed to get token: {}", e)))
    }
}

/// Authentication provider factory
pub struct AuthProviderFactory;

impl AuthProviderFactory {
    /// Create an authentication provider based on configuration
    pub fn create_provider(
        provider_type: &str,
        config: &HashMap<String, String>,
    ) -> Result<Arc<dyn AzureAuthProvider>> {
        match provider_type.to_lowercase().as_str() {
            "default" | "defaultazurecredential" => {
                Ok(Arc::new(DefaultAzureCredentialProvider::new()?))
            }
            "clientsecret" | "client_secret" | "serviceprincipal" => {
                let tenant_id = non_empty(config, "tenant_id").ok_or_else(|| {
                    AnfError::config("tenant_id is required for client secret authentication")
                })?;
                let client_id = non_empty(config, "client_id").ok_or_else(|| {
                    AnfError::config("client_id is required for client secret authentication")
                })?;
                let client_secret = non_empty(config, "client_secret").ok_or_else(|| {
                    AnfError::config("client_secret is required for client secret authentication")
                })?;

                Ok(Arc::new(ClientSecretProvider::new(
                    tenant_id,
                    client_id,
                    client_secret,
                )?))
            }
            _ => Err(AnfError::config(format!(
                "Unsupported authentication provider: {}",
                provider_type
            ))),
        }
    }
}

fn non_empty(config: &HashMap<String, String>, key: &str) -> Option<String> {
    config
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_provider_rejected() {
        let result = AuthProviderFactory::create_provider("kerberos", &HashMap::new());
        assert!(matches!(result, Err(AnfError::ConfigError(_))));
    }

    #[test]
    fn test_client_secret_requires_tenant() {
        let mut settings = HashMap::new();
        settings.insert("client_id".to_string(), "app".to_string());
        settings.insert("client_secret".to_string(), "secret".to_string());

        match AuthProviderFactory::create_provider("clientsecret", &settings) {
            Err(AnfError::ConfigError(msg)) => assert!(msg.contains("tenant_id")),
            _ => panic!("expected a configuration error"),
        }
    }

    #[test]
    fn test_client_secret_blank_values_rejected() {
        let mut settings = HashMap::new();
        settings.insert("tenant_id".to_string(), "tenant".to_string());
        settings.insert("client_id".to_string(), "   ".to_string());
        settings.insert("client_secret".to_string(), "secret".to_string());

        match AuthProviderFactory::create_provider("ClientSecret", &settings) {
            Err(AnfError::ConfigError(msg)) => assert!(msg.contains("client_id")),
            _ => panic!("expected a configuration error"),
        }
    }

    #[test]
    fn test_client_secret_provider_created() {
        let mut settings = HashMap::new();
        settings.insert("tenant_id".to_string(), "tenant".to_string());
        settings.insert("client_id".to_string(), "app-id".to_string());
        settings.insert("client_secret".to_string(), "secret".to_string());

        let provider = ClientSecretProvider::new(
            settings["tenant_id"].clone(),
            settings["client_id"].clone(),
            settings["client_secret"].clone(),
        )
        .unwrap();
        assert_eq!(provider.client_id(), "app-id");
    }
}
