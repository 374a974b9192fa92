//! NetApp resource operations against Azure Resource Manager
//!
//! This module issues the create, get and delete calls for accounts,
//! capacity pools and volumes, and drives each long-running operation to
//! completion before returning.

use async_trait::async_trait;
use reqwest::{header::HeaderMap, Client, Method};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::lro::{
    async_operation_state, location_state, parse_azure_error, poll_until, provisioning_state,
    ArmResponse, LroTracking, PollOptions, PollState,
};
use super::models::{CapacityPool, NetAppAccount, Volume};
use super::resource_id::ResourceId;
use crate::auth::provider::AzureAuthProvider;
use crate::error::{AnfError, Result};
use crate::utils::network::{classify_network_error, create_http_client, NetworkConfig};
use crate::utils::retry::{retry_with_backoff, RetryOptions};

/// Trait for NetApp resource operations
#[async_trait]
pub trait NetAppOperations: Send + Sync {
    /// Create or update an account and wait for provisioning to finish
    async fn create_or_update_account(
        &self,
        id: &ResourceId,
        account: &NetAppAccount,
    ) -> Result<NetAppAccount>;

    /// Create or update a capacity pool and wait for provisioning to finish
    async fn create_or_update_pool(&self, id: &ResourceId, pool: &CapacityPool)
        -> Result<CapacityPool>;

    /// Create or update a volume and wait for provisioning to finish
    async fn create_or_update_volume(&self, id: &ResourceId, volume: &Volume) -> Result<Volume>;

    async fn get_account(&self, id: &ResourceId) -> Result<NetAppAccount>;

    async fn get_pool(&self, id: &ResourceId) -> Result<CapacityPool>;

    async fn get_volume(&self, id: &ResourceId) -> Result<Volume>;

    /// Delete an account and wait for the operation to finish
    async fn delete_account(&self, id: &ResourceId) -> Result<()>;

    /// Delete a capacity pool and wait for the operation to finish
    async fn delete_pool(&self, id: &ResourceId) -> Result<()>;

    /// Delete a volume and wait for the operation to finish
    async fn delete_volume(&self, id: &ResourceId) -> Result<()>;

    /// Whether a GET of the resource currently succeeds
    async fn resource_exists(&self, id: &ResourceId) -> Result<bool>;
}

/// Settings for the ARM REST client
#[derive(Debug, Clone)]
pub struct ArmClientOptions {
    pub endpoint: String,
    pub api_version: String,
    pub poll: PollOptions,
    pub retry: RetryOptions,
}

impl Default for ArmClientOptions {
    fn default() -> Self {
        Self {
            endpoint: crate::config::DEFAULT_MANAGEMENT_ENDPOINT.to_string(),
            api_version: crate::config::DEFAULT_API_VERSION.to_string(),
            poll: PollOptions::default(),
            retry: RetryOptions {
                max_retries: 3,
                initial_interval: std::time::Duration::from_millis(1000),
                max_interval: std::time::Duration::from_millis(10000),
                multiplier: 2.0,
            },
        }
    }
}

/// Azure NetApp Files operations over the ARM REST API
pub struct AzureNetAppOperations {
    auth_provider: Arc<dyn AzureAuthProvider>,
    http_client: Client,
    options: ArmClientOptions,
}

impl AzureNetAppOperations {
    pub fn new(auth_provider: Arc<dyn AzureAuthProvider>, options: ArmClientOptions) -> Result<Self> {
        let http_client = create_http_client(&NetworkConfig::default())?;

        Ok(Self {
            auth_provider,
            http_client,
            options,
        })
    }

    fn endpoint(&self) -> &str {
        self.options.endpoint.trim_end_matches('/')
    }

    /// Get access token for Azure Resource Manager
    async fn get_management_token(&self) -> Result<String> {
        let scope = format!("{}/.default", self.endpoint());
        let token = self.auth_provider.get_token(&[scope.as_str()]).await?;
        Ok(token.token.secret().to_string())
    }

    /// Create authorized headers for Azure REST API
    async fn create_headers(&self) -> Result<HeaderMap> {
        let token = self.get_management_token().await?;
        let mut headers = HeaderMap::new();
        headers.insert(
            "Authorization",
            format!("Bearer {}", token)
                .parse()
                .map_err(|e| AnfError::authentication(format!("Invalid token format: {}", e)))?,
        );
        headers.insert(
            "x-ms-client-request-id",
            Uuid::new_v4()
                .to_string()
                .parse()
                .map_err(|e| AnfError::invalid_argument(format!("Invalid request id: {}", e)))?,
        );
        Ok(headers)
    }

    /// Build the ARM URL of a resource
    pub fn resource_url(&self, id: &ResourceId) -> String {
        format!(
            "{}{}?api-version={}",
            self.endpoint(),
            id,
            self.options.api_version
        )
    }

    /// One HTTP exchange; 404 is returned to the caller, other failures become errors
    async fn send_once(
        &self,
        method: Method,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<ArmResponse> {
        let headers = self.create_headers().await?;
        let mut request = self.http_client.request(method.clone(), url).headers(headers);
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!("{} {}", method, url);
        let response = request
            .send()
            .await
            .map_err(|e| classify_network_error(&e, url))?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let text = response
            .text()
            .await
            .map_err(|e| classify_network_error(&e, url))?;
        debug!("{} {} -> HTTP {}", method, url, status);

        if status == 404 || (200..300).contains(&status) {
            Ok(ArmResponse::from_parts(status, &headers, text))
        } else {
            Err(parse_azure_error(status, &text))
        }
    }

    /// Send with retry on transient failures
    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<ArmResponse> {
        retry_with_backoff(
            || self.send_once(method.clone(), url, body),
            self.options.retry.clone(),
        )
        .await
    }

    /// Wait until the operation started by `initial` has finished
    async fn wait_for_completion(
        &self,
        resource_url: &str,
        initial: &ArmResponse,
        is_put: bool,
    ) -> Result<()> {
        let options = &self.options.poll;
        let first_delay = initial.retry_after;
        match LroTracking::from_response(initial, is_put) {
            LroTracking::Completed => Ok(()),
            LroTracking::AsyncOperation(operation_url) => {
                let url = operation_url.as_str();
                poll_until(options, "Azure async operation", first_delay, move || async move {
                    let response = self.send(Method::GET, url, None).await?;
                    if response.is_not_found() {
                        return Err(AnfError::not_found(url));
                    }
                    async_operation_state(&response)
                })
                .await
            }
            LroTracking::Location(location_url) => {
                let url = location_url.as_str();
                poll_until(options, "Azure operation", first_delay, move || async move {
                    let response = self.send(Method::GET, url, None).await?;
                    location_state(&response)
                })
                .await
            }
            LroTracking::ResourceState => {
                poll_until(options, "Resource provisioning", first_delay, move || async move {
                    let response = self.send(Method::GET, resource_url, None).await?;
                    if response.is_not_found() {
                        return Ok(PollState::Pending {
                            retry_after: response.retry_after,
                        });
                    }
                    provisioning_state(&response)
                })
                .await
            }
        }
    }

    async fn put_resource<T, R>(&self, id: &ResourceId, resource: &T) -> Result<R>
    where
        T: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = self.resource_url(id);
        let body = serde_json::to_value(resource)?;

        info!("Creating or updating {}", id);
        let response = self.send(Method::PUT, &url, Some(&body)).await?;
        if response.is_not_found() {
            return Err(parse_azure_error(404, &response.body));
        }

        self.wait_for_completion(&url, &response, true).await?;
        self.get_resource(id).await
    }

    async fn get_resource<R: DeserializeOwned>(&self, id: &ResourceId) -> Result<R> {
        let url = self.resource_url(id);
        let response = self.send(Method::GET, &url, None).await?;

        if response.is_not_found() {
            return Err(AnfError::not_found(id.to_string()));
        }

        serde_json::from_str(&response.body).map_err(|e| {
            AnfError::serialization(format!("Failed to parse response for {}: {}", id, e))
        })
    }

    async fn delete_resource(&self, id: &ResourceId) -> Result<()> {
        let url = self.resource_url(id);

        info!("Deleting {}", id);
        let response = self.send(Method::DELETE, &url, None).await?;
        if response.status == 404 || response.status == 204 {
            debug!("{} is already gone", id);
            return Ok(());
        }

        self.wait_for_completion(&url, &response, false).await
    }
}

#[async_trait]
impl NetAppOperations for AzureNetAppOperations {
    async fn create_or_update_account(
        &self,
        id: &ResourceId,
        account: &NetAppAccount,
    ) -> Result<NetAppAccount> {
        self.put_resource(id, account).await
    }

    async fn create_or_update_pool(
        &self,
        id: &ResourceId,
        pool: &CapacityPool,
    ) -> Result<CapacityPool> {
        self.put_resource(id, pool).await
    }

    async fn create_or_update_volume(&self, id: &ResourceId, volume: &Volume) -> Result<Volume> {
        self.put_resource(id, volume).await
    }

    async fn get_account(&self, id: &ResourceId) -> Result<NetAppAccount> {
        self.get_resource(id).await
    }

    async fn get_pool(&self, id: &ResourceId) -> Result<CapacityPool> {
        self.get_resource(id).await
    }

    async fn get_volume(&self, id: &ResourceId) -> Result<Volume> {
        self.get_resource(id).await
    }

    async fn delete_account(&self, id: &ResourceId) -> Result<()> {
        self.delete_resource(id).await
    }

    async fn delete_pool(&self, id: &ResourceId) -> Result<()> {
        self.delete_resource(id).await
    }

    async fn delete_volume(&self, id: &ResourceId) -> Result<()> {
        self.delete_resource(id).await
    }

    async fn resource_exists(&self, id: &ResourceId) -> Result<bool> {
        let url = self.resource_url(id);
        let response = self.send(Method::GET, &url, None).await?;
        Ok(!response.is_not_found())
    }
}
