//! REST-level tests for the ARM operations client.
//!
//! Each test starts a local HTTP server that plays the part of the
//! management endpoint, including the long-running operation headers.

mod common;

use std::sync::Arc;
use std::time::Duration;

use anf_dual::error::AnfError;
use anf_dual::netapp::lro::PollOptions;
use anf_dual::netapp::models::{CapacityPool, ProtocolType, ServiceLevel};
use anf_dual::netapp::operations::{ArmClientOptions, AzureNetAppOperations, NetAppOperations};
use anf_dual::netapp::resource_id::ResourceId;
use anf_dual::utils::retry::RetryOptions;
use common::*;
use httptest::{matchers::*, responders::*, Expectation, Server};
use serde_json::json;

fn client(server: &Server, max_attempts: u32) -> AzureNetAppOperations {
    client_with_poll(
        server,
        PollOptions {
            interval: Duration::from_millis(1),
            max_attempts,
        },
    )
}

fn client_with_poll(server: &Server, poll: PollOptions) -> AzureNetAppOperations {
    let options = ArmClientOptions {
        endpoint: server.url_str(""),
        api_version: "2023-05-01".to_string(),
        poll,
        retry: RetryOptions {
            max_retries: 2,
            initial_interval: Duration::from_millis(1),
            max_interval: Duration::from_millis(2),
            multiplier: 2.0,
        },
    };
    AzureNetAppOperations::new(Arc::new(StaticTokenProvider), options).unwrap()
}

fn volume_id() -> ResourceId {
    ResourceId::volume(SUBSCRIPTION, "anf-rg", "anfacct", "pool1", "vol1")
}

fn pool_id() -> ResourceId {
    ResourceId::pool(SUBSCRIPTION, "anf-rg", "anfacct", "pool1")
}

#[tokio::test]
async fn test_create_volume_follows_async_operation() {
    let server = Server::run();
    let operation_url = server.url_str("/operations/op-1");

    server.expect(
        Expectation::matching(all_of![
            request::method_path("PUT", VOLUME_PATH),
            request::query(url_decoded(contains(("api-version", "2023-05-01")))),
            request::headers(contains(("authorization", "Bearer test-token"))),
            request::headers(contains(key("x-ms-client-request-id"))),
            request::body(json_decoded(|body: &serde_json::Value| {
                body["properties"]["protocolTypes"] == json!(["CIFS", "NFSv3"])
                    && body["properties"]["creationToken"] == json!("vol1")
            })),
        ])
        .respond_with(
            status_code(201)
                .insert_header("Azure-AsyncOperation", operation_url.as_str())
                .body(volume_json("Creating").to_string()),
        ),
    );
    server.expect(
        Expectation::matching(request::method_path("GET", "/operations/op-1"))
            .times(2)
            .respond_with(httptest::cycle![
                status_code(200).body(r#"{"status":"InProgress"}"#),
                status_code(200).body(r#"{"status":"Succeeded"}"#),
            ]),
    );
    server.expect(
        Expectation::matching(request::method_path("GET", VOLUME_PATH))
            .respond_with(status_code(200).body(volume_json("Succeeded").to_string())),
    );

    let ops = client(&server, 10);
    let body: anf_dual::netapp::Volume =
        serde_json::from_value(volume_json("Creating")).unwrap();
    let volume = ops.create_or_update_volume(&volume_id(), &body).await.unwrap();

    assert_eq!(
        volume.properties.protocol_types,
        vec![ProtocolType::Cifs, ProtocolType::NfsV3]
    );
    let target = volume.primary_mount_target().unwrap();
    assert_eq!(target.ip_address.as_deref(), Some("10.0.2.4"));
    assert_eq!(
        target.smb_server_fqdn.as_deref(),
        Some("testsmb-a1b2.testdomain.local")
    );
}

#[tokio::test]
async fn test_create_pool_polls_provisioning_state() {
    let server = Server::run();

    server.expect(
        Expectation::matching(request::method_path("PUT", POOL_PATH))
            .respond_with(status_code(200).body(pool_json("Creating").to_string())),
    );
    server.expect(
        Expectation::matching(request::method_path("GET", POOL_PATH))
            .times(3)
            .respond_with(httptest::cycle![
                status_code(200).body(pool_json("Creating").to_string()),
                status_code(200).body(pool_json("Succeeded").to_string()),
                status_code(200).body(pool_json("Succeeded").to_string()),
            ]),
    );

    let ops = client(&server, 10);
    let body = CapacityPool::new(
        "eastus",
        ServiceLevel::Standard,
        4398046511104,
        Default::default(),
    );
    let pool = ops.create_or_update_pool(&pool_id(), &body).await.unwrap();

    assert_eq!(pool.id.as_deref(), Some(POOL_PATH));
    assert_eq!(pool.properties.service_level, ServiceLevel::Standard);
}

#[tokio::test]
async fn test_failed_async_operation_reports_error() {
    let server = Server::run();
    let operation_url = server.url_str("/operations/op-2");

    server.expect(
        Expectation::matching(request::method_path("PUT", ACCOUNT_PATH)).respond_with(
            status_code(201)
                .insert_header("Azure-AsyncOperation", operation_url.as_str())
                .body(account_json("Creating").to_string()),
        ),
    );
    server.expect(
        Expectation::matching(request::method_path("GET", "/operations/op-2")).respond_with(
            status_code(200).body(
                json!({
                    "status": "Failed",
                    "error": {
                        "code": "InvalidDomainJoinCredentials",
                        "message": "Failed to join the domain"
                    }
                })
                .to_string(),
            ),
        ),
    );

    let ops = client(&server, 10);
    let id = ResourceId::account(SUBSCRIPTION, "anf-rg", "anfacct");
    let body = serde_json::from_value(account_json("Creating")).unwrap();
    let err = ops.create_or_update_account(&id, &body).await.unwrap_err();

    match err {
        AnfError::OperationFailed { status, message } => {
            assert_eq!(status, "Failed");
            assert_eq!(message, "InvalidDomainJoinCredentials: Failed to join the domain");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_arm_error_body_is_parsed() {
    let server = Server::run();

    server.expect(
        Expectation::matching(request::method_path("PUT", POOL_PATH)).respond_with(
            status_code(400).body(
                json!({
                    "error": {
                        "code": "PoolSizeTooSmall",
                        "message": "Capacity pool size must be at least 4 TiB"
                    }
                })
                .to_string(),
            ),
        ),
    );

    let ops = client(&server, 10);
    let body = CapacityPool::new("eastus", ServiceLevel::Standard, 1, Default::default());
    let err = ops.create_or_update_pool(&pool_id(), &body).await.unwrap_err();

    assert!(matches!(err, AnfError::AzureApiError { status: 400, .. }));
    assert_eq!(
        err.user_message(),
        "PoolSizeTooSmall: Capacity pool size must be at least 4 TiB"
    );
}

#[tokio::test]
async fn test_transient_errors_are_retried() {
    let server = Server::run();

    server.expect(
        Expectation::matching(request::method_path("GET", VOLUME_PATH))
            .times(2)
            .respond_with(httptest::cycle![
                status_code(503).body(r#"{"error":{"code":"ServiceUnavailable","message":"try again"}}"#),
                status_code(200).body(volume_json("Succeeded").to_string()),
            ]),
    );

    let ops = client(&server, 10);
    let volume = ops.get_volume(&volume_id()).await.unwrap();
    assert_eq!(volume.name.as_deref(), Some("anfacct/pool1/vol1"));
}

#[tokio::test]
async fn test_get_missing_resource_is_not_found() {
    let server = Server::run();

    server.expect(
        Expectation::matching(request::method_path("GET", VOLUME_PATH)).respond_with(
            status_code(404)
                .body(r#"{"error":{"code":"ResourceNotFound","message":"not found"}}"#),
        ),
    );

    let ops = client(&server, 10);
    let err = ops.get_volume(&volume_id()).await.unwrap_err();
    assert!(matches!(err, AnfError::ResourceNotFound { .. }));
}

#[tokio::test]
async fn test_delete_follows_location_header() {
    let server = Server::run();
    let location_url = server.url_str("/operations/delete-1");

    server.expect(
        Expectation::matching(request::method_path("DELETE", VOLUME_PATH)).respond_with(
            status_code(202).insert_header("Location", location_url.as_str()),
        ),
    );
    server.expect(
        Expectation::matching(request::method_path("GET", "/operations/delete-1"))
            .times(2)
            .respond_with(httptest::cycle![status_code(202), status_code(204)]),
    );

    let ops = client(&server, 10);
    ops.delete_volume(&volume_id()).await.unwrap();
}

#[tokio::test]
async fn test_delete_of_missing_resource_succeeds() {
    let server = Server::run();

    server.expect(
        Expectation::matching(request::method_path("DELETE", POOL_PATH))
            .respond_with(status_code(404)),
    );

    let ops = client(&server, 10);
    ops.delete_pool(&pool_id()).await.unwrap();
}

#[tokio::test]
async fn test_stuck_operation_times_out() {
    let server = Server::run();
    let operation_url = server.url_str("/operations/op-3");

    server.expect(
        Expectation::matching(request::method_path("DELETE", ACCOUNT_PATH)).respond_with(
            status_code(202).insert_header("Azure-AsyncOperation", operation_url.as_str()),
        ),
    );
    server.expect(
        Expectation::matching(request::method_path("GET", "/operations/op-3"))
            .times(3)
            .respond_with(status_code(200).body(r#"{"status":"Deleting"}"#)),
    );

    let ops = client(&server, 3);
    let id = ResourceId::account(SUBSCRIPTION, "anf-rg", "anfacct");
    let err = ops.delete_account(&id).await.unwrap_err();
    assert!(matches!(err, AnfError::Timeout(_)));
}

#[tokio::test]
async fn test_resource_exists() {
    let server = Server::run();

    server.expect(
        Expectation::matching(request::method_path("GET", VOLUME_PATH))
            .times(2)
            .respond_with(httptest::cycle![
                status_code(200).body(volume_json("Deleting").to_string()),
                status_code(404),
            ]),
    );

    let ops = client(&server, 10);
    assert!(ops.resource_exists(&volume_id()).await.unwrap());
    assert!(!ops.resource_exists(&volume_id()).await.unwrap());
}

#[tokio::test]
async fn test_retry_after_overrides_poll_interval() {
    let server = Server::run();
    let operation_url = server.url_str("/operations/op-4");

    server.expect(
        Expectation::matching(request::method_path("PUT", POOL_PATH)).respond_with(
            status_code(201)
                .insert_header("Azure-AsyncOperation", operation_url.as_str())
                .insert_header("Retry-After", "0")
                .body(pool_json("Creating").to_string()),
        ),
    );
    server.expect(
        Expectation::matching(request::method_path("GET", "/operations/op-4"))
            .times(2)
            .respond_with(httptest::cycle![
                status_code(200)
                    .insert_header("Retry-After", "0")
                    .body(r#"{"status":"InProgress"}"#),
                status_code(200).body(r#"{"status":"Succeeded"}"#),
            ]),
    );
    server.expect(
        Expectation::matching(request::method_path("GET", POOL_PATH))
            .respond_with(status_code(200).body(pool_json("Succeeded").to_string())),
    );

    let ops = client_with_poll(
        &server,
        PollOptions {
            interval: Duration::from_secs(3600),
            max_attempts: 5,
        },
    );
    let body = CapacityPool::new(
        "eastus",
        ServiceLevel::Standard,
        4398046511104,
        Default::default(),
    );

    let pool = tokio::time::timeout(
        Duration::from_secs(10),
        ops.create_or_update_pool(&pool_id(), &body),
    )
    .await
    .expect("Retry-After: 0 should not wait for the configured interval")
    .unwrap();
    assert_eq!(pool.id.as_deref(), Some(POOL_PATH));
}

#[tokio::test]
async fn test_truncated_body_is_a_network_error() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            let _ = socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\n{\"id\":")
                .await;
            let _ = socket.shutdown().await;
        }
    });

    let options = ArmClientOptions {
        endpoint: format!("http://{addr}"),
        api_version: "2023-05-01".to_string(),
        poll: PollOptions {
            interval: Duration::from_millis(1),
            max_attempts: 1,
        },
        retry: RetryOptions {
            max_retries: 0,
            initial_interval: Duration::from_millis(1),
            max_interval: Duration::from_millis(1),
            multiplier: 2.0,
        },
    };
    let ops = AzureNetAppOperations::new(Arc::new(StaticTokenProvider), options).unwrap();

    let err = ops.get_volume(&volume_id()).await.unwrap_err();
    assert!(matches!(err, AnfError::NetworkError(_)), "got {err:?}");
}
