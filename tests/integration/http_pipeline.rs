//! Store and reassemble through a chunk server over HTTP.

use std::sync::Arc;

use bytes::Bytes;
use tessera_engine::{CancellationToken, EngineError, File, Reassembler, Uploader};
use tessera_http::HttpGateway;
use tessera_integration_tests::{TestServer, test_data};
use tessera_store::StorageGateway;
use tessera_types::{GatewayConfig, TransportProtocol};

#[tokio::test]
#[ntest::timeout(20000)]
async fn test_roundtrip_over_http() {
    let server = TestServer::start().await;
    let client = server.client();
    let uploader = Uploader::new(client.clone(), 16 * 1024, 4).unwrap();
    let reassembler = Reassembler::new(client, 4).unwrap();
    let cancel = CancellationToken::new();

    let file = File::new("image.iso", test_data(300_000));
    let manifest = uploader.store_file(&file, &cancel).await.unwrap();
    assert_eq!(manifest.chunk_count, 19);

    let rebuilt = reassembler.reassemble(&manifest, &cancel).await.unwrap();
    assert_eq!(rebuilt, file);

    server.stop().await;
}

#[tokio::test]
#[ntest::timeout(20000)]
async fn test_separate_clients_for_store_and_fetch() {
    let server = TestServer::start().await;
    let cancel = CancellationToken::new();
    let file = File::new("notes.txt", b"line one\nline two\n".repeat(1000));

    let manifest = Uploader::new(server.client(), 4096, 2)
        .unwrap()
        .store_file(&file, &cancel)
        .await
        .unwrap();

    let rebuilt = Reassembler::new(server.client(), 2)
        .unwrap()
        .reassemble(&manifest, &cancel)
        .await
        .unwrap();
    assert_eq!(rebuilt.content_type, "text/plain");
    assert_eq!(rebuilt, file);

    server.stop().await;
}

#[tokio::test]
#[ntest::timeout(20000)]
async fn test_corruption_behind_server_detected() {
    let server = TestServer::start().await;
    let client = server.client();
    let cancel = CancellationToken::new();

    let manifest = Uploader::new(client.clone(), 1000, 4)
        .unwrap()
        .store_file(&File::new("disk.img", test_data(2500)), &cancel)
        .await
        .unwrap();

    let victim = manifest.chunks[1];
    std::fs::write(server.backend.chunk_path(&victim), b"flipped bits").unwrap();

    let err = Reassembler::new(client, 4)
        .unwrap()
        .reassemble(&manifest, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::CorruptChunk { index: 1, .. }));

    server.stop().await;
}

#[tokio::test]
#[ntest::timeout(20000)]
async fn test_missing_chunk_behind_server() {
    let server = TestServer::start().await;
    let client = server.client();
    let cancel = CancellationToken::new();

    let manifest = Uploader::new(client.clone(), 1000, 4)
        .unwrap()
        .store_file(&File::new("disk.img", test_data(2500)), &cancel)
        .await
        .unwrap();
    std::fs::remove_file(server.backend.chunk_path(&manifest.chunks[0])).unwrap();

    let err = Reassembler::new(client, 4)
        .unwrap()
        .reassemble(&manifest, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ChunkNotFound { index: 0, .. }));
    assert!(err.is_retriable());

    server.stop().await;
}

#[tokio::test]
#[ntest::timeout(20000)]
async fn test_server_down_is_retriable() {
    let server = TestServer::start().await;
    let config = server.config();
    server.stop().await;

    let client = Arc::new(HttpGateway::new(&config).unwrap());
    let err = Uploader::new(client, 1000, 2)
        .unwrap()
        .store_file(
            &File::new("x.bin", test_data(1500)),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ChunkStore { .. }));
    assert!(err.is_retriable());
}

#[tokio::test]
#[ntest::timeout(10000)]
async fn test_https_base_url() {
    let client = HttpGateway::new(&GatewayConfig {
        endpoint_host: "storage.example".to_string(),
        endpoint_port: 8443,
        protocol: TransportProtocol::Https,
    })
    .unwrap();
    assert_eq!(client.base_url(), "https://storage.example:8443");
}

#[tokio::test]
#[ntest::timeout(20000)]
async fn test_put_is_idempotent_over_http() {
    let server = TestServer::start().await;
    let client = server.client();
    let data = Bytes::from(test_data(4096));
    let id = tessera_types::ChunkId::from_data(&data);

    client.put(id, data.clone()).await.unwrap();
    client.put(id, data.clone()).await.unwrap();
    assert_eq!(client.get(id).await.unwrap(), data);

    server.stop().await;
}
