//! Larger files, many chunks, and many concurrent transfers.

use std::sync::Arc;

use tessera_engine::{CancellationToken, File, Reassembler, Uploader};
use tessera_integration_tests::{TestServer, test_data};
use tessera_store::{MemoryGateway, SlowGateway, StorageGateway};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(60000)]
async fn test_many_small_chunks_multi_thread() {
    let gateway = Arc::new(MemoryGateway::new());
    let uploader = Uploader::new(gateway.clone(), 512, 16).unwrap();
    let reassembler = Reassembler::new(gateway, 16).unwrap();
    let cancel = CancellationToken::new();

    let file = File::new("many.bin", test_data(2_000_000));
    let manifest = uploader.store_file(&file, &cancel).await.unwrap();
    assert_eq!(manifest.chunk_count, 3907);

    let rebuilt = reassembler.reassemble(&manifest, &cancel).await.unwrap();
    assert_eq!(rebuilt, file);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(60000)]
async fn test_slow_backend_out_of_order() {
    let inner: Arc<dyn StorageGateway> = Arc::new(MemoryGateway::new());
    let gateway = Arc::new(SlowGateway::new(inner, 0..=15, 1234));
    let uploader = Uploader::new(gateway.clone(), 4096, 8).unwrap();
    let reassembler = Reassembler::new(gateway, 8).unwrap();
    let cancel = CancellationToken::new();

    let file = File::new("slow.bin", test_data(4096 * 100 + 1));
    let manifest = uploader.store_file(&file, &cancel).await.unwrap();
    let rebuilt = reassembler.reassemble(&manifest, &cancel).await.unwrap();
    assert_eq!(rebuilt, file);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(60000)]
async fn test_concurrent_files_over_http() {
    let server = TestServer::start().await;
    let cancel = CancellationToken::new();

    let mut handles = Vec::new();
    for i in 0..8usize {
        let client = server.client();
        let cancel = cancel.clone();
        handles.push(tokio::spawn(async move {
            let file = File::new(format!("f{i}.bin"), test_data(20_000 + i * 3_001));
            let manifest = Uploader::new(client.clone(), 2048, 4)
                .unwrap()
                .store_file(&file, &cancel)
                .await
                .unwrap();
            let rebuilt = Reassembler::new(client, 4)
                .unwrap()
                .reassemble(&manifest, &cancel)
                .await
                .unwrap();
            assert_eq!(rebuilt, file);
        }));
    }

    for h in handles {
        h.await.unwrap();
    }
    server.stop().await;
}
