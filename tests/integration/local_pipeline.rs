//! Full local pipeline: disk → chunks on disk → manifest on disk → disk.
//!
//! Connects tessera-engine, tessera-cas and tessera-store without any
//! networking.

use std::sync::Arc;

use bytes::Bytes;
use tessera_cas::{Chunker, deserialize_manifest, manifest_id, serialize_manifest};
use tessera_engine::{
    CancellationToken, EngineError, Reassembler, Uploader, load_file, save_file,
};
use tessera_integration_tests::test_data;
use tessera_store::{FileGateway, StorageGateway};

#[tokio::test]
#[ntest::timeout(20000)]
async fn test_file_roundtrip_via_file_gateway() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("disk.img");
    std::fs::write(&src, test_data(1_000_000)).unwrap();

    let gateway = Arc::new(FileGateway::new(dir.path().join("chunks")).unwrap());
    let uploader = Uploader::new(gateway.clone(), 64 * 1024, 8).unwrap();
    let reassembler = Reassembler::new(gateway.clone(), 8).unwrap();
    let cancel = CancellationToken::new();

    // Store and persist the manifest.
    let file = load_file(&src).await.unwrap();
    let manifest = uploader.store_file(&file, &cancel).await.unwrap();
    let manifest_path = dir.path().join("disk.img.manifest");
    std::fs::write(&manifest_path, serialize_manifest(&manifest).unwrap()).unwrap();
    assert_eq!(manifest.chunk_count, 16);

    // Reload the manifest in a "later session" and rebuild.
    let loaded = deserialize_manifest(&std::fs::read(&manifest_path).unwrap()).unwrap();
    assert_eq!(manifest_id(&loaded).unwrap(), manifest_id(&manifest).unwrap());

    let rebuilt = reassembler.reassemble(&loaded, &cancel).await.unwrap();
    let out = save_file(dir.path().join("restore"), &rebuilt).await.unwrap();
    assert_eq!(std::fs::read(out).unwrap(), std::fs::read(&src).unwrap());
}

#[tokio::test]
#[ntest::timeout(10000)]
async fn test_chunks_on_disk_match_chunker() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = Arc::new(FileGateway::new(dir.path()).unwrap());
    let uploader = Uploader::new(gateway.clone(), 1000, 4).unwrap();

    let data = Bytes::from(test_data(2500));
    let file = tessera_engine::File::new("disk.img", data.clone());
    let manifest = uploader
        .store_file(&file, &CancellationToken::new())
        .await
        .unwrap();

    let chunks = Chunker::new(1000).unwrap().split(&data);
    let lens: Vec<_> = chunks.iter().map(|c| c.data.len()).collect();
    assert_eq!(lens, vec![1000, 1000, 500]);

    for chunk in chunks {
        assert_eq!(manifest.chunks[chunk.index as usize], chunk.id);
        assert!(gateway.chunk_path(&chunk.id).is_file());
        assert_eq!(gateway.get(chunk.id).await.unwrap(), chunk.data);
    }
}

#[tokio::test]
#[ntest::timeout(10000)]
async fn test_shared_chunks_across_files() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = Arc::new(FileGateway::new(dir.path()).unwrap());
    let uploader = Uploader::new(gateway.clone(), 1000, 4).unwrap();
    let reassembler = Reassembler::new(gateway, 4).unwrap();
    let cancel = CancellationToken::new();

    // The second file is the first with one part changed.
    let base = test_data(5000);
    let mut edited = base.clone();
    edited[2500] ^= 0x01;

    let a = tessera_engine::File::new("a.bin", base);
    let b = tessera_engine::File::new("b.bin", edited);
    let ma = uploader.store_file(&a, &cancel).await.unwrap();
    let mb = uploader.store_file(&b, &cancel).await.unwrap();

    let shared = ma
        .chunks
        .iter()
        .zip(&mb.chunks)
        .filter(|(x, y)| x == y)
        .count();
    assert_eq!(shared, 4);

    assert_eq!(reassembler.reassemble(&ma, &cancel).await.unwrap(), a);
    assert_eq!(reassembler.reassemble(&mb, &cancel).await.unwrap(), b);
}

#[tokio::test]
#[ntest::timeout(10000)]
async fn test_missing_source_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_file(dir.path().join("nope.iso")).await.unwrap_err();
    assert!(matches!(err, EngineError::FileNotFound { .. }));
}
