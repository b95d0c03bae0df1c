//! Shared test harness for Tessera integration tests.
//!
//! Provides [`TestServer`], a chunk server on an ephemeral localhost port
//! backed by a temporary directory, plus deterministic test data.

use std::net::SocketAddr;
use std::sync::Arc;

use tempfile::TempDir;
use tessera_http::{ChunkServer, HttpGateway};
use tessera_store::FileGateway;
use tessera_types::{GatewayConfig, TransportProtocol};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Generate deterministic, non-repeating test data.
pub fn test_data(size: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(size);
    let mut state: u32 = 0xDEAD_BEEF;
    for _ in 0..size {
        state = state.wrapping_mul(1103515245).wrapping_add(12345);
        data.push((state >> 16) as u8);
    }
    data
}

/// A running chunk server over a [`FileGateway`] in a temp directory.
pub struct TestServer {
    pub addr: SocketAddr,
    pub backend: Arc<FileGateway>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<Result<(), std::io::Error>>,
    _dir: TempDir,
}

impl TestServer {
    /// Bind `127.0.0.1:0` and start serving.
    pub async fn start() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FileGateway::new(dir.path().join("chunks")).unwrap());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (tx, rx) = oneshot::channel();
        let server = ChunkServer::new(backend.clone());
        let handle = tokio::spawn(server.serve_with_shutdown(listener, async move {
            let _ = rx.await;
        }));

        Self {
            addr,
            backend,
            shutdown: Some(tx),
            handle,
            _dir: dir,
        }
    }

    /// Endpoint settings pointing at this server.
    pub fn config(&self) -> GatewayConfig {
        GatewayConfig {
            endpoint_host: self.addr.ip().to_string(),
            endpoint_port: self.addr.port(),
            protocol: TransportProtocol::Http,
        }
    }

    /// A fresh HTTP client for this server.
    pub fn client(&self) -> Arc<HttpGateway> {
        Arc::new(HttpGateway::new(&self.config()).unwrap())
    }

    /// Stop the server and wait for it to exit.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        (&mut self.handle).await.unwrap().unwrap();
    }
}
