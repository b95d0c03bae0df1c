//! `tessera` — store large files as content-addressed chunks.
//!
//! # Usage
//!
//! ```text
//! tessera put disk.img                      # chunk, upload, write disk.img.manifest
//! tessera put disk.img -o disk.manifest     # choose the manifest path
//! tessera get disk.img.manifest -o ./out    # fetch, verify, write ./out/disk.img
//! tessera inspect disk.img.manifest         # print manifest contents
//! tessera serve                             # run a chunk server over a local directory
//! tessera --backend file put disk.img       # skip the server, store chunks on disk
//! ```

mod config;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tessera_cas::{deserialize_manifest, manifest_id, serialize_manifest};
use tessera_engine::{CancellationToken, Reassembler, Uploader, load_file, save_file};
use tessera_http::{ChunkServer, HttpGateway};
use tessera_store::{FileGateway, StorageGateway};
use tessera_types::{Manifest, TransportProtocol};
use tracing::{info, warn};

use config::CliConfig;

// -----------------------------------------------------------------------
// CLI definition
// -----------------------------------------------------------------------

#[derive(Parser)]
#[command(
    name = "tessera",
    version,
    about = "Chunked, content-addressed file storage"
)]
struct Cli {
    /// Path to TOML config file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Storage backend: `http` or `file`.
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Chunk server host.
    #[arg(long, global = true, env = "TESSERA_GATEWAY_HOST")]
    host: Option<String>,

    /// Chunk server port.
    #[arg(long, global = true, env = "TESSERA_GATEWAY_PORT")]
    port: Option<u16>,

    /// Chunk server protocol: `http` or `https`.
    #[arg(long, global = true)]
    protocol: Option<TransportProtocol>,

    /// Chunk directory for the file backend and for `serve`.
    #[arg(long, global = true)]
    store_dir: Option<PathBuf>,

    /// Maximum concurrent gateway calls.
    #[arg(long, global = true)]
    max_in_flight: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a file into chunks, store them, and write its manifest.
    Put {
        /// File to store.
        path: PathBuf,

        /// Where to write the manifest (defaults to `<path>.manifest`).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Chunk size in bytes.
        #[arg(short, long)]
        part_size: Option<u32>,
    },

    /// Rebuild a file from its manifest.
    Get {
        /// Manifest written by `put`.
        manifest: PathBuf,

        /// Directory to write the file into.
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Print the contents of a manifest.
    Inspect {
        /// Manifest written by `put`.
        manifest: PathBuf,
    },

    /// Serve a chunk directory over HTTP.
    Serve {
        /// Listen address (defaults to `0.0.0.0:<port>`).
        #[arg(short, long)]
        listen: Option<SocketAddr>,
    },
}

// -----------------------------------------------------------------------
// Entrypoint
// -----------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = CliConfig::load(cli.config.as_deref()).context("failed to load config")?;

    setup_tracing(&config.log.level);

    // CLI args override config file values.
    if let Some(backend) = cli.backend {
        config.gateway.backend = backend;
    }
    if let Some(host) = cli.host {
        config.gateway.host = host;
    }
    if let Some(port) = cli.port {
        config.gateway.port = port;
    }
    if let Some(protocol) = cli.protocol {
        config.gateway.protocol = protocol;
    }
    if let Some(dir) = cli.store_dir {
        config.gateway.store_dir = dir;
    }
    if let Some(n) = cli.max_in_flight {
        config.transfer.max_in_flight = n;
    }
    config.validate().context("invalid configuration")?;

    match cli.command {
        Commands::Put {
            path,
            output,
            part_size,
        } => {
            if let Some(p) = part_size {
                config.transfer.part_size = p;
                config.validate().context("invalid --part-size")?;
            }
            cmd_put(&config, &path, output).await
        }
        Commands::Get { manifest, output } => cmd_get(&config, &manifest, &output).await,
        Commands::Inspect { manifest } => cmd_inspect(&manifest),
        Commands::Serve { listen } => cmd_serve(&config, listen).await,
    }
}

/// Initialize the `tracing` subscriber with the given level filter.
///
/// Respects `RUST_LOG` env var if set, otherwise uses the config value.
fn setup_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Build the gateway selected by `[gateway] backend`.
fn open_gateway(config: &CliConfig) -> Result<Arc<dyn StorageGateway>> {
    match config.gateway.backend.as_str() {
        "file" => {
            let gateway = FileGateway::new(&config.gateway.store_dir).with_context(|| {
                format!(
                    "failed to open chunk directory {}",
                    config.gateway.store_dir.display()
                )
            })?;
            info!(dir = %config.gateway.store_dir.display(), "using file gateway");
            Ok(Arc::new(gateway))
        }
        "http" => {
            let gateway = HttpGateway::new(&config.gateway_config())
                .context("failed to build http gateway")?;
            info!(url = %gateway.base_url(), "using http gateway");
            Ok(Arc::new(gateway))
        }
        other => anyhow::bail!("unknown gateway backend {other:?}"),
    }
}

/// A token that fires on Ctrl-C.
fn ctrl_c_token() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling");
            trigger.cancel();
        }
    });
    cancel
}

fn read_manifest(path: &Path) -> Result<Manifest> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    deserialize_manifest(&bytes).with_context(|| format!("invalid manifest {}", path.display()))
}

// -----------------------------------------------------------------------
// tessera put
// -----------------------------------------------------------------------

async fn cmd_put(config: &CliConfig, path: &Path, output: Option<PathBuf>) -> Result<()> {
    let gateway = open_gateway(config)?;
    let uploader = Uploader::new(
        gateway,
        config.transfer.part_size,
        config.transfer.max_in_flight,
    )?;

    let file = load_file(path).await?;
    let start = Instant::now();
    let manifest = uploader.store_file(&file, &ctrl_c_token()).await?;

    let bytes = serialize_manifest(&manifest)?;
    let id = manifest_id(&manifest)?;
    let output = output.unwrap_or_else(|| {
        let mut name = path.as_os_str().to_owned();
        name.push(".manifest");
        PathBuf::from(name)
    });
    std::fs::write(&output, &bytes)
        .with_context(|| format!("failed to write manifest {}", output.display()))?;

    info!(
        manifest = %output.display(),
        %id,
        chunks = manifest.chunk_count,
        size = manifest.total_size,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "stored"
    );
    println!("{id}  {}", output.display());
    Ok(())
}

// -----------------------------------------------------------------------
// tessera get
// -----------------------------------------------------------------------

async fn cmd_get(config: &CliConfig, manifest_path: &Path, output: &Path) -> Result<()> {
    let manifest = read_manifest(manifest_path)?;
    let gateway = open_gateway(config)?;
    let reassembler = Reassembler::new(gateway, config.transfer.max_in_flight)?;

    let start = Instant::now();
    let file = reassembler
        .reassemble(&manifest, &ctrl_c_token())
        .await
        .with_context(|| format!("failed to reassemble {}", manifest.name))?;
    let path = save_file(output, &file).await?;

    info!(
        path = %path.display(),
        size = file.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "restored"
    );
    println!("{}", path.display());
    Ok(())
}

// -----------------------------------------------------------------------
// tessera inspect
// -----------------------------------------------------------------------

fn cmd_inspect(manifest_path: &Path) -> Result<()> {
    let manifest = read_manifest(manifest_path)?;
    let id = manifest_id(&manifest)?;

    println!("manifest:     {id}");
    println!("name:         {}", manifest.name);
    println!("content type: {}", manifest.content_type);
    println!("total size:   {}", manifest.total_size);
    println!("part size:    {}", manifest.part_size);
    println!("chunks:       {}", manifest.chunk_count);
    for (index, chunk) in manifest.chunks.iter().enumerate() {
        let len = manifest.chunk_len(index).unwrap_or_default();
        println!("  {index:>6}  {chunk}  {len}");
    }
    Ok(())
}

// -----------------------------------------------------------------------
// tessera serve
// -----------------------------------------------------------------------

async fn cmd_serve(config: &CliConfig, listen: Option<SocketAddr>) -> Result<()> {
    let gateway = FileGateway::new(&config.gateway.store_dir).with_context(|| {
        format!(
            "failed to open chunk directory {}",
            config.gateway.store_dir.display()
        )
    })?;
    let addr = listen.unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], config.gateway.port)));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, dir = %config.gateway.store_dir.display(), "starting chunk server");

    let cancel = ctrl_c_token();
    ChunkServer::new(Arc::new(gateway))
        .serve_with_shutdown(listener, async move { cancel.cancelled().await })
        .await
        .context("chunk server failed")?;

    info!("chunk server stopped");
    Ok(())
}
