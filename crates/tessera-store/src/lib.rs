//! Storage gateway trait and backend implementations.
//!
//! This crate defines the [`StorageGateway`] trait, the narrow put/get
//! boundary between Tessera and a content-addressable backend, along with
//! local backends:
//!
//! - [`MemoryGateway`] — in-memory storage backed by a `RwLock<HashMap>`.
//! - [`FileGateway`] — file-based storage with a 2-level fan-out directory layout.
//! - [`SlowGateway`] — wraps another gateway and injects random latency.

mod error;
mod file_gateway;
mod memory_gateway;
mod slow_gateway;
mod traits;

pub use error::GatewayError;
pub use file_gateway::FileGateway;
pub use memory_gateway::MemoryGateway;
pub use slow_gateway::SlowGateway;
pub use traits::StorageGateway;
