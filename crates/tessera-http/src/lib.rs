//! HTTP access to content-addressable chunk storage.
//!
//! - [`HttpGateway`] — a [`StorageGateway`](tessera_store::StorageGateway)
//!   that talks to a remote backend configured by a
//!   [`GatewayConfig`](tessera_types::GatewayConfig).
//! - [`ChunkServer`] — an axum server exposing any gateway over the same
//!   protocol.
//!
//! ## Protocol
//!
//! - `PUT /chunks/{id}`: store the request body; `409` on conflicting bytes,
//!   `422` when the body does not hash to `id`.
//! - `GET /chunks/{id}`: chunk bytes, `404` if absent.
//! - `HEAD /chunks/{id}`: `200` if present, `404` if absent.
//!
//! `{id}` is the 64-character lowercase hex BLAKE3 digest of the chunk.

mod client;
mod error;
mod server;

pub use client::HttpGateway;
pub use error::ServerError;
pub use server::ChunkServer;
