//! Pipelines tying chunking, addressing, and storage together.
//!
//! - [`load_file`] / [`save_file`] move a [`File`] between local disk and memory.
//! - [`Uploader`] — split → address → put → build the [`Manifest`](tessera_types::Manifest).
//! - [`Reassembler`] — fetch → verify → concatenate, from a manifest back to a [`File`].
//!
//! Both pipelines bound the number of concurrent gateway calls and stop
//! early when their [`CancellationToken`](tokio_util::sync::CancellationToken)
//! fires.

pub mod error;
pub mod file;
pub mod reassembler;
mod tasks;
pub mod uploader;

pub use error::EngineError;
pub use file::{File, detect_content_type, load_file, save_file};
pub use reassembler::{ChunkState, Reassembler};
pub use uploader::Uploader;
pub use tokio_util::sync::CancellationToken;

#[cfg(test)]
mod tests;
