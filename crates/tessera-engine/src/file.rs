//! In-memory files and their local disk I/O.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use tessera_types::{DEFAULT_CONTENT_TYPE, FileMeta};
use tracing::{debug, info};

use crate::error::EngineError;

/// A loaded file: immutable bytes plus the metadata recorded in its manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    /// File contents. Cloning is cheap and shares the buffer.
    pub data: Bytes,
    /// Base name, without any directory component.
    pub name: String,
    /// Detected media type.
    pub content_type: String,
}

impl File {
    /// Build a file from a name and contents, detecting the media type.
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let content_type = detect_content_type(&data).to_string();
        Self {
            data,
            name: name.into(),
            content_type,
        }
    }

    /// Size in bytes.
    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    /// Whether the file is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Metadata for building a manifest with the given part size.
    pub fn meta(&self, part_size: u32) -> FileMeta {
        FileMeta {
            name: self.name.clone(),
            content_type: self.content_type.clone(),
            total_size: self.len(),
            part_size,
        }
    }
}

/// Magic-number prefixes, checked in order.
const SIGNATURES: &[(&[u8], &str)] = &[
    (b"\x89PNG\r\n\x1a\n", "image/png"),
    (b"\xff\xd8\xff", "image/jpeg"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"%PDF-", "application/pdf"),
    (b"PK\x03\x04", "application/zip"),
    (b"\x1f\x8b", "application/gzip"),
    (b"\x7fELF", "application/x-elf"),
    (b"\0asm", "application/wasm"),
];

/// ISO-9660 volumes carry `CD001` at byte 32769.
const ISO9660_OFFSET: usize = 0x8001;

/// Detect a media type from the leading bytes of a file.
///
/// Falls back to `text/plain` for valid UTF-8 without control characters
/// and to `application/octet-stream` otherwise.
pub fn detect_content_type(data: &[u8]) -> &'static str {
    if let Some((_, mime)) = SIGNATURES.iter().find(|(magic, _)| data.starts_with(magic)) {
        return *mime;
    }

    if data.get(ISO9660_OFFSET..ISO9660_OFFSET + 5) == Some(b"CD001".as_slice()) {
        return "application/x-iso9660-image";
    }

    let head = &data[..data.len().min(8192)];
    let text = match std::str::from_utf8(head) {
        Ok(s) => Some(s),
        // A multi-byte character cut at the sample boundary is still text.
        Err(e) if e.error_len().is_none() => std::str::from_utf8(&head[..e.valid_up_to()]).ok(),
        Err(_) => None,
    };
    match text {
        Some(s) if !data.is_empty() && !s.chars().any(|c| c.is_control() && !c.is_whitespace()) => {
            "text/plain"
        }
        _ => DEFAULT_CONTENT_TYPE,
    }
}

/// Load a file from local disk.
///
/// The file's name is the base name of `path`.
pub async fn load_file(path: impl AsRef<Path>) -> Result<File, EngineError> {
    let path = path.as_ref();
    debug!(path = %path.display(), "loading file");

    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| EngineError::Read {
            path: path.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "path has no valid UTF-8 file name",
            ),
        })?
        .to_string();

    let data = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => EngineError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => EngineError::Read {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    let file = File::new(name, data);
    info!(
        name = %file.name,
        size = file.len(),
        content_type = %file.content_type,
        "file loaded"
    );
    Ok(file)
}

/// Write a file into `dir` under its own name, replacing any existing file.
///
/// The write goes to a temporary file first and is renamed into place.
/// Returns the final path.
pub async fn save_file(dir: impl AsRef<Path>, file: &File) -> Result<PathBuf, EngineError> {
    let dir = dir.as_ref();
    let path = dir.join(&file.name);

    if !is_plain_name(&file.name) {
        return Err(EngineError::Write {
            path,
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("refusing to write unsafe file name {:?}", file.name),
            ),
        });
    }

    let write_err = |path: &Path, source| EngineError::Write {
        path: path.to_path_buf(),
        source,
    };

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| write_err(dir, e))?;

    let tmp_path = dir.join(format!(".{}.partial", file.name));
    tokio::fs::write(&tmp_path, &file.data)
        .await
        .map_err(|e| write_err(&tmp_path, e))?;
    if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_err(&path, e));
    }

    info!(path = %path.display(), size = file.len(), "file saved");
    Ok(path)
}

/// A single path component that cannot escape its directory.
fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\', '\0'])
}
