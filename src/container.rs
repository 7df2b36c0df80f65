//! Container file lifecycle and naming.
//!
//! A container is one flat file holding `frame_count` frames contiguously.
//! It is created (or truncated) to its final size before the first mapping
//! and never grows afterwards; per-trial rotation just creates a sibling file
//! with a `_trialNN` suffix.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use log::info;

use crate::error::Result;
use crate::types::FrameGeometry;

/// An open container file of known, fixed size.
#[derive(Debug)]
pub struct Container {
    file: File,
    path: PathBuf,
    len: u64,
}

impl Container {
    /// Create or truncate a container of exactly `container_bytes`.
    pub fn create(path: &Path, container_bytes: u64) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.set_len(container_bytes)?;
        info!(
            "container created: {} ({} bytes)",
            path.display(),
            container_bytes
        );
        Ok(Self {
            file,
            path: path.to_path_buf(),
            len: container_bytes,
        })
    }

    /// Open an existing container read-only, checking it has the size the
    /// configured geometry implies. A mismatch means the file was written
    /// with different parameters and every frame offset would be wrong.
    pub fn open_readonly(path: &Path, expected_bytes: u64) -> Result<Self> {
        let file = OpenOptions::new().read(true).open(path)?;
        let len = file.metadata()?.len();
        if len != expected_bytes {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "container {} is {} bytes, expected {}",
                    path.display(),
                    len,
                    expected_bytes
                ),
            )
            .into());
        }
        Ok(Self {
            file,
            path: path.to_path_buf(),
            len,
        })
    }

    /// Underlying file handle, borrowed by mapping managers.
    pub fn file(&self) -> &File {
        &self.file
    }

    /// Path this container lives at.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Container size in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// True for a zero-byte container (never produced by a valid config).
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Standard container file name:
/// `burst_container_{w}x{h}_{bpp}bpp_{frames}frames[_trialNN].bin`.
pub fn container_file_name(
    geometry: FrameGeometry,
    frame_count: u64,
    trial: Option<u32>,
) -> String {
    let base = format!(
        "burst_container_{}x{}_{}bpp_{}frames",
        geometry.width,
        geometry.height,
        geometry.bits_per_pixel(),
        frame_count
    );
    match trial {
        Some(t) => format!("{base}_trial{t:02}.bin"),
        None => format!("{base}.bin"),
    }
}
