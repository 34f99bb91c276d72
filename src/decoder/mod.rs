//! Decoder module for GAF archives
//!
//! - Pure synchronous core: [`GafArchive::parse`] over an in-memory buffer
//! - Async I/O wrapper so batch tools don't block on disk reads
//! - spawn_blocking for the heavy pointer-walk decode

pub mod error;
pub mod gaf;
pub mod reader;
pub mod records;
pub mod scanline;

pub use error::{GafError, RowWidthAnomaly};
pub use gaf::{Entry, Frame, FrameData, GafArchive, Layer};
pub use scanline::{Compression, LayerPixels, PixelFormat};

use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

/// File-loading driver around the pure decoder.
///
/// Owns the decoded archive plus bookkeeping for display (path, sizes,
/// counts). The decode itself never touches the filesystem; this type is
/// the seam where I/O happens.
pub struct Decoder {
    archive: Option<GafArchive>,
    file_path: Option<String>,
    file_size: u64,
}

impl Decoder {
    pub fn new() -> Self {
        Self {
            archive: None,
            file_path: None,
            file_size: 0,
        }
    }

    /// Load a GAF file synchronously (no Tokio runtime required).
    pub fn load(&mut self, path: &str) -> Result<()> {
        let p = Path::new(path);
        tracing::info!("Loading GAF file (sync): {:?}", p);

        let data = std::fs::read(p).context("Failed to read file")?;
        let file_size = data.len() as u64;
        let archive = GafArchive::parse(&data)?;

        self.finish_load(path, file_size, archive);
        Ok(())
    }

    /// Load a GAF file asynchronously (non-blocking).
    ///
    /// The file is read through Tokio and the decode runs on the blocking
    /// thread pool, so large archives decode without stalling the runtime.
    pub async fn load_async(&mut self, path: &str) -> Result<()> {
        let p = Path::new(path).to_path_buf();
        tracing::info!("Loading GAF file: {:?}", p);

        let data = fs::read(&p).await.context("Failed to read file")?;
        let file_size = data.len() as u64;

        let archive = tokio::task::spawn_blocking(move || GafArchive::parse(&data))
            .await
            .context("Spawn blocking task failed")??;

        self.finish_load(path, file_size, archive);
        Ok(())
    }

    fn finish_load(&mut self, path: &str, file_size: u64, archive: GafArchive) {
        tracing::info!(
            "GAF loaded: {} entries, {} frames, {} layers",
            archive.entries.len(),
            archive.frame_count(),
            archive.layer_count()
        );
        if !archive.anomalies.is_empty() {
            log::warn!(
                "{}: {} layer(s) needed row-width repair",
                path,
                archive.anomalies.len()
            );
        }

        self.archive = Some(archive);
        self.file_path = Some(path.to_string());
        self.file_size = file_size;
    }

    /// Get the loaded archive (if available)
    pub fn archive(&self) -> Option<&GafArchive> {
        self.archive.as_ref()
    }

    /// Get file path
    pub fn file_path(&self) -> Option<&str> {
        self.file_path.as_deref()
    }

    /// Size of the loaded file in bytes
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn entry_count(&self) -> usize {
        self.archive.as_ref().map_or(0, |a| a.entries.len())
    }

    pub fn frame_count(&self) -> usize {
        self.archive.as_ref().map_or(0, |a| a.frame_count())
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}
