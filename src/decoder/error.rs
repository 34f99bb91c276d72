//! Error taxonomy for GAF decoding.
//!
//! Structural failures abort the whole decode: once one offset is wrong,
//! nothing downstream of it can be trusted. Content-level anomalies are
//! repaired in place and reported on the archive instead.

use thiserror::Error;

/// Fatal decode errors. Every variant carries enough context (byte offset,
/// record kind) to locate the fault in the source buffer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GafError {
    /// A field read would run past the end of the buffer.
    #[error("read of {len} bytes at offset {offset:#x} runs past the end of the buffer ({buffer_len} bytes)")]
    OutOfBounds {
        offset: usize,
        len: usize,
        buffer_len: usize,
    },

    /// The frame data record declares a compression flag the codec does not know.
    #[error("unsupported compression flag {flag} in frame data at offset {offset:#x}")]
    UnsupportedCompression { flag: u8, offset: usize },

    /// A multi-layer frame referenced a sub-frame that is itself multi-layer.
    /// Layers compose exactly one level deep.
    #[error("multi-layer frame data at offset {offset:#x} contains another multi-layer frame")]
    InvalidNesting { offset: usize },
}

/// Report for a layer whose scanlines decoded to different widths.
///
/// Non-fatal: the Row Normalizer pads the short rows and decoding continues,
/// but the caller gets to see that the source data was malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowWidthAnomaly {
    /// Name of the entry the layer belongs to.
    pub entry: String,
    /// Frame index within the entry.
    pub frame_index: usize,
    /// Offset of the layer's pixel data in the source buffer.
    pub data_offset: usize,
    /// Width declared by the frame data record.
    pub declared_width: usize,
    /// Width every row was padded to (the maximum observed row length).
    pub padded_width: usize,
}
