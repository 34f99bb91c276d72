//! libgaf: decoder for the GAF sprite animation container format.
//!
//! A GAF file is a flat buffer of named entries, each holding animation
//! frames whose pixel layers are stored raw, run-length encoded, or as
//! packed 16-bit colors. Records reference each other through absolute
//! byte offsets inside the file; decoding walks those pointers and
//! produces an owned entry → frame → layer tree.
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use libgaf::GafArchive;
//!
//! let data = std::fs::read("anims/armcom.gaf").unwrap();
//! let archive = GafArchive::parse(&data).unwrap();
//!
//! for entry in &archive.entries {
//!     println!("{}: {} frames", entry.name, entry.frames.len());
//! }
//! ```
//!
//! File I/O lives in [`Decoder`], which wraps the pure parser with sync
//! and async loading. Packed-color layers convert to 8-bit ARGB through
//! the [`color`] module.

pub mod color;
pub mod decoder;

// Re-export key types
pub use decoder::{
    Decoder, Entry, Frame, FrameData, GafArchive, GafError, Layer, LayerPixels, PixelFormat,
    RowWidthAnomaly,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
