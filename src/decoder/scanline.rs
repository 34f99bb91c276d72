//! Scanline codec for GAF layer pixel data.
//!
//! A leaf frame's pixel payload comes in one of three shapes, selected by
//! the record's compression flag: a verbatim palette-index copy, a
//! run-length-encoded palette-index stream, or a verbatim array of packed
//! 16-bit colors that stay packed until a caller converts them.
//!
//! RLE rows are byte-budgeted, not pixel-counted: each row opens with a
//! u16 byte count and the decoder consumes exactly that many control and
//! payload bytes, however many pixels that turns out to write. Unwritten
//! positions keep the frame's transparency index.

use super::error::GafError;
use super::reader::Reader;

/// Control byte bit0: advance the x cursor without writing.
pub const TRANSPARENCY_MASK: u8 = 0x01;
/// Control byte bit1: repeat one payload byte.
pub const REPEAT_MASK: u8 = 0x02;

/// Pixel data shapes selected by the frame data record's compression flag.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Verbatim palette indices, `width * height` bytes.
    Uncompressed = 0,
    /// Run-length-encoded palette indices, one byte-budgeted stream per row.
    Rle = 1,
    /// Verbatim packed 16-bit colors, 4 bits per channel.
    Argb4444 = 4,
    /// Verbatim packed 16-bit colors, 1-bit alpha and 5 bits per color.
    Argb1555 = 5,
}

impl TryFrom<u8> for Compression {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Uncompressed),
            1 => Ok(Self::Rle),
            4 => Ok(Self::Argb4444),
            5 => Ok(Self::Argb1555),
            _ => Err(()),
        }
    }
}

/// Source format of a packed 16-bit color layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Argb4444,
    Argb1555,
}

impl PixelFormat {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Argb4444 => "ARGB4444",
            Self::Argb1555 => "ARGB1555",
        }
    }
}

/// Decoded pixel payload of one layer, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerPixels {
    /// Palette indices, one byte per pixel. Not colors by themselves; an
    /// external color table resolves them.
    Indexed {
        width: usize,
        height: usize,
        pixels: Vec<u8>,
    },
    /// Packed 16-bit colors left in their source format for downstream
    /// conversion.
    Packed {
        format: PixelFormat,
        width: usize,
        height: usize,
        pixels: Vec<u16>,
    },
}

impl LayerPixels {
    pub fn width(&self) -> usize {
        match self {
            Self::Indexed { width, .. } | Self::Packed { width, .. } => *width,
        }
    }

    pub fn height(&self) -> usize {
        match self {
            Self::Indexed { height, .. } | Self::Packed { height, .. } => *height,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Indexed { .. } => "indexed",
            Self::Packed { format, .. } => format.name(),
        }
    }
}

/// Facts about a row-width repair, reported upward by the walker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRepair {
    pub declared_width: usize,
    pub padded_width: usize,
}

/// Decode one layer's pixel data.
///
/// `record_offset` is the offset of the owning frame data record, used only
/// for diagnostics. Returns the decoded pixels plus the row repair report
/// when the normalizer had to even out divergent row widths.
pub fn decode_layer(
    data: &[u8],
    record_offset: usize,
    flag: u8,
    data_offset: usize,
    width: u16,
    height: u16,
    transparency_index: u8,
) -> Result<(LayerPixels, Option<RowRepair>), GafError> {
    let width = width as usize;
    let height = height as usize;

    let compression = Compression::try_from(flag).map_err(|_| GafError::UnsupportedCompression {
        flag,
        offset: record_offset,
    })?;

    match compression {
        Compression::Uncompressed => {
            let mut rows = decode_uncompressed_rows(data, data_offset, width, height)?;
            let repair = normalize_rows(&mut rows, 0).map(|padded_width| RowRepair {
                declared_width: width,
                padded_width,
            });
            let (width, pixels) = flatten_rows(rows, width);
            Ok((
                LayerPixels::Indexed {
                    width,
                    height,
                    pixels,
                },
                repair,
            ))
        }
        Compression::Rle => {
            let mut rows = decode_rle_rows(data, data_offset, width, height, transparency_index)?;
            let repair = normalize_rows(&mut rows, transparency_index).map(|padded_width| {
                RowRepair {
                    declared_width: width,
                    padded_width,
                }
            });
            let (width, pixels) = flatten_rows(rows, width);
            Ok((
                LayerPixels::Indexed {
                    width,
                    height,
                    pixels,
                },
                repair,
            ))
        }
        Compression::Argb4444 => Ok((
            decode_packed(data, data_offset, width, height, PixelFormat::Argb4444)?,
            None,
        )),
        Compression::Argb1555 => Ok((
            decode_packed(data, data_offset, width, height, PixelFormat::Argb1555)?,
            None,
        )),
    }
}

fn decode_uncompressed_rows(
    data: &[u8],
    offset: usize,
    width: usize,
    height: usize,
) -> Result<Vec<Vec<u8>>, GafError> {
    let mut r = Reader::at(data, offset);
    let mut rows = Vec::with_capacity(height);
    for _ in 0..height {
        rows.push(r.read_bytes(width)?.to_vec());
    }
    Ok(rows)
}

fn decode_rle_rows(
    data: &[u8],
    offset: usize,
    width: usize,
    height: usize,
    transparency_index: u8,
) -> Result<Vec<Vec<u8>>, GafError> {
    let mut r = Reader::at(data, offset);
    let mut rows = Vec::with_capacity(height);

    for _ in 0..height {
        let budget = r.read_u16_le()? as usize;
        let row_start = r.position();
        let mut row = vec![transparency_index; width];
        let mut x = 0usize;

        while r.position() - row_start < budget {
            let mask = r.read_u8()?;

            if mask & TRANSPARENCY_MASK != 0 {
                x += (mask >> 1) as usize;
            } else if mask & REPEAT_MASK != 0 {
                let value = r.read_u8()?;
                let run = (mask >> 2) as usize + 1;
                for _ in 0..run {
                    put_pixel(&mut row, x, value, transparency_index);
                    x += 1;
                }
            } else {
                let run = (mask >> 2) as usize + 1;
                for _ in 0..run {
                    let value = r.read_u8()?;
                    put_pixel(&mut row, x, value, transparency_index);
                    x += 1;
                }
            }
        }

        // A run may consume past the declared budget; the next row starts
        // exactly `budget` bytes after this one either way.
        r.set_position(row_start + budget);
        rows.push(row);
    }

    Ok(rows)
}

/// Write one pixel, growing the row when a run overshoots the declared
/// width. Gaps opened by skip runs keep the transparency fill.
fn put_pixel(row: &mut Vec<u8>, x: usize, value: u8, fill: u8) {
    if x < row.len() {
        row[x] = value;
    } else {
        row.resize(x, fill);
        row.push(value);
    }
}

fn decode_packed(
    data: &[u8],
    offset: usize,
    width: usize,
    height: usize,
    format: PixelFormat,
) -> Result<LayerPixels, GafError> {
    let mut r = Reader::at(data, offset);
    let mut pixels = Vec::with_capacity(width * height);
    for _ in 0..width * height {
        pixels.push(r.read_u16_le()?);
    }
    Ok(LayerPixels::Packed {
        format,
        width,
        height,
        pixels,
    })
}

/// Row Normalizer: even out divergent row widths.
///
/// Rows already sharing one width pass through untouched. Otherwise every
/// short row is right-padded with `fill` up to the maximum observed width,
/// which is returned so the repair can be reported. Data is only ever
/// padded, never dropped.
pub fn normalize_rows(rows: &mut [Vec<u8>], fill: u8) -> Option<usize> {
    if rows.len() <= 1 {
        return None;
    }

    let max_width = rows.iter().map(|row| row.len()).max().unwrap_or(0);
    if rows.iter().all(|row| row.len() == max_width) {
        return None;
    }

    for row in rows.iter_mut() {
        row.resize(max_width, fill);
    }
    Some(max_width)
}

fn flatten_rows(rows: Vec<Vec<u8>>, fallback_width: usize) -> (usize, Vec<u8>) {
    let width = rows.first().map(|row| row.len()).unwrap_or(fallback_width);
    let mut pixels = Vec::with_capacity(width * rows.len());
    for row in rows {
        pixels.extend_from_slice(&row);
    }
    (width, pixels)
}
