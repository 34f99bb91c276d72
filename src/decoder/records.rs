//! The four fixed record layouts of the GAF container format.
//!
//! ```text
//! ┌────────────────────────────────────────────┐
//! │ Header (12 bytes, offset 0)                │
//! │   VersionId: u32                           │
//! │   Entries: u32                             │
//! │   Unknown: u32                             │
//! ├────────────────────────────────────────────┤
//! │ Entry pointer table: Entries × u32         │
//! ├────────────────────────────────────────────┤
//! │ Entry (40 bytes, at each entry pointer)    │
//! │   Frames: u16                              │
//! │   Unknown1: u16, Unknown2: u32             │
//! │   Name: 32 bytes, NUL-terminated ASCII     │
//! │   ...followed by Frames × FrameRef (8 B)   │
//! ├────────────────────────────────────────────┤
//! │ FrameData (24 bytes, at each frame ptr)    │
//! │   Width/Height/XPos/YPos: u16              │
//! │   TransparencyIdx: u8, Compression: u8     │
//! │   SubFrames: u16, Unknown2: u32            │
//! │   PtrData: u32, Unknown3: u32              │
//! └────────────────────────────────────────────┘
//! ```
//!
//! All integers are little-endian. Every pointer is an absolute byte offset
//! into the same buffer. Layouts are data, not logic: each record declares
//! its field list and derives its size from it.

use super::error::GafError;
use super::reader::{decode_name, layout_size, FieldKind, Reader, NAME_CAPACITY};

/// Container header at offset 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GafHeader {
    pub version_id: u32,
    pub entry_count: u32,
    pub unknown: u32,
}

impl GafHeader {
    pub const LAYOUT: [FieldKind; 3] = [FieldKind::U32, FieldKind::U32, FieldKind::U32];
    pub const SIZE: usize = layout_size(&Self::LAYOUT);

    pub fn parse(data: &[u8], offset: usize) -> Result<Self, GafError> {
        let mut r = Reader::at(data, offset);
        let header = Self {
            version_id: r.read_u32_le()?,
            entry_count: r.read_u32_le()?,
            unknown: r.read_u32_le()?,
        };
        debug_assert_eq!(r.position() - offset, Self::SIZE);
        Ok(header)
    }
}

/// Entry record: a named animation set. The `frame_count` FrameRef records
/// follow contiguously right after the fixed fields.
#[derive(Debug, Clone)]
pub struct EntryRecord<'a> {
    pub frame_count: u16,
    pub unknown1: u16,
    pub unknown2: u32,
    /// Raw name field; decode with [`EntryRecord::name`].
    pub name_raw: &'a [u8],
}

impl<'a> EntryRecord<'a> {
    pub const LAYOUT: [FieldKind; 4] = [
        FieldKind::U16,
        FieldKind::U16,
        FieldKind::U32,
        FieldKind::Bytes(NAME_CAPACITY),
    ];
    pub const SIZE: usize = layout_size(&Self::LAYOUT);

    pub fn parse(data: &'a [u8], offset: usize) -> Result<Self, GafError> {
        let mut r = Reader::at(data, offset);
        let record = Self {
            frame_count: r.read_u16_le()?,
            unknown1: r.read_u16_le()?,
            unknown2: r.read_u32_le()?,
            name_raw: r.read_bytes(NAME_CAPACITY)?,
        };
        debug_assert_eq!(r.position() - offset, Self::SIZE);
        Ok(record)
    }

    /// Decode the embedded NUL-terminated name.
    pub fn name(&self) -> String {
        decode_name(self.name_raw)
    }
}

/// Frame reference: one element of an entry's contiguous frame table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRecord {
    /// Absolute offset of the FrameData record.
    pub frame_data_offset: u32,
    /// Display duration metadata; carried through, not interpreted.
    pub duration: u32,
}

impl FrameRecord {
    pub const LAYOUT: [FieldKind; 2] = [FieldKind::U32, FieldKind::U32];
    pub const SIZE: usize = layout_size(&Self::LAYOUT);

    pub fn parse(data: &[u8], offset: usize) -> Result<Self, GafError> {
        let mut r = Reader::at(data, offset);
        let record = Self {
            frame_data_offset: r.read_u32_le()?,
            duration: r.read_u32_le()?,
        };
        debug_assert_eq!(r.position() - offset, Self::SIZE);
        Ok(record)
    }
}

/// Frame data record. `sub_frame_count == 0` means `data_offset` points at
/// pixel data for a single layer; otherwise it points at a table of
/// `sub_frame_count` absolute pointers to further (leaf-only) FrameData
/// records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameDataRecord {
    pub width: u16,
    pub height: u16,
    pub x_offset: u16,
    pub y_offset: u16,
    pub transparency_index: u8,
    pub compression: u8,
    pub sub_frame_count: u16,
    pub unknown2: u32,
    pub data_offset: u32,
    pub unknown3: u32,
}

impl FrameDataRecord {
    pub const LAYOUT: [FieldKind; 10] = [
        FieldKind::U16,
        FieldKind::U16,
        FieldKind::U16,
        FieldKind::U16,
        FieldKind::U8,
        FieldKind::U8,
        FieldKind::U16,
        FieldKind::U32,
        FieldKind::U32,
        FieldKind::U32,
    ];
    pub const SIZE: usize = layout_size(&Self::LAYOUT);

    pub fn parse(data: &[u8], offset: usize) -> Result<Self, GafError> {
        let mut r = Reader::at(data, offset);
        let record = Self {
            width: r.read_u16_le()?,
            height: r.read_u16_le()?,
            x_offset: r.read_u16_le()?,
            y_offset: r.read_u16_le()?,
            transparency_index: r.read_u8()?,
            compression: r.read_u8()?,
            sub_frame_count: r.read_u16_le()?,
            unknown2: r.read_u32_le()?,
            data_offset: r.read_u32_le()?,
            unknown3: r.read_u32_le()?,
        };
        debug_assert_eq!(r.position() - offset, Self::SIZE);
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registered_sizes_match_summed_field_widths() {
        assert_eq!(GafHeader::SIZE, 4 + 4 + 4);
        assert_eq!(EntryRecord::SIZE, 2 + 2 + 4 + 32);
        assert_eq!(FrameRecord::SIZE, 4 + 4);
        assert_eq!(FrameDataRecord::SIZE, 2 + 2 + 2 + 2 + 1 + 1 + 2 + 4 + 4 + 4);
    }

    #[test]
    fn test_parse_header() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&0x0001_0100u32.to_le_bytes());
        buf.extend_from_slice(&3u32.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());

        let header = GafHeader::parse(&buf, 0).unwrap();
        assert_eq!(header.version_id, 0x0001_0100);
        assert_eq!(header.entry_count, 3);
    }

    #[test]
    fn test_parse_entry_record() {
        let mut buf = vec![0u8; 4]; // leading padding to exercise the offset
        buf.extend_from_slice(&7u16.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes());
        buf.extend_from_slice(&2u32.to_le_bytes());
        let mut name = [0u8; NAME_CAPACITY];
        name[..8].copy_from_slice(b"CORELAB1");
        buf.extend_from_slice(&name);

        let record = EntryRecord::parse(&buf, 4).unwrap();
        assert_eq!(record.frame_count, 7);
        assert_eq!(record.name(), "CORELAB1");
    }

    #[test]
    fn test_parse_frame_data_record() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&64u16.to_le_bytes()); // width
        buf.extend_from_slice(&48u16.to_le_bytes()); // height
        buf.extend_from_slice(&10u16.to_le_bytes()); // x offset
        buf.extend_from_slice(&20u16.to_le_bytes()); // y offset
        buf.push(9); // transparency index
        buf.push(1); // compression
        buf.extend_from_slice(&0u16.to_le_bytes()); // sub frames
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&0xDEAD_BEEFu32.to_le_bytes()); // data offset
        buf.extend_from_slice(&0u32.to_le_bytes());

        let record = FrameDataRecord::parse(&buf, 0).unwrap();
        assert_eq!(record.width, 64);
        assert_eq!(record.height, 48);
        assert_eq!(record.x_offset, 10);
        assert_eq!(record.y_offset, 20);
        assert_eq!(record.transparency_index, 9);
        assert_eq!(record.compression, 1);
        assert_eq!(record.sub_frame_count, 0);
        assert_eq!(record.data_offset, 0xDEAD_BEEF);
    }

    #[test]
    fn test_truncated_record_fails_at_the_short_field() {
        // Header cut one byte short of its third field.
        let buf = vec![0u8; GafHeader::SIZE - 1];
        let err = GafHeader::parse(&buf, 0).unwrap_err();
        assert_eq!(
            err,
            GafError::OutOfBounds {
                offset: 8,
                len: 4,
                buffer_len: 11,
            }
        );
    }
}
