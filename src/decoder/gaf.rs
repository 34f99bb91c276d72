//! GAF archive decoding: the pointer walk from container header to pixels.
//!
//! The whole structure lives as absolute offsets inside one flat buffer:
//! header → entry pointer table → per-entry frame table → frame data →
//! pixel data. The walker chases those offsets strictly top-down and
//! materializes an owned tree; the source buffer is never mutated and
//! nothing in the output points back into it.

use super::error::{GafError, RowWidthAnomaly};
use super::reader::Reader;
use super::records::{EntryRecord, FrameDataRecord, FrameRecord, GafHeader};
use super::scanline::{decode_layer, LayerPixels};

/// A fully decoded GAF container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GafArchive {
    /// Format version word from the container header.
    pub version_id: u32,
    /// Entries in pointer-table order.
    pub entries: Vec<Entry>,
    /// Row-width repairs encountered during decoding. Empty for well-formed
    /// files; non-empty decodes are still usable, just suspect.
    pub anomalies: Vec<RowWidthAnomaly>,
}

impl GafArchive {
    /// Decode a GAF container from an in-memory buffer.
    ///
    /// Pure and deterministic: the same buffer always yields the same
    /// archive. Structural faults (bad offsets, unknown compression,
    /// nested multi-layer frames) abort the whole decode.
    pub fn parse(data: &[u8]) -> Result<Self, GafError> {
        Walker::new(data).walk()
    }

    /// Total frame count across all entries.
    pub fn frame_count(&self) -> usize {
        self.entries.iter().map(|entry| entry.frames.len()).sum()
    }

    /// Total layer count across all frames.
    pub fn layer_count(&self) -> usize {
        self.entries
            .iter()
            .flat_map(|entry| &entry.frames)
            .map(|frame| frame.data.layer_count())
            .sum()
    }

    /// Look up an entry by its embedded name.
    pub fn entry(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.name == name)
    }
}

/// A named animation set: one sprite/unit's full set of frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    /// Frames in frame-table order.
    pub frames: Vec<Frame>,
}

/// One animation frame plus its display duration metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub duration: u32,
    pub data: FrameData,
}

/// A frame is either one layer or a stack of sub-layers composed at
/// display time. Composition is exactly one level deep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameData {
    Single(Layer),
    Multi(Vec<Layer>),
}

impl FrameData {
    pub fn layer_count(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Multi(layers) => layers.len(),
        }
    }

    /// Iterate the frame's layers regardless of shape.
    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        match self {
            Self::Single(layer) => std::slice::from_ref(layer).iter(),
            Self::Multi(layers) => layers.iter(),
        }
    }
}

/// Decoded pixel payload of one leaf frame, plus its display placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    /// Width declared by the frame data record. The pixel payload may be
    /// wider if the normalizer had to repair divergent rows.
    pub width: u16,
    pub height: u16,
    pub x_offset: u16,
    pub y_offset: u16,
    /// Palette index treated as transparent for this layer.
    pub transparency_index: u8,
    pub pixels: LayerPixels,
}

/// Top-down walk state. The buffer is the only shared resource and it is
/// read-only for the whole decode.
struct Walker<'a> {
    data: &'a [u8],
    anomalies: Vec<RowWidthAnomaly>,
}

impl<'a> Walker<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            anomalies: Vec::new(),
        }
    }

    fn walk(mut self) -> Result<GafArchive, GafError> {
        let header = GafHeader::parse(self.data, 0)?;

        let mut entries = Vec::with_capacity(header.entry_count as usize);
        let mut table = Reader::at(self.data, GafHeader::SIZE);
        for _ in 0..header.entry_count {
            let entry_offset = table.read_u32_le()? as usize;
            entries.push(self.parse_entry(entry_offset)?);
        }

        Ok(GafArchive {
            version_id: header.version_id,
            entries,
            anomalies: self.anomalies,
        })
    }

    fn parse_entry(&mut self, offset: usize) -> Result<Entry, GafError> {
        let record = EntryRecord::parse(self.data, offset)?;
        let name = record.name();

        let table_offset = offset + EntryRecord::SIZE;
        let mut frames = Vec::with_capacity(record.frame_count as usize);
        for i in 0..record.frame_count as usize {
            let frame_ref = FrameRecord::parse(self.data, table_offset + i * FrameRecord::SIZE)?;
            let data = self.parse_frame_data(frame_ref.frame_data_offset as usize, &name, i)?;
            frames.push(Frame {
                duration: frame_ref.duration,
                data,
            });
        }

        Ok(Entry { name, frames })
    }

    fn parse_frame_data(
        &mut self,
        offset: usize,
        entry: &str,
        frame_index: usize,
    ) -> Result<FrameData, GafError> {
        let record = FrameDataRecord::parse(self.data, offset)?;

        if record.sub_frame_count == 0 {
            return Ok(FrameData::Single(self.decode_leaf(
                &record,
                offset,
                entry,
                frame_index,
            )?));
        }

        // data_offset points at a table of pointers to leaf records.
        let mut table = Reader::at(self.data, record.data_offset as usize);
        let mut layers = Vec::with_capacity(record.sub_frame_count as usize);
        for _ in 0..record.sub_frame_count {
            let sub_offset = table.read_u32_le()? as usize;
            layers.push(self.parse_sub_layer(sub_offset, entry, frame_index)?);
        }

        Ok(FrameData::Multi(layers))
    }

    /// Sub-frames must be leaves; a multi-layer record below a multi-layer
    /// record violates the format's one-level composition contract.
    fn parse_sub_layer(
        &mut self,
        offset: usize,
        entry: &str,
        frame_index: usize,
    ) -> Result<Layer, GafError> {
        let record = FrameDataRecord::parse(self.data, offset)?;
        if record.sub_frame_count != 0 {
            return Err(GafError::InvalidNesting { offset });
        }
        self.decode_leaf(&record, offset, entry, frame_index)
    }

    fn decode_leaf(
        &mut self,
        record: &FrameDataRecord,
        offset: usize,
        entry: &str,
        frame_index: usize,
    ) -> Result<Layer, GafError> {
        let (pixels, repair) = decode_layer(
            self.data,
            offset,
            record.compression,
            record.data_offset as usize,
            record.width,
            record.height,
            record.transparency_index,
        )?;

        if let Some(repair) = repair {
            log::warn!(
                "entry '{}' frame {}: rows decoded to different widths, padded {} -> {}",
                entry,
                frame_index,
                repair.declared_width,
                repair.padded_width
            );
            self.anomalies.push(RowWidthAnomaly {
                entry: entry.to_string(),
                frame_index,
                data_offset: record.data_offset as usize,
                declared_width: repair.declared_width,
                padded_width: repair.padded_width,
            });
        }

        Ok(Layer {
            width: record.width,
            height: record.height,
            x_offset: record.x_offset,
            y_offset: record.y_offset,
            transparency_index: record.transparency_index,
            pixels,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::records::{EntryRecord, FrameDataRecord, FrameRecord, GafHeader};

    /// Little builder for synthetic GAF buffers. Offsets are absolute, so
    /// fixtures lay records out back to back and precompute where each one
    /// lands.
    struct Fixture {
        buf: Vec<u8>,
    }

    impl Fixture {
        fn new() -> Self {
            Self { buf: Vec::new() }
        }

        fn u16(&mut self, v: u16) -> &mut Self {
            self.buf.extend_from_slice(&v.to_le_bytes());
            self
        }

        fn u32(&mut self, v: u32) -> &mut Self {
            self.buf.extend_from_slice(&v.to_le_bytes());
            self
        }

        fn u8(&mut self, v: u8) -> &mut Self {
            self.buf.push(v);
            self
        }

        fn bytes(&mut self, v: &[u8]) -> &mut Self {
            self.buf.extend_from_slice(v);
            self
        }

        fn name32(&mut self, name: &str) -> &mut Self {
            let mut field = [0u8; 32];
            field[..name.len()].copy_from_slice(name.as_bytes());
            self.bytes(&field)
        }

        fn header(&mut self, version_id: u32, entry_count: u32) -> &mut Self {
            self.u32(version_id).u32(entry_count).u32(0)
        }

        fn entry(&mut self, name: &str, frame_count: u16) -> &mut Self {
            self.u16(frame_count).u16(0).u32(0).name32(name)
        }

        fn frame_ref(&mut self, data_offset: u32, duration: u32) -> &mut Self {
            self.u32(data_offset).u32(duration)
        }

        #[allow(clippy::too_many_arguments)]
        fn frame_data(
            &mut self,
            width: u16,
            height: u16,
            transparency: u8,
            compression: u8,
            sub_frames: u16,
            data_offset: u32,
        ) -> &mut Self {
            self.u16(width)
                .u16(height)
                .u16(0)
                .u16(0)
                .u8(transparency)
                .u8(compression)
                .u16(sub_frames)
                .u32(0)
                .u32(data_offset)
                .u32(0)
        }
    }

    // Layout shared by the single-entry fixtures below:
    //   0   header
    //   12  entry pointer table (1 pointer)
    //   16  entry record
    //   56  frame table (1 frame ref)
    //   64  frame data record
    //   88  pixel data / sub-frame pointer table
    const ENTRY_AT: u32 = (GafHeader::SIZE + 4) as u32;
    const FRAME_TABLE_AT: usize = ENTRY_AT as usize + EntryRecord::SIZE;
    const FRAME_DATA_AT: u32 = (FRAME_TABLE_AT + FrameRecord::SIZE) as u32;
    const PIXELS_AT: u32 = FRAME_DATA_AT + FrameDataRecord::SIZE as u32;

    #[test]
    fn test_decode_single_entry_uncompressed_frame() {
        let mut fx = Fixture::new();
        fx.header(100, 1).u32(ENTRY_AT);
        fx.entry("unit", 1);
        fx.frame_ref(FRAME_DATA_AT, 120);
        fx.frame_data(2, 1, 0, 0, 0, PIXELS_AT);
        fx.bytes(&[7, 9]);

        let archive = GafArchive::parse(&fx.buf).unwrap();
        assert_eq!(archive.version_id, 100);
        assert_eq!(archive.entries.len(), 1);
        assert!(archive.anomalies.is_empty());

        let entry = &archive.entries[0];
        assert_eq!(entry.name, "unit");
        assert_eq!(entry.frames.len(), 1);

        let frame = &entry.frames[0];
        assert_eq!(frame.duration, 120);
        match &frame.data {
            FrameData::Single(layer) => {
                assert_eq!(layer.width, 2);
                assert_eq!(layer.height, 1);
                assert_eq!(
                    layer.pixels,
                    LayerPixels::Indexed {
                        width: 2,
                        height: 1,
                        pixels: vec![7, 9],
                    }
                );
            }
            other => panic!("expected single-layer frame, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_is_deterministic() {
        let mut fx = Fixture::new();
        fx.header(100, 1).u32(ENTRY_AT);
        fx.entry("unit", 1);
        fx.frame_ref(FRAME_DATA_AT, 0);
        fx.frame_data(2, 2, 5, 1, 0, PIXELS_AT);
        // Two RLE rows: repeat + literal
        fx.bytes(&[2, 0, 0x06, 8]).bytes(&[3, 0, 0x00, 1, 0x03]);

        let first = GafArchive::parse(&fx.buf).unwrap();
        let second = GafArchive::parse(&fx.buf).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_decode_multi_layer_frame_in_pointer_order() {
        let mut fx = Fixture::new();
        fx.header(0x0001_0100, 1).u32(ENTRY_AT);
        fx.entry("blast", 1);
        fx.frame_ref(FRAME_DATA_AT, 0);
        // Composite record: two sub-frame pointers at PIXELS_AT.
        fx.frame_data(0, 0, 0, 0, 2, PIXELS_AT);

        let leaf_a = PIXELS_AT as usize + 8;
        let leaf_b = leaf_a + FrameDataRecord::SIZE;
        let pixels_a = (leaf_b + FrameDataRecord::SIZE) as u32;
        let pixels_b = pixels_a + 1;
        fx.u32(leaf_a as u32).u32(leaf_b as u32);
        fx.frame_data(1, 1, 0, 0, 0, pixels_a);
        fx.frame_data(1, 1, 0, 0, 0, pixels_b);
        fx.bytes(&[5]).bytes(&[6]);

        let archive = GafArchive::parse(&fx.buf).unwrap();
        let frame = &archive.entries[0].frames[0];
        match &frame.data {
            FrameData::Multi(layers) => {
                assert_eq!(layers.len(), 2);
                assert_eq!(
                    layers[0].pixels,
                    LayerPixels::Indexed {
                        width: 1,
                        height: 1,
                        pixels: vec![5],
                    }
                );
                assert_eq!(
                    layers[1].pixels,
                    LayerPixels::Indexed {
                        width: 1,
                        height: 1,
                        pixels: vec![6],
                    }
                );
            }
            other => panic!("expected multi-layer frame, got {:?}", other),
        }
        assert_eq!(archive.layer_count(), 2);
    }

    #[test]
    fn test_nested_multi_layer_frame_is_rejected() {
        let mut fx = Fixture::new();
        fx.header(0x0001_0100, 1).u32(ENTRY_AT);
        fx.entry("bad", 1);
        fx.frame_ref(FRAME_DATA_AT, 0);
        fx.frame_data(0, 0, 0, 0, 1, PIXELS_AT);

        let sub_at = PIXELS_AT as usize + 4;
        fx.u32(sub_at as u32);
        // The sub-frame is itself composite: invalid.
        fx.frame_data(0, 0, 0, 0, 1, 0);

        let err = GafArchive::parse(&fx.buf).unwrap_err();
        assert_eq!(err, GafError::InvalidNesting { offset: sub_at });
    }

    #[test]
    fn test_row_width_anomaly_is_reported_not_fatal() {
        let mut fx = Fixture::new();
        fx.header(100, 1).u32(ENTRY_AT);
        fx.entry("wreck", 1);
        fx.frame_ref(FRAME_DATA_AT, 0);
        fx.frame_data(2, 2, 0, 1, 0, PIXELS_AT);
        // Row 1 overruns the declared width, row 2 does not.
        fx.bytes(&[5, 0, 0x0C, 1, 2, 3, 4]);
        fx.bytes(&[2, 0, 0x00, 9]);

        let archive = GafArchive::parse(&fx.buf).unwrap();
        assert_eq!(archive.anomalies.len(), 1);
        let anomaly = &archive.anomalies[0];
        assert_eq!(anomaly.entry, "wreck");
        assert_eq!(anomaly.frame_index, 0);
        assert_eq!(anomaly.data_offset, PIXELS_AT as usize);
        assert_eq!(anomaly.declared_width, 2);
        assert_eq!(anomaly.padded_width, 4);

        match &archive.entries[0].frames[0].data {
            FrameData::Single(layer) => {
                assert_eq!(layer.width, 2);
                assert_eq!(layer.pixels.width(), 4);
            }
            other => panic!("expected single-layer frame, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_entry_pointer_aborts_decode() {
        let mut fx = Fixture::new();
        fx.header(100, 1).u32(0x00FF_FFFF);

        let err = GafArchive::parse(&fx.buf).unwrap_err();
        assert!(matches!(err, GafError::OutOfBounds { .. }));
    }

    #[test]
    fn test_entry_count_beyond_pointer_table_aborts_decode() {
        // Header claims two entries but only one pointer follows.
        let mut fx = Fixture::new();
        fx.header(100, 2).u32(ENTRY_AT);
        fx.entry("only", 0);

        let err = GafArchive::parse(&fx.buf).unwrap_err();
        assert!(matches!(err, GafError::OutOfBounds { .. }));
    }

    #[test]
    fn test_empty_container() {
        let mut fx = Fixture::new();
        fx.header(0x0001_0100, 0);

        let archive = GafArchive::parse(&fx.buf).unwrap();
        assert!(archive.entries.is_empty());
        assert_eq!(archive.frame_count(), 0);
    }

    #[test]
    fn test_entry_lookup_by_name() {
        let mut fx = Fixture::new();
        // Two entries with zero frames each; pointer table holds both.
        let entry_a = (GafHeader::SIZE + 8) as u32;
        let entry_b = entry_a + EntryRecord::SIZE as u32;
        fx.header(100, 2).u32(entry_a).u32(entry_b);
        fx.entry("first", 0);
        fx.entry("second", 0);

        let archive = GafArchive::parse(&fx.buf).unwrap();
        assert_eq!(archive.entry("second").unwrap().name, "second");
        assert!(archive.entry("third").is_none());
    }
}
