//! Section table.
//!
//! `sectionsCount` entries of (magic, offset, length) follow the header.
//! Sections are located by magic; table order carries no meaning on read.

use std::io::Write;

use tracing::{error, trace};

use super::format::*;
use super::stream::{IStream, OStream};
use crate::util::{Error, Result};

/// Location of one section payload within the container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SectionEntry {
    pub magic: u32,
    /// Byte offset from the start of the container.
    pub offset: u32,
    /// Payload length in bytes.
    pub length: u32,
}

impl SectionEntry {
    /// Byte range of the payload within the container.
    #[inline]
    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset as usize..self.offset as usize + self.length as usize
    }
}

/// Ordered section table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SectionTable {
    entries: Vec<SectionEntry>,
}

impl SectionTable {
    /// Build a table by laying out payloads of the given lengths back to back
    /// after the header and the table itself.
    pub fn layout(sections: &[(u32, usize)]) -> Result<Self> {
        let mut offset = HEADER_SIZE + sections.len() * SECTION_ENTRY_SIZE;
        let mut entries = Vec::with_capacity(sections.len());
        for &(magic, length) in sections {
            let entry_offset = u32::try_from(offset)
                .map_err(|_| Error::invalid(format!("section offset {} exceeds int32", offset)))?;
            let entry_length = u32::try_from(length)
                .map_err(|_| Error::invalid(format!("section length {} exceeds int32", length)))?;
            entries.push(SectionEntry { magic, offset: entry_offset, length: entry_length });
            offset += length;
        }
        Ok(Self { entries })
    }

    /// Read `count` entries following the header of `data`.
    ///
    /// Every entry must lie within `data`; a magic may appear only once.
    pub fn read(data: &[u8], count: usize) -> Result<Self> {
        let table_end = HEADER_SIZE + count * SECTION_ENTRY_SIZE;
        if table_end > data.len() {
            return Err(Error::UnexpectedEof(table_end as u64));
        }

        let mut stream = IStream::new(&data[HEADER_SIZE..table_end], HEADER_SIZE as u64);
        let mut entries: Vec<SectionEntry> = Vec::with_capacity(count);
        for _ in 0..count {
            let magic = stream.read_u32()?;
            let offset = stream.read_i32()?;
            let length = stream.read_i32()?;

            let end = offset as i64 + length as i64;
            if offset < 0 || length < 0 || end > data.len() as i64 {
                error!(magic = %magic_to_string(magic), offset, length, "section outside stream");
                return Err(Error::SectionOutOfBounds {
                    magic,
                    offset: offset as i64,
                    length: length as i64,
                });
            }
            if entries.iter().any(|e| e.magic == magic) {
                error!(magic = %magic_to_string(magic), "duplicate section entry");
                return Err(Error::DuplicateSection(magic));
            }

            trace!(magic = %magic_to_string(magic), offset, length, "section entry");
            entries.push(SectionEntry { magic, offset: offset as u32, length: length as u32 });
        }

        Ok(Self { entries })
    }

    /// Write all entries.
    pub fn write<W: Write>(&self, out: &mut OStream<W>) -> Result<()> {
        for entry in &self.entries {
            out.write_u32(entry.magic)?;
            out.write_u32(entry.offset)?;
            out.write_u32(entry.length)?;
        }
        Ok(())
    }

    /// Entry for a section magic.
    pub fn entry_for(&self, magic: u32) -> Option<&SectionEntry> {
        self.entries.iter().find(|e| e.magic == magic)
    }

    /// Entries in table order.
    pub fn entries(&self) -> &[SectionEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Offset just past the last payload.
    pub fn end_offset(&self) -> usize {
        self.entries
            .iter()
            .map(|e| e.offset as usize + e.length as usize)
            .max()
            .unwrap_or(HEADER_SIZE + self.entries.len() * SECTION_ENTRY_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_offsets() {
        let table = SectionTable::layout(&[(STRN_MAGIC, 10), (VECT_MAGIC, 24), (DATA_MAGIC, 3)]).unwrap();
        let base = (HEADER_SIZE + 3 * SECTION_ENTRY_SIZE) as u32;
        assert_eq!(table.entry_for(STRN_MAGIC).unwrap().offset, base);
        assert_eq!(table.entry_for(VECT_MAGIC).unwrap().offset, base + 10);
        assert_eq!(table.entry_for(DATA_MAGIC).unwrap().offset, base + 34);
        assert_eq!(table.end_offset(), base as usize + 37);
    }

    fn container_with_table(entries: &[(u32, i32, i32)], total: usize) -> Vec<u8> {
        let mut data = vec![0u8; HEADER_SIZE];
        for &(magic, offset, length) in entries {
            data.extend_from_slice(&magic.to_be_bytes());
            data.extend_from_slice(&offset.to_be_bytes());
            data.extend_from_slice(&length.to_be_bytes());
        }
        data.resize(total, 0);
        data
    }

    #[test]
    fn test_read_table() {
        let data = container_with_table(&[(DATA_MAGIC, 44, 4), (STRN_MAGIC, 48, 2)], 50);
        let table = SectionTable::read(&data, 2).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.entries()[0].magic, DATA_MAGIC);
        assert_eq!(table.entry_for(STRN_MAGIC).unwrap().range(), 48..50);
        assert!(table.entry_for(VECT_MAGIC).is_none());
    }

    #[test]
    fn test_rejects_out_of_bounds() {
        let data = container_with_table(&[(STRN_MAGIC, 32, 100)], 40);
        assert!(matches!(SectionTable::read(&data, 1), Err(Error::SectionOutOfBounds { .. })));

        let data = container_with_table(&[(STRN_MAGIC, -4, 2)], 40);
        assert!(matches!(SectionTable::read(&data, 1), Err(Error::SectionOutOfBounds { .. })));
    }

    #[test]
    fn test_rejects_duplicate_magic() {
        let data = container_with_table(&[(STRN_MAGIC, 44, 2), (STRN_MAGIC, 46, 2)], 48);
        assert!(matches!(SectionTable::read(&data, 2), Err(Error::DuplicateSection(STRN_MAGIC))));
    }

    #[test]
    fn test_truncated_table() {
        let data = vec![0u8; HEADER_SIZE + 4];
        assert!(matches!(SectionTable::read(&data, 1), Err(Error::UnexpectedEof(_))));
    }
}
