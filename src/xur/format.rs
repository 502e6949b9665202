//! XUR format constants and structures.

use crate::util::{Error, Result};

/// Magic at the start of every XUR container: "XUIB".
pub const XUR_MAGIC: u32 = 0x5855_4942;

/// Size of the fixed container header in bytes.
/// 4 (magic) + 4 (version) + 4 (flags) + 2 (tool version) + 4 (file size) + 2 (sections count)
pub const HEADER_SIZE: usize = 20;

/// Size of one section table entry: magic, offset, length.
pub const SECTION_ENTRY_SIZE: usize = 12;

/// String Table section magic: "STRN".
pub const STRN_MAGIC: u32 = 0x5354_524E;

/// Vector Pool section magic: "VECT".
pub const VECT_MAGIC: u32 = 0x5645_4354;

/// Object Tree section magic: "DATA".
pub const DATA_MAGIC: u32 = 0x4441_5441;

/// Object record flag: a properties block follows.
pub const OBJECT_HAS_PROPERTIES: u8 = 0x01;

/// Object record flag: a child count and child records follow.
pub const OBJECT_HAS_CHILDREN: u8 = 0x02;

/// Object record flag: named frames (and, with children, timelines) follow.
pub const OBJECT_HAS_TIMELINE_DATA: u8 = 0x04;

/// Supported container generations.
///
/// A file must match one of these exactly; there is no partial compatibility.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormatVersion {
    /// Version 5: string table and object tree only.
    V5,
    /// Version 8: adds the vector pool.
    V8,
}

impl FormatVersion {
    /// Version number as stored in the header.
    pub const fn number(self) -> i32 {
        match self {
            FormatVersion::V5 => 5,
            FormatVersion::V8 => 8,
        }
    }

    /// Resolve a header version number.
    pub fn from_number(version: i32) -> Result<Self> {
        match version {
            5 => Ok(FormatVersion::V5),
            8 => Ok(FormatVersion::V8),
            v => Err(Error::UnsupportedVersion(v)),
        }
    }

    /// Sections this version carries, in file and table order.
    pub const fn section_order(self) -> &'static [u32] {
        match self {
            FormatVersion::V5 => &[STRN_MAGIC, DATA_MAGIC],
            FormatVersion::V8 => &[STRN_MAGIC, VECT_MAGIC, DATA_MAGIC],
        }
    }

    /// Check if a section magic belongs to this version.
    pub fn has_section(self, magic: u32) -> bool {
        self.section_order().contains(&magic)
    }
}

impl std::fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "XUR{}", self.number())
    }
}

/// Render a magic number as its four-character tag, e.g. `STRN`.
pub fn magic_to_string(magic: u32) -> String {
    magic
        .to_be_bytes()
        .iter()
        .map(|&b| if b.is_ascii_graphic() { b as char } else { '?' })
        .collect()
}

/// Number of mask bytes for a level with `definition_count` definitions.
#[inline]
pub const fn mask_count(definition_count: usize) -> usize {
    let n = definition_count.div_ceil(8);
    if n == 0 { 1 } else { n }
}
