//! XUR container reader.
//!
//! Reading validates the header, the section table, and the section set of
//! the declared version, then decodes each section in dependency order. The
//! String Table is decoded once and shared by the Object Tree decoder.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use memmap2::Mmap;
use tracing::{debug, error, info};

use super::data::ObjectTree;
use super::format::*;
use super::header::XurHeader;
use super::section::{codec_for, resolve_order, Phase, Section, SectionKind, SectionSet};
use super::strings::StringTable;
use super::table::{SectionEntry, SectionTable};
use super::vectors::VectorPool;
use super::writer::serialize;
use crate::core::{ClassSchemaProvider, UiObject};
use crate::util::{Error, Result};

/// A decoded XUR container.
///
/// All sections are decoded eagerly; the archive does not keep the source
/// bytes or file handle.
#[derive(Clone, Debug)]
pub struct IArchive {
    header: XurHeader,
    table: SectionTable,
    sections: SectionSet,
}

impl IArchive {
    /// Open and decode a file, memory-mapped when the `mmap` feature is on.
    pub fn open(path: impl AsRef<Path>, schema: &dyn ClassSchemaProvider) -> Result<Self> {
        Self::open_opts(path, cfg!(feature = "mmap"), schema)
    }

    /// Open and decode a file with optional memory mapping.
    pub fn open_opts(
        path: impl AsRef<Path>,
        use_mmap: bool,
        schema: &dyn ClassSchemaProvider,
    ) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound(path.to_path_buf())
            } else {
                Error::Io(e)
            }
        })?;

        let size = file.metadata()?.len();
        if size < HEADER_SIZE as u64 {
            return Err(Error::UnexpectedEof(size));
        }
        info!(path = %path.display(), size, use_mmap, "opening XUR file");

        if use_mmap {
            // Safety: the map is read-only and dropped before this call returns.
            let mmap = unsafe { Mmap::map(&file) }.map_err(|e| Error::MmapFailed(e.to_string()))?;
            Self::from_bytes(&mmap, schema)
        } else {
            let mut data = Vec::with_capacity(size as usize);
            file.read_to_end(&mut data)?;
            Self::from_bytes(&data, schema)
        }
    }

    /// Decode a complete container held in memory.
    pub fn from_bytes(data: &[u8], schema: &dyn ClassSchemaProvider) -> Result<Self> {
        let header = XurHeader::read(data)?;
        let version = header.version;
        let table = SectionTable::read(data, header.sections_count as usize)?;

        for entry in table.entries() {
            if !version.has_section(entry.magic) || codec_for(entry.magic).is_none() {
                error!(magic = %magic_to_string(entry.magic), %version, "unknown section");
                return Err(Error::UnknownSection { magic: entry.magic, version: version.number() });
            }
        }
        for &magic in version.section_order() {
            if table.entry_for(magic).is_none() {
                error!(magic = %magic_to_string(magic), %version, "missing required section");
                return Err(Error::MissingSection(magic));
            }
        }

        let magics: Vec<u32> = table.entries().iter().map(|e| e.magic).collect();
        let mut sections = SectionSet::new();
        for codec in resolve_order(&magics, version, Phase::Codec)? {
            let entry = table.entry_for(codec.magic).ok_or(Error::MissingSection(codec.magic))?;
            let section = codec.decode(data, entry, &sections, schema)?;
            sections.insert(section)?;
        }
        sections.sort_by_order(version.section_order());

        debug!(%version, sections = sections.len(), "decoded container");
        Ok(Self { header, table, sections })
    }

    pub fn header(&self) -> &XurHeader {
        &self.header
    }

    pub fn version(&self) -> FormatVersion {
        self.header.version
    }

    pub fn table(&self) -> &SectionTable {
        &self.table
    }

    /// Table entry for a section magic.
    pub fn table_entry_for(&self, magic: u32) -> Option<&SectionEntry> {
        self.table.entry_for(magic)
    }

    /// Decoded sections in file order.
    pub fn sections(&self) -> &[Section] {
        self.sections.as_slice()
    }

    /// Decoded section of type `T`.
    pub fn find_section<T: SectionKind>(&self) -> Option<&T> {
        self.sections.find::<T>()
    }

    pub fn strings(&self) -> Option<&StringTable> {
        self.find_section::<StringTable>()
    }

    /// Vector Pool; `None` for versions without one.
    pub fn vectors(&self) -> Option<&VectorPool> {
        self.find_section::<VectorPool>()
    }

    /// Root of the decoded object tree.
    pub fn root(&self) -> Option<&UiObject> {
        self.find_section::<ObjectTree>().map(ObjectTree::root)
    }

    /// Re-encode the decoded sections with this archive's header fields.
    pub fn to_bytes(&self, schema: &dyn ClassSchemaProvider) -> Result<Vec<u8>> {
        serialize(
            self.header.version,
            self.header.flags,
            self.header.tool_version,
            self.sections.as_slice(),
            schema,
        )
    }
}
