//! XUR container writer.
//!
//! Writing is two-pass: section payloads are encoded first, in dependency
//! order, then the section table is laid out from their lengths and the
//! header, table and payloads are emitted in file order. The header's file
//! size always equals the number of bytes produced.

use std::path::Path;

use tracing::{debug, error, info};

use super::format::*;
use super::header::XurHeader;
use super::property::EncodeContext;
use super::section::{resolve_order, Phase, Section, SectionKind, SectionSet};
use super::stream::OStream;
use super::strings::StringTable;
use super::table::SectionTable;
use crate::core::{ClassSchemaProvider, UiObject};
use crate::util::{Error, Result};

/// Container writer settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OArchive {
    version: FormatVersion,
    flags: i32,
    tool_version: i16,
}

impl OArchive {
    /// Writer for `version` with zero flags and tool version.
    pub fn new(version: FormatVersion) -> Self {
        Self { version, flags: 0, tool_version: 0 }
    }

    /// Opaque header flags to store.
    pub fn with_flags(mut self, flags: i32) -> Self {
        self.flags = flags;
        self
    }

    /// Opaque tool version to store.
    pub fn with_tool_version(mut self, tool_version: i16) -> Self {
        self.tool_version = tool_version;
        self
    }

    pub fn version(&self) -> FormatVersion {
        self.version
    }

    /// Derive every section of this version from an object tree.
    ///
    /// The returned set is in file order.
    pub fn build_sections(&self, root: &UiObject) -> Result<SectionSet> {
        let mut sections = SectionSet::new();
        for codec in resolve_order(self.version.section_order(), self.version, Phase::Build)? {
            let section = codec.build(root, &sections)?;
            debug!(section = codec.name, "built section");
            sections.insert(section)?;
        }
        sections.sort_by_order(self.version.section_order());
        Ok(sections)
    }

    /// Encode a tree as a complete container.
    pub fn write_bytes(&self, root: &UiObject, schema: &dyn ClassSchemaProvider) -> Result<Vec<u8>> {
        let sections = self.build_sections(root)?;
        serialize(self.version, self.flags, self.tool_version, sections.as_slice(), schema)
    }

    /// Encode a tree and write it to `path`.
    pub fn write_file(
        &self,
        path: impl AsRef<Path>,
        root: &UiObject,
        schema: &dyn ClassSchemaProvider,
    ) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.write_bytes(root, schema)?;
        let mut out = OStream::create(path)?;
        out.write_bytes(&bytes)?;
        out.flush()?;
        info!(path = %path.display(), size = bytes.len(), version = %self.version, "wrote XUR file");
        Ok(())
    }
}

/// Encode `sections` as a container of `version`.
///
/// Exactly the sections of `version` must be present, once each; their order
/// in `sections` does not matter.
pub fn serialize(
    version: FormatVersion,
    flags: i32,
    tool_version: i16,
    sections: &[Section],
    schema: &dyn ClassSchemaProvider,
) -> Result<Vec<u8>> {
    let magics: Vec<u32> = sections.iter().map(Section::magic).collect();
    for (i, &magic) in magics.iter().enumerate() {
        if !version.has_section(magic) {
            return Err(Error::UnsupportedWrite { magic, version: version.number() });
        }
        if magics[..i].contains(&magic) {
            return Err(Error::DuplicateSection(magic));
        }
    }
    if let Some(&missing) = version.section_order().iter().find(|m| !magics.contains(m)) {
        return Err(Error::MissingSection(missing));
    }

    let strings = sections
        .iter()
        .find_map(StringTable::from_section)
        .ok_or(Error::MissingSection(STRN_MAGIC))?;
    let ctx = EncodeContext { strings: strings.index()?, schema };

    // Pass 1: payloads.
    let mut bodies: Vec<(u32, Vec<u8>)> = Vec::with_capacity(sections.len());
    for codec in resolve_order(&magics, version, Phase::Codec)? {
        let section = sections
            .iter()
            .find(|s| s.magic() == codec.magic)
            .ok_or(Error::MissingSection(codec.magic))?;
        let mut out = OStream::buffer();
        section.encode(&mut out, &ctx).inspect_err(|e| {
            error!(section = codec.name, error = %e, "failed to encode section");
        })?;
        debug!(section = codec.name, length = out.pos(), "encoded section");
        bodies.push((codec.magic, out.into_inner()));
    }
    let order = version.section_order();
    bodies.sort_by_key(|(magic, _)| order.iter().position(|m| m == magic));

    // Pass 2: table, header, payloads.
    let lengths: Vec<(u32, usize)> = bodies.iter().map(|(magic, body)| (*magic, body.len())).collect();
    let table = SectionTable::layout(&lengths)?;
    let file_size = table.end_offset();
    let header = XurHeader {
        version,
        flags,
        tool_version,
        file_size: u32::try_from(file_size)
            .map_err(|_| Error::invalid(format!("file size {} exceeds int32", file_size)))?,
        sections_count: bodies.len() as u16,
    };

    let mut out = OStream::new(Vec::with_capacity(file_size));
    header.write(&mut out)?;
    table.write(&mut out)?;
    for (_, body) in &bodies {
        out.write_bytes(body)?;
    }
    debug_assert_eq!(out.pos() as usize, file_size);

    debug!(%version, file_size, sections = bodies.len(), "serialized container");
    Ok(out.into_inner())
}
