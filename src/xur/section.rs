//! Sections and the section registry.
//!
//! Every section kind is registered once, keyed by magic, together with the
//! sections it depends on:
//!
//! | Section | Decode / encode after | Build after |
//! |---------|-----------------------|-------------|
//! | STRN    | -                     | DATA        |
//! | VECT    | -                     | DATA        |
//! | DATA    | STRN                  | -           |
//!
//! Decoding the object tree needs the string table; building the string
//! table and vector pool walks the object tree. Processing order is derived
//! from these edges, file order from [`FormatVersion::section_order`].

use std::io::Write;

use tracing::{debug, error};

use super::data::ObjectTree;
use super::format::*;
use super::property::{DecodeContext, EncodeContext};
use super::stream::{IStream, OStream};
use super::strings::StringTable;
use super::table::SectionEntry;
use super::vectors::VectorPool;
use crate::core::{ClassSchemaProvider, UiObject};
use crate::util::{Error, Result};

/// A decoded or built section.
#[derive(Clone, Debug, PartialEq)]
pub enum Section {
    StringTable(StringTable),
    VectorPool(VectorPool),
    ObjectTree(ObjectTree),
}

impl Section {
    pub fn magic(&self) -> u32 {
        match self {
            Section::StringTable(_) => STRN_MAGIC,
            Section::VectorPool(_) => VECT_MAGIC,
            Section::ObjectTree(_) => DATA_MAGIC,
        }
    }

    /// Write the section payload.
    pub fn encode<W: Write>(&self, out: &mut OStream<W>, ctx: &EncodeContext<'_>) -> Result<()> {
        match self {
            Section::StringTable(strings) => strings.write(out),
            Section::VectorPool(vectors) => vectors.write(out),
            Section::ObjectTree(tree) => tree.write(out, ctx),
        }
    }

    /// Payload size, computed by encoding into a counting sink.
    pub fn encoded_len(&self, ctx: &EncodeContext<'_>) -> Result<usize> {
        let mut counter = OStream::counter();
        self.encode(&mut counter, ctx)?;
        Ok(counter.pos() as usize)
    }
}

/// A concrete section type that can be looked up by type.
pub trait SectionKind: Sized {
    const MAGIC: u32;

    fn from_section(section: &Section) -> Option<&Self>;
}

impl SectionKind for StringTable {
    const MAGIC: u32 = STRN_MAGIC;

    fn from_section(section: &Section) -> Option<&Self> {
        match section {
            Section::StringTable(s) => Some(s),
            _ => None,
        }
    }
}

impl SectionKind for VectorPool {
    const MAGIC: u32 = VECT_MAGIC;

    fn from_section(section: &Section) -> Option<&Self> {
        match section {
            Section::VectorPool(s) => Some(s),
            _ => None,
        }
    }
}

impl SectionKind for ObjectTree {
    const MAGIC: u32 = DATA_MAGIC;

    fn from_section(section: &Section) -> Option<&Self> {
        match section {
            Section::ObjectTree(s) => Some(s),
            _ => None,
        }
    }
}

/// Sections keyed by magic, at most one per magic.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SectionSet {
    sections: Vec<Section>,
}

impl SectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, section: Section) -> Result<()> {
        let magic = section.magic();
        if self.get(magic).is_some() {
            return Err(Error::DuplicateSection(magic));
        }
        self.sections.push(section);
        Ok(())
    }

    pub fn get(&self, magic: u32) -> Option<&Section> {
        self.sections.iter().find(|s| s.magic() == magic)
    }

    /// Typed lookup.
    pub fn find<T: SectionKind>(&self) -> Option<&T> {
        self.get(T::MAGIC).and_then(T::from_section)
    }

    /// Typed lookup; absence is [`Error::MissingSection`].
    pub fn require<T: SectionKind>(&self) -> Result<&T> {
        self.find::<T>().ok_or(Error::MissingSection(T::MAGIC))
    }

    /// Reorder to match `order`; magics not listed keep their relative order at the end.
    pub fn sort_by_order(&mut self, order: &[u32]) {
        self.sections
            .sort_by_key(|s| order.iter().position(|&m| m == s.magic()).unwrap_or(order.len()));
    }

    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    pub fn as_slice(&self) -> &[Section] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

type DecodeFn = fn(&mut IStream<'_>, &SectionSet, &dyn ClassSchemaProvider) -> Result<Section>;
type BuildFn = fn(&UiObject, &SectionSet) -> Result<Section>;

/// Registry entry for one section kind.
#[derive(Debug)]
pub struct SectionCodec {
    pub magic: u32,
    pub name: &'static str,
    /// Sections that must be decoded (or encoded) before this one.
    pub deps: &'static [u32],
    /// Sections that must be built before this one.
    pub build_deps: &'static [u32],
    decode: DecodeFn,
    build: BuildFn,
}

impl SectionCodec {
    /// Decode this section from its table entry in `data`.
    pub fn decode(
        &self,
        data: &[u8],
        entry: &SectionEntry,
        decoded: &SectionSet,
        schema: &dyn ClassSchemaProvider,
    ) -> Result<Section> {
        let mut stream = IStream::new(&data[entry.range()], entry.offset as u64);
        let section = (self.decode)(&mut stream, decoded, schema).inspect_err(|e| {
            error!(
                section = self.name,
                offset = entry.offset,
                length = entry.length,
                error = %e,
                "failed to decode section"
            );
        })?;
        debug!(section = self.name, offset = entry.offset, length = entry.length, "decoded section");
        Ok(section)
    }

    /// Build this section from an object tree.
    pub fn build(&self, root: &UiObject, built: &SectionSet) -> Result<Section> {
        (self.build)(root, built)
    }
}

static REGISTRY: [SectionCodec; 3] = [
    SectionCodec {
        magic: STRN_MAGIC,
        name: "STRN",
        deps: &[],
        build_deps: &[DATA_MAGIC],
        decode: decode_strings,
        build: build_strings,
    },
    SectionCodec {
        magic: VECT_MAGIC,
        name: "VECT",
        deps: &[],
        build_deps: &[DATA_MAGIC],
        decode: decode_vectors,
        build: build_vectors,
    },
    SectionCodec {
        magic: DATA_MAGIC,
        name: "DATA",
        deps: &[STRN_MAGIC],
        build_deps: &[],
        decode: decode_tree,
        build: build_tree,
    },
];

/// Registered codec for a magic.
pub fn codec_for(magic: u32) -> Option<&'static SectionCodec> {
    REGISTRY.iter().find(|c| c.magic == magic)
}

/// Which dependency edges to follow when ordering sections.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Decoding and encoding: [`SectionCodec::deps`].
    Codec,
    /// Building from an object tree: [`SectionCodec::build_deps`].
    Build,
}

/// Order `magics` so that every section comes after its dependencies.
///
/// Every magic must be registered for `version`, and every dependency must be
/// among `magics`.
pub fn resolve_order(
    magics: &[u32],
    version: FormatVersion,
    phase: Phase,
) -> Result<Vec<&'static SectionCodec>> {
    let mut codecs = Vec::with_capacity(magics.len());
    for &magic in magics {
        let codec = codec_for(magic)
            .filter(|_| version.has_section(magic))
            .ok_or(Error::UnknownSection { magic, version: version.number() })?;
        codecs.push(codec);
    }

    let deps = |codec: &SectionCodec| match phase {
        Phase::Codec => codec.deps,
        Phase::Build => codec.build_deps,
    };
    for codec in &codecs {
        if let Some(&missing) = deps(*codec).iter().find(|d| !magics.contains(d)) {
            return Err(Error::MissingSection(missing));
        }
    }

    let mut done = vec![false; codecs.len()];
    let mut order = Vec::with_capacity(codecs.len());
    while order.len() < codecs.len() {
        let mut found = false;
        for i in 0..codecs.len() {
            if done[i] {
                continue;
            }
            let ready = deps(codecs[i]).iter().all(|d| order.iter().any(|c: &&SectionCodec| c.magic == *d));
            if ready {
                order.push(codecs[i]);
                done[i] = true;
                found = true;
            }
        }
        if !found {
            return Err(Error::invalid("circular section dependency"));
        }
    }
    Ok(order)
}

fn decode_strings(stream: &mut IStream<'_>, _: &SectionSet, _: &dyn ClassSchemaProvider) -> Result<Section> {
    StringTable::read(stream).map(Section::StringTable)
}

fn decode_vectors(stream: &mut IStream<'_>, _: &SectionSet, _: &dyn ClassSchemaProvider) -> Result<Section> {
    VectorPool::read(stream).map(Section::VectorPool)
}

fn decode_tree(
    stream: &mut IStream<'_>,
    decoded: &SectionSet,
    schema: &dyn ClassSchemaProvider,
) -> Result<Section> {
    let strings = decoded.require::<StringTable>()?;
    let ctx = DecodeContext { strings, schema };
    ObjectTree::read(stream, &ctx).map(Section::ObjectTree)
}

fn build_strings(_: &UiObject, built: &SectionSet) -> Result<Section> {
    let tree = built.require::<ObjectTree>()?;
    Ok(Section::StringTable(StringTable::build(tree.root())))
}

fn build_vectors(_: &UiObject, built: &SectionSet) -> Result<Section> {
    let tree = built.require::<ObjectTree>()?;
    VectorPool::build(tree.root()).map(Section::VectorPool)
}

fn build_tree(root: &UiObject, _: &SectionSet) -> Result<Section> {
    Ok(Section::ObjectTree(ObjectTree::new(root.clone())))
}
