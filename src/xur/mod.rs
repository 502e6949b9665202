//! XUR binary container format.
//!
//! XUR is the compiled form of a console game UI scene: a tree of UI elements
//! with typed properties, named frames and keyframe timelines. All values are
//! big-endian.
//!
//! ## File Structure
//!
//! ```text
//! +----------------------+
//! | Header               |  20 bytes, magic "XUIB"
//! +----------------------+
//! | Section table        |  12 bytes per section (magic, offset, length)
//! +----------------------+
//! | STRN  String Table   |  UTF-16 strings, referenced by 1-based index
//! +----------------------+
//! | VECT  Vector Pool    |  12-byte float triples (version 8 only)
//! +----------------------+
//! | DATA  Object Tree    |  root object record with nested children
//! +----------------------+
//! ```
//!
//! Property layouts are not stored in the file; decoding and encoding the
//! object tree consult a [`ClassSchemaProvider`](crate::core::ClassSchemaProvider).

mod format;
mod stream;
mod header;
mod table;
mod strings;
mod vectors;
mod property;
mod animation;
mod data;
mod section;
mod reader;
pub mod writer;
pub mod batch;

pub use format::*;
pub use stream::{IStream, OStream};
pub use header::XurHeader;
pub use table::{SectionEntry, SectionTable};
pub use strings::{StringIndex, StringTable};
pub use vectors::VectorPool;
pub use property::{
    hierarchy_levels, read_property_block, read_value, write_property_block, write_value,
    DecodeContext, EncodeContext, Levels,
};
pub use animation::{read_named_frame, read_timeline, write_named_frame, write_timeline};
pub use data::{ObjectTree, MAX_OBJECT_DEPTH};
pub use section::{codec_for, resolve_order, Phase, Section, SectionCodec, SectionKind, SectionSet};
pub use reader::IArchive;
pub use writer::{serialize, OArchive};
