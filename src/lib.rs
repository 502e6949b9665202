//! # XUR
//!
//! Rust implementation of the XUR compiled console UI resource format.
//!
//! A XUR file stores a UI scene as a big-endian container of sections: a
//! string table, an optional vector pool, and the object tree itself. This
//! crate decodes containers into an owned [`UiObject`](core::UiObject) tree
//! and encodes trees back into byte-exact containers.
//!
//! ## Modules
//!
//! - [`util`] - Value types and errors
//! - [`core`] - Class schemas and the in-memory object tree
//! - [`xur`] - Container format: header, sections, reader and writer
//!
//! ## Example
//!
//! ```ignore
//! use xur::prelude::*;
//!
//! let schema = SchemaSet::from_json_file("classes.json")?;
//! let archive = IArchive::open("menu.xur", &schema)?;
//! if let Some(root) = archive.root() {
//!     for child in &root.children {
//!         println!("{} {:?}", child.class_name, child.id());
//!     }
//! }
//!
//! let bytes = OArchive::new(FormatVersion::V8).write_bytes(archive.root().unwrap(), &schema)?;
//! ```

pub mod util;
pub mod core;
pub mod xur;

// Re-export commonly used types
pub use util::{Error, ErrorKind, Result};
pub use xur::{IArchive, OArchive};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{Error, ErrorKind, Quaternion, Result, Vector};
    pub use crate::core::{
        ClassSchema, ClassSchemaProvider, Interpolation, Keyframe, NamedFrame, NamedFrameCommand,
        Property, PropertyDefinition, PropertyKind, PropertyValue, SchemaSet, Timeline, UiObject,
    };
    pub use crate::xur::{FormatVersion, IArchive, OArchive, Section, SectionKind};
}
