//! Object Tree section (`DATA`).
//!
//! The payload is a single root object record; child records nest inside
//! their parent:
//!
//! ```text
//! object:
//!   i16  class name (string index)
//!   u8   flags
//!   [properties block]                    if flags & 0x1
//!   [i32 child count, child objects]      if flags & 0x2
//!   [i32 named frame count, frames,       if flags & 0x4
//!    i32 timeline count, timelines]        (timelines only when the
//!                                           node has children)
//! ```
//!
//! Decoding needs the String Table and a [`ClassSchemaProvider`]; every class
//! name must resolve to a hierarchy.
//!
//! [`ClassSchemaProvider`]: crate::core::ClassSchemaProvider

use std::io::Write;

use tracing::{debug, error, trace, warn};

use super::animation::{read_named_frame, read_timeline, write_named_frame, write_timeline};
use super::format::*;
use super::property::{
    hierarchy_levels, read_property_block, write_property_block, DecodeContext, EncodeContext,
};
use super::stream::{IStream, OStream};
use crate::core::UiObject;
use crate::util::{Error, Result};

/// Maximum object nesting accepted when decoding.
pub const MAX_OBJECT_DEPTH: usize = 256;

/// Decoded object tree.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectTree {
    root: UiObject,
}

impl ObjectTree {
    pub fn new(root: UiObject) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &UiObject {
        &self.root
    }

    pub fn into_root(self) -> UiObject {
        self.root
    }

    /// Decode the root record and everything below it.
    pub fn read(stream: &mut IStream<'_>, ctx: &DecodeContext<'_>) -> Result<Self> {
        let root = read_object(stream, ctx, 0)?;
        if !stream.is_at_end() {
            warn!(
                trailing = stream.remaining(),
                offset = stream.absolute_pos(),
                "ignoring bytes after the root object"
            );
        }
        debug!(class = %root.class_name, objects = root.count_objects(), "read object tree");
        Ok(Self { root })
    }

    pub fn write<W: Write>(&self, out: &mut OStream<W>, ctx: &EncodeContext<'_>) -> Result<()> {
        write_object(out, &self.root, ctx)
    }

    /// Serialized payload size, computed by encoding into a counting sink.
    pub fn encoded_len(&self, ctx: &EncodeContext<'_>) -> Result<usize> {
        let mut counter = OStream::counter();
        self.write(&mut counter, ctx)?;
        Ok(counter.pos() as usize)
    }
}

fn read_object(stream: &mut IStream<'_>, ctx: &DecodeContext<'_>, depth: usize) -> Result<UiObject> {
    if depth >= MAX_OBJECT_DEPTH {
        return Err(Error::invalid(format!(
            "object nesting exceeds {} levels at {:#X}",
            MAX_OBJECT_DEPTH,
            stream.absolute_pos()
        )));
    }

    let pos = stream.absolute_pos();
    let class_name = ctx
        .strings
        .resolve(stream.read_i16()?)
        .inspect_err(|e| error!(offset = pos, error = %e, "bad class name reference"))?
        .to_string();
    let flags = stream.read_u8()?;
    trace!(offset = pos, class = %class_name, flags, "object");

    let hierarchy = ctx.schema.require_hierarchy(&class_name).inspect_err(|_| {
        error!(offset = pos, class = %class_name, "class not in schema");
    })?;
    let mut obj = UiObject::new(&class_name);

    if flags & OBJECT_HAS_PROPERTIES != 0 {
        obj.properties = read_property_block(stream, &hierarchy_levels(&hierarchy), ctx, &class_name)?;
    }

    if flags & OBJECT_HAS_CHILDREN != 0 {
        let count = stream.read_count("child")?;
        for _ in 0..count {
            obj.children.push(read_object(stream, ctx, depth + 1)?);
        }
    }

    if flags & OBJECT_HAS_TIMELINE_DATA != 0 {
        let count = stream.read_count("named frame")?;
        for _ in 0..count {
            obj.named_frames.push(read_named_frame(stream, ctx)?);
        }

        // A childless node has nothing to animate and stores no timeline count.
        if obj.has_children() {
            let count = stream.read_count("timeline")?;
            for _ in 0..count {
                let timeline = read_timeline(stream, &obj, ctx)?;
                obj.timelines.push(timeline);
            }
        }
    }

    Ok(obj)
}

fn write_object<W: Write>(out: &mut OStream<W>, obj: &UiObject, ctx: &EncodeContext<'_>) -> Result<()> {
    let hierarchy = ctx.schema.require_hierarchy(&obj.class_name)?;
    if !obj.has_children() {
        if let Some(timeline) = obj.timelines.first() {
            return Err(Error::ElementNotFound(timeline.element_name.clone()));
        }
    }

    let mut flags = 0u8;
    if obj.has_properties() {
        flags |= OBJECT_HAS_PROPERTIES;
    }
    if obj.has_children() {
        flags |= OBJECT_HAS_CHILDREN;
    }
    if obj.has_timeline_data() {
        flags |= OBJECT_HAS_TIMELINE_DATA;
    }

    out.write_i16(ctx.strings.wire_index(&obj.class_name)?)?;
    out.write_u8(flags)?;

    if obj.has_properties() {
        write_property_block(out, &obj.properties, &hierarchy_levels(&hierarchy), ctx, &obj.class_name)?;
    }

    if obj.has_children() {
        out.write_count(obj.children.len(), "child")?;
        for child in &obj.children {
            write_object(out, child, ctx)?;
        }
    }

    if obj.has_timeline_data() {
        out.write_count(obj.named_frames.len(), "named frame")?;
        for frame in &obj.named_frames {
            write_named_frame(out, frame, ctx)?;
        }
        if obj.has_children() {
            out.write_count(obj.timelines.len(), "timeline")?;
            for timeline in &obj.timelines {
                write_timeline(out, timeline, obj, ctx)?;
            }
        }
    }
    Ok(())
}
