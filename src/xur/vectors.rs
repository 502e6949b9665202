//! Vector Pool section (`VECT`).
//!
//! Headerless run of 12-byte `(x, y, z)` float records. The pool holds each
//! distinct vector value found in the object tree once, in first-occurrence
//! order of a depth-first walk: a node's properties (nested objects
//! included), then its children, then its timelines' keyframes.

use std::io::Write;

use indexmap::IndexSet;
use tracing::{debug, trace};

use super::format::VECT_MAGIC;
use super::stream::{IStream, OStream};
use crate::core::{Property, PropertyKind, PropertyValue, UiObject};
use crate::util::{Error, Result, Vector};

/// Deduplicated vector values.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VectorPool {
    vectors: Vec<Vector>,
}

impl VectorPool {
    pub fn new(vectors: Vec<Vector>) -> Self {
        Self { vectors }
    }

    /// Read `length / 12` records. The payload has no count field.
    pub fn read(stream: &mut IStream<'_>) -> Result<Self> {
        let length = stream.remaining();
        if length % Vector::ENCODED_SIZE != 0 {
            return Err(Error::InvalidSectionLength { magic: VECT_MAGIC, length });
        }

        let count = length / Vector::ENCODED_SIZE;
        let mut vectors = Vec::with_capacity(count);
        for index in 0..count {
            let v = Vector::new(stream.read_f32()?, stream.read_f32()?, stream.read_f32()?);
            trace!(index, vector = %v, "vector");
            vectors.push(v);
        }
        debug!(count, "read vector pool");
        Ok(Self { vectors })
    }

    /// Write all records in pool order.
    pub fn write<W: Write>(&self, out: &mut OStream<W>) -> Result<()> {
        for v in &self.vectors {
            out.write_f32(v.x)?;
            out.write_f32(v.y)?;
            out.write_f32(v.z)?;
        }
        Ok(())
    }

    /// Serialized payload size.
    pub fn encoded_len(&self) -> usize {
        self.vectors.len() * Vector::ENCODED_SIZE
    }

    /// Collect the distinct vector values of a tree.
    pub fn build(root: &UiObject) -> Result<Self> {
        let mut set = IndexSet::new();
        collect_object(root, &mut set)?;
        debug!(count = set.len(), "built vector pool");
        Ok(Self { vectors: set.into_iter().collect() })
    }

    /// Pool position of a value.
    pub fn index_of(&self, v: &Vector) -> Option<usize> {
        self.vectors.iter().position(|x| x == v)
    }

    pub fn get(&self, index: usize) -> Option<&Vector> {
        self.vectors.get(index)
    }

    pub fn vectors(&self) -> &[Vector] {
        &self.vectors
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

fn collect_object(obj: &UiObject, set: &mut IndexSet<Vector>) -> Result<()> {
    collect_properties(&obj.properties, set)?;

    for child in &obj.children {
        collect_object(child, set)?;
    }

    for timeline in &obj.timelines {
        for keyframe in &timeline.keyframes {
            collect_properties(&keyframe.properties, set)?;
        }
    }
    Ok(())
}

fn collect_properties(properties: &[Property], set: &mut IndexSet<Vector>) -> Result<()> {
    for prop in properties {
        match prop.definition.kind {
            PropertyKind::Vector => {
                let PropertyValue::Vector(v) = prop.value else {
                    prop.check_kind()?;
                    continue;
                };
                if set.insert(v) {
                    trace!(property = prop.name(), vector = %v, "pooled vector");
                }
            }
            PropertyKind::Object => {
                let PropertyValue::Object(nested) = &prop.value else {
                    prop.check_kind()?;
                    continue;
                };
                collect_properties(nested, set)?;
            }
            _ => {}
        }
    }
    Ok(())
}
