//! String Table section (`STRN`).
//!
//! A flat list of UTF-16 strings. Each record is a `u16` count of code units
//! followed by the big-endian code units. Other sections refer to strings by
//! 1-based index; index 0 on the wire is invalid.

use std::collections::HashMap;
use std::io::Write;

use indexmap::IndexSet;
use tracing::{debug, trace};

use super::stream::{IStream, OStream};
use crate::core::{Property, PropertyValue, UiObject};
use crate::util::{Error, Result};

/// Decoded string table. Duplicates are allowed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StringTable {
    strings: Vec<String>,
}

impl StringTable {
    pub fn new(strings: Vec<String>) -> Self {
        Self { strings }
    }

    /// Read records until the payload is exhausted.
    pub fn read(stream: &mut IStream<'_>) -> Result<Self> {
        let mut strings = Vec::new();
        while !stream.is_at_end() {
            let pos = stream.absolute_pos();
            let units = stream.read_u16()? as usize;
            let bytes = stream.read_bytes(units * 2)?;
            let code_units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|c| u16::from_be_bytes([c[0], c[1]]))
                .collect();
            let s = String::from_utf16(&code_units)
                .map_err(|_| Error::invalid(format!("invalid UTF-16 string at {:#X}", pos)))?;
            trace!(index = strings.len() + 1, value = %s, "string");
            strings.push(s);
        }
        debug!(count = strings.len(), "read string table");
        Ok(Self { strings })
    }

    /// Write all records in table order.
    pub fn write<W: Write>(&self, out: &mut OStream<W>) -> Result<()> {
        for s in &self.strings {
            let units: Vec<u16> = s.encode_utf16().collect();
            let len = u16::try_from(units.len())
                .map_err(|_| Error::invalid(format!("string of {} code units is too long", units.len())))?;
            out.write_u16(len)?;
            for unit in units {
                out.write_u16(unit)?;
            }
        }
        Ok(())
    }

    /// Serialized payload size.
    pub fn encoded_len(&self) -> usize {
        self.strings.iter().map(|s| 2 + 2 * s.encode_utf16().count()).sum()
    }

    /// Collect every string referenced by a tree.
    ///
    /// Class names come first in depth-first pre-order, so the object records
    /// see the smallest indices. All other strings follow in depth-first order
    /// (properties, children, named frames, timelines). Repeats collapse onto
    /// their first occurrence.
    pub fn build(root: &UiObject) -> Self {
        let mut set = IndexSet::new();
        collect_class_names(root, &mut set);
        collect_strings(root, &mut set);
        debug!(count = set.len(), "built string table");
        Self { strings: set.into_iter().collect() }
    }

    /// Resolve a 1-based wire index.
    pub fn resolve(&self, wire_index: i16) -> Result<&str> {
        let index = wire_index as i32 - 1;
        if index < 0 || index as usize >= self.strings.len() {
            return Err(Error::StringIndexOutOfRange { index, count: self.strings.len() });
        }
        Ok(&self.strings[index as usize])
    }

    /// String at a 0-based index.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.strings.get(index).map(String::as_str)
    }

    /// 0-based index of the first exact match.
    pub fn index_of(&self, s: &str) -> Option<usize> {
        self.strings.iter().position(|x| x == s)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.strings.iter().map(String::as_str)
    }

    /// Lookup table for encoding string references against this table.
    pub fn index(&self) -> Result<StringIndex<'_>> {
        if self.strings.len() > i16::MAX as usize {
            return Err(Error::invalid(format!(
                "{} strings exceed the int16 index range",
                self.strings.len()
            )));
        }
        let mut map = HashMap::with_capacity(self.strings.len());
        for (i, s) in self.strings.iter().enumerate() {
            map.entry(s.as_str()).or_insert((i + 1) as i16);
        }
        Ok(StringIndex { map })
    }
}

/// String to 1-based wire index, first occurrence wins.
pub struct StringIndex<'a> {
    map: HashMap<&'a str, i16>,
}

impl StringIndex<'_> {
    /// Wire index for an exact string.
    pub fn wire_index(&self, s: &str) -> Result<i16> {
        self.map.get(s).copied().ok_or_else(|| Error::StringNotFound(s.to_string()))
    }
}

fn collect_class_names(obj: &UiObject, set: &mut IndexSet<String>) {
    if !set.contains(obj.class_name.as_str()) {
        set.insert(obj.class_name.clone());
    }
    for child in &obj.children {
        collect_class_names(child, set);
    }
}

fn collect_strings(obj: &UiObject, set: &mut IndexSet<String>) {
    collect_property_strings(&obj.properties, set);
    for child in &obj.children {
        collect_strings(child, set);
    }
    for frame in &obj.named_frames {
        insert(set, &frame.name);
        insert(set, &frame.target);
    }
    for timeline in &obj.timelines {
        insert(set, &timeline.element_name);
        for keyframe in &timeline.keyframes {
            collect_property_strings(&keyframe.properties, set);
        }
    }
}

fn collect_property_strings(properties: &[Property], set: &mut IndexSet<String>) {
    for prop in properties {
        match &prop.value {
            PropertyValue::String(s) => insert(set, s),
            PropertyValue::Object(nested) => collect_property_strings(nested, set),
            _ => {}
        }
    }
}

#[inline]
fn insert(set: &mut IndexSet<String>, s: &str) {
    if !set.contains(s) {
        set.insert(s.to_string());
    }
}
