//! Property values and property blocks.
//!
//! A property block lists the properties present on one node:
//!
//! ```text
//! int16  declared count
//! per hierarchy level, root class first:
//!   u8   present count            (0: nothing else for this level)
//!   u8[] masks, ceil(defs/8) >= 1 (stored in reverse byte order)
//!   one value per set bit, ascending definition index
//! ```
//!
//! Bit `b` of mask byte `i` (after un-reversing) selects definition
//! `i * 8 + b` of that level. Compound (`Object`) values embed a nested block
//! over the definition's own children, as a single level.

use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;

use smallvec::{smallvec, SmallVec};
use tracing::{trace, warn};

use super::format::mask_count;
use super::stream::{IStream, OStream};
use super::strings::{StringIndex, StringTable};
use crate::core::{
    ClassSchema, ClassSchemaProvider, Property, PropertyDefinition, PropertyKind, PropertyValue,
};
use crate::util::{Error, Quaternion, Result, Vector};

/// Ordered definition lists, one per schema level.
pub type Levels<'a> = SmallVec<[&'a [Arc<PropertyDefinition>]; 8]>;

/// Mask bytes of one level; four bytes cover 32 definitions.
type Masks = SmallVec<[u8; 4]>;

/// Shared state for decoding the object tree and its values.
pub struct DecodeContext<'a> {
    pub strings: &'a StringTable,
    pub schema: &'a dyn ClassSchemaProvider,
}

/// Shared state for encoding the object tree and its values.
pub struct EncodeContext<'a> {
    pub strings: StringIndex<'a>,
    pub schema: &'a dyn ClassSchemaProvider,
}

/// Definition lists of a class hierarchy, root first.
pub fn hierarchy_levels(hierarchy: &[Arc<ClassSchema>]) -> Levels<'_> {
    hierarchy.iter().map(|class| class.properties.as_slice()).collect()
}

/// Slot `(level, index)` of a definition within `levels`.
///
/// A handle shared with the schema resolves to its own slot, even when an
/// ancestor level declares an equal definition. A detached copy resolves by
/// value and must match exactly one slot.
pub(crate) fn locate_definition(
    levels: &[&[Arc<PropertyDefinition>]],
    definition: &Arc<PropertyDefinition>,
    owner: &str,
) -> Result<(usize, usize)> {
    let slots = || {
        levels.iter().enumerate().flat_map(|(depth, level)| {
            level.iter().enumerate().map(move |(index, d)| ((depth, index), d))
        })
    };
    if let Some((slot, _)) = slots().find(|(_, d)| Arc::ptr_eq(d, definition)) {
        return Ok(slot);
    }

    let mut by_value = slots().filter(|(_, d)| ***d == **definition).map(|(slot, _)| slot);
    match (by_value.next(), by_value.next()) {
        (Some(slot), None) => Ok(slot),
        (None, _) => Err(Error::PropertyNotFound {
            class: owner.to_string(),
            property: definition.name.clone(),
        }),
        (Some(_), Some(_)) => Err(Error::AmbiguousProperty {
            class: owner.to_string(),
            property: definition.name.clone(),
        }),
    }
}

// ============================================================================
// Values
// ============================================================================

/// Decode one value as declared by `definition`.
pub fn read_value(
    stream: &mut IStream<'_>,
    definition: &PropertyDefinition,
    ctx: &DecodeContext<'_>,
) -> Result<PropertyValue> {
    let value = match definition.kind {
        PropertyKind::Bool => PropertyValue::Bool(stream.read_u8()? != 0),
        PropertyKind::Integer => PropertyValue::Integer(stream.read_i32()?),
        PropertyKind::Unsigned => PropertyValue::Unsigned(stream.read_u32()?),
        PropertyKind::Float => PropertyValue::Float(stream.read_f32()?),
        PropertyKind::Color => PropertyValue::Color(stream.read_u32()?),
        PropertyKind::String => {
            let index = stream.read_i16()?;
            PropertyValue::String(ctx.strings.resolve(index)?.to_string())
        }
        PropertyKind::Vector => PropertyValue::Vector(Vector::new(
            stream.read_f32()?,
            stream.read_f32()?,
            stream.read_f32()?,
        )),
        PropertyKind::Quaternion => PropertyValue::Quaternion(Quaternion::new(
            stream.read_f32()?,
            stream.read_f32()?,
            stream.read_f32()?,
            stream.read_f32()?,
        )),
        PropertyKind::Object => {
            let levels: Levels<'_> = smallvec![definition.children.as_slice()];
            PropertyValue::Object(read_property_block(stream, &levels, ctx, &definition.name)?)
        }
        PropertyKind::Custom => {
            return Err(Error::UnsupportedPropertyKind {
                property: definition.name.clone(),
                kind: definition.kind.to_string(),
            })
        }
    };
    trace!(property = %definition.name, %value, "read value");
    Ok(value)
}

/// Encode one property value as declared by its definition.
pub fn write_value<W: Write>(
    out: &mut OStream<W>,
    property: &Property,
    ctx: &EncodeContext<'_>,
) -> Result<()> {
    let definition = &property.definition;
    if definition.kind == PropertyKind::Custom {
        return Err(Error::UnsupportedPropertyKind {
            property: definition.name.clone(),
            kind: definition.kind.to_string(),
        });
    }
    property.check_kind()?;

    match &property.value {
        PropertyValue::Bool(v) => out.write_u8(u8::from(*v)),
        PropertyValue::Integer(v) => out.write_i32(*v),
        PropertyValue::Unsigned(v) => out.write_u32(*v),
        PropertyValue::Float(v) => out.write_f32(*v),
        PropertyValue::Color(v) => out.write_u32(*v),
        PropertyValue::String(s) => out.write_i16(ctx.strings.wire_index(s)?),
        PropertyValue::Vector(v) => {
            out.write_f32(v.x)?;
            out.write_f32(v.y)?;
            out.write_f32(v.z)
        }
        PropertyValue::Quaternion(q) => {
            out.write_f32(q.x)?;
            out.write_f32(q.y)?;
            out.write_f32(q.z)?;
            out.write_f32(q.w)
        }
        PropertyValue::Object(nested) => {
            let levels: Levels<'_> = smallvec![definition.children.as_slice()];
            write_property_block(out, nested, &levels, ctx, &definition.name)
        }
    }
}

// ============================================================================
// Property blocks
// ============================================================================

/// Decode a property block over `levels`.
///
/// `owner` names the class or compound property for diagnostics.
pub fn read_property_block(
    stream: &mut IStream<'_>,
    levels: &[&[Arc<PropertyDefinition>]],
    ctx: &DecodeContext<'_>,
    owner: &str,
) -> Result<Vec<Property>> {
    let declared = stream.read_i16()?;
    trace!(owner, declared, "reading property block");

    let mut properties = Vec::new();
    for (depth, level) in levels.iter().enumerate() {
        let present = stream.read_u8()?;
        if present == 0 {
            continue;
        }

        let mut masks = Masks::from_slice(stream.read_bytes(mask_count(level.len()))?);
        masks.reverse();

        for (byte_index, &mask) in masks.iter().enumerate() {
            if mask == 0 {
                continue;
            }
            for bit in 0..8 {
                if mask & (1 << bit) == 0 {
                    continue;
                }
                let index = byte_index * 8 + bit;
                let Some(definition) = level.get(index) else {
                    warn!(owner, depth, index, "mask bit past the last definition, ignoring");
                    continue;
                };
                let value = read_value(stream, definition, ctx)?;
                properties.push(Property::new(definition.clone(), value));
            }
        }
    }

    if i64::from(declared) != properties.len() as i64 {
        return Err(Error::count_mismatch(format!("properties of {}", owner), declared.into(), properties.len()));
    }
    Ok(properties)
}

/// Encode `properties` as a block over `levels`.
///
/// Values are emitted in canonical order (level, then definition index),
/// whatever the order of `properties`.
pub fn write_property_block<W: Write>(
    out: &mut OStream<W>,
    properties: &[Property],
    levels: &[&[Arc<PropertyDefinition>]],
    ctx: &EncodeContext<'_>,
    owner: &str,
) -> Result<()> {
    let slots = assign_slots(properties, levels, owner)?;
    let declared = i16::try_from(properties.len())
        .map_err(|_| Error::count_mismatch(format!("properties of {}", owner), i16::MAX.into(), properties.len()))?;
    out.write_i16(declared)?;

    for (depth, level) in levels.iter().enumerate() {
        let present: Vec<(usize, &Property)> = slots
            .range((depth, 0)..(depth + 1, 0))
            .map(|(&(_, index), &prop)| (index, prop))
            .collect();
        if present.is_empty() {
            out.write_u8(0)?;
            continue;
        }

        let present_count = u8::try_from(present.len()).map_err(|_| {
            Error::count_mismatch(format!("level {} properties of {}", depth, owner), u8::MAX.into(), present.len())
        })?;
        out.write_u8(present_count)?;

        let mut masks: Masks = smallvec![0; mask_count(level.len())];
        for &(index, _) in &present {
            masks[index / 8] |= 1 << (index % 8);
        }
        masks.reverse();
        out.write_bytes(&masks)?;

        for (_, prop) in present {
            write_value(out, prop, ctx)?;
        }
    }
    Ok(())
}

/// Map every property to its `(level, index)` slot.
fn assign_slots<'p>(
    properties: &'p [Property],
    levels: &[&[Arc<PropertyDefinition>]],
    owner: &str,
) -> Result<BTreeMap<(usize, usize), &'p Property>> {
    let mut slots = BTreeMap::new();
    for prop in properties {
        let slot = locate_definition(levels, &prop.definition, owner)?;
        if slots.insert(slot, prop).is_some() {
            return Err(Error::DuplicateProperty(format!("{}.{}", owner, prop.name())));
        }
    }
    Ok(slots)
}
