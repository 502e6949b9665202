//! Named frames and timelines.
//!
//! ```text
//! named frame:  i16 name, i32 time, u8 command, i16 target
//! timeline:     i16 element name
//!               i32 property count, (u8 depth, u8 index) per property
//!               i32 keyframe count
//!               keyframe: i32 frame, u8 interpolation, i8 ease in/out/scale,
//!                         one value per animated property
//! ```
//!
//! A timeline animates the direct child whose `Id` property equals its
//! element name. Animated properties are addressed by `(depth, index)` into
//! that child's class hierarchy, root class at depth 0.

use std::io::Write;
use std::sync::Arc;

use tracing::{error, trace};

use super::property::{
    hierarchy_levels, locate_definition, read_value, write_value, DecodeContext,
    EncodeContext,
};
use super::stream::{IStream, OStream};
use crate::core::{
    Interpolation, Keyframe, NamedFrame, NamedFrameCommand, Property, PropertyDefinition, Timeline,
    UiObject,
};
use crate::util::{Error, Result};

pub fn read_named_frame(stream: &mut IStream<'_>, ctx: &DecodeContext<'_>) -> Result<NamedFrame> {
    let name = ctx.strings.resolve(stream.read_i16()?)?.to_string();
    let time = stream.read_i32()?;

    let pos = stream.absolute_pos();
    let code = stream.read_u8()?;
    let command = NamedFrameCommand::from_u8(code)
        .ok_or_else(|| Error::invalid(format!("unknown named frame command {} at {:#X}", code, pos)))?;

    let target = ctx.strings.resolve(stream.read_i16()?)?.to_string();
    trace!(%name, time, ?command, %target, "named frame");
    Ok(NamedFrame { name, time, command, target })
}

pub fn write_named_frame<W: Write>(
    out: &mut OStream<W>,
    frame: &NamedFrame,
    ctx: &EncodeContext<'_>,
) -> Result<()> {
    out.write_i16(ctx.strings.wire_index(&frame.name)?)?;
    out.write_i32(frame.time)?;
    out.write_u8(frame.command.to_u8())?;
    out.write_i16(ctx.strings.wire_index(&frame.target)?)
}

/// Read one timeline of `owner`, whose children are already decoded.
pub fn read_timeline(
    stream: &mut IStream<'_>,
    owner: &UiObject,
    ctx: &DecodeContext<'_>,
) -> Result<Timeline> {
    let element_name = ctx.strings.resolve(stream.read_i16()?)?.to_string();
    let element = owner.child_by_id(&element_name).ok_or_else(|| {
        error!(owner = %owner.class_name, element = %element_name, "timeline element not found");
        Error::ElementNotFound(element_name.clone())
    })?;
    let hierarchy = ctx.schema.require_hierarchy(&element.class_name)?;

    let property_count = stream.read_count("animated property")?;
    let mut animated: Vec<Arc<PropertyDefinition>> = Vec::new();
    for _ in 0..property_count {
        let depth = stream.read_u8()? as usize;
        let index = stream.read_u8()? as usize;
        let definition = hierarchy
            .get(depth)
            .and_then(|class| class.properties.get(index))
            .ok_or_else(|| Error::PropertyNotFound {
                class: element.class_name.clone(),
                property: format!("#{}.{}", depth, index),
            })?;
        animated.push(definition.clone());
    }

    let keyframe_count = stream.read_count("keyframe")?;
    let mut keyframes = Vec::new();
    for _ in 0..keyframe_count {
        let frame = stream.read_i32()?;
        let pos = stream.absolute_pos();
        let code = stream.read_u8()?;
        let interpolation = Interpolation::from_u8(code)
            .ok_or_else(|| Error::invalid(format!("unknown interpolation {} at {:#X}", code, pos)))?;
        let ease_in = stream.read_i8()?;
        let ease_out = stream.read_i8()?;
        let ease_scale = stream.read_i8()?;

        let mut properties = Vec::with_capacity(animated.len());
        for definition in &animated {
            let value = read_value(stream, definition, ctx)?;
            properties.push(Property::new(definition.clone(), value));
        }
        keyframes.push(Keyframe { frame, interpolation, ease_in, ease_out, ease_scale, properties });
    }

    trace!(element = %element_name, properties = animated.len(), keyframes = keyframes.len(), "timeline");
    Ok(Timeline { element_name, keyframes })
}

/// Write one timeline of `owner`.
///
/// The animated property list is taken from the first keyframe; every other
/// keyframe must animate the same definition slots in the same order.
pub fn write_timeline<W: Write>(
    out: &mut OStream<W>,
    timeline: &Timeline,
    owner: &UiObject,
    ctx: &EncodeContext<'_>,
) -> Result<()> {
    let element = owner
        .child_by_id(&timeline.element_name)
        .ok_or_else(|| Error::ElementNotFound(timeline.element_name.clone()))?;
    let hierarchy = ctx.schema.require_hierarchy(&element.class_name)?;
    let levels = hierarchy_levels(&hierarchy);

    let slots_of = |keyframe: &Keyframe| -> Result<Vec<(usize, usize)>> {
        keyframe
            .properties
            .iter()
            .map(|p| locate_definition(&levels, &p.definition, &element.class_name))
            .collect()
    };
    let animated = match timeline.keyframes.first() {
        Some(first) => slots_of(first)?,
        None => Vec::new(),
    };
    for keyframe in timeline.keyframes.iter().skip(1) {
        let slots = slots_of(keyframe)?;
        if slots != animated {
            let matching = animated.iter().zip(&slots).take_while(|(a, b)| a == b).count();
            return Err(Error::count_mismatch(
                format!("animated properties of {} at frame {}", timeline.element_name, keyframe.frame),
                animated.len() as i64,
                matching,
            ));
        }
    }

    out.write_i16(ctx.strings.wire_index(&timeline.element_name)?)?;

    out.write_count(animated.len(), "animated property")?;
    for &(depth, index) in &animated {
        let depth = u8::try_from(depth).map_err(|_| Error::invalid(format!("hierarchy depth {} exceeds u8", depth)))?;
        let index = u8::try_from(index).map_err(|_| {
            Error::invalid(format!("definition index {} of {} exceeds u8", index, element.class_name))
        })?;
        out.write_u8(depth)?;
        out.write_u8(index)?;
    }

    out.write_count(timeline.keyframes.len(), "keyframe")?;
    for keyframe in &timeline.keyframes {
        out.write_i32(keyframe.frame)?;
        out.write_u8(keyframe.interpolation.to_u8())?;
        out.write_i8(keyframe.ease_in)?;
        out.write_i8(keyframe.ease_out)?;
        out.write_i8(keyframe.ease_scale)?;
        for prop in &keyframe.properties {
            write_value(out, prop, ctx)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        ClassSchema, ClassSchemaProvider, PropertyKind, PropertyValue, SchemaSet, ELEMENT_ID_PROPERTY,
    };
    use crate::util::{ErrorKind, Vector};
    use crate::xur::strings::StringTable;

    fn schema() -> SchemaSet {
        SchemaSet::new()
            .with_class(
                ClassSchema::new("XuiElement", None)
                    .with_property(PropertyDefinition::new(ELEMENT_ID_PROPERTY, PropertyKind::String))
                    .with_property(PropertyDefinition::new("Position", PropertyKind::Vector)),
            )
            .with_class(
                ClassSchema::new("XuiText", Some("XuiElement"))
                    .with_property(PropertyDefinition::new("Text", PropertyKind::String))
                    .with_property(PropertyDefinition::new("Opacity", PropertyKind::Float)),
            )
            .with_class(ClassSchema::new("XuiScene", Some("XuiElement")))
    }

    fn owner(schema: &SchemaSet) -> UiObject {
        let text = schema.hierarchy_for("XuiText").unwrap();
        let id = text[0].properties[0].clone();
        let mut scene = UiObject::new("XuiScene");
        scene.add_child(UiObject::new("XuiText").with_property(id, PropertyValue::String("caption".into())));
        scene
    }

    fn caption_timeline(schema: &SchemaSet) -> Timeline {
        let text = schema.hierarchy_for("XuiText").unwrap();
        let position = text[0].properties[1].clone();
        let opacity = text[1].properties[1].clone();

        let mut timeline = Timeline::new("caption");
        timeline.add_keyframe(
            Keyframe::new(0)
                .with_property(Property::new(position.clone(), PropertyValue::Vector(Vector::ZERO)))
                .with_property(Property::new(opacity.clone(), PropertyValue::Float(0.0))),
        );
        timeline.add_keyframe(
            Keyframe::new(30)
                .with_interpolation(Interpolation::Ease)
                .with_property(Property::new(position, PropertyValue::Vector(Vector::new(0.0, 10.0, 0.0))))
                .with_property(Property::new(opacity, PropertyValue::Float(1.0))),
        );
        timeline
    }

    #[test]
    fn test_timeline_roundtrip() -> crate::util::Result<()> {
        let schema = schema();
        let owner = owner(&schema);
        let timeline = caption_timeline(&schema);
        let strings = StringTable::new(vec!["caption".into()]);

        let ctx = EncodeContext { strings: strings.index()?, schema: &schema };
        let mut out = OStream::buffer();
        write_timeline(&mut out, &timeline, &owner, &ctx)?;
        let bytes = out.into_inner();

        // element name, property count 2, (0,1) Position, (1,1) Opacity
        assert_eq!(&bytes[..12], &[0x00, 0x01, 0, 0, 0, 2, 0, 1, 1, 1, 0, 0]);

        let ctx = DecodeContext { strings: &strings, schema: &schema };
        let mut stream = IStream::new(&bytes, 0);
        let decoded = read_timeline(&mut stream, &owner, &ctx)?;
        assert!(stream.is_at_end());
        assert_eq!(decoded, timeline);
        Ok(())
    }

    #[test]
    fn test_timeline_addresses_redeclared_definition() -> crate::util::Result<()> {
        let schema = SchemaSet::new()
            .with_class(
                ClassSchema::new("XuiElement", None)
                    .with_property(PropertyDefinition::new(ELEMENT_ID_PROPERTY, PropertyKind::String))
                    .with_property(PropertyDefinition::new("Show", PropertyKind::Bool)),
            )
            .with_class(
                ClassSchema::new("XuiText", Some("XuiElement"))
                    .with_property(PropertyDefinition::new("Show", PropertyKind::Bool)),
            )
            .with_class(ClassSchema::new("XuiScene", Some("XuiElement")));
        let text = schema.hierarchy_for("XuiText").unwrap();
        let id = text[0].properties[0].clone();
        let show = text[1].properties[0].clone();

        let mut owner = UiObject::new("XuiScene");
        owner.add_child(UiObject::new("XuiText").with_property(id, PropertyValue::String("caption".into())));
        let mut timeline = Timeline::new("caption");
        timeline.add_keyframe(Keyframe::new(0).with_property(Property::new(show.clone(), PropertyValue::Bool(true))));

        let strings = StringTable::new(vec!["caption".into()]);
        let ctx = EncodeContext { strings: strings.index()?, schema: &schema };
        let mut out = OStream::buffer();
        write_timeline(&mut out, &timeline, &owner, &ctx)?;
        let bytes = out.into_inner();
        assert_eq!(&bytes[6..8], &[1, 0]);

        let ctx = DecodeContext { strings: &strings, schema: &schema };
        let decoded = read_timeline(&mut IStream::new(&bytes, 0), &owner, &ctx)?;
        assert!(Arc::ptr_eq(&decoded.keyframes[0].properties[0].definition, &show));
        Ok(())
    }

    #[test]
    fn test_missing_element() {
        let schema = schema();
        let owner = owner(&schema);
        let strings = StringTable::new(vec!["nobody".into()]);
        let bytes = [0x00, 0x01, 0, 0, 0, 0, 0, 0, 0, 0];
        let ctx = DecodeContext { strings: &strings, schema: &schema };
        let err = read_timeline(&mut IStream::new(&bytes, 0), &owner, &ctx).unwrap_err();
        assert!(matches!(err, Error::ElementNotFound(ref name) if name == "nobody"));
    }

    #[test]
    fn test_mismatched_keyframes() -> crate::util::Result<()> {
        let schema = schema();
        let owner = owner(&schema);
        let mut timeline = caption_timeline(&schema);
        timeline.keyframes[1].properties.pop();

        let strings = StringTable::new(vec!["caption".into()]);
        let ctx = EncodeContext { strings: strings.index()?, schema: &schema };
        let err = write_timeline(&mut OStream::counter(), &timeline, &owner, &ctx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cardinality);

        let mut timeline = caption_timeline(&schema);
        timeline.keyframes[1].properties.swap(0, 1);
        let err = write_timeline(&mut OStream::counter(), &timeline, &owner, &ctx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cardinality);
        Ok(())
    }

    #[test]
    fn test_named_frame_commands() -> crate::util::Result<()> {
        let schema = schema();
        let strings = StringTable::new(vec!["Intro".into(), String::new(), "Loop".into()]);
        let frame = NamedFrame::new("Intro", 12, NamedFrameCommand::GoToAndPlay).with_target("Loop");

        let ctx = EncodeContext { strings: strings.index()?, schema: &schema };
        let mut out = OStream::buffer();
        write_named_frame(&mut out, &frame, &ctx)?;
        let bytes = out.into_inner();
        assert_eq!(bytes, [0x00, 0x01, 0, 0, 0, 12, 3, 0x00, 0x03]);

        let ctx = DecodeContext { strings: &strings, schema: &schema };
        assert_eq!(read_named_frame(&mut IStream::new(&bytes, 0), &ctx)?, frame);

        let bad = [0x00, 0x01, 0, 0, 0, 0, 9, 0x00, 0x02];
        let err = read_named_frame(&mut IStream::new(&bad, 0), &ctx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        Ok(())
    }
}
