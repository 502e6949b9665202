//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use xur::core::{
    find_definition, ClassSchemaProvider, Interpolation, Keyframe, NamedFrame, NamedFrameCommand,
    Property, PropertyDefinition, PropertyValue, SchemaSet, Timeline, UiObject,
};
use xur::util::{Quaternion, Vector};

pub const SCHEMA_JSON: &str = r#"{
    "classes": [
        { "name": "XuiElement", "properties": [
            { "name": "Id", "kind": "String" },
            { "name": "Width", "kind": "Float" },
            { "name": "Height", "kind": "Float" },
            { "name": "Position", "kind": "Vector" },
            { "name": "Scale", "kind": "Vector" },
            { "name": "Rotation", "kind": "Quaternion" },
            { "name": "Opacity", "kind": "Float" },
            { "name": "Show", "kind": "Bool" },
            { "name": "ColorFactor", "kind": "Color" },
            { "name": "BlendMode", "kind": "Integer" }
        ] },
        { "name": "XuiScene", "base": "XuiElement", "properties": [
            { "name": "DefaultFocus", "kind": "String" },
            { "name": "TransFromPrev", "kind": "Unsigned" }
        ] },
        { "name": "XuiText", "base": "XuiElement", "properties": [
            { "name": "Text", "kind": "String" },
            { "name": "TextColor", "kind": "Color" }
        ] },
        { "name": "XuiFigure", "base": "XuiElement", "properties": [
            { "name": "Fill", "kind": "Object", "children": [
                { "name": "FillType", "kind": "Integer" },
                { "name": "FillColor", "kind": "Color" },
                { "name": "Translation", "kind": "Vector" }
            ] },
            { "name": "Closed", "kind": "Bool" },
            { "name": "Points", "kind": "Custom" }
        ] },
        { "name": "XuiGroup", "base": "XuiElement" }
    ]
}"#;

pub fn schema() -> SchemaSet {
    SchemaSet::from_json_str(SCHEMA_JSON).expect("fixture schema parses")
}

/// Definition `name` as seen from `class`.
pub fn def(schema: &SchemaSet, class: &str, name: &str) -> Arc<PropertyDefinition> {
    let hierarchy = schema.hierarchy_for(class).expect("fixture class exists");
    find_definition(&hierarchy, name).expect("fixture property exists")
}

/// A scene exercising every encodable property kind and both kinds of
/// animation data. Properties are listed in canonical order.
pub fn sample_scene(schema: &SchemaSet) -> UiObject {
    let d = |class: &str, name: &str| def(schema, class, name);
    let center = Vector::new(320.0, 240.0, 0.0);

    let mut root = UiObject::new("XuiScene")
        .with_property(d("XuiScene", "Id"), PropertyValue::String("MainMenu".into()))
        .with_property(d("XuiScene", "Width"), PropertyValue::Float(640.0))
        .with_property(d("XuiScene", "Height"), PropertyValue::Float(480.0))
        .with_property(d("XuiScene", "DefaultFocus"), PropertyValue::String("start".into()))
        .with_property(d("XuiScene", "TransFromPrev"), PropertyValue::Unsigned(3));

    root.add_child(
        UiObject::new("XuiText")
            .with_property(d("XuiText", "Id"), PropertyValue::String("start".into()))
            .with_property(d("XuiText", "Position"), PropertyValue::Vector(center))
            .with_property(d("XuiText", "Scale"), PropertyValue::Vector(Vector::new(1.0, 1.0, 1.0)))
            .with_property(d("XuiText", "Rotation"), PropertyValue::Quaternion(Quaternion::IDENTITY))
            .with_property(d("XuiText", "Show"), PropertyValue::Bool(true))
            .with_property(d("XuiText", "Text"), PropertyValue::String("Press Start".into()))
            .with_property(d("XuiText", "TextColor"), PropertyValue::Color(0xFFFF_CC00)),
    );

    let fill = d("XuiFigure", "Fill");
    let mut group = UiObject::new("XuiGroup")
        .with_property(d("XuiGroup", "Id"), PropertyValue::String("panel".into()))
        .with_property(d("XuiGroup", "Position"), PropertyValue::Vector(center));
    group.add_child(
        UiObject::new("XuiFigure")
            .with_property(d("XuiFigure", "Id"), PropertyValue::String("backdrop".into()))
            .with_property(d("XuiFigure", "ColorFactor"), PropertyValue::Color(0x80FF_FFFF))
            .with_property(d("XuiFigure", "BlendMode"), PropertyValue::Integer(-1))
            .with_property(
                fill.clone(),
                PropertyValue::Object(vec![
                    Property::new(fill.children[0].clone(), PropertyValue::Integer(1)),
                    Property::new(fill.children[2].clone(), PropertyValue::Vector(Vector::new(0.0, -8.0, 0.0))),
                ]),
            )
            .with_property(d("XuiFigure", "Closed"), PropertyValue::Bool(true)),
    );
    group.add_named_frame(NamedFrame::new("Idle", 0, NamedFrameCommand::Stop));
    root.add_child(group);

    root.add_named_frame(NamedFrame::new("Intro", 0, NamedFrameCommand::Play));
    root.add_named_frame(NamedFrame::new("IntroEnd", 30, NamedFrameCommand::Stop));
    root.add_named_frame(NamedFrame::new("Outro", 31, NamedFrameCommand::GoToAndPlay).with_target("Intro"));

    let position = d("XuiText", "Position");
    let opacity = d("XuiText", "Opacity");
    let mut timeline = Timeline::new("start");
    timeline.add_keyframe(
        Keyframe::new(0)
            .with_interpolation(Interpolation::Ease)
            .with_property(Property::new(position.clone(), PropertyValue::Vector(Vector::new(320.0, 520.0, 0.0))))
            .with_property(Property::new(opacity.clone(), PropertyValue::Float(0.0))),
    );
    let mut last = Keyframe::new(30)
        .with_property(Property::new(position, PropertyValue::Vector(center)))
        .with_property(Property::new(opacity, PropertyValue::Float(1.0)));
    last.ease_in = -50;
    last.ease_out = 50;
    last.ease_scale = 10;
    timeline.add_keyframe(last);
    root.add_timeline(timeline);

    root
}

/// Assemble a container from raw section payloads, listed in table order.
pub fn container(version: i32, sections: &[(u32, Vec<u8>)]) -> Vec<u8> {
    let table_end = 20 + 12 * sections.len();
    let file_size = table_end + sections.iter().map(|(_, body)| body.len()).sum::<usize>();

    let mut data = Vec::with_capacity(file_size);
    data.extend_from_slice(&0x5855_4942u32.to_be_bytes());
    data.extend_from_slice(&version.to_be_bytes());
    data.extend_from_slice(&0i32.to_be_bytes());
    data.extend_from_slice(&0i16.to_be_bytes());
    data.extend_from_slice(&(file_size as i32).to_be_bytes());
    data.extend_from_slice(&(sections.len() as i16).to_be_bytes());

    let mut offset = table_end;
    for (magic, body) in sections {
        data.extend_from_slice(&magic.to_be_bytes());
        data.extend_from_slice(&(offset as i32).to_be_bytes());
        data.extend_from_slice(&(body.len() as i32).to_be_bytes());
        offset += body.len();
    }
    for (_, body) in sections {
        data.extend_from_slice(body);
    }
    data
}

/// String Table payload for `strings`.
pub fn strn(strings: &[&str]) -> Vec<u8> {
    let mut body = Vec::new();
    for s in strings {
        let units: Vec<u16> = s.encode_utf16().collect();
        body.extend_from_slice(&(units.len() as u16).to_be_bytes());
        for unit in units {
            body.extend_from_slice(&unit.to_be_bytes());
        }
    }
    body
}
