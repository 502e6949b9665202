//! UI object tree types.
//!
//! A [`UiObject`] exclusively owns its properties, children and animation
//! data. The tree has no back-pointers; decoding returns owned subtrees.

use std::fmt;
use std::sync::Arc;

use super::schema::{PropertyDefinition, PropertyKind};
use crate::util::{Error, Quaternion, Result, Vector};

/// Name of the string property that identifies an element to timelines.
pub const ELEMENT_ID_PROPERTY: &str = "Id";

/// Decoded property value. The variant must match the definition's kind.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Integer(i32),
    Unsigned(u32),
    Float(f32),
    String(String),
    /// ARGB color.
    Color(u32),
    Vector(Vector),
    Quaternion(Quaternion),
    /// Nested properties of a compound definition.
    Object(Vec<Property>),
}

impl PropertyValue {
    /// The property kind this value encodes as.
    pub fn kind(&self) -> PropertyKind {
        match self {
            PropertyValue::Bool(_) => PropertyKind::Bool,
            PropertyValue::Integer(_) => PropertyKind::Integer,
            PropertyValue::Unsigned(_) => PropertyKind::Unsigned,
            PropertyValue::Float(_) => PropertyKind::Float,
            PropertyValue::String(_) => PropertyKind::String,
            PropertyValue::Color(_) => PropertyKind::Color,
            PropertyValue::Vector(_) => PropertyKind::Vector,
            PropertyValue::Quaternion(_) => PropertyKind::Quaternion,
            PropertyValue::Object(_) => PropertyKind::Object,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<Vector> {
        match self {
            PropertyValue::Vector(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(v) => write!(f, "{}", v),
            PropertyValue::Integer(v) => write!(f, "{}", v),
            PropertyValue::Unsigned(v) => write!(f, "{}", v),
            PropertyValue::Float(v) => write!(f, "{}", v),
            PropertyValue::String(v) => write!(f, "{:?}", v),
            PropertyValue::Color(v) => write!(f, "#{:08X}", v),
            PropertyValue::Vector(v) => write!(f, "{}", v),
            PropertyValue::Quaternion(v) => write!(f, "{}", v),
            PropertyValue::Object(props) => write!(f, "{{{} properties}}", props.len()),
        }
    }
}

/// A property instance: its definition plus a decoded value.
#[derive(Clone, Debug, PartialEq)]
pub struct Property {
    pub definition: Arc<PropertyDefinition>,
    pub value: PropertyValue,
}

impl Property {
    pub fn new(definition: Arc<PropertyDefinition>, value: PropertyValue) -> Self {
        Self { definition, value }
    }

    /// Property name from its definition.
    #[inline]
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// Check that the value shape matches the definition's kind.
    pub fn check_kind(&self) -> Result<()> {
        if self.value.kind() == self.definition.kind {
            Ok(())
        } else {
            Err(Error::TypeMismatch {
                property: self.definition.name.clone(),
                expected: self.definition.kind.to_string(),
                actual: self.value.kind().to_string(),
            })
        }
    }
}

/// Command executed when playback reaches a named frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NamedFrameCommand {
    Play,
    Stop,
    GoTo,
    GoToAndPlay,
    GoToAndStop,
}

impl NamedFrameCommand {
    pub fn to_u8(self) -> u8 {
        match self {
            NamedFrameCommand::Play => 0,
            NamedFrameCommand::Stop => 1,
            NamedFrameCommand::GoTo => 2,
            NamedFrameCommand::GoToAndPlay => 3,
            NamedFrameCommand::GoToAndStop => 4,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(NamedFrameCommand::Play),
            1 => Some(NamedFrameCommand::Stop),
            2 => Some(NamedFrameCommand::GoTo),
            3 => Some(NamedFrameCommand::GoToAndPlay),
            4 => Some(NamedFrameCommand::GoToAndStop),
            _ => None,
        }
    }
}

/// A labeled marker in a node's animation.
#[derive(Clone, Debug, PartialEq)]
pub struct NamedFrame {
    pub name: String,
    pub time: i32,
    pub command: NamedFrameCommand,
    /// Target frame name for `GoTo*` commands; empty otherwise.
    pub target: String,
}

impl NamedFrame {
    pub fn new(name: impl Into<String>, time: i32, command: NamedFrameCommand) -> Self {
        Self { name: name.into(), time, command, target: String::new() }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }
}

/// Keyframe interpolation mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Interpolation {
    None,
    #[default]
    Linear,
    Ease,
}

impl Interpolation {
    pub fn to_u8(self) -> u8 {
        match self {
            Interpolation::None => 0,
            Interpolation::Linear => 1,
            Interpolation::Ease => 2,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Interpolation::None),
            1 => Some(Interpolation::Linear),
            2 => Some(Interpolation::Ease),
            _ => None,
        }
    }
}

/// Snapshot of animated property values at one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Keyframe {
    pub frame: i32,
    pub interpolation: Interpolation,
    pub ease_in: i8,
    pub ease_out: i8,
    pub ease_scale: i8,
    /// One value per animated property, in the timeline's property order.
    pub properties: Vec<Property>,
}

impl Keyframe {
    pub fn new(frame: i32) -> Self {
        Self {
            frame,
            interpolation: Interpolation::default(),
            ease_in: 0,
            ease_out: 0,
            ease_scale: 0,
            properties: Vec::new(),
        }
    }

    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    pub fn with_property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }
}

/// Animation track for one child element of the owning node.
#[derive(Clone, Debug, PartialEq)]
pub struct Timeline {
    /// `Id` of the animated child.
    pub element_name: String,
    pub keyframes: Vec<Keyframe>,
}

impl Timeline {
    pub fn new(element_name: impl Into<String>) -> Self {
        Self { element_name: element_name.into(), keyframes: Vec::new() }
    }

    pub fn add_keyframe(&mut self, keyframe: Keyframe) -> &mut Keyframe {
        self.keyframes.push(keyframe);
        let last = self.keyframes.len() - 1;
        &mut self.keyframes[last]
    }
}

/// A node of the UI element tree.
#[derive(Clone, Debug, PartialEq)]
pub struct UiObject {
    pub class_name: String,
    pub properties: Vec<Property>,
    pub children: Vec<UiObject>,
    pub named_frames: Vec<NamedFrame>,
    pub timelines: Vec<Timeline>,
}

impl UiObject {
    /// Create an empty object of the given class.
    pub fn new(class_name: &str) -> Self {
        Self {
            class_name: class_name.to_string(),
            properties: Vec::new(),
            children: Vec::new(),
            named_frames: Vec::new(),
            timelines: Vec::new(),
        }
    }

    /// Add a child object.
    pub fn add_child(&mut self, child: UiObject) -> &mut UiObject {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// Add a property.
    pub fn add_property(&mut self, definition: Arc<PropertyDefinition>, value: PropertyValue) -> &mut Property {
        self.properties.push(Property::new(definition, value));
        let last = self.properties.len() - 1;
        &mut self.properties[last]
    }

    /// Builder-style [`add_property`](Self::add_property).
    pub fn with_property(mut self, definition: Arc<PropertyDefinition>, value: PropertyValue) -> Self {
        self.add_property(definition, value);
        self
    }

    pub fn add_named_frame(&mut self, frame: NamedFrame) {
        self.named_frames.push(frame);
    }

    pub fn add_timeline(&mut self, timeline: Timeline) -> &mut Timeline {
        self.timelines.push(timeline);
        let last = self.timelines.len() - 1;
        &mut self.timelines[last]
    }

    /// Find a direct property by name.
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name() == name)
    }

    /// Value of the `Id` property, if present.
    pub fn id(&self) -> Option<&str> {
        self.property(ELEMENT_ID_PROPERTY).and_then(|p| p.value.as_str())
    }

    /// Direct child whose `Id` equals `id`.
    pub fn child_by_id(&self, id: &str) -> Option<&UiObject> {
        self.children.iter().find(|c| c.id() == Some(id))
    }

    #[inline]
    pub fn has_properties(&self) -> bool {
        !self.properties.is_empty()
    }

    #[inline]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// True if the node carries named frames or timelines.
    #[inline]
    pub fn has_timeline_data(&self) -> bool {
        !self.timelines.is_empty() || !self.named_frames.is_empty()
    }

    /// Number of nodes in this subtree, including self.
    pub fn count_objects(&self) -> usize {
        1 + self.children.iter().map(UiObject::count_objects).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id_def() -> Arc<PropertyDefinition> {
        Arc::new(PropertyDefinition::new(ELEMENT_ID_PROPERTY, PropertyKind::String))
    }

    #[test]
    fn test_child_by_id() {
        let id = id_def();
        let mut scene = UiObject::new("XuiScene");
        scene.add_child(UiObject::new("XuiText").with_property(id.clone(), PropertyValue::String("title".into())));
        scene.add_child(UiObject::new("XuiImage"));

        assert_eq!(scene.child_by_id("title").unwrap().class_name, "XuiText");
        assert!(scene.child_by_id("missing").is_none());
        assert_eq!(scene.count_objects(), 3);
    }

    #[test]
    fn test_check_kind() {
        let prop = Property::new(id_def(), PropertyValue::Integer(3));
        assert!(matches!(prop.check_kind(), Err(Error::TypeMismatch { .. })));
        let prop = Property::new(id_def(), PropertyValue::String("ok".into()));
        assert!(prop.check_kind().is_ok());
    }

    #[test]
    fn test_timeline_data_flag() {
        let mut obj = UiObject::new("XuiScene");
        assert!(!obj.has_timeline_data());
        obj.add_named_frame(NamedFrame::new("Intro", 0, NamedFrameCommand::Play));
        assert!(obj.has_timeline_data());
    }

    #[test]
    fn test_enum_codes() {
        for code in 0..5u8 {
            assert_eq!(NamedFrameCommand::from_u8(code).unwrap().to_u8(), code);
        }
        assert!(NamedFrameCommand::from_u8(5).is_none());
        assert_eq!(Interpolation::from_u8(2), Some(Interpolation::Ease));
        assert!(Interpolation::from_u8(3).is_none());
    }
}
