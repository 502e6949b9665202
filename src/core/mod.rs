//! Core layer - schema and in-memory object model.
//!
//! This module provides:
//! - [`ClassSchema`] / [`PropertyDefinition`] - Class hierarchy and property layout
//! - [`ClassSchemaProvider`] - Hierarchy lookup consumed by the codecs
//! - [`SchemaSet`] - In-memory provider
//! - [`UiObject`] / [`Property`] / [`Timeline`] - The decoded UI element tree

mod schema;
mod object;

pub use schema::{
    ClassSchema, ClassSchemaProvider, Hierarchy, PropertyDefinition, PropertyKind, SchemaSet,
    find_definition,
};
pub use object::{
    Interpolation, Keyframe, NamedFrame, NamedFrameCommand, Property, PropertyValue, Timeline,
    UiObject, ELEMENT_ID_PROPERTY,
};
