//! Error types for the XUR library.

use std::path::PathBuf;
use thiserror::Error;

use crate::xur::magic_to_string;

fn tag(magic: &u32) -> String {
    magic_to_string(*magic)
}

/// Failure category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed container: magic/version/size mismatch, bad section layout, truncation.
    Format,
    /// Out-of-range string index, unresolvable class, property or element.
    Reference,
    /// A decoded or encoded count does not match its declared count.
    Cardinality,
    /// No codec exists for the requested type or section/version combination.
    Unsupported,
    /// Underlying file access failed.
    Io,
}

/// Main error type for XUR operations.
#[derive(Error, Debug)]
pub enum Error {
    /// File does not exist or cannot be accessed
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Invalid magic at start of file
    #[error("Invalid XUR file: expected magic {expected:#010X}, got {actual:#010X}")]
    InvalidMagic { expected: u32, actual: u32 },

    /// Unsupported container version
    #[error("Unsupported XUR version: {0}")]
    UnsupportedVersion(i32),

    /// Declared file size differs from the stream length
    #[error("File size mismatch: header declares {declared} bytes, stream has {actual}")]
    FileSizeMismatch { declared: u64, actual: u64 },

    /// File or section is truncated
    #[error("Unexpected end of data at position {0}")]
    UnexpectedEof(u64),

    /// Section table entry points outside the stream
    #[error("Section {} at {offset:#X} (+{length}) lies outside the stream", tag(.magic))]
    SectionOutOfBounds { magic: u32, offset: i64, length: i64 },

    /// The same section magic appears twice in the table
    #[error("Duplicate section {} in section table", tag(.0))]
    DuplicateSection(u32),

    /// Section magic is not registered for this container version
    #[error("Unknown section {} for version {version}", tag(.magic))]
    UnknownSection { magic: u32, version: i32 },

    /// A section required by this container version is absent
    #[error("Missing required section {}", tag(.0))]
    MissingSection(u32),

    /// Section payload length is not valid for its record size
    #[error("Invalid length {length} for section {}", tag(.magic))]
    InvalidSectionLength { magic: u32, length: usize },

    /// Invalid data structure in file
    #[error("Invalid file structure: {0}")]
    InvalidStructure(String),

    /// Property value shape does not match its definition
    #[error("Type mismatch for property {property}: expected {expected}, got {actual}")]
    TypeMismatch { property: String, expected: String, actual: String },

    /// 0-based string index outside the String Table
    #[error("String index {index} out of range (count: {count})")]
    StringIndexOutOfRange { index: i32, count: usize },

    /// String is not present in the String Table being written
    #[error("String not found in string table: {0:?}")]
    StringNotFound(String),

    /// Class name has no hierarchy in the schema provider
    #[error("Class not found in schema: {0}")]
    ClassNotFound(String),

    /// Property definition does not belong to the class hierarchy
    #[error("Property {property} is not defined by class {class}")]
    PropertyNotFound { class: String, property: String },

    /// Definition matches several slots of a class hierarchy by value
    #[error("Property {property} of {class} matches more than one definition")]
    AmbiguousProperty { class: String, property: String },

    /// Timeline references an element that is not a child of its node
    #[error("Timeline element not found: {0}")]
    ElementNotFound(String),

    /// Decoded or encoded count does not match the declared count
    #[error("Count mismatch in {context}: declared {declared}, actual {actual}")]
    CountMismatch { context: String, declared: i64, actual: usize },

    /// Two properties of one node share a definition
    #[error("Duplicate property: {0}")]
    DuplicateProperty(String),

    /// Property kind has no codec
    #[error("Unsupported property type {kind} for property {property}")]
    UnsupportedPropertyKind { property: String, kind: String },

    /// No write path exists for a section in this version
    #[error("Writing section {} is not supported for version {version}", tag(.magic))]
    UnsupportedWrite { magic: u32, version: i32 },

    /// Schema document could not be parsed
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// Memory mapping failed
    #[error("Memory mapping failed: {0}")]
    MmapFailed(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error while loading a schema document
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create an invalid structure error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidStructure(msg.into())
    }

    /// Create a count mismatch error.
    pub fn count_mismatch(context: impl Into<String>, declared: i64, actual: usize) -> Self {
        Self::CountMismatch { context: context.into(), declared, actual }
    }

    /// Failure category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidMagic { .. }
            | Error::UnsupportedVersion(_)
            | Error::FileSizeMismatch { .. }
            | Error::UnexpectedEof(_)
            | Error::SectionOutOfBounds { .. }
            | Error::DuplicateSection(_)
            | Error::UnknownSection { .. }
            | Error::MissingSection(_)
            | Error::InvalidSectionLength { .. }
            | Error::InvalidStructure(_)
            | Error::TypeMismatch { .. }
            | Error::InvalidSchema(_)
            | Error::Json(_)
            | Error::Other(_) => ErrorKind::Format,
            Error::StringIndexOutOfRange { .. }
            | Error::StringNotFound(_)
            | Error::ClassNotFound(_)
            | Error::PropertyNotFound { .. }
            | Error::AmbiguousProperty { .. }
            | Error::ElementNotFound(_) => ErrorKind::Reference,
            Error::CountMismatch { .. } | Error::DuplicateProperty(_) => ErrorKind::Cardinality,
            Error::UnsupportedPropertyKind { .. } | Error::UnsupportedWrite { .. } => {
                ErrorKind::Unsupported
            }
            Error::FileNotFound(_) | Error::MmapFailed(_) | Error::Io(_) => ErrorKind::Io,
        }
    }
}

/// Result type alias for XUR operations.
pub type Result<T> = std::result::Result<T, Error>;
