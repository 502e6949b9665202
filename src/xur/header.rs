//! Container header.
//!
//! ```text
//! +----------------------+
//! | Magic "XUIB"         |  int32
//! | Version              |  int32 (5 or 8)
//! | Flags                |  int32, opaque
//! | Tool version         |  int16, opaque
//! | File size            |  int32, must equal stream length
//! | Sections count       |  int16
//! +----------------------+
//! ```

use std::io::Write;

use tracing::{debug, error};

use super::format::*;
use super::stream::{IStream, OStream};
use crate::util::{Error, Result};

/// Parsed container header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct XurHeader {
    pub version: FormatVersion,
    pub flags: i32,
    pub tool_version: i16,
    pub file_size: u32,
    pub sections_count: u16,
}

impl XurHeader {
    /// Parse and validate the header at the start of `data`.
    ///
    /// `data` must be the whole container: the declared file size is checked
    /// against its length.
    pub fn read(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(Error::UnexpectedEof(data.len() as u64));
        }
        let mut stream = IStream::new(&data[..HEADER_SIZE], 0);

        let magic = stream.read_u32()?;
        if magic != XUR_MAGIC {
            error!(expected = XUR_MAGIC, actual = magic, "invalid container magic");
            return Err(Error::InvalidMagic { expected: XUR_MAGIC, actual: magic });
        }

        let version_number = stream.read_i32()?;
        let version = FormatVersion::from_number(version_number).inspect_err(|_| {
            error!(version = version_number, "unsupported container version");
        })?;

        let flags = stream.read_i32()?;
        let tool_version = stream.read_i16()?;

        let file_size = stream.read_i32()?;
        if file_size < 0 || file_size as u64 != data.len() as u64 {
            error!(declared = file_size, actual = data.len(), "file size mismatch");
            return Err(Error::FileSizeMismatch {
                declared: file_size as u64,
                actual: data.len() as u64,
            });
        }

        let sections_count = stream.read_i16()?;
        let sections_count = u16::try_from(sections_count)
            .map_err(|_| Error::invalid(format!("negative sections count {}", sections_count)))?;

        debug!(%version, flags, tool_version, file_size, sections_count, "read container header");

        Ok(Self {
            version,
            flags,
            tool_version,
            file_size: file_size as u32,
            sections_count,
        })
    }

    /// Write the header.
    pub fn write<W: Write>(&self, out: &mut OStream<W>) -> Result<()> {
        let file_size = i32::try_from(self.file_size)
            .map_err(|_| Error::invalid(format!("file size {} exceeds int32", self.file_size)))?;
        let sections_count = i16::try_from(self.sections_count)
            .map_err(|_| Error::invalid(format!("{} sections exceed int16", self.sections_count)))?;

        out.write_u32(XUR_MAGIC)?;
        out.write_i32(self.version.number())?;
        out.write_i32(self.flags)?;
        out.write_i16(self.tool_version)?;
        out.write_i32(file_size)?;
        out.write_i16(sections_count)?;
        Ok(())
    }
}
