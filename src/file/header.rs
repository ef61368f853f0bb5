//! Container header and section directory.
//!
//! Every abc file starts with a fixed header followed by a section directory:
//!
//! ```text
//! offset  size  field
//! 0x00    8     magic "PANDA\0\0\0"
//! 0x08    4     format version
//! 0x0C    1     target (0 = dynamic, 1 = static)
//! 0x0D    3     reserved (zero)
//! 0x10    4     section count
//! 0x14    12*n  section entries: kind u32, offset u32, size u32
//! ```
//!
//! The directory is parsed into borrowed slices so the loader never copies section data.

use strum::{Display, EnumCount, EnumIter, FromRepr, IntoEnumIterator};

use crate::{
    file::io::{push_le, write_le_at},
    file::parser::Parser,
    isa::Target,
    Error::NotSupported,
    Result,
};

/// Magic bytes at the start of every container.
pub const MAGIC: [u8; 8] = *b"PANDA\0\0\0";

/// The only format version this crate reads and writes.
pub const VERSION: [u8; 4] = [1, 0, 0, 0];

/// Size of the fixed header, up to and including the section count.
pub const HEADER_SIZE: usize = 0x14;

/// Size of a single section directory entry.
pub const SECTION_ENTRY_SIZE: usize = 12;

/// Identifies a section of the container.
///
/// Sections are written in declaration order; the loader accepts any order but requires
/// every kind exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumCount, FromRepr)]
#[repr(u32)]
pub enum SectionKind {
    /// Interned UTF-8 strings
    Strings = 1,
    /// Literal arrays
    LiteralArrays = 2,
    /// Module records
    Modules = 3,
    /// Namespace records
    Namespaces = 4,
    /// Class records
    Classes = 5,
    /// Function records
    Functions = 6,
    /// Annotation interface records
    AnnotationInterfaces = 7,
    /// Annotation records
    Annotations = 8,
    /// Import descriptor records
    Imports = 9,
    /// Export descriptor records
    Exports = 10,
    /// Concatenated function bodies
    Code = 11,
}

/// Parsed header and section directory, borrowing from the underlying bytes.
#[derive(Debug)]
pub struct Directory<'a> {
    /// Format version found in the header
    pub version: [u8; 4],
    /// Instruction set flavor of every function in the file
    pub target: Target,
    sections: [&'a [u8]; SectionKind::COUNT],
}

impl<'a> Directory<'a> {
    /// Parses the header of `data`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for a bad magic, an unknown or repeated section
    /// kind, a missing section or a section that lies outside of `data`, and
    /// [`crate::Error::NotSupported`] for an unknown format version.
    pub fn parse(data: &'a [u8]) -> Result<Directory<'a>> {
        let mut parser = Parser::new(data);

        if parser.read_bytes(MAGIC.len())? != MAGIC {
            return Err(malformed_error!("Invalid magic, this is not an abc file"));
        }

        let mut version = [0_u8; 4];
        version.copy_from_slice(parser.read_bytes(4)?);
        if version != VERSION {
            log::debug!("unsupported abc version {:?}", version);
            return Err(NotSupported);
        }

        let target = match parser.read_le::<u8>()? {
            0 => Target::Dynamic,
            1 => Target::Static,
            other => return Err(malformed_error!("Invalid target - {}", other)),
        };
        parser.advance_by(3)?;

        let count = parser.read_le::<u32>()? as usize;
        if count != SectionKind::COUNT {
            return Err(malformed_error!(
                "Expected {} sections, found {}",
                SectionKind::COUNT,
                count
            ));
        }

        let mut sections: [Option<&'a [u8]>; SectionKind::COUNT] = [None; SectionKind::COUNT];
        for _ in 0..count {
            let raw_kind = parser.read_le::<u32>()?;
            let offset = parser.read_le::<u32>()? as usize;
            let size = parser.read_le::<u32>()? as usize;

            let Some(kind) = SectionKind::from_repr(raw_kind) else {
                return Err(malformed_error!("Unknown section kind - {}", raw_kind));
            };

            let Some(end) = offset.checked_add(size) else {
                return Err(out_of_bounds_error!());
            };
            if end > data.len() || offset < HEADER_SIZE {
                return Err(malformed_error!(
                    "Section {} [{:#x}..{:#x}] lies outside of the file",
                    kind,
                    offset,
                    end
                ));
            }

            let slot = &mut sections[kind as usize - 1];
            if slot.is_some() {
                return Err(malformed_error!("Section {} is present twice", kind));
            }
            *slot = Some(&data[offset..end]);
        }

        let mut resolved: [&'a [u8]; SectionKind::COUNT] = [&[]; SectionKind::COUNT];
        for kind in SectionKind::iter() {
            match sections[kind as usize - 1] {
                Some(section) => resolved[kind as usize - 1] = section,
                None => return Err(malformed_error!("Section {} is missing", kind)),
            }
        }

        Ok(Directory {
            version,
            target,
            sections: resolved,
        })
    }

    /// Returns the bytes of a section.
    #[must_use]
    pub fn section(&self, kind: SectionKind) -> &'a [u8] {
        self.sections[kind as usize - 1]
    }
}

/// Assembles a complete container from the header fields and the encoded sections.
///
/// Sections are laid out back to back directly after the directory, in [`SectionKind`] order.
///
/// # Errors
/// Returns [`crate::Error::NotSupported`] if the result would exceed the 4 GiB offset range.
pub fn assemble(target: Target, sections: &[(SectionKind, Vec<u8>)]) -> Result<Vec<u8>> {
    let directory_size = HEADER_SIZE + sections.len() * SECTION_ENTRY_SIZE;
    let total: usize = directory_size + sections.iter().map(|(_, data)| data.len()).sum::<usize>();
    if u32::try_from(total).is_err() {
        return Err(NotSupported);
    }

    let mut output = Vec::with_capacity(total);
    output.extend_from_slice(&MAGIC);
    output.extend_from_slice(&VERSION);
    output.push(match target {
        Target::Dynamic => 0,
        Target::Static => 1,
    });
    output.extend_from_slice(&[0, 0, 0]);
    #[allow(clippy::cast_possible_truncation)]
    push_le(&mut output, sections.len() as u32);

    let entries_at = output.len();
    output.resize(directory_size, 0);

    let mut entry_offset = entries_at;
    for (kind, data) in sections {
        #[allow(clippy::cast_possible_truncation)]
        let offset = output.len() as u32;
        output.extend_from_slice(data);

        write_le_at(&mut output, &mut entry_offset, *kind as u32)?;
        write_le_at(&mut output, &mut entry_offset, offset)?;
        #[allow(clippy::cast_possible_truncation)]
        write_le_at(&mut output, &mut entry_offset, data.len() as u32)?;
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_sections() -> Vec<(SectionKind, Vec<u8>)> {
        SectionKind::iter()
            .map(|kind| (kind, vec![kind as u8; kind as usize]))
            .collect()
    }

    #[test]
    fn assemble_and_parse() {
        let bytes = assemble(Target::Static, &all_sections()).unwrap();
        let directory = Directory::parse(&bytes).unwrap();

        assert_eq!(directory.target, Target::Static);
        assert_eq!(directory.version, VERSION);
        for kind in SectionKind::iter() {
            assert_eq!(directory.section(kind), vec![kind as u8; kind as usize]);
        }
    }

    #[test]
    fn bad_magic() {
        let mut bytes = assemble(Target::Dynamic, &all_sections()).unwrap();
        bytes[0] = b'X';
        assert!(matches!(
            Directory::parse(&bytes),
            Err(crate::Error::Malformed { .. })
        ));
    }

    #[test]
    fn unsupported_version() {
        let mut bytes = assemble(Target::Dynamic, &all_sections()).unwrap();
        bytes[8] = 9;
        assert!(matches!(
            Directory::parse(&bytes),
            Err(crate::Error::NotSupported)
        ));
    }

    #[test]
    fn missing_section() {
        let mut sections = all_sections();
        sections.pop();
        let bytes = assemble(Target::Dynamic, &sections).unwrap();
        assert!(Directory::parse(&bytes).is_err());
    }

    #[test]
    fn truncated_section() {
        let mut bytes = assemble(Target::Dynamic, &all_sections()).unwrap();
        bytes.truncate(bytes.len() - 1);
        assert!(Directory::parse(&bytes).is_err());
    }
}
