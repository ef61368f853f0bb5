//! Container file abstraction and byte sources.
//!
//! This module owns the raw bytes of an abc container and the parsed section directory that
//! borrows from them. Everything above this layer (the container model loader, the body decoder)
//! works on the borrowed section slices handed out by [`crate::file::File`].
//!
//! # Key Components
//!
//! ## Core Types
//! - [`crate::file::File`] - Bytes of a container together with its parsed [`Directory`]
//! - [`crate::file::Backend`] - Trait for different data sources (disk files, memory buffers)
//!
//! ## Parsing Infrastructure
//! - [`crate::file::parser::Parser`] - Cursor used by the record and body decoders
//! - [`crate::file::io`] - Little-endian and compressed integer primitives
//! - [`crate::file::header`] - Header layout, section kinds and container assembly
//!
//! ## Backend Implementations
//! - [`crate::file::physical::Physical`] - Memory-mapped file backend for disk access
//! - [`crate::file::memory::Memory`] - In-memory buffer backend
//!
//! # Examples
//!
//! ```rust,no_run
//! use abckit::File;
//! use std::path::Path;
//!
//! let file = File::from_file(Path::new("module.abc"))?;
//! println!("{} bytes, target {}", file.len(), file.target());
//! # Ok::<(), abckit::Error>(())
//! ```

pub mod header;
pub mod io;
pub mod memory;
pub mod parser;
pub mod physical;

use std::path::Path;

use crate::{isa::Target, Error::Empty, Result};
use header::{Directory, SectionKind};
use memory::Memory;
use ouroboros::self_referencing;
use physical::Physical;

/// Source of container bytes.
///
/// Implementors only expose their whole buffer; bounds-checked ranges are provided on top of it.
pub trait Backend: Send + Sync {
    /// The complete buffer.
    fn bytes(&self) -> &[u8];

    /// Size of the buffer in bytes.
    fn len(&self) -> usize {
        self.bytes().len()
    }

    /// The `len` bytes starting at `offset`.
    ///
    /// # Errors
    /// [`crate::Error::OutOfBounds`] if the range does not lie within the buffer.
    fn range(&self, offset: usize, len: usize) -> Result<&[u8]> {
        offset
            .checked_add(len)
            .and_then(|end| self.bytes().get(offset..end))
            .ok_or_else(|| out_of_bounds_error!())
    }
}

#[self_referencing]
/// Represents a loaded abc container.
///
/// Holds the byte source and the section directory parsed from it. The directory only stores
/// slices into the source, so opening a container does not copy any section.
///
/// # Examples
///
/// ```rust,no_run
/// use abckit::File;
///
/// let data = std::fs::read("module.abc")?;
/// let file = File::from_mem(data)?;
/// println!("format version {:?}", file.version());
/// # Ok::<(), abckit::Error>(())
/// ```
pub struct File {
    /// The underlying data source (memory or file).
    data: Box<dyn Backend>,
    /// The parsed directory, referencing the data.
    #[borrows(data)]
    #[covariant]
    directory: Directory<'this>,
}

impl File {
    /// Loads a container from the given path. The file is memory-mapped.
    ///
    /// # Errors
    ///
    /// Returns an error if the file can not be opened, is empty or has an invalid header.
    pub fn from_file(file: &Path) -> Result<File> {
        let input = Physical::new(file)?;

        Self::load(input)
    }

    /// Loads a container from a memory buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer is empty or has an invalid header.
    pub fn from_mem(data: Vec<u8>) -> Result<File> {
        let input = Memory::new(data);

        Self::load(input)
    }

    fn load<T: Backend + 'static>(data: T) -> Result<File> {
        if data.len() == 0 {
            return Err(Empty);
        }

        let data = Box::new(data);

        File::try_new(data, |data| Directory::parse(data.bytes()))
    }

    /// Returns the total size of the loaded file in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.borrow_data().len()
    }

    /// Returns `true` if the file has a length of zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the entire raw container.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.borrow_data().bytes()
    }

    /// Returns a bounds checked slice of the raw container.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfBounds`] if the range exceeds the file.
    pub fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        self.borrow_data().range(offset, len)
    }

    /// Instruction set flavor declared in the header.
    #[must_use]
    pub fn target(&self) -> Target {
        self.borrow_directory().target
    }

    /// Format version declared in the header.
    #[must_use]
    pub fn version(&self) -> [u8; 4] {
        self.borrow_directory().version
    }

    /// Returns the bytes of one section.
    #[must_use]
    pub fn section(&self, kind: SectionKind) -> &[u8] {
        self.borrow_directory().section(kind)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use strum::IntoEnumIterator;

    use super::*;
    use crate::file::header::assemble;

    fn container() -> Vec<u8> {
        let sections: Vec<(SectionKind, Vec<u8>)> = SectionKind::iter()
            .map(|kind| (kind, vec![0]))
            .collect();
        assemble(Target::Dynamic, &sections).unwrap()
    }

    #[test]
    fn load_memory() {
        let file = File::from_mem(container()).unwrap();

        assert_eq!(file.target(), Target::Dynamic);
        assert_eq!(file.version(), header::VERSION);
        assert_eq!(file.section(SectionKind::Strings), &[0]);
        assert_eq!(file.data_slice(0, 8).unwrap(), &header::MAGIC);
        assert!(!file.is_empty());
    }

    #[test]
    fn load_physical() {
        let mut temp = tempfile::NamedTempFile::new().unwrap();
        temp.write_all(&container()).unwrap();

        let file = File::from_file(temp.path()).unwrap();
        assert_eq!(file.len(), container().len());
    }

    #[test]
    fn load_empty() {
        assert!(matches!(File::from_mem(Vec::new()), Err(crate::Error::Empty)));
    }

    #[test]
    fn load_missing() {
        let result = File::from_file(Path::new("/nonexistent/module.abc"));
        assert!(matches!(result, Err(crate::Error::FileError(_))));
    }
}
