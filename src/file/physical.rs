//! Read-only memory mapping of a container on disk.
//!
//! Opening a container only touches the pages the loader reads; function bodies that are never
//! decoded stay on disk until the writer copies them.

use super::Backend;
use crate::Result;

use memmap2::Mmap;
use std::{fs, path::Path};

/// Container bytes mapped from a file.
#[derive(Debug)]
pub struct Physical {
    map: Mmap,
}

impl Physical {
    /// Maps the container at `path`.
    ///
    /// # Errors
    /// [`crate::Error::FileError`] if the file can not be opened or mapped.
    pub fn new(path: impl AsRef<Path>) -> Result<Physical> {
        let file = fs::File::open(path.as_ref())?;

        // read-only mapping, the writer always produces a fresh file
        let map = unsafe { Mmap::map(&file)? };
        log::debug!("mapped {} ({} bytes)", path.as_ref().display(), map.len());

        Ok(Physical { map })
    }
}

impl Backend for Physical {
    fn bytes(&self) -> &[u8] {
        &self.map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn maps_file_contents() {
        let mut temp = tempfile::NamedTempFile::new().unwrap();
        temp.write_all(b"PANDA\0\0\0").unwrap();
        temp.write_all(&[7; 24]).unwrap();
        temp.flush().unwrap();

        let physical = Physical::new(temp.path()).unwrap();
        assert_eq!(physical.len(), 32);
        assert_eq!(physical.range(0, 5).unwrap(), b"PANDA");
        assert_eq!(physical.range(30, 2).unwrap(), &[7, 7]);
        assert!(physical.range(30, 3).is_err());
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            Physical::new("/nonexistent/module.abc"),
            Err(crate::Error::FileError(_))
        ));
    }
}
