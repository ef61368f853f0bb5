//! Typed handles into the arenas of an [`crate::AbcFile`].
//!
//! Every container entity is addressed by a small `Copy` handle instead of a reference. Handles
//! are plain positions, so a handle of one file used with another file is only caught by the
//! bounds check of the accessor; instruction graphs additionally carry the [`FileId`] of the
//! file they were created from.

use std::sync::atomic::{AtomicU32, Ordering};

arena_id!(
    /// Handle of an interned string
    StringId,
    "s"
);

arena_id!(
    /// Handle of a literal array
    LiteralArrayId,
    "la"
);

arena_id!(
    /// Handle of a module
    ModuleId,
    "m"
);

arena_id!(
    /// Handle of a namespace
    NamespaceId,
    "ns"
);

arena_id!(
    /// Handle of a class
    ClassId,
    "c"
);

arena_id!(
    /// Handle of a function or method
    FunctionId,
    "f"
);

arena_id!(
    /// Handle of an annotation interface
    AnnotationInterfaceId,
    "ai"
);

arena_id!(
    /// Handle of an annotation
    AnnotationId,
    "an"
);

arena_id!(
    /// Handle of an import descriptor
    ImportId,
    "imp"
);

arena_id!(
    /// Handle of an export descriptor
    ExportId,
    "exp"
);

static NEXT_FILE_ID: AtomicU32 = AtomicU32::new(1);

/// Process-wide unique identity of an opened or built [`crate::AbcFile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId(u32);

impl FileId {
    pub(crate) fn next() -> FileId {
        FileId(NEXT_FILE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "file#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(ModuleId::new(3).to_string(), "m3");
        assert_eq!(format!("{:?}", FunctionId::new(7)), "FunctionId(7)");
        assert_eq!(ImportId::new(0).index(), 0);
    }

    #[test]
    fn file_ids_are_unique() {
        assert_ne!(FileId::next(), FileId::next());
    }
}
