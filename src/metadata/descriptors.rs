//! Import and export descriptors of dynamic modules.
//!
//! Removing a descriptor leaves a tombstone in place: handles stay stable, the module no longer
//! lists the descriptor as live, and lookups through the handle fail with
//! [`crate::Error::BadArgument`].

use bitflags::bitflags;
use strum::{Display, FromRepr};

use crate::metadata::ids::{ModuleId, StringId};

bitflags! {
    /// Persisted state of a descriptor record.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub(crate) struct DescriptorFlags: u8 {
        /// Tombstone left by a removal
        const REMOVED = 0x01;
    }
}

/// How a binding is imported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, FromRepr)]
#[strum(serialize_all = "lowercase")]
#[repr(u8)]
pub enum ImportKind {
    /// `import { name as alias } from "module"`
    Regular = 0,
    /// `import * as alias from "module"`
    Namespace = 1,
}

/// How a binding is exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, FromRepr)]
#[strum(serialize_all = "lowercase")]
#[repr(u8)]
pub enum ExportKind {
    /// `export { name as alias }` of a local binding
    Local = 0,
    /// `export { name as alias } from "module"`
    Indirect = 1,
    /// `export * from "module"`
    Star = 2,
}

/// An import of a module.
#[derive(Debug, Clone)]
pub struct ImportDescriptor {
    pub(crate) module: ModuleId,
    pub(crate) imported_module: ModuleId,
    pub(crate) kind: ImportKind,
    pub(crate) name: StringId,
    pub(crate) alias: StringId,
    pub(crate) flags: DescriptorFlags,
}

impl ImportDescriptor {
    /// Importing module.
    #[must_use]
    pub fn module(&self) -> ModuleId {
        self.module
    }

    /// Module the binding comes from.
    #[must_use]
    pub fn imported_module(&self) -> ModuleId {
        self.imported_module
    }

    /// Import form.
    #[must_use]
    pub fn kind(&self) -> ImportKind {
        self.kind
    }

    /// Imported name, `*` for namespace imports.
    #[must_use]
    pub fn name(&self) -> StringId {
        self.name
    }

    /// Local name of the binding.
    #[must_use]
    pub fn alias(&self) -> StringId {
        self.alias
    }

    /// Returns `true` for tombstones.
    #[must_use]
    pub fn is_removed(&self) -> bool {
        self.flags.contains(DescriptorFlags::REMOVED)
    }
}

/// An export of a module.
#[derive(Debug, Clone)]
pub struct ExportDescriptor {
    pub(crate) module: ModuleId,
    pub(crate) exported_module: ModuleId,
    pub(crate) kind: ExportKind,
    pub(crate) name: StringId,
    pub(crate) alias: StringId,
    pub(crate) flags: DescriptorFlags,
}

impl ExportDescriptor {
    /// Exporting module.
    #[must_use]
    pub fn module(&self) -> ModuleId {
        self.module
    }

    /// Module the binding is taken from; the exporting module itself for local exports.
    #[must_use]
    pub fn exported_module(&self) -> ModuleId {
        self.exported_module
    }

    /// Export form.
    #[must_use]
    pub fn kind(&self) -> ExportKind {
        self.kind
    }

    /// Name of the binding inside its module.
    #[must_use]
    pub fn name(&self) -> StringId {
        self.name
    }

    /// Name the binding is exported as.
    #[must_use]
    pub fn alias(&self) -> StringId {
        self.alias
    }

    /// Returns `true` for tombstones.
    #[must_use]
    pub fn is_removed(&self) -> bool {
        self.flags.contains(DescriptorFlags::REMOVED)
    }
}
