//! Modules and the parent relation shared by the nested entities.

use bitflags::bitflags;

use crate::metadata::ids::{
    AnnotationInterfaceId, ClassId, ExportId, FunctionId, ImportId, ModuleId, NamespaceId,
    StringId,
};

bitflags! {
    /// Module properties.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ModuleFlags: u8 {
        /// Declared by another file, only referenced by imports
        const EXTERNAL = 0x01;
    }
}

/// Entity a namespace, class or function is declared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parent {
    /// Top level of a module
    Module(ModuleId),
    /// A namespace
    Namespace(NamespaceId),
    /// A class (methods)
    Class(ClassId),
    /// A function (closures and local classes)
    Function(FunctionId),
}

impl Parent {
    pub(crate) fn kind_code(self) -> u8 {
        match self {
            Parent::Module(_) => 0,
            Parent::Namespace(_) => 1,
            Parent::Class(_) => 2,
            Parent::Function(_) => 3,
        }
    }

    pub(crate) fn raw_index(self) -> u32 {
        match self {
            Parent::Module(id) => id.0,
            Parent::Namespace(id) => id.0,
            Parent::Class(id) => id.0,
            Parent::Function(id) => id.0,
        }
    }

    pub(crate) fn from_parts(kind: u8, index: u32) -> Option<Parent> {
        match kind {
            0 => Some(Parent::Module(ModuleId::new(index))),
            1 => Some(Parent::Namespace(NamespaceId::new(index))),
            2 => Some(Parent::Class(ClassId::new(index))),
            3 => Some(Parent::Function(FunctionId::new(index))),
            _ => None,
        }
    }
}

/// A compilation unit: the root of the declaration tree of one source file.
#[derive(Debug, Clone)]
pub struct Module {
    pub(crate) name: StringId,
    pub(crate) flags: ModuleFlags,
    pub(crate) namespaces: Vec<NamespaceId>,
    pub(crate) classes: Vec<ClassId>,
    pub(crate) functions: Vec<FunctionId>,
    pub(crate) imports: Vec<ImportId>,
    pub(crate) exports: Vec<ExportId>,
    pub(crate) annotation_interfaces: Vec<AnnotationInterfaceId>,
}

impl Module {
    pub(crate) fn new(name: StringId, flags: ModuleFlags) -> Self {
        Module {
            name,
            flags,
            namespaces: Vec::new(),
            classes: Vec::new(),
            functions: Vec::new(),
            imports: Vec::new(),
            exports: Vec::new(),
            annotation_interfaces: Vec::new(),
        }
    }

    /// Name of the module.
    #[must_use]
    pub fn name(&self) -> StringId {
        self.name
    }

    /// Returns `true` for modules declared by another file.
    #[must_use]
    pub fn is_external(&self) -> bool {
        self.flags.contains(ModuleFlags::EXTERNAL)
    }

    /// Top level namespaces.
    #[must_use]
    pub fn namespaces(&self) -> &[NamespaceId] {
        &self.namespaces
    }

    /// Top level classes.
    #[must_use]
    pub fn classes(&self) -> &[ClassId] {
        &self.classes
    }

    /// Top level functions.
    #[must_use]
    pub fn functions(&self) -> &[FunctionId] {
        &self.functions
    }

    /// Live import descriptors.
    #[must_use]
    pub fn imports(&self) -> &[ImportId] {
        &self.imports
    }

    /// Live export descriptors.
    #[must_use]
    pub fn exports(&self) -> &[ExportId] {
        &self.exports
    }

    /// Annotation interfaces declared by the module.
    #[must_use]
    pub fn annotation_interfaces(&self) -> &[AnnotationInterfaceId] {
        &self.annotation_interfaces
    }
}
