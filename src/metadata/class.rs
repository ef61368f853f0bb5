//! Classes.

use bitflags::bitflags;

use crate::metadata::{
    ids::{AnnotationId, ClassId, FunctionId, ModuleId, StringId},
    module::Parent,
};

bitflags! {
    /// Class properties.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ClassFlags: u8 {
        /// Can not be instantiated
        const ABSTRACT = 0x01;
        /// Can not be extended
        const FINAL = 0x02;
        /// Interface declaration
        const INTERFACE = 0x04;
        /// Declared by another file
        const EXTERNAL = 0x08;
    }
}

/// A class declaration.
#[derive(Debug, Clone)]
pub struct Class {
    pub(crate) name: StringId,
    pub(crate) module: ModuleId,
    pub(crate) parent: Parent,
    pub(crate) super_class: Option<ClassId>,
    pub(crate) flags: ClassFlags,
    pub(crate) methods: Vec<FunctionId>,
    pub(crate) annotations: Vec<AnnotationId>,
}

impl Class {
    pub(crate) fn new(
        name: StringId,
        module: ModuleId,
        parent: Parent,
        super_class: Option<ClassId>,
        flags: ClassFlags,
    ) -> Self {
        Class {
            name,
            module,
            parent,
            super_class,
            flags,
            methods: Vec::new(),
            annotations: Vec::new(),
        }
    }

    /// Name of the class.
    #[must_use]
    pub fn name(&self) -> StringId {
        self.name
    }

    /// Module the class is declared in.
    #[must_use]
    pub fn module(&self) -> ModuleId {
        self.module
    }

    /// Enclosing module, namespace or function.
    #[must_use]
    pub fn parent(&self) -> Parent {
        self.parent
    }

    /// Direct super class, if any.
    #[must_use]
    pub fn super_class(&self) -> Option<ClassId> {
        self.super_class
    }

    /// Class properties.
    #[must_use]
    pub fn flags(&self) -> ClassFlags {
        self.flags
    }

    /// Methods in declaration order.
    #[must_use]
    pub fn methods(&self) -> &[FunctionId] {
        &self.methods
    }

    /// Live annotations.
    #[must_use]
    pub fn annotations(&self) -> &[AnnotationId] {
        &self.annotations
    }
}
