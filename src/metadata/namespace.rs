//! Namespaces.

use crate::metadata::{
    ids::{ClassId, FunctionId, ModuleId, NamespaceId, StringId},
    module::Parent,
};

/// A named scope inside a module.
#[derive(Debug, Clone)]
pub struct Namespace {
    pub(crate) name: StringId,
    pub(crate) module: ModuleId,
    pub(crate) parent: Parent,
    pub(crate) namespaces: Vec<NamespaceId>,
    pub(crate) classes: Vec<ClassId>,
    pub(crate) functions: Vec<FunctionId>,
}

impl Namespace {
    pub(crate) fn new(name: StringId, module: ModuleId, parent: Parent) -> Self {
        Namespace {
            name,
            module,
            parent,
            namespaces: Vec::new(),
            classes: Vec::new(),
            functions: Vec::new(),
        }
    }

    /// Name of the namespace.
    #[must_use]
    pub fn name(&self) -> StringId {
        self.name
    }

    /// Module the namespace is declared in.
    #[must_use]
    pub fn module(&self) -> ModuleId {
        self.module
    }

    /// Enclosing module or namespace.
    #[must_use]
    pub fn parent(&self) -> Parent {
        self.parent
    }

    /// Nested namespaces.
    #[must_use]
    pub fn namespaces(&self) -> &[NamespaceId] {
        &self.namespaces
    }

    /// Classes declared in the namespace.
    #[must_use]
    pub fn classes(&self) -> &[ClassId] {
        &self.classes
    }

    /// Functions declared in the namespace.
    #[must_use]
    pub fn functions(&self) -> &[FunctionId] {
        &self.functions
    }
}
