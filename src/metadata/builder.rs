//! Declaring new entities in an [`AbcFile`].
//!
//! A file built from scratch starts with [`AbcFile::new`] and grows through the `add_*` methods
//! below. Function bodies are attached afterwards with [`AbcFile::function_set_graph`].
//!
//! ```rust
//! use abckit::prelude::*;
//!
//! let mut file = AbcFile::new(Target::Static);
//! let module = file.add_module("app", ModuleFlags::empty())?;
//! let main = file.add_function(
//!     Parent::Module(module),
//!     "main",
//!     FunctionFlags::STATIC,
//!     Signature::new(TypeId::Void, vec![]),
//! )?;
//!
//! let mut graph = file.create_empty_graph(main)?;
//! let exit = graph.create_empty_block()?;
//! graph.append_succ(graph.start(), exit)?;
//! graph.append_succ(exit, graph.end())?;
//! let ret = file.static_factory()?.create_return_void(&mut graph)?;
//! graph.add_inst_back(exit, ret)?;
//! file.function_set_graph(main, &graph)?;
//! # Ok::<(), abckit::Error>(())
//! ```

use crate::{
    metadata::{
        abcfile::AbcFile,
        class::{Class, ClassFlags},
        function::{Function, FunctionFlags, Signature},
        ids::{ClassId, FunctionId, ModuleId, NamespaceId},
        module::{Module, ModuleFlags, Parent},
        namespace::Namespace,
    },
    Result,
};

impl AbcFile {
    /// Declares a module.
    ///
    /// # Errors
    /// [`crate::Error::NotSupported`] once the arena is exhausted.
    pub fn add_module(&mut self, name: &str, flags: ModuleFlags) -> Result<ModuleId> {
        let name = self.strings.intern(name)?;
        let id = next_id!(ModuleId, self.modules)?;
        self.modules.push(Module::new(name, flags));
        Ok(id)
    }

    /// Module an entity declared under `parent` belongs to.
    pub(crate) fn module_of(&self, parent: Parent) -> Result<ModuleId> {
        Ok(match parent {
            Parent::Module(id) => {
                self.module(id)?;
                id
            }
            Parent::Namespace(id) => self.namespace(id)?.module,
            Parent::Class(id) => self.class(id)?.module,
            Parent::Function(id) => self.function(id)?.module,
        })
    }

    /// Declares a namespace in a module or another namespace.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for an invalid parent or a class or function parent.
    pub fn add_namespace(&mut self, parent: Parent, name: &str) -> Result<NamespaceId> {
        let module = self.module_of(parent)?;
        if matches!(parent, Parent::Class(_) | Parent::Function(_)) {
            return Err(bad_argument!("namespaces can not be declared in {:?}", parent));
        }

        let name = self.strings.intern(name)?;
        let id = next_id!(NamespaceId, self.namespaces)?;
        self.namespaces.push(Namespace::new(name, module, parent));
        self.attach(parent, Child::Namespace(id));
        Ok(id)
    }

    /// Declares a class.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for an invalid parent or super class, or a class parent.
    pub fn add_class(
        &mut self,
        parent: Parent,
        name: &str,
        super_class: Option<ClassId>,
        flags: ClassFlags,
    ) -> Result<ClassId> {
        let module = self.module_of(parent)?;
        if matches!(parent, Parent::Class(_)) {
            return Err(bad_argument!("classes can not be nested in classes"));
        }
        if let Some(super_class) = super_class {
            self.class(super_class)?;
        }

        let name = self.strings.intern(name)?;
        let id = next_id!(ClassId, self.classes)?;
        self.classes
            .push(Class::new(name, module, parent, super_class, flags));
        self.attach(parent, Child::Class(id));
        Ok(id)
    }

    /// Declares a function without a body.
    ///
    /// # Errors
    /// [`crate::Error::BadArgument`] for an invalid parent.
    pub fn add_function(
        &mut self,
        parent: Parent,
        name: &str,
        flags: FunctionFlags,
        signature: Signature,
    ) -> Result<FunctionId> {
        let module = self.module_of(parent)?;
        let name = self.strings.intern(name)?;
        let id = next_id!(FunctionId, self.functions)?;
        self.functions
            .push(Function::new(name, module, parent, flags, signature, None));
        self.attach(parent, Child::Function(id));
        Ok(id)
    }

    /// Records `child` in the member list of `parent`.
    pub(crate) fn attach(&mut self, parent: Parent, child: Child) {
        match (parent, child) {
            (Parent::Module(id), Child::Namespace(child)) => {
                self.modules[id.index()].namespaces.push(child);
            }
            (Parent::Module(id), Child::Class(child)) => {
                self.modules[id.index()].classes.push(child);
            }
            (Parent::Module(id), Child::Function(child)) => {
                self.modules[id.index()].functions.push(child);
            }
            (Parent::Namespace(id), Child::Namespace(child)) => {
                self.namespaces[id.index()].namespaces.push(child);
            }
            (Parent::Namespace(id), Child::Class(child)) => {
                self.namespaces[id.index()].classes.push(child);
            }
            (Parent::Namespace(id), Child::Function(child)) => {
                self.namespaces[id.index()].functions.push(child);
            }
            (Parent::Class(id), Child::Function(child)) => {
                self.classes[id.index()].methods.push(child);
            }
            (Parent::Function(id), Child::Class(child)) => {
                self.functions[id.index()].classes.push(child);
            }
            (Parent::Function(id), Child::Function(child)) => {
                self.functions[id.index()].functions.push(child);
            }
            (Parent::Class(_), _) | (Parent::Function(_), Child::Namespace(_)) => {}
        }
    }
}

/// Entity placed under a [`Parent`].
#[derive(Debug, Clone, Copy)]
pub(crate) enum Child {
    Namespace(NamespaceId),
    Class(ClassId),
    Function(FunctionId),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{isa::Target, metadata::types::TypeId};

    #[test]
    fn declaration_tree() {
        let mut file = AbcFile::new(Target::Static);
        let module = file.add_module("app", ModuleFlags::empty()).unwrap();
        let ns = file.add_namespace(Parent::Module(module), "util").unwrap();
        let class = file
            .add_class(Parent::Namespace(ns), "Point", None, ClassFlags::FINAL)
            .unwrap();
        let method = file
            .add_function(
                Parent::Class(class),
                "len",
                FunctionFlags::empty(),
                Signature::new(TypeId::F64, vec![TypeId::Reference]),
            )
            .unwrap();

        assert_eq!(file.module(module).unwrap().namespaces(), &[ns]);
        assert_eq!(file.namespace(ns).unwrap().classes(), &[class]);
        assert_eq!(file.class(class).unwrap().methods(), &[method]);
        assert_eq!(file.function(method).unwrap().module(), module);
        assert_eq!(file.function(method).unwrap().parent_class(), Some(class));
        assert!(!file.function(method).unwrap().has_body());
    }

    #[test]
    fn invalid_parents() {
        let mut file = AbcFile::new(Target::Dynamic);
        let module = file.add_module("app", ModuleFlags::empty()).unwrap();
        let class = file
            .add_class(Parent::Module(module), "A", None, ClassFlags::empty())
            .unwrap();

        assert!(file.add_namespace(Parent::Class(class), "n").is_err());
        assert!(file
            .add_class(Parent::Class(class), "B", None, ClassFlags::empty())
            .is_err());
        assert!(file
            .add_class(
                Parent::Module(module),
                "C",
                Some(ClassId::new(40)),
                ClassFlags::empty()
            )
            .is_err());
        assert!(file
            .add_namespace(Parent::Module(ModuleId::new(3)), "n")
            .is_err());
    }
}
