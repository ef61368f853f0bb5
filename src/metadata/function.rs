//! Functions, their signatures and bodies.

use bitflags::bitflags;

use crate::metadata::{
    ids::{AnnotationId, ClassId, FunctionId, ModuleId, StringId},
    module::Parent,
    types::TypeId,
};

bitflags! {
    /// Function properties.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FunctionFlags: u8 {
        /// No receiver
        const STATIC = 0x01;
        /// Constructor
        const CTOR = 0x02;
        /// Function expression without a name in the source
        const ANONYMOUS = 0x04;
        /// Implemented by the runtime
        const NATIVE = 0x08;
        /// Declared without implementation
        const ABSTRACT = 0x10;
        /// Async function
        const ASYNC = 0x20;
        /// Declared by another file
        const EXTERNAL = 0x40;
    }
}

/// Return and parameter types of a function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub(crate) ret: TypeId,
    pub(crate) params: Vec<TypeId>,
}

impl Signature {
    /// Creates a signature.
    #[must_use]
    pub fn new(ret: TypeId, params: Vec<TypeId>) -> Self {
        Signature { ret, params }
    }

    /// Return type.
    #[must_use]
    pub fn return_type(&self) -> TypeId {
        self.ret
    }

    /// Parameter types in order.
    #[must_use]
    pub fn params(&self) -> &[TypeId] {
        &self.params
    }
}

/// Where the encoded instructions of a function live.
#[derive(Debug, Clone)]
pub(crate) enum Body {
    /// Untouched bytes of the Code section of the source file
    Original { offset: usize, len: usize },
    /// Encoding produced by [`crate::AbcFile::function_set_graph`]
    Modified(Vec<u8>),
}

/// A function or method.
#[derive(Debug, Clone)]
pub struct Function {
    pub(crate) name: StringId,
    pub(crate) module: ModuleId,
    pub(crate) parent: Parent,
    pub(crate) flags: FunctionFlags,
    pub(crate) signature: Signature,
    pub(crate) body: Option<Body>,
    pub(crate) functions: Vec<FunctionId>,
    pub(crate) classes: Vec<ClassId>,
    pub(crate) annotations: Vec<AnnotationId>,
}

impl Function {
    pub(crate) fn new(
        name: StringId,
        module: ModuleId,
        parent: Parent,
        flags: FunctionFlags,
        signature: Signature,
        body: Option<Body>,
    ) -> Self {
        Function {
            name,
            module,
            parent,
            flags,
            signature,
            body,
            functions: Vec::new(),
            classes: Vec::new(),
            annotations: Vec::new(),
        }
    }

    /// Name of the function.
    #[must_use]
    pub fn name(&self) -> StringId {
        self.name
    }

    /// Module the function is declared in.
    #[must_use]
    pub fn module(&self) -> ModuleId {
        self.module
    }

    /// Enclosing module, namespace, class or function.
    #[must_use]
    pub fn parent(&self) -> Parent {
        self.parent
    }

    /// Class of a method.
    #[must_use]
    pub fn parent_class(&self) -> Option<ClassId> {
        match self.parent {
            Parent::Class(class) => Some(class),
            _ => None,
        }
    }

    /// Function properties.
    #[must_use]
    pub fn flags(&self) -> FunctionFlags {
        self.flags
    }

    /// Returns `true` for static functions.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.flags.contains(FunctionFlags::STATIC)
    }

    /// Returns `true` for constructors.
    #[must_use]
    pub fn is_ctor(&self) -> bool {
        self.flags.contains(FunctionFlags::CTOR)
    }

    /// Returns `true` for anonymous functions.
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.flags.contains(FunctionFlags::ANONYMOUS)
    }

    /// Return and parameter types.
    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Returns `true` if the function carries instructions.
    #[must_use]
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// Returns `true` once the body was replaced through a graph.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        matches!(self.body, Some(Body::Modified(_)))
    }

    /// Nested functions (closures).
    #[must_use]
    pub fn functions(&self) -> &[FunctionId] {
        &self.functions
    }

    /// Local classes.
    #[must_use]
    pub fn classes(&self) -> &[ClassId] {
        &self.classes
    }

    /// Live annotations.
    #[must_use]
    pub fn annotations(&self) -> &[AnnotationId] {
        &self.annotations
    }
}
