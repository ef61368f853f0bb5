//! Validation configuration and the checks run after a container was loaded.
//!
//! The loader always checks that every handle stored in a record points into its arena. The
//! checks here go further and are selected by [`ValidationConfig`]:
//!
//! - **structural**: parent chains terminate within `max_nesting_depth`, entities name the module
//!   their parent lives in, super class chains are acyclic, annotations match their owners
//! - **bodies**: every function body is decoded into a graph and verified

use crate::{
    metadata::{
        abcfile::AbcFile,
        ids::{ClassId, FunctionId, ModuleId, NamespaceId},
        module::Parent,
    },
    Error::RecursionLimit,
    Result,
};

/// Configuration for validation during container loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct ValidationConfig {
    /// Enable structural validation of the declaration tree (recommended: always true)
    pub enable_structural_validation: bool,

    /// Decode and verify every function body while opening the file
    /// Catches malformed bodies early at the cost of a full decode
    pub enable_body_validation: bool,

    /// Maximum nesting depth of namespaces, classes and functions (default: 64)
    pub max_nesting_depth: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self::production()
    }
}

impl ValidationConfig {
    /// Creates a disabled validation configuration for maximum performance
    ///
    /// Only the handle bounds checks of the loader remain.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enable_structural_validation: false,
            enable_body_validation: false,
            max_nesting_depth: 0,
        }
    }

    /// Creates a minimal validation configuration
    #[must_use]
    pub fn minimal() -> Self {
        Self {
            enable_structural_validation: true,
            enable_body_validation: false,
            max_nesting_depth: 64,
        }
    }

    /// Creates a validation configuration suitable for production use
    #[must_use]
    pub fn production() -> Self {
        Self {
            enable_structural_validation: true,
            enable_body_validation: false,
            max_nesting_depth: 64,
        }
    }

    /// Creates a validation configuration with all checks enabled, bodies included
    #[must_use]
    pub fn strict() -> Self {
        Self {
            enable_structural_validation: true,
            enable_body_validation: true,
            max_nesting_depth: 64,
        }
    }
}

/// Runs the checks selected by `config` on a freshly loaded file.
pub(crate) fn validate(file: &AbcFile, config: &ValidationConfig) -> Result<()> {
    if config.enable_structural_validation {
        validate_structure(file, config.max_nesting_depth)?;
    }

    if config.enable_body_validation {
        for function in file.functions() {
            if file.function(function)?.has_body() {
                let graph = file.create_graph_from_function(function)?;
                graph.verify()?;
            }
        }
    }

    Ok(())
}

fn validate_structure(file: &AbcFile, max_depth: usize) -> Result<()> {
    for namespace in file.namespaces() {
        let module = file.namespace(namespace)?.module();
        check_chain(file, Parent::Namespace(namespace), module, max_depth)?;
    }
    for class in file.classes() {
        let module = file.class(class)?.module();
        check_chain(file, Parent::Class(class), module, max_depth)?;
        check_super_chain(file, class, max_depth)?;
    }
    for function in file.functions() {
        let module = file.function(function)?.module();
        check_chain(file, Parent::Function(function), module, max_depth)?;
    }

    for annotation in file.annotations() {
        let annotation = file.annotation(annotation)?;
        let interface = file.annotation_interface(annotation.interface())?;
        for element in annotation.elements() {
            if !interface
                .fields()
                .iter()
                .any(|field| field.name() == element.name())
            {
                return Err(malformed_error!(
                    "annotation element {} is not a field of {}",
                    file.string(element.name())?,
                    file.string(interface.name())?
                ));
            }
        }
    }

    Ok(())
}

/// Walks the parent chain of `entity` up to its module.
fn check_chain(
    file: &AbcFile,
    entity: Parent,
    module: ModuleId,
    max_depth: usize,
) -> Result<()> {
    let mut current = entity;
    let mut depth = 0;

    loop {
        let (parent, owner) = match current {
            Parent::Module(id) => {
                if id != module {
                    return Err(malformed_error!(
                        "{:?} is declared in {} but nested in {}",
                        entity,
                        module,
                        id
                    ));
                }
                return Ok(());
            }
            Parent::Namespace(id) => parent_of_namespace(file, id)?,
            Parent::Class(id) => parent_of_class(file, id)?,
            Parent::Function(id) => parent_of_function(file, id)?,
        };
        if owner != module {
            return Err(malformed_error!(
                "{:?} belongs to {} but its parent belongs to {}",
                entity,
                module,
                owner
            ));
        }

        depth += 1;
        if depth > max_depth {
            return Err(RecursionLimit(max_depth));
        }
        current = parent;
    }
}

fn parent_of_namespace(
    file: &AbcFile,
    id: NamespaceId,
) -> Result<(Parent, ModuleId)> {
    let namespace = file.namespace(id)?;
    Ok((namespace.parent(), namespace.module()))
}

fn parent_of_class(file: &AbcFile, id: ClassId) -> Result<(Parent, ModuleId)> {
    let class = file.class(id)?;
    Ok((class.parent(), class.module()))
}

fn parent_of_function(
    file: &AbcFile,
    id: FunctionId,
) -> Result<(Parent, ModuleId)> {
    let function = file.function(id)?;
    Ok((function.parent(), function.module()))
}

fn check_super_chain(file: &AbcFile, class: ClassId, max_depth: usize) -> Result<()> {
    let mut current = file.class(class)?.super_class();
    let mut depth = 0;

    while let Some(super_class) = current {
        if super_class == class {
            return Err(malformed_error!("class {} inherits from itself", class));
        }
        depth += 1;
        if depth > max_depth {
            return Err(RecursionLimit(max_depth));
        }
        current = file.class(super_class)?.super_class();
    }
    Ok(())
}
