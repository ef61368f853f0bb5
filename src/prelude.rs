//! # abckit Prelude
//!
//! Re-exports the types most programs need: the file object, the graph with its handles, the
//! instruction factories and the versioned API tables.
//!
//! ```rust,no_run
//! use abckit::prelude::*;
//! ```

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all abckit operations
pub use crate::Error;

/// The result type used throughout abckit
pub use crate::Result;

/// Checks run on freshly loaded files
pub use crate::ValidationConfig;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// The bytecode file: inspection, modification and serialization
pub use crate::AbcFile;

/// Low-level file access
pub use crate::{File, Parser};

// ================================================================================================
// Container Model
// ================================================================================================

/// Typed handles into the file's arenas
pub use crate::metadata::ids::{
    AnnotationId, AnnotationInterfaceId, ClassId, ExportId, FileId, FunctionId, ImportId,
    LiteralArrayId, ModuleId, NamespaceId, StringId,
};

/// Entity flags and owners
pub use crate::metadata::{
    class::ClassFlags,
    function::{FunctionFlags, Signature},
    module::{ModuleFlags, Parent},
    types::TypeId,
};

/// Annotations, descriptors and literals
pub use crate::metadata::{
    annotation::{AnnotationOwner, Value},
    descriptors::{ExportKind, ImportKind},
    literals::Literal,
};

// ================================================================================================
// Graph IR
// ================================================================================================

/// The graph and its handles
pub use crate::graph::{BlockId, ConstantValue, Graph, InstId, Reference};

/// Instruction set description and factories
pub use crate::isa::{
    ConditionCode, DynamicFactory, DynamicOpcode, InstructionFactory, Opcode, StaticFactory,
    StaticOpcode, Target,
};

// ================================================================================================
// Versioned API Tables
// ================================================================================================

/// Table getters and the last-error register
pub use crate::api::{
    get_api_impl, get_graph_api_impl, get_inspect_api_impl, get_isa_api_dynamic_impl,
    get_isa_api_static_impl, get_last_error, get_modify_api_impl, ApiVersion, Status,
};

/// Table traits, so their methods resolve on the returned objects
pub use crate::api::{Api, GraphApi, InspectApi, IsaApiDynamic, IsaApiStatic, ModifyApi};

// ================================================================================================
// Plugins
// ================================================================================================

/// Plugin lifecycle
pub use crate::plugin::{Context, NativePlugin, Plugin, PluginDriver, State};
