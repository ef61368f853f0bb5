//! Container metadata: the in-memory model of a bytecode file.
//!
//! An [`AbcFile`] owns one arena per entity kind (modules, namespaces, classes, functions,
//! annotation interfaces, annotations, import and export descriptors, literal arrays) plus a
//! string pool. Entities refer to each other through the typed handles of [`ids`], so the whole
//! model is plain owned data without reference cycles.
//!
//! # Key Components
//!
//! - [`abcfile`] - The file object: opening, writing, inspection and modification
//! - [`builder`] - Declaring new modules, namespaces, classes and functions
//! - [`ids`] - Typed arena handles
//! - [`strings`] - Interned string pool
//! - [`types`] - Value types of signatures and instruction results
//! - [`validation`] - Checks run on freshly loaded files
//!
//! # Examples
//!
//! ```rust,no_run
//! use abckit::AbcFile;
//! use std::path::Path;
//!
//! let file = AbcFile::from_path(Path::new("module.abc"))?;
//! for module in file.modules() {
//!     println!("module {}", file.module_name(module)?);
//!     for function in file.module(module)?.functions() {
//!         println!("  {}", file.function_name(*function)?);
//!     }
//! }
//! # Ok::<(), abckit::Error>(())
//! ```

pub mod abcfile;
pub mod annotation;
pub mod builder;
pub mod class;
pub mod descriptors;
pub mod function;
pub mod ids;
pub mod literals;
pub(crate) mod loader;
pub mod module;
pub mod namespace;
pub mod strings;
pub mod types;
pub mod validation;
pub(crate) mod writer;

pub use abcfile::AbcFile;
pub use validation::ValidationConfig;
