// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0


#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(clippy::too_many_arguments)]
// - 'file/physical.rs' uses mmap to map a file into memory
// - 'plugin/native.rs' calls into loaded plugin libraries

//! # abckit
//!
//! A toolkit for inspecting and rewriting compiled abc bytecode containers.
//!
//! `abckit` opens a container, exposes its modules, namespaces, classes, functions,
//! annotations and module descriptors as a typed in-memory model, decodes function bodies into
//! an editable SSA [`graph::Graph`], and encodes edited graphs back into the file. Both
//! instruction sets are supported: the untyped dynamic one and the typed static one, selected by
//! the [`isa::Target`] recorded in the container header.
//!
//! ## Features
//!
//! - **Memory-mapped loading** - Containers are mapped read-only; untouched function bodies are
//!   copied verbatim on write, so an unmodified file round-trips byte for byte
//! - **Editable SSA graphs** - Basic blocks with explicit predecessor/successor lists,
//!   instructions with synchronized user lists, phis, try/catch regions and dominators
//! - **Two instruction sets, one engine** - [`isa::StaticFactory`] and [`isa::DynamicFactory`]
//!   create instructions behind the shared [`isa::InstructionFactory`] trait
//! - **Versioned API tables** - [`api`] hands out stable capability tables with a thread-local
//!   last-error register
//! - **Plugins** - [`plugin`] drives Rust or native plugins through a checked lifecycle
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use abckit::prelude::*;
//! use std::path::Path;
//!
//! let mut file = AbcFile::from_path(Path::new("module.abc"))?;
//! let function = file.find_function("main").ok_or(Error::Empty)?;
//!
//! let mut graph = file.create_graph_from_function(function)?;
//! graph.remove_unreachable_blocks()?;
//! println!("{graph}");
//!
//! file.function_set_graph(function, &graph)?;
//! file.write(Path::new("module.out.abc"))?;
//! # Ok::<(), abckit::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - `file` (crate internal) - Byte sources, little-endian primitives and the section directory
//! - [`metadata`] - The container model and its reader/writer
//! - [`graph`] - The instruction graph engine
//! - [`isa`] - Opcode tables and instruction factories
//! - `bytecode` (crate internal) - Function body codec between graphs and bytes
//! - [`api`] - Versioned capability tables
//! - [`plugin`] - Plugin lifecycle and native plugin loading
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T>`]; see [`Error`] for the failure categories and
//! [`Error::status`] for their mapping onto API status codes.

#[macro_use]
pub(crate) mod macros;

#[macro_use]
pub(crate) mod error;
pub(crate) mod file;

/// Shared functionality which is used in unit- and integration-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust,no_run
/// use abckit::prelude::*;
///
/// let file = AbcFile::from_path("module.abc".as_ref())?;
/// for module in file.modules() {
///     println!("{}", file.module_name(module)?);
/// }
/// # Ok::<(), abckit::Error>(())
/// ```
pub mod prelude;

/// Opcode tables and instruction factories for the static and dynamic instruction sets.
///
/// # Key Types
///
/// - [`isa::Opcode`] - Opcode of either instruction set
/// - [`isa::OpKind`] - The graph engine's view of an opcode
/// - [`isa::ConditionCode`] - Conditions of branches
/// - [`isa::InstructionFactory`] - Capabilities shared by both factories
///
/// # Examples
///
/// ```rust,no_run
/// use abckit::{isa::InstructionFactory, AbcFile};
///
/// let file = AbcFile::from_path("module.abc".as_ref())?;
/// let function = file.find_function("main").ok_or(abckit::Error::Empty)?;
/// let mut graph = file.create_empty_graph(function)?;
/// let ret = file.factory().create_return_void(&mut graph)?;
/// println!("{}", graph.inst(ret)?);
/// # Ok::<(), abckit::Error>(())
/// ```
pub mod isa;

/// Editable control-flow and data-flow graphs of function bodies.
///
/// A [`graph::Graph`] owns its blocks and instructions in arenas. Handles
/// ([`graph::BlockId`], [`graph::InstId`]) carry the id of their graph, so handles of another
/// graph are rejected instead of silently aliasing.
pub mod graph;

/// Function body codec.
pub(crate) mod bytecode;

/// Container model: modules, namespaces, classes, functions, annotations, descriptors and
/// literal arrays, plus the container reader and writer.
pub mod metadata;

pub mod api;

pub mod plugin;

/// `abckit` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
///
/// # Examples
///
/// ```rust,no_run
/// use abckit::{AbcFile, Result};
///
/// fn load(path: &str) -> Result<AbcFile> {
///     AbcFile::from_path(std::path::Path::new(path))
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// `abckit` Error type
///
/// # Examples
///
/// ```rust,no_run
/// use abckit::{AbcFile, Error};
///
/// match AbcFile::from_path(std::path::Path::new("broken.abc")) {
///     Ok(_) => println!("Loaded successfully"),
///     Err(Error::NotSupported) => println!("Container version not supported"),
///     Err(Error::Malformed { message, .. }) => println!("Malformed: {}", message),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
pub use error::Error;

/// Main entry point for working with containers.
///
/// See [`metadata::abcfile::AbcFile`].
pub use metadata::AbcFile;

/// Checks run while loading a container.
pub use metadata::ValidationConfig;

/// Low-level parsing utilities over the raw bytes of a container.
pub use file::{parser::Parser, File};
