//! Versioned API tables.
//!
//! Plugins do not link against the concrete types of this crate's modules directly; they ask for
//! a capability table of a given [`ApiVersion`] and only call through it. A table is a
//! `&'static dyn Trait`, so a plugin built against version 1.0.0 keeps working for as long as
//! this crate publishes a 1.0.0 implementation of that trait.
//!
//! | Table                 | Getter                      | Covers                              |
//! |-----------------------|-----------------------------|-------------------------------------|
//! | [`Api`]               | [`get_api_impl`]            | opening, writing, closing files     |
//! | [`InspectApi`]        | [`get_inspect_api_impl`]    | read-only container model           |
//! | [`ModifyApi`]         | [`get_modify_api_impl`]     | container edits, installing graphs  |
//! | [`GraphApi`]          | [`get_graph_api_impl`]      | graph and block editing             |
//! | [`IsaApiStatic`]      | [`get_isa_api_static_impl`] | static instruction creation         |
//! | [`IsaApiDynamic`]     | [`get_isa_api_dynamic_impl`]| dynamic instruction creation        |
//!
//! # Error reporting
//!
//! Table methods never return [`crate::Error`]. Every call resets the thread-local last-error
//! register to [`Status::NoError`]; a failing call records its [`Status`] there and returns
//! `None`, `false` or a default value instead.
//!
//! ```rust,no_run
//! use abckit::api::{self, ApiVersion, Status};
//! use std::path::Path;
//!
//! let api = api::get_api_impl(ApiVersion::V1)?;
//! let inspect = api::get_inspect_api_impl(ApiVersion::V1)?;
//!
//! let Some(file) = api.open_file(Path::new("module.abc")) else {
//!     eprintln!("open failed: {}", api::get_last_error());
//!     return Ok(());
//! };
//! inspect.file_enumerate_modules(&file, &mut |module| {
//!     println!("{}", inspect.module_name(&file, module).unwrap_or("?"));
//!     true
//! });
//! assert_eq!(api::get_last_error(), Status::NoError);
//! # Ok::<(), abckit::Error>(())
//! ```

mod graph;
mod inspect;
mod isa;
mod modify;

pub use graph::GraphApi;
pub use inspect::InspectApi;
pub use isa::{IsaApiDynamic, IsaApiStatic};
pub use modify::ModifyApi;

use std::{
    cell::Cell,
    fmt,
    path::Path,
    str::FromStr,
};

use strum::{Display, FromRepr, IntoStaticStr};

use crate::{graph::Graph, metadata::AbcFile, Error, Result};

/// Outcome of the most recent table call on the current thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, IntoStaticStr, FromRepr)]
#[repr(u32)]
pub enum Status {
    /// The call succeeded
    #[default]
    NoError = 0,
    /// Invalid, stale or foreign handle, or an argument violating a precondition
    BadArgument,
    /// The requested table version is not published
    UnknownApiVersion,
    /// Reading, parsing, writing or loading failed
    IoError,
    /// The file or graph has the other instruction set
    WrongTarget,
    /// A handle was used with a file or graph it does not belong to
    WrongContext,
    /// The input uses an unsupported feature
    Unsupported,
    /// Internal limit reached
    Internal,
}

thread_local! {
    static LAST_ERROR: Cell<Status> = const { Cell::new(Status::NoError) };
}

/// Status recorded by the most recent table call on this thread.
#[must_use]
pub fn get_last_error() -> Status {
    LAST_ERROR.with(Cell::get)
}

/// Overwrites the last-error register of this thread.
pub fn set_last_error(status: Status) {
    LAST_ERROR.with(|cell| cell.set(status));
}

/// Runs one table call: traces its entry, resets the register and records a failure.
pub(crate) fn call<T>(name: &'static str, body: impl FnOnce() -> Result<T>) -> Option<T> {
    log::trace!("api: {}", name);
    set_last_error(Status::NoError);
    match body() {
        Ok(value) => Some(value),
        Err(error) => {
            log::debug!("api: {} failed: {}", name, error);
            set_last_error(error.status());
            None
        }
    }
}

/// [`call`] for operations without a result.
pub(crate) fn call_ok(name: &'static str, body: impl FnOnce() -> Result<()>) -> bool {
    call(name, body).is_some()
}

/// Version of an API table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ApiVersion {
    /// Incompatible changes
    pub major: u32,
    /// Compatible additions
    pub minor: u32,
    /// Fixes
    pub patch: u32,
}

impl ApiVersion {
    /// Version 1.0.0, the only published version.
    pub const V1: ApiVersion = ApiVersion::new(1, 0, 0);

    /// Every version this build publishes tables for.
    pub const SUPPORTED: &'static [ApiVersion] = &[ApiVersion::V1];

    /// Creates a version triple.
    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        ApiVersion {
            major,
            minor,
            patch,
        }
    }

    /// Returns `true` if tables of this version are published.
    #[must_use]
    pub fn is_supported(self) -> bool {
        Self::SUPPORTED.contains(&self)
    }

    fn check(self) -> Result<()> {
        if self.is_supported() {
            Ok(())
        } else {
            Err(Error::UnknownApiVersion(self.to_string()))
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Packed `major << 16 | minor << 8 | patch`, the form plugins pass through a C ABI.
impl From<u32> for ApiVersion {
    fn from(raw: u32) -> Self {
        ApiVersion::new(raw >> 16, (raw >> 8) & 0xFF, raw & 0xFF)
    }
}

impl FromStr for ApiVersion {
    type Err = Error;

    /// Parses `major[.minor[.patch]]`.
    fn from_str(text: &str) -> Result<Self> {
        let mut parts = [0u32; 3];
        let mut count = 0;
        for part in text.trim().split('.') {
            if count == parts.len() {
                return Err(Error::UnknownApiVersion(text.to_string()));
            }
            parts[count] = part
                .parse()
                .map_err(|_| Error::UnknownApiVersion(text.to_string()))?;
            count += 1;
        }
        Ok(ApiVersion::new(parts[0], parts[1], parts[2]))
    }
}

/// File lifetime operations.
pub trait Api: Sync {
    /// Opens and parses a container from disk.
    fn open_file(&self, path: &Path) -> Option<AbcFile>;

    /// Parses a container held in memory.
    fn open_file_from_memory(&self, data: Vec<u8>) -> Option<AbcFile>;

    /// Serializes `file` to `path`.
    fn write_file(&self, file: &AbcFile, path: &Path) -> bool;

    /// Serializes `file` into a buffer.
    fn write_file_to_memory(&self, file: &AbcFile) -> Option<Vec<u8>>;

    /// Releases a file and everything it owns.
    fn close_file(&self, file: AbcFile);

    /// Releases a graph.
    fn destroy_graph(&self, graph: Graph);

    /// Status of the most recent call on this thread.
    fn get_last_error(&self) -> Status;
}

struct ApiV1;

impl Api for ApiV1 {
    fn open_file(&self, path: &Path) -> Option<AbcFile> {
        call("open_file", || AbcFile::from_path(path))
    }

    fn open_file_from_memory(&self, data: Vec<u8>) -> Option<AbcFile> {
        call("open_file_from_memory", || AbcFile::from_mem(data))
    }

    fn write_file(&self, file: &AbcFile, path: &Path) -> bool {
        call_ok("write_file", || file.write(path))
    }

    fn write_file_to_memory(&self, file: &AbcFile) -> Option<Vec<u8>> {
        call("write_file_to_memory", || file.to_bytes())
    }

    fn close_file(&self, file: AbcFile) {
        log::trace!("api: close_file");
        set_last_error(Status::NoError);
        drop(file);
    }

    fn destroy_graph(&self, graph: Graph) {
        log::trace!("api: destroy_graph");
        set_last_error(Status::NoError);
        drop(graph);
    }

    fn get_last_error(&self) -> Status {
        get_last_error()
    }
}

static API_V1: ApiV1 = ApiV1;
static INSPECT_V1: inspect::InspectV1 = inspect::InspectV1;
static MODIFY_V1: modify::ModifyV1 = modify::ModifyV1;
static GRAPH_V1: graph::GraphV1 = graph::GraphV1;
static ISA_STATIC_V1: isa::IsaStaticV1 = isa::IsaStaticV1;
static ISA_DYNAMIC_V1: isa::IsaDynamicV1 = isa::IsaDynamicV1;

fn select<T: ?Sized>(version: ApiVersion, table: &'static T) -> Result<&'static T> {
    set_last_error(Status::NoError);
    if let Err(error) = version.check() {
        log::warn!("api table of version {} requested", version);
        set_last_error(error.status());
        return Err(error);
    }
    Ok(table)
}

/// File lifetime table of `version`.
///
/// # Errors
/// [`Error::UnknownApiVersion`] (also recorded in the register) for unpublished versions.
pub fn get_api_impl(version: ApiVersion) -> Result<&'static dyn Api> {
    select(version, &API_V1 as &'static dyn Api)
}

/// Inspection table of `version`.
///
/// # Errors
/// See [`get_api_impl`].
pub fn get_inspect_api_impl(version: ApiVersion) -> Result<&'static dyn InspectApi> {
    select(version, &INSPECT_V1 as &'static dyn InspectApi)
}

/// Modification table of `version`.
///
/// # Errors
/// See [`get_api_impl`].
pub fn get_modify_api_impl(version: ApiVersion) -> Result<&'static dyn ModifyApi> {
    select(version, &MODIFY_V1 as &'static dyn ModifyApi)
}

/// Graph table of `version`.
///
/// # Errors
/// See [`get_api_impl`].
pub fn get_graph_api_impl(version: ApiVersion) -> Result<&'static dyn GraphApi> {
    select(version, &GRAPH_V1 as &'static dyn GraphApi)
}

/// Static instruction set table of `version`.
///
/// # Errors
/// See [`get_api_impl`].
pub fn get_isa_api_static_impl(version: ApiVersion) -> Result<&'static dyn IsaApiStatic> {
    select(version, &ISA_STATIC_V1 as &'static dyn IsaApiStatic)
}

/// Dynamic instruction set table of `version`.
///
/// # Errors
/// See [`get_api_impl`].
pub fn get_isa_api_dynamic_impl(version: ApiVersion) -> Result<&'static dyn IsaApiDynamic> {
    select(version, &ISA_DYNAMIC_V1 as &'static dyn IsaApiDynamic)
}

/// Walks `items` until `visitor` returns `false`; returns whether the walk completed.
pub(crate) fn visit<T>(items: impl IntoIterator<Item = T>, visitor: &mut dyn FnMut(T) -> bool) -> bool {
    for item in items {
        if !visitor(item) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_parsing() {
        assert_eq!("1.0.0".parse::<ApiVersion>().unwrap(), ApiVersion::V1);
        assert_eq!("1".parse::<ApiVersion>().unwrap(), ApiVersion::V1);
        assert_eq!(ApiVersion::from(0x0001_0000), ApiVersion::V1);
        assert_eq!(ApiVersion::from(0x0002_0103).to_string(), "2.1.3");
        assert!("1.x".parse::<ApiVersion>().is_err());
        assert!("1.0.0.0".parse::<ApiVersion>().is_err());
    }

    #[test]
    fn unknown_version_sets_register() {
        assert!(get_graph_api_impl(ApiVersion::V1).is_ok());
        assert_eq!(get_last_error(), Status::NoError);

        let result = get_inspect_api_impl(ApiVersion::new(2, 0, 0));
        assert!(matches!(result, Err(Error::UnknownApiVersion(_))));
        assert_eq!(get_last_error(), Status::UnknownApiVersion);

        get_api_impl(ApiVersion::V1).unwrap();
        assert_eq!(get_last_error(), Status::NoError);
    }

    #[test]
    fn register_is_thread_local() {
        set_last_error(Status::IoError);
        let other = std::thread::spawn(get_last_error).join().unwrap();
        assert_eq!(other, Status::NoError);
        assert_eq!(get_last_error(), Status::IoError);
        set_last_error(Status::NoError);
    }

    #[test]
    fn failed_open_records_status() {
        let api = get_api_impl(ApiVersion::V1).unwrap();
        assert!(api.open_file_from_memory(Vec::new()).is_none());
        assert_eq!(api.get_last_error(), Status::IoError);

        assert!(api.open_file_from_memory(vec![0; 3]).is_none());
        assert_ne!(get_last_error(), Status::NoError);
    }

    #[test]
    fn visitor_stops() {
        let mut seen = Vec::new();
        let completed = visit(0..10, &mut |value| {
            seen.push(value);
            value < 2
        });
        assert!(!completed);
        assert_eq!(seen, vec![0, 1, 2]);
    }
}
