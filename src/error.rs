use thiserror::Error;

use crate::{api::Status, isa::Target};

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! out_of_bounds_error {
    () => {
        crate::Error::OutOfBounds {
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! bad_argument {
    ($msg:expr) => {
        crate::Error::BadArgument($msg.to_string())
    };

    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::BadArgument(format!($fmt, $($arg)*))
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Every fallible operation of the crate returns [`crate::Result`]. The versioned API façade in
/// [`crate::api`] additionally mirrors each error into the thread-local last-error register as a
/// [`Status`] code, see [`Error::status`].
///
/// # Error Categories
///
/// ## Caller Errors
/// - [`Error::BadArgument`] - A stale, foreign or otherwise invalid handle or argument
/// - [`Error::HasUsers`] - Removal of an instruction that still has users
/// - [`Error::WrongTarget`] - Static operation on a dynamic file (or the reverse)
/// - [`Error::WrongContext`] - Graph or handle used with a file it does not belong to
/// - [`Error::WrongState`] - Plugin lifecycle stage requested out of order
/// - [`Error::UnknownApiVersion`] - Requested an API table version that is not published
///
/// ## File Errors
/// - [`Error::Malformed`] - Corrupted or invalid container or body encoding
/// - [`Error::OutOfBounds`] - Attempted to read beyond the end of the input
/// - [`Error::NotSupported`] - Unsupported format version or feature
/// - [`Error::Empty`] - Empty input provided
/// - [`Error::FileError`] - Filesystem I/O errors
///
/// ## Plugin Errors
/// - [`Error::PluginLoad`] - The shared object could not be loaded
/// - [`Error::SymbolNotFound`] - A required plugin symbol is not exported
/// - [`Error::PluginFailed`] - A plugin entry point returned a non-zero code
///
/// # Examples
///
/// ```rust,no_run
/// use abckit::{AbcFile, Error};
/// use std::path::Path;
///
/// match AbcFile::from_path(Path::new("module.abc")) {
///     Ok(file) => println!("{} modules", file.modules().count()),
///     Err(Error::Malformed { message, file, line }) => {
///         eprintln!("Malformed file: {} ({}:{})", message, file, line);
///     }
///     Err(Error::FileError(io_err)) => eprintln!("I/O error: {}", io_err),
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// An invalid argument was passed to an operation.
    ///
    /// Raised for stale handles (removed instructions, erased blocks), handles of another graph,
    /// out-of-range indices and arguments that violate an operation's preconditions.
    #[error("Bad argument - {0}")]
    BadArgument(String),

    /// An instruction can not be removed while other instructions still consume its value.
    #[error("Instruction {inst} still has {users} user(s)")]
    HasUsers {
        /// Textual id of the instruction that was to be removed
        inst: String,
        /// Number of remaining users
        users: usize,
    },

    /// The requested API table version is not provided by this build.
    #[error("Unknown API version - {0}")]
    UnknownApiVersion(String),

    /// The file is damaged and could not be parsed.
    ///
    /// This error indicates that the container or one of its function bodies doesn't
    /// conform to the expected layout. The error includes the source location where the
    /// malformation was detected for debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing the file.
    ///
    /// This error occurs when trying to read data beyond the end of the file
    /// or section. It's a safety check to prevent buffer overruns during parsing.
    #[error("Out of Bound read would have occurred! - {file}:{line}")]
    OutOfBounds {
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// This file type or feature is not supported.
    #[error("This file type is not supported")]
    NotSupported,

    /// Provided input was empty.
    #[error("Provided input was empty")]
    Empty,

    /// File I/O error.
    ///
    /// Wraps standard I/O errors that can occur during file operations
    /// such as reading from disk, permission issues, or filesystem errors.
    #[error(transparent)]
    FileError(#[from] std::io::Error),

    /// The operation needs a file or graph of another instruction-set flavor.
    #[error("Wrong target - expected {expected}, found {found}")]
    WrongTarget {
        /// Target the operation works on
        expected: Target,
        /// Target of the file or graph that was passed
        found: Target,
    },

    /// A graph or handle was used together with a file or graph it does not belong to.
    #[error("Wrong context - {0}")]
    WrongContext(String),

    /// A plugin lifecycle transition was requested out of order.
    #[error("Wrong plugin state - expected {expected}, found {found}")]
    WrongState {
        /// State the transition requires
        expected: String,
        /// Current state of the driver
        found: String,
    },

    /// A plugin library could not be loaded.
    #[error("Failed to load plugin {path}: {reason}")]
    PluginLoad {
        /// Path of the shared object
        path: String,
        /// Loader message
        reason: String,
    },

    /// A required symbol is not exported by a plugin library.
    #[error("Symbol not found - {0}")]
    SymbolNotFound(String),

    /// A plugin reported failure from one of its entry points.
    #[error("Plugin stage {stage} failed with code {code}")]
    PluginFailed {
        /// Entry point that failed
        stage: String,
        /// Non-zero value returned by the plugin
        code: i32,
    },

    /// Recursion limit reached.
    ///
    /// Nesting of namespaces and classes is bounded while loading to reject cyclic parent
    /// chains. The associated value shows the limit that was reached.
    #[error("Reach the maximum recursion level allowed - {0}")]
    RecursionLimit(usize),
}

impl Error {
    /// Maps this error onto the status code published through the last-error register.
    #[must_use]
    pub fn status(&self) -> Status {
        match self {
            Error::BadArgument(_) | Error::HasUsers { .. } => Status::BadArgument,
            Error::UnknownApiVersion(_) => Status::UnknownApiVersion,
            Error::Malformed { .. }
            | Error::OutOfBounds { .. }
            | Error::Empty
            | Error::FileError(_)
            | Error::PluginLoad { .. }
            | Error::SymbolNotFound(_) => Status::IoError,
            Error::WrongTarget { .. } => Status::WrongTarget,
            Error::WrongContext(_) | Error::WrongState { .. } => Status::WrongContext,
            Error::NotSupported => Status::Unsupported,
            Error::RecursionLimit(_) | Error::PluginFailed { .. } => Status::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(bad_argument!("x").status(), Status::BadArgument);
        assert_eq!(malformed_error!("bad {}", 1).status(), Status::IoError);
        assert_eq!(out_of_bounds_error!().status(), Status::IoError);
        assert_eq!(
            Error::UnknownApiVersion("2.0.0".into()).status(),
            Status::UnknownApiVersion
        );
        assert_eq!(
            Error::WrongTarget {
                expected: Target::Static,
                found: Target::Dynamic
            }
            .status(),
            Status::WrongTarget
        );
        assert_eq!(Error::NotSupported.status(), Status::Unsupported);
    }

    #[test]
    fn malformed_carries_location() {
        match malformed_error!("broken section {}", 3) {
            Error::Malformed {
                message,
                file,
                line,
            } => {
                assert_eq!(message, "broken section 3");
                assert!(file.ends_with("error.rs"));
                assert!(line > 0);
            }
            _ => panic!("expected Malformed"),
        }
    }

    #[test]
    fn io_errors_are_not_repeated_in_the_chain() {
        let error = Error::from(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "No such file or directory",
        ));
        assert_eq!(error.to_string(), "No such file or directory");
        assert!(std::error::Error::source(&error).is_none());
        assert_eq!(error.status(), Status::IoError);
    }
}
