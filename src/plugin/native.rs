//! Plugins shipped as shared objects.
//!
//! A library either exports a single `Entry` function, run in place of `after_parse`, or the four
//! lifecycle functions `<name>_Initialize`, `<name>_AfterParse`, `<name>_AfterCheck` and
//! `<name>_AfterLowerings`, where `<name>` is [`plugin_name`] of the library path. All of them
//! return `0` on success.

use std::{
    ffi::c_int,
    path::{Path, PathBuf},
};

use libloading::Library;

use crate::{
    metadata::AbcFile,
    plugin::{Context, Plugin},
    Error, Result,
};

type EntryFn = unsafe extern "C" fn(*mut AbcFile) -> c_int;
type InitializeFn = unsafe extern "C" fn() -> c_int;

enum Entries {
    Single(EntryFn),
    Lifecycle {
        initialize: InitializeFn,
        after_parse: EntryFn,
        after_check: EntryFn,
        after_lowerings: EntryFn,
    },
}

/// A plugin loaded from a shared object.
pub struct NativePlugin {
    name: String,
    path: PathBuf,
    entries: Entries,
    // Declared last: the entry pointers above must not outlive the library.
    _library: Library,
}

impl std::fmt::Debug for NativePlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativePlugin")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("lifecycle", &matches!(self.entries, Entries::Lifecycle { .. }))
            .finish_non_exhaustive()
    }
}

/// Library basename without directory, `lib` prefix and extension.
///
/// `/opt/plugins/libadd_log.so` and `add_log.dll` both name the plugin `add_log`.
#[must_use]
pub fn plugin_name(path: &Path) -> String {
    let stem = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.split('.').next().unwrap_or(name))
        .unwrap_or_default();
    stem.strip_prefix("lib").unwrap_or(stem).to_string()
}

fn open(path: &Path) -> Result<Library> {
    // Safety: running foreign initializers is inherent to loading a plugin.
    unsafe { Library::new(path) }.map_err(|error| Error::PluginLoad {
        path: path.display().to_string(),
        reason: error.to_string(),
    })
}

/// Resolves `symbol` as a function pointer of type `F`.
///
/// # Safety
/// `F` must match the exported function and the pointer must not outlive `library`.
unsafe fn resolve<F: Copy>(library: &Library, symbol: &str) -> Result<F> {
    library
        .get::<F>(symbol.as_bytes())
        .map(|found| *found)
        .map_err(|_| Error::SymbolNotFound(symbol.to_string()))
}

fn check(stage: &str, code: c_int) -> Result<()> {
    if code == 0 {
        Ok(())
    } else {
        Err(Error::PluginFailed {
            stage: stage.to_string(),
            code,
        })
    }
}

impl NativePlugin {
    /// Loads a library exporting `Entry`.
    ///
    /// # Errors
    /// [`Error::PluginLoad`] if the library can not be loaded, [`Error::SymbolNotFound`] if it
    /// does not export `Entry`.
    pub fn load(path: &Path) -> Result<NativePlugin> {
        let library = open(path)?;
        // Safety: `Entry` is declared as `int Entry(AbcFile *)`; the pointer lives in `self`
        // next to the library.
        let entry = unsafe { resolve::<EntryFn>(&library, "Entry")? };
        log::debug!("loaded plugin {}", path.display());
        Ok(NativePlugin {
            name: plugin_name(path),
            path: path.to_path_buf(),
            entries: Entries::Single(entry),
            _library: library,
        })
    }

    /// Loads a library exporting the four lifecycle functions.
    ///
    /// # Errors
    /// [`Error::PluginLoad`] if the library can not be loaded, [`Error::SymbolNotFound`] naming
    /// the first missing function.
    pub fn load_lifecycle(path: &Path) -> Result<NativePlugin> {
        let library = open(path)?;
        let name = plugin_name(path);
        // Safety: the lifecycle functions are declared as `int P_Initialize(void)` and
        // `int P_<Stage>(AbcFile *)`.
        let entries = unsafe {
            Entries::Lifecycle {
                initialize: resolve(&library, &format!("{name}_Initialize"))?,
                after_parse: resolve(&library, &format!("{name}_AfterParse"))?,
                after_check: resolve(&library, &format!("{name}_AfterCheck"))?,
                after_lowerings: resolve(&library, &format!("{name}_AfterLowerings"))?,
            }
        };
        log::debug!("loaded lifecycle plugin {} from {}", name, path.display());
        Ok(NativePlugin {
            name,
            path: path.to_path_buf(),
            entries,
            _library: library,
        })
    }

    /// Path the library was loaded from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn call(stage: &str, entry: EntryFn, context: &mut Context<'_>) -> Result<()> {
        let file: *mut AbcFile = context.file_mut();
        // Safety: the file stays exclusively borrowed for the duration of the call.
        check(stage, unsafe { entry(file) })
    }
}

impl Plugin for NativePlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&mut self) -> Result<()> {
        match self.entries {
            Entries::Single(_) => Ok(()),
            // Safety: resolved with this signature in `load_lifecycle`.
            Entries::Lifecycle { initialize, .. } => check("Initialize", unsafe { initialize() }),
        }
    }

    fn after_parse(&mut self, context: &mut Context<'_>) -> Result<()> {
        match self.entries {
            Entries::Single(entry) => Self::call("Entry", entry, context),
            Entries::Lifecycle { after_parse, .. } => Self::call("AfterParse", after_parse, context),
        }
    }

    fn after_check(&mut self, context: &mut Context<'_>) -> Result<()> {
        match self.entries {
            Entries::Single(_) => Ok(()),
            Entries::Lifecycle { after_check, .. } => Self::call("AfterCheck", after_check, context),
        }
    }

    fn after_lowerings(&mut self, context: &mut Context<'_>) -> Result<()> {
        match self.entries {
            Entries::Single(_) => Ok(()),
            Entries::Lifecycle {
                after_lowerings, ..
            } => Self::call("AfterLowerings", after_lowerings, context),
        }
    }
}
