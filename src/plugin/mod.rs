//! Plugin lifecycle.
//!
//! A plugin is driven through a fixed sequence of stages. [`PluginDriver`] owns the current
//! [`State`] and only performs the transition that immediately follows it, so a plugin never
//! sees `after_check` before `after_parse`, and never sees anything after it was detached.
//!
//! ```text
//! Uninitialized -> Initialized -> AfterParse -> AfterCheck -> AfterLowerings -> Detached
//! ```
//!
//! Plugins written in Rust implement [`Plugin`] directly; shared objects are wrapped by
//! [`NativePlugin`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use abckit::{plugin::{NativePlugin, PluginDriver}, AbcFile};
//! use std::path::Path;
//!
//! let mut file = AbcFile::from_path(Path::new("module.abc"))?;
//! let plugin = NativePlugin::load(Path::new("libadd_log.so"))?;
//! PluginDriver::new(plugin).run_to_completion(&mut file)?;
//! file.write(Path::new("module.out.abc"))?;
//! # Ok::<(), abckit::Error>(())
//! ```

mod native;

pub use native::{plugin_name, NativePlugin};

use strum::{Display, EnumIter, IntoEnumIterator};

use crate::{metadata::AbcFile, Error, Result};

/// Lifecycle stage of a driven plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter)]
pub enum State {
    /// Loaded, nothing called yet
    Uninitialized,
    /// `initialize` returned
    Initialized,
    /// `after_parse` returned
    AfterParse,
    /// `after_check` returned
    AfterCheck,
    /// `after_lowerings` returned
    AfterLowerings,
    /// No further calls are made
    Detached,
}

impl State {
    /// Stage following this one.
    #[must_use]
    pub fn next(self) -> Option<State> {
        match self {
            State::Uninitialized => Some(State::Initialized),
            State::Initialized => Some(State::AfterParse),
            State::AfterParse => Some(State::AfterCheck),
            State::AfterCheck => Some(State::AfterLowerings),
            State::AfterLowerings => Some(State::Detached),
            State::Detached => None,
        }
    }
}

/// What a plugin stage operates on.
pub struct Context<'a> {
    file: &'a mut AbcFile,
}

impl<'a> Context<'a> {
    /// Wraps the file handed to a stage.
    pub fn new(file: &'a mut AbcFile) -> Self {
        Context { file }
    }

    /// The file being processed.
    #[must_use]
    pub fn file(&self) -> &AbcFile {
        self.file
    }

    /// The file being processed, for modification.
    pub fn file_mut(&mut self) -> &mut AbcFile {
        self.file
    }
}

/// A transformation run over a file.
///
/// Only `after_parse` is required; the other stages default to doing nothing.
pub trait Plugin {
    /// Human readable name, used in log messages.
    fn name(&self) -> &str;

    /// Called once before any file is seen.
    ///
    /// # Errors
    /// Any error aborts the run.
    fn initialize(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called with the freshly opened file.
    ///
    /// # Errors
    /// Any error aborts the run.
    fn after_parse(&mut self, context: &mut Context<'_>) -> Result<()>;

    /// Called once the file passed its checks.
    ///
    /// # Errors
    /// Any error aborts the run.
    fn after_check(&mut self, _context: &mut Context<'_>) -> Result<()> {
        Ok(())
    }

    /// Called last, before the file is written.
    ///
    /// # Errors
    /// Any error aborts the run.
    fn after_lowerings(&mut self, _context: &mut Context<'_>) -> Result<()> {
        Ok(())
    }
}

/// Drives a [`Plugin`] through its stages in order.
pub struct PluginDriver<P: Plugin> {
    plugin: P,
    state: State,
}

impl<P: Plugin> PluginDriver<P> {
    /// Takes ownership of `plugin` in [`State::Uninitialized`].
    pub fn new(plugin: P) -> Self {
        PluginDriver {
            plugin,
            state: State::Uninitialized,
        }
    }

    /// Current stage.
    pub fn state(&self) -> State {
        self.state
    }

    /// The driven plugin.
    pub fn plugin(&self) -> &P {
        &self.plugin
    }

    /// Checks that `to` directly follows the current stage.
    fn expect_next(&self, to: State) -> Result<()> {
        if self.state.next() == Some(to) {
            return Ok(());
        }
        let expected = State::iter().find(|state| state.next() == Some(to));
        Err(Error::WrongState {
            expected: expected.map_or_else(|| "none".to_string(), |state| state.to_string()),
            found: self.state.to_string(),
        })
    }

    fn stage(&mut self, to: State, run: impl FnOnce(&mut P) -> Result<()>) -> Result<()> {
        self.expect_next(to)?;
        log::debug!("plugin {}: {} -> {}", self.plugin.name(), self.state, to);
        run(&mut self.plugin)?;
        self.state = to;
        Ok(())
    }

    /// Runs `initialize`.
    ///
    /// # Errors
    /// [`Error::WrongState`] unless the plugin is uninitialized, or the plugin's own error.
    pub fn initialize(&mut self) -> Result<()> {
        self.stage(State::Initialized, |plugin| plugin.initialize())
    }

    /// Runs `after_parse` on `file`.
    ///
    /// # Errors
    /// [`Error::WrongState`] unless the plugin is initialized, or the plugin's own error.
    pub fn after_parse(&mut self, file: &mut AbcFile) -> Result<()> {
        self.stage(State::AfterParse, |plugin| {
            plugin.after_parse(&mut Context::new(file))
        })
    }

    /// Runs `after_check` on `file`.
    ///
    /// # Errors
    /// [`Error::WrongState`] unless `after_parse` ran last, or the plugin's own error.
    pub fn after_check(&mut self, file: &mut AbcFile) -> Result<()> {
        self.stage(State::AfterCheck, |plugin| {
            plugin.after_check(&mut Context::new(file))
        })
    }

    /// Runs `after_lowerings` on `file`.
    ///
    /// # Errors
    /// [`Error::WrongState`] unless `after_check` ran last, or the plugin's own error.
    pub fn after_lowerings(&mut self, file: &mut AbcFile) -> Result<()> {
        self.stage(State::AfterLowerings, |plugin| {
            plugin.after_lowerings(&mut Context::new(file))
        })
    }

    /// Detaches the plugin; no further stage can run.
    ///
    /// # Errors
    /// [`Error::WrongState`] unless `after_lowerings` ran last.
    pub fn detach(&mut self) -> Result<()> {
        self.stage(State::Detached, |_| Ok(()))
    }

    /// Runs every remaining stage on `file` and detaches.
    ///
    /// # Errors
    /// The first failing stage's error.
    pub fn run_to_completion(&mut self, file: &mut AbcFile) -> Result<()> {
        while let Some(to) = self.state.next() {
            match to {
                State::Uninitialized => {}
                State::Initialized => self.initialize()?,
                State::AfterParse => self.after_parse(file)?,
                State::AfterCheck => self.after_check(file)?,
                State::AfterLowerings => self.after_lowerings(file)?,
                State::Detached => self.detach()?,
            }
        }
        Ok(())
    }

    /// Returns the plugin, whatever stage it reached.
    pub fn into_inner(self) -> P {
        self.plugin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{metadata::module::ModuleFlags, test::files::dynamic_sample};

    #[derive(Default)]
    struct Recorder {
        calls: Vec<&'static str>,
        fail_check: bool,
    }

    impl Plugin for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn initialize(&mut self) -> Result<()> {
            self.calls.push("initialize");
            Ok(())
        }

        fn after_parse(&mut self, context: &mut Context<'_>) -> Result<()> {
            self.calls.push("after_parse");
            context.file_mut().add_module("added", ModuleFlags::empty())?;
            Ok(())
        }

        fn after_check(&mut self, _context: &mut Context<'_>) -> Result<()> {
            self.calls.push("after_check");
            if self.fail_check {
                return Err(Error::PluginFailed {
                    stage: "after_check".into(),
                    code: 3,
                });
            }
            Ok(())
        }

        fn after_lowerings(&mut self, _context: &mut Context<'_>) -> Result<()> {
            self.calls.push("after_lowerings");
            Ok(())
        }
    }

    #[test]
    fn runs_stages_in_order() {
        let mut file = dynamic_sample();
        let mut driver = PluginDriver::new(Recorder::default());
        driver.run_to_completion(&mut file).unwrap();

        assert_eq!(driver.state(), State::Detached);
        assert_eq!(
            driver.plugin().calls,
            vec!["initialize", "after_parse", "after_check", "after_lowerings"]
        );
        assert!(file.find_module("added").is_some());
    }

    #[test]
    fn out_of_order_is_wrong_state() {
        let mut file = dynamic_sample();
        let mut driver = PluginDriver::new(Recorder::default());

        match driver.after_parse(&mut file) {
            Err(Error::WrongState { expected, found }) => {
                assert_eq!(expected, "Initialized");
                assert_eq!(found, "Uninitialized");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(driver.state(), State::Uninitialized);

        driver.initialize().unwrap();
        assert!(driver.initialize().is_err());
        assert!(matches!(
            driver.after_check(&mut file),
            Err(Error::WrongState { .. })
        ));
        assert!(driver.plugin().calls == vec!["initialize"]);
    }

    #[test]
    fn detached_driver_rejects_everything() {
        let mut file = dynamic_sample();
        let mut driver = PluginDriver::new(Recorder::default());
        driver.run_to_completion(&mut file).unwrap();

        assert!(driver.detach().is_err());
        assert!(driver.after_lowerings(&mut file).is_err());
        driver.run_to_completion(&mut file).unwrap();
        assert_eq!(driver.plugin().calls.len(), 4);
    }

    #[test]
    fn failing_stage_stops_the_run() {
        let mut file = dynamic_sample();
        let mut driver = PluginDriver::new(Recorder {
            fail_check: true,
            ..Recorder::default()
        });

        let error = driver.run_to_completion(&mut file).unwrap_err();
        assert!(matches!(error, Error::PluginFailed { code: 3, .. }));
        assert_eq!(driver.state(), State::AfterParse);
        assert_eq!(
            driver.into_inner().calls,
            vec!["initialize", "after_parse", "after_check"]
        );
    }
}
