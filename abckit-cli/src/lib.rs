//! Command line front end of abckit: argument parsing and the plugin run.

pub mod app;
pub mod run;
