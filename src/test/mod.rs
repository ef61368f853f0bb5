//! Shared fixtures for the unit tests.
//!
//! [`files`] builds small but complete containers through the public builder API (and reloads
//! them, so their bodies come from the Code section), [`graphs`] builds hand-made graphs of the
//! usual control flow shapes.

pub mod graphs;
