//! manifest-css - incremental utility-CSS compiler for no-build HTML projects.
//!
//! Scans the entry page, component fragments and DOM mutations for utility
//! classes, generates rules against the project's theme variables and keeps
//! a single live stylesheet up to date.

pub mod cache;
pub mod cli;
pub mod compiler;
pub mod config;
pub mod core;
pub mod generate;
pub mod logger;
pub mod scan;
pub mod theme;
pub mod utils;
pub mod watch;
