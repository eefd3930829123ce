//! Library components of the `gpm` command-line tool.

pub mod config;
pub mod exit;
pub mod logging;
pub mod paths;
