//! Command-line front end for the remote-debugging connection runtime.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
