#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod report;
pub mod shell;
pub mod transport;

pub use commands::{ActionResult, ActionSummary, CommandOutcome};
pub use config::{AdminConfig, ConfigError, ConfigOverrides};
pub use shell::Shell;
pub use transport::{ReqwestTransport, Transport};
