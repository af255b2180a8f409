//! Core types shared by the gekko-eval crates
//!
//! Error taxonomy, configuration and logging setup. The interpreter and memory
//! crates depend on this one and nothing here depends on them.

pub mod config;
pub mod error;
pub mod logging;

pub use config::Config;
pub use error::{Error, ExceptionCause, Result};
