//! Interpreter construction context

use std::sync::Arc;

use ge_core::config::Config;
use ge_memory::MemoryProvider;

/// Everything an interpreter needs at construction
///
/// Holds the guest memory provider and the settings explicitly instead of
/// reaching for process-wide managers.
#[derive(Clone)]
pub struct InterpreterContext {
    pub provider: Arc<dyn MemoryProvider>,
    pub config: Config,
}

impl InterpreterContext {
    pub fn new(provider: Arc<dyn MemoryProvider>, config: Config) -> Self {
        Self { provider, config }
    }

    /// Context with default settings
    pub fn with_defaults(provider: Arc<dyn MemoryProvider>) -> Self {
        Self::new(provider, Config::default())
    }
}
