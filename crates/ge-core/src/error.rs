//! Error types

use std::fmt;
use std::io;

use thiserror::Error;

/// Exception causes raised by the execution units
///
/// The discriminants match the exception bit flags Dolphin uses for its own
/// interpreter so values can be compared against an emulator's state directly.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExceptionCause {
    Decrementer = 1 << 0,
    Syscall = 1 << 1,
    ExternalInt = 1 << 2,
    /// Data storage interrupt: a load or store referenced memory outside guest RAM
    Dsi = 1 << 3,
    /// Instruction storage interrupt: the PC does not point into guest RAM
    Isi = 1 << 4,
    /// Misaligned access on an instruction that requires alignment
    Alignment = 1 << 5,
    FpuUnavailable = 1 << 6,
    /// Program interrupt (trap taken)
    Program = 1 << 7,
    PerformanceMonitor = 1 << 8,
    FakeMemcheckHit = 1 << 9,
}

impl ExceptionCause {
    /// Raw exception bit
    pub fn bits(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for ExceptionCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Decrementer => "decrementer",
            Self::Syscall => "system call",
            Self::ExternalInt => "external interrupt",
            Self::Dsi => "DSI",
            Self::Isi => "ISI",
            Self::Alignment => "alignment",
            Self::FpuUnavailable => "FPU unavailable",
            Self::Program => "program",
            Self::PerformanceMonitor => "performance monitor",
            Self::FakeMemcheckHit => "memcheck hit",
        };
        f.write_str(name)
    }
}

/// Guest memory access errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    #[error("Access of {len} bytes at 0x{addr:08x} is outside guest memory")]
    OutOfBounds { addr: u32, len: usize },

    #[error("Memory provider is not connected (access at 0x{addr:08x})")]
    Disconnected { addr: u32 },

    #[error("Memory provider error at 0x{addr:08x}: {message}")]
    Provider { addr: u32, message: String },
}

/// Failure reported by an execution unit for a single instruction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PpcError {
    /// The instruction is well formed but could not complete
    #[error("{cause} exception at 0x{address:08x}")]
    Fault { cause: ExceptionCause, address: u32 },

    /// Unknown opcode or an operand combination the architecture disallows
    #[error("Invalid instruction: {0}")]
    Invalid(String),
}

impl PpcError {
    /// Shorthand for an invalid-form report
    #[cold]
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid(reason.into())
    }

    /// Shorthand for a fault at `address`
    #[cold]
    pub fn fault(cause: ExceptionCause, address: u32) -> Self {
        Self::Fault { cause, address }
    }
}

impl From<MemoryError> for PpcError {
    fn from(err: MemoryError) -> Self {
        // A detached provider looks like unmapped memory to the guest
        match err {
            MemoryError::OutOfBounds { addr, .. }
            | MemoryError::Disconnected { addr }
            | MemoryError::Provider { addr, .. } => Self::fault(ExceptionCause::Dsi, addr),
        }
    }
}

/// Function-call bridge errors
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Too many {kind} arguments: {count} (at most 8 are passed in registers)")]
    TooManyArguments { kind: &'static str, count: usize },

    #[error("Call worker has stopped")]
    WorkerStopped,

    #[error("Failed to spawn call worker: {0}")]
    Spawn(#[from] io::Error),
}

/// Configuration file errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Top-level error type
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Memory(#[from] MemoryError),

    #[error(transparent)]
    Ppc(#[from] PpcError),

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
