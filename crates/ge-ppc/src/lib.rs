//! Gekko/Broadway interpreter for gekko-eval
//!
//! This crate implements the PowerPC 750CL core used by the GameCube and Wii,
//! including the paired-single extension, and a bridge that calls guest
//! functions from the host and reports how they ended.

pub mod bridge;
pub mod context;
pub mod decoder;
pub mod fp;
pub mod instructions;
pub mod interpreter;
pub mod opcodes;
pub mod registers;
pub mod worker;

pub use bridge::{CallListener, CallResult, FunctionCall, RegisterSnapshot, RETURN_SENTINEL};
pub use context::InterpreterContext;
pub use decoder::InstructionWord;
pub use interpreter::{DispatchState, Interpreter, Termination};
pub use registers::RegisterFile;
pub use worker::CallWorker;
