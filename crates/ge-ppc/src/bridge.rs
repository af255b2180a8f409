//! Function-call bridge
//!
//! Seeds the argument registers, points LR at a sentinel that no guest code
//! can live at, and runs the interpreter until the callee returns there.

use ge_core::error::{BridgeError, ExceptionCause, MemoryError};
use serde::Serialize;

use crate::interpreter::{Interpreter, Termination};
use crate::registers::{Fpr, RegisterFile};

/// Link-register value marking "returned to the host"
pub const RETURN_SENTINEL: u32 = 0xDEAD_BEEF;

/// Integer arguments go in r3..r10, float arguments in f1..f8
pub const MAX_REGISTER_ARGS: usize = 8;

const FIRST_GPR_ARG: usize = 3;
const FIRST_FPR_ARG: usize = 1;

/// A guest function to call
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FunctionCall {
    pub entry: u32,
    pub gpr_args: Vec<u32>,
    pub fpr_args: Vec<f64>,
}

impl FunctionCall {
    pub fn new(entry: u32) -> Self {
        Self {
            entry,
            ..Self::default()
        }
    }

    /// Append an integer argument
    pub fn arg(mut self, value: u32) -> Self {
        self.gpr_args.push(value);
        self
    }

    /// Append a floating-point argument
    pub fn float_arg(mut self, value: f64) -> Self {
        self.fpr_args.push(value);
        self
    }

    /// Append several integer arguments
    pub fn args(mut self, values: &[u32]) -> Self {
        self.gpr_args.extend_from_slice(values);
        self
    }

    fn validate(&self) -> Result<(), BridgeError> {
        if self.gpr_args.len() > MAX_REGISTER_ARGS {
            return Err(BridgeError::TooManyArguments {
                kind: "integer",
                count: self.gpr_args.len(),
            });
        }
        if self.fpr_args.len() > MAX_REGISTER_ARGS {
            return Err(BridgeError::TooManyArguments {
                kind: "floating-point",
                count: self.fpr_args.len(),
            });
        }
        Ok(())
    }
}

/// Registers copied out at the end of a call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegisterSnapshot {
    pub pc: u32,
    pub lr: u32,
    pub ctr: u32,
    pub cr: u32,
    pub xer: u32,
    pub msr: u32,
    pub srr0: u32,
    pub srr1: u32,
    pub dar: u32,
    pub dsisr: u32,
    pub fpscr: u32,
    pub tb: u64,
    pub gpr: [u32; 32],
    pub fpr: [Fpr; 32],
    pub sr: [u32; 16],
    pub gqr: [u32; 8],
}

impl RegisterSnapshot {
    pub fn capture(regs: &RegisterFile) -> Self {
        Self {
            pc: regs.pc,
            lr: regs.lr,
            ctr: regs.ctr,
            cr: regs.cr,
            xer: regs.xer,
            msr: regs.msr,
            srr0: regs.srr0,
            srr1: regs.srr1,
            dar: regs.dar,
            dsisr: regs.dsisr,
            fpscr: regs.fpscr,
            tb: regs.tb,
            gpr: regs.gpr,
            fpr: regs.fpr,
            sr: regs.sr,
            gqr: regs.gqr,
        }
    }

    /// Integer return value (r3)
    pub fn return_value(&self) -> u32 {
        self.gpr[3]
    }

    /// Floating-point return value (f1)
    pub fn float_return(&self) -> f64 {
        self.fpr[1].ps0()
    }
}

/// Outcome of one [`Interpreter::evaluate`] call
#[derive(Debug, Clone, PartialEq)]
pub enum CallResult {
    /// The callee returned to the sentinel
    Completed { snapshot: RegisterSnapshot },
    /// An instruction raised an exception
    Faulted {
        cause: ExceptionCause,
        /// Effective address of the faulting access
        address: u32,
        pc: u32,
        snapshot: RegisterSnapshot,
    },
    /// Unknown or malformed instruction
    Invalid {
        reason: String,
        pc: u32,
        snapshot: RegisterSnapshot,
    },
}

impl CallResult {
    pub fn snapshot(&self) -> &RegisterSnapshot {
        match self {
            Self::Completed { snapshot }
            | Self::Faulted { snapshot, .. }
            | Self::Invalid { snapshot, .. } => snapshot,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// Deliver this result to exactly one listener callback
    pub fn notify(&self, listener: &mut dyn CallListener) {
        match self {
            Self::Completed { snapshot } => listener.on_normal_return(snapshot),
            Self::Faulted {
                cause,
                address,
                pc,
                snapshot,
            } => listener.on_fault(*cause, *address, *pc, snapshot),
            Self::Invalid {
                reason,
                pc,
                snapshot,
            } => listener.on_invalid(reason, *pc, snapshot),
        }
    }
}

/// Receives the end of a call; exactly one method fires per call
pub trait CallListener {
    fn on_normal_return(&mut self, _snapshot: &RegisterSnapshot) {}

    fn on_fault(
        &mut self,
        _cause: ExceptionCause,
        _address: u32,
        _pc: u32,
        _snapshot: &RegisterSnapshot,
    ) {
    }

    fn on_invalid(&mut self, _reason: &str, _pc: u32, _snapshot: &RegisterSnapshot) {}
}

impl Interpreter {
    /// Call a guest function and run it to completion
    pub fn evaluate(&mut self, call: &FunctionCall) -> Result<CallResult, BridgeError> {
        call.validate()?;
        ge_core::bridge_debug!(
            "Calling 0x{:08x} with {} integer and {} float arguments",
            call.entry,
            call.gpr_args.len(),
            call.fpr_args.len()
        );

        for (i, value) in call.gpr_args.iter().enumerate() {
            self.regs.gpr[FIRST_GPR_ARG + i] = *value;
        }
        for (i, value) in call.fpr_args.iter().enumerate() {
            self.regs.fpr[FIRST_FPR_ARG + i].set_ps0(*value);
        }
        self.regs.lr = RETURN_SENTINEL;
        self.regs.pc = call.entry;
        self.regs.reservation = None;

        let termination = self.run();
        let snapshot = RegisterSnapshot::capture(&self.regs);

        Ok(match termination {
            Termination::Completed => CallResult::Completed { snapshot },
            Termination::Faulted { cause, address, pc } => CallResult::Faulted {
                cause,
                address,
                pc,
                snapshot,
            },
            Termination::Invalid { reason, pc } => CallResult::Invalid {
                reason,
                pc,
                snapshot,
            },
        })
    }

    /// Set the stack pointer (r1)
    pub fn set_stack_pointer(&mut self, value: u32) {
        self.regs.gpr[1] = value;
    }

    /// Set the read-only small-data anchor (r2)
    pub fn set_globals_pointer_r(&mut self, value: u32) {
        self.regs.gpr[2] = value;
    }

    /// Set the read-write small-data anchor (r13)
    pub fn set_globals_pointer_rw(&mut self, value: u32) {
        self.regs.gpr[13] = value;
    }

    /// Copy `len` bytes out of guest memory
    pub fn read_memory(&self, addr: u32, len: usize) -> Result<Vec<u8>, MemoryError> {
        let mut buf = vec![0; len];
        self.memory.read_bytes(addr, &mut buf)?;
        Ok(buf)
    }

    /// Copy bytes into guest memory
    pub fn write_memory(&mut self, addr: u32, data: &[u8]) -> Result<(), MemoryError> {
        self.memory.write_bytes(addr, data)
    }
}
