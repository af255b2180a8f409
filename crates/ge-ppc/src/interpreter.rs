//! Gekko interpreter: fetch, decode, dispatch and the run loop

use std::sync::Arc;

use ge_core::config::InterpreterConfig;
use ge_core::error::{ExceptionCause, PpcError};
use ge_memory::{MemoryProvider, MemoryView};

use crate::bridge::RETURN_SENTINEL;
use crate::context::InterpreterContext;
use crate::decoder::{
    field, AForm, BForm, DForm, IForm, InstructionWord, MForm, PsqForm, PsqxForm, ScForm, XForm,
    XflForm, XfxForm, XlForm, XoForm,
};
use crate::instructions::{
    branch, float, integer, load_store, paired, system, ExecResult,
};
use crate::opcodes::{
    Op19, Op31, Op31Arith, Op4Arith, Op4Extended, Op4Indexed, Op59, Op63, Op63Arith, Opcode,
};
use crate::registers::RegisterFile;

/// DSISR value for a reference to memory that is not mapped
const DSISR_NOT_FOUND: u32 = 0x4000_0000;

/// Where the dispatch loop is in a call's lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchState {
    /// No call in flight
    #[default]
    Idle,
    /// Executing guest code
    Running,
    /// The called function returned to the sentinel
    Completed,
    /// An instruction raised an exception
    Faulted,
    /// An instruction was unknown or malformed
    Invalid,
}

impl DispatchState {
    /// Whether this is one of the three end states of a call
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Faulted | Self::Invalid)
    }
}

/// Why [`Interpreter::run`] stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    Completed,
    Faulted {
        cause: ExceptionCause,
        /// Effective address for data faults, the PC for instruction faults
        address: u32,
        pc: u32,
    },
    Invalid {
        reason: String,
        pc: u32,
    },
}

/// Gekko interpreter bound to a guest memory view
pub struct Interpreter {
    pub(crate) regs: RegisterFile,
    pub(crate) memory: MemoryView,
    config: InterpreterConfig,
    state: DispatchState,
    /// Instructions executed by the current (or last) run
    executed: u64,
}

impl Interpreter {
    /// Create an interpreter over the context's memory provider
    pub fn new(ctx: &InterpreterContext) -> Self {
        Self {
            regs: RegisterFile::new(),
            memory: MemoryView::new(Arc::clone(&ctx.provider)),
            config: ctx.config.interpreter.clone(),
            state: DispatchState::Idle,
            executed: 0,
        }
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.regs
    }

    pub fn registers_mut(&mut self) -> &mut RegisterFile {
        &mut self.regs
    }

    pub fn memory(&self) -> &MemoryView {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut MemoryView {
        &mut self.memory
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    /// Instructions executed by the most recent run
    pub fn executed(&self) -> u64 {
        self.executed
    }

    /// Re-bind the memory view after the provider reconnects
    pub fn rebind(&mut self, provider: Arc<dyn MemoryProvider>) {
        self.memory.rebind(provider);
    }

    /// Reset every register to its power-on value
    pub fn reset(&mut self) {
        self.regs.reset();
        self.state = DispatchState::Idle;
        self.executed = 0;
    }

    /// Execute a single instruction at the current PC
    ///
    /// On failure the PC still addresses the offending instruction and no
    /// register beyond those already written by the unit has changed.
    pub fn step(&mut self) -> ExecResult {
        let pc = self.regs.pc;
        let word = self
            .memory
            .read::<u32>(pc)
            .map_err(|_| PpcError::fault(ExceptionCause::Isi, pc))?;

        if self.config.trace_instructions {
            ge_core::ppc_trace!("0x{:08x}: {:?}", pc, InstructionWord(word));
        }

        self.regs.npc = pc.wrapping_add(4);
        self.execute(InstructionWord(word))?;
        self.regs.pc = self.regs.npc;
        self.regs.tb = self.regs.tb.wrapping_add(1);
        self.executed += 1;
        Ok(())
    }

    /// Run from the current PC until the return sentinel or a failure
    pub fn run(&mut self) -> Termination {
        self.state = DispatchState::Running;
        self.executed = 0;
        let limit = self.config.instruction_limit;

        let termination = loop {
            if self.regs.pc == RETURN_SENTINEL {
                break Termination::Completed;
            }
            if limit != 0 && self.executed >= limit {
                break Termination::Invalid {
                    reason: "instruction limit reached".to_string(),
                    pc: self.regs.pc,
                };
            }
            match self.step() {
                Ok(()) => {}
                Err(PpcError::Fault { cause, address }) => {
                    self.record_fault(cause, address);
                    break Termination::Faulted {
                        cause,
                        address,
                        pc: self.regs.pc,
                    };
                }
                Err(PpcError::Invalid(reason)) => {
                    break Termination::Invalid {
                        reason,
                        pc: self.regs.pc,
                    };
                }
            }
        };

        self.state = match &termination {
            Termination::Completed => {
                ge_core::ppc_debug!("Call completed after {} instructions", self.executed);
                DispatchState::Completed
            }
            Termination::Faulted { cause, address, pc } => {
                tracing::warn!("{} exception at 0x{:08x} (pc 0x{:08x})", cause, address, pc);
                DispatchState::Faulted
            }
            Termination::Invalid { reason, pc } => {
                tracing::warn!("Invalid instruction at 0x{:08x}: {}", pc, reason);
                DispatchState::Invalid
            }
        };
        termination
    }

    /// Record a data fault in DAR/DSISR the way the hardware would
    fn record_fault(&mut self, cause: ExceptionCause, address: u32) {
        match cause {
            ExceptionCause::Dsi => {
                self.regs.dar = address;
                self.regs.dsisr = DSISR_NOT_FOUND;
            }
            ExceptionCause::Alignment => self.regs.dar = address,
            _ => {}
        }
    }

    fn unknown(&self, word: InstructionWord) -> PpcError {
        tracing::warn!(
            "Unknown instruction 0x{:08x} (opcode {}) at 0x{:08x}",
            word.0,
            word.opcd(),
            self.regs.pc
        );
        PpcError::invalid(format!(
            "unknown instruction 0x{:08x} (opcode {})",
            word.0,
            word.opcd()
        ))
    }

    /// Execute a decoded instruction
    pub fn execute(&mut self, word: InstructionWord) -> ExecResult {
        let w = word.0;
        let Some(op) = Opcode::from_raw(word.opcd()) else {
            return Err(self.unknown(word));
        };
        let regs = &mut self.regs;
        let mem = &mut self.memory;

        match op {
            Opcode::Table4 => self.execute_table4(word),
            Opcode::Table19 => self.execute_table19(word),
            Opcode::Table31 => self.execute_table31(word),
            Opcode::Table59 => self.execute_table59(word),
            Opcode::Table63 => self.execute_table63(word),

            // Branches
            Opcode::B => branch::b(regs, IForm::decode(w)),
            Opcode::Bc => branch::bc(regs, BForm::decode(w)),
            Opcode::Sc => system::sc(regs, ScForm::decode(w)),

            // Integer immediates
            Opcode::Twi => integer::twi(regs, DForm::decode(w)),
            Opcode::Mulli => integer::mulli(regs, DForm::decode(w)),
            Opcode::Subfic => integer::subfic(regs, DForm::decode(w)),
            Opcode::Cmpli => integer::cmpli(regs, DForm::decode(w)),
            Opcode::Cmpi => integer::cmpi(regs, DForm::decode(w)),
            Opcode::Addic => integer::addic(regs, DForm::decode(w), false),
            Opcode::AddicRc => integer::addic(regs, DForm::decode(w), true),
            Opcode::Addi => integer::addi(regs, DForm::decode(w)),
            Opcode::Addis => integer::addis(regs, DForm::decode(w)),
            Opcode::Ori => integer::ori(regs, DForm::decode(w)),
            Opcode::Oris => integer::oris(regs, DForm::decode(w)),
            Opcode::Xori => integer::xori(regs, DForm::decode(w)),
            Opcode::Xoris => integer::xoris(regs, DForm::decode(w)),
            Opcode::AndiRc => integer::andi_rc(regs, DForm::decode(w)),
            Opcode::AndisRc => integer::andis_rc(regs, DForm::decode(w)),

            // Rotates
            Opcode::Rlwimi => integer::rlwimi(regs, MForm::decode(w)),
            Opcode::Rlwinm => integer::rlwinm(regs, MForm::decode(w)),
            Opcode::Rlwnm => integer::rlwnm(regs, MForm::decode(w)),

            // Integer loads/stores
            Opcode::Lwz => load_store::lwz(regs, mem, DForm::decode(w)),
            Opcode::Lwzu => load_store::lwzu(regs, mem, DForm::decode(w)),
            Opcode::Lbz => load_store::lbz(regs, mem, DForm::decode(w)),
            Opcode::Lbzu => load_store::lbzu(regs, mem, DForm::decode(w)),
            Opcode::Stw => load_store::stw(regs, mem, DForm::decode(w)),
            Opcode::Stwu => load_store::stwu(regs, mem, DForm::decode(w)),
            Opcode::Stb => load_store::stb(regs, mem, DForm::decode(w)),
            Opcode::Stbu => load_store::stbu(regs, mem, DForm::decode(w)),
            Opcode::Lhz => load_store::lhz(regs, mem, DForm::decode(w)),
            Opcode::Lhzu => load_store::lhzu(regs, mem, DForm::decode(w)),
            Opcode::Lha => load_store::lha(regs, mem, DForm::decode(w)),
            Opcode::Lhau => load_store::lhau(regs, mem, DForm::decode(w)),
            Opcode::Sth => load_store::sth(regs, mem, DForm::decode(w)),
            Opcode::Sthu => load_store::sthu(regs, mem, DForm::decode(w)),
            Opcode::Lmw => load_store::lmw(regs, mem, DForm::decode(w)),
            Opcode::Stmw => load_store::stmw(regs, mem, DForm::decode(w)),

            // Float loads/stores
            Opcode::Lfs => float::lfs(regs, mem, DForm::decode(w)),
            Opcode::Lfsu => float::lfsu(regs, mem, DForm::decode(w)),
            Opcode::Lfd => float::lfd(regs, mem, DForm::decode(w)),
            Opcode::Lfdu => float::lfdu(regs, mem, DForm::decode(w)),
            Opcode::Stfs => float::stfs(regs, mem, DForm::decode(w)),
            Opcode::Stfsu => float::stfsu(regs, mem, DForm::decode(w)),
            Opcode::Stfd => float::stfd(regs, mem, DForm::decode(w)),
            Opcode::Stfdu => float::stfdu(regs, mem, DForm::decode(w)),

            // Quantized loads/stores
            Opcode::PsqL => paired::psq_l(regs, mem, PsqForm::decode(w)),
            Opcode::PsqLu => paired::psq_lu(regs, mem, PsqForm::decode(w)),
            Opcode::PsqSt => paired::psq_st(regs, mem, PsqForm::decode(w)),
            Opcode::PsqStu => paired::psq_stu(regs, mem, PsqForm::decode(w)),
        }
    }

    /// Opcode 4: paired singles. The 5-bit arithmetic table shadows the
    /// wider tables, so it is tried first.
    fn execute_table4(&mut self, word: InstructionWord) -> ExecResult {
        let w = word.0;
        let regs = &mut self.regs;
        let mem = &mut self.memory;

        if let Some(op) = Op4Arith::from_raw(field::xo5(w)) {
            let a = AForm::decode(w);
            return match op {
                Op4Arith::Sum0 => paired::ps_sum0(regs, a),
                Op4Arith::Sum1 => paired::ps_sum1(regs, a),
                Op4Arith::Muls0 => paired::ps_muls0(regs, a),
                Op4Arith::Muls1 => paired::ps_muls1(regs, a),
                Op4Arith::Madds0 => paired::ps_madds0(regs, a),
                Op4Arith::Madds1 => paired::ps_madds1(regs, a),
                Op4Arith::Div => paired::ps_div(regs, a),
                Op4Arith::Sub => paired::ps_sub(regs, a),
                Op4Arith::Add => paired::ps_add(regs, a),
                Op4Arith::Sel => paired::ps_sel(regs, a),
                Op4Arith::Res => paired::ps_res(regs, a),
                Op4Arith::Mul => paired::ps_mul(regs, a),
                Op4Arith::Rsqrte => paired::ps_rsqrte(regs, a),
                Op4Arith::Msub => paired::ps_msub(regs, a),
                Op4Arith::Madd => paired::ps_madd(regs, a),
                Op4Arith::Nmsub => paired::ps_nmsub(regs, a),
                Op4Arith::Nmadd => paired::ps_nmadd(regs, a),
            };
        }

        if let Some(op) = Op4Indexed::from_raw(field::xo6(w)) {
            let p = PsqxForm::decode(w);
            return match op {
                Op4Indexed::PsqLx => paired::psq_lx(regs, mem, p),
                Op4Indexed::PsqStx => paired::psq_stx(regs, mem, p),
                Op4Indexed::PsqLux => paired::psq_lux(regs, mem, p),
                Op4Indexed::PsqStux => paired::psq_stux(regs, mem, p),
            };
        }

        if let Some(op) = Op4Extended::from_raw(field::xo10(w)) {
            let x = XForm::decode(w);
            return match op {
                Op4Extended::Cmpu0 => paired::ps_cmpu0(regs, x),
                Op4Extended::Cmpo0 => paired::ps_cmpo0(regs, x),
                Op4Extended::Cmpu1 => paired::ps_cmpu1(regs, x),
                Op4Extended::Cmpo1 => paired::ps_cmpo1(regs, x),
                Op4Extended::Neg => paired::ps_neg(regs, x),
                Op4Extended::Mr => paired::ps_mr(regs, x),
                Op4Extended::Nabs => paired::ps_nabs(regs, x),
                Op4Extended::Abs => paired::ps_abs(regs, x),
                Op4Extended::Merge00 => paired::ps_merge00(regs, x),
                Op4Extended::Merge01 => paired::ps_merge01(regs, x),
                Op4Extended::Merge10 => paired::ps_merge10(regs, x),
                Op4Extended::Merge11 => paired::ps_merge11(regs, x),
                Op4Extended::DcbzL => system::no_op(regs),
            };
        }

        Err(self.unknown(word))
    }

    /// Opcode 19: branch-to-register, CR logic, `rfi`, `isync`
    fn execute_table19(&mut self, word: InstructionWord) -> ExecResult {
        let Some(op) = Op19::from_raw(field::xo10(word.0)) else {
            return Err(self.unknown(word));
        };
        let regs = &mut self.regs;
        let xl = XlForm::decode(word.0);

        match op {
            Op19::Mcrf => branch::mcrf(regs, xl),
            Op19::Bclr => branch::bclr(regs, xl),
            Op19::Bcctr => branch::bcctr(regs, xl),
            Op19::Crnor => branch::crnor(regs, xl),
            Op19::Crandc => branch::crandc(regs, xl),
            Op19::Crxor => branch::crxor(regs, xl),
            Op19::Crnand => branch::crnand(regs, xl),
            Op19::Crand => branch::crand(regs, xl),
            Op19::Creqv => branch::creqv(regs, xl),
            Op19::Crorc => branch::crorc(regs, xl),
            Op19::Cror => branch::cror(regs, xl),
            Op19::Rfi => system::rfi(regs, xl),
            Op19::Isync => system::no_op(regs),
        }
    }

    /// Opcode 31: XO-form arithmetic first (9-bit), then everything else (10-bit)
    fn execute_table31(&mut self, word: InstructionWord) -> ExecResult {
        let w = word.0;
        let regs = &mut self.regs;
        let mem = &mut self.memory;

        if let Some(op) = Op31Arith::from_raw(field::xo9(w)) {
            let xo = XoForm::decode(w);
            return match op {
                Op31Arith::Subfc => integer::subfc(regs, xo),
                Op31Arith::Addc => integer::addc(regs, xo),
                Op31Arith::Mulhwu => integer::mulhwu(regs, xo),
                Op31Arith::Subf => integer::subf(regs, xo),
                Op31Arith::Mulhw => integer::mulhw(regs, xo),
                Op31Arith::Neg => integer::neg(regs, xo),
                Op31Arith::Subfe => integer::subfe(regs, xo),
                Op31Arith::Adde => integer::adde(regs, xo),
                Op31Arith::Subfze => integer::subfze(regs, xo),
                Op31Arith::Addze => integer::addze(regs, xo),
                Op31Arith::Subfme => integer::subfme(regs, xo),
                Op31Arith::Addme => integer::addme(regs, xo),
                Op31Arith::Mullw => integer::mullw(regs, xo),
                Op31Arith::Add => integer::add(regs, xo),
                Op31Arith::Divwu => integer::divwu(regs, xo),
                Op31Arith::Divw => integer::divw(regs, xo),
            };
        }

        let Some(op) = Op31::from_raw(field::xo10(w)) else {
            return Err(self.unknown(word));
        };
        let x = XForm::decode(w);

        match op {
            // Compares and traps
            Op31::Cmp => integer::cmp(regs, x),
            Op31::Cmpl => integer::cmpl(regs, x),
            Op31::Tw => integer::tw(regs, x),

            // Logic, shifts, extends
            Op31::And => integer::and(regs, x),
            Op31::Andc => integer::andc(regs, x),
            Op31::Or => integer::or(regs, x),
            Op31::Orc => integer::orc(regs, x),
            Op31::Xor => integer::xor(regs, x),
            Op31::Nand => integer::nand(regs, x),
            Op31::Nor => integer::nor(regs, x),
            Op31::Eqv => integer::eqv(regs, x),
            Op31::Cntlzw => integer::cntlzw(regs, x),
            Op31::Extsb => integer::extsb(regs, x),
            Op31::Extsh => integer::extsh(regs, x),
            Op31::Slw => integer::slw(regs, x),
            Op31::Srw => integer::srw(regs, x),
            Op31::Sraw => integer::sraw(regs, x),
            Op31::Srawi => integer::srawi(regs, x),

            // Register moves
            Op31::Mfcr => integer::mfcr(regs, x),
            Op31::Mtcrf => integer::mtcrf(regs, XfxForm::decode(w)),
            Op31::Mcrxr => integer::mcrxr(regs, x),
            Op31::Mfspr => integer::mfspr(regs, XfxForm::decode(w)),
            Op31::Mtspr => integer::mtspr(regs, XfxForm::decode(w)),
            Op31::Mftb => integer::mftb(regs, XfxForm::decode(w)),
            Op31::Mfmsr => system::mfmsr(regs, x),
            Op31::Mtmsr => system::mtmsr(regs, x),
            Op31::Mfsr => system::mfsr(regs, x),
            Op31::Mfsrin => system::mfsrin(regs, x),
            Op31::Mtsr => system::mtsr(regs, x),
            Op31::Mtsrin => system::mtsrin(regs, x),

            // Indexed loads/stores
            Op31::Lwzx => load_store::lwzx(regs, mem, x),
            Op31::Lwzux => load_store::lwzux(regs, mem, x),
            Op31::Lbzx => load_store::lbzx(regs, mem, x),
            Op31::Lbzux => load_store::lbzux(regs, mem, x),
            Op31::Lhzx => load_store::lhzx(regs, mem, x),
            Op31::Lhzux => load_store::lhzux(regs, mem, x),
            Op31::Lhax => load_store::lhax(regs, mem, x),
            Op31::Lhaux => load_store::lhaux(regs, mem, x),
            Op31::Stwx => load_store::stwx(regs, mem, x),
            Op31::Stwux => load_store::stwux(regs, mem, x),
            Op31::Stbx => load_store::stbx(regs, mem, x),
            Op31::Stbux => load_store::stbux(regs, mem, x),
            Op31::Sthx => load_store::sthx(regs, mem, x),
            Op31::Sthux => load_store::sthux(regs, mem, x),
            Op31::Lwbrx => load_store::lwbrx(regs, mem, x),
            Op31::Lhbrx => load_store::lhbrx(regs, mem, x),
            Op31::Stwbrx => load_store::stwbrx(regs, mem, x),
            Op31::Sthbrx => load_store::sthbrx(regs, mem, x),
            Op31::Lswi => load_store::lswi(regs, mem, x),
            Op31::Lswx => load_store::lswx(regs, mem, x),
            Op31::Stswi => load_store::stswi(regs, mem, x),
            Op31::Stswx => load_store::stswx(regs, mem, x),
            Op31::Lwarx => load_store::lwarx(regs, mem, x),
            Op31::Stwcx => load_store::stwcx(regs, mem, x),
            Op31::Eciwx => load_store::eciwx(regs, mem, x),
            Op31::Ecowx => load_store::ecowx(regs, mem, x),

            // Indexed float loads/stores
            Op31::Lfsx => float::lfsx(regs, mem, x),
            Op31::Lfsux => float::lfsux(regs, mem, x),
            Op31::Lfdx => float::lfdx(regs, mem, x),
            Op31::Lfdux => float::lfdux(regs, mem, x),
            Op31::Stfsx => float::stfsx(regs, mem, x),
            Op31::Stfsux => float::stfsux(regs, mem, x),
            Op31::Stfdx => float::stfdx(regs, mem, x),
            Op31::Stfdux => float::stfdux(regs, mem, x),
            Op31::Stfiwx => float::stfiwx(regs, mem, x),

            // Cache, sync and TLB
            Op31::Dcbz => system::dcbz(regs, mem, x),
            Op31::Dcbst
            | Op31::Dcbf
            | Op31::Dcbtst
            | Op31::Dcbt
            | Op31::Dcbi
            | Op31::Icbi
            | Op31::Sync
            | Op31::Eieio
            | Op31::Tlbie
            | Op31::Tlbsync => system::no_op(regs),
        }
    }

    /// Opcode 59: single-precision arithmetic
    fn execute_table59(&mut self, word: InstructionWord) -> ExecResult {
        let Some(op) = Op59::from_raw(field::xo5(word.0)) else {
            return Err(self.unknown(word));
        };
        let regs = &mut self.regs;
        let a = AForm::decode(word.0);

        match op {
            Op59::Fdivs => float::fdivs(regs, a),
            Op59::Fsubs => float::fsubs(regs, a),
            Op59::Fadds => float::fadds(regs, a),
            Op59::Fres => float::fres(regs, a),
            Op59::Fmuls => float::fmuls(regs, a),
            Op59::Fmsubs => float::fmsubs(regs, a),
            Op59::Fmadds => float::fmadds(regs, a),
            Op59::Fnmsubs => float::fnmsubs(regs, a),
            Op59::Fnmadds => float::fnmadds(regs, a),
        }
    }

    /// Opcode 63: 5-bit double-precision arithmetic first, then the 10-bit table
    fn execute_table63(&mut self, word: InstructionWord) -> ExecResult {
        let w = word.0;
        let regs = &mut self.regs;

        if let Some(op) = Op63Arith::from_raw(field::xo5(w)) {
            let a = AForm::decode(w);
            return match op {
                Op63Arith::Fdiv => float::fdiv(regs, a),
                Op63Arith::Fsub => float::fsub(regs, a),
                Op63Arith::Fadd => float::fadd(regs, a),
                Op63Arith::Fsel => float::fsel(regs, a),
                Op63Arith::Fmul => float::fmul(regs, a),
                Op63Arith::Frsqrte => float::frsqrte(regs, a),
                Op63Arith::Fmsub => float::fmsub(regs, a),
                Op63Arith::Fmadd => float::fmadd(regs, a),
                Op63Arith::Fnmsub => float::fnmsub(regs, a),
                Op63Arith::Fnmadd => float::fnmadd(regs, a),
            };
        }

        let Some(op) = Op63::from_raw(field::xo10(w)) else {
            return Err(self.unknown(word));
        };
        let x = XForm::decode(w);

        match op {
            Op63::Fcmpu => float::fcmpu(regs, x),
            Op63::Fcmpo => float::fcmpo(regs, x),
            Op63::Frsp => float::frsp(regs, x),
            Op63::Fctiw => float::fctiw(regs, x),
            Op63::Fctiwz => float::fctiwz(regs, x),
            Op63::Fmr => float::fmr(regs, x),
            Op63::Fneg => float::fneg(regs, x),
            Op63::Fabs => float::fabs(regs, x),
            Op63::Fnabs => float::fnabs(regs, x),
            Op63::Mffs => float::mffs(regs, x),
            Op63::Mtfsb0 => float::mtfsb0(regs, x),
            Op63::Mtfsb1 => float::mtfsb1(regs, x),
            Op63::Mtfsfi => float::mtfsfi(regs, x),
            Op63::Mtfsf => float::mtfsf(regs, XflForm::decode(w)),
            Op63::Mcrfs => float::mcrfs(regs, x),
        }
    }
}
