//! System instructions: system call, interrupt return, MSR/SR moves and
//! cache management

use ge_memory::constants::CACHE_LINE_SIZE;
use ge_memory::MemoryView;

use super::{ea_x, ExecResult};
use crate::decoder::{ScForm, XForm, XlForm};
use crate::registers::{msr, RegisterFile};

/// MSR bits saved to SRR1 on an interrupt and restored by `rfi`
pub const SRR1_MSR_MASK: u32 = 0x87C0_FF73;

/// MSR bits cleared on interrupt entry
pub const INTERRUPT_CLEARED_MSR: u32 = 0x0004_EF36;

/// System call vector offset
pub const SYSCALL_VECTOR: u32 = 0x0C00;

/// sc - System Call
///
/// Vectors to the guest's own handler; the interpreter has no host-side
/// syscall layer.
pub fn sc(regs: &mut RegisterFile, _sc: ScForm) -> ExecResult {
    regs.srr0 = regs.pc.wrapping_add(4);
    regs.srr1 = regs.msr & SRR1_MSR_MASK;
    let base = if regs.msr & msr::IP != 0 {
        0xFFF0_0000
    } else {
        0x8000_0000
    };
    regs.msr &= !INTERRUPT_CLEARED_MSR;
    regs.npc = base | SYSCALL_VECTOR;
    ge_core::ppc_debug!("sc at 0x{:08x} -> 0x{:08x}", regs.pc, regs.npc);
    Ok(())
}

/// rfi - Return From Interrupt
pub fn rfi(regs: &mut RegisterFile, _xl: XlForm) -> ExecResult {
    regs.msr = (regs.msr & !SRR1_MSR_MASK) | (regs.srr1 & SRR1_MSR_MASK);
    regs.msr &= !msr::POW;
    regs.npc = regs.srr0 & !3;
    regs.reservation = None;
    Ok(())
}

/// mfmsr - Move From Machine State Register
pub fn mfmsr(regs: &mut RegisterFile, x: XForm) -> ExecResult {
    let value = regs.msr;
    regs.set_gpr(x.rt, value);
    Ok(())
}

/// mtmsr - Move To Machine State Register
pub fn mtmsr(regs: &mut RegisterFile, x: XForm) -> ExecResult {
    regs.msr = regs.gpr(x.rt);
    Ok(())
}

/// mfsr - Move From Segment Register
pub fn mfsr(regs: &mut RegisterFile, x: XForm) -> ExecResult {
    let value = regs.sr[x.sr() as usize];
    regs.set_gpr(x.rt, value);
    Ok(())
}

/// mfsrin - Move From Segment Register Indirect
pub fn mfsrin(regs: &mut RegisterFile, x: XForm) -> ExecResult {
    let value = regs.sr[(regs.gpr(x.rb) >> 28) as usize];
    regs.set_gpr(x.rt, value);
    Ok(())
}

/// mtsr - Move To Segment Register
pub fn mtsr(regs: &mut RegisterFile, x: XForm) -> ExecResult {
    regs.sr[x.sr() as usize] = regs.gpr(x.rt);
    Ok(())
}

/// mtsrin - Move To Segment Register Indirect
pub fn mtsrin(regs: &mut RegisterFile, x: XForm) -> ExecResult {
    let index = (regs.gpr(x.rb) >> 28) as usize;
    regs.sr[index] = regs.gpr(x.rt);
    Ok(())
}

/// dcbz - Data Cache Block Clear to Zero
pub fn dcbz(regs: &mut RegisterFile, mem: &mut MemoryView, x: XForm) -> ExecResult {
    let ea = ea_x(regs, x.ra, x.rb) & !(CACHE_LINE_SIZE - 1);
    mem.write_bytes(ea, &[0; CACHE_LINE_SIZE as usize])?;
    Ok(())
}

/// Cache, TLB and synchronization instructions that have no effect on an
/// interpreter without a cache model: `dcbf`, `dcbi`, `dcbst`, `dcbt`,
/// `dcbtst`, `dcbz_l`, `icbi`, `sync`, `isync`, `eieio`, `tlbie`, `tlbsync`
#[inline]
pub fn no_op(_regs: &mut RegisterFile) -> ExecResult {
    Ok(())
}
