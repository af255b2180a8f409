//! Execution units
//!
//! Every instruction is a function taking the register file, the decoded form
//! and (for memory instructions) the guest memory view. Units never touch the
//! PC directly; branches write `regs.npc`, which dispatch commits once the
//! instruction has completed.

pub mod branch;
pub mod float;
pub mod integer;
pub mod load_store;
pub mod paired;
pub mod system;

use ge_core::error::{ExceptionCause, PpcError};

use crate::registers::RegisterFile;

/// Result of executing one instruction
pub type ExecResult = Result<(), PpcError>;

/// Effective address of a displacement access: `(rA|0) + d`
#[inline]
pub(crate) fn ea_d(regs: &RegisterFile, ra: u8, d: i16) -> u32 {
    regs.gpr_or_zero(ra).wrapping_add(d as i32 as u32)
}

/// Effective address of an indexed access: `(rA|0) + rB`
#[inline]
pub(crate) fn ea_x(regs: &RegisterFile, ra: u8, rb: u8) -> u32 {
    regs.gpr_or_zero(ra).wrapping_add(regs.gpr(rb))
}

/// Reject an update-form load whose base register is r0 or the destination
#[inline]
pub(crate) fn check_load_update(name: &str, rt: u8, ra: u8) -> ExecResult {
    if ra == 0 || ra == rt {
        return Err(PpcError::invalid(format!(
            "{name} with rA={ra}, rD={rt} is an invalid form"
        )));
    }
    Ok(())
}

/// Reject an update-form store (or float load) whose base register is r0
#[inline]
pub(crate) fn check_update(name: &str, ra: u8) -> ExecResult {
    if ra == 0 {
        return Err(PpcError::invalid(format!("{name} with rA=0 is an invalid form")));
    }
    Ok(())
}

/// Fault with ALIGNMENT unless `ea` is word aligned
#[inline]
pub(crate) fn check_word_aligned(ea: u32) -> ExecResult {
    if ea & 3 != 0 {
        return Err(PpcError::fault(ExceptionCause::Alignment, ea));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use ge_memory::{BufferProvider, MemoryView};

    use crate::registers::RegisterFile;

    /// Fresh registers plus 64 KB of zeroed guest RAM
    pub fn create_test_env() -> (RegisterFile, MemoryView) {
        let provider = Arc::new(BufferProvider::new(0x1_0000));
        let mut regs = RegisterFile::new();
        regs.pc = 0x8000_0000;
        regs.npc = 0x8000_0004;
        (regs, MemoryView::new(provider))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_addresses() {
        let mut regs = RegisterFile::new();
        regs.gpr[0] = 0x1234;
        regs.gpr[3] = 0x8000_1000;
        regs.gpr[4] = 0x10;

        assert_eq!(ea_d(&regs, 0, 8), 8, "r0 base reads as zero");
        assert_eq!(ea_d(&regs, 3, -4), 0x8000_0FFC);
        assert_eq!(ea_x(&regs, 3, 4), 0x8000_1010);
        assert_eq!(ea_x(&regs, 0, 4), 0x10);
    }

    #[test]
    fn test_ea_wraps() {
        let mut regs = RegisterFile::new();
        regs.gpr[3] = 0xFFFF_FFFC;
        assert_eq!(ea_d(&regs, 3, 8), 4);
    }

    #[test]
    fn test_update_form_checks() {
        assert!(check_load_update("lwzu", 3, 0).is_err());
        assert!(check_load_update("lwzu", 3, 3).is_err());
        assert!(check_load_update("lwzu", 3, 4).is_ok());
        assert!(check_update("stwu", 0).is_err());
        assert!(check_update("stwu", 1).is_ok());
    }

    #[test]
    fn test_alignment_check() {
        assert!(check_word_aligned(0x8000_0004).is_ok());
        assert_eq!(
            check_word_aligned(0x8000_0006),
            Err(PpcError::fault(ExceptionCause::Alignment, 0x8000_0006))
        );
    }
}
