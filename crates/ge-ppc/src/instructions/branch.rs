//! Branch processor: branches and condition register logic

use ge_core::error::PpcError;

use super::ExecResult;
use crate::bridge::RETURN_SENTINEL;
use crate::decoder::{BForm, IForm, XlForm};
use crate::registers::RegisterFile;

/// Branch condition encoded in the BO field
///
/// "Decrement" variants decrement CTR before testing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BranchPolicy {
    /// Decrement CTR, branch if CTR != 0 and the CR bit is clear
    DecrementNonZeroFalse,
    /// Decrement CTR, branch if CTR == 0 and the CR bit is clear
    DecrementZeroFalse,
    /// Branch if the CR bit is clear
    IfFalse,
    /// Decrement CTR, branch if CTR != 0 and the CR bit is set
    DecrementNonZeroTrue,
    /// Decrement CTR, branch if CTR == 0 and the CR bit is set
    DecrementZeroTrue,
    /// Branch if the CR bit is set
    IfTrue,
    /// Decrement CTR, branch if CTR != 0
    DecrementNonZero,
    /// Decrement CTR, branch if CTR == 0
    DecrementZero,
    /// Branch unconditionally
    Always,
}

impl BranchPolicy {
    /// Classify a BO field; every 5-bit value maps to exactly one policy
    pub const fn from_bo(bo: u8) -> Self {
        if bo & 0b11110 == 0b00000 {
            Self::DecrementNonZeroFalse
        } else if bo & 0b11110 == 0b00010 {
            Self::DecrementZeroFalse
        } else if bo & 0b11100 == 0b00100 {
            Self::IfFalse
        } else if bo & 0b11110 == 0b01000 {
            Self::DecrementNonZeroTrue
        } else if bo & 0b11110 == 0b01010 {
            Self::DecrementZeroTrue
        } else if bo & 0b11100 == 0b01100 {
            Self::IfTrue
        } else if bo & 0b10110 == 0b10000 {
            Self::DecrementNonZero
        } else if bo & 0b10110 == 0b10010 {
            Self::DecrementZero
        } else {
            Self::Always
        }
    }

    /// Whether CTR is decremented before the test
    pub const fn decrements(self) -> bool {
        !matches!(self, Self::IfFalse | Self::IfTrue | Self::Always)
    }

    /// Whether the branch is taken given the (already decremented) CTR and the CR bit
    pub const fn taken(self, ctr: u32, cr_bit: bool) -> bool {
        match self {
            Self::DecrementNonZeroFalse => ctr != 0 && !cr_bit,
            Self::DecrementZeroFalse => ctr == 0 && !cr_bit,
            Self::IfFalse => !cr_bit,
            Self::DecrementNonZeroTrue => ctr != 0 && cr_bit,
            Self::DecrementZeroTrue => ctr == 0 && cr_bit,
            Self::IfTrue => cr_bit,
            Self::DecrementNonZero => ctr != 0,
            Self::DecrementZero => ctr == 0,
            Self::Always => true,
        }
    }
}

/// Apply the BO/BI condition, decrementing CTR first if the policy says so
fn condition_met(regs: &mut RegisterFile, bo: u8, bi: u8) -> bool {
    let policy = BranchPolicy::from_bo(bo);
    if policy.decrements() {
        regs.ctr = regs.ctr.wrapping_sub(1);
    }
    policy.taken(regs.ctr, regs.cr_bit(bi))
}

/// b - Branch
pub fn b(regs: &mut RegisterFile, i: IForm) -> ExecResult {
    regs.npc = if i.aa {
        i.li as u32
    } else {
        regs.pc.wrapping_add(i.li as u32)
    };
    if i.lk {
        regs.lr = regs.pc.wrapping_add(4);
    }
    Ok(())
}

/// bc - Branch Conditional
pub fn bc(regs: &mut RegisterFile, b: BForm) -> ExecResult {
    if condition_met(regs, b.bo, b.bi) {
        regs.npc = if b.aa {
            b.bd as u32
        } else {
            regs.pc.wrapping_add(b.bd as u32)
        };
    }
    if b.lk {
        regs.lr = regs.pc.wrapping_add(4);
    }
    Ok(())
}

/// bclr - Branch Conditional to Link Register
pub fn bclr(regs: &mut RegisterFile, xl: XlForm) -> ExecResult {
    // Read the target before LK overwrites LR (blrl). The host return
    // sentinel is unaligned and must reach the run loop unmasked.
    let target = match regs.lr {
        RETURN_SENTINEL => RETURN_SENTINEL,
        lr => lr & !3,
    };
    if condition_met(regs, xl.bt, xl.ba) {
        regs.npc = target;
    }
    if xl.lk {
        regs.lr = regs.pc.wrapping_add(4);
    }
    Ok(())
}

/// bcctr - Branch Conditional to Count Register
pub fn bcctr(regs: &mut RegisterFile, xl: XlForm) -> ExecResult {
    if xl.bt & 0b00100 == 0 {
        return Err(PpcError::invalid(format!(
            "bcctr with BO={:#07b} would decrement CTR",
            xl.bt
        )));
    }
    let target = regs.ctr & !3;
    if condition_met(regs, xl.bt, xl.ba) {
        regs.npc = target;
    }
    if xl.lk {
        regs.lr = regs.pc.wrapping_add(4);
    }
    Ok(())
}

/// mcrf - Move Condition Register Field
pub fn mcrf(regs: &mut RegisterFile, xl: XlForm) -> ExecResult {
    let value = regs.cr_field(xl.ba >> 2);
    regs.set_cr_field(xl.bt >> 2, value);
    Ok(())
}

fn cr_logic(regs: &mut RegisterFile, xl: XlForm, op: impl Fn(bool, bool) -> bool) -> ExecResult {
    let result = op(regs.cr_bit(xl.ba), regs.cr_bit(xl.bb));
    regs.set_cr_bit(xl.bt, result);
    Ok(())
}

/// crand - Condition Register AND
pub fn crand(regs: &mut RegisterFile, xl: XlForm) -> ExecResult {
    cr_logic(regs, xl, |a, b| a & b)
}

/// crandc - Condition Register AND with Complement
pub fn crandc(regs: &mut RegisterFile, xl: XlForm) -> ExecResult {
    cr_logic(regs, xl, |a, b| a & !b)
}

/// creqv - Condition Register Equivalent
pub fn creqv(regs: &mut RegisterFile, xl: XlForm) -> ExecResult {
    cr_logic(regs, xl, |a, b| a == b)
}

/// crnand - Condition Register NAND
pub fn crnand(regs: &mut RegisterFile, xl: XlForm) -> ExecResult {
    cr_logic(regs, xl, |a, b| !(a & b))
}

/// crnor - Condition Register NOR
pub fn crnor(regs: &mut RegisterFile, xl: XlForm) -> ExecResult {
    cr_logic(regs, xl, |a, b| !(a | b))
}

/// cror - Condition Register OR
pub fn cror(regs: &mut RegisterFile, xl: XlForm) -> ExecResult {
    cr_logic(regs, xl, |a, b| a | b)
}

/// crorc - Condition Register OR with Complement
pub fn crorc(regs: &mut RegisterFile, xl: XlForm) -> ExecResult {
    cr_logic(regs, xl, |a, b| a | !b)
}

/// crxor - Condition Register XOR
pub fn crxor(regs: &mut RegisterFile, xl: XlForm) -> ExecResult {
    cr_logic(regs, xl, |a, b| a ^ b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instructions::test_support::create_test_env;

    const ALL_POLICIES: [BranchPolicy; 9] = [
        BranchPolicy::DecrementNonZeroFalse,
        BranchPolicy::DecrementZeroFalse,
        BranchPolicy::IfFalse,
        BranchPolicy::DecrementNonZeroTrue,
        BranchPolicy::DecrementZeroTrue,
        BranchPolicy::IfTrue,
        BranchPolicy::DecrementNonZero,
        BranchPolicy::DecrementZero,
        BranchPolicy::Always,
    ];

    // ===== BO classification =====

    #[test]
    fn test_bo_classification() {
        assert_eq!(BranchPolicy::from_bo(0b00000), BranchPolicy::DecrementNonZeroFalse);
        assert_eq!(BranchPolicy::from_bo(0b00011), BranchPolicy::DecrementZeroFalse);
        assert_eq!(BranchPolicy::from_bo(0b00100), BranchPolicy::IfFalse);
        assert_eq!(BranchPolicy::from_bo(0b01001), BranchPolicy::DecrementNonZeroTrue);
        assert_eq!(BranchPolicy::from_bo(0b01010), BranchPolicy::DecrementZeroTrue);
        assert_eq!(BranchPolicy::from_bo(0b01100), BranchPolicy::IfTrue);
        assert_eq!(BranchPolicy::from_bo(0b10000), BranchPolicy::DecrementNonZero);
        assert_eq!(BranchPolicy::from_bo(0b11010), BranchPolicy::DecrementZero);
        assert_eq!(BranchPolicy::from_bo(0b10100), BranchPolicy::Always);
        assert_eq!(BranchPolicy::from_bo(0b11111), BranchPolicy::Always);
    }

    #[test]
    fn test_every_bo_value_is_classified() {
        for bo in 0..32u8 {
            let policy = BranchPolicy::from_bo(bo);
            // Decrementing policies are exactly those with BO[2] clear
            assert_eq!(policy.decrements(), bo & 0b00100 == 0, "BO={bo:#07b}");
            assert!(ALL_POLICIES.contains(&policy));
        }
    }

    #[test]
    fn test_truth_table() {
        use BranchPolicy::*;
        let cases = [
            // (policy, ctr after decrement, cr bit, taken)
            (DecrementNonZeroFalse, 1, false, true),
            (DecrementNonZeroFalse, 1, true, false),
            (DecrementNonZeroFalse, 0, false, false),
            (DecrementZeroFalse, 0, false, true),
            (DecrementZeroFalse, 0, true, false),
            (DecrementZeroFalse, 1, false, false),
            (IfFalse, 0, false, true),
            (IfFalse, 5, true, false),
            (DecrementNonZeroTrue, 3, true, true),
            (DecrementNonZeroTrue, 3, false, false),
            (DecrementNonZeroTrue, 0, true, false),
            (DecrementZeroTrue, 0, true, true),
            (DecrementZeroTrue, 0, false, false),
            (DecrementZeroTrue, 2, true, false),
            (IfTrue, 0, true, true),
            (IfTrue, 0, false, false),
            (DecrementNonZero, 7, false, true),
            (DecrementNonZero, 0, true, false),
            (DecrementZero, 0, false, true),
            (DecrementZero, 7, true, false),
            (Always, 0, false, true),
            (Always, 9, true, true),
        ];
        for (policy, ctr, bit, expected) in cases {
            assert_eq!(policy.taken(ctr, bit), expected, "{policy:?} ctr={ctr} bit={bit}");
        }
    }

    // ===== Branch Tests =====

    #[test]
    fn test_b_relative_and_link() {
        let (mut regs, _) = create_test_env();
        b(&mut regs, IForm { opcd: 18, li: 0x100, aa: false, lk: true }).unwrap();
        assert_eq!(regs.npc, 0x8000_0100);
        assert_eq!(regs.lr, 0x8000_0004);
    }

    #[test]
    fn test_b_target_wraps() {
        let (mut regs, _) = create_test_env();
        regs.pc = 0xFFFF_FFF0;
        b(&mut regs, IForm { opcd: 18, li: 0x20, aa: false, lk: false }).unwrap();
        assert_eq!(regs.npc, 0x0000_0010);

        b(&mut regs, IForm { opcd: 18, li: -8, aa: true, lk: false }).unwrap();
        assert_eq!(regs.npc, 0xFFFF_FFF8);
    }

    #[test]
    fn test_bdnz_loop_counter() {
        let (mut regs, _) = create_test_env();
        regs.ctr = 2;
        // bdnz -8
        let form = BForm::decode(0x4200_FFF8);
        bc(&mut regs, form).unwrap();
        assert_eq!(regs.ctr, 1);
        assert_eq!(regs.npc, 0x7FFF_FFF8);

        regs.npc = regs.pc + 4;
        bc(&mut regs, form).unwrap();
        assert_eq!(regs.ctr, 0);
        assert_eq!(regs.npc, regs.pc + 4, "falls through when CTR hits zero");
    }

    #[test]
    fn test_blrl_uses_old_lr() {
        let (mut regs, _) = create_test_env();
        regs.lr = 0x8000_2000;
        bclr(&mut regs, XlForm::decode(0x4E80_0021)).unwrap();
        assert_eq!(regs.npc, 0x8000_2000);
        assert_eq!(regs.lr, 0x8000_0004);
    }

    #[test]
    fn test_blr_keeps_return_sentinel_unmasked() {
        let (mut regs, _) = create_test_env();
        regs.lr = RETURN_SENTINEL;
        // blr
        bclr(&mut regs, XlForm::decode(0x4E80_0020)).unwrap();
        assert_eq!(regs.npc, RETURN_SENTINEL);

        regs.lr = 0x8000_2003;
        bclr(&mut regs, XlForm::decode(0x4E80_0020)).unwrap();
        assert_eq!(regs.npc, 0x8000_2000, "ordinary targets drop the low bits");
    }

    #[test]
    fn test_bclr_not_taken_ignores_sentinel() {
        let (mut regs, _) = create_test_env();
        regs.lr = RETURN_SENTINEL;
        // bnelr with CR0[EQ] set
        regs.cr = 0x2000_0000;
        bclr(&mut regs, XlForm::decode(0x4C82_0020)).unwrap();
        assert_eq!(regs.npc, 0x8000_0004);
    }

    #[test]
    fn test_bcctr_rejects_decrement() {
        let (mut regs, _) = create_test_env();
        regs.ctr = 0x8000_3000;
        // bctr
        bcctr(&mut regs, XlForm::decode(0x4E80_0420)).unwrap();
        assert_eq!(regs.npc, 0x8000_3000);

        // bcctr with BO=0b10000 (decrement) is invalid
        let invalid = XlForm { opcd: 19, bt: 0b10000, ba: 0, bb: 0, xo: 528, lk: false };
        assert!(matches!(bcctr(&mut regs, invalid), Err(PpcError::Invalid(_))));
        assert_eq!(regs.ctr, 0x8000_3000);
    }

    // ===== CR Logic Tests =====

    #[test]
    fn test_cr_logic() {
        let (mut regs, _) = create_test_env();
        regs.cr = 0xA000_0000; // bits 0 and 2 set

        let form = |bt, ba, bb| XlForm { opcd: 19, bt, ba, bb, xo: 0, lk: false };
        crand(&mut regs, form(4, 0, 2)).unwrap();
        assert!(regs.cr_bit(4));
        crxor(&mut regs, form(5, 0, 2)).unwrap();
        assert!(!regs.cr_bit(5));
        crnor(&mut regs, form(6, 1, 3)).unwrap();
        assert!(regs.cr_bit(6));
        crandc(&mut regs, form(7, 0, 1)).unwrap();
        assert!(regs.cr_bit(7));
        // crset / crclr idioms
        creqv(&mut regs, form(8, 8, 8)).unwrap();
        assert!(regs.cr_bit(8));
        crxor(&mut regs, form(8, 8, 8)).unwrap();
        assert!(!regs.cr_bit(8));
    }

    #[test]
    fn test_mcrf() {
        let (mut regs, _) = create_test_env();
        regs.set_cr_field(3, 0b0101);
        mcrf(&mut regs, XlForm { opcd: 19, bt: 6 << 2, ba: 3 << 2, bb: 0, xo: 0, lk: false }).unwrap();
        assert_eq!(regs.cr_field(6), 0b0101);
    }
}
