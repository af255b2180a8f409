//! Floating-point unit: scalar arithmetic, conversions, compares, FPSCR
//! access and float loads/stores

use ge_core::error::PpcError;
use ge_memory::MemoryView;

use super::{check_update, check_word_aligned, ea_d, ea_x, ExecResult};
use crate::decoder::{AForm, DForm, XflForm, XForm};
use crate::fp::{self, convert_to_double, convert_to_single, force_single};
use crate::registers::{Fpscr, RegisterFile};

const SIGN: u64 = 0x8000_0000_0000_0000;

/// High word OR'd into integer results stored in an FPR (`fctiw`, `mffs`)
const INTEGER_IN_FPR: u64 = 0xFFF8_0000_0000_0000;

#[inline]
fn operands(regs: &RegisterFile, a: AForm) -> (f64, f64, f64) {
    (regs.fpr(a.fra).ps0(), regs.fpr(a.frb).ps0(), regs.fpr(a.frc).ps0())
}

/// Write a double-precision result to ps0 and update FPRF (and CR1 for Rc)
fn finish_double(regs: &mut RegisterFile, frt: u8, rc: bool, value: f64) -> ExecResult {
    regs.fpr_mut(frt).set_ps0(value);
    regs.update_fprf(value);
    if rc {
        regs.update_cr1();
    }
    Ok(())
}

/// Round to single, write both lanes and update FPRF (and CR1 for Rc)
fn finish_single(regs: &mut RegisterFile, frt: u8, rc: bool, value: f64) -> ExecResult {
    let value = force_single(value);
    regs.fpr_mut(frt).set_both(value);
    regs.update_fprf(value);
    if rc {
        regs.update_cr1();
    }
    Ok(())
}

/// Write raw bits to ps0 without touching FPRF
fn finish_move(regs: &mut RegisterFile, frt: u8, rc: bool, bits: u64) -> ExecResult {
    regs.fpr_mut(frt).ps0 = bits;
    if rc {
        regs.update_cr1();
    }
    Ok(())
}

// ===== Double-precision arithmetic =====

/// fadd - Floating Add
pub fn fadd(regs: &mut RegisterFile, a: AForm) -> ExecResult {
    let (fa, fb, _) = operands(regs, a);
    let value = fp::add(regs, fa, fb);
    finish_double(regs, a.frt, a.rc, value)
}

/// fsub - Floating Subtract
pub fn fsub(regs: &mut RegisterFile, a: AForm) -> ExecResult {
    let (fa, fb, _) = operands(regs, a);
    let value = fp::sub(regs, fa, fb);
    finish_double(regs, a.frt, a.rc, value)
}

/// fmul - Floating Multiply (frA * frC)
pub fn fmul(regs: &mut RegisterFile, a: AForm) -> ExecResult {
    let (fa, _, fc) = operands(regs, a);
    let value = fp::mul(regs, fa, fc);
    finish_double(regs, a.frt, a.rc, value)
}

/// fdiv - Floating Divide
pub fn fdiv(regs: &mut RegisterFile, a: AForm) -> ExecResult {
    let (fa, fb, _) = operands(regs, a);
    let value = fp::div(regs, fa, fb);
    finish_double(regs, a.frt, a.rc, value)
}

/// fmadd - Floating Multiply-Add
pub fn fmadd(regs: &mut RegisterFile, a: AForm) -> ExecResult {
    let (fa, fb, fc) = operands(regs, a);
    let value = fp::madd(regs, fa, fc, fb);
    finish_double(regs, a.frt, a.rc, value)
}

/// fmsub - Floating Multiply-Subtract
pub fn fmsub(regs: &mut RegisterFile, a: AForm) -> ExecResult {
    let (fa, fb, fc) = operands(regs, a);
    let value = fp::msub(regs, fa, fc, fb);
    finish_double(regs, a.frt, a.rc, value)
}

/// fnmadd - Floating Negative Multiply-Add
pub fn fnmadd(regs: &mut RegisterFile, a: AForm) -> ExecResult {
    let (fa, fb, fc) = operands(regs, a);
    let value = fp::negate_result(fp::madd(regs, fa, fc, fb));
    finish_double(regs, a.frt, a.rc, value)
}

/// fnmsub - Floating Negative Multiply-Subtract
pub fn fnmsub(regs: &mut RegisterFile, a: AForm) -> ExecResult {
    let (fa, fb, fc) = operands(regs, a);
    let value = fp::negate_result(fp::msub(regs, fa, fc, fb));
    finish_double(regs, a.frt, a.rc, value)
}

/// fsel - Floating Select
pub fn fsel(regs: &mut RegisterFile, a: AForm) -> ExecResult {
    let (fa, fb, fc) = operands(regs, a);
    // -0.0 >= 0.0 holds; NaN selects frB
    let value = if fa >= 0.0 { fc } else { fb };
    finish_move(regs, a.frt, a.rc, value.to_bits())
}

/// frsqrte - Floating Reciprocal Square Root Estimate
pub fn frsqrte(regs: &mut RegisterFile, a: AForm) -> ExecResult {
    let fb = regs.fpr(a.frb).ps0();
    let value = fp::reciprocal_sqrt(regs, fb);
    finish_double(regs, a.frt, a.rc, value)
}

// ===== Single-precision arithmetic =====

/// fadds - Floating Add Single
pub fn fadds(regs: &mut RegisterFile, a: AForm) -> ExecResult {
    let (fa, fb, _) = operands(regs, a);
    let value = fp::add(regs, fa, fb);
    finish_single(regs, a.frt, a.rc, value)
}

/// fsubs - Floating Subtract Single
pub fn fsubs(regs: &mut RegisterFile, a: AForm) -> ExecResult {
    let (fa, fb, _) = operands(regs, a);
    let value = fp::sub(regs, fa, fb);
    finish_single(regs, a.frt, a.rc, value)
}

/// fmuls - Floating Multiply Single
pub fn fmuls(regs: &mut RegisterFile, a: AForm) -> ExecResult {
    let (fa, _, fc) = operands(regs, a);
    let value = fp::mul(regs, fa, fc);
    finish_single(regs, a.frt, a.rc, value)
}

/// fdivs - Floating Divide Single
pub fn fdivs(regs: &mut RegisterFile, a: AForm) -> ExecResult {
    let (fa, fb, _) = operands(regs, a);
    let value = fp::div(regs, fa, fb);
    finish_single(regs, a.frt, a.rc, value)
}

/// fmadds - Floating Multiply-Add Single
pub fn fmadds(regs: &mut RegisterFile, a: AForm) -> ExecResult {
    let (fa, fb, fc) = operands(regs, a);
    let value = fp::madd(regs, fa, fc, fb);
    finish_single(regs, a.frt, a.rc, value)
}

/// fmsubs - Floating Multiply-Subtract Single
pub fn fmsubs(regs: &mut RegisterFile, a: AForm) -> ExecResult {
    let (fa, fb, fc) = operands(regs, a);
    let value = fp::msub(regs, fa, fc, fb);
    finish_single(regs, a.frt, a.rc, value)
}

/// fnmadds - Floating Negative Multiply-Add Single
pub fn fnmadds(regs: &mut RegisterFile, a: AForm) -> ExecResult {
    let (fa, fb, fc) = operands(regs, a);
    let value = fp::negate_result(fp::madd(regs, fa, fc, fb));
    finish_single(regs, a.frt, a.rc, value)
}

/// fnmsubs - Floating Negative Multiply-Subtract Single
pub fn fnmsubs(regs: &mut RegisterFile, a: AForm) -> ExecResult {
    let (fa, fb, fc) = operands(regs, a);
    let value = fp::negate_result(fp::msub(regs, fa, fc, fb));
    finish_single(regs, a.frt, a.rc, value)
}

/// fres - Floating Reciprocal Estimate Single
pub fn fres(regs: &mut RegisterFile, a: AForm) -> ExecResult {
    let fb = regs.fpr(a.frb).ps0();
    let value = fp::reciprocal(regs, fb);
    finish_single(regs, a.frt, a.rc, value)
}

// ===== Moves =====

/// fmr - Floating Move Register
pub fn fmr(regs: &mut RegisterFile, x: XForm) -> ExecResult {
    let bits = regs.fpr(x.rb).ps0;
    finish_move(regs, x.rt, x.rc, bits)
}

/// fneg - Floating Negate
pub fn fneg(regs: &mut RegisterFile, x: XForm) -> ExecResult {
    let bits = regs.fpr(x.rb).ps0 ^ SIGN;
    finish_move(regs, x.rt, x.rc, bits)
}

/// fabs - Floating Absolute Value
pub fn fabs(regs: &mut RegisterFile, x: XForm) -> ExecResult {
    let bits = regs.fpr(x.rb).ps0 & !SIGN;
    finish_move(regs, x.rt, x.rc, bits)
}

/// fnabs - Floating Negative Absolute Value
pub fn fnabs(regs: &mut RegisterFile, x: XForm) -> ExecResult {
    let bits = regs.fpr(x.rb).ps0 | SIGN;
    finish_move(regs, x.rt, x.rc, bits)
}

// ===== Conversions =====

/// frsp - Floating Round to Single Precision
pub fn frsp(regs: &mut RegisterFile, x: XForm) -> ExecResult {
    let fb = regs.fpr(x.rb).ps0();
    if fp::is_snan(fb) {
        regs.set_fp_exception(Fpscr::VXSNAN);
    }
    let value = if fb.is_nan() { fp::quiet(fb) } else { fb };
    finish_single(regs, x.rt, x.rc, value)
}

/// Round `value` to an integer according to FPSCR[RN]
fn round_with_mode(value: f64, mode: u32) -> f64 {
    match mode {
        0 => {
            // Nearest, ties to even
            let rounded = value.round();
            if (value - value.trunc()).abs() == 0.5 && rounded % 2.0 != 0.0 {
                rounded - value.signum()
            } else {
                rounded
            }
        }
        1 => value.trunc(),
        2 => value.ceil(),
        _ => value.floor(),
    }
}

/// Shared body of `fctiw`/`fctiwz`
fn convert_to_integer(regs: &mut RegisterFile, x: XForm, mode: u32) -> ExecResult {
    let fb = regs.fpr(x.rb).ps0();

    let value: u32 = if fb.is_nan() {
        if fp::is_snan(fb) {
            regs.set_fp_exception(Fpscr::VXSNAN);
        }
        regs.set_fp_exception(Fpscr::VXCVI);
        0x8000_0000
    } else {
        let rounded = round_with_mode(fb, mode);
        if rounded > i32::MAX as f64 {
            regs.set_fp_exception(Fpscr::VXCVI);
            0x7FFF_FFFF
        } else if rounded < i32::MIN as f64 {
            regs.set_fp_exception(Fpscr::VXCVI);
            0x8000_0000
        } else {
            let mut flags = Fpscr::from_bits_retain(regs.fpscr);
            let inexact = rounded != fb;
            flags.set(Fpscr::FI, inexact);
            flags.set(Fpscr::FR, inexact && rounded.abs() > fb.abs());
            regs.fpscr = flags.bits();
            if inexact {
                regs.set_fp_exception(Fpscr::XX);
            }
            rounded as i32 as u32
        }
    };

    let mut bits = INTEGER_IN_FPR | value as u64;
    if value == 0 && fb.is_sign_negative() {
        bits |= 0x1_0000_0000;
    }
    finish_move(regs, x.rt, x.rc, bits)
}

/// fctiw - Floating Convert to Integer Word
pub fn fctiw(regs: &mut RegisterFile, x: XForm) -> ExecResult {
    let mode = regs.rounding_mode();
    convert_to_integer(regs, x, mode)
}

/// fctiwz - Floating Convert to Integer Word with Round toward Zero
pub fn fctiwz(regs: &mut RegisterFile, x: XForm) -> ExecResult {
    convert_to_integer(regs, x, 1)
}

// ===== Compares =====

fn compare(regs: &mut RegisterFile, x: XForm, ordered: bool) -> ExecResult {
    let fa = regs.fpr(x.ra).ps0();
    let fb = regs.fpr(x.rb).ps0();
    let code = fp::compare_code(fa, fb);

    regs.set_fpcc(code);
    regs.set_cr_field(x.crfd(), code);

    if fp::is_snan(fa) || fp::is_snan(fb) {
        let mut mask = Fpscr::VXSNAN;
        if ordered && !regs.fpscr_flags().contains(Fpscr::VE) {
            mask |= Fpscr::VXVC;
        }
        regs.set_fp_exception(mask);
    } else if ordered && (fa.is_nan() || fb.is_nan()) {
        regs.set_fp_exception(Fpscr::VXVC);
    }
    Ok(())
}

/// fcmpu - Floating Compare Unordered
pub fn fcmpu(regs: &mut RegisterFile, x: XForm) -> ExecResult {
    compare(regs, x, false)
}

/// fcmpo - Floating Compare Ordered
pub fn fcmpo(regs: &mut RegisterFile, x: XForm) -> ExecResult {
    compare(regs, x, true)
}

// ===== FPSCR =====

/// mffs - Move From FPSCR
pub fn mffs(regs: &mut RegisterFile, x: XForm) -> ExecResult {
    let bits = INTEGER_IN_FPR | regs.fpscr as u64;
    finish_move(regs, x.rt, x.rc, bits)
}

fn finish_fpscr_write(regs: &mut RegisterFile, rc: bool) -> ExecResult {
    regs.update_fp_summary();
    if rc {
        regs.update_cr1();
    }
    Ok(())
}

/// mtfsb0 - Move To FPSCR Bit 0
pub fn mtfsb0(regs: &mut RegisterFile, x: XForm) -> ExecResult {
    regs.fpscr &= !(0x8000_0000u32 >> x.rt);
    finish_fpscr_write(regs, x.rc)
}

/// mtfsb1 - Move To FPSCR Bit 1
pub fn mtfsb1(regs: &mut RegisterFile, x: XForm) -> ExecResult {
    let bit = 0x8000_0000u32 >> x.rt;
    if bit & Fpscr::ANY_X.bits() != 0 {
        regs.set_fp_exception(Fpscr::from_bits_retain(bit));
    } else {
        regs.fpscr |= bit;
    }
    finish_fpscr_write(regs, x.rc)
}

/// mtfsfi - Move To FPSCR Field Immediate
pub fn mtfsfi(regs: &mut RegisterFile, x: XForm) -> ExecResult {
    let shift = 28 - 4 * x.crfd() as u32;
    let imm = (x.rb >> 1) as u32 & 0xF;
    regs.fpscr = (regs.fpscr & !(0xF << shift)) | (imm << shift);
    finish_fpscr_write(regs, x.rc)
}

/// mtfsf - Move To FPSCR Fields
pub fn mtfsf(regs: &mut RegisterFile, xfl: XflForm) -> ExecResult {
    let mask = (0..8)
        .filter(|i| xfl.fm & (0x80 >> i) != 0)
        .fold(0u32, |mask, i| mask | (0xF << (4 * (7 - i))));
    let value = regs.fpr(xfl.frb).ps0 as u32;
    regs.fpscr = (regs.fpscr & !mask) | (value & mask);
    finish_fpscr_write(regs, xfl.rc)
}

/// mcrfs - Move to Condition Register from FPSCR
pub fn mcrfs(regs: &mut RegisterFile, x: XForm) -> ExecResult {
    let shift = 4 * (7 - x.crfs() as u32);
    let field = (regs.fpscr >> shift) & 0xF;
    let sticky = Fpscr::FX.bits() | Fpscr::ANY_X.bits();
    regs.fpscr &= !((0xF << shift) & sticky);
    regs.update_fp_summary();
    regs.set_cr_field(x.crfd(), field);
    Ok(())
}

// ===== Loads =====

fn load_single(regs: &mut RegisterFile, mem: &MemoryView, frt: u8, ea: u32) -> ExecResult {
    check_word_aligned(ea)?;
    let value = convert_to_double(mem.read::<u32>(ea)?);
    let fpr = regs.fpr_mut(frt);
    fpr.ps0 = value;
    fpr.ps1 = value;
    Ok(())
}

fn load_double(regs: &mut RegisterFile, mem: &MemoryView, frt: u8, ea: u32) -> ExecResult {
    check_word_aligned(ea)?;
    regs.fpr_mut(frt).ps0 = mem.read::<u64>(ea)?;
    Ok(())
}

fn store_single(regs: &RegisterFile, mem: &mut MemoryView, frs: u8, ea: u32) -> ExecResult {
    check_word_aligned(ea)?;
    mem.write::<u32>(ea, convert_to_single(regs.fpr(frs).ps0))?;
    Ok(())
}

fn store_double(regs: &RegisterFile, mem: &mut MemoryView, frs: u8, ea: u32) -> ExecResult {
    check_word_aligned(ea)?;
    mem.write::<u64>(ea, regs.fpr(frs).ps0)?;
    Ok(())
}

/// EA for an update-form float access; rA=0 is invalid
fn ea_du(name: &str, regs: &RegisterFile, d: DForm) -> Result<u32, PpcError> {
    check_update(name, d.ra)?;
    Ok(regs.gpr(d.ra).wrapping_add(d.d as i32 as u32))
}

fn ea_xu(name: &str, regs: &RegisterFile, x: XForm) -> Result<u32, PpcError> {
    check_update(name, x.ra)?;
    Ok(regs.gpr(x.ra).wrapping_add(regs.gpr(x.rb)))
}

/// lfs - Load Floating-Point Single
pub fn lfs(regs: &mut RegisterFile, mem: &MemoryView, d: DForm) -> ExecResult {
    let ea = ea_d(regs, d.ra, d.d);
    load_single(regs, mem, d.rt, ea)
}

/// lfsu - Load Floating-Point Single with Update
pub fn lfsu(regs: &mut RegisterFile, mem: &MemoryView, d: DForm) -> ExecResult {
    let ea = ea_du("lfsu", regs, d)?;
    load_single(regs, mem, d.rt, ea)?;
    regs.set_gpr(d.ra, ea);
    Ok(())
}

/// lfsx - Load Floating-Point Single Indexed
pub fn lfsx(regs: &mut RegisterFile, mem: &MemoryView, x: XForm) -> ExecResult {
    let ea = ea_x(regs, x.ra, x.rb);
    load_single(regs, mem, x.rt, ea)
}

/// lfsux - Load Floating-Point Single with Update Indexed
pub fn lfsux(regs: &mut RegisterFile, mem: &MemoryView, x: XForm) -> ExecResult {
    let ea = ea_xu("lfsux", regs, x)?;
    load_single(regs, mem, x.rt, ea)?;
    regs.set_gpr(x.ra, ea);
    Ok(())
}

/// lfd - Load Floating-Point Double
pub fn lfd(regs: &mut RegisterFile, mem: &MemoryView, d: DForm) -> ExecResult {
    let ea = ea_d(regs, d.ra, d.d);
    load_double(regs, mem, d.rt, ea)
}

/// lfdu - Load Floating-Point Double with Update
pub fn lfdu(regs: &mut RegisterFile, mem: &MemoryView, d: DForm) -> ExecResult {
    let ea = ea_du("lfdu", regs, d)?;
    load_double(regs, mem, d.rt, ea)?;
    regs.set_gpr(d.ra, ea);
    Ok(())
}

/// lfdx - Load Floating-Point Double Indexed
pub fn lfdx(regs: &mut RegisterFile, mem: &MemoryView, x: XForm) -> ExecResult {
    let ea = ea_x(regs, x.ra, x.rb);
    load_double(regs, mem, x.rt, ea)
}

/// lfdux - Load Floating-Point Double with Update Indexed
pub fn lfdux(regs: &mut RegisterFile, mem: &MemoryView, x: XForm) -> ExecResult {
    let ea = ea_xu("lfdux", regs, x)?;
    load_double(regs, mem, x.rt, ea)?;
    regs.set_gpr(x.ra, ea);
    Ok(())
}

// ===== Stores =====

/// stfs - Store Floating-Point Single
pub fn stfs(regs: &mut RegisterFile, mem: &mut MemoryView, d: DForm) -> ExecResult {
    let ea = ea_d(regs, d.ra, d.d);
    store_single(regs, mem, d.rt, ea)
}

/// stfsu - Store Floating-Point Single with Update
pub fn stfsu(regs: &mut RegisterFile, mem: &mut MemoryView, d: DForm) -> ExecResult {
    let ea = ea_du("stfsu", regs, d)?;
    store_single(regs, mem, d.rt, ea)?;
    regs.set_gpr(d.ra, ea);
    Ok(())
}

/// stfsx - Store Floating-Point Single Indexed
pub fn stfsx(regs: &mut RegisterFile, mem: &mut MemoryView, x: XForm) -> ExecResult {
    let ea = ea_x(regs, x.ra, x.rb);
    store_single(regs, mem, x.rt, ea)
}

/// stfsux - Store Floating-Point Single with Update Indexed
pub fn stfsux(regs: &mut RegisterFile, mem: &mut MemoryView, x: XForm) -> ExecResult {
    let ea = ea_xu("stfsux", regs, x)?;
    store_single(regs, mem, x.rt, ea)?;
    regs.set_gpr(x.ra, ea);
    Ok(())
}

/// stfd - Store Floating-Point Double
pub fn stfd(regs: &mut RegisterFile, mem: &mut MemoryView, d: DForm) -> ExecResult {
    let ea = ea_d(regs, d.ra, d.d);
    store_double(regs, mem, d.rt, ea)
}

/// stfdu - Store Floating-Point Double with Update
pub fn stfdu(regs: &mut RegisterFile, mem: &mut MemoryView, d: DForm) -> ExecResult {
    let ea = ea_du("stfdu", regs, d)?;
    store_double(regs, mem, d.rt, ea)?;
    regs.set_gpr(d.ra, ea);
    Ok(())
}

/// stfdx - Store Floating-Point Double Indexed
pub fn stfdx(regs: &mut RegisterFile, mem: &mut MemoryView, x: XForm) -> ExecResult {
    let ea = ea_x(regs, x.ra, x.rb);
    store_double(regs, mem, x.rt, ea)
}

/// stfdux - Store Floating-Point Double with Update Indexed
pub fn stfdux(regs: &mut RegisterFile, mem: &mut MemoryView, x: XForm) -> ExecResult {
    let ea = ea_xu("stfdux", regs, x)?;
    store_double(regs, mem, x.rt, ea)?;
    regs.set_gpr(x.ra, ea);
    Ok(())
}

/// stfiwx - Store Floating-Point as Integer Word Indexed
pub fn stfiwx(regs: &mut RegisterFile, mem: &mut MemoryView, x: XForm) -> ExecResult {
    let ea = ea_x(regs, x.ra, x.rb);
    check_word_aligned(ea)?;
    mem.write::<u32>(ea, regs.fpr(x.rt).ps0 as u32)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fp::{class, fpcc};
    use crate::instructions::test_support::create_test_env;
    use ge_core::error::ExceptionCause;

    fn a(frt: u8, fra: u8, frb: u8, frc: u8, rc: bool) -> AForm {
        AForm { opcd: 63, frt, fra, frb, frc, xo: 0, rc }
    }

    fn x(rt: u8, ra: u8, rb: u8, rc: bool) -> XForm {
        XForm { opcd: 63, rt, ra, rb, xo: 0, rc }
    }

    fn fprf(regs: &RegisterFile) -> u32 {
        (regs.fpscr >> 12) & 0x1F
    }

    // ===== Arithmetic Tests =====

    #[test]
    fn test_fadd_double_keeps_ps1() {
        let (mut regs, _) = create_test_env();
        regs.fpr[1].set_ps0(1.5);
        regs.fpr[2].set_ps0(2.25);
        regs.fpr[3].set_ps1(9.0);
        fadd(&mut regs, a(3, 1, 2, 0, false)).unwrap();
        assert_eq!(regs.fpr[3].ps0(), 3.75);
        assert_eq!(regs.fpr[3].ps1(), 9.0);
        assert_eq!(fprf(&regs), class::POS_NORMAL);
    }

    #[test]
    fn test_single_ops_round_and_fill_both_lanes() {
        let (mut regs, _) = create_test_env();
        regs.fpr[1].set_ps0(1.0);
        regs.fpr[2].set_ps0(3.0);
        fdivs(&mut regs, a(3, 1, 2, 0, false)).unwrap();
        let third = (1.0f32 / 3.0) as f64;
        assert_eq!(regs.fpr[3].ps0(), third);
        assert_eq!(regs.fpr[3].ps1(), third);
    }

    #[test]
    fn test_fmul_uses_frc() {
        let (mut regs, _) = create_test_env();
        regs.fpr[1].set_ps0(4.0);
        regs.fpr[2].set_ps0(100.0);
        regs.fpr[3].set_ps0(-0.5);
        fmul(&mut regs, a(4, 1, 2, 3, false)).unwrap();
        assert_eq!(regs.fpr[4].ps0(), -2.0);
        assert_eq!(fprf(&regs), class::NEG_NORMAL);
    }

    #[test]
    fn test_multiply_add_family() {
        let (mut regs, _) = create_test_env();
        regs.fpr[1].set_ps0(2.0);
        regs.fpr[2].set_ps0(1.0);
        regs.fpr[3].set_ps0(5.0);

        fmadd(&mut regs, a(4, 1, 2, 3, false)).unwrap();
        assert_eq!(regs.fpr[4].ps0(), 11.0);
        fmsub(&mut regs, a(4, 1, 2, 3, false)).unwrap();
        assert_eq!(regs.fpr[4].ps0(), 9.0);
        fnmadd(&mut regs, a(4, 1, 2, 3, false)).unwrap();
        assert_eq!(regs.fpr[4].ps0(), -11.0);
        fnmsub(&mut regs, a(4, 1, 2, 3, false)).unwrap();
        assert_eq!(regs.fpr[4].ps0(), -9.0);
        fmadds(&mut regs, a(4, 1, 2, 3, false)).unwrap();
        assert_eq!(regs.fpr[4].ps1(), 11.0);
    }

    #[test]
    fn test_divide_by_zero_records_cr1() {
        let (mut regs, _) = create_test_env();
        regs.fpr[1].set_ps0(1.0);
        regs.fpr[2].set_ps0(0.0);
        fdiv(&mut regs, a(3, 1, 2, 0, true)).unwrap();
        assert_eq!(regs.fpr[3].ps0(), f64::INFINITY);
        assert_eq!(fprf(&regs), class::POS_INF);
        // CR1 = FX FEX VX OX
        assert_eq!(regs.cr_field(1), regs.fpscr >> 28);
        assert_eq!(regs.cr_field(1), 0b1000);
    }

    #[test]
    fn test_fsel() {
        let (mut regs, _) = create_test_env();
        regs.fpr[2].set_ps0(10.0);
        regs.fpr[3].set_ps0(20.0);

        regs.fpr[1].set_ps0(-0.0);
        fsel(&mut regs, a(4, 1, 2, 3, false)).unwrap();
        assert_eq!(regs.fpr[4].ps0(), 20.0);

        regs.fpr[1].set_ps0(-1.0);
        fsel(&mut regs, a(4, 1, 2, 3, false)).unwrap();
        assert_eq!(regs.fpr[4].ps0(), 10.0);

        regs.fpr[1].set_ps0(f64::NAN);
        fsel(&mut regs, a(4, 1, 2, 3, false)).unwrap();
        assert_eq!(regs.fpr[4].ps0(), 10.0);
    }

    #[test]
    fn test_estimates() {
        let (mut regs, _) = create_test_env();
        regs.fpr[1].set_ps0(4.0);
        fres(&mut regs, a(2, 0, 1, 0, false)).unwrap();
        assert_eq!(regs.fpr[2].ps0(), 0.25);
        assert_eq!(regs.fpr[2].ps1(), 0.25);

        frsqrte(&mut regs, a(2, 0, 1, 0, false)).unwrap();
        assert_eq!(regs.fpr[2].ps0(), 0.5);

        regs.fpr[1].set_ps0(-4.0);
        frsqrte(&mut regs, a(2, 0, 1, 0, false)).unwrap();
        assert!(regs.fpr[2].ps0().is_nan());
        assert!(regs.fpscr_flags().contains(Fpscr::VXSQRT | Fpscr::VX));
    }

    // ===== Move Tests =====

    #[test]
    fn test_sign_moves_preserve_nan_payload() {
        let (mut regs, _) = create_test_env();
        regs.fpr[1].ps0 = 0x7FF0_0000_0000_0001;
        fneg(&mut regs, x(2, 0, 1, false)).unwrap();
        assert_eq!(regs.fpr[2].ps0, 0xFFF0_0000_0000_0001);
        fabs(&mut regs, x(3, 0, 2, false)).unwrap();
        assert_eq!(regs.fpr[3].ps0, 0x7FF0_0000_0000_0001);
        fnabs(&mut regs, x(4, 0, 3, false)).unwrap();
        assert_eq!(regs.fpr[4].ps0, 0xFFF0_0000_0000_0001);
        fmr(&mut regs, x(5, 0, 1, false)).unwrap();
        assert_eq!(regs.fpr[5].ps0, regs.fpr[1].ps0);
        assert_eq!(regs.fpscr, 0, "moves raise nothing");
    }

    // ===== Conversion Tests =====

    #[test]
    fn test_frsp() {
        let (mut regs, _) = create_test_env();
        regs.fpr[1].set_ps0(0.1);
        frsp(&mut regs, x(2, 0, 1, false)).unwrap();
        assert_eq!(regs.fpr[2].ps0(), 0.1f32 as f64);
        assert_eq!(regs.fpr[2].ps1(), 0.1f32 as f64);
    }

    #[test]
    fn test_fctiw_rounding_modes() {
        let (mut regs, _) = create_test_env();
        regs.fpr[1].set_ps0(2.5);

        fctiw(&mut regs, x(2, 0, 1, false)).unwrap();
        assert_eq!(regs.fpr[2].ps0, 0xFFF8_0000_0000_0002, "ties to even");

        regs.fpscr = 2; // toward +inf
        fctiw(&mut regs, x(2, 0, 1, false)).unwrap();
        assert_eq!(regs.fpr[2].ps0 as u32, 3);

        regs.fpscr = 3; // toward -inf
        regs.fpr[1].set_ps0(-2.5);
        fctiw(&mut regs, x(2, 0, 1, false)).unwrap();
        assert_eq!(regs.fpr[2].ps0 as u32 as i32, -3);

        fctiwz(&mut regs, x(2, 0, 1, false)).unwrap();
        assert_eq!(regs.fpr[2].ps0 as u32 as i32, -2);
        assert!(regs.fpscr_flags().contains(Fpscr::XX | Fpscr::FI));
    }

    #[test]
    fn test_fctiw_saturates() {
        let (mut regs, _) = create_test_env();
        regs.fpr[1].set_ps0(3.0e10);
        fctiwz(&mut regs, x(2, 0, 1, false)).unwrap();
        assert_eq!(regs.fpr[2].ps0 as u32, 0x7FFF_FFFF);
        assert!(regs.fpscr_flags().contains(Fpscr::VXCVI));

        regs.fpr[1].set_ps0(-3.0e10);
        fctiwz(&mut regs, x(2, 0, 1, false)).unwrap();
        assert_eq!(regs.fpr[2].ps0 as u32, 0x8000_0000);

        regs.fpr[1].set_ps0(f64::NAN);
        fctiwz(&mut regs, x(2, 0, 1, false)).unwrap();
        assert_eq!(regs.fpr[2].ps0, 0xFFF8_0000_8000_0000);
    }

    // ===== Compare Tests =====

    #[test]
    fn test_fcmpu() {
        let (mut regs, _) = create_test_env();
        regs.fpr[1].set_ps0(1.0);
        regs.fpr[2].set_ps0(2.0);
        fcmpu(&mut regs, x(3 << 2, 1, 2, false)).unwrap();
        assert_eq!(regs.cr_field(3), fpcc::FL);
        assert_eq!((regs.fpscr >> 12) & 0xF, fpcc::FL);

        regs.fpr[2].set_ps0(f64::NAN);
        fcmpu(&mut regs, x(0, 1, 2, false)).unwrap();
        assert_eq!(regs.cr_field(0), fpcc::FU);
        assert!(!regs.fpscr_flags().contains(Fpscr::VXVC));
    }

    #[test]
    fn test_fcmpo_qnan_sets_vxvc() {
        let (mut regs, _) = create_test_env();
        regs.fpr[1].set_ps0(f64::NAN);
        regs.fpr[2].set_ps0(0.0);
        fcmpo(&mut regs, x(0, 1, 2, false)).unwrap();
        assert_eq!(regs.cr_field(0), fpcc::FU);
        assert!(regs.fpscr_flags().contains(Fpscr::VXVC | Fpscr::VX | Fpscr::FX));
    }

    // ===== FPSCR Tests =====

    #[test]
    fn test_mffs_mtfsf_round_trip() {
        let (mut regs, _) = create_test_env();
        regs.fpscr = 0x0000_00F3;
        mffs(&mut regs, x(1, 0, 0, false)).unwrap();
        assert_eq!(regs.fpr[1].ps0, 0xFFF8_0000_0000_00F3);

        regs.fpscr = 0;
        mtfsf(&mut regs, XflForm { opcd: 63, fm: 0x01, frb: 1, xo: 711, rc: false }).unwrap();
        assert_eq!(regs.fpscr, 0x3, "only field 7 was selected");

        mtfsf(&mut regs, XflForm { opcd: 63, fm: 0xFF, frb: 1, xo: 711, rc: false }).unwrap();
        assert_eq!(regs.fpscr, 0xF3);
    }

    #[test]
    fn test_mtfsb_and_mtfsfi() {
        let (mut regs, _) = create_test_env();
        // mtfsb1 30 sets RN bit 1 (toward +inf)
        mtfsb1(&mut regs, x(30, 0, 0, false)).unwrap();
        assert_eq!(regs.rounding_mode(), 2);
        mtfsb0(&mut regs, x(30, 0, 0, false)).unwrap();
        assert_eq!(regs.rounding_mode(), 0);

        // mtfsb1 on an exception bit raises it with FX
        mtfsb1(&mut regs, x(5, 0, 0, false)).unwrap();
        assert!(regs.fpscr_flags().contains(Fpscr::ZX | Fpscr::FX));

        // mtfsfi 7, 3
        mtfsfi(&mut regs, x(7 << 2, 0, 3 << 1, false)).unwrap();
        assert_eq!(regs.rounding_mode(), 3);
    }

    #[test]
    fn test_mcrfs_clears_read_exceptions() {
        let (mut regs, _) = create_test_env();
        regs.set_fp_exception(Fpscr::ZX);
        // Field 1 holds UX ZX XX VXSNAN
        mcrfs(&mut regs, x(2 << 2, 1 << 2, 0, false)).unwrap();
        assert_eq!(regs.cr_field(2), 0b0100);
        assert!(!regs.fpscr_flags().contains(Fpscr::ZX));
        assert!(regs.fpscr_flags().contains(Fpscr::FX), "FX lives in field 0");
    }

    // ===== Load/Store Tests =====

    #[test]
    fn test_lfs_fills_both_lanes() {
        let (mut regs, mut mem) = create_test_env();
        mem.write::<u32>(0x8000_0100, 1.5f32.to_bits()).unwrap();
        regs.gpr[3] = 0x8000_0100;
        lfs(&mut regs, &mem, DForm { opcd: 48, rt: 1, ra: 3, d: 0 }).unwrap();
        assert_eq!(regs.fpr[1].ps0(), 1.5);
        assert_eq!(regs.fpr[1].ps1(), 1.5);
    }

    #[test]
    fn test_double_store_load() {
        let (mut regs, mut mem) = create_test_env();
        regs.gpr[1] = 0x8000_0200;
        regs.fpr[4].set_ps0(core::f64::consts::PI);
        stfdu(&mut regs, &mut mem, DForm { opcd: 55, rt: 4, ra: 1, d: -8 }).unwrap();
        assert_eq!(regs.gpr[1], 0x8000_01F8);

        lfdx(&mut regs, &mem, x(5, 0, 1, false)).unwrap();
        assert_eq!(regs.fpr[5].ps0(), core::f64::consts::PI);
    }

    #[test]
    fn test_stfs_and_stfiwx() {
        let (mut regs, mut mem) = create_test_env();
        regs.gpr[3] = 0x8000_0300;
        regs.fpr[1].set_ps0(-2.0);
        stfs(&mut regs, &mut mem, DForm { opcd: 52, rt: 1, ra: 3, d: 0 }).unwrap();
        assert_eq!(mem.read::<u32>(0x8000_0300).unwrap(), (-2.0f32).to_bits());

        regs.fpr[1].ps0 = 0xFFF8_0000_1234_5678;
        regs.gpr[4] = 4;
        stfiwx(&mut regs, &mut mem, x(1, 3, 4, false)).unwrap();
        assert_eq!(mem.read::<u32>(0x8000_0304).unwrap(), 0x1234_5678);
    }

    #[test]
    fn test_float_access_checks() {
        let (mut regs, mut mem) = create_test_env();
        assert!(matches!(
            lfsu(&mut regs, &mem, DForm { opcd: 49, rt: 1, ra: 0, d: 0 }),
            Err(PpcError::Invalid(_))
        ));
        regs.gpr[3] = 0x8000_0102;
        assert_eq!(
            lfd(&mut regs, &mem, DForm { opcd: 50, rt: 1, ra: 3, d: 0 }),
            Err(PpcError::fault(ExceptionCause::Alignment, 0x8000_0102))
        );
        assert_eq!(
            stfsux(&mut regs, &mut mem, x(1, 3, 0, false)),
            Err(PpcError::fault(ExceptionCause::Alignment, 0x8000_0102))
        );
        assert_eq!(regs.gpr[3], 0x8000_0102, "rA untouched after a fault");
    }
}
