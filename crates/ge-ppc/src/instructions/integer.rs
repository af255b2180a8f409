//! Fixed-point unit: arithmetic, logic, rotates, shifts, compares, traps and
//! condition/special register moves

use ge_core::error::{ExceptionCause, PpcError};

use super::ExecResult;
use crate::decoder::{DForm, MForm, XForm, XfxForm, XoForm};
use crate::registers::{spr, RegisterFile, XerFlags};

/// Build the rotate mask with ones from bit `mb` through bit `me` (bit 0 is the MSB)
///
/// When `me < mb` the mask wraps around: ones everywhere except bits `me+1 ..= mb-1`.
#[inline]
pub const fn make_rotation_mask(mb: u32, me: u32) -> u32 {
    let begin = 0xFFFF_FFFFu32 >> mb;
    let end = 0x7FFF_FFFFu32 >> me;
    let mask = begin ^ end;
    if me < mb {
        !mask
    } else {
        mask
    }
}

/// `a + b + carry_in`, returning the result and the unsigned carry out
#[inline]
fn add_with_carry(a: u32, b: u32, carry_in: bool) -> (u32, bool) {
    let sum = a as u64 + b as u64 + carry_in as u64;
    (sum as u32, sum > u32::MAX as u64)
}

/// Signed overflow of an addition whose operands were `a` and `b`
#[inline]
fn add_overflowed(a: u32, b: u32, result: u32) -> bool {
    ((a ^ result) & (b ^ result)) & 0x8000_0000 != 0
}

/// Write an XO-form result with its optional OV and CR0 side effects
#[inline]
fn finish_xo(regs: &mut RegisterFile, xo: XoForm, result: u32, overflow: bool) {
    regs.set_gpr(xo.rt, result);
    if xo.oe {
        regs.set_xer_ov(overflow);
    }
    if xo.rc {
        regs.update_cr0(result);
    }
}

/// Shared body of the add/subtract family
#[inline]
fn add_family(regs: &mut RegisterFile, xo: XoForm, a: u32, b: u32, carry_in: bool, sets_carry: bool) -> ExecResult {
    let (result, carry) = add_with_carry(a, b, carry_in);
    if sets_carry {
        regs.set_xer_ca(carry);
    }
    finish_xo(regs, xo, result, add_overflowed(a, b, result));
    Ok(())
}

#[inline]
fn finish_logic(regs: &mut RegisterFile, ra: u8, rc: bool, result: u32) -> ExecResult {
    regs.set_gpr(ra, result);
    if rc {
        regs.update_cr0(result);
    }
    Ok(())
}

// ===== Immediate arithmetic =====

/// addi - Add Immediate
pub fn addi(regs: &mut RegisterFile, d: DForm) -> ExecResult {
    let value = regs.gpr_or_zero(d.ra).wrapping_add(d.d as i32 as u32);
    regs.set_gpr(d.rt, value);
    Ok(())
}

/// addis - Add Immediate Shifted
pub fn addis(regs: &mut RegisterFile, d: DForm) -> ExecResult {
    let value = regs.gpr_or_zero(d.ra).wrapping_add((d.d as i32 as u32) << 16);
    regs.set_gpr(d.rt, value);
    Ok(())
}

/// addic / addic. - Add Immediate Carrying (and Record)
pub fn addic(regs: &mut RegisterFile, d: DForm, record: bool) -> ExecResult {
    let (result, carry) = add_with_carry(regs.gpr(d.ra), d.d as i32 as u32, false);
    regs.set_gpr(d.rt, result);
    regs.set_xer_ca(carry);
    if record {
        regs.update_cr0(result);
    }
    Ok(())
}

/// subfic - Subtract From Immediate Carrying
pub fn subfic(regs: &mut RegisterFile, d: DForm) -> ExecResult {
    let (result, carry) = add_with_carry(!regs.gpr(d.ra), d.d as i32 as u32, true);
    regs.set_gpr(d.rt, result);
    regs.set_xer_ca(carry);
    Ok(())
}

/// mulli - Multiply Low Immediate
pub fn mulli(regs: &mut RegisterFile, d: DForm) -> ExecResult {
    let value = (regs.gpr(d.ra) as i32).wrapping_mul(d.d as i32);
    regs.set_gpr(d.rt, value as u32);
    Ok(())
}

// ===== Immediate logic =====

/// ori - OR Immediate
pub fn ori(regs: &mut RegisterFile, d: DForm) -> ExecResult {
    let value = regs.gpr(d.rt) | d.uimm() as u32;
    finish_logic(regs, d.ra, false, value)
}

/// oris - OR Immediate Shifted
pub fn oris(regs: &mut RegisterFile, d: DForm) -> ExecResult {
    let value = regs.gpr(d.rt) | ((d.uimm() as u32) << 16);
    finish_logic(regs, d.ra, false, value)
}

/// xori - XOR Immediate
pub fn xori(regs: &mut RegisterFile, d: DForm) -> ExecResult {
    let value = regs.gpr(d.rt) ^ d.uimm() as u32;
    finish_logic(regs, d.ra, false, value)
}

/// xoris - XOR Immediate Shifted
pub fn xoris(regs: &mut RegisterFile, d: DForm) -> ExecResult {
    let value = regs.gpr(d.rt) ^ ((d.uimm() as u32) << 16);
    finish_logic(regs, d.ra, false, value)
}

/// andi. - AND Immediate (always records)
pub fn andi_rc(regs: &mut RegisterFile, d: DForm) -> ExecResult {
    let value = regs.gpr(d.rt) & d.uimm() as u32;
    finish_logic(regs, d.ra, true, value)
}

/// andis. - AND Immediate Shifted (always records)
pub fn andis_rc(regs: &mut RegisterFile, d: DForm) -> ExecResult {
    let value = regs.gpr(d.rt) & ((d.uimm() as u32) << 16);
    finish_logic(regs, d.ra, true, value)
}

// ===== Compares =====

fn reject_64bit_compare(name: &str, l: bool) -> ExecResult {
    if l {
        return Err(PpcError::invalid(format!("{name} with L=1 (64-bit compare)")));
    }
    Ok(())
}

/// cmpi - Compare Immediate
pub fn cmpi(regs: &mut RegisterFile, d: DForm) -> ExecResult {
    reject_64bit_compare("cmpi", d.l())?;
    regs.compare(d.crfd(), regs.gpr(d.ra) as i32, d.d as i32);
    Ok(())
}

/// cmpli - Compare Logical Immediate
pub fn cmpli(regs: &mut RegisterFile, d: DForm) -> ExecResult {
    reject_64bit_compare("cmpli", d.l())?;
    regs.compare(d.crfd(), regs.gpr(d.ra), d.uimm() as u32);
    Ok(())
}

/// cmp - Compare
pub fn cmp(regs: &mut RegisterFile, x: XForm) -> ExecResult {
    reject_64bit_compare("cmp", x.l())?;
    regs.compare(x.crfd(), regs.gpr(x.ra) as i32, regs.gpr(x.rb) as i32);
    Ok(())
}

/// cmpl - Compare Logical
pub fn cmpl(regs: &mut RegisterFile, x: XForm) -> ExecResult {
    reject_64bit_compare("cmpl", x.l())?;
    regs.compare(x.crfd(), regs.gpr(x.ra), regs.gpr(x.rb));
    Ok(())
}

// ===== Traps =====

/// Evaluate a TO field against two operands
fn trap_condition(to: u8, a: u32, b: u32) -> bool {
    let (sa, sb) = (a as i32, b as i32);
    (to & 0x10 != 0 && sa < sb)
        || (to & 0x08 != 0 && sa > sb)
        || (to & 0x04 != 0 && a == b)
        || (to & 0x02 != 0 && a < b)
        || (to & 0x01 != 0 && a > b)
}

fn trap(regs: &RegisterFile, to: u8, a: u32, b: u32) -> ExecResult {
    if trap_condition(to, a, b) {
        return Err(PpcError::fault(ExceptionCause::Program, regs.pc));
    }
    Ok(())
}

/// twi - Trap Word Immediate
pub fn twi(regs: &mut RegisterFile, d: DForm) -> ExecResult {
    trap(regs, d.rt, regs.gpr(d.ra), d.d as i32 as u32)
}

/// tw - Trap Word
pub fn tw(regs: &mut RegisterFile, x: XForm) -> ExecResult {
    trap(regs, x.rt, regs.gpr(x.ra), regs.gpr(x.rb))
}

// ===== XO-form arithmetic =====

/// add - Add
pub fn add(regs: &mut RegisterFile, xo: XoForm) -> ExecResult {
    let a = regs.gpr(xo.ra);
    let b = regs.gpr(xo.rb);
    add_family(regs, xo, a, b, false, false)
}

/// addc - Add Carrying
pub fn addc(regs: &mut RegisterFile, xo: XoForm) -> ExecResult {
    let a = regs.gpr(xo.ra);
    let b = regs.gpr(xo.rb);
    add_family(regs, xo, a, b, false, true)
}

/// adde - Add Extended
pub fn adde(regs: &mut RegisterFile, xo: XoForm) -> ExecResult {
    let a = regs.gpr(xo.ra);
    let b = regs.gpr(xo.rb);
    let carry = regs.xer_ca();
    add_family(regs, xo, a, b, carry, true)
}

/// addme - Add to Minus One Extended
pub fn addme(regs: &mut RegisterFile, xo: XoForm) -> ExecResult {
    let a = regs.gpr(xo.ra);
    let carry = regs.xer_ca();
    add_family(regs, xo, a, u32::MAX, carry, true)
}

/// addze - Add to Zero Extended
pub fn addze(regs: &mut RegisterFile, xo: XoForm) -> ExecResult {
    let a = regs.gpr(xo.ra);
    let carry = regs.xer_ca();
    add_family(regs, xo, a, 0, carry, true)
}

/// subf - Subtract From
pub fn subf(regs: &mut RegisterFile, xo: XoForm) -> ExecResult {
    let a = !regs.gpr(xo.ra);
    let b = regs.gpr(xo.rb);
    add_family(regs, xo, a, b, true, false)
}

/// subfc - Subtract From Carrying
pub fn subfc(regs: &mut RegisterFile, xo: XoForm) -> ExecResult {
    let a = !regs.gpr(xo.ra);
    let b = regs.gpr(xo.rb);
    add_family(regs, xo, a, b, true, true)
}

/// subfe - Subtract From Extended
pub fn subfe(regs: &mut RegisterFile, xo: XoForm) -> ExecResult {
    let a = !regs.gpr(xo.ra);
    let b = regs.gpr(xo.rb);
    let carry = regs.xer_ca();
    add_family(regs, xo, a, b, carry, true)
}

/// subfme - Subtract From Minus One Extended
pub fn subfme(regs: &mut RegisterFile, xo: XoForm) -> ExecResult {
    let a = !regs.gpr(xo.ra);
    let carry = regs.xer_ca();
    add_family(regs, xo, a, u32::MAX, carry, true)
}

/// subfze - Subtract From Zero Extended
pub fn subfze(regs: &mut RegisterFile, xo: XoForm) -> ExecResult {
    let a = !regs.gpr(xo.ra);
    let carry = regs.xer_ca();
    add_family(regs, xo, a, 0, carry, true)
}

/// neg - Negate
pub fn neg(regs: &mut RegisterFile, xo: XoForm) -> ExecResult {
    let a = !regs.gpr(xo.ra);
    add_family(regs, xo, a, 0, true, false)
}

/// mullw - Multiply Low Word
pub fn mullw(regs: &mut RegisterFile, xo: XoForm) -> ExecResult {
    let product = regs.gpr(xo.ra) as i32 as i64 * regs.gpr(xo.rb) as i32 as i64;
    let result = product as u32;
    finish_xo(regs, xo, result, product != result as i32 as i64);
    Ok(())
}

/// mulhw - Multiply High Word
pub fn mulhw(regs: &mut RegisterFile, xo: XoForm) -> ExecResult {
    let product = regs.gpr(xo.ra) as i32 as i64 * regs.gpr(xo.rb) as i32 as i64;
    finish_xo(regs, XoForm { oe: false, ..xo }, (product >> 32) as u32, false);
    Ok(())
}

/// mulhwu - Multiply High Word Unsigned
pub fn mulhwu(regs: &mut RegisterFile, xo: XoForm) -> ExecResult {
    let product = regs.gpr(xo.ra) as u64 * regs.gpr(xo.rb) as u64;
    finish_xo(regs, XoForm { oe: false, ..xo }, (product >> 32) as u32, false);
    Ok(())
}

/// divw - Divide Word
///
/// Division by zero and `0x80000000 / -1` are undefined on hardware; the
/// Gekko leaves -1 for a negative dividend over zero and 0 otherwise.
pub fn divw(regs: &mut RegisterFile, xo: XoForm) -> ExecResult {
    let a = regs.gpr(xo.ra) as i32;
    let b = regs.gpr(xo.rb) as i32;
    if b == 0 || (a == i32::MIN && b == -1) {
        let result = if a < 0 && b == 0 { u32::MAX } else { 0 };
        finish_xo(regs, xo, result, true);
    } else {
        finish_xo(regs, xo, (a / b) as u32, false);
    }
    Ok(())
}

/// divwu - Divide Word Unsigned
pub fn divwu(regs: &mut RegisterFile, xo: XoForm) -> ExecResult {
    let a = regs.gpr(xo.ra);
    let b = regs.gpr(xo.rb);
    match a.checked_div(b) {
        Some(q) => finish_xo(regs, xo, q, false),
        None => finish_xo(regs, xo, 0, true),
    }
    Ok(())
}

// ===== Register logic =====

macro_rules! logic_op {
    ($(#[$doc:meta])* $name:ident, |$a:ident, $b:ident| $body:expr) => {
        $(#[$doc])*
        pub fn $name(regs: &mut RegisterFile, x: XForm) -> ExecResult {
            let $a = regs.gpr(x.rt);
            let $b = regs.gpr(x.rb);
            finish_logic(regs, x.ra, x.rc, $body)
        }
    };
}

logic_op!(
    /// and - AND
    and, |a, b| a & b
);
logic_op!(
    /// andc - AND with Complement
    andc, |a, b| a & !b
);
logic_op!(
    /// or - OR
    or, |a, b| a | b
);
logic_op!(
    /// orc - OR with Complement
    orc, |a, b| a | !b
);
logic_op!(
    /// xor - XOR
    xor, |a, b| a ^ b
);
logic_op!(
    /// nand - NAND
    nand, |a, b| !(a & b)
);
logic_op!(
    /// nor - NOR
    nor, |a, b| !(a | b)
);
logic_op!(
    /// eqv - Equivalent
    eqv, |a, b| !(a ^ b)
);

/// cntlzw - Count Leading Zeros Word
pub fn cntlzw(regs: &mut RegisterFile, x: XForm) -> ExecResult {
    let value = regs.gpr(x.rt).leading_zeros();
    finish_logic(regs, x.ra, x.rc, value)
}

/// extsb - Extend Sign Byte
pub fn extsb(regs: &mut RegisterFile, x: XForm) -> ExecResult {
    let value = regs.gpr(x.rt) as i8 as i32 as u32;
    finish_logic(regs, x.ra, x.rc, value)
}

/// extsh - Extend Sign Halfword
pub fn extsh(regs: &mut RegisterFile, x: XForm) -> ExecResult {
    let value = regs.gpr(x.rt) as i16 as i32 as u32;
    finish_logic(regs, x.ra, x.rc, value)
}

// ===== Shifts =====

/// slw - Shift Left Word
pub fn slw(regs: &mut RegisterFile, x: XForm) -> ExecResult {
    let n = regs.gpr(x.rb) & 0x3F;
    let result = if n > 31 { 0 } else { regs.gpr(x.rt) << n };
    finish_logic(regs, x.ra, x.rc, result)
}

/// srw - Shift Right Word
pub fn srw(regs: &mut RegisterFile, x: XForm) -> ExecResult {
    let n = regs.gpr(x.rb) & 0x3F;
    let result = if n > 31 { 0 } else { regs.gpr(x.rt) >> n };
    finish_logic(regs, x.ra, x.rc, result)
}

/// Arithmetic shift right; CA is set when a negative value lost any one bits
fn shift_right_algebraic(regs: &mut RegisterFile, x: XForm, n: u32) -> ExecResult {
    let value = regs.gpr(x.rt);
    let negative = value & 0x8000_0000 != 0;
    let (result, carry) = if n > 31 {
        (if negative { u32::MAX } else { 0 }, negative)
    } else {
        let lost = value & ((1u32 << n) - 1);
        (((value as i32) >> n) as u32, negative && lost != 0)
    };
    regs.set_xer_ca(carry);
    finish_logic(regs, x.ra, x.rc, result)
}

/// sraw - Shift Right Algebraic Word
pub fn sraw(regs: &mut RegisterFile, x: XForm) -> ExecResult {
    let n = regs.gpr(x.rb) & 0x3F;
    shift_right_algebraic(regs, x, n)
}

/// srawi - Shift Right Algebraic Word Immediate
pub fn srawi(regs: &mut RegisterFile, x: XForm) -> ExecResult {
    shift_right_algebraic(regs, x, x.rb as u32)
}

// ===== Rotates =====

/// rlwinm - Rotate Left Word Immediate then AND with Mask
pub fn rlwinm(regs: &mut RegisterFile, m: MForm) -> ExecResult {
    let mask = make_rotation_mask(m.mb as u32, m.me as u32);
    let result = regs.gpr(m.rs).rotate_left(m.rb as u32) & mask;
    finish_logic(regs, m.ra, m.rc, result)
}

/// rlwnm - Rotate Left Word then AND with Mask
pub fn rlwnm(regs: &mut RegisterFile, m: MForm) -> ExecResult {
    let mask = make_rotation_mask(m.mb as u32, m.me as u32);
    let result = regs.gpr(m.rs).rotate_left(regs.gpr(m.rb) & 0x1F) & mask;
    finish_logic(regs, m.ra, m.rc, result)
}

/// rlwimi - Rotate Left Word Immediate then Mask Insert
pub fn rlwimi(regs: &mut RegisterFile, m: MForm) -> ExecResult {
    let mask = make_rotation_mask(m.mb as u32, m.me as u32);
    let rotated = regs.gpr(m.rs).rotate_left(m.rb as u32);
    let result = (rotated & mask) | (regs.gpr(m.ra) & !mask);
    finish_logic(regs, m.ra, m.rc, result)
}

// ===== Condition register and SPR moves =====

/// mfcr - Move From Condition Register
pub fn mfcr(regs: &mut RegisterFile, x: XForm) -> ExecResult {
    regs.set_gpr(x.rt, regs.cr);
    Ok(())
}

/// mtcrf - Move To Condition Register Fields
pub fn mtcrf(regs: &mut RegisterFile, xfx: XfxForm) -> ExecResult {
    let crm = xfx.crm();
    let mask = (0..8)
        .filter(|i| crm & (0x80 >> i) != 0)
        .fold(0u32, |mask, i| mask | (0xF << (28 - 4 * i)));
    regs.cr = (regs.cr & !mask) | (regs.gpr(xfx.rt) & mask);
    Ok(())
}

/// mcrxr - Move to Condition Register from XER
pub fn mcrxr(regs: &mut RegisterFile, x: XForm) -> ExecResult {
    regs.set_cr_field(x.crfd(), regs.xer >> 28);
    regs.xer &= !(XerFlags::all().bits() | 0x1000_0000);
    Ok(())
}

/// mfspr - Move From Special Purpose Register
pub fn mfspr(regs: &mut RegisterFile, xfx: XfxForm) -> ExecResult {
    regs.set_gpr(xfx.rt, regs.spr(xfx.spr()));
    Ok(())
}

/// mtspr - Move To Special Purpose Register
pub fn mtspr(regs: &mut RegisterFile, xfx: XfxForm) -> ExecResult {
    let n = xfx.spr();
    let value = regs.gpr(xfx.rt);
    if n == spr::XER {
        // Bits 3..24 of XER are reserved and read as zero
        regs.xer = value & 0xE000_007F;
    } else {
        regs.set_spr(n, value);
    }
    Ok(())
}

/// mftb - Move From Time Base
pub fn mftb(regs: &mut RegisterFile, xfx: XfxForm) -> ExecResult {
    let value = match xfx.spr() {
        spr::TBL_READ => regs.tb as u32,
        spr::TBU_READ => (regs.tb >> 32) as u32,
        n => return Err(PpcError::invalid(format!("mftb from TBR {n}"))),
    };
    regs.set_gpr(xfx.rt, value);
    Ok(())
}
