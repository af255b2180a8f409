//! Floating-point helpers shared by the scalar and paired-single units
//!
//! Arithmetic is done in host doubles with the host rounding mode. The helpers
//! here add what the host does not give us: FPSCR exception tracking, result
//! classification and the exact single/double storage conversions the Gekko
//! load/store path performs.

use crate::registers::{Fpscr, RegisterFile};

/// Quiet NaN produced by invalid operations with no NaN input
pub const DEFAULT_NAN: u64 = 0x7FF8_0000_0000_0000;

const SIGN: u64 = 0x8000_0000_0000_0000;
const EXPONENT: u64 = 0x7FF0_0000_0000_0000;
const FRACTION: u64 = 0x000F_FFFF_FFFF_FFFF;
const QUIET_BIT: u64 = 0x0008_0000_0000_0000;

/// FPRF result classes
pub mod class {
    pub const QNAN: u32 = 0x11;
    pub const NEG_INF: u32 = 0x09;
    pub const NEG_NORMAL: u32 = 0x08;
    pub const NEG_DENORMAL: u32 = 0x18;
    pub const NEG_ZERO: u32 = 0x12;
    pub const POS_ZERO: u32 = 0x02;
    pub const POS_DENORMAL: u32 = 0x14;
    pub const POS_NORMAL: u32 = 0x04;
    pub const POS_INF: u32 = 0x05;
}

/// Floating-point compare condition codes
pub mod fpcc {
    pub const FL: u32 = 0b1000;
    pub const FG: u32 = 0b0100;
    pub const FE: u32 = 0b0010;
    pub const FU: u32 = 0b0001;
}

/// Expand a single-precision word to double bits the way `lfs` does
///
/// Unlike a host `f32 -> f64` cast this never touches the payload of NaNs and
/// never depends on the host's denormal handling.
pub fn convert_to_double(value: u32) -> u64 {
    let x = value as u64;
    let exp = (x >> 23) & 0xFF;
    let mut frac = x & 0x007F_FFFF;

    if exp > 0 && exp < 255 {
        let y = ((exp >> 7) == 0) as u64;
        let z = (y << 61) | (y << 60) | (y << 59);
        ((x & 0xC000_0000) << 32) | z | ((x & 0x3FFF_FFFF) << 29)
    } else if exp == 0 && frac != 0 {
        // Denormal: normalise into the double exponent range
        let mut exp = 1023 - 126;
        loop {
            frac <<= 1;
            exp -= 1;
            if frac & 0x0080_0000 != 0 {
                break;
            }
        }
        ((x & 0x8000_0000) << 32) | (exp << 52) | ((frac & 0x007F_FFFF) << 29)
    } else {
        // Zero, infinity or NaN
        let y = exp >> 7;
        let z = (y << 61) | (y << 60) | (y << 59);
        ((x & 0xC000_0000) << 32) | z | ((x & 0x3FFF_FFFF) << 29)
    }
}

/// Narrow double bits to a single-precision word the way `stfs` does
///
/// Values in the single denormal range are shifted into place; values too
/// small even for that keep the truncated bit pattern.
pub fn convert_to_single(x: u64) -> u32 {
    let exp = ((x >> 52) & 0x7FF) as u32;
    if exp > 896 || x & !SIGN == 0 {
        (((x >> 32) & 0xC000_0000) | ((x >> 29) & 0x3FFF_FFFF)) as u32
    } else if exp >= 874 {
        let mut t = (0x8000_0000 | ((x & FRACTION) >> 21)) as u32;
        t >>= 905 - exp;
        t |= ((x >> 32) & 0x8000_0000) as u32;
        t
    } else {
        (((x >> 32) & 0xC000_0000) | ((x >> 29) & 0x3FFF_FFFF)) as u32
    }
}

/// Round a double to single precision, keeping it in double format
#[inline]
pub fn force_single(value: f64) -> f64 {
    value as f32 as f64
}

#[inline]
pub fn is_snan(value: f64) -> bool {
    let bits = value.to_bits();
    bits & EXPONENT == EXPONENT && bits & FRACTION != 0 && bits & QUIET_BIT == 0
}

/// Set the quiet bit of a NaN
#[inline]
pub fn quiet(value: f64) -> f64 {
    f64::from_bits(value.to_bits() | QUIET_BIT)
}

/// FPRF class of a value
pub fn classify(value: f64) -> u32 {
    let bits = value.to_bits();
    let negative = bits & SIGN != 0;
    let exp = bits & EXPONENT;

    if exp != 0 && exp != EXPONENT {
        return if negative { class::NEG_NORMAL } else { class::POS_NORMAL };
    }
    if bits & FRACTION != 0 {
        if exp != 0 {
            return class::QNAN;
        }
        return if negative { class::NEG_DENORMAL } else { class::POS_DENORMAL };
    }
    match (exp != 0, negative) {
        (true, true) => class::NEG_INF,
        (true, false) => class::POS_INF,
        (false, true) => class::NEG_ZERO,
        (false, false) => class::POS_ZERO,
    }
}

/// Condition code for an ordered/unordered compare
pub fn compare_code(a: f64, b: f64) -> u32 {
    if a.is_nan() || b.is_nan() {
        fpcc::FU
    } else if a < b {
        fpcc::FL
    } else if a > b {
        fpcc::FG
    } else {
        fpcc::FE
    }
}

impl RegisterFile {
    /// Raise FPSCR exception bits; FX is set if any of them was clear
    pub fn set_fp_exception(&mut self, mask: Fpscr) {
        if mask.is_empty() {
            return;
        }
        if self.fpscr & mask.bits() != mask.bits() {
            self.fpscr |= Fpscr::FX.bits();
        }
        self.fpscr |= mask.bits();
        self.update_fp_summary();
    }

    /// Recompute the VX and FEX summary bits
    pub fn update_fp_summary(&mut self) {
        let mut fpscr = Fpscr::from_bits_retain(self.fpscr);
        fpscr.set(Fpscr::VX, fpscr.intersects(Fpscr::VX_ANY));
        // Exception bits 29..25 line up with their enables 7..3 after a shift
        let enabled = (fpscr.bits() >> 22) & fpscr.bits() & 0xF8;
        fpscr.set(Fpscr::FEX, enabled != 0);
        self.fpscr = fpscr.bits();
    }

    /// Record the class of a result in FPRF
    pub fn update_fprf(&mut self, value: f64) {
        self.fpscr = (self.fpscr & !Fpscr::FPRF.bits()) | (classify(value) << 12);
    }

    /// Record a compare result in FPCC
    pub fn set_fpcc(&mut self, code: u32) {
        self.fpscr = (self.fpscr & !Fpscr::FPCC.bits()) | ((code & 0xF) << 12);
    }

    /// Current rounding mode (FPSCR[RN])
    #[inline]
    pub fn rounding_mode(&self) -> u32 {
        self.fpscr & Fpscr::RN.bits()
    }
}

/// Resolve a NaN result: propagate the first NaN input, otherwise raise
/// `cause` and produce the default NaN
fn invalid_result(regs: &mut RegisterFile, inputs: &[f64], cause: Fpscr) -> f64 {
    if inputs.iter().any(|v| is_snan(*v)) {
        regs.set_fp_exception(Fpscr::VXSNAN);
    }
    if let Some(nan) = inputs.iter().find(|v| v.is_nan()) {
        return quiet(*nan);
    }
    regs.set_fp_exception(cause);
    f64::from_bits(DEFAULT_NAN)
}

pub fn add(regs: &mut RegisterFile, a: f64, b: f64) -> f64 {
    let result = a + b;
    if result.is_nan() {
        return invalid_result(regs, &[a, b], Fpscr::VXISI);
    }
    result
}

pub fn sub(regs: &mut RegisterFile, a: f64, b: f64) -> f64 {
    let result = a - b;
    if result.is_nan() {
        return invalid_result(regs, &[a, b], Fpscr::VXISI);
    }
    result
}

pub fn mul(regs: &mut RegisterFile, a: f64, c: f64) -> f64 {
    let result = a * c;
    if result.is_nan() {
        return invalid_result(regs, &[a, c], Fpscr::VXIMZ);
    }
    result
}

pub fn div(regs: &mut RegisterFile, a: f64, b: f64) -> f64 {
    let result = a / b;
    if result.is_nan() {
        let cause = if b == 0.0 {
            Fpscr::VXZDZ
        } else if a.is_infinite() && b.is_infinite() {
            Fpscr::VXIDI
        } else {
            Fpscr::empty()
        };
        return invalid_result(regs, &[a, b], cause);
    }
    if b == 0.0 {
        regs.set_fp_exception(Fpscr::ZX);
    }
    result
}

/// `a * c + b` with a single rounding
pub fn madd(regs: &mut RegisterFile, a: f64, c: f64, b: f64) -> f64 {
    let result = a.mul_add(c, b);
    if result.is_nan() {
        let cause = if (a * c).is_nan() { Fpscr::VXIMZ } else { Fpscr::VXISI };
        return invalid_result(regs, &[a, b, c], cause);
    }
    result
}

/// `a * c - b` with a single rounding
pub fn msub(regs: &mut RegisterFile, a: f64, c: f64, b: f64) -> f64 {
    let result = a.mul_add(c, -b);
    if result.is_nan() {
        let cause = if (a * c).is_nan() { Fpscr::VXIMZ } else { Fpscr::VXISI };
        return invalid_result(regs, &[a, b, c], cause);
    }
    result
}

/// Negate unless NaN
#[inline]
pub fn negate_result(value: f64) -> f64 {
    if value.is_nan() {
        value
    } else {
        -value
    }
}

/// Reciprocal estimate (computed exactly)
pub fn reciprocal(regs: &mut RegisterFile, b: f64) -> f64 {
    if b.is_nan() {
        return invalid_result(regs, &[b], Fpscr::empty());
    }
    if b == 0.0 {
        regs.set_fp_exception(Fpscr::ZX);
    }
    1.0 / b
}

/// Reciprocal square root estimate (computed exactly)
pub fn reciprocal_sqrt(regs: &mut RegisterFile, b: f64) -> f64 {
    if b.is_nan() {
        return invalid_result(regs, &[b], Fpscr::empty());
    }
    if b < 0.0 {
        regs.set_fp_exception(Fpscr::VXSQRT);
        return f64::from_bits(DEFAULT_NAN);
    }
    if b == 0.0 {
        regs.set_fp_exception(Fpscr::ZX);
        return if b.is_sign_negative() { f64::NEG_INFINITY } else { f64::INFINITY };
    }
    1.0 / b.sqrt()
}
