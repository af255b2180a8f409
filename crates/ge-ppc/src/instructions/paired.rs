//! Paired-single unit
//!
//! Gekko extends every FPR with a second lane (`ps1`). Paired arithmetic
//! works on both lanes at single precision; quantized loads and stores
//! convert between memory integers and floats through the GQRs.

use ge_core::error::PpcError;
use ge_memory::MemoryView;

use super::{check_update, ea_x, ExecResult};
use crate::decoder::{AForm, PsqForm, PsqxForm, XForm};
use crate::fp::{self, convert_to_double, convert_to_single, force_single};
use crate::registers::{Fpscr, Fpr, RegisterFile};

const SIGN: u64 = 0x8000_0000_0000_0000;

/// Memory representation selected by a GQR type field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantizeType {
    Float,
    U8,
    U16,
    S8,
    S16,
}

impl QuantizeType {
    /// Decode a 3-bit type field; 1-3 are reserved
    pub const fn from_bits(bits: u32) -> Option<Self> {
        match bits & 7 {
            0 => Some(Self::Float),
            4 => Some(Self::U8),
            5 => Some(Self::U16),
            6 => Some(Self::S8),
            7 => Some(Self::S16),
            _ => None,
        }
    }

    /// Bytes per element in memory
    pub const fn size(self) -> u32 {
        match self {
            Self::Float => 4,
            Self::U16 | Self::S16 => 2,
            Self::U8 | Self::S8 => 1,
        }
    }

    const fn range(self) -> (f64, f64) {
        match self {
            Self::Float => (f64::MIN, f64::MAX),
            Self::U8 => (0.0, u8::MAX as f64),
            Self::U16 => (0.0, u16::MAX as f64),
            Self::S8 => (i8::MIN as f64, i8::MAX as f64),
            Self::S16 => (i16::MIN as f64, i16::MAX as f64),
        }
    }
}

/// One direction (load or store) of a graphics quantization register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quantizer {
    pub kind: QuantizeType,
    /// Signed 6-bit scale
    pub scale: i32,
}

impl Quantizer {
    fn new(type_bits: u32, scale_bits: u32) -> Result<Self, PpcError> {
        let kind = QuantizeType::from_bits(type_bits).ok_or_else(|| {
            PpcError::invalid(format!("reserved quantization type {}", type_bits & 7))
        })?;
        // Sign-extend the 6-bit field
        let scale = ((scale_bits & 0x3F) as i32) << 26 >> 26;
        Ok(Self { kind, scale })
    }

    /// Load half of a GQR: type bits 16-18, scale bits 24-29
    pub fn for_load(gqr: u32) -> Result<Self, PpcError> {
        Self::new(gqr >> 16, gqr >> 24)
    }

    /// Store half of a GQR: type bits 0-2, scale bits 8-13
    pub fn for_store(gqr: u32) -> Result<Self, PpcError> {
        Self::new(gqr, gqr >> 8)
    }

    /// Read one element and convert it to a double
    pub fn dequantize(&self, mem: &MemoryView, ea: u32) -> Result<f64, PpcError> {
        let raw = match self.kind {
            QuantizeType::Float => {
                return Ok(f64::from_bits(convert_to_double(mem.read::<u32>(ea)?)))
            }
            QuantizeType::U8 => mem.read::<u8>(ea)? as f64,
            QuantizeType::U16 => mem.read::<u16>(ea)? as f64,
            QuantizeType::S8 => mem.read::<i8>(ea)? as f64,
            QuantizeType::S16 => mem.read::<i16>(ea)? as f64,
        };
        Ok(raw * (-self.scale as f64).exp2())
    }

    /// Convert a lane to its memory form and write it
    pub fn quantize(&self, mem: &mut MemoryView, ea: u32, lane: u64) -> Result<(), PpcError> {
        match self.kind {
            QuantizeType::Float => mem.write::<u32>(ea, convert_to_single(lane))?,
            QuantizeType::U8 => mem.write::<u8>(ea, self.saturate(lane) as u8)?,
            QuantizeType::U16 => mem.write::<u16>(ea, self.saturate(lane) as u16)?,
            QuantizeType::S8 => mem.write::<i8>(ea, self.saturate(lane) as i8)?,
            QuantizeType::S16 => mem.write::<i16>(ea, self.saturate(lane) as i16)?,
        }
        Ok(())
    }

    /// Scale a lane and clamp it to the integer range; NaN saturates low
    fn saturate(&self, lane: u64) -> f64 {
        let (min, max) = self.kind.range();
        let scaled = f64::from_bits(lane) * (self.scale as f64).exp2();
        if scaled.is_nan() {
            min
        } else {
            scaled.clamp(min, max)
        }
    }
}

// ===== Quantized loads/stores =====

fn quantized_load(
    regs: &mut RegisterFile,
    mem: &MemoryView,
    frt: u8,
    ea: u32,
    single: bool,
    gqr: u8,
) -> ExecResult {
    let q = Quantizer::for_load(regs.gqr[gqr as usize])?;
    let ps0 = q.dequantize(mem, ea)?;
    let ps1 = if single {
        1.0
    } else {
        q.dequantize(mem, ea.wrapping_add(q.kind.size()))?
    };
    *regs.fpr_mut(frt) = Fpr::from_f64(ps0, ps1);
    Ok(())
}

fn quantized_store(
    regs: &RegisterFile,
    mem: &mut MemoryView,
    frs: u8,
    ea: u32,
    single: bool,
    gqr: u8,
) -> ExecResult {
    let q = Quantizer::for_store(regs.gqr[gqr as usize])?;
    let value = regs.fpr(frs);
    q.quantize(mem, ea, value.ps0)?;
    if !single {
        q.quantize(mem, ea.wrapping_add(q.kind.size()), value.ps1)?;
    }
    Ok(())
}

#[inline]
fn psq_ea(regs: &RegisterFile, p: PsqForm) -> u32 {
    super::ea_d(regs, p.ra, p.d)
}

/// psq_l - Paired Single Quantized Load
pub fn psq_l(regs: &mut RegisterFile, mem: &MemoryView, p: PsqForm) -> ExecResult {
    let ea = psq_ea(regs, p);
    quantized_load(regs, mem, p.frt, ea, p.w, p.i)
}

/// psq_lu - Paired Single Quantized Load with Update
pub fn psq_lu(regs: &mut RegisterFile, mem: &MemoryView, p: PsqForm) -> ExecResult {
    check_update("psq_lu", p.ra)?;
    let ea = psq_ea(regs, p);
    quantized_load(regs, mem, p.frt, ea, p.w, p.i)?;
    regs.set_gpr(p.ra, ea);
    Ok(())
}

/// psq_st - Paired Single Quantized Store
pub fn psq_st(regs: &mut RegisterFile, mem: &mut MemoryView, p: PsqForm) -> ExecResult {
    let ea = psq_ea(regs, p);
    quantized_store(regs, mem, p.frt, ea, p.w, p.i)
}

/// psq_stu - Paired Single Quantized Store with Update
pub fn psq_stu(regs: &mut RegisterFile, mem: &mut MemoryView, p: PsqForm) -> ExecResult {
    check_update("psq_stu", p.ra)?;
    let ea = psq_ea(regs, p);
    quantized_store(regs, mem, p.frt, ea, p.w, p.i)?;
    regs.set_gpr(p.ra, ea);
    Ok(())
}

/// psq_lx - Paired Single Quantized Load Indexed
pub fn psq_lx(regs: &mut RegisterFile, mem: &MemoryView, p: PsqxForm) -> ExecResult {
    let ea = ea_x(regs, p.ra, p.rb);
    quantized_load(regs, mem, p.frt, ea, p.w, p.i)
}

/// psq_lux - Paired Single Quantized Load with Update Indexed
pub fn psq_lux(regs: &mut RegisterFile, mem: &MemoryView, p: PsqxForm) -> ExecResult {
    check_update("psq_lux", p.ra)?;
    let ea = ea_x(regs, p.ra, p.rb);
    quantized_load(regs, mem, p.frt, ea, p.w, p.i)?;
    regs.set_gpr(p.ra, ea);
    Ok(())
}

/// psq_stx - Paired Single Quantized Store Indexed
pub fn psq_stx(regs: &mut RegisterFile, mem: &mut MemoryView, p: PsqxForm) -> ExecResult {
    let ea = ea_x(regs, p.ra, p.rb);
    quantized_store(regs, mem, p.frt, ea, p.w, p.i)
}

/// psq_stux - Paired Single Quantized Store with Update Indexed
pub fn psq_stux(regs: &mut RegisterFile, mem: &mut MemoryView, p: PsqxForm) -> ExecResult {
    check_update("psq_stux", p.ra)?;
    let ea = ea_x(regs, p.ra, p.rb);
    quantized_store(regs, mem, p.frt, ea, p.w, p.i)?;
    regs.set_gpr(p.ra, ea);
    Ok(())
}

// ===== Arithmetic =====

/// Round both lanes to single, write them and update FPRF from ps0
fn finish_pair(regs: &mut RegisterFile, frt: u8, rc: bool, ps0: f64, ps1: f64) -> ExecResult {
    let ps0 = force_single(ps0);
    let ps1 = force_single(ps1);
    *regs.fpr_mut(frt) = Fpr::from_f64(ps0, ps1);
    regs.update_fprf(ps0);
    if rc {
        regs.update_cr1();
    }
    Ok(())
}

/// Apply a binary lane operation to (frA, frB)
fn lanes_ab(
    regs: &mut RegisterFile,
    a: AForm,
    op: fn(&mut RegisterFile, f64, f64) -> f64,
) -> ExecResult {
    let fa = regs.fpr(a.fra);
    let fb = regs.fpr(a.frb);
    let ps0 = op(regs, fa.ps0(), fb.ps0());
    let ps1 = op(regs, fa.ps1(), fb.ps1());
    finish_pair(regs, a.frt, a.rc, ps0, ps1)
}

/// Apply a fused lane operation `op(a, c, b)`, taking frC from `c_lane`
/// when given (the `s0`/`s1` scalar variants)
fn lanes_acb(
    regs: &mut RegisterFile,
    a: AForm,
    c_lane: Option<bool>,
    op: fn(&mut RegisterFile, f64, f64, f64) -> f64,
    negate: bool,
) -> ExecResult {
    let fa = regs.fpr(a.fra);
    let fb = regs.fpr(a.frb);
    let fc = regs.fpr(a.frc);
    let (c0, c1) = match c_lane {
        None => (fc.ps0(), fc.ps1()),
        Some(false) => (fc.ps0(), fc.ps0()),
        Some(true) => (fc.ps1(), fc.ps1()),
    };
    let mut ps0 = op(regs, fa.ps0(), c0, fb.ps0());
    let mut ps1 = op(regs, fa.ps1(), c1, fb.ps1());
    if negate {
        ps0 = fp::negate_result(ps0);
        ps1 = fp::negate_result(ps1);
    }
    finish_pair(regs, a.frt, a.rc, ps0, ps1)
}

/// ps_add - Paired Single Add
pub fn ps_add(regs: &mut RegisterFile, a: AForm) -> ExecResult {
    lanes_ab(regs, a, fp::add)
}

/// ps_sub - Paired Single Subtract
pub fn ps_sub(regs: &mut RegisterFile, a: AForm) -> ExecResult {
    lanes_ab(regs, a, fp::sub)
}

/// ps_div - Paired Single Divide
pub fn ps_div(regs: &mut RegisterFile, a: AForm) -> ExecResult {
    lanes_ab(regs, a, fp::div)
}

/// ps_mul - Paired Single Multiply (frA * frC)
pub fn ps_mul(regs: &mut RegisterFile, a: AForm) -> ExecResult {
    let fa = regs.fpr(a.fra);
    let fc = regs.fpr(a.frc);
    let ps0 = fp::mul(regs, fa.ps0(), fc.ps0());
    let ps1 = fp::mul(regs, fa.ps1(), fc.ps1());
    finish_pair(regs, a.frt, a.rc, ps0, ps1)
}

/// ps_muls0 - Paired Single Multiply Scalar high
pub fn ps_muls0(regs: &mut RegisterFile, a: AForm) -> ExecResult {
    muls(regs, a, false)
}

/// ps_muls1 - Paired Single Multiply Scalar low
pub fn ps_muls1(regs: &mut RegisterFile, a: AForm) -> ExecResult {
    muls(regs, a, true)
}

fn muls(regs: &mut RegisterFile, a: AForm, lane1: bool) -> ExecResult {
    let fa = regs.fpr(a.fra);
    let fc = regs.fpr(a.frc);
    let c = if lane1 { fc.ps1() } else { fc.ps0() };
    let ps0 = fp::mul(regs, fa.ps0(), c);
    let ps1 = fp::mul(regs, fa.ps1(), c);
    finish_pair(regs, a.frt, a.rc, ps0, ps1)
}

/// ps_madd - Paired Single Multiply-Add
pub fn ps_madd(regs: &mut RegisterFile, a: AForm) -> ExecResult {
    lanes_acb(regs, a, None, fp::madd, false)
}

/// ps_msub - Paired Single Multiply-Subtract
pub fn ps_msub(regs: &mut RegisterFile, a: AForm) -> ExecResult {
    lanes_acb(regs, a, None, fp::msub, false)
}

/// ps_nmadd - Paired Single Negative Multiply-Add
pub fn ps_nmadd(regs: &mut RegisterFile, a: AForm) -> ExecResult {
    lanes_acb(regs, a, None, fp::madd, true)
}

/// ps_nmsub - Paired Single Negative Multiply-Subtract
pub fn ps_nmsub(regs: &mut RegisterFile, a: AForm) -> ExecResult {
    lanes_acb(regs, a, None, fp::msub, true)
}

/// ps_madds0 - Paired Single Multiply-Add Scalar high
pub fn ps_madds0(regs: &mut RegisterFile, a: AForm) -> ExecResult {
    lanes_acb(regs, a, Some(false), fp::madd, false)
}

/// ps_madds1 - Paired Single Multiply-Add Scalar low
pub fn ps_madds1(regs: &mut RegisterFile, a: AForm) -> ExecResult {
    lanes_acb(regs, a, Some(true), fp::madd, false)
}

/// ps_sum0 - Paired Single Vector Sum high: (a0 + b1, c1)
pub fn ps_sum0(regs: &mut RegisterFile, a: AForm) -> ExecResult {
    let fa = regs.fpr(a.fra);
    let fb = regs.fpr(a.frb);
    let c1 = regs.fpr(a.frc).ps1();
    let sum = fp::add(regs, fa.ps0(), fb.ps1());
    finish_pair(regs, a.frt, a.rc, sum, c1)
}

/// ps_sum1 - Paired Single Vector Sum low: (c0, a0 + b1)
pub fn ps_sum1(regs: &mut RegisterFile, a: AForm) -> ExecResult {
    let fa = regs.fpr(a.fra);
    let fb = regs.fpr(a.frb);
    let c0 = regs.fpr(a.frc).ps0();
    let sum = fp::add(regs, fa.ps0(), fb.ps1());
    regs.update_fprf(force_single(sum));
    let ps0 = force_single(c0);
    let ps1 = force_single(sum);
    *regs.fpr_mut(a.frt) = Fpr::from_f64(ps0, ps1);
    if a.rc {
        regs.update_cr1();
    }
    Ok(())
}

/// ps_sel - Paired Single Select
pub fn ps_sel(regs: &mut RegisterFile, a: AForm) -> ExecResult {
    let fa = regs.fpr(a.fra);
    let fb = regs.fpr(a.frb);
    let fc = regs.fpr(a.frc);
    let pick = |sel: f64, c: u64, b: u64| if sel >= 0.0 { c } else { b };
    let result = Fpr {
        ps0: pick(fa.ps0(), fc.ps0, fb.ps0),
        ps1: pick(fa.ps1(), fc.ps1, fb.ps1),
    };
    finish_move(regs, a.frt, a.rc, result)
}

/// ps_res - Paired Single Reciprocal Estimate
pub fn ps_res(regs: &mut RegisterFile, a: AForm) -> ExecResult {
    let fb = regs.fpr(a.frb);
    let ps0 = fp::reciprocal(regs, fb.ps0());
    let ps1 = fp::reciprocal(regs, fb.ps1());
    finish_pair(regs, a.frt, a.rc, ps0, ps1)
}

/// ps_rsqrte - Paired Single Reciprocal Square Root Estimate
pub fn ps_rsqrte(regs: &mut RegisterFile, a: AForm) -> ExecResult {
    let fb = regs.fpr(a.frb);
    let ps0 = fp::reciprocal_sqrt(regs, fb.ps0());
    let ps1 = fp::reciprocal_sqrt(regs, fb.ps1());
    finish_pair(regs, a.frt, a.rc, ps0, ps1)
}

// ===== Moves and merges =====

fn finish_move(regs: &mut RegisterFile, frt: u8, rc: bool, value: Fpr) -> ExecResult {
    *regs.fpr_mut(frt) = value;
    if rc {
        regs.update_cr1();
    }
    Ok(())
}

fn map_bits(regs: &mut RegisterFile, x: XForm, f: impl Fn(u64) -> u64) -> ExecResult {
    let fb = regs.fpr(x.rb);
    let result = Fpr { ps0: f(fb.ps0), ps1: f(fb.ps1) };
    finish_move(regs, x.rt, x.rc, result)
}

/// ps_mr - Paired Single Move Register
pub fn ps_mr(regs: &mut RegisterFile, x: XForm) -> ExecResult {
    map_bits(regs, x, |v| v)
}

/// ps_neg - Paired Single Negate
pub fn ps_neg(regs: &mut RegisterFile, x: XForm) -> ExecResult {
    map_bits(regs, x, |v| v ^ SIGN)
}

/// ps_abs - Paired Single Absolute Value
pub fn ps_abs(regs: &mut RegisterFile, x: XForm) -> ExecResult {
    map_bits(regs, x, |v| v & !SIGN)
}

/// ps_nabs - Paired Single Negative Absolute Value
pub fn ps_nabs(regs: &mut RegisterFile, x: XForm) -> ExecResult {
    map_bits(regs, x, |v| v | SIGN)
}

fn merge(regs: &mut RegisterFile, x: XForm, a_lane1: bool, b_lane1: bool) -> ExecResult {
    let fa = regs.fpr(x.ra);
    let fb = regs.fpr(x.rb);
    let result = Fpr {
        ps0: if a_lane1 { fa.ps1 } else { fa.ps0 },
        ps1: if b_lane1 { fb.ps1 } else { fb.ps0 },
    };
    finish_move(regs, x.rt, x.rc, result)
}

/// ps_merge00 - Paired Single Merge High
pub fn ps_merge00(regs: &mut RegisterFile, x: XForm) -> ExecResult {
    merge(regs, x, false, false)
}

/// ps_merge01 - Paired Single Merge Direct
pub fn ps_merge01(regs: &mut RegisterFile, x: XForm) -> ExecResult {
    merge(regs, x, false, true)
}

/// ps_merge10 - Paired Single Merge Swapped
pub fn ps_merge10(regs: &mut RegisterFile, x: XForm) -> ExecResult {
    merge(regs, x, true, false)
}

/// ps_merge11 - Paired Single Merge Low
pub fn ps_merge11(regs: &mut RegisterFile, x: XForm) -> ExecResult {
    merge(regs, x, true, true)
}

// ===== Compares =====

fn compare_lane(regs: &mut RegisterFile, x: XForm, lane1: bool, ordered: bool) -> ExecResult {
    let (fa, fb) = if lane1 {
        (regs.fpr(x.ra).ps1(), regs.fpr(x.rb).ps1())
    } else {
        (regs.fpr(x.ra).ps0(), regs.fpr(x.rb).ps0())
    };
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

/// ps_cmpu0 - Paired Single Compare Unordered High
pub fn ps_cmpu0(regs: &mut RegisterFile, x: XForm) -> ExecResult {
    compare_lane(regs, x, false, false)
}

/// ps_cmpo0 - Paired Single Compare Ordered High
pub fn ps_cmpo0(regs: &mut RegisterFile, x: XForm) -> ExecResult {
    compare_lane(regs, x, false, true)
}

/// ps_cmpu1 - Paired Single Compare Unordered Low
pub fn ps_cmpu1(regs: &mut RegisterFile, x: XForm) -> ExecResult {
    compare_lane(regs, x, true, false)
}

/// ps_cmpo1 - Paired Single Compare Ordered Low
pub fn ps_cmpo1(regs: &mut RegisterFile, x: XForm) -> ExecResult {
    compare_lane(regs, x, true, true)
}
