//! Instruction word decoder
//!
//! Every instruction encoding is described by a small struct with one named
//! field per operand. Fields are extracted with explicit shifts and masks (bit
//! 0 is the most significant bit in the architecture's numbering, so a field at
//! bits 6-10 sits at `(word >> 21) & 0x1F`). Decoding is total: any 32-bit word
//! decodes into any form without error. Whether the opcode is valid is decided
//! later by dispatch.
//!
//! Several raw fields are shared between roles. Those keep a single name here
//! and the instructions that reuse them are listed on the field.

use std::fmt;

/// Raw field extractors
pub mod field {
    /// Primary opcode, bits 0-5
    #[inline]
    pub const fn opcd(word: u32) -> u8 {
        (word >> 26) as u8
    }

    /// Bits 6-10: rD, rS, frD, frS, BO, TO, crbD
    #[inline]
    pub const fn rt(word: u32) -> u8 {
        ((word >> 21) & 0x1F) as u8
    }

    /// Bits 11-15: rA, frA, BI, crbA
    #[inline]
    pub const fn ra(word: u32) -> u8 {
        ((word >> 16) & 0x1F) as u8
    }

    /// Bits 16-20: rB, frB, crbB, SH, NB
    #[inline]
    pub const fn rb(word: u32) -> u8 {
        ((word >> 11) & 0x1F) as u8
    }

    /// Bits 21-25: frC, MB
    #[inline]
    pub const fn rc(word: u32) -> u8 {
        ((word >> 6) & 0x1F) as u8
    }

    /// Bits 26-30: ME
    #[inline]
    pub const fn me(word: u32) -> u8 {
        ((word >> 1) & 0x1F) as u8
    }

    /// crfD, bits 6-8
    #[inline]
    pub const fn crfd(word: u32) -> u8 {
        ((word >> 23) & 0x7) as u8
    }

    /// crfS, bits 11-13
    #[inline]
    pub const fn crfs(word: u32) -> u8 {
        ((word >> 18) & 0x7) as u8
    }

    /// Compare length bit L, bit 10
    #[inline]
    pub const fn l(word: u32) -> bool {
        (word >> 21) & 1 != 0
    }

    /// Signed 16-bit immediate / displacement
    #[inline]
    pub const fn simm(word: u32) -> i16 {
        word as u16 as i16
    }

    /// Unsigned 16-bit immediate
    #[inline]
    pub const fn uimm(word: u32) -> u16 {
        word as u16
    }

    /// Branch displacement LI, sign-extended and shifted left by 2
    #[inline]
    pub const fn li(word: u32) -> i32 {
        (((word >> 2) & 0x00FF_FFFF) << 8) as i32 >> 6
    }

    /// Conditional branch displacement BD, sign-extended and shifted left by 2
    #[inline]
    pub const fn bd(word: u32) -> i32 {
        (((word >> 2) & 0x3FFF) << 18) as i32 >> 16
    }

    /// Absolute-address bit AA
    #[inline]
    pub const fn aa(word: u32) -> bool {
        (word >> 1) & 1 != 0
    }

    /// Link bit LK / record bit Rc (both bit 31)
    #[inline]
    pub const fn bit31(word: u32) -> bool {
        word & 1 != 0
    }

    /// Overflow-enable bit OE, bit 21
    #[inline]
    pub const fn oe(word: u32) -> bool {
        (word >> 10) & 1 != 0
    }

    /// 10-bit extended opcode, bits 21-30
    #[inline]
    pub const fn xo10(word: u32) -> u16 {
        ((word >> 1) & 0x3FF) as u16
    }

    /// 9-bit extended opcode, bits 22-30
    #[inline]
    pub const fn xo9(word: u32) -> u16 {
        ((word >> 1) & 0x1FF) as u16
    }

    /// 6-bit extended opcode, bits 25-30
    #[inline]
    pub const fn xo6(word: u32) -> u8 {
        ((word >> 1) & 0x3F) as u8
    }

    /// 5-bit extended opcode, bits 26-30
    #[inline]
    pub const fn xo5(word: u32) -> u8 {
        ((word >> 1) & 0x1F) as u8
    }

    /// Raw 10-bit SPR/TBR field as encoded (halves swapped)
    #[inline]
    pub const fn spr_field(word: u32) -> u16 {
        ((word >> 11) & 0x3FF) as u16
    }

    /// SPR number with the two 5-bit halves put back in order
    #[inline]
    pub const fn spr(word: u32) -> u16 {
        let raw = spr_field(word);
        ((raw & 0x1F) << 5) | (raw >> 5)
    }

    /// CRM for mtcrf, bits 12-19
    #[inline]
    pub const fn crm(word: u32) -> u8 {
        ((word >> 12) & 0xFF) as u8
    }

    /// FM for mtfsf, bits 7-14
    #[inline]
    pub const fn fm(word: u32) -> u8 {
        ((word >> 17) & 0xFF) as u8
    }

    /// IMM for mtfsfi, bits 16-19
    #[inline]
    pub const fn fpscr_imm(word: u32) -> u8 {
        ((word >> 12) & 0xF) as u8
    }

    /// Segment register number, bits 12-15
    #[inline]
    pub const fn sr(word: u32) -> u8 {
        ((word >> 16) & 0xF) as u8
    }

    /// System call level, bits 20-26
    #[inline]
    pub const fn lev(word: u32) -> u8 {
        ((word >> 5) & 0x7F) as u8
    }

    /// Paired-single quantized load/store W bit, bit 16
    #[inline]
    pub const fn psq_w(word: u32) -> bool {
        (word >> 15) & 1 != 0
    }

    /// Paired-single quantized load/store GQR index, bits 17-19
    #[inline]
    pub const fn psq_i(word: u32) -> u8 {
        ((word >> 12) & 0x7) as u8
    }

    /// Paired-single quantized load/store 12-bit displacement
    #[inline]
    pub const fn psq_d(word: u32) -> i16 {
        (((word & 0xFFF) << 20) as i32 >> 20) as i16
    }

    /// Indexed quantized load/store W bit, bit 21
    #[inline]
    pub const fn psq_wx(word: u32) -> bool {
        (word >> 10) & 1 != 0
    }

    /// Indexed quantized load/store GQR index, bits 22-24
    #[inline]
    pub const fn psq_ix(word: u32) -> u8 {
        ((word >> 7) & 0x7) as u8
    }
}

#[inline]
const fn bit(value: bool, shift: u32) -> u32 {
    (value as u32) << shift
}

#[inline]
const fn reg(value: u8, shift: u32) -> u32 {
    ((value as u32) & 0x1F) << shift
}

/// I-form: `b`, `ba`, `bl`, `bla`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IForm {
    pub opcd: u8,
    /// Byte displacement, already sign-extended and shifted
    pub li: i32,
    pub aa: bool,
    pub lk: bool,
}

impl IForm {
    pub const fn decode(word: u32) -> Self {
        Self {
            opcd: field::opcd(word),
            li: field::li(word),
            aa: field::aa(word),
            lk: field::bit31(word),
        }
    }

    pub const fn encode(&self) -> u32 {
        ((self.opcd as u32) << 26)
            | (self.li as u32 & 0x03FF_FFFC)
            | bit(self.aa, 1)
            | bit(self.lk, 0)
    }
}

/// B-form: `bc`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BForm {
    pub opcd: u8,
    pub bo: u8,
    pub bi: u8,
    /// Byte displacement, already sign-extended and shifted
    pub bd: i32,
    pub aa: bool,
    pub lk: bool,
}

impl BForm {
    pub const fn decode(word: u32) -> Self {
        Self {
            opcd: field::opcd(word),
            bo: field::rt(word),
            bi: field::ra(word),
            bd: field::bd(word),
            aa: field::aa(word),
            lk: field::bit31(word),
        }
    }

    pub const fn encode(&self) -> u32 {
        ((self.opcd as u32) << 26)
            | reg(self.bo, 21)
            | reg(self.bi, 16)
            | (self.bd as u32 & 0xFFFC)
            | bit(self.aa, 1)
            | bit(self.lk, 0)
    }
}

/// SC-form: `sc`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScForm {
    pub opcd: u8,
    pub lev: u8,
}

impl ScForm {
    pub const fn decode(word: u32) -> Self {
        Self {
            opcd: field::opcd(word),
            lev: field::lev(word),
        }
    }

    pub const fn encode(&self) -> u32 {
        ((self.opcd as u32) << 26) | (((self.lev as u32) & 0x7F) << 5) | 0b10
    }
}

/// D-form: immediate arithmetic, logic, compares, traps and displacement loads/stores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DForm {
    pub opcd: u8,
    /// rD for loads and arithmetic, rS for stores and logic, frD/frS for
    /// float loads/stores, TO for `twi`, crfD||0||L for compares
    pub rt: u8,
    pub ra: u8,
    /// Displacement or SIMM; logic immediates read it through [`DForm::uimm`]
    pub d: i16,
}

impl DForm {
    pub const fn decode(word: u32) -> Self {
        Self {
            opcd: field::opcd(word),
            rt: field::rt(word),
            ra: field::ra(word),
            d: field::simm(word),
        }
    }

    pub const fn encode(&self) -> u32 {
        ((self.opcd as u32) << 26) | reg(self.rt, 21) | reg(self.ra, 16) | (self.d as u16 as u32)
    }

    /// The immediate as an unsigned 16-bit value
    pub const fn uimm(&self) -> u16 {
        self.d as u16
    }

    /// Target CR field of a compare
    pub const fn crfd(&self) -> u8 {
        self.rt >> 2
    }

    /// Compare length bit of a compare
    pub const fn l(&self) -> bool {
        self.rt & 1 != 0
    }
}

/// DS-form: 64-bit doubleword loads/stores (not implemented by Gekko)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DsForm {
    pub opcd: u8,
    pub rt: u8,
    pub ra: u8,
    /// Displacement, already shifted left by 2
    pub ds: i16,
    pub xo: u8,
}

impl DsForm {
    pub const fn decode(word: u32) -> Self {
        Self {
            opcd: field::opcd(word),
            rt: field::rt(word),
            ra: field::ra(word),
            ds: (word & 0xFFFC) as u16 as i16,
            xo: (word & 0x3) as u8,
        }
    }

    pub const fn encode(&self) -> u32 {
        ((self.opcd as u32) << 26)
            | reg(self.rt, 21)
            | reg(self.ra, 16)
            | (self.ds as u16 as u32 & 0xFFFC)
            | (self.xo as u32 & 0x3)
    }
}

/// X-form: indexed loads/stores, register logic, compares, cache ops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XForm {
    pub opcd: u8,
    /// rD/rS/frD/frS, TO for `tw`, crfD||0||L for compares
    pub rt: u8,
    /// rA/frA; SR number lives in its low 4 bits for `mtsr`/`mfsr`
    pub ra: u8,
    /// rB/frB, SH for `srawi`, NB for `lswi`/`stswi`
    pub rb: u8,
    pub xo: u16,
    pub rc: bool,
}

impl XForm {
    pub const fn decode(word: u32) -> Self {
        Self {
            opcd: field::opcd(word),
            rt: field::rt(word),
            ra: field::ra(word),
            rb: field::rb(word),
            xo: field::xo10(word),
            rc: field::bit31(word),
        }
    }

    pub const fn encode(&self) -> u32 {
        ((self.opcd as u32) << 26)
            | reg(self.rt, 21)
            | reg(self.ra, 16)
            | reg(self.rb, 11)
            | (((self.xo as u32) & 0x3FF) << 1)
            | bit(self.rc, 0)
    }

    /// Target CR field of a compare
    pub const fn crfd(&self) -> u8 {
        self.rt >> 2
    }

    /// Compare length bit of a compare
    pub const fn l(&self) -> bool {
        self.rt & 1 != 0
    }

    /// Source CR field (`mcrfs`)
    pub const fn crfs(&self) -> u8 {
        self.ra >> 2
    }

    /// Segment register number
    pub const fn sr(&self) -> u8 {
        self.ra & 0xF
    }
}

/// XL-form: branches to LR/CTR, CR logic, `rfi`, `isync`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XlForm {
    pub opcd: u8,
    /// BO for branches, crbD for CR logic, crfD||00 for `mcrf`
    pub bt: u8,
    /// BI for branches, crbA for CR logic, crfS||00 for `mcrf`
    pub ba: u8,
    pub bb: u8,
    pub xo: u16,
    pub lk: bool,
}

impl XlForm {
    pub const fn decode(word: u32) -> Self {
        Self {
            opcd: field::opcd(word),
            bt: field::rt(word),
            ba: field::ra(word),
            bb: field::rb(word),
            xo: field::xo10(word),
            lk: field::bit31(word),
        }
    }

    pub const fn encode(&self) -> u32 {
        ((self.opcd as u32) << 26)
            | reg(self.bt, 21)
            | reg(self.ba, 16)
            | reg(self.bb, 11)
            | (((self.xo as u32) & 0x3FF) << 1)
            | bit(self.lk, 0)
    }
}

/// XFX-form: `mfspr`, `mtspr`, `mftb`, `mtcrf`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XfxForm {
    pub opcd: u8,
    pub rt: u8,
    /// Raw bits 11-20 exactly as encoded
    pub field: u16,
    pub xo: u16,
}

impl XfxForm {
    pub const fn decode(word: u32) -> Self {
        Self {
            opcd: field::opcd(word),
            rt: field::rt(word),
            field: field::spr_field(word),
            xo: field::xo10(word),
        }
    }

    pub const fn encode(&self) -> u32 {
        ((self.opcd as u32) << 26)
            | reg(self.rt, 21)
            | (((self.field as u32) & 0x3FF) << 11)
            | (((self.xo as u32) & 0x3FF) << 1)
    }

    /// SPR or TBR number
    pub const fn spr(&self) -> u16 {
        ((self.field & 0x1F) << 5) | (self.field >> 5)
    }

    /// CR field mask for `mtcrf`
    pub const fn crm(&self) -> u8 {
        ((self.field >> 1) & 0xFF) as u8
    }
}

/// XFL-form: `mtfsf`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XflForm {
    pub opcd: u8,
    pub fm: u8,
    pub frb: u8,
    pub xo: u16,
    pub rc: bool,
}

impl XflForm {
    pub const fn decode(word: u32) -> Self {
        Self {
            opcd: field::opcd(word),
            fm: field::fm(word),
            frb: field::rb(word),
            xo: field::xo10(word),
            rc: field::bit31(word),
        }
    }

    pub const fn encode(&self) -> u32 {
        ((self.opcd as u32) << 26)
            | ((self.fm as u32) << 17)
            | reg(self.frb, 11)
            | (((self.xo as u32) & 0x3FF) << 1)
            | bit(self.rc, 0)
    }
}

/// XS-form: 64-bit `sradi` (not implemented by Gekko)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XsForm {
    pub opcd: u8,
    pub rs: u8,
    pub ra: u8,
    /// 6-bit shift: sh[0:4] from bits 16-20, sh[5] from bit 30
    pub sh: u8,
    pub xo: u16,
    pub rc: bool,
}

impl XsForm {
    pub const fn decode(word: u32) -> Self {
        Self {
            opcd: field::opcd(word),
            rs: field::rt(word),
            ra: field::ra(word),
            sh: field::rb(word) | ((((word >> 1) & 1) as u8) << 5),
            xo: ((word >> 2) & 0x1FF) as u16,
            rc: field::bit31(word),
        }
    }

    pub const fn encode(&self) -> u32 {
        ((self.opcd as u32) << 26)
            | reg(self.rs, 21)
            | reg(self.ra, 16)
            | reg(self.sh, 11)
            | (((self.xo as u32) & 0x1FF) << 2)
            | ((((self.sh >> 5) & 1) as u32) << 1)
            | bit(self.rc, 0)
    }
}

/// XO-form: register arithmetic with optional overflow recording
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XoForm {
    pub opcd: u8,
    pub rt: u8,
    pub ra: u8,
    pub rb: u8,
    pub oe: bool,
    pub xo: u16,
    pub rc: bool,
}

impl XoForm {
    pub const fn decode(word: u32) -> Self {
        Self {
            opcd: field::opcd(word),
            rt: field::rt(word),
            ra: field::ra(word),
            rb: field::rb(word),
            oe: field::oe(word),
            xo: field::xo9(word),
            rc: field::bit31(word),
        }
    }

    pub const fn encode(&self) -> u32 {
        ((self.opcd as u32) << 26)
            | reg(self.rt, 21)
            | reg(self.ra, 16)
            | reg(self.rb, 11)
            | bit(self.oe, 10)
            | (((self.xo as u32) & 0x1FF) << 1)
            | bit(self.rc, 0)
    }
}

/// A-form: floating-point and paired-single arithmetic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AForm {
    pub opcd: u8,
    pub frt: u8,
    pub fra: u8,
    pub frb: u8,
    pub frc: u8,
    pub xo: u8,
    pub rc: bool,
}

impl AForm {
    pub const fn decode(word: u32) -> Self {
        Self {
            opcd: field::opcd(word),
            frt: field::rt(word),
            fra: field::ra(word),
            frb: field::rb(word),
            frc: field::rc(word),
            xo: field::xo5(word),
            rc: field::bit31(word),
        }
    }

    pub const fn encode(&self) -> u32 {
        ((self.opcd as u32) << 26)
            | reg(self.frt, 21)
            | reg(self.fra, 16)
            | reg(self.frb, 11)
            | reg(self.frc, 6)
            | (((self.xo as u32) & 0x1F) << 1)
            | bit(self.rc, 0)
    }
}

/// M-form: 32-bit rotate and mask
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MForm {
    pub opcd: u8,
    pub rs: u8,
    pub ra: u8,
    /// rB for `rlwnm`, SH for `rlwinm`/`rlwimi`
    pub rb: u8,
    pub mb: u8,
    pub me: u8,
    pub rc: bool,
}

impl MForm {
    pub const fn decode(word: u32) -> Self {
        Self {
            opcd: field::opcd(word),
            rs: field::rt(word),
            ra: field::ra(word),
            rb: field::rb(word),
            mb: field::rc(word),
            me: field::me(word),
            rc: field::bit31(word),
        }
    }

    pub const fn encode(&self) -> u32 {
        ((self.opcd as u32) << 26)
            | reg(self.rs, 21)
            | reg(self.ra, 16)
            | reg(self.rb, 11)
            | reg(self.mb, 6)
            | reg(self.me, 1)
            | bit(self.rc, 0)
    }
}

/// 6-bit MB/ME field of MD/MDS forms: low five bits at 21-25, high bit at 26
#[inline]
const fn md_mask_field(word: u32) -> u8 {
    let raw = ((word >> 5) & 0x3F) as u8;
    ((raw & 1) << 5) | (raw >> 1)
}

#[inline]
const fn md_mask_bits(value: u8) -> u32 {
    let raw = ((value & 0x1F) << 1) | ((value >> 5) & 1);
    (raw as u32) << 5
}

/// MD-form: 64-bit rotate with immediate shift (not implemented by Gekko)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MdForm {
    pub opcd: u8,
    pub rs: u8,
    pub ra: u8,
    /// 6-bit shift: sh[0:4] from bits 16-20, sh[5] from bit 30
    pub sh: u8,
    /// 6-bit MB or ME
    pub mb: u8,
    pub xo: u8,
    pub rc: bool,
}

impl MdForm {
    pub const fn decode(word: u32) -> Self {
        Self {
            opcd: field::opcd(word),
            rs: field::rt(word),
            ra: field::ra(word),
            sh: field::rb(word) | ((((word >> 1) & 1) as u8) << 5),
            mb: md_mask_field(word),
            xo: ((word >> 2) & 0x7) as u8,
            rc: field::bit31(word),
        }
    }

    pub const fn encode(&self) -> u32 {
        ((self.opcd as u32) << 26)
            | reg(self.rs, 21)
            | reg(self.ra, 16)
            | reg(self.sh, 11)
            | md_mask_bits(self.mb)
            | (((self.xo as u32) & 0x7) << 2)
            | ((((self.sh >> 5) & 1) as u32) << 1)
            | bit(self.rc, 0)
    }
}

/// MDS-form: 64-bit rotate by register (not implemented by Gekko)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MdsForm {
    pub opcd: u8,
    pub rs: u8,
    pub ra: u8,
    pub rb: u8,
    /// 6-bit MB or ME
    pub mb: u8,
    pub xo: u8,
    pub rc: bool,
}

impl MdsForm {
    pub const fn decode(word: u32) -> Self {
        Self {
            opcd: field::opcd(word),
            rs: field::rt(word),
            ra: field::ra(word),
            rb: field::rb(word),
            mb: md_mask_field(word),
            xo: ((word >> 1) & 0xF) as u8,
            rc: field::bit31(word),
        }
    }

    pub const fn encode(&self) -> u32 {
        ((self.opcd as u32) << 26)
            | reg(self.rs, 21)
            | reg(self.ra, 16)
            | reg(self.rb, 11)
            | md_mask_bits(self.mb)
            | (((self.xo as u32) & 0xF) << 1)
            | bit(self.rc, 0)
    }
}

/// Gekko quantized load/store with displacement: `psq_l`, `psq_lu`, `psq_st`, `psq_stu`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PsqForm {
    pub opcd: u8,
    pub frt: u8,
    pub ra: u8,
    /// Load/store a single value instead of a pair
    pub w: bool,
    /// GQR index
    pub i: u8,
    /// 12-bit signed displacement
    pub d: i16,
}

impl PsqForm {
    pub const fn decode(word: u32) -> Self {
        Self {
            opcd: field::opcd(word),
            frt: field::rt(word),
            ra: field::ra(word),
            w: field::psq_w(word),
            i: field::psq_i(word),
            d: field::psq_d(word),
        }
    }

    pub const fn encode(&self) -> u32 {
        ((self.opcd as u32) << 26)
            | reg(self.frt, 21)
            | reg(self.ra, 16)
            | bit(self.w, 15)
            | (((self.i as u32) & 0x7) << 12)
            | (self.d as u16 as u32 & 0xFFF)
    }
}

/// Gekko indexed quantized load/store: `psq_lx`, `psq_lux`, `psq_stx`, `psq_stux`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PsqxForm {
    pub opcd: u8,
    pub frt: u8,
    pub ra: u8,
    pub rb: u8,
    pub w: bool,
    pub i: u8,
    pub xo: u8,
}

impl PsqxForm {
    pub const fn decode(word: u32) -> Self {
        Self {
            opcd: field::opcd(word),
            frt: field::rt(word),
            ra: field::ra(word),
            rb: field::rb(word),
            w: field::psq_wx(word),
            i: field::psq_ix(word),
            xo: field::xo6(word),
        }
    }

    pub const fn encode(&self) -> u32 {
        ((self.opcd as u32) << 26)
            | reg(self.frt, 21)
            | reg(self.ra, 16)
            | reg(self.rb, 11)
            | bit(self.w, 10)
            | (((self.i as u32) & 0x7) << 7)
            | (((self.xo as u32) & 0x3F) << 1)
    }
}

/// Instruction encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormKind {
    /// Unconditional branch
    I,
    /// Conditional branch
    B,
    /// System call
    Sc,
    /// Register + 16-bit immediate
    D,
    /// 64-bit doubleword load/store
    Ds,
    /// Register/register with 10-bit extended opcode
    X,
    /// Branch to LR/CTR, CR logic
    Xl,
    /// SPR moves
    Xfx,
    /// Move to FPSCR fields
    Xfl,
    /// 64-bit shift
    Xs,
    /// Register arithmetic with OE
    Xo,
    /// Floating-point multiply-add shape
    A,
    /// Rotate and mask
    M,
    /// 64-bit rotate with immediate shift
    Md,
    /// 64-bit rotate by register
    Mds,
    /// Quantized load/store, displacement
    Psq,
    /// Quantized load/store, indexed
    Psqx,
}

/// A decoded instruction word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodedForm {
    I(IForm),
    B(BForm),
    Sc(ScForm),
    D(DForm),
    Ds(DsForm),
    X(XForm),
    Xl(XlForm),
    Xfx(XfxForm),
    Xfl(XflForm),
    Xs(XsForm),
    Xo(XoForm),
    A(AForm),
    M(MForm),
    Md(MdForm),
    Mds(MdsForm),
    Psq(PsqForm),
    Psqx(PsqxForm),
}

impl DecodedForm {
    /// Which encoding this is
    pub const fn kind(&self) -> FormKind {
        match self {
            Self::I(_) => FormKind::I,
            Self::B(_) => FormKind::B,
            Self::Sc(_) => FormKind::Sc,
            Self::D(_) => FormKind::D,
            Self::Ds(_) => FormKind::Ds,
            Self::X(_) => FormKind::X,
            Self::Xl(_) => FormKind::Xl,
            Self::Xfx(_) => FormKind::Xfx,
            Self::Xfl(_) => FormKind::Xfl,
            Self::Xs(_) => FormKind::Xs,
            Self::Xo(_) => FormKind::Xo,
            Self::A(_) => FormKind::A,
            Self::M(_) => FormKind::M,
            Self::Md(_) => FormKind::Md,
            Self::Mds(_) => FormKind::Mds,
            Self::Psq(_) => FormKind::Psq,
            Self::Psqx(_) => FormKind::Psqx,
        }
    }

    /// Re-assemble the instruction word from the decoded fields
    pub const fn encode(&self) -> u32 {
        match self {
            Self::I(f) => f.encode(),
            Self::B(f) => f.encode(),
            Self::Sc(f) => f.encode(),
            Self::D(f) => f.encode(),
            Self::Ds(f) => f.encode(),
            Self::X(f) => f.encode(),
            Self::Xl(f) => f.encode(),
            Self::Xfx(f) => f.encode(),
            Self::Xfl(f) => f.encode(),
            Self::Xs(f) => f.encode(),
            Self::Xo(f) => f.encode(),
            Self::A(f) => f.encode(),
            Self::M(f) => f.encode(),
            Self::Md(f) => f.encode(),
            Self::Mds(f) => f.encode(),
            Self::Psq(f) => f.encode(),
            Self::Psqx(f) => f.encode(),
        }
    }
}

/// Decode `word` as the given form
pub const fn decode(word: u32, kind: FormKind) -> DecodedForm {
    match kind {
        FormKind::I => DecodedForm::I(IForm::decode(word)),
        FormKind::B => DecodedForm::B(BForm::decode(word)),
        FormKind::Sc => DecodedForm::Sc(ScForm::decode(word)),
        FormKind::D => DecodedForm::D(DForm::decode(word)),
        FormKind::Ds => DecodedForm::Ds(DsForm::decode(word)),
        FormKind::X => DecodedForm::X(XForm::decode(word)),
        FormKind::Xl => DecodedForm::Xl(XlForm::decode(word)),
        FormKind::Xfx => DecodedForm::Xfx(XfxForm::decode(word)),
        FormKind::Xfl => DecodedForm::Xfl(XflForm::decode(word)),
        FormKind::Xs => DecodedForm::Xs(XsForm::decode(word)),
        FormKind::Xo => DecodedForm::Xo(XoForm::decode(word)),
        FormKind::A => DecodedForm::A(AForm::decode(word)),
        FormKind::M => DecodedForm::M(MForm::decode(word)),
        FormKind::Md => DecodedForm::Md(MdForm::decode(word)),
        FormKind::Mds => DecodedForm::Mds(MdsForm::decode(word)),
        FormKind::Psq => DecodedForm::Psq(PsqForm::decode(word)),
        FormKind::Psqx => DecodedForm::Psqx(PsqxForm::decode(word)),
    }
}

/// A raw 32-bit instruction word
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstructionWord(pub u32);

impl InstructionWord {
    #[inline]
    pub const fn opcd(self) -> u8 {
        field::opcd(self.0)
    }

    /// The encoding this word uses, judged from its primary and extended opcodes
    pub fn form(self) -> FormKind {
        let word = self.0;
        match self.opcd() {
            18 => FormKind::I,
            16 => FormKind::B,
            17 => FormKind::Sc,
            19 => FormKind::Xl,
            20 | 21 | 23 => FormKind::M,
            30 => {
                if (word >> 1) & 0xE == 0x8 {
                    FormKind::Mds
                } else {
                    FormKind::Md
                }
            }
            31 => match field::xo10(word) {
                144 | 339 | 371 | 467 => FormKind::Xfx,
                _ if (word >> 2) & 0x1FF == 413 => FormKind::Xs,
                _ if crate::opcodes::Op31Arith::from_raw(field::xo9(word)).is_some() => {
                    FormKind::Xo
                }
                _ => FormKind::X,
            },
            56 | 57 | 60 | 61 => FormKind::Psq,
            58 | 62 => FormKind::Ds,
            59 => FormKind::A,
            63 => {
                if crate::opcodes::Op63Arith::from_raw(field::xo5(word)).is_some() {
                    FormKind::A
                } else if field::xo10(word) == 711 {
                    FormKind::Xfl
                } else {
                    FormKind::X
                }
            }
            4 => {
                if crate::opcodes::Op4Arith::from_raw(field::xo5(word)).is_some() {
                    FormKind::A
                } else if crate::opcodes::Op4Indexed::from_raw(field::xo6(word)).is_some() {
                    FormKind::Psqx
                } else {
                    FormKind::X
                }
            }
            _ => FormKind::D,
        }
    }

    /// Decode with the form this word uses
    pub fn decode(self) -> DecodedForm {
        decode(self.0, self.form())
    }
}

impl fmt::Debug for InstructionWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InstructionWord(0x{:08x})", self.0)
    }
}
