//! Gekko register file

use std::cmp::Ordering;

use bitflags::bitflags;
use serde::Serialize;

bitflags! {
    /// Bits of a single 4-bit condition register field
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CrFlags: u32 {
        /// Less than / floating-point less than
        const LT = 0b1000;
        /// Greater than / floating-point greater than
        const GT = 0b0100;
        /// Equal / floating-point equal
        const EQ = 0b0010;
        /// Summary overflow / floating-point unordered
        const SO = 0b0001;
    }
}

bitflags! {
    /// XER status bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct XerFlags: u32 {
        /// Summary overflow
        const SO = 0x8000_0000;
        /// Overflow
        const OV = 0x4000_0000;
        /// Carry
        const CA = 0x2000_0000;
    }
}

/// XER byte count used by `lswx`/`stswx`
pub const XER_BYTE_COUNT_MASK: u32 = 0x7F;

bitflags! {
    /// FPSCR bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Fpscr: u32 {
        /// Exception summary (sticky)
        const FX = 1 << 31;
        /// Enabled exception summary
        const FEX = 1 << 30;
        /// Invalid operation summary
        const VX = 1 << 29;
        const OX = 1 << 28;
        const UX = 1 << 27;
        /// Zero divide
        const ZX = 1 << 26;
        const XX = 1 << 25;
        /// Invalid operation: signalling NaN
        const VXSNAN = 1 << 24;
        /// Invalid operation: inf - inf
        const VXISI = 1 << 23;
        /// Invalid operation: inf / inf
        const VXIDI = 1 << 22;
        /// Invalid operation: 0 / 0
        const VXZDZ = 1 << 21;
        /// Invalid operation: inf * 0
        const VXIMZ = 1 << 20;
        /// Invalid operation: ordered compare with NaN
        const VXVC = 1 << 19;
        const FR = 1 << 18;
        const FI = 1 << 17;
        /// Result class and condition code
        const FPRF = 0x1F << 12;
        const VXSOFT = 1 << 10;
        const VXSQRT = 1 << 9;
        /// Invalid operation: integer conversion
        const VXCVI = 1 << 8;
        const VE = 1 << 7;
        const OE = 1 << 6;
        const UE = 1 << 5;
        const ZE = 1 << 4;
        const XE = 1 << 3;
        const NI = 1 << 2;
        /// Rounding mode
        const RN = 0b11;
    }
}

impl Fpscr {
    /// All invalid-operation causes
    pub const VX_ANY: Self = Self::VXSNAN
        .union(Self::VXISI)
        .union(Self::VXIDI)
        .union(Self::VXZDZ)
        .union(Self::VXIMZ)
        .union(Self::VXVC)
        .union(Self::VXSOFT)
        .union(Self::VXSQRT)
        .union(Self::VXCVI);

    /// Every sticky exception bit that FX summarises
    pub const ANY_X: Self = Self::OX
        .union(Self::UX)
        .union(Self::ZX)
        .union(Self::XX)
        .union(Self::VX_ANY);

    /// Floating-point condition code (low nibble of FPRF)
    pub const FPCC: Self = Self::from_bits_retain(0xF << 12);
}

/// Machine state register bits used by the interpreter
pub mod msr {
    pub const LE: u32 = 1 << 0;
    pub const RI: u32 = 1 << 1;
    pub const DR: u32 = 1 << 4;
    pub const IR: u32 = 1 << 5;
    /// Exception prefix: vectors at 0xFFF00000 instead of 0x00000000
    pub const IP: u32 = 1 << 6;
    pub const FE1: u32 = 1 << 8;
    pub const BE: u32 = 1 << 9;
    pub const SE: u32 = 1 << 10;
    pub const FE0: u32 = 1 << 11;
    pub const ME: u32 = 1 << 12;
    pub const FP: u32 = 1 << 13;
    pub const PR: u32 = 1 << 14;
    pub const EE: u32 = 1 << 15;
    pub const ILE: u32 = 1 << 16;
    pub const POW: u32 = 1 << 18;
}

/// Special-purpose register numbers
pub mod spr {
    pub const XER: u16 = 1;
    pub const LR: u16 = 8;
    pub const CTR: u16 = 9;
    pub const DSISR: u16 = 18;
    pub const DAR: u16 = 19;
    pub const DEC: u16 = 22;
    pub const SDR1: u16 = 25;
    pub const SRR0: u16 = 26;
    pub const SRR1: u16 = 27;
    /// Time base, read through `mftb`
    pub const TBL_READ: u16 = 268;
    pub const TBU_READ: u16 = 269;
    /// Time base, written through `mtspr`
    pub const TBL_WRITE: u16 = 284;
    pub const TBU_WRITE: u16 = 285;
    pub const PVR: u16 = 287;
    pub const GQR0: u16 = 912;
    pub const GQR7: u16 = 919;
    pub const HID2: u16 = 920;
    pub const WPAR: u16 = 921;
    pub const HID0: u16 = 1008;
    pub const HID1: u16 = 1009;
    pub const L2CR: u16 = 1017;
}

/// Processor version reported by Broadway
pub const BROADWAY_PVR: u32 = 0x0008_7102;

/// Number of addressable SPR slots (10-bit SPR field)
pub const SPR_COUNT: usize = 1024;

/// Floating-point register
///
/// Every FPR holds two lanes. Scalar instructions use `ps0`; paired-single
/// instructions use both. Lanes are stored as raw IEEE-754 double bits so that
/// NaN payloads survive moves untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Fpr {
    pub ps0: u64,
    pub ps1: u64,
}

impl Fpr {
    /// Both lanes from double values
    pub fn from_f64(ps0: f64, ps1: f64) -> Self {
        Self {
            ps0: ps0.to_bits(),
            ps1: ps1.to_bits(),
        }
    }

    #[inline]
    pub fn ps0(&self) -> f64 {
        f64::from_bits(self.ps0)
    }

    #[inline]
    pub fn ps1(&self) -> f64 {
        f64::from_bits(self.ps1)
    }

    #[inline]
    pub fn set_ps0(&mut self, value: f64) {
        self.ps0 = value.to_bits();
    }

    #[inline]
    pub fn set_ps1(&mut self, value: f64) {
        self.ps1 = value.to_bits();
    }

    /// Write the same value to both lanes
    #[inline]
    pub fn set_both(&mut self, value: f64) {
        self.ps0 = value.to_bits();
        self.ps1 = self.ps0;
    }
}

/// Gekko architectural register state
///
/// Integer registers, LR, CTR and the PC are 32 bits wide; the Gekko has no
/// 64-bit mode so nothing ever observes upper halves.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterFile {
    /// General purpose registers
    pub gpr: [u32; 32],
    /// Floating-point / paired-single registers
    pub fpr: [Fpr; 32],
    /// Condition register
    pub cr: u32,
    /// Fixed-point exception register
    pub xer: u32,
    /// Floating-point status and control register
    pub fpscr: u32,
    /// Link register
    pub lr: u32,
    /// Count register
    pub ctr: u32,
    /// Current instruction address
    pub pc: u32,
    /// Next instruction address, set up before each instruction executes
    pub npc: u32,
    /// Machine state register
    pub msr: u32,
    pub srr0: u32,
    pub srr1: u32,
    /// Address of the last data access fault
    pub dar: u32,
    /// Cause of the last data access fault
    pub dsisr: u32,
    /// Time base
    pub tb: u64,
    /// Segment registers
    pub sr: [u32; 16],
    /// Graphics quantization registers
    pub gqr: [u32; 8],
    /// Address reserved by `lwarx`
    pub reservation: Option<u32>,
    /// Every other SPR, indexed by SPR number
    spr: Box<[u32; SPR_COUNT]>,
}

impl Default for RegisterFile {
    fn default() -> Self {
        let mut spr = Box::new([0u32; SPR_COUNT]);
        spr[spr::PVR as usize] = BROADWAY_PVR;
        Self {
            gpr: [0; 32],
            fpr: [Fpr::default(); 32],
            cr: 0,
            xer: 0,
            fpscr: 0,
            lr: 0,
            ctr: 0,
            pc: 0,
            npc: 0,
            msr: 0,
            srr0: 0,
            srr1: 0,
            dar: 0,
            dsisr: 0,
            tb: 0,
            sr: [0; 16],
            gqr: [0; 8],
            reservation: None,
            spr,
        }
    }
}

impl RegisterFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a GPR
    #[inline]
    pub fn gpr(&self, index: u8) -> u32 {
        self.gpr[index as usize]
    }

    /// Write a GPR
    #[inline]
    pub fn set_gpr(&mut self, index: u8, value: u32) {
        self.gpr[index as usize] = value;
    }

    /// Base register for effective address computation: r0 reads as zero
    #[inline]
    pub fn gpr_or_zero(&self, index: u8) -> u32 {
        if index == 0 {
            0
        } else {
            self.gpr[index as usize]
        }
    }

    /// Read an FPR
    #[inline]
    pub fn fpr(&self, index: u8) -> Fpr {
        self.fpr[index as usize]
    }

    /// Mutable FPR
    #[inline]
    pub fn fpr_mut(&mut self, index: u8) -> &mut Fpr {
        &mut self.fpr[index as usize]
    }

    /// Get CR field value (0-7)
    #[inline]
    pub fn cr_field(&self, field: u8) -> u32 {
        (self.cr >> (28 - field as u32 * 4)) & 0xF
    }

    /// Set CR field value (0-7)
    #[inline]
    pub fn set_cr_field(&mut self, field: u8, value: u32) {
        let shift = 28 - field as u32 * 4;
        self.cr = (self.cr & !(0xF << shift)) | ((value & 0xF) << shift);
    }

    /// Read CR bit `bit` (0 is the most significant)
    #[inline]
    pub fn cr_bit(&self, bit: u8) -> bool {
        (self.cr >> (31 - bit as u32)) & 1 != 0
    }

    /// Write CR bit `bit` (0 is the most significant)
    #[inline]
    pub fn set_cr_bit(&mut self, bit: u8, value: bool) {
        let mask = 1 << (31 - bit as u32);
        if value {
            self.cr |= mask;
        } else {
            self.cr &= !mask;
        }
    }

    /// Record an ordering into a CR field
    ///
    /// `None` (unordered) sets none of LT/GT/EQ. SO is always copied from XER.
    pub fn compare<T: PartialOrd>(&mut self, field: u8, a: T, b: T) {
        let mut flags = match a.partial_cmp(&b) {
            Some(Ordering::Less) => CrFlags::LT,
            Some(Ordering::Greater) => CrFlags::GT,
            Some(Ordering::Equal) => CrFlags::EQ,
            None => CrFlags::empty(),
        };
        if self.xer_so() {
            flags |= CrFlags::SO;
        }
        self.set_cr_field(field, flags.bits());
    }

    /// Record-form update of CR0 from a 32-bit result
    #[inline]
    pub fn update_cr0(&mut self, result: u32) {
        self.compare(0, result as i32, 0);
    }

    /// Record-form update of CR1 from the FPSCR exception summary
    #[inline]
    pub fn update_cr1(&mut self) {
        self.set_cr_field(1, self.fpscr >> 28);
    }

    #[inline]
    fn xer_flag(&self, flag: XerFlags) -> bool {
        self.xer & flag.bits() != 0
    }

    #[inline]
    fn set_xer_flag(&mut self, flag: XerFlags, value: bool) {
        if value {
            self.xer |= flag.bits();
        } else {
            self.xer &= !flag.bits();
        }
    }

    /// Get XER CA (Carry) bit
    #[inline]
    pub fn xer_ca(&self) -> bool {
        self.xer_flag(XerFlags::CA)
    }

    /// Set XER CA (Carry) bit
    #[inline]
    pub fn set_xer_ca(&mut self, value: bool) {
        self.set_xer_flag(XerFlags::CA, value);
    }

    /// Get XER OV (Overflow) bit
    #[inline]
    pub fn xer_ov(&self) -> bool {
        self.xer_flag(XerFlags::OV)
    }

    /// Set XER OV; setting it also sets the sticky SO bit
    #[inline]
    pub fn set_xer_ov(&mut self, value: bool) {
        self.set_xer_flag(XerFlags::OV, value);
        if value {
            self.set_xer_flag(XerFlags::SO, true);
        }
    }

    /// Get XER SO (Summary Overflow) bit
    #[inline]
    pub fn xer_so(&self) -> bool {
        self.xer_flag(XerFlags::SO)
    }

    /// Byte count for string instructions
    #[inline]
    pub fn xer_byte_count(&self) -> u32 {
        self.xer & XER_BYTE_COUNT_MASK
    }

    /// FPSCR as flags
    #[inline]
    pub fn fpscr_flags(&self) -> Fpscr {
        Fpscr::from_bits_retain(self.fpscr)
    }

    /// Read an SPR by number
    ///
    /// Registers with dedicated fields are routed to them; everything else
    /// comes from the backing store.
    pub fn spr(&self, n: u16) -> u32 {
        match n {
            spr::XER => self.xer,
            spr::LR => self.lr,
            spr::CTR => self.ctr,
            spr::DSISR => self.dsisr,
            spr::DAR => self.dar,
            spr::SRR0 => self.srr0,
            spr::SRR1 => self.srr1,
            spr::TBL_READ | spr::TBL_WRITE => self.tb as u32,
            spr::TBU_READ | spr::TBU_WRITE => (self.tb >> 32) as u32,
            spr::GQR0..=spr::GQR7 => self.gqr[(n - spr::GQR0) as usize],
            _ => self.spr[n as usize % SPR_COUNT],
        }
    }

    /// Write an SPR by number
    pub fn set_spr(&mut self, n: u16, value: u32) {
        match n {
            spr::XER => self.xer = value,
            spr::LR => self.lr = value,
            spr::CTR => self.ctr = value,
            spr::DSISR => self.dsisr = value,
            spr::DAR => self.dar = value,
            spr::SRR0 => self.srr0 = value,
            spr::SRR1 => self.srr1 = value,
            spr::TBL_READ | spr::TBL_WRITE => {
                self.tb = (self.tb & 0xFFFF_FFFF_0000_0000) | value as u64;
            }
            spr::TBU_READ | spr::TBU_WRITE => {
                self.tb = (self.tb & 0xFFFF_FFFF) | ((value as u64) << 32);
            }
            spr::GQR0..=spr::GQR7 => self.gqr[(n - spr::GQR0) as usize] = value,
            _ => self.spr[n as usize % SPR_COUNT] = value,
        }
    }

    /// Reset every register to its power-on value
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
