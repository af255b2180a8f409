//! Primary and extended opcode tables
//!
//! Each table is a plain enum whose discriminants are the raw opcode values.
//! `from_raw` returns `None` for any value the Gekko does not implement, which
//! dispatch reports as an invalid instruction.

macro_rules! opcode_table {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident: $repr:ty {
            $($variant:ident = $value:literal),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr($repr)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($variant = $value),*
        }

        impl $name {
            /// Look up a raw opcode value
            #[inline]
            pub const fn from_raw(raw: $repr) -> Option<Self> {
                match raw {
                    $($value => Some(Self::$variant),)*
                    _ => None,
                }
            }

            /// The raw opcode value
            #[inline]
            pub const fn raw(self) -> $repr {
                self as $repr
            }
        }
    };
}

opcode_table! {
    /// Primary opcodes (bits 0-5)
    pub enum Opcode: u8 {
        Twi = 3,
        Table4 = 4,
        Mulli = 7,
        Subfic = 8,
        Cmpli = 10,
        Cmpi = 11,
        Addic = 12,
        AddicRc = 13,
        Addi = 14,
        Addis = 15,
        Bc = 16,
        Sc = 17,
        B = 18,
        Table19 = 19,
        Rlwimi = 20,
        Rlwinm = 21,
        Rlwnm = 23,
        Ori = 24,
        Oris = 25,
        Xori = 26,
        Xoris = 27,
        AndiRc = 28,
        AndisRc = 29,
        Table31 = 31,
        Lwz = 32,
        Lwzu = 33,
        Lbz = 34,
        Lbzu = 35,
        Stw = 36,
        Stwu = 37,
        Stb = 38,
        Stbu = 39,
        Lhz = 40,
        Lhzu = 41,
        Lha = 42,
        Lhau = 43,
        Sth = 44,
        Sthu = 45,
        Lmw = 46,
        Stmw = 47,
        Lfs = 48,
        Lfsu = 49,
        Lfd = 50,
        Lfdu = 51,
        Stfs = 52,
        Stfsu = 53,
        Stfd = 54,
        Stfdu = 55,
        PsqL = 56,
        PsqLu = 57,
        Table59 = 59,
        PsqSt = 60,
        PsqStu = 61,
        Table63 = 63,
    }
}

opcode_table! {
    /// Paired-single arithmetic, opcode 4, 5-bit extended opcode
    pub enum Op4Arith: u8 {
        Sum0 = 10,
        Sum1 = 11,
        Muls0 = 12,
        Muls1 = 13,
        Madds0 = 14,
        Madds1 = 15,
        Div = 18,
        Sub = 20,
        Add = 21,
        Sel = 23,
        Res = 24,
        Mul = 25,
        Rsqrte = 26,
        Msub = 28,
        Madd = 29,
        Nmsub = 30,
        Nmadd = 31,
    }
}

opcode_table! {
    /// Indexed quantized load/store, opcode 4, 6-bit extended opcode
    pub enum Op4Indexed: u8 {
        PsqLx = 6,
        PsqStx = 7,
        PsqLux = 38,
        PsqStux = 39,
    }
}

opcode_table! {
    /// Paired-single moves, compares and merges, opcode 4, 10-bit extended opcode
    pub enum Op4Extended: u16 {
        Cmpu0 = 0,
        Cmpo0 = 32,
        Neg = 40,
        Cmpu1 = 64,
        Mr = 72,
        Cmpo1 = 96,
        Nabs = 136,
        Abs = 264,
        Merge00 = 528,
        Merge01 = 560,
        Merge10 = 592,
        Merge11 = 624,
        DcbzL = 1014,
    }
}

opcode_table! {
    /// Branch-to-register, CR logic and context sync, opcode 19
    pub enum Op19: u16 {
        Mcrf = 0,
        Bclr = 16,
        Crnor = 33,
        Rfi = 50,
        Crandc = 129,
        Isync = 150,
        Crxor = 193,
        Crnand = 225,
        Crand = 257,
        Creqv = 289,
        Crorc = 417,
        Cror = 449,
        Bcctr = 528,
    }
}

opcode_table! {
    /// XO-form arithmetic, opcode 31, 9-bit extended opcode
    pub enum Op31Arith: u16 {
        Subfc = 8,
        Addc = 10,
        Mulhwu = 11,
        Subf = 40,
        Mulhw = 75,
        Neg = 104,
        Subfe = 136,
        Adde = 138,
        Subfze = 200,
        Addze = 202,
        Subfme = 232,
        Addme = 234,
        Mullw = 235,
        Add = 266,
        Divwu = 459,
        Divw = 491,
    }
}

opcode_table! {
    /// Everything else under opcode 31, 10-bit extended opcode
    pub enum Op31: u16 {
        Cmp = 0,
        Tw = 4,
        Lwarx = 20,
        Lwzx = 23,
        Mfcr = 19,
        Slw = 24,
        Cntlzw = 26,
        And = 28,
        Cmpl = 32,
        Dcbst = 54,
        Lwzux = 55,
        Andc = 60,
        Mfmsr = 83,
        Dcbf = 86,
        Lbzx = 87,
        Lbzux = 119,
        Nor = 124,
        Mtcrf = 144,
        Mtmsr = 146,
        Stwcx = 150,
        Stwx = 151,
        Stwux = 183,
        Mtsr = 210,
        Stbx = 215,
        Mtsrin = 242,
        Dcbtst = 246,
        Stbux = 247,
        Dcbt = 278,
        Lhzx = 279,
        Eqv = 284,
        Tlbie = 306,
        Eciwx = 310,
        Lhzux = 311,
        Xor = 316,
        Mfspr = 339,
        Lhax = 343,
        Mftb = 371,
        Lhaux = 375,
        Sthx = 407,
        Orc = 412,
        Ecowx = 438,
        Sthux = 439,
        Or = 444,
        Mtspr = 467,
        Dcbi = 470,
        Nand = 476,
        Mcrxr = 512,
        Lswx = 533,
        Lwbrx = 534,
        Lfsx = 535,
        Srw = 536,
        Tlbsync = 566,
        Lfsux = 567,
        Mfsr = 595,
        Lswi = 597,
        Sync = 598,
        Lfdx = 599,
        Lfdux = 631,
        Mfsrin = 659,
        Stswx = 661,
        Stwbrx = 662,
        Stfsx = 663,
        Stfsux = 695,
        Stswi = 725,
        Stfdx = 727,
        Stfdux = 759,
        Lhbrx = 790,
        Sraw = 792,
        Srawi = 824,
        Eieio = 854,
        Sthbrx = 918,
        Extsh = 922,
        Extsb = 954,
        Icbi = 982,
        Stfiwx = 983,
        Dcbz = 1014,
    }
}

opcode_table! {
    /// Single-precision arithmetic, opcode 59
    pub enum Op59: u8 {
        Fdivs = 18,
        Fsubs = 20,
        Fadds = 21,
        Fres = 24,
        Fmuls = 25,
        Fmsubs = 28,
        Fmadds = 29,
        Fnmsubs = 30,
        Fnmadds = 31,
    }
}

opcode_table! {
    /// Double-precision arithmetic, opcode 63, 5-bit extended opcode
    pub enum Op63Arith: u8 {
        Fdiv = 18,
        Fsub = 20,
        Fadd = 21,
        Fsel = 23,
        Fmul = 25,
        Frsqrte = 26,
        Fmsub = 28,
        Fmadd = 29,
        Fnmsub = 30,
        Fnmadd = 31,
    }
}

opcode_table! {
    /// Float moves, compares, conversions and FPSCR access, opcode 63, 10-bit extended opcode
    pub enum Op63: u16 {
        Fcmpu = 0,
        Frsp = 12,
        Fctiw = 14,
        Fctiwz = 15,
        Fcmpo = 32,
        Mtfsb1 = 38,
        Fneg = 40,
        Mcrfs = 64,
        Mtfsb0 = 70,
        Fmr = 72,
        Mtfsfi = 134,
        Fnabs = 136,
        Fabs = 264,
        Mffs = 583,
        Mtfsf = 711,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_lookup() {
        assert_eq!(Opcode::from_raw(14), Some(Opcode::Addi));
        assert_eq!(Opcode::from_raw(63), Some(Opcode::Table63));
        assert_eq!(Opcode::Stfdu.raw(), 55);
    }

    #[test]
    fn test_64bit_and_reserved_primaries_are_unknown() {
        for raw in [0, 1, 2, 5, 6, 9, 22, 30, 58, 62] {
            assert_eq!(Opcode::from_raw(raw), None, "opcode {raw}");
        }
    }

    #[test]
    fn test_extended_lookup() {
        assert_eq!(Op31Arith::from_raw(266), Some(Op31Arith::Add));
        assert_eq!(Op31::from_raw(444), Some(Op31::Or));
        assert_eq!(Op31::from_raw(266), None);
        assert_eq!(Op19::from_raw(16), Some(Op19::Bclr));
        assert_eq!(Op63::from_raw(711), Some(Op63::Mtfsf));
        assert_eq!(Op4Extended::from_raw(1014), Some(Op4Extended::DcbzL));
        assert_eq!(Op4Indexed::from_raw(38), Some(Op4Indexed::PsqLux));
    }

    #[test]
    fn test_arith_tables_do_not_shadow_extended_opcodes() {
        // A 10-bit opcode whose low 9 bits collide with an arithmetic XO must
        // carry the OE bit, which is only meaningful for arithmetic.
        for xo in 0..1024u16 {
            if let Some(op) = Op31::from_raw(xo) {
                if Op31Arith::from_raw(xo & 0x1FF).is_some() {
                    assert!(xo & 0x200 != 0, "{op:?} shadows an arithmetic opcode");
                }
            }
        }
    }
}
