//! Integer load/store unit
//!
//! Update forms write the effective address back to rA only after the memory
//! access succeeded, so a faulting access leaves the register file untouched.

use ge_core::error::PpcError;
use ge_memory::{GuestValue, MemoryView};

use super::{check_load_update, check_update, check_word_aligned, ea_d, ea_x, ExecResult};
use crate::decoder::{DForm, XForm};
use crate::registers::{CrFlags, RegisterFile};

fn load_d<T: GuestValue>(regs: &mut RegisterFile, mem: &MemoryView, d: DForm, extend: fn(T) -> u32) -> ExecResult {
    let ea = ea_d(regs, d.ra, d.d);
    let value = mem.read::<T>(ea)?;
    regs.set_gpr(d.rt, extend(value));
    Ok(())
}

fn load_du<T: GuestValue>(
    name: &str,
    regs: &mut RegisterFile,
    mem: &MemoryView,
    d: DForm,
    extend: fn(T) -> u32,
) -> ExecResult {
    check_load_update(name, d.rt, d.ra)?;
    let ea = regs.gpr(d.ra).wrapping_add(d.d as i32 as u32);
    let value = mem.read::<T>(ea)?;
    regs.set_gpr(d.rt, extend(value));
    regs.set_gpr(d.ra, ea);
    Ok(())
}

fn load_x<T: GuestValue>(regs: &mut RegisterFile, mem: &MemoryView, x: XForm, extend: fn(T) -> u32) -> ExecResult {
    let ea = ea_x(regs, x.ra, x.rb);
    let value = mem.read::<T>(ea)?;
    regs.set_gpr(x.rt, extend(value));
    Ok(())
}

fn load_xu<T: GuestValue>(
    name: &str,
    regs: &mut RegisterFile,
    mem: &MemoryView,
    x: XForm,
    extend: fn(T) -> u32,
) -> ExecResult {
    check_load_update(name, x.rt, x.ra)?;
    let ea = regs.gpr(x.ra).wrapping_add(regs.gpr(x.rb));
    let value = mem.read::<T>(ea)?;
    regs.set_gpr(x.rt, extend(value));
    regs.set_gpr(x.ra, ea);
    Ok(())
}

fn store_d<T: GuestValue>(regs: &mut RegisterFile, mem: &mut MemoryView, d: DForm, narrow: fn(u32) -> T) -> ExecResult {
    let ea = ea_d(regs, d.ra, d.d);
    mem.write::<T>(ea, narrow(regs.gpr(d.rt)))?;
    Ok(())
}

fn store_du<T: GuestValue>(
    name: &str,
    regs: &mut RegisterFile,
    mem: &mut MemoryView,
    d: DForm,
    narrow: fn(u32) -> T,
) -> ExecResult {
    check_update(name, d.ra)?;
    let ea = regs.gpr(d.ra).wrapping_add(d.d as i32 as u32);
    mem.write::<T>(ea, narrow(regs.gpr(d.rt)))?;
    regs.set_gpr(d.ra, ea);
    Ok(())
}

fn store_x<T: GuestValue>(regs: &mut RegisterFile, mem: &mut MemoryView, x: XForm, narrow: fn(u32) -> T) -> ExecResult {
    let ea = ea_x(regs, x.ra, x.rb);
    mem.write::<T>(ea, narrow(regs.gpr(x.rt)))?;
    Ok(())
}

fn store_xu<T: GuestValue>(
    name: &str,
    regs: &mut RegisterFile,
    mem: &mut MemoryView,
    x: XForm,
    narrow: fn(u32) -> T,
) -> ExecResult {
    check_update(name, x.ra)?;
    let ea = regs.gpr(x.ra).wrapping_add(regs.gpr(x.rb));
    mem.write::<T>(ea, narrow(regs.gpr(x.rt)))?;
    regs.set_gpr(x.ra, ea);
    Ok(())
}

fn zero_word(v: u32) -> u32 {
    v
}

fn zero_half(v: u16) -> u32 {
    v as u32
}

fn zero_byte(v: u8) -> u32 {
    v as u32
}

fn sign_half(v: i16) -> u32 {
    v as i32 as u32
}

fn word(v: u32) -> u32 {
    v
}

fn half(v: u32) -> u16 {
    v as u16
}

fn byte(v: u32) -> u8 {
    v as u8
}

// ===== Word =====

/// lwz - Load Word and Zero
pub fn lwz(regs: &mut RegisterFile, mem: &MemoryView, d: DForm) -> ExecResult {
    load_d(regs, mem, d, zero_word)
}

/// lwzu - Load Word and Zero with Update
pub fn lwzu(regs: &mut RegisterFile, mem: &MemoryView, d: DForm) -> ExecResult {
    load_du("lwzu", regs, mem, d, zero_word)
}

/// lwzx - Load Word and Zero Indexed
pub fn lwzx(regs: &mut RegisterFile, mem: &MemoryView, x: XForm) -> ExecResult {
    load_x(regs, mem, x, zero_word)
}

/// lwzux - Load Word and Zero with Update Indexed
pub fn lwzux(regs: &mut RegisterFile, mem: &MemoryView, x: XForm) -> ExecResult {
    load_xu("lwzux", regs, mem, x, zero_word)
}

/// stw - Store Word
pub fn stw(regs: &mut RegisterFile, mem: &mut MemoryView, d: DForm) -> ExecResult {
    store_d(regs, mem, d, word)
}

/// stwu - Store Word with Update
pub fn stwu(regs: &mut RegisterFile, mem: &mut MemoryView, d: DForm) -> ExecResult {
    store_du("stwu", regs, mem, d, word)
}

/// stwx - Store Word Indexed
pub fn stwx(regs: &mut RegisterFile, mem: &mut MemoryView, x: XForm) -> ExecResult {
    store_x(regs, mem, x, word)
}

/// stwux - Store Word with Update Indexed
pub fn stwux(regs: &mut RegisterFile, mem: &mut MemoryView, x: XForm) -> ExecResult {
    store_xu("stwux", regs, mem, x, word)
}

// ===== Halfword =====

/// lhz - Load Halfword and Zero
pub fn lhz(regs: &mut RegisterFile, mem: &MemoryView, d: DForm) -> ExecResult {
    load_d(regs, mem, d, zero_half)
}

/// lhzu - Load Halfword and Zero with Update
pub fn lhzu(regs: &mut RegisterFile, mem: &MemoryView, d: DForm) -> ExecResult {
    load_du("lhzu", regs, mem, d, zero_half)
}

/// lhzx - Load Halfword and Zero Indexed
pub fn lhzx(regs: &mut RegisterFile, mem: &MemoryView, x: XForm) -> ExecResult {
    load_x(regs, mem, x, zero_half)
}

/// lhzux - Load Halfword and Zero with Update Indexed
pub fn lhzux(regs: &mut RegisterFile, mem: &MemoryView, x: XForm) -> ExecResult {
    load_xu("lhzux", regs, mem, x, zero_half)
}

/// lha - Load Halfword Algebraic
pub fn lha(regs: &mut RegisterFile, mem: &MemoryView, d: DForm) -> ExecResult {
    load_d(regs, mem, d, sign_half)
}

/// lhau - Load Halfword Algebraic with Update
pub fn lhau(regs: &mut RegisterFile, mem: &MemoryView, d: DForm) -> ExecResult {
    load_du("lhau", regs, mem, d, sign_half)
}

/// lhax - Load Halfword Algebraic Indexed
pub fn lhax(regs: &mut RegisterFile, mem: &MemoryView, x: XForm) -> ExecResult {
    load_x(regs, mem, x, sign_half)
}

/// lhaux - Load Halfword Algebraic with Update Indexed
pub fn lhaux(regs: &mut RegisterFile, mem: &MemoryView, x: XForm) -> ExecResult {
    load_xu("lhaux", regs, mem, x, sign_half)
}

/// sth - Store Halfword
pub fn sth(regs: &mut RegisterFile, mem: &mut MemoryView, d: DForm) -> ExecResult {
    store_d(regs, mem, d, half)
}

/// sthu - Store Halfword with Update
pub fn sthu(regs: &mut RegisterFile, mem: &mut MemoryView, d: DForm) -> ExecResult {
    store_du("sthu", regs, mem, d, half)
}

/// sthx - Store Halfword Indexed
pub fn sthx(regs: &mut RegisterFile, mem: &mut MemoryView, x: XForm) -> ExecResult {
    store_x(regs, mem, x, half)
}

/// sthux - Store Halfword with Update Indexed
pub fn sthux(regs: &mut RegisterFile, mem: &mut MemoryView, x: XForm) -> ExecResult {
    store_xu("sthux", regs, mem, x, half)
}

// ===== Byte =====

/// lbz - Load Byte and Zero
pub fn lbz(regs: &mut RegisterFile, mem: &MemoryView, d: DForm) -> ExecResult {
    load_d(regs, mem, d, zero_byte)
}

/// lbzu - Load Byte and Zero with Update
pub fn lbzu(regs: &mut RegisterFile, mem: &MemoryView, d: DForm) -> ExecResult {
    load_du("lbzu", regs, mem, d, zero_byte)
}

/// lbzx - Load Byte and Zero Indexed
pub fn lbzx(regs: &mut RegisterFile, mem: &MemoryView, x: XForm) -> ExecResult {
    load_x(regs, mem, x, zero_byte)
}

/// lbzux - Load Byte and Zero with Update Indexed
pub fn lbzux(regs: &mut RegisterFile, mem: &MemoryView, x: XForm) -> ExecResult {
    load_xu("lbzux", regs, mem, x, zero_byte)
}

/// stb - Store Byte
pub fn stb(regs: &mut RegisterFile, mem: &mut MemoryView, d: DForm) -> ExecResult {
    store_d(regs, mem, d, byte)
}

/// stbu - Store Byte with Update
pub fn stbu(regs: &mut RegisterFile, mem: &mut MemoryView, d: DForm) -> ExecResult {
    store_du("stbu", regs, mem, d, byte)
}

/// stbx - Store Byte Indexed
pub fn stbx(regs: &mut RegisterFile, mem: &mut MemoryView, x: XForm) -> ExecResult {
    store_x(regs, mem, x, byte)
}

/// stbux - Store Byte with Update Indexed
pub fn stbux(regs: &mut RegisterFile, mem: &mut MemoryView, x: XForm) -> ExecResult {
    store_xu("stbux", regs, mem, x, byte)
}

// ===== Byte-reversed =====

/// lwbrx - Load Word Byte-Reverse Indexed
pub fn lwbrx(regs: &mut RegisterFile, mem: &MemoryView, x: XForm) -> ExecResult {
    load_x(regs, mem, x, |v: u32| v.swap_bytes())
}

/// lhbrx - Load Halfword Byte-Reverse Indexed
pub fn lhbrx(regs: &mut RegisterFile, mem: &MemoryView, x: XForm) -> ExecResult {
    load_x(regs, mem, x, |v: u16| v.swap_bytes() as u32)
}

/// stwbrx - Store Word Byte-Reverse Indexed
pub fn stwbrx(regs: &mut RegisterFile, mem: &mut MemoryView, x: XForm) -> ExecResult {
    store_x(regs, mem, x, |v: u32| v.swap_bytes())
}

/// sthbrx - Store Halfword Byte-Reverse Indexed
pub fn sthbrx(regs: &mut RegisterFile, mem: &mut MemoryView, x: XForm) -> ExecResult {
    store_x(regs, mem, x, |v: u32| (v as u16).swap_bytes())
}

// ===== Multiple =====

/// lmw - Load Multiple Word
pub fn lmw(regs: &mut RegisterFile, mem: &MemoryView, d: DForm) -> ExecResult {
    if d.ra >= d.rt {
        return Err(PpcError::invalid(format!(
            "lmw with rA={} inside the loaded range r{}..r31",
            d.ra, d.rt
        )));
    }
    let ea = ea_d(regs, d.ra, d.d);
    check_word_aligned(ea)?;
    for (i, reg) in (d.rt..32).enumerate() {
        let value = mem.read::<u32>(ea.wrapping_add(4 * i as u32))?;
        regs.set_gpr(reg, value);
    }
    Ok(())
}

/// stmw - Store Multiple Word
pub fn stmw(regs: &mut RegisterFile, mem: &mut MemoryView, d: DForm) -> ExecResult {
    let ea = ea_d(regs, d.ra, d.d);
    check_word_aligned(ea)?;
    for (i, reg) in (d.rt..32).enumerate() {
        mem.write::<u32>(ea.wrapping_add(4 * i as u32), regs.gpr(reg))?;
    }
    Ok(())
}

// ===== String =====

/// Load `count` bytes into consecutive registers starting at `rt`, high byte first
fn load_string(regs: &mut RegisterFile, mem: &MemoryView, rt: u8, ea: u32, count: u32) -> ExecResult {
    let mut reg = rt;
    for i in 0..count {
        let lane = i % 4;
        if lane == 0 {
            if i > 0 {
                reg = (reg + 1) % 32;
            }
            regs.set_gpr(reg, 0);
        }
        let byte = mem.read::<u8>(ea.wrapping_add(i))?;
        regs.gpr[reg as usize] |= (byte as u32) << (24 - 8 * lane);
    }
    Ok(())
}

/// Store `count` bytes from consecutive registers starting at `rs`, high byte first
fn store_string(regs: &RegisterFile, mem: &mut MemoryView, rs: u8, ea: u32, count: u32) -> ExecResult {
    for i in 0..count {
        let reg = (rs as u32 + i / 4) % 32;
        let byte = (regs.gpr[reg as usize] >> (24 - 8 * (i % 4))) as u8;
        mem.write::<u8>(ea.wrapping_add(i), byte)?;
    }
    Ok(())
}

/// Reject a string load whose destination registers cover rA (r0 included) or rB
fn check_string_range(name: &str, rt: u8, count: u32, sources: &[u8]) -> ExecResult {
    let loaded = count.div_ceil(4);
    for &reg in sources {
        if (reg as u32 + 32 - rt as u32) % 32 < loaded {
            return Err(PpcError::invalid(format!(
                "{name} with r{reg} inside the loaded range starting at r{rt}"
            )));
        }
    }
    Ok(())
}

/// Immediate byte count: NB=0 means 32
#[inline]
fn string_count(nb: u8) -> u32 {
    if nb == 0 {
        32
    } else {
        nb as u32
    }
}

/// lswi - Load String Word Immediate
pub fn lswi(regs: &mut RegisterFile, mem: &MemoryView, x: XForm) -> ExecResult {
    let count = string_count(x.rb);
    check_string_range("lswi", x.rt, count, &[x.ra])?;
    let ea = regs.gpr_or_zero(x.ra);
    load_string(regs, mem, x.rt, ea, count)
}

/// lswx - Load String Word Indexed
pub fn lswx(regs: &mut RegisterFile, mem: &MemoryView, x: XForm) -> ExecResult {
    let count = regs.xer_byte_count();
    check_string_range("lswx", x.rt, count, &[x.ra, x.rb])?;
    let ea = ea_x(regs, x.ra, x.rb);
    load_string(regs, mem, x.rt, ea, count)
}

/// stswi - Store String Word Immediate
pub fn stswi(regs: &mut RegisterFile, mem: &mut MemoryView, x: XForm) -> ExecResult {
    let ea = regs.gpr_or_zero(x.ra);
    store_string(regs, mem, x.rt, ea, string_count(x.rb))
}

/// stswx - Store String Word Indexed
pub fn stswx(regs: &mut RegisterFile, mem: &mut MemoryView, x: XForm) -> ExecResult {
    let ea = ea_x(regs, x.ra, x.rb);
    let count = regs.xer_byte_count();
    store_string(regs, mem, x.rt, ea, count)
}

// ===== Reservation =====

/// lwarx - Load Word and Reserve Indexed
pub fn lwarx(regs: &mut RegisterFile, mem: &MemoryView, x: XForm) -> ExecResult {
    let ea = ea_x(regs, x.ra, x.rb);
    check_word_aligned(ea)?;
    let value = mem.read::<u32>(ea)?;
    regs.set_gpr(x.rt, value);
    regs.reservation = Some(ea);
    Ok(())
}

/// stwcx. - Store Word Conditional Indexed
pub fn stwcx(regs: &mut RegisterFile, mem: &mut MemoryView, x: XForm) -> ExecResult {
    let ea = ea_x(regs, x.ra, x.rb);
    check_word_aligned(ea)?;

    let mut flags = CrFlags::empty();
    if regs.reservation == Some(ea) {
        mem.write::<u32>(ea, regs.gpr(x.rt))?;
        flags |= CrFlags::EQ;
    }
    regs.reservation = None;
    if regs.xer_so() {
        flags |= CrFlags::SO;
    }
    regs.set_cr_field(0, flags.bits());
    Ok(())
}

// ===== External control =====

/// eciwx - External Control In Word Indexed
pub fn eciwx(regs: &mut RegisterFile, mem: &MemoryView, x: XForm) -> ExecResult {
    let ea = ea_x(regs, x.ra, x.rb);
    check_word_aligned(ea)?;
    let value = mem.read::<u32>(ea)?;
    regs.set_gpr(x.rt, value);
    Ok(())
}

/// ecowx - External Control Out Word Indexed
pub fn ecowx(regs: &mut RegisterFile, mem: &mut MemoryView, x: XForm) -> ExecResult {
    let ea = ea_x(regs, x.ra, x.rb);
    check_word_aligned(ea)?;
    mem.write::<u32>(ea, regs.gpr(x.rt))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instructions::test_support::create_test_env;
    use ge_core::error::ExceptionCause;

    fn d(rt: u8, ra: u8, disp: i16) -> DForm {
        DForm { opcd: 0, rt, ra, d: disp }
    }

    fn x(rt: u8, ra: u8, rb: u8) -> XForm {
        XForm { opcd: 31, rt, ra, rb, xo: 0, rc: false }
    }

    // ===== Load Tests =====

    #[test]
    fn test_lwz_and_sign_extension() {
        let (mut regs, mut mem) = create_test_env();
        mem.write::<u32>(0x8000_0100, 0xFFFE_1234).unwrap();
        regs.gpr[4] = 0x8000_0100;

        lwz(&mut regs, &mem, d(3, 4, 0)).unwrap();
        assert_eq!(regs.gpr[3], 0xFFFE_1234);

        lhz(&mut regs, &mem, d(3, 4, 0)).unwrap();
        assert_eq!(regs.gpr[3], 0xFFFE);

        lha(&mut regs, &mem, d(3, 4, 0)).unwrap();
        assert_eq!(regs.gpr[3], 0xFFFF_FFFE);

        lbz(&mut regs, &mem, d(3, 4, 3)).unwrap();
        assert_eq!(regs.gpr[3], 0x34);
    }

    #[test]
    fn test_update_forms_write_back_ea() {
        let (mut regs, mut mem) = create_test_env();
        regs.gpr[1] = 0x8000_1000;
        regs.gpr[5] = 0xCAFE_F00D;

        // stwu r5, -16(r1)
        stwu(&mut regs, &mut mem, d(5, 1, -16)).unwrap();
        assert_eq!(regs.gpr[1], 0x8000_0FF0);
        assert_eq!(mem.read::<u32>(0x8000_0FF0).unwrap(), 0xCAFE_F00D);

        regs.gpr[6] = 0x10;
        lwzux(&mut regs, &mem, x(7, 1, 6)).unwrap();
        assert_eq!(regs.gpr[1], 0x8000_1000);
        assert_eq!(regs.gpr[7], 0);
    }

    #[test]
    fn test_update_invalid_forms() {
        let (mut regs, mut mem) = create_test_env();
        assert!(matches!(lwzu(&mut regs, &mem, d(3, 0, 4)), Err(PpcError::Invalid(_))));
        assert!(matches!(lbzu(&mut regs, &mem, d(3, 3, 4)), Err(PpcError::Invalid(_))));
        assert!(matches!(lhaux(&mut regs, &mem, x(3, 3, 4)), Err(PpcError::Invalid(_))));
        assert!(matches!(stwu(&mut regs, &mut mem, d(3, 0, 4)), Err(PpcError::Invalid(_))));
        assert!(matches!(sthux(&mut regs, &mut mem, x(3, 0, 4)), Err(PpcError::Invalid(_))));
        // rS == rA is fine for stores
        regs.gpr[3] = 0x8000_0200;
        assert!(stwu(&mut regs, &mut mem, d(3, 3, 4)).is_ok());
        assert_eq!(mem.read::<u32>(0x8000_0204).unwrap(), 0x8000_0200);
    }

    #[test]
    fn test_faulting_load_leaves_registers() {
        let (mut regs, mem) = create_test_env();
        regs.gpr[4] = 0x8001_0000; // one past the end of the test RAM
        regs.gpr[3] = 0x1111_1111;
        let before = regs.clone();

        assert_eq!(
            lwzu(&mut regs, &mem, d(3, 4, 0)),
            Err(PpcError::fault(ExceptionCause::Dsi, 0x8001_0000))
        );
        assert_eq!(regs, before);
    }

    #[test]
    fn test_stores() {
        let (mut regs, mut mem) = create_test_env();
        regs.gpr[3] = 0x1122_3344;
        regs.gpr[4] = 0x8000_0040;
        regs.gpr[5] = 4;

        stb(&mut regs, &mut mem, d(3, 4, 0)).unwrap();
        sth(&mut regs, &mut mem, d(3, 4, 2)).unwrap();
        assert_eq!(mem.read::<u32>(0x8000_0040).unwrap(), 0x4400_3344);

        stwx(&mut regs, &mut mem, x(3, 4, 5)).unwrap();
        assert_eq!(mem.read::<u32>(0x8000_0044).unwrap(), 0x1122_3344);
    }

    #[test]
    fn test_byte_reversed() {
        let (mut regs, mut mem) = create_test_env();
        regs.gpr[3] = 0x1122_3344;
        regs.gpr[4] = 0x8000_0080;

        stwbrx(&mut regs, &mut mem, x(3, 0, 4)).unwrap();
        assert_eq!(mem.read::<u32>(0x8000_0080).unwrap(), 0x4433_2211);

        lwbrx(&mut regs, &mem, x(5, 0, 4)).unwrap();
        assert_eq!(regs.gpr[5], 0x1122_3344);

        sthbrx(&mut regs, &mut mem, x(3, 0, 4)).unwrap();
        lhbrx(&mut regs, &mem, x(6, 0, 4)).unwrap();
        assert_eq!(regs.gpr[6], 0x3344);
    }

    // ===== Multiple Tests =====

    #[test]
    fn test_lmw_stmw() {
        let (mut regs, mut mem) = create_test_env();
        for r in 29..32 {
            regs.gpr[r] = r as u32 * 0x0101_0101;
        }
        regs.gpr[1] = 0x8000_0100;
        stmw(&mut regs, &mut mem, d(29, 1, 0)).unwrap();
        assert_eq!(mem.read::<u32>(0x8000_0108).unwrap(), 31 * 0x0101_0101);

        regs.gpr[29..32].fill(0);
        lmw(&mut regs, &mem, d(29, 1, 0)).unwrap();
        assert_eq!(regs.gpr[30], 30 * 0x0101_0101);
    }

    #[test]
    fn test_lmw_checks() {
        let (mut regs, mut mem) = create_test_env();
        regs.gpr[30] = 0x8000_0100;
        assert!(matches!(lmw(&mut regs, &mem, d(29, 30, 0)), Err(PpcError::Invalid(_))));

        regs.gpr[1] = 0x8000_0102;
        assert_eq!(
            lmw(&mut regs, &mem, d(29, 1, 0)),
            Err(PpcError::fault(ExceptionCause::Alignment, 0x8000_0102))
        );
        assert_eq!(
            stmw(&mut regs, &mut mem, d(29, 1, 0)),
            Err(PpcError::fault(ExceptionCause::Alignment, 0x8000_0102))
        );
    }

    // ===== String Tests =====

    #[test]
    fn test_string_round_trip_wraps_registers() {
        let (mut regs, mut mem) = create_test_env();
        let text = b"Hello, Gekko!";
        for (i, b) in text.iter().enumerate() {
            mem.write::<u8>(0x8000_0300 + i as u32, *b).unwrap();
        }
        regs.gpr[4] = 0x8000_0300;

        // lswi r30, r4, 13 fills r30, r31, r0, r1
        lswi(&mut regs, &mem, x(30, 4, text.len() as u8)).unwrap();
        assert_eq!(regs.gpr[30], u32::from_be_bytes(*b"Hell"));
        assert_eq!(regs.gpr[31], u32::from_be_bytes(*b"o, G"));
        assert_eq!(regs.gpr[0], u32::from_be_bytes(*b"ekko"));
        assert_eq!(regs.gpr[1], u32::from_be_bytes([b'!', 0, 0, 0]));

        regs.gpr[5] = 0x8000_0400;
        regs.xer = text.len() as u32;
        stswx(&mut regs, &mut mem, x(30, 0, 5)).unwrap();
        for (i, b) in text.iter().enumerate() {
            assert_eq!(mem.read::<u8>(0x8000_0400 + i as u32).unwrap(), *b);
        }
        assert_eq!(mem.read::<u8>(0x8000_040D).unwrap(), 0);
    }

    #[test]
    fn test_lswi_zero_means_32() {
        let (mut regs, mut mem) = create_test_env();
        mem.write::<u32>(0x8000_031C, 0xAABB_CCDD).unwrap();
        regs.gpr[4] = 0x8000_0300;
        lswi(&mut regs, &mem, x(8, 4, 0)).unwrap();
        assert_eq!(regs.gpr[15], 0xAABB_CCDD);

        regs.gpr[5] = 0x8000_0500;
        stswi(&mut regs, &mut mem, x(8, 5, 0)).unwrap();
        assert_eq!(mem.read::<u32>(0x8000_051C).unwrap(), 0xAABB_CCDD);
    }

    #[test]
    fn test_lswx_zero_count_is_noop() {
        let (mut regs, mem) = create_test_env();
        regs.gpr[8] = 0x1234;
        regs.xer = 0;
        lswx(&mut regs, &mem, x(8, 0, 4)).unwrap();
        assert_eq!(regs.gpr[8], 0x1234);
    }

    #[test]
    fn test_string_load_over_address_register_is_invalid() {
        let (mut regs, mem) = create_test_env();
        regs.gpr[4] = 0x8000_0300;
        regs.gpr[5] = 0x20;
        let before = regs.clone();

        // lswi r3, r4, 8 would overwrite r4
        assert!(matches!(lswi(&mut regs, &mem, x(3, 4, 8)), Err(PpcError::Invalid(_))));
        // lswi r30, r0, 12 wraps onto r0
        assert!(matches!(lswi(&mut regs, &mem, x(30, 0, 12)), Err(PpcError::Invalid(_))));

        regs.xer = 12;
        // lswx r4, r0, r5: rB is the second loaded register
        assert!(matches!(lswx(&mut regs, &mem, x(4, 0, 5)), Err(PpcError::Invalid(_))));
        assert_eq!(regs.gpr, before.gpr, "nothing loaded");

        // lswi r3, r4, 4 loads only r3
        lswi(&mut regs, &mem, x(3, 4, 4)).unwrap();
    }

    // ===== Reservation Tests =====

    #[test]
    fn test_lwarx_stwcx() {
        let (mut regs, mut mem) = create_test_env();
        mem.write::<u32>(0x8000_0600, 41).unwrap();
        regs.gpr[4] = 0x8000_0600;

        lwarx(&mut regs, &mem, x(3, 0, 4)).unwrap();
        regs.gpr[3] += 1;
        stwcx(&mut regs, &mut mem, x(3, 0, 4)).unwrap();
        assert_eq!(mem.read::<u32>(0x8000_0600).unwrap(), 42);
        assert_eq!(regs.cr_field(0), CrFlags::EQ.bits());

        // The reservation is consumed
        regs.gpr[3] = 99;
        stwcx(&mut regs, &mut mem, x(3, 0, 4)).unwrap();
        assert_eq!(mem.read::<u32>(0x8000_0600).unwrap(), 42);
        assert_eq!(regs.cr_field(0), 0);
    }

    #[test]
    fn test_reservation_alignment() {
        let (mut regs, mut mem) = create_test_env();
        regs.gpr[4] = 0x8000_0602;
        assert_eq!(
            lwarx(&mut regs, &mem, x(3, 0, 4)),
            Err(PpcError::fault(ExceptionCause::Alignment, 0x8000_0602))
        );
        assert!(stwcx(&mut regs, &mut mem, x(3, 0, 4)).is_err());
    }

    #[test]
    fn test_external_control() {
        let (mut regs, mut mem) = create_test_env();
        regs.gpr[3] = 0x0BAD_F00D;
        regs.gpr[4] = 0x8000_0700;
        ecowx(&mut regs, &mut mem, x(3, 0, 4)).unwrap();
        eciwx(&mut regs, &mem, x(5, 0, 4)).unwrap();
        assert_eq!(regs.gpr[5], 0x0BAD_F00D);
    }
}
