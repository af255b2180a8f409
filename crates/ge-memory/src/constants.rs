//! GameCube/Wii memory map constants

/// Cached MEM1 mirror, where game code and data live
pub const MEM1_BASE: u32 = 0x8000_0000;
/// Uncached MEM1 mirror
pub const MEM1_UNCACHED_BASE: u32 = 0xC000_0000;
/// MEM1 size on retail hardware (24 MB)
pub const MEM1_SIZE: u32 = 0x0180_0000;

/// Mask applied to every effective address before indexing guest RAM
pub const PHYSICAL_MASK: u32 = 0x7FFF_FFFF;

/// Data cache block size, used by `dcbz`
pub const CACHE_LINE_SIZE: u32 = 32;

/// Translate an effective address to a physical RAM offset
#[inline]
pub const fn physical(addr: u32) -> u32 {
    addr & PHYSICAL_MASK
}
