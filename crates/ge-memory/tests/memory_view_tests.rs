//! Bounds and byte-order tests for the guest memory view

use std::sync::Arc;

use ge_core::error::MemoryError;
use ge_memory::{constants::*, BufferProvider, MemoryProvider, MemoryView};

fn mem1_view() -> (Arc<BufferProvider>, MemoryView) {
    let provider = Arc::new(BufferProvider::new(MEM1_SIZE as usize));
    let view = MemoryView::new(provider.clone());
    (provider, view)
}

#[test]
fn test_mem1_boundaries() {
    let (_provider, mut view) = mem1_view();

    view.write::<u32>(MEM1_BASE, 0xDEAD_BEEF).unwrap();
    assert_eq!(view.read::<u32>(MEM1_BASE).unwrap(), 0xDEAD_BEEF);

    let last_word = MEM1_BASE + MEM1_SIZE - 4;
    view.write::<u32>(last_word, 0xCAFE_BABE).unwrap();
    assert_eq!(view.read::<u32>(last_word).unwrap(), 0xCAFE_BABE);
}

#[test]
fn test_access_at_size_faults() {
    let (provider, mut view) = mem1_view();
    let end = MEM1_BASE + MEM1_SIZE;

    assert!(matches!(
        view.read::<u8>(end),
        Err(MemoryError::OutOfBounds { addr, .. }) if addr == end
    ));
    assert!(view.write::<u64>(end - 4, u64::MAX).is_err());

    // The straddling write must not have touched the last in-range bytes
    let mut tail = [0u8; 4];
    provider.read_bytes(MEM1_SIZE - 4, &mut tail).unwrap();
    assert_eq!(tail, [0; 4]);
}

#[test]
fn test_high_addresses_mask_to_physical() {
    let (_provider, mut view) = mem1_view();

    // 0xC0000000 masks to 0x40000000, far past MEM1
    assert!(view.read::<u32>(MEM1_UNCACHED_BASE).is_err());

    view.write::<u64>(0x0000_1000, 0x0102_0304_0506_0708).unwrap();
    assert_eq!(view.read::<u64>(MEM1_BASE + 0x1000).unwrap(), 0x0102_0304_0506_0708);
    assert_eq!(view.read::<u32>(MEM1_BASE + 0x1004).unwrap(), 0x0506_0708);
}

#[test]
fn test_resize_changes_bounds() {
    let provider = Arc::new(BufferProvider::new(0x100));
    let view = MemoryView::new(provider.clone());

    assert!(view.read::<u32>(MEM1_BASE + 0x100).is_err());
    provider.resize(0x200);
    assert_eq!(view.read::<u32>(MEM1_BASE + 0x100).unwrap(), 0);
}

#[test]
fn test_reconnect() {
    let (provider, view) = mem1_view();
    provider.set_connected(false);
    assert!(!view.is_connected());
    assert!(view.read::<u32>(MEM1_BASE).is_err());

    provider.set_connected(true);
    assert!(view.read::<u32>(MEM1_BASE).is_ok());
}
