//! Memory providers
//!
//! A provider owns (or attaches to) the guest RAM buffer. The interpreter never
//! owns guest memory: it borrows a provider through [`crate::MemoryView`], and
//! the provider decides what "connected" means (an attached emulator process,
//! or simply a local buffer).

use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};

use ge_core::error::MemoryError;
use parking_lot::RwLock;

/// Source of guest RAM
///
/// Addresses passed to a provider are physical offsets into guest RAM; the
/// view has already applied the physical mask and the bounds check.
pub trait MemoryProvider: Send + Sync {
    /// Copy `buf.len()` bytes starting at `addr` into `buf`
    fn read_bytes(&self, addr: u32, buf: &mut [u8]) -> Result<(), MemoryError>;

    /// Copy `data` into guest RAM starting at `addr`
    fn write_bytes(&self, addr: u32, data: &[u8]) -> Result<(), MemoryError>;

    /// Whether the backing memory is currently available
    fn is_connected(&self) -> bool;

    /// Size of the backing buffer in bytes
    fn size(&self) -> usize;
}

/// In-process guest RAM
///
/// Used for RAM images loaded from disk and for tests. It can be marked
/// disconnected to model a detached emulator.
pub struct BufferProvider {
    buffer: RwLock<Vec<u8>>,
    connected: AtomicBool,
}

impl BufferProvider {
    /// Create a zero-filled buffer of `size` bytes
    pub fn new(size: usize) -> Self {
        Self::from_bytes(vec![0; size])
    }

    /// Wrap an existing RAM image
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            buffer: RwLock::new(bytes),
            connected: AtomicBool::new(true),
        }
    }

    /// Grow or shrink the buffer, zero-filling new space
    pub fn resize(&self, size: usize) {
        self.buffer.write().resize(size, 0);
    }

    /// Mark the provider attached or detached
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
    }

    /// Copy the whole buffer out
    pub fn snapshot(&self) -> Vec<u8> {
        self.buffer.read().clone()
    }

    fn range(addr: u32, len: usize, size: usize) -> Result<Range<usize>, MemoryError> {
        let start = addr as usize;
        match start.checked_add(len) {
            Some(end) if end <= size => Ok(start..end),
            _ => Err(MemoryError::OutOfBounds { addr, len }),
        }
    }
}

impl MemoryProvider for BufferProvider {
    fn read_bytes(&self, addr: u32, buf: &mut [u8]) -> Result<(), MemoryError> {
        if !self.is_connected() {
            return Err(MemoryError::Disconnected { addr });
        }
        let buffer = self.buffer.read();
        let range = Self::range(addr, buf.len(), buffer.len())?;
        buf.copy_from_slice(&buffer[range]);
        Ok(())
    }

    fn write_bytes(&self, addr: u32, data: &[u8]) -> Result<(), MemoryError> {
        if !self.is_connected() {
            return Err(MemoryError::Disconnected { addr });
        }
        let mut buffer = self.buffer.write();
        let range = Self::range(addr, data.len(), buffer.len())?;
        buffer[range].copy_from_slice(data);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn size(&self) -> usize {
        self.buffer.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_write_bytes() {
        let provider = BufferProvider::new(0x100);
        provider.write_bytes(0x10, &[1, 2, 3, 4]).unwrap();

        let mut buf = [0u8; 4];
        provider.read_bytes(0x10, &mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3, 4]);
    }

    #[test]
    fn test_out_of_range() {
        let provider = BufferProvider::new(0x100);
        let mut buf = [0u8; 4];
        assert_eq!(
            provider.read_bytes(0xFE, &mut buf),
            Err(MemoryError::OutOfBounds { addr: 0xFE, len: 4 })
        );
        assert!(provider.write_bytes(0x100, &[0]).is_err());
    }

    #[test]
    fn test_disconnected() {
        let provider = BufferProvider::new(0x100);
        provider.set_connected(false);

        let mut buf = [0u8; 1];
        assert_eq!(
            provider.read_bytes(0, &mut buf),
            Err(MemoryError::Disconnected { addr: 0 })
        );

        provider.set_connected(true);
        assert!(provider.read_bytes(0, &mut buf).is_ok());
    }

    #[test]
    fn test_resize() {
        let provider = BufferProvider::new(0x10);
        provider.resize(0x20);
        assert_eq!(provider.size(), 0x20);
        assert!(provider.write_bytes(0x1C, &[0xAA; 4]).is_ok());
    }
}
