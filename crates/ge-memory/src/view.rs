//! Bounds-checked big-endian view over guest RAM

use std::mem::size_of;
use std::sync::Arc;

use bytemuck::Pod;
use ge_core::error::MemoryError;

use crate::constants::physical;
use crate::provider::MemoryProvider;

/// Fixed-width value that can be stored in guest memory
///
/// Guest memory is big-endian; implementors convert between guest and host
/// byte order.
pub trait GuestValue: Pod {
    fn from_guest(self) -> Self;
    fn to_guest(self) -> Self;
}

macro_rules! impl_guest_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl GuestValue for $ty {
                #[inline]
                fn from_guest(self) -> Self {
                    <$ty>::from_be(self)
                }

                #[inline]
                fn to_guest(self) -> Self {
                    <$ty>::to_be(self)
                }
            }
        )*
    };
}

impl_guest_value!(u8, u16, u32, u64, i8, i16, i32, i64);

/// Non-owning view of guest RAM
///
/// Every access masks the effective address to a physical offset and checks
/// it against the provider's current size before touching the buffer. Errors
/// always carry the effective address the guest used, not the physical
/// offset.
#[derive(Clone)]
pub struct MemoryView {
    provider: Arc<dyn MemoryProvider>,
}

impl MemoryView {
    /// Bind a view to a provider
    pub fn new(provider: Arc<dyn MemoryProvider>) -> Self {
        Self { provider }
    }

    /// Re-bind to a different provider (e.g. after the emulator reconnects)
    pub fn rebind(&mut self, provider: Arc<dyn MemoryProvider>) {
        ge_core::memory_debug!("Memory view re-bound ({} bytes)", provider.size());
        self.provider = provider;
    }

    /// The bound provider
    pub fn provider(&self) -> &Arc<dyn MemoryProvider> {
        &self.provider
    }

    /// Current size of guest RAM in bytes
    pub fn size(&self) -> usize {
        self.provider.size()
    }

    /// Whether the provider is attached
    pub fn is_connected(&self) -> bool {
        self.provider.is_connected()
    }

    /// Whether `len` bytes at effective address `addr` lie inside guest RAM
    pub fn contains(&self, addr: u32, len: usize) -> bool {
        (physical(addr) as usize)
            .checked_add(len)
            .is_some_and(|end| end <= self.size())
    }

    fn check(&self, addr: u32, len: usize) -> Result<u32, MemoryError> {
        if !self.provider.is_connected() {
            return Err(MemoryError::Disconnected { addr });
        }
        if !self.contains(addr, len) {
            return Err(MemoryError::OutOfBounds { addr, len });
        }
        Ok(physical(addr))
    }

    /// Read a big-endian value
    #[inline]
    pub fn read<T: GuestValue>(&self, addr: u32) -> Result<T, MemoryError> {
        let phys = self.check(addr, size_of::<T>())?;
        let mut value = T::zeroed();
        self.provider
            .read_bytes(phys, bytemuck::bytes_of_mut(&mut value))
            .map_err(|e| at_effective(e, addr))?;
        Ok(value.from_guest())
    }

    /// Write a big-endian value
    #[inline]
    pub fn write<T: GuestValue>(&mut self, addr: u32, value: T) -> Result<(), MemoryError> {
        let phys = self.check(addr, size_of::<T>())?;
        let value = value.to_guest();
        self.provider
            .write_bytes(phys, bytemuck::bytes_of(&value))
            .map_err(|e| at_effective(e, addr))
    }

    /// Copy raw bytes out of guest RAM
    pub fn read_bytes(&self, addr: u32, buf: &mut [u8]) -> Result<(), MemoryError> {
        let phys = self.check(addr, buf.len())?;
        self.provider
            .read_bytes(phys, buf)
            .map_err(|e| at_effective(e, addr))
    }

    /// Copy raw bytes into guest RAM
    pub fn write_bytes(&mut self, addr: u32, data: &[u8]) -> Result<(), MemoryError> {
        let phys = self.check(addr, data.len())?;
        self.provider
            .write_bytes(phys, data)
            .map_err(|e| at_effective(e, addr))
    }
}

/// Rewrite a provider error to report the guest's effective address
fn at_effective(err: MemoryError, addr: u32) -> MemoryError {
    match err {
        MemoryError::OutOfBounds { len, .. } => MemoryError::OutOfBounds { addr, len },
        MemoryError::Disconnected { .. } => MemoryError::Disconnected { addr },
        MemoryError::Provider { message, .. } => MemoryError::Provider { addr, message },
    }
}
