//! Guest memory access for gekko-eval
//!
//! Guest RAM belongs to somebody else (usually a running emulator). This crate
//! defines how it is reached ([`MemoryProvider`]) and the only way the
//! interpreter touches it ([`MemoryView`]): typed, big-endian and bounds-checked.

pub mod constants;
pub mod provider;
pub mod view;

pub use provider::{BufferProvider, MemoryProvider};
pub use view::{GuestValue, MemoryView};
