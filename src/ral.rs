//! A RAL-like module for the registers this crate touches
//!
//! The vendor PACs describe every DMA channel and stream as a separate set of
//! registers. Here, channels and streams are arrays of register clusters, so
//! the driver can index them at runtime. Field modules follow the RAL shape,
//! so the `ral-registers` macros work against them.
//!
//! Only the DMA controllers, the request multiplexers, and the status, data
//! and DMA-enable bits of the bound peripherals are described.

#![allow(
    non_snake_case, // Compatibility with RAL
    non_upper_case_globals,
    dead_code, // Not every field is used by every family
)]

/// Declare RAL field modules
///
/// Each field gets an `offset`, a `mask`, and the empty `R` / `W` / `RW`
/// enumeration modules that the `ral-registers` macros import.
macro_rules! fields {
    ($($field:ident: $offset:expr, $width:expr;)+) => {
        $(
            pub mod $field {
                pub const offset: u32 = $offset;
                pub const mask: u32 = ((1 << $width) - 1) << offset;
                pub mod R {}
                pub mod W {}
                pub mod RW {}
            }
        )+
    };
}

pub mod adc;
pub mod bdma;
pub mod dmamux;
pub mod i2c;
pub mod spi;
pub mod stream;
pub mod usart;

pub use ral_registers::{modify_reg, read_reg, write_reg};

//
// Helper types for static memory
//
// Similar to the RAL's `Instance` type, but more copy.
//

pub struct Static<T>(pub *const T);
impl<T> core::ops::Deref for Static<T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        // Safety: pointer points to static memory (peripheral memory)
        unsafe { &*self.0 }
    }
}
impl<T> Clone for Static<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for Static<T> {}
