//! DMA elements

use crate::flags::Flags;

/// The width of one element moved per DMA request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ElementSize {
    /// 8 bits
    Bits8,
    /// 16 bits
    Bits16,
    /// 32 bits
    Bits32,
}

impl ElementSize {
    /// Returns the number of bytes in one element
    pub const fn bytes(self) -> usize {
        match self {
            ElementSize::Bits8 => 1,
            ElementSize::Bits16 => 2,
            ElementSize::Bits32 => 4,
        }
    }

    /// The `PSIZE` / `MSIZE` encoding, shared by every supported family
    pub(crate) const fn raw(self) -> u32 {
        match self {
            ElementSize::Bits8 => 0b00,
            ElementSize::Bits16 => 0b01,
            ElementSize::Bits32 => 0b10,
        }
    }
}

mod private {
    pub trait Sealed {}
    impl Sealed for u8 {}
    impl Sealed for u16 {}
    impl Sealed for u32 {}
}

/// An element that can be moved by a DMA channel
///
/// This trait is sealed. It's implemented for `u8`, `u16` and `u32`.
pub trait Element: Copy + private::Sealed {
    /// Element width
    const SIZE: ElementSize;
    /// The matching [`Flags`] size selection
    const FLAGS: Flags;
}

impl Element for u8 {
    const SIZE: ElementSize = ElementSize::Bits8;
    const FLAGS: Flags = Flags::BITS8;
}

impl Element for u16 {
    const SIZE: ElementSize = ElementSize::Bits16;
    const FLAGS: Flags = Flags::BITS16;
}

impl Element for u32 {
    const SIZE: ElementSize = ElementSize::Bits32;
    const FLAGS: Flags = Flags::BITS32;
}
