//! Transfer configuration flags
//!
//! A [`Flags`] value combines a direction, an element size, and the increment
//! options for each side of a transfer, plus the channel priority and the
//! half-transfer notification. Combine them with `|`:
//!
//! ```
//! use stm32_dma::Flags;
//!
//! let flags = Flags::MEM_TO_MEM | Flags::BITS8 | Flags::SRC_INC | Flags::DST_INC;
//! assert!(flags.source_increment());
//! ```
//!
//! The encoding is portable. The hardware layer translates it into the
//! control register bits of the selected family.

use crate::{element::ElementSize, Error, Result};

use core::ops::{BitOr, BitOrAssign};

/// Transfer direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Peripheral data register to memory
    PeripheralToMemory,
    /// Memory to peripheral data register
    MemoryToPeripheral,
    /// Memory to memory, without a hardware request
    MemoryToMemory,
}

/// Channel priority level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Priority {
    /// Low
    Low,
    /// Medium
    Medium,
    /// High
    High,
    /// Very high
    VeryHigh,
}

impl Priority {
    /// The `PL` encoding, shared by every supported family
    pub(crate) const fn raw(self) -> u32 {
        match self {
            Priority::Low => 0b00,
            Priority::Medium => 0b01,
            Priority::High => 0b10,
            Priority::VeryHigh => 0b11,
        }
    }
}

/// Transfer configuration bitmask
///
/// The default value is a peripheral-to-memory, 8-bit transfer with no
/// address increments and low priority.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Flags(u16);

const DIRECTION_MASK: u16 = 0b11;
const SIZE_OFFSET: u16 = 2;
const SIZE_MASK: u16 = 0b11 << SIZE_OFFSET;
const PRIORITY_OFFSET: u16 = 6;
const PRIORITY_MASK: u16 = 0b11 << PRIORITY_OFFSET;

impl Flags {
    /// Peripheral to memory
    pub const PERIPH_TO_MEM: Flags = Flags(0b00);
    /// Memory to peripheral
    pub const MEM_TO_PERIPH: Flags = Flags(0b01);
    /// Memory to memory
    pub const MEM_TO_MEM: Flags = Flags(0b10);

    /// 8-bit elements
    pub const BITS8: Flags = Flags(0b00 << SIZE_OFFSET);
    /// 16-bit elements
    pub const BITS16: Flags = Flags(0b01 << SIZE_OFFSET);
    /// 32-bit elements
    pub const BITS32: Flags = Flags(0b10 << SIZE_OFFSET);

    /// Advance the source address after each element
    pub const SRC_INC: Flags = Flags(1 << 4);
    /// Advance the destination address after each element
    pub const DST_INC: Flags = Flags(1 << 5);

    /// Low priority
    pub const PRIORITY_LOW: Flags = Flags(0b00 << PRIORITY_OFFSET);
    /// Medium priority
    pub const PRIORITY_MEDIUM: Flags = Flags(0b01 << PRIORITY_OFFSET);
    /// High priority
    pub const PRIORITY_HIGH: Flags = Flags(0b10 << PRIORITY_OFFSET);
    /// Very high priority
    pub const PRIORITY_VERY_HIGH: Flags = Flags(0b11 << PRIORITY_OFFSET);

    /// Raise an interrupt at the half-way point of the transfer
    ///
    /// The half-transfer event is informational. It's logged by the
    /// interrupt handler, and it never invokes the completion callback.
    pub const HALF_TRANSFER: Flags = Flags(1 << 8);

    const VALID: u16 = DIRECTION_MASK | SIZE_MASK | (1 << 4) | (1 << 5) | PRIORITY_MASK | (1 << 8);

    /// Construct flags from raw bits
    ///
    /// Returns `None` if `bits` sets anything outside of the documented
    /// encoding.
    pub const fn from_bits(bits: u16) -> Option<Self> {
        if bits & !Self::VALID != 0 {
            None
        } else {
            Some(Flags(bits))
        }
    }

    /// Returns the raw bits
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Returns `true` if every bit in `other` is set in `self`
    pub const fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Decode the transfer direction
    pub fn direction(self) -> Result<Direction> {
        match self.0 & DIRECTION_MASK {
            0b00 => Ok(Direction::PeripheralToMemory),
            0b01 => Ok(Direction::MemoryToPeripheral),
            0b10 => Ok(Direction::MemoryToMemory),
            _ => Err(Error::InvalidFlags(self.0)),
        }
    }

    /// Decode the element size
    pub fn element_size(self) -> Result<ElementSize> {
        match (self.0 & SIZE_MASK) >> SIZE_OFFSET {
            0b00 => Ok(ElementSize::Bits8),
            0b01 => Ok(ElementSize::Bits16),
            0b10 => Ok(ElementSize::Bits32),
            _ => Err(Error::InvalidFlags(self.0)),
        }
    }

    /// Decode the priority
    pub fn priority(self) -> Priority {
        match (self.0 & PRIORITY_MASK) >> PRIORITY_OFFSET {
            0b00 => Priority::Low,
            0b01 => Priority::Medium,
            0b10 => Priority::High,
            _ => Priority::VeryHigh,
        }
    }

    /// Is the source address incremented?
    pub const fn source_increment(self) -> bool {
        self.contains(Flags::SRC_INC)
    }

    /// Is the destination address incremented?
    pub const fn destination_increment(self) -> bool {
        self.contains(Flags::DST_INC)
    }

    /// Is the half-transfer interrupt requested?
    pub const fn half_transfer(self) -> bool {
        self.contains(Flags::HALF_TRANSFER)
    }
}

impl BitOr for Flags {
    type Output = Flags;
    fn bitor(self, rhs: Flags) -> Flags {
        Flags(self.0 | rhs.0)
    }
}

impl BitOrAssign for Flags {
    fn bitor_assign(&mut self, rhs: Flags) {
        self.0 |= rhs.0;
    }
}

impl core::fmt::Debug for Flags {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Flags({:#06X})", self.0)
    }
}
