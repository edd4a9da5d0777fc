//! Register-level DMA controller access
//!
//! [`Hardware`] is the seam between the channel core and a family's register
//! layout. The crate provides two implementations:
//!
//! - [`ChannelDma`](crate::ChannelDma), the channel-style controller found on
//!   STM32F0, F1, L4 and G0 parts.
//! - [`StreamDma`](crate::StreamDma), the stream-style controller found on
//!   STM32F4 parts.
//!
//! Every method takes `&self`. The controller registers are shared between
//! foreground code and interrupt handlers, and each method only touches the
//! bits of the channel it's given.

mod channel_dma;
mod stream_dma;

pub use channel_dma::ChannelDma;
pub use stream_dma::StreamDma;

use crate::{
    element::ElementSize,
    flags::{Direction, Flags},
};

use core::ops::{BitOr, BitOrAssign};

/// Event flags latched by a DMA channel
#[derive(Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Status(u8);

impl Status {
    /// No flags set
    pub const NONE: Status = Status(0);
    /// The transfer completed
    pub const COMPLETE: Status = Status(1 << 0);
    /// Half of the elements were transferred
    pub const HALF: Status = Status(1 << 1);
    /// The transfer failed
    pub const ERROR: Status = Status(1 << 2);
    /// Every flag
    pub const ALL: Status = Status(0b111);

    /// Returns `true` if no flag is set
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
    /// Is the transfer-complete flag set?
    pub const fn is_complete(self) -> bool {
        self.0 & Status::COMPLETE.0 != 0
    }
    /// Is the half-transfer flag set?
    pub const fn is_half(self) -> bool {
        self.0 & Status::HALF.0 != 0
    }
    /// Is the error flag set?
    pub const fn is_error(self) -> bool {
        self.0 & Status::ERROR.0 != 0
    }
}

impl BitOr for Status {
    type Output = Status;
    fn bitor(self, rhs: Status) -> Status {
        Status(self.0 | rhs.0)
    }
}

impl BitOrAssign for Status {
    fn bitor_assign(&mut self, rhs: Status) {
        self.0 |= rhs.0;
    }
}

impl core::fmt::Debug for Status {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Status")
            .field("complete", &self.is_complete())
            .field("half", &self.is_half())
            .field("error", &self.is_error())
            .finish()
    }
}

/// A validated transfer request
///
/// Built by [`Channel::transfer`](crate::Channel::transfer) after the
/// configuration checks pass. Implementations of [`Hardware`] may assume
/// that the count is non-zero and within [`Hardware::MAX_COUNT`], and that
/// both addresses are aligned to the element size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request {
    /// Address the channel reads from
    pub source: *const u8,
    /// Address the channel writes to
    pub destination: *mut u8,
    /// Number of elements
    pub count: u16,
    /// Decoded direction
    pub direction: Direction,
    /// Decoded element size
    pub element_size: ElementSize,
    /// Transfer configuration
    pub flags: Flags,
    /// Hardware request line, if the family multiplexes requests
    pub request_line: Option<u8>,
}

/// The request, expressed in terms of the controller's two ports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Ports {
    pub peripheral: u32,
    pub memory: u32,
    pub peripheral_increment: bool,
    pub memory_increment: bool,
}

impl Request {
    /// Assign source and destination to the peripheral and memory ports
    ///
    /// Memory-to-memory transfers read from the peripheral port, and write
    /// to the memory port, on both controller styles.
    pub(crate) fn ports(&self) -> Ports {
        let source = self.source as usize as u32;
        let destination = self.destination as usize as u32;
        match self.direction {
            Direction::PeripheralToMemory | Direction::MemoryToMemory => Ports {
                peripheral: source,
                memory: destination,
                peripheral_increment: self.flags.source_increment(),
                memory_increment: self.flags.destination_increment(),
            },
            Direction::MemoryToPeripheral => Ports {
                peripheral: destination,
                memory: source,
                peripheral_increment: self.flags.destination_increment(),
                memory_increment: self.flags.source_increment(),
            },
        }
    }
}

/// Register access for one DMA controller
///
/// # Safety
///
/// Implementations must only touch the registers and flag bits of the
/// channel passed to each method. The interrupt handler of one channel calls
/// into the same controller as the foreground code of another channel.
pub unsafe trait Hardware {
    /// Number of channels (or streams) on the controller
    const CHANNELS: usize;
    /// Largest element count of a single transfer
    const MAX_COUNT: usize = u16::MAX as usize;

    /// Number of channels this instance can drive
    ///
    /// At most [`CHANNELS`](Hardware::CHANNELS). Smaller when part of the
    /// controller can't be reached, like DMA channels beyond the end of a
    /// request multiplexer.
    fn usable_channels(&self) -> usize {
        Self::CHANNELS
    }

    /// Read the latched event flags of `channel`
    fn status(&self, channel: usize) -> Status;

    /// Clear the given event flags of `channel`, leaving others untouched
    fn clear_status(&self, channel: usize, status: Status);

    /// Program addresses, count, request line and control bits
    ///
    /// The channel is disabled when this is called.
    ///
    /// # Safety
    ///
    /// The addresses in `request` must be valid for the whole transfer.
    unsafe fn program(&self, channel: usize, request: &Request);

    /// Enable the channel, starting the programmed transfer
    ///
    /// # Safety
    ///
    /// This could start a transfer that uses an invalid source or
    /// destination. The programmed addresses must remain valid until the
    /// transfer completes.
    unsafe fn enable(&self, channel: usize);

    /// Disable the channel
    fn disable(&self, channel: usize);

    /// Is the channel enabled?
    fn is_enabled(&self, channel: usize) -> bool;

    /// Number of elements the channel has yet to transfer
    fn remaining(&self, channel: usize) -> usize;
}
