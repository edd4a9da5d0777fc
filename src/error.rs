//! DMA errors

use core::fmt::{self, Display};

/// A DMA configuration error
///
/// These are the preconditions checked before a transfer starts. Errors
/// that the hardware reports while a transfer is running are not surfaced
/// here; they reach the transfer callback as `success = false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// The channel index does not exist on this controller
    InvalidChannel(usize),
    /// The raw flags select a reserved direction or element size
    InvalidFlags(u16),
    /// A transfer must move at least one element
    EmptyTransfer,
    /// The element count does not fit the hardware count register
    TransferTooLarge {
        /// Elements requested by the caller
        requested: usize,
        /// Largest count the channel accepts
        max: usize,
    },
    /// An address is not aligned to the element size
    Misaligned(usize),
    /// The channel has a transfer in flight
    Busy(usize),
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::InvalidChannel(index) => write!(f, "DMA channel {index} does not exist"),
            Error::InvalidFlags(bits) => write!(f, "invalid DMA flags {bits:#06X}"),
            Error::EmptyTransfer => f.write_str("DMA transfer of zero elements"),
            Error::TransferTooLarge { requested, max } => write!(
                f,
                "DMA transfer of {requested} elements exceeds the maximum of {max}"
            ),
            Error::Misaligned(address) => {
                write!(f, "address {address:#010X} is not aligned to the element size")
            }
            Error::Busy(index) => write!(f, "DMA channel {index} has a transfer in flight"),
        }
    }
}
