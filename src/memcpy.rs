//! DMA-powered memcpy

use crate::{Channel, Element, Flags, Hardware, Result};

/// Perform a DMA-powered `memcpy` between the `source` and `destination` buffers
///
/// Copies the minimum number of elements between the two buffers, and
/// returns that count. The copy runs in the background. When it's done,
/// the channel's callback receives the destination buffer, the count, and
/// the outcome. You're responsible for enabling the channel's interrupt,
/// and calling [`on_interrupt`](crate::Dma::on_interrupt) when it fires.
///
/// Both buffers are `'static`, and the destination is borrowed for the rest
/// of the program. Recover it in the callback from the pointer and size.
pub fn memcpy<H: Hardware, E: Element>(
    channel: &Channel<'_, H>,
    source: &'static [E],
    destination: &'static mut [E],
) -> Result<usize> {
    let count = source.len().min(destination.len());
    let flags = Flags::MEM_TO_MEM | E::FLAGS | Flags::SRC_INC | Flags::DST_INC;
    // Safety: both buffers live forever, and the destination is
    // exclusively borrowed. The count doesn't exceed either buffer.
    unsafe {
        channel.transfer(
            flags,
            destination.as_mut_ptr().cast(),
            source.as_ptr().cast(),
            count,
        )?;
    }
    Ok(count)
}
