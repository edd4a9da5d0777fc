//! DMA interrupt support
//!
//! One interrupt vector may serve several channels. Dispatch calls every
//! channel's handler on that vector, and each handler filters on its own
//! status flags. Calling the handler of a channel that did not raise the
//! interrupt does nothing.

use crate::hardware::Hardware;

use core::cell::Cell;

use cortex_m::interrupt::InterruptNumber;
use critical_section::Mutex;

/// A transfer completion callback
///
/// Invoked from interrupt context with
///
/// - the buffer that received data, or null when the destination was a
///   peripheral,
/// - the number of elements transferred,
/// - `true` when the transfer completed without error.
///
/// The callback runs outside of any critical section. It may start the
/// next transfer on its own channel.
pub type Callback = fn(*mut u8, usize, bool);

/// The transfer a channel is working on
#[derive(Clone, Copy)]
pub(crate) struct InFlight {
    pub buffer: *mut u8,
    pub size: usize,
    /// Latched when the transfer starts
    pub callback: Option<Callback>,
}

// Safety: the buffer pointer is only handed back to the callback. It's
// never dereferenced by the driver.
unsafe impl Send for InFlight {}

/// Runtime state of one channel
pub(crate) struct ChannelState {
    callback: Mutex<Cell<Option<Callback>>>,
    in_flight: Mutex<Cell<Option<InFlight>>>,
}

impl ChannelState {
    pub const NEW: ChannelState = ChannelState {
        callback: Mutex::new(Cell::new(None)),
        in_flight: Mutex::new(Cell::new(None)),
    };

    /// Replace the registered callback, unless a transfer is in flight
    pub fn set_callback(&self, callback: Option<Callback>) -> bool {
        critical_section::with(|cs| {
            if self.in_flight.borrow(cs).get().is_some() {
                false
            } else {
                self.callback.borrow(cs).set(callback);
                true
            }
        })
    }

    pub fn is_busy(&self) -> bool {
        critical_section::with(|cs| self.in_flight.borrow(cs).get().is_some())
    }

    /// Claim the channel for a new transfer
    ///
    /// The registered callback is latched into the in-flight record. Returns
    /// `false` if another transfer is already in flight.
    pub fn start(&self, buffer: *mut u8, size: usize) -> bool {
        critical_section::with(|cs| {
            let in_flight = self.in_flight.borrow(cs);
            if in_flight.get().is_some() {
                return false;
            }
            in_flight.set(Some(InFlight {
                buffer,
                size,
                callback: self.callback.borrow(cs).get(),
            }));
            true
        })
    }

    /// Remove and return the in-flight record
    pub fn finish(&self) -> Option<InFlight> {
        critical_section::with(|cs| self.in_flight.borrow(cs).take())
    }
}

/// Handle the interrupt of one channel
///
/// Reads the channel's own flags, and returns if none are set. Otherwise
/// clears exactly the flags it read. On completion or error, disables the
/// channel and delivers the outcome to the callback latched for the
/// transfer. The transfer succeeded only if it completed, without error,
/// and with no elements left.
pub(crate) fn on_interrupt<H: Hardware>(hardware: &H, state: &ChannelState, channel: usize) {
    let status = hardware.status(channel);
    if status.is_empty() {
        return;
    }
    hardware.clear_status(channel, status);

    if !status.is_complete() && !status.is_error() {
        trace!("DMA channel {} half transfer", channel);
        return;
    }

    let remaining = hardware.remaining(channel);
    hardware.disable(channel);

    let Some(transfer) = state.finish() else {
        debug!("DMA channel {} event with no transfer in flight", channel);
        return;
    };

    // A stream that's disabled early also latches the complete flag, with
    // elements left over.
    let success = status.is_complete() && !status.is_error() && remaining == 0;
    let transferred = transfer.size.saturating_sub(remaining);

    if success {
        trace!("DMA channel {} complete, {} elements", channel, transferred);
    } else {
        warn!(
            "DMA channel {} error after {} of {} elements",
            channel,
            transferred,
            transfer.size
        );
    }

    if let Some(callback) = transfer.callback {
        callback(transfer.buffer, transferred, success);
    }
}

/// A DMA interrupt vector
///
/// Describes one entry of a family's vector table, and the channels that
/// share it. Channel indices are zero based: `DMA1_Channel1` serves
/// channel 0.
///
/// `Vector` implements [`InterruptNumber`], so it can be unmasked directly:
///
/// ```no_run
/// # #[cfg(feature = "stm32f1")] {
/// use stm32_dma::device::DMA1_CHANNEL4;
///
/// // Safety: the handler for DMA1_Channel4 is linked.
/// unsafe { cortex_m::peripheral::NVIC::unmask(DMA1_CHANNEL4) };
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vector {
    /// The vendor's handler name
    pub name: &'static str,
    /// Position in the vector table, after the system exceptions
    pub number: u16,
    /// The controller that raises this interrupt, 1 for DMA1
    pub controller: u8,
    /// The controller's channels (or streams) that share this vector
    pub channels: &'static [usize],
}

impl Vector {
    /// Returns `true` if `channel` raises this vector
    pub fn serves(&self, channel: usize) -> bool {
        self.channels.contains(&channel)
    }
}

// Safety: the numbers come from the vendor vector tables.
unsafe impl InterruptNumber for Vector {
    fn number(self) -> u16 {
        self.number
    }
}

/// Define DMA interrupt handlers
///
/// For each vector, emits an externally linkable handler with the vendor's
/// name. The handler calls [`Dma::on_interrupt`](crate::Dma::on_interrupt)
/// for every listed channel.
///
/// ```no_run
/// use stm32_dma::{dma_interrupt, ChannelDma, Dma};
///
/// static DMA1: Dma<ChannelDma, 7> = Dma::new(unsafe { ChannelDma::new(0x4002_0000 as _) });
///
/// dma_interrupt! {
///     DMA1_Channel1 => DMA1: [0],
///     DMA1_Channel2_3 => DMA1: [1, 2],
/// }
/// ```
#[macro_export]
macro_rules! dma_interrupt {
    ($(
        $vector:ident => $dma:path : [$($channel:expr),+ $(,)?]
    ),+ $(,)?) => {$(
        #[allow(non_snake_case)]
        #[no_mangle]
        pub extern "C" fn $vector() {
            $( $dma.on_interrupt($channel); )+
        }
    )+};
}

#[cfg(test)]
mod tests {
    use super::*;

    fn callback(_: *mut u8, _: usize, _: bool) {}

    #[test]
    fn callback_is_latched_at_start() {
        let state = ChannelState::NEW;
        assert!(state.set_callback(Some(callback)));
        assert!(state.start(core::ptr::null_mut(), 4));

        // Replacing the callback is refused while the transfer runs.
        assert!(!state.set_callback(None));
        assert!(state.is_busy());
        assert!(!state.start(core::ptr::null_mut(), 4));

        let transfer = state.finish().unwrap();
        assert_eq!(transfer.size, 4);
        assert!(transfer.callback.is_some());
        assert!(!state.is_busy());
        assert!(state.finish().is_none());
    }

    #[test]
    fn vector_number() {
        static CHANNELS: [usize; 2] = [1, 2];
        let vector = Vector {
            name: "DMA1_Channel2_3",
            number: 10,
            controller: 1,
            channels: &CHANNELS,
        };
        assert_eq!(InterruptNumber::number(vector), 10);
        assert!(vector.serves(2));
        assert!(!vector.serves(0));
    }
}
