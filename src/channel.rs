//! DMA channel

use crate::{
    flags::{Direction, Flags},
    hardware::{Hardware, Request, Status},
    interrupt::{self, Callback, ChannelState},
    Error, Result,
};

use core::sync::atomic::{compiler_fence, Ordering};

/// A DMA channel
///
/// A `Channel` is a handle to one channel (or stream) of a [`Dma`](crate::Dma)
/// controller. Use [`Dma::channel`](crate::Dma::channel) to acquire one.
///
/// A channel runs one transfer at a time. Starting a transfer returns
/// immediately. When the hardware completes the transfer, or reports an
/// error, the channel's interrupt handler invokes the callback that was
/// registered when the transfer started.
pub struct Channel<'a, H> {
    /// Our channel number, expected to be less than the controller's channel count
    index: usize,
    hardware: &'a H,
    state: &'a ChannelState,
}

impl<'a, H: Hardware> Channel<'a, H> {
    pub(crate) fn new(index: usize, hardware: &'a H, state: &'a ChannelState) -> Self {
        Channel {
            index,
            hardware,
            state,
        }
    }

    /// Returns the DMA channel number
    ///
    /// Channels are numbered from zero. `DMA1_Channel1` is channel 0.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Register the completion callback
    ///
    /// Replaces any previous callback. The callback is used for every
    /// transfer started after this call.
    ///
    /// Returns [`Error::Busy`] if a transfer is in flight. The in-flight
    /// transfer keeps the callback it started with.
    pub fn set_callback(&self, callback: Callback) -> Result<()> {
        self.replace_callback(Some(callback))
    }

    /// Remove the completion callback
    ///
    /// Transfers started after this call complete silently.
    pub fn clear_callback(&self) -> Result<()> {
        self.replace_callback(None)
    }

    fn replace_callback(&self, callback: Option<Callback>) -> Result<()> {
        if self.state.set_callback(callback) {
            Ok(())
        } else {
            Err(Error::Busy(self.index))
        }
    }

    /// Start a transfer of `size` elements from `source` to `destination`
    ///
    /// `flags` selects the direction, the element size, and whether each
    /// address advances after every element. The peripheral address of a
    /// peripheral transfer is usually a data register, so it usually does
    /// not increment.
    ///
    /// This call does not wait for the transfer. The outcome is delivered to
    /// the callback by [`on_interrupt`](Channel::on_interrupt).
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidFlags`] if `flags` selects a reserved encoding.
    /// - [`Error::EmptyTransfer`] if `size` is zero.
    /// - [`Error::TransferTooLarge`] if `size` exceeds the count register.
    /// - [`Error::Misaligned`] if an address isn't aligned to the element size.
    /// - [`Error::Busy`] if the channel has a transfer in flight.
    ///
    /// # Safety
    ///
    /// `source` must be readable, and `destination` must be writable, for the
    /// whole transfer. Caller must make sure that the memory stays valid, and
    /// isn't otherwise accessed, until the callback runs.
    pub unsafe fn transfer(
        &self,
        flags: Flags,
        destination: *mut u8,
        source: *const u8,
        size: usize,
    ) -> Result<()> {
        self.submit(flags, destination, source, size, None)
    }

    /// Like [`transfer`](Channel::transfer), with a hardware request line
    ///
    /// Families that multiplex requests route `request_line` to this channel
    /// before the transfer starts: `CHSEL` on F4, `CSELR` on L4, and the
    /// DMAMUX request ID on G0. Other families ignore it.
    ///
    /// # Safety
    ///
    /// See [`transfer`](Channel::transfer).
    pub unsafe fn transfer_with_request(
        &self,
        flags: Flags,
        destination: *mut u8,
        source: *const u8,
        size: usize,
        request_line: u8,
    ) -> Result<()> {
        self.submit(flags, destination, source, size, Some(request_line))
    }

    pub(crate) unsafe fn submit(
        &self,
        flags: Flags,
        destination: *mut u8,
        source: *const u8,
        size: usize,
        request_line: Option<u8>,
    ) -> Result<()> {
        let direction = flags.direction()?;
        let element_size = flags.element_size()?;

        if size == 0 {
            return Err(Error::EmptyTransfer);
        }
        if size > H::MAX_COUNT {
            return Err(Error::TransferTooLarge {
                requested: size,
                max: H::MAX_COUNT,
            });
        }
        for address in [source as usize, destination as usize] {
            if address % element_size.bytes() != 0 {
                return Err(Error::Misaligned(address));
            }
        }
        if self.hardware.is_enabled(self.index) {
            return Err(Error::Busy(self.index));
        }

        let buffer = match direction {
            Direction::MemoryToPeripheral => core::ptr::null_mut(),
            Direction::PeripheralToMemory | Direction::MemoryToMemory => destination,
        };
        if !self.state.start(buffer, size) {
            return Err(Error::Busy(self.index));
        }

        let request = Request {
            source,
            destination,
            // Bounded by MAX_COUNT.
            count: size as u16,
            direction,
            element_size,
            flags,
            request_line,
        };
        self.start(&request);
        Ok(())
    }

    /// Program the hardware and enable the channel
    ///
    /// The in-flight record is already in place, so a completion that fires
    /// right after enabling finds it.
    unsafe fn start(&self, request: &Request) {
        let hw = self.hardware;
        hw.disable(self.index);
        hw.clear_status(self.index, Status::ALL);
        hw.program(self.index, request);
        trace!(
            "DMA channel {} start, {} elements, flags {:?}",
            self.index,
            request.count,
            request.flags
        );
        // Make sure the buffers are written before the channel reads them.
        compiler_fence(Ordering::Release);
        hw.enable(self.index);
    }

    /// Handle this channel's interrupt
    ///
    /// Does nothing if the channel raised no flags. See
    /// [`Dma::on_interrupt`](crate::Dma::on_interrupt).
    pub fn on_interrupt(&self) {
        interrupt::on_interrupt(self.hardware, self.state, self.index);
    }

    /// Returns `true` if a transfer is in flight
    ///
    /// A transfer stays in flight until its completion or error interrupt is
    /// handled.
    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }

    /// Indicates if this DMA channel is enabled
    pub fn is_enabled(&self) -> bool {
        self.hardware.is_enabled(self.index)
    }

    /// Number of elements the channel has yet to transfer
    pub fn remaining(&self) -> usize {
        self.hardware.remaining(self.index)
    }

    /// Disable the DMA channel
    ///
    /// This stops the hardware. If the hardware latched a completion or
    /// error, the transfer stays in flight, and the next interrupt delivers
    /// it to the callback. A stream stopped early (STM32F4) latches its
    /// complete flag, so the callback reports the elements moved so far,
    /// and `success = false`. Otherwise the transfer is dropped without a
    /// callback, and the channel is free for the next transfer.
    pub fn disable(&self) {
        self.hardware.disable(self.index);
        if self.hardware.status(self.index).is_empty() && self.state.finish().is_some() {
            debug!("DMA channel {} disabled with a transfer in flight", self.index);
        }
    }

    /// Withdraw a transfer that was just started, without a callback
    ///
    /// The record goes first, so an interrupt that fires while the channel
    /// stops finds nothing to report.
    pub(crate) fn abort(&self) {
        if self.state.finish().is_some() {
            debug!("DMA channel {} transfer withdrawn", self.index);
        }
        self.hardware.disable(self.index);
        self.hardware.clear_status(self.index, Status::ALL);
    }
}
