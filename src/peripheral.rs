//! Peripheral transfers
//!
//! A peripheral that can raise DMA requests describes its data register,
//! and its request enable bits, through [`Source`] and [`Destination`].
//! The [`usart`], [`spi`], [`i2c`] and [`adc`] adapters implement them for
//! the STM32 register layouts.
//!
//! Each transfer function starts a channel transfer against the
//! peripheral's data register, then enables the peripheral's DMA requests.
//! The outcome reaches the channel's callback. Route the channel's interrupt
//! handler to [`on_interrupt()`](crate::Dma::on_interrupt).

pub mod adc;
pub mod i2c;
pub mod spi;
pub mod usart;

use crate::{Channel, Element, Flags, Hardware, Result};

/// A peripheral adapter without a DMA channel
///
/// Adapters take a channel, or `NoDma`, for each of their DMA paths. With
/// `NoDma`, only the blocking operations are available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NoDma;

/// A peripheral that produces data for a peripheral-to-memory transfer
///
/// A USART receiver, or an ADC.
///
/// # Safety
///
/// `source_address` must return the peripheral's data register, and the
/// address must not change. The peripheral must raise a DMA request for
/// each element once `enable_source` returns.
pub unsafe trait Source<E: Element> {
    /// Receive request line
    ///
    /// `None` on families where the request is hard-wired to the
    /// channel. Otherwise, the `CHSEL`, `CSELR` or DMAMUX value that routes
    /// the peripheral's receive request to a channel.
    fn source_signal(&self) -> Option<u8>;
    /// The data register that the channel reads
    ///
    /// `E` sets the peripheral-side access width.
    fn source_address(&self) -> *const E;
    /// Turn on the peripheral's receive DMA requests
    fn enable_source(&mut self);
    /// Turn off the peripheral's receive DMA requests
    fn disable_source(&mut self);
}

/// A peripheral that consumes data from a memory-to-peripheral transfer
///
/// A USART transmitter, or an I2C master writing to a target.
///
/// # Safety
///
/// See [`Source`]. The same rules apply to the transmit side.
pub unsafe trait Destination<E: Element> {
    /// Transmit request line
    ///
    /// See [`Source::source_signal`].
    fn destination_signal(&self) -> Option<u8>;
    /// The data register that the channel writes
    ///
    /// `E` sets the peripheral-side access width.
    fn destination_address(&self) -> *const E;
    /// Turn on the peripheral's transmit DMA requests
    fn enable_destination(&mut self);
    /// Turn off the peripheral's transmit DMA requests
    fn disable_destination(&mut self);
}

/// A peripheral that exchanges one element for another, like SPI
///
/// Each element sent clocks in the element that replaces it, so one buffer
/// serves both directions.
///
/// # Safety
///
/// In addition to the [`Source`] and [`Destination`] rules, the peripheral
/// must not receive an element before it sends the element at the same
/// position.
pub unsafe trait Bidirectional<E: Element>: Source<E> + Destination<E> {}

/// Fill `buffer` with elements from the `source` peripheral
///
/// The channel's callback receives the buffer pointer, and the number of
/// elements received.
///
/// # Example
///
/// Receive 32 bytes from USART1 with DMA1 channel 5 on an STM32F1.
///
/// ```no_run
/// use stm32_dma::{peripheral::{self, usart::UsartV1}, ChannelDma, Dma};
///
/// static DMA1: Dma<ChannelDma, 7> =
///     Dma::new(unsafe { ChannelDma::new(0x4002_0000 as *const ()) });
///
/// fn received(buffer: *mut u8, size: usize, success: bool) {
///     // ...
/// }
///
/// # fn f() -> stm32_dma::Result<()> {
/// let mut usart1 = unsafe { UsartV1::new(0x4001_3800 as *const ()) };
/// let channel = DMA1.channel(4)?;
/// channel.set_callback(received)?;
///
/// static mut BUFFER: [u8; 32] = [0; 32];
/// // Safety: BUFFER is only used here.
/// let buffer = unsafe { &mut *core::ptr::addr_of_mut!(BUFFER) };
/// peripheral::read(&channel, &mut usart1, buffer)?;
/// # Ok(()) }
/// ```
pub fn read<H, S, E>(channel: &Channel<'_, H>, source: &mut S, buffer: &'static mut [E]) -> Result<()>
where
    H: Hardware,
    S: Source<E>,
    E: Element,
{
    let flags = Flags::PERIPH_TO_MEM | E::FLAGS | Flags::DST_INC;
    // Safety: the data register is valid, otherwise the Source impl is
    // unsound. The buffer lives forever, and it's exclusively borrowed.
    unsafe {
        channel.submit(
            flags,
            buffer.as_mut_ptr().cast(),
            source.source_address().cast(),
            buffer.len(),
            source.source_signal(),
        )?;
    }
    source.enable_source();
    Ok(())
}

/// Send `buffer` to the `destination` peripheral
///
/// The channel's callback receives a null buffer pointer, and the number of
/// elements sent.
pub fn write<H, D, E>(channel: &Channel<'_, H>, buffer: &'static [E], destination: &mut D) -> Result<()>
where
    H: Hardware,
    D: Destination<E>,
    E: Element,
{
    let flags = Flags::MEM_TO_PERIPH | E::FLAGS | Flags::SRC_INC;
    // Safety: the data register is valid, otherwise the Destination impl is
    // unsound. The buffer lives forever.
    unsafe {
        channel.submit(
            flags,
            destination.destination_address() as *mut u8,
            buffer.as_ptr().cast(),
            buffer.len(),
            destination.destination_signal(),
        )?;
    }
    destination.enable_destination();
    Ok(())
}

/// Exchange `buffer` with a peripheral, using two channels
///
/// The receive transfer starts first, so it's ready for the first element
/// the transmit transfer clocks in. The receive channel's callback reports
/// the end of the exchange. If the transmit transfer can't start, the
/// receive transfer is withdrawn before the error is returned, and its
/// callback never runs.
pub fn full_duplex<H, P, E>(
    rx_channel: &Channel<'_, H>,
    tx_channel: &Channel<'_, H>,
    peripheral: &mut P,
    buffer: &'static mut [E],
) -> Result<()>
where
    H: Hardware,
    P: Bidirectional<E>,
    E: Element,
{
    let rx_flags = Flags::PERIPH_TO_MEM | E::FLAGS | Flags::DST_INC;
    let tx_flags = Flags::MEM_TO_PERIPH | E::FLAGS | Flags::SRC_INC;
    let data = buffer.as_mut_ptr();
    let len = buffer.len();

    // Safety: the data register is valid, otherwise the Bidirectional impl
    // is unsound. Each element is sent before the element received in its
    // place is written back.
    unsafe {
        rx_channel.submit(
            rx_flags,
            data.cast(),
            Source::<E>::source_address(peripheral).cast(),
            len,
            peripheral.source_signal(),
        )?;
        if let Err(error) = tx_channel.submit(
            tx_flags,
            Destination::<E>::destination_address(peripheral) as *mut u8,
            data.cast_const().cast(),
            len,
            peripheral.destination_signal(),
        ) {
            rx_channel.abort();
            return Err(error);
        }
    }

    peripheral.enable_source();
    peripheral.enable_destination();
    Ok(())
}
