//! SPI adapter
//!
//! [`Spi`] wraps a configured SPI register block. The blocking operations
//! follow the `nb` full-duplex model: [`send`](Spi::send) a word, then
//! [`read`](Spi::read) the word clocked in with it. With a transmit channel,
//! [`write_dma`](Spi::write_dma) sends a buffer and discards what comes
//! back. With both channels, [`transfer_dma`](Spi::transfer_dma) exchanges a
//! buffer in place.

use super::{Bidirectional, Destination, NoDma, Source};
use crate::{
    ral::{self, spi, Static},
    Channel, Hardware, Result,
};

/// SPI errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// A received word was not read before the next one arrived
    Overrun,
    /// Another master drove NSS low
    ModeFault,
}

/// An SPI register block
pub struct SpiRegisters {
    registers: Static<spi::RegisterBlock>,
    tx_request: Option<u8>,
    rx_request: Option<u8>,
}

// Safety: owns its SPI instance.
unsafe impl Send for SpiRegisters {}

impl SpiRegisters {
    /// Wrap the SPI at `base`
    ///
    /// # Safety
    ///
    /// `base` must point to an SPI register block, and the caller must not
    /// use that SPI through any other handle.
    pub const unsafe fn new(base: *const ()) -> Self {
        SpiRegisters {
            registers: Static(base.cast()),
            tx_request: None,
            rx_request: None,
        }
    }

    /// Set the DMA request lines, for families that multiplex requests
    pub const fn with_requests(mut self, tx: u8, rx: u8) -> Self {
        self.tx_request = Some(tx);
        self.rx_request = Some(rx);
        self
    }

    fn check_errors(&self) -> core::result::Result<(), Error> {
        let spi = &*self.registers;
        let (modf, ovr) = ral::read_reg!(crate::ral::spi, spi, SR, MODF, OVR);
        if ovr != 0 {
            // Cleared by reading DR, then SR.
            let _ = spi.DR.read();
            let _ = spi.SR.read();
            Err(Error::Overrun)
        } else if modf != 0 {
            Err(Error::ModeFault)
        } else {
            Ok(())
        }
    }
}

unsafe impl Source<u8> for SpiRegisters {
    fn source_signal(&self) -> Option<u8> {
        self.rx_request
    }
    fn source_address(&self) -> *const u8 {
        &self.registers.DR as *const _ as *const u8
    }
    fn enable_source(&mut self) {
        let spi = &*self.registers;
        ral::modify_reg!(crate::ral::spi, spi, CR2, RXDMAEN: 1);
    }
    fn disable_source(&mut self) {
        let spi = &*self.registers;
        ral::modify_reg!(crate::ral::spi, spi, CR2, RXDMAEN: 0);
    }
}

unsafe impl Destination<u8> for SpiRegisters {
    fn destination_signal(&self) -> Option<u8> {
        self.tx_request
    }
    fn destination_address(&self) -> *const u8 {
        &self.registers.DR as *const _ as *const u8
    }
    fn enable_destination(&mut self) {
        let spi = &*self.registers;
        ral::modify_reg!(crate::ral::spi, spi, CR2, TXDMAEN: 1);
    }
    fn disable_destination(&mut self) {
        let spi = &*self.registers;
        ral::modify_reg!(crate::ral::spi, spi, CR2, TXDMAEN: 0);
    }
}

unsafe impl Bidirectional<u8> for SpiRegisters {}

/// An SPI bus, with optional DMA channels
pub struct Spi<TX = NoDma, RX = NoDma> {
    spi: SpiRegisters,
    tx: TX,
    rx: RX,
}

impl Spi {
    /// Wrap a configured SPI, without DMA
    pub fn new(spi: SpiRegisters) -> Self {
        Spi {
            spi,
            tx: NoDma,
            rx: NoDma,
        }
    }
}

impl<TX, RX> Spi<TX, RX> {
    /// Use `channel` to transmit
    pub fn with_tx_dma<'a, H: Hardware>(
        self,
        channel: Channel<'a, H>,
    ) -> Spi<Channel<'a, H>, RX> {
        Spi {
            spi: self.spi,
            tx: channel,
            rx: self.rx,
        }
    }

    /// Use `channel` to receive
    pub fn with_rx_dma<'a, H: Hardware>(
        self,
        channel: Channel<'a, H>,
    ) -> Spi<TX, Channel<'a, H>> {
        Spi {
            spi: self.spi,
            tx: self.tx,
            rx: channel,
        }
    }

    /// Send a word
    pub fn send(&mut self, word: u8) -> nb::Result<(), Error> {
        self.spi.check_errors()?;
        let spi = &*self.spi.registers;
        if ral::read_reg!(crate::ral::spi, spi, SR, TXE == 1) {
            // Byte-wide access, so that the 16-bit data register sends one frame.
            let dr = core::ptr::addr_of!(spi.DR).cast::<u8>().cast_mut();
            // Safety: DR is a valid register address.
            unsafe { dr.write_volatile(word) };
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    /// Read the word received during the last `send`
    pub fn read(&mut self) -> nb::Result<u8, Error> {
        self.spi.check_errors()?;
        let spi = &*self.spi.registers;
        if ral::read_reg!(crate::ral::spi, spi, SR, RXNE == 1) {
            let dr = core::ptr::addr_of!(spi.DR).cast::<u8>();
            // Safety: DR is a valid register address.
            Ok(unsafe { dr.read_volatile() })
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    /// Exchange `words` in place, blocking
    pub fn transfer<'w>(&mut self, words: &'w mut [u8]) -> core::result::Result<&'w [u8], Error> {
        for word in words.iter_mut() {
            nb::block!(self.send(*word))?;
            *word = nb::block!(self.read())?;
        }
        Ok(words)
    }

    /// Returns `true` while the bus is busy
    pub fn is_busy(&self) -> bool {
        let spi = &*self.spi.registers;
        ral::read_reg!(crate::ral::spi, spi, SR, BSY == 1)
    }

    /// Release the SPI and the channels
    pub fn release(self) -> (SpiRegisters, TX, RX) {
        (self.spi, self.tx, self.rx)
    }
}

impl<H: Hardware, RX> Spi<Channel<'_, H>, RX> {
    /// Send `buffer` with the transmit channel, discarding received data
    ///
    /// The receive buffer overruns during the transfer. Reading clears the
    /// overrun, so expect an [`Error::Overrun`] from the next blocking
    /// `read`.
    pub fn write_dma(&mut self, buffer: &'static [u8]) -> Result<()> {
        super::write(&self.tx, buffer, &mut self.spi)
    }
}

impl<TX, H: Hardware> Spi<TX, Channel<'_, H>> {
    /// Fill `buffer` with the receive channel
    ///
    /// Only useful when something else drives the clock: a slave
    /// configuration, or a receive-only master.
    pub fn read_dma(&mut self, buffer: &'static mut [u8]) -> Result<()> {
        super::read(&self.rx, &mut self.spi, buffer)
    }
}

impl<H: Hardware> Spi<Channel<'_, H>, Channel<'_, H>> {
    /// Exchange `buffer` in place, using both channels
    ///
    /// The receive channel's callback receives the buffer once every word
    /// is exchanged.
    pub fn transfer_dma(&mut self, buffer: &'static mut [u8]) -> Result<()> {
        super::full_duplex(&self.rx, &self.tx, &mut self.spi, buffer)
    }

    /// Stop both DMA request lines
    pub fn stop_dma(&mut self) {
        self.spi.disable_destination();
        self.spi.disable_source();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zeroed() -> spi::RegisterBlock {
        // Safety: register blocks are plain integers.
        unsafe { core::mem::zeroed() }
    }

    #[test]
    fn blocking_exchange() {
        let block = zeroed();
        let mut spi = Spi::new(unsafe { SpiRegisters::new(&block as *const _ as *const ()) });

        assert_eq!(spi.send(0xA5), Err(nb::Error::WouldBlock));

        // TXE and RXNE. RAM-backed DR reads back each sent word.
        block.SR.write(0b11);
        let mut words = [1, 2, 3];
        assert_eq!(spi.transfer(&mut words).unwrap(), &[1, 2, 3]);
    }

    #[test]
    fn overrun_is_reported() {
        let block = zeroed();
        let mut spi = Spi::new(unsafe { SpiRegisters::new(&block as *const _ as *const ()) });
        block.SR.write((1 << 6) | 0b11);
        assert_eq!(spi.read(), Err(nb::Error::Other(Error::Overrun)));
    }

    #[test]
    fn dma_request_enables() {
        let block = zeroed();
        let mut spi = unsafe { SpiRegisters::new(&block as *const _ as *const ()) };
        spi.enable_destination();
        spi.enable_source();
        assert_eq!(block.CR2.read(), 0b11);
        spi.disable_destination();
        assert_eq!(block.CR2.read(), 0b01);
    }
}
