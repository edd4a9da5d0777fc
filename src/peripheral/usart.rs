//! USART adapter
//!
//! [`Serial`] wraps a USART register block, and optionally a transmit and a
//! receive DMA channel. Without channels, it offers `nb` byte reads and
//! writes on the data register. With a transmit channel, it adds
//! [`write_dma`](Serial::write_dma). With a receive channel, it adds
//! [`read_dma`](Serial::read_dma).
//!
//! Baud rate, framing and pin setup are left to the HAL. Configure and
//! enable the USART before wrapping it.

use super::{Destination, NoDma, Source};
use crate::{
    ral::{self, usart, Static},
    Channel, Hardware, Result,
};

/// USART receive errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// Framing error
    Framing,
    /// Noise error
    Noise,
    /// RX buffer overrun
    Overrun,
    /// Parity check error
    Parity,
}

/// Blocking access to a USART data register
///
/// Implemented by [`UsartV1`] and [`UsartV2`].
pub trait Usart: Source<u8> + Destination<u8> {
    /// Read a received byte
    fn read(&mut self) -> nb::Result<u8, Error>;
    /// Queue a byte for transmission
    fn write(&mut self, byte: u8) -> nb::Result<(), Error>;
    /// Wait until the last byte left the shift register
    fn flush(&mut self) -> nb::Result<(), Error>;
}

/// USART with the F1 / F4 register layout
pub struct UsartV1 {
    registers: Static<usart::v1::RegisterBlock>,
    tx_request: Option<u8>,
    rx_request: Option<u8>,
}

// Safety: owns its USART instance.
unsafe impl Send for UsartV1 {}

impl UsartV1 {
    /// Wrap the USART at `base`
    ///
    /// # Safety
    ///
    /// `base` must point to a USART register block, and the caller must not
    /// use that USART through any other handle.
    pub const unsafe fn new(base: *const ()) -> Self {
        UsartV1 {
            registers: Static(base.cast()),
            tx_request: None,
            rx_request: None,
        }
    }

    /// Set the DMA request lines
    ///
    /// Only needed on F4 parts, where `tx` and `rx` are the `CHSEL` values
    /// of the streams that serve this USART.
    pub const fn with_requests(mut self, tx: u8, rx: u8) -> Self {
        self.tx_request = Some(tx);
        self.rx_request = Some(rx);
        self
    }
}

impl Usart for UsartV1 {
    fn read(&mut self) -> nb::Result<u8, Error> {
        let usart = &*self.registers;
        let (pe, fe, ne, ore, rxne) = ral::read_reg!(crate::ral::usart::v1, usart, SR, PE, FE, NE, ORE, RXNE);
        // Any error flag is cleared by reading SR, then DR.
        let error = if pe != 0 {
            Some(Error::Parity)
        } else if fe != 0 {
            Some(Error::Framing)
        } else if ne != 0 {
            Some(Error::Noise)
        } else if ore != 0 {
            Some(Error::Overrun)
        } else {
            None
        };
        if let Some(error) = error {
            let _ = usart.DR.read();
            Err(nb::Error::Other(error))
        } else if rxne != 0 {
            Ok(usart.DR.read() as u8)
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    fn write(&mut self, byte: u8) -> nb::Result<(), Error> {
        let usart = &*self.registers;
        if ral::read_reg!(crate::ral::usart::v1, usart, SR, TXE == 1) {
            usart.DR.write(byte as u32);
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    fn flush(&mut self) -> nb::Result<(), Error> {
        let usart = &*self.registers;
        if ral::read_reg!(crate::ral::usart::v1, usart, SR, TC == 1) {
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }
}

unsafe impl Source<u8> for UsartV1 {
    fn source_signal(&self) -> Option<u8> {
        self.rx_request
    }
    fn source_address(&self) -> *const u8 {
        &self.registers.DR as *const _ as *const u8
    }
    fn enable_source(&mut self) {
        let usart = &*self.registers;
        ral::modify_reg!(crate::ral::usart::v1, usart, CR3, DMAR: 1);
    }
    fn disable_source(&mut self) {
        let usart = &*self.registers;
        ral::modify_reg!(crate::ral::usart::v1, usart, CR3, DMAR: 0);
    }
}

unsafe impl Destination<u8> for UsartV1 {
    fn destination_signal(&self) -> Option<u8> {
        self.tx_request
    }
    fn destination_address(&self) -> *const u8 {
        &self.registers.DR as *const _ as *const u8
    }
    fn enable_destination(&mut self) {
        let usart = &*self.registers;
        // Clear TC so that flush() waits for the DMA data.
        ral::modify_reg!(crate::ral::usart::v1, usart, SR, TC: 0);
        ral::modify_reg!(crate::ral::usart::v1, usart, CR3, DMAT: 1);
    }
    fn disable_destination(&mut self) {
        let usart = &*self.registers;
        ral::modify_reg!(crate::ral::usart::v1, usart, CR3, DMAT: 0);
    }
}

/// USART with the F0 / L4 / G0 register layout
pub struct UsartV2 {
    registers: Static<usart::v2::RegisterBlock>,
    tx_request: Option<u8>,
    rx_request: Option<u8>,
}

// Safety: owns its USART instance.
unsafe impl Send for UsartV2 {}

impl UsartV2 {
    /// Wrap the USART at `base`
    ///
    /// # Safety
    ///
    /// `base` must point to a USART register block, and the caller must not
    /// use that USART through any other handle.
    pub const unsafe fn new(base: *const ()) -> Self {
        UsartV2 {
            registers: Static(base.cast()),
            tx_request: None,
            rx_request: None,
        }
    }

    /// Set the DMA request lines
    ///
    /// L4 parts select the request with `CSELR`, and G0 parts with the
    /// DMAMUX request ID.
    pub const fn with_requests(mut self, tx: u8, rx: u8) -> Self {
        self.tx_request = Some(tx);
        self.rx_request = Some(rx);
        self
    }
}

impl Usart for UsartV2 {
    fn read(&mut self) -> nb::Result<u8, Error> {
        let usart = &*self.registers;
        let (pe, fe, ne, ore, rxne) = ral::read_reg!(crate::ral::usart::v2, usart, ISR, PE, FE, NE, ORE, RXNE);
        let error = if pe != 0 {
            Some(Error::Parity)
        } else if fe != 0 {
            Some(Error::Framing)
        } else if ne != 0 {
            Some(Error::Noise)
        } else if ore != 0 {
            Some(Error::Overrun)
        } else {
            None
        };
        if let Some(error) = error {
            ral::write_reg!(crate::ral::usart::v2, usart, ICR, PECF: 1, FECF: 1, NCF: 1, ORECF: 1);
            Err(nb::Error::Other(error))
        } else if rxne != 0 {
            Ok(usart.RDR.read() as u8)
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    fn write(&mut self, byte: u8) -> nb::Result<(), Error> {
        let usart = &*self.registers;
        if ral::read_reg!(crate::ral::usart::v2, usart, ISR, TXE == 1) {
            usart.TDR.write(byte as u32);
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    fn flush(&mut self) -> nb::Result<(), Error> {
        let usart = &*self.registers;
        if ral::read_reg!(crate::ral::usart::v2, usart, ISR, TC == 1) {
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }
}

unsafe impl Source<u8> for UsartV2 {
    fn source_signal(&self) -> Option<u8> {
        self.rx_request
    }
    fn source_address(&self) -> *const u8 {
        &self.registers.RDR as *const _ as *const u8
    }
    fn enable_source(&mut self) {
        let usart = &*self.registers;
        ral::modify_reg!(crate::ral::usart::v2, usart, CR3, DMAR: 1);
    }
    fn disable_source(&mut self) {
        let usart = &*self.registers;
        ral::modify_reg!(crate::ral::usart::v2, usart, CR3, DMAR: 0);
    }
}

unsafe impl Destination<u8> for UsartV2 {
    fn destination_signal(&self) -> Option<u8> {
        self.tx_request
    }
    fn destination_address(&self) -> *const u8 {
        &self.registers.TDR as *const _ as *const u8
    }
    fn enable_destination(&mut self) {
        let usart = &*self.registers;
        ral::modify_reg!(crate::ral::usart::v2, usart, CR3, DMAT: 1);
    }
    fn disable_destination(&mut self) {
        let usart = &*self.registers;
        ral::modify_reg!(crate::ral::usart::v2, usart, CR3, DMAT: 0);
    }
}

/// A serial port, with optional DMA channels
///
/// `TX` and `RX` are either a [`Channel`], or [`NoDma`].
pub struct Serial<U, TX = NoDma, RX = NoDma> {
    usart: U,
    tx: TX,
    rx: RX,
}

impl<U: Usart> Serial<U> {
    /// Wrap a configured USART, without DMA
    pub fn new(usart: U) -> Self {
        Serial {
            usart,
            tx: NoDma,
            rx: NoDma,
        }
    }
}

impl<U: Usart, TX, RX> Serial<U, TX, RX> {
    /// Use `channel` to transmit
    pub fn with_tx_dma<'a, H: Hardware>(self, channel: Channel<'a, H>) -> Serial<U, Channel<'a, H>, RX> {
        Serial {
            usart: self.usart,
            tx: channel,
            rx: self.rx,
        }
    }

    /// Use `channel` to receive
    pub fn with_rx_dma<'a, H: Hardware>(self, channel: Channel<'a, H>) -> Serial<U, TX, Channel<'a, H>> {
        Serial {
            usart: self.usart,
            tx: self.tx,
            rx: channel,
        }
    }

    /// Read a received byte
    pub fn read(&mut self) -> nb::Result<u8, Error> {
        self.usart.read()
    }

    /// Queue a byte for transmission
    pub fn write(&mut self, byte: u8) -> nb::Result<(), Error> {
        self.usart.write(byte)
    }

    /// Wait until every byte is sent
    pub fn flush(&mut self) -> nb::Result<(), Error> {
        self.usart.flush()
    }

    /// Write all of `bytes`, blocking
    pub fn write_all(&mut self, bytes: &[u8]) -> core::result::Result<(), Error> {
        for &byte in bytes {
            nb::block!(self.usart.write(byte))?;
        }
        nb::block!(self.usart.flush())
    }

    /// Release the USART and the channels
    pub fn release(self) -> (U, TX, RX) {
        (self.usart, self.tx, self.rx)
    }
}

impl<U: Usart, H: Hardware, RX> Serial<U, Channel<'_, H>, RX> {
    /// Send `buffer` with the transmit channel
    ///
    /// Returns once the transfer started. The transmit channel's callback
    /// runs when the last byte is handed to the USART.
    pub fn write_dma(&mut self, buffer: &'static [u8]) -> Result<()> {
        super::write(&self.tx, buffer, &mut self.usart)
    }

    /// Stop transmit DMA requests
    pub fn stop_write_dma(&mut self) {
        self.usart.disable_destination();
    }
}

impl<U: Usart, TX, H: Hardware> Serial<U, TX, Channel<'_, H>> {
    /// Fill `buffer` with the receive channel
    ///
    /// Returns once the transfer started. The receive channel's callback
    /// receives the buffer when it's full.
    pub fn read_dma(&mut self, buffer: &'static mut [u8]) -> Result<()> {
        super::read(&self.rx, &mut self.usart, buffer)
    }

    /// Stop receive DMA requests
    pub fn stop_read_dma(&mut self) {
        self.usart.disable_source();
    }
}
