//! I2C adapter
//!
//! [`I2c`] covers the data phase of an I2C transaction. The HAL generates
//! START, sends the address, and generates STOP; this adapter moves the
//! data bytes, either one at a time, or with a DMA channel per direction.

use super::{Destination, NoDma, Source};
use crate::{
    ral::{self, i2c, Static},
    Channel, Hardware, Result,
};

/// I2C errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// Misplaced START or STOP condition
    Bus,
    /// Another master won the bus
    ArbitrationLoss,
    /// The addressed device didn't acknowledge
    Nack,
    /// Data was not read or written in time
    Overrun,
}

/// Byte access to an I2C data register
///
/// Implemented by [`I2cV1`] and [`I2cV2`].
pub trait I2cBus: Source<u8> + Destination<u8> {
    /// Read a received byte
    fn read(&mut self) -> nb::Result<u8, Error>;
    /// Write the next byte to send
    fn write(&mut self, byte: u8) -> nb::Result<(), Error>;
}

/// I2C with the F1 / F4 register layout
pub struct I2cV1 {
    registers: Static<i2c::v1::RegisterBlock>,
    tx_request: Option<u8>,
    rx_request: Option<u8>,
}

// Safety: owns its I2C instance.
unsafe impl Send for I2cV1 {}

impl I2cV1 {
    /// Wrap the I2C at `base`
    ///
    /// # Safety
    ///
    /// `base` must point to an I2C register block, and the caller must not
    /// use that I2C through any other handle.
    pub const unsafe fn new(base: *const ()) -> Self {
        I2cV1 {
            registers: Static(base.cast()),
            tx_request: None,
            rx_request: None,
        }
    }

    /// Set the DMA request lines (`CHSEL` on F4)
    pub const fn with_requests(mut self, tx: u8, rx: u8) -> Self {
        self.tx_request = Some(tx);
        self.rx_request = Some(rx);
        self
    }

    fn check_errors(&self) -> core::result::Result<(), Error> {
        let i2c = &*self.registers;
        let (berr, arlo, af, ovr) = ral::read_reg!(crate::ral::i2c::v1, i2c, SR1, BERR, ARLO, AF, OVR);
        let error = if berr != 0 {
            Error::Bus
        } else if arlo != 0 {
            Error::ArbitrationLoss
        } else if af != 0 {
            Error::Nack
        } else if ovr != 0 {
            Error::Overrun
        } else {
            return Ok(());
        };
        // Error flags are cleared by writing zero.
        ral::modify_reg!(crate::ral::i2c::v1, i2c, SR1, BERR: 0, ARLO: 0, AF: 0, OVR: 0);
        Err(error)
    }
}

impl I2cBus for I2cV1 {
    fn read(&mut self) -> nb::Result<u8, Error> {
        self.check_errors()?;
        let i2c = &*self.registers;
        if ral::read_reg!(crate::ral::i2c::v1, i2c, SR1, RXNE == 1) {
            Ok(i2c.DR.read() as u8)
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    fn write(&mut self, byte: u8) -> nb::Result<(), Error> {
        self.check_errors()?;
        let i2c = &*self.registers;
        if ral::read_reg!(crate::ral::i2c::v1, i2c, SR1, TXE == 1) {
            i2c.DR.write(byte as u32);
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }
}

unsafe impl Source<u8> for I2cV1 {
    fn source_signal(&self) -> Option<u8> {
        self.rx_request
    }
    fn source_address(&self) -> *const u8 {
        &self.registers.DR as *const _ as *const u8
    }
    fn enable_source(&mut self) {
        let i2c = &*self.registers;
        // NACK the byte received at the end of the DMA transfer.
        ral::modify_reg!(crate::ral::i2c::v1, i2c, CR2, DMAEN: 1, LAST: 1);
    }
    fn disable_source(&mut self) {
        let i2c = &*self.registers;
        ral::modify_reg!(crate::ral::i2c::v1, i2c, CR2, DMAEN: 0, LAST: 0);
    }
}

unsafe impl Destination<u8> for I2cV1 {
    fn destination_signal(&self) -> Option<u8> {
        self.tx_request
    }
    fn destination_address(&self) -> *const u8 {
        &self.registers.DR as *const _ as *const u8
    }
    fn enable_destination(&mut self) {
        let i2c = &*self.registers;
        ral::modify_reg!(crate::ral::i2c::v1, i2c, CR2, DMAEN: 1);
    }
    fn disable_destination(&mut self) {
        let i2c = &*self.registers;
        ral::modify_reg!(crate::ral::i2c::v1, i2c, CR2, DMAEN: 0);
    }
}

/// I2C with the F0 / L4 / G0 register layout
pub struct I2cV2 {
    registers: Static<i2c::v2::RegisterBlock>,
    tx_request: Option<u8>,
    rx_request: Option<u8>,
}

// Safety: owns its I2C instance.
unsafe impl Send for I2cV2 {}

impl I2cV2 {
    /// Wrap the I2C at `base`
    ///
    /// # Safety
    ///
    /// `base` must point to an I2C register block, and the caller must not
    /// use that I2C through any other handle.
    pub const unsafe fn new(base: *const ()) -> Self {
        I2cV2 {
            registers: Static(base.cast()),
            tx_request: None,
            rx_request: None,
        }
    }

    /// Set the DMA request lines (`CSELR` on L4, DMAMUX on G0)
    pub const fn with_requests(mut self, tx: u8, rx: u8) -> Self {
        self.tx_request = Some(tx);
        self.rx_request = Some(rx);
        self
    }

    fn check_errors(&self) -> core::result::Result<(), Error> {
        let i2c = &*self.registers;
        let (nackf, berr, arlo, ovr) = ral::read_reg!(crate::ral::i2c::v2, i2c, ISR, NACKF, BERR, ARLO, OVR);
        let error = if berr != 0 {
            Error::Bus
        } else if arlo != 0 {
            Error::ArbitrationLoss
        } else if nackf != 0 {
            Error::Nack
        } else if ovr != 0 {
            Error::Overrun
        } else {
            return Ok(());
        };
        ral::write_reg!(crate::ral::i2c::v2, i2c, ICR, NACKCF: 1, BERRCF: 1, ARLOCF: 1, OVRCF: 1);
        Err(error)
    }
}

impl I2cBus for I2cV2 {
    fn read(&mut self) -> nb::Result<u8, Error> {
        self.check_errors()?;
        let i2c = &*self.registers;
        if ral::read_reg!(crate::ral::i2c::v2, i2c, ISR, RXNE == 1) {
            Ok(i2c.RXDR.read() as u8)
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    fn write(&mut self, byte: u8) -> nb::Result<(), Error> {
        self.check_errors()?;
        let i2c = &*self.registers;
        if ral::read_reg!(crate::ral::i2c::v2, i2c, ISR, TXIS == 1) {
            i2c.TXDR.write(byte as u32);
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }
}

unsafe impl Source<u8> for I2cV2 {
    fn source_signal(&self) -> Option<u8> {
        self.rx_request
    }
    fn source_address(&self) -> *const u8 {
        &self.registers.RXDR as *const _ as *const u8
    }
    fn enable_source(&mut self) {
        let i2c = &*self.registers;
        ral::modify_reg!(crate::ral::i2c::v2, i2c, CR1, RXDMAEN: 1);
    }
    fn disable_source(&mut self) {
        let i2c = &*self.registers;
        ral::modify_reg!(crate::ral::i2c::v2, i2c, CR1, RXDMAEN: 0);
    }
}

unsafe impl Destination<u8> for I2cV2 {
    fn destination_signal(&self) -> Option<u8> {
        self.tx_request
    }
    fn destination_address(&self) -> *const u8 {
        &self.registers.TXDR as *const _ as *const u8
    }
    fn enable_destination(&mut self) {
        let i2c = &*self.registers;
        ral::modify_reg!(crate::ral::i2c::v2, i2c, CR1, TXDMAEN: 1);
    }
    fn disable_destination(&mut self) {
        let i2c = &*self.registers;
        ral::modify_reg!(crate::ral::i2c::v2, i2c, CR1, TXDMAEN: 0);
    }
}

/// An I2C bus, with optional DMA channels
pub struct I2c<I, TX = NoDma, RX = NoDma> {
    i2c: I,
    tx: TX,
    rx: RX,
}

impl<I: I2cBus> I2c<I> {
    /// Wrap a configured I2C, without DMA
    pub fn new(i2c: I) -> Self {
        I2c {
            i2c,
            tx: NoDma,
            rx: NoDma,
        }
    }
}

impl<I: I2cBus, TX, RX> I2c<I, TX, RX> {
    /// Use `channel` to transmit
    pub fn with_tx_dma<'a, H: Hardware>(self, channel: Channel<'a, H>) -> I2c<I, Channel<'a, H>, RX> {
        I2c {
            i2c: self.i2c,
            tx: channel,
            rx: self.rx,
        }
    }

    /// Use `channel` to receive
    pub fn with_rx_dma<'a, H: Hardware>(self, channel: Channel<'a, H>) -> I2c<I, TX, Channel<'a, H>> {
        I2c {
            i2c: self.i2c,
            tx: self.tx,
            rx: channel,
        }
    }

    /// Write `bytes` in the current transaction, blocking
    pub fn write(&mut self, bytes: &[u8]) -> core::result::Result<(), Error> {
        for &byte in bytes {
            nb::block!(self.i2c.write(byte))?;
        }
        Ok(())
    }

    /// Fill `buffer` in the current transaction, blocking
    pub fn read(&mut self, buffer: &mut [u8]) -> core::result::Result<(), Error> {
        for byte in buffer.iter_mut() {
            *byte = nb::block!(self.i2c.read())?;
        }
        Ok(())
    }

    /// Release the I2C and the channels
    pub fn release(self) -> (I, TX, RX) {
        (self.i2c, self.tx, self.rx)
    }
}

impl<I: I2cBus, H: Hardware, RX> I2c<I, Channel<'_, H>, RX> {
    /// Send `buffer` with the transmit channel
    pub fn write_dma(&mut self, buffer: &'static [u8]) -> Result<()> {
        super::write(&self.tx, buffer, &mut self.i2c)
    }
}

impl<I: I2cBus, TX, H: Hardware> I2c<I, TX, Channel<'_, H>> {
    /// Fill `buffer` with the receive channel
    pub fn read_dma(&mut self, buffer: &'static mut [u8]) -> Result<()> {
        super::read(&self.rx, &mut self.i2c, buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::ptr;

    fn zeroed<T>() -> T {
        // Safety: register blocks are plain integers.
        unsafe { core::mem::zeroed() }
    }

    #[test]
    fn v1_nack_is_reported_and_cleared() {
        let block: i2c::v1::RegisterBlock = zeroed();
        let mut i2c = I2c::new(unsafe { I2cV1::new(&block as *const _ as *const ()) });

        block.SR1.write((1 << 10) | (1 << 7));
        assert_eq!(i2c.write(&[1]), Err(Error::Nack));
        assert_eq!(block.SR1.read(), 1 << 7);
        i2c.write(&[1, 2]).unwrap();
        assert_eq!(block.DR.read(), 2);
    }

    #[test]
    fn v1_receive_dma_sets_last() {
        let block: i2c::v1::RegisterBlock = zeroed();
        let mut i2c = unsafe { I2cV1::new(&block as *const _ as *const ()) };
        i2c.enable_source();
        assert_eq!(block.CR2.read(), (1 << 11) | (1 << 12));
        i2c.disable_source();
        assert_eq!(block.CR2.read(), 0);
    }

    #[test]
    fn v2_blocking_read() {
        let block: i2c::v2::RegisterBlock = zeroed();
        let mut i2c = I2c::new(unsafe { I2cV2::new(&block as *const _ as *const ()) });

        // Safety: RAM-backed register block.
        unsafe { ptr::write_volatile(ptr::addr_of!(block.RXDR).cast::<u32>().cast_mut(), 0x42) };
        block.ISR.write(1 << 2);
        let mut buffer = [0; 2];
        i2c.read(&mut buffer).unwrap();
        assert_eq!(buffer, [0x42, 0x42]);
    }

    #[test]
    fn v2_arbitration_loss() {
        let block: i2c::v2::RegisterBlock = zeroed();
        let mut i2c = I2c::new(unsafe { I2cV2::new(&block as *const _ as *const ()) });
        block.ISR.write(1 << 9);
        assert_eq!(i2c.write(&[0]), Err(Error::ArbitrationLoss));
        let icr = unsafe { ptr::read_volatile(ptr::addr_of!(block.ICR).cast::<u32>()) };
        assert_ne!(icr & (1 << 9), 0);
    }
}
