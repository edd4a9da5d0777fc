//! ADC adapter
//!
//! [`Adc`] reads conversion results from a configured ADC. Channel
//! selection, sampling time and triggering belong to the HAL. With a
//! receive channel, [`read_dma`](Adc::read_dma) stores a sequence of
//! results without CPU involvement.

use super::{NoDma, Source};
use crate::{
    ral::{self, adc, Static},
    Channel, Hardware, Result,
};

/// ADC errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// A result was overwritten before it was read
    Overrun,
}

/// Access to an ADC data register
///
/// Implemented by [`AdcV1`] and [`AdcV2`].
pub trait Converter: Source<u16> {
    /// Read the result of the last conversion
    fn read(&mut self) -> nb::Result<u16, Error>;
}

/// ADC with the F1 / F4 register layout
pub struct AdcV1 {
    registers: Static<adc::v1::RegisterBlock>,
    request: Option<u8>,
}

// Safety: owns its ADC instance.
unsafe impl Send for AdcV1 {}

impl AdcV1 {
    /// Wrap the ADC at `base`
    ///
    /// # Safety
    ///
    /// `base` must point to an ADC register block, and the caller must not
    /// use that ADC through any other handle.
    pub const unsafe fn new(base: *const ()) -> Self {
        AdcV1 {
            registers: Static(base.cast()),
            request: None,
        }
    }

    /// Set the DMA request line (`CHSEL` on F4)
    pub const fn with_request(mut self, request: u8) -> Self {
        self.request = Some(request);
        self
    }
}

impl Converter for AdcV1 {
    fn read(&mut self) -> nb::Result<u16, Error> {
        let adc = &*self.registers;
        let (eoc, ovr) = ral::read_reg!(crate::ral::adc::v1, adc, SR, EOC, OVR);
        if ovr != 0 {
            ral::modify_reg!(crate::ral::adc::v1, adc, SR, OVR: 0);
            Err(nb::Error::Other(Error::Overrun))
        } else if eoc != 0 {
            // Reading DR clears EOC.
            Ok(adc.DR.read() as u16)
        } else {
            Err(nb::Error::WouldBlock)
        }
    }
}

unsafe impl Source<u16> for AdcV1 {
    fn source_signal(&self) -> Option<u8> {
        self.request
    }
    fn source_address(&self) -> *const u16 {
        &self.registers.DR as *const _ as *const u16
    }
    fn enable_source(&mut self) {
        let adc = &*self.registers;
        ral::modify_reg!(crate::ral::adc::v1, adc, CR2, DMA: 1, DDS: 0);
    }
    fn disable_source(&mut self) {
        let adc = &*self.registers;
        ral::modify_reg!(crate::ral::adc::v1, adc, CR2, DMA: 0);
    }
}

/// ADC with the F0 / L4 / G0 register layout
pub struct AdcV2 {
    registers: Static<adc::v2::RegisterBlock>,
    request: Option<u8>,
}

// Safety: owns its ADC instance.
unsafe impl Send for AdcV2 {}

impl AdcV2 {
    /// Wrap the ADC at `base`
    ///
    /// # Safety
    ///
    /// `base` must point to an ADC register block, and the caller must not
    /// use that ADC through any other handle.
    pub const unsafe fn new(base: *const ()) -> Self {
        AdcV2 {
            registers: Static(base.cast()),
            request: None,
        }
    }

    /// Set the DMA request line (`CSELR` on L4, DMAMUX on G0)
    pub const fn with_request(mut self, request: u8) -> Self {
        self.request = Some(request);
        self
    }
}

impl Converter for AdcV2 {
    fn read(&mut self) -> nb::Result<u16, Error> {
        let adc = &*self.registers;
        let (eoc, ovr) = ral::read_reg!(crate::ral::adc::v2, adc, ISR, EOC, OVR);
        if ovr != 0 {
            // Write one to clear.
            ral::write_reg!(crate::ral::adc::v2, adc, ISR, OVR: 1);
            Err(nb::Error::Other(Error::Overrun))
        } else if eoc != 0 {
            Ok(adc.DR.read() as u16)
        } else {
            Err(nb::Error::WouldBlock)
        }
    }
}

unsafe impl Source<u16> for AdcV2 {
    fn source_signal(&self) -> Option<u8> {
        self.request
    }
    fn source_address(&self) -> *const u16 {
        &self.registers.DR as *const _ as *const u16
    }
    fn enable_source(&mut self) {
        let adc = &*self.registers;
        ral::modify_reg!(crate::ral::adc::v2, adc, CFGR, DMAEN: 1, DMACFG: 0);
    }
    fn disable_source(&mut self) {
        let adc = &*self.registers;
        ral::modify_reg!(crate::ral::adc::v2, adc, CFGR, DMAEN: 0);
    }
}

/// An ADC, with an optional DMA channel
pub struct Adc<A, RX = NoDma> {
    adc: A,
    rx: RX,
}

impl<A: Converter> Adc<A> {
    /// Wrap a configured ADC, without DMA
    pub fn new(adc: A) -> Self {
        Adc { adc, rx: NoDma }
    }
}

impl<A: Converter, RX> Adc<A, RX> {
    /// Use `channel` to collect results
    pub fn with_dma<'a, H: Hardware>(self, channel: Channel<'a, H>) -> Adc<A, Channel<'a, H>> {
        Adc {
            adc: self.adc,
            rx: channel,
        }
    }

    /// Read the result of the last conversion
    pub fn read(&mut self) -> nb::Result<u16, Error> {
        self.adc.read()
    }

    /// Release the ADC and the channel
    pub fn release(self) -> (A, RX) {
        (self.adc, self.rx)
    }
}

impl<A: Converter, H: Hardware> Adc<A, Channel<'_, H>> {
    /// Store the next `buffer.len()` results in `buffer`
    ///
    /// The channel's callback receives the buffer, and the number of
    /// results, when the last one is stored.
    pub fn read_dma(&mut self, buffer: &'static mut [u16]) -> Result<()> {
        super::read(&self.rx, &mut self.adc, buffer)
    }

    /// Stop DMA requests
    pub fn stop_dma(&mut self) {
        self.adc.disable_source();
    }
}
