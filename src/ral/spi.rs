//! SPI status, data and DMA-enable registers
//!
//! The layout is shared by every supported family.

use ral_registers::RWRegister;

#[repr(C)]
pub struct RegisterBlock {
    pub CR1: RWRegister<u32>,
    pub CR2: RWRegister<u32>,
    pub SR: RWRegister<u32>,
    pub DR: RWRegister<u32>,
    pub CRCPR: RWRegister<u32>,
    pub RXCRCR: RWRegister<u32>,
    pub TXCRCR: RWRegister<u32>,
}

pub mod CR2 {
    fields! {
        RXDMAEN: 0, 1;
        TXDMAEN: 1, 1;
    }
}

pub mod SR {
    fields! {
        RXNE: 0, 1;
        TXE: 1, 1;
        MODF: 5, 1;
        OVR: 6, 1;
        BSY: 7, 1;
    }
}
