//! DMA request multiplexer (STM32G0)

use ral_registers::RWRegister;

#[repr(C)]
pub struct RegisterBlock {
    /// Request line multiplexer channel configuration, one per DMA channel
    pub CCR: [RWRegister<u32>; CHANNELS],
}

/// Number of multiplexer channels
pub const CHANNELS: usize = 12;

pub mod CCR {
    fields! {
        DMAREQ_ID: 0, 7;
        SOIE: 8, 1;
        EGE: 9, 1;
        SE: 16, 1;
    }
}
