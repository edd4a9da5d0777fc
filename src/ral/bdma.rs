//! Channel-style DMA controller (STM32F0, F1, L4, G0)

use ral_registers::{RORegister, RWRegister, WORegister};

/// Per-channel register cluster, 0x14 bytes apart
#[repr(C)]
pub struct ChannelRegisters {
    pub CCR: RWRegister<u32>,
    pub CNDTR: RWRegister<u32>,
    pub CPAR: RWRegister<u32>,
    pub CMAR: RWRegister<u32>,
    _reserved: u32,
}

#[repr(C)]
pub struct RegisterBlock {
    pub ISR: RORegister<u32>,
    pub IFCR: WORegister<u32>,
    pub CH: [ChannelRegisters; 7],
    _reserved: [u32; 5],
    /// Channel selection, only implemented on L4 (and some F0) parts
    pub CSELR: RWRegister<u32>,
}

/// Number of channel clusters in the block
pub const CHANNELS: usize = 7;

/// Width of one channel's group of flags in ISR / IFCR / CSELR
pub const FLAG_STRIDE: u32 = 4;

/// Flag bits within one channel's group in ISR and IFCR
pub mod flag {
    pub const GLOBAL: u32 = 1 << 0;
    pub const COMPLETE: u32 = 1 << 1;
    pub const HALF: u32 = 1 << 2;
    pub const ERROR: u32 = 1 << 3;
}

pub mod CCR {
    fields! {
        EN: 0, 1;
        TCIE: 1, 1;
        HTIE: 2, 1;
        TEIE: 3, 1;
        DIR: 4, 1;
        CIRC: 5, 1;
        PINC: 6, 1;
        MINC: 7, 1;
        PSIZE: 8, 2;
        MSIZE: 10, 2;
        PL: 12, 2;
        MEM2MEM: 14, 1;
    }
}

pub mod CNDTR {
    fields! {
        NDT: 0, 16;
    }
}
