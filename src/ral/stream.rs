//! Stream-style DMA controller (STM32F4)

use ral_registers::{RORegister, RWRegister, WORegister};

/// Per-stream register cluster, 0x18 bytes apart
#[repr(C)]
pub struct StreamRegisters {
    pub CR: RWRegister<u32>,
    pub NDTR: RWRegister<u32>,
    pub PAR: RWRegister<u32>,
    pub M0AR: RWRegister<u32>,
    pub M1AR: RWRegister<u32>,
    pub FCR: RWRegister<u32>,
}

#[repr(C)]
pub struct RegisterBlock {
    pub LISR: RORegister<u32>,
    pub HISR: RORegister<u32>,
    pub LIFCR: WORegister<u32>,
    pub HIFCR: WORegister<u32>,
    pub ST: [StreamRegisters; 8],
}

/// Number of streams in the block
pub const STREAMS: usize = 8;

/// Offset of a stream's group of flags within LISR / HISR / LIFCR / HIFCR
///
/// Streams 0..=3 live in the low registers, 4..=7 in the high registers,
/// at the same offsets.
pub const fn flag_offset(stream: usize) -> u32 {
    match stream % 4 {
        0 => 0,
        1 => 6,
        2 => 16,
        _ => 22,
    }
}

/// Flag bits within one stream's group
pub mod flag {
    pub const FIFO_ERROR: u32 = 1 << 0;
    pub const DIRECT_MODE_ERROR: u32 = 1 << 2;
    pub const ERROR: u32 = 1 << 3;
    pub const HALF: u32 = 1 << 4;
    pub const COMPLETE: u32 = 1 << 5;
    pub const ALL: u32 = FIFO_ERROR | DIRECT_MODE_ERROR | ERROR | HALF | COMPLETE;
}

pub mod CR {
    fields! {
        EN: 0, 1;
        DMEIE: 1, 1;
        TEIE: 2, 1;
        HTIE: 3, 1;
        TCIE: 4, 1;
        PFCTRL: 5, 1;
        DIR: 6, 2;
        CIRC: 8, 1;
        PINC: 9, 1;
        MINC: 10, 1;
        PSIZE: 11, 2;
        MSIZE: 13, 2;
        PINCOS: 15, 1;
        PL: 16, 2;
        DBM: 18, 1;
        CT: 19, 1;
        PBURST: 21, 2;
        MBURST: 23, 2;
        CHSEL: 25, 3;
    }
}

pub mod NDTR {
    fields! {
        NDT: 0, 16;
    }
}

pub mod FCR {
    fields! {
        FTH: 0, 2;
        DMDIS: 2, 1;
        FS: 3, 3;
        FEIE: 7, 1;
    }
}
