//! ADC status, data and DMA-enable registers

/// F1 / F4 layout
pub mod v1 {
    use ral_registers::{RORegister, RWRegister};

    #[repr(C)]
    pub struct RegisterBlock {
        pub SR: RWRegister<u32>,
        pub CR1: RWRegister<u32>,
        pub CR2: RWRegister<u32>,
        _reserved: [u32; 16],
        pub DR: RORegister<u32>,
    }

    pub mod SR {
        fields! {
            EOC: 1, 1;
            OVR: 5, 1;
        }
    }

    pub mod CR2 {
        fields! {
            DMA: 8, 1;
            DDS: 9, 1;
        }
    }
}

/// F0 / L4 / G0 layout
pub mod v2 {
    use ral_registers::{RORegister, RWRegister};

    #[repr(C)]
    pub struct RegisterBlock {
        pub ISR: RWRegister<u32>,
        pub IER: RWRegister<u32>,
        pub CR: RWRegister<u32>,
        pub CFGR: RWRegister<u32>,
        _reserved: [u32; 12],
        pub DR: RORegister<u32>,
    }

    pub mod ISR {
        fields! {
            EOC: 2, 1;
            OVR: 4, 1;
        }
    }

    pub mod CFGR {
        fields! {
            DMAEN: 0, 1;
            DMACFG: 1, 1;
        }
    }
}
