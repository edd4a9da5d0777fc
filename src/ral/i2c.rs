//! I2C status, data and DMA-enable registers

/// F1 / F4 layout
pub mod v1 {
    use ral_registers::RWRegister;

    #[repr(C)]
    pub struct RegisterBlock {
        pub CR1: RWRegister<u32>,
        pub CR2: RWRegister<u32>,
        pub OAR1: RWRegister<u32>,
        pub OAR2: RWRegister<u32>,
        pub DR: RWRegister<u32>,
        pub SR1: RWRegister<u32>,
        pub SR2: RWRegister<u32>,
        pub CCR: RWRegister<u32>,
        pub TRISE: RWRegister<u32>,
    }

    pub mod CR2 {
        fields! {
            DMAEN: 11, 1;
            LAST: 12, 1;
        }
    }

    pub mod SR1 {
        fields! {
            RXNE: 6, 1;
            TXE: 7, 1;
            BERR: 8, 1;
            ARLO: 9, 1;
            AF: 10, 1;
            OVR: 11, 1;
        }
    }
}

/// F0 / L4 / G0 layout
pub mod v2 {
    use ral_registers::{RORegister, RWRegister, WORegister};

    #[repr(C)]
    pub struct RegisterBlock {
        pub CR1: RWRegister<u32>,
        pub CR2: RWRegister<u32>,
        pub OAR1: RWRegister<u32>,
        pub OAR2: RWRegister<u32>,
        pub TIMINGR: RWRegister<u32>,
        pub TIMEOUTR: RWRegister<u32>,
        pub ISR: RWRegister<u32>,
        pub ICR: WORegister<u32>,
        pub PECR: RORegister<u32>,
        pub RXDR: RORegister<u32>,
        pub TXDR: RWRegister<u32>,
    }

    pub mod CR1 {
        fields! {
            TXDMAEN: 14, 1;
            RXDMAEN: 15, 1;
        }
    }

    pub mod ISR {
        fields! {
            TXE: 0, 1;
            TXIS: 1, 1;
            RXNE: 2, 1;
            NACKF: 4, 1;
            BERR: 8, 1;
            ARLO: 9, 1;
            OVR: 10, 1;
        }
    }

    pub mod ICR {
        fields! {
            NACKCF: 4, 1;
            BERRCF: 8, 1;
            ARLOCF: 9, 1;
            OVRCF: 10, 1;
        }
    }
}
