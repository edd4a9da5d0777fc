//! USART status, data and DMA-enable registers

/// F1 / F4 layout
pub mod v1 {
    use ral_registers::RWRegister;

    #[repr(C)]
    pub struct RegisterBlock {
        pub SR: RWRegister<u32>,
        pub DR: RWRegister<u32>,
        pub BRR: RWRegister<u32>,
        pub CR1: RWRegister<u32>,
        pub CR2: RWRegister<u32>,
        pub CR3: RWRegister<u32>,
        pub GTPR: RWRegister<u32>,
    }

    pub mod SR {
        fields! {
            PE: 0, 1;
            FE: 1, 1;
            NE: 2, 1;
            ORE: 3, 1;
            RXNE: 5, 1;
            TC: 6, 1;
            TXE: 7, 1;
        }
    }

    pub mod CR3 {
        fields! {
            DMAR: 6, 1;
            DMAT: 7, 1;
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
        pub CR3: RWRegister<u32>,
        pub BRR: RWRegister<u32>,
        pub GTPR: RWRegister<u32>,
        pub RTOR: RWRegister<u32>,
        pub RQR: WORegister<u32>,
        pub ISR: RORegister<u32>,
        pub ICR: WORegister<u32>,
        pub RDR: RORegister<u32>,
        pub TDR: RWRegister<u32>,
    }

    pub mod ISR {
        fields! {
            PE: 0, 1;
            FE: 1, 1;
            NE: 2, 1;
            ORE: 3, 1;
            RXNE: 5, 1;
            TC: 6, 1;
            TXE: 7, 1;
        }
    }

    pub mod ICR {
        fields! {
            PECF: 0, 1;
            FECF: 1, 1;
            NCF: 2, 1;
            ORECF: 3, 1;
        }
    }

    pub mod CR3 {
        fields! {
            DMAR: 6, 1;
            DMAT: 7, 1;
        }
    }
}
