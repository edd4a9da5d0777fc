//! DMA interrupt vectors and controller addresses, per family
//!
//! Each family module lists its DMA vectors as [`Vector`] constants, named
//! after the device crate's interrupt, plus the controller base addresses.
//! Enabling a family feature re-exports the matching module as
//! [`device`](crate::device).

use crate::interrupt::Vector;

macro_rules! vectors {
    ($($name:ident: $number:literal, $controller:literal, [$($channel:literal),+];)+) => {
        $(
            pub const $name: Vector = Vector {
                name: stringify!($name),
                number: $number,
                controller: $controller,
                channels: &[$($channel),+],
            };
        )+

        /// Every DMA vector of the family
        pub const VECTORS: &[Vector] = &[$($name),+];
    };
}

/// STM32F0
///
/// F03x and F05x parts have five DMA1 channels. Their last vector only
/// serves channels 4 and 5, and the extra channels read as idle.
pub mod stm32f0 {
    use super::Vector;

    pub const DMA1: *const () = 0x4002_0000 as *const ();

    vectors! {
        DMA1_CH1: 9, 1, [0];
        DMA1_CH2_3: 10, 1, [1, 2];
        DMA1_CH4_5_6_7: 11, 1, [3, 4, 5, 6];
    }
}

/// STM32F1
pub mod stm32f1 {
    use super::Vector;

    pub const DMA1: *const () = 0x4002_0000 as *const ();
    /// High-density, XL-density and connectivity line only
    pub const DMA2: *const () = 0x4002_0400 as *const ();

    vectors! {
        DMA1_CHANNEL1: 11, 1, [0];
        DMA1_CHANNEL2: 12, 1, [1];
        DMA1_CHANNEL3: 13, 1, [2];
        DMA1_CHANNEL4: 14, 1, [3];
        DMA1_CHANNEL5: 15, 1, [4];
        DMA1_CHANNEL6: 16, 1, [5];
        DMA1_CHANNEL7: 17, 1, [6];
        DMA2_CHANNEL1: 56, 2, [0];
        DMA2_CHANNEL2: 57, 2, [1];
        DMA2_CHANNEL3: 58, 2, [2];
        DMA2_CHANNEL4_5: 59, 2, [3, 4];
    }
}

/// STM32F4
pub mod stm32f4 {
    use super::Vector;

    pub const DMA1: *const () = 0x4002_6000 as *const ();
    pub const DMA2: *const () = 0x4002_6400 as *const ();

    vectors! {
        DMA1_STREAM0: 11, 1, [0];
        DMA1_STREAM1: 12, 1, [1];
        DMA1_STREAM2: 13, 1, [2];
        DMA1_STREAM3: 14, 1, [3];
        DMA1_STREAM4: 15, 1, [4];
        DMA1_STREAM5: 16, 1, [5];
        DMA1_STREAM6: 17, 1, [6];
        DMA1_STREAM7: 47, 1, [7];
        DMA2_STREAM0: 56, 2, [0];
        DMA2_STREAM1: 57, 2, [1];
        DMA2_STREAM2: 58, 2, [2];
        DMA2_STREAM3: 59, 2, [3];
        DMA2_STREAM4: 60, 2, [4];
        DMA2_STREAM5: 68, 2, [5];
        DMA2_STREAM6: 69, 2, [6];
        DMA2_STREAM7: 70, 2, [7];
    }
}

/// STM32L4
pub mod stm32l4 {
    use super::Vector;

    pub const DMA1: *const () = 0x4002_0000 as *const ();
    pub const DMA2: *const () = 0x4002_0400 as *const ();

    vectors! {
        DMA1_CH1: 11, 1, [0];
        DMA1_CH2: 12, 1, [1];
        DMA1_CH3: 13, 1, [2];
        DMA1_CH4: 14, 1, [3];
        DMA1_CH5: 15, 1, [4];
        DMA1_CH6: 16, 1, [5];
        DMA1_CH7: 17, 1, [6];
        DMA2_CH1: 56, 2, [0];
        DMA2_CH2: 57, 2, [1];
        DMA2_CH3: 58, 2, [2];
        DMA2_CH4: 59, 2, [3];
        DMA2_CH5: 60, 2, [4];
        DMA2_CH6: 68, 2, [5];
        DMA2_CH7: 69, 2, [6];
    }
}

/// STM32G0
///
/// DMA requests are routed through DMAMUX1. DMA1 channel `n` is served by
/// DMAMUX channel `n`.
pub mod stm32g0 {
    use super::Vector;

    pub const DMA1: *const () = 0x4002_0000 as *const ();
    pub const DMAMUX: *const () = 0x4002_0800 as *const ();

    vectors! {
        DMA_CHANNEL1: 9, 1, [0];
        DMA_CHANNEL2_3: 10, 1, [1, 2];
        DMA_CHANNEL4_5_6_7: 11, 1, [3, 4, 5, 6];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn covers_each_channel_once(vectors: &[Vector], controller: u8, channels: usize) {
        for channel in 0..channels {
            let count = vectors
                .iter()
                .filter(|vector| vector.controller == controller && vector.serves(channel))
                .count();
            assert_eq!(count, 1, "DMA{controller} channel {channel}");
        }
    }

    #[test]
    fn every_channel_has_one_vector() {
        covers_each_channel_once(stm32f0::VECTORS, 1, 7);
        covers_each_channel_once(stm32f1::VECTORS, 1, 7);
        covers_each_channel_once(stm32f1::VECTORS, 2, 5);
        covers_each_channel_once(stm32f4::VECTORS, 1, 8);
        covers_each_channel_once(stm32f4::VECTORS, 2, 8);
        covers_each_channel_once(stm32l4::VECTORS, 1, 7);
        covers_each_channel_once(stm32l4::VECTORS, 2, 7);
        covers_each_channel_once(stm32g0::VECTORS, 1, 7);
    }

    #[test]
    fn shared_vectors() {
        assert_eq!(stm32f1::DMA2_CHANNEL4_5.channels, &[3, 4]);
        assert_eq!(stm32f4::DMA1_STREAM7.number, 47);
        assert_eq!(stm32g0::DMA_CHANNEL2_3.name, "DMA_CHANNEL2_3");
    }
}
