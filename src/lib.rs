//! Direct Memory Access (DMA) driver for STM32 microcontrollers
//!
//! `stm32-dma` provides
//!
//! - a DMA context, [`Dma`], that owns a controller and the runtime state of
//!   its channels,
//! - an unsafe, non-blocking [`Channel::transfer`] that reports its outcome
//!   to a callback, from interrupt context,
//! - interrupt dispatch for vectors shared by several channels,
//! - safe helpers for memcpy and peripheral transfers with `'static`
//!   buffers, and USART, SPI, I2C and ADC adapters that use them.
//!
//! # Portability
//!
//! Two controller layouts are supported. [`ChannelDma`] is the
//! channel-style controller of STM32F0, F1, L4 and G0 parts, and
//! [`StreamDma`] is the stream-style controller of STM32F4 parts. Enable one
//! of the `stm32f0`, `stm32f1`, `stm32f4`, `stm32l4` or `stm32g0` features
//! to select the family's [`Controller`] and its [`device`] vectors. Without
//! a family feature, both layouts remain available.
//!
//! You're responsible for enabling the DMA controller clock before use.
//!
//! # Example
//!
//! Copy a buffer with DMA1 channel 1 on an STM32F1.
//!
//! ```no_run
//! use stm32_dma::{dma_interrupt, ChannelDma, Dma, Flags};
//!
//! static DMA1: Dma<ChannelDma, 7> =
//!     Dma::new(unsafe { ChannelDma::new(0x4002_0000 as *const ()) });
//!
//! dma_interrupt! {
//!     DMA1_CHANNEL1 => DMA1: [0],
//! }
//!
//! fn on_complete(buffer: *mut u8, size: usize, success: bool) {
//!     // Runs in the DMA1_CHANNEL1 handler.
//! }
//!
//! static SOURCE: [u8; 12] = *b"Hello,world\0";
//! static mut DESTINATION: [u8; 16] = [0; 16];
//!
//! # fn main() -> stm32_dma::Result<()> {
//! let channel = DMA1.channel(0)?;
//! channel.set_callback(on_complete)?;
//! // Safety: both buffers are static, and the destination isn't
//! // accessed until the callback runs.
//! unsafe {
//!     channel.transfer(
//!         Flags::MEM_TO_MEM | Flags::BITS8 | Flags::SRC_INC | Flags::DST_INC,
//!         core::ptr::addr_of_mut!(DESTINATION).cast(),
//!         SOURCE.as_ptr(),
//!         SOURCE.len(),
//!     )?;
//! }
//! # Ok(()) }
//! ```
//!
//! ### License
//!
//! Licensed under either of
//!
//! - [Apache License, Version 2.0](http://www.apache.org/licenses/LICENSE-2.0) ([LICENSE-APACHE](./LICENSE-APACHE))
//! - [MIT License](http://opensource.org/licenses/MIT) ([LICENSE-MIT](./LICENSE-MIT))
//!
//! at your option.
//!
//! Unless you explicitly state otherwise, any contribution intentionally submitted
//! for inclusion in the work by you, as defined in the Apache-2.0 license, shall be
//! dual licensed as above, without any additional terms or conditions.

#![no_std]

// This mod MUST go first, so that the others see its macros.
#[macro_use]
mod fmt;

mod channel;
mod element;
mod error;
pub mod flags;
pub mod hardware;
mod interrupt;
pub mod memcpy;
pub mod peripheral;
mod ral;
pub mod vectors;

pub use channel::Channel;
pub use element::{Element, ElementSize};
pub use error::Error;
pub use flags::{Direction, Flags, Priority};
pub use hardware::{ChannelDma, Hardware, StreamDma};
pub use interrupt::{Callback, Vector};

use interrupt::ChannelState;

#[cfg(any(
    all(feature = "stm32f0", any(feature = "stm32f1", feature = "stm32f4", feature = "stm32l4", feature = "stm32g0")),
    all(feature = "stm32f1", any(feature = "stm32f4", feature = "stm32l4", feature = "stm32g0")),
    all(feature = "stm32f4", any(feature = "stm32l4", feature = "stm32g0")),
    all(feature = "stm32l4", feature = "stm32g0"),
))]
compile_error!("Multiple families specified. Select exactly one of stm32f0, stm32f1, stm32f4, stm32l4 or stm32g0.");

cfg_if::cfg_if! {
    if #[cfg(feature = "stm32f0")] {
        /// The DMA controller layout of the selected family
        pub type Controller = ChannelDma;
        pub use vectors::stm32f0 as device;
    } else if #[cfg(feature = "stm32f1")] {
        /// The DMA controller layout of the selected family
        pub type Controller = ChannelDma;
        pub use vectors::stm32f1 as device;
    } else if #[cfg(feature = "stm32f4")] {
        /// The DMA controller layout of the selected family
        pub type Controller = StreamDma;
        pub use vectors::stm32f4 as device;
    } else if #[cfg(feature = "stm32l4")] {
        /// The DMA controller layout of the selected family
        pub type Controller = ChannelDma;
        pub use vectors::stm32l4 as device;
    } else if #[cfg(feature = "stm32g0")] {
        /// The DMA controller layout of the selected family
        pub type Controller = ChannelDma;
        pub use vectors::stm32g0 as device;
    }
}

/// A DMA result
pub type Result<T> = core::result::Result<T, Error>;

/// A DMA driver
///
/// `Dma` owns one DMA controller and the runtime state of `CHANNELS` of its
/// channels. The state is the registered callback, and the record of the
/// transfer in flight. Construct one `Dma` per controller, usually in a
/// `static`, and share it by reference with the code that starts transfers
/// and with the interrupt handlers.
///
/// ```
/// use stm32_dma::{Dma, StreamDma};
///
/// static DMA2: Dma<StreamDma, 8> =
///     Dma::new(unsafe { StreamDma::new(0x4002_6400 as *const ()) });
/// ```
pub struct Dma<H, const CHANNELS: usize> {
    hardware: H,
    states: [ChannelState; CHANNELS],
}

impl<H: Hardware, const CHANNELS: usize> Dma<H, CHANNELS> {
    /// Create the DMA driver
    ///
    /// Every channel starts idle, without a callback.
    pub const fn new(hardware: H) -> Self {
        Dma {
            hardware,
            states: [ChannelState::NEW; CHANNELS],
        }
    }

    /// Returns the register access of this controller
    pub fn hardware(&self) -> &H {
        &self.hardware
    }

    /// Acquire a handle to the DMA channel at `index`
    ///
    /// Handles are cheap. Several handles to the same channel share its
    /// state, and the in-flight check keeps them from starting overlapping
    /// transfers.
    ///
    /// Returns [`Error::InvalidChannel`] if the controller has no such
    /// channel.
    pub fn channel(&self, index: usize) -> Result<Channel<'_, H>> {
        if index < CHANNELS && index < H::CHANNELS && index < self.hardware.usable_channels() {
            Ok(Channel::new(index, &self.hardware, &self.states[index]))
        } else {
            Err(Error::InvalidChannel(index))
        }
    }

    /// Handle a DMA channel interrupt
    ///
    /// Checks the status of the channel identified by `index`, and does
    /// nothing if the channel raised no flags. Otherwise, clears the flags.
    /// If the transfer completed, or failed, `on_interrupt` invokes the
    /// callback registered when the transfer started.
    ///
    /// Only `index`'s flags are read and cleared, so it's safe to call this
    /// for every channel that shares a vector. Indices beyond the controller
    /// are ignored.
    #[inline(always)]
    pub fn on_interrupt(&self, index: usize) {
        if let Ok(channel) = self.channel(index) {
            channel.on_interrupt();
        }
    }

    /// Handle every channel that shares `vector`
    ///
    /// `vector` must describe this controller.
    pub fn on_vector(&self, vector: &Vector) {
        for &index in vector.channels {
            self.on_interrupt(index);
        }
    }
}
