//! Channel-style DMA controller

use super::{Hardware, Request, Status};
use crate::{
    flags::Direction,
    ral::{self, bdma, dmamux, Static},
};

/// How the controller selects the hardware request of a channel
#[derive(Clone, Copy)]
enum RequestMux {
    /// F0 / F1: requests are hard-wired, OR'd per channel
    Fixed,
    /// L4: 4-bit selection per channel in CSELR
    Cselr,
    /// G0: one DMAMUX channel per DMA channel
    Dmamux {
        registers: Static<dmamux::RegisterBlock>,
        /// The DMAMUX channel that serves DMA channel 0
        first: usize,
    },
}

/// A channel-style DMA controller (STM32F0, F1, L4, G0)
///
/// Up to seven channels share one interrupt status register (`ISR`) and one
/// flag clear register (`IFCR`). Each channel has a control register
/// (`CCR`), a 16-bit count (`CNDTR`), and peripheral and memory addresses.
pub struct ChannelDma {
    registers: Static<bdma::RegisterBlock>,
    mux: RequestMux,
}

// Safety: the handle only references peripheral memory. Every method
// touches the registers and flags of one channel, and the status and
// clear registers are read-only and write-one-to-clear, respectively.
unsafe impl Send for ChannelDma {}
unsafe impl Sync for ChannelDma {}

impl ChannelDma {
    /// Create a controller with hard-wired requests (STM32F0, F1)
    ///
    /// # Safety
    ///
    /// `controller` must point to the start of a DMA controller register
    /// block. The caller must make sure that only one driver owns this
    /// controller.
    pub const unsafe fn new(controller: *const ()) -> Self {
        ChannelDma {
            registers: Static(controller.cast()),
            mux: RequestMux::Fixed,
        }
    }

    /// Create a controller that selects requests through `CSELR` (STM32L4)
    ///
    /// # Safety
    ///
    /// See [`new`](ChannelDma::new).
    pub const unsafe fn with_cselr(controller: *const ()) -> Self {
        ChannelDma {
            registers: Static(controller.cast()),
            mux: RequestMux::Cselr,
        }
    }

    /// Create a controller fed by a DMAMUX (STM32G0)
    ///
    /// `first` is the DMAMUX channel that serves this controller's channel 0.
    /// That's 0 for DMA1, and 7 for DMA2 on parts that have one. Channels
    /// without a DMAMUX channel are not usable: with `first` = 7, only
    /// channels 0 through 4 are.
    ///
    /// # Safety
    ///
    /// See [`new`](ChannelDma::new). `multiplexer` must also point to the
    /// start of the DMAMUX register block.
    pub const unsafe fn with_dmamux(
        controller: *const (),
        multiplexer: *const (),
        first: usize,
    ) -> Self {
        ChannelDma {
            registers: Static(controller.cast()),
            mux: RequestMux::Dmamux {
                registers: Static(multiplexer.cast()),
                first,
            },
        }
    }

    fn ch(&self, channel: usize) -> &bdma::ChannelRegisters {
        &self.registers.CH[channel]
    }

    fn select_request(&self, channel: usize, line: u8) {
        match self.mux {
            RequestMux::Fixed => {}
            RequestMux::Cselr => {
                let offset = bdma::FLAG_STRIDE * channel as u32;
                let cselr = self.registers.CSELR.read();
                let cselr = (cselr & !(0xF << offset)) | ((line as u32 & 0xF) << offset);
                self.registers.CSELR.write(cselr);
            }
            RequestMux::Dmamux { registers, first } => {
                // Out of range channels are never handed out; see usable_channels.
                if let Some(ccr) = registers.CCR.get(first + channel) {
                    let id = (line as u32) & dmamux::CCR::DMAREQ_ID::mask;
                    ccr.write((ccr.read() & !dmamux::CCR::DMAREQ_ID::mask) | id);
                }
            }
        }
    }
}

unsafe impl Hardware for ChannelDma {
    const CHANNELS: usize = bdma::CHANNELS;

    fn usable_channels(&self) -> usize {
        match self.mux {
            RequestMux::Dmamux { first, .. } => dmamux::CHANNELS.saturating_sub(first).min(bdma::CHANNELS),
            RequestMux::Fixed | RequestMux::Cselr => bdma::CHANNELS,
        }
    }

    fn status(&self, channel: usize) -> Status {
        let flags = self.registers.ISR.read() >> (bdma::FLAG_STRIDE * channel as u32);
        let mut status = Status::NONE;
        if flags & bdma::flag::COMPLETE != 0 {
            status |= Status::COMPLETE;
        }
        if flags & bdma::flag::HALF != 0 {
            status |= Status::HALF;
        }
        if flags & bdma::flag::ERROR != 0 {
            status |= Status::ERROR;
        }
        status
    }

    fn clear_status(&self, channel: usize, status: Status) {
        let mut flags = 0;
        if status.is_complete() {
            flags |= bdma::flag::COMPLETE;
        }
        if status.is_half() {
            flags |= bdma::flag::HALF;
        }
        if status.is_error() {
            flags |= bdma::flag::ERROR;
        }
        if flags != 0 {
            // GIF is the OR of the channel's event flags.
            flags |= bdma::flag::GLOBAL;
            // Write-one-to-clear; zero bits leave other channels alone.
            self.registers
                .IFCR
                .write(flags << (bdma::FLAG_STRIDE * channel as u32));
        }
    }

    unsafe fn program(&self, channel: usize, request: &Request) {
        let ch = self.ch(channel);
        let ports = request.ports();
        let size = request.element_size.raw();

        ral::write_reg!(crate::ral::bdma, ch, CPAR, ports.peripheral);
        ral::write_reg!(crate::ral::bdma, ch, CMAR, ports.memory);
        ral::write_reg!(crate::ral::bdma, ch, CNDTR, request.count as u32);

        if let Some(line) = request.request_line {
            self.select_request(channel, line);
        }

        let dir = (request.direction == Direction::MemoryToPeripheral) as u32;
        let mem2mem = (request.direction == Direction::MemoryToMemory) as u32;
        ral::write_reg!(
            crate::ral::bdma,
            ch,
            CCR,
            TCIE: 1,
            HTIE: request.flags.half_transfer() as u32,
            TEIE: 1,
            DIR: dir,
            PINC: ports.peripheral_increment as u32,
            MINC: ports.memory_increment as u32,
            PSIZE: size,
            MSIZE: size,
            PL: request.flags.priority().raw(),
            MEM2MEM: mem2mem
        );
    }

    unsafe fn enable(&self, channel: usize) {
        let ch = self.ch(channel);
        ral::modify_reg!(crate::ral::bdma, ch, CCR, EN: 1);
    }

    fn disable(&self, channel: usize) {
        let ch = self.ch(channel);
        ral::modify_reg!(crate::ral::bdma, ch, CCR, EN: 0);
    }

    fn is_enabled(&self, channel: usize) -> bool {
        let ch = self.ch(channel);
        ral::read_reg!(crate::ral::bdma, ch, CCR, EN == 1)
    }

    fn remaining(&self, channel: usize) -> usize {
        let ch = self.ch(channel);
        let ndt = ral::read_reg!(crate::ral::bdma, ch, CNDTR, NDT);
        ndt as usize
    }
}
