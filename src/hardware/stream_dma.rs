//! Stream-style DMA controller

use super::{Hardware, Request, Status};
use crate::{
    flags::Direction,
    ral::{self, stream, Static},
};

/// A stream-style DMA controller (STM32F4)
///
/// Eight streams report into two status registers (`LISR` for streams 0..=3,
/// `HISR` for 4..=7). A stream's request is selected through `CHSEL`, so the
/// request line of a [`Request`] is the channel number, 0..=7.
///
/// Memory-to-memory transfers run with the FIFO enabled, as the hardware
/// requires. Other transfers use direct mode.
pub struct StreamDma {
    registers: Static<stream::RegisterBlock>,
}

// Safety: see ChannelDma. LIFCR / HIFCR are write-one-to-clear.
unsafe impl Send for StreamDma {}
unsafe impl Sync for StreamDma {}

impl StreamDma {
    /// Create a stream controller
    ///
    /// # Safety
    ///
    /// `controller` must point to the start of a DMA controller register
    /// block. The caller must make sure that only one driver owns this
    /// controller.
    pub const unsafe fn new(controller: *const ()) -> Self {
        StreamDma {
            registers: Static(controller.cast()),
        }
    }

    fn st(&self, stream: usize) -> &stream::StreamRegisters {
        &self.registers.ST[stream]
    }

    fn flags(&self, stream: usize) -> u32 {
        let isr = if stream < 4 {
            self.registers.LISR.read()
        } else {
            self.registers.HISR.read()
        };
        (isr >> stream::flag_offset(stream)) & stream::flag::ALL
    }
}

unsafe impl Hardware for StreamDma {
    const CHANNELS: usize = stream::STREAMS;

    fn status(&self, channel: usize) -> Status {
        let flags = self.flags(channel);
        let mut status = Status::NONE;
        if flags & stream::flag::COMPLETE != 0 {
            status |= Status::COMPLETE;
        }
        if flags & stream::flag::HALF != 0 {
            status |= Status::HALF;
        }
        // A FIFO error alone does not stop the stream, so it isn't reported.
        if flags & (stream::flag::ERROR | stream::flag::DIRECT_MODE_ERROR) != 0 {
            status |= Status::ERROR;
        }
        status
    }

    fn clear_status(&self, channel: usize, status: Status) {
        let mut flags = 0;
        if status.is_complete() {
            flags |= stream::flag::COMPLETE;
        }
        if status.is_half() {
            flags |= stream::flag::HALF;
        }
        if status.is_error() {
            flags |= stream::flag::ERROR | stream::flag::DIRECT_MODE_ERROR;
        }
        if status == Status::ALL {
            flags |= stream::flag::FIFO_ERROR;
        }
        if flags == 0 {
            return;
        }
        let flags = flags << stream::flag_offset(channel);
        if channel < 4 {
            self.registers.LIFCR.write(flags);
        } else {
            self.registers.HIFCR.write(flags);
        }
    }

    unsafe fn program(&self, channel: usize, request: &Request) {
        let st = self.st(channel);
        let ports = request.ports();
        let size = request.element_size.raw();

        ral::write_reg!(crate::ral::stream, st, PAR, ports.peripheral);
        ral::write_reg!(crate::ral::stream, st, M0AR, ports.memory);
        ral::write_reg!(crate::ral::stream, st, NDTR, request.count as u32);

        let (dir, direct_mode): (u32, bool) = match request.direction {
            Direction::PeripheralToMemory => (0b00, true),
            Direction::MemoryToPeripheral => (0b01, true),
            Direction::MemoryToMemory => (0b10, false),
        };
        if direct_mode {
            ral::write_reg!(crate::ral::stream, st, FCR, DMDIS: 0);
        } else {
            ral::write_reg!(crate::ral::stream, st, FCR, DMDIS: 1, FTH: 0b11);
        }

        let chsel = request.request_line.unwrap_or(0) as u32;
        ral::write_reg!(
            crate::ral::stream,
            st,
            CR,
            DMEIE: direct_mode as u32,
            TEIE: 1,
            HTIE: request.flags.half_transfer() as u32,
            TCIE: 1,
            DIR: dir,
            PINC: ports.peripheral_increment as u32,
            MINC: ports.memory_increment as u32,
            PSIZE: size,
            MSIZE: size,
            PL: request.flags.priority().raw(),
            CHSEL: chsel
        );
    }

    unsafe fn enable(&self, channel: usize) {
        let st = self.st(channel);
        ral::modify_reg!(crate::ral::stream, st, CR, EN: 1);
    }

    fn disable(&self, channel: usize) {
        let st = self.st(channel);
        ral::modify_reg!(crate::ral::stream, st, CR, EN: 0);
        // EN reads back as 1 until the current data item is done.
        while ral::read_reg!(crate::ral::stream, st, CR, EN == 1) {}
    }

    fn is_enabled(&self, channel: usize) -> bool {
        let st = self.st(channel);
        ral::read_reg!(crate::ral::stream, st, CR, EN == 1)
    }

    fn remaining(&self, channel: usize) -> usize {
        let st = self.st(channel);
        let ndt = ral::read_reg!(crate::ral::stream, st, NDTR, NDT);
        ndt as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::Flags;
    use core::ptr;

    fn zeroed() -> stream::RegisterBlock {
        // Safety: register blocks are plain integers.
        unsafe { core::mem::zeroed() }
    }

    fn set_status(block: &stream::RegisterBlock, low: u32, high: u32) {
        // Safety: RAM-backed register block.
        unsafe {
            ptr::write_volatile(ptr::addr_of!(block.LISR).cast::<u32>().cast_mut(), low);
            ptr::write_volatile(ptr::addr_of!(block.HISR).cast::<u32>().cast_mut(), high);
        }
    }

    fn clears(block: &stream::RegisterBlock) -> (u32, u32) {
        // Safety: RAM-backed register block.
        unsafe {
            (
                ptr::read_volatile(ptr::addr_of!(block.LIFCR).cast::<u32>()),
                ptr::read_volatile(ptr::addr_of!(block.HIFCR).cast::<u32>()),
            )
        }
    }

    fn request(direction: Direction, flags: Flags, line: Option<u8>) -> Request {
        Request {
            source: 0x2000_0000 as *const u8,
            destination: 0x4000_4404 as *mut u8,
            count: 300,
            direction,
            element_size: flags.element_size().unwrap(),
            flags,
            request_line: line,
        }
    }

    #[test]
    fn memory_to_peripheral_stream() {
        let block = zeroed();
        let dma = unsafe { StreamDma::new(&block as *const _ as *const ()) };

        let flags = Flags::MEM_TO_PERIPH | Flags::SRC_INC | Flags::HALF_TRANSFER;
        unsafe { dma.program(6, &request(Direction::MemoryToPeripheral, flags, Some(4))) };

        let cr = block.ST[6].CR.read();
        assert_eq!(cr & 1, 0, "programming must not enable the stream");
        assert_eq!((cr >> 6) & 0b11, 0b01, "DIR");
        assert_eq!((cr >> 25) & 0b111, 4, "CHSEL");
        assert_ne!(cr & (1 << 10), 0, "MINC");
        assert_eq!(cr & (1 << 9), 0, "PINC");
        assert_ne!(cr & (1 << 3), 0, "HTIE");
        assert_ne!(cr & (1 << 1), 0, "DMEIE in direct mode");
        assert_eq!(block.ST[6].PAR.read(), 0x4000_4404);
        assert_eq!(block.ST[6].M0AR.read(), 0x2000_0000);
        assert_eq!(block.ST[6].NDTR.read(), 300);
        assert_eq!(block.ST[6].FCR.read() & (1 << 2), 0, "direct mode");
    }

    #[test]
    fn memory_to_memory_uses_fifo() {
        let block = zeroed();
        let dma = unsafe { StreamDma::new(&block as *const _ as *const ()) };

        let flags = Flags::MEM_TO_MEM | Flags::BITS32 | Flags::SRC_INC | Flags::DST_INC;
        unsafe { dma.program(0, &request(Direction::MemoryToMemory, flags, None)) };

        let cr = block.ST[0].CR.read();
        assert_eq!((cr >> 6) & 0b11, 0b10, "DIR");
        assert_eq!((cr >> 11) & 0b11, 0b10, "PSIZE");
        assert_eq!((cr >> 13) & 0b11, 0b10, "MSIZE");
        assert_eq!(cr & (1 << 1), 0, "no direct mode error interrupt");
        assert_eq!(block.ST[0].FCR.read() & 0b111, 0b111, "DMDIS and full threshold");
        assert_eq!(block.ST[0].PAR.read(), 0x2000_0000);
    }

    #[test]
    fn status_reads_low_and_high_groups() {
        let block = zeroed();
        let dma = unsafe { StreamDma::new(&block as *const _ as *const ()) };

        // Stream 1 complete, stream 6 transfer error, stream 7 FIFO error only.
        set_status(&block, 1 << (6 + 5), (1 << (16 + 3)) | (1 << 22));
        assert_eq!(dma.status(0), Status::NONE);
        assert_eq!(dma.status(1), Status::COMPLETE);
        assert_eq!(dma.status(6), Status::ERROR);
        assert_eq!(dma.status(7), Status::NONE);
    }

    #[test]
    fn clear_targets_one_stream() {
        let block = zeroed();
        let dma = unsafe { StreamDma::new(&block as *const _ as *const ()) };

        dma.clear_status(2, Status::COMPLETE | Status::HALF);
        assert_eq!(clears(&block), ((0b11 << 4) << 16, 0));

        dma.clear_status(5, Status::ERROR);
        assert_eq!(clears(&block).1, 0b1100 << 6);
    }

    #[test]
    fn enable_disable_and_remaining() {
        let block = zeroed();
        let dma = unsafe { StreamDma::new(&block as *const _ as *const ()) };

        unsafe { dma.enable(3) };
        assert!(dma.is_enabled(3));
        dma.disable(3);
        assert!(!dma.is_enabled(3));

        block.ST[3].NDTR.write(17);
        assert_eq!(dma.remaining(3), 17);
    }
}
