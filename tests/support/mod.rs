//! Test support: a DMA controller simulated in memory
//!
//! `SimulatedDma` records what the driver programs, and lets a test raise
//! the completion, half-transfer and error events that the hardware would.
//! Completing a transfer performs the copy it describes.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};

use stm32_dma::hardware::{Hardware, Request, Status};

pub const CHANNELS: usize = 8;

#[derive(Default, Clone, Copy)]
struct SimulatedChannel {
    enabled: bool,
    complete: bool,
    half: bool,
    error: bool,
    remaining: usize,
    request: Option<Request>,
    clears: usize,
}

#[derive(Default)]
pub struct SimulatedDma {
    channels: RefCell<[SimulatedChannel; CHANNELS]>,
    complete_on_disable: Cell<bool>,
}

impl SimulatedDma {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latch the completion flag whenever an enabled channel is disabled,
    /// like the STM32F4 streams do
    pub fn complete_on_disable(&self) {
        self.complete_on_disable.set(true);
    }

    /// The last request programmed on `channel`
    pub fn request(&self, channel: usize) -> Option<Request> {
        self.channels.borrow()[channel].request
    }

    /// How often `clear_status` touched `channel`
    pub fn clears(&self, channel: usize) -> usize {
        self.channels.borrow()[channel].clears
    }

    /// Move the data, then latch the completion flag
    pub fn complete(&self, channel: usize) {
        let request = self.channels.borrow()[channel]
            .request
            .expect("no transfer programmed");
        copy(&request);
        let mut channels = self.channels.borrow_mut();
        channels[channel].remaining = 0;
        channels[channel].complete = true;
    }

    /// Latch a transfer error after `transferred` elements
    pub fn fail(&self, channel: usize, transferred: usize) {
        let mut channels = self.channels.borrow_mut();
        let count = channels[channel]
            .request
            .map(|request| request.count as usize)
            .unwrap_or(0);
        channels[channel].remaining = count - transferred;
        channels[channel].error = true;
    }

    /// Latch the completion flag after only `transferred` elements, the way
    /// a stream that's stopped early does
    pub fn stop_early(&self, channel: usize, transferred: usize) {
        let mut channels = self.channels.borrow_mut();
        let count = channels[channel]
            .request
            .map(|request| request.count as usize)
            .unwrap_or(0);
        channels[channel].remaining = count - transferred;
        channels[channel].complete = true;
        channels[channel].enabled = false;
    }

    /// Latch the half-transfer flag
    pub fn half(&self, channel: usize) {
        self.channels.borrow_mut()[channel].half = true;
    }
}

/// Perform the element copy that `request` describes
fn copy(request: &Request) {
    let size = request.element_size.bytes();
    let source_step = if request.flags.source_increment() { size } else { 0 };
    let destination_step = if request.flags.destination_increment() { size } else { 0 };
    for index in 0..request.count as usize {
        // Safety: the driver validated the request, and the tests keep
        // every buffer alive until the transfer is handled.
        unsafe {
            core::ptr::copy_nonoverlapping(
                request.source.add(index * source_step),
                request.destination.add(index * destination_step),
                size,
            );
        }
    }
}

unsafe impl Hardware for SimulatedDma {
    const CHANNELS: usize = CHANNELS;

    fn status(&self, channel: usize) -> Status {
        let ch = self.channels.borrow()[channel];
        let mut status = Status::NONE;
        if ch.complete {
            status |= Status::COMPLETE;
        }
        if ch.half {
            status |= Status::HALF;
        }
        if ch.error {
            status |= Status::ERROR;
        }
        status
    }

    fn clear_status(&self, channel: usize, status: Status) {
        let ch = &mut self.channels.borrow_mut()[channel];
        ch.clears += 1;
        if status.is_complete() {
            ch.complete = false;
        }
        if status.is_half() {
            ch.half = false;
        }
        if status.is_error() {
            ch.error = false;
        }
    }

    unsafe fn program(&self, channel: usize, request: &Request) {
        let ch = &mut self.channels.borrow_mut()[channel];
        ch.request = Some(*request);
        ch.remaining = request.count as usize;
    }

    unsafe fn enable(&self, channel: usize) {
        self.channels.borrow_mut()[channel].enabled = true;
    }

    fn disable(&self, channel: usize) {
        let ch = &mut self.channels.borrow_mut()[channel];
        if ch.enabled && self.complete_on_disable.get() {
            ch.complete = true;
        }
        ch.enabled = false;
    }

    fn is_enabled(&self, channel: usize) -> bool {
        self.channels.borrow()[channel].enabled
    }

    fn remaining(&self, channel: usize) -> usize {
        self.channels.borrow()[channel].remaining
    }
}

/// One callback invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Call {
    pub tag: &'static str,
    pub buffer: usize,
    pub size: usize,
    pub success: bool,
}

thread_local! {
    static CALLS: RefCell<Vec<Call>> = RefCell::new(Vec::new());
}

fn record(tag: &'static str, buffer: *mut u8, size: usize, success: bool) {
    CALLS.with(|calls| {
        calls.borrow_mut().push(Call {
            tag,
            buffer: buffer as usize,
            size,
            success,
        })
    });
}

/// Take every callback invocation recorded on this thread
pub fn calls() -> Vec<Call> {
    CALLS.with(|calls| calls.take())
}

pub fn callback_a(buffer: *mut u8, size: usize, success: bool) {
    record("a", buffer, size, success);
}

pub fn callback_b(buffer: *mut u8, size: usize, success: bool) {
    record("b", buffer, size, success);
}

/// A buffer that outlives the test
pub fn leak<T: Clone>(value: T, len: usize) -> &'static mut [T] {
    Box::leak(vec![value; len].into_boxed_slice())
}

/// Zeroed memory standing in for a peripheral's register block
///
/// Declare it before the driver that uses it, so that it's dropped last.
pub struct Registers(*mut [u32; 64]);

impl Registers {
    pub fn new() -> Self {
        Registers(Box::into_raw(Box::new([0; 64])))
    }

    pub fn base(&self) -> *const () {
        self.0 as *const ()
    }

    pub fn address(&self, offset: usize) -> usize {
        self.0 as usize + offset
    }

    pub fn read(&self, offset: usize) -> u32 {
        // Safety: every offset used by the tests is inside the block.
        unsafe { (self.0 as *mut u32).add(offset / 4).read_volatile() }
    }

    pub fn write(&self, offset: usize, value: u32) {
        // Safety: every offset used by the tests is inside the block.
        unsafe { (self.0 as *mut u32).add(offset / 4).write_volatile(value) }
    }
}

impl Drop for Registers {
    fn drop(&mut self) {
        // Safety: allocated in new(), and released once.
        drop(unsafe { Box::from_raw(self.0) });
    }
}
