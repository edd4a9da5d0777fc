//! Peripheral adapters driven by a simulated controller

mod support;

use stm32_dma::{
    peripheral::{
        adc::{Adc, AdcV2},
        i2c::{I2c, I2cV1},
        spi::{Spi, SpiRegisters},
        usart::{Serial, UsartV1},
    },
    Direction, Dma, ElementSize, Error, Flags,
};
use support::{callback_a, callback_b, calls, leak, Registers, SimulatedDma};

fn dma() -> Dma<SimulatedDma, 8> {
    calls();
    Dma::new(SimulatedDma::new())
}

// USART v1: SR 0x00, DR 0x04, CR3 0x14
const USART_SR: usize = 0x00;
const USART_DR: usize = 0x04;
const USART_CR3: usize = 0x14;

#[test]
fn usart_write_dma() {
    let registers = Registers::new();
    let dma = dma();
    let channel = dma.channel(3).unwrap();
    channel.set_callback(callback_a).unwrap();

    // TC is set after reset.
    registers.write(USART_SR, 1 << 6);
    let usart = unsafe { UsartV1::new(registers.base()) }.with_requests(4, 5);
    let mut serial = Serial::new(usart).with_tx_dma(channel);

    let message: &'static [u8] = b"ping";
    serial.write_dma(message).unwrap();

    let request = dma.hardware().request(3).unwrap();
    assert_eq!(request.direction, Direction::MemoryToPeripheral);
    assert_eq!(request.destination as usize, registers.address(USART_DR));
    assert_eq!(request.request_line, Some(4));
    assert_eq!(registers.read(USART_CR3), 1 << 7);
    assert_eq!(registers.read(USART_SR), 0);

    // A second write while the first is in flight is refused.
    assert_eq!(serial.write_dma(message), Err(Error::Busy(3)));

    dma.hardware().complete(3);
    dma.on_interrupt(3);
    assert_eq!(registers.read(USART_DR), u32::from(b'g'));

    let calls = calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].buffer, 0);
    assert_eq!(calls[0].size, 4);
    assert!(calls[0].success);

    serial.stop_write_dma();
    assert_eq!(registers.read(USART_CR3), 0);
}

#[test]
fn usart_read_dma() {
    let registers = Registers::new();
    let dma = dma();
    let channel = dma.channel(4).unwrap();
    channel.set_callback(callback_b).unwrap();

    let usart = unsafe { UsartV1::new(registers.base()) };
    let mut serial = Serial::new(usart).with_rx_dma(channel);
    let buffer = leak(0u8, 3);
    let address = buffer.as_ptr() as usize;
    serial.read_dma(buffer).unwrap();
    assert_eq!(registers.read(USART_CR3), 1 << 6);

    registers.write(USART_DR, u32::from(b'r'));
    dma.hardware().complete(4);
    dma.on_interrupt(4);

    let calls = calls();
    assert_eq!(calls[0].buffer, address);
    assert_eq!(calls[0].size, 3);
    // Safety: the transfer is done.
    let received = unsafe { core::slice::from_raw_parts(address as *const u8, 3) };
    assert_eq!(received, b"rrr");
}

#[test]
fn usart_without_dma_blocks() {
    let registers = Registers::new();
    let mut serial = Serial::new(unsafe { UsartV1::new(registers.base()) });

    // TXE and TC
    registers.write(USART_SR, (1 << 7) | (1 << 6));
    serial.write_all(b"ok").unwrap();
    assert_eq!(registers.read(USART_DR), u32::from(b'k'));

    assert_eq!(serial.read(), Err(nb::Error::WouldBlock));
    registers.write(USART_DR, u32::from(b'x'));
    registers.write(USART_SR, 1 << 5);
    assert_eq!(serial.read(), Ok(b'x'));
}

// ADC v2: CFGR 0x0C, DR 0x40
#[test]
fn adc_read_dma() {
    let registers = Registers::new();
    let dma = dma();
    let channel = dma.channel(0).unwrap();
    channel.set_callback(callback_a).unwrap();

    let converter = unsafe { AdcV2::new(registers.base()) }.with_request(5);
    let mut adc = Adc::new(converter).with_dma(channel);
    let buffer = leak(0u16, 4);
    let address = buffer.as_ptr() as usize;
    adc.read_dma(buffer).unwrap();

    let request = dma.hardware().request(0).unwrap();
    assert_eq!(request.direction, Direction::PeripheralToMemory);
    assert_eq!(request.element_size, ElementSize::Bits16);
    assert_eq!(request.source as usize, registers.address(0x40));
    assert_eq!(request.flags, Flags::PERIPH_TO_MEM | Flags::BITS16 | Flags::DST_INC);
    assert_eq!(request.request_line, Some(5));
    assert_eq!(registers.read(0x0C) & 1, 1);

    registers.write(0x40, 0x0ABC);
    dma.hardware().complete(0);
    dma.on_interrupt(0);

    let calls = calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].buffer, address);
    assert_eq!(calls[0].size, 4);
    // Safety: the transfer is done.
    let results = unsafe { core::slice::from_raw_parts(address as *const u16, 4) };
    assert_eq!(results, &[0x0ABC; 4]);

    adc.stop_dma();
    assert_eq!(registers.read(0x0C) & 1, 0);
}

// SPI: CR2 0x04, DR 0x0C
#[test]
fn spi_transfer_dma_uses_both_channels() {
    let registers = Registers::new();
    let dma = dma();
    let rx = dma.channel(1).unwrap();
    let tx = dma.channel(2).unwrap();
    rx.set_callback(callback_a).unwrap();

    let spi = unsafe { SpiRegisters::new(registers.base()) };
    let mut spi = Spi::new(spi).with_rx_dma(rx).with_tx_dma(tx);
    let buffer = leak(0x5Au8, 8);
    let address = buffer.as_ptr() as usize;
    spi.transfer_dma(buffer).unwrap();

    let receive = dma.hardware().request(1).unwrap();
    let transmit = dma.hardware().request(2).unwrap();
    assert_eq!(receive.source as usize, registers.address(0x0C));
    assert_eq!(receive.destination as usize, address);
    assert_eq!(transmit.source as usize, address);
    assert_eq!(transmit.destination as usize, registers.address(0x0C));
    assert_eq!(registers.read(0x04) & 0b11, 0b11);

    dma.hardware().complete(2);
    dma.hardware().complete(1);
    dma.on_interrupt(2);
    dma.on_interrupt(1);

    let calls = calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].buffer, address);
    assert_eq!(calls[0].size, 8);

    spi.stop_dma();
    assert_eq!(registers.read(0x04) & 0b11, 0);
}

#[test]
fn spi_transfer_dma_backs_out_when_transmit_is_busy() {
    let registers = Registers::new();
    let dma = dma();
    dma.hardware().complete_on_disable();

    // Occupy the transmit channel.
    let other = dma.channel(2).unwrap();
    let source = leak(0u8, 4);
    let destination = leak(0u8, 4);
    let copy = Flags::MEM_TO_MEM | Flags::BITS8 | Flags::SRC_INC | Flags::DST_INC;
    unsafe { other.transfer(copy, destination.as_mut_ptr(), source.as_ptr(), 4) }.unwrap();

    let rx = dma.channel(1).unwrap();
    rx.set_callback(callback_a).unwrap();

    let spi = unsafe { SpiRegisters::new(registers.base()) };
    let mut spi = Spi::new(spi)
        .with_rx_dma(dma.channel(1).unwrap())
        .with_tx_dma(dma.channel(2).unwrap());
    assert_eq!(spi.transfer_dma(leak(0u8, 8)), Err(Error::Busy(2)));

    assert!(!rx.is_busy());
    assert!(!rx.is_enabled());
    assert_eq!(registers.read(0x04), 0);

    // Stopping the receive channel latched its completion. The withdrawn
    // transfer never reaches the callback.
    dma.on_interrupt(1);
    assert!(calls().is_empty());
    assert!(other.is_busy());
}

// I2C v1: CR2 0x04, DR 0x10
const I2C_CR2: usize = 0x04;
const I2C_DR: usize = 0x10;
const DMAEN: u32 = 1 << 11;
const LAST: u32 = 1 << 12;

#[test]
fn i2c_write_dma() {
    let registers = Registers::new();
    let dma = dma();
    let channel = dma.channel(6).unwrap();
    channel.set_callback(callback_a).unwrap();

    let bus = unsafe { I2cV1::new(registers.base()) }.with_requests(1, 2);
    let mut i2c = I2c::new(bus).with_tx_dma(channel);
    i2c.write_dma(b"\x10\x20\x30").unwrap();

    let request = dma.hardware().request(6).unwrap();
    assert_eq!(request.direction, Direction::MemoryToPeripheral);
    assert_eq!(request.flags, Flags::MEM_TO_PERIPH | Flags::BITS8 | Flags::SRC_INC);
    assert_eq!(request.destination as usize, registers.address(I2C_DR));
    assert_eq!(request.request_line, Some(1));
    // LAST only applies to reception.
    assert_eq!(registers.read(I2C_CR2), DMAEN);

    dma.hardware().complete(6);
    dma.on_interrupt(6);
    assert_eq!(registers.read(I2C_DR), 0x30);

    let calls = calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].tag, "a");
    assert_eq!(calls[0].buffer, 0);
    assert_eq!(calls[0].size, 3);
    assert!(calls[0].success);
}

#[test]
fn i2c_read_dma() {
    let registers = Registers::new();
    let dma = dma();
    let channel = dma.channel(7).unwrap();
    channel.set_callback(callback_b).unwrap();

    let bus = unsafe { I2cV1::new(registers.base()) }.with_requests(1, 2);
    let mut i2c = I2c::new(bus).with_rx_dma(channel);
    let buffer = leak(0u8, 5);
    let address = buffer.as_ptr() as usize;
    i2c.read_dma(buffer).unwrap();

    let request = dma.hardware().request(7).unwrap();
    assert_eq!(request.direction, Direction::PeripheralToMemory);
    assert_eq!(request.flags, Flags::PERIPH_TO_MEM | Flags::BITS8 | Flags::DST_INC);
    assert_eq!(request.source as usize, registers.address(I2C_DR));
    assert_eq!(request.destination as usize, address);
    assert_eq!(request.request_line, Some(2));
    assert_eq!(registers.read(I2C_CR2), DMAEN | LAST);

    // A second read before the first one finishes is refused.
    assert_eq!(i2c.read_dma(leak(0u8, 1)), Err(Error::Busy(7)));

    registers.write(I2C_DR, 0x7E);
    dma.hardware().complete(7);
    dma.on_interrupt(7);

    let calls = calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].tag, "b");
    assert_eq!(calls[0].buffer, address);
    assert_eq!(calls[0].size, 5);
    assert!(calls[0].success);
    // Safety: the transfer is done.
    let received = unsafe { core::slice::from_raw_parts(address as *const u8, 5) };
    assert_eq!(received, &[0x7E; 5]);
}
