//! Cadence - buffered DMA transmit firmware
//!
//! Main firmware binary for STM32F072 boards. Producers queue bytes for
//! USART2 and 16-bit words for SPI1 into ring buffers; a fixed-rate event
//! scheduler drains them into the DMA transmit tasks whenever the channel
//! is free.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_stm32::gpio::{Level, Output, Speed};
use embassy_stm32::spi::{self, Spi};
use embassy_stm32::time::Hertz;
use embassy_stm32::usart::{self, UartTx};
use {defmt_rtt as _, panic_probe as _};

mod buffers;
mod channels;
mod config;
mod events;
mod tasks;

use crate::config::{SPI_FREQUENCY_HZ, TIMING, UART_BAUDRATE};
use crate::tasks::tick::EmbassyClock;

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Cadence firmware starting...");

    let p = embassy_stm32::init(Default::default());
    info!("Peripherals initialized");

    // USART2 TX on PA2, DMA1 channel 4
    let mut uart_config = usart::Config::default();
    uart_config.baudrate = UART_BAUDRATE;
    let uart_tx = UartTx::new(p.USART2, p.PA2, p.DMA1_CH4, uart_config).unwrap();

    // SPI1 transmit-only on PA5 (SCK) / PA7 (MOSI), DMA1 channel 3
    let mut spi_config = spi::Config::default();
    spi_config.frequency = Hertz(SPI_FREQUENCY_HZ);
    let spi = Spi::new_txonly(p.SPI1, p.PA5, p.PA7, p.DMA1_CH3, spi_config);

    let led = Output::new(p.PC9, Level::Low, Speed::Low);

    let buffers = buffers::init();
    let scheduler = events::init_scheduler(EmbassyClock, buffers);
    info!(
        "Scheduler ready: {}/{} events, {} Hz ticks",
        scheduler.len(),
        scheduler.capacity(),
        TIMING.tick_hz
    );

    spawner.spawn(tasks::uart_tx_task(uart_tx)).unwrap();
    spawner.spawn(tasks::spi_tx_task(spi)).unwrap();
    spawner.spawn(tasks::heartbeat_task(led)).unwrap();
    spawner.spawn(tasks::scheduler_task(scheduler)).unwrap();
    spawner.spawn(tasks::producer_task(buffers)).unwrap();

    info!("All tasks spawned");
}
