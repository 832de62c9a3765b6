//! Scheduler events and drain callbacks
//!
//! Event functions run inside the scheduler's critical section. The
//! transmit events claim their DMA channel, drain one chunk and hand it to
//! the transmit task through a signal. The drain callbacks are the only
//! place data leaves a buffer.

use cadence_core::config::{EventConfig, DRAIN_CHUNK};
use cadence_core::{BufferDescriptor, Flag, Scheduler, TaskFn};
use critical_section::CriticalSection;
use defmt::*;
use heapless::Vec;

use crate::buffers::Buffers;
use crate::channels::{
    HEARTBEAT, HEARTBEAT_FLAG, SPI_DMA_READY, SPI_TX_CHUNK, SPI_TX_COUNT, UART_DMA_READY,
    UART_TX_CHUNK, UART_TX_COUNT,
};
use crate::config::{HEARTBEAT_EVENT, SPI_TX_EVENT, UART_TX_EVENT};
use crate::tasks::tick::EmbassyClock;

/// Scheduler as configured for this board
pub type AppScheduler = Scheduler<'static, EmbassyClock>;

/// Drain one chunk of the UART buffer into DMA1 channel 4
pub fn uart_fifo_tx_event(cs: CriticalSection<'_>, buffer: &BufferDescriptor<'_>, ready: &Flag) {
    ready.decrement_in(cs);
    if buffer.drain_in(cs, DRAIN_CHUNK) == 0 {
        // nothing handed to the DMA task, so nobody will free the channel
        ready.signal_in(cs);
    }
}

/// Drain one chunk of the SPI buffer into DMA1 channel 3
pub fn spi_fifo_tx_event(cs: CriticalSection<'_>, buffer: &BufferDescriptor<'_>, ready: &Flag) {
    ready.decrement_in(cs);
    if buffer.drain_in(cs, DRAIN_CHUNK) == 0 {
        ready.signal_in(cs);
    }
}

/// Wake the heartbeat task
pub fn heartbeat_event(_cs: CriticalSection<'_>, _buffer: &BufferDescriptor<'_>, _ready: &Flag) {
    HEARTBEAT.signal(());
}

/// Hand a drained UART chunk to the transmit task
pub fn uart_dma_tx_handler(data: &[u8]) {
    match Vec::from_slice(data) {
        Ok(chunk) => UART_TX_CHUNK.signal(chunk),
        Err(()) => {
            error!("uart chunk of {} bytes exceeds {}", data.len(), DRAIN_CHUNK);
            // no write will complete, so free the channel here
            UART_DMA_READY.signal();
        }
    }
}

/// Hand a drained SPI chunk to the transmit task
pub fn spi_dma_tx_handler(data: &[u16]) {
    match Vec::from_slice(data) {
        Ok(chunk) => SPI_TX_CHUNK.signal(chunk),
        Err(()) => {
            error!("spi chunk of {} words exceeds {}", data.len(), DRAIN_CHUNK);
            SPI_DMA_READY.signal();
        }
    }
}

/// Drain callback for buffers nobody reads from
pub fn discard(_data: &[u8]) {}

/// Reset the flags and register every enabled event
pub fn init_scheduler(clock: EmbassyClock, buffers: Buffers) -> AppScheduler {
    let mut scheduler = Scheduler::init(
        clock,
        &[
            (&UART_TX_COUNT, 0),
            (&SPI_TX_COUNT, 0),
            (&UART_DMA_READY, 1),
            (&SPI_DMA_READY, 1),
            (&HEARTBEAT_FLAG, 1),
        ],
    );

    register(&mut scheduler, "uart_tx", UART_TX_EVENT, uart_fifo_tx_event, buffers.uart_tx, &UART_DMA_READY);
    register(&mut scheduler, "spi_tx", SPI_TX_EVENT, spi_fifo_tx_event, buffers.spi_tx, &SPI_DMA_READY);
    register(&mut scheduler, "heartbeat", HEARTBEAT_EVENT, heartbeat_event, buffers.heartbeat, &HEARTBEAT_FLAG);

    scheduler
}

fn register(
    scheduler: &mut AppScheduler,
    name: &str,
    config: EventConfig,
    task: TaskFn<'static>,
    buffer: &'static BufferDescriptor<'static>,
    ready: &'static Flag,
) {
    if !config.enabled {
        info!("Event {} disabled", name);
        return;
    }
    match scheduler.register(task, config.interval_ticks, buffer, ready) {
        Some(handle) => info!(
            "Event {} in slot {}, every {} ticks",
            name,
            handle.index(),
            config.interval_ticks
        ),
        None => warn!("Event {} not registered", name),
    }
}
