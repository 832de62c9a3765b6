//! Flags and signals shared between events, tasks and producers
//!
//! Count flags belong to the buffers and track how many elements each holds.
//! Ready flags model the transmit DMA channels: the scheduler only drains a
//! buffer while its channel is free, and the transmit task sets the flag
//! again once the DMA write completes.

use cadence_core::config::DRAIN_CHUNK;
use cadence_core::Flag;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use heapless::Vec;

/// Elements resident in the UART transmit buffer
pub static UART_TX_COUNT: Flag = Flag::new(0);

/// Elements resident in the SPI transmit buffer
pub static SPI_TX_COUNT: Flag = Flag::new(0);

/// DMA1 channel 4 (USART2 TX) is free
pub static UART_DMA_READY: Flag = Flag::new(1);

/// DMA1 channel 3 (SPI1 TX) is free
pub static SPI_DMA_READY: Flag = Flag::new(1);

/// Heartbeat gate; doubles as the heartbeat buffer's count, so it stays due
pub static HEARTBEAT_FLAG: Flag = Flag::new(1);

/// Chunk drained from the UART buffer, waiting for the DMA write
pub static UART_TX_CHUNK: Signal<CriticalSectionRawMutex, Vec<u8, DRAIN_CHUNK>> = Signal::new();

/// Chunk drained from the SPI buffer, waiting for the DMA write
pub static SPI_TX_CHUNK: Signal<CriticalSectionRawMutex, Vec<u16, DRAIN_CHUNK>> = Signal::new();

/// Heartbeat event fired
pub static HEARTBEAT: Signal<CriticalSectionRawMutex, ()> = Signal::new();
