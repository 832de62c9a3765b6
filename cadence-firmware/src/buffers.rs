//! Static transmit buffers
//!
//! Backing storage and descriptors live in `StaticCell`s so the scheduler
//! and the producers can share `'static` references to them.

use cadence_core::BufferDescriptor;
use defmt::*;
use static_cell::StaticCell;

use crate::channels::{HEARTBEAT_FLAG, SPI_TX_COUNT, UART_TX_COUNT};
use crate::config::{HEARTBEAT_CAPACITY, SPI_TX_CAPACITY, UART_TX_CAPACITY};
use crate::events::{discard, spi_dma_tx_handler, uart_dma_tx_handler};

static UART_TX_STORAGE: StaticCell<[u8; UART_TX_CAPACITY]> = StaticCell::new();
static SPI_TX_STORAGE: StaticCell<[u16; SPI_TX_CAPACITY]> = StaticCell::new();
static HEARTBEAT_STORAGE: StaticCell<[u8; HEARTBEAT_CAPACITY]> = StaticCell::new();

static UART_TX: StaticCell<BufferDescriptor<'static>> = StaticCell::new();
static SPI_TX: StaticCell<BufferDescriptor<'static>> = StaticCell::new();
static HEARTBEAT: StaticCell<BufferDescriptor<'static>> = StaticCell::new();

/// Handles to the application buffers
#[derive(Clone, Copy)]
pub struct Buffers {
    pub uart_tx: &'static BufferDescriptor<'static>,
    pub spi_tx: &'static BufferDescriptor<'static>,
    pub heartbeat: &'static BufferDescriptor<'static>,
}

impl Buffers {
    /// Queue bytes for transmission on USART2
    ///
    /// Returns the number accepted; the rest is dropped.
    pub fn uart_send(&self, data: &[u8]) -> usize {
        let written = self.uart_tx.put(data);
        if written < data.len() {
            debug!("uart tx: dropped {} of {} bytes", data.len() - written, data.len());
        }
        written
    }

    /// Queue words for transmission on SPI1
    ///
    /// Returns the number accepted; the rest is dropped.
    pub fn spi_send(&self, data: &[u16]) -> usize {
        let written = self.spi_tx.put(data);
        if written < data.len() {
            debug!("spi tx: dropped {} of {} words", data.len() - written, data.len());
        }
        written
    }
}

/// Bind storage, count flags and drain callbacks
///
/// Panics if called twice.
pub fn init() -> Buffers {
    let uart_storage = UART_TX_STORAGE.init([0; UART_TX_CAPACITY]);
    let spi_storage = SPI_TX_STORAGE.init([0; SPI_TX_CAPACITY]);
    let heartbeat_storage = HEARTBEAT_STORAGE.init([0; HEARTBEAT_CAPACITY]);

    let buffers = Buffers {
        uart_tx: UART_TX.init(BufferDescriptor::bytes(
            uart_storage,
            &UART_TX_COUNT,
            uart_dma_tx_handler,
        )),
        spi_tx: SPI_TX.init(BufferDescriptor::words(
            spi_storage,
            &SPI_TX_COUNT,
            spi_dma_tx_handler,
        )),
        heartbeat: HEARTBEAT.init(BufferDescriptor::bytes(
            heartbeat_storage,
            &HEARTBEAT_FLAG,
            discard,
        )),
    };

    info!(
        "Buffers ready: uart_tx {} bytes, spi_tx {} words",
        buffers.uart_tx.usable_capacity(),
        buffers.spi_tx.usable_capacity()
    );
    buffers
}
