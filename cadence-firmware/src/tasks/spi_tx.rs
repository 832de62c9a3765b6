//! SPI1 DMA transmit task

use defmt::*;
use embassy_stm32::mode::Async;
use embassy_stm32::spi::Spi;

use crate::channels::{SPI_DMA_READY, SPI_TX_CHUNK};

/// SPI TX task - writes drained 16-bit chunks and frees the DMA channel
#[embassy_executor::task]
pub async fn spi_tx_task(mut spi: Spi<'static, Async>) {
    info!("SPI TX task started");

    loop {
        let chunk = SPI_TX_CHUNK.wait().await;

        if let Err(e) = spi.write::<u16>(&chunk).await {
            warn!("SPI write of {} words failed: {:?}", chunk.len(), e);
        }

        SPI_DMA_READY.signal();
    }
}
