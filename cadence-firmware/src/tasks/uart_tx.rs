//! USART2 DMA transmit task

use defmt::*;
use embassy_stm32::mode::Async;
use embassy_stm32::usart::UartTx;

use crate::channels::{UART_DMA_READY, UART_TX_CHUNK};

/// UART TX task - writes drained chunks and frees the DMA channel
#[embassy_executor::task]
pub async fn uart_tx_task(mut tx: UartTx<'static, Async>) {
    info!("UART TX task started");

    loop {
        let chunk = UART_TX_CHUNK.wait().await;

        if let Err(e) = tx.write(&chunk).await {
            warn!("UART write of {} bytes failed: {:?}", chunk.len(), e);
        } else {
            trace!("UART sent {} bytes", chunk.len());
        }

        UART_DMA_READY.signal();
    }
}
