//! Demo producer
//!
//! Stands in for application code: queues a banner on the UART buffer and
//! an incrementing word on the SPI buffer, leaving the scheduler to move
//! both out.

use defmt::*;
use embassy_time::Timer;

use crate::buffers::Buffers;

const BANNER: &[u8] = b"cadence: scheduler running\r\n";

/// Milliseconds between producer rounds
const PRODUCER_PERIOD_MS: u64 = 250;

#[embassy_executor::task]
pub async fn producer_task(buffers: Buffers) {
    info!("Producer task started");

    let mut word: u16 = 0;

    loop {
        buffers.uart_send(BANNER);
        buffers.spi_send(&[word]);
        word = word.wrapping_add(1);

        Timer::after_millis(PRODUCER_PERIOD_MS).await;
    }
}
