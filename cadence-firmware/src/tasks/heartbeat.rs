//! Heartbeat LED

use defmt::*;
use embassy_stm32::gpio::Output;

use crate::channels::HEARTBEAT;

#[embassy_executor::task]
pub async fn heartbeat_task(mut led: Output<'static>) {
    info!("Heartbeat task started");

    loop {
        HEARTBEAT.wait().await;
        led.toggle();
    }
}
