//! Embassy async tasks
//!
//! The scheduler task is the only caller of `Scheduler::run`. The transmit
//! tasks own the peripherals and wait on the chunks the events hand them.

pub mod heartbeat;
pub mod producer;
pub mod spi_tx;
pub mod tick;
pub mod uart_tx;

pub use heartbeat::heartbeat_task;
pub use producer::producer_task;
pub use spi_tx::spi_tx_task;
pub use tick::scheduler_task;
pub use uart_tx::uart_tx_task;
