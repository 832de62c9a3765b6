//! Build-time configuration
//!
//! Constants generated by `build.rs` from `cadence.toml`. Every value has
//! already been checked against the core limits when this module compiles.

use cadence_core::config::{validate_event_count, BufferConfig, EventConfig, TimingConfig};

include!(concat!(env!("OUT_DIR"), "/config.rs"));
