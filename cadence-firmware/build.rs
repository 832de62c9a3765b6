//! Build script for cadence-firmware
//!
//! - Passes the cortex-m-rt and defmt linker scripts
//! - Validates cadence.toml at compile time
//! - Generates `config.rs` in OUT_DIR with the configuration constants

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Buffers the firmware wires up, with their element width
const BUFFERS: &[(&str, &str)] = &[
    ("uart_tx", "bytes"),
    ("spi_tx", "words"),
    ("heartbeat", "bytes"),
];

/// Events the firmware registers
const EVENTS: &[&str] = &["uart_tx", "spi_tx", "heartbeat"];

fn main() {
    setup_linker();

    let config = load_config();
    validate_config(&config);
    generate_config(&config);
}

/// Link arguments for the binary
fn setup_linker() {
    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Read and parse cadence.toml
fn load_config() -> toml::Value {
    println!("cargo:rerun-if-changed=cadence.toml");

    let config_path = Path::new("cadence.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: cadence.toml not found!                                  ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a cadence.toml configuration file.        ║\n\
            ║  Please create one in the cadence-firmware directory.            ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read cadence.toml                              ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in cadence.toml                      ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                {}\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    }
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Panic with every collected error in one box
fn report_errors(title: &str, errors: &[String]) {
    if errors.is_empty() {
        return;
    }

    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        errors
            .iter()
            .map(|e| format!("║  • {:<62} ║", e))
            .collect::<Vec<_>>()
            .join("\n")
    );
}

/// Validate structure and value types
///
/// Range checks that depend on core limits (capacities, table size,
/// interval against period) run in the generated code against
/// `cadence_core::config`.
fn validate_config(config: &toml::Value) {
    let mut errors = Vec::new();

    for section in ["timing", "uart", "spi", "buffer", "event"] {
        if config.get(section).is_none() {
            errors.push(format!("Missing [{}] section", section));
        }
    }
    report_errors("Missing required sections in cadence.toml", &errors);

    require_positive(config, "timing", "tick_hz", &mut errors);
    require_positive(config, "timing", "period_ticks", &mut errors);
    require_positive(config, "uart", "baudrate", &mut errors);
    require_positive(config, "spi", "frequency_hz", &mut errors);

    for (name, _) in BUFFERS {
        let section = format!("buffer.{}", name);
        match config.get("buffer").and_then(|b| b.get(name)) {
            Some(toml::Value::Table(table)) => match table.get("capacity") {
                Some(toml::Value::Integer(n)) if *n >= 0 => {}
                Some(_) => errors.push(format!("[{}] capacity must be a positive integer", section)),
                None => errors.push(format!("[{}] missing 'capacity'", section)),
            },
            Some(_) => errors.push(format!("[{}] must be a table", section)),
            None => errors.push(format!("Missing [{}] section", section)),
        }
    }

    for name in EVENTS {
        let section = format!("event.{}", name);
        match config.get("event").and_then(|e| e.get(name)) {
            Some(toml::Value::Table(table)) => {
                match table.get("interval_ticks") {
                    Some(toml::Value::Integer(n)) if *n >= 0 && *n <= u32::MAX as i64 => {}
                    Some(_) => errors.push(format!(
                        "[{}] interval_ticks must be an integer 0-{}",
                        section,
                        u32::MAX
                    )),
                    None => errors.push(format!("[{}] missing 'interval_ticks'", section)),
                }
                if let Some(enabled) = table.get("enabled") {
                    if !enabled.is_bool() {
                        errors.push(format!("[{}] enabled must be true or false", section));
                    }
                }
            }
            Some(_) => errors.push(format!("[{}] must be a table", section)),
            None => errors.push(format!("Missing [{}] section", section)),
        }
    }

    report_errors("Invalid values in cadence.toml", &errors);
    println!("cargo:warning=cadence.toml validated successfully");
}

fn require_positive(config: &toml::Value, section: &str, key: &str, errors: &mut Vec<String>) {
    match config.get(section).and_then(|s| s.get(key)) {
        Some(toml::Value::Integer(n)) if *n > 0 && *n <= u32::MAX as i64 => {}
        Some(_) => errors.push(format!("[{}] {} must be an integer 1-{}", section, key, u32::MAX)),
        None => errors.push(format!("[{}] missing '{}'", section, key)),
    }
}

/// Integer lookup; only called after validation passed
fn integer(config: &toml::Value, path: &[&str]) -> i64 {
    path.iter()
        .try_fold(config, |value, key| value.get(key))
        .and_then(toml::Value::as_integer)
        .unwrap_or_else(|| panic!("{} missing after validation", path.join(".")))
}

fn enabled(config: &toml::Value, event: &str) -> bool {
    config
        .get("event")
        .and_then(|e| e.get(event))
        .and_then(|e| e.get("enabled"))
        .and_then(toml::Value::as_bool)
        .unwrap_or(true)
}

/// Write the configuration constants to OUT_DIR/config.rs
fn generate_config(config: &toml::Value) {
    let mut out = String::new();
    out.push_str("// Generated by build.rs from cadence.toml. Do not edit.\n\n");

    out.push_str(&format!(
        "pub const TIMING: TimingConfig = TimingConfig {{ tick_hz: {}, period_ticks: {} }};\n",
        integer(config, &["timing", "tick_hz"]),
        integer(config, &["timing", "period_ticks"]),
    ));
    out.push_str(&format!(
        "pub const UART_BAUDRATE: u32 = {};\n",
        integer(config, &["uart", "baudrate"])
    ));
    out.push_str(&format!(
        "pub const SPI_FREQUENCY_HZ: u32 = {};\n\n",
        integer(config, &["spi", "frequency_hz"])
    ));

    for (name, width) in BUFFERS {
        let upper = name.to_uppercase();
        out.push_str(&format!(
            "pub const {upper}_BUFFER: BufferConfig = BufferConfig::{width}({});\n\
             pub const {upper}_CAPACITY: usize = {upper}_BUFFER.capacity;\n\
             const _: () = assert!({upper}_BUFFER.validate().is_ok(), \"[buffer.{name}] capacity out of range\");\n\n",
            integer(config, &["buffer", name, "capacity"]),
        ));
    }

    let mut enabled_count = 0;
    for name in EVENTS {
        let upper = name.to_uppercase();
        let on = enabled(config, name);
        if on {
            enabled_count += 1;
        }
        out.push_str(&format!(
            "pub const {upper}_EVENT: EventConfig = EventConfig {{ interval_ticks: {}, enabled: {on} }};\n\
             const _: () = assert!({upper}_EVENT.validate(&TIMING).is_ok(), \"[event.{name}] interval below scheduler period\");\n\n",
            integer(config, &["event", name, "interval_ticks"]),
        ));
    }

    out.push_str(&format!(
        "const _: () = assert!(TIMING.validate().is_ok(), \"[timing] values must be non-zero\");\n\
         const _: () = assert!(validate_event_count({enabled_count}).is_ok(), \"more enabled events than the event table holds\");\n"
    ));

    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR not set"));
    let dest = out_dir.join("config.rs");
    if let Err(e) = fs::write(&dest, out) {
        panic!("Failed to write {}: {}", dest.display(), e);
    }
}
