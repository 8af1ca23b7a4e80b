//! Tests requiring a real serial GPS receiver.
//!
//! These tests are skipped if no hardware is available.
//!
//! # Running Hardware Tests
//!
//! ```bash
//! export TEST_PORT=/dev/ttyUSB0   # NMEA receiver at 4800 baud
//! cargo test --test hardware_gps -- --ignored
//! ```

use std::env;
use ttyport::port::{BaudRate, PortOptions, SerialPort};

/// Skip test if hardware is not available.
fn skip_without_hardware() -> Option<String> {
    let port = env::var("TEST_PORT").ok();
    if port.is_none() {
        println!("Skipping hardware test: TEST_PORT not set");
    }
    port
}

#[test]
#[ignore] // Run with --ignored flag
fn test_gps_sentences_at_4800() {
    let Some(device) = skip_without_hardware() else { return };
    let mut gps = SerialPort::open(PortOptions::new(&device).baud(4800)).unwrap();

    for _ in 0..4 {
        let n = gps.read().unwrap();
        let sentence = gps.data().unwrap();
        println!("Sentence ({n} bytes): {}", sentence.trim_end());
        assert!(n > 0);
    }
}

#[test]
#[ignore]
fn test_gps_baud_cycle_restores_device() {
    let Some(device) = skip_without_hardware() else { return };
    let mut gps = SerialPort::open(PortOptions::new(&device)).unwrap();
    let original = gps.saved_config().input_speed();

    gps.set_baud(9600).unwrap();
    gps.apply_config().unwrap();
    assert_eq!(gps.device_baud().unwrap(), 9600);

    gps.set_baud(BaudRate::B4800.as_u32()).unwrap();
    gps.apply_config().unwrap();
    assert_eq!(gps.device_baud().unwrap(), 4800);
    drop(gps);

    let reopened = SerialPort::open(PortOptions::new(&device)).unwrap();
    assert_eq!(reopened.saved_config().input_speed(), original);
}
