use clap::{Parser, Subcommand};
use serde::Serialize;
use serialport::{available_ports, SerialPortType};
use std::path::PathBuf;
use ttyport::config::{Config, ConfigLoader, ConfigResult};
use ttyport::port::{BaudRate, LineSnapshot, SerialPort};
use ttyport::{logging, SerialResult};

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    name = "ttyport",
    version,
    about = "Open, configure and read a serial TTY.",
    long_about = "Opens a serial device, applies 8N1 line settings at the requested baud rate, reads raw lines from it and restores the original device settings on exit."
)]
struct Args {
    /// Configuration file (defaults to the standard resolution order).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Device node or alias, e.g. /dev/ttyUSB0.
    #[arg(short, long, global = true)]
    device: Option<String>,

    /// Baud rate. Unsupported rates fall back to 4800.
    #[arg(short, long, global = true)]
    baud: Option<u32>,

    /// Use raw (non-canonical) input instead of line-buffered input.
    #[arg(long, global = true)]
    raw: bool,

    /// Log level: trace, debug, info, warn, error.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the line configuration, cycle the baud rate and read a few lines.
    Probe {
        /// Number of reads after the baud cycle.
        #[arg(long, default_value_t = 4)]
        reads: usize,
    },
    /// Read from the device and print what arrives.
    Read {
        /// Number of reads.
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
        /// Bytes requested per read, 1 to 255.
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..))]
        size: Option<u8>,
    },
    /// Show the cached, live and saved line configuration.
    Show {
        /// Emit JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// List serial devices found on this system.
    Ports,
}

#[derive(Serialize)]
struct ShowReport {
    device: String,
    configured_baud: BaudRate,
    device_baud: u32,
    cached: LineSnapshot,
    saved: LineSnapshot,
}

fn main() {
    if let Err(err) = try_main() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(&args)?;
    logging::init(&config.logging)?;

    match args.command {
        Command::Probe { reads } => probe(&config, reads)?,
        Command::Read { count, size } => {
            let mut port = SerialPort::open(config.serial.port_options())?;
            let size = size.map(usize::from).unwrap_or(config.serial.read_size);
            read_lines(&mut port, count, size)?;
        }
        Command::Show { json } => show(&config, json)?,
        Command::Ports => list_ports()?,
    }
    Ok(())
}

/// Resolve the effective config: file (or defaults when the file is
/// missing or unreadable), then environment, then command line. The result
/// is validated; a bad value anywhere is fatal.
fn load_config(args: &Args) -> ConfigResult<Config> {
    let loaded = match &args.config {
        Some(path) => ConfigLoader::load_from(path),
        None => ConfigLoader::load(),
    };
    let mut config = match loaded {
        Ok(loader) => loader.into_config(),
        Err(e) if e.is_file_problem() => {
            eprintln!("Warning: {e}, using defaults");
            ConfigLoader::from_env()?.into_config()
        }
        Err(e) => return Err(e),
    };

    if let Some(device) = &args.device {
        config.serial.device = device.clone();
    }
    if let Some(baud) = args.baud {
        config.serial.baud = baud;
    }
    if args.raw {
        config.serial.canonical = false;
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    config.validate()?;
    Ok(config)
}

fn status(result: SerialResult<()>) -> String {
    match result {
        Ok(()) => "ok".to_string(),
        Err(e) => format!("failed ({e})"),
    }
}

fn probe(config: &Config, reads: usize) -> SerialResult<()> {
    let mut port = SerialPort::open(config.serial.port_options())?;
    let initial = port.configured_baud();

    println!("{}", port.cached_config().snapshot());
    println!("Baud 1: {}", port.device_baud()?);
    println!("Applying change: {}", status(port.apply_config()));

    let probe_rate = if initial == BaudRate::B9600 {
        BaudRate::B4800
    } else {
        BaudRate::B9600
    };
    println!(
        "Setting baud to {}: {}",
        probe_rate,
        status(port.set_baud(probe_rate.as_u32()))
    );
    println!("Applying change: {}", status(port.apply_config()));
    println!("Baud 2: {}", port.device_baud()?);

    println!(
        "Restoring baud to {}: {}",
        initial,
        status(port.set_baud(initial.as_u32()))
    );
    println!("Applying change: {}", status(port.apply_config()));
    println!("Baud 3: {}", port.device_baud()?);

    read_lines(&mut port, reads, config.serial.read_size)?;
    port.close()
}

fn read_lines(port: &mut SerialPort, count: usize, size: usize) -> SerialResult<()> {
    for _ in 0..count {
        let n = port.read_up_to(size)?;
        let data = port.data()?;
        println!(
            "Sentence ({n} bytes): {}",
            data.trim_end_matches(&['\r', '\n'][..])
        );
    }
    Ok(())
}

fn show(config: &Config, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let port = SerialPort::open(config.serial.port_options())?;
    let report = ShowReport {
        device: port.device_path().display().to_string(),
        configured_baud: port.configured_baud(),
        device_baud: port.device_baud()?,
        cached: port.cached_config().snapshot(),
        saved: port.saved_config().snapshot(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Device: {}", report.device);
        println!("Configured baud: {}", report.configured_baud);
        println!("Device baud: {}", report.device_baud);
        println!("-- cached --\n{}", report.cached);
        println!("-- saved at open --\n{}", report.saved);
    }
    Ok(())
}

fn list_ports() -> Result<(), serialport::Error> {
    let ports = available_ports()?;
    if ports.is_empty() {
        println!("No serial ports detected on this system");
        return Ok(());
    }

    for port in ports {
        let kind = match &port.port_type {
            SerialPortType::UsbPort(usb) => format!(
                "USB {:04x}:{:04x} {}",
                usb.vid,
                usb.pid,
                usb.product.as_deref().unwrap_or("")
            ),
            SerialPortType::PciPort => "PCI".to_string(),
            SerialPortType::BluetoothPort => "Bluetooth".to_string(),
            SerialPortType::Unknown => "unknown".to_string(),
        };
        println!("{}\t{}", port.port_name, kind.trim_end());
    }
    Ok(())
}
