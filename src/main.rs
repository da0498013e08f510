use clap::{Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use ttyline::{ConfigLoader, LineMode, SerialLine, MODE_READ_TIMEOUT_DS};

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Configure and talk to a serial line.",
    long_about = "Opens a serial character device, applies line parameters (speed, framing, \
flow control, read timeout), and performs byte-level I/O and queue flushes over it."
)]
struct Args {
    /// Explicit config file path; otherwise standard resolution applies.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Serial device path, e.g. /dev/ttyUSB0.
    #[arg(short, long)]
    device: Option<String>,

    /// Line speed in baud, both directions.
    #[arg(short, long)]
    baud: Option<u32>,

    /// Mode descriptor: data bits, parity letter (N/E/O), stop bits.
    #[arg(short, long)]
    mode: Option<String>,

    /// Read timeout in deciseconds; 0 selects non-blocking reads.
    #[arg(long, value_name = "DS")]
    read_timeout_ds: Option<u8>,

    /// Enable XON/XOFF software flow control.
    #[arg(long)]
    flow_control: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the device's committed line attributes.
    Status {
        /// Emit JSON instead of plain text.
        #[arg(long)]
        json: bool,
    },
    /// Stream received bytes to stdout until a read times out empty.
    Read {
        /// Stop after this many bytes.
        #[arg(long, value_name = "N")]
        max_bytes: Option<usize>,
    },
    /// Send bytes down the line.
    Write {
        data: String,
        /// Block until the output queue has drained.
        #[arg(long)]
        drain: bool,
    },
    /// Discard queued data.
    Flush {
        #[arg(value_enum, default_value = "both")]
        queue: FlushQueue,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FlushQueue {
    Input,
    Output,
    Both,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let loader = match &args.config {
        Some(path) => ConfigLoader::load_from(path)?,
        None => ConfigLoader::load()?,
    };
    let config = loader.into_config();

    init_tracing(&config.logging.level);

    let device = args
        .device
        .or(config.device.path)
        .ok_or("no serial device given; use --device or set [device] path in ttyline.toml")?;
    let baud = args.baud.unwrap_or(config.line.baud);
    let mode = args.mode.unwrap_or(config.line.mode);
    let read_timeout_ds = args.read_timeout_ds.unwrap_or(config.line.read_timeout_ds);
    let flow_control = args.flow_control || config.line.flow_control;

    let mut line = SerialLine::open_with_mode(&device, baud, &mode)?;

    // apply_line_mode installs the default read timeout with flow control
    // off; honor overrides with a second commit.
    if read_timeout_ds != MODE_READ_TIMEOUT_DS || flow_control {
        if read_timeout_ds == 0 {
            line.attributes_mut().set_nonblocking_reads();
        } else {
            line.attributes_mut().set_read_timeout(read_timeout_ds);
        }
        line.attributes_mut().set_flow_control(flow_control);
        line.commit()?;
    }

    match args.command {
        Command::Status { json } => status(&mut line, &device, json)?,
        Command::Read { max_bytes } => read_stream(&mut line, max_bytes)?,
        Command::Write { data, drain } => {
            line.write_all(data.as_bytes())?;
            if drain {
                line.drain()?;
            }
        }
        Command::Flush { queue } => match queue {
            FlushQueue::Input => line.flush_input()?,
            FlushQueue::Output => line.flush_output()?,
            FlushQueue::Both => line.flush_both()?,
        },
    }

    Ok(())
}

/// RUST_LOG wins over the configured level. Diagnostics go to stderr so
/// `read` output on stdout stays byte-clean.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn status(
    line: &mut SerialLine,
    device: &str,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let attrs = line.fetch_attributes()?;
    let mode = LineMode {
        data_bits: attrs.data_bits(),
        parity: attrs.parity(),
        stop_bits: attrs.stop_bits(),
    };

    if json {
        let value = serde_json::json!({
            "device": device,
            "mode": mode.to_string(),
            "input_baud": attrs.input_speed(),
            "output_baud": attrs.output_speed(),
            "data_bits": attrs.data_bits(),
            "parity": attrs.parity().to_string(),
            "stop_bits": attrs.stop_bits(),
            "software_flow_control": attrs.software_flow_control(),
            "read_enabled": attrs.is_read_enabled(),
            "canonical": attrs.is_canonical(),
            "read_min": attrs.read_min(),
            "read_time_ds": attrs.read_time(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!(
            "{device}: {} baud {mode}, flow control {}, read min {} time {} ds",
            attrs.output_speed(),
            if attrs.software_flow_control() { "on" } else { "off" },
            attrs.read_min(),
            attrs.read_time(),
        );
    }
    Ok(())
}

fn read_stream(
    line: &mut SerialLine,
    max_bytes: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut buf = [0u8; 4096];
    let mut total = 0usize;

    loop {
        let chunk = match max_bytes {
            Some(max) => (max - total).min(buf.len()),
            None => buf.len(),
        };
        if chunk == 0 {
            break;
        }

        let n = line.read(&mut buf[..chunk])?;
        if n == 0 {
            // Timed out with nothing buffered; the line has gone quiet.
            break;
        }
        out.write_all(&buf[..n])?;
        total += n;
    }

    out.flush()?;
    Ok(())
}
