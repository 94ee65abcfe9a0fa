use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use cwregs_config::LayoutManifest;
use cwregs_core::simpleserial::parse_line;
use cwregs_core::{RegisterFrame, FRAME_TAG, REG_COUNT};
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "CW Registers frame decoder", long_about = None)]
struct Args {
    /// SimpleSerial capture log to decode ("-" for stdin)
    #[arg(short, long, default_value = "-")]
    input: PathBuf,

    /// Layout manifest (YAML) the frames must match
    #[arg(short, long)]
    layout: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Only print frames for this slot
    #[arg(long)]
    slot: Option<u8>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    let layout = match &args.layout {
        Some(path) => {
            info!("Loading layout manifest: {:?}", path);
            LayoutManifest::from_file(path)?
        }
        None => LayoutManifest::default(),
    };

    let reader: Box<dyn BufRead> = if args.input.as_os_str() == "-" {
        Box::new(BufReader::new(io::stdin()))
    } else {
        let f = std::fs::File::open(&args.input)
            .with_context(|| format!("Failed to open capture log {:?}", args.input))?;
        Box::new(BufReader::new(f))
    };

    let stdout = io::stdout();
    let decoded = decode_stream(reader, stdout.lock(), &layout, args.format, args.slot)?;
    info!("Decoded {} register frames", decoded);

    Ok(())
}

/// Decode every register frame in a SimpleSerial log, writing the selected
/// ones to `out`. Returns the number of frames decoded.
fn decode_stream<R: BufRead, W: Write>(
    reader: R,
    mut out: W,
    layout: &LayoutManifest,
    format: Format,
    slot_filter: Option<u8>,
) -> Result<usize> {
    let mut decoded = 0;

    for (i, line) in reader.lines().enumerate() {
        let lineno = i + 1;
        let line = line.with_context(|| format!("Failed to read line {}", lineno))?;
        if line.trim().is_empty() {
            continue;
        }

        let packet = parse_line(&line).with_context(|| format!("Line {}", lineno))?;
        if packet.tag != FRAME_TAG {
            debug!("Skipping '{}' packet on line {}", packet.tag as char, lineno);
            continue;
        }

        let frame = RegisterFrame::<REG_COUNT>::decode(&packet.data)
            .with_context(|| format!("Line {}", lineno))?;
        if !layout.slot_in_range(frame.slot()) {
            anyhow::bail!(
                "Line {}: slot {} out of range, layout has {} slots",
                lineno,
                frame.slot(),
                layout.num_buffers
            );
        }
        decoded += 1;

        if slot_filter.is_some_and(|s| s != frame.slot()) {
            continue;
        }

        match format {
            Format::Text => write!(out, "{}", frame)?,
            Format::Json => writeln!(out, "{}", frame_json(&frame))?,
        }
    }

    out.flush()?;
    Ok(decoded)
}

fn frame_json(frame: &RegisterFrame) -> serde_json::Value {
    let registers: Vec<serde_json::Value> = frame
        .iter()
        .map(|(reg, value)| {
            serde_json::json!({
                "name": reg.name(),
                "value": value,
                "hex": format!("{:#010x}", value),
            })
        })
        .collect();
    serde_json::json!({
        "slot": frame.slot(),
        "registers": registers,
    })
}
