//! midi2notes - convert MIDI files into compact note tables.
//!
//! # Usage
//!
//! ```bash
//! midi2notes song.mid info                     # list tracks and sizes
//! midi2notes song.mid header -o song.h         # C header, one table per track
//! midi2notes song.mid --mode merged bin -d out # one merged .notes buffer
//! midi2notes song.mid -t 1,3 midi -o check.mid # audition the converted notes
//! ```
//!
//! Set `RUST_LOG=debug` for conversion details on stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use midi2notes::convert::{ChainPitch, ConversionResult, ConvertOptions, ExportMode};
use midi2notes::midi::note_to_name;
use midi2notes::output::{render_binaries, render_midi, render_text};
use midi2notes::Session;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Input .mid file, or a .json timeline
    input: PathBuf,

    /// JSON file with conversion options
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long, value_enum)]
    mode: Option<ModeArg>,

    /// Convert only these track indices (comma separated)
    #[arg(short, long, value_delimiter = ',')]
    tracks: Vec<usize>,

    /// Skip these track indices (comma separated)
    #[arg(short = 'x', long, value_delimiter = ',')]
    exclude: Vec<usize>,

    /// Base identifier for generated tables
    #[arg(short, long)]
    name: Option<String>,

    #[arg(long)]
    exponent_bits: Option<u8>,

    /// Pitch of delay-chain continuation records
    #[arg(long, value_enum)]
    chain_pitch: Option<ChainArg>,

    /// Omit the record count from binary buffers
    #[arg(long)]
    no_count: bool,

    /// Write the effective options to a JSON file
    #[arg(long)]
    save_config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print tracks, tempo changes and output sizes
    Info,
    /// Write a C header with one table per export unit
    Header {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write one .notes buffer per export unit
    Bin {
        #[arg(short = 'd', long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Rebuild a .mid file from the converted records
    Midi {
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    PerTrack,
    Merged,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ChainArg {
    Reuse,
    Rest,
}

impl Args {
    /// Options from the config file (or defaults) with CLI overrides applied.
    fn options(&self) -> Result<ConvertOptions> {
        let mut options = match &self.config {
            Some(path) => ConvertOptions::load_from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => ConvertOptions::default(),
        };

        if let Some(mode) = self.mode {
            options.mode = match mode {
                ModeArg::PerTrack => ExportMode::PerTrack,
                ModeArg::Merged => ExportMode::Merged,
            };
        }
        if let Some(chain) = self.chain_pitch {
            options.chain_pitch = match chain {
                ChainArg::Reuse => ChainPitch::Reuse,
                ChainArg::Rest => ChainPitch::Rest,
            };
        }
        if let Some(name) = &self.name {
            options.table_name = name.clone();
        }
        if let Some(bits) = self.exponent_bits {
            options.exponent_bits = bits;
        }
        if self.no_count {
            options.count_prefix = false;
        }

        options.validate()?;
        Ok(options)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let options = args.options()?;
    if let Some(path) = &args.save_config {
        options
            .save_to_file(path)
            .with_context(|| format!("Failed to save config {}", path.display()))?;
        eprintln!("Saved options to {}", path.display());
    }

    let mut session = Session::new(options);
    load_input(&mut session, &args.input)?;
    apply_selection(&mut session, &args)?;

    let result = session.convert().context("Conversion failed")?;

    match &args.command {
        Command::Info => print_info(&session, &result),
        Command::Header { output } => {
            let text = render_text(&result, &session.options);
            match output {
                Some(path) => fs::write(path, text)
                    .with_context(|| format!("Failed to write {}", path.display()))?,
                None => print!("{}", text),
            }
        }
        Command::Bin { out_dir } => {
            fs::create_dir_all(out_dir)?;
            for (ident, data) in render_binaries(&result, &session.options)? {
                let path = out_dir.join(format!("{}.notes", ident));
                fs::write(&path, data)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                eprintln!("Wrote {}", path.display());
            }
        }
        Command::Midi { output } => {
            let name = session
                .timeline()
                .map(|t| t.name.clone())
                .unwrap_or_default();
            let data = render_midi(&result, &name, &session.options);
            fs::write(output, data)
                .with_context(|| format!("Failed to write {}", output.display()))?;
        }
    }

    Ok(())
}

/// Loads a .mid file, or a JSON timeline when the extension is .json.
fn load_input(session: &mut Session, path: &Path) -> Result<()> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    if is_json {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        session
            .load_json(&json)
            .with_context(|| format!("Failed to load timeline {}", path.display()))?;
    } else {
        let data = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("midi");
        session
            .load_midi(&data, name)
            .with_context(|| format!("Failed to import {}", path.display()))?;
    }

    Ok(())
}

fn apply_selection(session: &mut Session, args: &Args) -> Result<()> {
    let count = session.timeline().map_or(0, |t| t.track_count());

    if !args.tracks.is_empty() {
        for index in 0..count {
            session.set_selected(index, false)?;
        }
        for &index in &args.tracks {
            session.set_selected(index, true)?;
        }
    }
    for &index in &args.exclude {
        session.set_selected(index, false)?;
    }

    Ok(())
}

fn print_info(session: &Session, result: &ConversionResult) {
    let Some(timeline) = session.timeline() else {
        return;
    };

    println!("{} ({} PPQ)", timeline.name, timeline.ppq);
    if timeline.tempos.is_empty() {
        println!("Tempo: none (120 BPM assumed)");
    }
    for tempo in &timeline.tempos {
        println!("Tempo: {:.2} BPM at tick {}", tempo.bpm, tempo.ticks);
    }

    println!();
    for (index, track) in timeline.tracks().iter().enumerate() {
        let range = match (
            track.notes().iter().map(|n| n.pitch).min(),
            track.notes().iter().map(|n| n.pitch).max(),
        ) {
            (Some(lo), Some(hi)) => format!("{}-{}", note_to_name(lo), note_to_name(hi)),
            _ => "-".to_string(),
        };
        println!(
            "[{}] {:>2}  ch {:>2}  {:>5} notes  {:<9}  {}",
            if session.selection().is_selected(index) { "x" } else { " " },
            index,
            track.channel + 1,
            track.note_count(),
            range,
            if track.name.is_empty() { "(unnamed)" } else { track.name.as_str() },
        );
    }

    println!();
    for unit in &result.units {
        println!(
            "{}: {} records, {:.1} s ({})",
            unit.ident,
            unit.stream.len(),
            unit.stream.total_delay_ms() as f64 / 1000.0,
            unit.label
        );
    }
    println!("Total: {} bytes", result.total_bytes());
}
