//! wavtool - inspect, build and resample WAV containers
//!
//! Usage:
//!   wavtool info <file.wav>
//!   wavtool wrap <raw.pcm> <out.wav> --rate 44100 --channels 2 --bits 16
//!   wavtool convert <in> <out.wav> --rate 44100 --mono

#[path = "../output.rs"]
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use songrec_core::{Converter, ConverterConfig};
use songrec_wav::{WavReader, WavWriter};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "wavtool")]
#[command(about = "Inspect, build and resample WAV containers", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the header fields and duration of a WAV file as JSON
    Info { file: PathBuf },

    /// Wrap raw little-endian PCM bytes in a WAV header
    Wrap {
        input: PathBuf,
        output: PathBuf,
        #[arg(long)]
        rate: u32,
        #[arg(long, default_value = "1")]
        channels: u16,
        #[arg(long, default_value = "16")]
        bits: u16,
    },

    /// Resample with the external converter
    Convert {
        input: PathBuf,
        output: PathBuf,
        /// Target sample rate (default from the converter settings)
        #[arg(long)]
        rate: Option<u32>,
        /// Downmix to mono 16-bit PCM; the output gets a "mono_" prefix
        #[arg(long)]
        mono: bool,
        /// Converter program
        #[arg(long)]
        program: Option<String>,
    },
}

#[derive(Serialize)]
struct InfoOutput {
    path: String,
    channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
    data_bytes: usize,
    /// Only known for 16-bit containers
    duration_s: Option<f64>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match args.command {
        Command::Info { file } => run_info(&file),
        Command::Wrap {
            input,
            output,
            rate,
            channels,
            bits,
        } => run_wrap(&input, &output, rate, channels, bits),
        Command::Convert {
            input,
            output,
            rate,
            mono,
            program,
        } => run_convert(&input, &output, rate, mono, program),
    }
}

fn run_info(path: &Path) -> Result<()> {
    let container = WavReader::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

    let duration_s = match container.duration() {
        Ok(duration) => Some(duration),
        Err(e) => {
            log::warn!("No duration for {}: {}", path.display(), e);
            None
        }
    };

    output::print_json(&InfoOutput {
        path: path.display().to_string(),
        channels: container.channels(),
        sample_rate: container.sample_rate(),
        bits_per_sample: container.bits_per_sample(),
        data_bytes: container.data().len(),
        duration_s,
    });
    Ok(())
}

fn run_wrap(input: &Path, output: &Path, rate: u32, channels: u16, bits: u16) -> Result<()> {
    let writer = WavWriter::new(rate, channels, bits).context("Invalid WAV parameters")?;
    let samples = std::fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;

    writer
        .write_file(output, &samples)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    log::info!("Wrote {} ({} payload bytes)", output.display(), samples.len());
    Ok(())
}

fn run_convert(input: &Path, output: &Path, rate: Option<u32>, mono: bool, program: Option<String>) -> Result<()> {
    let defaults = ConverterConfig::default();
    let converter = match program {
        Some(program) => Converter::new(program),
        None => Converter::from_config(&defaults),
    };

    let written = converter
        .convert(input, output, rate.unwrap_or(defaults.sample_rate), mono)
        .with_context(|| format!("Failed to convert {}", input.display()))?;

    println!("{}", written.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing() {
        let args = Args::parse_from(["wavtool", "info", "song.wav"]);
        assert!(matches!(args.command, Command::Info { ref file } if file == Path::new("song.wav")));
        assert!(!args.verbose);

        let args = Args::parse_from([
            "wavtool", "wrap", "raw.pcm", "out.wav", "--rate", "8000", "--channels", "2", "-v",
        ]);
        match args.command {
            Command::Wrap { rate, channels, bits, .. } => {
                assert_eq!(rate, 8000);
                assert_eq!(channels, 2);
                assert_eq!(bits, 16);
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert!(args.verbose);

        let args = Args::parse_from(["wavtool", "convert", "in.mp3", "out.wav", "--mono"]);
        match args.command {
            Command::Convert { rate, mono, program, .. } => {
                assert_eq!(rate, None);
                assert!(mono);
                assert_eq!(program, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_wrap_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("raw.pcm");
        let wav = dir.path().join("out.wav");
        std::fs::write(&raw, [0u8; 16000]).unwrap();

        run_wrap(&raw, &wav, 8000, 1, 16).unwrap();

        let container = WavReader::read(&wav).unwrap();
        assert_eq!(container.sample_rate(), 8000);
        assert_eq!(container.data().len(), 16000);
        assert_eq!(container.duration().unwrap(), 1.0);
    }

    #[test]
    fn test_wrap_rejects_misaligned_payload() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("raw.pcm");
        let wav = dir.path().join("out.wav");
        std::fs::write(&raw, [0u8; 3]).unwrap();

        assert!(run_wrap(&raw, &wav, 8000, 2, 16).is_err());
        assert!(!wav.exists());
    }
}
