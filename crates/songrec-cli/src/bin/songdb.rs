//! songdb - admin access to the song registry and fingerprint index
//!
//! Usage:
//!   songdb --config songrec.toml count
//!   songdb --config songrec.toml song externalRef dQw4w9WgXcQ
//!   songdb --config songrec.toml register "Title" "Artist" dQw4w9WgXcQ
//!   songdb --config songrec.toml couples 12345 67890
//!   songdb --config songrec.toml delete 42
//!   songdb --config songrec.toml drop-fingerprints --yes

#[path = "../output.rs"]
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use songrec_core::{
    open_store, FingerprintAddress, FingerprintIndex, SongFilter, SongId, SongRegistry, SongrecConfig,
};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "songdb")]
#[command(about = "Inspect and maintain the song database", long_about = None)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Number of registered songs
    Count,

    /// Look up a song by _id, externalRef or identityKey
    Song { field: String, value: String },

    /// Register a song and print its ID
    Register {
        title: String,
        artist: String,
        external_ref: String,
    },

    /// Delete a song by ID (no error if it does not exist)
    Delete { id: SongId },

    /// Print the couples stored at the given addresses
    Couples {
        #[arg(required = true)]
        addresses: Vec<FingerprintAddress>,
    },

    /// Delete every fingerprint bucket
    DropFingerprints {
        /// Confirm the irreversible drop
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Serialize)]
struct CoupleOutput {
    anchor_time_ms: u32,
    song_id: SongId,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = SongrecConfig::load(&args.config).context("Failed to load configuration")?;
    let store = open_store(&config.storage)
        .await
        .context("Failed to open document store")?;

    match args.command {
        Command::Count => {
            let registry = SongRegistry::new(store);
            println!("{}", registry.count().await?);
        }
        Command::Song { field, value } => {
            let filter = SongFilter::parse(&field, &value)?;
            let registry = SongRegistry::new(store);
            match registry.get_song(&filter).await? {
                Some(song) => output::print_json(&song),
                None => anyhow::bail!("No song with {} = {}", filter.field(), value),
            }
        }
        Command::Register {
            title,
            artist,
            external_ref,
        } => {
            let registry = SongRegistry::new(store);
            let id = registry.register(&title, &artist, &external_ref).await?;
            println!("{}", id);
        }
        Command::Delete { id } => {
            SongRegistry::new(store).delete_by_id(id).await?;
            log::info!("Song {} deleted", id);
        }
        Command::Couples { addresses } => {
            let index = FingerprintIndex::new(store);
            let found = index.get_couples(&addresses).await?;
            let sorted: BTreeMap<_, Vec<CoupleOutput>> = found
                .into_iter()
                .map(|(address, couples)| {
                    let couples = couples
                        .into_iter()
                        .map(|c| CoupleOutput {
                            anchor_time_ms: c.anchor_time_ms,
                            song_id: c.song_id,
                        })
                        .collect();
                    (address, couples)
                })
                .collect();
            output::print_json(&sorted);
        }
        Command::DropFingerprints { yes } => {
            if !yes {
                anyhow::bail!("Refusing to drop all fingerprints without --yes");
            }
            FingerprintIndex::new(store).drop_all().await?;
        }
    }

    Ok(())
}
