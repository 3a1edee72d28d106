// Copyright (C) 2025 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::{error::Error, fs::File, io::BufReader, path::PathBuf};

use clap::{crate_version, Parser, Subcommand};
use pinrec::{
    buffer::samples_duration,
    config::{self, recorder::Recorder},
    record,
    storage::{DirStorage, Storage},
    util::duration_millis,
};

const DEFAULT_INSPECT_CAPACITY: usize = 15_000;
const DEFAULT_INSPECT_RATE: u32 = 300_000;

const SYSTEMD_SERVICE: &str = r#"
[Unit]
Description=binary signal recorder

[Service]
Type=simple
Restart=on-failure
EnvironmentFile=-/etc/default/pinrec
ExecStart=/usr/local/bin/pinrec start "$PINREC_CONFIG"

[Install]
WantedBy=multi-user.target
Alias=pinrec.service
"#;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A fixed-rate binary signal recorder."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start will start the recorder and read commands from the keyboard.
    Start {
        /// The path to the recorder config.
        config_path: String,
    },
    /// Lists the records in the configured storage directory.
    List {
        /// The path to the recorder config.
        config_path: String,
    },
    /// Decodes a record file and reports what a load would see.
    Inspect {
        /// The record file.
        file: String,
        /// The buffer capacity to decode against.
        #[arg(long)]
        capacity: Option<usize>,
        /// The sample rate used to report durations.
        #[arg(long)]
        sample_rate: Option<u32>,
    },
    /// Prints the systemd service definition to stdout.
    Systemd {},
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Start { config_path } => {
            config::init_recorder_and_controller(&PathBuf::from(config_path))?
                .join()
                .await?;
        }
        Commands::List { config_path } => {
            let config = Recorder::deserialize(&PathBuf::from(&config_path))?;
            let sample_rate = config.sample_rate()?;
            let storage = DirStorage::new(
                &config.storage().directory(),
                config.storage().prefix(),
                config.storage().suffix(),
            )?;
            let indices = storage.list();

            if indices.is_empty() {
                println!("No records found in {}.", config.storage().directory().display());
                return Ok(());
            }

            println!("Records (count: {}):", indices.len());
            for index in indices {
                match storage
                    .open_for_read(index)
                    .ok()
                    .and_then(|reader| record::read_count(reader).ok())
                {
                    Some(samples) => println!(
                        "- {}: {} samples ({})",
                        index,
                        samples,
                        duration_millis(samples_duration(samples as usize, sample_rate))
                    ),
                    None => println!("- {}: unreadable header", index),
                }
            }
        }
        Commands::Inspect {
            file,
            capacity,
            sample_rate,
        } => {
            let capacity = capacity.unwrap_or(DEFAULT_INSPECT_CAPACITY);
            let sample_rate = sample_rate.unwrap_or(DEFAULT_INSPECT_RATE);
            let decoded = record::read_record(BufReader::new(File::open(&file)?), capacity)?;
            let high = decoded.levels.iter().filter(|level| **level != 0).count();

            println!("{}:", file);
            println!("- samples: {}", decoded.sample_count);
            println!(
                "- duration: {}",
                duration_millis(samples_duration(decoded.levels.len(), sample_rate))
            );
            if !decoded.levels.is_empty() {
                println!(
                    "- high: {} ({:.1}%)",
                    high,
                    100.0 * high as f64 / decoded.levels.len() as f64
                );
            }
            for warning in decoded.warnings.iter() {
                println!("- warning: {}", warning);
            }
        }
        Commands::Systemd {} => {
            println!("{}", SYSTEMD_SERVICE)
        }
    }

    Ok(())
}
