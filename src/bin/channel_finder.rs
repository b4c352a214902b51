//! Channel Finder Command Line Interface
//!
//! Query a hierarchy definition from the shell: list options per level,
//! build and validate addresses, print statistics or a tree preview.
//!
//! # Usage
//!
//! ```bash
//! # Subdevices of a device
//! channel-finder list subdevice -s system=CTRL -s subsystem=MAIN -s device=MC-01
//!
//! # Addresses for a signal that skips the optional subdevice level
//! channel-finder build -s system=CTRL -s subsystem=MAIN -s device=MC-01 -s signal=Mode
//!
//! # Every BPM X reading in sectors 1 and 3
//! channel-finder --db data/bpm.json build -s system=SR -s sector='*' -s device='*' -s signal=X --sectors 1,3
//!
//! # Preview with no limits
//! channel-finder preview --full --sections all
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use channel_finder::config::CONFIG_ENV_VAR;
use channel_finder::preview::parse_sections;
use channel_finder::{ChannelFinder, ChannelFinderConfig, PreviewOptions, Selections};

#[derive(Parser)]
#[command(name = "channel-finder")]
#[command(version = "0.1.0")]
#[command(about = "Navigate a hierarchical channel database and build signal addresses")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (YAML)
    #[arg(long, short, global = true, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    /// Definition file; overrides `database.path` from the config
    #[arg(long, global = true, env = "CHANNEL_FINDER_DB")]
    db: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'o', global = true, default_value = "text", value_enum)]
    format: OutputFormat,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the hierarchy levels
    Levels,

    /// Valid values at a level
    List {
        level: String,
        /// level=value, repeatable
        #[arg(short, long = "select", value_parser = parse_selection)]
        select: Vec<(String, String)>,
    },

    /// Children at a level with their kind (group / terminal)
    Inspect {
        level: String,
        #[arg(short, long = "select", value_parser = parse_selection)]
        select: Vec<(String, String)>,
    },

    /// Build addresses from a selection
    Build {
        #[arg(short, long = "select", value_parser = parse_selection)]
        select: Vec<(String, String)>,
        /// Sector numbers to keep
        #[arg(long, value_delimiter = ',')]
        sectors: Option<Vec<u32>>,
        /// Device numbers to keep
        #[arg(long, value_delimiter = ',')]
        devices: Option<Vec<u32>>,
        /// Build each sibling signal independently under the selection
        #[arg(long, value_delimiter = ',', conflicts_with_all = ["sectors", "devices"])]
        siblings: Option<Vec<String>>,
    },

    /// Check whether an address exists
    Validate { address: String },

    /// Show the record for an address
    Get { address: String },

    /// Channel counts
    Stats,

    /// Text preview of the hierarchy
    Preview {
        /// Tree depth (-1 = unlimited)
        #[arg(long, allow_negative_numbers = true)]
        depth: Option<i32>,
        /// Items per branch (-1 = unlimited)
        #[arg(long, allow_negative_numbers = true)]
        max_items: Option<i32>,
        /// Root the preview at this path (e.g. CTRL:MAIN)
        #[arg(long)]
        focus: Option<String>,
        /// tree, stats, breakdown, samples or all (comma separated)
        #[arg(long, default_value = "tree")]
        sections: String,
        /// Same as --depth -1 --max-items -1
        #[arg(long)]
        full: bool,
    },
}

fn parse_selection(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(level, value)| (level.trim().to_string(), value.trim().to_string()))
        .ok_or_else(|| format!("expected level=value, got '{}'", s))
}

// =============================================================================
// MAIN
// =============================================================================

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "channel_finder=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn load(cli: &Cli) -> Result<(ChannelFinder, ChannelFinderConfig)> {
    let config = match &cli.config {
        Some(path) => ChannelFinderConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None if cli.db.is_some() => ChannelFinderConfig::default(),
        None => ChannelFinderConfig::from_env().context("loading default config")?,
    };

    let finder = match &cli.db {
        Some(path) => ChannelFinder::from_path(path)
            .with_context(|| format!("loading definition {}", path.display()))?
            .with_filter_levels(config.filters.clone()),
        None => ChannelFinder::from_config(&config).context("loading definition from config")?,
    };
    Ok((finder, config))
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let (finder, config) = load(cli)?;

    match &cli.command {
        Commands::Levels => {
            let levels = finder.levels();
            emit(cli.format, &levels, || {
                levels
                    .iter()
                    .map(|l| {
                        if l.optional {
                            format!("{} (optional)", l.name)
                        } else {
                            l.name.clone()
                        }
                    })
                    .collect()
            })?;
        }

        Commands::List { level, select } => {
            let options = finder.list_children(level, &selections(select))?;
            emit(cli.format, &options, || {
                options
                    .iter()
                    .map(|o| match &o.description {
                        Some(d) => format!("{}\t{}", o.name, d),
                        None => o.name.clone(),
                    })
                    .collect()
            })?;
        }

        Commands::Inspect { level, select } => {
            let children = finder.inspect(level, &selections(select))?;
            emit(cli.format, &children, || {
                children
                    .iter()
                    .map(|c| format!("{}\t{}", c.name, c.kind))
                    .collect()
            })?;
        }

        Commands::Build {
            select,
            sectors,
            devices,
            siblings,
        } => {
            let sel = selections(select);
            match siblings {
                Some(names) => {
                    let names: Vec<&str> = names.iter().map(String::as_str).collect();
                    let results: Vec<SiblingOutput> = finder
                        .build_siblings(&sel, &names)
                        .into_iter()
                        .map(|(name, result)| match result {
                            Ok(addresses) => SiblingOutput {
                                name,
                                addresses,
                                error: None,
                            },
                            Err(e) => SiblingOutput {
                                name,
                                addresses: Vec::new(),
                                error: Some(e.to_string()),
                            },
                        })
                        .collect();
                    emit(cli.format, &results, || {
                        results
                            .iter()
                            .flat_map(|r| match &r.error {
                                Some(e) => vec![format!("{}: {}", r.name, e)],
                                None => r.addresses.clone(),
                            })
                            .collect()
                    })?;
                }
                None => {
                    let addresses =
                        finder.build_addresses(&sel, sectors.as_deref(), devices.as_deref())?;
                    emit(cli.format, &addresses, || addresses.clone())?;
                }
            }
        }

        Commands::Validate { address } => {
            let valid = finder.validate(address);
            emit(cli.format, &valid, || vec![valid.to_string()])?;
            if !valid {
                return Ok(ExitCode::FAILURE);
            }
        }

        Commands::Get { address } => match finder.get(address) {
            Some(record) => {
                emit(cli.format, record, || {
                    let mut lines = vec![record.address.clone()];
                    lines.extend(
                        record
                            .level_path
                            .iter()
                            .map(|lv| format!("  {}\t{}", lv.level, lv.value)),
                    );
                    if let Some(d) = &record.description {
                        lines.push(format!("  description\t{}", d));
                    }
                    lines
                })?;
            }
            None => {
                eprintln!("unknown address '{}'", address);
                return Ok(ExitCode::FAILURE);
            }
        },

        Commands::Stats => {
            let stats = finder.statistics();
            emit(cli.format, stats, || {
                let mut lines = vec![format!("total_channels\t{}", stats.total_channels)];
                lines.extend(
                    stats
                        .counts_per_level
                        .iter()
                        .map(|c| format!("{}\t{}", c.level, c.count)),
                );
                lines
            })?;
        }

        Commands::Preview {
            depth,
            max_items,
            focus,
            sections,
            full,
        } => {
            let mut options = PreviewOptions::from_config(&config.preview);
            if let Some(depth) = depth {
                options.depth = *depth;
            }
            if let Some(max_items) = max_items {
                options.max_items = *max_items;
            }
            options.focus = focus.clone();
            options.sections = parse_sections(sections).map_err(anyhow::Error::msg)?;
            if *full {
                options = options.full();
            }
            println!("{}", finder.preview(&options));
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[derive(Serialize)]
struct SiblingOutput {
    name: String,
    addresses: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn selections(pairs: &[(String, String)]) -> Selections {
    pairs.iter().cloned().collect()
}

/// JSON for `--format json`, one line per item otherwise
fn emit<T: Serialize + ?Sized>(
    format: OutputFormat,
    value: &T,
    text: impl FnOnce() -> Vec<String>,
) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => {
            for line in text() {
                println!("{}", line);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_siblings_reject_number_filters() {
        let err = Cli::try_parse_from([
            "channel-finder",
            "build",
            "-s",
            "signal=X",
            "--siblings",
            "X,Y",
            "--sectors",
            "1,3",
        ])
        .err()
        .unwrap();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_siblings_alone_parse() {
        let cli = Cli::try_parse_from(["channel-finder", "build", "--siblings", "X,Y"]).unwrap();
        match cli.command {
            Commands::Build {
                siblings, sectors, ..
            } => {
                assert_eq!(siblings, Some(vec!["X".to_string(), "Y".to_string()]));
                assert_eq!(sectors, None);
            }
            _ => panic!("expected build"),
        }
    }
}
