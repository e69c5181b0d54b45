use std::{
    env,
    fs::{create_dir_all, write},
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use log::info;
use mcal_core::{
    config::{default_busy_sources, default_labeled_sources, SourceConfig},
    feed_client,
    horizon::{Horizon, DEFAULT_HORIZON_DAYS},
    ical::generator::{Emitter, IcalCalendar},
    pipeline,
};

/// Merge several iCalendar feeds into one calendar file.
///
/// Feed locators are read from environment variables; each `--source` names
/// such a variable.
#[derive(Debug, Parser)]
#[command(version)]
pub struct Arguments {
    #[command(subcommand)]
    pub command: Command,
    /// how many days ahead events are exported
    #[arg(long, global = true, env = "MCAL_HORIZON_DAYS", default_value_t = DEFAULT_HORIZON_DAYS)]
    pub horizon_days: u32,
    /// where the merged calendar is written
    #[arg(long, global = true, env = "MCAL_OUTPUT", default_value = "docs/merged.ics")]
    pub output: PathBuf,
    /// timeout for fetching a single feed, in seconds
    #[arg(long, global = true, env = "MCAL_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Republish every event under its source's label. Unset sources are skipped.
    Labeled {
        /// a source as KEY=LABEL, KEY being the variable holding the feed locator
        #[arg(long = "source", value_name = "KEY=LABEL")]
        sources: Vec<SourceConfig>,
    },
    /// Merge all events into anonymous busy blocks. Every source must be set.
    Busy {
        /// the variable holding a feed locator
        #[arg(long = "source", value_name = "KEY")]
        sources: Vec<SourceConfig>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Arguments::parse();
    let horizon = Horizon::new(Utc::now(), args.horizon_days);
    let client = feed_client::client(Some(Duration::from_secs(args.timeout_secs)))?;
    let lookup = |key: &str| env::var(key).ok();
    let calendar = match args.command {
        Command::Labeled { sources } => {
            let sources = or_default(sources, default_labeled_sources);
            pipeline::run_labeled(&client, &sources, lookup, &horizon).await?
        }
        Command::Busy { sources } => {
            let sources = or_default(sources, default_busy_sources);
            pipeline::run_busy(&client, &sources, lookup, &horizon).await?
        }
    };
    write_calendar(&args.output, &calendar)?;
    Ok(())
}

fn or_default(
    sources: Vec<SourceConfig>,
    default: fn() -> Vec<SourceConfig>,
) -> Vec<SourceConfig> {
    if sources.is_empty() {
        default()
    } else {
        sources
    }
}

fn write_calendar(path: &Path, calendar: &IcalCalendar) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        create_dir_all(parent)
            .with_context(|| format!("could not create {}", parent.display()))?;
    }
    write(path, calendar.generate())
        .with_context(|| format!("could not write {}", path.display()))?;
    info!(
        "wrote {} events to {}",
        calendar.events.len(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};
    use mcal_core::config::SourceConfig;

    use super::{Arguments, Command};

    #[test]
    fn test_arguments_are_consistent() {
        Arguments::command().debug_assert();
    }

    #[test]
    fn test_parse_labeled_sources() {
        let args = Arguments::try_parse_from([
            "mcal",
            "labeled",
            "--source",
            "ICS_URL_A=Alice busy",
            "--source",
            "ICS_URL_B=Bob busy",
            "--horizon-days",
            "30",
        ])
        .unwrap();
        assert_eq!(args.horizon_days, 30);
        let Command::Labeled { sources } = args.command else {
            panic!("expected the labeled command");
        };
        assert_eq!(
            sources,
            vec![
                SourceConfig::new("ICS_URL_A", Some("Alice busy")),
                SourceConfig::new("ICS_URL_B", Some("Bob busy")),
            ]
        );
    }

    #[test]
    fn test_invalid_source_is_rejected() {
        assert!(Arguments::try_parse_from(["mcal", "busy", "--source", "=x"]).is_err());
    }
}
