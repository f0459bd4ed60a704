use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;

use plgrab::config::validate_poll_interval;
use plgrab::humanize::{HumanDuration, ParseError};

#[derive(Parser, Debug)]
#[command(name = "plgrab")]
#[command(about = "Submit playlist downloads and follow their progress", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to $PLGRAB_CONFIG or config/plgrab.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the videos of a playlist
    Extract(ExtractArgs),
    /// Download a playlist or a list of video URLs and track progress
    Download(DownloadArgs),
}

#[derive(clap::Args, Debug)]
pub struct ExtractArgs {
    /// YouTube playlist URL
    pub url: String,
}

#[derive(clap::Args, Debug)]
#[command(group(ArgGroup::new("source").required(true).args(["playlist", "urls"])))]
pub struct DownloadArgs {
    /// Extract videos from this playlist and download all of them
    #[arg(long)]
    pub playlist: Option<String>,

    /// Video URLs to download
    pub urls: Vec<String>,

    /// Destination directory on the download server
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Progress poll interval (e.g. "500ms", "2s"); overrides poll.interval
    #[arg(long, value_parser = parse_interval)]
    pub interval: Option<HumanDuration>,
}

/// Same bounds as `poll.interval` in the config file
fn parse_interval(raw: &str) -> Result<HumanDuration, String> {
    let interval: HumanDuration = raw.parse().map_err(|e: ParseError| e.to_string())?;
    validate_poll_interval(interval.as_duration()).map_err(|e| e.to_string())?;
    Ok(interval)
}
