#![forbid(unsafe_code)]

//! Converts one yt-dlp `.info.json[.gz]` into Kodi sidecars.
//!
//! Meant to be run per download (e.g. from yt-dlp's `--exec`), so every run
//! handles exactly one document and exits. Already generated sidecars are left
//! alone unless a `--force-*` flag asks for them again.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use infojson_kodi::archive::ArchiveLog;
use infojson_kodi::config::{ConvertOptions, RuntimeOverrides, resolve_runtime_settings};
use infojson_kodi::convert::Converter;
use infojson_kodi::profiles::ProfileRegistry;
use infojson_kodi::thumbnail::HttpImageSource;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(version, about = "Generate Kodi .strm/.nfo/.dms.json files from a yt-dlp info document")]
struct Cli {
    /// Path to `NAME.info.json` or `NAME.info.json.gz`
    input: PathBuf,

    /// Download the thumbnail and reference the local file instead of the URL
    #[arg(long, alias = "fetchthumb")]
    fetch_thumbnail: bool,

    /// Download the thumbnail even if an image already exists
    #[arg(long, alias = "forcefetchthumb")]
    force_refetch_thumbnail: bool,

    /// Leave the thumbnail out of the .nfo entirely
    #[arg(long, alias = "suppressthumb")]
    suppress_thumbnail: bool,

    /// Regenerate the .nfo even if it exists
    #[arg(long, alias = "forcenfo")]
    force_media_info: bool,

    /// Regenerate the .strm even if it exists
    #[arg(long, alias = "forcestrm")]
    force_stream: bool,

    /// Regenerate the .dms.json even if it exists
    #[arg(long, alias = "forcedms")]
    force_player_command: bool,

    /// Seconds to wait before fetching the thumbnail
    #[arg(long, value_name = "SECS")]
    sleep: Option<u64>,

    /// Append-only log of processed ids
    #[arg(long, alias = "archive", value_name = "PATH")]
    archive_file: Option<PathBuf>,

    /// Record `source id` in the archive file after generating artifacts
    #[arg(long)]
    update_archive: bool,

    /// Settings file read before the process environment
    #[arg(long, value_name = "PATH")]
    env_file: Option<PathBuf>,
}

impl Cli {
    fn into_options(self) -> Result<(PathBuf, ConvertOptions)> {
        let settings = resolve_runtime_settings(RuntimeOverrides {
            archive_file: self.archive_file,
            sleep_secs: self.sleep,
            env_path: self.env_file,
        })?;
        let options = ConvertOptions {
            fetch_thumbnail: self.fetch_thumbnail,
            force_refetch_thumbnail: self.force_refetch_thumbnail,
            suppress_thumbnail: self.suppress_thumbnail,
            force_media_info: self.force_media_info,
            force_stream: self.force_stream,
            force_player_command: self.force_player_command,
            update_archive: self.update_archive,
            settings,
        };
        Ok((self.input, options))
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let (input, options) = cli.into_options()?;
    info!(
        path = %input.display(),
        fetch_thumbnail = options.fetch_thumbnail,
        suppress_thumbnail = options.suppress_thumbnail,
        force_media_info = options.force_media_info,
        force_stream = options.force_stream,
        force_player_command = options.force_player_command,
        "converting"
    );

    let registry = ProfileRegistry::with_builtin();
    let images = HttpImageSource::new();
    let archive = ArchiveLog::new(options.settings.archive_file.clone());
    let mut converter = Converter::new(&options, &registry, &images);
    if options.update_archive {
        converter = converter.with_archive(&archive);
    }

    let report = converter.convert(&input)?;
    if !report.failed.is_empty() {
        let failed: Vec<&str> = report.failed.iter().map(|kind| kind.label()).collect();
        warn!(failed = ?failed, "finished with write errors");
    }
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
