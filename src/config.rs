#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

pub const DEFAULT_ENV_PATH: &str = ".env";
pub const DEFAULT_ARCHIVE_FILE: &str = "archive.txt";
pub const DEFAULT_SLEEP_SECS: u64 = 0;

const ARCHIVE_FILE_KEY: &str = "INFO2KODI_ARCHIVE_FILE";
const SLEEP_KEY: &str = "INFO2KODI_SLEEP";
const KEY_PREFIX: &str = "INFO2KODI_";

/// Settings that may come from the command line, the process environment or
/// a `.env` file, in that order of precedence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeSettings {
    pub archive_file: PathBuf,
    pub sleep: Duration,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            archive_file: PathBuf::from(DEFAULT_ARCHIVE_FILE),
            sleep: Duration::from_secs(DEFAULT_SLEEP_SECS),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RuntimeOverrides {
    pub archive_file: Option<PathBuf>,
    pub sleep_secs: Option<u64>,
    pub env_path: Option<PathBuf>,
}

pub fn resolve_runtime_settings(overrides: RuntimeOverrides) -> Result<RuntimeSettings> {
    let env_path = overrides
        .env_path
        .as_deref()
        .unwrap_or_else(|| Path::new(DEFAULT_ENV_PATH));
    let file_vars = read_env_file(env_path)?;
    Ok(build_settings_with_overrides(
        &file_vars,
        env_var_string,
        overrides,
    ))
}

fn build_settings_with_overrides(
    file_vars: &HashMap<String, String>,
    env_lookup: impl Fn(&str) -> Option<String>,
    overrides: RuntimeOverrides,
) -> RuntimeSettings {
    let archive_file = overrides
        .archive_file
        .filter(|path| !path.as_os_str().is_empty())
        .or_else(|| lookup_value(ARCHIVE_FILE_KEY, file_vars, &env_lookup).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ARCHIVE_FILE));
    let sleep_secs = overrides
        .sleep_secs
        .or_else(|| {
            lookup_value(SLEEP_KEY, file_vars, &env_lookup)
                .and_then(|value| value.parse::<u64>().ok())
        })
        .unwrap_or(DEFAULT_SLEEP_SECS);
    RuntimeSettings {
        archive_file,
        sleep: Duration::from_secs(sleep_secs),
    }
}

fn env_var_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn lookup_value(
    key: &str,
    file_vars: &HashMap<String, String>,
    env_lookup: &impl Fn(&str) -> Option<String>,
) -> Option<String> {
    env_lookup(key)
        .or_else(|| file_vars.get(key).cloned())
        .filter(|value| !value.trim().is_empty())
}

/// Reads the `INFO2KODI_*` assignments from a dotenv-style file.
///
/// A missing file is an empty settings file. Other keys are skipped so the
/// same `.env` can be shared with yt-dlp wrapper scripts.
pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(content
        .lines()
        .filter_map(parse_assignment)
        .filter(|(key, _)| key.starts_with(KEY_PREFIX))
        .map(|(key, value)| (key.to_owned(), value.to_owned()))
        .collect())
}

/// `[export ]KEY=VALUE` with optional single or double quotes around VALUE.
fn parse_assignment(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.starts_with('#') {
        return None;
    }
    let line = line.strip_prefix("export ").unwrap_or(line);
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, unquote(value.trim())))
}

fn unquote(value: &str) -> &str {
    ['"', '\'']
        .into_iter()
        .find_map(|quote| value.strip_prefix(quote)?.strip_suffix(quote))
        .unwrap_or(value)
}

/// Everything one conversion run needs to know besides the input path.
///
/// The booleans map one-to-one onto the command-line flags; `settings` holds
/// the layered values resolved by [`resolve_runtime_settings`].
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    pub fetch_thumbnail: bool,
    pub force_refetch_thumbnail: bool,
    pub suppress_thumbnail: bool,
    pub force_media_info: bool,
    pub force_stream: bool,
    pub force_player_command: bool,
    pub update_archive: bool,
    pub settings: RuntimeSettings,
}
