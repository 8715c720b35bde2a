//! Downloads a video's thumbnail next to its info document.
//!
//! Kodi picks up `NAME.jpg` (or `.png`/`.webp`) beside `NAME.nfo`, so the image
//! is stored under the same base name. Fetching is blocking and happens at
//! most once per run; an image already on disk short-circuits the network.

use std::fs;
use std::io::Read;
use std::path::Path;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use mime_guess::mime::{self, Mime};
use tracing::{debug, info, warn};

/// Extensions checked when deciding whether an image is already present.
pub const IMAGE_EXTENSIONS: &[&str] = &["webp", "jpg", "png"];

/// Raw HTTP result handed back by an [`ImageSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedImage {
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Anything that can turn a URL into image bytes. Production code uses
/// [`HttpImageSource`]; tests plug in canned responses.
pub trait ImageSource {
    /// Errors for transport failures and any status other than 200.
    fn fetch(&self, url: &str) -> Result<FetchedImage>;
}

/// Blocking HTTP client backed by `ureq`, with the transport's default timeouts.
#[derive(Debug, Clone)]
pub struct HttpImageSource {
    agent: ureq::Agent,
}

impl HttpImageSource {
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new().build(),
        }
    }
}

impl Default for HttpImageSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageSource for HttpImageSource {
    fn fetch(&self, url: &str) -> Result<FetchedImage> {
        let response = match self.agent.get(url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(code, _)) => {
                bail!("{url} answered with status {code}")
            }
            Err(err) => return Err(err).with_context(|| format!("requesting {url}")),
        };
        if response.status() != 200 {
            bail!("{url} answered with status {}", response.status());
        }
        let content_type = response.header("Content-Type").map(str::to_owned);
        let mut body = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut body)
            .with_context(|| format!("reading body of {url}"))?;
        Ok(FetchedImage { content_type, body })
    }
}

/// What happened when the thumbnail was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThumbnailOutcome {
    /// Not requested this run.
    NotRequested,
    /// The `.nfo` points at the remote URL; nothing was downloaded.
    Remote(String),
    /// A local image with a known extension already existed.
    AlreadyPresent(String),
    /// Freshly downloaded; holds the file name.
    Fetched(String),
    /// The server sent something other than webp/jpeg/png.
    UnrecognizedType(Option<String>),
    /// No URL candidate in the document.
    NoCandidate,
    /// Transport or status failure, already logged.
    Failed,
}

impl ThumbnailOutcome {
    /// Value for the `.nfo` thumb element.
    pub fn reference(&self) -> &str {
        match self {
            ThumbnailOutcome::Remote(value)
            | ThumbnailOutcome::AlreadyPresent(value)
            | ThumbnailOutcome::Fetched(value) => value,
            _ => "",
        }
    }
}

/// Maps a `Content-Type` header to the file extension we store images under.
pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    let parsed: Mime = content_type.trim().parse().ok()?;
    if parsed.type_() != mime::IMAGE {
        return None;
    }
    match parsed.subtype().as_str() {
        "webp" => Some("webp"),
        "jpeg" | "jpg" => Some("jpg"),
        "png" => Some("png"),
        _ => None,
    }
}

/// File name of an existing `basename.{webp,jpg,png}` in `directory`.
pub fn existing_image(directory: &Path, basename: &str) -> Option<String> {
    IMAGE_EXTENSIONS
        .iter()
        .map(|ext| format!("{basename}.{ext}"))
        .find(|name| directory.join(name).exists())
}

pub struct ThumbnailAcquirer<'a> {
    source: &'a dyn ImageSource,
    delay: Duration,
    force_refetch: bool,
}

impl<'a> ThumbnailAcquirer<'a> {
    pub fn new(source: &'a dyn ImageSource, delay: Duration, force_refetch: bool) -> Self {
        Self {
            source,
            delay,
            force_refetch,
        }
    }

    /// Makes sure `directory/basename.<ext>` exists for `url`.
    ///
    /// Never returns an error: every failure is logged and reported through
    /// the outcome so the conversion can go on without a thumbnail.
    pub fn acquire(&self, url: &str, directory: &Path, basename: &str) -> ThumbnailOutcome {
        if !self.force_refetch
            && let Some(existing) = existing_image(directory, basename)
        {
            info!(file = %existing, "image already present, not fetching");
            return ThumbnailOutcome::AlreadyPresent(existing);
        }
        if url.is_empty() {
            warn!(basename, "no thumbnail URL in document");
            return ThumbnailOutcome::NoCandidate;
        }

        if !self.delay.is_zero() {
            debug!(seconds = self.delay.as_secs(), "sleeping before thumbnail fetch");
            thread::sleep(self.delay);
        }
        info!(basename, url, "fetching thumbnail");
        match self.download(url, directory, basename) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(basename, url, "thumbnail fetch failed: {err:#}");
                ThumbnailOutcome::Failed
            }
        }
    }

    fn download(&self, url: &str, directory: &Path, basename: &str) -> Result<ThumbnailOutcome> {
        let image = self.source.fetch(url)?;
        let Some(extension) = image
            .content_type
            .as_deref()
            .and_then(extension_for_content_type)
        else {
            warn!(
                url,
                content_type = image.content_type.as_deref().unwrap_or("<none>"),
                "unrecognized thumbnail content type, leaving thumb empty"
            );
            return Ok(ThumbnailOutcome::UnrecognizedType(image.content_type));
        };
        let file_name = format!("{basename}.{extension}");
        let target = directory.join(&file_name);
        fs::write(&target, &image.body)
            .with_context(|| format!("writing {}", target.display()))?;
        Ok(ThumbnailOutcome::Fetched(file_name))
    }
}
