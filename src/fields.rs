//! Pulls the handful of values the converter needs out of an info document.

use std::time::SystemTime;

use chrono::NaiveDate;
use serde_json::Value;

use crate::document::{MetadataDocument, Segment};

/// Thumbnails at least this wide are preferred over the index fallbacks.
pub const WIDE_THUMBNAIL_MIN_WIDTH: f64 = 640.0;

/// A candidate location plus the test its value must pass to be used.
#[derive(Debug, Clone, Copy)]
pub struct Probe {
    pub path: &'static [Segment],
    pub accept: fn(&Value) -> bool,
}

impl Probe {
    const fn new(path: &'static [Segment]) -> Self {
        Self {
            path,
            accept: is_non_empty_string,
        }
    }
}

fn is_non_empty_string(value: &Value) -> bool {
    value.as_str().is_some_and(|text| !text.is_empty())
}

fn is_wide_thumbnail(value: &Value) -> bool {
    value
        .get("width")
        .and_then(Value::as_f64)
        .is_some_and(|width| width >= WIDE_THUMBNAIL_MIN_WIDTH)
}

const DIRECT_THUMBNAIL: &[Segment] = &[Segment::Key("thumbnail")];
const FIRST_WIDE_THUMBNAIL: &[Segment] = &[
    Segment::Key("thumbnails"),
    Segment::FirstWhere(is_wide_thumbnail),
    Segment::Key("url"),
];
const THUMBNAIL_AT_3: &[Segment] = &[Segment::Key("thumbnails"), Segment::Index(3), Segment::Key("url")];
const THUMBNAIL_AT_2: &[Segment] = &[Segment::Key("thumbnails"), Segment::Index(2), Segment::Key("url")];
const THUMBNAIL_AT_1: &[Segment] = &[Segment::Key("thumbnails"), Segment::Index(1), Segment::Key("url")];
const THUMBNAIL_AT_0: &[Segment] = &[Segment::Key("thumbnails"), Segment::Index(0), Segment::Key("url")];

/// Trial order for the thumbnail URL. Variant arrays are not sorted by size,
/// so the order below is the contract, not "pick the largest".
pub const THUMBNAIL_CHAIN: &[Probe] = &[
    Probe::new(DIRECT_THUMBNAIL),
    Probe::new(FIRST_WIDE_THUMBNAIL),
    Probe::new(THUMBNAIL_AT_3),
    Probe::new(THUMBNAIL_AT_2),
    Probe::new(THUMBNAIL_AT_1),
    Probe::new(THUMBNAIL_AT_0),
];

/// Evaluates `chain` in order and returns the first accepted value as text.
pub fn first_match(doc: &MetadataDocument, chain: &[Probe]) -> Option<String> {
    chain.iter().find_map(|probe| {
        doc.get(probe.path)
            .filter(|value| (probe.accept)(value))
            .and_then(Value::as_str)
            .map(str::to_owned)
    })
}

/// Flat, immutable snapshot of the document values used by the profiles.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedFields {
    extractor_key: String,
    id: String,
    upload_date: String,
    uploader: String,
    playlist_uploader: String,
    playlist_title: String,
    title: String,
    description: String,
    channel: String,
    categories: Vec<String>,
    tags: Vec<String>,
    thumbnail_url: String,
}

impl ResolvedFields {
    pub fn resolve(doc: &MetadataDocument) -> Self {
        let text = |key: &'static str| doc.text(&[Segment::Key(key)]);
        let uploader = text("uploader");

        let mut tags = Vec::new();
        tags.push(uploader.clone());
        tags.extend(doc.text_list(&[Segment::Key("tags")]));

        Self {
            extractor_key: text("extractor_key"),
            id: text("id"),
            upload_date: text("upload_date"),
            playlist_uploader: text("playlist_uploader"),
            playlist_title: text("playlist_title"),
            title: text("title"),
            description: text("description"),
            channel: text("channel"),
            categories: doc.text_list(&[Segment::Key("categories")]),
            thumbnail_url: first_match(doc, THUMBNAIL_CHAIN).unwrap_or_default(),
            uploader,
            tags,
        }
    }

    pub fn extractor_key(&self) -> &str {
        &self.extractor_key
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn upload_date(&self) -> &str {
        &self.upload_date
    }

    pub fn uploader(&self) -> &str {
        &self.uploader
    }

    pub fn playlist_uploader(&self) -> &str {
        &self.playlist_uploader
    }

    pub fn playlist_title(&self) -> &str {
        &self.playlist_title
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Uploader first, then the document's own tags in order.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn thumbnail_url(&self) -> &str {
        &self.thumbnail_url
    }

    /// Parsed `upload_date` (`YYYYMMDD`), if well formed.
    pub fn release_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.upload_date, "%Y%m%d").ok()
    }

    /// ISO-8601 premiere date, empty when the upload date is unusable.
    pub fn premiered(&self) -> String {
        self.release_date()
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    }

    /// Midnight UTC of the upload date; applied as every artifact's mtime.
    pub fn canonical_timestamp(&self) -> Option<SystemTime> {
        let midnight = self.release_date()?.and_hms_opt(0, 0, 0)?;
        Some(SystemTime::from(midnight.and_utc()))
    }
}
