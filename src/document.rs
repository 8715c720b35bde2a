//! Loading yt-dlp `.info.json` documents and addressing values inside them.
//!
//! The document is kept as a loose `serde_json::Value` tree: different
//! extractors emit different shapes, so nothing is deserialized into a fixed
//! struct here. Callers walk the tree with [`Segment`] paths instead.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use flate2::read::GzDecoder;
use serde_json::Value;

const INFO_SUFFIX: &str = ".info.json";
const GZIP_SUFFIX: &str = ".gz";

/// Every file location derived from one input document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoPaths {
    pub input: PathBuf,
    pub directory: PathBuf,
    /// File name with only `.gz` removed, so `NAME.info.json`; every sidecar
    /// is this plus its own extension.
    pub basename: String,
    pub compressed: bool,
}

impl InfoPaths {
    /// Accepts `NAME.info.json` and `NAME.info.json.gz`; anything else is an
    /// input error.
    pub fn from_input(input: &Path) -> Result<Self> {
        let file_name = input
            .file_name()
            .and_then(|name| name.to_str())
            .with_context(|| format!("{} has no usable file name", input.display()))?;
        let (name, compressed) = match file_name.strip_suffix(GZIP_SUFFIX) {
            Some(name) => (name, true),
            None => (file_name, false),
        };
        let Some(stem) = name.strip_suffix(INFO_SUFFIX) else {
            bail!(
                "{} does not look like an info document (expected *{INFO_SUFFIX} or *{INFO_SUFFIX}{GZIP_SUFFIX})",
                input.display()
            );
        };
        if stem.is_empty() {
            bail!("{} has an empty base name", input.display());
        }
        let directory = input
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(Self {
            input: input.to_path_buf(),
            directory,
            basename: name.to_string(),
            compressed,
        })
    }

    pub fn stream(&self) -> PathBuf {
        self.sibling("strm")
    }

    pub fn media_info(&self) -> PathBuf {
        self.sibling("nfo")
    }

    pub fn player_command(&self) -> PathBuf {
        self.sibling("dms.json")
    }

    /// `DIR/BASENAME.<extension>`, used for artifacts and thumbnails alike.
    pub fn sibling(&self, extension: &str) -> PathBuf {
        self.directory
            .join(format!("{}.{extension}", self.basename))
    }
}

/// One step of a lookup path.
#[derive(Debug, Clone, Copy)]
pub enum Segment {
    Key(&'static str),
    Index(usize),
    /// First array element (in document order) accepted by the predicate.
    FirstWhere(fn(&Value) -> bool),
}

/// Read-only view over a parsed info document.
#[derive(Debug, Clone)]
pub struct MetadataDocument {
    root: Value,
}

impl MetadataDocument {
    pub fn from_value(root: Value) -> Self {
        Self { root }
    }

    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let root = serde_json::from_slice(bytes).context("parsing info document JSON")?;
        Ok(Self { root })
    }

    /// Reads the document behind `paths`, unwrapping gzip when the name says so.
    pub fn load(paths: &InfoPaths) -> Result<Self> {
        let raw = fs::read(&paths.input)
            .with_context(|| format!("reading {}", paths.input.display()))?;
        if !paths.compressed {
            return Self::parse(&raw);
        }
        let mut decoded = Vec::new();
        GzDecoder::new(raw.as_slice())
            .read_to_end(&mut decoded)
            .with_context(|| format!("decompressing {}", paths.input.display()))?;
        Self::parse(&decoded)
    }

    pub fn get(&self, path: &[Segment]) -> Option<&Value> {
        let mut current = &self.root;
        for segment in path {
            current = match *segment {
                Segment::Key(key) => current.get(key)?,
                Segment::Index(index) => current.get(index)?,
                Segment::FirstWhere(accept) => current.as_array()?.iter().find(|item| accept(item))?,
            };
        }
        Some(current)
    }

    /// Text at `path`; empty when the value is missing or not scalar text.
    pub fn text(&self, path: &[Segment]) -> String {
        self.get(path).map(value_text).unwrap_or_default()
    }

    /// Array at `path` flattened to strings in document order.
    pub fn text_list(&self, path: &[Segment]) -> Vec<String> {
        self.get(path)
            .and_then(Value::as_array)
            .map(|items| items.iter().map(value_text).collect())
            .unwrap_or_default()
    }
}

/// Strings as-is, numbers as their decimal text, everything else empty.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::{Compression, write::GzEncoder};
    use serde_json::json;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn info_paths_for_plain_document() -> Result<()> {
        let paths = InfoPaths::from_input(Path::new("/media/yt/Clip [abc].info.json"))?;
        assert!(!paths.compressed);
        assert_eq!(paths.basename, "Clip [abc].info.json");
        assert_eq!(
            paths.stream(),
            PathBuf::from("/media/yt/Clip [abc].info.json.strm")
        );
        assert_eq!(
            paths.media_info(),
            PathBuf::from("/media/yt/Clip [abc].info.json.nfo")
        );
        assert_eq!(
            paths.player_command(),
            PathBuf::from("/media/yt/Clip [abc].info.json.dms.json")
        );
        Ok(())
    }

    #[test]
    fn info_paths_detects_gzip() -> Result<()> {
        let paths = InfoPaths::from_input(Path::new("clip.info.json.gz"))?;
        assert!(paths.compressed);
        assert_eq!(paths.basename, "clip.info.json");
        assert_eq!(paths.sibling("jpg"), PathBuf::from("clip.info.json.jpg"));
        assert_eq!(paths.stream(), PathBuf::from("clip.info.json.strm"));
        Ok(())
    }

    #[test]
    fn info_paths_rejects_other_names() {
        assert!(InfoPaths::from_input(Path::new("clip.json")).is_err());
        assert!(InfoPaths::from_input(Path::new("clip.info.json.bz2")).is_err());
        assert!(InfoPaths::from_input(Path::new(".info.json")).is_err());
    }

    #[test]
    fn load_reads_gzip_documents() -> Result<()> {
        let dir = tempdir()?;
        let input = dir.path().join("clip.info.json.gz");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(br#"{"id":"abc","extractor_key":"Youtube"}"#)?;
        fs::write(&input, encoder.finish()?)?;

        let doc = MetadataDocument::load(&InfoPaths::from_input(&input)?)?;
        assert_eq!(doc.text(&[Segment::Key("id")]), "abc");
        Ok(())
    }

    #[test]
    fn load_fails_on_corrupt_gzip() -> Result<()> {
        let dir = tempdir()?;
        let input = dir.path().join("clip.info.json.gz");
        fs::write(&input, b"{\"id\":\"not compressed\"}")?;
        let err = MetadataDocument::load(&InfoPaths::from_input(&input)?).unwrap_err();
        assert!(err.to_string().contains("decompressing"));
        Ok(())
    }

    #[test]
    fn load_fails_on_missing_file() -> Result<()> {
        let dir = tempdir()?;
        let paths = InfoPaths::from_input(&dir.path().join("ghost.info.json"))?;
        assert!(MetadataDocument::load(&paths).is_err());
        Ok(())
    }

    #[test]
    fn path_lookup_walks_keys_indices_and_filters() {
        let doc = MetadataDocument::from_value(json!({
            "formats": [{"manifest_url": "a"}, {"manifest_url": "b"}],
            "thumbnails": [{"width": 120, "url": "s"}, {"width": 900, "url": "w"}],
        }));
        assert_eq!(
            doc.text(&[Segment::Key("formats"), Segment::Index(1), Segment::Key("manifest_url")]),
            "b"
        );
        let wide = |value: &Value| value.get("width").and_then(Value::as_u64) > Some(500);
        assert_eq!(
            doc.text(&[Segment::Key("thumbnails"), Segment::FirstWhere(wide), Segment::Key("url")]),
            "w"
        );
        assert!(doc.get(&[Segment::Key("formats"), Segment::Index(5)]).is_none());
    }

    #[test]
    fn text_handles_numbers_and_non_scalars() {
        let doc = MetadataDocument::from_value(json!({"id": 42, "title": null, "tags": ["a", 1, {}]}));
        assert_eq!(doc.text(&[Segment::Key("id")]), "42");
        assert_eq!(doc.text(&[Segment::Key("title")]), "");
        assert_eq!(doc.text_list(&[Segment::Key("tags")]), vec!["a", "1", ""]);
        assert!(doc.text_list(&[Segment::Key("missing")]).is_empty());
    }
}
