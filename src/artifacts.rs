//! Payloads for the three sidecar files and their on-disk encodings.
//!
//! - `.strm`: one URI line Kodi hands to the resolving add-on.
//! - `.nfo`: Kodi `<movie>` XML.
//! - `.dms.json`: the command a DLNA media server runs to play the item.

use std::fmt;

use anyhow::{Context, Result};
use quick_xml::se::Serializer as XmlSerializer;
use serde::{Deserialize, Serialize};

const MEDIA_INFO_ROOT: &str = "movie";

/// Which of the three sidecars a payload or outcome refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Stream,
    MediaInfo,
    PlayerCommand,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 3] = [
        ArtifactKind::Stream,
        ArtifactKind::MediaInfo,
        ArtifactKind::PlayerCommand,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ArtifactKind::Stream => "strm",
            ArtifactKind::MediaInfo => "nfo",
            ArtifactKind::PlayerCommand => "dms",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamPointer(String);

impl StreamPointer {
    /// `None` for an empty URI so nothing gets written.
    pub fn new(uri: impl Into<String>) -> Option<Self> {
        let uri = uri.into();
        (!uri.is_empty()).then_some(Self(uri))
    }

    pub fn uri(&self) -> &str {
        &self.0
    }

    pub fn encode(&self) -> Vec<u8> {
        format!("{}\n", self.0).into_bytes()
    }
}

/// Playlist or series grouping shown by Kodi as a movie set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaSet {
    pub name: String,
    #[serde(default)]
    pub overview: String,
}

impl MediaSet {
    /// `"{group} : {title} "`; both halves are kept even when empty.
    pub fn grouped(group: &str, title: &str) -> Self {
        Self {
            name: format!("{group} : {title} "),
            overview: String::new(),
        }
    }
}

/// Kodi `.nfo` movie record. Field order matches the element order written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaInfoRecord {
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "sorttitle")]
    pub sort_title: String,
    #[serde(default)]
    pub plot: String,
    #[serde(default)]
    pub thumb: String,
    #[serde(default, rename = "tag")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub premiered: String,
    #[serde(default)]
    pub director: String,
    #[serde(default)]
    pub studio: String,
    #[serde(default, rename = "genre")]
    pub genres: Vec<String>,
    #[serde(default)]
    pub set: MediaSet,
}

impl MediaInfoRecord {
    /// Compact XML with expanded empty elements and no declaration.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut xml = String::new();
        let mut serializer = XmlSerializer::with_root(&mut xml, Some(MEDIA_INFO_ROOT))
            .context("preparing nfo serializer")?;
        serializer.expand_empty_elements(true);
        self.serialize(serializer).context("serializing nfo")?;
        Ok(xml.into_bytes())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlayerResource {
    pub mime_type: String,
    pub command: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlayerCommandRecord {
    pub title: String,
    pub resources: Vec<PlayerResource>,
}

impl PlayerCommandRecord {
    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).context("serializing dms.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> MediaInfoRecord {
        MediaInfoRecord {
            title: "Fish & Chips".into(),
            sort_title: "Fish & Chips".into(),
            plot: String::new(),
            thumb: "clip.jpg".into(),
            tags: vec!["Uploader".into(), "food".into()],
            premiered: "2023-01-15".into(),
            director: "Uploader".into(),
            studio: String::new(),
            genres: vec!["Howto".into()],
            set: MediaSet::grouped("Channel", "Uploads"),
        }
    }

    #[test]
    fn stream_pointer_is_one_line() {
        let pointer = StreamPointer::new("plugin://x/?id=1").unwrap();
        assert_eq!(pointer.encode(), b"plugin://x/?id=1\n");
        assert!(StreamPointer::new("").is_none());
    }

    #[test]
    fn media_set_keeps_both_sides() {
        assert_eq!(MediaSet::grouped("", "List").name, " : List ");
        assert_eq!(MediaSet::grouped("SVT", "").name, "SVT :  ");
    }

    #[test]
    fn media_info_xml_layout() -> Result<()> {
        let xml = String::from_utf8(sample_record().encode()?)?;
        assert!(xml.starts_with("<movie><title>"), "{xml}");
        assert!(xml.ends_with("</movie>"), "{xml}");
        assert!(xml.contains("<title>Fish &amp; Chips</title>"));
        assert!(xml.contains("<sorttitle>Fish &amp; Chips</sorttitle>"));
        assert!(xml.contains("<tag>Uploader</tag><tag>food</tag>"));
        assert!(xml.contains("<premiered>2023-01-15</premiered>"));
        assert!(xml.contains("<genre>Howto</genre>"));
        assert!(xml.contains("<set><name>Channel : Uploads </name>"));
        assert!(!xml.contains("<?xml"));

        let order = [
            "<title>",
            "<sorttitle>",
            "<plot",
            "<thumb>",
            "<tag>",
            "<premiered>",
            "<director>",
            "<studio",
            "<genre>",
            "<set>",
        ];
        let positions: Vec<usize> = order
            .iter()
            .map(|element| xml.find(element).expect(element))
            .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]), "{xml}");
        Ok(())
    }

    #[test]
    fn media_info_xml_reads_back() -> Result<()> {
        let record = sample_record();
        let xml = String::from_utf8(record.encode()?)?;
        let parsed: MediaInfoRecord = quick_xml::de::from_str(&xml)?;
        assert_eq!(parsed.title, record.title);
        assert_eq!(parsed.tags, record.tags);
        assert_eq!(parsed.set.name.trim(), record.set.name.trim());
        Ok(())
    }

    #[test]
    fn empty_record_still_has_every_scalar_element() -> Result<()> {
        let xml = String::from_utf8(MediaInfoRecord::default().encode()?)?;
        let scalars = [
            "title",
            "sorttitle",
            "plot",
            "thumb",
            "premiered",
            "director",
            "studio",
            "set",
        ];
        for element in scalars {
            assert!(xml.contains(&format!("<{element}>")), "missing {element} in {xml}");
        }
        assert!(!xml.contains("<tag>"));
        assert!(!xml.contains("<genre>"));
        Ok(())
    }

    #[test]
    fn player_command_json_uses_pascal_case() -> Result<()> {
        let record = PlayerCommandRecord {
            title: "Clip".into(),
            resources: vec![PlayerResource {
                mime_type: "video/mp4".into(),
                command: "play-stream abc".into(),
            }],
        };
        let json = String::from_utf8(record.encode()?)?;
        assert_eq!(
            json,
            r#"{"Title":"Clip","Resources":[{"MimeType":"video/mp4","Command":"play-stream abc"}]}"#
        );
        Ok(())
    }
}
