//! Per-extractor rules for turning resolved fields into sidecar payloads.
//!
//! Each yt-dlp extractor lays its metadata out differently, so every source
//! we understand gets its own [`SourceProfile`]. The converter only ever talks
//! to the trait; adding a source means adding a profile to the registry.

use crate::artifacts::{
    MediaInfoRecord, MediaSet, PlayerCommandRecord, PlayerResource, StreamPointer,
};
use crate::document::{MetadataDocument, Segment};
use crate::fields::ResolvedFields;

const YOUTUBE_PLUGIN_URL: &str = "plugin://plugin.video.youtube/play/?video_id=";
const YOUTUBE_PLAYER_COMMAND: &str = "play-stream";
const YOUTUBE_PLAYER_MIME: &str = "video/mp4";
const SVT_GROUP_LABEL: &str = "SVT";
const SVT_MANIFEST_URL: &[Segment] = &[
    Segment::Key("formats"),
    Segment::Index(1),
    Segment::Key("manifest_url"),
];

pub trait SourceProfile {
    /// `extractor_key` value this profile handles.
    fn extractor_key(&self) -> &'static str;

    /// Source name written in front of the id in the archive log.
    fn archive_name(&self) -> &'static str;

    fn stream_pointer(
        &self,
        doc: &MetadataDocument,
        fields: &ResolvedFields,
    ) -> Option<StreamPointer>;

    /// `thumb` is whatever the caller settled on: a local file name, a
    /// remote URL, or empty.
    fn media_info(&self, fields: &ResolvedFields, thumb: &str) -> MediaInfoRecord;

    fn player_command(&self, fields: &ResolvedFields) -> Option<PlayerCommandRecord>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct YoutubeProfile;

impl SourceProfile for YoutubeProfile {
    fn extractor_key(&self) -> &'static str {
        "Youtube"
    }

    fn archive_name(&self) -> &'static str {
        "youtube"
    }

    fn stream_pointer(
        &self,
        _doc: &MetadataDocument,
        fields: &ResolvedFields,
    ) -> Option<StreamPointer> {
        if fields.id().is_empty() {
            return None;
        }
        StreamPointer::new(format!("{YOUTUBE_PLUGIN_URL}{}", fields.id()))
    }

    fn media_info(&self, fields: &ResolvedFields, thumb: &str) -> MediaInfoRecord {
        MediaInfoRecord {
            title: fields.title().to_owned(),
            sort_title: fields.title().to_owned(),
            plot: fields.description().to_owned(),
            thumb: thumb.to_owned(),
            tags: fields.tags().to_vec(),
            premiered: fields.premiered(),
            director: fields.uploader().to_owned(),
            studio: fields.playlist_uploader().to_owned(),
            genres: fields.categories().to_vec(),
            set: MediaSet::grouped(fields.channel(), fields.playlist_title()),
        }
    }

    fn player_command(&self, fields: &ResolvedFields) -> Option<PlayerCommandRecord> {
        Some(PlayerCommandRecord {
            title: fields.title().to_owned(),
            resources: vec![PlayerResource {
                mime_type: YOUTUBE_PLAYER_MIME.to_owned(),
                command: format!("{YOUTUBE_PLAYER_COMMAND} {}", fields.id()),
            }],
        })
    }
}

/// SVT Play: HLS manifest for streaming, series title folded into the title.
#[derive(Debug, Clone, Copy, Default)]
pub struct SvtPlayProfile;

impl SvtPlayProfile {
    fn episode_title(fields: &ResolvedFields) -> String {
        format!("{} {}", fields.playlist_title(), fields.title())
    }
}

impl SourceProfile for SvtPlayProfile {
    fn extractor_key(&self) -> &'static str {
        "SVTPlay"
    }

    fn archive_name(&self) -> &'static str {
        "svtplay"
    }

    fn stream_pointer(
        &self,
        doc: &MetadataDocument,
        _fields: &ResolvedFields,
    ) -> Option<StreamPointer> {
        StreamPointer::new(doc.text(SVT_MANIFEST_URL))
    }

    fn media_info(&self, fields: &ResolvedFields, _thumb: &str) -> MediaInfoRecord {
        let title = Self::episode_title(fields);
        MediaInfoRecord {
            sort_title: title.clone(),
            title,
            premiered: fields.premiered(),
            set: MediaSet::grouped(SVT_GROUP_LABEL, fields.playlist_title()),
            ..MediaInfoRecord::default()
        }
    }

    fn player_command(&self, _fields: &ResolvedFields) -> Option<PlayerCommandRecord> {
        None
    }
}

/// Lookup table from `extractor_key` to profile.
pub struct ProfileRegistry {
    profiles: Vec<Box<dyn SourceProfile>>,
}

impl ProfileRegistry {
    pub fn empty() -> Self {
        Self {
            profiles: Vec::new(),
        }
    }

    pub fn with_builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(YoutubeProfile));
        registry.register(Box::new(SvtPlayProfile));
        registry
    }

    /// Later registrations for the same key replace earlier ones.
    pub fn register(&mut self, profile: Box<dyn SourceProfile>) {
        self.profiles
            .retain(|existing| existing.extractor_key() != profile.extractor_key());
        self.profiles.push(profile);
    }

    pub fn lookup(&self, extractor_key: &str) -> Option<&dyn SourceProfile> {
        self.profiles
            .iter()
            .find(|profile| profile.extractor_key() == extractor_key)
            .map(|profile| profile.as_ref())
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.profiles.iter().map(|profile| profile.extractor_key())
    }
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}
