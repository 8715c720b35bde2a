//! Decides which sidecars a run has to (re)generate.

use crate::artifacts::ArtifactKind;
use crate::config::ConvertOptions;
use crate::document::InfoPaths;

/// Which sidecars already exist next to the input document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArtifactPresence {
    pub stream: bool,
    pub media_info: bool,
    pub player_command: bool,
}

impl ArtifactPresence {
    pub fn probe(paths: &InfoPaths) -> Self {
        Self {
            stream: paths.stream().exists(),
            media_info: paths.media_info().exists(),
            player_command: paths.player_command().exists(),
        }
    }

    pub fn contains(&self, kind: ArtifactKind) -> bool {
        match kind {
            ArtifactKind::Stream => self.stream,
            ArtifactKind::MediaInfo => self.media_info,
            ArtifactKind::PlayerCommand => self.player_command,
        }
    }
}

/// How the `.nfo` thumb element gets its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailMode {
    /// Leave it empty.
    Omit,
    /// Point at the remote URL.
    Remote,
    /// Download next to the document and reference the local file.
    Fetch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtifactPlan {
    pub stream: bool,
    pub media_info: bool,
    pub player_command: bool,
    pub thumbnail: ThumbnailMode,
}

impl ArtifactPlan {
    pub fn new(presence: ArtifactPresence, options: &ConvertOptions) -> Self {
        let stream = !presence.stream || options.force_stream;
        let media_info =
            !presence.media_info || options.force_media_info || options.force_refetch_thumbnail;
        let player_command = !presence.player_command || options.force_player_command;

        let thumbnail = if !media_info || options.suppress_thumbnail {
            ThumbnailMode::Omit
        } else if options.fetch_thumbnail {
            ThumbnailMode::Fetch
        } else {
            ThumbnailMode::Remote
        };

        Self {
            stream,
            media_info,
            player_command,
            thumbnail,
        }
    }

    pub fn includes(&self, kind: ArtifactKind) -> bool {
        match kind {
            ArtifactKind::Stream => self.stream,
            ArtifactKind::MediaInfo => self.media_info,
            ArtifactKind::PlayerCommand => self.player_command,
        }
    }

    /// Nothing to do; the document does not even need to be read.
    pub fn is_idle(&self) -> bool {
        !(self.stream || self.media_info || self.player_command)
    }
}
