#![forbid(unsafe_code)]

//! Turns yt-dlp `.info.json` documents into Kodi sidecar files: a `.strm`
//! stream pointer, a `.nfo` media-info record and a `.dms.json` player
//! command, plus an optional local thumbnail.

pub mod archive;
pub mod artifacts;
pub mod config;
pub mod convert;
pub mod document;
pub mod fields;
pub mod planner;
pub mod profiles;
pub mod thumbnail;
pub mod writer;
