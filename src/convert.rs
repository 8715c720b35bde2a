//! One-document conversion: plan, resolve, map, write.
//!
//! Failure policy: an unusable input document aborts the run; everything
//! after that (thumbnail, individual sidecars, archive) is logged and
//! skipped so one problem never blocks the remaining artifacts.

use std::path::Path;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::archive::ArchiveLog;
use crate::artifacts::ArtifactKind;
use crate::config::ConvertOptions;
use crate::document::{InfoPaths, MetadataDocument};
use crate::fields::ResolvedFields;
use crate::planner::{ArtifactPlan, ArtifactPresence, ThumbnailMode};
use crate::profiles::{ProfileRegistry, SourceProfile};
use crate::thumbnail::{ImageSource, ThumbnailAcquirer, ThumbnailOutcome};
use crate::writer::{ArtifactWriter, FileTime};

/// Summary of a single run, mainly for callers that want to assert on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionReport {
    pub plan: ArtifactPlan,
    /// `false` when the plan was idle and the document was never read.
    pub parsed: bool,
    /// Extractor key of the document; `None` if it was not parsed.
    pub extractor: Option<String>,
    pub recognized: bool,
    pub written: Vec<ArtifactKind>,
    /// Written, but still carrying the time they were written at.
    pub unstamped: Vec<ArtifactKind>,
    pub failed: Vec<ArtifactKind>,
    pub thumbnail: ThumbnailOutcome,
    pub archived: bool,
}

impl ConversionReport {
    fn new(plan: ArtifactPlan) -> Self {
        Self {
            plan,
            parsed: false,
            extractor: None,
            recognized: false,
            written: Vec::new(),
            unstamped: Vec::new(),
            failed: Vec::new(),
            thumbnail: ThumbnailOutcome::NotRequested,
            archived: false,
        }
    }
}

pub struct Converter<'a> {
    options: &'a ConvertOptions,
    registry: &'a ProfileRegistry,
    images: &'a dyn ImageSource,
    archive: Option<&'a ArchiveLog>,
}

impl<'a> Converter<'a> {
    pub fn new(
        options: &'a ConvertOptions,
        registry: &'a ProfileRegistry,
        images: &'a dyn ImageSource,
    ) -> Self {
        Self {
            options,
            registry,
            images,
            archive: None,
        }
    }

    /// Record `source id` in `archive` after a run that wrote a stream or
    /// media-info file.
    pub fn with_archive(mut self, archive: &'a ArchiveLog) -> Self {
        self.archive = Some(archive);
        self
    }

    /// Errors only when the input cannot be named, read or parsed.
    pub fn convert(&self, input: &Path) -> Result<ConversionReport> {
        let paths = InfoPaths::from_input(input)?;
        let presence = ArtifactPresence::probe(&paths);
        for kind in ArtifactKind::ALL {
            if presence.contains(kind) {
                debug!(artifact = %kind, basename = %paths.basename, "artifact exists");
            }
        }

        let plan = ArtifactPlan::new(presence, self.options);
        let mut report = ConversionReport::new(plan);
        if plan.is_idle() {
            info!(path = %input.display(), "all artifacts present, nothing to do");
            return Ok(report);
        }

        let doc = MetadataDocument::load(&paths)?;
        let fields = ResolvedFields::resolve(&doc);
        report.parsed = true;
        report.extractor = Some(fields.extractor_key().to_owned());

        let Some(profile) = self.registry.lookup(fields.extractor_key()) else {
            let supported: Vec<&str> = self.registry.keys().collect();
            info!(
                extractor = fields.extractor_key(),
                ?supported,
                path = %input.display(),
                "unsupported extractor, no artifacts generated"
            );
            return Ok(report);
        };
        report.recognized = true;

        let timestamp = fields.canonical_timestamp();
        if timestamp.is_none() {
            warn!(
                upload_date = fields.upload_date(),
                "no usable upload date, file times left as written"
            );
        }
        let writer = ArtifactWriter::new(timestamp);

        if plan.includes(ArtifactKind::Stream) {
            match profile.stream_pointer(&doc, &fields) {
                Some(pointer) => self.persist(
                    &writer,
                    ArtifactKind::Stream,
                    &paths.stream(),
                    Ok(pointer.encode()),
                    &mut report,
                ),
                None => debug!(extractor = profile.extractor_key(), "no stream URI available"),
            }
        }

        if plan.includes(ArtifactKind::MediaInfo) {
            report.thumbnail = self.thumbnail(plan.thumbnail, &fields, &paths);
            let record = profile.media_info(&fields, report.thumbnail.reference());
            self.persist(
                &writer,
                ArtifactKind::MediaInfo,
                &paths.media_info(),
                record.encode(),
                &mut report,
            );
        }

        if plan.includes(ArtifactKind::PlayerCommand)
            && let Some(record) = profile.player_command(&fields)
        {
            self.persist(
                &writer,
                ArtifactKind::PlayerCommand,
                &paths.player_command(),
                record.encode(),
                &mut report,
            );
        }

        report.archived = self.update_archive(profile, &fields, &report);
        Ok(report)
    }

    fn thumbnail(
        &self,
        mode: ThumbnailMode,
        fields: &ResolvedFields,
        paths: &InfoPaths,
    ) -> ThumbnailOutcome {
        match mode {
            ThumbnailMode::Omit => ThumbnailOutcome::NotRequested,
            ThumbnailMode::Remote => {
                debug!("not fetching thumbnail, referencing remote URL");
                if fields.thumbnail_url().is_empty() {
                    ThumbnailOutcome::NoCandidate
                } else {
                    ThumbnailOutcome::Remote(fields.thumbnail_url().to_owned())
                }
            }
            ThumbnailMode::Fetch => ThumbnailAcquirer::new(
                self.images,
                self.options.settings.sleep,
                self.options.force_refetch_thumbnail,
            )
            .acquire(fields.thumbnail_url(), &paths.directory, &paths.basename),
        }
    }

    fn persist(
        &self,
        writer: &ArtifactWriter,
        kind: ArtifactKind,
        path: &Path,
        encoded: Result<Vec<u8>>,
        report: &mut ConversionReport,
    ) {
        match encoded.and_then(|contents| writer.write(kind, path, &contents)) {
            Ok(time) => {
                report.written.push(kind);
                if time == FileTime::Unchanged {
                    report.unstamped.push(kind);
                }
            }
            Err(err) => {
                warn!(
                    artifact = %kind,
                    path = %path.display(),
                    "could not write artifact: {err:#}"
                );
                report.failed.push(kind);
            }
        }
    }

    fn update_archive(
        &self,
        profile: &dyn SourceProfile,
        fields: &ResolvedFields,
        report: &ConversionReport,
    ) -> bool {
        let Some(archive) = self.archive else {
            return false;
        };
        let wrote_entry = report
            .written
            .iter()
            .any(|kind| matches!(kind, ArtifactKind::Stream | ArtifactKind::MediaInfo));
        if !wrote_entry || fields.id().is_empty() {
            return false;
        }
        let known = match archive.load_ids() {
            Ok(ids) => ids.contains(fields.id()),
            Err(err) => {
                warn!(archive = %archive.path().display(), "could not read archive: {err:#}");
                false
            }
        };
        if known {
            debug!(id = fields.id(), "already archived");
            return false;
        }
        match archive.record(profile.archive_name(), fields.id()) {
            Ok(()) => true,
            Err(err) => {
                warn!(archive = %archive.path().display(), "could not update archive: {err:#}");
                false
            }
        }
    }
}
