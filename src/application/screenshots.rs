use crate::application::target::resolve_video_file;
use crate::domain::events::{image_events, sample_windows, text_events};
use crate::domain::media::{
    ItemOutcome, ScreenshotReport, ScreenshotResult, ScreenshotTarget, SubtitleChoice,
    SubtitleCodec, SubtitleEvent, SubtitlePacket, TimestampSource, VideoAsset,
};
use crate::domain::selection::{best_chinese_subtitle, first_available_subtitle};
use crate::domain::timeline::plan_targets;
use crate::error::{ExtractionError, ItemError, ResolveError, ScreenshotError};
use crate::ports::{FrameRenderer, ImageHost, ImageOptimizer, MediaProber};
use rand::Rng;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, error, info, warn};

const WORKSPACE_PREFIX: &str = "screenshots-";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScreenshotSettings {
    /// Screenshots per request
    pub count: usize,
    /// Parent directory for per-request workspaces; system temp dir when `None`
    pub scratch_dir: Option<PathBuf>,
}

impl Default for ScreenshotSettings {
    fn default() -> Self {
        Self {
            count: 5,
            scratch_dir: None,
        }
    }
}

/// Everything a request carries between stages. Dropping it removes the workspace.
#[derive(Debug)]
pub struct RequestContext {
    pub asset: VideoAsset,
    /// Renderer-local track burned into captures
    pub overlay_track: Option<u32>,
    pub targets: Vec<ScreenshotTarget>,
    pub source: TimestampSource,
    pub workspace: TempDir,
}

pub struct ScreenshotService<P, R, O, H> {
    prober: P,
    renderer: R,
    optimizer: O,
    host: H,
    settings: ScreenshotSettings,
}

impl<P, R, O, H> ScreenshotService<P, R, O, H>
where
    P: MediaProber,
    R: FrameRenderer,
    O: ImageOptimizer,
    H: ImageHost,
{
    pub fn new(prober: P, renderer: R, optimizer: O, host: H, settings: ScreenshotSettings) -> Self {
        Self {
            prober,
            renderer,
            optimizer,
            host,
            settings,
        }
    }

    /// Resolve `remote_path` to a video, then screenshot it.
    pub async fn take_screenshots<G>(
        &self,
        remote_path: &Path,
        content_name: Option<&str>,
        rng: &mut G,
    ) -> Result<ScreenshotReport, ScreenshotError>
    where
        G: Rng + Send + ?Sized,
    {
        let video = resolve(remote_path, content_name).await?;
        self.run(&video, rng).await
    }

    /// Screenshot an already resolved video file.
    pub async fn run<G>(&self, video: &Path, rng: &mut G) -> Result<ScreenshotReport, ScreenshotError>
    where
        G: Rng + Send + ?Sized,
    {
        let context = self.prepare(video, rng).await?;

        let mut results = Vec::with_capacity(context.targets.len());
        for target in &context.targets {
            let outcome = match self.process_item(&context, target).await {
                Ok(url) => ItemOutcome::Uploaded { url },
                Err(err) => {
                    error!(ordinal = target.ordinal, error = %err, "screenshot failed, skipping");
                    ItemOutcome::Failed {
                        reason: err.to_string(),
                    }
                }
            };
            results.push(ScreenshotResult {
                ordinal: target.ordinal,
                source_target: *target,
                outcome,
            });
        }

        let RequestContext {
            asset,
            source,
            workspace,
            ..
        } = context;
        if let Err(err) = workspace.close() {
            warn!(error = %err, "failed to remove screenshot workspace");
        }

        let report = ScreenshotReport {
            video: asset,
            source,
            results,
        };
        if report.uploaded_urls().is_empty() {
            return Err(ScreenshotError::BatchExhausted {
                attempted: report.results.len(),
            });
        }

        info!(summary = %report.summary(), "screenshots done");
        Ok(report)
    }

    /// Probe the video, pick subtitle tracks and capture instants, and open the workspace.
    pub async fn prepare<G>(&self, video: &Path, rng: &mut G) -> Result<RequestContext, ScreenshotError>
    where
        G: Rng + Send + ?Sized,
    {
        let duration = self.prober.duration(video).await?;
        let asset = VideoAsset::new(video, duration);

        let streams = match self.prober.subtitle_streams(video).await {
            Ok(streams) => streams,
            Err(err) => {
                warn!(error = %err, "subtitle probe failed, continuing without subtitles");
                Vec::new()
            }
        };

        let chinese = best_chinese_subtitle(&streams);
        let overlay_track = chinese.as_ref().map(|choice| choice.local_index);
        match &chinese {
            Some(choice) => info!(
                local_index = choice.local_index,
                global_index = choice.global_index,
                score = choice.score,
                "mounting chinese subtitle"
            ),
            None => info!("no chinese subtitle, captures will have no overlay"),
        }

        let events = match chinese.or_else(|| first_available_subtitle(&streams)) {
            Some(choice) => match self.extract_events(video, duration, &choice).await {
                Ok(events) => {
                    debug!(count = events.len(), "subtitle events extracted");
                    Some(events)
                }
                Err(err) => {
                    warn!(error = %err, "subtitle events unavailable, using fixed percentages");
                    None
                }
            },
            None => None,
        };

        let (targets, source) = plan_targets(events.as_deref(), duration, self.settings.count, rng);
        info!(?source, count = targets.len(), "screenshot instants planned");

        Ok(RequestContext {
            asset,
            overlay_track,
            targets,
            source,
            workspace: self.workspace().map_err(ScreenshotError::Workspace)?,
        })
    }

    async fn extract_events(
        &self,
        video: &Path,
        duration: f64,
        choice: &SubtitleChoice,
    ) -> Result<Vec<SubtitleEvent>, ExtractionError> {
        let extract: fn(&[SubtitlePacket]) -> Result<Vec<SubtitleEvent>, ExtractionError> =
            match &choice.codec {
                codec if codec.is_text() => text_events,
                SubtitleCodec::Pgs => image_events,
                other => return Err(ExtractionError::UnsupportedCodec(other.to_string())),
            };

        let packets = self
            .prober
            .subtitle_packets(video, choice.global_index, &sample_windows(duration))
            .await?;
        extract(&packets)
    }

    fn workspace(&self) -> io::Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKSPACE_PREFIX);
        match &self.settings.scratch_dir {
            Some(dir) => builder.tempdir_in(dir),
            None => builder.tempdir(),
        }
    }

    /// Capture, optimize, and upload one screenshot.
    async fn process_item(
        &self,
        context: &RequestContext,
        target: &ScreenshotTarget,
    ) -> Result<String, ItemError> {
        let file_name = target.file_name();
        let raw = context.workspace.path().join(format!("raw_{}", file_name));
        let optimized = context.workspace.path().join(&file_name);

        info!(
            ordinal = target.ordinal,
            time_point = target.time_point,
            "processing screenshot"
        );
        self.renderer
            .capture(
                &context.asset.path,
                target.time_point,
                context.overlay_track,
                &raw,
            )
            .await?;

        let image = self.optimizer.optimize(&raw, &optimized).await?;
        debug!(ordinal = target.ordinal, size = image.size, hdr = image.hdr, "screenshot optimized");

        Ok(self.host.upload(&optimized).await?)
    }
}

async fn resolve(remote_path: &Path, content_name: Option<&str>) -> Result<PathBuf, ResolveError> {
    let path = remote_path.to_path_buf();
    let content_name = content_name.map(str::to_owned);
    tokio::task::spawn_blocking(move || resolve_video_file(&path, content_name.as_deref()))
        .await
        .map_err(|err| ResolveError::Io {
            path: remote_path.to_path_buf(),
            source: io::Error::other(err),
        })?
}
