//! Resolving a user-supplied path into the single video file to screenshot.
//!
//! A path may name a video directly, or a directory (season pack, disc rip, movie folder)
//! from which one file is chosen using the season/episode tag of the content name or of the
//! directory itself, falling back to the largest video.

use crate::error::ResolveError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

pub const VIDEO_EXTENSIONS: [&str; 8] = ["mkv", "mp4", "ts", "avi", "wmv", "mov", "flv", "m2ts"];

/// Largest files under this size are suspicious (samples, extras).
const SMALL_VIDEO_BYTES: u64 = 100 * 1024 * 1024;

static SEASON_EPISODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)S(\d{1,2})E(\d{1,3})").expect("season/episode regex should compile")
});

static SEASON_ONLY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)S(\d{1,2})").expect("season regex should compile"));

// S01E01-E02, S01E01E02, S01E01~03, S01E01-S01E02
static MULTI_EPISODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)S\d{1,2}E\d{1,3}\s*(?:[-~]\s*(?:S?\d{1,2})?E?\d{1,3}|E\d{1,3})")
        .expect("multi-episode regex should compile")
});

/// Season, and optionally episode, parsed from a release name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeTag {
    pub season: u32,
    pub episode: Option<u32>,
}

/// First `SxxEyy` tag in `text`, else the first `Sxx` tag.
pub fn episode_tag(text: &str) -> Option<EpisodeTag> {
    if let Some(caps) = SEASON_EPISODE.captures(text) {
        return Some(EpisodeTag {
            season: caps[1].parse().ok()?,
            episode: Some(caps[2].parse().ok()?),
        });
    }
    let caps = SEASON_ONLY.captures(text)?;
    Some(EpisodeTag {
        season: caps[1].parse().ok()?,
        episode: None,
    })
}

pub fn is_multi_episode(file_name: &str) -> bool {
    MULTI_EPISODE.is_match(file_name)
}

pub fn is_video(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            VIDEO_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

#[derive(Debug, Clone)]
struct VideoFile {
    path: PathBuf,
    size: u64,
}

#[derive(Debug)]
struct EpisodeCandidate<'a> {
    episode: u32,
    multi: bool,
    path: &'a Path,
}

/// Single-episode files first, then the lexicographically smallest path.
fn preferred<'c, 'p: 'c, I>(candidates: I) -> Option<PathBuf>
where
    I: Iterator<Item = &'c EpisodeCandidate<'p>>,
{
    candidates
        .min_by(|a, b| {
            a.multi
                .cmp(&b.multi)
                .then_with(|| a.path.as_os_str().cmp(b.path.as_os_str()))
        })
        .map(|candidate| candidate.path.to_path_buf())
}

fn pick_episode(files: &[VideoFile], target: EpisodeTag) -> Option<PathBuf> {
    let wanted = target.episode.unwrap_or(1);

    let candidates: Vec<EpisodeCandidate<'_>> = files
        .iter()
        .filter_map(|file| {
            let name = file.path.file_name()?.to_string_lossy();
            let tag = episode_tag(&name)?;
            let episode = tag.episode?;
            (tag.season == target.season).then(|| EpisodeCandidate {
                episode,
                multi: is_multi_episode(&name),
                path: &file.path,
            })
        })
        .collect();

    if let Some(path) = preferred(candidates.iter().filter(|c| c.episode == wanted)) {
        info!(path = %path.display(), "selected video by season/episode");
        return Some(path);
    }

    let first = candidates.iter().map(|c| c.episode).min()?;
    let path = preferred(candidates.iter().filter(|c| c.episode == first))?;
    warn!(
        season = target.season,
        episode = wanted,
        path = %path.display(),
        "episode not found, using the first episode of the season"
    );
    Some(path)
}

/// Largest file, smallest path among equals.
fn largest(files: &[VideoFile]) -> Option<&VideoFile> {
    files.iter().max_by(|a, b| {
        a.size
            .cmp(&b.size)
            .then_with(|| b.path.as_os_str().cmp(a.path.as_os_str()))
    })
}

fn collect_videos(root: &Path) -> Vec<VideoFile> {
    let mut videos = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "skipping unreadable entry");
                continue;
            }
        };
        if entry.file_type().is_dir() || !is_video(entry.path()) {
            continue;
        }
        match entry.metadata() {
            Ok(metadata) => videos.push(VideoFile {
                path: entry.into_path(),
                size: metadata.len(),
            }),
            Err(err) => warn!(path = %entry.path().display(), error = %err, "skipping video"),
        }
    }
    videos
}

/// Find the video to screenshot under `path`.
///
/// `content_name` is the release name the request is about; its season/episode tag picks
/// the episode out of a season directory.
pub fn resolve_video_file(path: &Path, content_name: Option<&str>) -> Result<PathBuf, ResolveError> {
    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(ResolveError::NotFound(path.to_path_buf()))
        }
        Err(source) => {
            return Err(ResolveError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    if !metadata.is_dir() {
        if is_video(path) {
            return Ok(path.to_path_buf());
        }
        return Err(ResolveError::NotVideo(path.to_path_buf()));
    }

    let files = collect_videos(path);
    match files.as_slice() {
        [] => return Err(ResolveError::NoVideoFiles(path.to_path_buf())),
        [only] => {
            info!(path = %only.path.display(), "single video found");
            return Ok(only.path.clone());
        }
        _ => {}
    }

    let tag = content_name
        .filter(|name| !name.is_empty())
        .and_then(episode_tag)
        .or_else(|| {
            path.file_name()
                .and_then(|name| episode_tag(&name.to_string_lossy()))
        });

    if let Some(tag) = tag.filter(|tag| tag.season > 0) {
        if let Some(path) = pick_episode(&files, tag) {
            return Ok(path);
        }
    }

    let biggest = largest(&files).ok_or_else(|| ResolveError::NoVideoFiles(path.to_path_buf()))?;
    if biggest.size < SMALL_VIDEO_BYTES {
        warn!(
            path = %biggest.path.display(),
            size = biggest.size,
            "largest video is under 100 MiB"
        );
    }
    info!(path = %biggest.path.display(), "selected largest video");
    Ok(biggest.path.clone())
}
