//! Configuration loaded from the environment (and `.env`, when present).

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Paths of the external media tools and the subtitle font they render with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolsConfig {
    pub ffprobe: String,
    pub ffmpeg: String,
    pub mpv: String,
    /// Font family for burned-in subtitles (needs CJK coverage)
    pub subtitle_font: String,
    pub subtitle_font_size: u32,
}

/// Image host endpoint and retry policy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixhostConfig {
    pub endpoint: String,
    /// Total attempts per image, including the first
    pub attempts: u32,
    /// Base delay; attempt `n` waits `n * retry_delay` before the next one
    pub retry_delay: Duration,
    /// Per-request timeout
    pub timeout: Duration,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceConfig {
    /// HTTP server bind address
    pub addr: String,
    /// HTTP server port
    pub port: String,
    /// Screenshots per request
    pub screenshot_count: usize,
    /// Parent of the per-request scratch directories; system temp when unset
    pub scratch_dir: Option<PathBuf>,
    pub tools: ToolsConfig,
    pub pixhost: PixhostConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            addr: String::from("0.0.0.0"),
            port: String::from("9090"),
            screenshot_count: 5,
            scratch_dir: None,
            tools: ToolsConfig {
                ffprobe: String::from("ffprobe"),
                ffmpeg: String::from("ffmpeg"),
                mpv: String::from("mpv"),
                subtitle_font: String::from("Noto Sans CJK SC"),
                subtitle_font_size: 52,
            },
            pixhost: PixhostConfig {
                endpoint: String::from("https://api.pixhost.to/images"),
                attempts: 3,
                retry_delay: Duration::from_secs(2),
                timeout: Duration::from_secs(180),
            },
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Missing or unparseable values keep their default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let string = |key: &str, default: String| lookup(key).unwrap_or(default);

        Self {
            addr: string("ADDR", defaults.addr),
            port: string("PORT", defaults.port),
            screenshot_count: parsed(&lookup, "SCREENSHOT_COUNT", defaults.screenshot_count).max(1),
            scratch_dir: lookup("SCRATCH_DIR")
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from),
            tools: ToolsConfig {
                ffprobe: string("FFPROBE_BIN", defaults.tools.ffprobe),
                ffmpeg: string("FFMPEG_BIN", defaults.tools.ffmpeg),
                mpv: string("MPV_BIN", defaults.tools.mpv),
                subtitle_font: string("SUBTITLE_FONT", defaults.tools.subtitle_font),
                subtitle_font_size: parsed(
                    &lookup,
                    "SUBTITLE_FONT_SIZE",
                    defaults.tools.subtitle_font_size,
                ),
            },
            pixhost: PixhostConfig {
                endpoint: string("PIXHOST_ENDPOINT", defaults.pixhost.endpoint),
                attempts: parsed(&lookup, "UPLOAD_ATTEMPTS", defaults.pixhost.attempts).max(1),
                retry_delay: Duration::from_secs(parsed(
                    &lookup,
                    "UPLOAD_RETRY_DELAY_SECS",
                    defaults.pixhost.retry_delay.as_secs(),
                )),
                timeout: Duration::from_secs(parsed(
                    &lookup,
                    "UPLOAD_TIMEOUT_SECS",
                    defaults.pixhost.timeout.as_secs(),
                )),
            },
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.addr, self.port)
    }
}

fn parsed<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "ignoring unparseable setting");
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> ServiceConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.bind_address(), "0.0.0.0:9090");
        assert_eq!(config.screenshot_count, 5);
        assert_eq!(config.pixhost.retry_delay, Duration::from_secs(2));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("SCREENSHOT_COUNT", "3"),
            ("MPV_BIN", "/opt/mpv/bin/mpv"),
            ("UPLOAD_ATTEMPTS", "5"),
            ("SCRATCH_DIR", "/var/tmp/shots"),
        ]);
        assert_eq!(config.port, "8080");
        assert_eq!(config.screenshot_count, 3);
        assert_eq!(config.tools.mpv, "/opt/mpv/bin/mpv");
        assert_eq!(config.pixhost.attempts, 5);
        assert_eq!(config.scratch_dir, Some(PathBuf::from("/var/tmp/shots")));
    }

    #[test]
    fn test_bad_numbers_keep_defaults() {
        let config = config_from(&[
            ("SCREENSHOT_COUNT", "five"),
            ("SUBTITLE_FONT_SIZE", "-1"),
            ("UPLOAD_ATTEMPTS", "0"),
        ]);
        assert_eq!(config.screenshot_count, 5);
        assert_eq!(config.tools.subtitle_font_size, 52);
        assert_eq!(config.pixhost.attempts, 1);

        let config = config_from(&[("SCREENSHOT_COUNT", "0")]);
        assert_eq!(config.screenshot_count, 1);
    }
}
