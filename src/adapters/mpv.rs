use super::cmd::CommandRunner;
use crate::error::CaptureError;
use crate::ports::FrameRenderer;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub const CAPTURE_TIMEOUT: Duration = Duration::from_secs(600);

/// Font used for burned-in subtitles. Must cover CJK glyphs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleFont {
    pub family: String,
    pub size: u32,
}

impl Default for SubtitleFont {
    fn default() -> Self {
        Self {
            family: "Noto Sans CJK SC".to_string(),
            size: 52,
        }
    }
}

/// [`FrameRenderer`] that asks `mpv` for a single full-depth PNG frame.
#[derive(Debug, Clone)]
pub struct MpvRenderer<C> {
    runner: C,
    program: String,
    font: SubtitleFont,
    timeout: Duration,
}

impl<C: CommandRunner> MpvRenderer<C> {
    pub fn new(runner: C, program: impl Into<String>, font: SubtitleFont) -> Self {
        Self {
            runner,
            program: program.into(),
            font,
            timeout: CAPTURE_TIMEOUT,
        }
    }

    fn capture_args(
        &self,
        video: &Path,
        time_point: f64,
        subtitle_track: Option<u32>,
        output: &Path,
    ) -> Vec<String> {
        let mut args = vec![
            "--no-audio".to_string(),
            format!("--start={:.2}", time_point),
            "--frames=1".to_string(),
            "--screenshot-high-bit-depth=yes".to_string(),
            "--screenshot-png-compression=0".to_string(),
            "--screenshot-tag-colorspace=yes".to_string(),
        ];

        match subtitle_track {
            Some(track) => {
                args.push(format!("--sid={}", track));
                args.push("--sub-visibility=yes".to_string());
            }
            None => args.push("--sid=no".to_string()),
        }

        args.extend([
            "--sub-font-provider=fontconfig".to_string(),
            format!("--sub-font={}", self.font.family),
            format!("--sub-font-size={}", self.font.size),
            format!("--o={}", output.display()),
            video.to_string_lossy().into_owned(),
        ]);
        args
    }
}

#[async_trait]
impl<C: CommandRunner> FrameRenderer for MpvRenderer<C> {
    async fn capture(
        &self,
        video: &Path,
        time_point: f64,
        subtitle_track: Option<u32>,
        output: &Path,
    ) -> Result<(), CaptureError> {
        info!(
            time_point,
            ?subtitle_track,
            output = %output.display(),
            "capturing frame"
        );

        let args = self.capture_args(video, time_point, subtitle_track, output);
        self.runner.run(&self.program, &args, self.timeout).await?;

        // mpv exits cleanly on some seek failures without writing anything.
        if !tokio::fs::try_exists(output).await.unwrap_or(false) {
            return Err(CaptureError::MissingOutput(output.to_path_buf()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::cmd::{MockCommandRunner, ToolOutput};
    use tempfile::TempDir;

    fn renderer(runner: MockCommandRunner) -> MpvRenderer<MockCommandRunner> {
        MpvRenderer::new(runner, "mpv", SubtitleFont::default())
    }

    #[test]
    fn test_args_with_subtitle_overlay() {
        let args = renderer(MockCommandRunner::new()).capture_args(
            Path::new("/media/show.mkv"),
            1234.567,
            Some(2),
            Path::new("/tmp/raw_s1_00h20m34s.png"),
        );

        assert_eq!(
            args,
            vec![
                "--no-audio",
                "--start=1234.57",
                "--frames=1",
                "--screenshot-high-bit-depth=yes",
                "--screenshot-png-compression=0",
                "--screenshot-tag-colorspace=yes",
                "--sid=2",
                "--sub-visibility=yes",
                "--sub-font-provider=fontconfig",
                "--sub-font=Noto Sans CJK SC",
                "--sub-font-size=52",
                "--o=/tmp/raw_s1_00h20m34s.png",
                "/media/show.mkv",
            ]
        );
    }

    #[test]
    fn test_args_without_subtitles() {
        let args = renderer(MockCommandRunner::new()).capture_args(
            Path::new("/media/show.mkv"),
            10.0,
            None,
            Path::new("/tmp/out.png"),
        );
        assert!(args.contains(&"--sid=no".to_string()));
        assert!(!args.iter().any(|a| a == "--sub-visibility=yes"));
    }

    #[tokio::test]
    async fn test_capture_writes_output() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("raw.png");

        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(|program, _, timeout| program == "mpv" && *timeout == CAPTURE_TIMEOUT)
            .times(1)
            .returning(|_, args, _| {
                let out = args
                    .iter()
                    .find_map(|a| a.strip_prefix("--o="))
                    .unwrap()
                    .to_string();
                std::fs::write(out, b"png").unwrap();
                Ok(ToolOutput::default())
            });

        renderer(runner)
            .capture(Path::new("/media/show.mkv"), 60.0, None, &output)
            .await
            .unwrap();
        assert!(output.exists());
    }

    #[tokio::test]
    async fn test_capture_without_file_fails() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("raw.png");

        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .returning(|_, _, _| Ok(ToolOutput::default()));

        let err = renderer(runner)
            .capture(Path::new("/media/show.mkv"), 60.0, Some(1), &output)
            .await
            .unwrap_err();
        assert!(matches!(err, CaptureError::MissingOutput(path) if path == output));
    }
}
