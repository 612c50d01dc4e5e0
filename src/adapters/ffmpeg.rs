//! ffmpeg media assembler.
//!
//! Spawns `ffmpeg` to loop a still image over an audio track. `-shortest`
//! ends the endless image stream when the audio ends, so the video is as
//! long as the audio.

use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::{EncodingError, MediaAssembler};

/// Media assembler backed by the `ffmpeg` CLI
pub struct FfmpegAssembler {
    /// Path to the ffmpeg binary (default: "ffmpeg")
    binary_path: String,
}

impl Default for FfmpegAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegAssembler {
    /// Create an assembler using `ffmpeg` from PATH
    pub fn new() -> Self {
        Self::with_binary_path("ffmpeg")
    }

    /// Create an assembler with a custom binary path
    pub fn with_binary_path(binary_path: impl Into<String>) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    /// Full argument list for one encode
    pub fn build_args(image: &Path, audio: &str, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "-hide_banner",
            "-loglevel",
            "error",
            "-y",
            "-loop",
            "1",
            "-i",
        ]
        .iter()
        .map(OsString::from)
        .collect();
        args.push(image.as_os_str().to_owned());
        args.push("-i".into());
        args.push(audio.into());
        args.extend(
            [
                "-map",
                "0:v:0",
                "-map",
                "1:a:0",
                "-c:v",
                "libx264",
                "-tune",
                "stillimage",
                "-pix_fmt",
                "yuv420p",
                // yuv420p needs even dimensions
                "-vf",
                "scale=trunc(iw/2)*2:trunc(ih/2)*2",
                "-c:a",
                "aac",
                "-b:a",
                "192k",
                "-shortest",
                "-movflags",
                "+faststart",
            ]
            .iter()
            .map(OsString::from),
        );
        args.push(output.as_os_str().to_owned());
        args
    }

    async fn remove_partial(output: &Path) {
        match tokio::fs::remove_file(output).await {
            Ok(()) => debug!(path = %output.display(), "Removed partial output"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %output.display(), error = %e, "Failed to remove partial output"),
        }
    }
}

#[async_trait]
impl MediaAssembler for FfmpegAssembler {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn assemble(
        &self,
        image: &Path,
        audio: &str,
        output: &Path,
    ) -> Result<(), EncodingError> {
        let args = Self::build_args(image, audio, output);
        debug!(binary = %self.binary_path, ?args, "Running ffmpeg");

        let result = Command::new(&self.binary_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output_status = match result {
            Ok(out) => out,
            Err(source) => {
                Self::remove_partial(output).await;
                return Err(EncodingError::Spawn {
                    binary: self.binary_path.clone(),
                    source,
                });
            }
        };

        if !output_status.status.success() {
            Self::remove_partial(output).await;
            let stderr = String::from_utf8_lossy(&output_status.stderr);
            return Err(EncodingError::Failed {
                binary: self.binary_path.clone(),
                code: output_status.status.code().unwrap_or(-1),
                stderr: stderr.trim().to_string(),
            });
        }

        let size = tokio::fs::metadata(output)
            .await
            .map(|m| m.len())
            .unwrap_or(0);
        if size == 0 {
            Self::remove_partial(output).await;
            return Err(EncodingError::MissingOutput {
                binary: self.binary_path.clone(),
                output: output.to_path_buf(),
            });
        }

        info!(path = %output.display(), size_bytes = size, "Video assembled");
        Ok(())
    }
}
