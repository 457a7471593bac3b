//! Transcoding collaborator
//!
//! Post-processes a finished artifact through ffmpeg: trim, resize,
//! compression, watermark and effect filters. The collaborator is
//! behind a trait so engines can swap the implementation; the default
//! shells out to the system ffmpeg in a scratch directory.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

use super::ExportError;

const INPUT_NAME: &str = "input.webm";
const OUTPUT_NAME: &str = "output.mp4";

/// Keep `[start_secs, end_secs)` of the input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimWindow {
    pub start_secs: f64,
    pub end_secs: f64,
}

/// Target output dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resize {
    pub width: u32,
    pub height: u32,
}

/// Requested post-processing operations. All optional; an empty set of
/// options still re-encodes into the output container.
#[derive(Debug, Clone, Default)]
pub struct TranscodeOptions {
    pub trim: Option<TrimWindow>,
    pub resize: Option<Resize>,
    pub compress: bool,
    pub watermark: Option<String>,
    /// Extra ffmpeg video filter expressions, applied after resize and
    /// watermark in the given order
    pub filters: Vec<String>,
}

/// Async transcoding collaborator
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Transcode the input bytes, returning the re-encoded output
    async fn process(
        &self,
        input: &[u8],
        options: &TranscodeOptions,
    ) -> Result<Vec<u8>, ExportError>;
}

/// Default collaborator shelling out to the system ffmpeg
#[derive(Debug, Default)]
pub struct FfmpegTranscoder;

/// Build the ffmpeg argument list for one transcode.
///
/// Every video filter is folded into a single `-vf` chain; repeated
/// `-vf` flags would silently drop all but the last filter.
fn build_args(options: &TranscodeOptions) -> Vec<String> {
    let mut args = vec!["-i".to_string(), INPUT_NAME.to_string()];

    if let Some(trim) = &options.trim {
        args.push("-ss".to_string());
        args.push(trim.start_secs.to_string());
        args.push("-t".to_string());
        args.push((trim.end_secs - trim.start_secs).to_string());
    }

    let mut vf = Vec::new();
    if let Some(resize) = &options.resize {
        vf.push(format!("scale={}:{}", resize.width, resize.height));
    }
    if let Some(text) = &options.watermark {
        vf.push(format!(
            "drawtext=text='{text}':x=10:y=10:fontsize=24:fontcolor=white"
        ));
    }
    vf.extend(options.filters.iter().cloned());
    if !vf.is_empty() {
        args.push("-vf".to_string());
        args.push(vf.join(","));
    }

    if options.compress {
        args.push("-crf".to_string());
        args.push("23".to_string());
    }

    args.extend(
        [
            "-c:v",
            "libx264",
            "-preset",
            "medium",
            "-c:a",
            "aac",
            OUTPUT_NAME,
        ]
        .map(String::from),
    );
    args
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn process(
        &self,
        input: &[u8],
        options: &TranscodeOptions,
    ) -> Result<Vec<u8>, ExportError> {
        let scratch = tempfile::tempdir()?;
        tokio::fs::write(scratch.path().join(INPUT_NAME), input).await?;

        let args = build_args(options);
        tracing::info!(?args, "starting ffmpeg transcode");

        let output = Command::new("ffmpeg")
            .args(&args)
            .current_dir(scratch.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| ExportError::TranscodeFailed(format!("failed to start ffmpeg: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExportError::TranscodeFailed(format!(
                "ffmpeg exited with error: {stderr}"
            )));
        }

        let bytes = tokio::fs::read(scratch.path().join(OUTPUT_NAME)).await?;
        tracing::info!(bytes = bytes.len(), "transcode finished");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_reencode_only() {
        let args = build_args(&TranscodeOptions::default());
        assert_eq!(
            args,
            vec![
                "-i", "input.webm", "-c:v", "libx264", "-preset", "medium", "-c:a", "aac",
                "output.mp4"
            ]
        );
    }

    #[test]
    fn test_trim_maps_to_start_and_duration() {
        let options = TranscodeOptions {
            trim: Some(TrimWindow {
                start_secs: 2.0,
                end_secs: 7.5,
            }),
            ..Default::default()
        };
        let args = build_args(&options);
        let ss = args.iter().position(|a| a == "-ss").unwrap();
        assert_eq!(args[ss + 1], "2");
        assert_eq!(args[ss + 2], "-t");
        assert_eq!(args[ss + 3], "5.5");
    }

    #[test]
    fn test_filters_fold_into_one_vf_chain() {
        let options = TranscodeOptions {
            resize: Some(Resize {
                width: 1280,
                height: 720,
            }),
            watermark: Some("demo".to_string()),
            filters: vec!["hue=s=0".to_string()],
            ..Default::default()
        };
        let args = build_args(&options);
        assert_eq!(args.iter().filter(|a| *a == "-vf").count(), 1);
        let vf = args.iter().position(|a| a == "-vf").unwrap();
        assert_eq!(
            args[vf + 1],
            "scale=1280:720,drawtext=text='demo':x=10:y=10:fontsize=24:fontcolor=white,hue=s=0"
        );
    }

    #[test]
    fn test_compress_adds_crf() {
        let options = TranscodeOptions {
            compress: true,
            ..Default::default()
        };
        let args = build_args(&options);
        let crf = args.iter().position(|a| a == "-crf").unwrap();
        assert_eq!(args[crf + 1], "23");
    }
}
