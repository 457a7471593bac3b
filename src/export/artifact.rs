//! Artifact persistence
//!
//! Writes finished artifacts and their SRT sidecars to disk.

use std::path::{Path, PathBuf};

use super::ExportError;
use crate::captions::CaptionSet;
use crate::recorder::Artifact;

impl Artifact {
    /// Download-style file name: `recording-{type}-{unix_ms}.webm`
    pub fn file_name(&self) -> String {
        format!(
            "recording-{}-{}.webm",
            self.recording_type,
            self.created_at.timestamp_millis()
        )
    }

    /// Write the artifact into `dir`, returning the file path
    pub async fn save_to(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        let path = dir.join(self.file_name());
        tokio::fs::write(&path, &self.data).await?;
        tracing::info!(path = %path.display(), bytes = self.len(), "artifact saved");
        Ok(path)
    }
}

/// Write the captions next to the artifact as `<artifact stem>.srt`
pub async fn save_srt_sidecar(
    dir: &Path,
    artifact: &Artifact,
    captions: &CaptionSet,
) -> Result<PathBuf, ExportError> {
    let mut path = dir.join(artifact.file_name());
    path.set_extension("srt");
    tokio::fs::write(&path, captions.to_srt()).await?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::captions::Caption;
    use crate::recorder::{Chunk, RecordingType};

    fn artifact() -> Artifact {
        Artifact::from_chunks(
            vec![Chunk {
                sequence: 0,
                timestamp_ms: 0.0,
                data: vec![7; 64],
            }],
            "video/webm".to_string(),
            RecordingType::Screen,
            1000.0,
        )
    }

    #[test]
    fn test_file_name_pattern() {
        let artifact = artifact();
        let name = artifact.file_name();
        assert!(name.starts_with("recording-screen-"));
        assert!(name.ends_with(".webm"));
        let stamp = &name["recording-screen-".len()..name.len() - ".webm".len()];
        assert!(stamp.parse::<i64>().is_ok());
    }

    #[tokio::test]
    async fn test_save_to_writes_artifact_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = artifact();

        let path = artifact.save_to(dir.path()).await.unwrap();
        let written = tokio::fs::read(&path).await.unwrap();
        assert_eq!(written, artifact.data);
    }

    #[tokio::test]
    async fn test_srt_sidecar_shares_the_artifact_stem() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = artifact();
        let captions = CaptionSet::new(vec![Caption {
            id: "caption-0".to_string(),
            start_ms: 0,
            end_ms: 900,
            text: "hello".to_string(),
            confidence: None,
        }]);

        let srt_path = save_srt_sidecar(dir.path(), &artifact, &captions)
            .await
            .unwrap();
        assert_eq!(srt_path.extension().unwrap(), "srt");
        assert_eq!(
            srt_path.file_stem().unwrap().to_str().unwrap(),
            artifact.file_name().trim_end_matches(".webm")
        );
        let contents = tokio::fs::read_to_string(&srt_path).await.unwrap();
        assert!(contents.contains("hello"));
    }
}
