//! Chunk packaging
//!
//! Encodes composed frames and drained audio into opaque timed chunks,
//! and concatenates chunks into the final artifact. Chunk data is a
//! packet stream: `V` packets carry a PNG-compressed frame with a scaled
//! timestamp, `A` packets carry little-endian PCM for one audio track.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::session::RecordingError;
use super::state::RecordingType;
use crate::capture::VideoFrame;

/// One timed segment of encoded recording data
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Position in capture order, starting at 0
    pub sequence: u64,
    /// Session-relative timestamp of emission (paused time excluded)
    pub timestamp_ms: f64,
    /// Opaque encoded payload
    pub data: Vec<u8>,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// The final deliverable of a session: the ordered concatenation of
/// every captured chunk, never reordered or deduplicated.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub data: Vec<u8>,
    pub mime_type: String,
    pub recording_type: RecordingType,
    pub created_at: DateTime<Utc>,
    pub duration_ms: f64,
    pub chunk_count: usize,
}

impl Artifact {
    /// Concatenate chunks in capture order
    pub fn from_chunks(
        chunks: Vec<Chunk>,
        mime_type: String,
        recording_type: RecordingType,
        duration_ms: f64,
    ) -> Self {
        let chunk_count = chunks.len();
        let total: usize = chunks.iter().map(Chunk::len).sum();
        let mut data = Vec::with_capacity(total);
        for chunk in &chunks {
            data.extend_from_slice(&chunk.data);
        }
        Self {
            data,
            mime_type,
            recording_type,
            created_at: Utc::now(),
            duration_ms,
            chunk_count,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Accumulates frames between chunk ticks and packs them, together with
/// drained audio, into one chunk per interval.
pub(crate) struct ChunkEncoder {
    sequence: u64,
    timestamp_scale: f64,
    pending_frames: Vec<Arc<VideoFrame>>,
}

impl ChunkEncoder {
    pub fn new(timestamp_scale: f64) -> Self {
        Self {
            sequence: 0,
            timestamp_scale,
            pending_frames: Vec::new(),
        }
    }

    pub fn push_frame(&mut self, frame: Arc<VideoFrame>) {
        self.pending_frames.push(frame);
    }

    /// Pack pending frames and the given per-track audio into one chunk.
    /// Returns None when there is nothing to emit.
    pub fn take_chunk(
        &mut self,
        audio: &[(usize, Vec<i16>)],
        timestamp_ms: f64,
    ) -> Result<Option<Chunk>, RecordingError> {
        let has_audio = audio.iter().any(|(_, samples)| !samples.is_empty());
        if self.pending_frames.is_empty() && !has_audio {
            return Ok(None);
        }

        let mut data = Vec::new();
        for frame in self.pending_frames.drain(..) {
            let png = encode_png(&frame)?;
            let scaled_ts = (frame.timestamp_ms * self.timestamp_scale) as u64;
            data.push(b'V');
            data.extend_from_slice(&scaled_ts.to_le_bytes());
            data.extend_from_slice(&(png.len() as u32).to_le_bytes());
            data.extend_from_slice(&png);
        }

        for (track_index, samples) in audio {
            if samples.is_empty() {
                continue;
            }
            data.push(b'A');
            data.push(*track_index as u8);
            data.extend_from_slice(&((samples.len() * 2) as u32).to_le_bytes());
            for sample in samples {
                data.extend_from_slice(&sample.to_le_bytes());
            }
        }

        let sequence = self.sequence;
        self.sequence += 1;
        Ok(Some(Chunk {
            sequence,
            timestamp_ms,
            data,
        }))
    }
}

fn encode_png(frame: &VideoFrame) -> Result<Vec<u8>, RecordingError> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, frame.width, frame.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder
            .write_header()
            .map_err(|e| RecordingError::Encoding(e.to_string()))?;
        writer
            .write_image_data(&frame.data)
            .map_err(|e| RecordingError::Encoding(e.to_string()))?;
        writer
            .finish()
            .map_err(|e| RecordingError::Encoding(e.to_string()))?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_chunk_empty_is_none() {
        let mut encoder = ChunkEncoder::new(1.0);
        assert!(encoder.take_chunk(&[], 0.0).unwrap().is_none());
    }

    #[test]
    fn test_chunk_sequence_increments() {
        let mut encoder = ChunkEncoder::new(1.0);
        let a = encoder
            .take_chunk(&[(0, vec![1, 2])], 10.0)
            .unwrap()
            .unwrap();
        let b = encoder
            .take_chunk(&[(0, vec![3, 4])], 20.0)
            .unwrap()
            .unwrap();
        assert_eq!(a.sequence, 0);
        assert_eq!(b.sequence, 1);
    }

    #[test]
    fn test_video_packet_timestamp_scaling() {
        let mut encoder = ChunkEncoder::new(2.0);
        encoder.push_frame(Arc::new(VideoFrame::filled(2, 2, [0, 0, 0, 255], 100.0)));
        let chunk = encoder.take_chunk(&[], 0.0).unwrap().unwrap();

        assert_eq!(chunk.data[0], b'V');
        let ts = u64::from_le_bytes(chunk.data[1..9].try_into().unwrap());
        assert_eq!(ts, 200); // slowmo stretches timestamps
    }

    #[test]
    fn test_audio_packet_layout() {
        let mut encoder = ChunkEncoder::new(1.0);
        let chunk = encoder
            .take_chunk(&[(3, vec![0x0102, -1])], 0.0)
            .unwrap()
            .unwrap();

        assert_eq!(chunk.data[0], b'A');
        assert_eq!(chunk.data[1], 3);
        let len = u32::from_le_bytes(chunk.data[2..6].try_into().unwrap());
        assert_eq!(len, 4);
        assert_eq!(&chunk.data[6..10], &[0x02, 0x01, 0xFF, 0xFF]);
    }

    #[test]
    fn test_artifact_concatenation_is_lossless_and_ordered() {
        let chunks = vec![
            Chunk {
                sequence: 0,
                timestamp_ms: 0.0,
                data: vec![1; 1000],
            },
            Chunk {
                sequence: 1,
                timestamp_ms: 1000.0,
                data: vec![2; 1500],
            },
            Chunk {
                sequence: 2,
                timestamp_ms: 2000.0,
                data: vec![3; 1200],
            },
        ];
        let artifact = Artifact::from_chunks(
            chunks,
            "video/webm".to_string(),
            RecordingType::Camera,
            3000.0,
        );

        assert_eq!(artifact.len(), 3700);
        assert_eq!(artifact.chunk_count, 3);
        assert_eq!(artifact.data[0], 1);
        assert_eq!(artifact.data[999], 1);
        assert_eq!(artifact.data[1000], 2);
        assert_eq!(artifact.data[2500], 3);
    }
}
