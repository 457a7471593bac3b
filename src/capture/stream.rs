//! Live media stream

use super::device::TrackSettings;
use super::track::{AudioTrack, VideoTrack};

/// One negotiated capture stream: a video track, an audio track and the
/// settings the device actually granted.
pub struct MediaStream {
    video: VideoTrack,
    audio: AudioTrack,
    settings: TrackSettings,
}

impl MediaStream {
    pub fn new(video: VideoTrack, audio: AudioTrack, settings: TrackSettings) -> Self {
        Self {
            video,
            audio,
            settings,
        }
    }

    pub fn video(&self) -> &VideoTrack {
        &self.video
    }

    pub fn audio(&self) -> &AudioTrack {
        &self.audio
    }

    pub fn settings(&self) -> &TrackSettings {
        &self.settings
    }

    /// Release the underlying device capture for every track.
    /// Safe to call more than once; the hardware stop happens exactly once.
    pub fn stop_tracks(&self) {
        self.video.stop();
        self.audio.hub().stop();
    }
}
