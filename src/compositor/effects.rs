//! Per-pixel visual effects
//!
//! Applied to the destination rectangle of each drawn source. Slowmo and
//! timelapse leave pixels alone; they scale frame timestamps downstream
//! in the recorder.

use serde::{Deserialize, Serialize};

use super::layout::Rect;

/// Selectable visual effect
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoEffect {
    #[default]
    None,
    Grayscale,
    Sepia,
    Vintage,
    Slowmo,
    Timelapse,
}

impl VideoEffect {
    /// Factor applied to output frame timestamps. Slowmo stretches time,
    /// timelapse compresses it; everything else is real-time.
    pub fn timestamp_scale(&self) -> f64 {
        match self {
            VideoEffect::Slowmo => 2.0,
            VideoEffect::Timelapse => 0.5,
            _ => 1.0,
        }
    }
}

/// Apply `effect` in place to the pixels of `rect` within an RGBA buffer
/// of `stride_px` pixels per row.
pub fn apply_in_place(data: &mut [u8], stride_px: u32, rect: Rect, effect: VideoEffect) {
    match effect {
        VideoEffect::None | VideoEffect::Slowmo | VideoEffect::Timelapse => {}
        VideoEffect::Grayscale => transform(data, stride_px, rect, |px| {
            let avg = ((px[0] as u32 + px[1] as u32 + px[2] as u32) / 3) as u8;
            [avg, avg, avg, px[3]]
        }),
        VideoEffect::Sepia => transform(data, stride_px, rect, |px| {
            let (r, g, b) = (px[0] as f32, px[1] as f32, px[2] as f32);
            [
                (r * 0.393 + g * 0.769 + b * 0.189).min(255.0) as u8,
                (r * 0.349 + g * 0.686 + b * 0.168).min(255.0) as u8,
                (r * 0.272 + g * 0.534 + b * 0.131).min(255.0) as u8,
                px[3],
            ]
        }),
        VideoEffect::Vintage => transform(data, stride_px, rect, |px| {
            [
                (px[0] as f32 * 1.2).min(255.0) as u8,
                px[1],
                (px[2] as f32 * 0.8) as u8,
                px[3],
            ]
        }),
    }
}

fn transform(data: &mut [u8], stride_px: u32, rect: Rect, f: impl Fn([u8; 4]) -> [u8; 4]) {
    for y in rect.y..rect.y + rect.height {
        for x in rect.x..rect.x + rect.width {
            let idx = ((y * stride_px + x) * 4) as usize;
            if idx + 4 > data.len() {
                continue;
            }
            let px = [data[idx], data[idx + 1], data[idx + 2], data[idx + 3]];
            let out = f(px);
            data[idx..idx + 4].copy_from_slice(&out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(w: u32, h: u32) -> Rect {
        Rect {
            x: 0,
            y: 0,
            width: w,
            height: h,
        }
    }

    #[test]
    fn test_grayscale_averages_channels() {
        let mut data = vec![30, 60, 90, 255];
        apply_in_place(&mut data, 1, rect(1, 1), VideoEffect::Grayscale);
        assert_eq!(data, vec![60, 60, 60, 255]);
    }

    #[test]
    fn test_sepia_clamps_at_255() {
        let mut data = vec![255, 255, 255, 255];
        apply_in_place(&mut data, 1, rect(1, 1), VideoEffect::Sepia);
        // Red and green rows sum past 1.0 and clamp; the blue row sums
        // to 0.937, so white maps to 255 * 0.937
        assert_eq!(data, vec![255, 255, 238, 255]);
    }

    #[test]
    fn test_sepia_known_values() {
        let mut data = vec![100, 100, 100, 255];
        apply_in_place(&mut data, 1, rect(1, 1), VideoEffect::Sepia);
        assert_eq!(data[0], 135); // (0.393 + 0.769 + 0.189) * 100
        assert_eq!(data[1], 120); // (0.349 + 0.686 + 0.168) * 100
        assert_eq!(data[2], 93); // (0.272 + 0.534 + 0.131) * 100
    }

    #[test]
    fn test_vintage_scales_red_and_blue() {
        let mut data = vec![100, 100, 100, 255];
        apply_in_place(&mut data, 1, rect(1, 1), VideoEffect::Vintage);
        assert_eq!(data, vec![120, 100, 80, 255]);

        let mut bright = vec![250, 0, 0, 255];
        apply_in_place(&mut bright, 1, rect(1, 1), VideoEffect::Vintage);
        assert_eq!(bright[0], 255); // saturates instead of wrapping
    }

    #[test]
    fn test_none_and_time_effects_leave_pixels() {
        for effect in [VideoEffect::None, VideoEffect::Slowmo, VideoEffect::Timelapse] {
            let mut data = vec![1, 2, 3, 4];
            apply_in_place(&mut data, 1, rect(1, 1), effect);
            assert_eq!(data, vec![1, 2, 3, 4]);
        }
    }

    #[test]
    fn test_effect_respects_rect_bounds() {
        // 2x1 buffer, effect only on the left pixel
        let mut data = vec![30, 60, 90, 255, 30, 60, 90, 255];
        apply_in_place(&mut data, 2, rect(1, 1), VideoEffect::Grayscale);
        assert_eq!(&data[0..4], &[60, 60, 60, 255]);
        assert_eq!(&data[4..8], &[30, 60, 90, 255]);
    }

    #[test]
    fn test_timestamp_scale() {
        assert_eq!(VideoEffect::Slowmo.timestamp_scale(), 2.0);
        assert_eq!(VideoEffect::Timelapse.timestamp_scale(), 0.5);
        assert_eq!(VideoEffect::Grayscale.timestamp_scale(), 1.0);
    }
}
