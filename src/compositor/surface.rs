//! Render surface
//!
//! Fixed-resolution RGBA target the compositor draws into. Handed to the
//! compositor at construction; never looked up by name.

use super::layout::Rect;
use crate::capture::VideoFrame;

/// Owned RGBA pixel buffer of fixed dimensions
pub struct Surface {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; (width * height * 4) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Zero every pixel (transparent black)
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Draw `frame` scaled into `dest` with nearest-neighbor sampling.
    ///
    /// A frame whose buffer is shorter than its stated dimensions is
    /// skipped; frame fields are public and producers are not trusted.
    pub fn draw_scaled(&mut self, frame: &VideoFrame, dest: Rect) {
        if frame.width == 0 || frame.height == 0 || dest.width == 0 || dest.height == 0 {
            return;
        }
        if frame.data.len() < frame.width as usize * frame.height as usize * 4 {
            return;
        }
        for dy in 0..dest.height {
            let sy = (dy as u64 * frame.height as u64 / dest.height as u64) as u32;
            let out_y = dest.y + dy;
            if out_y >= self.height {
                break;
            }
            for dx in 0..dest.width {
                let sx = (dx as u64 * frame.width as u64 / dest.width as u64) as u32;
                let out_x = dest.x + dx;
                if out_x >= self.width {
                    break;
                }
                let src = ((sy * frame.width + sx) * 4) as usize;
                let dst = ((out_y * self.width + out_x) * 4) as usize;
                self.data[dst..dst + 4].copy_from_slice(&frame.data[src..src + 4]);
            }
        }
    }

    /// Mutable access to the raw pixel buffer (for effect passes)
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Read the RGBA value at (x, y)
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = ((y * self.width + x) * 4) as usize;
        [
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]
    }

    /// Snapshot the surface contents as a frame
    pub fn to_frame(&self, timestamp_ms: f64) -> VideoFrame {
        VideoFrame {
            data: self.data.clone(),
            width: self.width,
            height: self.height,
            timestamp_ms,
        }
    }
}
