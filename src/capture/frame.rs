//! Video frame representation

/// One decoded video frame (RGBA, 4 bytes per pixel, row-major)
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFrame {
    /// Raw pixel data (RGBA format)
    pub data: Vec<u8>,

    /// Frame width in pixels
    pub width: u32,

    /// Frame height in pixels
    pub height: u32,

    /// Timestamp in milliseconds since the producing source started
    pub timestamp_ms: f64,
}

impl VideoFrame {
    /// Create a frame filled with a single RGBA color
    pub fn filled(width: u32, height: u32, rgba: [u8; 4], timestamp_ms: f64) -> Self {
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..(width * height) {
            data.extend_from_slice(&rgba);
        }
        Self {
            data,
            width,
            height,
            timestamp_ms,
        }
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

    /// Total size of the pixel buffer in bytes
    pub fn len_bytes(&self) -> usize {
        self.data.len()
    }
}
