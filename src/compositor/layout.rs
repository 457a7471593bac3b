//! Composition layout rules
//!
//! A single active source fills the whole surface; two or more share a
//! 2x2 quadrant split in source-list order (top-left, top-right,
//! bottom-left, bottom-right). At most four sources are drawn.

/// Axis-aligned destination rectangle on the render surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Maximum number of sources visible in a composition. Sources beyond
/// this are silently dropped from the picture (their audio still records).
pub const MAX_DRAWN_SOURCES: usize = 4;

/// Destination rectangle for the source at `index` among `active_count`
/// active sources. None for indices past the visible limit.
pub fn dest_rect(index: usize, active_count: usize, surface_w: u32, surface_h: u32) -> Option<Rect> {
    if index >= MAX_DRAWN_SOURCES {
        return None;
    }

    if active_count <= 1 {
        return Some(Rect {
            x: 0,
            y: 0,
            width: surface_w,
            height: surface_h,
        });
    }

    let width = surface_w / 2;
    let height = surface_h / 2;
    let x = if index % 2 == 1 { width } else { 0 };
    let y = if index > 1 { height } else { 0 };
    Some(Rect {
        x,
        y,
        width,
        height,
    })
}
