// src/render/mod.rs

pub mod terminal;

use crate::envelope::Envelope;
use crate::transport::PlaybackCursor;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Linear interpolation from `self` (t = 0) to `other` (t = 1).
    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgb::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }
}

#[derive(Clone, Debug)]
pub struct RenderOptions {
    /// Color of the already-played portion (the app's orange accent).
    pub played: Rgb,
    /// Muted color of the unplayed portion.
    pub unplayed: Rgb,
    /// Width, as a fraction of the track, of the color fade that softens the
    /// playhead edge.
    pub transition_width: f32,
    /// Bars fill this fraction of the container height at full amplitude.
    pub height_scale: f32,
    /// Logical-pixel gap between adjacent bars.
    pub bar_gap: f32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            played: Rgb::new(255, 85, 0),
            unplayed: Rgb::new(94, 94, 102),
            transition_width: 0.02,
            height_scale: 0.8,
            bar_gap: 0.5,
        }
    }
}

/// Container dimensions in logical pixels plus the device pixel ratio, so
/// bar geometry comes out crisp on high-DPI displays.
#[derive(Clone, Copy, Debug)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub device_pixel_ratio: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio: 1.0,
        }
    }

    pub fn with_dpr(width: f32, height: f32, device_pixel_ratio: f32) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio,
        }
    }
}

/// One bar of the chart, in physical pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bar {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub color: Rgb,
}

/// Color of the bar at normalized horizontal position `p`.
pub fn bar_color(p: f32, progress: f32, opts: &RenderOptions) -> Rgb {
    if p < progress {
        opts.played
    } else if p < progress + opts.transition_width {
        let fade = 1.0 - (p - progress) / opts.transition_width;
        opts.unplayed.lerp(opts.played, fade)
    } else {
        opts.unplayed
    }
}

/// Compute the full bar chart for one frame.
///
/// A pure function of (envelope, cursor, viewport): redrawing on every
/// position change is idempotent and has no side effects beyond painting.
pub fn layout_bars(
    envelope: &Envelope,
    cursor: &PlaybackCursor,
    viewport: &Viewport,
    opts: &RenderOptions,
) -> Vec<Bar> {
    let n = envelope.points.len();
    if n == 0 || viewport.width <= 0.0 || viewport.height <= 0.0 {
        return Vec::new();
    }

    let dpr = if viewport.device_pixel_ratio > 0.0 {
        viewport.device_pixel_ratio
    } else {
        1.0
    };
    let progress = cursor.progress_ratio() as f32;
    let bar_width = viewport.width / n as f32;
    let center_y = viewport.height / 2.0;

    envelope
        .points
        .iter()
        .enumerate()
        .map(|(i, &amplitude)| {
            let p = i as f32 / n as f32;
            let height = amplitude * opts.height_scale * viewport.height;
            let x = i as f32 * bar_width + opts.bar_gap / 2.0;
            Bar {
                x: x * dpr,
                y: (center_y - height / 2.0) * dpr,
                width: (bar_width - opts.bar_gap).max(0.0) * dpr,
                height: height * dpr,
                color: bar_color(p, progress, opts),
            }
        })
        .collect()
}

/// Map a pointer click at pixel offset `x` within a container of width
/// `width` to a seek time in seconds.
pub fn seek_time(x: f32, width: f32, duration: f64) -> f64 {
    if width <= 0.0 {
        return 0.0;
    }
    (x / width).clamp(0.0, 1.0) as f64 * duration
}
