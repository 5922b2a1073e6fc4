// src/render/terminal.rs

use crossterm::style::{Color, Stylize};

use crate::envelope::Envelope;
use crate::render::{bar_color, RenderOptions, Rgb};
use crate::transport::PlaybackCursor;

fn to_term_color(c: Rgb) -> Color {
    Color::Rgb {
        r: c.r,
        g: c.g,
        b: c.b,
    }
}

/// Render the envelope as colored block-character rows, one column per
/// terminal cell, with the played portion in the accent color. Stands in for
/// the canvas the web front-end draws on.
pub fn render_rows(
    envelope: &Envelope,
    cursor: &PlaybackCursor,
    columns: usize,
    height: usize,
    opts: &RenderOptions,
) -> Vec<String> {
    let h = height.max(4);
    let cols = columns.max(1);
    let n = envelope.points.len();
    if n == 0 {
        return vec![String::new(); h];
    }
    let progress = cursor.progress_ratio() as f32;

    // Resample the envelope onto the terminal width.
    let mut amps = Vec::with_capacity(cols);
    let mut colors = Vec::with_capacity(cols);
    for col in 0..cols {
        let p = col as f32 / cols as f32;
        let idx = ((p * n as f32) as usize).min(n - 1);
        amps.push(envelope.points[idx]);
        colors.push(bar_color(p, progress, opts));
    }

    let center = (h as f32 - 1.0) / 2.0;
    let mut rows = Vec::with_capacity(h);
    for y in 0..h {
        let mut row = String::with_capacity(cols * 12);
        for col in 0..cols {
            let half = amps[col] * opts.height_scale * h as f32 / 2.0;
            let filled = (y as f32 - center).abs() <= half.max(0.5);
            if filled {
                row.push_str(&"█".with(to_term_color(colors[col])).to_string());
            } else {
                row.push(' ');
            }
        }
        rows.push(row);
    }
    rows
}

/// `m:ss` readout, as shown next to the waveform.
pub fn format_time(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{}:{:02}", total / 60, total % 60)
}
