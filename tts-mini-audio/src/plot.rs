//! Waveform PNG: one amplitude trace over the buffer's full duration.

use crate::utils::{check_written, ensure_parent_dir};
use image::{ImageFormat, Rgb, RgbImage};
use std::path::{Path, PathBuf};
use tracing::info;
use tts_mini_core::audio::validate_audio;
use tts_mini_core::{Result, TtsError};

pub const PLOT_WIDTH: u32 = 1000;
pub const PLOT_HEIGHT: u32 = 300;

const MARGIN_LEFT: u32 = 50;
const MARGIN_RIGHT: u32 = 20;
const MARGIN_TOP: u32 = 20;
const MARGIN_BOTTOM: u32 = 40;
const TICK_LEN: u32 = 6;
const MAX_TICKS: f64 = 20.0;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([0, 0, 0]);
const GRID: Rgb<u8> = Rgb([225, 225, 225]);
const TRACE: Rgb<u8> = Rgb([0x1f, 0x77, 0xb4]);

/// Length of the buffer in seconds.
pub fn duration_secs(len: usize, sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }
    len as f64 / sample_rate as f64
}

/// Sample timestamps: `len` evenly spaced points on `[0, duration)`.
pub fn time_axis(len: usize, sample_rate: u32) -> Vec<f64> {
    if sample_rate == 0 {
        return Vec::new();
    }
    let rate = sample_rate as f64;
    (0..len).map(|i| i as f64 / rate).collect()
}

pub fn plot_waveform(
    samples: &[f32],
    sample_rate: u32,
    path: impl AsRef<Path>,
) -> Result<PathBuf> {
    validate_audio(samples, sample_rate)?;
    let path = path.as_ref();
    ensure_parent_dir(path)?;

    render(samples, sample_rate)
        .save_with_format(path, ImageFormat::Png)
        .map_err(|e| {
            TtsError::IoFailure(format!(
                "Failed to write waveform PNG at {}: {e}",
                path.display()
            ))
        })?;
    check_written(path, "waveform PNG")?;

    info!(
        target: "artifacts",
        path = %path.display(),
        duration_secs = duration_secs(samples.len(), sample_rate),
        "Wrote waveform"
    );
    Ok(path.to_path_buf())
}

struct Frame {
    left: u32,
    right: u32,
    top: u32,
    bottom: u32,
}

impl Frame {
    fn width(&self) -> u32 {
        self.right - self.left
    }

    fn mid(&self) -> u32 {
        (self.top + self.bottom) / 2
    }

    fn amplitude_to_y(&self, a: f32) -> u32 {
        let half = (self.bottom - self.top) as f32 / 2.0;
        let y = self.mid() as f32 - a.clamp(-1.0, 1.0) * half;
        (y.round() as u32).clamp(self.top, self.bottom - 1)
    }

    fn time_to_x(&self, t: f64, duration: f64) -> u32 {
        let x = self.left as f64 + (t / duration) * self.width() as f64;
        (x.round() as u32).min(self.right - 1)
    }
}

pub(crate) fn render(samples: &[f32], sample_rate: u32) -> RgbImage {
    let mut img = RgbImage::from_pixel(PLOT_WIDTH, PLOT_HEIGHT, BACKGROUND);
    let frame = Frame {
        left: MARGIN_LEFT,
        right: PLOT_WIDTH - MARGIN_RIGHT,
        top: MARGIN_TOP,
        bottom: PLOT_HEIGHT - MARGIN_BOTTOM,
    };

    let duration = duration_secs(samples.len(), sample_rate);
    if duration > 0.0 {
        // Whole-second ticks, thinned on long clips.
        let step = (duration / MAX_TICKS).ceil().max(1.0);
        let mut t = 0.0;
        while t <= duration {
            let x = frame.time_to_x(t, duration);
            vline(&mut img, x, frame.top, frame.bottom, GRID);
            vline(&mut img, x, frame.bottom, frame.bottom + TICK_LEN, AXIS);
            t += step;
        }
    }
    hline(&mut img, frame.left, frame.right, frame.mid(), GRID);

    // Min/max envelope per pixel column, overlapping the previous column by
    // one sample so sparse buffers draw as a connected line.
    if !samples.is_empty() {
        let n = samples.len();
        let w = frame.width() as usize;
        for col in 0..w {
            let start = col * n / w;
            if start >= n {
                break;
            }
            let end = ((col + 1) * n / w).clamp(start + 1, n);
            let (lo, hi) = samples[start.saturating_sub(1)..end]
                .iter()
                .fold((f32::MAX, f32::MIN), |(lo, hi), &s| (lo.min(s), hi.max(s)));
            let x = frame.left + col as u32;
            vline(
                &mut img,
                x,
                frame.amplitude_to_y(hi),
                frame.amplitude_to_y(lo) + 1,
                TRACE,
            );
        }
    }

    hline(&mut img, frame.left, frame.right, frame.bottom, AXIS);
    vline(&mut img, frame.left, frame.top, frame.bottom + 1, AXIS);
    img
}

fn vline(img: &mut RgbImage, x: u32, y0: u32, y1: u32, color: Rgb<u8>) {
    if x >= img.width() {
        return;
    }
    for y in y0..y1.min(img.height()) {
        img.put_pixel(x, y, color);
    }
}

fn hline(img: &mut RgbImage, x0: u32, x1: u32, y: u32, color: Rgb<u8>) {
    if y >= img.height() {
        return;
    }
    for x in x0..x1.min(img.width()) {
        img.put_pixel(x, y, color);
    }
}
