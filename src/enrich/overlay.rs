//! Burned-in coordinate overlay.
//!
//! The text is rasterised into a coverage mask, softened with a small
//! gaussian for anti-aliasing, and composited white over a wider, offset,
//! black shadow so it stays legible on any background.

use chrono::{DateTime, Local};
use image::{imageops, GrayImage, Luma, Rgb, RgbImage};

use crate::config::OverlayConfig;
use crate::location::LocationFix;

use super::font::{self, GLYPH_HEIGHT, LINE_ADVANCE};

const SHADOW_OPACITY: f32 = 0.8;

/// The three overlay lines for `fix` taken at `taken_at`.
pub fn overlay_lines(fix: &LocationFix, taken_at: &DateTime<Local>) -> Vec<String> {
    vec![
        format!("Lat: {:.5}", fix.latitude),
        format!("Lon: {:.5}", fix.longitude),
        taken_at.format("%Y-%m-%d %H:%M:%S").to_string(),
    ]
}

/// Pixels per font cell for an image `height` pixels tall.
///
/// Glyphs come out at roughly 1/40 of the image height, never smaller than
/// two pixels per cell.
pub fn text_scale(height: u32, configured: Option<u32>) -> u32 {
    configured.unwrap_or(height / 40 / GLYPH_HEIGHT).max(2)
}

/// Draw `lines` at the bottom-left corner of `img`.
pub fn draw_overlay(img: &mut RgbImage, lines: &[String], config: &OverlayConfig) {
    if lines.is_empty() {
        return;
    }

    let scale = text_scale(img.height(), config.text_scale);
    let mask = rasterise(lines, scale);
    let pad = 2 * scale;

    let text_height = lines.len() as u32 * LINE_ADVANCE * scale;
    let x0 = config.margin_px as i64 - pad as i64;
    let y0 = img.height() as i64 - config.margin_px as i64 - text_height as i64 - pad as i64;

    let shadow = imageops::blur(&mask, 0.8 * scale as f32);
    let shadow_offset = (scale / 2).max(1) as i64;
    composite(img, &shadow, x0 + shadow_offset, y0 + shadow_offset, [0, 0, 0], SHADOW_OPACITY);

    let text = imageops::blur(&mask, 0.35 * scale as f32);
    composite(img, &text, x0, y0, [255, 255, 255], 1.0);
}

/// Coverage mask of `lines`, with a `2 * scale` transparent border so the
/// blur has room to spread.
fn rasterise(lines: &[String], scale: u32) -> GrayImage {
    let pad = 2 * scale;
    let cells_wide = lines.iter().map(|l| font::text_width(l)).max().unwrap_or(0);
    let width = cells_wide * scale + 2 * pad;
    let height = lines.len() as u32 * LINE_ADVANCE * scale + 2 * pad;

    let mut mask = GrayImage::new(width, height);
    for (line_no, line) in lines.iter().enumerate() {
        let top = pad + line_no as u32 * LINE_ADVANCE * scale;
        for (i, c) in line.chars().enumerate() {
            let left = pad + i as u32 * font::ADVANCE * scale;
            for row in 0..GLYPH_HEIGHT {
                for col in 0..font::GLYPH_WIDTH {
                    if !font::is_set(c, col, row) {
                        continue;
                    }
                    for dy in 0..scale {
                        for dx in 0..scale {
                            mask.put_pixel(left + col * scale + dx, top + row * scale + dy, Luma([255]));
                        }
                    }
                }
            }
        }
    }
    mask
}

/// Blend `colour` into `img` through `alpha`, placed with its top-left at
/// (`x0`, `y0`).  Parts outside the image are clipped.
fn composite(img: &mut RgbImage, alpha: &GrayImage, x0: i64, y0: i64, colour: [u8; 3], opacity: f32) {
    let (w, h) = (img.width() as i64, img.height() as i64);
    for (mx, my, Luma([a])) in alpha.enumerate_pixels() {
        if *a == 0 {
            continue;
        }
        let (x, y) = (x0 + mx as i64, y0 + my as i64);
        if x < 0 || y < 0 || x >= w || y >= h {
            continue;
        }
        let a = *a as f32 / 255.0 * opacity;
        let Rgb(px) = img.get_pixel_mut(x as u32, y as u32);
        for (channel, target) in px.iter_mut().zip(colour) {
            *channel = (*channel as f32 * (1.0 - a) + target as f32 * a).round() as u8;
        }
    }
}
