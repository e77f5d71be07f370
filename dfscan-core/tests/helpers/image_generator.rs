//! Synthetic image fixtures
//!
//! Deterministic generators so assertions do not depend on external assets.

use image::{ImageFormat, Rgb, RgbImage};
use std::path::{Path, PathBuf};

/// Single-colour image
pub fn flat(width: u32, height: u32, color: [u8; 3]) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb(color))
}

/// Horizontal grey ramp
pub fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, _| {
        let v = (x * 255 / width.max(1)) as u8;
        Rgb([v, v, v])
    })
}

/// Horizontal ramp with a warm (golden-hour) cast
pub fn warm_gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, _| {
        let v = (x * 255 / width.max(1)) as f64;
        Rgb([v as u8, (v * 0.85) as u8, (v * 0.7) as u8])
    })
}

/// Black/white squares of `cell` pixels
pub fn checkerboard(width: u32, height: u32, cell: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        if ((x / cell) + (y / cell)) % 2 == 0 {
            Rgb([255, 255, 255])
        } else {
            Rgb([0, 0, 0])
        }
    })
}

/// Mid-grey with pseudo-random per-pixel noise (fixed seed)
pub fn noisy(width: u32, height: u32, amplitude: u8) -> RgbImage {
    let mut state: u32 = 0x9E37_79B9;
    RgbImage::from_fn(width, height, |_, _| {
        // xorshift32
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let offset = (state % (2 * amplitude as u32 + 1)) as i32 - amplitude as i32;
        let v = (128 + offset).clamp(0, 255) as u8;
        Rgb([v, v, v])
    })
}

/// Skin-toned square centred on a dark background
pub fn skin_patch(width: u32, height: u32, side: u32) -> RgbImage {
    let x0 = width.saturating_sub(side) / 2;
    let y0 = height.saturating_sub(side) / 2;
    RgbImage::from_fn(width, height, |x, y| {
        if x >= x0 && x < x0 + side && y >= y0 && y < y0 + side {
            Rgb([220, 170, 140])
        } else {
            Rgb([20, 30, 60])
        }
    })
}

/// Encode `image` into `dir/name`, format chosen from the extension
pub fn write_image(dir: &Path, name: &str, image: &RgbImage) -> anyhow::Result<PathBuf> {
    let path = dir.join(name);
    let format = ImageFormat::from_path(&path)?;
    image.save_with_format(&path, format)?;
    Ok(path)
}
