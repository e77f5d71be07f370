//! Image-processing primitives shared by the pixel analyzers
//!
//! Convolutions replicate edge pixels at the border. Statistics are
//! population statistics (divide by n).

use image::{GrayImage, RgbImage};

/// Added to denominators of dispersion ratios
pub const EPSILON: f64 = 1e-6;

/// Rectangle inside an image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// Split `width`x`height` into a `rows`x`cols` grid (integer boundaries)
pub fn grid(width: u32, height: u32, rows: u32, cols: u32) -> Vec<Region> {
    let mut regions = Vec::with_capacity((rows * cols) as usize);
    for i in 0..rows {
        for j in 0..cols {
            let y0 = i * height / rows;
            let y1 = (i + 1) * height / rows;
            let x0 = j * width / cols;
            let x1 = (j + 1) * width / cols;
            regions.push(Region {
                x: x0,
                y: y0,
                width: x1 - x0,
                height: y1 - y0,
            });
        }
    }
    regions
}

/// Square tiles of `size` stepping by `stride`; a tile never touches the
/// last `size` rows/columns
pub fn tiles(width: u32, height: u32, size: u32, stride: u32) -> Vec<Region> {
    let mut regions = Vec::new();
    if stride == 0 || width <= size || height <= size {
        return regions;
    }
    for y in (0..height - size).step_by(stride as usize) {
        for x in (0..width - size).step_by(stride as usize) {
            regions.push(Region {
                x,
                y,
                width: size,
                height: size,
            });
        }
    }
    regions
}

// ============================================================================
// Float plane
// ============================================================================

/// Single-channel f64 image
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    width: u32,
    height: u32,
    data: Vec<f64>,
}

impl Plane {
    pub fn from_gray(gray: &GrayImage) -> Self {
        Self {
            width: gray.width(),
            height: gray.height(),
            data: gray.as_raw().iter().map(|&v| v as f64).collect(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn values(&self) -> &[f64] {
        &self.data
    }

    pub fn get(&self, x: u32, y: u32) -> f64 {
        self.data[(y as usize) * (self.width as usize) + x as usize]
    }

    /// Pixel with coordinates clamped into the plane
    fn get_clamped(&self, x: i64, y: i64) -> f64 {
        let x = x.clamp(0, self.width as i64 - 1) as u32;
        let y = y.clamp(0, self.height as i64 - 1) as u32;
        self.get(x, y)
    }

    /// Copy of a rectangular region
    pub fn crop(&self, region: Region) -> Plane {
        let mut data = Vec::with_capacity(region.width as usize * region.height as usize);
        for y in region.y..region.y + region.height {
            let start = (y as usize) * (self.width as usize) + region.x as usize;
            data.extend_from_slice(&self.data[start..start + region.width as usize]);
        }
        Plane {
            width: region.width,
            height: region.height,
            data,
        }
    }

    /// 3x3 convolution with replicated borders
    pub fn convolve3(&self, kernel: &[[f64; 3]; 3]) -> Plane {
        let mut data = Vec::with_capacity(self.data.len());
        for y in 0..self.height as i64 {
            for x in 0..self.width as i64 {
                let mut acc = 0.0;
                for (ky, row) in kernel.iter().enumerate() {
                    for (kx, weight) in row.iter().enumerate() {
                        if *weight != 0.0 {
                            acc += weight * self.get_clamped(x + kx as i64 - 1, y + ky as i64 - 1);
                        }
                    }
                }
                data.push(acc);
            }
        }
        Plane {
            width: self.width,
            height: self.height,
            data,
        }
    }

    /// Mean absolute difference to another plane of the same size
    pub fn mean_abs_diff(&self, other: &Plane) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        let total: f64 = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| (a - b).abs())
            .sum();
        total / self.data.len() as f64
    }

    /// Mean over the pixels of `region`
    pub fn region_mean(&self, region: Region) -> f64 {
        mean(self.crop(region).values())
    }
}

/// 4-neighbour Laplacian
pub const LAPLACIAN: [[f64; 3]; 3] = [[0.0, 1.0, 0.0], [1.0, -4.0, 1.0], [0.0, 1.0, 0.0]];

/// 8-neighbour high-pass filter
pub const HIGH_PASS: [[f64; 3]; 3] = [[-1.0, -1.0, -1.0], [-1.0, 8.0, -1.0], [-1.0, -1.0, -1.0]];

pub const SOBEL_X: [[f64; 3]; 3] = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
pub const SOBEL_Y: [[f64; 3]; 3] = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];

/// Variance of the Laplacian response (sharpness)
pub fn laplacian_variance(plane: &Plane) -> f64 {
    variance(plane.convolve3(&LAPLACIAN).values())
}

/// Gaussian blur of an 8-bit plane
pub fn gaussian_blur(gray: &GrayImage, sigma: f32) -> GrayImage {
    image::imageops::blur(gray, sigma)
}

/// Copy of a region of an 8-bit plane
pub fn crop_gray(gray: &GrayImage, region: Region) -> GrayImage {
    image::imageops::crop_imm(gray, region.x, region.y, region.width, region.height).to_image()
}

// ============================================================================
// Statistics
// ============================================================================

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64
}

pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// `1 - min(std / mean, 1)`: 1.0 when all values agree, 0.0 when they
/// scatter as much as their mean
pub fn consistency(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 1.0;
    }
    1.0 - (std_dev(values) / (mean(values) + EPSILON)).min(1.0)
}

/// Percentile with linear interpolation between closest ranks
pub fn percentile(values: &[f64], pct: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut scratch = values.to_vec();
    let rank = (pct / 100.0).clamp(0.0, 1.0) * (scratch.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;

    let cmp = |a: &f64, b: &f64| a.total_cmp(b);
    let (_, lo, rest) = scratch.select_nth_unstable_by(lower, cmp);
    let lo = *lo;
    let hi = if upper == lower {
        lo
    } else {
        rest.iter().copied().min_by(|a, b| a.total_cmp(b)).unwrap_or(lo)
    };
    lo + (hi - lo) * (rank - lower as f64)
}

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

// ============================================================================
// Color
// ============================================================================

/// HSV on the 8-bit scale used by common vision libraries:
/// H in [0, 180), S and V in [0, 255]
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f64, f64, f64) {
    let (r, g, b) = (r as f64, g as f64, b as f64);
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = v - min;

    let s = if v > 0.0 { 255.0 * delta / v } else { 0.0 };
    let h = if delta == 0.0 {
        0.0
    } else if v == r {
        60.0 * (g - b) / delta
    } else if v == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    let h = if h < 0.0 { h + 360.0 } else { h };

    (h / 2.0, s, v)
}

// ============================================================================
// Binary masks
// ============================================================================

/// Binary pixel mask
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    data: Vec<bool>,
}

impl Mask {
    /// Mask of pixels of `rgb` matching `predicate`
    pub fn from_rgb(rgb: &RgbImage, predicate: impl Fn(u8, u8, u8) -> bool) -> Self {
        Self {
            width: rgb.width(),
            height: rgb.height(),
            data: rgb
                .pixels()
                .map(|p| predicate(p.0[0], p.0[1], p.0[2]))
                .collect(),
        }
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        self.data[(y as usize) * (self.width as usize) + x as usize]
    }

    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    pub fn count_in(&self, region: Region) -> usize {
        let mut count = 0;
        for y in region.y..region.y + region.height {
            let start = (y as usize) * (self.width as usize) + region.x as usize;
            count += self.data[start..start + region.width as usize]
                .iter()
                .filter(|&&v| v)
                .count();
        }
        count
    }

    /// Square-kernel min (erode) or max (dilate) filter; pixels outside the
    /// image are ignored
    fn filter(&self, size: u32, erode: bool) -> Mask {
        let radius = (size / 2) as i64;
        let (w, h) = (self.width as i64, self.height as i64);

        let mut horizontal = Vec::with_capacity(self.data.len());
        for y in 0..h {
            for x in 0..w {
                let lo = (x - radius).max(0);
                let hi = (x + radius).min(w - 1);
                let window = (lo..=hi).map(|xx| self.data[(y * w + xx) as usize]);
                horizontal.push(reduce_window(window, erode));
            }
        }

        let mut data = Vec::with_capacity(self.data.len());
        for y in 0..h {
            for x in 0..w {
                let lo = (y - radius).max(0);
                let hi = (y + radius).min(h - 1);
                let window = (lo..=hi).map(|yy| horizontal[(yy * w + x) as usize]);
                data.push(reduce_window(window, erode));
            }
        }

        Mask {
            width: self.width,
            height: self.height,
            data,
        }
    }

    pub fn erode(&self, size: u32) -> Mask {
        self.filter(size, true)
    }

    pub fn dilate(&self, size: u32) -> Mask {
        self.filter(size, false)
    }

    /// Erosion followed by dilation; removes specks
    pub fn open(&self, size: u32) -> Mask {
        self.erode(size).dilate(size)
    }

    /// Dilation followed by erosion; fills pinholes
    pub fn close(&self, size: u32) -> Mask {
        self.dilate(size).erode(size)
    }
}

/// Min (erode) or max (dilate) of one window
fn reduce_window(mut window: impl Iterator<Item = bool>, erode: bool) -> bool {
    if erode {
        window.all(|v| v)
    } else {
        window.any(|v| v)
    }
}

// ============================================================================
// Co-occurrence
// ============================================================================

/// Gray-level co-occurrence descriptors
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlcmProperties {
    pub contrast: f64,
    pub dissimilarity: f64,
    pub homogeneity: f64,
    pub energy: f64,
}

/// Symmetric, normalized 256-level GLCM for horizontal neighbours at
/// distance 1; pixels outside `mask` read as level 0
pub fn glcm_properties(gray: &GrayImage, mask: &Mask) -> Option<GlcmProperties> {
    let (w, h) = (gray.width(), gray.height());
    if w < 2 || h == 0 {
        return None;
    }

    let level = |x: u32, y: u32| -> usize {
        if mask.get(x, y) {
            gray.get_pixel(x, y).0[0] as usize
        } else {
            0
        }
    };

    let mut counts = vec![0u64; 256 * 256];
    for y in 0..h {
        for x in 0..w - 1 {
            let i = level(x, y);
            let j = level(x + 1, y);
            counts[i * 256 + j] += 1;
            counts[j * 256 + i] += 1;
        }
    }

    let total: u64 = counts.iter().sum();
    if total == 0 {
        return None;
    }
    let total = total as f64;

    let mut props = GlcmProperties {
        contrast: 0.0,
        dissimilarity: 0.0,
        homogeneity: 0.0,
        energy: 0.0,
    };
    for (index, &count) in counts.iter().enumerate() {
        if count == 0 {
            continue;
        }
        let p = count as f64 / total;
        let diff = (index / 256) as f64 - (index % 256) as f64;
        props.contrast += p * diff * diff;
        props.dissimilarity += p * diff.abs();
        props.homogeneity += p / (1.0 + diff * diff);
        props.energy += p * p;
    }
    props.energy = props.energy.sqrt();

    Some(props)
}
