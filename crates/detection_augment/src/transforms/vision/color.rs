//! Float BGR <-> HSV kernels over interleaved `[H, W, 3]` pixel data.
//!
//! HSV follows the float convention: hue in degrees `[0, 360)`, saturation
//! in `[0, 1]` and value in whatever scale the BGR input used.

use std::fmt;

/// Colour representations an image can be in while it moves through a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    Bgr,
    Rgb,
    Hsv,
}

impl fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColorSpace::Bgr => "BGR",
            ColorSpace::Rgb => "RGB",
            ColorSpace::Hsv => "HSV",
        };
        f.write_str(name)
    }
}

pub(crate) fn bgr_to_hsv_inplace(pixels: &mut [f32]) {
    for px in pixels.chunks_exact_mut(3) {
        let (b, g, r) = (px[0], px[1], px[2]);
        let v = b.max(g).max(r);
        let vmin = b.min(g).min(r);
        let diff = v - vmin;

        let s = diff / (v.abs() + f32::EPSILON);
        let scale = 60.0 / (diff + f32::EPSILON);
        let mut h = if v == r {
            (g - b) * scale
        } else if v == g {
            (b - r) * scale + 120.0
        } else {
            (r - g) * scale + 240.0
        };
        if h < 0.0 {
            h += 360.0;
        }

        px[0] = h;
        px[1] = s;
        px[2] = v;
    }
}

// Which of [v, p, q, t] lands in (b, g, r) for each hue sector.
const SECTOR_TAB: [[usize; 3]; 6] = [
    [1, 3, 0],
    [1, 0, 2],
    [3, 0, 1],
    [0, 2, 1],
    [0, 1, 3],
    [2, 1, 0],
];

pub(crate) fn hsv_to_bgr_inplace(pixels: &mut [f32]) {
    for px in pixels.chunks_exact_mut(3) {
        let (h, s, v) = (px[0], px[1], px[2]);
        if s == 0.0 {
            px.fill(v);
            continue;
        }

        let mut h = h / 60.0;
        if h.is_finite() {
            h = h.rem_euclid(6.0);
        }
        let mut sector = h.floor() as i64;
        let mut frac = h - sector as f32;
        if !(0..6).contains(&sector) {
            sector = 0;
            frac = 0.0;
        }

        let tab = [
            v,
            v * (1.0 - s),
            v * (1.0 - s * frac),
            v * (1.0 - s * (1.0 - frac)),
        ];
        let idx = SECTOR_TAB[sector as usize];
        px[0] = tab[idx[0]];
        px[1] = tab[idx[1]];
        px[2] = tab[idx[2]];
    }
}
