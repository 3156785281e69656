//! # Monochrome Rasterizer
//!
//! Converts an arbitrary pixel image into the 1-bit transfer formats the
//! dialect encoders send to the printer.
//!
//! ## Gray Decision
//!
//! Every pixel is reduced to a single foreground/background decision against
//! a gray-level threshold (0-255):
//!
//! 1. If alpha is below the threshold the pixel is background
//!    (foreground when inverted).
//! 2. Otherwise its luminance is compared to the threshold: darker than the
//!    threshold is foreground, unless inverted, in which case brighter than
//!    the threshold is foreground.
//!
//! ## Layouts
//!
//! | Layout | Used by | Stride | Packing |
//! |--------|---------|--------|---------|
//! | [`RasterLayout::Bit`] | `GS v 0`, `GS 8 L`, `ESC GS S` | `ceil(w/8)` bytes | row-major, bit7 = leftmost dot |
//! | [`RasterLayout::Bin`] | `ESC * !`, `ESC X` | `w` columns | 24-row bands, 3 bytes per column, bit7 = top dot |
//! | [`RasterLayout::Bytes`] | PostScript `image` | `w` bytes | one byte per pixel, 0x00 ink / 0xFF paper |
//!
//! ```text
//! Bin band (3 bytes per column):
//!
//!            col 0        col 1        col 2
//! rows 0-7   byte 0       byte 3       byte 6     ...
//! rows 8-15  byte 1       byte 4       byte 7
//! rows 16-23 byte 2       byte 5       byte 8
//! ```
//!
//! ## Threshold State
//!
//! The process-wide threshold ([`set_gray_level`], [`reset_gray_level`],
//! [`gray_level`]) is an atomic with last-writer-wins semantics. A
//! rasterization running concurrently with a change may observe either
//! value. Encoders built with an explicit [`crate::Options::gray_level`]
//! never read it.

use std::sync::atomic::{AtomicU8, Ordering};

use image::{DynamicImage, Rgba};

/// Band height of the column-interleaved layout, in dots.
pub const BAND_HEIGHT: usize = 24;

// ============================================================================
// GRAY LEVEL
// ============================================================================

/// Luminance/alpha threshold used to binarize pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GrayLevel(pub u8);

impl GrayLevel {
    /// Threshold used until [`set_gray_level`] is called.
    pub const DEFAULT: Self = Self(127);

    /// Snapshot of the process-wide threshold.
    pub fn current() -> Self {
        Self(GRAY_LEVEL.load(Ordering::Relaxed))
    }
}

impl Default for GrayLevel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

static GRAY_LEVEL: AtomicU8 = AtomicU8::new(GrayLevel::DEFAULT.0);

/// Set the level of gray that should be visible when printing.
pub fn set_gray_level(level: u8) {
    GRAY_LEVEL.store(level, Ordering::Relaxed);
}

/// Restore the process-wide gray level to [`GrayLevel::DEFAULT`].
pub fn reset_gray_level() {
    GRAY_LEVEL.store(GrayLevel::DEFAULT.0, Ordering::Relaxed);
}

/// Current process-wide gray level.
pub fn gray_level() -> u8 {
    GRAY_LEVEL.load(Ordering::Relaxed)
}

/// Luminance of a straight-alpha pixel composited over black, 0-255.
///
/// Channels are premultiplied at 16-bit precision and weighted
/// 0.299/0.587/0.114 (the JFIF coefficients in 16.16 fixed point).
#[inline]
pub fn luminance(px: Rgba<u8>) -> u8 {
    let [r, g, b, a] = px.0;
    let premul = |c: u8| -> u64 { (c as u64 * 0x101) * a as u64 / 0xFF };
    let y = (19595 * premul(r) + 38470 * premul(g) + 7471 * premul(b) + (1 << 15)) >> 24;
    y as u8
}

/// Decide whether a pixel is printed (ink) under `level`.
#[inline]
pub fn is_foreground(px: Rgba<u8>, level: GrayLevel, invert: bool) -> bool {
    if px.0[3] < level.0 {
        return invert;
    }
    let y = luminance(px);
    if invert { y > level.0 } else { y < level.0 }
}

// ============================================================================
// RASTER BUFFER
// ============================================================================

/// Physical arrangement of rasterized pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterLayout {
    /// Row-major, 1 bit per dot, rows padded to whole bytes.
    Bit,
    /// Column-interleaved 24-dot bands, 3 bytes per column.
    Bin,
    /// One byte per pixel (0x00 foreground, 0xFF background).
    Bytes,
}

/// Rasterized image ready for transfer.
///
/// `stride` is the number of bytes per row for [`RasterLayout::Bit`] and
/// [`RasterLayout::Bytes`], and the number of columns for
/// [`RasterLayout::Bin`] (one band is `stride * 3` bytes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterBuffer {
    pub layout: RasterLayout,
    pub stride: usize,
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl RasterBuffer {
    fn empty(layout: RasterLayout) -> Self {
        Self {
            layout,
            stride: 0,
            width: 0,
            height: 0,
            data: Vec::new(),
        }
    }

    /// True for zero-sized images; encoders emit nothing for these.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of transfer rows (dot rows, or bands for `Bin`).
    pub fn rows(&self) -> usize {
        match self.layout {
            RasterLayout::Bin if self.stride > 0 => self.data.len() / (self.stride * 3),
            _ if self.stride > 0 => self.data.len() / self.stride,
            _ => 0,
        }
    }

    /// Iterate over 24-dot bands of a `Bin` buffer.
    pub fn bands(&self) -> std::slice::Chunks<'_, u8> {
        self.data.chunks((self.stride * 3).max(1))
    }
}

// ============================================================================
// RASTERIZATION
// ============================================================================

/// Rasterize `img` into `layout` using an explicit threshold.
///
/// ## Example
///
/// ```
/// use image::{DynamicImage, Rgba, RgbaImage};
/// use thermalize::render::raster::{rasterize, GrayLevel, RasterLayout};
///
/// let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 2, Rgba([0, 0, 0, 255])));
/// let buf = rasterize(&img, false, RasterLayout::Bit, GrayLevel::DEFAULT);
/// assert_eq!(buf.stride, 2);
/// assert_eq!(buf.data, vec![0xFF, 0xC0, 0xFF, 0xC0]);
/// ```
pub fn rasterize(
    img: &DynamicImage,
    invert: bool,
    layout: RasterLayout,
    level: GrayLevel,
) -> RasterBuffer {
    let width = img.width() as usize;
    let height = img.height() as usize;
    if width == 0 || height == 0 {
        return RasterBuffer::empty(layout);
    }

    let rgba = img.to_rgba8();
    let ink = |x: usize, y: usize| is_foreground(*rgba.get_pixel(x as u32, y as u32), level, invert);

    let (stride, data) = match layout {
        RasterLayout::Bit => {
            let stride = width.div_ceil(8);
            let mut data = vec![0u8; stride * height];
            for y in 0..height {
                for x in 0..width {
                    if ink(x, y) {
                        data[y * stride + x / 8] |= 0x80 >> (x % 8);
                    }
                }
            }
            (stride, data)
        }
        RasterLayout::Bin => {
            let bands = height.div_ceil(BAND_HEIGHT);
            let mut data = vec![0u8; bands * 3 * width];
            let shift = 3 * (width - 1);
            for y in 0..height {
                let n = y / 8 + (y / BAND_HEIGHT) * shift;
                for x in 0..width {
                    if ink(x, y) {
                        data[n + x * 3] |= 0x80 >> (y % 8);
                    }
                }
            }
            (width, data)
        }
        RasterLayout::Bytes => {
            let mut data = vec![0u8; width * height];
            for y in 0..height {
                for x in 0..width {
                    if !ink(x, y) {
                        data[y * width + x] = 0xFF;
                    }
                }
            }
            (width, data)
        }
    };

    RasterBuffer {
        layout,
        stride,
        width,
        height,
        data,
    }
}

/// Rasterize with the process-wide gray level.
pub fn rasterize_global(img: &DynamicImage, invert: bool, layout: RasterLayout) -> RasterBuffer {
    rasterize(img, invert, layout, GrayLevel::current())
}

// ============================================================================
// TESTS
// ============================================================================
