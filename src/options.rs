//! # Encoder Options
//!
//! Construction-time configuration shared by every dialect encoder, plus
//! the named parameter values the capability operations accept.
//!
//! Options are captured once by the encoder constructor and never change
//! afterwards.
//!
//! ## Example
//!
//! ```
//! use thermalize::{Escape, ImageTransfer, Options};
//!
//! let opts = Options::new()
//!     .image_transfer(ImageTransfer::Banded)
//!     .gray_level(100);
//! let cmd = Escape::new(48, 576, Vec::new(), opts);
//! ```

use std::fmt;

use image::DynamicImage;

use crate::render::raster::GrayLevel;

// ============================================================================
// PARAMETER VALUES
// ============================================================================

/// Horizontal justification (`align`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Alignment {
    #[default]
    Left = 0,
    Center = 1,
    Right = 2,
}

impl Alignment {
    /// Interpret a raw value, clamping anything above `Right`.
    pub fn from_u8(b: u8) -> Self {
        match b {
            0 => Self::Left,
            1 => Self::Center,
            _ => Self::Right,
        }
    }
}

/// Underline mode (`underline`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Underline {
    #[default]
    None = 0,
    OneDot = 1,
    TwoDots = 2,
}

/// HRI character font.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum HriFont {
    /// 12 x 24
    #[default]
    A = 0,
    /// 9 x 17
    B = 1,
}

/// HRI character print position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum HriPosition {
    #[default]
    NotPrinted = 0,
    Above = 1,
    Below = 2,
    AboveAndBelow = 3,
}

/// 1D barcode symbologies, in the order every dialect's mode table uses.
///
/// Raw values above 13 are treated as [`BarcodeMode::Code39`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BarcodeMode {
    UpcA = 0,
    UpcE = 1,
    JanEan8 = 2,
    JanEan13 = 3,
    Code39 = 4,
    Code93 = 5,
    Code128 = 6,
    Itf = 7,
    Nw7 = 8,
    Gs1_128 = 9,
    Gs1Omnidirectional = 10,
    Gs1Truncated = 11,
    Gs1Limited = 12,
    Gs1Expanded = 13,
}

impl BarcodeMode {
    const ALL: [Self; 14] = [
        Self::UpcA,
        Self::UpcE,
        Self::JanEan8,
        Self::JanEan13,
        Self::Code39,
        Self::Code93,
        Self::Code128,
        Self::Itf,
        Self::Nw7,
        Self::Gs1_128,
        Self::Gs1Omnidirectional,
        Self::Gs1Truncated,
        Self::Gs1Limited,
        Self::Gs1Expanded,
    ];

    /// Map a raw mode, falling back to Code39 when out of range.
    pub fn from_u8(m: u8) -> Self {
        Self::ALL.get(m as usize).copied().unwrap_or(Self::Code39)
    }
}

/// QR error correction level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum QrLevel {
    /// Recovers 7% of data
    #[default]
    L = 0,
    /// Recovers 15% of data
    M = 1,
    /// Recovers 25% of data
    Q = 2,
    /// Recovers 30% of data
    H = 3,
}

impl QrLevel {
    pub fn from_u8(b: u8) -> Self {
        match b {
            0 => Self::L,
            1 => Self::M,
            2 => Self::Q,
            _ => Self::H,
        }
    }
}

/// Cash drawer connector pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum DrawerPin {
    #[default]
    Pin2 = 0,
    Pin5 = 1,
}

macro_rules! into_u8 {
    ($($t:ty),*) => {
        $(impl From<$t> for u8 {
            fn from(v: $t) -> u8 {
                v as u8
            }
        })*
    };
}

into_u8!(Alignment, Underline, HriFont, HriPosition, BarcodeMode, QrLevel, DrawerPin);

// ============================================================================
// SYMBOL GENERATORS
// ============================================================================

/// Parameters handed to a [`BarcodeGenerator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarcodeOptions {
    /// Raw symbology (see [`BarcodeMode`])
    pub mode: u8,
    /// Module width multiplier, 1-6
    pub width: u8,
    /// Bar height in dots, 1-255
    pub height: u8,
}

impl Default for BarcodeOptions {
    fn default() -> Self {
        Self {
            mode: BarcodeMode::Code39 as u8,
            width: 3,
            height: 162,
        }
    }
}

/// Parameters handed to a [`QrGenerator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QrCodeOptions {
    /// Error correction level, 0-3 (see [`QrLevel`])
    pub correction_level: u8,
    /// Module size in dots, 1-8
    pub size: u8,
}

impl Default for QrCodeOptions {
    fn default() -> Self {
        Self {
            correction_level: QrLevel::L as u8,
            size: 3,
        }
    }
}

/// Renders 1D barcodes to images.
///
/// When an encoder has one, barcode operations print the returned image
/// instead of the dialect's native barcode command. Returning `None`
/// skips the barcode.
pub trait BarcodeGenerator {
    fn barcode(&self, data: &str, opts: BarcodeOptions) -> Option<DynamicImage>;
}

impl<F> BarcodeGenerator for F
where
    F: Fn(&str, BarcodeOptions) -> Option<DynamicImage>,
{
    fn barcode(&self, data: &str, opts: BarcodeOptions) -> Option<DynamicImage> {
        self(data, opts)
    }
}

/// Renders QR codes to images. Same substitution rules as [`BarcodeGenerator`].
pub trait QrGenerator {
    fn qr_code(&self, data: &str, opts: QrCodeOptions) -> Option<DynamicImage>;
}

impl<F> QrGenerator for F
where
    F: Fn(&str, QrCodeOptions) -> Option<DynamicImage>,
{
    fn qr_code(&self, data: &str, opts: QrCodeOptions) -> Option<DynamicImage> {
        self(data, opts)
    }
}

// ============================================================================
// OPTIONS
// ============================================================================

/// Image transfer command family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageTransfer {
    /// One command carrying the whole row-major bitmap
    /// (ESC/POS `GS v 0`, StarPRNT `ESC GS S`).
    Legacy,
    /// ESC/POS graphics buffer: `GS 8 L` store followed by `GS ( L` print.
    /// StarPRNT has no equivalent and uses [`ImageTransfer::Legacy`].
    Graphics,
    /// 24-dot bands, each followed by a paper feed
    /// (ESC/POS `ESC * !` + `ESC J 24`, StarPRNT `ESC X` + `ESC J 12`).
    Banded,
}

/// Construction-time encoder configuration.
#[derive(Default)]
pub struct Options {
    pub(crate) barcode: Option<Box<dyn BarcodeGenerator>>,
    pub(crate) qr: Option<Box<dyn QrGenerator>>,
    pub(crate) image_transfer: Option<ImageTransfer>,
    pub(crate) page_height: Option<f64>,
    pub(crate) gray_level: Option<GrayLevel>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Print barcodes as images produced by `generator`.
    pub fn barcode_generator(mut self, generator: impl BarcodeGenerator + 'static) -> Self {
        self.barcode = Some(Box::new(generator));
        self
    }

    /// Print QR codes as images produced by `generator`.
    pub fn qr_generator(mut self, generator: impl QrGenerator + 'static) -> Self {
        self.qr = Some(Box::new(generator));
        self
    }

    /// Select the image transfer command family.
    ///
    /// Defaults: ESC/POS uses `Legacy`, StarPRNT uses `Banded`.
    pub fn image_transfer(mut self, transfer: ImageTransfer) -> Self {
        self.image_transfer = Some(transfer);
        self
    }

    /// PostScript page height in points (default 400).
    pub fn page_height(mut self, height: f64) -> Self {
        self.page_height = Some(height);
        self
    }

    /// Threshold images against `level` instead of the process-wide gray level.
    pub fn gray_level(mut self, level: u8) -> Self {
        self.gray_level = Some(GrayLevel(level));
        self
    }

    pub(crate) fn threshold(&self) -> GrayLevel {
        self.gray_level.unwrap_or_else(GrayLevel::current)
    }

    pub(crate) fn has_barcode_generator(&self) -> bool {
        self.barcode.is_some()
    }

    pub(crate) fn has_qr_generator(&self) -> bool {
        self.qr.is_some()
    }

    pub(crate) fn render_barcode(&self, data: &str, opts: BarcodeOptions) -> Option<DynamicImage> {
        self.barcode.as_ref().and_then(|g| g.barcode(data, opts))
    }

    pub(crate) fn render_qr(&self, data: &str, opts: QrCodeOptions) -> Option<DynamicImage> {
        self.qr.as_ref().and_then(|g| g.qr_code(data, opts))
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("barcode", &self.barcode.is_some())
            .field("qr", &self.qr.is_some())
            .field("image_transfer", &self.image_transfer)
            .field("page_height", &self.page_height)
            .field("gray_level", &self.gray_level)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    #[test]
    fn test_barcode_mode_fallback() {
        assert_eq!(BarcodeMode::from_u8(6), BarcodeMode::Code128);
        assert_eq!(BarcodeMode::from_u8(13), BarcodeMode::Gs1Expanded);
        assert_eq!(BarcodeMode::from_u8(99), BarcodeMode::Code39);
    }

    #[test]
    fn test_alignment_clamps() {
        assert_eq!(Alignment::from_u8(1), Alignment::Center);
        assert_eq!(Alignment::from_u8(7), Alignment::Right);
        assert_eq!(u8::from(Alignment::Right), 2);
    }

    #[test]
    fn test_closure_generators() {
        let opts = Options::new()
            .barcode_generator(|_: &str, o: BarcodeOptions| {
                Some(DynamicImage::ImageRgba8(RgbaImage::new(o.width as u32, 1)))
            })
            .qr_generator(|_: &str, _: QrCodeOptions| None);

        assert!(opts.has_barcode_generator());
        assert!(opts.has_qr_generator());
        let img = opts.render_barcode("1234", BarcodeOptions { width: 3, ..Default::default() });
        assert_eq!(img.map(|i| i.width()), Some(3));
        assert!(opts.render_qr("x", QrCodeOptions::default()).is_none());
    }

    #[test]
    fn test_threshold_override() {
        assert_eq!(Options::new().gray_level(42).threshold(), GrayLevel(42));
    }
}
