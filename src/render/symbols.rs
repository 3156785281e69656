//! Ready-made symbol generators.
//!
//! Plug these into [`Options`](crate::Options) to print barcodes and QR codes
//! as images, for dialects (or printers) without native symbol support.
//!
//! ```
//! use thermalize::Options;
//! use thermalize::render::symbols::{BarcodeImages, QrImages};
//!
//! let opts = Options::new()
//!     .barcode_generator(BarcodeImages)
//!     .qr_generator(QrImages);
//! ```

use barcoders::sym::codabar::Codabar;
use barcoders::sym::code128::Code128;
use barcoders::sym::code39::Code39;
use barcoders::sym::code93::Code93;
use barcoders::sym::ean13::EAN13;
use barcoders::sym::ean8::EAN8;
use barcoders::sym::tf::TF;
use image::{DynamicImage, GrayImage, Luma};
use log::debug;
use qrcode::{Color, EcLevel, QrCode};

use crate::options::{
    BarcodeGenerator, BarcodeMode, BarcodeOptions, QrCodeOptions, QrGenerator, QrLevel,
};

const BLACK: Luma<u8> = Luma([0]);
const WHITE: Luma<u8> = Luma([255]);

/// 1D barcodes drawn with the `barcoders` crate.
///
/// Each module is `width` dots wide and `height` dots tall. Symbologies the
/// crate has no encoder for are drawn as Code39.
#[derive(Debug, Clone, Copy, Default)]
pub struct BarcodeImages;

impl BarcodeImages {
    /// Encode `data` to modules (1 = bar, 0 = space).
    pub fn modules(mode: BarcodeMode, data: &str) -> Option<Vec<u8>> {
        let encoded = match mode {
            BarcodeMode::UpcA => EAN13::new(upc_a_to_ean13(data)).map(|b| b.encode()),
            BarcodeMode::JanEan13 => EAN13::new(data).map(|b| b.encode()),
            BarcodeMode::JanEan8 => EAN8::new(data).map(|b| b.encode()),
            BarcodeMode::Code93 => Code93::new(data).map(|b| b.encode()),
            // Code set B covers every printable ASCII character.
            BarcodeMode::Code128 | BarcodeMode::Gs1_128 => {
                Code128::new(&format!("\u{0181}{data}")).map(|b| b.encode())
            }
            BarcodeMode::Itf => TF::interleaved(data).map(|b| b.encode()),
            BarcodeMode::Nw7 => Codabar::new(data).map(|b| b.encode()),
            _ => Code39::new(data).map(|b| b.encode()),
        };

        match encoded {
            Ok(modules) if !modules.is_empty() => Some(modules),
            Ok(_) => None,
            Err(e) => {
                debug!("{mode:?} can not encode {data:?}: {e:?}");
                None
            }
        }
    }
}

/// UPC-A is EAN-13 with a leading zero. A trailing check digit is dropped
/// so the encoder recomputes it over the 12 EAN data digits.
fn upc_a_to_ean13(data: &str) -> String {
    let digits = if data.len() == 12 {
        data.get(..11).unwrap_or(data)
    } else {
        data
    };
    format!("0{digits}")
}

impl BarcodeGenerator for BarcodeImages {
    fn barcode(&self, data: &str, opts: BarcodeOptions) -> Option<DynamicImage> {
        let modules = Self::modules(BarcodeMode::from_u8(opts.mode), data)?;
        let scale = u32::from(opts.width.max(1));
        let height = u32::from(opts.height.max(1));

        let img = GrayImage::from_fn(modules.len() as u32 * scale, height, |x, _| {
            if modules[(x / scale) as usize] == 1 {
                BLACK
            } else {
                WHITE
            }
        });
        Some(DynamicImage::ImageLuma8(img))
    }
}

/// QR codes drawn with the `qrcode` crate, `size` dots per module.
#[derive(Debug, Clone, Copy, Default)]
pub struct QrImages;

impl QrGenerator for QrImages {
    fn qr_code(&self, data: &str, opts: QrCodeOptions) -> Option<DynamicImage> {
        let ec_level = match QrLevel::from_u8(opts.correction_level) {
            QrLevel::L => EcLevel::L,
            QrLevel::M => EcLevel::M,
            QrLevel::Q => EcLevel::Q,
            QrLevel::H => EcLevel::H,
        };

        let code = match QrCode::with_error_correction_level(data, ec_level) {
            Ok(code) => code,
            Err(e) => {
                debug!("QR code generation failed: {e}");
                return None;
            }
        };

        let cell = u32::from(opts.size.max(1));
        let side = code.width() as u32 * cell;
        let img = GrayImage::from_fn(side, side, |x, y| {
            let (qx, qy) = ((x / cell) as usize, (y / cell) as usize);
            if code[(qx, qy)] == Color::Dark {
                BLACK
            } else {
                WHITE
            }
        });
        Some(DynamicImage::ImageLuma8(img))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code128_image() {
        let opts = BarcodeOptions {
            mode: BarcodeMode::Code128 as u8,
            width: 2,
            height: 40,
        };
        let img = BarcodeImages.barcode("Hello", opts).unwrap();
        assert_eq!(img.height(), 40);
        assert_eq!(img.width() % 2, 0);

        let gray = img.to_luma8();
        assert!(gray.pixels().any(|p| p.0[0] == 0));
    }

    #[test]
    fn test_unknown_mode_draws_code39() {
        let a = BarcodeImages.barcode("ABC", BarcodeOptions { mode: 99, ..Default::default() });
        let b = BarcodeImages.barcode("ABC", BarcodeOptions { mode: 4, ..Default::default() });
        assert_eq!(a, b);
        assert!(a.is_some());
    }

    #[test]
    fn test_upc_a_with_or_without_check_digit() {
        assert_eq!(upc_a_to_ean13("03600029145"), "003600029145");
        assert_eq!(upc_a_to_ean13("036000291452"), "003600029145");

        let upc = BarcodeImages::modules(BarcodeMode::UpcA, "036000291452");
        assert!(upc.is_some());
        assert_eq!(upc, BarcodeImages::modules(BarcodeMode::UpcA, "03600029145"));
        assert_eq!(upc, BarcodeImages::modules(BarcodeMode::JanEan13, "003600029145"));
    }

    #[test]
    fn test_invalid_data_is_skipped() {
        let opts = BarcodeOptions {
            mode: BarcodeMode::JanEan13 as u8,
            ..Default::default()
        };
        assert!(BarcodeImages.barcode("not digits", opts).is_none());
    }

    #[test]
    fn test_qr_module_size() {
        let img = QrImages
            .qr_code("https://example.com", QrCodeOptions { correction_level: 1, size: 3 })
            .unwrap();
        assert_eq!(img.width(), img.height());
        assert_eq!(img.width() % 3, 0);
        // Finder pattern corner is dark.
        assert_eq!(img.to_luma8().get_pixel(0, 0).0[0], 0);
    }
}
