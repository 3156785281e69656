//! # StarPRNT Encoder
//!
//! Translates [`Cmd`] calls into Star Line Mode / StarPRNT byte sequences
//! for Star Micronics receipt printers (TSP100, TSP650II, mC-Print).
//!
//! Unlike ESC/POS, StarPRNT has no separate commands for barcode width,
//! height or HRI position: they travel inside the `ESC b` barcode command,
//! so the encoder keeps them as pending state until a barcode is printed.
//!
//! ## Image Transfer
//!
//! | [`ImageTransfer`] | Commands | Layout |
//! |-------------------|----------|--------|
//! | `Banded` (default) | (`ESC X nL nH d...` `ESC J 12`) per 24 rows | column bands |
//! | `Legacy` / `Graphics` | `ESC GS S 1 xL xH yL yH 0 d...` | row-major bits |

use std::io::Write;

use image::DynamicImage;
use log::{debug, warn};

use super::commands::{
    BEL, DC2, ESC, GS, HT, LF, RS, SI, clamp_below, clamp_max, clamp_range, split_le, tab_stops,
};
use crate::cmd::{Cmd, Encoder, Skipper};
use crate::error::Result;
use crate::options::{BarcodeMode, BarcodeOptions, ImageTransfer, Options, QrCodeOptions};
use crate::render::raster::{RasterLayout, rasterize};

/// Maximum number of tab stops `ESC D` accepts.
pub const MAX_TAB_STOPS: usize = 16;

/// `ESC b` type byte for each [`BarcodeMode`].
const BARCODE_TYPES: [u8; 14] = [49, 48, 50, 51, 52, 55, 54, 53, 56, 57, 65, 66, 67, 68];

/// StarPRNT dialect encoder.
pub struct Star<W> {
    base: Skipper<W>,
    opts: Options,
    transfer: ImageTransfer,
    hri_position: u8,
    barcode_width: u8,
    barcode_height: u8,
    qr_size: u8,
    qr_level: u8,
}

impl<W: Write> Star<W> {
    pub fn new(cpl: usize, ppl: usize, sink: W, opts: Options) -> Self {
        let transfer = opts.image_transfer.unwrap_or(ImageTransfer::Banded);
        Self {
            base: Skipper::new(cpl, ppl, sink),
            opts,
            transfer,
            hri_position: 1,
            barcode_width: 1,
            barcode_height: 100,
            qr_size: 3,
            qr_level: 0,
        }
    }

    /// Consume the encoder and return its sink.
    pub fn into_inner(self) -> Option<W> {
        self.base.into_inner()
    }

    /// `ESC X` bands, feeding 12 units (24 dots) after each.
    fn image_banded(&mut self, img: &DynamicImage, invert: bool) -> Result<()> {
        let buf = rasterize(img, invert, RasterLayout::Bin, self.opts.threshold());
        if buf.is_empty() {
            return Ok(());
        }

        let [xl, xh] = split_le(buf.stride);
        debug!("ESC X: {} columns x {} bands", buf.stride, buf.rows());

        for band in buf.bands() {
            self.write(&[ESC, b'X', xl, xh])?;
            self.write(band)?;
            self.write(&[ESC, b'J', 12])?;
        }
        Ok(())
    }

    /// Whole image in one `ESC GS S` raster command (monochrome, black).
    fn image_raster(&mut self, img: &DynamicImage, invert: bool) -> Result<()> {
        let buf = rasterize(img, invert, RasterLayout::Bit, self.opts.threshold());
        if buf.is_empty() {
            return Ok(());
        }

        let [xl, xh] = split_le(buf.stride);
        let [yl, yh] = split_le(buf.rows());
        debug!("ESC GS S: {} bytes x {} rows", buf.stride, buf.rows());

        self.write(&[ESC, GS, b'S', 1, xl, xh, yl, yh, 0])?;
        self.write(&buf.data)
    }
}

/// `ESC b` type byte for a raw barcode mode; out-of-range modes print Code39.
pub fn barcode_type(m: u8) -> u8 {
    BARCODE_TYPES[BarcodeMode::from_u8(m) as usize]
}

impl<W: Write> Cmd for Star<W> {
    fn cpl(&self) -> usize {
        self.base.cpl()
    }

    fn ppl(&self) -> usize {
        self.base.ppl()
    }

    fn sizing(&mut self, cpl: usize, ppl: usize) {
        self.base.sizing(cpl, ppl);
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.base.write(bytes)
    }

    fn text(&mut self, s: &str, enc: Option<Encoder<'_>>) -> Result<()> {
        self.base.text(s, enc)
    }

    fn init(&mut self) -> Result<()> {
        self.write(&[ESC, b'@'])
    }

    /// Left margin in characters.
    fn left_margin(&mut self, n: usize) -> Result<()> {
        match clamp_below(n, self.cpl()) {
            Some(n) => self.write(&[ESC, b'l', n.min(255) as u8]),
            None => Ok(()),
        }
    }

    /// Right margin in characters.
    fn width_area(&mut self, n: usize) -> Result<()> {
        match clamp_below(n, self.cpl()) {
            Some(n) => self.write(&[ESC, b'Q', n.min(255) as u8]),
            None => Ok(()),
        }
    }

    fn absolute_position(&mut self, n: usize) -> Result<()> {
        match clamp_below(n, self.ppl()) {
            Some(n) => {
                let [nl, nh] = split_le(n);
                self.write(&[ESC, GS, b'A', nl, nh])
            }
            None => Ok(()),
        }
    }

    fn align(&mut self, b: u8) -> Result<()> {
        self.write(&[ESC, GS, b'a', clamp_max(b, 2)])
    }

    fn upside_down(&mut self, on: bool) -> Result<()> {
        self.write(&[if on { SI } else { DC2 }])
    }

    fn tab_positions(&mut self, positions: &[u8]) -> Result<()> {
        let stops = tab_stops(positions, MAX_TAB_STOPS);
        if stops.is_empty() {
            return Ok(());
        }
        let mut cmd = Vec::with_capacity(2 + stops.len());
        cmd.extend_from_slice(&[ESC, b'D']);
        cmd.extend(stops);
        self.write(&cmd)
    }

    fn tab(&mut self) -> Result<()> {
        self.write(&[HT])
    }

    fn code_page(&mut self, b: u8) -> Result<()> {
        self.write(&[ESC, GS, b't', b])
    }

    /// `ESC i n1 n2`: height then width multiplier, 0 (x1) to 5 (x6).
    fn char_size(&mut self, w: u8, h: u8) -> Result<()> {
        self.write(&[ESC, b'i', clamp_max(h, 5), clamp_max(w, 5)])
    }

    fn bold(&mut self, on: bool) -> Result<()> {
        self.write(&[ESC, if on { b'E' } else { b'F' }])
    }

    fn underline(&mut self, b: u8) -> Result<()> {
        self.write(&[ESC, b'-', clamp_max(b, 1)])
    }

    /// Barcode mode 1 <= b <= 9 (narrow/wide bar ratio), applied at `barcode`.
    fn barcode_width(&mut self, b: u8) -> Result<()> {
        self.barcode_width = clamp_range(b, 1, 9);
        Ok(())
    }

    fn barcode_height(&mut self, b: u8) -> Result<()> {
        self.barcode_height = b.max(1);
        Ok(())
    }

    /// 1 = no HRI, 2 = HRI under the bars.
    fn hri_position(&mut self, b: u8) -> Result<()> {
        self.hri_position = if b > 1 { 2 } else { 1 };
        Ok(())
    }

    fn barcode(&mut self, m: u8, data: &str) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }

        if self.opts.has_barcode_generator() {
            let opts = BarcodeOptions {
                mode: m,
                width: self.barcode_width.min(6),
                height: self.barcode_height,
            };
            return match self.opts.render_barcode(data, opts) {
                Some(img) => self.image(&img, false),
                None => Ok(()),
            };
        }

        self.write(&[
            ESC,
            b'b',
            barcode_type(m),
            self.hri_position,
            self.barcode_width,
            self.barcode_height,
        ])?;
        self.write(data.as_bytes())?;
        self.write(&[RS])
    }

    /// Cell size 1 <= b <= 8.
    fn qr_code_size(&mut self, b: u8) -> Result<()> {
        self.qr_size = clamp_range(b, 1, 8);
        self.write(&[ESC, GS, b'y', b'S', b'2', self.qr_size])
    }

    fn qr_code_correction_level(&mut self, b: u8) -> Result<()> {
        self.qr_level = clamp_max(b, 3);
        self.write(&[ESC, GS, b'y', b'S', b'1', self.qr_level])
    }

    fn qr_code(&mut self, data: &str) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }

        if self.opts.has_qr_generator() {
            let opts = QrCodeOptions {
                correction_level: self.qr_level,
                size: self.qr_size,
            };
            return match self.opts.render_qr(data, opts) {
                Some(img) => self.image(&img, false),
                None => Ok(()),
            };
        }

        let mut bytes = data.as_bytes();
        if bytes.len() > u16::MAX as usize {
            warn!("QR data truncated from {} to {} bytes", bytes.len(), u16::MAX);
            bytes = &bytes[..u16::MAX as usize];
        }

        // Store the data in the symbol storage area (auto-length mode 1).
        let [nl, nh] = split_le(bytes.len());
        self.write(&[ESC, GS, b'y', b'D', b'1', 0, nl, nh])?;
        self.write(bytes)?;

        // Print the symbol data in the symbol storage area.
        self.write(&[ESC, GS, b'y', b'P'])
    }

    fn image(&mut self, img: &DynamicImage, invert: bool) -> Result<()> {
        match self.transfer {
            ImageTransfer::Banded => self.image_banded(img, invert),
            ImageTransfer::Legacy | ImageTransfer::Graphics => self.image_raster(img, invert),
        }
    }

    fn feed(&mut self, n: u8) -> Result<()> {
        if n == 0 {
            return Ok(());
        }
        self.write(&[ESC, b'J', n])
    }

    fn line_feed(&mut self) -> Result<()> {
        self.write(&[LF])
    }

    /// `m` = 0 full cut, 1 partial cut, 2 feed then full cut,
    /// 3 feed then partial cut. The feed amount is fixed by the printer.
    fn cut(&mut self, m: u8, _p: u8) -> Result<()> {
        self.write(&[ESC, b'd', clamp_max(m, 3)])
    }

    fn full_cut(&mut self) -> Result<()> {
        self.cut(2, 0)
    }

    /// Pulse on/off times in 20 ms units; the shorter one is used as on time.
    fn open_cash_drawer(&mut self, m: u8, t1: u8, t2: u8) -> Result<()> {
        if t1 == 0 || t2 == 0 {
            return Ok(());
        }
        let (on, off) = if t1 > t2 { (t2, t1) } else { (t1, t2) };
        self.write(&[ESC, GS, BEL, clamp_max(m, 1) + 1, on, off])
    }

    fn print(&mut self) -> Result<()> {
        self.base.flush()
    }
}
