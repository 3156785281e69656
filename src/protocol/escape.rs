//! # ESC/POS Encoder
//!
//! Translates [`Cmd`] calls into Epson ESC/POS byte sequences. Every call
//! writes its command immediately; the only state kept is the barcode and
//! QR parameters a symbol generator needs.
//!
//! ## Image Transfer
//!
//! | [`ImageTransfer`] | Commands | Layout |
//! |-------------------|----------|--------|
//! | `Legacy` (default) | `GS v 0 m xL xH yL yH d...` | row-major bits |
//! | `Graphics` | `GS 8 L p1-p4 48 112 ...` then `GS ( L 2 0 48 50` | row-major bits |
//! | `Banded` | (`ESC * ! nL nH d...` `ESC J 24`) per 24 rows | column bands |
//!
//! ## Example
//!
//! ```
//! use thermalize::{Cmd, Escape, Options};
//!
//! let mut cmd = Escape::new(48, 576, Vec::new(), Options::new());
//! cmd.init()?;
//! cmd.bold(true)?;
//! cmd.text("TOTAL", None)?;
//! cmd.line_feed()?;
//! assert_eq!(cmd.into_inner().unwrap(), b"\x1b@\x1bE\x01TOTAL\n".to_vec());
//! # Ok::<(), thermalize::ThermalizeError>(())
//! ```

use std::io::Write;

use image::DynamicImage;
use log::{debug, warn};

use super::commands::{
    ESC, GS, HT, LF, clamp_below, clamp_max, clamp_range, split_le, tab_stops, u32_le,
};
use crate::cmd::{Cmd, Encoder, Skipper};
use crate::error::Result;
use crate::options::{BarcodeMode, BarcodeOptions, ImageTransfer, Options, QrCodeOptions};
use crate::render::raster::{RasterLayout, rasterize};

/// Maximum number of tab stops `ESC D` accepts.
pub const MAX_TAB_STOPS: usize = 32;

/// `GS k` mode byte for each [`BarcodeMode`].
const BARCODE_TYPES: [u8; 14] = [65, 66, 68, 67, 69, 72, 73, 70, 71, 74, 75, 76, 77, 78];

/// ESC/POS dialect encoder.
pub struct Escape<W> {
    base: Skipper<W>,
    opts: Options,
    transfer: ImageTransfer,
    barcode_width: u8,
    barcode_height: u8,
    qr_size: u8,
    qr_level: u8,
}

impl<W: Write> Escape<W> {
    pub fn new(cpl: usize, ppl: usize, sink: W, opts: Options) -> Self {
        let transfer = opts.image_transfer.unwrap_or(ImageTransfer::Legacy);
        Self {
            base: Skipper::new(cpl, ppl, sink),
            opts,
            transfer,
            barcode_width: 3,
            barcode_height: 162,
            qr_size: 3,
            qr_level: 0,
        }
    }

    /// Consume the encoder and return its sink.
    pub fn into_inner(self) -> Option<W> {
        self.base.into_inner()
    }

    fn toggle(&mut self, op: u8, on: bool) -> Result<()> {
        self.write(&[ESC, op, on as u8])
    }

    /// Write `GS v 0`: the whole bitmap in one command.
    fn image_legacy(&mut self, img: &DynamicImage, invert: bool) -> Result<()> {
        let buf = rasterize(img, invert, RasterLayout::Bit, self.opts.threshold());
        if buf.is_empty() {
            return Ok(());
        }

        let [xl, xh] = split_le(buf.stride);
        let [yl, yh] = split_le(buf.rows());
        debug!("GS v 0: {} bytes x {} rows", buf.stride, buf.rows());

        self.write(&[GS, b'v', b'0', 0, xl, xh, yl, yh])?;
        self.write(&buf.data)
    }

    /// Store the bitmap in the graphics buffer (`GS 8 L`, fn 112) and print it (fn 50).
    fn image_graphics(&mut self, img: &DynamicImage, invert: bool) -> Result<()> {
        let buf = rasterize(img, invert, RasterLayout::Bit, self.opts.threshold());
        if buf.is_empty() {
            return Ok(());
        }

        let [p1, p2, p3, p4] = u32_le(10 + buf.data.len() as u32);
        let [xl, xh] = split_le(buf.stride * 8);
        let [yl, yh] = split_le(buf.rows());
        debug!("GS 8 L: {} dots x {} rows", buf.stride * 8, buf.rows());

        // tone 48 (monochrome), bx = by = 1, color 49 (first color)
        self.write(&[GS, b'8', b'L', p1, p2, p3, p4, 48, 112, 48, 1, 1, 49, xl, xh, yl, yh])?;
        self.write(&buf.data)?;
        self.write(&[GS, b'(', b'L', 2, 0, 48, 50])
    }

    /// Send 24-dot bands with `ESC * !`, feeding 24 dots after each.
    fn image_banded(&mut self, img: &DynamicImage, invert: bool) -> Result<()> {
        let buf = rasterize(img, invert, RasterLayout::Bin, self.opts.threshold());
        if buf.is_empty() {
            return Ok(());
        }

        let [xl, xh] = split_le(buf.stride);
        debug!("ESC * !: {} columns x {} bands", buf.stride, buf.rows());

        for band in buf.bands() {
            self.write(&[ESC, b'*', b'!', xl, xh])?;
            self.write(band)?;
            self.write(&[ESC, b'J', 24])?;
        }
        Ok(())
    }
}

/// Map a cut mode to the nearest one `GS V` supports (0, 1, 65, 66).
pub fn cut_mode(m: u8) -> u8 {
    match m {
        0 | 1 | 65 | 66 => m,
        2..=33 => 1,
        34..=64 => 65,
        _ => 66,
    }
}

/// `GS k` mode byte for a raw barcode mode; out-of-range modes print Code39.
pub fn barcode_type(m: u8) -> u8 {
    BARCODE_TYPES[BarcodeMode::from_u8(m) as usize]
}

impl<W: Write> Cmd for Escape<W> {
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

    fn left_margin(&mut self, n: usize) -> Result<()> {
        match clamp_below(n, self.ppl()) {
            Some(n) => {
                let [nl, nh] = split_le(n);
                self.write(&[GS, b'L', nl, nh])
            }
            None => Ok(()),
        }
    }

    fn width_area(&mut self, n: usize) -> Result<()> {
        let [nl, nh] = split_le(n.min(self.ppl()));
        self.write(&[GS, b'W', nl, nh])
    }

    fn absolute_position(&mut self, n: usize) -> Result<()> {
        match clamp_below(n, self.ppl()) {
            Some(n) => {
                let [nl, nh] = split_le(n);
                self.write(&[ESC, b'$', nl, nh])
            }
            None => Ok(()),
        }
    }

    fn align(&mut self, b: u8) -> Result<()> {
        self.write(&[ESC, b'a', clamp_max(b, 2)])
    }

    fn upside_down(&mut self, on: bool) -> Result<()> {
        self.toggle(b'{', on)
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
        self.write(&[ESC, b't', b])
    }

    /// Width and height multipliers 0 (x1) to 7 (x8).
    fn char_size(&mut self, w: u8, h: u8) -> Result<()> {
        self.write(&[GS, b'!', (clamp_max(w, 7) << 4) | clamp_max(h, 7)])
    }

    fn bold(&mut self, on: bool) -> Result<()> {
        self.toggle(b'E', on)
    }

    fn clockwise_rotation(&mut self, on: bool) -> Result<()> {
        self.toggle(b'V', on)
    }

    fn underline(&mut self, b: u8) -> Result<()> {
        self.write(&[ESC, b'-', clamp_max(b, 2)])
    }

    /// 1 <= b <= 6.
    fn barcode_width(&mut self, b: u8) -> Result<()> {
        self.barcode_width = clamp_range(b, 1, 6);
        self.write(&[GS, b'w', self.barcode_width])
    }

    fn barcode_height(&mut self, b: u8) -> Result<()> {
        self.barcode_height = b.max(1);
        self.write(&[GS, b'h', self.barcode_height])
    }

    fn hri_font(&mut self, b: u8) -> Result<()> {
        self.write(&[GS, b'f', clamp_max(b, 1)])
    }

    fn hri_position(&mut self, b: u8) -> Result<()> {
        self.write(&[GS, b'H', clamp_max(b, 3)])
    }

    fn barcode(&mut self, m: u8, data: &str) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }

        if self.opts.has_barcode_generator() {
            let opts = BarcodeOptions {
                mode: m,
                width: self.barcode_width,
                height: self.barcode_height,
            };
            return match self.opts.render_barcode(data, opts) {
                Some(img) => self.image(&img, false),
                None => Ok(()),
            };
        }

        let mut bytes = data.as_bytes();
        if bytes.len() > 255 {
            warn!("barcode data truncated from {} to 255 bytes", bytes.len());
            bytes = &bytes[..255];
        }
        self.write(&[GS, b'k', barcode_type(m), bytes.len() as u8])?;
        self.write(bytes)
    }

    /// Module size, cn = 49, fn = 67. 1 <= b <= 16.
    fn qr_code_size(&mut self, b: u8) -> Result<()> {
        self.qr_size = clamp_range(b, 1, 16);
        self.write(&[GS, b'(', b'k', 3, 0, 49, 67, self.qr_size])
    }

    /// Error correction level, cn = 49, fn = 69.
    fn qr_code_correction_level(&mut self, b: u8) -> Result<()> {
        self.qr_level = clamp_max(b, 3);
        self.write(&[GS, b'(', b'k', 3, 0, 49, 69, 48 + self.qr_level])
    }

    fn qr_code(&mut self, data: &str) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }

        if self.opts.has_qr_generator() {
            let opts = QrCodeOptions {
                correction_level: self.qr_level,
                size: self.qr_size.min(8),
            };
            return match self.opts.render_qr(data, opts) {
                Some(img) => self.image(&img, false),
                None => Ok(()),
            };
        }

        let mut bytes = data.as_bytes();
        let max = u16::MAX as usize - 3;
        if bytes.len() > max {
            warn!("QR data truncated from {} to {} bytes", bytes.len(), max);
            bytes = &bytes[..max];
        }

        // Store the data in the symbol storage area (cn = 49, fn = 80).
        let [pl, ph] = split_le(bytes.len() + 3);
        self.write(&[GS, b'(', b'k', pl, ph, 49, 80, 48])?;
        self.write(bytes)?;

        // Print the symbol data in the symbol storage area (cn = 49, fn = 81).
        self.write(&[GS, b'(', b'k', 3, 0, 49, 81, 48])
    }

    fn image(&mut self, img: &DynamicImage, invert: bool) -> Result<()> {
        match self.transfer {
            ImageTransfer::Legacy => self.image_legacy(img, invert),
            ImageTransfer::Graphics => self.image_graphics(img, invert),
            ImageTransfer::Banded => self.image_banded(img, invert),
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

    /// `m` = 0 | 1 cuts at the current position; 65 | 66 feeds to
    /// (cutting position + `p` vertical motion units) and then cuts.
    fn cut(&mut self, m: u8, p: u8) -> Result<()> {
        match cut_mode(m) {
            m @ (0 | 1) => self.write(&[GS, b'V', m]),
            m => self.write(&[GS, b'V', m, p]),
        }
    }

    fn full_cut(&mut self) -> Result<()> {
        self.cut(65, 10)
    }

    /// Pulse on/off times in 2 ms units; the shorter one is used as on time.
    fn open_cash_drawer(&mut self, m: u8, t1: u8, t2: u8) -> Result<()> {
        if t1 == 0 || t2 == 0 {
            return Ok(());
        }
        let (on, off) = if t1 > t2 { (t2, t1) } else { (t1, t2) };
        self.write(&[ESC, b'p', clamp_max(m, 1), on, off])
    }

    fn print(&mut self) -> Result<()> {
        self.base.flush()
    }
}
