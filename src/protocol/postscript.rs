//! # PostScript Layout Engine
//!
//! Renders [`Cmd`] calls as a PostScript program, for printing receipts on
//! page printers or previewing them with a PostScript interpreter.
//!
//! Unlike the byte-command dialects, PostScript has no notion of a print
//! head moving down the paper. The engine keeps that state itself:
//!
//! - Text is queued as [`Piece`]s in the current [`Row`].
//! - A line feed places the row: the vertical cursor moves down by the row
//!   height and every piece is emitted as `moveto` + `show`.
//! - When the cursor would cross the bottom margin the page is shown and a
//!   new one is started.
//!
//! ## Geometry
//!
//! | Quantity | Value |
//! |----------|-------|
//! | Character width | 4.25 pt × width multiplier |
//! | Line height | 10.8 pt (0.79 × 10.8 × height multiplier when scaled) |
//! | Page width | CPL × 4.25 + 1 pt |
//! | Page height | 400 pt unless [`Options::page_height`] is given |
//! | Bottom margin | one line height |
//!
//! Text is wrapped by byte count, which is only exact for the fixed-pitch
//! font the engine selects (Noto Sans Mono).

use std::fmt;
use std::io::Write;
use std::mem;

use image::DynamicImage;
use log::{debug, warn};

use super::commands::{clamp_max, clamp_range, increasing_stops};
use crate::cmd::{Cmd, Encoder, Skipper, encode_text};
use crate::error::Result;
use crate::options::{Alignment, BarcodeOptions, Options, QrCodeOptions};
use crate::render::raster::{RasterBuffer, RasterLayout, rasterize};

/// Width of one character at scale 1, in points.
pub const CHAR_WIDTH: f64 = 4.25;

/// Height of one text line at scale 1, in points.
pub const LINE_FEED: f64 = 10.8;

/// Page height used when [`Options::page_height`] is not set.
pub const DEFAULT_PAGE_HEIGHT: f64 = 400.0;

/// Maximum number of caller-supplied tab stops.
pub const MAX_TAB_STOPS: usize = 16;

/// Vertical space left under every image.
const IMAGE_GAP: f64 = 4.0;

/// Font size before the width/height matrix is applied.
const FONT_SIZE: u8 = 9;

/// Horizontal squeeze applied to the font so 9 pt glyphs advance 4.25 pt.
const FONT_ASPECT: f64 = 0.79;

/// Printed instead of an image that can not fit on one page.
const IMAGE_TOO_TALL: &str = "the height of the image is greater than the height of the page";

/// Builds a fresh list of the 31 default tab stops (every 8 characters).
fn default_tab_stops() -> Vec<f64> {
    (1..=31).map(|i| f64::from(i) * 34.0).collect()
}

// ============================================================================
// ROW STATE
// ============================================================================

/// One run of text with uniform style, queued in a [`Row`].
#[derive(Debug, Clone, PartialEq)]
pub struct Piece {
    /// PostScript string body, already escaped
    pub data: Vec<u8>,
    /// Advance width in points
    pub width: f64,
    /// Horizontal gap before the piece, in points
    pub tab: f64,
    pub size_x: u8,
    pub size_y: u8,
    pub underline: u8,
    pub bold: bool,
}

/// Pieces waiting to be placed on the current line.
///
/// The row is cleared after every line feed and its piece buffer reused.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub pieces: Vec<Piece>,
    pub height: f64,
    pub width: f64,
    pub align: Alignment,
}

impl Default for Row {
    fn default() -> Self {
        Self {
            pieces: Vec::new(),
            height: LINE_FEED,
            width: 0.0,
            align: Alignment::Left,
        }
    }
}

impl Row {
    /// Grow the row to fit text with height multiplier `size_y`.
    fn fit(&mut self, size_y: u8) {
        let scale = if size_y > 1 {
            FONT_ASPECT * f64::from(size_y)
        } else {
            1.0
        };
        self.height = self.height.max(LINE_FEED * scale);
    }

    fn clear(&mut self) {
        self.pieces.clear();
        self.height = LINE_FEED;
        self.width = 0.0;
    }
}

/// Last font selected in the output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Font {
    bold: bool,
    size_x: u8,
    size_y: u8,
    /// A `setfont` must be emitted before the next `show`
    dirty: bool,
}

impl Default for Font {
    fn default() -> Self {
        Self {
            bold: false,
            size_x: 1,
            size_y: 1,
            dirty: true,
        }
    }
}

impl Font {
    fn select(&mut self, bold: bool, size_x: u8, size_y: u8) {
        if (self.bold, self.size_x, self.size_y) != (bold, size_x, size_y) {
            self.bold = bold;
            self.size_x = size_x;
            self.size_y = size_y;
            self.dirty = true;
        }
    }

    fn style(&self) -> &'static str {
        if self.bold { "Bold" } else { "Regular" }
    }
}

/// Where the engine is in the document lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Before `init`: sizing still allowed, no page header written
    Fresh,
    /// A page header has been written and text is being placed
    Open,
    /// `print` has shown the last page
    Closed,
}

// ============================================================================
// ENCODER
// ============================================================================

/// PostScript dialect encoder.
pub struct Postscript<W> {
    base: Skipper<W>,
    opts: Options,
    phase: Phase,

    tab_stops: Vec<f64>,
    width: f64,
    height: f64,
    y: f64,
    tab: f64,

    row: Row,
    font: Font,
    bold: bool,
    size_x: u8,
    size_y: u8,
    align: Alignment,
    underline: u8,

    barcode_width: u8,
    barcode_height: u8,
    qr_size: u8,
    qr_level: u8,
}

impl<W: Write> Postscript<W> {
    pub fn new(cpl: usize, ppl: usize, sink: W, opts: Options) -> Self {
        let height = opts.page_height.unwrap_or(DEFAULT_PAGE_HEIGHT);
        Self {
            base: Skipper::new(cpl, ppl, sink),
            opts,
            phase: Phase::Fresh,
            tab_stops: default_tab_stops(),
            width: page_width(cpl),
            height,
            y: height,
            tab: 0.0,
            row: Row::default(),
            font: Font::default(),
            bold: false,
            size_x: 1,
            size_y: 1,
            align: Alignment::Left,
            underline: 0,
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

    /// Vertical cursor, in points from the bottom of the page.
    pub fn vertical_position(&self) -> f64 {
        self.y
    }

    pub fn page_width(&self) -> f64 {
        self.width
    }

    pub fn page_height(&self) -> f64 {
        self.height
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn emit(&mut self, args: fmt::Arguments<'_>) -> Result<()> {
        self.write(args.to_string().as_bytes())
    }

    fn set_page(&mut self) -> Result<()> {
        let (width, height) = (self.width, self.height);
        self.emit(format_args!(
            "%!PS\n<< /PageSize [{width:.2} {height:.2}] >> setpagedevice\n\
             /showEuro {{/Euro glyphshow}} def\n"
        ))
    }

    fn show_page(&mut self) -> Result<()> {
        self.y = self.height;
        self.font.dirty = true;
        self.write(b"showpage\n")
    }

    fn new_page(&mut self) -> Result<()> {
        debug!("page break at y={:.2}", self.y);
        self.show_page()?;
        self.set_page()
    }

    /// Move the cursor down by `h`, breaking the page if it would cross
    /// the bottom margin.
    fn advance(&mut self, h: f64) -> Result<()> {
        self.y -= h;
        if self.y < LINE_FEED {
            self.new_page()?;
            self.y -= h;
        }
        Ok(())
    }

    fn set_font(&mut self) -> Result<()> {
        if !self.font.dirty {
            return Ok(());
        }
        let Font { size_x, size_y, .. } = self.font;
        let style = self.font.style();
        debug!("setfont {style} {size_x}x{size_y}");
        self.emit(format_args!(
            "/NotoSansMono-{style} findfont {FONT_SIZE} scalefont\n\
             dup [{:.2} 0 0 {size_y} 0 0] makefont setfont\n",
            f64::from(size_x) * FONT_ASPECT
        ))?;
        self.font.dirty = false;
        Ok(())
    }

    fn stroke_underline(&mut self, underline: u8, offset: f64, width: f64) -> Result<()> {
        let weight = match underline {
            0 => return Ok(()),
            1 => 0.25,
            _ => 0.75,
        };
        let y = self.y - 2.0;
        self.emit(format_args!(
            "{weight} setlinewidth\n{offset:.2} {y:.2} moveto\n{:.2} {y:.2} lineto\nstroke\n",
            offset + width
        ))
    }

    /// Left edge of something `w` points wide under `align`.
    fn offset(&self, w: f64, align: Alignment) -> f64 {
        match align {
            Alignment::Left => 0.0,
            Alignment::Center => (self.width - w) / 2.0,
            Alignment::Right => self.width - w,
        }
    }

    fn place_image(&mut self, buf: &RasterBuffer) -> Result<()> {
        let (px_w, px_h) = (buf.width as f64, buf.height as f64);
        let w = px_w * self.width / self.ppl().max(1) as f64;
        let h = w * px_h / px_w;

        if h > self.height {
            warn!("image {}x{} is {h:.2}pt tall, page is {:.2}pt", buf.width, buf.height, self.height);
            return self.text(IMAGE_TOO_TALL, None);
        }

        if !self.row.pieces.is_empty() {
            self.line_feed()?;
        }

        self.advance(h)?;
        self.y -= IMAGE_GAP;
        debug!("image {}x{} placed at y={:.2}", buf.width, buf.height, self.y);

        let (cols, rows) = (buf.width, buf.height);
        let x = self.offset(w, self.align);
        let y = self.y;
        self.emit(format_args!(
            "gsave\n/picstr {cols} string def\n{x:.2} {y:.2} translate\n\
             {w:.2} {h:.2} scale\n{cols} {rows} 8\n[{cols} 0 0 {rows} neg 0 {rows}]\n\
             {{ currentfile picstr readhexstring pop }}\nimage\n"
        ))?;

        let mut hex = String::with_capacity(buf.stride * 2 + 1);
        for line in buf.data.chunks(buf.stride) {
            hex.clear();
            for b in line {
                hex.push_str(&format!("{b:02X}"));
            }
            hex.push('\n');
            self.write(hex.as_bytes())?;
        }

        self.write(b"grestore\n")
    }
}

/// Page width for `cpl` characters.
pub fn page_width(cpl: usize) -> f64 {
    cpl as f64 * CHAR_WIDTH + 1.0
}

/// Escape a text run for a PostScript string literal.
///
/// The Euro sign (byte 0x80 in the printer code pages) has no slot in the
/// standard encoding, so the string is closed around a `showEuro` call.
pub fn escape_show(text: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for &b in text {
        match b {
            b'\\' | b'(' | b')' => out.extend_from_slice(&[b'\\', b]),
            0x80 => out.extend_from_slice(b") show showEuro ("),
            _ => out.push(b),
        }
    }
    out
}

/// Split `text` into line chunks of `char_width`-wide characters.
///
/// The first chunk fills what is left of a line that already holds
/// `offset` points; the rest fill whole lines. The first chunk is empty
/// when nothing fits after `offset`.
pub fn wrap(text: &[u8], page_width: f64, offset: f64, char_width: f64) -> Vec<&[u8]> {
    let per_line = ((page_width / char_width) as usize).max(1);
    let first = if offset > 0.0 {
        ((page_width - offset) / char_width).max(0.0) as usize
    } else {
        per_line
    };

    if first >= text.len() {
        return vec![text];
    }

    let (head, rest) = text.split_at(first);
    let mut chunks = vec![head];
    chunks.extend(rest.chunks(per_line));
    chunks
}

impl<W: Write> Cmd for Postscript<W> {
    fn cpl(&self) -> usize {
        self.base.cpl()
    }

    fn ppl(&self) -> usize {
        self.base.ppl()
    }

    /// Resize the page. Ignored once `init` has written a page header.
    fn sizing(&mut self, cpl: usize, ppl: usize) {
        if self.phase != Phase::Fresh {
            warn!("sizing({cpl}, {ppl}) ignored: page already started");
            return;
        }
        self.base.sizing(cpl, ppl);
        if cpl != 0 {
            self.width = page_width(cpl);
        }
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.base.write(bytes)
    }

    fn text(&mut self, s: &str, enc: Option<Encoder<'_>>) -> Result<()> {
        if s.is_empty() {
            return Ok(());
        }

        let bytes = encode_text(s, enc);
        self.row.align = self.align;

        let char_width = f64::from(self.size_x) * CHAR_WIDTH;
        let chunks = wrap(&bytes, self.width, self.tab + self.row.width, char_width);

        for (i, chunk) in chunks.into_iter().enumerate() {
            if i > 0 {
                self.line_feed()?;
            }
            if chunk.is_empty() {
                self.tab = 0.0;
                continue;
            }

            self.row.fit(self.size_y);

            let piece = Piece {
                data: escape_show(chunk),
                width: chunk.len() as f64 * char_width,
                tab: self.tab,
                size_x: self.size_x,
                size_y: self.size_y,
                underline: self.underline,
                bold: self.bold,
            };

            self.row.width += self.tab + piece.width;
            self.row.pieces.push(piece);
            self.tab = 0.0;
        }
        Ok(())
    }

    fn init(&mut self) -> Result<()> {
        self.align = Alignment::Left;
        self.underline = 0;
        self.font = Font::default();
        self.phase = Phase::Open;
        self.set_page()
    }

    fn align(&mut self, b: u8) -> Result<()> {
        self.align = Alignment::from_u8(b);
        Ok(())
    }

    /// Replace the tab stops. Stops past the page edge collapse into one
    /// final stop at the page width.
    fn tab_positions(&mut self, positions: &[u8]) -> Result<()> {
        if positions.is_empty() {
            return Ok(());
        }

        let mut stops = Vec::with_capacity(MAX_TAB_STOPS);
        for n in increasing_stops(positions, MAX_TAB_STOPS) {
            let stop = f64::from(n) * CHAR_WIDTH;
            if stop >= self.width {
                stops.push(self.width);
                break;
            }
            stops.push(stop);
        }
        self.tab_stops = stops;
        Ok(())
    }

    /// Advance to the first stop past the current position, counting tabs
    /// not yet consumed by text. A stop beyond the page edge starts a new line.
    fn tab(&mut self) -> Result<()> {
        let width = self.row.width;
        let position = width + self.tab;
        let Some(stop) = self.tab_stops.iter().copied().find(|&x| position < x) else {
            return Ok(());
        };

        if stop > self.width {
            self.line_feed()?;
            self.tab = 0.0;
            return Ok(());
        }
        self.tab = stop - width;
        Ok(())
    }

    fn char_size(&mut self, w: u8, h: u8) -> Result<()> {
        self.size_x = clamp_max(w, 5) + 1;
        self.size_y = clamp_max(h, 5) + 1;
        Ok(())
    }

    fn bold(&mut self, on: bool) -> Result<()> {
        self.bold = on;
        Ok(())
    }

    fn underline(&mut self, b: u8) -> Result<()> {
        self.underline = clamp_max(b, 2);
        Ok(())
    }

    fn barcode_width(&mut self, b: u8) -> Result<()> {
        self.barcode_width = clamp_range(b, 1, 6);
        Ok(())
    }

    fn barcode_height(&mut self, b: u8) -> Result<()> {
        self.barcode_height = b.max(1);
        Ok(())
    }

    /// Drawn with the barcode generator; skipped without one.
    fn barcode(&mut self, m: u8, data: &str) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        let opts = BarcodeOptions {
            mode: m,
            width: self.barcode_width,
            height: self.barcode_height,
        };
        match self.opts.render_barcode(data, opts) {
            Some(img) => self.image(&img, false),
            None => Ok(()),
        }
    }

    fn qr_code_size(&mut self, b: u8) -> Result<()> {
        self.qr_size = clamp_range(b, 1, 8);
        Ok(())
    }

    fn qr_code_correction_level(&mut self, b: u8) -> Result<()> {
        self.qr_level = clamp_max(b, 3);
        Ok(())
    }

    /// Drawn with the QR generator; skipped without one.
    fn qr_code(&mut self, data: &str) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        let opts = QrCodeOptions {
            correction_level: self.qr_level,
            size: self.qr_size,
        };
        match self.opts.render_qr(data, opts) {
            Some(img) => self.image(&img, false),
            None => Ok(()),
        }
    }

    fn image(&mut self, img: &DynamicImage, invert: bool) -> Result<()> {
        let buf = rasterize(img, invert, RasterLayout::Bytes, self.opts.threshold());
        if buf.is_empty() {
            return Ok(());
        }
        self.place_image(&buf)
    }

    /// Place the queued row and start a new one.
    fn line_feed(&mut self) -> Result<()> {
        self.advance(self.row.height)?;

        let mut offset = self.offset(self.row.width, self.row.align);
        let mut pieces = mem::take(&mut self.row.pieces);

        for piece in &pieces {
            self.font.select(piece.bold, piece.size_x, piece.size_y);
            self.set_font()?;

            offset += piece.tab;
            let y = self.y;
            self.emit(format_args!("{offset:.2} {y:.2} moveto\n("))?;
            self.write(&piece.data)?;
            self.write(b") show\n")?;
            self.stroke_underline(piece.underline, offset, piece.width)?;

            offset += piece.width;
        }

        pieces.clear();
        self.row.pieces = pieces;
        self.row.clear();
        Ok(())
    }

    /// Place the last row, show the page and flush the sink.
    ///
    /// A second `print` without an `init` in between emits nothing.
    fn print(&mut self) -> Result<()> {
        if self.phase == Phase::Closed {
            return Ok(());
        }
        self.line_feed()?;
        self.show_page()?;
        self.phase = Phase::Closed;
        self.base.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn engine(cpl: usize, opts: Options) -> Postscript<Vec<u8>> {
        Postscript::new(cpl, 576, Vec::new(), opts.gray_level(127))
    }

    fn output(cmd: Postscript<Vec<u8>>) -> String {
        String::from_utf8(cmd.into_inner().unwrap()).unwrap()
    }

    const HEADER: &str = "%!PS\n<< /PageSize [205.00 400.00] >> setpagedevice\n\
                          /showEuro {/Euro glyphshow} def\n";

    const REGULAR: &str = "/NotoSansMono-Regular findfont 9 scalefont\n\
                           dup [0.79 0 0 1 0 0] makefont setfont\n";

    #[test]
    fn test_header_and_first_line() {
        let mut cmd = engine(48, Options::new());
        cmd.init().unwrap();
        cmd.text("Hi", None).unwrap();
        cmd.line_feed().unwrap();

        let expected = format!("{HEADER}{REGULAR}0.00 389.20 moveto\n(Hi) show\n");
        assert_eq!(output(cmd), expected);
    }

    #[test]
    fn test_default_tab_stops() {
        let stops = default_tab_stops();
        assert_eq!(stops.len(), 31);
        assert_eq!(stops[0], 34.0);
        assert_eq!(stops[30], 1054.0);
    }

    #[test]
    fn test_wrap_two_lines_and_one() {
        // 4 characters per line: 4 * 4.25 + 1 = 18pt.
        assert_eq!(page_width(4), 18.0);
        let chunks = wrap(b"abcdefghi", 18.0, 0.0, CHAR_WIDTH);
        assert_eq!(chunks, vec![&b"abcd"[..], &b"efgh"[..], &b"i"[..]]);
    }

    #[test]
    fn test_wrap_after_offset() {
        let chunks = wrap(b"abcdef", 18.0, 8.5, CHAR_WIDTH);
        assert_eq!(chunks, vec![&b"ab"[..], &b"cdef"[..]]);

        let chunks = wrap(b"abc", 18.0, 30.0, CHAR_WIDTH);
        assert_eq!(chunks, vec![&b""[..], &b"abc"[..]]);
    }

    #[test]
    fn test_long_text_spans_lines() {
        let mut cmd = engine(4, Options::new());
        cmd.init().unwrap();
        cmd.text("abcdefghi", None).unwrap();
        assert_eq!(cmd.row.pieces.len(), 1);
        cmd.line_feed().unwrap();

        let out = output(cmd);
        assert!(out.contains("0.00 389.20 moveto\n(abcd) show\n"));
        assert!(out.contains("0.00 378.40 moveto\n(efgh) show\n"));
        assert!(out.contains("(i) show\n"));
    }

    #[test]
    fn test_pagination_breaks_once() {
        let mut cmd = engine(48, Options::new().page_height(100.0));
        cmd.init().unwrap();
        for _ in 0..9 {
            cmd.text("x", None).unwrap();
            cmd.line_feed().unwrap();
        }
        assert!((cmd.vertical_position() - 89.2).abs() < 1e-9);

        let out = output(cmd);
        assert_eq!(out.matches("showpage\n").count(), 1);
        assert_eq!(out.matches("%!PS\n").count(), 2);
    }

    #[test]
    fn test_font_emitted_only_on_change() {
        let mut cmd = engine(48, Options::new());
        cmd.init().unwrap();
        cmd.text("a", None).unwrap();
        cmd.line_feed().unwrap();
        cmd.text("b", None).unwrap();
        cmd.line_feed().unwrap();
        cmd.bold(true).unwrap();
        cmd.text("c", None).unwrap();
        cmd.line_feed().unwrap();

        let out = output(cmd);
        assert_eq!(out.matches("findfont").count(), 2);
        assert!(out.contains("/NotoSansMono-Bold findfont 9 scalefont\n"));
    }

    #[test]
    fn test_char_size_scales_row() {
        let mut cmd = engine(48, Options::new());
        cmd.init().unwrap();
        cmd.char_size(1, 1).unwrap();
        cmd.text("W", None).unwrap();
        assert!((cmd.row.height - LINE_FEED * 0.79 * 2.0).abs() < 1e-9);
        assert_eq!(cmd.row.width, 8.5);
        cmd.line_feed().unwrap();

        assert!(output(cmd).contains("dup [1.58 0 0 2 0 0] makefont setfont\n"));
    }

    #[test]
    fn test_tab_advances_to_stop() {
        let mut cmd = engine(48, Options::new());
        cmd.init().unwrap();
        cmd.text("ab", None).unwrap();
        cmd.tab().unwrap();
        cmd.text("c", None).unwrap();
        cmd.line_feed().unwrap();

        let out = output(cmd);
        assert!(out.contains("0.00 389.20 moveto\n(ab) show\n34.00 389.20 moveto\n(c) show\n"));
    }

    #[test]
    fn test_caller_tab_stops_clamped_to_page() {
        let mut cmd = engine(20, Options::new());
        cmd.tab_positions(&[10, 5, 100, 120]).unwrap();
        assert_eq!(cmd.tab_stops, vec![42.5, 86.0]);

        cmd.tab_positions(&[]).unwrap();
        assert_eq!(cmd.tab_stops, vec![42.5, 86.0]);
    }

    #[test]
    fn test_alignment() {
        let mut cmd = engine(48, Options::new());
        cmd.init().unwrap();
        cmd.align(2).unwrap();
        cmd.text("ab", None).unwrap();
        cmd.line_feed().unwrap();
        cmd.align(1).unwrap();
        cmd.text("ab", None).unwrap();
        cmd.line_feed().unwrap();

        let out = output(cmd);
        assert!(out.contains("196.50 389.20 moveto\n"));
        assert!(out.contains("98.25 378.40 moveto\n"));
    }

    #[test]
    fn test_underline_stroke() {
        let mut cmd = engine(48, Options::new());
        cmd.init().unwrap();
        cmd.underline(1).unwrap();
        cmd.text("ab", None).unwrap();
        cmd.line_feed().unwrap();

        let out = output(cmd);
        assert!(out.contains("0.25 setlinewidth\n0.00 387.20 moveto\n8.50 387.20 lineto\nstroke\n"));
    }

    #[test]
    fn test_double_underline_stroke() {
        let mut cmd = engine(48, Options::new());
        cmd.init().unwrap();
        cmd.underline(2).unwrap();
        cmd.text("abc", None).unwrap();
        cmd.line_feed().unwrap();

        let out = output(cmd);
        assert!(out.contains("0.75 setlinewidth\n0.00 387.20 moveto\n12.75 387.20 lineto\nstroke\n"));
        assert!(!out.contains("0.25 setlinewidth"));
    }

    #[test]
    fn test_consecutive_tabs() {
        let mut cmd = engine(48, Options::new());
        cmd.init().unwrap();
        cmd.text("a", None).unwrap();
        cmd.tab().unwrap();
        cmd.tab().unwrap();
        cmd.text("b", None).unwrap();
        cmd.line_feed().unwrap();

        assert!(output(cmd).contains("68.00 389.20 moveto\n(b) show\n"));
    }

    #[test]
    fn test_tab_past_page_edge_starts_new_line() {
        let mut cmd = engine(48, Options::new());
        cmd.init().unwrap();
        cmd.text(&"a".repeat(48), None).unwrap();
        cmd.tab().unwrap();
        assert_eq!(cmd.tab, 0.0);
        assert!(cmd.row.pieces.is_empty());
        cmd.text("b", None).unwrap();
        cmd.line_feed().unwrap();

        let out = output(cmd);
        assert!(out.contains(&format!("0.00 389.20 moveto\n({}) show\n", "a".repeat(48))));
        assert!(out.contains("0.00 378.40 moveto\n(b) show\n"));
    }

    #[test]
    fn test_image_crossing_margin_breaks_page() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(576, 120, Luma([0])));
        let mut cmd = engine(48, Options::new().page_height(100.0));
        cmd.init().unwrap();
        for _ in 0..5 {
            cmd.text("x", None).unwrap();
            cmd.line_feed().unwrap();
        }
        cmd.image(&img, false).unwrap();

        // 576 dots span the 205pt page, so 120 rows are 205 * 120 / 576 pt.
        let h = 205.0 * 120.0 / 576.0;
        assert!((cmd.vertical_position() - (100.0 - h - IMAGE_GAP)).abs() < 1e-9);

        let out = output(cmd);
        assert_eq!(out.matches("showpage\n").count(), 1);
        let page_break = out.find("showpage\n").unwrap();
        let image = out.find("gsave\n").unwrap();
        assert!(page_break < image);
        assert_eq!(out.matches("%!PS\n").count(), 2);
    }

    #[test]
    fn test_escaping_and_euro() {
        assert_eq!(escape_show(b"(a)\\"), b"\\(a\\)\\\\".to_vec());
        assert_eq!(escape_show(b"5\x80"), b"5) show showEuro (".to_vec());
    }

    #[test]
    fn test_image_body() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_fn(2, 1, |x, _| Luma([if x == 0 { 0 } else { 255 }])));
        let mut cmd = engine(48, Options::new());
        cmd.init().unwrap();
        cmd.image(&img, false).unwrap();

        let expected = format!(
            "{HEADER}gsave\n/picstr 2 string def\n0.00 395.64 translate\n0.71 0.36 scale\n\
             2 1 8\n[2 0 0 1 neg 0 1]\n{{ currentfile picstr readhexstring pop }}\nimage\n\
             00FF\ngrestore\n"
        );
        assert_eq!(output(cmd), expected);
    }

    #[test]
    fn test_image_taller_than_page() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(200, 576, Luma([0])));
        let mut cmd = engine(80, Options::new().page_height(100.0));
        cmd.init().unwrap();
        cmd.image(&img, false).unwrap();
        cmd.print().unwrap();

        let out = output(cmd);
        assert!(out.contains(&format!("({IMAGE_TOO_TALL}) show\n")));
        assert!(!out.contains("gsave"));
    }

    #[test]
    fn test_sizing_only_before_init() {
        let mut cmd = engine(48, Options::new());
        cmd.sizing(32, 384);
        assert_eq!(cmd.page_width(), page_width(32));
        cmd.init().unwrap();
        cmd.sizing(10, 100);
        assert_eq!((cmd.cpl(), cmd.ppl()), (32, 384));
    }

    #[test]
    fn test_print_closes_once() {
        let mut cmd = engine(48, Options::new());
        cmd.init().unwrap();
        cmd.print().unwrap();
        cmd.print().unwrap();
        assert_eq!(cmd.phase(), Phase::Closed);
        assert_eq!(output(cmd).matches("showpage").count(), 1);
    }

    #[test]
    fn test_barcode_without_generator_skipped() {
        let mut cmd = engine(48, Options::new());
        cmd.barcode(4, "123").unwrap();
        cmd.qr_code("x").unwrap();
        assert!(output(cmd).is_empty());
    }
}
