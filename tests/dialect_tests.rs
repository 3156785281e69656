//! # Dialect Tests
//!
//! Drive every encoder through the same call sequences and compare the
//! exact bytes (or PostScript text) they produce.
//!
//! Image tests pass an explicit gray level so they do not depend on the
//! process-wide one, which only `test_global_gray_level` changes.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use image::{DynamicImage, GrayImage, Luma};
use pretty_assertions::assert_eq;
use thermalize::render::raster::{GrayLevel, RasterLayout, rasterize, rasterize_global};
use thermalize::{
    Cmd, Dialect, Escape, Options, Postscript, Star, ThermalizeError, gray_level, open,
    reset_gray_level, set_gray_level,
};

const ESC: u8 = 0x1B;
const GS: u8 = 0x1D;
const LF: u8 = 0x0A;
const BEL: u8 = 0x07;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Sink that stays readable after the encoder is boxed.
#[derive(Clone, Default)]
struct SharedBuf(Rc<RefCell<Vec<u8>>>);

impl SharedBuf {
    fn bytes(&self) -> Vec<u8> {
        self.0.borrow().clone()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Sink that fails every write.
struct Broken;

impl Write for Broken {
    fn write(&mut self, _: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "printer gone"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A short receipt using operations every dialect supports.
fn receipt(cmd: &mut dyn Cmd) -> thermalize::Result<()> {
    cmd.init()?;
    cmd.align(1)?;
    cmd.bold(true)?;
    cmd.text("TOTAL", None)?;
    cmd.bold(false)?;
    cmd.line_feed()?;
    cmd.feed(3)?;
    cmd.open_cash_drawer(0, 200, 50)?;
    cmd.full_cut()?;
    cmd.print()
}

fn run(dialect: Dialect, f: impl FnOnce(&mut dyn Cmd) -> thermalize::Result<()>) -> Vec<u8> {
    let buf = SharedBuf::default();
    let mut cmd = open(dialect, 48, 576, buf.clone(), Options::new().gray_level(127));
    f(cmd.as_mut()).unwrap();
    buf.bytes()
}

fn checker(w: u32, h: u32) -> DynamicImage {
    DynamicImage::ImageLuma8(GrayImage::from_fn(w, h, |x, _| {
        Luma([if x % 2 == 0 { 0 } else { 255 }])
    }))
}

// ============================================================================
// RECEIPTS
// ============================================================================

#[test]
fn test_escape_receipt() {
    let mut expected = vec![ESC, b'@', ESC, b'a', 1, ESC, b'E', 1];
    expected.extend(b"TOTAL");
    expected.extend([ESC, b'E', 0, LF, ESC, b'J', 3]);
    expected.extend([ESC, b'p', 0, 50, 200]);
    expected.extend([GS, b'V', 65, 10]);
    assert_eq!(run(Dialect::Escape, receipt), expected);
}

#[test]
fn test_star_receipt() {
    let mut expected = vec![ESC, b'@', ESC, GS, b'a', 1, ESC, b'E'];
    expected.extend(b"TOTAL");
    expected.extend([ESC, b'F', LF, ESC, b'J', 3]);
    expected.extend([ESC, GS, BEL, 1, 50, 200]);
    expected.extend([ESC, b'd', 2]);
    assert_eq!(run(Dialect::Star, receipt), expected);
}

#[test]
fn test_null_receipt_keeps_text_only() {
    assert_eq!(run(Dialect::Null, receipt), b"TOTAL".to_vec());
}

#[test]
fn test_postscript_receipt() {
    let out = String::from_utf8(run(Dialect::Postscript, receipt)).unwrap();
    let expected = "%!PS\n\
        << /PageSize [205.00 400.00] >> setpagedevice\n\
        /showEuro {/Euro glyphshow} def\n\
        /NotoSansMono-Bold findfont 9 scalefont\n\
        dup [0.79 0 0 1 0 0] makefont setfont\n\
        91.88 389.20 moveto\n\
        (TOTAL) show\n\
        showpage\n";
    assert_eq!(out, expected);
}

// ============================================================================
// SHARED PROPERTIES
// ============================================================================

#[test]
fn test_unknown_barcode_mode_prints_code39() {
    for dialect in [Dialect::Escape, Dialect::Star] {
        let a = run(dialect, |c| c.barcode(99, "123"));
        let b = run(dialect, |c| c.barcode(4, "123"));
        assert_eq!(a, b, "{}", dialect.name());
        assert!(!a.is_empty());
    }
}

#[test]
fn test_tab_stops_deduplicated() {
    assert_eq!(
        run(Dialect::Escape, |c| c.tab_positions(&[10, 5, 20, 20, 30])),
        vec![ESC, b'D', 10, 20, 30, 0]
    );
    assert_eq!(
        run(Dialect::Star, |c| c.tab_positions(&[10, 5, 20, 20, 30])),
        vec![ESC, b'D', 10, 20, 30, 0]
    );
}

#[test]
fn test_cash_drawer_zero_time_cancels() {
    for dialect in Dialect::ALL {
        assert!(run(dialect, |c| c.open_cash_drawer(1, 0, 20)).is_empty());
        assert!(run(dialect, |c| c.open_cash_drawer(1, 20, 0)).is_empty());
    }
}

#[test]
fn test_degenerate_input_is_skipped() {
    let empty = DynamicImage::ImageLuma8(GrayImage::new(0, 0));
    for dialect in [Dialect::Escape, Dialect::Star, Dialect::Postscript] {
        let out = run(dialect, |c| {
            c.text("", None)?;
            c.barcode(4, "")?;
            c.qr_code("")?;
            c.image(&empty, false)?;
            c.feed(0)
        });
        assert!(out.is_empty(), "{}", dialect.name());
    }
}

// ============================================================================
// IMAGES
// ============================================================================

#[test]
fn test_banded_images_match_column_layout() {
    let img = checker(4, 30);
    let buf = rasterize(&img, false, RasterLayout::Bin, GrayLevel(127));
    assert_eq!(buf.bands().count(), 2);

    let mut cmd = Star::new(48, 576, Vec::new(), Options::new().gray_level(127));
    cmd.image(&img, false).unwrap();
    let out = cmd.into_inner().unwrap();

    let mut expected = Vec::new();
    for band in buf.bands() {
        expected.extend([ESC, b'X', 4, 0]);
        expected.extend(band);
        expected.extend([ESC, b'J', 12]);
    }
    assert_eq!(out, expected);
}

#[test]
fn test_escape_legacy_image() {
    let mut cmd = Escape::new(48, 576, Vec::new(), Options::new().gray_level(127));
    cmd.image(&checker(8, 2), false).unwrap();
    let out = cmd.into_inner().unwrap();
    assert_eq!(out, vec![GS, b'v', b'0', 0, 1, 0, 2, 0, 0xAA, 0xAA]);
}

#[test]
fn test_inverted_image() {
    let mut cmd = Escape::new(48, 576, Vec::new(), Options::new().gray_level(127));
    cmd.image(&checker(8, 1), true).unwrap();
    let out = cmd.into_inner().unwrap();
    assert_eq!(out.last(), Some(&0x55));
}

#[test]
fn test_global_gray_level() {
    let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(8, 1, Luma([100])));
    assert_eq!(gray_level(), 127);

    set_gray_level(90);
    let light = rasterize_global(&img, false, RasterLayout::Bit);
    reset_gray_level();
    let dark = rasterize_global(&img, false, RasterLayout::Bit);

    assert_eq!(light.data, vec![0x00]);
    assert_eq!(dark.data, vec![0xFF]);
    assert_eq!(gray_level(), 127);
}

// ============================================================================
// LAYOUT
// ============================================================================

#[test]
fn test_postscript_wraps_long_text() {
    // 4 * 4.25 + 1 = 18pt: four characters per line.
    let mut cmd = Postscript::new(4, 576, Vec::new(), Options::new());
    cmd.init().unwrap();
    cmd.text("abcdefghi", None).unwrap();
    cmd.print().unwrap();

    let out = String::from_utf8(cmd.into_inner().unwrap()).unwrap();
    let shows: Vec<&str> = out.lines().filter(|l| l.ends_with(") show")).collect();
    assert_eq!(shows, vec!["(abcd) show", "(efgh) show", "(i) show"]);
}

#[test]
fn test_postscript_page_break() {
    let mut cmd = Postscript::new(48, 576, Vec::new(), Options::new().page_height(100.0));
    cmd.init().unwrap();
    for i in 0..9 {
        cmd.text(&format!("line {i}"), None).unwrap();
        cmd.line_feed().unwrap();
    }
    assert!((cmd.vertical_position() - (100.0 - 10.8)).abs() < 1e-9);

    let out = String::from_utf8(cmd.into_inner().unwrap()).unwrap();
    assert_eq!(out.matches("showpage").count(), 1);
}

#[test]
fn test_postscript_symbols_from_generators() {
    let opts = Options::new()
        .gray_level(127)
        .qr_generator(thermalize::render::symbols::QrImages);
    let mut cmd = Postscript::new(48, 576, Vec::new(), opts);
    cmd.init().unwrap();
    cmd.qr_code("hello").unwrap();

    let out = String::from_utf8(cmd.into_inner().unwrap()).unwrap();
    assert!(out.contains("readhexstring"));
    assert!(out.ends_with("grestore\n"));
}

// ============================================================================
// ERRORS
// ============================================================================

#[test]
fn test_sink_failure_propagates() {
    let mut cmd = Escape::new(48, 576, Broken, Options::new());
    assert!(matches!(cmd.init(), Err(ThermalizeError::Io(_))));
    // nothing is written, so nothing fails
    assert!(cmd.feed(0).is_ok());
}
