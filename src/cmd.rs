//! # Printer Capability Set
//!
//! [`Cmd`] lists every operation a receipt printer can be asked to do,
//! independent of the control-code dialect that ends up encoding it.
//! One call sequence can therefore drive ESC/POS, StarPRNT or PostScript
//! output by swapping the encoder.
//!
//! Every operation except the sizing/writing core has a no-op default body.
//! That default is the "Null" variant: a dialect only overrides what it
//! supports, and [`Skipper`] (which overrides nothing) skips everything
//! except raw bytes and text.
//!
//! ## Example
//!
//! ```
//! use thermalize::{open, Cmd, Dialect, Options};
//!
//! let mut cmd = open(Dialect::Escape, 48, 576, Vec::new(), Options::new());
//! cmd.init()?;
//! cmd.align(1)?;
//! cmd.text("RECEIPT", None)?;
//! cmd.line_feed()?;
//! cmd.full_cut()?;
//! cmd.print()?;
//! # Ok::<(), thermalize::ThermalizeError>(())
//! ```

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use image::DynamicImage;

use crate::error::{Result, ThermalizeError};
use crate::options::Options;
use crate::protocol::{Escape, Postscript, Star};

/// Text encoder callback: converts a string to the printer's code page.
pub type Encoder<'a> = &'a dyn Fn(&str) -> Vec<u8>;

/// Apply an optional encoder, passing UTF-8 bytes through when absent.
pub fn encode_text(s: &str, enc: Option<Encoder<'_>>) -> Vec<u8> {
    match enc {
        Some(enc) => enc(s),
        None => s.as_bytes().to_vec(),
    }
}

/// The printer capability set.
///
/// Parameters documented with a range are clamped into it; no operation
/// rejects a value. Errors only come from the byte sink.
pub trait Cmd {
    /// Characters per line the encoder was sized for.
    fn cpl(&self) -> usize;

    /// Pixels (dots) per line the encoder was sized for.
    fn ppl(&self) -> usize;

    /// Change characters and pixels per line. A zero leaves that value as is.
    ///
    /// Only meaningful before the first operation is issued.
    fn sizing(&mut self, cpl: usize, ppl: usize);

    /// Write raw bytes to the sink.
    fn write(&mut self, bytes: &[u8]) -> Result<()>;

    /// Add printable text, converted with `enc` when given.
    ///
    /// Without an encoder the UTF-8 bytes are sent as is, which only prints
    /// correctly for characters the printer's current code page shares
    /// with ASCII.
    fn text(&mut self, s: &str, enc: Option<Encoder<'_>>) -> Result<()> {
        self.write(&encode_text(s, enc))
    }

    /// Clear the print buffer and reset the printer modes.
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    /// Left margin, in dots.
    fn left_margin(&mut self, _n: usize) -> Result<()> {
        Ok(())
    }

    /// Print area width, in dots.
    fn width_area(&mut self, _n: usize) -> Result<()> {
        Ok(())
    }

    /// Absolute horizontal print position, in dots.
    fn absolute_position(&mut self, _n: usize) -> Result<()> {
        Ok(())
    }

    /// Justification: 0 left, 1 center, 2 right.
    fn align(&mut self, _b: u8) -> Result<()> {
        Ok(())
    }

    /// Upside-down (180°) printing.
    fn upside_down(&mut self, _on: bool) -> Result<()> {
        Ok(())
    }

    /// Horizontal tab positions, in characters.
    ///
    /// Only strictly increasing positions are kept.
    fn tab_positions(&mut self, _positions: &[u8]) -> Result<()> {
        Ok(())
    }

    /// Move to the next horizontal tab position.
    fn tab(&mut self) -> Result<()> {
        Ok(())
    }

    /// Select the character code table.
    fn code_page(&mut self, _b: u8) -> Result<()> {
        Ok(())
    }

    /// Character width and height multipliers (0 = normal size).
    fn char_size(&mut self, _w: u8, _h: u8) -> Result<()> {
        Ok(())
    }

    /// Emphasized printing.
    fn bold(&mut self, _on: bool) -> Result<()> {
        Ok(())
    }

    /// 90° clockwise rotation.
    fn clockwise_rotation(&mut self, _on: bool) -> Result<()> {
        Ok(())
    }

    /// Underline: 0 off, 1 one dot thick, 2 two dots thick.
    fn underline(&mut self, _b: u8) -> Result<()> {
        Ok(())
    }

    /// 1D barcode module width multiplier.
    fn barcode_width(&mut self, _b: u8) -> Result<()> {
        Ok(())
    }

    /// 1D barcode height in dots, 1-255.
    fn barcode_height(&mut self, _b: u8) -> Result<()> {
        Ok(())
    }

    /// HRI font: 0 font A (12 x 24), 1 font B (9 x 17).
    fn hri_font(&mut self, _b: u8) -> Result<()> {
        Ok(())
    }

    /// HRI position: 0 none, 1 above, 2 below, 3 above and below.
    fn hri_position(&mut self, _b: u8) -> Result<()> {
        Ok(())
    }

    /// Print a 1D barcode. Modes above 13 print Code39.
    fn barcode(&mut self, _m: u8, _data: &str) -> Result<()> {
        Ok(())
    }

    /// QR module size.
    fn qr_code_size(&mut self, _b: u8) -> Result<()> {
        Ok(())
    }

    /// QR correction level: 0 (7%), 1 (15%), 2 (25%), 3 (30%).
    fn qr_code_correction_level(&mut self, _b: u8) -> Result<()> {
        Ok(())
    }

    /// Print a QR code.
    fn qr_code(&mut self, _data: &str) -> Result<()> {
        Ok(())
    }

    /// Print an image, thresholded to black and white.
    fn image(&mut self, _img: &DynamicImage, _invert: bool) -> Result<()> {
        Ok(())
    }

    /// Print the buffer and feed `n` vertical motion units.
    fn feed(&mut self, _n: u8) -> Result<()> {
        Ok(())
    }

    /// Print the buffer and feed one line.
    fn line_feed(&mut self) -> Result<()> {
        Ok(())
    }

    /// Run the auto-cutter in mode `m`, feeding `p` units where the mode feeds.
    fn cut(&mut self, _m: u8, _p: u8) -> Result<()> {
        Ok(())
    }

    /// Feed to the cutter and cut across the full paper width.
    fn full_cut(&mut self) -> Result<()> {
        Ok(())
    }

    /// Pulse a cash drawer pin: `t1` on time, `t2` off time.
    fn open_cash_drawer(&mut self, _m: u8, _t1: u8, _t2: u8) -> Result<()> {
        Ok(())
    }

    /// Finish the job: flush anything the encoder still holds.
    fn print(&mut self) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// SKIPPER (NULL VARIANT)
// ============================================================================

/// Base encoder that writes raw bytes and text and skips everything else.
///
/// Dialect encoders embed one for sizing and sink access.
pub struct Skipper<W> {
    cpl: usize,
    ppl: usize,
    sink: Option<W>,
}

impl<W: Write> Skipper<W> {
    pub fn new(cpl: usize, ppl: usize, sink: W) -> Self {
        Self {
            cpl,
            ppl,
            sink: Some(sink),
        }
    }

    /// An encoder with no sink: every write fails with
    /// [`ThermalizeError::NoSink`].
    pub fn unbound(cpl: usize, ppl: usize) -> Self {
        Self {
            cpl,
            ppl,
            sink: None,
        }
    }

    pub fn get_ref(&self) -> Option<&W> {
        self.sink.as_ref()
    }

    /// Consume the encoder and return its sink.
    pub fn into_inner(self) -> Option<W> {
        self.sink
    }

    /// Flush the sink.
    pub fn flush(&mut self) -> Result<()> {
        let sink = self.sink.as_mut().ok_or(ThermalizeError::NoSink)?;
        sink.flush()?;
        Ok(())
    }
}

impl<W: Write> Cmd for Skipper<W> {
    fn cpl(&self) -> usize {
        self.cpl
    }

    fn ppl(&self) -> usize {
        self.ppl
    }

    fn sizing(&mut self, cpl: usize, ppl: usize) {
        if cpl != 0 {
            self.cpl = cpl;
        }
        if ppl != 0 {
            self.ppl = ppl;
        }
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let sink = self.sink.as_mut().ok_or(ThermalizeError::NoSink)?;
        sink.write_all(bytes)?;
        Ok(())
    }

    fn print(&mut self) -> Result<()> {
        self.flush()
    }
}

impl<W> fmt::Debug for Skipper<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Skipper")
            .field("cpl", &self.cpl)
            .field("ppl", &self.ppl)
            .field("bound", &self.sink.is_some())
            .finish()
    }
}

// ============================================================================
// DIALECT SELECTION
// ============================================================================

/// Control-code family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Writes raw bytes and text only.
    Null,
    /// Epson ESC/POS.
    Escape,
    /// Star Micronics StarPRNT / Star Line Mode.
    Star,
    /// PostScript pages emulating a fixed-pitch receipt.
    Postscript,
}

impl Dialect {
    pub const ALL: [Self; 4] = [Self::Null, Self::Escape, Self::Star, Self::Postscript];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Escape => "escape",
            Self::Star => "star",
            Self::Postscript => "postscript",
        }
    }
}

impl FromStr for Dialect {
    type Err = ThermalizeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ThermalizeError::InvalidArgument(format!("unknown dialect: {s}")))
    }
}

/// Build the encoder for `dialect` writing to `sink`.
pub fn open<W: Write + 'static>(
    dialect: Dialect,
    cpl: usize,
    ppl: usize,
    sink: W,
    opts: Options,
) -> Box<dyn Cmd> {
    match dialect {
        Dialect::Null => Box::new(Skipper::new(cpl, ppl, sink)),
        Dialect::Escape => Box::new(Escape::new(cpl, ppl, sink, opts)),
        Dialect::Star => Box::new(Star::new(cpl, ppl, sink, opts)),
        Dialect::Postscript => Box::new(Postscript::new(cpl, ppl, sink, opts)),
    }
}
