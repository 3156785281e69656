//! # Thermalize - Receipt Printer Control Codes
//!
//! Thermalize turns a printer-independent sequence of operations (text,
//! alignment, barcodes, images, cuts) into the control language of a
//! receipt printer. It provides:
//!
//! - **Capability set**: the [`Cmd`] trait, one method per printer operation
//! - **Dialect encoders**: ESC/POS ([`Escape`]), StarPRNT ([`Star`]) and a
//!   PostScript page layout engine ([`Postscript`])
//! - **Rasterizer**: gray-level thresholding of images into the bit layouts
//!   the printers accept
//! - **Symbol generators**: barcode and QR images for printers without
//!   native support
//!
//! ## Quick Start
//!
//! ```
//! use thermalize::{open, Cmd, Dialect, Options};
//!
//! let mut out = Vec::new();
//! {
//!     let mut cmd = thermalize::Star::new(48, 576, &mut out, Options::new());
//!     cmd.init()?;
//!     cmd.align(1)?;
//!     cmd.char_size(1, 1)?;
//!     cmd.text("THANK YOU", None)?;
//!     cmd.line_feed()?;
//!     cmd.full_cut()?;
//!     cmd.print()?;
//! }
//! assert_eq!(&out[..2], &[0x1B, b'@']);
//!
//! // Or pick the dialect at runtime
//! let mut cmd = open(Dialect::Escape, 48, 576, std::io::sink(), Options::new());
//! cmd.text("hello", None)?;
//! # Ok::<(), thermalize::ThermalizeError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`cmd`] | Capability set, Null encoder, dialect selection |
//! | [`protocol`] | Dialect encoders |
//! | [`options`] | Encoder options and parameter values |
//! | [`render`] | Rasterizer and symbol generators |
//! | [`printer`] | Paper profiles |
//! | [`error`] | Error types |
//!
//! ## Gray Level
//!
//! Images are thresholded against a process-wide gray level (default 127,
//! see [`set_gray_level`]) unless the encoder's [`Options`] carry their
//! own. Changing the global level while another thread rasterizes gives
//! no guarantee about which level that image sees.

pub mod cmd;
pub mod error;
pub mod options;
pub mod printer;
pub mod protocol;
pub mod render;

// Re-exports for convenience
pub use cmd::{Cmd, Dialect, Encoder, Skipper, open};
pub use error::{Result, ThermalizeError};
pub use options::{
    Alignment, BarcodeGenerator, BarcodeMode, BarcodeOptions, DrawerPin, HriFont, HriPosition,
    ImageTransfer, Options, QrCodeOptions, QrGenerator, QrLevel, Underline,
};
pub use printer::PrinterProfile;
pub use protocol::{Escape, Postscript, Star};
pub use render::raster::{gray_level, reset_gray_level, set_gray_level};
