//! # Printer Dialects
//!
//! Encoders that turn [`Cmd`](crate::Cmd) calls into the control language of
//! one printer family.
//!
//! ## Module Structure
//!
//! - [`commands`]: Control bytes, little-endian helpers, clamp policy
//! - [`escape`]: ESC/POS (Epson and compatibles)
//! - [`star`]: StarPRNT / Star Line Mode (Star Micronics)
//! - [`postscript`]: PostScript page layout
//!
//! ## Usage Example
//!
//! ```
//! use thermalize::{Cmd, Options};
//! use thermalize::protocol::Escape;
//!
//! let mut cmd = Escape::new(48, 576, Vec::new(), Options::new());
//! cmd.init()?;
//! cmd.bold(true)?;
//! cmd.text("RECEIPT", None)?;
//! cmd.line_feed()?;
//! cmd.full_cut()?;
//!
//! let bytes = cmd.into_inner().unwrap_or_default();
//! assert_eq!(&bytes[..5], &[0x1B, b'@', 0x1B, b'E', 1]);
//! # Ok::<(), thermalize::ThermalizeError>(())
//! ```
//!
//! ## Protocol Reference
//!
//! Byte sequences follow the "ESC/POS Application Programming Guide" by
//! Seiko Epson and the "StarPRNT Command Specifications Rev. 4.10" by
//! Star Micronics Co., Ltd.

pub mod commands;
pub mod escape;
pub mod postscript;
pub mod star;

pub use escape::Escape;
pub use postscript::Postscript;
pub use star::Star;
