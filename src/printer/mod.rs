//! # Printer Module
//!
//! Printer-side configuration that does not depend on the dialect.
//!
//! ## Modules
//!
//! - [`config`]: Paper width presets

pub mod config;

pub use config::PrinterProfile;
