//! # Rendering Module
//!
//! Turns pictures into bytes the printers understand.
//!
//! ## Modules
//!
//! - [`raster`]: Gray-level thresholding into the three transfer layouts
//! - [`symbols`]: Barcode and QR generators producing images
//!
//! ## Usage Example
//!
//! ```
//! use image::{DynamicImage, GrayImage, Luma};
//! use thermalize::render::raster::{rasterize, GrayLevel, RasterLayout};
//!
//! let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(8, 24, Luma([0])));
//! let buf = rasterize(&img, false, RasterLayout::Bin, GrayLevel::DEFAULT);
//!
//! // One band: 8 columns of 3 bytes
//! assert_eq!(buf.bands().count(), 1);
//! assert_eq!(buf.data.len(), 24);
//! ```

pub mod raster;
pub mod symbols;
