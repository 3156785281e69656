//! # Paper Profiles
//!
//! Line geometry for the common receipt paper widths.
//!
//! ## Supported Widths
//!
//! | Profile | Paper | Print width (dots) | Font A columns | Resolution |
//! |---------|-------|--------------------|----------------|------------|
//! | `80mm` | 80mm | 576 | 48 | 203 DPI |
//! | `58mm` | 58mm | 384 | 32 | 203 DPI |
//!
//! ## Usage
//!
//! ```
//! use thermalize::printer::PrinterProfile;
//!
//! let profile = PrinterProfile::by_name("58mm")?;
//! assert_eq!((profile.cpl, profile.ppl), (32, 384));
//! # Ok::<(), thermalize::ThermalizeError>(())
//! ```

use std::str::FromStr;

use crate::error::ThermalizeError;

/// # Printer Profile
///
/// The two numbers every encoder is sized with, plus the resolution used
/// to convert physical measurements.
///
/// ## Calculations
///
/// ```text
/// dots_per_mm = dpi / 25.4
/// width_mm = ppl / dots_per_mm
///
/// For 80mm paper:
///   dots_per_mm = 203 / 25.4 ≈ 8
///   width_mm = 576 / 8 = 72mm
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrinterProfile {
    /// Profile name as accepted by [`PrinterProfile::by_name`]
    pub name: &'static str,

    /// Characters per line in the default 12 x 24 font
    pub cpl: usize,

    /// Printable dots per line
    pub ppl: usize,

    /// Resolution in dots per inch
    pub dpi: u16,
}

impl PrinterProfile {
    /// 80mm paper, 72mm printable.
    ///
    /// ```text
    /// ├── 4mm ──┼────── 72mm printable ──────┼── 4mm ──┤
    /// │ margin  │         576 dots           │ margin  │
    /// ```
    pub const PAPER_80MM: Self = Self {
        name: "80mm",
        cpl: 48,
        ppl: 576,
        dpi: 203,
    };

    /// 58mm paper, 48mm printable.
    pub const PAPER_58MM: Self = Self {
        name: "58mm",
        cpl: 32,
        ppl: 384,
        dpi: 203,
    };

    /// All built-in profiles.
    pub const ALL: [Self; 2] = [Self::PAPER_80MM, Self::PAPER_58MM];

    /// Look up a built-in profile; the `mm` suffix is optional.
    pub fn by_name(name: &str) -> Result<Self, ThermalizeError> {
        let wanted = name.trim().to_ascii_lowercase();
        let wanted = wanted.strip_suffix("mm").unwrap_or(&wanted);
        Self::ALL
            .into_iter()
            .find(|p| p.name.strip_suffix("mm") == Some(wanted))
            .ok_or_else(|| {
                ThermalizeError::InvalidArgument(format!(
                    "unknown profile '{name}', use '80mm' or '58mm'"
                ))
            })
    }

    /// Calculate dots per millimeter
    #[inline]
    pub fn dots_per_mm(&self) -> f32 {
        self.dpi as f32 / 25.4
    }

    /// Calculate print width in millimeters
    #[inline]
    pub fn width_mm(&self) -> f32 {
        self.ppl as f32 / self.dots_per_mm()
    }

    /// Convert millimeters to dots
    #[inline]
    pub fn mm_to_dots(&self, mm: f32) -> usize {
        (mm.max(0.0) * self.dots_per_mm()).round() as usize
    }
}

impl Default for PrinterProfile {
    fn default() -> Self {
        Self::PAPER_80MM
    }
}

impl FromStr for PrinterProfile {
    type Err = ThermalizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::by_name(s)
    }
}

// ============================================================================
// TESTS
// ============================================================================
