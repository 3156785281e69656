//! # Shared Command Building Blocks
//!
//! Control bytes, numeric encodings and the clamp policy shared by every
//! dialect encoder in [`crate::protocol`].
//!
//! ## Escape Sequence Structure
//!
//! Both escape-code families build commands the same way:
//! - Single byte: `LF`, `HT`, `SI`, `DC2`
//! - Prefix + parameters: `ESC a n`, `GS ! n`, `ESC GS a n`
//! - Prefix + length + payload: `GS k m n d1...dn`, `ESC X nL nH d1...dk`
//!
//! ## Byte Order
//!
//! Multi-byte integers use **little-endian** encoding:
//! - `u16` value 0x1234 is sent as bytes `[0x34, 0x12]`
//!
//! ## Clamp Policy
//!
//! No parameter is ever rejected. A value above the limit a command can
//! express is replaced by that limit, a value below the minimum by the
//! minimum. Clamping is idempotent.

// ============================================================================
// CONTROL BYTES
// ============================================================================

/// NUL - terminates variable-length parameter lists (tab stops)
pub const NUL: u8 = 0x00;

/// BEL - cash drawer pulse selector in StarPRNT (`ESC GS BEL`)
pub const BEL: u8 = 0x07;

/// HT (Horizontal Tab) - Advance to next tab position
pub const HT: u8 = 0x09;

/// LF (Line Feed) - Print and advance one line
pub const LF: u8 = 0x0A;

/// SI - StarPRNT upside-down printing on
pub const SI: u8 = 0x0F;

/// DC2 - StarPRNT upside-down printing off
pub const DC2: u8 = 0x12;

/// ESC (Escape) - Command prefix byte
pub const ESC: u8 = 0x1B;

/// GS (Group Separator) - Extended command prefix
///
/// ESC/POS uses it alone (`GS k`, `GS v 0`); StarPRNT combines it
/// with ESC (`ESC GS a`).
pub const GS: u8 = 0x1D;

/// RS (Record Separator) - terminates StarPRNT barcode data
pub const RS: u8 = 0x1E;

// ============================================================================
// NUMERIC ENCODING
// ============================================================================

/// Encode a u16 value as little-endian bytes [low, high]
///
/// ## Example
///
/// ```
/// use thermalize::protocol::commands::u16_le;
///
/// assert_eq!(u16_le(0x1234), [0x34, 0x12]);
/// assert_eq!(u16_le(576), [0x40, 0x02]); // 576 = 0x0240
/// ```
#[inline]
pub const fn u16_le(value: u16) -> [u8; 2] {
    [value as u8, (value >> 8) as u8]
}

/// Split a length or position into `[low, high]`, keeping only the low 16 bits.
///
/// Dialect commands carry 2-byte fields; larger values wrap exactly like
/// the printer firmware reads them.
#[inline]
pub const fn split_le(value: usize) -> [u8; 2] {
    [(value & 0xFF) as u8, ((value >> 8) & 0xFF) as u8]
}

/// Encode a u32 value as little-endian bytes (ESC/POS `GS 8 L` length field).
#[inline]
pub const fn u32_le(value: u32) -> [u8; 4] {
    value.to_le_bytes()
}

// ============================================================================
// CLAMP POLICY
// ============================================================================

/// Clamp `value` to at most `max`.
///
/// ```
/// use thermalize::protocol::commands::clamp_max;
///
/// assert_eq!(clamp_max(9, 2), 2);
/// assert_eq!(clamp_max(1, 2), 1);
/// ```
#[inline]
pub fn clamp_max(value: u8, max: u8) -> u8 {
    value.min(max)
}

/// Clamp `value` into `min..=max`.
#[inline]
pub fn clamp_range(value: u8, min: u8, max: u8) -> u8 {
    value.clamp(min, max)
}

/// Clamp a dot/column position to stay strictly below `limit`.
///
/// Returns `None` when `limit` is zero and no position is expressible.
#[inline]
pub fn clamp_below(value: usize, limit: usize) -> Option<usize> {
    if limit == 0 {
        None
    } else {
        Some(value.min(limit - 1))
    }
}

// ============================================================================
// TAB STOPS
// ============================================================================

/// Build the stop list of an `ESC D n1...nk NUL` command.
///
/// Only strictly increasing positions are kept, the list is cut to `max`
/// entries and terminated with `NUL`. An empty input yields an empty
/// vector (no command is sent).
///
/// ```
/// use thermalize::protocol::commands::tab_stops;
///
/// assert_eq!(tab_stops(&[10, 5, 20, 20, 30], 32), vec![10, 20, 30, 0]);
/// ```
pub fn tab_stops(positions: &[u8], max: usize) -> Vec<u8> {
    let increasing = increasing_stops(positions, max);
    if increasing.is_empty() {
        return Vec::new();
    }

    let mut stops = increasing;
    stops.push(NUL);
    stops
}

/// Strictly increasing subsequence of `positions`, at most `max` long.
///
/// Zero is never a valid stop, so it is dropped along with repeats.
pub fn increasing_stops(positions: &[u8], max: usize) -> Vec<u8> {
    let mut stops = Vec::with_capacity(positions.len().min(max));
    let mut previous = 0u8;
    for &n in positions {
        if n <= previous {
            continue;
        }
        if stops.len() == max {
            break;
        }
        stops.push(n);
        previous = n;
    }
    stops
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u16_le() {
        assert_eq!(u16_le(0x0000), [0x00, 0x00]);
        assert_eq!(u16_le(0x00FF), [0xFF, 0x00]);
        assert_eq!(u16_le(0xFF00), [0x00, 0xFF]);
        assert_eq!(u16_le(576), [0x40, 0x02]);
    }

    #[test]
    fn test_split_le_wraps_above_u16() {
        assert_eq!(split_le(0x1_0203), [0x03, 0x02]);
        assert_eq!(split_le(300), [44, 1]);
    }

    #[test]
    fn test_u32_le() {
        assert_eq!(u32_le(0x0102_0304), [4, 3, 2, 1]);
    }

    #[test]
    fn test_clamp_idempotent() {
        for v in 0..=255u8 {
            let once = clamp_max(v, 2);
            assert_eq!(clamp_max(once, 2), once);
            let ranged = clamp_range(v, 1, 6);
            assert_eq!(clamp_range(ranged, 1, 6), ranged);
        }
        assert_eq!(clamp_max(1, 2), 1);
        assert_eq!(clamp_range(0, 1, 6), 1);
        assert_eq!(clamp_range(200, 1, 6), 6);
    }

    #[test]
    fn test_clamp_below() {
        assert_eq!(clamp_below(10, 576), Some(10));
        assert_eq!(clamp_below(1000, 576), Some(575));
        assert_eq!(clamp_below(3, 0), None);
    }

    #[test]
    fn test_tab_stops_dedup() {
        assert_eq!(tab_stops(&[10, 5, 20, 20, 30], 32), vec![10, 20, 30, NUL]);
    }

    #[test]
    fn test_tab_stops_truncated_after_dedup() {
        let input: Vec<u8> = (1..=40).flat_map(|n| [n, n]).collect();
        let stops = tab_stops(&input, 16);
        assert_eq!(stops.len(), 17);
        assert_eq!(&stops[..16], &(1..=16).collect::<Vec<u8>>()[..]);
        assert_eq!(stops[16], NUL);
    }

    #[test]
    fn test_tab_stops_empty() {
        assert!(tab_stops(&[], 32).is_empty());
        assert!(tab_stops(&[0, 0], 32).is_empty());
    }
}
