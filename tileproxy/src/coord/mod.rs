//! Tile row convention conversion.
//!
//! Web map clients address tiles in the TMS convention (row 0 at the
//! southern edge) while the object store lays tiles out in the XYZ/slippy
//! convention (row 0 at the northern edge). At a given zoom level the two
//! are related by a vertical flip:
//!
//! ```text
//! row' = (2^zoom - 1) - row
//! ```
//!
//! The flip is its own inverse, so the same function converts in both
//! directions.

/// Maximum supported zoom level.
///
/// `2^30` still fits in a `u32` tile index.
pub const MAX_ZOOM: u8 = 30;

/// Number of tiles along one axis at the given zoom level.
///
/// Returns `None` when the zoom exceeds [`MAX_ZOOM`].
#[inline]
pub fn tiles_per_axis(zoom: u8) -> Option<u32> {
    if zoom > MAX_ZOOM {
        return None;
    }
    Some(1u32 << zoom)
}

/// Returns true if `index` is a valid row or column at `zoom`.
#[inline]
pub fn is_valid_index(zoom: u8, index: u32) -> bool {
    tiles_per_axis(zoom).is_some_and(|n| index < n)
}

/// Flips a tile row between the TMS and XYZ conventions.
///
/// The caller must ensure `row` is in `[0, 2^zoom)` (see [`is_valid_index`]).
///
/// # Example
///
/// ```
/// use tileproxy::coord::translate_row;
///
/// assert_eq!(translate_row(3, 5), 2);
/// assert_eq!(translate_row(3, 2), 5);
/// ```
#[inline]
pub fn translate_row(zoom: u8, row: u32) -> u32 {
    debug_assert!(is_valid_index(zoom, row), "row {row} out of range at zoom {zoom}");
    let max_index = (1u32 << zoom) - 1;
    max_index - row
}
