//! Length units used by the presentation format.
//!
//! Every EMU to pixel conversion in the workspace goes through [`emu_to_px`].

/// EMU per inch.
pub const EMU_PER_INCH: i64 = 914_400;

/// EMU per point.
pub const EMU_PER_POINT: i64 = 12_700;

/// CSS pixels per inch.
pub const PX_PER_INCH: i64 = 96;

/// Default slide width in EMU (4:3, 10 inches).
pub const DEFAULT_SLIDE_WIDTH_EMU: i64 = 9_144_000;

/// Default slide height in EMU (4:3, 7.5 inches).
pub const DEFAULT_SLIDE_HEIGHT_EMU: i64 = 6_858_000;

/// Indentation step for one bullet level, in EMU.
pub const BULLET_BASE_MARGIN_EMU: i64 = 328_600;

/// Convert EMU to whole pixels: `round(emu * 96 / 914400)`.
pub fn emu_to_px(emu: i64) -> i64 {
    (emu as f64 * PX_PER_INCH as f64 / EMU_PER_INCH as f64).round() as i64
}

/// Convert a line width in EMU to a border width in points.
///
/// The width is scaled down by five and clamped to at least one point.
pub fn line_width_to_pt(emu: Option<i64>) -> f64 {
    match emu {
        Some(w) => {
            let pt = w as f64 / EMU_PER_POINT as f64 / 5.0;
            if pt < 1.0 {
                1.0
            } else {
                pt
            }
        }
        None => 1.0,
    }
}

/// Font sizes are stored in hundredths of a point.
pub fn centipoints_to_pt(value: i64) -> f64 {
    value as f64 / 100.0
}

/// Fractions (percentages, alpha, luminance) are stored per 100000.
pub fn per_100k(value: i64) -> f64 {
    value as f64 / 100_000.0
}
