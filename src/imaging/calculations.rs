//! Pure calculation functions for canvas dimensions.
//!
//! All functions here are pure and testable without any I/O or images.
//! Nothing in this module ever shrinks an image: every canvas it computes
//! encloses the source completely.

use thiserror::Error;

/// Two aspect ratios closer than this are considered equal.
const RATIO_TOLERANCE: f64 = 1e-6;

/// Slack below the next integer that the tolerant ceiling absorbs.
///
/// `4500.00002` pads to `4500`, not `4501`: float noise from the ratio
/// division must not add a stray pixel row.
const CEIL_EPSILON: f64 = 1e-4;

/// Largest width or height of a canvas, the most a JPEG frame header holds.
pub const MAX_CANVAS_SIDE: u32 = 65_535;

/// Largest pixel count of a canvas (one gigapixel).
pub const MAX_CANVAS_PIXELS: u64 = 1 << 30;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
#[error("invalid aspect ratio {short}:{long}: both sides must be positive")]
pub struct RatioError {
    pub short: f64,
    pub long: f64,
}

/// Pixel dimensions of an image or canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_landscape(self) -> bool {
        self.width >= self.height
    }

    fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixel_count(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Whether a canvas of this size may be allocated.
    ///
    /// Canvas math saturates at `u32::MAX` instead of wrapping, so an
    /// absurd ratio or border always lands outside these limits.
    pub fn fits_canvas_limits(self) -> bool {
        self.width <= MAX_CANVAS_SIDE
            && self.height <= MAX_CANVAS_SIDE
            && self.pixel_count() <= MAX_CANVAS_PIXELS
    }
}

impl From<(u32, u32)> for ImageSize {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A target print ratio, written short side first (`2:3`, `4:5`).
///
/// The only constructor rejects non-positive and non-finite sides, so a
/// value of this type is always safe to divide by.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AspectRatio {
    short: f64,
    long: f64,
}

impl AspectRatio {
    /// Build a ratio from its short and long side.
    ///
    /// Callers are expected to pass `short <= long`. A reversed pair is
    /// accepted and yields a target below 1, which pads landscape images
    /// into portrait canvases and vice versa.
    pub fn new(short: f64, long: f64) -> Result<Self, RatioError> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(short) || !valid(long) {
            return Err(RatioError { short, long });
        }
        Ok(Self { short, long })
    }

    pub fn short(self) -> f64 {
        self.short
    }

    pub fn long(self) -> f64 {
        self.long
    }

    /// Long side over short side.
    pub fn target(self) -> f64 {
        self.long / self.short
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.short, self.long)
    }
}

/// Round up to the next integer, leaving values within [`CEIL_EPSILON`] of
/// the integer below untouched.
fn ceil_tolerant(x: f64) -> u32 {
    (x + 1.0 - CEIL_EPSILON).floor() as u32
}

/// Calculate the smallest canvas that holds `size` at the given ratio.
///
/// Orientation follows the image, not the ratio: a landscape (or square)
/// image gets a landscape canvas. Only one axis ever grows.
///
/// # Examples
/// ```
/// # use print_pad::imaging::{AspectRatio, ImageSize, compute_canvas_size};
/// let ratio = AspectRatio::new(2.0, 3.0).unwrap();
/// // 4:3 landscape is too tall for 3:2 → width grows
/// assert_eq!(
///     compute_canvas_size(ImageSize::new(4000, 3000), ratio),
///     ImageSize::new(4500, 3000)
/// );
/// ```
pub fn compute_canvas_size(size: ImageSize, ratio: AspectRatio) -> ImageSize {
    if size.is_empty() {
        return size;
    }

    let ImageSize { width, height } = size;
    let (w, h) = (width as f64, height as f64);
    let target = ratio.target();

    let (new_w, new_h) = if size.is_landscape() {
        let current = w / h;
        if (current - target).abs() < RATIO_TOLERANCE {
            return size;
        } else if current > target {
            // Too wide: add rows
            (width, ceil_tolerant(w / target))
        } else {
            // Too tall: add columns
            (ceil_tolerant(h * target), height)
        }
    } else {
        let current = h / w;
        if (current - target).abs() < RATIO_TOLERANCE {
            return size;
        } else if current > target {
            // Too tall: add columns
            (ceil_tolerant(h / target), height)
        } else {
            // Too wide: add rows
            (width, ceil_tolerant(w * target))
        }
    };

    ImageSize {
        width: new_w.max(width),
        height: new_h.max(height),
    }
}

/// Calculate the size after adding a uniform outer border.
///
/// Both axes are scaled by `1 + border` and truncated, so the border is
/// proportional to each axis and may differ between the two.
/// A non-positive or non-finite `border` leaves the size unchanged.
pub fn bordered_size(canvas: ImageSize, border: f64) -> ImageSize {
    if !border.is_finite() || border <= 0.0 {
        return canvas;
    }
    let factor = 1.0 + border;
    ImageSize {
        width: (canvas.width as f64 * factor).floor() as u32,
        height: (canvas.height as f64 * factor).floor() as u32,
    }
}

/// Top-left position that centers `inner` inside `outer`.
///
/// Odd slack leaves the extra pixel on the bottom/right edge.
pub fn center_offset(outer: ImageSize, inner: ImageSize) -> (u32, u32) {
    (
        outer.width.saturating_sub(inner.width) / 2,
        outer.height.saturating_sub(inner.height) / 2,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ratio(short: f64, long: f64) -> AspectRatio {
        AspectRatio::new(short, long).unwrap()
    }

    fn size(w: u32, h: u32) -> ImageSize {
        ImageSize::new(w, h)
    }

    // =========================================================================
    // AspectRatio
    // =========================================================================

    #[test]
    fn ratio_rejects_zero_and_negative_sides() {
        assert!(AspectRatio::new(0.0, 3.0).is_err());
        assert!(AspectRatio::new(2.0, 0.0).is_err());
        assert!(AspectRatio::new(-2.0, 3.0).is_err());
        assert!(AspectRatio::new(2.0, -3.0).is_err());
    }

    #[test]
    fn ratio_rejects_non_finite_sides() {
        assert!(AspectRatio::new(f64::NAN, 3.0).is_err());
        assert!(AspectRatio::new(2.0, f64::INFINITY).is_err());
    }

    #[test]
    fn ratio_error_reports_both_sides() {
        let err = AspectRatio::new(0.0, 3.0).unwrap_err();
        assert_eq!(err, RatioError { short: 0.0, long: 3.0 });
        assert!(err.to_string().contains("0:3"));
    }

    #[test]
    fn ratio_target_is_long_over_short() {
        assert_eq!(ratio(2.0, 3.0).target(), 1.5);
        assert_eq!(ratio(4.0, 5.0).target(), 1.25);
    }

    // =========================================================================
    // compute_canvas_size
    // =========================================================================

    #[test]
    fn landscape_already_at_ratio_is_unchanged() {
        assert_eq!(compute_canvas_size(size(3000, 2000), ratio(2.0, 3.0)), size(3000, 2000));
    }

    #[test]
    fn landscape_too_tall_grows_width() {
        // 4:3 ≈ 1.333 < 1.5
        assert_eq!(compute_canvas_size(size(4000, 3000), ratio(2.0, 3.0)), size(4500, 3000));
    }

    #[test]
    fn landscape_too_wide_grows_height() {
        // 2:1 > 1.5 → height = 6000 / 1.5
        assert_eq!(compute_canvas_size(size(6000, 3000), ratio(2.0, 3.0)), size(6000, 4000));
    }

    #[test]
    fn portrait_too_tall_grows_width() {
        assert_eq!(compute_canvas_size(size(2000, 3000), ratio(1.0, 1.0)), size(3000, 3000));
    }

    #[test]
    fn portrait_too_wide_grows_height() {
        // 3:4 = 1.333 < 1.5 → height = 3000 * 1.5
        assert_eq!(compute_canvas_size(size(3000, 4000), ratio(2.0, 3.0)), size(3000, 4500));
    }

    #[test]
    fn portrait_already_at_ratio_is_unchanged() {
        assert_eq!(compute_canvas_size(size(4000, 5000), ratio(4.0, 5.0)), size(4000, 5000));
    }

    #[test]
    fn square_image_pads_as_landscape() {
        assert_eq!(compute_canvas_size(size(1000, 1000), ratio(4.0, 5.0)), size(1250, 1000));
    }

    #[test]
    fn fractional_target_rounds_up() {
        // 1000 * 7/3 = 2333.33 → 2334
        assert_eq!(compute_canvas_size(size(1200, 1000), ratio(3.0, 7.0)), size(2334, 1000));
    }

    #[test]
    fn near_integral_target_does_not_add_a_pixel() {
        assert_eq!(ceil_tolerant(4500.00002), 4500);
        assert_eq!(ceil_tolerant(4500.0), 4500);
        assert_eq!(ceil_tolerant(4500.01), 4501);
    }

    #[test]
    fn within_tolerance_counts_as_match() {
        // 1.5000004 is within 1e-6 of 1.5
        let r = ratio(2.0, 3.0000008);
        assert_eq!(compute_canvas_size(size(3000, 2000), r), size(3000, 2000));
    }

    #[test]
    fn zero_area_is_returned_unchanged() {
        assert_eq!(compute_canvas_size(size(0, 200), ratio(2.0, 3.0)), size(0, 200));
        assert_eq!(compute_canvas_size(size(300, 0), ratio(2.0, 3.0)), size(300, 0));
    }

    #[test]
    fn reversed_ratio_flips_canvas_orientation() {
        // target 2/3 < 1: landscape image is "too wide" and gets rows added
        assert_eq!(compute_canvas_size(size(3000, 2000), ratio(3.0, 2.0)), size(3000, 4500));
    }

    #[test]
    fn canvas_never_smaller_and_hits_ratio() {
        let ratios = [(2.0, 3.0), (4.0, 5.0), (1.0, 1.0), (5.0, 7.0), (8.5, 11.0), (3.0, 7.0)];
        for w in (1..=40).map(|i| i * 97) {
            for h in (1..=40).map(|i| i * 89) {
                for &(s, l) in &ratios {
                    let r = ratio(s, l);
                    let out = compute_canvas_size(size(w, h), r);
                    assert!(out.width >= w && out.height >= h, "{w}x{h} → {out} shrank");

                    let long = out.width.max(out.height) as f64;
                    let short = out.width.min(out.height) as f64;
                    // Rounding to whole pixels costs at most one pixel on the grown axis
                    let slack = long / (short * (short - 1.0)) + RATIO_TOLERANCE;
                    assert!(
                        (long / short - r.target()).abs() <= slack,
                        "{w}x{h} at {r} → {out}"
                    );
                }
            }
        }
    }

    #[test]
    fn exact_ratio_when_grown_axis_is_integral() {
        let r = ratio(2.0, 3.0);
        for (w, h) in [(4000, 3000), (6000, 3000), (3000, 4000), (1000, 1000), (2000, 3600)] {
            let out = compute_canvas_size(size(w, h), r);
            let long = out.width.max(out.height) as f64;
            let short = out.width.min(out.height) as f64;
            assert!((long / short - 1.5).abs() < RATIO_TOLERANCE, "{w}x{h} → {out}");
        }
    }

    #[test]
    fn padding_twice_is_a_no_op() {
        for &(s, l) in &[(2.0, 3.0), (4.0, 5.0), (1.0, 1.0)] {
            let r = ratio(s, l);
            for (w, h) in [(4000, 3000), (3000, 4000), (1234, 1000), (1000, 1000), (600, 2100)] {
                let once = compute_canvas_size(size(w, h), r);
                assert_eq!(compute_canvas_size(once, r), once, "{w}x{h} at {r}");
            }
        }
    }

    // =========================================================================
    // bordered_size / center_offset
    // =========================================================================

    #[test]
    fn border_scales_both_axes() {
        assert_eq!(bordered_size(size(3000, 3000), 0.1), size(3300, 3300));
    }

    #[test]
    fn border_truncates_per_axis() {
        // 4500 * 1.05 = 4725, 3000 * 1.05 = 3150
        assert_eq!(bordered_size(size(4500, 3000), 0.05), size(4725, 3150));
        // 101 * 1.1 = 111.1 → 111
        assert_eq!(bordered_size(size(101, 55), 0.1), size(111, 60));
    }

    #[test]
    fn zero_or_negative_border_is_unchanged() {
        assert_eq!(bordered_size(size(300, 200), 0.0), size(300, 200));
        assert_eq!(bordered_size(size(300, 200), -0.5), size(300, 200));
        assert_eq!(bordered_size(size(300, 200), f64::NAN), size(300, 200));
    }

    #[test]
    fn positive_border_grows_both_axes() {
        for (w, h) in [(10, 10), (300, 200), (3000, 4500)] {
            let out = bordered_size(size(w, h), 0.1);
            assert!(out.width > w && out.height > h);
        }
    }

    #[test]
    fn center_offset_floors_odd_slack() {
        assert_eq!(center_offset(size(4500, 3000), size(4000, 3000)), (250, 0));
        assert_eq!(center_offset(size(11, 8), size(8, 5)), (1, 1));
        assert_eq!(center_offset(size(10, 10), size(10, 10)), (0, 0));
    }

    // =========================================================================
    // canvas limits
    // =========================================================================

    #[test]
    fn canvas_limits_bound_each_side_and_the_area() {
        assert!(size(6000, 4000).fits_canvas_limits());
        assert!(size(MAX_CANVAS_SIDE, 1).fits_canvas_limits());
        assert!(size(32_768, 32_768).fits_canvas_limits());
        assert!(!size(MAX_CANVAS_SIDE + 1, 1).fits_canvas_limits());
        assert!(!size(40_000, 40_000).fits_canvas_limits());
    }

    #[test]
    fn huge_border_saturates_outside_the_limits() {
        let out = bordered_size(size(10, 10), 1e10);
        assert_eq!(out, size(u32::MAX, u32::MAX));
        assert!(!out.fits_canvas_limits());
    }

    #[test]
    fn extreme_ratio_saturates_outside_the_limits() {
        let out = compute_canvas_size(size(10, 10), ratio(1e-9, 1.0));
        assert_eq!(out.height, 10);
        assert!(!out.fits_canvas_limits());
    }
}
