//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Fit `source` inside `bounds`, preserving aspect ratio. Never upscales.
///
/// # Examples
/// ```
/// # use mosaic_gal::imaging::fit_within;
/// // 4000x3000 landscape into a 720 box → 720x540
/// assert_eq!(fit_within((4000, 3000), (720, 720)), (720, 540));
///
/// // Already small enough → unchanged
/// assert_eq!(fit_within((300, 200), (720, 720)), (300, 200));
/// ```
pub fn fit_within(source: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (max_w, max_h) = bounds;
    if src_w == 0 || src_h == 0 || (src_w <= max_w && src_h <= max_h) {
        return source;
    }
    let scale = (max_w as f64 / src_w as f64).min(max_h as f64 / src_h as f64);
    let w = ((src_w as f64 * scale).round() as u32).clamp(1, max_w.max(1));
    let h = ((src_h as f64 * scale).round() as u32).clamp(1, max_h.max(1));
    (w, h)
}

/// Calculate dimensions needed to fill a target area (cover fit).
///
/// Returns dimensions that completely cover the target area while maintaining
/// the source aspect ratio. One dimension matches exactly, the other may exceed.
pub fn calculate_fill_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;
    if src_w == 0 || src_h == 0 {
        return target;
    }

    let src_aspect = src_w as f64 / src_h as f64;
    let tgt_aspect = tgt_w as f64 / tgt_h.max(1) as f64;

    if src_aspect > tgt_aspect {
        // Source is wider: height will match, width will exceed
        let h = tgt_h;
        let w = (h as f64 * src_aspect).round() as u32;
        (w.max(tgt_w), h)
    } else {
        // Source is taller: width will match, height will exceed
        let w = tgt_w;
        let h = (w as f64 / src_aspect).round() as u32;
        (w, h.max(tgt_h))
    }
}

/// Geometry of a framed export: the picture on a blurred matte.
///
/// ```text
/// ┌──────────── canvas ────────────┐
/// │ border                         │
/// │   ┌──────── image ─────────┐   │
/// │   │                        │   │
/// │   └────────────────────────┘   │
/// │                                │
/// └────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameLayout {
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Picture size after the longest-side cap.
    pub image_width: u32,
    pub image_height: u32,
    /// Border thickness, scaled with the picture.
    pub border: u32,
    /// Gaussian sigma of the matte blur, in canvas pixels.
    pub blur_sigma: f32,
}

/// Lay out a framed export.
///
/// The picture is scaled down so its longest side is at most `max_side`; the
/// border scales with it. Blur is `max(8, round(border * 0.38))`.
pub fn frame_layout(source: (u32, u32), border_px: u32, max_side: u32) -> FrameLayout {
    let (w, h) = source;
    let longest = w.max(h).max(1);
    let scale = (max_side as f64 / longest as f64).min(1.0);
    let image_width = ((w as f64 * scale).round() as u32).max(1);
    let image_height = ((h as f64 * scale).round() as u32).max(1);
    let border = (border_px as f64 * scale).round() as u32;
    let blur_sigma = ((border as f64 * 0.38).round()).max(8.0) as f32;
    FrameLayout {
        canvas_width: image_width + border * 2,
        canvas_height: image_height + border * 2,
        image_width,
        image_height,
        border,
        blur_sigma,
    }
}
