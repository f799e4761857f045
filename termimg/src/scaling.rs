// ABOUTME: Fit-to-box dimension math for terminal image display
// ABOUTME: Pure function, no I/O; callers apply the result with the image decoder

/// Compute the `(width, height)` an image of `original_width x original_height`
/// should be drawn at to fit a `width x height` box.
///
/// A non-positive target axis means "not requested". Returns `(-1, -1)` when
/// the original size is unknown. Fractional results are truncated.
pub fn scale_fit(
    width: i32,
    height: i32,
    original_width: i32,
    original_height: i32,
    preserve_aspect: bool,
    allow_upscale: bool,
) -> (i32, i32) {
    if original_width <= 0 || original_height <= 0 {
        return (-1, -1);
    }

    let aspect = original_width as f64 / original_height as f64;

    let mut width = width;
    let mut height = height;
    if !allow_upscale {
        width = width.min(original_width);
        height = height.min(original_height);
    }

    let by_height = |h: i32| ((h as f64 * aspect) as i32, h);
    let by_width = |w: i32| (w, (w as f64 / aspect) as i32);

    match (width > 0, height > 0) {
        (true, true) if !preserve_aspect => (width, height),
        (true, true) => {
            if width as f64 / height as f64 > aspect {
                // Box is wider than the image: height binds
                by_height(height)
            } else {
                by_width(width)
            }
        }
        (true, false) if preserve_aspect => by_width(width),
        (true, false) => (width, original_height),
        (false, true) if preserve_aspect => by_height(height),
        (false, true) => (original_width, height),
        (false, false) => (original_width, original_height),
    }
}
