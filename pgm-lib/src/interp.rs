/// Quadratic interpolation through the three tabulated points nearest `x`.
///
/// `xp` must be strictly increasing with at least three points. Outside the
/// table the end parabola is extrapolated instead of clamping.
pub(crate) fn quadratic_one(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    debug_assert!(xp.len() >= 3 && xp.len() == fp.len());

    // Bracket, then pick the window [lo, lo + 2]
    let idx = xp.partition_point(|&v| v < x);
    let lo = idx.saturating_sub(1).min(xp.len() - 3);

    let (x0, x1, x2) = (xp[lo], xp[lo + 1], xp[lo + 2]);
    let (y0, y1, y2) = (fp[lo], fp[lo + 1], fp[lo + 2]);

    let l0 = (x - x1) * (x - x2) / ((x0 - x1) * (x0 - x2));
    let l1 = (x - x0) * (x - x2) / ((x1 - x0) * (x1 - x2));
    let l2 = (x - x0) * (x - x1) / ((x2 - x0) * (x2 - x1));
    y0 * l0 + y1 * l1 + y2 * l2
}
