use gwn_core::errors::{ErrorInfo, NestError};

fn numeric_error(code: &str, message: impl Into<String>) -> NestError {
    NestError::Numeric(ErrorInfo::new(code, message.into()))
}

/// Returns `num` evenly spaced values over `[start, stop]`, endpoints included.
pub fn linspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            let mut values: Vec<f64> = (0..num).map(|i| start + step * i as f64).collect();
            values[num - 1] = stop;
            values
        }
    }
}

/// Returns `num` values evenly spaced in `log10` between `10^start` and `10^stop`.
pub fn logspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    linspace(start, stop, num)
        .into_iter()
        .map(|exponent| 10f64.powf(exponent))
        .collect()
}

/// Trapezoid-rule integral of `yy` sampled at `xx`.
pub fn trapz(yy: &[f64], xx: &[f64]) -> f64 {
    xx.windows(2)
        .zip(yy.windows(2))
        .map(|(x, y)| 0.5 * (x[1] - x[0]) * (y[0] + y[1]))
        .sum()
}

/// Cumulative trapezoid integral with a leading zero, so the output matches
/// the input length.
pub fn cumtrapz(yy: &[f64], xx: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(xx.len());
    if xx.is_empty() {
        return out;
    }
    let mut total = 0.0;
    out.push(total);
    for (x, y) in xx.windows(2).zip(yy.windows(2)) {
        total += 0.5 * (x[1] - x[0]) * (y[0] + y[1]);
        out.push(total);
    }
    out
}

/// Derivative of `ff` with respect to a possibly non-uniform grid `xx`.
///
/// Second-order central differences in the interior and first-order one-sided
/// differences at both ends.
pub fn gradient(ff: &[f64], xx: &[f64]) -> Result<Vec<f64>, NestError> {
    let n = xx.len();
    if n < 2 || ff.len() != n {
        return Err(numeric_error(
            "gradient-shape",
            format!(
                "gradient needs at least two aligned points, got {} values on {} nodes",
                ff.len(),
                n
            ),
        ));
    }
    let mut out = vec![0.0; n];
    out[0] = (ff[1] - ff[0]) / (xx[1] - xx[0]);
    out[n - 1] = (ff[n - 1] - ff[n - 2]) / (xx[n - 1] - xx[n - 2]);
    for i in 1..n - 1 {
        let hs = xx[i] - xx[i - 1];
        let hd = xx[i + 1] - xx[i];
        out[i] = (hs * hs * ff[i + 1] + (hd * hd - hs * hs) * ff[i] - hd * hd * ff[i - 1])
            / (hs * hd * (hd + hs));
    }
    Ok(out)
}

/// Piecewise-linear interpolation of `(xp, fp)` at `x`; `xp` must be
/// non-decreasing. Points outside the table evaluate to `fill`.
pub fn interp(x: f64, xp: &[f64], fp: &[f64], fill: f64) -> f64 {
    let n = xp.len();
    if n == 0 || x.is_nan() || x < xp[0] || x > xp[n - 1] {
        return fill;
    }
    if n == 1 {
        return fp[0];
    }
    let upper = xp.partition_point(|&node| node <= x).clamp(1, n - 1);
    let lower = upper - 1;
    let span = xp[upper] - xp[lower];
    if span <= 0.0 {
        return fp[upper];
    }
    let t = (x - xp[lower]) / span;
    fp[lower] + t * (fp[upper] - fp[lower])
}

/// Composite Simpson integral of `f` over `[a, b]` with `panels` (rounded up
/// to even) sub-intervals.
pub fn simpson<F: Fn(f64) -> f64>(f: F, a: f64, b: f64, panels: usize) -> f64 {
    if a == b {
        return 0.0;
    }
    let n = panels.max(2) + panels % 2;
    let h = (b - a) / n as f64;
    let mut sum = f(a) + f(b);
    for i in 1..n {
        let weight = if i % 2 == 1 { 4.0 } else { 2.0 };
        sum += weight * f(a + h * i as f64);
    }
    sum * h / 3.0
}

/// Solves `f(x) = target` for an increasing `f` on `[lo, hi]` by bisection.
pub fn bisect_increasing<F: Fn(f64) -> f64>(
    f: F,
    target: f64,
    mut lo: f64,
    mut hi: f64,
) -> Result<f64, NestError> {
    let f_lo = f(lo);
    let f_hi = f(hi);
    if !(f_lo..=f_hi).contains(&target) {
        return Err(NestError::Numeric(
            ErrorInfo::new("bisect-bracket", "target lies outside the bracketed range")
                .with_context("target", target.to_string())
                .with_context("lower", f_lo.to_string())
                .with_context("upper", f_hi.to_string()),
        ));
    }
    for _ in 0..200 {
        let mid = 0.5 * (lo + hi);
        if f(mid) < target {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo <= 1e-14 * hi.abs().max(1.0) {
            break;
        }
    }
    Ok(0.5 * (lo + hi))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gradient_is_exact_for_quadratics_on_uneven_grids() {
        let xx = [0.0, 0.5, 1.5, 1.75, 3.0];
        let ff: Vec<f64> = xx.iter().map(|x| x * x).collect();
        let grad = gradient(&ff, &xx).unwrap();
        for i in 1..xx.len() - 1 {
            assert!((grad[i] - 2.0 * xx[i]).abs() < 1e-12);
        }
    }

    #[test]
    fn interp_fills_outside_and_hits_nodes() {
        let xp = [0.0, 1.0, 2.0];
        let fp = [0.0, 10.0, 0.0];
        assert_eq!(interp(-0.1, &xp, &fp, 0.0), 0.0);
        assert_eq!(interp(1.0, &xp, &fp, 0.0), 10.0);
        assert!((interp(1.5, &xp, &fp, 0.0) - 5.0).abs() < 1e-12);
        assert_eq!(interp(2.0, &xp, &fp, -1.0), 0.0);
    }

    #[test]
    fn cumtrapz_ends_at_trapz() {
        let xx = linspace(0.0, 2.0, 101);
        let yy: Vec<f64> = xx.iter().map(|x| x.sin()).collect();
        let cumulative = cumtrapz(&yy, &xx);
        assert_eq!(cumulative.len(), xx.len());
        assert!((cumulative[100] - trapz(&yy, &xx)).abs() < 1e-12);
    }

    #[test]
    fn simpson_integrates_cubic_exactly() {
        let value = simpson(|x| x * x * x, 0.0, 2.0, 4);
        assert!((value - 4.0).abs() < 1e-12);
    }

    #[test]
    fn bisection_rejects_unbracketed_targets() {
        assert!(bisect_increasing(|x| x, 2.0, 0.0, 1.0).is_err());
        let root = bisect_increasing(|x| x * x, 2.0, 0.0, 2.0).unwrap();
        assert!((root - 2f64.sqrt()).abs() < 1e-10);
    }
}
