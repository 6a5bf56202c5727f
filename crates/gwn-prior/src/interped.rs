use gwn_core::errors::{ErrorInfo, NestError};

use crate::numeric::{cumtrapz, interp, linspace, trapz};
use crate::prior::{Prior, PriorMeta};

/// Prior defined by a tabulated, not necessarily normalized, density.
///
/// The source table is kept so the support can be narrowed later; the active
/// table is the source resampled onto `[minimum, maximum]` with the same number
/// of nodes and normalized there.
#[derive(Debug, Clone, PartialEq)]
pub struct Interped {
    meta: PriorMeta,
    source_xx: Vec<f64>,
    source_yy: Vec<f64>,
    minimum: f64,
    maximum: f64,
    xx: Vec<f64>,
    yy: Vec<f64>,
    cumulative: Vec<f64>,
}

impl Interped {
    /// Builds the prior from `(xx, yy)`; missing or out-of-table bounds are
    /// clamped to the table range.
    pub fn new(
        meta: PriorMeta,
        xx: Vec<f64>,
        yy: Vec<f64>,
        minimum: Option<f64>,
        maximum: Option<f64>,
    ) -> Result<Self, NestError> {
        if xx.len() < 2 || xx.len() != yy.len() {
            return Err(NestError::Numeric(
                ErrorInfo::new("interped-shape", "density table needs two or more aligned nodes")
                    .with_context("name", meta.name.clone())
                    .with_context("xx", xx.len().to_string())
                    .with_context("yy", yy.len().to_string()),
            ));
        }
        if xx.windows(2).any(|pair| pair[1] <= pair[0]) {
            return Err(NestError::Numeric(
                ErrorInfo::new("interped-order", "density nodes must be strictly increasing")
                    .with_context("name", meta.name.clone()),
            ));
        }
        let lower = xx[0];
        let upper = xx[xx.len() - 1];
        let mut prior = Self {
            meta,
            source_xx: xx,
            source_yy: yy,
            minimum: lower,
            maximum: upper,
            xx: Vec::new(),
            yy: Vec::new(),
            cumulative: Vec::new(),
        };
        prior.set_range(
            minimum.unwrap_or(lower).max(lower),
            maximum.unwrap_or(upper).min(upper),
        )?;
        Ok(prior)
    }

    /// Narrows or widens the support within the source table and rebuilds the
    /// normalized density and cumulative tables.
    pub fn set_range(&mut self, minimum: f64, maximum: f64) -> Result<(), NestError> {
        if minimum.is_nan() || maximum.is_nan() || minimum >= maximum {
            return Err(NestError::Bounds(
                ErrorInfo::new("bounds-order", "minimum must be strictly below maximum")
                    .with_context("name", self.meta.name.clone())
                    .with_context("minimum", minimum.to_string())
                    .with_context("maximum", maximum.to_string()),
            ));
        }
        let xx = linspace(minimum, maximum, self.source_xx.len());
        let raw: Vec<f64> = xx
            .iter()
            .map(|&x| interp(x, &self.source_xx, &self.source_yy, 0.0))
            .collect();
        let norm = trapz(&raw, &xx);
        if !(norm.is_finite() && norm > 0.0) {
            return Err(NestError::Numeric(
                ErrorInfo::new("interped-normalisation", "density does not integrate to a positive value")
                    .with_context("name", self.meta.name.clone())
                    .with_context("norm", norm.to_string()),
            ));
        }
        let yy: Vec<f64> = raw.into_iter().map(|value| value / norm).collect();
        let mut cumulative = cumtrapz(&yy, &xx);
        if let Some(last) = cumulative.last_mut() {
            *last = 1.0;
        }
        self.minimum = minimum;
        self.maximum = maximum;
        self.xx = xx;
        self.yy = yy;
        self.cumulative = cumulative;
        Ok(())
    }

    /// Nodes of the normalized density.
    pub fn xx(&self) -> &[f64] {
        &self.xx
    }

    /// Normalized density values at [`Interped::xx`].
    pub fn yy(&self) -> &[f64] {
        &self.yy
    }

    /// Cumulative distribution at `value`.
    pub fn cdf(&self, value: f64) -> f64 {
        if value <= self.minimum {
            0.0
        } else if value >= self.maximum {
            1.0
        } else {
            interp(value, &self.xx, &self.cumulative, 0.0)
        }
    }
}

impl Prior for Interped {
    fn meta(&self) -> &PriorMeta {
        &self.meta
    }

    fn minimum(&self) -> f64 {
        self.minimum
    }

    fn maximum(&self) -> f64 {
        self.maximum
    }

    fn rescale(&self, unit: f64) -> f64 {
        interp(unit.clamp(0.0, 1.0), &self.cumulative, &self.xx, f64::NAN)
    }

    fn prob(&self, value: f64) -> f64 {
        interp(value, &self.xx, &self.yy, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> Interped {
        let xx = linspace(0.0, 2.0, 201);
        let yy = xx.clone();
        Interped::new(PriorMeta::named("ramp"), xx, yy, None, None).unwrap()
    }

    #[test]
    fn density_is_normalised() {
        let prior = ramp();
        assert!((trapz(prior.yy(), prior.xx()) - 1.0).abs() < 1e-12);
        assert!((prior.prob(1.0) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn rescale_inverts_cdf() {
        let prior = ramp();
        for &u in &[0.1, 0.25, 0.5, 0.9] {
            let x = prior.rescale(u);
            assert!((prior.cdf(x) - u).abs() < 1e-4, "u={u} x={x}");
        }
        assert_eq!(prior.rescale(0.0), 0.0);
        assert_eq!(prior.rescale(1.0), 2.0);
    }

    #[test]
    fn narrowing_range_renormalises() {
        let mut prior = ramp();
        prior.set_range(1.0, 2.0).unwrap();
        assert_eq!(prior.prob(0.5), 0.0);
        assert!((trapz(prior.yy(), prior.xx()) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_unsorted_nodes() {
        let err = Interped::new(
            PriorMeta::named("bad"),
            vec![0.0, 2.0, 1.0],
            vec![1.0, 1.0, 1.0],
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, NestError::Numeric(_)));
    }
}
