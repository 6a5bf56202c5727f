use gwn_core::errors::NestError;

use crate::interped::Interped;
use crate::numeric::{linspace, trapz};
use crate::prior::{Prior, PriorKind, PriorMeta, Uniform};

const CHI_POINTS: usize = 800;
const MAGNITUDE_POINTS: usize = 1000;

/// Prior on the aligned spin component `χ = a cos θ`, marginalised over the
/// spin magnitude `a` and the cosine of the tilt.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedSpin {
    density: Interped,
}

impl AlignedSpin {
    /// Builds the compound prior from a magnitude prior and a cos-tilt prior.
    pub fn new(
        meta: PriorMeta,
        a_prior: &PriorKind,
        z_prior: &PriorKind,
    ) -> Result<Self, NestError> {
        let chi_min = (a_prior.maximum() * z_prior.minimum())
            .min(a_prior.minimum() * z_prior.maximum());
        let chi_max = a_prior.maximum() * z_prior.maximum();
        let xx = linspace(chi_min, chi_max, CHI_POINTS);
        let aas = linspace(a_prior.minimum(), a_prior.maximum(), MAGNITUDE_POINTS);
        let yy = xx
            .iter()
            .map(|&chi| {
                let integrand: Vec<f64> = aas
                    .iter()
                    .map(|&a| {
                        let value = a_prior.prob(a) / a * z_prior.prob(chi / a);
                        if value.is_finite() {
                            value
                        } else {
                            0.0
                        }
                    })
                    .collect();
                trapz(&integrand, &aas)
            })
            .collect();
        Ok(Self {
            density: Interped::new(meta, xx, yy, None, None)?,
        })
    }

    /// Uniform magnitude on `[0, 1]` and uniform cos-tilt on `[-1, 1]`.
    pub fn uniform(meta: PriorMeta) -> Result<Self, NestError> {
        let a_prior = Uniform::new(PriorMeta::named("a"), 0.0, 1.0)?.into();
        let z_prior = Uniform::new(PriorMeta::named("cos_tilt"), -1.0, 1.0)?.into();
        Self::new(meta, &a_prior, &z_prior)
    }
}

impl Prior for AlignedSpin {
    fn meta(&self) -> &PriorMeta {
        self.density.meta()
    }

    fn minimum(&self) -> f64 {
        self.density.minimum()
    }

    fn maximum(&self) -> f64 {
        self.density.maximum()
    }

    fn rescale(&self, unit: f64) -> f64 {
        self.density.rescale(unit)
    }

    fn prob(&self, value: f64) -> f64 {
        self.density.prob(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_aligned_spin_is_symmetric_and_peaked() {
        let prior = AlignedSpin::uniform(PriorMeta::named("chi_1")).unwrap();
        assert!((prior.minimum() + 1.0).abs() < 1e-12);
        assert!((prior.maximum() - 1.0).abs() < 1e-12);
        assert!((prior.prob(0.3) - prior.prob(-0.3)).abs() < 1e-3);
        assert!(prior.prob(0.05) > prior.prob(0.6));
        assert!(prior.rescale(0.5).abs() < 1e-2);
    }
}
