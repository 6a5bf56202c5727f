use gwn_core::errors::{ErrorInfo, NestError};
use gwn_core::RngHandle;
use statrs::distribution::{Continuous, ContinuousCDF, Normal};

use crate::cosmological::CosmologicalPrior;
use crate::interped::Interped;
use crate::spin::AlignedSpin;

/// Descriptive metadata shared by every prior variant.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriorMeta {
    /// Parameter name the prior is registered under.
    pub name: String,
    /// Optional display label; falls back to a [`crate::LabelTable`] lookup.
    pub latex_label: Option<String>,
    /// Optional unit, e.g. `Mpc`.
    pub unit: Option<String>,
}

impl PriorMeta {
    /// Metadata carrying only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the display label.
    pub fn with_latex_label(mut self, label: impl Into<String>) -> Self {
        self.latex_label = Some(label.into());
        self
    }

    /// Sets the unit.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }
}

/// Capability interface shared by every one-dimensional prior.
pub trait Prior {
    /// Metadata of the prior.
    fn meta(&self) -> &PriorMeta;

    /// Lower edge of the support.
    fn minimum(&self) -> f64;

    /// Upper edge of the support.
    fn maximum(&self) -> f64;

    /// Maps a unit-interval value onto the prior (inverse CDF).
    fn rescale(&self, unit: f64) -> f64;

    /// Probability density at `value`.
    fn prob(&self, value: f64) -> f64;

    /// Log probability density at `value`.
    fn ln_prob(&self, value: f64) -> f64 {
        self.prob(value).ln()
    }

    /// Draws a value from the prior.
    fn sample(&self, rng: &mut RngHandle) -> f64 {
        self.rescale(rng.uniform())
    }

    /// True for priors that pin a parameter to a single value.
    fn is_fixed(&self) -> bool {
        false
    }
}

fn check_range(name: &str, minimum: f64, maximum: f64) -> Result<(), NestError> {
    if minimum.is_nan() || maximum.is_nan() || minimum >= maximum {
        return Err(NestError::Bounds(
            ErrorInfo::new("bounds-order", "minimum must be strictly below maximum")
                .with_context("name", name)
                .with_context("minimum", minimum.to_string())
                .with_context("maximum", maximum.to_string()),
        ));
    }
    Ok(())
}

/// Uniform prior on `[minimum, maximum]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Uniform {
    meta: PriorMeta,
    minimum: f64,
    maximum: f64,
}

impl Uniform {
    /// Builds a uniform prior, rejecting empty or inverted ranges.
    pub fn new(meta: PriorMeta, minimum: f64, maximum: f64) -> Result<Self, NestError> {
        check_range(&meta.name, minimum, maximum)?;
        Ok(Self {
            meta,
            minimum,
            maximum,
        })
    }
}

impl Prior for Uniform {
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
        self.minimum + unit * (self.maximum - self.minimum)
    }

    fn prob(&self, value: f64) -> f64 {
        if (self.minimum..=self.maximum).contains(&value) {
            1.0 / (self.maximum - self.minimum)
        } else {
            0.0
        }
    }
}

/// Normal prior with mean `mu` and standard deviation `sigma`.
#[derive(Debug, Clone)]
pub struct Gaussian {
    meta: PriorMeta,
    mu: f64,
    sigma: f64,
    normal: Normal,
}

impl Gaussian {
    /// Builds a Gaussian prior; `sigma` must be positive.
    pub fn new(meta: PriorMeta, mu: f64, sigma: f64) -> Result<Self, NestError> {
        let normal = Normal::new(mu, sigma).map_err(|err| {
            NestError::Bounds(
                ErrorInfo::new("gaussian-parameters", err.to_string())
                    .with_context("name", meta.name.clone())
                    .with_context("sigma", sigma.to_string()),
            )
        })?;
        Ok(Self {
            meta,
            mu,
            sigma,
            normal,
        })
    }

    /// Mean of the distribution.
    pub fn mu(&self) -> f64 {
        self.mu
    }

    /// Standard deviation of the distribution.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }
}

impl Prior for Gaussian {
    fn meta(&self) -> &PriorMeta {
        &self.meta
    }

    fn minimum(&self) -> f64 {
        f64::NEG_INFINITY
    }

    fn maximum(&self) -> f64 {
        f64::INFINITY
    }

    fn rescale(&self, unit: f64) -> f64 {
        self.normal.inverse_cdf(unit)
    }

    fn prob(&self, value: f64) -> f64 {
        self.normal.pdf(value)
    }

    fn ln_prob(&self, value: f64) -> f64 {
        self.normal.ln_pdf(value)
    }
}

/// Prior pinning a parameter to `peak`.
#[derive(Debug, Clone, PartialEq)]
pub struct DeltaFunction {
    meta: PriorMeta,
    peak: f64,
}

impl DeltaFunction {
    /// Builds a delta-function prior.
    pub fn new(meta: PriorMeta, peak: f64) -> Self {
        Self { meta, peak }
    }

    /// The fixed value.
    pub fn peak(&self) -> f64 {
        self.peak
    }
}

impl Prior for DeltaFunction {
    fn meta(&self) -> &PriorMeta {
        &self.meta
    }

    fn minimum(&self) -> f64 {
        self.peak
    }

    fn maximum(&self) -> f64 {
        self.peak
    }

    fn rescale(&self, _unit: f64) -> f64 {
        self.peak
    }

    fn prob(&self, value: f64) -> f64 {
        if value == self.peak {
            f64::INFINITY
        } else {
            0.0
        }
    }

    fn is_fixed(&self) -> bool {
        true
    }
}

/// Tagged union of every prior variant known to the workspace.
#[derive(Debug, Clone)]
pub enum PriorKind {
    /// See [`Uniform`].
    Uniform(Uniform),
    /// See [`Gaussian`].
    Gaussian(Gaussian),
    /// See [`DeltaFunction`].
    DeltaFunction(DeltaFunction),
    /// See [`Interped`].
    Interped(Interped),
    /// See [`CosmologicalPrior`].
    Cosmological(Box<CosmologicalPrior>),
    /// See [`AlignedSpin`].
    AlignedSpin(AlignedSpin),
}

impl PriorKind {
    fn as_prior(&self) -> &dyn Prior {
        match self {
            PriorKind::Uniform(prior) => prior,
            PriorKind::Gaussian(prior) => prior,
            PriorKind::DeltaFunction(prior) => prior,
            PriorKind::Interped(prior) => prior,
            PriorKind::Cosmological(prior) => prior.as_ref(),
            PriorKind::AlignedSpin(prior) => prior,
        }
    }

    /// Returns the cosmological variant, if this is one.
    pub fn as_cosmological(&self) -> Option<&CosmologicalPrior> {
        match self {
            PriorKind::Cosmological(prior) => Some(prior.as_ref()),
            _ => None,
        }
    }
}

impl Prior for PriorKind {
    fn meta(&self) -> &PriorMeta {
        self.as_prior().meta()
    }

    fn minimum(&self) -> f64 {
        self.as_prior().minimum()
    }

    fn maximum(&self) -> f64 {
        self.as_prior().maximum()
    }

    fn rescale(&self, unit: f64) -> f64 {
        self.as_prior().rescale(unit)
    }

    fn prob(&self, value: f64) -> f64 {
        self.as_prior().prob(value)
    }

    fn ln_prob(&self, value: f64) -> f64 {
        self.as_prior().ln_prob(value)
    }

    fn is_fixed(&self) -> bool {
        self.as_prior().is_fixed()
    }
}

impl From<Uniform> for PriorKind {
    fn from(prior: Uniform) -> Self {
        PriorKind::Uniform(prior)
    }
}

impl From<Gaussian> for PriorKind {
    fn from(prior: Gaussian) -> Self {
        PriorKind::Gaussian(prior)
    }
}

impl From<DeltaFunction> for PriorKind {
    fn from(prior: DeltaFunction) -> Self {
        PriorKind::DeltaFunction(prior)
    }
}

impl From<Interped> for PriorKind {
    fn from(prior: Interped) -> Self {
        PriorKind::Interped(prior)
    }
}

impl From<CosmologicalPrior> for PriorKind {
    fn from(prior: CosmologicalPrior) -> Self {
        PriorKind::Cosmological(Box::new(prior))
    }
}

impl From<AlignedSpin> for PriorKind {
    fn from(prior: AlignedSpin) -> Self {
        PriorKind::AlignedSpin(prior)
    }
}
