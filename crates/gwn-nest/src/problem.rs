use std::hint::black_box;
use std::time::Instant;

use gwn_core::errors::{ErrorInfo, NestError};
use gwn_core::RngHandle;
use gwn_prior::PriorDict;
use indexmap::IndexMap;
use tracing::{info, warn};

/// Parameters handed to a likelihood, keyed by name.
pub type Parameters = IndexMap<String, f64>;

/// Likelihood supplied by the caller.
pub trait Likelihood {
    /// Log-likelihood at `parameters`.
    fn log_likelihood(&self, parameters: &Parameters) -> f64;

    /// Log-likelihood of the data under the noise-only model; NaN if the
    /// model has none.
    fn noise_log_likelihood(&self) -> f64 {
        f64::NAN
    }

    /// Log-likelihood ratio against the noise model.
    fn log_likelihood_ratio(&self, parameters: &Parameters) -> f64 {
        self.log_likelihood(parameters) - self.noise_log_likelihood()
    }
}

impl<F: Fn(&Parameters) -> f64> Likelihood for F {
    fn log_likelihood(&self, parameters: &Parameters) -> f64 {
        self(parameters)
    }
}

/// A likelihood together with the priors it is explored under.
///
/// Priors flagged as fixed are pinned at their value and excluded from the
/// sampled dimensions.
#[derive(Debug)]
pub struct SearchProblem<L> {
    likelihood: L,
    priors: PriorDict,
    search_keys: Vec<String>,
    fixed: Parameters,
    use_ratio: bool,
}

impl<L: Likelihood> SearchProblem<L> {
    /// Splits `priors` into sampled and fixed parameters.
    pub fn new(likelihood: L, priors: PriorDict, use_ratio: bool) -> Result<Self, NestError> {
        let search_keys = priors.search_keys();
        if search_keys.is_empty() {
            return Err(NestError::Config(
                ErrorInfo::new("no-search-parameters", "every prior is fixed")
                    .with_hint("at least one prior must be sampled"),
            ));
        }
        let fixed = priors.fixed_values();
        info!(search = ?search_keys, fixed = ?fixed, "search parameters");
        let problem = Self {
            likelihood,
            priors,
            search_keys,
            fixed,
            use_ratio,
        };
        if use_ratio && problem.likelihood.noise_log_likelihood().is_nan() {
            warn!("log-likelihood ratio requested but the noise log-likelihood is NaN");
        }
        Ok(problem)
    }

    /// Number of sampled dimensions.
    pub fn ndim(&self) -> usize {
        self.search_keys.len()
    }

    /// Sampled parameter names, in prior insertion order.
    pub fn search_keys(&self) -> &[String] {
        &self.search_keys
    }

    /// Fixed parameters and their values.
    pub fn fixed_parameters(&self) -> &Parameters {
        &self.fixed
    }

    /// Priors of the problem.
    pub fn priors(&self) -> &PriorDict {
        &self.priors
    }

    /// Whether the likelihood ratio is sampled.
    pub fn use_ratio(&self) -> bool {
        self.use_ratio
    }

    /// Noise log-likelihood of the wrapped likelihood.
    pub fn noise_log_likelihood(&self) -> f64 {
        self.likelihood.noise_log_likelihood()
    }

    /// Maps a unit-cube point to physical coordinates.
    pub fn prior_transform(&self, unit_cube: &[f64]) -> Result<Vec<f64>, NestError> {
        self.priors.rescale(&self.search_keys, unit_cube)
    }

    /// Log prior density of a physical point.
    pub fn log_prior(&self, theta: &[f64]) -> Result<f64, NestError> {
        self.priors.ln_prob(&self.search_keys, theta)
    }

    /// Full parameter set for a physical point: fixed values plus `theta`.
    pub fn parameters(&self, theta: &[f64]) -> Parameters {
        let mut parameters = self.fixed.clone();
        for (key, &value) in self.search_keys.iter().zip(theta) {
            parameters.insert(key.clone(), value);
        }
        parameters
    }

    /// Log-likelihood, or log-likelihood ratio when `use_ratio` is set.
    pub fn log_likelihood(&self, theta: &[f64]) -> f64 {
        let parameters = self.parameters(theta);
        if self.use_ratio {
            self.likelihood.log_likelihood_ratio(&parameters)
        } else {
            self.likelihood.log_likelihood(&parameters)
        }
    }

    /// Draws a physical point from the prior, warning on infinite
    /// likelihood or prior.
    pub fn draw_from_prior(&self, rng: &mut RngHandle) -> Result<Vec<f64>, NestError> {
        let unit: Vec<f64> = (0..self.ndim()).map(|_| rng.uniform()).collect();
        let theta = self.prior_transform(&unit)?;
        if self.log_likelihood(&theta).is_infinite() {
            warn!(?theta, "prior draw has infinite likelihood");
        }
        if self.log_prior(&theta)?.is_infinite() {
            warn!(?theta, "prior draw has infinite prior");
        }
        Ok(theta)
    }

    /// Mean wall-clock seconds per likelihood call over `draws` prior draws;
    /// NaN if the time could not be measured.
    pub fn measure_likelihood_eval_time(&self, rng: &mut RngHandle, draws: usize) -> Result<f64, NestError> {
        let mut points = Vec::with_capacity(draws);
        for _ in 0..draws.max(1) {
            points.push(self.draw_from_prior(rng)?);
        }
        let start = Instant::now();
        for theta in &points {
            black_box(self.log_likelihood(black_box(theta)));
        }
        let elapsed = start.elapsed().as_secs_f64() / points.len() as f64;
        if elapsed > 0.0 {
            info!(seconds = elapsed, "single likelihood evaluation");
            Ok(elapsed)
        } else {
            info!("unable to measure single likelihood time");
            Ok(f64::NAN)
        }
    }
}
