use std::fs;
use std::path::Path;

use gwn_core::errors::{ErrorInfo, NestError};
use gwn_core::RngHandle;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::float_codec;
use crate::problem::{Likelihood, SearchProblem};
use crate::resample::{posterior_weights, resample_equal, select_rows};
use crate::sampler::SamplerResults;

/// Weighted dead points of a run, one row per point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NestedSamples {
    /// Physical coordinates.
    #[serde(with = "float_codec::matrix")]
    pub samples: Vec<Vec<f64>>,
    /// Posterior weight of each point.
    #[serde(with = "float_codec::vec")]
    pub weights: Vec<f64>,
    /// Log-likelihood of each point.
    #[serde(with = "float_codec::vec")]
    pub log_likelihood: Vec<f64>,
}

/// Posterior samples and evidence of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestResult {
    /// Run label.
    pub label: String,
    /// Sampled parameter names, matching the sample columns.
    pub search_parameter_keys: Vec<String>,
    /// Fixed parameters and their values.
    pub fixed_parameters: IndexMap<String, f64>,
    /// Equally weighted posterior samples.
    #[serde(with = "float_codec::matrix")]
    pub posterior: Vec<Vec<f64>>,
    /// Log-likelihood of each posterior sample.
    #[serde(with = "float_codec::vec")]
    pub log_likelihood_evaluations: Vec<f64>,
    /// Weighted dead points.
    pub nested_samples: NestedSamples,
    /// Log-evidence of the signal model.
    #[serde(with = "float_codec")]
    pub log_evidence: f64,
    /// Standard error of the log-evidence.
    #[serde(with = "float_codec")]
    pub log_evidence_err: f64,
    /// Log-evidence of the noise model.
    #[serde(with = "float_codec")]
    pub log_noise_evidence: f64,
    /// Log Bayes factor of signal against noise.
    #[serde(with = "float_codec")]
    pub log_bayes_factor: f64,
    /// Total likelihood calls.
    pub call_count: u64,
    /// Seed label recorded from the configuration.
    #[serde(default)]
    pub seed_label: Option<String>,
}

impl NestResult {
    /// Writes the result as JSON, creating the parent directory.
    pub fn write(&self, path: &Path) -> Result<(), NestError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                NestError::Storage(
                    ErrorInfo::new("result-mkdir", err.to_string())
                        .with_context("path", parent.display().to_string()),
                )
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|err| {
            NestError::Storage(
                ErrorInfo::new("result-serialize", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        fs::write(path, json).map_err(|err| {
            NestError::Storage(
                ErrorInfo::new("result-write", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })
    }

    /// Reads a result written by [`NestResult::write`].
    pub fn load(path: &Path) -> Result<Self, NestError> {
        let contents = fs::read_to_string(path).map_err(|err| {
            NestError::Storage(
                ErrorInfo::new("result-read", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        serde_json::from_str(&contents).map_err(|err| {
            NestError::Corruption(
                ErrorInfo::new("result-parse", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })
    }
}

/// Turns raw sampler output into a [`NestResult`].
#[derive(Debug, Clone)]
pub struct ResultAssembler {
    label: String,
    search_parameter_keys: Vec<String>,
    fixed_parameters: IndexMap<String, f64>,
    use_ratio: bool,
    log_noise_evidence: f64,
    seed: u64,
    seed_label: Option<String>,
}

impl ResultAssembler {
    /// Assembler for runs of `problem`.
    pub fn for_problem<L: Likelihood>(
        problem: &SearchProblem<L>,
        label: impl Into<String>,
        seed: u64,
    ) -> Self {
        Self {
            label: label.into(),
            search_parameter_keys: problem.search_keys().to_vec(),
            fixed_parameters: problem.fixed_parameters().clone(),
            use_ratio: problem.use_ratio(),
            log_noise_evidence: problem.noise_log_likelihood(),
            seed,
            seed_label: None,
        }
    }

    /// Records the seed label with the result.
    pub fn with_seed_label(mut self, seed_label: Option<String>) -> Self {
        self.seed_label = seed_label;
        self
    }

    /// Resamples the weighted chain to equal weights and collects the
    /// evidence figures. With `use_ratio` the sampler's evidence is the Bayes
    /// factor and the noise evidence is added back.
    pub fn assemble(&self, results: &SamplerResults) -> Result<NestResult, NestError> {
        let final_log_evidence = results.final_log_evidence().ok_or_else(|| {
            NestError::Sampler(ErrorInfo::new("empty-results", "sampler produced no samples"))
        })?;
        let weights = posterior_weights(&results.log_weight, final_log_evidence);
        let mut rng = RngHandle::substream(self.seed, results.call_count);
        let indices = resample_equal(&weights, &mut rng)?;
        let posterior = select_rows(&results.samples, &indices);
        let log_likelihood_evaluations = indices
            .iter()
            .filter_map(|&index| results.log_likelihood.get(index).copied())
            .collect();

        let (log_evidence, log_bayes_factor) = if self.use_ratio {
            (
                final_log_evidence + self.log_noise_evidence,
                final_log_evidence,
            )
        } else {
            (
                final_log_evidence,
                final_log_evidence - self.log_noise_evidence,
            )
        };
        let log_evidence_err = results.log_evidence_err.last().copied().unwrap_or(f64::NAN);
        info!(
            log_evidence,
            log_evidence_err,
            samples = posterior.len(),
            "assembled result"
        );

        Ok(NestResult {
            label: self.label.clone(),
            search_parameter_keys: self.search_parameter_keys.clone(),
            fixed_parameters: self.fixed_parameters.clone(),
            posterior,
            log_likelihood_evaluations,
            nested_samples: NestedSamples {
                samples: results.samples.clone(),
                weights,
                log_likelihood: results.log_likelihood.clone(),
            },
            log_evidence,
            log_evidence_err,
            log_noise_evidence: self.log_noise_evidence,
            log_bayes_factor,
            call_count: results.call_count,
            seed_label: self.seed_label.clone(),
        })
    }
}
