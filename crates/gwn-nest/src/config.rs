use std::fs;
use std::path::{Path, PathBuf};

use gwn_core::errors::{ErrorInfo, NestError};
use serde::{Deserialize, Serialize};

/// YAML-configurable parameters of a nested-sampling run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Directory receiving checkpoints, results and logs.
    #[serde(default = "default_outdir")]
    pub outdir: PathBuf,
    /// Prefix of every file written for the run.
    #[serde(default = "default_label")]
    pub label: String,
    /// Sample the log-likelihood ratio against the noise model instead of the
    /// log-likelihood.
    #[serde(default)]
    pub use_ratio: bool,
    /// Options forwarded to the sampler.
    #[serde(default)]
    pub sampler: SamplerOptions,
    /// Checkpointing behaviour.
    #[serde(default)]
    pub checkpoint: CheckpointConfig,
    /// Master seed and substream policy.
    #[serde(default)]
    pub seed_policy: SeedPolicy,
}

fn default_outdir() -> PathBuf {
    PathBuf::from("outdir")
}

fn default_label() -> String {
    "label".to_string()
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            outdir: default_outdir(),
            label: default_label(),
            use_ratio: false,
            sampler: SamplerOptions::default(),
            checkpoint: CheckpointConfig::default(),
            seed_policy: SeedPolicy::default(),
        }
    }
}

impl RunConfig {
    /// Parses a YAML document.
    pub fn from_yaml_str(contents: &str) -> Result<Self, NestError> {
        let config: RunConfig = serde_yaml::from_str(contents).map_err(|err| {
            NestError::Config(ErrorInfo::new("config-parse", err.to_string()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a YAML file.
    pub fn load(path: &Path) -> Result<Self, NestError> {
        let contents = fs::read_to_string(path).map_err(|err| {
            NestError::Config(
                ErrorInfo::new("config-read", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        Self::from_yaml_str(&contents).map_err(|err| {
            NestError::Config(
                err.info()
                    .clone()
                    .with_context("path", path.display().to_string()),
            )
        })
    }

    /// Rejects settings no sampler can run with.
    pub fn validate(&self) -> Result<(), NestError> {
        if self.sampler.nlive == 0 {
            return Err(NestError::Config(
                ErrorInfo::new("nlive-zero", "at least one live point is required")
                    .with_hint("set sampler.nlive (or npoints) to a positive integer"),
            ));
        }
        if !(self.sampler.dlogz > 0.0) {
            return Err(NestError::Config(
                ErrorInfo::new("dlogz-invalid", "dlogz must be positive")
                    .with_context("dlogz", self.sampler.dlogz.to_string()),
            ));
        }
        if self.label.is_empty() {
            return Err(NestError::Config(ErrorInfo::new(
                "label-empty",
                "label must not be empty",
            )));
        }
        Ok(())
    }

    /// `{outdir}/{label}_resume.json`.
    pub fn resume_path(&self) -> PathBuf {
        self.outdir.join(format!("{}_resume.json", self.label))
    }

    /// `{outdir}/{label}_result.json`.
    pub fn result_path(&self) -> PathBuf {
        self.outdir.join(format!("{}_result.json", self.label))
    }

    /// Calls per checkpoint burst, or `None` when checkpointing is off.
    ///
    /// An explicit `n_check_point` wins. Otherwise the checkpoint period is
    /// divided by the measured likelihood evaluation time and rounded to one
    /// significant figure; an unmeasurable evaluation time turns checkpointing
    /// off.
    pub fn checkpoint_interval(&self, likelihood_eval_time: f64) -> Option<u64> {
        if !self.checkpoint.enabled {
            return None;
        }
        if let Some(interval) = self.checkpoint.n_check_point {
            return Some(interval.max(1));
        }
        if !(likelihood_eval_time.is_finite() && likelihood_eval_time > 0.0) {
            return None;
        }
        let raw = self.checkpoint.delta_t / likelihood_eval_time;
        round_to_one_significant_figure(raw).map(|calls| calls.max(1))
    }
}

fn round_to_one_significant_figure(value: f64) -> Option<u64> {
    if !(value.is_finite() && value > 0.0) {
        return None;
    }
    let magnitude = 10f64.powi(value.log10().floor() as i32);
    let rounded = (value / magnitude).round_ties_even() * magnitude;
    Some(rounded as u64)
}

/// Options forwarded to the nested sampler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerOptions {
    /// Number of live points.
    #[serde(
        default = "default_nlive",
        alias = "npoints",
        alias = "nlives",
        alias = "n_live_points",
        alias = "npoint",
        alias = "Nlive"
    )]
    pub nlive: usize,
    /// Bounding method, e.g. `multi`.
    #[serde(default = "default_bound")]
    pub bound: String,
    /// Sampling method within the bound, e.g. `rwalk`.
    #[serde(default = "default_sample")]
    pub sample: String,
    /// Random-walk steps; `5 * ndim` when unset.
    #[serde(default)]
    pub walks: Option<usize>,
    /// Iterations between bound updates; `0.6 * nlive` when unset.
    #[serde(default)]
    pub update_interval: Option<usize>,
    /// Remaining-evidence stopping threshold.
    #[serde(default = "default_dlogz")]
    pub dlogz: f64,
    /// Iteration cap.
    #[serde(default)]
    pub maxiter: Option<u64>,
    /// Likelihood call cap.
    #[serde(default)]
    pub maxcall: Option<u64>,
    /// Bound enlargement factor.
    #[serde(default)]
    pub enlarge: Option<f64>,
    /// Bootstrap realisations for bound expansion.
    #[serde(default)]
    pub bootstrap: Option<usize>,
    /// Volume decrease threshold for splitting ellipsoids.
    #[serde(default = "default_vol_dec")]
    pub vol_dec: f64,
    /// Volume ratio threshold for splitting ellipsoids.
    #[serde(default = "default_vol_check")]
    pub vol_check: f64,
    /// Target acceptance fraction.
    #[serde(default = "default_facc")]
    pub facc: f64,
    /// Slice sampling slices.
    #[serde(default = "default_slices")]
    pub slices: usize,
}

fn default_nlive() -> usize {
    500
}

fn default_bound() -> String {
    "multi".to_string()
}

fn default_sample() -> String {
    "rwalk".to_string()
}

fn default_dlogz() -> f64 {
    0.1
}

fn default_vol_dec() -> f64 {
    0.5
}

fn default_vol_check() -> f64 {
    2.0
}

fn default_facc() -> f64 {
    0.5
}

fn default_slices() -> usize {
    5
}

impl Default for SamplerOptions {
    fn default() -> Self {
        Self {
            nlive: default_nlive(),
            bound: default_bound(),
            sample: default_sample(),
            walks: None,
            update_interval: None,
            dlogz: default_dlogz(),
            maxiter: None,
            maxcall: None,
            enlarge: None,
            bootstrap: None,
            vol_dec: default_vol_dec(),
            vol_check: default_vol_check(),
            facc: default_facc(),
            slices: default_slices(),
        }
    }
}

impl SamplerOptions {
    /// Fills the dimension-dependent defaults.
    pub fn resolve(&self, ndim: usize) -> SamplerOptions {
        let mut resolved = self.clone();
        if resolved.walks.map_or(true, |walks| walks == 0) {
            resolved.walks = Some(5 * ndim);
        }
        if resolved.update_interval.map_or(true, |interval| interval == 0) {
            resolved.update_interval = Some((0.6 * resolved.nlive as f64) as usize);
        }
        resolved
    }
}

/// Checkpointing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointConfig {
    /// Write checkpoints between bursts.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Approximate wall-clock seconds between checkpoints.
    #[serde(default = "default_delta_t")]
    pub delta_t: f64,
    /// Explicit calls per burst, overriding `delta_t`.
    #[serde(default)]
    pub n_check_point: Option<u64>,
    /// Continue from an existing checkpoint when one is found.
    #[serde(default = "default_true")]
    pub resume: bool,
}

fn default_true() -> bool {
    true
}

fn default_delta_t() -> f64 {
    600.0
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            delta_t: default_delta_t(),
            n_check_point: None,
            resume: true,
        }
    }
}

/// Deterministic seeding configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedPolicy {
    /// Master seed used for prior draws and posterior resampling.
    #[serde(default = "default_master_seed")]
    pub master_seed: u64,
    /// Optional label recorded with results.
    #[serde(default)]
    pub label: Option<String>,
}

fn default_master_seed() -> u64 {
    0x05EE_D5EE_DD15_5EED_u64
}

impl Default for SeedPolicy {
    fn default() -> Self {
        Self {
            master_seed: default_master_seed(),
            label: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_like_one_significant_figure() {
        assert_eq!(round_to_one_significant_figure(43_795.6), Some(40_000));
        assert_eq!(round_to_one_significant_figure(96.0), Some(100));
        assert_eq!(round_to_one_significant_figure(25.0), Some(20));
        assert_eq!(round_to_one_significant_figure(0.4), Some(0));
        assert_eq!(round_to_one_significant_figure(f64::NAN), None);
    }

    #[test]
    fn resolve_fills_dimension_defaults() {
        let options = SamplerOptions {
            nlive: 250,
            ..SamplerOptions::default()
        }
        .resolve(4);
        assert_eq!(options.walks, Some(20));
        assert_eq!(options.update_interval, Some(150));
    }
}
