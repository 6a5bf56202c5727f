use gwn_core::errors::{ErrorInfo, NestError};
use serde::{Deserialize, Serialize};

use crate::float_codec;

/// One dead point together with the running accumulators after it was killed.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainElement {
    /// Coordinates in the unit hypercube.
    pub unit_cube: Vec<f64>,
    /// Coordinates after the prior transform.
    pub physical: Vec<f64>,
    /// Log-likelihood of the point.
    pub log_likelihood: f64,
    /// Log prior volume enclosed at this iteration.
    pub log_volume: f64,
    /// Log importance weight.
    pub log_weight: f64,
    /// Cumulative log-evidence.
    pub log_evidence: f64,
    /// Cumulative log-evidence variance.
    pub log_evidence_variance: f64,
    /// Cumulative information (KL divergence).
    pub information: f64,
    /// Index of the live point that died.
    pub id: u64,
    /// Iteration at which the point entered the live set.
    pub iteration_added: u64,
    /// Likelihood calls spent proposing the point's replacement.
    pub calls: u64,
    /// Index of the bound the point was proposed from.
    pub bound_index: u64,
    /// Iterations since that bound was built.
    pub bound_iteration: u64,
    /// Proposal scale factor.
    pub scale: f64,
}

/// Chain of dead points held as parallel arrays.
///
/// In memory this is the pending segment: everything produced since the last
/// checkpoint plus the single carry-over element kept from it. The serde names
/// are the on-disk field names of a checkpoint and must not change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainSegment {
    /// Unit-cube coordinates, one row per element.
    #[serde(rename = "unit_cube_samples", with = "float_codec::matrix")]
    pub unit_cube: Vec<Vec<f64>>,
    /// Physical coordinates, one row per element.
    #[serde(rename = "physical_samples", with = "float_codec::matrix")]
    pub physical: Vec<Vec<f64>>,
    /// Log-likelihoods.
    #[serde(rename = "sample_likelihoods", with = "float_codec::vec")]
    pub log_likelihood: Vec<f64>,
    /// Log prior volumes.
    #[serde(rename = "sample_log_volume", with = "float_codec::vec")]
    pub log_volume: Vec<f64>,
    /// Log importance weights.
    #[serde(rename = "sample_log_weights", with = "float_codec::vec")]
    pub log_weight: Vec<f64>,
    /// Cumulative log-evidence.
    #[serde(rename = "cumulative_log_evidence", with = "float_codec::vec")]
    pub log_evidence: Vec<f64>,
    /// Cumulative log-evidence variance.
    #[serde(rename = "cumulative_log_evidence_error", with = "float_codec::vec")]
    pub log_evidence_variance: Vec<f64>,
    /// Cumulative information.
    #[serde(rename = "cumulative_information", with = "float_codec::vec")]
    pub information: Vec<f64>,
    /// Dead live-point indices.
    pub id: Vec<u64>,
    /// Iterations at which each point entered the live set.
    #[serde(rename = "it")]
    pub iteration_added: Vec<u64>,
    /// Calls spent per element.
    #[serde(rename = "nc")]
    pub calls: Vec<u64>,
    /// Bound indices.
    #[serde(rename = "boundidx")]
    pub bound_index: Vec<u64>,
    /// Bound ages.
    #[serde(rename = "bounditer")]
    pub bound_iteration: Vec<u64>,
    /// Proposal scales.
    #[serde(with = "float_codec::vec")]
    pub scale: Vec<f64>,
}

impl ChainSegment {
    /// Number of elements.
    pub fn len(&self) -> usize {
        self.log_likelihood.len()
    }

    /// True if the segment holds no element.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends one element to every parallel array.
    pub fn push(&mut self, element: ChainElement) {
        self.unit_cube.push(element.unit_cube);
        self.physical.push(element.physical);
        self.log_likelihood.push(element.log_likelihood);
        self.log_volume.push(element.log_volume);
        self.log_weight.push(element.log_weight);
        self.log_evidence.push(element.log_evidence);
        self.log_evidence_variance.push(element.log_evidence_variance);
        self.information.push(element.information);
        self.id.push(element.id);
        self.iteration_added.push(element.iteration_added);
        self.calls.push(element.calls);
        self.bound_index.push(element.bound_index);
        self.bound_iteration.push(element.bound_iteration);
        self.scale.push(element.scale);
    }

    /// Element at `index`.
    pub fn get(&self, index: usize) -> Option<ChainElement> {
        if index >= self.len() {
            return None;
        }
        Some(ChainElement {
            unit_cube: self.unit_cube.get(index)?.clone(),
            physical: self.physical.get(index)?.clone(),
            log_likelihood: *self.log_likelihood.get(index)?,
            log_volume: *self.log_volume.get(index)?,
            log_weight: *self.log_weight.get(index)?,
            log_evidence: *self.log_evidence.get(index)?,
            log_evidence_variance: *self.log_evidence_variance.get(index)?,
            information: *self.information.get(index)?,
            id: *self.id.get(index)?,
            iteration_added: *self.iteration_added.get(index)?,
            calls: *self.calls.get(index)?,
            bound_index: *self.bound_index.get(index)?,
            bound_iteration: *self.bound_iteration.get(index)?,
            scale: *self.scale.get(index)?,
        })
    }

    /// Last element, the carry-over after a checkpoint.
    pub fn last(&self) -> Option<ChainElement> {
        self.len().checked_sub(1).and_then(|index| self.get(index))
    }

    /// Appends the elements of `other` from index `from` onwards. Indices past
    /// the end append nothing.
    pub fn extend_from(&mut self, other: &ChainSegment, from: usize) {
        fn tail<T: Clone>(values: &[T], from: usize) -> &[T] {
            values.get(from..).unwrap_or(&[])
        }
        self.unit_cube.extend_from_slice(tail(&other.unit_cube, from));
        self.physical.extend_from_slice(tail(&other.physical, from));
        self.log_likelihood.extend_from_slice(tail(&other.log_likelihood, from));
        self.log_volume.extend_from_slice(tail(&other.log_volume, from));
        self.log_weight.extend_from_slice(tail(&other.log_weight, from));
        self.log_evidence.extend_from_slice(tail(&other.log_evidence, from));
        self.log_evidence_variance
            .extend_from_slice(tail(&other.log_evidence_variance, from));
        self.information.extend_from_slice(tail(&other.information, from));
        self.id.extend_from_slice(tail(&other.id, from));
        self.iteration_added
            .extend_from_slice(tail(&other.iteration_added, from));
        self.calls.extend_from_slice(tail(&other.calls, from));
        self.bound_index.extend_from_slice(tail(&other.bound_index, from));
        self.bound_iteration
            .extend_from_slice(tail(&other.bound_iteration, from));
        self.scale.extend_from_slice(tail(&other.scale, from));
    }

    /// Drops everything but the final element.
    pub fn retain_last(&mut self) {
        if let Some(last) = self.last() {
            *self = ChainSegment::default();
            self.push(last);
        }
    }

    /// Lengths of every parallel array, keyed by on-disk name.
    fn field_lengths(&self) -> [(&'static str, usize); 14] {
        [
            ("unit_cube_samples", self.unit_cube.len()),
            ("physical_samples", self.physical.len()),
            ("sample_likelihoods", self.log_likelihood.len()),
            ("sample_log_volume", self.log_volume.len()),
            ("sample_log_weights", self.log_weight.len()),
            ("cumulative_log_evidence", self.log_evidence.len()),
            ("cumulative_log_evidence_error", self.log_evidence_variance.len()),
            ("cumulative_information", self.information.len()),
            ("id", self.id.len()),
            ("it", self.iteration_added.len()),
            ("nc", self.calls.len()),
            ("boundidx", self.bound_index.len()),
            ("bounditer", self.bound_iteration.len()),
            ("scale", self.scale.len()),
        ]
    }

    /// Fails with a corruption error if the parallel arrays differ in length.
    pub fn validate(&self) -> Result<(), NestError> {
        check_aligned("chain", &self.field_lengths())
    }
}

/// Points not yet killed into the chain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveSet {
    /// Unit-cube coordinates.
    #[serde(rename = "live_u", with = "float_codec::matrix")]
    pub unit_cube: Vec<Vec<f64>>,
    /// Physical coordinates.
    #[serde(rename = "live_v", with = "float_codec::matrix")]
    pub physical: Vec<Vec<f64>>,
    /// Log-likelihoods.
    #[serde(rename = "live_logl", with = "float_codec::vec")]
    pub log_likelihood: Vec<f64>,
    /// Index of the bound each point was proposed from.
    #[serde(rename = "live_bound")]
    pub bound: Vec<u64>,
    /// Iteration at which each point entered.
    #[serde(rename = "live_it")]
    pub iteration_added: Vec<u64>,
    /// Configured number of live points.
    pub nlive: u64,
    /// True once the live points have been folded into the chain.
    pub added_live: bool,
}

impl LiveSet {
    /// Number of points currently held.
    pub fn len(&self) -> usize {
        self.log_likelihood.len()
    }

    /// True if no point is held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index of the lowest-likelihood point.
    pub fn worst(&self) -> Option<usize> {
        self.log_likelihood
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(index, _)| index)
    }

    /// Fails with a corruption error if the parallel arrays differ in length.
    pub fn validate(&self) -> Result<(), NestError> {
        check_aligned(
            "live",
            &[
                ("live_u", self.unit_cube.len()),
                ("live_v", self.physical.len()),
                ("live_logl", self.log_likelihood.len()),
                ("live_bound", self.bound.len()),
                ("live_it", self.iteration_added.len()),
            ],
        )
    }
}

fn check_aligned(group: &str, lengths: &[(&'static str, usize)]) -> Result<(), NestError> {
    let Some(&(first_name, expected)) = lengths.first() else {
        return Ok(());
    };
    match lengths.iter().find(|(_, len)| *len != expected) {
        Some((name, len)) => Err(NestError::Corruption(
            ErrorInfo::new("misaligned-arrays", format!("{group} arrays differ in length"))
                .with_context(first_name, expected.to_string())
                .with_context(*name, len.to_string()),
        )),
        None => Ok(()),
    }
}

/// Everything the sampler needs to continue a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunState {
    /// Pending chain segment.
    pub chain: ChainSegment,
    /// Live-point ensemble.
    pub live: LiveSet,
    /// Cumulative likelihood evaluations.
    pub call_count: u64,
    /// Next iteration index to be produced.
    pub cursor: u64,
}
